use common::entities::{licenses, product_files, reviews};
use common::services::catalog::ProductDto;
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub message: String,
    pub data: Option<T>,
    pub timestamp: i64,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: 200,
            message: "Success".to_string(),
            data: Some(data),
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn error(code: i32, message: String) -> Self {
        Self {
            code,
            message,
            data: None,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}

/// Distinguishes an absent field from an explicit `null`.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize)]
pub struct ListProductsQuery {
    pub q: Option<String>,
    pub category: Option<String>,
    #[serde(rename = "type")]
    pub product_type: Option<String>,
    pub price: Option<String>,
    pub sort: Option<String>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

/// Staff listing. Unlike the public one it spans every status.
#[derive(Debug, Deserialize)]
pub struct AdminProductsQuery {
    pub status: Option<String>,
    pub q: Option<String>,
    pub sort: Option<String>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct AdminStats {
    pub total_products: u64,
    pub pending_products: u64,
    pub approved_products: u64,
    pub categories: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProductRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub license: Option<Option<String>>,
    pub product_type: Option<String>,
    pub version: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub price_cents: Option<Option<i64>>,
    pub tags: Option<Vec<String>>,
    pub categories: Option<Vec<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub thumbnail_asset_id: Option<Option<uuid::Uuid>>,
}

#[derive(Debug, Serialize)]
pub struct ProductDetail {
    pub product: ProductDto,
    pub files: Vec<product_files::Model>,
    pub license_file: Option<licenses::Model>,
    pub reviews: Vec<reviews::Model>,
}

#[derive(Debug, Deserialize)]
pub struct AddReviewRequest {
    pub rating: i32,
    #[serde(default)]
    pub comment: String,
}

#[derive(Debug, Deserialize)]
pub struct AddCategoriesRequest {
    pub names: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct RenameCategoryRequest {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct RenameCategoryResponse {
    pub name: String,
    pub products_updated: u64,
}

#[derive(Debug, Deserialize)]
pub struct ModerateRequest {
    pub action: String,
    #[serde(default)]
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_request_separates_null_from_missing() {
        let req: UpdateProductRequest =
            serde_json::from_str(r#"{"license": null, "price_cents": 500}"#).unwrap();
        assert_eq!(req.license, Some(None));
        assert_eq!(req.price_cents, Some(Some(500)));
        assert_eq!(req.thumbnail_asset_id, None);
        assert!(req.title.is_none());
    }

    #[test]
    fn error_envelope_has_no_data() {
        let json = serde_json::to_value(ApiResponse::<()>::error(409, "dup".into())).unwrap();
        assert_eq!(json["code"], 409);
        assert_eq!(json["message"], "dup");
        assert!(json["data"].is_null());
    }
}

use crate::entities::products::{ProductStatus, ProductType};
use uuid::Uuid;

pub const DEFAULT_PAGE_SIZE: u64 = 12;
pub const MAX_PAGE_SIZE: u64 = 100;
/// Offsets are bound as signed 64-bit integers by the store.
pub const MAX_OFFSET: u64 = i64::MAX as u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    CreatedAt,
    DownloadCount,
    Rating,
    Price,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub field: SortField,
    pub descending: bool,
}

impl Default for SortKey {
    fn default() -> Self {
        Self {
            field: SortField::CreatedAt,
            descending: true,
        }
    }
}

impl SortKey {
    /// Parses `-field` / `field` strings. Anything outside the allow-list
    /// falls back to newest first.
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw.map(str::trim) else {
            return Self::default();
        };
        let (descending, name) = match raw.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, raw),
        };
        let field = match name {
            "created_at" => SortField::CreatedAt,
            "download_count" => SortField::DownloadCount,
            "rating" => SortField::Rating,
            "price" => SortField::Price,
            _ => return Self::default(),
        };
        Self { field, descending }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceClass {
    Free,
    Paid,
}

impl PriceClass {
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        match raw? {
            "free" => Some(PriceClass::Free),
            "paid" => Some(PriceClass::Paid),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub status: Option<ProductStatus>,
    pub query: Option<String>,
    pub category: Option<String>,
    pub product_type: Option<ProductType>,
    pub price: Option<PriceClass>,
    pub developer_id: Option<Uuid>,
}

impl ProductFilter {
    pub fn approved() -> Self {
        Self {
            status: Some(ProductStatus::Approved),
            ..Default::default()
        }
    }
}

/// Escape character used in `LIKE` patterns built from user input.
pub const LIKE_ESCAPE: char = '\\';

/// Makes `%`, `_` and the escape character match literally.
pub fn escape_like(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len());
    for c in needle.chars() {
        if matches!(c, '%' | '_') || c == LIKE_ESCAPE {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(c);
    }
    escaped
}

/// Converts a 1-based page into an offset/limit pair.
pub fn page_window(page: Option<u64>, per_page: Option<u64>) -> (u64, u64) {
    let per_page = per_page
        .filter(|p| *p > 0)
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .min(MAX_PAGE_SIZE);
    let page = page.filter(|p| *p > 0).unwrap_or(1);
    let offset = page.saturating_sub(1).saturating_mul(per_page).min(MAX_OFFSET);
    (offset, per_page)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_key_parses_allow_listed_values() {
        assert_eq!(
            SortKey::parse(Some("-download_count")),
            SortKey {
                field: SortField::DownloadCount,
                descending: true
            }
        );
        assert_eq!(
            SortKey::parse(Some("price")),
            SortKey {
                field: SortField::Price,
                descending: false
            }
        );
        assert_eq!(SortKey::parse(Some("-rating")).field, SortField::Rating);
    }

    #[test]
    fn sort_key_ignores_unknown_fields() {
        assert_eq!(SortKey::parse(Some("-title")), SortKey::default());
        assert_eq!(
            SortKey::parse(Some("password; DROP TABLE")),
            SortKey::default()
        );
        assert_eq!(SortKey::parse(None), SortKey::default());
    }

    #[test]
    fn price_class_parse() {
        assert_eq!(PriceClass::parse(Some("free")), Some(PriceClass::Free));
        assert_eq!(PriceClass::parse(Some("paid")), Some(PriceClass::Paid));
        assert_eq!(PriceClass::parse(Some("cheap")), None);
    }

    #[test]
    fn page_window_defaults_and_clamps() {
        assert_eq!(page_window(None, None), (0, 12));
        assert_eq!(page_window(Some(3), Some(10)), (20, 10));
        assert_eq!(page_window(Some(0), Some(1000)), (0, MAX_PAGE_SIZE));
    }

    #[test]
    fn escape_like_quotes_wildcards() {
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("my_mod"), "my\\_mod");
        assert_eq!(escape_like("a\\b"), "a\\\\b");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[test]
    fn page_window_saturates_on_huge_pages() {
        assert_eq!(page_window(Some(u64::MAX), Some(100)), (MAX_OFFSET, 100));
        assert_eq!(page_window(Some(u64::MAX), None).1, DEFAULT_PAGE_SIZE);
    }
}

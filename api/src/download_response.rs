//! Binary responses for stored assets.

use axum::body::Body;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use common::services::assets::AssetContent;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Characters left readable in the quoted filename.
const FILENAME: &AsciiSet = &NON_ALPHANUMERIC.remove(b'.').remove(b'-').remove(b'_');

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Inline,
    Attachment,
}

impl Disposition {
    fn as_str(&self) -> &'static str {
        match self {
            Disposition::Inline => "inline",
            Disposition::Attachment => "attachment",
        }
    }
}

pub fn content_disposition(disposition: Disposition, filename: &str) -> String {
    format!(
        "{}; filename=\"{}\"",
        disposition.as_str(),
        utf8_percent_encode(filename, FILENAME)
    )
}

pub struct AssetResponse {
    pub content: AssetContent,
    pub disposition: Disposition,
}

impl IntoResponse for AssetResponse {
    fn into_response(self) -> Response {
        let content_type = HeaderValue::from_str(&self.content.content_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
        let disposition =
            HeaderValue::from_str(&content_disposition(self.disposition, &self.content.filename))
                .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

        (
            StatusCode::OK,
            [
                (CONTENT_TYPE, content_type),
                (CONTENT_DISPOSITION, disposition),
                (CONTENT_LENGTH, HeaderValue::from(self.content.bytes.len())),
            ],
            Body::from(self.content.bytes),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_is_percent_encoded() {
        assert_eq!(
            content_disposition(Disposition::Attachment, "game-v1.0_final.zip"),
            "attachment; filename=\"game-v1.0_final.zip\""
        );
        assert_eq!(
            content_disposition(Disposition::Inline, "my \"cover\".png"),
            "inline; filename=\"my%20%22cover%22.png\""
        );
        assert_eq!(
            content_disposition(Disposition::Inline, "обложка.png"),
            "inline; filename=\"%D0%BE%D0%B1%D0%BB%D0%BE%D0%B6%D0%BA%D0%B0.png\""
        );
    }
}

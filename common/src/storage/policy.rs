//! Upload policy enforced before any byte is written.

use crate::services::{ServiceError, ValidationKind};

pub const MAX_UPLOAD_SIZE: u64 = 100 * 1024 * 1024;

pub const ALLOWED_CONTENT_TYPES: &[&str] = &[
    "application/zip",
    "application/octet-stream",
    "image/png",
    "image/jpeg",
    "application/pdf",
    "text/plain",
];

/// Drops parameters such as `; charset=utf-8` and lowercases the essence.
pub fn normalize_content_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Checks the declared size and type of an upload.
pub fn validate(content_type: &str, size: u64) -> Result<(), ServiceError> {
    if size > MAX_UPLOAD_SIZE {
        return Err(ServiceError::validation(
            ValidationKind::Oversized,
            format!(
                "file size {} exceeds the {} byte limit",
                size, MAX_UPLOAD_SIZE
            ),
        ));
    }

    let normalized = normalize_content_type(content_type);
    if !ALLOWED_CONTENT_TYPES.contains(&normalized.as_str()) {
        return Err(ServiceError::validation(
            ValidationKind::UnsupportedType,
            format!("content type '{}' is not allowed", content_type),
        ));
    }

    if size == 0 {
        return Err(ServiceError::validation(
            ValidationKind::EmptyFile,
            "file is empty",
        ));
    }

    Ok(())
}

/// Same as [`validate`], plus the payload must match the declared size.
pub fn validate_payload(
    content_type: &str,
    declared_size: u64,
    actual_len: usize,
) -> Result<(), ServiceError> {
    validate(content_type, declared_size.max(actual_len as u64))?;
    if declared_size != actual_len as u64 {
        return Err(ServiceError::validation(
            ValidationKind::SizeMismatch,
            format!(
                "declared size {} does not match payload length {}",
                declared_size, actual_len
            ),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_allowed_types_with_parameters() {
        assert!(validate("text/plain; charset=utf-8", 10).is_ok());
        assert!(validate("IMAGE/PNG", 10).is_ok());
        assert!(validate("application/zip", MAX_UPLOAD_SIZE).is_ok());
    }

    #[test]
    fn rejects_oversized_before_type() {
        let err = validate("video/mp4", MAX_UPLOAD_SIZE + 1).unwrap_err();
        assert_eq!(err.validation_kind(), Some(ValidationKind::Oversized));
    }

    #[test]
    fn rejects_unsupported_and_empty() {
        let err = validate("application/x-msdownload", 10).unwrap_err();
        assert_eq!(err.validation_kind(), Some(ValidationKind::UnsupportedType));

        let err = validate("application/zip", 0).unwrap_err();
        assert_eq!(err.validation_kind(), Some(ValidationKind::EmptyFile));
    }

    #[test]
    fn payload_length_must_match_declaration() {
        let err = validate_payload("application/zip", 5, 4).unwrap_err();
        assert_eq!(err.validation_kind(), Some(ValidationKind::SizeMismatch));

        // an understated size is still caught by the size limit
        let err =
            validate_payload("application/zip", 10, (MAX_UPLOAD_SIZE + 1) as usize).unwrap_err();
        assert_eq!(err.validation_kind(), Some(ValidationKind::Oversized));
    }
}

pub mod assets;
pub mod catalog;
pub mod categories;
pub mod developers;
pub mod downloads;
pub mod moderation;
pub mod ratings;

use sea_orm::{DbErr, SqlErr};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationKind {
    Oversized,
    UnsupportedType,
    EmptyFile,
    SizeMismatch,
    RatingOutOfRange,
    BlankCategory,
    InvalidField,
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{message}")]
    Validation {
        kind: ValidationKind,
        message: String,
    },
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0}")]
    Duplicate(String),
    #[error("invalid moderation action '{0}'")]
    InvalidAction(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn validation(kind: ValidationKind, message: impl Into<String>) -> Self {
        Self::Validation {
            kind,
            message: message.into(),
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// HTTP-style status code carried in the API envelope.
    pub fn code(&self) -> i32 {
        match self {
            ServiceError::Validation { .. } | ServiceError::InvalidAction(_) => 400,
            ServiceError::Forbidden(_) => 403,
            ServiceError::NotFound(_) => 404,
            ServiceError::Duplicate(_) => 409,
            ServiceError::StoreUnavailable(_) => 503,
            ServiceError::Internal(_) => 500,
        }
    }

    pub fn validation_kind(&self) -> Option<ValidationKind> {
        match self {
            ServiceError::Validation { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

impl From<DbErr> for ServiceError {
    fn from(err: DbErr) -> Self {
        if is_unique_violation(&err) {
            return Self::Duplicate(err.to_string());
        }
        match err {
            DbErr::RecordNotFound(what) => Self::NotFound(what),
            DbErr::RecordNotInserted => Self::Duplicate("record already exists".to_string()),
            DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => {
                Self::StoreUnavailable(err.to_string())
            }
            other => Self::Internal(format!("Database error: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_follow_error_kind() {
        assert_eq!(
            ServiceError::validation(ValidationKind::Oversized, "too big").code(),
            400
        );
        assert_eq!(ServiceError::InvalidAction("x".into()).code(), 400);
        assert_eq!(ServiceError::not_found("product").code(), 404);
        assert_eq!(ServiceError::Duplicate("dup".into()).code(), 409);
        assert_eq!(ServiceError::StoreUnavailable("down".into()).code(), 503);
    }

    #[test]
    fn record_not_found_maps_to_not_found() {
        let err: ServiceError = DbErr::RecordNotFound("product 1".into()).into();
        assert!(matches!(err, ServiceError::NotFound(ref m) if m == "product 1"));
        assert_eq!(err.to_string(), "product 1 not found");
    }

    #[test]
    fn connection_errors_map_to_store_unavailable() {
        let err: ServiceError =
            DbErr::ConnectionAcquire(sea_orm::ConnAcquireErr::Timeout).into();
        assert!(matches!(err, ServiceError::StoreUnavailable(_)));
    }

    #[test]
    fn skipped_insert_maps_to_duplicate() {
        let err: ServiceError = DbErr::RecordNotInserted.into();
        assert_eq!(err.code(), 409);
    }
}

use crate::models::ApiResponse;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use common::services::{ServiceError, ValidationKind};

/// Handler error. Rendered as the JSON envelope with a matching HTTP status.
#[derive(Debug)]
pub struct ApiError(pub ServiceError);

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self(ServiceError::validation(ValidationKind::InvalidField, message))
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.0.code();
        let status = StatusCode::from_u16(code as u16).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(code, error = %self.0, "Request failed");
        } else {
            tracing::debug!(code, error = %self.0, "Request rejected");
        }

        // Store internals stay in the log.
        let message = match &self.0 {
            ServiceError::Internal(_) => "internal server error".to_string(),
            other => other.to_string(),
        };

        (status, Json(ApiResponse::<()>::error(code, message))).into_response()
    }
}

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

pub fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::success(data)))
}

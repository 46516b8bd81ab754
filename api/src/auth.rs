mod dto;
mod extractor;

pub use dto::JwtClaims;
pub use extractor::{AuthUser, OptionalAuthUser};

use crate::error::ApiError;
use common::services::ServiceError;

/// Staff-only routes call this first. The flag comes from the identity token.
pub fn require_staff(user: &AuthUser) -> Result<(), ApiError> {
    if user.is_staff {
        Ok(())
    } else {
        Err(ServiceError::Forbidden(format!("user {} is not staff", user.user_id)).into())
    }
}

use super::dto::JwtClaims;
use crate::models::ApiResponse;
use crate::AppState;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    Json,
};
use common::domain::visibility::Viewer;
use common::settings::JwtSettings;
use jsonwebtoken::{decode, DecodingKey, Validation};
use std::sync::Arc;

type Rejection = (StatusCode, Json<ApiResponse<()>>);

fn reject(status: StatusCode, message: &str) -> Rejection {
    (
        status,
        Json(ApiResponse::error(status.as_u16() as i32, message.to_string())),
    )
}

#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: i64,
    pub is_staff: bool,
}

impl AuthUser {
    pub fn viewer(&self) -> Viewer {
        if self.is_staff {
            Viewer::staff(self.user_id)
        } else {
            Viewer::user(self.user_id)
        }
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let header = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
}

fn verify(token: &str, jwt: &JwtSettings) -> Result<AuthUser, Rejection> {
    let signing_key = jwt.signing_key.as_deref().ok_or_else(|| {
        reject(
            StatusCode::INTERNAL_SERVER_ERROR,
            "jwt signing key not configured",
        )
    })?;

    let mut validation = Validation::default();
    validation.set_issuer(std::slice::from_ref(&jwt.issuer));
    validation.set_audience(std::slice::from_ref(&jwt.audience));

    let decoded = decode::<JwtClaims>(
        token,
        &DecodingKey::from_secret(signing_key.as_bytes()),
        &validation,
    )
    .map_err(|_| reject(StatusCode::UNAUTHORIZED, "invalid token"))?;

    let user_id = decoded
        .claims
        .sub
        .parse::<i64>()
        .map_err(|_| reject(StatusCode::UNAUTHORIZED, "invalid token sub"))?;

    Ok(AuthUser {
        user_id,
        is_staff: decoded.claims.staff,
    })
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = Rejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, "missing bearer token"))?;
        verify(token, &state.settings.auth.jwt)
    }
}

/// Anonymous callers are allowed; a malformed token is still rejected.
#[derive(Clone, Debug)]
pub struct OptionalAuthUser(pub Option<AuthUser>);

impl OptionalAuthUser {
    pub fn viewer(&self) -> Viewer {
        self.0
            .as_ref()
            .map(AuthUser::viewer)
            .unwrap_or_else(Viewer::anonymous)
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for OptionalAuthUser {
    type Rejection = Rejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        match bearer_token(parts) {
            Some(token) => Ok(Self(Some(verify(token, &state.settings.auth.jwt)?))),
            None if parts.headers.contains_key(AUTHORIZATION) => {
                Err(reject(StatusCode::UNAUTHORIZED, "missing bearer token"))
            }
            None => Ok(Self(None)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn settings() -> JwtSettings {
        JwtSettings {
            signing_key: Some("unit-secret".to_string()),
            ..Default::default()
        }
    }

    fn token(sub: &str, staff: bool, aud: &str) -> String {
        let claims = JwtClaims {
            iss: "modmarket".to_string(),
            aud: aud.to_string(),
            sub: sub.to_string(),
            staff,
            exp: chrono::Utc::now().timestamp() + 600,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"unit-secret"),
        )
        .unwrap()
    }

    #[test]
    fn verify_reads_user_and_staff_flag() {
        let user = verify(&token("42", true, "modmarket"), &settings()).unwrap();
        assert_eq!(user.user_id, 42);
        assert!(user.is_staff);
        assert_eq!(user.viewer(), Viewer::staff(42));
    }

    #[test]
    fn verify_rejects_wrong_audience_and_bad_sub() {
        let (status, _) = verify(&token("42", false, "elsewhere"), &settings()).unwrap_err();
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = verify(&token("alice", false, "modmarket"), &settings()).unwrap_err();
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn verify_without_key_is_server_error() {
        let (status, _) =
            verify(&token("1", false, "modmarket"), &JwtSettings::default()).unwrap_err();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}

use serde::{Deserialize, Serialize};

/// Claims minted by the external identity service.
#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub iss: String,
    pub aud: String,
    /// Integer user id rendered as a string.
    pub sub: String,
    #[serde(default)]
    pub staff: bool,
    pub exp: i64,
}

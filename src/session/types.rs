use serde::{Deserialize, Serialize};

use crate::shared::AppError;

/// Claims embedded in every bearer token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenClaims {
    pub sub: String,
    #[serde(rename = "isAdmin")]
    pub is_admin: bool,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

/// Caller identity attached to a request once its token is authenticated
#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticatedUser {
    pub username: String,
    pub is_admin: bool,
    pub token: String,
}

impl AuthenticatedUser {
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin {
            Ok(())
        } else {
            Err(AppError::Unauthorized(format!(
                "{} is not an administrator",
                self.username
            )))
        }
    }
}

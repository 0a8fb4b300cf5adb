use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use tracing::{debug, instrument};
use uuid::Uuid;

use super::types::TokenClaims;
use crate::shared::AppError;

/// Issues and verifies signed, time-limited bearer tokens
///
/// The HS256 key is drawn at random when the service is built and lives
/// only as long as the process, so tokens do not survive a restart.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    lifetime: Duration,
}

impl TokenService {
    pub fn new(lifetime: Duration) -> Self {
        let secret: [u8; 32] = rand::random();
        Self::with_secret(&secret, lifetime)
    }

    pub fn with_secret(secret: &[u8], lifetime: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            lifetime,
        }
    }

    /// Signs a token for `username`; the caller registers it as active
    #[instrument(skip(self))]
    pub fn issue(&self, username: &str, is_admin: bool) -> Result<String, AppError> {
        let now = Utc::now();
        let expires = now.checked_add_signed(self.lifetime).ok_or_else(|| {
            debug!(lifetime = %self.lifetime, "Token expiry out of range");
            AppError::JwtError("token expiry out of range".to_string())
        })?;
        let claims = TokenClaims {
            sub: username.to_string(),
            is_admin,
            iat: now.timestamp(),
            exp: expires.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        debug!(exp_timestamp = claims.exp, "Signing token");

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|e| {
            debug!(error = %e, "Failed to encode token");
            AppError::JwtError(e.to_string())
        })
    }

    /// Checks signature and expiry. Any failure yields `None`.
    #[instrument(skip(self, token))]
    pub fn validate(&self, token: &str) -> Option<TokenClaims> {
        match decode::<TokenClaims>(token, &self.decoding_key, &self.validation) {
            Ok(data) => Some(data.claims),
            Err(e) => {
                debug!(error = %e, "Token rejected");
                None
            }
        }
    }

    pub fn username_of(&self, token: &str) -> Option<String> {
        self.validate(token).map(|claims| claims.sub)
    }

    /// `false` for non-admin claims and for tokens that fail validation alike
    pub fn is_admin(&self, token: &str) -> bool {
        self.validate(token).is_some_and(|claims| claims.is_admin)
    }
}

use tracing::{info, instrument, warn};

use super::{registry::ActiveTokenRegistry, token::TokenService, types::AuthenticatedUser};
use crate::shared::AppError;

/// Ties token signing to the active-token registry
pub struct SessionService {
    tokens: TokenService,
    registry: ActiveTokenRegistry,
}

impl SessionService {
    pub fn new(tokens: TokenService, registry: ActiveTokenRegistry) -> Self {
        Self { tokens, registry }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    pub fn registry(&self) -> &ActiveTokenRegistry {
        &self.registry
    }

    /// Issues a token and marks it as logged in
    #[instrument(skip(self))]
    pub async fn open_session(&self, username: &str, is_admin: bool) -> Result<String, AppError> {
        let token = self.tokens.issue(username, is_admin)?;
        self.registry.add(token.clone()).await;

        info!(username = %username, is_admin, "Session opened");
        Ok(token)
    }

    /// Idempotent: closing an unknown token succeeds
    #[instrument(skip(self, token))]
    pub async fn close_session(&self, token: &str) {
        let was_active = self.registry.remove(token).await;
        info!(was_active, "Session closed");
    }

    /// Registry membership first, then signature and expiry
    #[instrument(skip(self, token))]
    pub async fn authenticate(&self, token: &str) -> Result<AuthenticatedUser, AppError> {
        if !self.registry.contains(token).await {
            warn!("Token is not logged in");
            return Err(AppError::Unauthorized("Token is not active".to_string()));
        }

        let claims = self.tokens.validate(token).ok_or_else(|| {
            warn!("Active token failed signature or expiry check");
            AppError::Unauthorized("Token is invalid or expired".to_string())
        })?;

        Ok(AuthenticatedUser {
            username: claims.sub,
            is_admin: claims.is_admin,
            token: token.to_string(),
        })
    }

    /// Drops every active token issued to `username`
    #[instrument(skip(self))]
    pub async fn revoke_user(&self, username: &str) -> usize {
        let revoked = self
            .registry
            .remove_all(|token| self.tokens.username_of(token).as_deref() == Some(username))
            .await;

        info!(username = %username, revoked, "Revoked sessions for user");
        revoked
    }
}

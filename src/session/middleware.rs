use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::{debug, instrument, warn};

use crate::shared::{AppError, AppState};

/// Reads the raw token from the Authorization header
///
/// The header carries the token itself; a `Bearer ` prefix is tolerated.
pub fn token_from_headers(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    let token = value.strip_prefix("Bearer ").unwrap_or(value).trim();
    (!token.is_empty()).then_some(token)
}

/// Token authentication middleware - rejects requests whose token is not logged in
/// or fails verification, and adds AuthenticatedUser to the request otherwise.
/// Usage: .route_layer(middleware::from_fn_with_state(state.clone(), require_active_token))
/// Handlers can then extract Extension(caller): Extension<AuthenticatedUser>.
#[instrument(skip(state, req, next))]
pub async fn require_active_token(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = token_from_headers(req.headers()).ok_or_else(|| {
        warn!(uri = %req.uri(), "Missing Authorization header");
        AppError::Unauthorized("Missing authorization header".to_string())
    })?;

    let caller = state.session_service.authenticate(token).await?;

    debug!(
        username = %caller.username,
        is_admin = caller.is_admin,
        "Authenticated request"
    );

    req.extensions_mut().insert(caller);
    Ok(next.run(req).await)
}

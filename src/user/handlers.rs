use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Extension, Json,
};
use std::sync::Arc;
use tracing::{info, instrument};

use super::{
    models::UserModel,
    service::UserService,
    types::{ListUsersQuery, LoginRequest, SearchQuery, UpdateUserQuery},
};
use crate::pagination::{PageRequest, PageResponse};
use crate::session::{token_from_headers, AuthenticatedUser};
use crate::shared::{AppError, AppState};

fn service(state: &AppState) -> UserService {
    UserService::new(
        Arc::clone(&state.user_repository),
        Arc::clone(&state.session_service),
    )
}

/// POST /api/user/login
/// Returns the bare token string
#[instrument(name = "login", skip(state, request), fields(username = ?request.username))]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<String, AppError> {
    let token = service(&state).login(request).await?;
    info!("Login succeeded");
    Ok(token)
}

/// POST /api/user/logout
/// Always 200, whether or not the token was logged in
#[instrument(name = "logout", skip(state, headers))]
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> StatusCode {
    if let Some(token) = token_from_headers(&headers) {
        service(&state).logout(token).await;
    }
    StatusCode::OK
}

/// GET /api/user
#[instrument(name = "list_users", skip(state, caller), fields(caller = %caller.username))]
pub async fn list_users(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedUser>,
    Query(query): Query<ListUsersQuery>,
) -> Result<PageResponse<UserModel>, AppError> {
    caller.require_admin()?;

    let request = PageRequest::new(query.page, query.size)?;
    let page = service(&state)
        .list_users(request, query.field.as_deref(), query.value.as_deref())
        .await?;

    info!(
        total = page.total_elements,
        returned = page.number_of_elements,
        "Users listed"
    );
    Ok(PageResponse(page))
}

/// POST /api/user
#[instrument(name = "create_user", skip(state, caller, user), fields(caller = %caller.username))]
pub async fn create_user(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedUser>,
    Json(user): Json<UserModel>,
) -> Result<(StatusCode, Json<UserModel>), AppError> {
    caller.require_admin()?;

    let user = service(&state).create_user(user).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// PUT /api/user/{username}?field=..&value=..
#[instrument(name = "update_user", skip(state, caller, query), fields(caller = %caller.username))]
pub async fn update_user(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedUser>,
    Path(username): Path<String>,
    Query(query): Query<UpdateUserQuery>,
) -> Result<Json<UserModel>, AppError> {
    caller.require_admin()?;

    let user = service(&state)
        .update_user(&username, &query.field, &query.value)
        .await?;
    Ok(Json(user))
}

/// DELETE /api/user/{username}
#[instrument(name = "delete_user", skip(state, caller), fields(caller = %caller.username))]
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedUser>,
    Path(username): Path<String>,
) -> Result<StatusCode, AppError> {
    caller.require_admin()?;

    service(&state).delete_user(&username).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/user/search?username=..
/// Open to every logged-in user; an empty result is still 200
#[instrument(name = "search_users", skip(state, caller), fields(caller = %caller.username))]
pub async fn search_users(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedUser>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<String>>, AppError> {
    let usernames = service(&state).search_usernames(&query.username).await?;
    Ok(Json(usernames))
}

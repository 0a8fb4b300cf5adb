use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::message;
use crate::session::require_active_token;
use crate::shared::AppState;
use crate::user;

/// Builds the HTTP surface
///
/// Login, logout and the health check are open; every other route needs a
/// token that is both valid and currently logged in.
pub fn build_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/user/login", post(user::login))
        .route("/api/user/logout", post(user::logout));

    let protected = Router::new()
        .route("/api/user", get(user::list_users).post(user::create_user))
        .route("/api/user/search", get(user::search_users))
        .route(
            "/api/user/:username",
            put(user::update_user).delete(user::delete_user),
        )
        .route(
            "/api/message",
            get(message::list_messages).post(message::send_message),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_active_token,
        ));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    public
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::config::AppConfig;
use crate::db::{connect_postgres, InMemoryDatabase};
use crate::message::repository::{
    InMemoryMessageRepository, MessageRepository, PostgresMessageRepository,
};
use crate::session::{ActiveTokenRegistry, SessionService, TokenService};
use crate::user::repository::{InMemoryUserRepository, PostgresUserRepository, UserRepository};
use crate::user::UserService;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub user_repository: Arc<dyn UserRepository + Send + Sync>,
    pub message_repository: Arc<dyn MessageRepository + Send + Sync>,
    pub session_service: Arc<SessionService>,
}

impl AppState {
    pub fn new(
        user_repository: Arc<dyn UserRepository + Send + Sync>,
        message_repository: Arc<dyn MessageRepository + Send + Sync>,
        session_service: Arc<SessionService>,
    ) -> Self {
        Self {
            user_repository,
            message_repository,
            session_service,
        }
    }

    /// Wires repositories for the configured backend, opens a fresh session
    /// registry and creates the bootstrap admin when one is configured
    pub async fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        let (user_repository, message_repository): (
            Arc<dyn UserRepository + Send + Sync>,
            Arc<dyn MessageRepository + Send + Sync>,
        ) = match &config.database_url {
            Some(url) => {
                let pool = connect_postgres(url).await?;
                info!("Using PostgreSQL storage");
                (
                    Arc::new(PostgresUserRepository::new(pool.clone())),
                    Arc::new(PostgresMessageRepository::new(pool)),
                )
            }
            None => {
                let database = InMemoryDatabase::new();
                info!("Using in-memory storage");
                (
                    Arc::new(InMemoryUserRepository::new(database.clone())),
                    Arc::new(InMemoryMessageRepository::new(database)),
                )
            }
        };

        let session_service = Arc::new(SessionService::new(
            TokenService::new(config.token_lifetime),
            ActiveTokenRegistry::new(),
        ));

        if let Some(admin) = &config.bootstrap_admin {
            UserService::new(Arc::clone(&user_repository), Arc::clone(&session_service))
                .ensure_admin(&admin.username, &admin.password)
                .await?;
        }

        Ok(Self::new(
            user_repository,
            message_repository,
            session_service,
        ))
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("JWT error: {0}")]
    JwtError(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal server error")]
    Internal,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::JwtError(_) | AppError::DatabaseError(_) | AppError::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Errors leave the service as a bare status code; the cause only reaches the logs.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            error!(error = %self, "Request failed");
        } else {
            debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        status.into_response()
    }
}

#[cfg(test)]
pub mod test_utils {
    use super::*;
    use crate::user::models::UserModel;

    /// Builder for creating AppState backed by a single in-memory database
    pub struct AppStateBuilder {
        database: InMemoryDatabase,
        users: Vec<UserModel>,
        token_service: Option<TokenService>,
    }

    impl AppStateBuilder {
        pub fn new() -> Self {
            Self {
                database: InMemoryDatabase::new(),
                users: Vec::new(),
                token_service: None,
            }
        }

        pub fn with_user(mut self, user: UserModel) -> Self {
            self.users.push(user);
            self
        }

        pub fn with_token_service(mut self, token_service: TokenService) -> Self {
            self.token_service = Some(token_service);
            self
        }

        pub async fn build(self) -> AppState {
            {
                let mut tables = self.database.write().await;
                tables.users.extend(self.users);
            }

            let session_service = SessionService::new(
                self.token_service
                    .unwrap_or_else(|| TokenService::new(chrono::Duration::hours(24))),
                ActiveTokenRegistry::new(),
            );

            AppState {
                user_repository: Arc::new(InMemoryUserRepository::new(self.database.clone())),
                message_repository: Arc::new(InMemoryMessageRepository::new(self.database)),
                session_service: Arc::new(session_service),
            }
        }
    }

    impl Default for AppStateBuilder {
        fn default() -> Self {
            Self::new()
        }
    }

    /// A fully populated user for tests
    pub fn test_user(username: &str, password: &str, admin: bool) -> UserModel {
        UserModel {
            username: username.to_string(),
            password: password.to_string(),
            name: Some(format!("{}-name", username)),
            surname: Some(format!("{}-surname", username)),
            birthdate: chrono::NaiveDate::from_ymd_opt(1990, 5, 17),
            gender: Some("Female".to_string()),
            email: Some(format!("{}@example.com", username)),
            location: Some("Ankara".to_string()),
            admin,
        }
    }

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            AppError::Unauthorized("x".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::BadRequest("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::DatabaseError("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::Internal.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_from_config_creates_bootstrap_admin() {
        let config = AppConfig::from_lookup(|key| match key {
            "COURIER_ADMIN_USERNAME" => Some("root".to_string()),
            "COURIER_ADMIN_PASSWORD" => Some("rootpw".to_string()),
            _ => None,
        });

        let state = AppState::from_config(&config).await.unwrap();

        let root = state
            .user_repository
            .find_by_username("root")
            .await
            .unwrap()
            .unwrap();
        assert!(root.admin);
        assert!(root.password_matches("rootpw"));
        assert!(state.session_service.registry().is_empty().await);
    }

    #[tokio::test]
    async fn test_error_response_has_no_body() {
        let response = AppError::DatabaseError("duplicate key".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(body.is_empty());
    }
}

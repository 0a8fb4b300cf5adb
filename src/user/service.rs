use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::{
    models::{contains_ignore_case, UserField, UserFilter, UserModel},
    repository::UserRepository,
    types::LoginRequest,
};
use crate::message::models::REMOVED_USER_SENTINEL;
use crate::pagination::{Page, PageRequest};
use crate::session::SessionService;
use crate::shared::AppError;

/// Service for handling user directory business logic
pub struct UserService {
    repository: Arc<dyn UserRepository + Send + Sync>,
    sessions: Arc<SessionService>,
}

impl UserService {
    pub fn new(
        repository: Arc<dyn UserRepository + Send + Sync>,
        sessions: Arc<SessionService>,
    ) -> Self {
        Self {
            repository,
            sessions,
        }
    }

    /// Checks credentials and opens a session carrying the stored admin flag
    ///
    /// Every credential failure is reported the same way.
    #[instrument(skip(self, request), fields(username = ?request.username))]
    pub async fn login(&self, request: LoginRequest) -> Result<String, AppError> {
        let user = match request.username.as_deref() {
            Some(username) => self.repository.find_by_username(username).await?,
            None => None,
        };

        match (user, request.password.as_deref()) {
            (Some(user), Some(password)) if user.password_matches(password) => {
                self.sessions.open_session(&user.username, user.admin).await
            }
            _ => {
                warn!("Login rejected");
                Err(AppError::Unauthorized("Invalid credentials".to_string()))
            }
        }
    }

    #[instrument(skip(self, token))]
    pub async fn logout(&self, token: &str) {
        self.sessions.close_session(token).await;
    }

    /// Lists one page of users, filtered when both `field` and `value` are given
    #[instrument(skip(self))]
    pub async fn list_users(
        &self,
        request: PageRequest,
        field: Option<&str>,
        value: Option<&str>,
    ) -> Result<Page<UserModel>, AppError> {
        let (field, value) = match (field, value) {
            (Some(field), Some(value)) => (field, value),
            _ => return self.repository.find_page(None, request).await,
        };

        match UserFilter::parse(field, value) {
            Some(filter) => self.repository.find_page(Some(&filter), request).await,
            None => {
                debug!(field = %field, "Filter can match no user");
                Ok(Page::empty(request))
            }
        }
    }

    #[instrument(skip(self, user), fields(username = %user.username))]
    pub async fn create_user(&self, user: UserModel) -> Result<UserModel, AppError> {
        self.repository.create_user(&user).await?;
        info!(admin = user.admin, "User created");
        Ok(user)
    }

    /// Overwrites one attribute; an unknown user is reported before an unknown field
    #[instrument(skip(self, value))]
    pub async fn update_user(
        &self,
        username: &str,
        field: &str,
        value: &str,
    ) -> Result<UserModel, AppError> {
        let mut user = self
            .repository
            .find_by_username(username)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", username)))?;

        let field = UserField::from_str(field)
            .map_err(|_| AppError::BadRequest(format!("Unknown user field {:?}", field)))?;

        user.apply(field, value)?;
        self.repository.update_user(username, &user).await?;

        info!(%field, "User updated");
        Ok(user)
    }

    /// Removes the user, redirects their messages to the sentinel and
    /// revokes their sessions
    #[instrument(skip(self))]
    pub async fn delete_user(&self, username: &str) -> Result<(), AppError> {
        if !self.repository.exists_by_username(username).await? {
            return Err(AppError::NotFound(format!("User {} not found", username)));
        }

        let summary = self
            .repository
            .remove_user(username, REMOVED_USER_SENTINEL)
            .await?;
        let revoked = self.sessions.revoke_user(username).await;

        info!(
            sent_rewritten = summary.sent_rewritten,
            received_rewritten = summary.received_rewritten,
            revoked,
            "User deleted"
        );
        Ok(())
    }

    /// Creates an admin account unless the username is already taken
    ///
    /// Returns whether a user was created.
    #[instrument(skip(self, password))]
    pub async fn ensure_admin(&self, username: &str, password: &str) -> Result<bool, AppError> {
        if self.repository.exists_by_username(username).await? {
            debug!("Bootstrap admin already present");
            return Ok(false);
        }

        self.repository
            .create_user(&UserModel::admin(username, password))
            .await?;
        info!("Bootstrap admin created");
        Ok(true)
    }

    /// Usernames containing `needle`, ignoring case
    #[instrument(skip(self))]
    pub async fn search_usernames(&self, needle: &str) -> Result<Vec<String>, AppError> {
        let usernames = self.repository.list_usernames().await?;
        Ok(usernames
            .into_iter()
            .filter(|username| contains_ignore_case(username, needle))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryDatabase;
    use crate::session::{ActiveTokenRegistry, TokenService};
    use crate::shared::test_utils::test_user;
    use crate::user::repository::InMemoryUserRepository;
    use chrono::{Duration, NaiveDate};

    async fn service_with(users: Vec<UserModel>) -> UserService {
        let repo = Arc::new(InMemoryUserRepository::new(InMemoryDatabase::new()));
        for user in &users {
            repo.create_user(user).await.unwrap();
        }
        let sessions = Arc::new(SessionService::new(
            TokenService::new(Duration::hours(24)),
            ActiveTokenRegistry::new(),
        ));
        UserService::new(repo, sessions)
    }

    fn login(username: &str, password: &str) -> LoginRequest {
        LoginRequest {
            username: Some(username.to_string()),
            password: Some(password.to_string()),
        }
    }

    #[tokio::test]
    async fn test_login_success_registers_token() {
        let service = service_with(vec![test_user("root", "secret", true)]).await;

        let token = service.login(login("root", "secret")).await.unwrap();

        let caller = service.sessions.authenticate(&token).await.unwrap();
        assert_eq!(caller.username, "root");
        assert!(caller.is_admin);
    }

    // Passwords are stored and compared as plaintext; this pins that behavior.
    #[tokio::test]
    async fn test_login_compares_passwords_in_plaintext() {
        let service = service_with(vec![test_user("alice", "Secret", false)]).await;

        assert!(service.login(login("alice", "Secret")).await.is_ok());
        assert!(service.login(login("alice", "secret")).await.is_err());
    }

    #[tokio::test]
    async fn test_login_failures_are_unauthorized() {
        let service = service_with(vec![test_user("alice", "pw", false)]).await;

        let wrong_password = service.login(login("alice", "nope")).await;
        let unknown_user = service.login(login("ghost", "pw")).await;

        assert!(matches!(wrong_password, Err(AppError::Unauthorized(_))));
        assert!(matches!(unknown_user, Err(AppError::Unauthorized(_))));
        assert!(service.sessions.registry().is_empty().await);
    }

    #[tokio::test]
    async fn test_login_without_password_never_matches() {
        let service = service_with(vec![test_user("blank", "", false)]).await;

        let result = service
            .login(LoginRequest {
                username: Some("blank".to_string()),
                password: None,
            })
            .await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
        assert!(service.login(login("blank", "")).await.is_ok());
    }

    #[tokio::test]
    async fn test_list_with_only_field_is_unfiltered() {
        let service = service_with(vec![
            test_user("alice", "pw", false),
            test_user("bob", "pw", false),
        ])
        .await;

        let page = service
            .list_users(PageRequest::default(), Some("name"), None)
            .await
            .unwrap();
        assert_eq!(page.total_elements, 2);
    }

    #[tokio::test]
    async fn test_list_with_unknown_field_is_empty() {
        let service = service_with(vec![test_user("alice", "pw", false)]).await;

        let page = service
            .list_users(PageRequest::default(), Some("shoe"), Some("42"))
            .await
            .unwrap();
        assert!(page.is_empty());
    }

    #[tokio::test]
    async fn test_update_unknown_user_before_unknown_field() {
        let service = service_with(vec![test_user("alice", "pw", false)]).await;

        let missing = service.update_user("ghost", "bogus", "x").await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));

        let bad_field = service.update_user("alice", "bogus", "x").await;
        assert!(matches!(bad_field, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_update_birthdate() {
        let service = service_with(vec![test_user("alice", "pw", false)]).await;

        let updated = service
            .update_user("alice", "BirthDate", "1985-12-01")
            .await
            .unwrap();
        assert_eq!(updated.birthdate, NaiveDate::from_ymd_opt(1985, 12, 1));

        let invalid = service.update_user("alice", "birthdate", "yesterday").await;
        assert!(matches!(invalid, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_delete_revokes_sessions() {
        let service = service_with(vec![
            test_user("root", "pw", true),
            test_user("alice", "pw", false),
        ])
        .await;
        let alice_token = service.login(login("alice", "pw")).await.unwrap();
        let root_token = service.login(login("root", "pw")).await.unwrap();

        service.delete_user("alice").await.unwrap();

        assert!(!service.sessions.registry().contains(&alice_token).await);
        assert!(service.sessions.registry().contains(&root_token).await);
        assert!(matches!(
            service.delete_user("alice").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_ensure_admin_is_idempotent() {
        let service = service_with(vec![test_user("alice", "pw", false)]).await;

        assert!(service.ensure_admin("root", "rootpw").await.unwrap());
        assert!(!service.ensure_admin("root", "other").await.unwrap());
        assert!(!service.ensure_admin("alice", "pw").await.unwrap());

        let token = service.login(login("root", "rootpw")).await.unwrap();
        assert!(service.sessions.authenticate(&token).await.unwrap().is_admin);

        let alice = service.login(login("alice", "pw")).await.unwrap();
        assert!(!service.sessions.authenticate(&alice).await.unwrap().is_admin);
    }

    #[tokio::test]
    async fn test_search_usernames() {
        let service = service_with(vec![
            test_user("Joanna", "pw", false),
            test_user("annabel", "pw", false),
            test_user("bob", "pw", false),
        ])
        .await;

        let found = service.search_usernames("ANN").await.unwrap();
        assert_eq!(found, vec!["Joanna", "annabel"]);

        let none = service.search_usernames("zzz").await.unwrap();
        assert!(none.is_empty());
    }
}

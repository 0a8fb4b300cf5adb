use axum::Router;
use std::collections::HashMap;

use courier::{build_router, AppConfig, AppState, UserModel};

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub const ADMIN: &str = "root";
pub const ADMIN_PASSWORD: &str = "rootpw";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

pub struct TestAppBuilder {
    users: Vec<UserModel>,
    env: HashMap<String, String>,
}

impl TestAppBuilder {
    pub fn new() -> Self {
        let env = HashMap::from([
            ("COURIER_ADMIN_USERNAME".to_string(), ADMIN.to_string()),
            ("COURIER_ADMIN_PASSWORD".to_string(), ADMIN_PASSWORD.to_string()),
        ]);
        Self {
            users: vec![],
            env,
        }
    }

    /// Adds a regular user with only credentials set
    pub fn with_member(self, username: &str, password: &str) -> Self {
        let mut user = UserModel::admin(username, password);
        user.admin = false;
        self.with_user(user)
    }

    pub fn with_user(mut self, user: UserModel) -> Self {
        self.users.push(user);
        self
    }

    pub fn with_env(mut self, key: &str, value: &str) -> Self {
        self.env.insert(key.to_string(), value.to_string());
        self
    }

    pub async fn build(self) -> TestApp {
        let env = self.env;
        let config = AppConfig::from_lookup(|key| env.get(key).cloned());
        let state = AppState::from_config(&config).await.unwrap();

        for user in &self.users {
            state.user_repository.create_user(user).await.unwrap();
        }

        TestApp {
            router: build_router(state.clone()),
            state,
        }
    }
}

/// A user with every profile attribute filled in
#[allow(dead_code)]
pub fn profile(username: &str, name: &str, gender: &str, birthdate: &str) -> UserModel {
    UserModel {
        username: username.to_string(),
        password: format!("{}pw", username),
        name: Some(name.to_string()),
        surname: Some("Tester".to_string()),
        birthdate: chrono::NaiveDate::parse_from_str(birthdate, "%Y-%m-%d").ok(),
        gender: Some(gender.to_string()),
        email: Some(format!("{}@example.com", username)),
        location: Some("Izmir".to_string()),
        admin: false,
    }
}

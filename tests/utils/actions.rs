#![allow(dead_code)] // Test utilities may not all be used in every test

use axum::{
    body::{Body, Bytes},
    http::{Method, Request, StatusCode},
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tower::ServiceExt; // for `oneshot`

use courier::{MessageModel, Page, UserModel};

use super::setup::TestApp;

// ============================================================================
// Response Wrapper
// ============================================================================

pub struct TestResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

impl TestResponse {
    pub fn json<T: DeserializeOwned>(&self) -> T {
        serde_json::from_slice(&self.body).unwrap()
    }

    pub fn text(&self) -> String {
        String::from_utf8(self.body.to_vec()).unwrap()
    }

    pub fn users(&self) -> Page<UserModel> {
        assert_eq!(self.status, StatusCode::OK);
        self.json()
    }

    pub fn messages(&self) -> Page<MessageModel> {
        assert_eq!(self.status, StatusCode::OK);
        self.json()
    }
}

// ============================================================================
// Action Helpers
// ============================================================================

impl TestApp {
    /// Sends one request through the router
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("Authorization", token);
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        TestResponse { status, body }
    }

    // ============================================================================
    // Convenience Action Methods
    // ============================================================================

    pub async fn try_login(&self, username: &str, password: &str) -> TestResponse {
        self.request(
            Method::POST,
            "/api/user/login",
            None,
            Some(json!({ "username": username, "password": password })),
        )
        .await
    }

    /// Log in and return the token, failing the test otherwise
    pub async fn login(&self, username: &str, password: &str) -> String {
        let response = self.try_login(username, password).await;
        assert_eq!(response.status, StatusCode::OK, "login as {}", username);
        response.text()
    }

    pub async fn logout(&self, token: &str) -> StatusCode {
        self.request(Method::POST, "/api/user/logout", Some(token), None)
            .await
            .status
    }

    pub async fn create_user(&self, token: &str, user: Value) -> TestResponse {
        self.request(Method::POST, "/api/user", Some(token), Some(user))
            .await
    }

    pub async fn list_users(&self, token: &str, query: &str) -> TestResponse {
        self.request(Method::GET, &format!("/api/user{}", query), Some(token), None)
            .await
    }

    pub async fn update_user(
        &self,
        token: &str,
        username: &str,
        field: &str,
        value: &str,
    ) -> TestResponse {
        let uri = format!("/api/user/{}?field={}&value={}", username, field, value);
        self.request(Method::PUT, &uri, Some(token), None).await
    }

    pub async fn delete_user(&self, token: &str, username: &str) -> StatusCode {
        self.request(
            Method::DELETE,
            &format!("/api/user/{}", username),
            Some(token),
            None,
        )
        .await
        .status
    }

    pub async fn search(&self, token: &str, needle: &str) -> TestResponse {
        let uri = format!("/api/user/search?username={}", needle);
        self.request(Method::GET, &uri, Some(token), None).await
    }

    pub async fn send(&self, token: &str, receiver: &str, content: &str) -> TestResponse {
        self.request(
            Method::POST,
            "/api/message",
            Some(token),
            Some(json!({ "receiver": receiver, "content": content })),
        )
        .await
    }

    pub async fn mailbox(&self, token: &str, query: &str) -> TestResponse {
        self.request(
            Method::GET,
            &format!("/api/message?{}", query),
            Some(token),
            None,
        )
        .await
    }
}

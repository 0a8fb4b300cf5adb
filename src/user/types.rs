use serde::Deserialize;

use crate::pagination::{default_page, default_page_size};

/// Request payload for logging in
///
/// Either credential may be missing; such a request fails the credential
/// check rather than the extractor.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Query string for GET /api/user
#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub size: u32,
    pub field: Option<String>,
    pub value: Option<String>,
}

/// Query string for PUT /api/user/{username}
#[derive(Debug, Deserialize)]
pub struct UpdateUserQuery {
    pub field: String,
    pub value: String,
}

/// Query string for GET /api/user/search
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub username: String,
}

use serde::Deserialize;

use crate::pagination::{default_page, default_page_size};

/// Request payload for sending a message
///
/// The sender comes from the caller's token; any sender, id or timestamp
/// in the body is ignored.
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub receiver: String,
    pub content: String,
}

/// Query string for GET /api/message
#[derive(Debug, Deserialize)]
pub struct ListMessagesQuery {
    pub inout: String,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub size: u32,
    pub field: Option<String>,
    pub value: Option<String>,
}

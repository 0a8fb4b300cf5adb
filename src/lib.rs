// Library crate for the courier messaging server
// This file exposes the public API for the binary and integration tests

pub mod config;
pub mod db;
pub mod message;
pub mod pagination;
pub mod router;
pub mod session;
pub mod shared;
pub mod user;

// Re-export commonly used types for easier access in tests
pub use config::AppConfig;
pub use message::models::{MessageModel, REMOVED_USER_SENTINEL};
pub use pagination::{Page, PageRequest};
pub use router::build_router;
pub use shared::{AppError, AppState};
pub use user::models::UserModel;

// Public API - what other modules can use
pub use handlers::{create_user, delete_user, list_users, login, logout, search_users, update_user};
pub use service::UserService;

// Internal modules
mod handlers;
pub mod models;
pub mod repository;
mod service;
pub mod types;

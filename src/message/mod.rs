// Public API - what other modules can use
pub use handlers::{list_messages, send_message};
pub use service::MessageService;

// Internal modules
mod handlers;
pub mod models;
pub mod repository;
mod service;
pub mod types;

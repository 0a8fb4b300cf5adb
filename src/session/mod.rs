// Public API - what other modules can use
pub use middleware::{require_active_token, token_from_headers};
pub use registry::ActiveTokenRegistry;
pub use service::SessionService;
pub use token::TokenService;
pub use types::{AuthenticatedUser, TokenClaims};

// Internal modules
mod middleware;
mod registry;
mod service;
mod token;
mod types;

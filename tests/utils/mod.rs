pub mod actions;
pub mod setup;

// Re-export main utilities for use by test files
#[allow(unused_imports)]
pub use actions::TestResponse;
#[allow(unused_imports)]
pub use setup::{profile, TestApp, TestAppBuilder, ADMIN, ADMIN_PASSWORD};

pub mod admin_handlers;
pub mod app;
pub mod config;
pub mod credentials;
pub mod metrics;
pub mod tokens;
pub mod user_handlers;

pub use app::{build_router, AppState};

// Social network - posts, groups, comments and follows over a JSON HTTP surface

pub mod app_state;
pub mod config;
pub mod database;
pub mod error;
pub mod forms;
pub mod handlers;
pub mod infrastructure;
pub mod models;
pub mod router;

// Re-exports for convenience
pub use error::{AppError, AppResult};

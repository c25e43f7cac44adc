pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod validation;

pub use app::{build_router, AppState};
pub use config::Config;
pub use error::{AppError, AppResult};

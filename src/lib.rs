//! Local library server
//!
//! REST JSON API for a small lending library: a catalog of books, authors,
//! genres and languages, the physical copies of each book, and a renewal
//! workflow for copies on loan.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::Database;

/// Shared state handed to every Axum handler: the typed config loaded once
/// at startup and the database pool. Both are cheap to clone (`Arc`/`PgPool`
/// internally), so handlers receive `Arc<AppState>` rather than cloning the
/// whole struct per request.
pub struct AppState {
    pub config: AppConfig,
    pub db: Database,
}

pub type SharedState = Arc<AppState>;

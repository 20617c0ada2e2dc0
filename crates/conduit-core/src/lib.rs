pub mod article;
pub mod auth;
pub mod comment;
pub mod error;
pub mod profile;
pub mod tag;
pub mod user;

use std::sync::Arc;

use conduit_db::DbPool;

/// Runtime settings the domain layer needs. The server crate owns the
/// full config file; only this slice crosses into the services.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub jwt_secret: String,
    pub jwt_expiry_secs: u64,
    pub registration_enabled: bool,
    pub worker_id: u16,
}

/// Shared state handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(db: DbPool, config: AppConfig) -> AppState {
        AppState {
            db,
            config: Arc::new(config),
        }
    }
}

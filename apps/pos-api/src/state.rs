//! Shared application state handed to every handler.

use std::sync::Arc;

use zimpos_db::{CheckoutService, Database};

use crate::config::ApiConfig;

/// Cheap to clone: the pool and the gateway are reference counted.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
    pub checkout: CheckoutService,
    pub config: Arc<ApiConfig>,
}

impl AppState {
    pub fn new(db: Database, config: ApiConfig) -> Self {
        let checkout = db.checkout(config.fiscal_mode.gateway());
        AppState {
            db,
            checkout,
            config: Arc::new(config),
        }
    }
}

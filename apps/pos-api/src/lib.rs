//! # ZimPOS API
//!
//! HTTP front end for the till: cashier sessions and the make-sale
//! pipeline.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          POS API Server                                 │
//! │                                                                         │
//! │  Till ──► HTTP (8000) ──► TraceLayer ──► CashierId ──► handlers::pos    │
//! │                                                            │            │
//! │                                                            ▼            │
//! │                                        zimpos-db (SQLite, checkout)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod auth;
pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod state;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use config::{ApiConfig, ConfigError, FiscalMode};
pub use error::{ApiError, ApiResult};
pub use state::AppState;

/// Builds the application router.
pub fn app(state: AppState) -> Router {
    let pos = Router::new()
        .route("/start-session/", post(handlers::pos::start_session))
        .route("/end-session/", post(handlers::pos::end_session))
        .route("/make-sale/", post(handlers::pos::make_sale))
        .route("/sales/{id}", get(handlers::pos::get_sale))
        .route(
            "/sales/{id}/fiscalization",
            get(handlers::pos::sale_fiscalization),
        )
        .route("/sessions/{id}/sales", get(handlers::pos::session_sales));

    Router::new()
        .route("/health", get(handlers::health::health))
        .nest("/pos", pos)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

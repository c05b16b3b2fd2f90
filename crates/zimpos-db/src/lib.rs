//! # zimpos-db: Database Layer for ZimPOS
//!
//! SQLite storage for the ZimPOS backend and the make-sale transaction.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         ZimPOS Data Flow                                │
//! │                                                                         │
//! │  POST /pos/make-sale/ (pos-api)                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     zimpos-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐   ┌────────────────┐   ┌───────────────┐   │   │
//! │  │   │   Database    │   │ CheckoutService│   │  Migrations   │   │   │
//! │  │   │   (pool.rs)   │◄──│ (checkout.rs)  │   │  (embedded)   │   │   │
//! │  │   │               │   │       │        │   │               │   │   │
//! │  │   │ SqlitePool    │   │       ▼        │   │ 001_initial_  │   │   │
//! │  │   │ Repositories  │◄──│ repository/*   │   │   schema.sql  │   │   │
//! │  │   └───────────────┘   └────────────────┘   └───────────────┘   │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  SQLite Database (WAL mode)                     │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database and checkout error types
//! - [`repository`] - One repository per aggregate
//! - [`checkout`] - The make-sale pipeline
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use zimpos_core::fiscal::SimulatedFiscalGateway;
//! use zimpos_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./zimpos.db")).await?;
//! db.sessions().start("cashier-1", &store_id, Money::zero()).await?;
//!
//! let completed = db
//!     .checkout(Arc::new(SimulatedFiscalGateway))
//!     .make_sale("cashier-1", request)
//!     .await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checkout;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use checkout::{CheckoutService, CompletedSale, SettlementOutcome};
pub use error::{CheckoutError, CheckoutResult, DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::fiscal::{FiscalRepository, FiscalSettings};
pub use repository::inventory::InventoryRepository;
pub use repository::ledger::{LedgerRepository, NewLedgerAccount};
pub use repository::product::{NewProduct, ProductRepository};
pub use repository::sale::SaleRepository;
pub use repository::service::{NewService, ServiceRepository};
pub use repository::session::{SessionRepository, SessionStart};
pub use repository::store::StoreRepository;

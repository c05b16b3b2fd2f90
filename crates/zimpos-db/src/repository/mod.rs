//! # Repository Module
//!
//! Database access for ZimPOS, one repository per aggregate.
//!
//! ## Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  db.products().restock(..)         pool-level methods (own connection)  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ProductRepository ──► fetch_active_product(conn, ..)                   │
//! │                        deduct_stock(conn, ..)                           │
//! │                              ▲                                          │
//! │                              │  pub(crate) helpers take                 │
//! │                              │  &mut SqliteConnection so the            │
//! │  CheckoutService ────────────┘  checkout transaction can reuse them     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`store::StoreRepository`] - Businesses and stores
//! - [`product::ProductRepository`] - Products, stock levels, restocking
//! - [`service::ServiceRepository`] - Non-stocked service items
//! - [`inventory::InventoryRepository`] - Stock movement history
//! - [`session::SessionRepository`] - Cashier sessions
//! - [`sale::SaleRepository`] - Sale and sale item reads
//! - [`ledger::LedgerRepository`] - Tills, mobile money and bank accounts
//! - [`fiscal::FiscalRepository`] - ZIMRA configuration and submission log

pub mod fiscal;
pub mod inventory;
pub mod ledger;
pub mod product;
pub mod sale;
pub mod service;
pub mod session;
pub mod store;

//! # Seed Data Generator
//!
//! Populates a database with one business, one store, its three ledger
//! accounts, a small catalog and a fiscal configuration.
//!
//! ## Usage
//! ```bash
//! cargo run -p zimpos-db --bin seed
//!
//! # Specify database path
//! cargo run -p zimpos-db --bin seed -- --db ./data/zimpos.db
//! ```
//!
//! The printed store id is what a cashier passes to `/pos/start-session/`.

use std::env;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use zimpos_core::{LedgerKind, Money, DEFAULT_CURRENCY, DEFAULT_VAT_RATE_BPS};
use zimpos_db::{Database, DbConfig, FiscalSettings, NewLedgerAccount, NewProduct, NewService};

/// `(sku, name, price, cost, stock)`
const PRODUCTS: &[(&str, &str, &str, &str, i64)] = &[
    ("BRD-WHT-700", "White Bread 700g", "1.20", "0.85", 40),
    ("MLK-FRS-2L", "Fresh Milk 2L", "2.50", "1.90", 25),
    ("MLL-ROL-10", "Roller Meal 10kg", "8.00", "6.10", 30),
    ("OIL-COO-2L", "Cooking Oil 2L", "4.75", "3.60", 18),
    ("SUG-BRN-2K", "Brown Sugar 2kg", "2.90", "2.10", 22),
    ("SOP-BAR-01", "Laundry Soap Bar", "0.90", "0.55", 60),
    ("AIR-ECO-05", "Airtime Voucher $5", "5.00", "4.80", 100),
    ("CHK-PCS-1K", "Chicken Pieces 1kg", "5.50", "4.20", 12),
];

/// `(code, name, price)`
const SERVICES: &[(&str, &str, &str)] = &[
    ("PRN-A4", "A4 Printing (per page)", "0.10"),
    ("PHN-CHG", "Phone Charging", "0.50"),
    ("DLV-LOC", "Local Delivery", "3.00"),
];

const ACCOUNTS: &[(LedgerKind, &str)] = &[
    (LedgerKind::CashTill, "Till 1"),
    (LedgerKind::MobileMoney, "EcoCash Merchant"),
    (LedgerKind::Bank, "CBZ Current Account"),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    let mut db_path = String::from("./zimpos.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("ZimPOS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./zimpos.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            other => anyhow::bail!("unknown argument: {other}"),
        }
        i += 1;
    }

    let db = Database::new(DbConfig::new(&db_path))
        .await
        .with_context(|| format!("opening {db_path}"))?;

    let business = db.stores().create_business("Kudzai General Dealer").await?;
    let store = db
        .stores()
        .create_store(&business.id, "Mbare Branch", Some("VAT-10012345"))
        .await?;

    for (kind, name) in ACCOUNTS {
        db.ledger()
            .create_account(NewLedgerAccount {
                store_id: store.id.clone(),
                kind: *kind,
                account_name: name.to_string(),
                currency_code: Some(DEFAULT_CURRENCY.to_string()),
                opening_balance: Money::zero(),
            })
            .await?;
    }

    for (sku, name, price, cost, stock) in PRODUCTS {
        db.products()
            .insert(NewProduct {
                business_id: business.id.clone(),
                store_id: Some(store.id.clone()),
                sku: sku.to_string(),
                name: name.to_string(),
                unit_price: Money::parse(price).with_context(|| format!("price of {sku}"))?,
                cost_price: Money::parse(cost).with_context(|| format!("cost of {sku}"))?,
                quantity_in_stock: *stock,
            })
            .await?;
    }

    for (code, name, price) in SERVICES {
        db.services()
            .insert(NewService {
                business_id: business.id.clone(),
                store_id: None,
                service_code: code.to_string(),
                name: name.to_string(),
                price: Money::parse(price).with_context(|| format!("price of {code}"))?,
            })
            .await?;
    }

    db.fiscal()
        .upsert_config(
            &business.id,
            FiscalSettings {
                vat_registration_number: "VAT-10012345".to_string(),
                is_vat_registered: true,
                vat_rate_bps: DEFAULT_VAT_RATE_BPS,
                currency_code: DEFAULT_CURRENCY.to_string(),
            },
        )
        .await?;

    println!("Seed complete");
    println!("  Database:  {db_path}");
    println!("  Business:  {}", business.id);
    println!("  Store:     {}", store.id);
    println!("  Products:  {}", PRODUCTS.len());
    println!("  Services:  {}", SERVICES.len());

    db.close().await;
    Ok(())
}

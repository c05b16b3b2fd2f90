//! POS API configuration.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use zimpos_core::fiscal::{DisabledFiscalGateway, FiscalGateway, SimulatedFiscalGateway};
use zimpos_core::validation::validate_currency_code;
use zimpos_core::DEFAULT_CURRENCY;

/// POS API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Listen address
    pub host: IpAddr,

    /// Listen port
    pub port: u16,

    /// SQLite database file
    pub database_path: PathBuf,

    /// Pool size
    pub db_max_connections: u32,

    /// Currency shown on receipts
    pub default_currency: String,

    /// How receipts are submitted to ZIMRA
    pub fiscal_mode: FiscalMode,
}

/// Which [`FiscalGateway`] the checkout uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FiscalMode {
    /// Receipt numbers issued locally.
    Simulated,
    /// Every submission fails; sales still complete.
    Disabled,
}

impl FiscalMode {
    pub fn gateway(&self) -> Arc<dyn FiscalGateway> {
        match self {
            FiscalMode::Simulated => Arc::new(SimulatedFiscalGateway),
            FiscalMode::Disabled => Arc::new(DisabledFiscalGateway),
        }
    }
}

impl FromStr for FiscalMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "simulated" => Ok(FiscalMode::Simulated),
            "disabled" | "off" => Ok(FiscalMode::Disabled),
            _ => Err(()),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            host: IpAddr::from([0, 0, 0, 0]),
            port: 8000,
            database_path: PathBuf::from("./zimpos.db"),
            db_max_connections: 5,
            default_currency: DEFAULT_CURRENCY.to_string(),
            fiscal_mode: FiscalMode::Simulated,
        }
    }
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ApiConfig::default();

        let config = ApiConfig {
            host: parse_or(&lookup, "ZIMPOS_HOST", defaults.host)?,
            port: parse_or(&lookup, "ZIMPOS_PORT", defaults.port)?,
            database_path: lookup("ZIMPOS_DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.database_path),
            db_max_connections: parse_or(
                &lookup,
                "ZIMPOS_DB_MAX_CONNECTIONS",
                defaults.db_max_connections,
            )?,
            default_currency: lookup("ZIMPOS_DEFAULT_CURRENCY")
                .unwrap_or(defaults.default_currency),
            fiscal_mode: parse_or(&lookup, "ZIMPOS_FISCAL_MODE", defaults.fiscal_mode)?,
        };

        if config.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue(
                "ZIMPOS_DB_MAX_CONNECTIONS".to_string(),
            ));
        }
        validate_currency_code(&config.default_currency)
            .map_err(|_| ConfigError::InvalidValue("ZIMPOS_DEFAULT_CURRENCY".to_string()))?;

        Ok(config)
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(name.to_string())),
        None => Ok(default),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

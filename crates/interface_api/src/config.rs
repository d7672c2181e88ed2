//! API configuration

use core_kernel::{CoreError, CurrencyRegistry};
use domain_billing::MalformedRowPolicy;
use serde::Deserialize;

/// API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Database URL
    pub database_url: String,
    /// Log level
    pub log_level: String,
    /// Currency every bill total is normalized into
    pub base_currency: String,
    /// How malformed line-item rows are handled on bill creation
    pub row_policy: MalformedRowPolicy,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            database_url: "postgres://localhost/bills".to_string(),
            log_level: "info".to_string(),
            base_currency: "EUR".to_string(),
            row_policy: MalformedRowPolicy::Reject,
        }
    }
}

impl ApiConfig {
    /// Loads configuration from `BILLS_*` environment variables over the defaults
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let defaults = Self::default();
        config::Config::builder()
            .set_default("host", defaults.host)?
            .set_default("port", i64::from(defaults.port))?
            .set_default("database_url", defaults.database_url)?
            .set_default("log_level", defaults.log_level)?
            .set_default("base_currency", defaults.base_currency)?
            .set_default("row_policy", "reject")?
            .add_source(config::Environment::with_prefix("BILLS").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Builds the currency registry for the configured base currency
    pub fn registry(&self) -> Result<CurrencyRegistry, CoreError> {
        CurrencyRegistry::from_code(&self.base_currency)
    }
}

//! Application settings loading from config.toml
//!
//! Every field has a default, so a missing file or a file with only some sections
//! still yields a usable configuration.

use crate::config::database::DEFAULT_DATABASE_URL;
use crate::core::subscription::SubscriptionPlan;
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    /// `SeaORM` connection string; `DATABASE_URL` overrides it
    pub database_url: String,
    /// Trial and renewal terms
    pub subscription: SubscriptionPlan,
    /// Receipt rendering options
    pub receipt: ReceiptConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            subscription: SubscriptionPlan::default(),
            receipt: ReceiptConfig::default(),
        }
    }
}

/// Receipt rendering options
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ReceiptConfig {
    /// Symbol printed before every amount
    pub currency_symbol: String,
}

impl Default for ReceiptConfig {
    fn default() -> Self {
        Self {
            currency_symbol: "₦".to_string(),
        }
    }
}

/// Loads the configuration from a TOML file
///
/// # Errors
/// Returns [`Error::Config`] if the file cannot be read, the TOML is invalid, or
/// the `[subscription]` plan fails [`SubscriptionPlan::validate`].
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    debug!("Attempting to load configuration from: {path_ref:?}");
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {path_ref:?}: {e}"),
    })?;

    let config: AppConfig = toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse TOML from config file {path_ref:?}: {e}"),
    })?;
    config.subscription.validate()?;
    Ok(config)
}

/// Loads the configuration used by the binary.
///
/// Reads the file named by `STOCKFLOW_CONFIG` (default `config.toml`). A missing
/// file falls back to defaults; an unreadable or invalid file is an error.
pub fn load_app_configuration() -> Result<AppConfig> {
    let path = std::env::var("STOCKFLOW_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
    if Path::new(&path).exists() {
        let config = load_config(&path)?;
        info!("Loaded configuration from {path}");
        Ok(config)
    } else {
        info!("No configuration file at {path}, using defaults");
        Ok(AppConfig::default())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
            database_url = "sqlite::memory:"

            [subscription]
            trial_days = 14
            initial_term_days = 45
            renewal_days = 31
            price = 750.0
            currency = "USD"

            [receipt]
            currency_symbol = "$"
        "#;

        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.subscription.trial_days, 14);
        assert_eq!(config.subscription.initial_term_days, 45);
        assert_eq!(config.subscription.renewal_days, 31);
        assert_eq!(config.subscription.price, 750.0);
        assert_eq!(config.subscription.currency, "USD");
        assert_eq!(config.receipt.currency_symbol, "$");
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.subscription, SubscriptionPlan::default());
        assert_eq!(config.receipt.currency_symbol, "₦");
    }

    #[test]
    fn test_load_config_rejects_out_of_range_plan() {
        let path = std::env::temp_dir().join(format!(
            "stockflow-plan-{}.toml",
            crate::core::entity_store::new_record_id()
        ));
        std::fs::write(&path, "[subscription]\ntrial_days = 4000000000\n").unwrap();

        let result = load_config(&path);
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("definitely/not/here.toml");
        assert!(matches!(result, Err(Error::Config { .. })));
    }
}

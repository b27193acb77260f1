//! # Application Configuration
//!
//! Paths and billing settings shared by both binaries.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Command-line flags (highest priority)                              │
//! │     --inventory ./inventory.csv  --bills ./bills.sqlite                │
//! │                                                                         │
//! │  2. Environment Variables                                              │
//! │     TALLY_INVENTORY_PATH, TALLY_BILLS_PATH, TALLY_TAX_BPS,             │
//! │     TALLY_CURRENCY_SYMBOL, TALLY_CLEAR_CART_ON_FAILURE,                │
//! │     TALLY_REVALIDATE_STOCK                                             │
//! │                                                                         │
//! │  3. TOML Config File                                                   │
//! │     ~/.config/tally-pos/tally.toml (Linux)                             │
//! │     ~/Library/Application Support/com.tally.pos/tally.toml (macOS)     │
//! │                                                                         │
//! │  4. Default Values (lowest priority)                                   │
//! │     Data files under the platform data directory, 18% GST              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [store]
//! name = "Corner Store"
//!
//! [paths]
//! inventory = "/srv/tally/inventory.csv"
//! bills = "/srv/tally/bills.sqlite"
//!
//! [billing]
//! tax_rate_bps = 1800
//! tax_label = "GST"
//! currency_symbol = "₹"
//! clear_cart_on_failure = false
//! revalidate_stock = true
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tally_core::validation::validate_tax_rate_bps;
use tally_core::{TaxRate, DEFAULT_TAX_NAME, DEFAULT_TAX_RATE_BPS};
use tally_store::BillingPolicy;
use thiserror::Error;
use tracing::{debug, info, warn};

const CONFIG_FILE: &str = "tally.toml";
const INVENTORY_FILE: &str = "inventory.csv";
const BILLS_FILE: &str = "bills.sqlite";

// =============================================================================
// Errors
// =============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to save config: {0}")]
    SaveFailed(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl From<toml::ser::Error> for ConfigError {
    fn from(err: toml::ser::Error) -> Self {
        ConfigError::SaveFailed(err.to_string())
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Sections
// =============================================================================

/// Store identity, printed in banners.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSettings {
    #[serde(default = "default_store_name")]
    pub name: String,
}

fn default_store_name() -> String {
    "Tally Store".to_string()
}

impl Default for StoreSettings {
    fn default() -> Self {
        StoreSettings {
            name: default_store_name(),
        }
    }
}

/// Data file locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathSettings {
    /// Inventory CSV file.
    #[serde(default = "default_inventory_path")]
    pub inventory: PathBuf,

    /// Bills archive file.
    #[serde(default = "default_bills_path")]
    pub bills: PathBuf,
}

fn default_inventory_path() -> PathBuf {
    default_data_dir().join(INVENTORY_FILE)
}

fn default_bills_path() -> PathBuf {
    default_data_dir().join(BILLS_FILE)
}

impl Default for PathSettings {
    fn default() -> Self {
        PathSettings {
            inventory: default_inventory_path(),
            bills: default_bills_path(),
        }
    }
}

/// Billing rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingSettings {
    /// Tax rate in basis points (1800 = 18%).
    #[serde(default = "default_tax_rate_bps")]
    pub tax_rate_bps: u32,

    /// Tax name on bills ("GST").
    #[serde(default = "default_tax_label")]
    pub tax_label: String,

    /// Currency symbol for terminal output.
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,

    /// Empty the cart when bill generation fails.
    #[serde(default)]
    pub clear_cart_on_failure: bool,

    /// Re-check stock against the inventory file right before finalizing.
    #[serde(default = "default_true")]
    pub revalidate_stock: bool,
}

fn default_tax_rate_bps() -> u32 {
    DEFAULT_TAX_RATE_BPS
}

fn default_tax_label() -> String {
    DEFAULT_TAX_NAME.to_string()
}

fn default_currency_symbol() -> String {
    "₹".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for BillingSettings {
    fn default() -> Self {
        BillingSettings {
            tax_rate_bps: default_tax_rate_bps(),
            tax_label: default_tax_label(),
            currency_symbol: default_currency_symbol(),
            clear_cart_on_failure: false,
            revalidate_stock: true,
        }
    }
}

// =============================================================================
// App Config
// =============================================================================

/// Complete configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub store: StoreSettings,

    #[serde(default)]
    pub paths: PathSettings,

    #[serde(default)]
    pub billing: BillingSettings,
}

impl AppConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`config_path` or the platform default)
    /// 3. Environment variables
    ///
    /// Command-line flags are applied by the caller with
    /// [`AppConfig::override_paths`], followed by [`AppConfig::validate`].
    pub fn load(config_path: Option<&Path>) -> ConfigResult<Self> {
        let mut config = match config_path.map(Path::to_path_buf).or_else(Self::default_config_path) {
            Some(path) if path.exists() => {
                info!(path = %path.display(), "Loading config from file");
                let contents = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
                    path: path.clone(),
                    source,
                })?;
                toml::from_str(&contents)?
            }
            Some(path) => {
                debug!(path = %path.display(), "Config file not found, using defaults");
                Self::default()
            }
            None => Self::default(),
        };

        config.apply_overrides_from(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Writes the configuration as TOML, creating parent directories.
    pub fn save(&self, config_path: Option<&Path>) -> ConfigResult<PathBuf> {
        let path = config_path
            .map(Path::to_path_buf)
            .or_else(Self::default_config_path)
            .ok_or_else(|| ConfigError::SaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::SaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| ConfigError::SaveFailed(e.to_string()))?;

        info!(path = %path.display(), "Config saved");
        Ok(path)
    }

    /// Checks settings that would otherwise fail much later.
    pub fn validate(&self) -> ConfigResult<()> {
        validate_tax_rate_bps(self.billing.tax_rate_bps)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        if self.billing.tax_label.trim().is_empty() {
            return Err(ConfigError::Invalid("tax_label must not be empty".into()));
        }

        if self.paths.inventory.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("inventory path must not be empty".into()));
        }

        if self.paths.bills.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("bills path must not be empty".into()));
        }

        Ok(())
    }

    /// Applies overrides looked up by variable name.
    ///
    /// Takes a lookup function instead of reading the process environment
    /// directly so tests can supply their own values.
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup("TALLY_INVENTORY_PATH") {
            debug!(path = %path, "Overriding inventory path from environment");
            self.paths.inventory = PathBuf::from(path);
        }

        if let Some(path) = lookup("TALLY_BILLS_PATH") {
            debug!(path = %path, "Overriding bills path from environment");
            self.paths.bills = PathBuf::from(path);
        }

        if let Some(bps) = lookup("TALLY_TAX_BPS") {
            match bps.trim().parse::<u32>() {
                Ok(value) => self.billing.tax_rate_bps = value,
                Err(_) => warn!(value = %bps, "Ignoring non-numeric TALLY_TAX_BPS"),
            }
        }

        if let Some(symbol) = lookup("TALLY_CURRENCY_SYMBOL") {
            self.billing.currency_symbol = symbol;
        }

        if let Some(flag) = lookup("TALLY_CLEAR_CART_ON_FAILURE") {
            match parse_flag(&flag) {
                Some(value) => self.billing.clear_cart_on_failure = value,
                None => warn!(value = %flag, "Ignoring TALLY_CLEAR_CART_ON_FAILURE"),
            }
        }

        if let Some(flag) = lookup("TALLY_REVALIDATE_STOCK") {
            match parse_flag(&flag) {
                Some(value) => self.billing.revalidate_stock = value,
                None => warn!(value = %flag, "Ignoring TALLY_REVALIDATE_STOCK"),
            }
        }
    }

    /// Applies `--inventory` / `--bills` flags.
    pub fn override_paths(&mut self, inventory: Option<PathBuf>, bills: Option<PathBuf>) {
        if let Some(path) = inventory {
            self.paths.inventory = path;
        }
        if let Some(path) = bills {
            self.paths.bills = path;
        }
    }

    /// Billing engine rules derived from the `[billing]` section.
    pub fn billing_policy(&self) -> BillingPolicy {
        BillingPolicy {
            tax_rate: TaxRate::from_bps(self.billing.tax_rate_bps),
            tax_name: self.billing.tax_label.clone(),
            clear_cart_on_failure: self.billing.clear_cart_on_failure,
            revalidate_stock: self.billing.revalidate_stock,
        }
    }

    /// Platform config file location.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "tally", "pos")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }
}

/// Platform data directory, or the working directory when none is known.
fn default_data_dir() -> PathBuf {
    directories::ProjectDirs::from("com", "tally", "pos")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.billing.tax_rate_bps, 1800);
        assert_eq!(config.billing.tax_label, "GST");
        assert!(config.billing.revalidate_stock);
        assert!(!config.billing.clear_cart_on_failure);
        assert!(config.paths.inventory.ends_with("inventory.csv"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("TALLY_INVENTORY_PATH", "/tmp/inv.csv"),
            ("TALLY_TAX_BPS", "500"),
            ("TALLY_CURRENCY_SYMBOL", "$"),
            ("TALLY_CLEAR_CART_ON_FAILURE", "yes"),
            ("TALLY_REVALIDATE_STOCK", "off"),
        ]);
        let mut config = AppConfig::default();
        config.apply_overrides_from(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.paths.inventory, PathBuf::from("/tmp/inv.csv"));
        assert_eq!(config.billing.tax_rate_bps, 500);
        assert_eq!(config.billing.currency_symbol, "$");
        assert!(config.billing.clear_cart_on_failure);
        assert!(!config.billing.revalidate_stock);
    }

    #[test]
    fn test_bad_env_values_ignored() {
        let mut config = AppConfig::default();
        config.apply_overrides_from(|key| match key {
            "TALLY_TAX_BPS" => Some("eighteen".to_string()),
            "TALLY_REVALIDATE_STOCK" => Some("maybe".to_string()),
            _ => None,
        });
        assert_eq!(config.billing.tax_rate_bps, 1800);
        assert!(config.billing.revalidate_stock);
    }

    #[test]
    fn test_validation() {
        let mut config = AppConfig::default();
        config.billing.tax_rate_bps = 10001;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = AppConfig::default();
        config.billing.tax_label = " ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf/tally.toml");

        let mut config = AppConfig::default();
        config.store.name = "Corner Store".to_string();
        config.paths.inventory = dir.path().join("inventory.csv");
        config.save(Some(path.as_path())).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("[billing]"));

        let parsed: AppConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let parsed: AppConfig = toml::from_str("[billing]\ntax_rate_bps = 500\n").unwrap();
        assert_eq!(parsed.billing.tax_rate_bps, 500);
        assert_eq!(parsed.billing.tax_label, "GST");
        assert_eq!(parsed.store.name, "Tally Store");
    }

    #[test]
    fn test_billing_policy() {
        let mut config = AppConfig::default();
        config.billing.tax_label = "VAT".to_string();
        let policy = config.billing_policy();
        assert_eq!(policy.tax_rate.bps(), 1800);
        assert_eq!(policy.tax_name, "VAT");
    }
}

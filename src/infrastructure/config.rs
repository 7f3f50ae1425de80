//! Configuration infrastructure
//!
//! Contains configuration loading and management for the import passes.
//!
//! Configuration is organized into three sections:
//! 1. `api`: how to reach the shop webservice
//! 2. `import`: input files and catalog conversion settings
//! 3. `logging`: log level and outputs
//!
//! Sources are layered: built-in defaults, then the config file, then
//! `CATALOG_SYNC__SECTION__KEY` environment variables, then the plain
//! `PRESTASHOP_URL` / `API_KEY` variables the shop setup already exports.

#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::info;

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Webservice connection settings
    pub api: ApiConfig,

    /// Input files and conversion settings
    pub import: ImportConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Webservice connection settings
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the webservice, e.g. `https://localhost:8443/api`
    pub base_url: String,

    /// Webservice key, sent as the basic-auth user name
    pub api_key: String,

    /// Verify the shop's TLS certificate (turn off for self-signed dev shops)
    pub verify_tls: bool,

    /// Request timeout in seconds
    pub timeout_seconds: u64,

    /// Request pacing; 0 disables it
    pub max_requests_per_second: u32,

    /// Language id used for localized fields
    pub language_id: u32,

    /// User agent string
    pub user_agent: String,
}

/// Input files and catalog conversion settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Scraped category tree (JSON)
    pub categories_file: PathBuf,

    /// Scraped products with details (JSON)
    pub products_file: PathBuf,

    /// Directory holding one `<source id>_<name>` folder per product
    pub images_dir: PathBuf,

    /// Default category; parent of top-level imported categories
    pub home_category_id: String,

    /// Gross price divided by this gives the net price
    pub tax_multiplier: f64,

    /// Tax rules group assigned to created products
    pub tax_rules_group_id: u32,

    /// Length of the short description in characters
    pub short_description_chars: usize,

    /// Shop id used in stock records
    pub shop_id: u32,

    /// Inclusive range for generated stock quantities
    pub stock_min: u32,
    pub stock_max: u32,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Enable JSON formatted logs (file output only)
    pub json_format: bool,

    /// Enable console output
    pub console_output: bool,

    /// Enable file output
    pub file_output: bool,

    /// Log directory; defaults to `logs/` next to the executable
    pub log_dir: Option<PathBuf>,

    /// Module-specific log level filters (e.g., "reqwest": "info")
    pub module_filters: HashMap<String, String>,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &if self.api_key.is_empty() { "<unset>" } else { "<redacted>" })
            .field("verify_tls", &self.verify_tls)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("max_requests_per_second", &self.max_requests_per_second)
            .field("language_id", &self.language_id)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::BASE_URL.to_string(),
            api_key: String::new(),
            verify_tls: defaults::VERIFY_TLS,
            timeout_seconds: defaults::REQUEST_TIMEOUT_SECONDS,
            max_requests_per_second: defaults::MAX_REQUESTS_PER_SECOND,
            language_id: defaults::LANGUAGE_ID,
            user_agent: defaults::USER_AGENT.to_string(),
        }
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            categories_file: PathBuf::from(defaults::CATEGORIES_FILE),
            products_file: PathBuf::from(defaults::PRODUCTS_FILE),
            images_dir: PathBuf::from(defaults::IMAGES_DIR),
            home_category_id: defaults::HOME_CATEGORY_ID.to_string(),
            tax_multiplier: defaults::TAX_MULTIPLIER,
            tax_rules_group_id: defaults::TAX_RULES_GROUP_ID,
            short_description_chars: defaults::SHORT_DESCRIPTION_CHARS,
            shop_id: defaults::SHOP_ID,
            stock_min: defaults::STOCK_MIN,
            stock_max: defaults::STOCK_MAX,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            json_format: defaults::LOG_JSON_FORMAT,
            console_output: defaults::LOG_CONSOLE_OUTPUT,
            file_output: defaults::LOG_FILE_OUTPUT,
            log_dir: None,
            module_filters: {
                let mut filters = HashMap::new();
                filters.insert("reqwest".to_string(), "info".to_string());
                filters.insert("hyper".to_string(), "warn".to_string());
                filters.insert("hyper_util".to_string(), "warn".to_string());
                filters.insert("catalog_sync_lib".to_string(), defaults::LOG_LEVEL.to_string());
                filters
            },
        }
    }
}

impl AppConfig {
    /// Reject settings no pass can run with.
    pub fn validate(&self) -> Result<()> {
        if self.api.api_key.trim().is_empty() {
            bail!("Webservice key missing: set API_KEY or api.api_key in the config file");
        }
        url::Url::parse(&self.api.base_url)
            .with_context(|| format!("Invalid api.base_url: {}", self.api.base_url))?;
        if !(self.import.tax_multiplier.is_finite() && self.import.tax_multiplier > 0.0) {
            bail!("import.tax_multiplier must be a positive number");
        }
        if self.import.stock_min > self.import.stock_max {
            bail!(
                "import.stock_min ({}) is greater than import.stock_max ({})",
                self.import.stock_min,
                self.import.stock_max
            );
        }
        if self.import.home_category_id.trim().is_empty() {
            bail!("import.home_category_id must not be empty");
        }
        Ok(())
    }
}

/// Configuration manager for loading settings
pub struct ConfigManager {
    pub config_path: PathBuf,
    /// Whether the file must exist (true when given explicitly)
    required: bool,
}

impl ConfigManager {
    /// Get the application configuration directory
    pub fn get_config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get user config directory")?
            .join("catalog-sync");

        Ok(config_dir)
    }

    /// Configuration manager for the default per-user config file
    pub fn new() -> Result<Self> {
        let config_path = Self::get_config_dir()?.join("config.toml");
        Ok(Self {
            config_path,
            required: false,
        })
    }

    /// Configuration manager for an explicit config file, which must exist
    pub fn with_path(path: impl AsRef<Path>) -> Self {
        Self {
            config_path: path.as_ref().to_path_buf(),
            required: true,
        }
    }

    /// Load configuration from all sources, including the process environment
    pub fn load_config(&self) -> Result<AppConfig> {
        let env: HashMap<String, String> = std::env::vars().collect();
        self.load_config_with_env(&env)
    }

    /// Load configuration using the given environment map
    pub fn load_config_with_env(&self, env: &HashMap<String, String>) -> Result<AppConfig> {
        let defaults = config::Config::try_from(&AppConfig::default())
            .context("Failed to serialize default configuration")?;

        let mut builder = config::Config::builder()
            .add_source(defaults)
            .add_source(config::File::from(self.config_path.as_path()).required(self.required))
            .add_source(
                config::Environment::with_prefix("CATALOG_SYNC")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .source(Some(env.clone().into_iter().collect())),
            );

        if let Some(url) = env.get("PRESTASHOP_URL") {
            builder = builder.set_override("api.base_url", url.as_str())?;
        }
        if let Some(key) = env.get("API_KEY") {
            builder = builder.set_override("api.api_key", key.as_str())?;
        }

        let app_config: AppConfig = builder
            .build()
            .with_context(|| format!("Failed to read configuration file: {:?}", self.config_path))?
            .try_deserialize()
            .context("Configuration has invalid values")?;

        if self.config_path.exists() {
            info!("Loaded configuration from: {:?}", self.config_path);
        }
        Ok(app_config)
    }
}

/// Default configuration values
pub mod defaults {
    /// Default webservice URL of a local development shop
    pub const BASE_URL: &str = "https://localhost:8443/api";

    /// Default TLS verification
    pub const VERIFY_TLS: bool = true;

    /// Default request timeout in seconds
    pub const REQUEST_TIMEOUT_SECONDS: u64 = 30;

    /// Default request pacing (0 = no pacing)
    pub const MAX_REQUESTS_PER_SECOND: u32 = 0;

    /// Default language id for localized fields
    pub const LANGUAGE_ID: u32 = 1;

    /// Default user agent
    pub const USER_AGENT: &str = concat!("catalog-sync/", env!("CARGO_PKG_VERSION"));

    /// Default category tree input
    pub const CATEGORIES_FILE: &str = "data/categories.json";

    /// Default product input
    pub const PRODUCTS_FILE: &str = "data/products_with_details.json";

    /// Default images directory
    pub const IMAGES_DIR: &str = "data/images";

    /// Default category ("Home")
    pub const HOME_CATEGORY_ID: &str = "2";

    /// Default VAT multiplier (23%)
    pub const TAX_MULTIPLIER: f64 = 1.23;

    /// Default tax rules group
    pub const TAX_RULES_GROUP_ID: u32 = 1;

    /// Default short description length
    pub const SHORT_DESCRIPTION_CHARS: usize = 150;

    /// Default shop id
    pub const SHOP_ID: u32 = 1;

    /// Default stock quantity range
    pub const STOCK_MIN: u32 = 1;
    pub const STOCK_MAX: u32 = 9;

    // Log configuration defaults
    /// Default log level
    pub const LOG_LEVEL: &str = "info";

    /// Default JSON format setting
    pub const LOG_JSON_FORMAT: bool = false;

    /// Default console output setting
    pub const LOG_CONSOLE_OUTPUT: bool = true;

    /// Default file output setting
    pub const LOG_FILE_OUTPUT: bool = false;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect()
    }

    #[test]
    fn test_defaults_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager {
            config_path: dir.path().join("missing.toml"),
            required: false,
        };
        let config = manager.load_config_with_env(&HashMap::new()).unwrap();
        assert_eq!(config.api.base_url, defaults::BASE_URL);
        assert!((config.import.tax_multiplier - 1.23).abs() < f64::EPSILON);
        assert_eq!(config.import.home_category_id, "2");
        assert!(config.validate().is_err(), "api key is required");
    }

    #[test]
    fn test_file_and_env_layers() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[api]\nbase_url = \"https://shop.example/api\"\nverify_tls = false\n\n[import]\nstock_max = 5\n"
        )
        .unwrap();

        let manager = ConfigManager::with_path(file.path());
        let config = manager
            .load_config_with_env(&env(&[
                ("API_KEY", "SECRETKEY"),
                ("CATALOG_SYNC__API__TIMEOUT_SECONDS", "5"),
            ]))
            .unwrap();

        assert_eq!(config.api.base_url, "https://shop.example/api");
        assert!(!config.api.verify_tls);
        assert_eq!(config.api.api_key, "SECRETKEY");
        assert_eq!(config.api.timeout_seconds, 5);
        assert_eq!(config.import.stock_max, 5);
        assert_eq!(config.import.stock_min, defaults::STOCK_MIN);
        config.validate().unwrap();
    }

    #[test]
    fn test_prestashop_url_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager {
            config_path: dir.path().join("none.toml"),
            required: false,
        };
        let config = manager
            .load_config_with_env(&env(&[("PRESTASHOP_URL", "http://127.0.0.1:8080/api")]))
            .unwrap();
        assert_eq!(config.api.base_url, "http://127.0.0.1:8080/api");
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let manager = ConfigManager::with_path("/definitely/not/here.toml");
        assert!(manager.load_config_with_env(&HashMap::new()).is_err());
    }

    #[test]
    fn test_validate_stock_range() {
        let mut config = AppConfig::default();
        config.api.api_key = "KEY".into();
        config.import.stock_min = 10;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let mut api = ApiConfig::default();
        api.api_key = "SECRETKEY".into();
        assert!(!format!("{api:?}").contains("SECRETKEY"));
    }
}

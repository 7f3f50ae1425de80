//! Infrastructure layer for the shop webservice and the local environment
//!
//! This module provides the HTTP client, XML codec, configuration loading
//! and logging setup used by the import passes.

pub mod api_error; // Typed webservice errors
pub mod config; // Layered configuration
pub mod logging; // Logging infrastructure
pub mod prestashop_client; // Webservice client
pub mod xml_codec; // quick-xml based document codec

// Re-export commonly used items
pub use api_error::{ApiError, ApiResult};
pub use config::{ApiConfig, AppConfig, ConfigManager, ImportConfig, LoggingConfig};
pub use logging::{get_log_directory, init_logging_with_config};
pub use prestashop_client::PrestashopClient;

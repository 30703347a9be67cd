//! Configuration module for kindle-relay.
//!
//! This module handles:
//! - Loading configuration from TOML files
//! - Delivery mode and output format selection
//! - Configuration validation

pub mod loader;
pub mod modes;
pub mod validation;

pub use loader::{
    default_config_path, ApiConfig, Config, ConverterConfig, DeliveryConfig, PipelineConfig,
    SmtpConfig, TelegramConfig, CONFIG_FILE_NAME, TELEGRAM_MAX_FILE_SIZE,
};
pub use modes::{ApiProvider, DeliveryMode, OutputFormat};
pub use validation::validate_config;

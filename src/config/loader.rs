//! Configuration structures and loading logic.

use crate::config::modes::{ApiProvider, DeliveryMode, OutputFormat};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Telegram Bot API file download limit.
pub const TELEGRAM_MAX_FILE_SIZE: u64 = 20 * 1024 * 1024;

/// Main configuration structure.
///
/// Built once at startup and shared read-only afterwards.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub telegram: TelegramConfig,

    #[serde(default)]
    pub pipeline: PipelineConfig,

    #[serde(default)]
    pub converter: ConverterConfig,

    #[serde(default)]
    pub delivery: DeliveryConfig,
}

/// Chat transport configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot token issued by BotFather.
    #[serde(default)]
    pub bot_token: String,

    /// Bot API base URL.
    #[serde(default = "default_telegram_api")]
    pub api_base_url: String,

    /// Long polling timeout passed to getUpdates.
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_seconds: u64,

    /// HTTP request timeout for Bot API calls.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,

    /// Chats allowed to submit documents. Empty means any chat.
    #[serde(default)]
    pub allowed_chat_ids: Vec<i64>,

    /// Largest document accepted for download, in bytes.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            api_base_url: default_telegram_api(),
            poll_timeout_seconds: default_poll_timeout(),
            request_timeout_seconds: default_request_timeout(),
            allowed_chat_ids: Vec::new(),
            max_file_size: default_max_file_size(),
        }
    }
}

/// Pipeline options.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Managed directory for staged files.
    #[serde(default)]
    pub staging_directory: Option<PathBuf>,

    /// Format handed to delivery.
    #[serde(default)]
    pub output_format: OutputFormat,

    /// Append a short content hash to staged names.
    #[serde(default)]
    pub unique_names: bool,
}

/// External conversion engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConverterConfig {
    /// Conversion program.
    #[serde(default = "default_converter_program")]
    pub program: String,

    /// Arguments; `{input}` and `{output}` are replaced by the staged paths.
    #[serde(default = "default_converter_args")]
    pub args: Vec<String>,

    /// Arguments of the availability probe run before first use.
    #[serde(default = "default_probe_args")]
    pub probe_args: Vec<String>,

    /// Locale exported to the engine. Falls back to the process locale.
    #[serde(default)]
    pub locale: Option<String>,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            program: default_converter_program(),
            args: default_converter_args(),
            probe_args: default_probe_args(),
            locale: None,
        }
    }
}

/// Delivery configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// Active delivery channel.
    #[serde(default)]
    pub mode: DeliveryMode,

    /// Destination address (e.g. the Kindle address).
    #[serde(default)]
    pub recipient: String,

    /// Subject line, passed through verbatim.
    #[serde(default = "default_subject")]
    pub subject: String,

    /// Plain text body accompanying the attachment.
    #[serde(default = "default_body")]
    pub body: String,

    #[serde(default)]
    pub smtp: SmtpConfig,

    #[serde(default)]
    pub api: ApiConfig,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            mode: DeliveryMode::default(),
            recipient: String::new(),
            subject: default_subject(),
            body: default_body(),
            smtp: SmtpConfig::default(),
            api: ApiConfig::default(),
        }
    }
}

/// SMTP relay settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    #[serde(default = "default_smtp_host")]
    pub host: String,

    #[serde(default = "default_smtp_port")]
    pub port: u16,

    /// Sender address, also used as the login name unless `username` is set.
    #[serde(default)]
    pub from: String,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: String,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: default_smtp_host(),
            port: default_smtp_port(),
            from: String::new(),
            username: None,
            password: String::new(),
        }
    }
}

impl SmtpConfig {
    /// Login name for the relay.
    pub fn login(&self) -> &str {
        self.username.as_deref().unwrap_or(&self.from)
    }
}

/// HTTP email API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default)]
    pub provider: ApiProvider,

    #[serde(default)]
    pub api_key: String,

    #[serde(default)]
    pub from_address: String,

    /// Overrides the provider's default endpoint.
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Request timeout for the provider call in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            provider: ApiProvider::default(),
            api_key: String::new(),
            from_address: String::new(),
            endpoint: None,
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

impl ApiConfig {
    /// Effective send endpoint.
    pub fn endpoint(&self) -> &str {
        self.endpoint
            .as_deref()
            .unwrap_or_else(|| self.provider.endpoint())
    }
}

fn default_telegram_api() -> String {
    "https://api.telegram.org".to_string()
}

fn default_poll_timeout() -> u64 {
    30
}

fn default_request_timeout() -> u64 {
    60
}

fn default_max_file_size() -> u64 {
    TELEGRAM_MAX_FILE_SIZE
}

fn default_converter_program() -> String {
    "ebook-convert".to_string()
}

fn default_converter_args() -> Vec<String> {
    vec!["{input}".to_string(), "{output}".to_string()]
}

fn default_probe_args() -> Vec<String> {
    vec!["--version".to_string()]
}

fn default_subject() -> String {
    "Convert".to_string()
}

fn default_body() -> String {
    "Sent by kindle-relay.".to_string()
}

fn default_smtp_host() -> String {
    "smtp.gmail.com".to_string()
}

fn default_smtp_port() -> u16 {
    465
}

/// Configuration file name looked up when `--config` is not given.
pub const CONFIG_FILE_NAME: &str = "kindle-relay.toml";

/// Resolve the configuration file path.
///
/// Prefers `kindle-relay.toml` in the working directory, then the per-user
/// config directory (e.g. `~/.config/kindle-relay/kindle-relay.toml`).
pub fn default_config_path() -> PathBuf {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return local;
    }

    directories::ProjectDirs::from("", "", "kindle-relay")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
        .unwrap_or(local)
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::Config(format!(
                    "Configuration file not found: {}. Create one from kindle-relay.example.toml",
                    path.display()
                ))
            } else {
                Error::Io(e)
            }
        })?;

        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Get the effective staging directory.
    pub fn staging_directory(&self) -> PathBuf {
        self.pipeline
            .staging_directory
            .clone()
            .unwrap_or_else(|| PathBuf::from("downloads"))
    }

    /// Whether a converter is part of the pipeline.
    pub fn converts(&self) -> bool {
        self.pipeline.output_format.needs_conversion()
    }
}

//! Error types for the kindle-relay application.

use thiserror::Error;

/// Main error type for the application.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration value for '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    #[error("Missing required configuration: {0}")]
    MissingConfig(String),

    // Naming errors
    #[error("Invalid filename: {0}")]
    InvalidName(String),

    // Transport errors
    #[error("Telegram API error: {0}")]
    Telegram(String),

    #[error("Download failed: {0}")]
    Download(String),

    #[error("File too large: {size} bytes (limit {limit} bytes)")]
    FileTooLarge { size: u64, limit: u64 },

    // Conversion errors
    #[error("Conversion failed: {0}")]
    Conversion(String),

    #[error("Converter '{0}' not found. Install calibre and ensure ebook-convert is in your PATH.")]
    ConverterNotFound(String),

    // Delivery errors
    #[error("Delivery failed: {0}")]
    Delivery(String),

    #[error("Delivery rejected with HTTP {status}: {body}")]
    DeliveryRejected { status: u16, body: String },

    // Cleanup errors
    #[error("Cleanup failed for {path}: {source}")]
    Cleanup {
        path: String,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Mail errors (boxed to reduce enum size)
    #[error("SMTP error: {0}")]
    Smtp(Box<lettre::transport::smtp::Error>),

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    // URL parsing errors
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

impl From<lettre::transport::smtp::Error> for Error {
    fn from(err: lettre::transport::smtp::Error) -> Self {
        Error::Smtp(Box::new(err))
    }
}

/// Process exit codes.
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const TRANSPORT_ERROR: i32 = 2;
    pub const CONFIG_ERROR: i32 = 3;
    pub const PIPELINE_FAILED: i32 = 4;
    pub const UNEXPECTED_ERROR: i32 = 5;
}

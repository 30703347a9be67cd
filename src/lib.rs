//! kindle-relay - relay PDF documents from a Telegram bot to a Kindle address.
//!
//! Each document sent to the bot runs through one linear pipeline:
//!
//! - Sanitize the declared file name and stage the download
//! - Optionally convert it to EPUB with an external engine
//! - Send it by SMTP relay or HTTP email API
//! - Remove the staged files
//!
//! The uploader gets a short status message after every stage.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use kindle_relay::{
//!     build_delivery, Config, IngestHandler, PipelineSettings, TelegramClient,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load(Path::new("kindle-relay.toml"))?;
//!     let client = Arc::new(TelegramClient::new(&config.telegram)?);
//!     let handler = IngestHandler::new(
//!         client.clone(),
//!         None,
//!         build_delivery(&config)?,
//!         PipelineSettings::from_config(&config),
//!     );
//!
//!     kindle_relay::ingest::run_polling(&client, &handler, 30).await?;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod convert;
pub mod delivery;
pub mod error;
pub mod fs;
pub mod ingest;
pub mod output;
pub mod telegram;

// Re-exports for convenience
pub use config::{Config, DeliveryMode, OutputFormat};
pub use convert::{build_converter, Converter, EbookConverter};
pub use delivery::{build_delivery, Delivery, DeliveryJob};
pub use error::{Error, Result};
pub use ingest::{ChatTransport, IncomingFile, IngestHandler, PipelineSettings};
pub use telegram::TelegramClient;

//! Telegram Bot API module.
//!
//! This module provides:
//! - HTTP client for the Bot API (updates, files, messages)
//! - API response types

pub mod client;
pub mod types;

pub use client::TelegramClient;
pub use types::*;

//! Delivery module.
//!
//! This module provides:
//! - The [`Delivery`] seam used by the ingest pipeline
//! - SMTP relay delivery (lettre)
//! - HTTP email API delivery (SendGrid, Resend)
//!
//! Exactly one delivery channel is active per deployment.

pub mod http;
pub mod job;
pub mod smtp;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{Config, DeliveryMode};
use crate::error::Result;

pub use http::HttpApiDelivery;
pub use job::{mime_for_path, DeliveryJob};
pub use smtp::SmtpDelivery;

/// Sends a staged file to its recipient. One attempt per call.
#[async_trait]
pub trait Delivery: Send + Sync {
    /// Short channel name used in logs.
    fn channel(&self) -> &'static str;

    /// Verify the channel is reachable.
    async fn check(&self) -> Result<()> {
        Ok(())
    }

    /// Send one job.
    async fn deliver(&self, job: &DeliveryJob) -> Result<()>;
}

/// Build the delivery channel selected by `delivery.mode`.
pub fn build_delivery(config: &Config) -> Result<Arc<dyn Delivery>> {
    let delivery: Arc<dyn Delivery> = match config.delivery.mode {
        DeliveryMode::Smtp => Arc::new(SmtpDelivery::from_config(&config.delivery)?),
        DeliveryMode::Api => Arc::new(HttpApiDelivery::from_config(&config.delivery)?),
    };
    Ok(delivery)
}

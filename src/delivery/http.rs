//! Delivery through an HTTP email-sending API.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Client;
use serde_json::{json, Value};

use crate::config::{ApiProvider, DeliveryConfig};
use crate::delivery::{Delivery, DeliveryJob};
use crate::error::{Error, Result};

/// Sends each job as one authenticated JSON POST.
pub struct HttpApiDelivery {
    client: Client,
    provider: ApiProvider,
    endpoint: String,
    api_key: String,
    from: String,
    body: String,
}

impl HttpApiDelivery {
    /// Create the API client from configuration.
    pub fn from_config(config: &DeliveryConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.api.request_timeout_seconds))
            .build()
            .map_err(|e| Error::Delivery(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!(
            provider = %config.api.provider,
            endpoint = %config.api.endpoint(),
            "HTTP API delivery initialized"
        );

        Ok(Self {
            client,
            provider: config.api.provider,
            endpoint: config.api.endpoint().to_string(),
            api_key: config.api.api_key.clone(),
            from: config.api.from_address.clone(),
            body: config.body.clone(),
        })
    }

    /// Build the provider specific JSON body.
    pub fn payload(&self, job: &DeliveryJob, encoded: &str) -> Value {
        match self.provider {
            ApiProvider::SendGrid => json!({
                "personalizations": [{ "to": [{ "email": job.recipient }] }],
                "from": { "email": self.from },
                "subject": job.subject,
                "content": [{ "type": "text/plain", "value": self.body }],
                "attachments": [{
                    "content": encoded,
                    "filename": job.attachment_name,
                    "type": job.mime_type,
                    "disposition": "attachment",
                }],
            }),
            ApiProvider::Resend => json!({
                "from": self.from,
                "to": [job.recipient],
                "subject": job.subject,
                "text": self.body,
                "attachments": [{
                    "filename": job.attachment_name,
                    "content": encoded,
                    "content_type": job.mime_type,
                }],
            }),
        }
    }
}

#[async_trait]
impl Delivery for HttpApiDelivery {
    fn channel(&self) -> &'static str {
        "api"
    }

    async fn deliver(&self, job: &DeliveryJob) -> Result<()> {
        let content = tokio::fs::read(&job.file_path).await?;
        let encoded = STANDARD.encode(&content);
        let payload = self.payload(job, &encoded);

        tracing::debug!("POST {}", self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::Delivery(format!("Request to {} failed: {}", self.endpoint, e)))?;

        let status = response.status().as_u16();
        if status != self.provider.accepted_status() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Delivery rejected: HTTP {} - {}", status, body);
            return Err(Error::DeliveryRejected { status, body });
        }

        tracing::info!(
            provider = %self.provider,
            recipient = %job.recipient,
            attachment = %job.attachment_name,
            bytes = content.len(),
            "Sent via HTTP API"
        );
        Ok(())
    }
}

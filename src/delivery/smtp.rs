//! Delivery through an authenticated SMTP relay.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::DeliveryConfig;
use crate::delivery::{Delivery, DeliveryJob};
use crate::error::{Error, Result};

/// Sends each job as one multipart message over implicit TLS.
///
/// The transport is built without connection pooling, so every send opens
/// its own connection and lettre closes it when the send returns.
pub struct SmtpDelivery {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    body: String,
    host: String,
}

impl SmtpDelivery {
    /// Create the relay transport from configuration.
    pub fn from_config(config: &DeliveryConfig) -> Result<Self> {
        let smtp = &config.smtp;
        let from: Mailbox = smtp.from.parse().map_err(|e| Error::ConfigValidation {
            field: "delivery.smtp.from".to_string(),
            message: format!("{}", e),
        })?;

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&smtp.host)?
            .port(smtp.port)
            .credentials(Credentials::new(
                smtp.login().to_string(),
                smtp.password.clone(),
            ))
            .build();

        tracing::info!(host = %smtp.host, port = smtp.port, "SMTP delivery initialized");

        Ok(Self {
            mailer,
            from,
            body: config.body.clone(),
            host: smtp.host.clone(),
        })
    }
}

/// Build the message for a job.
pub fn build_message(
    from: &Mailbox,
    body: &str,
    job: &DeliveryJob,
    content: Vec<u8>,
) -> Result<Message> {
    let to: Mailbox = job
        .recipient
        .parse()
        .map_err(|e| Error::Delivery(format!("Invalid recipient '{}': {}", job.recipient, e)))?;

    let content_type = ContentType::parse(&job.mime_type)
        .map_err(|e| Error::Delivery(format!("Invalid MIME type '{}': {}", job.mime_type, e)))?;

    let attachment = Attachment::new(job.attachment_name.clone()).body(content, content_type);

    Message::builder()
        .from(from.clone())
        .to(to)
        .subject(job.subject.clone())
        .multipart(
            MultiPart::mixed()
                .singlepart(SinglePart::plain(body.to_string()))
                .singlepart(attachment),
        )
        .map_err(|e| Error::Delivery(format!("Failed to build message: {}", e)))
}

#[async_trait]
impl Delivery for SmtpDelivery {
    fn channel(&self) -> &'static str {
        "smtp"
    }

    async fn check(&self) -> Result<()> {
        if self.mailer.test_connection().await? {
            Ok(())
        } else {
            Err(Error::Delivery(format!("SMTP relay {} refused the connection", self.host)))
        }
    }

    async fn deliver(&self, job: &DeliveryJob) -> Result<()> {
        let content = tokio::fs::read(&job.file_path).await?;
        let size = content.len();
        let message = build_message(&self.from, &self.body, job, content)?;

        self.mailer
            .send(message)
            .await
            .map_err(|e| Error::Delivery(format!("SMTP send via {} failed: {}", self.host, e)))?;

        tracing::info!(
            recipient = %job.recipient,
            attachment = %job.attachment_name,
            bytes = size,
            "Sent via SMTP"
        );
        Ok(())
    }
}

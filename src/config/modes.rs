//! Delivery mode and output format definitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Delivery channel active for a deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMode {
    /// Authenticated SMTP relay over TLS (default).
    #[default]
    Smtp,
    /// HTTP email-sending API.
    Api,
}

impl fmt::Display for DeliveryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryMode::Smtp => write!(f, "smtp"),
            DeliveryMode::Api => write!(f, "api"),
        }
    }
}

impl FromStr for DeliveryMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "smtp" => Ok(DeliveryMode::Smtp),
            "api" => Ok(DeliveryMode::Api),
            _ => Err(format!("Unknown delivery mode: {}", s)),
        }
    }
}

/// HTTP email API provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiProvider {
    #[default]
    SendGrid,
    Resend,
}

impl ApiProvider {
    /// Default send endpoint of the provider.
    pub fn endpoint(&self) -> &'static str {
        match self {
            ApiProvider::SendGrid => "https://api.sendgrid.com/v3/mail/send",
            ApiProvider::Resend => "https://api.resend.com/emails",
        }
    }

    /// Status code the provider documents for an accepted message.
    pub fn accepted_status(&self) -> u16 {
        match self {
            ApiProvider::SendGrid => 202,
            ApiProvider::Resend => 200,
        }
    }
}

impl fmt::Display for ApiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiProvider::SendGrid => write!(f, "sendgrid"),
            ApiProvider::Resend => write!(f, "resend"),
        }
    }
}

/// Format of the artifact handed to delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Forward the original PDF.
    Pdf,
    /// Convert to EPUB before delivery (default).
    #[default]
    Epub,
}

impl OutputFormat {
    /// File extension without the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Pdf => "pdf",
            OutputFormat::Epub => "epub",
        }
    }

    /// MIME type of the attachment.
    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputFormat::Pdf => "application/pdf",
            OutputFormat::Epub => "application/epub+zip",
        }
    }

    /// Whether a converter must run to produce this format.
    pub fn needs_conversion(&self) -> bool {
        !matches!(self, OutputFormat::Pdf)
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

//! Configuration validation logic.

use crate::config::loader::Config;
use crate::config::modes::DeliveryMode;
use crate::error::{Error, Result};
use regex::Regex;

/// Minimum length for a Telegram bot token.
const MIN_TOKEN_LENGTH: usize = 20;

/// Validate the entire configuration.
///
/// `needs_bot` is false for commands that never talk to Telegram.
pub fn validate_config(config: &Config, needs_bot: bool) -> Result<()> {
    if needs_bot {
        validate_bot_token(&config.telegram.bot_token)?;
    }
    validate_email("recipient", &config.delivery.recipient)?;
    validate_subject(&config.delivery.subject)?;

    match config.delivery.mode {
        DeliveryMode::Smtp => {
            let smtp = &config.delivery.smtp;
            if smtp.host.trim().is_empty() {
                return Err(Error::MissingConfig("delivery.smtp.host".to_string()));
            }
            validate_email("delivery.smtp.from", &smtp.from)?;
            if smtp.password.is_empty() {
                return Err(Error::MissingConfig(
                    "delivery.smtp.password (EMAIL_PASSWORD)".to_string(),
                ));
            }
        }
        DeliveryMode::Api => {
            let api = &config.delivery.api;
            if api.api_key.is_empty() {
                return Err(Error::MissingConfig(
                    "delivery.api.api_key (DELIVERY_API_KEY)".to_string(),
                ));
            }
            validate_email("delivery.api.from_address", &api.from_address)?;
            url::Url::parse(api.endpoint())?;
        }
    }

    if config.converts() && config.converter.program.trim().is_empty() {
        return Err(Error::MissingConfig("converter.program".to_string()));
    }

    Ok(())
}

/// Validate the bot token.
pub fn validate_bot_token(token: &str) -> Result<()> {
    if token.is_empty() {
        return Err(Error::MissingConfig("telegram.bot_token (BOT_TOKEN)".to_string()));
    }

    if token.len() < MIN_TOKEN_LENGTH || !token.contains(':') {
        return Err(Error::ConfigValidation {
            field: "telegram.bot_token".to_string(),
            message: "Token must look like '<bot id>:<secret>' as issued by BotFather".to_string(),
        });
    }

    let token_lower = token.to_lowercase();
    if token_lower.contains("replaceme") || token_lower.contains("your_token") {
        return Err(Error::ConfigValidation {
            field: "telegram.bot_token".to_string(),
            message: "Token appears to be a placeholder. Please provide your actual bot token."
                .to_string(),
        });
    }

    Ok(())
}

/// Validate an email address field.
pub fn validate_email(field: &str, address: &str) -> Result<()> {
    if address.is_empty() {
        return Err(Error::MissingConfig(field.to_string()));
    }

    let email_pattern = Regex::new(r"^[^@\s<>]+@[^@\s<>]+\.[^@\s<>]+$").unwrap();
    if !email_pattern.is_match(address) {
        return Err(Error::ConfigValidation {
            field: field.to_string(),
            message: format!("'{}' is not a valid email address", address),
        });
    }

    Ok(())
}

/// Validate the subject line.
///
/// The subject is never rewritten, only checked for presence.
pub fn validate_subject(subject: &str) -> Result<()> {
    if subject.trim().is_empty() {
        return Err(Error::MissingConfig("delivery.subject".to_string()));
    }
    if subject.contains('\n') || subject.contains('\r') {
        return Err(Error::ConfigValidation {
            field: "delivery.subject".to_string(),
            message: "Subject must be a single line".to_string(),
        });
    }
    Ok(())
}

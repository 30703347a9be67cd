//! Command-line argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::{Config, DeliveryMode, OutputFormat};

/// Telegram to Kindle document relay.
#[derive(Parser, Debug)]
#[command(
    name = "kindle-relay",
    version,
    about = "Relay PDF documents received by a Telegram bot to a Kindle address",
    long_about = "A Telegram bot that receives PDF documents, optionally converts them to EPUB,\n\
                  and emails the result to a fixed address such as a Kindle delivery address.\n\n\
                  Delivery goes through an SMTP relay or an HTTP email API (SendGrid, Resend)."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Path to configuration file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Telegram bot token.
    #[arg(long = "bot-token", global = true, env = "BOT_TOKEN", hide_env_values = true)]
    pub bot_token: Option<String>,

    /// Sender address for the SMTP relay.
    #[arg(long = "email-from", global = true, env = "EMAIL_FROM")]
    pub email_from: Option<String>,

    /// Destination address (e.g. your Kindle address).
    #[arg(long = "email-to", global = true, env = "EMAIL_TO")]
    pub email_to: Option<String>,

    /// Password for the SMTP relay.
    #[arg(long = "email-password", global = true, env = "EMAIL_PASSWORD", hide_env_values = true)]
    pub email_password: Option<String>,

    /// API key for the HTTP email API.
    #[arg(long = "api-key", global = true, env = "DELIVERY_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Sender address for the HTTP email API.
    #[arg(long = "api-from", global = true, env = "DELIVERY_FROM_ADDRESS")]
    pub api_from: Option<String>,

    /// Delivery channel.
    #[arg(long, value_enum, global = true)]
    pub mode: Option<DeliveryModeArg>,

    /// Email subject (sent verbatim).
    #[arg(long, global = true)]
    pub subject: Option<String>,

    /// Directory for staged files.
    #[arg(long = "staging-dir", global = true)]
    pub staging_directory: Option<PathBuf>,

    /// Forward the original PDF without converting it.
    #[arg(long, global = true)]
    pub no_convert: bool,

    /// Enable debug logging.
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Start the bot and relay incoming documents (default).
    Run,
    /// Relay one local PDF through the pipeline.
    Send {
        /// PDF file to send.
        file: PathBuf,
    },
    /// Validate configuration and probe the converter and delivery channel.
    Check,
}

/// CLI delivery mode argument.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DeliveryModeArg {
    /// Authenticated SMTP relay.
    Smtp,
    /// HTTP email API.
    Api,
}

impl From<DeliveryModeArg> for DeliveryMode {
    fn from(arg: DeliveryModeArg) -> Self {
        match arg {
            DeliveryModeArg::Smtp => DeliveryMode::Smtp,
            DeliveryModeArg::Api => DeliveryMode::Api,
        }
    }
}

impl Args {
    /// The selected subcommand, defaulting to `run`.
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Run)
    }

    /// Merge CLI arguments into an existing config, overriding where specified.
    pub fn merge_into_config(&self, config: &mut Config) {
        if let Some(token) = &self.bot_token {
            config.telegram.bot_token = token.clone();
        }

        if let Some(from) = &self.email_from {
            config.delivery.smtp.from = from.clone();
        }

        if let Some(to) = &self.email_to {
            config.delivery.recipient = to.clone();
        }

        if let Some(password) = &self.email_password {
            config.delivery.smtp.password = password.clone();
        }

        if let Some(key) = &self.api_key {
            config.delivery.api.api_key = key.clone();
        }

        if let Some(from) = &self.api_from {
            config.delivery.api.from_address = from.clone();
        }

        if let Some(mode) = self.mode {
            config.delivery.mode = mode.into();
        }

        if let Some(subject) = &self.subject {
            config.delivery.subject = subject.clone();
        }

        if let Some(dir) = &self.staging_directory {
            config.pipeline.staging_directory = Some(dir.clone());
        }

        if self.no_convert {
            config.pipeline.output_format = OutputFormat::Pdf;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_default_command_is_run() {
        let args = parse(&["kindle-relay"]);
        assert_eq!(args.command(), Command::Run);
    }

    #[test]
    fn test_send_subcommand() {
        let args = parse(&["kindle-relay", "send", "book.pdf", "--no-convert"]);
        assert_eq!(
            args.command(),
            Command::Send {
                file: PathBuf::from("book.pdf")
            }
        );
        assert!(args.no_convert);
    }

    #[test]
    fn test_merge_overrides() {
        let args = parse(&[
            "kindle-relay",
            "--email-to",
            "reader@kindle.com",
            "--mode",
            "api",
            "--api-key",
            "SG.key",
            "--subject",
            "Convert",
            "--no-convert",
        ]);
        let mut config = Config::default();
        args.merge_into_config(&mut config);

        assert_eq!(config.delivery.recipient, "reader@kindle.com");
        assert_eq!(config.delivery.mode, DeliveryMode::Api);
        assert_eq!(config.delivery.api.api_key, "SG.key");
        assert_eq!(config.pipeline.output_format, OutputFormat::Pdf);
    }

    #[test]
    fn test_merge_keeps_file_values() {
        let args = parse(&["kindle-relay", "check"]);
        let mut config = Config::default();
        config.delivery.subject = "Do not touch".to_string();
        config.pipeline.output_format = OutputFormat::Epub;
        args.merge_into_config(&mut config);

        assert_eq!(config.delivery.subject, "Do not touch");
        assert_eq!(config.pipeline.output_format, OutputFormat::Epub);
    }
}

//! kindle-relay - CLI entry point.

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use kindle_relay::{
    cli::{Args, Command},
    config::{default_config_path, validate_config, Config},
    convert::{build_converter, Converter, EbookConverter},
    delivery::{build_delivery, Delivery},
    error::{exit_codes, Error, Result},
    fs::ensure_dir,
    ingest::{run_polling, IngestHandler, LocalTransport, PipelineSettings, RunOutcome},
    output::{
        create_spinner, print_banner, print_config_summary, print_error, print_info,
        print_report, print_success, print_warning,
    },
    telegram::TelegramClient,
};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(e) => {
            print_error(&format!("{}", e));
            match e {
                Error::Config(_) | Error::ConfigValidation { .. } | Error::MissingConfig(_) => {
                    ExitCode::from(exit_codes::CONFIG_ERROR as u8)
                }
                Error::TomlParse(_) | Error::UrlParse(_) => {
                    ExitCode::from(exit_codes::CONFIG_ERROR as u8)
                }
                Error::Telegram(_) => {
                    ExitCode::from(exit_codes::TRANSPORT_ERROR as u8)
                }
                _ => ExitCode::from(exit_codes::UNEXPECTED_ERROR as u8),
            }
        }
    }
}

async fn run() -> Result<ExitCode> {
    // Parse CLI arguments
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    fmt().with_env_filter(filter).with_target(false).init();

    let command = args.command();

    // Load configuration
    let config_path = args.config.clone().unwrap_or_else(default_config_path);
    let mut config = if config_path.exists() {
        Config::load(&config_path)?
    } else if args.config.is_some() {
        return Err(Error::Config(format!(
            "Configuration file not found: {}",
            config_path.display()
        )));
    } else {
        tracing::debug!("No configuration file at {}", config_path.display());
        Config::default()
    };

    // Merge CLI arguments and environment into config
    args.merge_into_config(&mut config);

    // Validate configuration
    let needs_bot = !matches!(command, Command::Send { .. });
    validate_config(&config, needs_bot)?;

    let staging_dir = config.staging_directory();
    ensure_dir(&staging_dir)?;

    let converter = build_converter(&config)?;
    let delivery = build_delivery(&config)?;

    match command {
        Command::Run => run_bot(&config, converter, delivery).await,
        Command::Send { file } => send_file(&config, &file, converter, delivery).await,
        Command::Check => check(&config, converter.as_deref(), delivery.as_ref()).await,
    }
}

fn as_dyn(converter: Option<Arc<EbookConverter>>) -> Option<Arc<dyn Converter>> {
    converter.map(|c| c as Arc<dyn Converter>)
}

/// Start the bot.
async fn run_bot(
    config: &Config,
    converter: Option<Arc<EbookConverter>>,
    delivery: Arc<dyn Delivery>,
) -> Result<ExitCode> {
    print_banner();
    print_config_summary(
        &config.delivery.recipient,
        delivery.channel(),
        &config.pipeline.output_format.to_string(),
        &config.staging_directory().display().to_string(),
    );

    let client = Arc::new(TelegramClient::new(&config.telegram)?);
    let me = client.get_me().await?;
    print_info(&format!(
        "Logged in as: @{}",
        me.username.as_deref().unwrap_or("unknown")
    ));

    let handler = IngestHandler::new(
        client.clone(),
        as_dyn(converter),
        delivery,
        PipelineSettings::from_config(config),
    );

    print_info("Waiting for documents (Ctrl-C to stop)...");
    run_polling(&client, &handler, config.telegram.poll_timeout_seconds).await?;

    Ok(ExitCode::from(exit_codes::SUCCESS as u8))
}

/// Relay one local file.
async fn send_file(
    config: &Config,
    path: &Path,
    converter: Option<Arc<EbookConverter>>,
    delivery: Arc<dyn Delivery>,
) -> Result<ExitCode> {
    let file = LocalTransport::incoming(path)?;
    let spinner = create_spinner(&format!("Relaying {}...", file.file_name));

    let handler = IngestHandler::new(
        Arc::new(LocalTransport::new(spinner.clone())),
        as_dyn(converter),
        delivery,
        PipelineSettings::from_config(config),
    );

    let report = handler.handle(&file).await;
    spinner.finish_and_clear();
    print_report(&file.file_name, &report);

    let code = match report.outcome {
        RunOutcome::Delivered => exit_codes::SUCCESS,
        RunOutcome::Ignored => {
            print_warning("Only .pdf files are relayed");
            exit_codes::PIPELINE_FAILED
        }
        RunOutcome::Failed(_) => exit_codes::PIPELINE_FAILED,
    };
    Ok(ExitCode::from(code as u8))
}

/// Validate the deployment without relaying anything.
async fn check(
    config: &Config,
    converter: Option<&EbookConverter>,
    delivery: &dyn Delivery,
) -> Result<ExitCode> {
    print_success("Configuration is valid");

    let client = TelegramClient::new(&config.telegram)?;
    let me = client.get_me().await?;
    print_success(&format!(
        "Bot token accepted (@{})",
        me.username.as_deref().unwrap_or("unknown")
    ));

    let mut healthy = true;

    match converter {
        Some(converter) => match converter.ensure_available().await {
            Ok(()) => print_success(&format!("Converter available: {}", converter.program())),
            Err(e) => {
                print_error(&format!("{}", e));
                healthy = false;
            }
        },
        None => print_info("Conversion disabled, PDFs are forwarded as-is"),
    }

    match delivery.check().await {
        Ok(()) => print_success(&format!("Delivery channel ready: {}", delivery.channel())),
        Err(e) => {
            print_error(&format!("{}", e));
            healthy = false;
        }
    }

    let code = if healthy {
        exit_codes::SUCCESS
    } else {
        exit_codes::PIPELINE_FAILED
    };
    Ok(ExitCode::from(code as u8))
}

//! External-engine converter.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::sync::OnceCell;

use crate::config::ConverterConfig;
use crate::convert::Converter;
use crate::error::{Error, Result};

/// Maximum number of stderr bytes kept in a conversion error.
const STDERR_TAIL: usize = 800;

/// Result of the one-time availability probe.
#[derive(Debug, Clone)]
enum Probe {
    Available,
    NotFound,
    Broken(String),
}

/// Converter backed by an external program such as calibre's `ebook-convert`.
pub struct EbookConverter {
    program: String,
    args: Vec<String>,
    probe_args: Vec<String>,
    locale: String,
    probe: OnceCell<Probe>,
}

impl EbookConverter {
    /// Create a converter. `locale` is exported to every engine run.
    pub fn new(config: &ConverterConfig, locale: String) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
            probe_args: config.probe_args.clone(),
            locale,
            probe: OnceCell::new(),
        }
    }

    /// Name of the engine program.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Make sure the engine can be started. The probe runs once per process.
    pub async fn ensure_available(&self) -> Result<()> {
        let probe = self.probe.get_or_init(|| self.run_probe()).await;

        match probe {
            Probe::Available => Ok(()),
            Probe::NotFound => Err(Error::ConverterNotFound(self.program.clone())),
            Probe::Broken(message) => Err(Error::Conversion(format!(
                "{} is not usable: {}",
                self.program, message
            ))),
        }
    }

    async fn run_probe(&self) -> Probe {
        tracing::debug!("Probing converter: {} {:?}", self.program, self.probe_args);

        let status = Command::new(&self.program)
            .args(&self.probe_args)
            .env("LC_ALL", &self.locale)
            .env("LANG", &self.locale)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        match status {
            Ok(status) if status.success() => {
                tracing::info!("Converter available: {}", self.program);
                Probe::Available
            }
            Ok(status) => Probe::Broken(format!("probe exited with status: {}", status)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Probe::NotFound,
            Err(e) => Probe::Broken(e.to_string()),
        }
    }

    fn render_args(&self, input: &Path, output: &Path) -> Result<Vec<String>> {
        let input_str = input
            .to_str()
            .ok_or_else(|| Error::Conversion("Invalid path encoding for input".into()))?;
        let output_str = output
            .to_str()
            .ok_or_else(|| Error::Conversion("Invalid path encoding for output".into()))?;

        Ok(self
            .args
            .iter()
            .map(|arg| arg.replace("{input}", input_str).replace("{output}", output_str))
            .collect())
    }
}

#[async_trait]
impl Converter for EbookConverter {
    async fn convert(&self, input: &Path, output: &Path) -> Result<()> {
        self.ensure_available().await?;

        let args = self.render_args(input, output)?;
        tracing::debug!("Running {} {:?}", self.program, args);

        let result = Command::new(&self.program)
            .args(&args)
            .env("LC_ALL", &self.locale)
            .env("LANG", &self.locale)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    Error::ConverterNotFound(self.program.clone())
                } else {
                    Error::Conversion(format!("Failed to run {}: {}", self.program, e))
                }
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(Error::Conversion(format!(
                "{} exited with status {}: {}",
                self.program,
                result.status,
                stderr_tail(&stderr)
            )));
        }

        Ok(())
    }
}

fn stderr_tail(stderr: &str) -> &str {
    let trimmed = stderr.trim();
    if trimmed.len() <= STDERR_TAIL {
        return trimmed;
    }
    let mut start = trimmed.len() - STDERR_TAIL;
    while !trimmed.is_char_boundary(start) {
        start += 1;
    }
    &trimmed[start..]
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn shell_converter(script: &str) -> EbookConverter {
        let config = ConverterConfig {
            program: "sh".to_string(),
            args: vec![
                "-c".to_string(),
                script.to_string(),
                "sh".to_string(),
                "{input}".to_string(),
                "{output}".to_string(),
            ],
            probe_args: vec!["-c".to_string(), "exit 0".to_string()],
            locale: None,
        };
        EbookConverter::new(&config, "C.UTF-8".to_string())
    }

    #[tokio::test]
    async fn test_convert_success() {
        let tmp = tempfile::tempdir().unwrap();
        let input = tmp.path().join("book.pdf");
        let output = tmp.path().join("book.epub");
        std::fs::write(&input, b"%PDF-1.4").unwrap();

        let converter = shell_converter(r#"cp "$1" "$2""#);
        converter.convert(&input, &output).await.unwrap();

        assert_eq!(std::fs::read(&output).unwrap(), b"%PDF-1.4");
    }

    #[tokio::test]
    async fn test_engine_failure_keeps_stderr() {
        let tmp = tempfile::tempdir().unwrap();
        let input = tmp.path().join("book.pdf");
        let output = tmp.path().join("book.epub");

        let converter = shell_converter("echo 'not a PDF document' >&2; exit 3");
        let err = converter.convert(&input, &output).await.unwrap_err();

        match err {
            Error::Conversion(msg) => assert!(msg.contains("not a PDF document")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_locale_exported_to_engine() {
        let tmp = tempfile::tempdir().unwrap();
        let input = tmp.path().join("book.pdf");
        let output = tmp.path().join("book.epub");

        let converter = shell_converter(r#"printf '%s' "$LC_ALL" > "$2""#);
        converter.convert(&input, &output).await.unwrap();

        assert_eq!(std::fs::read_to_string(&output).unwrap(), "C.UTF-8");
    }

    #[tokio::test]
    async fn test_missing_program_is_not_found() {
        let config = ConverterConfig {
            program: "kindle-relay-no-such-converter".to_string(),
            ..Default::default()
        };
        let converter = EbookConverter::new(&config, "C.UTF-8".to_string());

        let err = converter.ensure_available().await.unwrap_err();
        assert!(matches!(err, Error::ConverterNotFound(_)));

        // Probe result is cached
        let err = converter
            .convert(Path::new("a.pdf"), Path::new("a.epub"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ConverterNotFound(_)));
    }

    #[tokio::test]
    async fn test_failing_probe_is_conversion_error() {
        let config = ConverterConfig {
            program: "sh".to_string(),
            probe_args: vec!["-c".to_string(), "exit 1".to_string()],
            ..Default::default()
        };
        let converter = EbookConverter::new(&config, "C.UTF-8".to_string());
        assert!(matches!(
            converter.ensure_available().await,
            Err(Error::Conversion(_))
        ));
    }

    #[test]
    fn test_stderr_tail_truncates() {
        let long = "x".repeat(STDERR_TAIL * 2);
        assert_eq!(stderr_tail(&long).len(), STDERR_TAIL);
        assert_eq!(stderr_tail("  short \n"), "short");
    }
}

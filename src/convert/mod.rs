//! Document conversion module.
//!
//! This module provides:
//! - The [`Converter`] seam used by the ingest pipeline
//! - An external-engine converter (calibre `ebook-convert`)
//! - Process locale resolution for the engine

pub mod ebook;
pub mod locale;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::Config;
use crate::error::Result;
use crate::fs::is_non_empty_file;

pub use ebook::EbookConverter;
pub use locale::resolve_locale;

/// Converts a staged document into another format.
#[async_trait]
pub trait Converter: Send + Sync {
    /// Convert `input` into `output`.
    async fn convert(&self, input: &Path, output: &Path) -> Result<()>;
}

/// Outcome of a conversion as seen by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionResult {
    Converted(PathBuf),
    Failed(String),
}

/// Build the converter when the configured output format needs one.
///
/// Resolves the engine locale from the process environment once, so a
/// missing UTF-8 locale fails at startup.
pub fn build_converter(config: &Config) -> Result<Option<Arc<EbookConverter>>> {
    if !config.converts() {
        return Ok(None);
    }

    let locale = resolve_locale(config.converter.locale.as_deref(), |var| {
        std::env::var(var).ok()
    })?;
    tracing::debug!("Conversion locale: {}", locale);

    Ok(Some(Arc::new(EbookConverter::new(&config.converter, locale))))
}

/// Run a converter and check that it left a usable artifact behind.
pub async fn run_conversion(
    converter: &dyn Converter,
    input: &Path,
    output: &Path,
) -> ConversionResult {
    if let Err(e) = converter.convert(input, output).await {
        return ConversionResult::Failed(e.to_string());
    }

    if !is_non_empty_file(output).await {
        return ConversionResult::Failed(format!(
            "Converter produced no output at {}",
            output.display()
        ));
    }

    ConversionResult::Converted(output.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    struct WritesOutput(&'static [u8]);

    #[async_trait]
    impl Converter for WritesOutput {
        async fn convert(&self, _input: &Path, output: &Path) -> Result<()> {
            tokio::fs::write(output, self.0).await?;
            Ok(())
        }
    }

    struct AlwaysFails;

    #[async_trait]
    impl Converter for AlwaysFails {
        async fn convert(&self, _input: &Path, _output: &Path) -> Result<()> {
            Err(Error::Conversion("malformed input".into()))
        }
    }

    #[test]
    fn test_no_converter_for_pdf_output() {
        let mut config = Config::default();
        config.pipeline.output_format = crate::config::OutputFormat::Pdf;
        assert!(build_converter(&config).unwrap().is_none());
    }

    #[test]
    fn test_configured_locale_builds_converter() {
        let mut config = Config::default();
        config.converter.locale = Some("C.UTF-8".to_string());
        let converter = build_converter(&config).unwrap().unwrap();
        assert_eq!(converter.program(), "ebook-convert");
    }

    #[tokio::test]
    async fn test_converted_when_output_written() {
        let tmp = tempfile::tempdir().unwrap();
        let output = tmp.path().join("book.epub");
        let result =
            run_conversion(&WritesOutput(b"PK\x03\x04"), Path::new("in.pdf"), &output).await;
        assert_eq!(result, ConversionResult::Converted(output));
    }

    #[tokio::test]
    async fn test_empty_output_is_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let output = tmp.path().join("book.epub");
        let result = run_conversion(&WritesOutput(b""), Path::new("in.pdf"), &output).await;
        assert!(matches!(result, ConversionResult::Failed(_)));
    }

    #[tokio::test]
    async fn test_engine_error_carries_message() {
        let tmp = tempfile::tempdir().unwrap();
        let output = tmp.path().join("book.epub");
        match run_conversion(&AlwaysFails, Path::new("in.pdf"), &output).await {
            ConversionResult::Failed(reason) => assert!(reason.contains("malformed input")),
            other => panic!("unexpected {:?}", other),
        }
    }
}

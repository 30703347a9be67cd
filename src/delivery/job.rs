//! Delivery job definition.

use std::path::{Path, PathBuf};

use crate::config::OutputFormat;
use crate::error::{Error, Result};

/// One file to send to one recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryJob {
    pub file_path: PathBuf,
    pub attachment_name: String,
    pub mime_type: String,
    pub recipient: String,
    /// Subject line, sent verbatim. Some receivers treat it as a command.
    pub subject: String,
}

impl DeliveryJob {
    /// Build a job for a staged file.
    pub fn for_file(file_path: &Path, recipient: &str, subject: &str) -> Result<Self> {
        let attachment_name = file_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                Error::InvalidName(format!("No file name in {}", file_path.display()))
            })?
            .to_string();

        Ok(Self {
            file_path: file_path.to_path_buf(),
            attachment_name,
            mime_type: mime_for_path(file_path),
            recipient: recipient.to_string(),
            subject: subject.to_string(),
        })
    }
}

/// MIME type for an attachment, based on its extension.
pub fn mime_for_path(path: &Path) -> String {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match extension.as_deref() {
        Some("pdf") => OutputFormat::Pdf.mime_type().to_string(),
        Some("epub") => OutputFormat::Epub.mime_type().to_string(),
        _ => mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string(),
    }
}

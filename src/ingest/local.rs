//! Chat transport over the local filesystem, used by `kindle-relay send`.

use std::path::Path;

use async_trait::async_trait;
use indicatif::ProgressBar;

use crate::error::{Error, Result};
use crate::ingest::{ChatTransport, ContentHandle, IncomingFile, SenderRef};

/// Reads documents from disk and prints statuses above a spinner.
pub struct LocalTransport {
    progress: ProgressBar,
}

impl LocalTransport {
    pub fn new(progress: ProgressBar) -> Self {
        Self { progress }
    }

    /// Build a notification for a local file.
    pub fn incoming(path: &Path) -> Result<IncomingFile> {
        let metadata = std::fs::metadata(path)?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::InvalidName(format!("No file name in {}", path.display())))?
            .to_string();

        Ok(IncomingFile {
            sender: SenderRef {
                chat_id: 0,
                message_id: None,
            },
            file_name,
            file_size: Some(metadata.len()),
            handle: ContentHandle(path.display().to_string()),
        })
    }
}

#[async_trait]
impl ChatTransport for LocalTransport {
    async fn download(&self, handle: &ContentHandle) -> Result<Vec<u8>> {
        tokio::fs::read(&handle.0)
            .await
            .map_err(|e| Error::Download(format!("Failed to read {}: {}", handle.0, e)))
    }

    async fn notify(&self, _sender: &SenderRef, text: &str) -> Result<()> {
        self.progress.println(text);
        Ok(())
    }
}

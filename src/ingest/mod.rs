//! Ingest module: from an inbound document notification to a delivered file.
//!
//! This module provides:
//! - The [`ChatTransport`] collaborator interface
//! - The per-file pipeline ([`IngestHandler`]) and its state machine
//! - Status messages reported back to the sender
//! - Telegram long polling and a local-file transport

pub mod handler;
pub mod local;
pub mod poller;
pub mod state;
pub mod status;

use async_trait::async_trait;

use crate::error::Result;

pub use handler::{IngestHandler, PipelineReport, PipelineSettings, RunOutcome};
pub use local::LocalTransport;
pub use poller::{poll_until, run_polling};
pub use state::{PipelineState, Stage};
pub use status::Status;

/// Opaque handle the transport uses to fetch a document's bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentHandle(pub String);

/// Where status messages for a document go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SenderRef {
    pub chat_id: i64,
    /// Message to reply to, if the transport supports threading.
    pub message_id: Option<i64>,
}

/// A document upload notification.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub sender: SenderRef,
    /// Declared file name. Untrusted.
    pub file_name: String,
    pub file_size: Option<u64>,
    pub handle: ContentHandle,
}

/// Chat platform operations the pipeline consumes.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Fetch the full content behind a handle.
    async fn download(&self, handle: &ContentHandle) -> Result<Vec<u8>>;

    /// Send a short text to the uploader.
    async fn notify(&self, sender: &SenderRef, text: &str) -> Result<()>;
}

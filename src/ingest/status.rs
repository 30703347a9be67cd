//! Status messages reported to the sender.

use std::fmt;

use crate::ingest::state::Stage;

/// A user-visible progress report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    /// The document was downloaded and staged.
    Received { file_name: String },
    /// The converted artifact is ready.
    Converted { file_name: String },
    /// The artifact was handed to the delivery channel.
    Delivered { recipient: String },
    /// A stage failed; the run stops here.
    Failed { stage: Stage, reason: String },
}

impl Status {
    /// Stage a failure status belongs to.
    pub fn failed_stage(&self) -> Option<Stage> {
        match self {
            Status::Failed { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Received { file_name } => write!(f, "✅ File received: {}", file_name),
            Status::Converted { file_name } => write!(f, "📘 Converted to {}", file_name),
            Status::Delivered { recipient } => write!(f, "📨 Sent to {}", recipient),
            Status::Failed {
                stage: Stage::Download,
                reason,
            } => write!(f, "❌ Could not download the file: {}", reason),
            Status::Failed {
                stage: Stage::Convert,
                reason,
            } => write!(f, "❌ Conversion failed: {}", reason),
            Status::Failed {
                stage: Stage::Deliver,
                reason,
            } => write!(f, "❌ Sending failed: {}", reason),
        }
    }
}

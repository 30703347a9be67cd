//! Pipeline states.

use std::fmt;

/// Stage at which a run failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Download,
    Convert,
    Deliver,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Download => write!(f, "download"),
            Stage::Convert => write!(f, "convert"),
            Stage::Deliver => write!(f, "deliver"),
        }
    }
}

/// State of one file's pipeline run.
///
/// `Received → Downloaded → (Converted)? → Delivered → CleanedUp`, with
/// `Failed(stage)` reachable from any non-terminal state and always followed
/// by `CleanedUp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Received,
    Downloaded,
    Converted,
    Delivered,
    Failed(Stage),
    CleanedUp,
}

impl PipelineState {
    /// Whether moving from `self` to `next` is a legal transition.
    pub fn can_transition(&self, next: PipelineState) -> bool {
        use PipelineState::*;

        match (self, next) {
            (Received, Downloaded) => true,
            (Downloaded, Converted) | (Downloaded, Delivered) => true,
            (Converted, Delivered) => true,
            (Delivered, CleanedUp) | (Failed(_), CleanedUp) => true,
            // Cleanup may run before anything was staged
            (Received, CleanedUp) => true,
            (Received, Failed(Stage::Download)) => true,
            (Downloaded, Failed(Stage::Convert)) | (Downloaded, Failed(Stage::Deliver)) => true,
            (Converted, Failed(Stage::Deliver)) => true,
            _ => false,
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineState::Received => write!(f, "received"),
            PipelineState::Downloaded => write!(f, "downloaded"),
            PipelineState::Converted => write!(f, "converted"),
            PipelineState::Delivered => write!(f, "delivered"),
            PipelineState::Failed(stage) => write!(f, "failed({})", stage),
            PipelineState::CleanedUp => write!(f, "cleaned up"),
        }
    }
}

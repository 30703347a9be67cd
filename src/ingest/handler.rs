//! Per-file pipeline orchestration.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::Instrument;
use uuid::Uuid;

use crate::config::{Config, OutputFormat};
use crate::convert::{run_conversion, ConversionResult, Converter};
use crate::delivery::{Delivery, DeliveryJob};
use crate::error::{Error, Result};
use crate::fs::{has_extension, hashed_stem, remove_staged, sanitized_stem, staged_path};
use crate::ingest::state::{PipelineState, Stage};
use crate::ingest::status::Status;
use crate::ingest::{ChatTransport, IncomingFile};

/// Extension of documents the relay accepts.
pub const ACCEPTED_EXTENSION: &str = "pdf";

/// Immutable per-deployment pipeline settings.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub staging_dir: PathBuf,
    /// Format of the converted artifact (ignored without a converter).
    pub output_format: OutputFormat,
    pub recipient: String,
    pub subject: String,
    pub max_file_size: u64,
    pub unique_names: bool,
    /// Chats allowed to submit documents. Empty means any chat.
    pub allowed_chat_ids: Vec<i64>,
}

impl PipelineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            staging_dir: config.staging_directory(),
            output_format: config.pipeline.output_format,
            recipient: config.delivery.recipient.clone(),
            subject: config.delivery.subject.clone(),
            max_file_size: config.telegram.max_file_size,
            unique_names: config.pipeline.unique_names,
            allowed_chat_ids: config.telegram.allowed_chat_ids.clone(),
        }
    }
}

/// Final outcome of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Filtered out before anything happened.
    Ignored,
    Delivered,
    Failed(Stage),
}

/// What happened during one run.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub outcome: RunOutcome,
    /// Statuses in the order they were reported.
    pub statuses: Vec<Status>,
    /// Artifact handed to delivery, if delivery succeeded.
    pub delivered: Option<PathBuf>,
    /// Staged files removed during cleanup.
    pub removed_files: usize,
    pub final_state: Option<PipelineState>,
}

impl PipelineReport {
    fn ignored() -> Self {
        Self {
            outcome: RunOutcome::Ignored,
            statuses: Vec::new(),
            delivered: None,
            removed_files: 0,
            final_state: None,
        }
    }
}

/// Mutable bookkeeping of a single run.
struct PipelineRun {
    state: PipelineState,
    staged: Vec<PathBuf>,
    statuses: Vec<Status>,
}

impl PipelineRun {
    fn new() -> Self {
        Self {
            state: PipelineState::Received,
            staged: Vec::new(),
            statuses: Vec::new(),
        }
    }

    fn transition(&mut self, next: PipelineState) {
        debug_assert!(
            self.state.can_transition(next),
            "illegal transition {} -> {}",
            self.state,
            next
        );
        tracing::debug!("{} -> {}", self.state, next);
        self.state = next;
    }
}

/// Drives one inbound document through download, conversion, delivery and cleanup.
pub struct IngestHandler {
    transport: Arc<dyn ChatTransport>,
    converter: Option<Arc<dyn Converter>>,
    delivery: Arc<dyn Delivery>,
    settings: PipelineSettings,
}

impl IngestHandler {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        converter: Option<Arc<dyn Converter>>,
        delivery: Arc<dyn Delivery>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            transport,
            converter,
            delivery,
            settings,
        }
    }

    /// Whether the notification passes the entry filter.
    pub fn accepts(&self, file: &IncomingFile) -> bool {
        if !has_extension(&file.file_name, ACCEPTED_EXTENSION) {
            tracing::debug!("Ignoring non-PDF document: {}", file.file_name);
            return false;
        }

        let allowed = &self.settings.allowed_chat_ids;
        if !allowed.is_empty() && !allowed.contains(&file.sender.chat_id) {
            tracing::warn!(
                "Ignoring document from chat {} (not in allowed_chat_ids)",
                file.sender.chat_id
            );
            return false;
        }

        true
    }

    /// Handle one notification to completion. Never fails: problems end up
    /// in the report and in the statuses sent to the uploader.
    pub async fn handle(&self, file: &IncomingFile) -> PipelineReport {
        if !self.accepts(file) {
            return PipelineReport::ignored();
        }

        let span = tracing::info_span!(
            "pipeline",
            run = %Uuid::new_v4(),
            chat = file.sender.chat_id
        );
        self.run(file).instrument(span).await
    }

    async fn run(&self, file: &IncomingFile) -> PipelineReport {
        tracing::info!("Received document: {}", file.file_name);

        let mut run = PipelineRun::new();
        let (outcome, delivered) = match self.drive(file, &mut run).await {
            Ok(delivered) => (RunOutcome::Delivered, Some(delivered)),
            Err(stage) => (RunOutcome::Failed(stage), None),
        };

        let removed_files = self.cleanup(&mut run).await;

        PipelineReport {
            outcome,
            statuses: run.statuses,
            delivered,
            removed_files,
            final_state: Some(run.state),
        }
    }

    /// Run the stages in order. Returns the delivered artifact or the failed stage.
    async fn drive(
        &self,
        file: &IncomingFile,
        run: &mut PipelineRun,
    ) -> std::result::Result<PathBuf, Stage> {
        let (source, stem) = match self.download(file, run).await {
            Ok(staged) => staged,
            Err(e) => return Err(self.fail(file, run, Stage::Download, e).await),
        };
        run.transition(PipelineState::Downloaded);
        self.report(
            file,
            run,
            Status::Received {
                file_name: file.file_name.clone(),
            },
        )
        .await;

        let artifact = match &self.converter {
            Some(converter) => {
                match self.convert(&**converter, &source, &stem, run).await {
                    Ok(converted) => converted,
                    Err(e) => return Err(self.fail(file, run, Stage::Convert, e).await),
                }
            }
            None => source,
        };
        if run.state == PipelineState::Converted {
            self.report(
                file,
                run,
                Status::Converted {
                    file_name: display_name(&artifact),
                },
            )
            .await;
        }

        if let Err(e) = self.deliver(&artifact).await {
            return Err(self.fail(file, run, Stage::Deliver, e).await);
        }
        run.transition(PipelineState::Delivered);
        self.report(
            file,
            run,
            Status::Delivered {
                recipient: self.settings.recipient.clone(),
            },
        )
        .await;

        Ok(artifact)
    }

    /// Fetch the content and stage it under its sanitized name.
    async fn download(
        &self,
        file: &IncomingFile,
        run: &mut PipelineRun,
    ) -> Result<(PathBuf, String)> {
        if let Some(size) = file.file_size {
            if size > self.settings.max_file_size {
                return Err(Error::FileTooLarge {
                    size,
                    limit: self.settings.max_file_size,
                });
            }
        }

        let mut stem = sanitized_stem(&file.file_name)?;
        let content = self.transport.download(&file.handle).await?;
        if self.settings.unique_names {
            stem = hashed_stem(&stem, &content);
        }

        let path = staged_path(&self.settings.staging_dir, &stem, ACCEPTED_EXTENSION)?;
        run.staged.push(path.clone());
        tokio::fs::write(&path, &content).await?;

        tracing::info!("Staged {} ({} bytes)", path.display(), content.len());
        Ok((path, stem))
    }

    async fn convert(
        &self,
        converter: &dyn Converter,
        source: &Path,
        stem: &str,
        run: &mut PipelineRun,
    ) -> Result<PathBuf> {
        let output = staged_path(
            &self.settings.staging_dir,
            stem,
            self.settings.output_format.extension(),
        )?;
        run.staged.push(output.clone());

        match run_conversion(converter, source, &output).await {
            ConversionResult::Converted(path) => {
                run.transition(PipelineState::Converted);
                tracing::info!("Converted to {}", path.display());
                Ok(path)
            }
            ConversionResult::Failed(reason) => Err(Error::Conversion(reason)),
        }
    }

    async fn deliver(&self, artifact: &Path) -> Result<()> {
        let job =
            DeliveryJob::for_file(artifact, &self.settings.recipient, &self.settings.subject)?;
        tracing::info!(
            "Delivering {} ({}) via {}",
            job.attachment_name,
            job.mime_type,
            self.delivery.channel()
        );
        self.delivery.deliver(&job).await
    }

    async fn fail(
        &self,
        file: &IncomingFile,
        run: &mut PipelineRun,
        stage: Stage,
        error: Error,
    ) -> Stage {
        tracing::error!("Pipeline failed at {} stage: {}", stage, error);
        run.transition(PipelineState::Failed(stage));
        self.report(
            file,
            run,
            Status::Failed {
                stage,
                reason: error.to_string(),
            },
        )
        .await;
        stage
    }

    async fn report(&self, file: &IncomingFile, run: &mut PipelineRun, status: Status) {
        let text = status.to_string();
        run.statuses.push(status);

        if let Err(e) = self.transport.notify(&file.sender, &text).await {
            tracing::warn!("Failed to send status to chat {}: {}", file.sender.chat_id, e);
        }
    }

    /// Remove every staged file of the run. Errors are logged, never returned.
    async fn cleanup(&self, run: &mut PipelineRun) -> usize {
        let mut removed = 0;

        for path in run.staged.drain(..) {
            if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
                continue;
            }
            match remove_staged(&path).await {
                Ok(()) => {
                    tracing::debug!("Removed {}", path.display());
                    removed += 1;
                }
                Err(e) => tracing::warn!("{}", e),
            }
        }

        run.transition(PipelineState::CleanedUp);
        removed
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

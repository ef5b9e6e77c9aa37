use crate::commands::{rendition_command, thumbnail_command};
use crate::job::{RenditionJob, Stage};
use crate::publish::{Artifacts, AssetDraft, PublishError, PublishStep};
use crate::transcoder::{EncodeCommand, TranscodeError, Transcoder};
use reelstream_core::{Asset, JobStatus};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Transcode(#[from] TranscodeError),

    #[error(transparent)]
    Publish(#[from] PublishError),
}

impl PipelineError {
    /// Stage that failed, `None` when publishing failed.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            PipelineError::Transcode(e) => Some(e.stage()),
            PipelineError::Publish(_) => None,
        }
    }
}

/// Receives progress as the pipeline moves between stages.
pub trait StageObserver: Send + Sync {
    fn stage_changed(&self, status: JobStatus);
}

/// Observer that ignores progress.
pub struct NoopObserver;

impl StageObserver for NoopObserver {
    fn stage_changed(&self, _status: JobStatus) {}
}

/// Thumbnail, then renditions in ascending resolution, then publish.
///
/// Stages run strictly in order and the first failure ends the job. The
/// job's scratch directory is removed whatever the outcome.
pub struct TranscodePipeline {
    transcoder: Arc<dyn Transcoder>,
    publisher: PublishStep,
}

impl TranscodePipeline {
    pub fn new(transcoder: Arc<dyn Transcoder>, publisher: PublishStep) -> Self {
        Self {
            transcoder,
            publisher,
        }
    }

    #[tracing::instrument(
        skip(self, job, observer),
        fields(job_id = %job.job_id, asset_id = %job.asset_id, asset_name = %job.name)
    )]
    pub async fn run(
        &self,
        job: RenditionJob,
        observer: &dyn StageObserver,
    ) -> Result<Asset, PipelineError> {
        let start = Instant::now();
        let result = self.execute(&job, observer).await;

        let scratch_dir = job.scratch_dir().to_path_buf();
        if let Err(e) = job.into_scratch().close() {
            tracing::warn!(
                path = %scratch_dir.display(),
                error = %e,
                "Failed to remove job scratch directory"
            );
        }

        let duration_ms = start.elapsed().as_secs_f64() * 1000.0;
        match &result {
            Ok(asset) => tracing::info!(
                renditions = asset.renditions.len(),
                duration_ms,
                "Transcode job completed"
            ),
            Err(e) => tracing::error!(
                error = %e,
                stage = ?e.stage(),
                duration_ms,
                "Transcode job failed"
            ),
        }

        result
    }

    async fn execute(
        &self,
        job: &RenditionJob,
        observer: &dyn StageObserver,
    ) -> Result<Asset, PipelineError> {
        observer.stage_changed(JobStatus::Thumbnailing);
        let thumbnail = job.thumbnail_path();
        self.run_stage(thumbnail_command(
            job.source_path(),
            &thumbnail,
            job.thumbnail_offset,
        ))
        .await?;

        let total = job.resolutions.len();
        let mut renditions = Vec::with_capacity(total);
        for (completed, resolution) in job.resolutions.iter().copied().enumerate() {
            observer.stage_changed(JobStatus::RenditionsInProgress { completed, total });
            let output = job.rendition_path(resolution);
            self.run_stage(rendition_command(job.source_path(), &output, resolution))
                .await?;
            renditions.push((resolution, output));
        }

        observer.stage_changed(JobStatus::Publishing);
        let draft = AssetDraft {
            id: job.asset_id,
            name: job.name.clone(),
            metadata: job.metadata.clone(),
        };
        let asset = self
            .publisher
            .publish(
                draft,
                &Artifacts {
                    thumbnail,
                    renditions,
                },
            )
            .await?;

        Ok(asset)
    }

    async fn run_stage(&self, command: EncodeCommand) -> Result<(), TranscodeError> {
        let start = Instant::now();
        let exit = self.transcoder.run(&command).await?;

        if !exit.success() {
            return Err(TranscodeError::NonZeroExit {
                stage: command.stage,
                code: exit.code,
                stderr: exit.stderr,
            });
        }

        if !tokio::fs::try_exists(&command.output).await.unwrap_or(false) {
            return Err(TranscodeError::MissingOutput {
                stage: command.stage,
                path: command.output,
            });
        }

        tracing::debug!(
            stage = %command.stage,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Encoder stage finished"
        );
        Ok(())
    }
}

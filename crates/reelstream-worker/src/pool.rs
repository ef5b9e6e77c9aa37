use crate::claims::{NameClaim, NameClaims};
use crate::registry::{JobHandle, JobRegistry};
use reelstream_core::JobSnapshot;
use reelstream_processing::{RenditionJob, TranscodePipeline};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, Semaphore};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Transcode queue is full ({capacity} jobs waiting), please try again later")]
    Full { capacity: usize },

    #[error("Transcode queue is shut down")]
    Closed,
}

#[derive(Debug, Clone)]
pub struct TranscodePoolConfig {
    pub max_concurrent: usize,
    pub queue_size: usize,
    /// How long finished jobs stay visible to pollers.
    pub job_retention: Duration,
}

impl Default for TranscodePoolConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 2,
            queue_size: 100,
            job_retention: Duration::from_secs(86_400),
        }
    }
}

struct QueuedJob {
    job: RenditionJob,
    handle: Arc<JobHandle>,
    claim: NameClaim,
}

/// Bounded pool running transcode pipelines in the background.
#[derive(Clone)]
pub struct TranscodePool {
    tx: mpsc::Sender<QueuedJob>,
    registry: Arc<JobRegistry>,
    claims: NameClaims,
    queue_size: usize,
}

impl TranscodePool {
    /// Create the pool and spawn its dispatcher. Must be called inside a Tokio runtime.
    pub fn new(pipeline: Arc<TranscodePipeline>, config: TranscodePoolConfig) -> Self {
        let queue_size = config.queue_size.max(1);
        let max_concurrent = config.max_concurrent.max(1);
        let (tx, rx) = mpsc::channel(queue_size);

        tokio::spawn(async move {
            Self::worker_pool(rx, pipeline, max_concurrent).await;
        });

        tracing::info!(
            queue_size,
            max_concurrent,
            retention_secs = config.job_retention.as_secs(),
            "Transcode pool initialized"
        );

        Self {
            tx,
            registry: Arc::new(JobRegistry::new(config.job_retention)),
            claims: NameClaims::new(),
            queue_size,
        }
    }

    /// Reserve `name` for an upload. `None` when another upload of that name is in flight.
    pub fn try_claim(&self, name: &str) -> Option<NameClaim> {
        self.claims.try_claim(name)
    }

    /// Queue a job without waiting. The claim is held until the job finishes.
    #[tracing::instrument(skip_all, fields(job_id = %job.job_id, asset_name = %job.name))]
    pub fn submit(&self, job: RenditionJob, claim: NameClaim) -> Result<JobSnapshot, QueueError> {
        let job_id = job.job_id;
        let handle = self.registry.register(job_id, job.asset_id, &job.name);
        let snapshot = handle.snapshot();

        // A rejected job is dropped here, which removes its scratch directory and releases the claim.
        match self.tx.try_send(QueuedJob { job, handle, claim }) {
            Ok(()) => {
                tracing::info!("Transcode job queued");
                Ok(snapshot)
            }
            Err(TrySendError::Full(_)) => {
                self.registry.remove(job_id);
                tracing::warn!(capacity = self.queue_size, "Transcode queue is full, rejecting job");
                Err(QueueError::Full {
                    capacity: self.queue_size,
                })
            }
            Err(TrySendError::Closed(_)) => {
                self.registry.remove(job_id);
                tracing::error!("Transcode queue is closed, rejecting job");
                Err(QueueError::Closed)
            }
        }
    }

    pub fn job(&self, job_id: Uuid) -> Option<JobSnapshot> {
        self.registry.get(job_id)
    }

    /// Jobs waiting for a worker.
    pub fn queued(&self) -> usize {
        self.queue_size - self.tx.capacity()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    async fn worker_pool(
        mut rx: mpsc::Receiver<QueuedJob>,
        pipeline: Arc<TranscodePipeline>,
        max_concurrent: usize,
    ) {
        let semaphore = Arc::new(Semaphore::new(max_concurrent));

        while let Some(queued) = rx.recv().await {
            let permit = match Arc::clone(&semaphore).acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break,
            };
            let pipeline = Arc::clone(&pipeline);

            tokio::spawn(async move {
                let _permit = permit;
                Self::process_job(queued, pipeline).await;
            });
        }

        tracing::info!("Transcode pool stopped");
    }

    async fn process_job(queued: QueuedJob, pipeline: Arc<TranscodePipeline>) {
        let QueuedJob { job, handle, claim } = queued;
        let job_id = job.job_id;
        let start = Instant::now();

        // Run on its own task so a panic still marks the job failed.
        let observer = Arc::clone(&handle);
        let outcome =
            tokio::spawn(async move { pipeline.run(job, observer.as_ref()).await }).await;

        match outcome {
            Ok(Ok(_)) => {
                handle.complete();
                tracing::info!(
                    job_id = %job_id,
                    duration_ms = start.elapsed().as_millis(),
                    "Transcode job finished"
                );
            }
            Ok(Err(e)) => handle.fail(e.to_string()),
            Err(join_err) => {
                tracing::error!(job_id = %job_id, error = %join_err, "Transcode worker panicked");
                handle.fail("Transcode worker terminated unexpectedly");
            }
        }

        drop(claim);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelstream_core::{AssetMetadata, AssetStatus, JobStatus, Resolution};
    use reelstream_db::{Catalog, InMemoryCatalog};
    use reelstream_processing::testing::{ScriptedOutcome, ScriptedTranscoder};
    use reelstream_processing::{PublishStep, Stage};
    use reelstream_storage::LocalStorage;
    use tempfile::TempDir;

    struct Fixture {
        _root: TempDir,
        catalog: Arc<InMemoryCatalog>,
        pool: TranscodePool,
    }

    async fn fixture(transcoder: ScriptedTranscoder, config: TranscodePoolConfig) -> Fixture {
        let root = TempDir::new().unwrap();
        let storage = Arc::new(LocalStorage::new(root.path().join("storage")).await.unwrap());
        let catalog = Arc::new(InMemoryCatalog::new());
        let pipeline = Arc::new(TranscodePipeline::new(
            Arc::new(transcoder),
            PublishStep::new(storage, catalog.clone()),
        ));
        Fixture {
            _root: root,
            catalog,
            pool: TranscodePool::new(pipeline, config),
        }
    }

    async fn job(name: &str) -> RenditionJob {
        let scratch = TempDir::new().unwrap();
        let source = scratch.path().join("source.mp4");
        tokio::fs::write(&source, b"video").await.unwrap();
        RenditionJob::new(name, AssetMetadata::default(), scratch, source, Duration::ZERO)
    }

    async fn wait_for_terminal(pool: &TranscodePool, job_id: Uuid) -> JobSnapshot {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            let snapshot = pool.job(job_id).expect("job registered");
            if snapshot.status.is_terminal() {
                return snapshot;
            }
            assert!(Instant::now() < deadline, "job did not finish in time");
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    #[tokio::test]
    async fn test_submitted_job_completes() {
        let fx = fixture(ScriptedTranscoder::new(), TranscodePoolConfig::default()).await;
        let claim = fx.pool.try_claim("movie").unwrap();

        let queued = fx.pool.submit(job("movie").await, claim).unwrap();
        assert_eq!(queued.status, JobStatus::Queued);
        assert_eq!(queued.asset_status, AssetStatus::Pending);

        let done = wait_for_terminal(&fx.pool, queued.job_id).await;
        assert_eq!(done.status, JobStatus::Done);
        assert!(fx.catalog.resolve("movie", Resolution::P360).await.is_ok());
        assert!(fx.pool.try_claim("movie").is_some());
    }

    #[tokio::test]
    async fn test_failed_job_reports_error_and_releases_name() {
        let transcoder = ScriptedTranscoder::new().on(
            Stage::Thumbnail,
            ScriptedOutcome::Fail {
                code: 1,
                stderr: "moov atom not found".to_string(),
            },
        );
        let fx = fixture(transcoder, TranscodePoolConfig::default()).await;
        let claim = fx.pool.try_claim("broken").unwrap();

        let queued = fx.pool.submit(job("broken").await, claim).unwrap();
        let failed = wait_for_terminal(&fx.pool, queued.job_id).await;

        assert_eq!(failed.status, JobStatus::Failed);
        assert_eq!(failed.asset_status, AssetStatus::Failed);
        assert!(failed.error.unwrap().contains("moov atom not found"));
        assert!(fx.catalog.is_empty().await);
        assert!(fx.pool.try_claim("broken").is_some());
    }

    #[tokio::test]
    async fn test_full_queue_rejects_without_registering() {
        let config = TranscodePoolConfig {
            max_concurrent: 1,
            queue_size: 1,
            ..Default::default()
        };
        let fx = fixture(
            ScriptedTranscoder::new().with_delay(Duration::from_millis(50)),
            config,
        )
        .await;

        // Both jobs are built before submitting so the dispatcher cannot drain the queue in between.
        let (a, b) = (job("a").await, job("b").await);
        let first = fx.pool.submit(a, fx.pool.try_claim("a").unwrap()).unwrap();
        let rejected = fx.pool.submit(b, fx.pool.try_claim("b").unwrap());

        assert!(matches!(rejected, Err(QueueError::Full { capacity: 1 })));
        assert!(fx.pool.try_claim("b").is_some());
        assert_eq!(wait_for_terminal(&fx.pool, first.job_id).await.status, JobStatus::Done);
    }

    #[tokio::test]
    async fn test_unknown_job_is_none() {
        let fx = fixture(ScriptedTranscoder::new(), TranscodePoolConfig::default()).await;
        assert!(fx.pool.job(Uuid::new_v4()).is_none());
        assert_eq!(fx.pool.queued(), 0);
    }
}

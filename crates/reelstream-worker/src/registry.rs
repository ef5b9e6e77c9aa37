use chrono::{Duration as ChronoDuration, Utc};
use reelstream_core::{JobSnapshot, JobStatus};
use reelstream_processing::StageObserver;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use uuid::Uuid;

/// Live status of one submitted job.
#[derive(Debug)]
pub struct JobHandle {
    snapshot: RwLock<JobSnapshot>,
}

impl JobHandle {
    fn new(snapshot: JobSnapshot) -> Self {
        Self {
            snapshot: RwLock::new(snapshot),
        }
    }

    pub fn job_id(&self) -> Uuid {
        self.snapshot().job_id
    }

    pub fn snapshot(&self) -> JobSnapshot {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_terminal(&self) -> bool {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .status
            .is_terminal()
    }

    pub fn complete(&self) {
        self.transition(JobStatus::Done, None);
    }

    pub fn fail(&self, error: impl Into<String>) {
        self.transition(JobStatus::Failed, Some(error.into()));
    }

    fn transition(&self, status: JobStatus, error: Option<String>) {
        let mut snapshot = self
            .snapshot
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if snapshot.transition(status, error) {
            tracing::debug!(
                job_id = %snapshot.job_id,
                status = ?snapshot.status,
                "Job status changed"
            );
        }
    }
}

impl StageObserver for JobHandle {
    fn stage_changed(&self, status: JobStatus) {
        self.transition(status, None);
    }
}

/// Jobs by id. Finished jobs are kept for `retention`, then pruned.
#[derive(Debug)]
pub struct JobRegistry {
    jobs: RwLock<HashMap<Uuid, Arc<JobHandle>>>,
    retention: Duration,
}

impl JobRegistry {
    pub fn new(retention: Duration) -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
            retention,
        }
    }

    pub fn register(&self, job_id: Uuid, asset_id: Uuid, asset_name: &str) -> Arc<JobHandle> {
        self.prune();
        let handle = Arc::new(JobHandle::new(JobSnapshot::queued(
            job_id, asset_id, asset_name,
        )));
        self.jobs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(job_id, Arc::clone(&handle));
        handle
    }

    pub fn get(&self, job_id: Uuid) -> Option<JobSnapshot> {
        self.jobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&job_id)
            .map(|handle| handle.snapshot())
    }

    pub(crate) fn remove(&self, job_id: Uuid) {
        self.jobs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&job_id);
    }

    pub fn len(&self) -> usize {
        self.jobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop finished jobs older than the retention window.
    pub fn prune(&self) -> usize {
        let retention =
            ChronoDuration::from_std(self.retention).unwrap_or(ChronoDuration::MAX);
        let cutoff = Utc::now().checked_sub_signed(retention);
        let Some(cutoff) = cutoff else {
            return 0;
        };

        let mut jobs = self.jobs.write().unwrap_or_else(PoisonError::into_inner);
        let before = jobs.len();
        jobs.retain(|_, handle| {
            let snapshot = handle.snapshot();
            !(snapshot.status.is_terminal() && snapshot.updated_at < cutoff)
        });
        let pruned = before - jobs.len();
        if pruned > 0 {
            tracing::debug!(pruned, "Pruned finished jobs from registry");
        }
        pruned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelstream_core::AssetStatus;

    #[test]
    fn test_handle_tracks_stages() {
        let registry = JobRegistry::new(Duration::from_secs(60));
        let job_id = Uuid::new_v4();
        let handle = registry.register(job_id, Uuid::new_v4(), "movie");

        handle.stage_changed(JobStatus::RenditionsInProgress {
            completed: 1,
            total: 2,
        });
        let snapshot = registry.get(job_id).unwrap();
        assert_eq!(snapshot.asset_status, AssetStatus::Pending);

        handle.complete();
        handle.stage_changed(JobStatus::Publishing);
        let snapshot = registry.get(job_id).unwrap();
        assert_eq!(snapshot.status, JobStatus::Done);
        assert_eq!(snapshot.asset_status, AssetStatus::Ready);
    }

    #[test]
    fn test_prune_keeps_running_jobs() {
        let registry = JobRegistry::new(Duration::ZERO);
        let running = registry.register(Uuid::new_v4(), Uuid::new_v4(), "a");
        let finished = registry.register(Uuid::new_v4(), Uuid::new_v4(), "b");
        finished.fail("encoder crashed");

        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(registry.prune(), 1);
        assert!(registry.get(running.job_id()).is_some());
        assert!(registry.get(finished.job_id()).is_none());
    }
}

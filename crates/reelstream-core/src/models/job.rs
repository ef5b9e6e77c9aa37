use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::asset::AssetStatus;

/// Lifecycle of one upload job.
///
/// `Queued → Thumbnailing → RenditionsInProgress(k of N) → Publishing → Done | Failed`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Thumbnailing,
    RenditionsInProgress { completed: usize, total: usize },
    Publishing,
    Done,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Failed)
    }

    /// Status of the asset as seen by a caller polling the job.
    pub fn asset_status(&self) -> AssetStatus {
        match self {
            JobStatus::Done => AssetStatus::Ready,
            JobStatus::Failed => AssetStatus::Failed,
            _ => AssetStatus::Pending,
        }
    }
}

/// Point-in-time view of a job handle.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct JobSnapshot {
    pub job_id: Uuid,
    pub asset_id: Uuid,
    pub asset_name: String,
    pub status: JobStatus,
    pub asset_status: AssetStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobSnapshot {
    pub fn queued(job_id: Uuid, asset_id: Uuid, asset_name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            job_id,
            asset_id,
            asset_name: asset_name.into(),
            status: JobStatus::Queued,
            asset_status: AssetStatus::Pending,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Move to `status`. Terminal states are sticky.
    pub fn transition(&mut self, status: JobStatus, error: Option<String>) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.asset_status = status.asset_status();
        self.status = status;
        self.error = error;
        self.updated_at = Utc::now();
        true
    }
}

use reelstream_core::{AssetMetadata, Resolution};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use uuid::Uuid;

/// One encoder invocation within a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Thumbnail,
    Rendition(Resolution),
}

impl Display for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Stage::Thumbnail => write!(f, "thumbnail"),
            Stage::Rendition(resolution) => write!(f, "rendition {}", resolution),
        }
    }
}

/// Work item for one accepted upload.
///
/// Owns the scratch directory holding the uploaded source and every
/// intermediate artifact. Dropping or closing the job removes all of it.
#[derive(Debug)]
pub struct RenditionJob {
    pub job_id: Uuid,
    pub asset_id: Uuid,
    pub name: String,
    pub metadata: AssetMetadata,
    /// Ascending; every entry must succeed before publish.
    pub resolutions: Vec<Resolution>,
    pub thumbnail_offset: Duration,
    source_path: PathBuf,
    scratch: TempDir,
}

impl RenditionJob {
    /// `source_path` must live inside `scratch`.
    pub fn new(
        name: impl Into<String>,
        metadata: AssetMetadata,
        scratch: TempDir,
        source_path: PathBuf,
        thumbnail_offset: Duration,
    ) -> Self {
        Self {
            job_id: Uuid::new_v4(),
            asset_id: Uuid::new_v4(),
            name: name.into(),
            metadata,
            resolutions: Resolution::ALL.to_vec(),
            thumbnail_offset,
            source_path,
            scratch,
        }
    }

    /// Use an id allocated before the job was built (e.g. to name its scratch directory).
    pub fn with_job_id(mut self, job_id: Uuid) -> Self {
        self.job_id = job_id;
        self
    }

    pub fn with_resolutions(mut self, mut resolutions: Vec<Resolution>) -> Self {
        resolutions.sort();
        resolutions.dedup();
        self.resolutions = resolutions;
        self
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn scratch_dir(&self) -> &Path {
        self.scratch.path()
    }

    pub fn thumbnail_path(&self) -> PathBuf {
        self.scratch.path().join("thumbnail.png")
    }

    pub fn rendition_path(&self, resolution: Resolution) -> PathBuf {
        self.scratch
            .path()
            .join(format!("rendition_{}.mp4", resolution.tag()))
    }

    pub(crate) fn into_scratch(self) -> TempDir {
        self.scratch
    }
}

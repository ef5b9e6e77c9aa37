//! Multipart upload intake.
//!
//! The `file` field is streamed chunk by chunk into a per-job scratch
//! directory; the whole upload is never held in memory.

use axum::extract::multipart::{Field, Multipart, MultipartError};
use axum::http::StatusCode;
use reelstream_core::{AppError, AssetMetadata, Config};
use reelstream_processing::RenditionJob;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

const MAX_NAME_LEN: usize = 255;

/// Names that collide with static routes under `/asset/` or with path
/// normalisation; an asset with one of these names could never be played back.
const RESERVED_NAMES: [&str; 4] = ["thumbnail", "upload", ".", ".."];

/// Size and type restrictions applied while receiving an upload.
#[derive(Debug, Clone)]
pub struct UploadLimits {
    pub max_bytes: u64,
    /// Lowercase extensions without the dot.
    pub allowed_extensions: Vec<String>,
}

impl UploadLimits {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_bytes: config.max_video_size_bytes(),
            allowed_extensions: config.video_allowed_extensions().to_vec(),
        }
    }
}

/// An upload fully written to scratch and ready to become a job.
#[derive(Debug)]
pub struct ReceivedUpload {
    pub job_id: Uuid,
    pub name: String,
    pub metadata: AssetMetadata,
    pub original_filename: String,
    pub size_bytes: u64,
    pub source_path: PathBuf,
    scratch: TempDir,
}

impl ReceivedUpload {
    pub fn into_job(self, thumbnail_offset: Duration) -> RenditionJob {
        RenditionJob::new(
            self.name,
            self.metadata,
            self.scratch,
            self.source_path,
            thumbnail_offset,
        )
        .with_job_id(self.job_id)
    }
}

#[derive(Default)]
struct TextFields {
    name: Option<String>,
    description: Option<String>,
    genre: Option<String>,
    year: Option<i32>,
}

struct ReceivedFile {
    filename: String,
    path: PathBuf,
    size: u64,
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(err.body_text())
    } else {
        AppError::InvalidUpload(format!("Failed to read multipart: {}", err.body_text()))
    }
}

/// Last path component of a client-supplied file name.
fn sanitize_filename(raw: &str) -> Option<String> {
    let candidate = raw.rsplit(['/', '\\']).next()?.trim();
    if candidate.is_empty() || candidate == "." || candidate == ".." {
        return None;
    }
    Some(candidate.to_string())
}

fn extension_of(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
        .filter(|ext| !ext.is_empty())
}

fn stem_of(filename: &str) -> Option<String> {
    Path::new(filename)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .map(|stem| stem.trim().to_string())
        .filter(|stem| !stem.is_empty())
}

/// Asset names appear as a single URL path segment.
fn validate_name(name: &str) -> Result<(), AppError> {
    if name.is_empty() {
        return Err(AppError::InvalidUpload("Asset name is empty".to_string()));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(AppError::InvalidUpload(format!(
            "Asset name exceeds {} bytes",
            MAX_NAME_LEN
        )));
    }
    if RESERVED_NAMES.contains(&name) {
        return Err(AppError::InvalidUpload(format!(
            "Asset name '{}' is reserved",
            name
        )));
    }
    if name.contains(['/', '\\']) || name.chars().any(char::is_control) {
        return Err(AppError::InvalidUpload(
            "Asset name must not contain slashes or control characters".to_string(),
        ));
    }
    Ok(())
}

fn optional_text(value: String) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

async fn read_text(field: Field<'_>) -> Result<Option<String>, AppError> {
    let text = field.text().await.map_err(multipart_error)?;
    Ok(optional_text(text))
}

/// Stream a field into `path`, enforcing `max_bytes` as data arrives.
async fn write_field(
    field: &mut Field<'_>,
    path: &Path,
    max_bytes: u64,
) -> Result<u64, AppError> {
    let mut file = tokio::fs::File::create(path).await?;
    let mut written: u64 = 0;

    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        written += chunk.len() as u64;
        if written > max_bytes {
            return Err(AppError::PayloadTooLarge(format!(
                "Upload exceeds the maximum of {} MB",
                max_bytes / 1024 / 1024
            )));
        }
        file.write_all(&chunk).await?;
    }

    file.flush().await?;
    Ok(written)
}

/// Receive a multipart upload into `<scratch_root>/<job id>/source.<ext>`.
///
/// On any error the scratch directory is removed before returning.
pub async fn receive_upload(
    mut multipart: Multipart,
    limits: &UploadLimits,
    scratch_root: &Path,
) -> Result<ReceivedUpload, AppError> {
    tokio::fs::create_dir_all(scratch_root).await?;

    let job_id = Uuid::new_v4();
    let scratch = tempfile::Builder::new()
        .prefix(&job_id.to_string())
        .rand_bytes(0)
        .tempdir_in(scratch_root)?;

    let mut text = TextFields::default();
    let mut file: Option<ReceivedFile> = None;

    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        let field_name = field.name().map(|s| s.to_string()).unwrap_or_default();

        match field_name.as_str() {
            "file" => {
                if file.is_some() {
                    return Err(AppError::InvalidUpload(
                        "Multiple file fields are not allowed; send exactly one field named 'file'"
                            .to_string(),
                    ));
                }

                let filename = field
                    .file_name()
                    .and_then(sanitize_filename)
                    .ok_or_else(|| AppError::InvalidUpload("Uploaded file has no name".to_string()))?;
                let extension = extension_of(&filename).ok_or_else(|| {
                    AppError::InvalidUpload(format!("Missing file extension (filename: {})", filename))
                })?;
                if !limits.allowed_extensions.iter().any(|e| e == &extension) {
                    return Err(AppError::InvalidUpload(format!(
                        "Invalid extension '{}', allowed: {}",
                        extension,
                        limits.allowed_extensions.join(", ")
                    )));
                }

                let path = scratch.path().join(format!("source.{}", extension));
                let size = write_field(&mut field, &path, limits.max_bytes).await?;
                if size == 0 {
                    return Err(AppError::InvalidUpload("File is empty".to_string()));
                }

                file = Some(ReceivedFile {
                    filename,
                    path,
                    size,
                });
            }
            "name" => text.name = read_text(field).await?,
            "description" => text.description = read_text(field).await?,
            "genre" => text.genre = read_text(field).await?,
            "year" => {
                text.year = match read_text(field).await? {
                    Some(raw) => Some(raw.parse::<i32>().map_err(|_| {
                        AppError::InvalidInput(format!("Invalid year '{}'", raw))
                    })?),
                    None => None,
                };
            }
            other => {
                tracing::debug!(field = other, "Ignoring unknown multipart field");
            }
        }
    }

    let file = file.ok_or_else(|| AppError::InvalidUpload("No file provided".to_string()))?;

    let name = match text.name {
        Some(name) => name,
        None => stem_of(&file.filename).ok_or_else(|| {
            AppError::InvalidUpload("Cannot derive an asset name from the file name".to_string())
        })?,
    };
    validate_name(&name)?;

    Ok(ReceivedUpload {
        job_id,
        name,
        metadata: AssetMetadata {
            description: text.description,
            genre: text.genre,
            year: text.year,
        },
        original_filename: file.filename,
        size_bytes: file.size,
        source_path: file.path,
        scratch,
    })
}

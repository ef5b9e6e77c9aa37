//! HTTP error response conversion
//!
//! Handlers return `Result<Response, HttpAppError>`. Errors from the storage,
//! catalog, streaming and worker crates convert into `HttpAppError` so every
//! failure renders the same JSON body and is logged at the level its kind asks for.

use crate::streaming::{RangeNotSatisfiable, StreamError};
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use reelstream_core::{AppError, ErrorMetadata, LogLevel};
use reelstream_db::CatalogError;
use reelstream_storage::StorageError;
use reelstream_worker::QueueError;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    /// Machine-readable error code for programmatic handling
    pub code: String,
    /// Whether this error is recoverable (can be retried)
    pub recoverable: bool,
    /// Suggested action for the client (e.g., "Wait 30-60 seconds and retry")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
}

/// Wrapper type for AppError to implement IntoResponse
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

impl From<anyhow::Error> for HttpAppError {
    fn from(err: anyhow::Error) -> Self {
        HttpAppError(AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        })
    }
}

fn log_error(error: &AppError) {
    let error_type = error.error_type();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Error => {
            tracing::error!(error = %error, error_type = error_type, "Error occurred");
        }
    }
}

fn is_production_env() -> bool {
    std::env::var("ENVIRONMENT")
        .or_else(|_| std::env::var("APP_ENV"))
        .map(|env| env.to_lowercase() == "production" || env.to_lowercase() == "prod")
        .unwrap_or(false)
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let app_error = &self.0;
        let is_production = is_production_env();

        let status = StatusCode::from_u16(app_error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        log_error(app_error);

        let hide_details = is_production || app_error.is_sensitive();
        let body = Json(ErrorResponse {
            error: app_error.client_message(),
            details: (!hide_details).then(|| app_error.detailed_message()),
            error_type: (!hide_details).then(|| app_error.error_type().to_string()),
            code: app_error.error_code().to_string(),
            recoverable: app_error.is_recoverable(),
            suggested_action: app_error.suggested_action().map(String::from),
        });

        let mut response = (status, body).into_response();
        if let AppError::RangeNotSatisfiable { total } = app_error {
            if let Ok(value) = HeaderValue::from_str(&format!("bytes */{}", total)) {
                response.headers_mut().insert(header::CONTENT_RANGE, value);
            }
        }
        response
    }
}

// Convert domain errors to HttpAppError (avoids orphan rule: we impl for local HttpAppError)

impl From<StorageError> for HttpAppError {
    fn from(err: StorageError) -> Self {
        let app = match err {
            StorageError::NotFound(msg) => AppError::NotFound(msg),
            StorageError::UploadFailed(msg) => AppError::Storage(msg),
            StorageError::DownloadFailed(msg) => AppError::Storage(msg),
            StorageError::DeleteFailed(msg) => AppError::Storage(msg),
            StorageError::InvalidKey(msg) => AppError::InvalidInput(msg),
            StorageError::BackendError(msg) => AppError::Storage(msg),
            StorageError::IoError(err) => AppError::Internal(format!("IO error: {}", err)),
            StorageError::ConfigError(msg) => AppError::Internal(msg),
        };
        HttpAppError(app)
    }
}

impl From<CatalogError> for HttpAppError {
    fn from(err: CatalogError) -> Self {
        let app = match err {
            CatalogError::NotFound(msg) => AppError::NotFound(msg),
            CatalogError::Conflict(msg) => AppError::Conflict(msg),
            CatalogError::Database(err) => AppError::Database(err),
            CatalogError::Corrupt(msg) => AppError::Internal(msg),
        };
        HttpAppError(app)
    }
}

impl From<RangeNotSatisfiable> for HttpAppError {
    fn from(err: RangeNotSatisfiable) -> Self {
        HttpAppError(AppError::RangeNotSatisfiable { total: err.total })
    }
}

impl From<StreamError> for HttpAppError {
    fn from(err: StreamError) -> Self {
        let app = match err {
            StreamError::SinkClosed { delivered } => {
                AppError::Internal(format!("Client went away after {} bytes", delivered))
            }
            other => AppError::SourceIntegrity(other.to_string()),
        };
        HttpAppError(app)
    }
}

impl From<QueueError> for HttpAppError {
    fn from(err: QueueError) -> Self {
        let app = match err {
            QueueError::Full { .. } => AppError::QueueFull(err.to_string()),
            QueueError::Closed => AppError::Internal(err.to_string()),
        };
        HttpAppError(app)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelstream_storage::SourceError;

    #[test]
    fn test_from_storage_error_not_found() {
        let storage_err = StorageError::NotFound("videos/x/360.mp4".to_string());
        let HttpAppError(app_err) = storage_err.into();
        match app_err {
            AppError::NotFound(msg) => assert_eq!(msg, "videos/x/360.mp4"),
            _ => panic!("Expected NotFound variant"),
        }
    }

    #[test]
    fn test_from_storage_error_upload_failed() {
        let storage_err = StorageError::UploadFailed("Upload failed".to_string());
        let HttpAppError(app_err) = storage_err.into();
        match app_err {
            AppError::Storage(msg) => assert_eq!(msg, "Upload failed"),
            _ => panic!("Expected Storage variant"),
        }
    }

    #[test]
    fn test_from_catalog_conflict() {
        let HttpAppError(app_err) = CatalogError::Conflict("movie".to_string()).into();
        assert!(matches!(app_err, AppError::Conflict(_)));
        assert_eq!(app_err.http_status_code(), 409);
    }

    #[test]
    fn test_stream_errors_are_integrity_failures() {
        let err = StreamError::TruncatedSource {
            source_name: "file:/tmp/x".to_string(),
            expected: 10,
            delivered: 4,
        };
        let HttpAppError(app_err) = err.into();
        assert!(matches!(app_err, AppError::SourceIntegrity(_)));
        assert_eq!(app_err.http_status_code(), 500);

        let err = StreamError::Seek {
            source_name: "memory".to_string(),
            offset: 5,
            source: SourceError::Remote("gone".to_string()),
        };
        let HttpAppError(app_err) = err.into();
        assert!(matches!(app_err, AppError::SourceIntegrity(_)));
    }

    #[test]
    fn test_queue_full_is_503() {
        let HttpAppError(app_err) = QueueError::Full { capacity: 3 }.into();
        assert!(matches!(app_err, AppError::QueueFull(_)));
        assert_eq!(app_err.http_status_code(), 503);
    }

    #[test]
    fn test_range_not_satisfiable_sets_content_range() {
        let response = HttpAppError::from(RangeNotSatisfiable { total: 1000 }).into_response();
        assert_eq!(response.status(), StatusCode::RANGE_NOT_SATISFIABLE);
        assert_eq!(
            response.headers().get(header::CONTENT_RANGE).unwrap(),
            "bytes */1000"
        );
    }

    #[test]
    fn test_sensitive_errors_hide_details() {
        let response =
            HttpAppError(AppError::Storage("bucket credentials rejected".to_string()))
                .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

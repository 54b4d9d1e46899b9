use axum::extract::multipart::{Field, MultipartError, MultipartRejection};
use axum::extract::{Multipart, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use common::prelude::RelayError;

use crate::config::UploadLimits;
use crate::ServiceState;

mod filename;
mod sniff;
mod spool;

pub use sniff::{is_allowed, sniff, SNIFF_LEN};
pub use spool::{SpoolError, SpooledFile, Spooler};

/// Form field that carries the images
pub const FILE_FIELD: &str = "file";
pub const SUCCESS_MESSAGE: &str = "Upload successful";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadedFile {
    pub filename: String,
    pub path: String,
    pub size: u64,
    pub mime_type: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub message: String,
    pub files: Vec<UploadedFile>,
}

impl UploadResponse {
    /// JSON for clients that ask for it, a plain text summary otherwise
    fn negotiate(self, headers: &HeaderMap) -> Response {
        let wants_json = headers
            .get(header::ACCEPT)
            .and_then(|v| v.to_str().ok())
            .map(|accept| accept.contains("application/json"))
            .unwrap_or(false);

        if wants_json {
            return (StatusCode::OK, Json(self)).into_response();
        }

        let mut text = self.message;
        for file in &self.files {
            text.push('\n');
            text.push_str(&file.url);
        }
        (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            text,
        )
            .into_response()
    }
}

/// Accept image parts under `file`, validate each one and relay it,
///  strictly in order. The first failure ends the request; files that
///  were already relayed stay uploaded.
pub async fn handler(
    State(state): State<ServiceState>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, UploadError> {
    let mut multipart = multipart.map_err(|e| UploadError::Form(e.body_text()))?;
    let relay = state.relay();
    let limits = state.limits();
    let mut uploaded = Vec::new();

    while let Some(mut field) = multipart.next_field().await.map_err(UploadError::from)? {
        let field_name = field.name().unwrap_or("").to_string();
        if field_name != FILE_FIELD {
            tracing::warn!("Ignoring unknown field: {}", field_name);
            continue;
        }

        // parts without a filename are plain form values, not files
        let Some(raw_name) = field.file_name().map(|s| s.to_string()) else {
            tracing::warn!("Ignoring {} field without a filename", FILE_FIELD);
            continue;
        };
        let filename = filename::sanitize(&raw_name)
            .ok_or_else(|| UploadError::InvalidFilename(raw_name.clone()))?;

        tracing::info!("Reading file: {}", filename);
        let mut file = spool_field(&mut field, &filename, limits).await?;

        let content_type = file.sniff().await?;
        let content_type = match content_type {
            Some(content_type) if is_allowed(&content_type) => content_type,
            other => {
                tracing::warn!(
                    filename = %filename,
                    detected = ?other.map(|m| m.to_string()),
                    "rejecting file with disallowed content type"
                );
                return Err(UploadError::DisallowedType(filename));
            }
        };

        let size = file.len();
        tracing::info!(
            filename = %filename,
            size,
            content_type = %content_type,
            on_disk = file.is_on_disk(),
            "relaying file"
        );

        relay
            .upload(&filename, file.into_upload_body())
            .await
            .map_err(|source| UploadError::Relay {
                filename: filename.clone(),
                source,
            })?;

        let url = relay
            .share_link(&filename)
            .await
            .map_err(|source| UploadError::Relay {
                filename: filename.clone(),
                source,
            })?;
        tracing::info!("Share link for {}: {}", filename, url);

        uploaded.push(UploadedFile {
            path: relay.remote_path(&filename),
            filename,
            size,
            mime_type: content_type.to_string(),
            url: url.to_string(),
        });
    }

    if uploaded.is_empty() {
        return Err(UploadError::NoFiles);
    }

    let response = UploadResponse {
        message: SUCCESS_MESSAGE.to_string(),
        files: uploaded,
    };
    Ok(response.negotiate(&headers))
}

async fn spool_field(
    field: &mut Field<'_>,
    filename: &str,
    limits: &UploadLimits,
) -> Result<SpooledFile, UploadError> {
    let mut spooler = Spooler::new(limits);

    while let Some(chunk) = field.chunk().await? {
        spooler.push(&chunk).await.map_err(|e| match e {
            SpoolError::TooLarge(_) => UploadError::TooLarge {
                filename: filename.to_string(),
                limit_mb: limits.max_file_megabytes(),
            },
            SpoolError::Io(e) => UploadError::Io(e),
        })?;
    }

    Ok(spooler.finish().await?)
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("{0}")]
    Form(String),
    #[error("The uploaded image is too big: {filename}. Please use an image less than {limit_mb}MB in size")]
    TooLarge { filename: String, limit_mb: u64 },
    #[error("The provided file format is not allowed. Please upload a JPEG or PNG image")]
    DisallowedType(String),
    #[error("Invalid filename: {0:?}")]
    InvalidFilename(String),
    #[error("At least one file is required")]
    NoFiles,
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to relay {filename}: {source}")]
    Relay {
        filename: String,
        #[source]
        source: RelayError,
    },
}

impl From<MultipartError> for UploadError {
    fn from(err: MultipartError) -> Self {
        UploadError::Form(err.body_text())
    }
}

impl UploadError {
    pub fn status(&self) -> StatusCode {
        match self {
            UploadError::Form(_)
            | UploadError::TooLarge { .. }
            | UploadError::DisallowedType(_)
            | UploadError::InvalidFilename(_)
            | UploadError::NoFiles => StatusCode::BAD_REQUEST,
            UploadError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            UploadError::Relay { source, .. } if source.is_timeout() => {
                StatusCode::GATEWAY_TIMEOUT
            }
            UploadError::Relay { .. } => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for UploadError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Upload failed: {}", self);
        } else {
            tracing::warn!("Upload rejected: {}", self);
        }

        (
            status,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            self.to_string(),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_statuses() {
        assert_eq!(UploadError::NoFiles.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            UploadError::DisallowedType("doc.pdf".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            UploadError::Io(std::io::Error::other("disk full")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            UploadError::Relay {
                filename: "a.png".into(),
                source: RelayError::Timeout,
            }
            .status(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            UploadError::Relay {
                filename: "a.png".into(),
                source: RelayError::MissingUrl,
            }
            .status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_too_large_message() {
        let err = UploadError::TooLarge {
            filename: "huge.png".into(),
            limit_mb: 100,
        };
        assert_eq!(
            err.to_string(),
            "The uploaded image is too big: huge.png. Please use an image less than 100MB in size"
        );
    }

    #[test]
    fn test_text_response_lists_links() {
        let response = UploadResponse {
            message: SUCCESS_MESSAGE.to_string(),
            files: vec![UploadedFile {
                filename: "photo.png".into(),
                path: "/file-upload/photo.png".into(),
                size: 10,
                mime_type: "image/png".into(),
                url: "https://www.dropbox.com/s/abc/photo.png?dl=0".into(),
            }],
        }
        .negotiate(&HeaderMap::new());

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );
    }
}

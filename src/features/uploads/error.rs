use thiserror::Error;

use crate::core::error::AppError;
use crate::features::auth::AuthError;
use crate::features::videos::StoreError;
use crate::modules::keys::KeyError;
use crate::modules::media::MediaError;
use crate::modules::staging::StagingError;
use crate::modules::storage::PublishError;

/// Why an upload pipeline run stopped
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Unauthenticated: {0}")]
    Unauthenticated(#[from] AuthError),

    #[error("User does not own this video")]
    Forbidden,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Unsupported media type '{media_type}'")]
    UnsupportedMediaType {
        media_type: String,
        allowed: &'static [&'static str],
    },

    #[error("Video lookup failed: {0}")]
    RecordLookup(#[source] StoreError),

    #[error("Staging failed: {0}")]
    Io(#[from] StagingError),

    #[error("Key generation failed: {0}")]
    Entropy(#[from] KeyError),

    #[error("Probe failed: {0}")]
    Probe(#[source] MediaError),

    #[error("Remux failed: {0}")]
    Remux(#[source] MediaError),

    #[error("Publish failed: {0}")]
    Publish(#[from] PublishError),

    #[error("Commit failed: {0}")]
    Persist(#[source] StoreError),
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        let detail = err.to_string();
        match err {
            UploadError::Unauthenticated(_) => {
                AppError::Unauthorized("Couldn't validate credentials".to_string())
            }
            UploadError::Forbidden => {
                AppError::Forbidden("You are not the owner of this video".to_string())
            }
            UploadError::InvalidRequest(msg) => AppError::BadRequest(msg),
            UploadError::UnsupportedMediaType {
                media_type,
                allowed,
            } => AppError::BadRequest(format!(
                "Unsupported media type '{}', expected one of: {}",
                media_type,
                allowed.join(", ")
            )),
            UploadError::RecordLookup(_) => {
                AppError::Internal("Couldn't find video".to_string(), detail)
            }
            UploadError::Io(_) => AppError::Internal("Couldn't store upload".to_string(), detail),
            UploadError::Entropy(_) => {
                AppError::Internal("Couldn't generate asset key".to_string(), detail)
            }
            UploadError::Probe(_) => {
                AppError::Internal("Couldn't inspect video".to_string(), detail)
            }
            UploadError::Remux(_) => {
                AppError::Internal("Couldn't process video".to_string(), detail)
            }
            UploadError::Publish(_) => {
                AppError::Internal("Couldn't publish file".to_string(), detail)
            }
            UploadError::Persist(_) => {
                AppError::Internal("Couldn't update video".to_string(), detail)
            }
        }
    }
}

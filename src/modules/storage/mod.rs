//! Publishing of finished artifacts.
//!
//! Videos go to S3-compatible object storage, thumbnails to the local asset
//! root served under `/assets`. Both implement [`ObjectPublisher`].

mod local_publisher;
mod s3_publisher;

pub use local_publisher::LocalAssetPublisher;
pub use s3_publisher::S3Publisher;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::AsyncRead;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Invalid asset key '{0}'")]
    InvalidKey(String),

    #[error("Failed to write asset '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Object store request for '{key}' failed: {message}")]
    Transport { key: String, message: String },

    #[error("Object store rejected '{key}' with HTTP {status}")]
    Rejected { key: String, status: u16 },

    #[error("Storage setup failed: {0}")]
    Setup(String),
}

#[async_trait]
pub trait ObjectPublisher: Send + Sync {
    /// Store the full content of `reader` under exactly `key`.
    ///
    /// On failure nothing is addressable under `key`.
    async fn publish(
        &self,
        key: &str,
        content_type: &str,
        reader: &mut (dyn AsyncRead + Unpin + Send),
    ) -> Result<(), PublishError>;

    /// Public URL of `key`. Pure: no I/O, same input always gives the same URL.
    fn key_to_url(&self, key: &str) -> String;
}

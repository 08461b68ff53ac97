use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tempfile::NamedTempFile;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncWriteExt, BufWriter};
use tracing::debug;

use super::{ObjectPublisher, PublishError};
use crate::shared::validation::ASSET_KEY_REGEX;

/// Publishes assets into a local directory that is served over HTTP
pub struct LocalAssetPublisher {
    root: PathBuf,
    base_url: String,
}

impl LocalAssetPublisher {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the asset root if it does not exist yet
    pub async fn ensure_root(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.root).await
    }

    fn io_err(key: &str) -> impl Fn(std::io::Error) -> PublishError + '_ {
        move |source| PublishError::Io {
            key: key.to_string(),
            source,
        }
    }
}

#[async_trait]
impl ObjectPublisher for LocalAssetPublisher {
    async fn publish(
        &self,
        key: &str,
        content_type: &str,
        reader: &mut (dyn AsyncRead + Unpin + Send),
    ) -> Result<(), PublishError> {
        if !ASSET_KEY_REGEX.is_match(key) {
            return Err(PublishError::InvalidKey(key.to_string()));
        }

        let destination = self.root.join(key);
        let parent = destination
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.root.clone());
        tokio::fs::create_dir_all(&parent)
            .await
            .map_err(Self::io_err(key))?;

        // Write next to the destination and rename, so readers never see a partial file
        let (std_file, temp_path) = NamedTempFile::new_in(&parent)
            .map_err(Self::io_err(key))?
            .into_parts();
        let mut file = BufWriter::new(File::from_std(std_file));
        let written = tokio::io::copy(reader, &mut file)
            .await
            .map_err(Self::io_err(key))?;
        file.flush().await.map_err(Self::io_err(key))?;

        temp_path
            .persist(&destination)
            .map_err(|e| Self::io_err(key)(e.error))?;

        debug!(
            "Published asset '{}' ({}, {} bytes) to {:?}",
            key, content_type, written, destination
        );
        Ok(())
    }

    fn key_to_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key)
    }
}

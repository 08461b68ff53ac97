use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use super::{check_exit, MediaError};
use crate::modules::staging::{StagedFile, StagingArea};

/// A remuxed copy of a staged upload. Always a different file from its
/// source, with its own cleanup.
pub type OptimizedFile = StagedFile;

#[async_trait]
pub trait ContainerOptimizer: Send + Sync {
    /// Produce a fast-start copy of `source` without re-encoding
    async fn optimize(&self, source: &StagedFile) -> Result<OptimizedFile, MediaError>;
}

/// [`ContainerOptimizer`] backed by the `ffmpeg` executable.
///
/// Streams are copied as-is (`-c copy`); only the MP4 `moov` atom is moved to
/// the front of the file (`-movflags faststart`).
pub struct FfmpegOptimizer {
    binary: String,
    staging: StagingArea,
}

impl FfmpegOptimizer {
    pub fn new(binary: impl Into<String>, staging: StagingArea) -> Self {
        Self {
            binary: binary.into(),
            staging,
        }
    }
}

#[async_trait]
impl ContainerOptimizer for FfmpegOptimizer {
    async fn optimize(&self, source: &StagedFile) -> Result<OptimizedFile, MediaError> {
        let mut output = self.staging.reserve("faststart", "mp4")?;

        let result = Command::new(&self.binary)
            .args(["-nostdin", "-loglevel", "error", "-y", "-i"])
            .arg(source.path())
            .args(["-c", "copy", "-movflags", "faststart", "-f", "mp4"])
            .arg(output.path())
            .output()
            .await
            .map_err(|source| MediaError::Spawn {
                tool: self.binary.clone(),
                source,
            })?;

        check_exit(&self.binary, &result)?;

        let len = output
            .sync_len()
            .await
            .map_err(|e| MediaError::Output(e.to_string()))?;
        debug!(
            "Remuxed {:?} ({} bytes) into {:?} ({} bytes)",
            source.path(),
            source.len(),
            output.path(),
            len
        );

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;
    use futures::stream;
    use std::path::Path;
    use tempfile::tempdir;

    async fn stage_bytes(area: &StagingArea, data: &'static [u8]) -> StagedFile {
        let body = stream::iter(vec![Ok::<_, std::io::Error>(Bytes::from_static(data))]);
        area.stage(body, "mp4", 1024).await.unwrap()
    }

    fn entries(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_optimize_runs_stream_copy_with_faststart() {
        use std::os::unix::fs::PermissionsExt;

        let tools = tempdir().unwrap();
        let args_file = tools.path().join("args.txt");
        let script = tools.path().join("fake-ffmpeg");
        // Record the arguments, then copy the input (after -i) to the last argument
        std::fs::write(
            &script,
            format!(
                "#!/bin/sh\necho \"$@\" > '{}'\nin=''\nprev=''\nfor a; do if [ \"$prev\" = '-i' ]; then in=\"$a\"; fi; prev=\"$a\"; last=\"$a\"; done\ncp \"$in\" \"$last\"\n",
                args_file.display()
            ),
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let staging_dir = tempdir().unwrap();
        let area = StagingArea::new(staging_dir.path());
        let source = stage_bytes(&area, b"moov-at-end").await;

        let optimizer = FfmpegOptimizer::new(script.to_string_lossy(), area.clone());
        let optimized = optimizer.optimize(&source).await.unwrap();

        assert_ne!(optimized.path(), source.path());
        assert_eq!(optimized.len(), 11);
        assert_eq!(std::fs::read(optimized.path()).unwrap(), b"moov-at-end");

        let args = std::fs::read_to_string(&args_file).unwrap();
        assert!(args.contains("-c copy"));
        assert!(args.contains("-movflags faststart"));
        assert!(args.contains(&source.path().display().to_string()));

        drop(optimized);
        drop(source);
        assert_eq!(entries(staging_dir.path()), 0);
    }

    #[tokio::test]
    async fn test_failed_remux_removes_output() {
        let staging_dir = tempdir().unwrap();
        let area = StagingArea::new(staging_dir.path());
        let source = stage_bytes(&area, b"garbage").await;

        let optimizer = FfmpegOptimizer::new("false", area.clone());
        let result = optimizer.optimize(&source).await;
        assert!(matches!(result, Err(MediaError::ToolFailed { .. })));

        // Only the source remains
        assert_eq!(entries(staging_dir.path()), 1);
    }
}

//! Local staging of in-flight uploads.
//!
//! Every staged file is backed by a [`TempPath`], so the file is removed when
//! its handle goes out of scope, whichever way the pipeline exits. Callers that
//! want to observe removal failures call [`StagedFile::release`] explicitly.

use std::io;
use std::path::{Path, PathBuf};

use axum::body::Bytes;
use axum::BoxError;
use futures::{Stream, TryStreamExt};
use tempfile::{Builder, TempPath};
use thiserror::Error;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufWriter};
use tokio_util::io::StreamReader;
use tracing::debug;

const FILE_PREFIX: &str = "tubely-";

#[derive(Debug, Error)]
pub enum StagingError {
    #[error("Failed to create temporary file in {dir}: {source}")]
    Create {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write upload to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to read staged file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Upload exceeds the {limit} byte limit")]
    TooLarge { limit: usize },
}

/// Directory holding the temporary files of all in-flight uploads
#[derive(Debug, Clone)]
pub struct StagingArea {
    dir: PathBuf,
}

impl StagingArea {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn ensure_dir(&self) -> io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await
    }

    /// Create an empty, uniquely named file for a tool to write into
    pub fn reserve(&self, label: &str, extension: &str) -> Result<StagedFile, StagingError> {
        let (_, path) = self.create(label, extension)?.into_parts();
        Ok(StagedFile { path, len: 0 })
    }

    /// Copy an upload body into a new staged file.
    ///
    /// Fails with [`StagingError::TooLarge`] as soon as more than `max_bytes`
    /// have been received; the partial file is removed.
    pub async fn stage<S, E>(
        &self,
        stream: S,
        extension: &str,
        max_bytes: usize,
    ) -> Result<StagedFile, StagingError>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: Into<BoxError>,
    {
        let (std_file, path) = self.create("upload", extension)?.into_parts();
        let mut staged = StagedFile { path, len: 0 };

        let body_with_io_error = stream.map_err(io::Error::other);
        let body_reader = StreamReader::new(body_with_io_error);
        futures::pin_mut!(body_reader);

        // One byte past the ceiling is enough to detect an oversized body
        let mut limited = body_reader.take(max_bytes as u64 + 1);
        let mut file = BufWriter::new(File::from_std(std_file));

        let write_err = |source| StagingError::Write {
            path: staged.path.to_path_buf(),
            source,
        };

        let written = tokio::io::copy(&mut limited, &mut file)
            .await
            .map_err(write_err)?;
        if written > max_bytes as u64 {
            return Err(StagingError::TooLarge { limit: max_bytes });
        }
        file.flush().await.map_err(write_err)?;

        staged.len = written;
        debug!("Staged {} bytes at {:?}", written, staged.path());
        Ok(staged)
    }

    fn create(&self, label: &str, extension: &str) -> Result<tempfile::NamedTempFile, StagingError> {
        Builder::new()
            .prefix(&format!("{}{}-", FILE_PREFIX, label))
            .suffix(&format!(".{}", extension))
            .tempfile_in(&self.dir)
            .map_err(|source| StagingError::Create {
                dir: self.dir.clone(),
                source,
            })
    }
}

/// Exclusively owned temporary file with a path view (for external tools)
/// and a stream view (for publishing)
#[derive(Debug)]
pub struct StagedFile {
    path: TempPath,
    len: u64,
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bytes written during staging; refreshed by [`StagedFile::sync_len`]
    pub fn len(&self) -> u64 {
        self.len
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Re-read the size from disk after an external tool wrote the file
    pub async fn sync_len(&mut self) -> io::Result<u64> {
        self.len = tokio::fs::metadata(&self.path).await?.len();
        Ok(self.len)
    }

    /// Open a fresh read handle positioned at the start of the file
    pub async fn open(&self) -> Result<File, StagingError> {
        File::open(&self.path)
            .await
            .map_err(|source| StagingError::Read {
                path: self.path.to_path_buf(),
                source,
            })
    }

    /// Delete the file now and report the outcome
    pub fn release(self) -> io::Result<()> {
        self.path.close()
    }
}

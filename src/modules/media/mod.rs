//! External media tooling: container inspection (ffprobe) and fast-start
//! remuxing (ffmpeg). Both sit behind traits so the upload pipeline can run
//! against fakes.

mod inspector;
mod optimizer;

pub use inspector::{FfprobeInspector, MediaInspector};
pub use optimizer::{ContainerOptimizer, FfmpegOptimizer, OptimizedFile};

use std::io;
use std::process::Output;

use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::modules::staging::StagingError;

/// Orientation bucket of a video, used as its storage folder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AspectClass {
    /// 16:9
    Landscape,
    /// 9:16
    Portrait,
    Other,
}

impl AspectClass {
    /// Classify an ffprobe `display_aspect_ratio` value (exact match only)
    pub fn from_display_aspect_ratio(ratio: Option<&str>) -> Self {
        match ratio {
            Some("16:9") => AspectClass::Landscape,
            Some("9:16") => AspectClass::Portrait,
            _ => AspectClass::Other,
        }
    }

    pub fn folder(&self) -> &'static str {
        match self {
            AspectClass::Landscape => "landscape",
            AspectClass::Portrait => "portrait",
            AspectClass::Other => "other",
        }
    }
}

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Failed to run {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: io::Error,
    },

    #[error("{tool} exited with {status}: {stderr}")]
    ToolFailed {
        tool: String,
        status: String,
        stderr: String,
    },

    #[error("Invalid ffprobe output: {0}")]
    InvalidProbeOutput(String),

    #[error("Failed to prepare output file: {0}")]
    Output(String),
}

impl From<StagingError> for MediaError {
    fn from(err: StagingError) -> Self {
        MediaError::Output(err.to_string())
    }
}

const STDERR_TAIL_BYTES: usize = 1024;

/// Turn a finished process into an error unless it exited successfully
fn check_exit(tool: &str, output: &Output) -> Result<(), MediaError> {
    if output.status.success() {
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    // Keep the end of stderr, where ffmpeg reports the actual failure
    let start = stderr
        .char_indices()
        .map(|(i, _)| i)
        .find(|&i| stderr.len() - i <= STDERR_TAIL_BYTES)
        .unwrap_or(stderr.len());

    Err(MediaError::ToolFailed {
        tool: tool.to_string(),
        status: output.status.to_string(),
        stderr: stderr[start..].to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aspect_class_exact_match() {
        assert_eq!(
            AspectClass::from_display_aspect_ratio(Some("16:9")),
            AspectClass::Landscape
        );
        assert_eq!(
            AspectClass::from_display_aspect_ratio(Some("9:16")),
            AspectClass::Portrait
        );
        assert_eq!(
            AspectClass::from_display_aspect_ratio(Some("4:3")),
            AspectClass::Other
        );
        assert_eq!(
            AspectClass::from_display_aspect_ratio(Some(" 16:9")),
            AspectClass::Other
        );
        assert_eq!(
            AspectClass::from_display_aspect_ratio(None),
            AspectClass::Other
        );
    }

    #[test]
    fn test_folders() {
        let folders: Vec<_> = [
            AspectClass::Landscape,
            AspectClass::Portrait,
            AspectClass::Other,
        ]
        .iter()
        .map(|a| a.folder())
        .collect();
        assert_eq!(folders, vec!["landscape", "portrait", "other"]);
    }
}

use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, warn};

use super::{check_exit, AspectClass, MediaError};

#[async_trait]
pub trait MediaInspector: Send + Sync {
    /// Classify the orientation of the media file at `path`
    async fn classify(&self, path: &Path) -> Result<AspectClass, MediaError>;
}

/// Subset of `ffprobe -print_format json -show_streams`
#[derive(Debug, Deserialize)]
struct ProbeOutput {
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    #[serde(default)]
    codec_type: Option<String>,
    #[serde(default)]
    display_aspect_ratio: Option<String>,
}

/// Classify raw ffprobe JSON by the first stream's display aspect ratio.
///
/// Output that is not JSON or has no `streams` array is an error. An empty
/// `streams` array is not: with no first stream there is no declared ratio,
/// and a missing ratio classifies as [`AspectClass::Other`]. Only the first
/// stream is considered, even when a later one carries a ratio.
fn classify_probe_output(stdout: &[u8]) -> Result<AspectClass, MediaError> {
    let probe: ProbeOutput = serde_json::from_slice(stdout)
        .map_err(|e| MediaError::InvalidProbeOutput(e.to_string()))?;

    let Some(first) = probe.streams.first() else {
        warn!("ffprobe reported no streams");
        return Ok(AspectClass::Other);
    };

    debug!(
        "First stream: codec_type={:?}, display_aspect_ratio={:?}",
        first.codec_type, first.display_aspect_ratio
    );

    Ok(AspectClass::from_display_aspect_ratio(
        first.display_aspect_ratio.as_deref(),
    ))
}

/// [`MediaInspector`] backed by the `ffprobe` executable
pub struct FfprobeInspector {
    binary: String,
}

impl FfprobeInspector {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

#[async_trait]
impl MediaInspector for FfprobeInspector {
    async fn classify(&self, path: &Path) -> Result<AspectClass, MediaError> {
        let output = Command::new(&self.binary)
            .args(["-v", "error", "-print_format", "json", "-show_streams"])
            .arg(path)
            .output()
            .await
            .map_err(|source| MediaError::Spawn {
                tool: self.binary.clone(),
                source,
            })?;

        check_exit(&self.binary, &output)?;
        classify_probe_output(&output.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_classify_landscape_and_portrait() {
        let landscape = br#"{"streams":[{"codec_type":"video","display_aspect_ratio":"16:9"},{"codec_type":"audio"}]}"#;
        assert_eq!(
            classify_probe_output(landscape).unwrap(),
            AspectClass::Landscape
        );

        let portrait = br#"{"streams":[{"codec_type":"video","width":608,"height":1080,"display_aspect_ratio":"9:16"}]}"#;
        assert_eq!(
            classify_probe_output(portrait).unwrap(),
            AspectClass::Portrait
        );
    }

    #[test]
    fn test_classify_other_ratios_and_missing_field() {
        let four_three = br#"{"streams":[{"display_aspect_ratio":"4:3"}]}"#;
        assert_eq!(classify_probe_output(four_three).unwrap(), AspectClass::Other);

        let missing = br#"{"streams":[{"codec_type":"video","width":1920}]}"#;
        assert_eq!(classify_probe_output(missing).unwrap(), AspectClass::Other);

        let empty = br#"{"streams":[]}"#;
        assert_eq!(classify_probe_output(empty).unwrap(), AspectClass::Other);
    }

    #[test]
    fn test_only_first_stream_counts() {
        let audio_first =
            br#"{"streams":[{"codec_type":"audio"},{"codec_type":"video","display_aspect_ratio":"16:9"}]}"#;
        assert_eq!(
            classify_probe_output(audio_first).unwrap(),
            AspectClass::Other
        );
    }

    #[test]
    fn test_classify_rejects_malformed_output() {
        assert!(matches!(
            classify_probe_output(b"not json"),
            Err(MediaError::InvalidProbeOutput(_))
        ));
        assert!(matches!(
            classify_probe_output(br#"{"format":{}}"#),
            Err(MediaError::InvalidProbeOutput(_))
        ));
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_probe_failure() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("input.mp4");
        std::fs::write(&input, b"not a video").unwrap();

        // `false` ignores its arguments and exits 1
        let inspector = FfprobeInspector::new("false");
        let result = inspector.classify(&input).await;
        assert!(matches!(result, Err(MediaError::ToolFailed { .. })));
    }

    #[tokio::test]
    async fn test_missing_binary_is_spawn_failure() {
        let inspector = FfprobeInspector::new("/nonexistent/ffprobe");
        let result = inspector.classify(Path::new("/tmp/whatever.mp4")).await;
        assert!(matches!(result, Err(MediaError::Spawn { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_classify_runs_probe_binary() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let script = dir.path().join("fake-ffprobe");
        std::fs::write(
            &script,
            "#!/bin/sh\necho '{\"streams\":[{\"display_aspect_ratio\":\"9:16\"}]}'\n",
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let inspector = FfprobeInspector::new(script.to_string_lossy());
        let aspect = inspector.classify(&dir.path().join("in.mp4")).await;
        assert_eq!(aspect.unwrap(), AspectClass::Portrait);
    }
}

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use crate::{
    error::{RenderError, Result},
    plan::MediaProperties,
    render::MediaMeasurer,
};

/// Measures rendered artifacts with ffprobe
pub struct FfprobeMeasurer {
    ffprobe: PathBuf,
}

impl FfprobeMeasurer {
    pub fn new<P: Into<PathBuf>>(ffprobe: P) -> Self {
        Self { ffprobe: ffprobe.into() }
    }
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

#[async_trait]
impl MediaMeasurer for FfprobeMeasurer {
    async fn measure(&self, artifact: &Path) -> Result<MediaProperties> {
        let failed = |reason: String| RenderError::MeasurementFailed {
            path: artifact.display().to_string(),
            reason,
        };

        if !artifact.exists() {
            return Err(failed("artifact does not exist".to_string()).into());
        }

        let output = Command::new(&self.ffprobe)
            .args(["-v", "error", "-print_format", "json", "-show_streams", "-show_format"])
            .arg(artifact)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| failed(format!("failed to run {}: {}", self.ffprobe.display(), e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(failed(format!("ffprobe exited with {}: {}", output.status, stderr.trim())).into());
        }

        let properties = parse_probe_output(&String::from_utf8_lossy(&output.stdout)).map_err(failed)?;
        debug!("Measured {:?}: {:?}", artifact, properties);
        Ok(properties)
    }
}

/// Width, height and duration of the first video stream in ffprobe JSON
pub fn parse_probe_output(json: &str) -> std::result::Result<MediaProperties, String> {
    let probe: ProbeOutput = serde_json::from_str(json).map_err(|e| format!("invalid ffprobe output: {}", e))?;

    let video = probe
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| "no video stream".to_string())?;

    let (width, height) = match (video.width, video.height) {
        (Some(w), Some(h)) => (w, h),
        _ => return Err("video stream has no dimensions".to_string()),
    };

    // Container duration first, the stream's when the container has none
    let duration = probe
        .format
        .as_ref()
        .and_then(|f| f.duration.as_deref())
        .or(video.duration.as_deref())
        .and_then(|d| d.parse::<f64>().ok())
        .ok_or_else(|| "no duration".to_string())?;

    Ok(MediaProperties {
        width,
        height,
        duration,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_probe_output() {
        let json = r#"{
            "streams": [
                {"index": 0, "codec_type": "audio", "duration": "12.100000"},
                {"index": 1, "codec_type": "video", "width": 1080, "height": 1920, "duration": "12.033333"}
            ],
            "format": {"filename": "out.mp4", "duration": "12.100000"}
        }"#;

        let props = parse_probe_output(json).unwrap();
        assert_eq!((props.width, props.height), (1080, 1920));
        assert!((props.duration - 12.1).abs() < 1e-9);
    }

    #[test]
    fn test_stream_duration_fallback() {
        let json = r#"{"streams": [{"codec_type": "video", "width": 1920, "height": 1080, "duration": "9.5"}], "format": {}}"#;
        assert_eq!(parse_probe_output(json).unwrap().duration, 9.5);
    }

    #[test]
    fn test_missing_video_stream() {
        let json = r#"{"streams": [{"codec_type": "audio"}], "format": {"duration": "3.0"}}"#;
        assert!(parse_probe_output(json).is_err());
        assert!(parse_probe_output("not json").is_err());
    }
}

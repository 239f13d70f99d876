use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use crate::{
    error::{RenderError, Result},
    render::CapabilityProbe,
    schedule::TransitionSet,
};

/// Reads the `xfade` transition list from the local ffmpeg build
pub struct FfmpegCapabilityProbe {
    ffmpeg: PathBuf,
}

impl FfmpegCapabilityProbe {
    pub fn new<P: Into<PathBuf>>(ffmpeg: P) -> Self {
        Self { ffmpeg: ffmpeg.into() }
    }
}

#[async_trait]
impl CapabilityProbe for FfmpegCapabilityProbe {
    async fn supported_transitions(&self) -> Result<TransitionSet> {
        let output = Command::new(&self.ffmpeg)
            .args(["-hide_banner", "-h", "filter=xfade"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| RenderError::ProbeFailed {
                reason: format!("failed to run {}: {}", self.ffmpeg.display(), e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RenderError::ProbeFailed {
                reason: format!("ffmpeg exited with {}: {}", output.status, stderr.trim()),
            }
            .into());
        }

        let help = String::from_utf8_lossy(&output.stdout);
        let supported = parse_xfade_help(&help);
        info!("ffmpeg supports {} xfade transitions", supported.len());
        Ok(supported)
    }
}

/// Extract the enumerated values of the `transition` option from
/// `ffmpeg -h filter=xfade` output
pub fn parse_xfade_help(help: &str) -> TransitionSet {
    let mut names = Vec::new();
    let mut in_transition = false;

    for line in help.lines() {
        let mut tokens = line.split_whitespace();
        let Some(first) = tokens.next() else {
            continue;
        };
        let second = tokens.next();

        if !in_transition {
            in_transition = first == "transition" && second == Some("<int>");
            continue;
        }

        // Enumerated values read "name  <number>  flags description"
        match second.map(str::parse::<i64>) {
            Some(Ok(_)) if first != "custom" => names.push(first.to_string()),
            Some(Ok(_)) => {}
            _ => break,
        }
    }

    debug!("Parsed xfade transitions: {:?}", names);
    TransitionSet::new(names)
}

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use crate::{
    config::VideoConfig,
    error::{RenderError, Result},
    render::{RenderJob, Renderer},
};

/// Renders composition plans with an external ffmpeg binary
pub struct FfmpegRenderer {
    ffmpeg: PathBuf,
    video: VideoConfig,
}

impl FfmpegRenderer {
    pub fn new<P: Into<PathBuf>>(ffmpeg: P, video: VideoConfig) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            video,
        }
    }

    pub async fn is_available(&self) -> bool {
        Command::new(&self.ffmpeg)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|status| status.success())
            .unwrap_or(false)
    }

    /// Full argument list for one render attempt
    pub fn build_args(&self, job: &RenderJob<'_>) -> Vec<String> {
        let plan = job.plan;
        let mut args: Vec<String> = vec!["-hide_banner".into(), "-y".into()];

        // One single-frame input per slot; slot i reads input i
        for source in plan.inputs() {
            args.push("-i".into());
            args.push(source.display().to_string());
        }

        let audio_index = plan.fragments.len();
        if let Some(audio) = job.audio {
            args.push("-i".into());
            args.push(audio.display().to_string());
        }

        args.push("-filter_complex".into());
        args.push(plan.to_filter_complex());
        args.push("-map".into());
        args.push(format!("[{}]", plan.output_label));

        if job.audio.is_some() {
            args.extend([
                "-map".to_string(),
                format!("{}:a", audio_index),
                "-c:a".to_string(),
                self.video.audio_codec.clone(),
                "-b:a".to_string(),
                self.video.audio_bitrate.clone(),
            ]);
        }

        args.extend([
            "-c:v".to_string(),
            self.video.codec.clone(),
            "-preset".to_string(),
            self.video.preset.clone(),
            "-crf".to_string(),
            quality_to_crf(self.video.quality).to_string(),
            "-pix_fmt".to_string(),
            "yuv420p".to_string(),
            "-r".to_string(),
            plan.frame.fps.to_string(),
            "-t".to_string(),
            format!("{:.3}", plan.total_duration),
            "-movflags".to_string(),
            "+faststart".to_string(),
        ]);

        args.push(job.output.display().to_string());
        args
    }
}

#[async_trait]
impl Renderer for FfmpegRenderer {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn render(&self, job: RenderJob<'_>) -> Result<()> {
        let args = self.build_args(&job);
        info!(
            "Rendering {:?} plan ({} inputs) to {:?}",
            job.plan.kind,
            job.plan.fragments.len(),
            job.output
        );
        debug!("ffmpeg args: {:?}", args);

        let output = Command::new(&self.ffmpeg)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| RenderError::ExecutionFailed {
                reason: format!("failed to spawn {}: {}", self.ffmpeg.display(), e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let tail: Vec<&str> = stderr.lines().rev().take(12).collect();
            return Err(RenderError::ExecutionFailed {
                reason: format!(
                    "ffmpeg exited with {}: {}",
                    output.status,
                    tail.into_iter().rev().collect::<Vec<_>>().join("\n")
                ),
            }
            .into());
        }

        Ok(())
    }
}

fn quality_to_crf(quality: u8) -> u8 {
    (51 - ((quality.min(100) as f32 / 100.0) * 51.0) as u8).clamp(0, 51)
}

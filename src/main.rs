use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{error, info, warn};

use slideshow_compositor::{
    composition::{CompositionEngine, RenderReport},
    config::Config,
    logging::init_logging,
    profile::ContentType,
    render::FfmpegRenderer,
};

const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "webp", "bmp"];

#[derive(Parser)]
#[command(
    name = "slideshow-compositor",
    version,
    about = "Turn still images into motion slideshows for every content format",
    long_about = "Slideshow-Compositor plans Ken Burns motion and transitions for a set of images, renders them with ffmpeg and falls back to plain hard cuts when the effects render cannot be trusted."
)]
struct Cli {
    /// Image files or directories of images (directories are read in name order)
    #[arg(short, long, required = true, num_args = 1..)]
    images: Vec<PathBuf>,

    /// Audio track muxed under the video (optional)
    #[arg(short, long)]
    audio: Option<PathBuf>,

    /// Output video file path
    #[arg(short, long)]
    output: PathBuf,

    /// Content type (long, medium, short, reels); repeat to render variants
    #[arg(short = 't', long = "content-type", default_value = "medium")]
    content_types: Vec<ContentType>,

    /// Target duration in seconds
    #[arg(short, long)]
    duration: f64,

    /// Configuration file (optional)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = match &cli.config {
        Some(config_path) => Config::from_file(config_path)
            .with_context(|| format!("loading configuration from {:?}", config_path))?,
        None => Config::default(),
    };
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    if cli.json_logs {
        config.logging.json = true;
    }
    config.validate().context("invalid configuration")?;

    init_logging(&config.logging);

    info!("Starting Slideshow-Compositor v{}", env!("CARGO_PKG_VERSION"));

    let images = collect_images(&cli.images)?;
    info!("Images: {}", images.len());
    info!("Output: {:?}", cli.output);

    let ffmpeg = FfmpegRenderer::new(config.renderer.ffmpeg_path.clone(), config.video.clone());
    if !ffmpeg.is_available().await {
        warn!("ffmpeg not runnable at {:?}, renders will fail", config.renderer.ffmpeg_path);
    }

    let engine = CompositionEngine::new(config);

    let requests = cli
        .content_types
        .iter()
        .map(|content_type| {
            let output = if cli.content_types.len() > 1 {
                variant_output(&cli.output, *content_type)
            } else {
                cli.output.clone()
            };
            engine.request(*content_type, images.clone(), cli.audio.clone(), output, cli.duration)
        })
        .collect();

    let mut failures = 0;
    for result in engine.compose_variants(requests).await {
        match result {
            Ok(report) => print_report(&report),
            Err(e) => {
                failures += 1;
                error!("{}", e.user_message());
            }
        }
    }

    if failures > 0 {
        bail!("{} of {} renders failed", failures, cli.content_types.len());
    }

    info!("Composition complete!");
    Ok(())
}

/// Expand directories into their image files, keeping explicit files as given
fn collect_images(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut images = Vec::new();

    for input in inputs {
        if input.is_dir() {
            let mut found: Vec<PathBuf> = std::fs::read_dir(input)
                .with_context(|| format!("reading image directory {:?}", input))?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|path| is_image(path))
                .collect();
            found.sort();

            if found.is_empty() {
                warn!("No images found in {:?}", input);
            }
            images.extend(found);
        } else if input.is_file() {
            images.push(input.clone());
        } else {
            bail!("image path does not exist: {:?}", input);
        }
    }

    if images.is_empty() {
        bail!("no input images");
    }
    Ok(images)
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// `story.mp4` rendered as reels becomes `story_reels.mp4`
fn variant_output(output: &Path, content_type: ContentType) -> PathBuf {
    let stem = output.file_stem().and_then(|s| s.to_str()).unwrap_or("output");
    let extension = output.extension().and_then(|s| s.to_str()).unwrap_or("mp4");
    output.with_file_name(format!("{}_{}.{}", stem, content_type, extension))
}

fn print_report(report: &RenderReport) {
    info!(
        "✅ {} -> {:?} ({:?} plan, {:.3}s, {} images shown)",
        report.content_type,
        report.output,
        report.kind(),
        report.validation.observed_duration,
        report.distinct_images
    );
    for warning in &report.warnings {
        warn!("   {}", warning);
    }
}

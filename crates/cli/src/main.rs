use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use facewatch_core::detection::infrastructure::image_dir_source::ImageDirSource;
use facewatch_core::detection::infrastructure::replay_detector::ReplayDetector;
use facewatch_core::dispatch::infrastructure::http_notifier::HttpNotifier;
use facewatch_core::pipeline::camera::Camera;
use facewatch_core::pipeline::cancel::CancelToken;
use facewatch_core::pipeline::config::EngineConfig;
use facewatch_core::pipeline::engine::Engine;
use facewatch_core::recognition::bootstrap::load_gallery;

/// Face recognition worker: tracks faces across camera streams, resolves
/// identities against a reference gallery, and posts notification events
/// to a backend.
///
/// Neural detection and live stream ingest are collaborator processes;
/// this binary consumes their recorded output (frame directories plus a
/// scripted detection stream), which also makes full-pipeline validation
/// runs reproducible.
#[derive(Parser)]
#[command(name = "facewatch")]
struct Cli {
    /// Camera as `id=frames-dir` (repeatable). Frames are served in
    /// sorted file order and replayed from the start on reconnect.
    #[arg(long = "camera", value_name = "ID=DIR")]
    cameras: Vec<String>,

    /// Directory of reference images for the known-identity gallery.
    #[arg(long)]
    gallery: PathBuf,

    /// Detection script (JSON Lines) consumed one line per detector call
    /// during the run.
    #[arg(long)]
    detections: PathBuf,

    /// Detection script consumed while bootstrapping the gallery, one
    /// line per reference image.
    #[arg(long)]
    gallery_detections: PathBuf,

    /// Backend endpoint receiving recognition events.
    #[arg(long, default_value = "http://127.0.0.1:3000/api/recognitions")]
    backend: String,

    /// JSON engine config; flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Minimum gallery similarity for a known match (0.0-1.0).
    #[arg(long)]
    similarity_threshold: Option<f64>,

    /// Seconds between dispatches for the same camera+identity.
    #[arg(long)]
    cooldown_seconds: Option<f64>,

    /// Run detection on every Nth frame.
    #[arg(long)]
    frame_stride: Option<u64>,

    /// Also dispatch unresolved ("unknown") identities.
    #[arg(long)]
    send_unknown: bool,

    /// Consecutive identical resolutions required before dispatch.
    #[arg(long)]
    min_confirm_hits: Option<u32>,

    /// Stop after this many ticks (handy for replay runs).
    #[arg(long)]
    max_ticks: Option<u64>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = build_config(&cli)?;
    validate(&cli, &config)?;

    let cameras = parse_cameras(&cli.cameras)?;

    let mut gallery_detector = ReplayDetector::from_file(&cli.gallery_detections)?;
    let gallery = load_gallery(&cli.gallery, &mut gallery_detector)?;

    let detector = ReplayDetector::from_file(&cli.detections)?;
    let notifier = HttpNotifier::new(&cli.backend, config.http_timeout())?;
    let cancel = CancelToken::new();

    log::info!(
        "starting: {} cameras, {} known identities, backend {}",
        cameras.len(),
        gallery.len(),
        cli.backend
    );

    let mut engine = Engine::new(
        config,
        cameras,
        Box::new(detector),
        gallery,
        Box::new(notifier),
        cancel,
    )?;
    engine.run();
    Ok(())
}

fn build_config(cli: &Cli) -> Result<EngineConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };
    if let Some(v) = cli.similarity_threshold {
        config.similarity_threshold = v;
    }
    if let Some(v) = cli.cooldown_seconds {
        config.cooldown_seconds = v;
    }
    if let Some(v) = cli.frame_stride {
        config.frame_stride = v;
    }
    if cli.send_unknown {
        config.send_unknown = true;
    }
    if let Some(v) = cli.min_confirm_hits {
        config.min_confirm_hits = v;
    }
    if cli.max_ticks.is_some() {
        config.max_ticks = cli.max_ticks;
    }
    Ok(config)
}

fn validate(cli: &Cli, config: &EngineConfig) -> Result<(), Box<dyn std::error::Error>> {
    if cli.cameras.is_empty() {
        return Err("no cameras configured (pass at least one --camera id=dir)".into());
    }
    if !cli.gallery.is_dir() {
        return Err(format!("gallery directory not found: {}", cli.gallery.display()).into());
    }
    if !(0.0..=1.0).contains(&config.similarity_threshold) {
        return Err(format!(
            "similarity threshold must be between 0.0 and 1.0, got {}",
            config.similarity_threshold
        )
        .into());
    }
    if config.frame_stride == 0 {
        return Err("frame stride must be at least 1".into());
    }
    if config.min_window_frames == 0 || config.min_window_frames > config.max_window {
        return Err(format!(
            "min window frames must be in 1..={}, got {}",
            config.max_window, config.min_window_frames
        )
        .into());
    }
    Ok(())
}

fn parse_cameras(specs: &[String]) -> Result<Vec<Camera>, Box<dyn std::error::Error>> {
    specs
        .iter()
        .map(|spec| {
            let (id, dir) = spec
                .split_once('=')
                .ok_or_else(|| format!("camera spec must be ID=DIR, got '{spec}'"))?;
            if id.is_empty() {
                return Err(format!("camera spec has an empty id: '{spec}'").into());
            }
            Ok(Camera::new(
                id,
                Box::new(ImageDirSource::new(Path::new(dir))),
            ))
        })
        .collect()
}

//! detect_faces - outline faces in local photos

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use face_overlay::detect::DetectionCapability;
use face_overlay::ingest::FileConfig;
use face_overlay::{
    BackendRegistry, CanvasSurface, Color, ContentMode, DetectionOrchestrator, DetectionOutcome,
    FileSource, ImageSource, OverlayConfig, Size,
};

#[path = "../ui.rs"]
mod ui;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Photos to scan, in order.
    #[arg(required = true, value_name = "IMAGE")]
    images: Vec<PathBuf>,
    /// JSON config file.
    #[arg(long, env = "FACE_OVERLAY_CONFIG")]
    config: Option<PathBuf>,
    /// Display surface size, e.g. 375x667.
    #[arg(long, value_name = "WxH")]
    display: Option<String>,
    /// How the photo is fitted to the display (aspect_fit|orientation_fit|stretch).
    #[arg(long, value_name = "MODE")]
    content_mode: Option<String>,
    /// Detector backend name (stub|rustface).
    #[arg(long)]
    backend: Option<String>,
    /// Detector model file.
    #[arg(long)]
    model: Option<PathBuf>,
    /// Directory for rendered overlays (<stem>_faces.png).
    #[arg(long)]
    out: Option<PathBuf>,
    /// UI mode for stderr progress (auto|plain|pretty)
    #[arg(long, default_value = "auto", value_name = "MODE")]
    ui: String,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let is_tty = std::io::stderr().is_terminal();
    let stdout_is_tty = std::io::stdout().is_terminal();
    let ui = ui::Ui::from_args(Some(&args.ui), is_tty, !stdout_is_tty);

    let cfg = {
        let _stage = ui.stage("Load config");
        load_config(&args)?
    };
    if let Some(out) = &args.out {
        std::fs::create_dir_all(out)
            .with_context(|| format!("failed to create output dir {}", out.display()))?;
    }

    let registry = {
        let _stage = ui.stage(&format!("Load {} detector", cfg.detector.backend));
        BackendRegistry::from_settings(&cfg.detector)?
    };
    let detector = registry.backend_for_capability(DetectionCapability::FaceRectangles)?;

    let mut source = FileSource::new(FileConfig {
        paths: args.images.clone(),
    })?;
    let surface = CanvasSurface::new(cfg.display, Color::BLACK);
    let mut orchestrator = DetectionOrchestrator::from_config(&cfg, detector, surface)?;

    let mut progress = ui.progress("Detect faces", args.images.len() as u64);
    let mut total_faces = 0usize;
    for path in &args.images {
        let image = source.next_image()?;
        progress.advance(&path.display().to_string());
        let Some(generation) = orchestrator.present(image)? else {
            println!("{}: no image data", path.display());
            continue;
        };
        let Some(report) = orchestrator.wait_for(generation, cfg.detector.timeout)? else {
            log::warn!(
                "detection for {} did not finish within {:?}",
                path.display(),
                cfg.detector.timeout
            );
            println!("{}: timed out", path.display());
            continue;
        };
        match &report.outcome {
            DetectionOutcome::Drawn(rects) => {
                total_faces += rects.len();
                for (idx, rect) in rects.iter().enumerate() {
                    println!("{}: face {} at {}", path.display(), idx + 1, rect);
                }
            }
            DetectionOutcome::NoFaces => println!("{}: no faces", path.display()),
            DetectionOutcome::Failed(message) => {
                println!("{}: detection failed: {}", path.display(), message)
            }
            DetectionOutcome::Stale => continue,
        }
        if let Some(out) = &args.out {
            let target = out.join(overlay_file_name(path));
            orchestrator.surface().save(&target)?;
            log::info!("wrote {}", target.display());
        }
    }
    drop(progress);

    eprintln!(
        "{} face(s) in {} photo(s) using {}",
        total_faces,
        args.images.len(),
        registry.default_name().unwrap_or("unknown")
    );
    Ok(())
}

fn load_config(args: &Args) -> Result<OverlayConfig> {
    let mut cfg = OverlayConfig::load_with(args.config.as_deref())?;
    if let Some(display) = &args.display {
        cfg.display = Size::parse(display)
            .ok_or_else(|| anyhow!("--display must look like WIDTHxHEIGHT, got '{}'", display))?;
    }
    if let Some(mode) = &args.content_mode {
        cfg.content_mode = ContentMode::parse(mode)
            .ok_or_else(|| anyhow!("--content-mode '{}' is not a content mode", mode))?;
    }
    if let Some(backend) = &args.backend {
        cfg.detector.backend = backend.clone();
    }
    if let Some(model) = &args.model {
        cfg.detector.model_path = Some(model.clone());
    }
    cfg.validate()?;
    Ok(cfg)
}

fn overlay_file_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    format!("{}_faces.png", stem)
}

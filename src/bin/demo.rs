//! demo - end-to-end synthetic run of the face overlay pipeline

use anyhow::{anyhow, Result};
use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use face_overlay::ingest::SyntheticConfig;
use face_overlay::{
    CanvasSurface, Color, DetectionOrchestrator, DetectionOutcome, ImageSource, NormalizedRect,
    ShapeLayer, SharedDetector, Size, StubBackend, SyntheticSource,
};

#[path = "../ui.rs"]
mod ui;

const WAIT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Number of synthetic photos to pick.
    #[arg(long, default_value_t = 3)]
    photos: u32,
    /// Display surface size.
    #[arg(long, default_value = "375x667", value_name = "WxH")]
    display: String,
    /// Simulated detector latency in milliseconds.
    #[arg(long, default_value_t = 50)]
    latency_ms: u64,
    /// Write the last photo with its overlay to this PNG file.
    #[arg(long)]
    out: Option<PathBuf>,
    /// UI mode for stderr progress (auto|plain|pretty)
    #[arg(long, default_value = "auto", value_name = "MODE")]
    ui: String,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    if args.photos == 0 {
        return Err(anyhow!("photos must be >= 1"));
    }
    let display = Size::parse(&args.display)
        .ok_or_else(|| anyhow!("--display must look like WIDTHxHEIGHT"))?;
    let is_tty = std::io::stderr().is_terminal();
    let stdout_is_tty = std::io::stdout().is_terminal();
    let ui = ui::Ui::from_args(Some(&args.ui), is_tty, !stdout_is_tty);

    let backend = StubBackend::with_faces([
        NormalizedRect::new(0.1, 0.55, 0.25, 0.3),
        NormalizedRect::new(0.6, 0.2, 0.3, 0.4),
    ])
    .with_latency(Duration::from_millis(args.latency_ms));
    let detector: SharedDetector = Arc::new(Mutex::new(backend));

    let mut camera = SyntheticSource::new(SyntheticConfig::default())?;
    let mut orchestrator =
        DetectionOrchestrator::new(Arc::clone(&detector), ShapeLayer::new(), display)?;

    let mut stale = 0u32;
    let mut drawn = 0usize;
    {
        let mut progress = ui.progress("Pick photos", args.photos as u64);
        for _ in 0..args.photos {
            let generation = orchestrator.present(camera.next_image()?)?;
            let label = generation.map_or_else(|| "skipped".to_string(), |g| g.to_string());
            progress.advance(&format!("photo {}", label));
        }
    }

    // Only the last pick is still shown; earlier completions arrive stale.
    {
        let _stage = ui.stage("Wait for detections");
        for _ in 0..args.photos {
            let Some(report) = orchestrator.wait(WAIT_TIMEOUT)? else {
                return Err(anyhow!("detector did not answer within {:?}", WAIT_TIMEOUT));
            };
            match report.outcome {
                DetectionOutcome::Stale => stale += 1,
                DetectionOutcome::Drawn(rects) => {
                    drawn = rects.len();
                    for rect in rects {
                        println!("{} face at {}", report.generation, rect);
                    }
                }
                DetectionOutcome::NoFaces => println!("{} no faces", report.generation),
                DetectionOutcome::Failed(message) => {
                    println!("{} failed: {}", report.generation, message)
                }
            }
        }
    }

    println!(
        "display {} fit {} boxes {} stale {}",
        orchestrator.display(),
        orchestrator.fit_rect(),
        drawn,
        stale
    );
    let resized = Size::new(display.height, display.width);
    orchestrator.resize(resized);
    for rect in orchestrator.face_rects() {
        println!("rotated {} face at {}", resized, rect);
    }
    drop(orchestrator);

    if let Some(out) = &args.out {
        let _stage = ui.stage("Render overlay");
        let surface = CanvasSurface::new(display, Color::BLACK);
        let mut renderer = DetectionOrchestrator::new(detector, surface, display)?;
        let generation = renderer
            .present(camera.next_image()?)?
            .ok_or_else(|| anyhow!("synthetic camera produced no image"))?;
        renderer
            .wait_for(generation, WAIT_TIMEOUT)?
            .ok_or_else(|| anyhow!("detector did not answer within {:?}", WAIT_TIMEOUT))?;
        renderer.surface().save(out)?;
        println!("wrote {}", out.display());
    }
    Ok(())
}

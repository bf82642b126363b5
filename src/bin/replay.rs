use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use serde_derive::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use vtrend::annotation::AllTracks;
use vtrend::{AnalysisMethod, Annotation, Config, Detection, Frame, Scene};

/// Replays recorded tracker output and prints one JSON line of annotations per frame.
///
/// Input lines look like `<timestamp_ms>:<json array of detections>`, e.g.
/// `40:[{"bbox":[10,10,50,40],"id":3,"c":3}]`.
#[derive(Parser, Debug)]
#[command(name = "vtrend-replay", version)]
struct Args {
    /// Recorded detections
    #[arg(short, long)]
    input: PathBuf,

    /// YAML or JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Trend analysis policy: simple or linreg
    #[arg(long)]
    analysis: Option<AnalysisMethod>,

    /// Include trajectory polylines
    #[arg(long)]
    draw_tracks: bool,

    /// Include direction arrows
    #[arg(long)]
    draw_direction: bool,
}

#[derive(Serialize)]
struct FrameOutput<'a> {
    frame: u64,
    timestamp: f64,
    annotations: &'a [Annotation],
}

fn parse_line(line: &str) -> Result<Frame> {
    let (ts, detections) = line
        .split_once(':')
        .ok_or_else(|| anyhow!("expected `:` after the timestamp"))?;

    let ts_ms: f64 = ts.trim().parse().context("parse timestamp failed")?;
    let detections: Vec<Detection> =
        serde_json::from_str(detections).context("parse json failed")?;

    Ok(Frame::new(ts_ms / 1000.0, detections))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("vtrend=info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => Config::default(),
    };

    if let Some(method) = args.analysis {
        config.analysis_method = method;
    }
    config.draw_tracks |= args.draw_tracks;
    config.draw_direction |= args.draw_direction;

    let mut scene = Scene::new(config).context("invalid configuration")?;

    let file = File::open(&args.input)
        .with_context(|| format!("failed to open {}", args.input.display()))?;

    let stdout = io::stdout();
    let mut out = stdout.lock();

    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line.context("failed to read input")?;
        if line.trim().is_empty() {
            continue;
        }

        let frame = match parse_line(&line) {
            Ok(frame) => frame,
            Err(err) => {
                warn!(line = idx + 1, error = %err, "wrong file format, line skipped");
                continue;
            }
        };

        scene
            .update(&frame)
            .with_context(|| format!("line {}", idx + 1))?;

        let annotations = scene.annotations(&frame, &AllTracks);
        serde_json::to_writer(
            &mut out,
            &FrameOutput {
                frame: scene.frame_index(),
                timestamp: frame.timestamp,
                annotations: &annotations,
            },
        )?;
        writeln!(out)?;
    }

    info!(
        frames = scene.frame_index(),
        tracks = scene.len(),
        "replay finished"
    );

    Ok(())
}

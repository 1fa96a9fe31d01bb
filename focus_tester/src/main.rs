//! Runs the auto-framing pipeline over a directory of PNG frames and writes the
//! re-framed frames to another directory under the same file names.

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use walkdir::WalkDir;
use waldo_focus::FocusConfig;
use waldo_focus::core_modules::debug_view::DebugView;
use waldo_focus::core_modules::focus_resolver::PrecisionMode;
use waldo_focus::pipeline::FocusPipeline;

const PROGRESS_INTERVAL: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    Quadrant,
    NineZone,
    Weighted,
}

impl From<ModeArg> for PrecisionMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Quadrant => PrecisionMode::Quadrant,
            ModeArg::NineZone => PrecisionMode::NineZone,
            ModeArg::Weighted => PrecisionMode::Weighted,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ViewArg {
    Off,
    MotionField,
    QuadrantStats,
}

impl From<ViewArg> for DebugView {
    fn from(view: ViewArg) -> Self {
        match view {
            ViewArg::Off => DebugView::Off,
            ViewArg::MotionField => DebugView::MotionField,
            ViewArg::QuadrantStats => DebugView::QuadrantStats,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "focus_tester",
    version,
    about = "Re-frames a PNG frame sequence around on-screen motion"
)]
struct Cli {
    /// Directory of input frames, processed in file-name order.
    #[arg(value_name = "INPUT_DIR")]
    input: PathBuf,

    /// Directory the output frames are written to.
    #[arg(value_name = "OUTPUT_DIR")]
    output: PathBuf,

    /// JSON file with a (partial) pipeline configuration.
    #[arg(long, value_name = "JSON")]
    config: Option<PathBuf>,

    #[arg(long, value_enum)]
    mode: Option<ModeArg>,

    #[arg(long, value_enum)]
    debug_view: Option<ViewArg>,
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("focus_tester=info,waldo_focus=info"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(env_filter)
        .init();
}

fn load_config(cli: &Cli) -> Result<FocusConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => FocusConfig::default(),
    };

    if let Some(mode) = cli.mode {
        config.precision_mode = mode.into();
    }
    if let Some(view) = cli.debug_view {
        config.debug_view = view.into();
    }
    Ok(config)
}

fn is_png(path: &Path) -> bool {
    path.extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| extension.eq_ignore_ascii_case("png"))
}

fn collect_frames(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        bail!("{} is not a directory", dir.display());
    }
    let frames: Vec<PathBuf> = WalkDir::new(dir)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file() && is_png(entry.path()))
        .map(|entry| entry.path().to_path_buf())
        .collect();
    if frames.is_empty() {
        bail!("no PNG frames found in {}", dir.display());
    }
    Ok(frames)
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    // --- 1. Setup ---
    let config = load_config(&cli)?;
    let frames = collect_frames(&cli.input)?;
    fs::create_dir_all(&cli.output)
        .with_context(|| format!("creating output directory {}", cli.output.display()))?;
    let mut pipeline = FocusPipeline::new(config).context("invalid pipeline configuration")?;
    info!(frames = frames.len(), input = %cli.input.display(), "processing frame sequence");

    // --- 2. Main Processing Loop ---
    let started = Instant::now();
    for (index, path) in frames.iter().enumerate() {
        let frame = image::open(path)
            .with_context(|| format!("decoding {}", path.display()))?
            .to_rgba8();
        let output = pipeline.process_frame(&frame);

        let Some(name) = path.file_name() else {
            bail!("{} has no file name", path.display());
        };
        let target = cli.output.join(name);
        output
            .image
            .save(&target)
            .with_context(|| format!("writing {}", target.display()))?;

        let report = &output.report;
        debug!(
            frame = report.frame_index,
            focus_x = report.focus_point().x,
            focus_y = report.focus_point().y,
            zoom = report.zoom.amount,
            "frame written"
        );
        if (index + 1) % PROGRESS_INTERVAL == 0 {
            info!(done = index + 1, total = frames.len(), "progress");
        }
    }

    // --- 3. Summary ---
    let elapsed = started.elapsed();
    info!(
        frames = frames.len(),
        seconds = elapsed.as_secs_f64(),
        fps = frames.len() as f64 / elapsed.as_secs_f64().max(f64::EPSILON),
        output = %cli.output.display(),
        "done"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_apply_on_top_of_defaults() {
        let cli = Cli::try_parse_from([
            "focus_tester",
            "in",
            "out",
            "--mode",
            "nine-zone",
            "--debug-view",
            "quadrant-stats",
        ])
        .expect("arguments parse");
        let config = load_config(&cli).expect("config loads");
        assert_eq!(config.precision_mode, PrecisionMode::NineZone);
        assert_eq!(config.debug_view, DebugView::QuadrantStats);
        assert_eq!(config.focus_strength, FocusConfig::default().focus_strength);
    }

    #[test]
    fn only_png_files_are_frames() {
        assert!(is_png(Path::new("frame_0001.png")));
        assert!(is_png(Path::new("FRAME.PNG")));
        assert!(!is_png(Path::new("notes.txt")));
        assert!(!is_png(Path::new("png")));
    }
}

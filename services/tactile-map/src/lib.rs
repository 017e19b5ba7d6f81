//! Tactile map command-line front end.
//!
//! Decodes one image, runs the tactile pipeline and writes the quantized
//! image plus both shape overlays as PNG files.

pub mod cli;
pub mod files;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tactile_common::MapConfig;
use tactile_renderer::{ProgressObserver, TactilePipeline};
use tracing::info;

pub use cli::Args;
pub use files::{load_image, write_outputs, OutputPaths};

/// Logs block sampling progress in 10% steps.
#[derive(Debug, Default)]
pub struct LogProgress {
    last_percent: Option<u32>,
}

impl ProgressObserver for LogProgress {
    fn report(&mut self, fraction: f32) {
        let percent = (fraction.clamp(0.0, 1.0) * 100.0) as u32;
        let due = match self.last_percent {
            None => true,
            Some(last) => percent >= last + 10 || (percent == 100 && last < 100),
        };
        if due {
            info!(percent, "progress");
            self.last_percent = Some(percent);
        }
    }
}

/// What a run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub outputs: OutputPaths,
    pub width: u32,
    pub height: u32,
    pub blocks: usize,
    pub shapes: usize,
}

/// Render `input` into `output_dir` with an already resolved configuration.
pub fn render_file(input: &Path, output_dir: &Path, config: MapConfig) -> Result<RunSummary> {
    let start = Instant::now();

    let img = load_image(input).with_context(|| format!("reading {}", input.display()))?;
    let (width, height) = (img.width(), img.height());
    info!(path = %input.display(), width, height, "loaded input");

    let pipeline = TactilePipeline::new(config);
    let output = pipeline.run_dynamic(&img, &mut LogProgress::default());

    let encoded = output.encode().context("encoding outputs")?;
    let outputs = OutputPaths::for_input(input, output_dir);
    write_outputs(&encoded, &outputs).context("writing outputs")?;

    info!(
        blocks = output.blocks_sampled,
        shapes = output.shapes.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "tactile map complete"
    );

    Ok(RunSummary {
        outputs,
        width,
        height,
        blocks: output.blocks_sampled,
        shapes: output.shapes.len(),
    })
}

/// Resolve configuration from `args` and render their input.
pub fn run(args: &Args) -> Result<RunSummary> {
    let config = args.resolve_config().context("resolving configuration")?;
    let input: &PathBuf = args.input.as_ref().context("no input image given")?;
    render_file(input, &args.output_dir, config)
}

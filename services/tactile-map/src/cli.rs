//! Command-line arguments and configuration resolution.
//!
//! Configuration sources, lowest precedence first:
//! 1. Built-in defaults
//! 2. `--config` file (YAML, or JSON by extension)
//! 3. `TACTILE_*` environment variables (a `.env` file is loaded first)
//! 4. Command-line flags

use clap::Parser;
use std::path::PathBuf;
use tactile_common::{MapConfig, OutlineColor, TactileResult};

#[derive(Parser, Debug, Clone)]
#[command(name = "tactile-map")]
#[command(about = "Convert an image into a tactile map with proportional shape overlays")]
pub struct Args {
    /// Input image (PNG or JPEG)
    #[arg(required_unless_present_any = ["legend", "print_config"])]
    pub input: Option<PathBuf>,

    /// Directory for the output images
    #[arg(short, long, default_value = ".", env = "TACTILE_OUTPUT_DIR")]
    pub output_dir: PathBuf,

    /// Configuration file (YAML or JSON)
    #[arg(short, long, env = "TACTILE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Saturation multiplier applied before quantization (1.0 - 5.0)
    #[arg(long)]
    pub saturation: Option<f64>,

    /// Number of colors after quantization (2 - 64)
    #[arg(short = 'k', long)]
    pub clusters: Option<usize>,

    /// Median filter size (0 disables, even sizes round up)
    #[arg(long)]
    pub blur: Option<u32>,

    /// Block size in pixels (5 - 50)
    #[arg(short = 's', long)]
    pub block_size: Option<u32>,

    /// Minimum channel proportion that gets a shape (0.0 - 0.2)
    #[arg(long)]
    pub min_size: Option<f64>,

    /// Outline color: black or white
    #[arg(long, value_parser = parse_outline)]
    pub outline: Option<OutlineColor>,

    /// Blocks darker than this mean intensity get no shapes (0 - 100)
    #[arg(long)]
    pub black_threshold: Option<f64>,

    /// Outline alpha (0 - 255)
    #[arg(long)]
    pub outline_alpha: Option<u8>,

    /// Outline stroke width in pixels
    #[arg(long)]
    pub stroke_width: Option<f32>,

    /// Seed for k-means initialization
    #[arg(long)]
    pub seed: Option<u64>,

    /// Reject out-of-range settings instead of clamping them
    #[arg(long)]
    pub strict: bool,

    /// Print the shape legend and exit
    #[arg(long)]
    pub legend: bool,

    /// Print the effective configuration as YAML and exit
    #[arg(long)]
    pub print_config: bool,

    /// Log level
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    pub log_level: String,

    /// Emit logs as JSON
    #[arg(long, env = "TACTILE_LOG_JSON")]
    pub json_logs: bool,
}

fn parse_outline(s: &str) -> Result<OutlineColor, String> {
    OutlineColor::parse(s).ok_or_else(|| format!("expected 'black' or 'white', got '{}'", s))
}

impl Args {
    /// Resolve the effective configuration from the process environment.
    pub fn resolve_config(&self) -> TactileResult<MapConfig> {
        self.resolve_config_with(|key| std::env::var(key).ok())
    }

    /// Resolve the effective configuration with a custom variable lookup.
    pub fn resolve_config_with<F>(&self, lookup: F) -> TactileResult<MapConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base = match &self.config {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading configuration file");
                MapConfig::from_file(path)?
            }
            None => MapConfig::default(),
        };

        let config = self.apply_flags(base.with_env_overrides(lookup)?);

        if self.strict {
            config.validate()?;
        }
        Ok(config)
    }

    /// Overwrite every field given on the command line.
    pub fn apply_flags(&self, mut config: MapConfig) -> MapConfig {
        if let Some(v) = self.saturation {
            config.saturation_factor = v;
        }
        if let Some(v) = self.clusters {
            config.n_clusters = v;
        }
        if let Some(v) = self.blur {
            config.blur_intensity = v;
        }
        if let Some(v) = self.block_size {
            config.block_size = v;
        }
        if let Some(v) = self.min_size {
            config.min_size_percent = v;
        }
        if let Some(v) = self.outline {
            config.outline_color = v;
        }
        if let Some(v) = self.black_threshold {
            config.black_threshold = v;
        }
        if let Some(v) = self.outline_alpha {
            config.outline_alpha = v;
        }
        if let Some(v) = self.stroke_width {
            config.stroke_width = v;
        }
        if let Some(v) = self.seed {
            config.seed = v;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn args(argv: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("tactile-map").chain(argv.iter().copied())).unwrap()
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_defaults_without_flags() {
        let a = args(&["in.png"]);
        assert_eq!(a.resolve_config_with(no_env).unwrap(), MapConfig::default());
    }

    #[test]
    fn test_flags_override_env() {
        let env: HashMap<&str, &str> =
            [("TACTILE_BLOCK_SIZE", "20"), ("TACTILE_N_CLUSTERS", "8")].into();
        let a = args(&["in.png", "-s", "30", "--outline", "white"]);
        let config = a
            .resolve_config_with(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.block_size, 30);
        assert_eq!(config.n_clusters, 8);
        assert_eq!(config.outline_color, OutlineColor::White);
    }

    #[test]
    fn test_strict_rejects_out_of_range() {
        let a = args(&["in.png", "-k", "200", "--strict"]);
        assert!(a.resolve_config_with(no_env).is_err());

        let lenient = args(&["in.png", "-k", "200"]);
        assert_eq!(lenient.resolve_config_with(no_env).unwrap().n_clusters, 200);
    }

    #[test]
    fn test_bad_outline_flag() {
        let result = Args::try_parse_from(["tactile-map", "in.png", "--outline", "purple"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_input_optional_with_legend() {
        let a = args(&["--legend"]);
        assert!(a.input.is_none());
        assert!(Args::try_parse_from(["tactile-map"]).is_err());
    }
}

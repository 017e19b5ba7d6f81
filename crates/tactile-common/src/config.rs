//! Pipeline configuration.
//!
//! `MapConfig` replaces the slider panel of the interactive prototype: one
//! immutable value per run, passed explicitly into the pipeline. It can be
//! loaded from YAML or JSON, overridden from `TACTILE_*` environment
//! variables, and normalized so every field sits inside its documented
//! range.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::color::{Color, OutlineColor};
use crate::error::{TactileError, TactileResult};

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "TACTILE_";

pub const SATURATION_RANGE: (f64, f64) = (1.0, 5.0);
pub const CLUSTER_RANGE: (usize, usize) = (2, 64);
pub const BLUR_MAX: u32 = 15;
pub const BLOCK_SIZE_RANGE: (u32, u32) = (5, 50);
pub const MIN_SIZE_RANGE: (f64, f64) = (0.0, 0.20);
pub const BLACK_THRESHOLD_RANGE: (f64, f64) = (0.0, 100.0);

/// Termination and restart policy for k-means clustering.
///
/// Clustering stops when the largest centroid movement is at or below
/// `epsilon` or after `max_iterations` iterations, whichever comes first.
/// `attempts` independent seeded restarts are run and the most compact
/// result is kept.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KmeansPolicy {
    pub max_iterations: usize,
    pub epsilon: f32,
    pub attempts: usize,
}

impl Default for KmeansPolicy {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            epsilon: 1.0,
            attempts: 3,
        }
    }
}

/// Configuration for one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Saturation multiplier applied before clustering (1.0 = unchanged).
    pub saturation_factor: f64,

    /// Number of k-means clusters.
    pub n_clusters: usize,

    /// Median filter kernel size. Even values are rounded up to the next odd
    /// size by the smoother; 0 disables smoothing.
    pub blur_intensity: u32,

    /// Grid cell side length in pixels.
    pub block_size: u32,

    /// Minimum channel proportion (exclusive) for a shape to be drawn.
    pub min_size_percent: f64,

    /// Stroke color of the shapes.
    pub outline_color: OutlineColor,

    /// Blocks whose mean intensity is below this value get no shapes.
    pub black_threshold: f64,

    /// Stroke alpha (0-255).
    pub outline_alpha: u8,

    /// Stroke width in pixels.
    pub stroke_width: f32,

    /// Seed for k-means++ initialization.
    pub seed: u64,

    /// Clustering termination policy.
    pub kmeans: KmeansPolicy,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            saturation_factor: 2.0,
            n_clusters: 16,
            blur_intensity: 7,
            block_size: 50,
            min_size_percent: 0.05,
            outline_color: OutlineColor::Black,
            black_threshold: 10.0,
            // 60% opacity
            outline_alpha: 153,
            stroke_width: 1.0,
            seed: 0,
            kmeans: KmeansPolicy::default(),
        }
    }
}

impl MapConfig {
    /// Load configuration from a YAML or JSON file (chosen by extension,
    /// YAML unless the file ends in `.json`).
    pub fn from_file(path: impl AsRef<Path>) -> TactileResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        if is_json {
            Self::from_json(&content)
        } else {
            Self::from_yaml(&content)
        }
    }

    /// Parse configuration from a YAML string. Missing fields use defaults.
    pub fn from_yaml(yaml: &str) -> TactileResult<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Parse configuration from a JSON string. Missing fields use defaults.
    pub fn from_json(json: &str) -> TactileResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Defaults overridden by `TACTILE_*` environment variables.
    pub fn from_env() -> TactileResult<Self> {
        Self::default().with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from a variable lookup (normally the process
    /// environment). Unset variables leave the field untouched; set but
    /// unparseable ones are an error.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> TactileResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));

        if let Some(val) = var("SATURATION_FACTOR") {
            self.saturation_factor = parse_env("SATURATION_FACTOR", &val)?;
        }
        if let Some(val) = var("N_CLUSTERS") {
            self.n_clusters = parse_env("N_CLUSTERS", &val)?;
        }
        if let Some(val) = var("BLUR_INTENSITY") {
            self.blur_intensity = parse_env("BLUR_INTENSITY", &val)?;
        }
        if let Some(val) = var("BLOCK_SIZE") {
            self.block_size = parse_env("BLOCK_SIZE", &val)?;
        }
        if let Some(val) = var("MIN_SIZE_PERCENT") {
            self.min_size_percent = parse_env("MIN_SIZE_PERCENT", &val)?;
        }
        if let Some(val) = var("OUTLINE_COLOR") {
            self.outline_color =
                OutlineColor::parse(&val).ok_or_else(|| TactileError::InvalidConfig {
                    field: "outline_color".to_string(),
                    message: format!("expected 'black' or 'white', got '{}'", val),
                })?;
        }
        if let Some(val) = var("BLACK_THRESHOLD") {
            self.black_threshold = parse_env("BLACK_THRESHOLD", &val)?;
        }
        if let Some(val) = var("OUTLINE_ALPHA") {
            self.outline_alpha = parse_env("OUTLINE_ALPHA", &val)?;
        }
        if let Some(val) = var("STROKE_WIDTH") {
            self.stroke_width = parse_env("STROKE_WIDTH", &val)?;
        }
        if let Some(val) = var("SEED") {
            self.seed = parse_env("SEED", &val)?;
        }
        if let Some(val) = var("KMEANS_MAX_ITERATIONS") {
            self.kmeans.max_iterations = parse_env("KMEANS_MAX_ITERATIONS", &val)?;
        }
        if let Some(val) = var("KMEANS_EPSILON") {
            self.kmeans.epsilon = parse_env("KMEANS_EPSILON", &val)?;
        }
        if let Some(val) = var("KMEANS_ATTEMPTS") {
            self.kmeans.attempts = parse_env("KMEANS_ATTEMPTS", &val)?;
        }

        Ok(self)
    }

    /// Clamp every field into its documented range.
    ///
    /// Out-of-range values are never an error for the pipeline; each
    /// adjustment is logged at `warn` level.
    pub fn normalized(&self) -> Self {
        let defaults = Self::default();
        let mut out = self.clone();

        out.saturation_factor = clamp_float(
            "saturation_factor",
            self.saturation_factor,
            SATURATION_RANGE,
            defaults.saturation_factor,
        );
        out.n_clusters = clamp_ord("n_clusters", self.n_clusters, CLUSTER_RANGE);
        out.blur_intensity = clamp_ord("blur_intensity", self.blur_intensity, (0, BLUR_MAX));
        out.block_size = clamp_ord("block_size", self.block_size, BLOCK_SIZE_RANGE);
        out.min_size_percent = clamp_float(
            "min_size_percent",
            self.min_size_percent,
            MIN_SIZE_RANGE,
            defaults.min_size_percent,
        );
        out.black_threshold = clamp_float(
            "black_threshold",
            self.black_threshold,
            BLACK_THRESHOLD_RANGE,
            defaults.black_threshold,
        );
        if !(self.stroke_width > 0.0 && self.stroke_width.is_finite()) {
            tracing::warn!(
                value = self.stroke_width,
                "stroke_width must be positive, using default"
            );
            out.stroke_width = defaults.stroke_width;
        }

        out.kmeans.max_iterations = self.kmeans.max_iterations.max(1);
        out.kmeans.attempts = self.kmeans.attempts.max(1);
        if !(self.kmeans.epsilon >= 0.0) {
            tracing::warn!(
                value = self.kmeans.epsilon,
                "kmeans.epsilon must be >= 0, using default"
            );
            out.kmeans.epsilon = defaults.kmeans.epsilon;
        }

        out
    }

    /// Strict check for callers that prefer rejecting bad input over
    /// clamping it.
    pub fn validate(&self) -> TactileResult<()> {
        check_range_float("saturation_factor", self.saturation_factor, SATURATION_RANGE)?;
        check_range("n_clusters", self.n_clusters, CLUSTER_RANGE)?;
        check_range("blur_intensity", self.blur_intensity, (0, BLUR_MAX))?;
        check_range("block_size", self.block_size, BLOCK_SIZE_RANGE)?;
        check_range_float("min_size_percent", self.min_size_percent, MIN_SIZE_RANGE)?;
        check_range_float("black_threshold", self.black_threshold, BLACK_THRESHOLD_RANGE)?;

        if !(self.stroke_width > 0.0 && self.stroke_width.is_finite()) {
            return Err(invalid("stroke_width", "must be a positive number"));
        }
        if self.kmeans.max_iterations == 0 {
            return Err(invalid("kmeans.max_iterations", "must be >= 1"));
        }
        if self.kmeans.attempts == 0 {
            return Err(invalid("kmeans.attempts", "must be >= 1"));
        }
        if !(self.kmeans.epsilon >= 0.0) {
            return Err(invalid("kmeans.epsilon", "must be >= 0"));
        }

        Ok(())
    }

    /// Shape stroke color including alpha.
    pub fn shape_color(&self) -> Color {
        self.outline_color.with_alpha(self.outline_alpha)
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, val: &str) -> TactileResult<T> {
    val.trim().parse().map_err(|_| TactileError::InvalidConfig {
        field: format!("{}{}", ENV_PREFIX, name),
        message: format!("cannot parse '{}'", val),
    })
}

fn invalid(field: &str, message: &str) -> TactileError {
    TactileError::InvalidConfig {
        field: field.to_string(),
        message: message.to_string(),
    }
}

fn clamp_ord<T>(name: &str, value: T, (min, max): (T, T)) -> T
where
    T: PartialOrd + Copy + std::fmt::Display,
{
    let clamped = if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    };
    if clamped != value {
        tracing::warn!(field = name, %value, %clamped, "configuration value out of range, clamped");
    }
    clamped
}

fn clamp_float(name: &str, value: f64, range: (f64, f64), fallback: f64) -> f64 {
    if value.is_nan() {
        tracing::warn!(field = name, "configuration value is NaN, using default");
        return fallback;
    }
    clamp_ord(name, value, range)
}

fn check_range<T>(name: &str, value: T, (min, max): (T, T)) -> TactileResult<()>
where
    T: PartialOrd + std::fmt::Display,
{
    if value < min || value > max {
        return Err(TactileError::InvalidConfig {
            field: name.to_string(),
            message: format!("{} is outside [{}, {}]", value, min, max),
        });
    }
    Ok(())
}

fn check_range_float(name: &str, value: f64, range: (f64, f64)) -> TactileResult<()> {
    if value.is_nan() {
        return Err(invalid(name, "must be a number"));
    }
    check_range(name, value, range)
}

//! Common fixtures for tactile-map tests.
//!
//! Pre-defined configurations and palettes for the scenarios the pipeline
//! is expected to handle.

use tactile_common::MapConfig;

/// Primary and secondary colors used by palette-based generators.
pub mod colors {
    pub const RED: [u8; 3] = [255, 0, 0];
    pub const GREEN: [u8; 3] = [0, 255, 0];
    pub const BLUE: [u8; 3] = [0, 0, 255];
    pub const BLACK: [u8; 3] = [0, 0, 0];
    pub const WHITE: [u8; 3] = [255, 255, 255];
    pub const YELLOW: [u8; 3] = [255, 255, 0];

    /// Six well separated colors.
    pub const SIX: [[u8; 3]; 6] = [RED, GREEN, BLUE, BLACK, WHITE, YELLOW];
}

/// Configuration for the single-block scenario: 10x10 image, one block of
/// 10 pixels, two clusters, intensity cutoff 10, 5% visibility threshold.
pub fn single_block_config() -> MapConfig {
    MapConfig {
        n_clusters: 2,
        block_size: 10,
        black_threshold: 10.0,
        min_size_percent: 0.05,
        ..MapConfig::default()
    }
}

/// Configuration with saturation boost and smoothing disabled, so the
/// quantizer output can be compared directly against the input.
pub fn plain_config(n_clusters: usize, block_size: u32) -> MapConfig {
    MapConfig {
        saturation_factor: 1.0,
        blur_intensity: 0,
        n_clusters,
        block_size,
        ..MapConfig::default()
    }
}

/// Temporary directory for tests that write files.
pub fn temp_output_dir() -> tempfile::TempDir {
    tempfile::Builder::new()
        .prefix("tactile-map-test")
        .tempdir()
        .unwrap_or_else(|e| panic!("failed to create temp dir: {}", e))
}

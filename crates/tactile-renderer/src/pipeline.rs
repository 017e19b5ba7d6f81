//! End-to-end tactile map pipeline.
//!
//! saturation boost → k-means quantization → median smoothing → block
//! sampling → shape planning → rasterization → compositing.
//!
//! Every stage returns a new image; the input is never modified. Stages do
//! not fail: out-of-range configuration is clamped when the pipeline is
//! built. Only PNG encoding of the outputs can return an error.

use image::{DynamicImage, RgbImage, RgbaImage};
use std::time::Instant;
use tactile_common::MapConfig;

use crate::composite::{composite, to_rgba};
use crate::png::{encode_rgb, encode_rgba, EncodeError};
use crate::progress::ProgressObserver;
use crate::quantize::{boost_saturation, quantize};
use crate::sample::sample_blocks_with_progress;
use crate::shapes::{plan_shapes, rasterize, ShapeLayer, ShapeSpec, ShapeStyle};
use crate::smooth::smooth;

/// A configured pipeline. Cheap to build, reusable across images.
#[derive(Debug, Clone)]
pub struct TactilePipeline {
    config: MapConfig,
}

/// Everything a run produces.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Quantized and smoothed image
    pub quantized: RgbImage,
    /// Shapes over the quantized image
    pub quantized_overlay: RgbaImage,
    /// Shapes over the original image
    pub original_overlay: RgbaImage,
    /// Transparent layer holding only the shapes
    pub layer: ShapeLayer,
    /// Shapes in draw order
    pub shapes: Vec<ShapeSpec>,
    /// Number of non-empty blocks sampled
    pub blocks_sampled: usize,
}

/// PNG byte streams for the three output rasters.
#[derive(Debug, Clone)]
pub struct EncodedOutputs {
    pub quantized: Vec<u8>,
    pub quantized_overlay: Vec<u8>,
    pub original_overlay: Vec<u8>,
}

impl PipelineOutput {
    pub fn encode(&self) -> Result<EncodedOutputs, EncodeError> {
        Ok(EncodedOutputs {
            quantized: encode_rgb(&self.quantized)?,
            quantized_overlay: encode_rgba(&self.quantized_overlay)?,
            original_overlay: encode_rgba(&self.original_overlay)?,
        })
    }
}

impl TactilePipeline {
    /// Build a pipeline. The configuration is normalized (clamped into
    /// range) here, so later stages never see invalid values.
    pub fn new(config: MapConfig) -> Self {
        Self {
            config: config.normalized(),
        }
    }

    /// The normalized configuration in use.
    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    /// Run on an RGB image; the original overlay is opaque.
    pub fn run(&self, img: &RgbImage, progress: &mut dyn ProgressObserver) -> PipelineOutput {
        self.run_with_base(img, &to_rgba(img), progress)
    }

    /// Run on any decoded image. Color stages see the RGB channels; the
    /// original overlay keeps the source alpha.
    pub fn run_dynamic(
        &self,
        img: &DynamicImage,
        progress: &mut dyn ProgressObserver,
    ) -> PipelineOutput {
        let rgb = img.to_rgb8();
        let base = img.to_rgba8();
        self.run_with_base(&rgb, &base, progress)
    }

    /// Run on `img`, compositing the original overlay onto `base`.
    pub fn run_with_base(
        &self,
        img: &RgbImage,
        base: &RgbaImage,
        progress: &mut dyn ProgressObserver,
    ) -> PipelineOutput {
        let config = &self.config;
        let (width, height) = img.dimensions();
        let start = Instant::now();

        let saturated = boost_saturation(img, config.saturation_factor);

        let t = Instant::now();
        let quantization = quantize(&saturated, config.n_clusters, &config.kmeans, config.seed);
        let quantized = quantization.to_image();
        tracing::debug!(
            k = quantization.k(),
            iterations = quantization.iterations,
            elapsed_ms = t.elapsed().as_millis() as u64,
            "quantized"
        );

        let t = Instant::now();
        let quantized = smooth(&quantized, Some(config.blur_intensity));
        tracing::debug!(elapsed_ms = t.elapsed().as_millis() as u64, "smoothed");

        let samples = sample_blocks_with_progress(&quantized, config.block_size, progress);

        let t = Instant::now();
        let style = ShapeStyle::from_config(config);
        let shapes = plan_shapes(&samples, &style);
        let layer = rasterize(&shapes, width, height);
        tracing::debug!(
            shapes = shapes.len(),
            elapsed_ms = t.elapsed().as_millis() as u64,
            "rasterized shapes"
        );

        let quantized_overlay = composite(&to_rgba(&quantized), &layer);
        let original_overlay = composite(base, &layer);

        progress.report(1.0);

        tracing::debug!(
            width,
            height,
            blocks = samples.len(),
            shapes = shapes.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "pipeline complete"
        );

        PipelineOutput {
            quantized,
            quantized_overlay,
            original_overlay,
            layer,
            shapes,
            blocks_sampled: samples.len(),
        }
    }
}

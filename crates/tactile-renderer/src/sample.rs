//! Block-wise color sampling.
//!
//! The smoothed image is partitioned into a grid of `s×s` blocks (edge
//! blocks clipped to the image) and each block is summarized by its mean
//! color, expressed as per-channel proportions of full intensity.

use image::RgbImage;

use crate::progress::{row_fraction, ProgressObserver};

/// A rectangular region `[x0, x1) × [y0, y1)` of the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl Block {
    pub fn width(&self) -> u32 {
        self.x1.saturating_sub(self.x0)
    }

    pub fn height(&self) -> u32 {
        self.y1.saturating_sub(self.y0)
    }

    pub fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.area() == 0
    }
}

/// Mean channel intensities of a block, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelProportion {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
}

impl ChannelProportion {
    /// Proportions of an 8-bit mean color.
    pub fn from_mean(mean: [f64; 3]) -> Self {
        Self {
            red: mean[0] / 255.0,
            green: mean[1] / 255.0,
            blue: mean[2] / 255.0,
        }
    }

    /// Proportions in red, green, blue order.
    pub fn as_array(&self) -> [f64; 3] {
        [self.red, self.green, self.blue]
    }
}

/// One sampled block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockSample {
    pub block: Block,
    /// Nominal block center `(x0 + s/2, y0 + s/2)`, also for clipped edge blocks
    pub center_x: f32,
    pub center_y: f32,
    /// Mean 8-bit channel values
    pub mean: [f64; 3],
    pub proportion: ChannelProportion,
}

impl BlockSample {
    /// Average of the channel means on the 0-255 scale.
    pub fn intensity(&self) -> f64 {
        (self.mean[0] + self.mean[1] + self.mean[2]) / 3.0
    }
}

/// Grid rows used as the progress denominator: `height / s`, at least 1.
pub fn progress_rows(height: u32, block_size: u32) -> usize {
    (height / block_size.max(1)).max(1) as usize
}

/// Sample every block of the image in row-major order.
pub fn sample_blocks(img: &RgbImage, block_size: u32) -> Vec<BlockSample> {
    sample_blocks_with_progress(img, block_size, &mut crate::progress::NoProgress)
}

/// Sample every block, reporting progress after each row of blocks.
///
/// A block size of 0 is treated as 1. Zero-area blocks are skipped.
pub fn sample_blocks_with_progress(
    img: &RgbImage,
    block_size: u32,
    progress: &mut dyn ProgressObserver,
) -> Vec<BlockSample> {
    let step = block_size.max(1);
    let (width, height) = img.dimensions();
    let total_rows = progress_rows(height, step);
    let half = step as f32 / 2.0;

    let mut samples = Vec::with_capacity(
        (width.div_ceil(step) as usize) * (height.div_ceil(step) as usize),
    );

    for (row, y0) in (0..height).step_by(step as usize).enumerate() {
        for x0 in (0..width).step_by(step as usize) {
            let block = Block {
                x0,
                y0,
                x1: x0.saturating_add(step).min(width),
                y1: y0.saturating_add(step).min(height),
            };

            let Some(mean) = block_mean(img, &block) else {
                continue;
            };

            samples.push(BlockSample {
                block,
                center_x: x0 as f32 + half,
                center_y: y0 as f32 + half,
                mean,
                proportion: ChannelProportion::from_mean(mean),
            });
        }

        progress.report(row_fraction(row, total_rows));
    }

    tracing::debug!(
        width,
        height,
        block_size = step,
        blocks = samples.len(),
        "sampled blocks"
    );

    samples
}

/// Arithmetic mean of each channel over the block, or None for an empty
/// block. The block is clipped to the image first.
pub fn block_mean(img: &RgbImage, block: &Block) -> Option<[f64; 3]> {
    let block = Block {
        x1: block.x1.min(img.width()),
        y1: block.y1.min(img.height()),
        ..*block
    };
    if block.is_empty() {
        return None;
    }

    let mut sums = [0u64; 3];
    for y in block.y0..block.y1 {
        for x in block.x0..block.x1 {
            let px = img.get_pixel(x, y);
            sums[0] += px[0] as u64;
            sums[1] += px[1] as u64;
            sums[2] += px[2] as u64;
        }
    }

    let n = block.area() as f64;
    Some([sums[0] as f64 / n, sums[1] as f64 / n, sums[2] as f64 / n])
}

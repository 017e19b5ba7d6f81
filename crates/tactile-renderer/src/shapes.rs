//! Proportional shape synthesis.
//!
//! Each sampled block is re-rendered as up to three outline shapes sharing
//! the block center, one per color channel:
//!
//! | channel | shape    |
//! |---------|----------|
//! | red     | triangle |
//! | green   | square   |
//! | blue    | circle   |
//!
//! A shape's size is `block_size * 0.95 * proportion`, so a fully saturated
//! channel almost fills its block. Shapes are stroked (never filled) on a
//! transparent layer with tiny-skia, without anti-aliasing, so every stroke
//! pixel carries exactly the outline alpha.

use image::{Rgba, RgbaImage};
use tactile_common::{Color, MapConfig};
use tiny_skia::{Paint, Path, PathBuilder, Pixmap, Stroke, Transform};

use crate::sample::BlockSample;

/// Largest shape size as a fraction of the block size
pub const MAX_SIZE_RATIO: f64 = 0.95;

/// Geometric primitive, one per color channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Triangle,
    Square,
    Circle,
}

impl ShapeKind {
    /// Draw order. Later shapes stroke over earlier ones.
    pub const ALL: [ShapeKind; 3] = [ShapeKind::Triangle, ShapeKind::Square, ShapeKind::Circle];

    /// Shape encoding channel `index` (0 = red, 1 = green, 2 = blue).
    pub fn for_channel(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn name(&self) -> &'static str {
        match self {
            ShapeKind::Triangle => "triangle",
            ShapeKind::Square => "square",
            ShapeKind::Circle => "circle",
        }
    }

    /// Color channel this shape encodes.
    pub fn channel_name(&self) -> &'static str {
        match self {
            ShapeKind::Triangle => "red",
            ShapeKind::Square => "green",
            ShapeKind::Circle => "blue",
        }
    }
}

/// Human-readable key for the shape encoding, one line per shape.
pub fn legend() -> Vec<String> {
    ShapeKind::ALL
        .iter()
        .map(|kind| format!("{} = {} intensity", kind.name(), kind.channel_name()))
        .collect()
}

/// A single outline shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeSpec {
    pub kind: ShapeKind,
    pub center_x: f32,
    pub center_y: f32,
    /// Side length (square, triangle base and height) or diameter (circle)
    pub size: f32,
    pub color: Color,
    pub stroke_width: f32,
}

impl ShapeSpec {
    /// Bounding box `(left, top, right, bottom)`.
    pub fn bounds(&self) -> (f32, f32, f32, f32) {
        let h = self.size / 2.0;
        (
            self.center_x - h,
            self.center_y - h,
            self.center_x + h,
            self.center_y + h,
        )
    }

    /// Outline path, or None for a degenerate (zero or non-finite) size.
    pub fn path(&self) -> Option<Path> {
        if !(self.size > 0.0 && self.size.is_finite()) {
            return None;
        }
        let (left, top, right, bottom) = self.bounds();

        match self.kind {
            ShapeKind::Triangle => {
                let mut pb = PathBuilder::new();
                pb.move_to(self.center_x, top);
                pb.line_to(left, bottom);
                pb.line_to(right, bottom);
                pb.close();
                pb.finish()
            }
            ShapeKind::Square => {
                let mut pb = PathBuilder::new();
                pb.move_to(left, top);
                pb.line_to(right, top);
                pb.line_to(right, bottom);
                pb.line_to(left, bottom);
                pb.close();
                pb.finish()
            }
            ShapeKind::Circle => {
                PathBuilder::from_circle(self.center_x, self.center_y, self.size / 2.0)
            }
        }
    }
}

/// Parameters of the shape decision rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeStyle {
    /// Nominal block size in pixels
    pub block_size: u32,
    /// A channel needs a proportion strictly above this to get a shape
    pub min_size_percent: f64,
    /// Blocks with mean intensity (0-255) strictly below this get no shapes
    pub black_threshold: f64,
    pub color: Color,
    pub stroke_width: f32,
}

impl ShapeStyle {
    pub fn from_config(config: &MapConfig) -> Self {
        Self {
            block_size: config.block_size.max(1),
            min_size_percent: config.min_size_percent,
            black_threshold: config.black_threshold,
            color: config.shape_color(),
            stroke_width: config.stroke_width,
        }
    }
}

/// Shape size for a channel proportion: `block_size * 0.95 * proportion`.
pub fn shape_size(block_size: u32, proportion: f64) -> f32 {
    (block_size as f64 * MAX_SIZE_RATIO * proportion) as f32
}

/// Shapes for one block, in draw order (triangle, square, circle).
pub fn plan_block_shapes(sample: &BlockSample, style: &ShapeStyle) -> Vec<ShapeSpec> {
    if sample.intensity() < style.black_threshold {
        return Vec::new();
    }

    sample
        .proportion
        .as_array()
        .iter()
        .zip(ShapeKind::ALL)
        .filter(|(&proportion, _)| proportion > style.min_size_percent)
        .map(|(&proportion, kind)| ShapeSpec {
            kind,
            center_x: sample.center_x,
            center_y: sample.center_y,
            size: shape_size(style.block_size, proportion),
            color: style.color,
            stroke_width: style.stroke_width,
        })
        .collect()
}

/// Shapes for all blocks, preserving block order.
pub fn plan_shapes(samples: &[BlockSample], style: &ShapeStyle) -> Vec<ShapeSpec> {
    let shapes: Vec<ShapeSpec> = samples
        .iter()
        .flat_map(|sample| plan_block_shapes(sample, style))
        .collect();

    tracing::debug!(
        blocks = samples.len(),
        shapes = shapes.len(),
        "planned shapes"
    );

    shapes
}

/// Transparent RGBA canvas holding stroked shapes (straight alpha).
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeLayer {
    image: RgbaImage,
}

impl ShapeLayer {
    /// Fully transparent layer.
    pub fn transparent(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::from_pixel(width, height, Rgba(Color::transparent().to_rgba())),
        }
    }

    /// Wrap an existing straight-alpha image.
    pub fn from_image(image: RgbaImage) -> Self {
        Self { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// True when no pixel has any coverage.
    pub fn is_blank(&self) -> bool {
        self.image.pixels().all(|p| p[3] == 0)
    }

    /// Number of pixels with non-zero alpha.
    pub fn covered_pixels(&self) -> usize {
        self.image.pixels().filter(|p| p[3] > 0).count()
    }
}

/// Stroke every shape, in order, onto a new transparent layer.
pub fn rasterize(shapes: &[ShapeSpec], width: u32, height: u32) -> ShapeLayer {
    if width == 0 || height == 0 {
        return ShapeLayer::transparent(width, height);
    }

    let mut pixmap = match Pixmap::new(width, height) {
        Some(p) => p,
        None => {
            tracing::warn!(width, height, "cannot allocate shape canvas, leaving layer empty");
            return ShapeLayer::transparent(width, height);
        }
    };

    for shape in shapes {
        draw_shape(&mut pixmap, shape);
    }

    let mut image = RgbaImage::new(width, height);
    for (dst, src) in image.pixels_mut().zip(pixmap.pixels()) {
        let c = src.demultiply();
        *dst = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
    }

    ShapeLayer { image }
}

fn draw_shape(pixmap: &mut Pixmap, shape: &ShapeSpec) {
    let Some(path) = shape.path() else {
        return;
    };

    let mut paint = Paint::default();
    paint.set_color_rgba8(shape.color.r, shape.color.g, shape.color.b, shape.color.a);
    paint.anti_alias = false;

    let stroke = Stroke {
        width: shape.stroke_width,
        ..Stroke::default()
    };

    pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
}

//! Synthetic image generators for pipeline tests and benchmarks.
//!
//! These generators create predictable, verifiable pixel patterns so tests
//! can reason about exact colors, block means and cluster counts.

use std::collections::HashSet;

use image::{Rgb, RgbImage, Rgba, RgbaImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Creates an image filled with a single color.
pub fn solid_rgb(width: u32, height: u32, color: [u8; 3]) -> RgbImage {
    RgbImage::from_pixel(width, height, Rgb(color))
}

/// Creates an RGBA image filled with a single color.
pub fn solid_rgba(width: u32, height: u32, color: [u8; 4]) -> RgbaImage {
    RgbaImage::from_pixel(width, height, Rgba(color))
}

/// Creates a checkerboard of two colors with square cells of `cell` pixels.
///
/// Cell (0, 0) uses `a`.
pub fn checkerboard(width: u32, height: u32, cell: u32, a: [u8; 3], b: [u8; 3]) -> RgbImage {
    let cell = cell.max(1);
    RgbImage::from_fn(width, height, |x, y| {
        if ((x / cell) + (y / cell)) % 2 == 0 {
            Rgb(a)
        } else {
            Rgb(b)
        }
    })
}

/// Creates vertical stripes cycling through `colors`, each `stripe` pixels wide.
pub fn vertical_stripes(width: u32, height: u32, stripe: u32, colors: &[[u8; 3]]) -> RgbImage {
    let stripe = stripe.max(1);
    RgbImage::from_fn(width, height, |x, _| {
        Rgb(colors[(x / stripe) as usize % colors.len()])
    })
}

/// Creates a smooth two-axis gradient: red grows left to right, green grows
/// top to bottom, blue is the inverse of red.
///
/// Every pixel is distinct for images up to 256x256, which makes it a good
/// worst case for clustering.
pub fn gradient(width: u32, height: u32) -> RgbImage {
    let wx = (width.max(2) - 1) as f32;
    let hy = (height.max(2) - 1) as f32;
    RgbImage::from_fn(width, height, |x, y| {
        let r = (x as f32 / wx * 255.0).round() as u8;
        let g = (y as f32 / hy * 255.0).round() as u8;
        Rgb([r, g, 255 - r])
    })
}

/// Creates uniformly random pixels from a seeded RNG.
pub fn noise(width: u32, height: u32, seed: u64) -> RgbImage {
    let mut rng = StdRng::seed_from_u64(seed);
    RgbImage::from_fn(width, height, |_, _| Rgb([rng.gen(), rng.gen(), rng.gen()]))
}

/// Creates a photo-like image: a few large soft color regions plus mild
/// per-pixel noise.
pub fn photo_like(width: u32, height: u32, seed: u64) -> RgbImage {
    let mut rng = StdRng::seed_from_u64(seed);
    let w = width.max(1) as f32;
    let h = height.max(1) as f32;
    RgbImage::from_fn(width, height, |x, y| {
        let fx = x as f32 / w;
        let fy = y as f32 / h;
        let base = [
            128.0 + 100.0 * (fx * std::f32::consts::PI * 2.0).sin(),
            128.0 + 100.0 * (fy * std::f32::consts::PI * 3.0).cos(),
            128.0 + 80.0 * ((fx + fy) * std::f32::consts::PI).sin(),
        ];
        let mut px = [0u8; 3];
        for (c, v) in px.iter_mut().zip(base) {
            *c = (v + rng.gen_range(-12.0..12.0)).clamp(0.0, 255.0) as u8;
        }
        Rgb(px)
    })
}

/// Copies `base` and replaces roughly `fraction` of its pixels with pure
/// black or white.
pub fn salt_and_pepper(base: &RgbImage, fraction: f64, seed: u64) -> RgbImage {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut out = base.clone();
    for px in out.pixels_mut() {
        if rng.gen_bool(fraction.clamp(0.0, 1.0)) {
            *px = if rng.gen_bool(0.5) { Rgb([0, 0, 0]) } else { Rgb([255, 255, 255]) };
        }
    }
    out
}

/// Number of distinct colors in an RGB image.
pub fn count_unique_colors(img: &RgbImage) -> usize {
    img.pixels().map(|p| p.0).collect::<HashSet<_>>().len()
}

/// Number of distinct colors (including alpha) in an RGBA image.
pub fn count_unique_rgba(img: &RgbaImage) -> usize {
    img.pixels().map(|p| p.0).collect::<HashSet<_>>().len()
}

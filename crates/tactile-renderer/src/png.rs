//! PNG encoding for the pipeline's output rasters.
//!
//! Two encoding modes:
//! - **Indexed PNG (color type 3)**: used when the image has ≤256 unique
//!   colors. Quantized outputs always land here.
//! - **Truecolor PNG (color type 2 or 6)**: fallback for images with more
//!   colors, e.g. the original photograph under its overlay.
//!
//! `encode_rgba` and `encode_rgb` pick the mode automatically.

use image::{RgbImage, RgbaImage};
use rayon::prelude::*;
use std::collections::HashMap;
use std::io::Write;
use thiserror::Error;

/// PNG file signature
pub const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// Maximum colors for indexed PNG (PNG8)
const MAX_PALETTE_SIZE: usize = 256;

/// Minimum pixels to benefit from parallel palette extraction
const PARALLEL_THRESHOLD: usize = 4096; // 64x64 or larger

/// Errors from PNG encoding.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("cannot encode empty image ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    #[error("pixel buffer has {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },

    #[error("palette has {0} entries, at most 256 allowed")]
    PaletteTooLarge(usize),

    #[error("IDAT compression failed: {0}")]
    Compression(#[from] std::io::Error),
}

impl From<EncodeError> for tactile_common::TactileError {
    fn from(err: EncodeError) -> Self {
        tactile_common::TactileError::Encode(err.to_string())
    }
}

/// Pixel layout of the raw buffer handed to the encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Rgb,
    Rgba,
}

impl PixelFormat {
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelFormat::Rgb => 3,
            PixelFormat::Rgba => 4,
        }
    }

    /// IHDR color type for truecolor output.
    fn color_type(&self) -> u8 {
        match self {
            PixelFormat::Rgb => 2,
            PixelFormat::Rgba => 6,
        }
    }
}

/// Palette entry for indexed output (straight alpha)
pub type PaletteEntry = [u8; 4];

/// Encode an RGBA image, indexed when it has ≤256 colors.
pub fn encode_rgba(img: &RgbaImage) -> Result<Vec<u8>, EncodeError> {
    create_png_auto(img.as_raw(), img.width(), img.height(), PixelFormat::Rgba)
}

/// Encode an RGB image, indexed when it has ≤256 colors.
pub fn encode_rgb(img: &RgbImage) -> Result<Vec<u8>, EncodeError> {
    create_png_auto(img.as_raw(), img.width(), img.height(), PixelFormat::Rgb)
}

/// Create a PNG with automatic format selection.
///
/// Analyzes the pixel data and chooses the most efficient encoding:
/// - If ≤256 unique colors: indexed PNG
/// - Otherwise: truecolor PNG in the buffer's own format
pub fn create_png_auto(
    pixels: &[u8],
    width: u32,
    height: u32,
    format: PixelFormat,
) -> Result<Vec<u8>, EncodeError> {
    check_buffer(pixels, width, height, format)?;

    let num_pixels = width as usize * height as usize;
    let palette_result = if num_pixels >= PARALLEL_THRESHOLD {
        extract_palette_parallel(pixels, format)
    } else {
        extract_palette_sequential(pixels, format)
    };

    match palette_result {
        Some((palette, indices)) => {
            tracing::trace!(width, height, colors = palette.len(), "encoding indexed PNG");
            create_png_indexed(width, height, &palette, &indices)
        }
        None => {
            tracing::trace!(width, height, ?format, "encoding truecolor PNG");
            create_png(pixels, width, height, format)
        }
    }
}

fn check_buffer(
    pixels: &[u8],
    width: u32,
    height: u32,
    format: PixelFormat,
) -> Result<(), EncodeError> {
    if width == 0 || height == 0 {
        return Err(EncodeError::EmptyImage { width, height });
    }
    let expected = width as usize * height as usize * format.bytes_per_pixel();
    if pixels.len() != expected {
        return Err(EncodeError::BufferSize {
            expected,
            actual: pixels.len(),
        });
    }
    Ok(())
}

/// Read one pixel as straight RGBA; RGB pixels are opaque.
#[inline(always)]
fn pixel_rgba(chunk: &[u8]) -> PaletteEntry {
    match chunk.len() {
        3 => [chunk[0], chunk[1], chunk[2], 255],
        _ => [chunk[0], chunk[1], chunk[2], chunk[3]],
    }
}

/// Pack RGBA bytes into a u32 for faster hashing and comparison
#[inline(always)]
fn pack_color(c: PaletteEntry) -> u32 {
    u32::from_le_bytes(c)
}

/// Sequential palette extraction for small images.
///
/// Palette order is first appearance in row-major order.
fn extract_palette_sequential(
    pixels: &[u8],
    format: PixelFormat,
) -> Option<(Vec<PaletteEntry>, Vec<u8>)> {
    let bpp = format.bytes_per_pixel();
    let mut color_to_index: HashMap<u32, u8> = HashMap::with_capacity(MAX_PALETTE_SIZE);
    let mut palette: Vec<PaletteEntry> = Vec::with_capacity(MAX_PALETTE_SIZE);
    let mut indices: Vec<u8> = Vec::with_capacity(pixels.len() / bpp);

    for chunk in pixels.chunks_exact(bpp) {
        let color = pixel_rgba(chunk);
        let packed = pack_color(color);

        let index = match color_to_index.get(&packed) {
            Some(&idx) => idx,
            None => {
                if palette.len() >= MAX_PALETTE_SIZE {
                    return None;
                }
                let idx = palette.len() as u8;
                palette.push(color);
                color_to_index.insert(packed, idx);
                idx
            }
        };
        indices.push(index);
    }

    Some((palette, indices))
}

/// Parallel palette extraction for larger images.
///
/// 1. Parallel pass: unique colors per chunk, in chunk order
/// 2. Merge into one palette, bailing out past 256 colors
/// 3. Parallel pass: map each pixel to its palette index
fn extract_palette_parallel(
    pixels: &[u8],
    format: PixelFormat,
) -> Option<(Vec<PaletteEntry>, Vec<u8>)> {
    let bpp = format.bytes_per_pixel();
    let num_pixels = pixels.len() / bpp;
    let pixels_per_chunk = (num_pixels / rayon::current_num_threads()).max(256);
    let chunk_size = pixels_per_chunk * bpp;

    let chunk_colors: Vec<Option<Vec<u32>>> = pixels
        .par_chunks(chunk_size)
        .map(|chunk| {
            let mut seen: HashMap<u32, ()> = HashMap::with_capacity(MAX_PALETTE_SIZE);
            let mut ordered = Vec::new();
            for pixel in chunk.chunks_exact(bpp) {
                let packed = pack_color(pixel_rgba(pixel));
                if seen.insert(packed, ()).is_none() {
                    ordered.push(packed);
                    if ordered.len() > MAX_PALETTE_SIZE {
                        return None;
                    }
                }
            }
            Some(ordered)
        })
        .collect();

    let mut global_colors: HashMap<u32, u8> = HashMap::with_capacity(MAX_PALETTE_SIZE);
    let mut palette: Vec<PaletteEntry> = Vec::with_capacity(MAX_PALETTE_SIZE);

    for colors in chunk_colors {
        for packed in colors? {
            if global_colors.contains_key(&packed) {
                continue;
            }
            if palette.len() >= MAX_PALETTE_SIZE {
                return None;
            }
            global_colors.insert(packed, palette.len() as u8);
            palette.push(packed.to_le_bytes());
        }
    }

    let mut indices = vec![0u8; num_pixels];
    indices
        .par_chunks_mut(pixels_per_chunk)
        .zip(pixels.par_chunks(chunk_size))
        .for_each(|(idx_chunk, px_chunk)| {
            for (idx, pixel) in idx_chunk.iter_mut().zip(px_chunk.chunks_exact(bpp)) {
                let packed = pack_color(pixel_rgba(pixel));
                *idx = global_colors.get(&packed).copied().unwrap_or(0);
            }
        });

    Some((palette, indices))
}

/// Create an indexed PNG (color type 3) from palette and indices.
pub fn create_png_indexed(
    width: u32,
    height: u32,
    palette: &[PaletteEntry],
    indices: &[u8],
) -> Result<Vec<u8>, EncodeError> {
    if width == 0 || height == 0 {
        return Err(EncodeError::EmptyImage { width, height });
    }
    if palette.len() > MAX_PALETTE_SIZE {
        return Err(EncodeError::PaletteTooLarge(palette.len()));
    }
    let expected = width as usize * height as usize;
    if indices.len() != expected {
        return Err(EncodeError::BufferSize {
            expected,
            actual: indices.len(),
        });
    }

    let mut png = Vec::new();
    png.extend_from_slice(&PNG_SIGNATURE);

    write_chunk(&mut png, b"IHDR", &ihdr(width, height, 3));

    let plte_data: Vec<u8> = palette.iter().flat_map(|c| [c[0], c[1], c[2]]).collect();
    write_chunk(&mut png, b"PLTE", &plte_data);

    // tRNS only if any entry is not fully opaque
    if palette.iter().any(|c| c[3] < 255) {
        let trns_data: Vec<u8> = palette.iter().map(|c| c[3]).collect();
        write_chunk(&mut png, b"tRNS", &trns_data);
    }

    let idat_data = deflate_scanlines(indices, width as usize, height as usize)?;
    write_chunk(&mut png, b"IDAT", &idat_data);

    write_chunk(&mut png, b"IEND", &[]);

    Ok(png)
}

/// Create a truecolor PNG (color type 2 for RGB, 6 for RGBA).
pub fn create_png(
    pixels: &[u8],
    width: u32,
    height: u32,
    format: PixelFormat,
) -> Result<Vec<u8>, EncodeError> {
    check_buffer(pixels, width, height, format)?;

    let mut png = Vec::new();
    png.extend_from_slice(&PNG_SIGNATURE);

    write_chunk(&mut png, b"IHDR", &ihdr(width, height, format.color_type()));

    let row_bytes = width as usize * format.bytes_per_pixel();
    let idat_data = deflate_scanlines(pixels, row_bytes, height as usize)?;
    write_chunk(&mut png, b"IDAT", &idat_data);

    write_chunk(&mut png, b"IEND", &[]);

    Ok(png)
}

fn ihdr(width: u32, height: u32, color_type: u8) -> [u8; 13] {
    let mut data = [0u8; 13];
    data[0..4].copy_from_slice(&width.to_be_bytes());
    data[4..8].copy_from_slice(&height.to_be_bytes());
    data[8] = 8; // bit depth
    data[9] = color_type;
    // compression, filter and interlace methods stay 0
    data
}

/// Write a PNG chunk: length, type, data, CRC over type and data.
fn write_chunk(png: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) {
    png.extend_from_slice(&(data.len() as u32).to_be_bytes());
    png.extend_from_slice(chunk_type);
    png.extend_from_slice(data);

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(chunk_type);
    hasher.update(data);
    png.extend_from_slice(&hasher.finalize().to_be_bytes());
}

/// Prefix each row with filter byte 0 (none) and zlib-compress.
fn deflate_scanlines(data: &[u8], row_bytes: usize, height: usize) -> Result<Vec<u8>, EncodeError> {
    let mut uncompressed = Vec::with_capacity(height * (1 + row_bytes));
    for row in data.chunks_exact(row_bytes).take(height) {
        uncompressed.push(0);
        uncompressed.extend_from_slice(row);
    }

    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::fast());
    encoder.write_all(&uncompressed)?;
    Ok(encoder.finish()?)
}

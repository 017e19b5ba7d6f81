//! Alpha compositing of the shape layer over a base image.
//!
//! Standard straight-alpha "over": the layer is the source, the base the
//! destination. Only the region where both images overlap is touched; base
//! pixels outside it pass through unchanged, as do pixels under fully
//! transparent layer pixels.

use image::{Rgb, RgbImage, Rgba, RgbaImage};
use rayon::prelude::*;

use crate::shapes::ShapeLayer;

/// Blend one straight-alpha source pixel over a destination pixel.
///
/// A transparent source leaves the destination bit-identical. Integer math
/// with rounding, so an opaque source replaces the destination exactly.
#[inline]
pub fn blend_over(src: [u8; 4], dst: [u8; 4]) -> [u8; 4] {
    let sa = src[3] as u32;
    if sa == 0 {
        return dst;
    }
    if sa == 255 {
        return src;
    }

    let da = dst[3] as u32;
    let inv = 255 - sa;
    // Output alpha scaled by 255
    let out_a = sa * 255 + da * inv;
    if out_a == 0 {
        return [0, 0, 0, 0];
    }

    let channel = |s: u8, d: u8| -> u8 {
        let num = s as u32 * sa * 255 + d as u32 * da * inv;
        ((num + out_a / 2) / out_a).min(255) as u8
    };

    [
        channel(src[0], dst[0]),
        channel(src[1], dst[1]),
        channel(src[2], dst[2]),
        ((out_a + 127) / 255) as u8,
    ]
}

/// Composite the shape layer over an RGBA base.
///
/// The result has the base's dimensions.
pub fn composite(base: &RgbaImage, layer: &ShapeLayer) -> RgbaImage {
    let mut out = base.clone();
    let width = base.width().min(layer.width()) as usize;
    let height = base.height().min(layer.height()) as usize;
    if width == 0 || height == 0 {
        return out;
    }

    let base_stride = base.width() as usize * 4;
    let layer_stride = layer.width() as usize * 4;
    let src = layer.image().as_raw();

    out.par_chunks_exact_mut(base_stride)
        .take(height)
        .enumerate()
        .for_each(|(y, row)| {
            let src_row = &src[y * layer_stride..y * layer_stride + width * 4];
            for (dst_px, src_px) in row[..width * 4]
                .chunks_exact_mut(4)
                .zip(src_row.chunks_exact(4))
            {
                let s = [src_px[0], src_px[1], src_px[2], src_px[3]];
                let d = [dst_px[0], dst_px[1], dst_px[2], dst_px[3]];
                dst_px.copy_from_slice(&blend_over(s, d));
            }
        });

    out
}

/// Composite the shape layer over an opaque RGB base.
pub fn composite_rgb(base: &RgbImage, layer: &ShapeLayer) -> RgbaImage {
    composite(&to_rgba(base), layer)
}

/// Opaque RGBA copy of an RGB image.
pub fn to_rgba(img: &RgbImage) -> RgbaImage {
    RgbaImage::from_fn(img.width(), img.height(), |x, y| {
        let Rgb([r, g, b]) = *img.get_pixel(x, y);
        Rgba([r, g, b, 255])
    })
}

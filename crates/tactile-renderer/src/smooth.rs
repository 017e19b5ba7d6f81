//! Median smoothing of the quantized image.
//!
//! A per-channel median filter turns the speckled boundaries left by
//! quantization into flat contiguous regions, so block sampling sees stable
//! colors.

use image::RgbImage;
use imageproc::filter::median_filter;

/// Kernel size actually applied for a requested size.
///
/// Median windows must be odd: even sizes are rounded up to the next odd
/// value. `None` or 0 disables smoothing.
pub fn effective_kernel_size(requested: Option<u32>) -> Option<u32> {
    match requested {
        None | Some(0) => None,
        Some(n) if n % 2 == 0 => Some(n + 1),
        Some(n) => Some(n),
    }
}

/// Apply a square median filter of the given kernel size.
///
/// Borders replicate the nearest edge pixel. Kernel sizes 0 and 1 return an
/// unchanged copy.
pub fn smooth(img: &RgbImage, kernel_size: Option<u32>) -> RgbImage {
    let kernel = match effective_kernel_size(kernel_size) {
        Some(k) if k > 1 => k,
        _ => return img.clone(),
    };

    let radius = kernel / 2;
    tracing::debug!(kernel, radius, "median smoothing");
    median_filter(img, radius, radius)
}

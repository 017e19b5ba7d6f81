//! Tests for median smoothing.

use tactile_renderer::smooth::{effective_kernel_size, smooth};
use test_utils::{colors, photo_like, salt_and_pepper, solid_rgb, vertical_stripes};

#[test]
fn test_kernel_always_odd() {
    for n in 1..=15u32 {
        let k = effective_kernel_size(Some(n)).unwrap();
        assert_eq!(k % 2, 1, "kernel {} -> {}", n, k);
        assert!(k == n || k == n + 1);
    }
}

#[test]
fn test_smoothing_removes_impulse_noise() {
    let clean = solid_rgb(30, 30, [40, 160, 90]);
    let noisy = salt_and_pepper(&clean, 0.02, 17);
    assert_ne!(noisy, clean);

    // Even size 4 runs as a 5x5 window
    let out = smooth(&noisy, Some(4));
    for y in 2..28 {
        for x in 2..28 {
            assert_eq!(out.get_pixel(x, y).0, [40, 160, 90], "pixel ({}, {})", x, y);
        }
    }
}

#[test]
fn test_smoothing_keeps_wide_regions() {
    let img = vertical_stripes(40, 10, 10, &[colors::RED, colors::BLUE]);
    let out = smooth(&img, Some(3));
    assert_eq!(out, img);
}

#[test]
fn test_smoothing_preserves_dimensions() {
    let img = photo_like(17, 11, 2);
    assert_eq!(smooth(&img, Some(7)).dimensions(), (17, 11));
}

#[test]
fn test_zero_kernel_passes_through() {
    let img = photo_like(9, 9, 4);
    assert_eq!(smooth(&img, Some(0)), img);
}

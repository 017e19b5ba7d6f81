//! Tests for k-means color quantization and the saturation boost.

use image::Rgb;
use tactile_common::KmeansPolicy;
use tactile_renderer::quantize::{boost_saturation, quantize, quantize_image};
use test_utils::{
    assert_images_eq, checkerboard, colors, count_unique_colors, photo_like, vertical_stripes,
};

fn policy() -> KmeansPolicy {
    KmeansPolicy::default()
}

// ============================================================================
// Output guarantees
// ============================================================================

#[test]
fn test_at_most_k_colors() {
    let img = photo_like(48, 32, 7);
    assert!(count_unique_colors(&img) > 64);

    for k in [2, 3, 8, 16] {
        let out = quantize_image(&img, k, &policy(), 0);
        assert_eq!(out.dimensions(), img.dimensions());
        assert!(
            count_unique_colors(&out) <= k,
            "k={} produced {} colors",
            k,
            count_unique_colors(&out)
        );
    }
}

#[test]
fn test_labels_reference_palette() {
    let img = photo_like(20, 20, 3);
    let q = quantize(&img, 5, &policy(), 11);

    assert_eq!(q.k(), 5);
    assert_eq!(q.labels.len(), 400);
    assert!(q.labels.iter().all(|&l| (l as usize) < q.k()));
    assert!(q.iterations >= 1 && q.iterations <= policy().max_iterations);
    assert!(q.attempt < policy().attempts);
}

#[test]
fn test_fewer_colors_than_k_is_lossless() {
    let img = checkerboard(16, 16, 4, colors::RED, colors::BLUE);
    let out = quantize_image(&img, 4, &policy(), 0);
    assert_images_eq!(out, img);
}

#[test]
fn test_single_color_duplicates_centroids() {
    let img = test_utils::solid_rgb(10, 10, colors::RED);
    let q = quantize(&img, 2, &policy(), 0);

    assert_eq!(q.palette, vec![colors::RED, colors::RED]);
    assert!(q.to_image().pixels().all(|p| p.0 == colors::RED));
}

#[test]
fn test_requantizing_is_stable() {
    let img = photo_like(40, 30, 21);
    let once = quantize_image(&img, 6, &policy(), 0);
    let twice = quantize_image(&once, 6, &policy(), 0);

    assert!(count_unique_colors(&twice) <= 6);
    assert_images_eq!(twice, once);
}

#[test]
fn test_separated_stripes_are_recovered() {
    let palette = [colors::RED, colors::GREEN, colors::BLUE];
    let img = vertical_stripes(30, 10, 5, &palette);
    let out = quantize_image(&img, 3, &policy(), 0);
    assert_images_eq!(out, img);
}

// ============================================================================
// Determinism
// ============================================================================

#[test]
fn test_same_seed_same_result() {
    let img = photo_like(32, 32, 99);
    let a = quantize(&img, 8, &policy(), 42);
    let b = quantize(&img, 8, &policy(), 42);

    assert_eq!(a.palette, b.palette);
    assert_eq!(a.labels, b.labels);
    assert_eq!(a.attempt, b.attempt);
}

#[test]
fn test_single_attempt_policy() {
    let img = photo_like(16, 16, 1);
    let policy = KmeansPolicy {
        max_iterations: 1,
        epsilon: 0.0,
        attempts: 1,
    };
    let q = quantize(&img, 4, &policy, 0);
    assert_eq!(q.iterations, 1);
    assert_eq!(q.attempt, 0);
}

#[test]
fn test_empty_image() {
    let img = image::RgbImage::new(0, 0);
    let q = quantize(&img, 3, &policy(), 0);
    assert_eq!(q.k(), 3);
    assert!(q.labels.is_empty());
    assert_eq!(q.to_image().dimensions(), (0, 0));
}

// ============================================================================
// Saturation boost
// ============================================================================

#[test]
fn test_saturation_identity_factor() {
    let img = photo_like(12, 9, 5);
    assert_images_eq!(boost_saturation(&img, 1.0), img);
}

#[test]
fn test_saturation_keeps_greys() {
    let img = image::RgbImage::from_fn(16, 1, |x, _| {
        let v = (x * 17) as u8;
        Rgb([v, v, v])
    });
    assert_images_eq!(boost_saturation(&img, 3.0), img);
}

#[test]
fn test_saturation_pushes_channels_apart() {
    let img = test_utils::solid_rgb(1, 1, [150, 100, 100]);
    let out = boost_saturation(&img, 2.0);
    let p = out.get_pixel(0, 0);
    assert!(p[0] > 150);
    assert!(p[1] < 100 && p[2] < 100);
}

#[test]
fn test_saturation_keeps_primaries() {
    let img = test_utils::solid_rgb(2, 2, colors::RED);
    assert!(boost_saturation(&img, 2.0).pixels().all(|p| p.0 == colors::RED));
}

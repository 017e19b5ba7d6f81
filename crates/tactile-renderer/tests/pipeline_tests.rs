//! End-to-end tests for the tactile map pipeline.

use image::{DynamicImage, Rgba, RgbaImage};
use tactile_common::{MapConfig, OutlineColor};
use tactile_renderer::composite::{composite, to_rgba};
use tactile_renderer::{NoProgress, ShapeKind, TactilePipeline};
use test_utils::{
    assert_approx_eq, assert_images_eq, colors, count_unique_colors, photo_like, plain_config,
    single_block_config, solid_rgb,
};

const RED_UNDER_BLACK: [u8; 4] = [102, 0, 0, 255];

#[test]
fn test_single_red_block() {
    let img = solid_rgb(10, 10, colors::RED);
    let out = TactilePipeline::new(single_block_config()).run(&img, &mut NoProgress);

    // Quantized image stays pure red
    assert!(out.quantized.pixels().all(|p| p.0 == colors::RED));
    assert_eq!(out.blocks_sampled, 1);

    // Only a triangle, sized for a full red channel
    assert_eq!(out.shapes.len(), 1);
    let triangle = out.shapes[0];
    assert_eq!(triangle.kind, ShapeKind::Triangle);
    assert_approx_eq!(triangle.size, 9.5, 1e-5);
    assert_eq!((triangle.center_x, triangle.center_y), (5.0, 5.0));

    // Outline pixels are black at 60% over red, the rest stays red
    let changed = out
        .quantized_overlay
        .pixels()
        .filter(|p| p.0 != [255, 0, 0, 255])
        .count();
    assert!(changed > 0);
    assert!(out
        .quantized_overlay
        .pixels()
        .all(|p| p.0 == [255, 0, 0, 255] || p.0 == RED_UNDER_BLACK));
    assert_eq!(out.quantized_overlay.get_pixel(0, 0).0, [255, 0, 0, 255]);
    assert_eq!(out.quantized_overlay.get_pixel(9, 0).0, [255, 0, 0, 255]);

    // The original is also red, so both overlays agree
    assert_images_eq!(out.original_overlay, out.quantized_overlay);
}

#[test]
fn test_black_image_has_no_shapes() {
    let img = solid_rgb(10, 10, colors::BLACK);
    let out = TactilePipeline::new(single_block_config()).run(&img, &mut NoProgress);

    assert_eq!(out.blocks_sampled, 1);
    assert!(out.shapes.is_empty());
    assert!(out.layer.is_blank());
    assert_images_eq!(out.original_overlay, to_rgba(&img));
    assert_images_eq!(out.quantized_overlay, to_rgba(&out.quantized));
}

#[test]
fn test_white_outline_over_blue() {
    let config = MapConfig {
        outline_color: OutlineColor::White,
        block_size: 20,
        n_clusters: 2,
        ..MapConfig::default()
    };
    let img = solid_rgb(20, 20, colors::BLUE);
    let out = TactilePipeline::new(config).run(&img, &mut NoProgress);

    assert_eq!(out.shapes.len(), 1);
    assert_eq!(out.shapes[0].kind, ShapeKind::Circle);
    assert!(out
        .original_overlay
        .pixels()
        .all(|p| p.0 == [0, 0, 255, 255] || p.0 == [153, 153, 255, 255]));
    assert!(out.original_overlay.pixels().any(|p| p.0 == [153, 153, 255, 255]));
}

#[test]
fn test_overlay_equals_composite_of_layer() {
    let img = photo_like(60, 45, 8);
    let out = TactilePipeline::new(plain_config(6, 15)).run(&img, &mut NoProgress);

    assert_images_eq!(out.quantized_overlay, composite(&to_rgba(&out.quantized), &out.layer));
    assert_images_eq!(out.original_overlay, composite(&to_rgba(&img), &out.layer));
}

#[test]
fn test_quantized_respects_cluster_count() {
    let img = photo_like(64, 48, 12);
    let out = TactilePipeline::new(plain_config(5, 16)).run(&img, &mut NoProgress);
    assert!(count_unique_colors(&out.quantized) <= 5);
    assert_eq!(out.blocks_sampled, 4 * 3);
}

#[test]
fn test_deterministic_for_fixed_seed() {
    let img = photo_like(50, 50, 33);
    let config = MapConfig {
        seed: 7,
        block_size: 10,
        ..MapConfig::default()
    };
    let a = TactilePipeline::new(config.clone()).run(&img, &mut NoProgress);
    let b = TactilePipeline::new(config).run(&img, &mut NoProgress);

    assert_images_eq!(a.quantized, b.quantized);
    assert_images_eq!(a.original_overlay, b.original_overlay);
    assert_eq!(a.shapes, b.shapes);
}

#[test]
fn test_progress_reaches_one() {
    let img = photo_like(40, 40, 1);
    let mut seen = Vec::new();
    let mut observer = |f: f32| seen.push(f);
    TactilePipeline::new(plain_config(4, 10)).run(&img, &mut observer);

    assert!(!seen.is_empty());
    assert!(seen.iter().all(|f| (0.0..=1.0).contains(f)));
    assert!(seen.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(seen.last().copied(), Some(1.0));
}

#[test]
fn test_out_of_range_config_is_clamped() {
    let config = MapConfig {
        n_clusters: 0,
        block_size: 0,
        blur_intensity: 99,
        saturation_factor: -3.0,
        ..MapConfig::default()
    };
    let img = photo_like(20, 20, 2);
    let out = TactilePipeline::new(config).run(&img, &mut NoProgress);
    assert_eq!(out.quantized.dimensions(), (20, 20));
    // Block size clamps to 5
    assert_eq!(out.blocks_sampled, 16);
}

#[test]
fn test_proportion_at_min_size_draws_nothing() {
    // 95 pixels of red 28 and 5 of red 29: mean 28.05, proportion 0.11
    let img = image::RgbImage::from_fn(10, 10, |x, y| {
        if y * 10 + x < 95 {
            image::Rgb([28, 0, 0])
        } else {
            image::Rgb([29, 0, 0])
        }
    });
    let config = MapConfig {
        min_size_percent: 0.11,
        black_threshold: 0.0,
        ..plain_config(2, 10)
    };
    let out = TactilePipeline::new(config.clone()).run(&img, &mut NoProgress);
    assert_eq!(out.blocks_sampled, 1);
    assert!(out.shapes.is_empty(), "{:?}", out.shapes);

    let lower = MapConfig {
        min_size_percent: 0.10,
        ..config
    };
    let out = TactilePipeline::new(lower).run(&img, &mut NoProgress);
    assert_eq!(out.shapes.len(), 1);
    assert_eq!(out.shapes[0].kind, ShapeKind::Triangle);
}

#[test]
fn test_intensity_at_black_threshold_is_drawn() {
    // Mean intensity (0 + 1 + 32) / 3 is exactly 11
    let img = solid_rgb(10, 10, [0, 1, 32]);
    let config = MapConfig {
        black_threshold: 11.0,
        ..plain_config(2, 10)
    };
    let out = TactilePipeline::new(config.clone()).run(&img, &mut NoProgress);
    assert_eq!(out.shapes.len(), 1);
    assert_eq!(out.shapes[0].kind, ShapeKind::Circle);

    let darker = MapConfig {
        black_threshold: 11.5,
        ..config
    };
    let out = TactilePipeline::new(darker).run(&img, &mut NoProgress);
    assert!(out.shapes.is_empty());
}

#[test]
fn test_run_dynamic_uses_source_alpha() {
    let mut rgba = RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255]));
    rgba.put_pixel(0, 0, Rgba([255, 0, 0, 0]));
    let out = TactilePipeline::new(single_block_config())
        .run_dynamic(&DynamicImage::ImageRgba8(rgba), &mut NoProgress);

    assert_eq!(out.shapes.len(), 1);
    assert_eq!(out.original_overlay.get_pixel(0, 0).0, [255, 0, 0, 0]);
    assert_eq!(out.quantized_overlay.get_pixel(0, 0).0, [255, 0, 0, 255]);
}

#[test]
fn test_encode_outputs() {
    let img = photo_like(30, 20, 4);
    let out = TactilePipeline::new(plain_config(4, 10)).run(&img, &mut NoProgress);
    let encoded = out.encode().unwrap();

    let quantized = image::load_from_memory(&encoded.quantized).unwrap().to_rgb8();
    assert_images_eq!(quantized, out.quantized);

    let overlay = image::load_from_memory(&encoded.quantized_overlay).unwrap().to_rgba8();
    assert_images_eq!(overlay, out.quantized_overlay);

    let original = image::load_from_memory(&encoded.original_overlay).unwrap().to_rgba8();
    assert_images_eq!(original, out.original_overlay);
}

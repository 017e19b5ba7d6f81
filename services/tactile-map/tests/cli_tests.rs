//! End-to-end tests for the tactile-map front end: configuration sources,
//! decoding and writing the three output files.

use clap::Parser;
use std::fs;
use tactile_common::{MapConfig, OutlineColor};
use tactile_map::{render_file, run, Args, OutputPaths};
use test_utils::{colors, photo_like, plain_config, solid_rgb, temp_output_dir};

fn parse(argv: &[&str]) -> Args {
    Args::try_parse_from(std::iter::once("tactile-map").chain(argv.iter().copied())).unwrap()
}

#[test]
fn test_render_writes_three_pngs() {
    let dir = temp_output_dir();
    let input = dir.path().join("scene.png");
    photo_like(64, 40, 3).save(&input).unwrap();

    let out_dir = dir.path().join("out");
    let summary = render_file(&input, &out_dir, plain_config(6, 16)).unwrap();

    assert_eq!((summary.width, summary.height), (64, 40));
    assert_eq!(summary.blocks, 4 * 3);
    assert_eq!(summary.outputs, OutputPaths::for_input(&input, &out_dir));

    for path in summary.outputs.iter() {
        let img = image::open(path).unwrap();
        assert_eq!((img.width(), img.height()), (64, 40), "{}", path.display());
    }
    assert!(out_dir.join("scene_quantized.png").exists());
    assert!(out_dir.join("scene_quantized_shapes.png").exists());
    assert!(out_dir.join("scene_tactile.png").exists());
}

#[test]
fn test_render_red_scenario_from_disk() {
    let dir = temp_output_dir();
    let input = dir.path().join("red.png");
    solid_rgb(10, 10, colors::RED).save(&input).unwrap();

    let config = MapConfig {
        n_clusters: 2,
        block_size: 10,
        ..MapConfig::default()
    };
    let summary = render_file(&input, dir.path(), config).unwrap();
    assert_eq!(summary.blocks, 1);
    assert_eq!(summary.shapes, 1);

    let tactile = image::open(&summary.outputs.tactile).unwrap().to_rgba8();
    assert!(tactile.pixels().any(|p| p.0 == [102, 0, 0, 255]));
    assert_eq!(tactile.get_pixel(0, 0).0, [255, 0, 0, 255]);
}

#[test]
fn test_config_file_then_flags() {
    let dir = temp_output_dir();
    let config_path = dir.path().join("tactile.yaml");
    fs::write(
        &config_path,
        "n_clusters: 8\nblock_size: 25\noutline_color: white\nkmeans:\n  attempts: 5\n",
    )
    .unwrap();

    let args = parse(&["in.png", "--config", config_path.to_str().unwrap(), "-s", "40"]);
    let config = args.resolve_config_with(|_| None).unwrap();

    assert_eq!(config.n_clusters, 8);
    assert_eq!(config.block_size, 40);
    assert_eq!(config.outline_color, OutlineColor::White);
    assert_eq!(config.kmeans.attempts, 5);
    assert_eq!(config.kmeans.max_iterations, 10);
}

#[test]
fn test_json_config_file() {
    let dir = temp_output_dir();
    let config_path = dir.path().join("tactile.json");
    fs::write(&config_path, r#"{"saturation_factor": 1.5, "seed": 9}"#).unwrap();

    let args = parse(&["in.png", "-c", config_path.to_str().unwrap()]);
    let config = args.resolve_config_with(|_| None).unwrap();
    assert_eq!(config.saturation_factor, 1.5);
    assert_eq!(config.seed, 9);
}

#[test]
fn test_env_between_file_and_flags() {
    let dir = temp_output_dir();
    let config_path = dir.path().join("tactile.yaml");
    fs::write(&config_path, "n_clusters: 8\nblur_intensity: 3\n").unwrap();

    let args = parse(&["in.png", "-c", config_path.to_str().unwrap(), "--blur", "5"]);
    let config = args
        .resolve_config_with(|key| match key {
            "TACTILE_N_CLUSTERS" => Some("12".to_string()),
            "TACTILE_BLUR_INTENSITY" => Some("9".to_string()),
            _ => None,
        })
        .unwrap();

    assert_eq!(config.n_clusters, 12);
    assert_eq!(config.blur_intensity, 5);
}

#[test]
fn test_unsupported_input_format() {
    let dir = temp_output_dir();
    let input = dir.path().join("notes.txt");
    fs::write(&input, "not an image").unwrap();

    let err = render_file(&input, dir.path(), MapConfig::default()).unwrap_err();
    let tactile = err.downcast_ref::<tactile_common::TactileError>().unwrap();
    assert_eq!(tactile.exit_code(), 3);
}

#[test]
fn test_corrupt_png_is_decode_error() {
    let dir = temp_output_dir();
    let input = dir.path().join("broken.png");
    // Valid signature, then an IHDR chunk with zero dimensions and a bad CRC
    let mut bytes = vec![137u8, 80, 78, 71, 13, 10, 26, 10];
    bytes.extend_from_slice(&13u32.to_be_bytes());
    bytes.extend_from_slice(b"IHDR");
    bytes.extend_from_slice(&[0u8; 13]);
    bytes.extend_from_slice(&[0u8; 4]);
    bytes.extend_from_slice(&[0u8; 64]);
    fs::write(&input, bytes).unwrap();

    let err = render_file(&input, dir.path(), MapConfig::default()).unwrap_err();
    let tactile = err.downcast_ref::<tactile_common::TactileError>().unwrap();
    assert_eq!(tactile.exit_code(), 3);
}

#[test]
fn test_run_with_missing_config_file() {
    let args = parse(&["in.png", "-c", "/nonexistent/tactile.yaml"]);
    let err = run(&args).unwrap_err();
    let tactile = err.downcast_ref::<tactile_common::TactileError>().unwrap();
    assert_eq!(tactile.exit_code(), 5);
}

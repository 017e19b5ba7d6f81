//! Shared test utilities for the tactile-map workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Synthetic image generators
//! - Pipeline configuration fixtures
//! - Approximate-equality assertion macros
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```
//!
//! Then import in your tests:
//!
//! ```ignore
//! use test_utils::{solid_rgb, fixtures};
//! ```

pub mod fixtures;
pub mod generators;

// Re-export commonly used items at the crate root
pub use fixtures::*;
pub use generators::*;

/// Macro for approximate floating-point equality assertions.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_approx_eq;
///
/// assert_approx_eq!(9.5_f32, 9.5000001_f32, 1e-4); // passes
/// assert_approx_eq!(0.5_f64, 0.6_f64, 1e-4);       // fails
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let epsilon: f64 = $epsilon as f64;
        let diff = (left - right).abs();
        if diff > epsilon {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` > epsilon `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}

/// Assert that two images have identical dimensions and pixels, reporting
/// the first differing pixel on failure.
#[macro_export]
macro_rules! assert_images_eq {
    ($left:expr, $right:expr) => {{
        let left = &$left;
        let right = &$right;
        assert_eq!(left.dimensions(), right.dimensions(), "image dimensions differ");
        if let Some((x, y, a, b)) = left
            .enumerate_pixels()
            .zip(right.pixels())
            .find(|((_, _, a), b)| a != b)
            .map(|((x, y, a), b)| (x, y, *a, *b))
        {
            panic!("images differ at ({}, {}): {:?} != {:?}", x, y, a, b);
        }
    }};
}

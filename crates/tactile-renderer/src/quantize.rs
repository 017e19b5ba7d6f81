//! Color quantization with k-means clustering.
//!
//! Pixels are treated as points in RGB space and clustered with Lloyd's
//! algorithm:
//! - **Seeding**: k-means++ (each new centroid drawn with probability
//!   proportional to its squared distance from the nearest chosen one).
//! - **Termination**: largest centroid movement ≤ epsilon, or the iteration
//!   cap, whichever happens first.
//! - **Restarts**: several independently seeded attempts run in parallel and
//!   the most compact one is kept.
//!
//! Identical pixels are collapsed into one weighted point before
//! clustering, which gives the same centroids as clustering every pixel but
//! is much cheaper on photographs with repeated colors.

use image::{Rgb, RgbImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::collections::HashMap;
use tactile_common::KmeansPolicy;

/// Minimum number of points to benefit from parallel label assignment
const PARALLEL_THRESHOLD: usize = 4096;

/// A color as a point in RGB space
type Point = [f64; 3];

#[inline(always)]
fn dist_sq(a: &Point, b: &Point) -> f64 {
    let dr = a[0] - b[0];
    let dg = a[1] - b[1];
    let db = a[2] - b[2];
    dr * dr + dg * dg + db * db
}

/// Pack RGB bytes into a u32 for hashing
#[inline(always)]
fn pack_rgb(p: &Rgb<u8>) -> u32 {
    (p[0] as u32) | ((p[1] as u32) << 8) | ((p[2] as u32) << 16)
}

/// Result of quantizing an image: the palette plus a label map.
#[derive(Debug, Clone)]
pub struct Quantization {
    /// Cluster centroids as 8-bit colors. Always exactly `k` entries;
    /// duplicates are possible when the image has fewer than `k` colors.
    pub palette: Vec<[u8; 3]>,
    /// Palette index for every pixel, row-major.
    pub labels: Vec<u32>,
    pub width: u32,
    pub height: u32,
    /// Weighted sum of squared distances to the assigned centroids.
    pub compactness: f64,
    /// Lloyd iterations used by the winning attempt.
    pub iterations: usize,
    /// Index of the winning attempt.
    pub attempt: usize,
}

impl Quantization {
    /// Black palette with no labels, for images without pixels.
    fn empty(width: u32, height: u32, k: usize) -> Self {
        Self {
            palette: vec![[0, 0, 0]; k],
            labels: Vec::new(),
            width,
            height,
            compactness: 0.0,
            iterations: 0,
            attempt: 0,
        }
    }

    /// Number of clusters.
    pub fn k(&self) -> usize {
        self.palette.len()
    }

    /// Palette index of the pixel at (x, y).
    pub fn label_at(&self, x: u32, y: u32) -> usize {
        self.labels[(y * self.width + x) as usize] as usize
    }

    /// Render the label map with palette colors.
    pub fn to_image(&self) -> RgbImage {
        let mut raw = Vec::with_capacity(self.labels.len() * 3);
        for &label in &self.labels {
            raw.extend_from_slice(&self.palette[label as usize]);
        }
        RgbImage::from_raw(self.width, self.height, raw)
            .unwrap_or_else(|| RgbImage::new(self.width, self.height))
    }
}

/// Distinct colors of an image with their pixel counts, in first-seen
/// (row-major) order.
struct ColorHistogram {
    colors: Vec<Point>,
    weights: Vec<f64>,
    index: HashMap<u32, usize>,
}

impl ColorHistogram {
    fn from_image(img: &RgbImage) -> Self {
        let mut colors = Vec::new();
        let mut weights: Vec<f64> = Vec::new();
        let mut index = HashMap::new();

        for px in img.pixels() {
            let idx = *index.entry(pack_rgb(px)).or_insert_with(|| {
                colors.push([px[0] as f64, px[1] as f64, px[2] as f64]);
                weights.push(0.0);
                colors.len() - 1
            });
            weights[idx] += 1.0;
        }

        Self { colors, weights, index }
    }

    fn len(&self) -> usize {
        self.colors.len()
    }
}

/// One seeded clustering attempt.
struct Attempt {
    centroids: Vec<Point>,
    /// Cluster of each distinct color
    labels: Vec<usize>,
    compactness: f64,
    iterations: usize,
}

/// Quantize `img` to `k` colors.
///
/// Attempt `i` is seeded with `seed + i`, so the result is fully determined
/// by the inputs. `k` below 1 is treated as 1.
pub fn quantize(img: &RgbImage, k: usize, policy: &KmeansPolicy, seed: u64) -> Quantization {
    let k = k.max(1);
    let (width, height) = img.dimensions();
    let histogram = ColorHistogram::from_image(img);

    if histogram.len() == 0 {
        return Quantization::empty(width, height, k);
    }

    let attempts = policy.attempts.max(1);
    tracing::debug!(
        width,
        height,
        distinct_colors = histogram.len(),
        k,
        attempts,
        max_iterations = policy.max_iterations,
        epsilon = policy.epsilon,
        "k-means quantization"
    );

    let results: Vec<Attempt> = (0..attempts)
        .into_par_iter()
        .map(|i| run_attempt(&histogram, k, policy, seed.wrapping_add(i as u64)))
        .collect();

    // First minimum wins, so ties resolve to the lowest attempt index
    let Some((attempt, best)) = results
        .into_iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.compactness.total_cmp(&b.compactness))
    else {
        return Quantization::empty(width, height, k);
    };

    tracing::debug!(
        attempt,
        compactness = best.compactness,
        iterations = best.iterations,
        "k-means best attempt"
    );

    let palette: Vec<[u8; 3]> = best.centroids.iter().map(centroid_to_rgb).collect();

    let labels: Vec<u32> = img
        .pixels()
        .map(|px| best.labels[histogram.index[&pack_rgb(px)]] as u32)
        .collect();

    Quantization {
        palette,
        labels,
        width,
        height,
        compactness: best.compactness,
        iterations: best.iterations,
        attempt,
    }
}

/// Quantize and render in one step.
pub fn quantize_image(img: &RgbImage, k: usize, policy: &KmeansPolicy, seed: u64) -> RgbImage {
    quantize(img, k, policy, seed).to_image()
}

/// Clamp to [0, 255] and truncate.
fn centroid_to_rgb(c: &Point) -> [u8; 3] {
    [
        c[0].clamp(0.0, 255.0) as u8,
        c[1].clamp(0.0, 255.0) as u8,
        c[2].clamp(0.0, 255.0) as u8,
    ]
}

fn run_attempt(histogram: &ColorHistogram, k: usize, policy: &KmeansPolicy, seed: u64) -> Attempt {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut centroids = seed_centroids(histogram, k, &mut rng);
    let mut labels = assign(&histogram.colors, &centroids);
    let epsilon = policy.epsilon as f64;
    let max_iterations = policy.max_iterations.max(1);
    let mut iterations = 0;

    loop {
        let updated = update_centroids(histogram, &labels, &centroids);
        let max_shift = centroids
            .iter()
            .zip(&updated)
            .map(|(old, new)| dist_sq(old, new))
            .fold(0.0f64, f64::max)
            .sqrt();

        centroids = updated;
        labels = assign(&histogram.colors, &centroids);
        iterations += 1;

        if iterations >= max_iterations || max_shift <= epsilon {
            break;
        }
    }

    let compactness = histogram
        .colors
        .iter()
        .zip(&histogram.weights)
        .zip(&labels)
        .map(|((color, w), &label)| w * dist_sq(color, &centroids[label]))
        .sum();

    Attempt {
        centroids,
        labels,
        compactness,
        iterations,
    }
}

/// k-means++ seeding over weighted points.
fn seed_centroids(histogram: &ColorHistogram, k: usize, rng: &mut StdRng) -> Vec<Point> {
    let mut centroids = Vec::with_capacity(k);

    // First centroid: a uniformly random pixel
    let first = pick_weighted(rng, &histogram.weights).unwrap_or(0);
    centroids.push(histogram.colors[first]);

    let mut nearest: Vec<f64> = histogram
        .colors
        .iter()
        .map(|c| dist_sq(c, &centroids[0]))
        .collect();

    while centroids.len() < k {
        let scores: Vec<f64> = nearest
            .iter()
            .zip(&histogram.weights)
            .map(|(d, w)| d * w)
            .collect();

        // All points already coincide with a centroid: duplicate one
        let idx = pick_weighted(rng, &scores)
            .or_else(|| pick_weighted(rng, &histogram.weights))
            .unwrap_or(0);
        let chosen = histogram.colors[idx];
        centroids.push(chosen);

        for (d, c) in nearest.iter_mut().zip(&histogram.colors) {
            *d = d.min(dist_sq(c, &chosen));
        }
    }

    centroids
}

/// Sample an index with probability proportional to its score. Returns None
/// when all scores are zero.
fn pick_weighted(rng: &mut StdRng, scores: &[f64]) -> Option<usize> {
    let total: f64 = scores.iter().sum();
    if !(total > 0.0) {
        return None;
    }

    let target = rng.gen::<f64>() * total;
    let mut cumulative = 0.0;
    let mut last_positive = None;
    for (i, &s) in scores.iter().enumerate() {
        if s <= 0.0 {
            continue;
        }
        cumulative += s;
        last_positive = Some(i);
        if cumulative > target {
            return Some(i);
        }
    }
    // Rounding can leave target just above the final sum
    last_positive
}

/// Nearest centroid for each point (ties go to the lowest index).
fn assign(points: &[Point], centroids: &[Point]) -> Vec<usize> {
    if points.len() >= PARALLEL_THRESHOLD {
        points.par_iter().map(|p| nearest_centroid(p, centroids)).collect()
    } else {
        points.iter().map(|p| nearest_centroid(p, centroids)).collect()
    }
}

#[inline]
fn nearest_centroid(p: &Point, centroids: &[Point]) -> usize {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (i, c) in centroids.iter().enumerate() {
        let d = dist_sq(p, c);
        if d < best_dist {
            best_dist = d;
            best = i;
        }
    }
    best
}

/// Weighted mean of each cluster.
///
/// An empty cluster takes one pixel from the heaviest cluster: a pixel of the
/// member color farthest from that cluster's mean. A heaviest cluster with a
/// single pixel left cannot donate, and the empty cluster keeps its centroid.
fn update_centroids(
    histogram: &ColorHistogram,
    labels: &[usize],
    previous: &[Point],
) -> Vec<Point> {
    let k = previous.len();
    let mut sums = vec![[0.0f64; 3]; k];
    let mut counts = vec![0.0f64; k];

    for ((color, w), &label) in histogram.colors.iter().zip(&histogram.weights).zip(labels) {
        sums[label][0] += color[0] * w;
        sums[label][1] += color[1] * w;
        sums[label][2] += color[2] * w;
        counts[label] += w;
    }

    // Pixels of each distinct color still in their assigned cluster
    let mut remaining = histogram.weights.clone();

    for empty in 0..k {
        if counts[empty] > 0.0 {
            continue;
        }

        // First heaviest cluster
        let donor = (1..k).fold(0, |best, i| if counts[i] > counts[best] { i } else { best });
        if counts[donor] <= 1.0 {
            continue;
        }

        let mean = sums[donor].map(|s| s / counts[donor]);
        let farthest = labels
            .iter()
            .enumerate()
            .filter(|&(i, &label)| label == donor && remaining[i] > 0.0)
            .map(|(i, _)| (i, dist_sq(&histogram.colors[i], &mean)))
            // Last of equally distant colors
            .fold(None, |best: Option<(usize, f64)>, (i, d)| match best {
                Some((_, best_d)) if d < best_d => best,
                _ => Some((i, d)),
            });
        let Some((i, _)) = farthest else {
            continue;
        };

        let color = histogram.colors[i];
        remaining[i] -= 1.0;
        for c in 0..3 {
            sums[donor][c] -= color[c];
            sums[empty][c] += color[c];
        }
        counts[donor] -= 1.0;
        counts[empty] += 1.0;
    }

    sums.iter()
        .zip(&counts)
        .zip(previous)
        .map(|((sum, &count), prev)| {
            if count > 0.0 {
                [sum[0] / count, sum[1] / count, sum[2] / count]
            } else {
                *prev
            }
        })
        .collect()
}

/// Increase color saturation by blending each pixel away from its luma grey.
///
/// `factor` 1.0 returns an unchanged copy; 0.0 would give a greyscale image.
/// Results are clamped to [0, 255] and truncated.
pub fn boost_saturation(img: &RgbImage, factor: f64) -> RgbImage {
    if factor == 1.0 {
        return img.clone();
    }

    let (width, height) = img.dimensions();
    let mut raw = img.as_raw().clone();

    raw.par_chunks_exact_mut(3).for_each(|px| {
        // ITU-R 601-2 luma, same weights as an "L" conversion
        let grey = ((px[0] as u32 * 19595 + px[1] as u32 * 38470 + px[2] as u32 * 7471 + 0x8000)
            >> 16) as f64;
        for c in px.iter_mut() {
            let v = grey + factor * (*c as f64 - grey);
            *c = v.clamp(0.0, 255.0) as u8;
        }
    });

    RgbImage::from_raw(width, height, raw).unwrap_or_else(|| img.clone())
}

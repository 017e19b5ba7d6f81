//! Progress reporting for the block loop.
//!
//! Progress is advisory: observers receive a fraction in `[0, 1]` after each
//! row of blocks and cannot influence the pipeline.

use std::sync::mpsc::Sender;

/// Receives pipeline progress as a fraction in `[0, 1]`.
pub trait ProgressObserver {
    fn report(&mut self, fraction: f32);
}

/// Observer that ignores every report.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn report(&mut self, _fraction: f32) {}
}

impl<F> ProgressObserver for F
where
    F: FnMut(f32),
{
    fn report(&mut self, fraction: f32) {
        self(fraction)
    }
}

/// Forwards reports over a channel. A disconnected receiver is ignored.
#[derive(Debug, Clone)]
pub struct ChannelProgress(pub Sender<f32>);

impl ProgressObserver for ChannelProgress {
    fn report(&mut self, fraction: f32) {
        let _ = self.0.send(fraction);
    }
}

/// Fraction reported after finishing row `row` (0-based) out of `total`
/// expected rows, clamped to 1.0. `total` below 1 counts as 1.
pub fn row_fraction(row: usize, total: usize) -> f32 {
    ((row + 1) as f32 / total.max(1) as f32).min(1.0)
}

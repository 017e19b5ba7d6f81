//! Tactile map rendering.
//!
//! Turns a photograph or map image into a tactile-friendly rendering:
//! - Color quantization (k-means with restarts)
//! - Median smoothing of the quantized regions
//! - Block sampling of mean channel intensities
//! - Proportional outline shapes (triangle = red, square = green, circle = blue)
//! - Alpha compositing over the quantized and original images
//! - PNG encoding of the results
//!
//! `TactilePipeline` chains the stages; each stage is also usable on its own.

pub mod composite;
pub mod pipeline;
pub mod png;
pub mod progress;
pub mod quantize;
pub mod sample;
pub mod shapes;
pub mod smooth;

pub use pipeline::{EncodedOutputs, PipelineOutput, TactilePipeline};
pub use png::EncodeError;
pub use progress::{ChannelProgress, NoProgress, ProgressObserver};
pub use shapes::{legend, ShapeKind, ShapeLayer, ShapeSpec};

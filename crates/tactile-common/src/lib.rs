//! Common types shared by the tactile-map pipeline and its front ends.

pub mod color;
pub mod config;
pub mod error;

pub use color::{Color, OutlineColor};
pub use config::{KmeansPolicy, MapConfig};
pub use error::{TactileError, TactileResult};

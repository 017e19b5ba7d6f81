//! Reading the input image and writing the rendered outputs.

use image::{DynamicImage, ImageError};
use std::path::{Path, PathBuf};
use tactile_common::{TactileError, TactileResult};
use tactile_renderer::EncodedOutputs;

/// Suffixes appended to the input file stem.
pub const QUANTIZED_SUFFIX: &str = "_quantized";
pub const QUANTIZED_SHAPES_SUFFIX: &str = "_quantized_shapes";
pub const TACTILE_SUFFIX: &str = "_tactile";

/// Output file locations for one input image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub quantized: PathBuf,
    pub quantized_shapes: PathBuf,
    pub tactile: PathBuf,
}

impl OutputPaths {
    /// `<dir>/<stem>_quantized.png`, `<dir>/<stem>_quantized_shapes.png` and
    /// `<dir>/<stem>_tactile.png`. An input without a usable stem is named
    /// "output".
    pub fn for_input(input: &Path, dir: &Path) -> Self {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "output".to_string());

        let file = |suffix: &str| dir.join(format!("{}{}.png", stem, suffix));
        Self {
            quantized: file(QUANTIZED_SUFFIX),
            quantized_shapes: file(QUANTIZED_SHAPES_SUFFIX),
            tactile: file(TACTILE_SUFFIX),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        [&self.quantized, &self.quantized_shapes, &self.tactile]
            .into_iter()
            .map(PathBuf::as_path)
    }
}

/// Decode an image file.
pub fn load_image(path: &Path) -> TactileResult<DynamicImage> {
    image::open(path).map_err(|e| match e {
        ImageError::IoError(io) => TactileError::Io(format!("{}: {}", path.display(), io)),
        ImageError::Unsupported(u) => {
            TactileError::UnsupportedFormat(format!("{}: {}", path.display(), u))
        }
        other => TactileError::Decode(format!("{}: {}", path.display(), other)),
    })
}

/// Write the three encoded images, creating the output directory if needed.
pub fn write_outputs(encoded: &EncodedOutputs, paths: &OutputPaths) -> TactileResult<()> {
    for path in paths.iter() {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
    }

    let files = [
        (&paths.quantized, &encoded.quantized),
        (&paths.quantized_shapes, &encoded.quantized_overlay),
        (&paths.tactile, &encoded.original_overlay),
    ];
    for (path, bytes) in files {
        std::fs::write(path, bytes)
            .map_err(|e| TactileError::Io(format!("{}: {}", path.display(), e)))?;
        tracing::info!(path = %path.display(), bytes = bytes.len(), "wrote output");
    }
    Ok(())
}

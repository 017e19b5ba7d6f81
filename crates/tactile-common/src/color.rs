//! Color values used for shape outlines.

use serde::{Deserialize, Serialize};

/// Color value in RGBA format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }

    pub fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Stroke color choice for shape outlines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutlineColor {
    #[default]
    Black,
    White,
}

impl OutlineColor {
    /// Outline color with the given stroke alpha.
    pub fn with_alpha(self, alpha: u8) -> Color {
        match self {
            OutlineColor::Black => Color::new(0, 0, 0, alpha),
            OutlineColor::White => Color::new(255, 255, 255, alpha),
        }
    }

    /// Case-insensitive parse; accepts the English and Portuguese names.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "black" | "preto" => Some(OutlineColor::Black),
            "white" | "branco" => Some(OutlineColor::White),
            _ => None,
        }
    }
}

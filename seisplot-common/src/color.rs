//! Display colors for stations and map features.
//!
//! Colors are written in configuration files either as matplotlib single-letter
//! codes (`"r"`, `"k"`), a small set of CSS names (`"lightgray"`) or `#rrggbb`.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// An opaque RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    /// Create a color from its components.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a color specification.
    pub fn parse(spec: &str) -> Result<Self> {
        let spec = spec.trim();
        if let Some(hex) = spec.strip_prefix('#') {
            return Self::parse_hex(hex)
                .ok_or_else(|| Error::Config(format!("Invalid hex color '{}'", spec)));
        }

        let color = match spec.to_ascii_lowercase().as_str() {
            // matplotlib base colors
            "r" | "red" => Color::rgb(255, 0, 0),
            "g" => Color::rgb(0, 128, 0),
            "green" => Color::rgb(0, 128, 0),
            "b" | "blue" => Color::rgb(0, 0, 255),
            "c" | "cyan" => Color::rgb(0, 191, 191),
            "m" | "magenta" => Color::rgb(191, 0, 191),
            "y" | "yellow" => Color::rgb(191, 191, 0),
            "k" | "black" => Color::BLACK,
            "w" | "white" => Color::WHITE,
            "orange" => Color::rgb(255, 165, 0),
            "purple" => Color::rgb(128, 0, 128),
            "gray" | "grey" => Color::rgb(128, 128, 128),
            "lightgray" | "lightgrey" => Color::rgb(211, 211, 211),
            "darkgray" | "darkgrey" => Color::rgb(169, 169, 169),
            "navy" => Color::rgb(0, 0, 128),
            "lightblue" => Color::rgb(173, 216, 230),
            _ => return Err(Error::Config(format!("Unknown color '{}'", spec))),
        };
        Ok(color)
    }

    fn parse_hex(hex: &str) -> Option<Self> {
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Self::rgb(channel(0)?, channel(2)?, channel(4)?))
    }

    /// Format as `#rrggbb`, suitable for SVG attributes.
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl TryFrom<String> for Color {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Color::parse(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

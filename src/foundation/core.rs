use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::foundation::error::{ScrollError, ScrollResult};

pub use kurbo::{Rect, Vec2};

/// Visible viewport size in CSS pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Viewport width.
    pub width: f64,
    /// Viewport height. Percent edges (`"top 80%"`) resolve against this.
    pub height: f64,
}

impl Viewport {
    /// Create a validated viewport with strictly positive dimensions.
    pub fn new(width: f64, height: f64) -> ScrollResult<Self> {
        if !(width.is_finite() && height.is_finite()) || width <= 0.0 || height <= 0.0 {
            return Err(ScrollError::configuration(
                "Viewport width and height must be finite and > 0",
            ));
        }
        Ok(Self { width, height })
    }

    /// Resolve a fraction of viewport height to pixels.
    pub fn height_fraction(self, fraction: f64) -> f64 {
        self.height * fraction
    }
}

/// Three-component offset used for 3D translation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    /// Horizontal component.
    pub x: f64,
    /// Vertical component.
    pub y: f64,
    /// Depth component.
    pub z: f64,
}

impl Vec3 {
    /// Build a vector from components.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Zero vector.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);
}

/// Straight (non-premultiplied) sRGB color, 8 bits per channel.
///
/// Interpolation is channel-wise linear in this encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Rgba8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Rgba8 {
    /// Build an opaque color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Build a color with explicit alpha.
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Fully transparent black.
    pub const fn transparent() -> Self {
        Self::rgba(0, 0, 0, 0)
    }

    /// Format as `#rrggbbaa`.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
    }
}

impl FromStr for Rgba8 {
    type Err = ScrollError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let s = s.strip_prefix('#').unwrap_or(s);

        fn hex_byte(pair: &str) -> ScrollResult<u8> {
            u8::from_str_radix(pair, 16)
                .map_err(|_| ScrollError::configuration(format!("invalid hex byte \"{pair}\"")))
        }

        if !s.is_ascii() {
            return Err(ScrollError::configuration("hex color must be ASCII"));
        }
        match s.len() {
            6 => Ok(Self::rgb(
                hex_byte(&s[0..2])?,
                hex_byte(&s[2..4])?,
                hex_byte(&s[4..6])?,
            )),
            8 => Ok(Self::rgba(
                hex_byte(&s[0..2])?,
                hex_byte(&s[2..4])?,
                hex_byte(&s[4..6])?,
                hex_byte(&s[6..8])?,
            )),
            _ => Err(ScrollError::configuration(
                "hex color must be #RRGGBB or #RRGGBBAA (case-insensitive)",
            )),
        }
    }
}

impl<'de> Deserialize<'de> for Rgba8 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Hex(String),
            Obj {
                r: u8,
                g: u8,
                b: u8,
                #[serde(default = "opaque")]
                a: u8,
            },
        }

        fn opaque() -> u8 {
            255
        }

        match Repr::deserialize(deserializer)? {
            Repr::Hex(s) => s.parse().map_err(serde::de::Error::custom),
            Repr::Obj { r, g, b, a } => Ok(Self::rgba(r, g, b, a)),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;

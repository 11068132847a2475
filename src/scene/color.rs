use std::fmt;
use std::str::FromStr;

use glam::Vec4;
use serde::{Deserialize, Serialize};

use crate::error::EditorError;

/// 24-bit sRGB color, stored and serialized as `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color(pub [u8; 3]);

impl Color {
    pub const WHITE: Color = Color([0xff, 0xff, 0xff]);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b])
    }

    /// Build from a `0xRRGGBB` literal.
    pub const fn hex(v: u32) -> Self {
        Self([(v >> 16) as u8, (v >> 8) as u8, v as u8])
    }

    /// Linear RGBA for shading.
    pub fn to_linear(self) -> Vec4 {
        let c = |v: u8| {
            let s = v as f32 / 255.0;
            if s <= 0.04045 { s / 12.92 } else { ((s + 0.055) / 1.055).powf(2.4) }
        };
        Vec4::new(c(self.0[0]), c(self.0[1]), c(self.0[2]), 1.0)
    }

    /// Component-wise multiply, used to tint the floor material.
    pub fn tinted(self, tint: Color) -> Color {
        let m = |a: u8, b: u8| ((a as u16 * b as u16 + 127) / 255) as u8;
        Color([m(self.0[0], tint.0[0]), m(self.0[1], tint.0[1]), m(self.0[2], tint.0[2])])
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0[0], self.0[1], self.0[2])
    }
}

impl FromStr for Color {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || EditorError::InvalidColor(s.to_string());
        let digits = s.trim().strip_prefix('#').ok_or_else(err)?;
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(err());
        }
        let value = u32::from_str_radix(digits, 16).map_err(|_| err())?;
        match digits.len() {
            6 => Ok(Color::hex(value)),
            3 => {
                let expand = |n: u32| ((n & 0xf) * 0x11) as u8;
                Ok(Color([expand(value >> 8), expand(value >> 4), expand(value)]))
            }
            _ => Err(err()),
        }
    }
}

impl TryFrom<String> for Color {
    type Error = EditorError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Color> for String {
    fn from(c: Color) -> Self {
        c.to_string()
    }
}

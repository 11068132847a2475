use std::fmt;
use std::str::FromStr;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::EditorError;
use crate::scene::color::Color;

pub const FEET_TO_METERS: f32 = 0.3048;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Unit {
    #[default]
    #[serde(rename = "ft")]
    Feet,
    #[serde(rename = "m")]
    Meters,
}

impl Unit {
    pub fn to_meters(self, value: f32) -> f32 {
        match self {
            Unit::Feet => value * FEET_TO_METERS,
            Unit::Meters => value,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Unit::Feet => "Feet",
            Unit::Meters => "Meters",
        }
    }
}

/// Room size as the user entered it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoomDimensions {
    pub width: f32,
    pub height: f32,
    pub length: f32,
    pub unit: Unit,
}

impl Default for RoomDimensions {
    fn default() -> Self {
        Self { width: 12.0, height: 9.0, length: 12.0, unit: Unit::Feet }
    }
}

impl RoomDimensions {
    pub fn new(width: f32, length: f32, height: f32, unit: Unit) -> Self {
        Self { width, height, length, unit }
    }

    /// Every dimension must be finite and strictly positive.
    pub fn validate(&self) -> Result<(), EditorError> {
        for (field, value) in [("width", self.width), ("length", self.length), ("height", self.height)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(EditorError::InvalidDimension { field, value });
            }
        }
        Ok(())
    }

    /// (width, height, length) in meters.
    pub fn size_meters(&self) -> Vec3 {
        Vec3::new(
            self.unit.to_meters(self.width),
            self.unit.to_meters(self.height),
            self.unit.to_meters(self.length),
        )
    }
}

/// The six fixed room surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SurfaceKey {
    Front,
    Back,
    Left,
    Right,
    Ceiling,
    Floor,
}

impl SurfaceKey {
    pub const ALL: [SurfaceKey; 6] = [
        SurfaceKey::Front,
        SurfaceKey::Back,
        SurfaceKey::Left,
        SurfaceKey::Right,
        SurfaceKey::Ceiling,
        SurfaceKey::Floor,
    ];

    pub const WALLS: [SurfaceKey; 4] = [SurfaceKey::Front, SurfaceKey::Back, SurfaceKey::Left, SurfaceKey::Right];

    pub fn as_str(self) -> &'static str {
        match self {
            SurfaceKey::Front => "front",
            SurfaceKey::Back => "back",
            SurfaceKey::Left => "left",
            SurfaceKey::Right => "right",
            SurfaceKey::Ceiling => "ceiling",
            SurfaceKey::Floor => "floor",
        }
    }

    /// Surfaces reachable through a wall selection. The floor has its own selection kind.
    pub fn is_wall_selectable(self) -> bool {
        self != SurfaceKey::Floor
    }
}

impl fmt::Display for SurfaceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SurfaceKey {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SurfaceKey::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| EditorError::InvalidSurface(s.to_string()))
    }
}

/// Paint per surface. Serializes as an object keyed by surface name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceColors {
    pub front: Color,
    pub back: Color,
    pub left: Color,
    pub right: Color,
    pub ceiling: Color,
    #[serde(default = "default_floor_tint")]
    pub floor: Color,
}

fn default_floor_tint() -> Color {
    Color::WHITE
}

impl Default for SurfaceColors {
    fn default() -> Self {
        let wall = Color::hex(0xf3f4f6);
        Self {
            front: wall,
            back: wall,
            left: wall,
            right: wall,
            ceiling: Color::WHITE,
            floor: default_floor_tint(),
        }
    }
}

impl SurfaceColors {
    pub fn get(&self, key: SurfaceKey) -> Color {
        match key {
            SurfaceKey::Front => self.front,
            SurfaceKey::Back => self.back,
            SurfaceKey::Left => self.left,
            SurfaceKey::Right => self.right,
            SurfaceKey::Ceiling => self.ceiling,
            SurfaceKey::Floor => self.floor,
        }
    }

    pub fn set(&mut self, key: SurfaceKey, color: Color) {
        let slot = match key {
            SurfaceKey::Front => &mut self.front,
            SurfaceKey::Back => &mut self.back,
            SurfaceKey::Left => &mut self.left,
            SurfaceKey::Right => &mut self.right,
            SurfaceKey::Ceiling => &mut self.ceiling,
            SurfaceKey::Floor => &mut self.floor,
        };
        *slot = color;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FloorMaterial {
    #[default]
    Wood,
    Tile,
    Carpet,
    Marble,
}

impl FloorMaterial {
    pub const ALL: [FloorMaterial; 4] = [FloorMaterial::Wood, FloorMaterial::Tile, FloorMaterial::Carpet, FloorMaterial::Marble];

    pub fn next(self) -> FloorMaterial {
        match self {
            FloorMaterial::Wood => FloorMaterial::Tile,
            FloorMaterial::Tile => FloorMaterial::Carpet,
            FloorMaterial::Carpet => FloorMaterial::Marble,
            FloorMaterial::Marble => FloorMaterial::Wood,
        }
    }

    pub fn base_color(self) -> Color {
        match self {
            FloorMaterial::Wood => Color::hex(0xd4a373),
            FloorMaterial::Tile => Color::hex(0xe5e5e5),
            FloorMaterial::Carpet => Color::hex(0x8d99ae),
            FloorMaterial::Marble => Color::hex(0xf5f5f5),
        }
    }

    /// Specular strength for the viewport shader.
    pub fn gloss(self) -> f32 {
        match self {
            FloorMaterial::Marble => 0.8,
            FloorMaterial::Tile => 0.4,
            FloorMaterial::Wood => 0.2,
            FloorMaterial::Carpet => 0.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FloorMaterial::Wood => "wood",
            FloorMaterial::Tile => "tile",
            FloorMaterial::Carpet => "carpet",
            FloorMaterial::Marble => "marble",
        }
    }
}

/// Geometric envelope of the room and its finishes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomShell {
    pub dimensions: RoomDimensions,
    pub wall_colors: SurfaceColors,
    pub floor_material: FloorMaterial,
}

impl RoomShell {
    /// Canonical finishes for a freshly built room. Dimensions must already be validated.
    pub fn with_dimensions(dimensions: RoomDimensions) -> Self {
        Self {
            dimensions,
            wall_colors: SurfaceColors::default(),
            floor_material: FloorMaterial::default(),
        }
    }

    pub fn size_meters(&self) -> Vec3 {
        self.dimensions.size_meters()
    }

    /// Resolved color of a surface as drawn in the viewport.
    pub fn surface_color(&self, key: SurfaceKey) -> Color {
        match key {
            SurfaceKey::Floor => self.floor_material.base_color().tinted(self.wall_colors.floor),
            other => self.wall_colors.get(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feet_convert_to_meters() {
        let dims = RoomDimensions::new(10.0, 20.0, 5.0, Unit::Feet);
        let m = dims.size_meters();
        assert!((m.x - 3.048).abs() < 1e-4);
        assert!((m.z - 6.096).abs() < 1e-4);
        assert!((m.y - 1.524).abs() < 1e-4);
    }

    #[test]
    fn validate_rejects_non_positive_and_nan() {
        let bad = RoomDimensions::new(0.0, 10.0, 9.0, Unit::Feet);
        assert_eq!(bad.validate(), Err(EditorError::InvalidDimension { field: "width", value: 0.0 }));
        let negative = RoomDimensions::new(12.0, 10.0, -1.0, Unit::Meters);
        assert!(matches!(negative.validate(), Err(EditorError::InvalidDimension { field: "height", .. })));
        let nan = RoomDimensions::new(12.0, f32::NAN, 9.0, Unit::Meters);
        assert!(nan.validate().is_err());
        assert!(RoomDimensions::default().validate().is_ok());
    }

    #[test]
    fn surface_keys_parse_exactly() {
        for key in SurfaceKey::ALL {
            assert_eq!(key.as_str().parse::<SurfaceKey>().unwrap(), key);
        }
        assert_eq!("roof".parse::<SurfaceKey>(), Err(EditorError::InvalidSurface("roof".into())));
    }

    #[test]
    fn floor_material_cycle_visits_all() {
        let mut m = FloorMaterial::Wood;
        let mut seen = Vec::new();
        for _ in 0..4 {
            seen.push(m);
            m = m.next();
        }
        assert_eq!(m, FloorMaterial::Wood);
        assert_eq!(seen, FloorMaterial::ALL);
    }

    #[test]
    fn default_shell_finishes() {
        let shell = RoomShell::with_dimensions(RoomDimensions::default());
        assert_eq!(shell.wall_colors.get(SurfaceKey::Front), Color::hex(0xf3f4f6));
        assert_eq!(shell.wall_colors.get(SurfaceKey::Ceiling), Color::WHITE);
        assert_eq!(shell.floor_material, FloorMaterial::Wood);
        assert_eq!(shell.surface_color(SurfaceKey::Floor), FloorMaterial::Wood.base_color());
    }
}

use std::fmt;
use std::str::FromStr;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::context::Plan;
use crate::error::EditorError;
use crate::scene::color::Color;

/// Furniture category. Each one has its own procedural shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Archetype {
    Sofa,
    Table,
    Chair,
    Bed,
    Lamp,
    #[serde(alias = "shelf")]
    Storage,
    Rug,
    Decor,
}

impl Archetype {
    pub fn as_str(self) -> &'static str {
        match self {
            Archetype::Sofa => "sofa",
            Archetype::Table => "table",
            Archetype::Chair => "chair",
            Archetype::Bed => "bed",
            Archetype::Lamp => "lamp",
            Archetype::Storage => "storage",
            Archetype::Rug => "rug",
            Archetype::Decor => "decor",
        }
    }

    /// Catalog entry for this archetype.
    pub fn info(self) -> &'static ArchetypeInfo {
        CATALOG
            .iter()
            .find(|entry| entry.archetype == self)
            .unwrap_or(&CATALOG[0])
    }
}

impl fmt::Display for Archetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Archetype {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sofa" => Ok(Archetype::Sofa),
            "table" => Ok(Archetype::Table),
            "chair" => Ok(Archetype::Chair),
            "bed" => Ok(Archetype::Bed),
            "lamp" => Ok(Archetype::Lamp),
            "storage" | "shelf" => Ok(Archetype::Storage),
            "rug" => Ok(Archetype::Rug),
            "decor" => Ok(Archetype::Decor),
            _ => Err(EditorError::UnknownArchetype(s.to_string())),
        }
    }
}

/// Defaults copied into every new instance of an archetype.
#[derive(Debug, Clone, Copy)]
pub struct ArchetypeInfo {
    pub archetype: Archetype,
    pub display_name: &'static str,
    /// Width, height, depth in meters.
    pub default_dimensions: Vec3,
    pub default_color: Color,
    /// Lowest plan that may place this archetype.
    pub tier: Plan,
}

pub const CATALOG: &[ArchetypeInfo] = &[
    ArchetypeInfo {
        archetype: Archetype::Sofa,
        display_name: "Modern Sofa",
        default_dimensions: Vec3::new(2.2, 0.8, 0.9),
        default_color: Color::hex(0x334155),
        tier: Plan::Free,
    },
    ArchetypeInfo {
        archetype: Archetype::Table,
        display_name: "Coffee Table",
        default_dimensions: Vec3::new(1.2, 0.4, 0.6),
        default_color: Color::hex(0x854d0e),
        tier: Plan::Free,
    },
    ArchetypeInfo {
        archetype: Archetype::Chair,
        display_name: "Accent Chair",
        default_dimensions: Vec3::new(0.8, 0.9, 0.8),
        default_color: Color::hex(0x475569),
        tier: Plan::Free,
    },
    ArchetypeInfo {
        archetype: Archetype::Bed,
        display_name: "Queen Bed",
        default_dimensions: Vec3::new(1.6, 1.0, 2.0),
        default_color: Color::hex(0xcbd5e1),
        tier: Plan::Free,
    },
    ArchetypeInfo {
        archetype: Archetype::Lamp,
        display_name: "Floor Lamp",
        default_dimensions: Vec3::new(0.4, 1.6, 0.4),
        default_color: Color::hex(0xf59e0b),
        tier: Plan::Free,
    },
    ArchetypeInfo {
        archetype: Archetype::Storage,
        display_name: "Cabinet",
        default_dimensions: Vec3::new(1.0, 1.8, 0.4),
        default_color: Color::hex(0x475569),
        tier: Plan::Free,
    },
    ArchetypeInfo {
        archetype: Archetype::Rug,
        display_name: "Area Rug",
        default_dimensions: Vec3::new(3.0, 0.02, 2.0),
        default_color: Color::hex(0xe2e8f0),
        tier: Plan::Free,
    },
    ArchetypeInfo {
        archetype: Archetype::Decor,
        display_name: "Decor Sphere",
        default_dimensions: Vec3::new(0.3, 0.3, 0.3),
        default_color: Color::hex(0xec4899),
        tier: Plan::Free,
    },
];

/// Swatches offered by the property panel for furniture.
pub const FURNITURE_SWATCHES: &[Color] = &[
    Color::hex(0x334155),
    Color::hex(0x475569),
    Color::hex(0x854d0e),
    Color::hex(0xf59e0b),
    Color::hex(0xef4444),
    Color::hex(0x22c55e),
    Color::hex(0x3b82f6),
];

/// Swatches offered by the property panel for wall paint.
pub const WALL_SWATCHES: &[Color] = &[
    Color::hex(0xf3f4f6),
    Color::hex(0xffffff),
    Color::hex(0xe2e8f0),
    Color::hex(0xcbd5e1),
    Color::hex(0x94a3b8),
    Color::hex(0xbfdbfe),
    Color::hex(0xbbf7d0),
    Color::hex(0xfecaca),
    Color::hex(0xddd6fe),
];

/// All placeable archetypes in catalog order.
pub fn list_archetypes() -> impl Iterator<Item = &'static ArchetypeInfo> {
    CATALOG.iter()
}

/// Look up an archetype by its type name.
pub fn lookup(type_name: &str) -> Result<&'static ArchetypeInfo, EditorError> {
    let archetype: Archetype = type_name.parse()?;
    Ok(archetype.info())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_covers_every_archetype_once() {
        let all = [
            Archetype::Sofa,
            Archetype::Table,
            Archetype::Chair,
            Archetype::Bed,
            Archetype::Lamp,
            Archetype::Storage,
            Archetype::Rug,
            Archetype::Decor,
        ];
        assert_eq!(list_archetypes().count(), all.len());
        for a in all {
            assert_eq!(list_archetypes().filter(|e| e.archetype == a).count(), 1);
            assert_eq!(a.info().archetype, a);
        }
    }

    #[test]
    fn listing_is_restartable() {
        let first: Vec<_> = list_archetypes().map(|e| e.archetype).collect();
        let second: Vec<_> = list_archetypes().map(|e| e.archetype).collect();
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }

    #[test]
    fn lookup_accepts_aliases_and_case() {
        assert_eq!(lookup("SOFA").unwrap().archetype, Archetype::Sofa);
        assert_eq!(lookup("shelf").unwrap().archetype, Archetype::Storage);
        assert_eq!(
            lookup("piano").unwrap_err(),
            EditorError::UnknownArchetype("piano".into())
        );
    }

    #[test]
    fn default_dimensions_are_positive() {
        for entry in list_archetypes() {
            assert!(entry.default_dimensions.min_element() > 0.0, "{}", entry.archetype);
        }
    }
}

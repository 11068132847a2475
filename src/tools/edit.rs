use std::fmt;
use std::str::FromStr;

use crate::error::EditorError;
use crate::scene::room::SurfaceKey;
use crate::scene::{InstanceId, Scene};

/// What the property panel and gizmo are currently bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    None,
    Furniture(InstanceId),
    /// Any room surface except the floor.
    Wall(SurfaceKey),
    Floor,
}

/// Kind tag accompanying a raw selection request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Furniture,
    Wall,
    Floor,
}

impl FromStr for TargetKind {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "furniture" => Ok(TargetKind::Furniture),
            "wall" => Ok(TargetKind::Wall),
            "floor" => Ok(TargetKind::Floor),
            other => Err(EditorError::InvalidTarget(other.to_string())),
        }
    }
}

impl Selection {
    /// Resolve an untyped `(target_id, kind)` pair against the scene.
    ///
    /// Floor selections ignore the id. Wall ids must be a wall-selectable surface key
    /// and furniture ids must name an instance in the scene.
    pub fn from_raw(target_id: &str, kind: TargetKind, scene: &Scene) -> Result<Selection, EditorError> {
        match kind {
            TargetKind::Floor => Ok(Selection::Floor),
            TargetKind::Wall => {
                let key: SurfaceKey = target_id.parse()?;
                if !key.is_wall_selectable() {
                    return Err(EditorError::InvalidSurface(target_id.to_string()));
                }
                Ok(Selection::Wall(key))
            }
            TargetKind::Furniture => {
                let id: InstanceId = target_id
                    .parse()
                    .map_err(|_| EditorError::InvalidTarget(target_id.to_string()))?;
                if scene.contains(id) {
                    Ok(Selection::Furniture(id))
                } else {
                    Err(EditorError::NotFound(id))
                }
            }
        }
    }

    pub fn furniture(self) -> Option<InstanceId> {
        match self {
            Selection::Furniture(id) => Some(id),
            _ => None,
        }
    }

    pub fn is_none(self) -> bool {
        self == Selection::None
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::None => f.write_str("nothing"),
            Selection::Furniture(id) => write!(f, "furniture {}", id.short()),
            Selection::Wall(key) => write!(f, "{key} wall"),
            Selection::Floor => f.write_str("floor"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::catalog::Archetype;
    use crate::scene::room::{RoomDimensions, RoomShell};
    use crate::scene::FurnitureInstance;

    fn scene() -> Scene {
        let mut scene = Scene::new(RoomShell::with_dimensions(RoomDimensions::default()));
        scene.push(FurnitureInstance::from_catalog(Archetype::Bed.info()));
        scene
    }

    #[test]
    fn raw_wall_keys() {
        let scene = scene();
        assert_eq!(Selection::from_raw("left", TargetKind::Wall, &scene), Ok(Selection::Wall(SurfaceKey::Left)));
        assert_eq!(Selection::from_raw("ceiling", TargetKind::Wall, &scene), Ok(Selection::Wall(SurfaceKey::Ceiling)));
        assert_eq!(
            Selection::from_raw("floor", TargetKind::Wall, &scene),
            Err(EditorError::InvalidSurface("floor".into()))
        );
        assert!(Selection::from_raw("attic", TargetKind::Wall, &scene).is_err());
    }

    #[test]
    fn raw_floor_ignores_id() {
        let scene = scene();
        assert_eq!(Selection::from_raw("anything", TargetKind::Floor, &scene), Ok(Selection::Floor));
    }

    #[test]
    fn raw_furniture_must_exist() {
        let scene = scene();
        let id = scene.instances[0].id;
        assert_eq!(
            Selection::from_raw(&id.to_string(), TargetKind::Furniture, &scene),
            Ok(Selection::Furniture(id))
        );
        let ghost = InstanceId::new();
        assert_eq!(
            Selection::from_raw(&ghost.to_string(), TargetKind::Furniture, &scene),
            Err(EditorError::NotFound(ghost))
        );
    }

    #[test]
    fn kind_parses() {
        assert_eq!("wall".parse::<TargetKind>(), Ok(TargetKind::Wall));
        assert_eq!("door".parse::<TargetKind>(), Err(EditorError::InvalidTarget("door".into())));
    }
}

use std::collections::HashMap;

use glam::Vec3;

use crate::geometry::mesh::{bounds, Face};
use crate::geometry::room::{build_room_surfaces, RoomGeometry};
use crate::geometry::shape::{build_furniture_shape, PointLight};
use crate::scene::catalog::Archetype;
use crate::scene::color::Color;
use crate::scene::room::RoomShell;
use crate::scene::{InstanceId, Scene};

/// The inputs a furniture shape depends on. Placement is deliberately absent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeKey {
    pub archetype: Archetype,
    pub dimensions: Vec3,
    pub color: Color,
}

/// Tessellated shape of one instance, in instance space.
#[derive(Debug, Clone)]
pub struct CachedShape {
    pub key: ShapeKey,
    pub faces: Vec<Face>,
    pub lights: Vec<PointLight>,
    pub bounds: (Vec3, Vec3),
    /// Bumped on every rebuild so GPU-side copies can tell they are stale.
    pub generation: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncReport {
    pub rebuilt: Vec<InstanceId>,
    pub removed: Vec<InstanceId>,
    pub room_rebuilt: bool,
}

impl SyncReport {
    pub fn is_empty(&self) -> bool {
        self.rebuilt.is_empty() && self.removed.is_empty() && !self.room_rebuilt
    }
}

struct CachedRoom {
    shell: RoomShell,
    show_grid: bool,
    geometry: RoomGeometry,
    generation: u64,
}

/// Per-instance tessellation cache plus the room geometry.
#[derive(Default)]
pub struct ShapeCache {
    shapes: HashMap<InstanceId, CachedShape>,
    room: Option<CachedRoom>,
    next_generation: u64,
}

impl ShapeCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn bump(&mut self) -> u64 {
        self.next_generation += 1;
        self.next_generation
    }

    /// Bring the cache in line with `scene`. Only entries whose key changed are rebuilt.
    pub fn sync(&mut self, scene: &Scene, show_grid: bool) -> SyncReport {
        let mut report = SyncReport::default();

        let stale: Vec<InstanceId> = self
            .shapes
            .keys()
            .filter(|id| !scene.contains(**id))
            .copied()
            .collect();
        for id in stale {
            self.shapes.remove(&id);
            report.removed.push(id);
        }

        for inst in &scene.instances {
            let key = ShapeKey {
                archetype: inst.archetype,
                dimensions: inst.dimensions,
                color: inst.color,
            };
            if self.shapes.get(&inst.id).is_some_and(|c| c.key == key) {
                continue;
            }
            let shape = build_furniture_shape(key.archetype, key.dimensions, key.color);
            let faces = shape.tessellate();
            let generation = self.bump();
            self.shapes.insert(
                inst.id,
                CachedShape {
                    key,
                    bounds: bounds(&faces).unwrap_or((Vec3::ZERO, Vec3::ZERO)),
                    faces,
                    lights: shape.lights,
                    generation,
                },
            );
            report.rebuilt.push(inst.id);
        }

        let room_fresh = self
            .room
            .as_ref()
            .is_some_and(|r| r.shell == scene.room && r.show_grid == show_grid);
        if !room_fresh {
            let generation = self.bump();
            self.room = Some(CachedRoom {
                shell: scene.room.clone(),
                show_grid,
                geometry: build_room_surfaces(&scene.room, show_grid),
                generation,
            });
            report.room_rebuilt = true;
        }

        if !report.is_empty() {
            log::debug!(
                "shape cache: {} rebuilt, {} removed, room {}",
                report.rebuilt.len(),
                report.removed.len(),
                if report.room_rebuilt { "rebuilt" } else { "kept" },
            );
        }
        report
    }

    pub fn get(&self, id: InstanceId) -> Option<&CachedShape> {
        self.shapes.get(&id)
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn room(&self) -> Option<&RoomGeometry> {
        self.room.as_ref().map(|r| &r.geometry)
    }

    pub fn room_generation(&self) -> u64 {
        self.room.as_ref().map_or(0, |r| r.generation)
    }

    pub fn clear(&mut self) {
        self.shapes.clear();
        self.room = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::room::{RoomDimensions, SurfaceKey};
    use crate::scene::{FurnitureInstance, InstancePatch};

    fn scene() -> Scene {
        let mut scene = Scene::new(RoomShell::with_dimensions(RoomDimensions::default()));
        scene.push(FurnitureInstance::from_catalog(Archetype::Sofa.info()));
        scene.push(FurnitureInstance::from_catalog(Archetype::Lamp.info()));
        scene
    }

    #[test]
    fn first_sync_builds_everything() {
        let scene = scene();
        let mut cache = ShapeCache::new();
        let report = cache.sync(&scene, true);
        assert_eq!(report.rebuilt.len(), 2);
        assert!(report.room_rebuilt);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(scene.instances[1].id).unwrap().lights.len(), 1);
    }

    #[test]
    fn transform_change_does_not_rebuild() {
        let mut scene = scene();
        let mut cache = ShapeCache::new();
        cache.sync(&scene, true);
        let id = scene.instances[0].id;
        let generation = cache.get(id).unwrap().generation;

        scene.get_mut(id).unwrap().apply(
            &InstancePatch::default()
                .position(Vec3::new(1.0, 0.0, 2.0))
                .rotation(Vec3::new(0.0, 1.0, 0.0))
                .scale(Vec3::splat(2.0)),
        );
        let report = cache.sync(&scene, true);
        assert!(report.is_empty());
        assert_eq!(cache.get(id).unwrap().generation, generation);
    }

    #[test]
    fn color_change_rebuilds_only_that_entry() {
        let mut scene = scene();
        let mut cache = ShapeCache::new();
        cache.sync(&scene, true);
        let id = scene.instances[0].id;
        scene.get_mut(id).unwrap().color = Color::hex(0xef4444);
        let report = cache.sync(&scene, true);
        assert_eq!(report.rebuilt, vec![id]);
        assert!(!report.room_rebuilt);
    }

    #[test]
    fn deleted_ids_are_dropped() {
        let mut scene = scene();
        let mut cache = ShapeCache::new();
        cache.sync(&scene, true);
        let id = scene.instances[0].id;
        scene.remove(id);
        let report = cache.sync(&scene, true);
        assert_eq!(report.removed, vec![id]);
        assert!(cache.get(id).is_none());
    }

    #[test]
    fn room_rebuilds_on_paint_and_grid_toggle() {
        let mut scene = scene();
        let mut cache = ShapeCache::new();
        cache.sync(&scene, true);
        let before = cache.room_generation();

        scene.room.wall_colors.set(SurfaceKey::Left, Color::hex(0xbfdbfe));
        assert!(cache.sync(&scene, true).room_rebuilt);
        assert!(cache.sync(&scene, false).room_rebuilt);
        assert!(!cache.sync(&scene, false).room_rebuilt);
        assert!(cache.room_generation() > before);
        assert!(cache.room().unwrap().grid.is_empty());
    }
}

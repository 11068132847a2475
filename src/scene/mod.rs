pub mod catalog;
pub mod color;
mod instance;
pub mod room;

pub use instance::{clamp_scale, FurnitureInstance, InstanceId, InstancePatch, Placement, MIN_SCALE};
use glam::Vec3;
use serde::{Serialize, Deserialize};
use room::RoomShell;

/// Offset applied to a duplicated instance so it does not overlap its source.
pub const DUPLICATE_OFFSET: Vec3 = Vec3::new(0.5, 0.0, 0.5);

/// The room and everything placed in it. Instances keep insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub room: RoomShell,
    pub instances: Vec<FurnitureInstance>,
}

impl Scene {
    pub fn new(room: RoomShell) -> Self {
        Self {
            room,
            instances: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn index_of(&self, id: InstanceId) -> Option<usize> {
        self.instances.iter().position(|i| i.id == id)
    }

    pub fn get(&self, id: InstanceId) -> Option<&FurnitureInstance> {
        self.instances.iter().find(|i| i.id == id)
    }

    pub fn get_mut(&mut self, id: InstanceId) -> Option<&mut FurnitureInstance> {
        self.instances.iter_mut().find(|i| i.id == id)
    }

    pub fn contains(&self, id: InstanceId) -> bool {
        self.index_of(id).is_some()
    }

    pub fn push(&mut self, instance: FurnitureInstance) {
        self.instances.push(instance);
    }

    /// Insert at `index`, or append if the scene has shrunk below it.
    pub fn insert_at(&mut self, index: usize, instance: FurnitureInstance) {
        let index = index.min(self.instances.len());
        self.instances.insert(index, instance);
    }

    /// Remove by id, returning the instance and the slot it occupied.
    pub fn remove(&mut self, id: InstanceId) -> Option<(usize, FurnitureInstance)> {
        let index = self.index_of(id)?;
        Some((index, self.instances.remove(index)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::catalog::Archetype;
    use crate::scene::room::RoomDimensions;

    fn scene_with(n: usize) -> Scene {
        let mut scene = Scene::new(RoomShell::with_dimensions(RoomDimensions::default()));
        for _ in 0..n {
            scene.push(FurnitureInstance::from_catalog(Archetype::Chair.info()));
        }
        scene
    }

    #[test]
    fn remove_reports_slot() {
        let mut scene = scene_with(3);
        let middle = scene.instances[1].id;
        let (index, removed) = scene.remove(middle).unwrap();
        assert_eq!(index, 1);
        assert_eq!(removed.id, middle);
        assert_eq!(scene.len(), 2);
        assert!(scene.remove(middle).is_none());
    }

    #[test]
    fn insert_at_restores_order() {
        let mut scene = scene_with(3);
        let order: Vec<_> = scene.instances.iter().map(|i| i.id).collect();
        let (index, removed) = scene.remove(order[0]).unwrap();
        scene.insert_at(index, removed);
        let after: Vec<_> = scene.instances.iter().map(|i| i.id).collect();
        assert_eq!(order, after);
    }

    #[test]
    fn insert_past_end_appends() {
        let mut scene = scene_with(1);
        let extra = FurnitureInstance::from_catalog(Archetype::Lamp.info());
        let id = extra.id;
        scene.insert_at(10, extra);
        assert_eq!(scene.index_of(id), Some(1));
    }
}

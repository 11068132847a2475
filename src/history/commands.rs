use crate::history::Command;
use crate::scene::color::Color;
use crate::scene::room::{FloorMaterial, SurfaceKey};
use crate::scene::{FurnitureInstance, InstanceId, InstancePatch, Scene};

/// Append an instance (undo removes it again).
pub struct AddInstance {
    pub instance: FurnitureInstance,
    pub description: String,
}

impl AddInstance {
    pub fn new(instance: FurnitureInstance, verb: &str) -> Self {
        let description = format!("{verb} {}", instance.name);
        Self { instance, description }
    }
}

impl Command for AddInstance {
    fn apply(&mut self, scene: &mut Scene) {
        if !scene.contains(self.instance.id) {
            scene.push(self.instance.clone());
        }
    }

    fn undo(&mut self, scene: &mut Scene) {
        if let Some((_, removed)) = scene.remove(self.instance.id) {
            // Keep any edits made after the add so redo brings them back.
            self.instance = removed;
        }
    }

    fn description(&self) -> &str {
        &self.description
    }
}

/// Remove an instance; undo restores it with the same id at the same index.
pub struct RemoveInstance {
    pub id: InstanceId,
    removed: Option<(usize, FurnitureInstance)>,
}

impl RemoveInstance {
    pub fn new(id: InstanceId) -> Self {
        Self { id, removed: None }
    }
}

impl Command for RemoveInstance {
    fn apply(&mut self, scene: &mut Scene) {
        if let Some(slot) = scene.remove(self.id) {
            self.removed = Some(slot);
        }
    }

    fn undo(&mut self, scene: &mut Scene) {
        if let Some((index, instance)) = self.removed.take() {
            scene.insert_at(index, instance);
        }
    }

    fn description(&self) -> &str {
        "Delete"
    }
}

/// Patch an instance. `old` must restore every field `new` touches.
pub struct UpdateInstance {
    pub id: InstanceId,
    pub old: InstancePatch,
    pub new: InstancePatch,
    pub description: &'static str,
}

impl UpdateInstance {
    pub fn new(current: &FurnitureInstance, new: InstancePatch, description: &'static str) -> Self {
        Self {
            id: current.id,
            old: InstancePatch::snapshot(current),
            new,
            description,
        }
    }
}

impl Command for UpdateInstance {
    fn apply(&mut self, scene: &mut Scene) {
        if let Some(inst) = scene.get_mut(self.id) {
            inst.apply(&self.new);
        }
    }

    fn undo(&mut self, scene: &mut Scene) {
        if let Some(inst) = scene.get_mut(self.id) {
            inst.apply(&self.old);
        }
    }

    fn description(&self) -> &str {
        self.description
    }
}

pub struct SetWallColor {
    pub key: SurfaceKey,
    pub old: Color,
    pub new: Color,
}

impl Command for SetWallColor {
    fn apply(&mut self, scene: &mut Scene) {
        scene.room.wall_colors.set(self.key, self.new);
    }

    fn undo(&mut self, scene: &mut Scene) {
        scene.room.wall_colors.set(self.key, self.old);
    }

    fn description(&self) -> &str {
        "Paint Surface"
    }
}

pub struct SetFloorMaterial {
    pub old: FloorMaterial,
    pub new: FloorMaterial,
}

impl Command for SetFloorMaterial {
    fn apply(&mut self, scene: &mut Scene) {
        scene.room.floor_material = self.new;
    }

    fn undo(&mut self, scene: &mut Scene) {
        scene.room.floor_material = self.old;
    }

    fn description(&self) -> &str {
        "Change Floor"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::catalog::Archetype;
    use crate::scene::room::{RoomDimensions, RoomShell};
    use glam::Vec3;

    fn scene_with(n: usize) -> Scene {
        let mut scene = Scene::new(RoomShell::with_dimensions(RoomDimensions::default()));
        for _ in 0..n {
            scene.push(FurnitureInstance::from_catalog(Archetype::Table.info()));
        }
        scene
    }

    #[test]
    fn remove_undo_restores_slot_and_id() {
        let mut scene = scene_with(3);
        let id = scene.instances[1].id;
        let mut cmd = RemoveInstance::new(id);
        cmd.apply(&mut scene);
        assert!(!scene.contains(id));
        cmd.undo(&mut scene);
        assert_eq!(scene.index_of(id), Some(1));
    }

    #[test]
    fn update_undo_restores_all_fields() {
        let mut scene = scene_with(1);
        let before = scene.instances[0].clone();
        let patch = InstancePatch::default().position(Vec3::new(2.0, 0.0, 1.0)).locked(true);
        let mut cmd = UpdateInstance::new(&before, patch, "Move");
        cmd.apply(&mut scene);
        assert!(scene.instances[0].locked);
        cmd.undo(&mut scene);
        assert_eq!(scene.instances[0], before);
    }

    #[test]
    fn add_undo_redo_keeps_id() {
        let mut scene = scene_with(0);
        let inst = FurnitureInstance::from_catalog(Archetype::Rug.info());
        let id = inst.id;
        let mut cmd = AddInstance::new(inst, "Add");
        assert_eq!(cmd.description(), "Add Area Rug");
        cmd.apply(&mut scene);
        cmd.undo(&mut scene);
        assert!(scene.is_empty());
        cmd.apply(&mut scene);
        assert_eq!(scene.instances[0].id, id);
    }
}

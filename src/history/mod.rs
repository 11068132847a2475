pub mod commands;

use crate::scene::Scene;

/// Undo/redo history using the command pattern.
pub struct History {
    undo_stack: Vec<Box<dyn Command>>,
    redo_stack: Vec<Box<dyn Command>>,
    max_depth: usize,
    /// Set to true on push/undo/redo, cleared by `mark_saved()`.
    pub dirty: bool,
}

/// A reversible scene mutation. GPU data follows from the shape cache, so
/// commands only touch the scene itself.
pub trait Command {
    fn apply(&mut self, scene: &mut Scene);
    fn undo(&mut self, scene: &mut Scene);
    fn description(&self) -> &str;
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

impl History {
    pub const DEFAULT_DEPTH: usize = 100;

    pub fn new() -> Self {
        Self::with_depth(Self::DEFAULT_DEPTH)
    }

    pub fn with_depth(max_depth: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_depth: max_depth.max(1),
            dirty: false,
        }
    }

    pub fn push(&mut self, mut cmd: Box<dyn Command>, scene: &mut Scene) {
        cmd.apply(scene);
        log::debug!("applied: {}", cmd.description());
        self.undo_stack.push(cmd);
        self.redo_stack.clear();
        if self.undo_stack.len() > self.max_depth {
            self.undo_stack.remove(0);
        }
        self.dirty = true;
    }

    /// Returns the description of the undone command.
    pub fn undo(&mut self, scene: &mut Scene) -> Option<String> {
        let mut cmd = self.undo_stack.pop()?;
        cmd.undo(scene);
        let desc = cmd.description().to_string();
        self.redo_stack.push(cmd);
        self.dirty = true;
        Some(desc)
    }

    /// Returns the description of the redone command.
    pub fn redo(&mut self, scene: &mut Scene) -> Option<String> {
        let mut cmd = self.redo_stack.pop()?;
        cmd.apply(scene);
        let desc = cmd.description().to_string();
        self.undo_stack.push(cmd);
        self.dirty = true;
        Some(desc)
    }

    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.dirty = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::commands::SetFloorMaterial;
    use crate::scene::room::{FloorMaterial, RoomDimensions, RoomShell};

    fn scene() -> Scene {
        Scene::new(RoomShell::with_dimensions(RoomDimensions::default()))
    }

    fn set_floor(scene: &Scene, to: FloorMaterial) -> Box<dyn Command> {
        Box::new(SetFloorMaterial { old: scene.room.floor_material, new: to })
    }

    #[test]
    fn push_undo_redo() {
        let mut s = scene();
        let mut h = History::new();
        h.push(set_floor(&s, FloorMaterial::Tile), &mut s);
        assert_eq!(s.room.floor_material, FloorMaterial::Tile);
        assert!(h.dirty);

        assert!(h.undo(&mut s).is_some());
        assert_eq!(s.room.floor_material, FloorMaterial::Wood);
        assert!(h.can_redo());

        h.redo(&mut s);
        assert_eq!(s.room.floor_material, FloorMaterial::Tile);
        assert!(!h.can_redo());
    }

    #[test]
    fn new_push_clears_redo() {
        let mut s = scene();
        let mut h = History::new();
        h.push(set_floor(&s, FloorMaterial::Tile), &mut s);
        h.undo(&mut s);
        h.push(set_floor(&s, FloorMaterial::Marble), &mut s);
        assert_eq!(h.redo_len(), 0);
        assert!(h.redo(&mut s).is_none());
    }

    #[test]
    fn depth_is_bounded() {
        let mut s = scene();
        let mut h = History::with_depth(3);
        for m in [FloorMaterial::Tile, FloorMaterial::Carpet, FloorMaterial::Marble, FloorMaterial::Wood] {
            h.push(set_floor(&s, m), &mut s);
        }
        assert_eq!(h.undo_len(), 3);
        while h.undo(&mut s).is_some() {}
        // The oldest change fell off, so undo stops at Tile.
        assert_eq!(s.room.floor_material, FloorMaterial::Tile);
    }
}

//! The editing session: scene, selection, transform mode and history behind
//! one set of operations. Every successful mutation goes through [`History`].

use std::rc::Rc;

use crate::context::SessionContext;
use crate::error::{EditorError, Result};
use crate::history::commands::{AddInstance, RemoveInstance, SetFloorMaterial, SetWallColor, UpdateInstance};
use crate::history::History;
use crate::scene::catalog;
use crate::scene::color::Color;
use crate::scene::room::{FloorMaterial, RoomShell, SurfaceKey};
use crate::scene::{FurnitureInstance, InstanceId, InstancePatch, Placement, Scene, DUPLICATE_OFFSET};
use crate::tools::edit::{Selection, TargetKind};
use crate::tools::transform::{TransformController, TransformIntent};
use crate::tools::TransformMode;

pub struct EditorSession {
    scene: Scene,
    selection: Selection,
    controller: TransformController,
    history: History,
    context: Rc<dyn SessionContext>,
}

impl EditorSession {
    pub fn new(room: RoomShell, context: Rc<dyn SessionContext>) -> Self {
        Self::from_scene(Scene::new(room), context)
    }

    /// Resume editing a loaded scene. History starts empty.
    pub fn from_scene(scene: Scene, context: Rc<dyn SessionContext>) -> Self {
        Self {
            scene,
            selection: Selection::None,
            controller: TransformController::new(),
            history: History::new(),
            context,
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn selected_instance(&self) -> Option<&FurnitureInstance> {
        self.selection.furniture().and_then(|id| self.scene.get(id))
    }

    pub fn mode(&self) -> TransformMode {
        self.controller.mode()
    }

    pub fn controller(&self) -> &TransformController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut TransformController {
        &mut self.controller
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn mark_saved(&mut self) {
        self.history.mark_saved();
    }

    pub fn context(&self) -> &Rc<dyn SessionContext> {
        &self.context
    }

    /// Swap the host predicates, e.g. after the user signs in. Placed items are kept.
    pub fn set_context(&mut self, context: Rc<dyn SessionContext>) {
        self.context = context;
    }

    // --- instances ---

    /// Place a new catalog item at the room origin and select it.
    pub fn add_instance(&mut self, type_name: &str) -> Result<InstanceId> {
        let info = catalog::lookup(type_name)?;
        if !self.context.allows_archetype(info.archetype) {
            return Err(EditorError::PlanRestricted(info.archetype));
        }
        let instance = FurnitureInstance::from_catalog(info);
        let id = instance.id;
        self.history.push(Box::new(AddInstance::new(instance, "Add")), &mut self.scene);
        log::debug!("added {} ({})", info.display_name, id);
        self.set_selection(Selection::Furniture(id));
        Ok(id)
    }

    /// Merge `patch` into the instance. Empty patches are not recorded.
    pub fn update_instance(&mut self, id: InstanceId, patch: InstancePatch) -> Result<()> {
        let current = self.scene.get(id).ok_or(EditorError::NotFound(id))?;
        let mut preview = current.clone();
        preview.apply(&patch);
        if preview == *current {
            return Ok(());
        }
        let cmd = UpdateInstance::new(current, patch, "Edit Properties");
        self.history.push(Box::new(cmd), &mut self.scene);
        Ok(())
    }

    /// Store a gizmo result. Returns false, without error, for locked instances.
    pub fn commit_transform(&mut self, id: InstanceId, placement: Placement) -> Result<bool> {
        let current = self.scene.get(id).ok_or(EditorError::NotFound(id))?;
        if current.locked {
            log::debug!("ignoring transform commit on locked {id}");
            return Ok(false);
        }
        let cmd = UpdateInstance::new(current, InstancePatch::placement(placement), "Transform");
        self.history.push(Box::new(cmd), &mut self.scene);
        Ok(true)
    }

    /// Copy an instance next to the original and select the copy.
    pub fn duplicate_instance(&mut self, id: InstanceId) -> Result<InstanceId> {
        let source = self.scene.get(id).ok_or(EditorError::NotFound(id))?;
        if source.locked {
            return Err(EditorError::LockedInstance(id));
        }
        let mut copy = source.clone();
        copy.id = InstanceId::new();
        copy.position += DUPLICATE_OFFSET;
        let new_id = copy.id;
        self.history.push(Box::new(AddInstance::new(copy, "Duplicate")), &mut self.scene);
        self.set_selection(Selection::Furniture(new_id));
        Ok(new_id)
    }

    /// Remove an instance. Unknown ids are ignored. Returns whether anything was removed.
    pub fn delete_instance(&mut self, id: InstanceId) -> bool {
        if !self.scene.contains(id) {
            log::warn!("delete of unknown instance {id} ignored");
            return false;
        }
        self.history.push(Box::new(RemoveInstance::new(id)), &mut self.scene);
        self.set_selection(Selection::None);
        true
    }

    pub fn delete_selected(&mut self) -> bool {
        match self.selection.furniture() {
            Some(id) => self.delete_instance(id),
            None => false,
        }
    }

    // --- room ---

    /// Paint a surface by name, e.g. `("left", "#bfdbfe")`.
    pub fn set_wall_color(&mut self, surface: &str, color: &str) -> Result<()> {
        let key: SurfaceKey = surface.parse()?;
        let color: Color = color.parse()?;
        self.paint_surface(key, color);
        Ok(())
    }

    pub fn paint_surface(&mut self, key: SurfaceKey, color: Color) {
        let old = self.scene.room.wall_colors.get(key);
        if old == color {
            return;
        }
        self.history.push(Box::new(SetWallColor { key, old, new: color }), &mut self.scene);
    }

    /// Advance to the next floor material the context allows.
    pub fn cycle_floor_material(&mut self) -> FloorMaterial {
        let current = self.scene.room.floor_material;
        let mut next = current.next();
        while next != current && !self.context.allows_floor_material(next) {
            next = next.next();
        }
        if next != current {
            self.history.push(Box::new(SetFloorMaterial { old: current, new: next }), &mut self.scene);
        }
        next
    }

    /// Returns false if the material is not allowed or already set.
    pub fn set_floor_material(&mut self, material: FloorMaterial) -> bool {
        let current = self.scene.room.floor_material;
        if material == current {
            return false;
        }
        if !self.context.allows_floor_material(material) {
            log::warn!("floor material {} is not available", material.label());
            return false;
        }
        self.history.push(Box::new(SetFloorMaterial { old: current, new: material }), &mut self.scene);
        true
    }

    // --- selection and gizmo ---

    pub fn select(&mut self, selection: Selection) -> Result<()> {
        match selection {
            Selection::Furniture(id) if !self.scene.contains(id) => return Err(EditorError::NotFound(id)),
            Selection::Wall(SurfaceKey::Floor) => return Err(EditorError::InvalidSurface(SurfaceKey::Floor.to_string())),
            _ => {}
        }
        self.set_selection(selection);
        Ok(())
    }

    /// Select from an untyped `(target_id, kind)` pair such as `("left", "wall")`.
    pub fn select_raw(&mut self, target_id: &str, kind: &str) -> Result<()> {
        let kind: TargetKind = kind.parse()?;
        let selection = Selection::from_raw(target_id, kind, &self.scene)?;
        self.set_selection(selection);
        Ok(())
    }

    pub fn deselect(&mut self) {
        self.set_selection(Selection::None);
    }

    fn set_selection(&mut self, selection: Selection) {
        if selection != self.selection {
            self.controller.detach();
            self.selection = selection;
        }
    }

    pub fn set_transform_mode(&mut self, mode: TransformMode) {
        self.controller.set_mode(mode);
    }

    /// React to controller output. Only commits change the scene.
    pub fn apply_intent(&mut self, intent: TransformIntent) -> Result<bool> {
        match intent {
            TransformIntent::Preview { .. } => Ok(false),
            TransformIntent::Commit { id, placement } => self.commit_transform(id, placement),
        }
    }

    // --- history ---

    pub fn undo(&mut self) -> Option<String> {
        self.controller.cancel_drag();
        let desc = self.history.undo(&mut self.scene)?;
        self.drop_stale_selection();
        Some(desc)
    }

    pub fn redo(&mut self) -> Option<String> {
        self.controller.cancel_drag();
        let desc = self.history.redo(&mut self.scene)?;
        self.drop_stale_selection();
        Some(desc)
    }

    fn drop_stale_selection(&mut self) {
        if let Some(id) = self.selection.furniture()
            && !self.scene.contains(id)
        {
            self.set_selection(Selection::None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{LocalSession, Plan};
    use crate::scene::catalog::Archetype;
    use crate::scene::room::{RoomDimensions, Unit};
    use glam::Vec3;

    fn session() -> EditorSession {
        let room = RoomShell::with_dimensions(RoomDimensions::new(12.0, 12.0, 9.0, Unit::Feet));
        EditorSession::new(room, Rc::new(LocalSession::signed_in("tester", Plan::Free)))
    }

    struct Restrictive;

    impl SessionContext for Restrictive {
        fn is_authenticated(&self) -> bool {
            false
        }

        fn allows_archetype(&self, archetype: Archetype) -> bool {
            archetype != Archetype::Bed
        }

        fn allows_floor_material(&self, material: FloorMaterial) -> bool {
            material != FloorMaterial::Tile
        }
    }

    #[test]
    fn add_selects_new_instance() {
        let mut s = session();
        let id = s.add_instance("sofa").unwrap();
        assert_eq!(s.selection(), Selection::Furniture(id));
        let inst = s.scene().get(id).unwrap();
        assert_eq!(inst.position, Vec3::ZERO);
        assert_eq!(inst.scale, Vec3::ONE);
        assert!(!inst.locked);
        assert_eq!(inst.dimensions, Archetype::Sofa.info().default_dimensions);
    }

    #[test]
    fn add_unknown_leaves_scene_alone() {
        let mut s = session();
        assert_eq!(s.add_instance("piano"), Err(EditorError::UnknownArchetype("piano".into())));
        assert!(s.scene().is_empty());
        assert!(!s.history().can_undo());
    }

    #[test]
    fn add_respects_plan() {
        let room = RoomShell::with_dimensions(RoomDimensions::default());
        let mut s = EditorSession::new(room, Rc::new(Restrictive));
        assert_eq!(s.add_instance("bed"), Err(EditorError::PlanRestricted(Archetype::Bed)));
        assert!(s.add_instance("lamp").is_ok());
    }

    #[test]
    fn ids_stay_unique() {
        let mut s = session();
        let a = s.add_instance("chair").unwrap();
        let b = s.duplicate_instance(a).unwrap();
        let c = s.duplicate_instance(b).unwrap();
        assert!(a != b && b != c && a != c);
        assert_eq!(s.scene().len(), 3);
    }

    #[test]
    fn update_merges_and_keeps_order() {
        let mut s = session();
        let a = s.add_instance("table").unwrap();
        let b = s.add_instance("lamp").unwrap();
        s.update_instance(a, InstancePatch::default().color(Color::hex(0xef4444))).unwrap();
        let ids: Vec<_> = s.scene().instances.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![a, b]);
        let inst = s.scene().get(a).unwrap();
        assert_eq!(inst.color, Color::hex(0xef4444));
        assert_eq!(inst.position, Vec3::ZERO);

        let ghost = InstanceId::new();
        assert_eq!(s.update_instance(ghost, InstancePatch::default()), Err(EditorError::NotFound(ghost)));
    }

    #[test]
    fn locked_instances_ignore_commits_and_refuse_duplicates() {
        let mut s = session();
        let id = s.add_instance("bed").unwrap();
        s.update_instance(id, InstancePatch::default().locked(true)).unwrap();
        let before = s.scene().get(id).unwrap().clone();

        let moved = Placement { position: Vec3::new(3.0, 0.0, 1.0), ..before.placement() };
        assert_eq!(s.commit_transform(id, moved), Ok(false));
        assert_eq!(s.scene().get(id), Some(&before));
        assert_eq!(s.duplicate_instance(id), Err(EditorError::LockedInstance(id)));
        assert_eq!(s.scene().len(), 1);
    }

    #[test]
    fn commit_writes_placement() {
        let mut s = session();
        let id = s.add_instance("chair").unwrap();
        let p = Placement { position: Vec3::new(1.0, 0.0, -2.0), rotation: Vec3::new(0.0, 1.2, 0.0), scale: Vec3::new(1.0, 0.0, 2.0) };
        assert_eq!(s.commit_transform(id, p), Ok(true));
        let inst = s.scene().get(id).unwrap();
        assert_eq!(inst.position, p.position);
        assert_eq!(inst.rotation, p.rotation);
        assert_eq!(inst.scale, Vec3::new(1.0, crate::scene::MIN_SCALE, 2.0));
    }

    #[test]
    fn delete_clears_selection_and_ignores_unknown() {
        let mut s = session();
        let id = s.add_instance("rug").unwrap();
        assert!(!s.delete_instance(InstanceId::new()));
        assert_eq!(s.scene().len(), 1);
        assert!(s.delete_selected());
        assert!(s.scene().is_empty());
        assert_eq!(s.selection(), Selection::None);
        assert!(!s.delete_selected());
        assert!(!s.scene().contains(id));
    }

    #[test]
    fn delete_undo_restores_same_id_and_slot() {
        let mut s = session();
        let a = s.add_instance("sofa").unwrap();
        let b = s.add_instance("chair").unwrap();
        let c = s.add_instance("lamp").unwrap();
        s.delete_instance(b);
        s.undo();
        let ids: Vec<_> = s.scene().instances.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![a, b, c]);
    }

    #[test]
    fn wall_paint_by_name() {
        let mut s = session();
        s.set_wall_color("left", "#bfdbfe").unwrap();
        assert_eq!(s.scene().room.wall_colors.left, Color::hex(0xbfdbfe));
        assert_eq!(s.set_wall_color("roof", "#ffffff"), Err(EditorError::InvalidSurface("roof".into())));
        assert_eq!(s.set_wall_color("left", "blue"), Err(EditorError::InvalidColor("blue".into())));
        s.undo();
        assert_eq!(s.scene().room.wall_colors.left, Color::hex(0xf3f4f6));
    }

    #[test]
    fn floor_cycle_returns_to_start() {
        let mut s = session();
        let start = s.scene().room.floor_material;
        let mut seen = vec![start];
        for _ in 0..4 {
            seen.push(s.cycle_floor_material());
        }
        assert_eq!(seen, [FloorMaterial::Wood, FloorMaterial::Tile, FloorMaterial::Carpet, FloorMaterial::Marble, FloorMaterial::Wood]);
    }

    #[test]
    fn floor_cycle_skips_disallowed() {
        let room = RoomShell::with_dimensions(RoomDimensions::default());
        let mut s = EditorSession::new(room, Rc::new(Restrictive));
        assert_eq!(s.cycle_floor_material(), FloorMaterial::Carpet);
        assert!(!s.set_floor_material(FloorMaterial::Tile));
        assert!(s.set_floor_material(FloorMaterial::Marble));
    }

    #[test]
    fn select_validates() {
        let mut s = session();
        let id = s.add_instance("decor").unwrap();
        s.select_raw("back", "wall").unwrap();
        assert_eq!(s.selection(), Selection::Wall(SurfaceKey::Back));
        assert_eq!(s.select_raw("floor", "wall"), Err(EditorError::InvalidSurface("floor".into())));
        assert_eq!(s.selection(), Selection::Wall(SurfaceKey::Back));
        s.select_raw("", "floor").unwrap();
        assert_eq!(s.selection(), Selection::Floor);
        s.select_raw(&id.to_string(), "furniture").unwrap();
        assert_eq!(s.selection(), Selection::Furniture(id));
        let ghost = InstanceId::new();
        assert_eq!(s.select(Selection::Furniture(ghost)), Err(EditorError::NotFound(ghost)));
    }

    #[test]
    fn mode_switch_keeps_selection() {
        let mut s = session();
        let id = s.add_instance("chair").unwrap();
        s.set_transform_mode(TransformMode::Rotate);
        assert_eq!(s.mode(), TransformMode::Rotate);
        assert_eq!(s.selection(), Selection::Furniture(id));
    }

    #[test]
    fn undo_of_add_drops_selection() {
        let mut s = session();
        s.add_instance("chair").unwrap();
        assert_eq!(s.undo().as_deref(), Some("Add Accent Chair"));
        assert!(s.scene().is_empty());
        assert_eq!(s.selection(), Selection::None);
        assert!(s.redo().is_some());
        assert_eq!(s.scene().len(), 1);
    }

    #[test]
    fn move_duplicate_delete_scenario() {
        let mut s = session();
        let sofa = s.add_instance("sofa").unwrap();
        let placement = Placement { position: Vec3::new(1.0, 0.0, 2.0), ..s.scene().get(sofa).unwrap().placement() };
        s.commit_transform(sofa, placement).unwrap();
        let copy = s.duplicate_instance(sofa).unwrap();
        assert_eq!(s.selection(), Selection::Furniture(copy));
        s.delete_instance(sofa);

        assert_eq!(s.scene().len(), 1);
        let remaining = &s.scene().instances[0];
        assert_eq!(remaining.id, copy);
        assert_eq!(remaining.archetype, Archetype::Sofa);
        assert_eq!(remaining.position, Vec3::new(1.5, 0.0, 2.5));
        assert_eq!(s.selection(), Selection::None);
    }
}

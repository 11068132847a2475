use glam::Vec3;

use crate::context::SessionContext;
use crate::scene::catalog::{FURNITURE_SWATCHES, WALL_SWATCHES};
use crate::scene::color::Color;
use crate::scene::room::{FloorMaterial, RoomShell, SurfaceKey};
use crate::scene::{FurnitureInstance, InstanceId, InstancePatch, Placement};
use crate::tools::edit::Selection;
use crate::ui::UiAction;

const SWATCH_SIZE: f32 = 20.0;

/// Placement being edited through the numeric fields. Held until the drag
/// or text edit finishes so one gesture becomes one history entry.
pub struct PropertyDraft {
    id: InstanceId,
    placement: Placement,
    editing: bool,
}

impl PropertyDraft {
    /// Live placement to render while a field is being dragged.
    pub fn preview(draft: &Option<PropertyDraft>) -> Option<(InstanceId, Placement)> {
        draft.as_ref().filter(|d| d.editing).map(|d| (d.id, d.placement))
    }
}

pub fn draw_properties_panel(
    ui: &mut egui::Ui,
    selection: Selection,
    instance: Option<&FurnitureInstance>,
    room: &RoomShell,
    context: &dyn SessionContext,
    degrees: bool,
    draft: &mut Option<PropertyDraft>,
) -> UiAction {
    match selection {
        Selection::Furniture(_) => match instance {
            Some(inst) => draw_furniture(ui, inst, degrees, draft),
            None => {
                *draft = None;
                ui.label("Item no longer exists");
                UiAction::None
            }
        },
        Selection::Wall(key) => {
            *draft = None;
            draw_wall(ui, key, room.surface_color(key))
        }
        Selection::Floor => {
            *draft = None;
            draw_floor(ui, room.floor_material, context)
        }
        Selection::None => {
            *draft = None;
            ui.label("Nothing selected");
            ui.small("Click an item, a wall or the floor to edit it.");
            UiAction::None
        }
    }
}

fn draw_furniture(
    ui: &mut egui::Ui,
    inst: &FurnitureInstance,
    degrees: bool,
    draft: &mut Option<PropertyDraft>,
) -> UiAction {
    let mut action = UiAction::None;
    let current = inst.placement();

    // Follow the scene (undo, gizmo commits) unless a field is mid-edit.
    let stale = draft
        .as_ref()
        .is_none_or(|d| d.id != inst.id || (!d.editing && d.placement != current));
    if stale {
        *draft = Some(PropertyDraft { id: inst.id, placement: current, editing: false });
    }
    let Some(d) = draft.as_mut() else { return action };

    ui.heading(&inst.name);
    ui.small(inst.archetype.as_str());
    if inst.locked {
        ui.colored_label(egui::Color32::from_rgb(245, 158, 11), "Locked: gizmo disabled");
    }
    ui.separator();

    let mut editing = false;
    let mut finished = false;
    let mut track = |resp: egui::Response| {
        editing |= resp.dragged() || resp.has_focus();
        finished |= resp.drag_stopped() || (resp.changed() && !resp.dragged() && !resp.has_focus()) || resp.lost_focus();
    };

    egui::Grid::new("placement_grid").num_columns(4).show(ui, |ui| {
        ui.label("Position");
        for v in vec_fields(&mut d.placement.position) {
            track(ui.add(egui::DragValue::new(v).speed(0.05).fixed_decimals(2)));
        }
        ui.end_row();

        ui.label("Rotation");
        if degrees {
            let mut deg = d.placement.rotation * (180.0 / std::f32::consts::PI);
            let mut changed = false;
            for v in vec_fields(&mut deg) {
                let resp = ui.add(egui::DragValue::new(v).speed(1.0).fixed_decimals(1).suffix("°"));
                changed |= resp.changed();
                track(resp);
            }
            if changed {
                d.placement.rotation = deg * (std::f32::consts::PI / 180.0);
            }
        } else {
            for v in vec_fields(&mut d.placement.rotation) {
                track(ui.add(egui::DragValue::new(v).speed(0.02).fixed_decimals(3)));
            }
        }
        ui.end_row();

        ui.label("Scale");
        for v in vec_fields(&mut d.placement.scale) {
            track(ui.add(egui::DragValue::new(v).speed(0.02).range(crate::scene::MIN_SCALE..=f32::MAX).fixed_decimals(2)));
        }
        ui.end_row();
    });
    d.editing = editing;
    if finished && !editing && d.placement != current {
        action = UiAction::EditInstance(inst.id, InstancePatch::placement(d.placement));
    }

    ui.separator();
    ui.label("Color");
    if let Some(color) = swatch_row(ui, FURNITURE_SWATCHES, inst.color) {
        action = UiAction::EditInstance(inst.id, InstancePatch::default().color(color));
    }
    let mut rgb = inst.color.0;
    if ui.color_edit_button_srgb(&mut rgb).changed() {
        action = UiAction::EditInstance(inst.id, InstancePatch::default().color(Color(rgb)));
    }

    ui.separator();
    let mut locked = inst.locked;
    if ui.checkbox(&mut locked, "Lock in place").changed() {
        action = UiAction::EditInstance(inst.id, InstancePatch::default().locked(locked));
    }
    ui.horizontal(|ui| {
        if ui.add_enabled(!inst.locked, egui::Button::new("Duplicate")).clicked() {
            action = UiAction::DuplicateInstance(inst.id);
        }
        if ui.button("Delete").clicked() {
            action = UiAction::DeleteInstance(inst.id);
        }
    });

    let size = inst.dimensions * inst.scale;
    ui.small(format!("Size: {:.2} x {:.2} x {:.2} m", size.x, size.y, size.z));
    action
}

fn draw_wall(ui: &mut egui::Ui, key: SurfaceKey, color: Color) -> UiAction {
    let mut action = UiAction::None;
    ui.heading(format!("{} surface", capitalize(key.as_str())));
    ui.label(format!("Paint: {color}"));
    ui.separator();
    if let Some(picked) = swatch_row(ui, WALL_SWATCHES, color) {
        action = UiAction::PaintSurface(key, picked);
    }
    let mut rgb = color.0;
    if ui.color_edit_button_srgb(&mut rgb).changed() {
        action = UiAction::PaintSurface(key, Color(rgb));
    }
    action
}

fn draw_floor(ui: &mut egui::Ui, current: FloorMaterial, context: &dyn SessionContext) -> UiAction {
    let mut action = UiAction::None;
    ui.heading("Floor");
    ui.separator();
    for material in FloorMaterial::ALL {
        let allowed = context.allows_floor_material(material);
        let resp = ui
            .add_enabled_ui(allowed, |ui| ui.selectable_label(current == material, material.label()))
            .inner;
        if resp.clicked() && current != material {
            action = UiAction::SetFloorMaterial(material);
        }
    }
    ui.add_space(4.0);
    if ui.button("Next material").clicked() {
        action = UiAction::CycleFloor;
    }
    action
}

/// Row of color buttons. Returns the clicked swatch.
fn swatch_row(ui: &mut egui::Ui, swatches: &[Color], current: Color) -> Option<Color> {
    let mut picked = None;
    ui.horizontal_wrapped(|ui| {
        for &swatch in swatches {
            let [r, g, b] = swatch.0;
            let mut button = egui::Button::new("")
                .fill(egui::Color32::from_rgb(r, g, b))
                .min_size(egui::vec2(SWATCH_SIZE, SWATCH_SIZE));
            if swatch == current {
                button = button.stroke(egui::Stroke::new(2.0, egui::Color32::WHITE));
            }
            if ui.add(button).on_hover_text(swatch.to_string()).clicked() && swatch != current {
                picked = Some(swatch);
            }
        }
    });
    picked
}

fn vec_fields(v: &mut Vec3) -> [&mut f32; 3] {
    let Vec3 { x, y, z } = v;
    [x, y, z]
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capitalizes_surface_names() {
        assert_eq!(capitalize("front"), "Front");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn preview_only_while_editing() {
        let id = InstanceId::new();
        let mut draft = Some(PropertyDraft { id, placement: Placement::IDENTITY, editing: false });
        assert!(PropertyDraft::preview(&draft).is_none());
        if let Some(d) = draft.as_mut() {
            d.editing = true;
        }
        assert_eq!(PropertyDraft::preview(&draft), Some((id, Placement::IDENTITY)));
    }
}

mod catalog_panel;
pub mod properties_panel;
pub mod settings_dialog;

use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::scene::catalog::Archetype;
use crate::scene::color::Color;
use crate::scene::room::{FloorMaterial, RoomDimensions, SurfaceKey, Unit};
use crate::scene::{InstanceId, InstancePatch};
use crate::session::EditorSession;
use crate::tools::TransformMode;
use properties_panel::PropertyDraft;

const TOAST_DURATION: Duration = Duration::from_secs(3);
/// Bounds for the room size fields, in the selected unit.
const DIMENSION_RANGE: RangeInclusive<f32> = 0.1..=1000.0;

/// Actions the UI wants the app to execute (can't borrow mutably inside egui closures).
#[derive(Debug, Clone, PartialEq)]
pub enum UiAction {
    None,
    BuildRoom,
    OpenRoomFile,
    OpenRecent(PathBuf),
    AddInstance(Archetype),
    EditInstance(InstanceId, InstancePatch),
    DuplicateInstance(InstanceId),
    DeleteInstance(InstanceId),
    PaintSurface(SurfaceKey, Color),
    SetFloorMaterial(FloorMaterial),
    CycleFloor,
    SetMode(TransformMode),
    Deselect,
    Undo,
    Redo,
    ToggleGrid,
    SaveProject,
    SaveRoomFile,
    Snapshot,
    OpenSettings,
    RequestExit,
    ConfirmExit(bool),
    Quit,
}

/// Short message shown in the status bar.
pub struct Toast {
    pub text: String,
    pub error: bool,
    shown_at: Instant,
}

impl Toast {
    pub fn info(text: impl Into<String>) -> Self {
        Self { text: text.into(), error: false, shown_at: Instant::now() }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self { text: text.into(), error: true, shown_at: Instant::now() }
    }

    pub fn expired(&self, now: Instant) -> bool {
        now.duration_since(self.shown_at) >= TOAST_DURATION
    }
}

/// Room size form shown before anything is built.
pub fn draw_dimension_entry(
    ctx: &egui::Context,
    draft: &mut RoomDimensions,
    recent_files: &[PathBuf],
) -> UiAction {
    let mut action = UiAction::None;
    egui::CentralPanel::default().show(ctx, |ui| {
        ui.vertical_centered(|ui| {
            ui.add_space(ui.available_height() * 0.2);
            ui.heading("New Room");
            ui.label("Enter the size of the room to lay out.");
            ui.add_space(12.0);
        });

        egui::Grid::new("dimension_form")
            .num_columns(2)
            .spacing([12.0, 8.0])
            .show(ui, |ui| {
                ui.label("Width");
                ui.add(egui::DragValue::new(&mut draft.width).speed(0.1).range(DIMENSION_RANGE).fixed_decimals(1));
                ui.end_row();
                ui.label("Length");
                ui.add(egui::DragValue::new(&mut draft.length).speed(0.1).range(DIMENSION_RANGE).fixed_decimals(1));
                ui.end_row();
                ui.label("Height");
                ui.add(egui::DragValue::new(&mut draft.height).speed(0.1).range(DIMENSION_RANGE).fixed_decimals(1));
                ui.end_row();
                ui.label("Unit");
                egui::ComboBox::from_id_salt("unit")
                    .selected_text(draft.unit.label())
                    .show_ui(ui, |ui| {
                        ui.selectable_value(&mut draft.unit, Unit::Feet, Unit::Feet.label());
                        ui.selectable_value(&mut draft.unit, Unit::Meters, Unit::Meters.label());
                    });
                ui.end_row();
            });

        ui.add_space(12.0);
        ui.horizontal(|ui| {
            if ui.button("Build Room").clicked() {
                action = UiAction::BuildRoom;
            }
            if ui.button("Open .room file...").clicked() {
                action = UiAction::OpenRoomFile;
            }
            if ui.button("Settings").clicked() {
                action = UiAction::OpenSettings;
            }
        });

        if !recent_files.is_empty() {
            ui.add_space(16.0);
            ui.label("Recent");
            for path in recent_files {
                if ui.link(file_label(path)).on_hover_text(path.display().to_string()).clicked() {
                    action = UiAction::OpenRecent(path.clone());
                }
            }
        }
    });
    action
}

/// Placeholder shown while the room is being built.
pub fn draw_constructing(ctx: &egui::Context, progress: f32) {
    egui::CentralPanel::default().show(ctx, |ui| {
        ui.vertical_centered(|ui| {
            ui.add_space(ui.available_height() * 0.35);
            ui.spinner();
            ui.heading("Building your room...");
            ui.add(egui::ProgressBar::new(progress).desired_width(240.0));
        });
    });
}

/// Everything around the viewport while editing.
#[allow(clippy::too_many_arguments)]
pub fn draw_editor_ui(
    ctx: &egui::Context,
    session: &EditorSession,
    draft: &mut Option<PropertyDraft>,
    show_grid: bool,
    degrees: bool,
    toast: Option<&Toast>,
    confirm_exit: bool,
) -> UiAction {
    let mut action = UiAction::None;
    let history = session.history();
    let mut set = |a: UiAction| {
        if !matches!(a, UiAction::None) {
            action = a;
        }
    };

    // Menu bar
    egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
        egui::MenuBar::new().ui(ui, |ui| {
            ui.menu_button("File", |ui| {
                if ui.button("Save Project  Ctrl+S").clicked() {
                    set(UiAction::SaveProject);
                    ui.close();
                }
                if ui.button("Save Room File...  Ctrl+Shift+S").clicked() {
                    set(UiAction::SaveRoomFile);
                    ui.close();
                }
                if ui.button("Snapshot  F12").clicked() {
                    set(UiAction::Snapshot);
                    ui.close();
                }
                ui.separator();
                if ui.button("Settings...").clicked() {
                    set(UiAction::OpenSettings);
                    ui.close();
                }
                if ui.button("Exit Room").clicked() {
                    set(UiAction::RequestExit);
                    ui.close();
                }
                if ui.button("Quit").clicked() {
                    set(UiAction::Quit);
                    ui.close();
                }
            });
            ui.menu_button("Edit", |ui| {
                if ui.add_enabled(history.can_undo(), egui::Button::new("Undo  Ctrl+Z")).clicked() {
                    set(UiAction::Undo);
                    ui.close();
                }
                if ui.add_enabled(history.can_redo(), egui::Button::new("Redo  Ctrl+Y")).clicked() {
                    set(UiAction::Redo);
                    ui.close();
                }
                ui.separator();
                let has_selection = !session.selection().is_none();
                if ui.add_enabled(has_selection, egui::Button::new("Deselect  Esc")).clicked() {
                    set(UiAction::Deselect);
                    ui.close();
                }
            });
            ui.menu_button("View", |ui| {
                let label = if show_grid { "Grid [ON]  G" } else { "Grid  G" };
                if ui.button(label).clicked() {
                    set(UiAction::ToggleGrid);
                    ui.close();
                }
            });
        });
    });

    let scene = session.scene();
    set(catalog_panel::draw_catalog_panel(
        ctx,
        session.context().as_ref(),
        session.mode(),
        &scene.room.dimensions,
        scene.len(),
    ));

    egui::SidePanel::right("properties_panel").default_width(240.0).show(ctx, |ui| {
        ui.heading("Properties");
        ui.separator();
        set(properties_panel::draw_properties_panel(
            ui,
            session.selection(),
            session.selected_instance(),
            &scene.room,
            session.context().as_ref(),
            degrees,
            draft,
        ));
    });

    // Status bar
    egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
        ui.horizontal(|ui| {
            ui.label(format!("Mode: {}", session.mode().label()));
            ui.separator();
            ui.label(format!("Selected: {}", session.selection()));
            ui.separator();
            ui.label(format!("Items: {}", scene.len()));
            if history.dirty {
                ui.separator();
                ui.label("Unsaved");
            }
            if let Some(toast) = toast {
                ui.separator();
                if toast.error {
                    ui.colored_label(egui::Color32::from_rgb(239, 68, 68), &toast.text);
                } else {
                    ui.label(&toast.text);
                }
            }
        });
    });

    if confirm_exit {
        egui::Window::new("Leave Room")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label("Leaving discards the room and everything placed in it.");
                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    if ui.button("Leave").clicked() {
                        set(UiAction::ConfirmExit(true));
                    }
                    if ui.button("Stay").clicked() {
                        set(UiAction::ConfirmExit(false));
                    }
                });
            });
    }

    action
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

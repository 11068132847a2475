use crate::context::Plan;
use crate::keybindings::{Keybindings, ALL_ACTIONS};
use crate::settings::{Settings, SettingsTab};

/// What the settings window asks the app to do after this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SettingsOutcome {
    /// Settings were edited and should be saved and re-applied.
    pub changed: bool,
    /// The account section changed, so the session context must be rebuilt.
    pub account_changed: bool,
}

pub fn draw_settings_dialog(
    ctx: &egui::Context,
    open: &mut bool,
    tab: &mut SettingsTab,
    settings: &mut Settings,
    keybindings: &Keybindings,
) -> SettingsOutcome {
    let mut outcome = SettingsOutcome::default();
    let before = settings.clone();

    egui::Window::new("Settings")
        .open(open)
        .collapsible(false)
        .resizable(false)
        .default_width(360.0)
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.selectable_value(tab, SettingsTab::Camera, "Camera");
                ui.selectable_value(tab, SettingsTab::Display, "Display");
                ui.selectable_value(tab, SettingsTab::Editor, "Editor");
                ui.selectable_value(tab, SettingsTab::Account, "Account");
            });
            ui.separator();

            match tab {
                SettingsTab::Camera => {
                    let cam = &mut settings.camera;
                    egui::Grid::new("camera_settings").num_columns(2).show(ui, |ui| {
                        ui.label("Field of view");
                        ui.add(egui::Slider::new(&mut cam.fov_degrees, 30.0..=100.0).suffix("°"));
                        ui.end_row();
                        ui.label("Near plane");
                        ui.add(egui::DragValue::new(&mut cam.near_plane).speed(0.01).range(0.01..=10.0));
                        ui.end_row();
                        ui.label("Far plane");
                        ui.add(egui::DragValue::new(&mut cam.far_plane).speed(1.0).range(10.0..=1000.0));
                        ui.end_row();
                        ui.label("Orbit speed");
                        ui.add(egui::Slider::new(&mut cam.orbit_sensitivity, 0.001..=0.02));
                        ui.end_row();
                        ui.label("Pan speed");
                        ui.add(egui::Slider::new(&mut cam.pan_sensitivity, 0.001..=0.05));
                        ui.end_row();
                        ui.label("Zoom speed");
                        ui.add(egui::Slider::new(&mut cam.zoom_speed, 0.1..=5.0));
                        ui.end_row();
                    });
                    ui.checkbox(&mut cam.invert_orbit_y, "Invert vertical orbit");
                }
                SettingsTab::Display => {
                    let display = &mut settings.display;
                    egui::Grid::new("display_settings").num_columns(2).show(ui, |ui| {
                        ui.label("Background");
                        ui.color_edit_button_rgb(&mut display.bg_color);
                        ui.end_row();
                        ui.label("Selection");
                        ui.color_edit_button_rgba_unmultiplied(&mut display.selection_color);
                        ui.end_row();
                        ui.label("Hover");
                        ui.color_edit_button_rgba_unmultiplied(&mut display.hover_color);
                        ui.end_row();
                    });
                    ui.checkbox(&mut display.show_grid, "Show floor grid");
                    ui.checkbox(&mut display.rotation_in_degrees, "Show rotation in degrees");
                }
                SettingsTab::Editor => {
                    let editor = &mut settings.editor;
                    ui.horizontal(|ui| {
                        ui.label("Construction delay");
                        ui.add(egui::DragValue::new(&mut editor.construct_delay_ms).range(0..=10_000).suffix(" ms"));
                    });
                    ui.horizontal(|ui| {
                        ui.label("Projects folder");
                        ui.monospace(editor.projects_dir().display().to_string());
                    });
                    ui.horizontal(|ui| {
                        if ui.button("Choose...").clicked()
                            && let Some(dir) = rfd::FileDialog::new().set_title("Projects Folder").pick_folder()
                        {
                            editor.projects_dir = Some(dir);
                        }
                        if ui.add_enabled(editor.projects_dir.is_some(), egui::Button::new("Reset")).clicked() {
                            editor.projects_dir = None;
                        }
                    });
                    ui.separator();
                    ui.label("Shortcuts");
                    egui::Grid::new("shortcut_list").num_columns(2).striped(true).show(ui, |ui| {
                        for (action, label) in ALL_ACTIONS {
                            ui.label(*label);
                            ui.monospace(keybindings.display(*action));
                            ui.end_row();
                        }
                    });
                    ui.small("Edit keybindings.json in the config folder to change shortcuts.");
                }
                SettingsTab::Account => {
                    let account = &mut settings.account;
                    let mut name = account.user.clone().unwrap_or_default();
                    ui.horizontal(|ui| {
                        ui.label("User");
                        if ui.text_edit_singleline(&mut name).changed() {
                            account.user = (!name.trim().is_empty()).then(|| name.clone());
                        }
                    });
                    ui.horizontal(|ui| {
                        ui.label("Plan");
                        for plan in [Plan::Free, Plan::Premium, Plan::Ultra] {
                            ui.selectable_value(&mut account.plan, plan, plan.label());
                        }
                    });
                    ui.small("Saving projects requires a user name.");
                }
            }
        });

    if *settings != before {
        outcome.changed = true;
        outcome.account_changed = settings.account != before.account;
    }
    outcome
}

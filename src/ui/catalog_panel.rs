use crate::context::SessionContext;
use crate::scene::catalog::list_archetypes;
use crate::scene::room::RoomDimensions;
use crate::tools::TransformMode;
use crate::ui::UiAction;

/// Left panel: transform mode, the furniture catalog and room facts.
pub fn draw_catalog_panel(
    ctx: &egui::Context,
    context: &dyn SessionContext,
    mode: TransformMode,
    dimensions: &RoomDimensions,
    item_count: usize,
) -> UiAction {
    let mut action = UiAction::None;
    egui::SidePanel::left("catalog_panel").default_width(190.0).show(ctx, |ui| {
        ui.heading("Transform");
        ui.horizontal(|ui| {
            for m in TransformMode::ALL {
                if ui.selectable_label(mode == m, m.label()).clicked() && mode != m {
                    action = UiAction::SetMode(m);
                }
            }
        });
        ui.small("W / E / R");
        ui.separator();

        ui.heading("Furniture");
        for info in list_archetypes() {
            let allowed = context.allows_archetype(info.archetype);
            let label = if allowed {
                info.display_name.to_string()
            } else {
                format!("{} ({})", info.display_name, info.tier.label())
            };
            let resp = ui.add_enabled(allowed, egui::Button::new(label).min_size(egui::vec2(170.0, 0.0)));
            if resp.clicked() {
                action = UiAction::AddInstance(info.archetype);
            }
            if !allowed {
                resp.on_disabled_hover_text(format!("Requires the {} plan", info.tier.label()));
            }
        }
        ui.separator();

        ui.heading("Room");
        let unit = dimensions.unit.label();
        ui.label(format!(
            "{} x {} x {} {unit}",
            dimensions.width, dimensions.length, dimensions.height
        ));
        ui.label(format!("Items: {item_count}"));
        ui.separator();
        ui.small("Click: select item, wall or floor");
        ui.small("Right drag: orbit | Middle drag: pan");
        ui.small("Wheel: zoom | Esc: deselect");
    });
    action
}

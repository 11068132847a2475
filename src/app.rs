use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use glam::{Vec2, Vec3};
use winit::application::ApplicationHandler;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::ActiveEventLoop;
use winit::window::{Window, WindowAttributes, WindowId};

use crate::context::SessionContext;
use crate::geometry::ShapeCache;
use crate::input::InputState;
use crate::io::{self, LocalProjectStore, ROOM_EXTENSION};
use crate::keybindings::{Action, Keybindings};
use crate::render::gizmo::{build_box_outline, build_gizmo_lines, build_selection_marker};
use crate::render::{FrameData, LineVertex, RenderError, Renderer};
use crate::scene::{InstanceId, Placement, Scene};
use crate::settings::{Settings, SettingsTab};
use crate::tools::TransformMode;
use crate::ui::properties_panel::PropertyDraft;
use crate::ui::settings_dialog::{draw_settings_dialog, SettingsOutcome};
use crate::ui::{Toast, UiAction};
use crate::util::picking::{pick_entity, Viewport};
use crate::workflow::{ExitOutcome, Workflow, WorkflowState};

const TITLE: &str = "Roomcraft 3D";
const MARKER_SIZE: f32 = 0.12;

/// Why a frame is being captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SnapshotPurpose {
    /// F12: just write the image.
    Standalone,
    /// Attach the image to the project being saved.
    Project,
}

/// Top-level application state.
pub struct App {
    gpu: Option<GpuState>,
    workflow: Workflow,
    /// Tessellated shapes for the scene being edited.
    cache: ShapeCache,
    input: InputState,
    keybindings: Keybindings,
    settings: Settings,
    settings_open: bool,
    settings_tab: SettingsTab,
    store: LocalProjectStore,
    /// Recent .room files (max 10)
    recent_files: Vec<PathBuf>,
    /// Last .room path, offered as the default on the next save.
    last_room_path: Option<PathBuf>,
    toast: Option<Toast>,
    confirm_exit: bool,
    /// Numeric placement edit in progress in the properties panel.
    property_draft: Option<PropertyDraft>,
    /// Furniture under the pointer, for the hover highlight.
    hovered: Option<InstanceId>,
    /// Set to capture the viewport at the end of this frame.
    snapshot_pending: Option<SnapshotPurpose>,
    quit_requested: bool,
}

/// Everything that requires the window to exist.
struct GpuState {
    window: Arc<Window>,
    renderer: Renderer,
    egui_state: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl App {
    pub fn new() -> Self {
        let settings = Settings::load();
        let context: Rc<dyn SessionContext> = Rc::new(settings.account.session());
        let workflow = Workflow::new(context, settings.editor.construct_delay());
        let store = LocalProjectStore::new(settings.editor.projects_dir());
        Self {
            gpu: None,
            workflow,
            cache: ShapeCache::new(),
            input: InputState::new(),
            keybindings: Keybindings::load(),
            settings,
            settings_open: false,
            settings_tab: SettingsTab::Camera,
            store,
            recent_files: io::load_recent_files(),
            last_room_path: None,
            toast: None,
            confirm_exit: false,
            property_draft: None,
            hovered: None,
            snapshot_pending: None,
            quit_requested: false,
        }
    }

    fn create_gpu(event_loop: &ActiveEventLoop) -> Result<GpuState, String> {
        let attrs = WindowAttributes::default()
            .with_title(TITLE)
            .with_inner_size(winit::dpi::LogicalSize::new(1280u32, 760u32));
        let window = Arc::new(event_loop.create_window(attrs).map_err(|e| format!("failed to create window: {e}"))?);

        let renderer = pollster::block_on(Renderer::new(window.clone())).map_err(|e| e.to_string())?;

        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx,
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(
            &renderer.device,
            renderer.surface_format,
            None,
            1,
            false,
        );

        Ok(GpuState {
            window,
            renderer,
            egui_state,
            egui_renderer,
        })
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }
        match Self::create_gpu(event_loop) {
            Ok(gpu) => self.gpu = Some(gpu),
            Err(e) => {
                log::error!("{e}");
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Some(gpu) = &mut self.gpu else { return };

        // Let egui process the event first
        let egui_response = gpu.egui_state.on_window_event(&gpu.window, &event);
        let egui_consumed = egui_response.consumed;

        match &event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                gpu.renderer.resize(new_size.width, new_size.height);
                gpu.window.request_redraw();
            }
            WindowEvent::RedrawRequested => {
                self.redraw();
            }
            _ => {}
        }

        // Button releases always reach us so a drag that ends over a panel still ends.
        let release = matches!(event, WindowEvent::MouseInput { state: ElementState::Released, .. });
        if !egui_consumed || release {
            self.input.handle_event(&event);
        }

        if self.quit_requested {
            event_loop.exit();
            return;
        }

        // Always request redraw to keep the render loop going
        if let Some(gpu) = &self.gpu {
            gpu.window.request_redraw();
        }
    }
}

impl App {
    /// Camera, picking and gizmo handling for the viewport. Returns actions from shortcuts.
    fn process_input(&mut self) -> Vec<UiAction> {
        let mut actions = Vec::new();
        let state = self.workflow.state();

        if state != WorkflowState::Editing {
            if state == WorkflowState::DimensionEntry && self.keybindings.is_triggered(Action::OpenRoomFile, &self.input) {
                actions.push(UiAction::OpenRoomFile);
            }
            return actions;
        }

        self.collect_shortcuts(&mut actions);

        let Some(gpu) = &mut self.gpu else { return actions };
        let Some(session) = self.workflow.session_mut() else { return actions };

        // Apply camera settings from preferences
        let cam_settings = &self.settings.camera;
        let camera = &mut gpu.renderer.camera;
        camera.fov_y = cam_settings.fov_degrees.to_radians();
        camera.near = cam_settings.near_plane;
        camera.far = cam_settings.far_plane;

        let delta = self.input.mouse_delta;
        let shift = self.input.modifiers().shift;
        if self.input.middle_pressed || (self.input.right_pressed && shift) {
            let scale = cam_settings.pan_sensitivity * camera.distance * 0.1;
            camera.pan(-delta.x * scale, delta.y * scale);
        } else if self.input.right_pressed {
            let invert = if cam_settings.invert_orbit_y { -1.0 } else { 1.0 };
            camera.orbit(
                -delta.x * cam_settings.orbit_sensitivity,
                delta.y * cam_settings.orbit_sensitivity * invert,
            );
        }
        if self.input.scroll_delta != 0.0 {
            camera.zoom(self.input.scroll_delta * cam_settings.zoom_speed);
        }

        let screen = Vec2::new(gpu.renderer.config.width as f32, gpu.renderer.config.height as f32);
        let view = camera.viewport(screen);
        let mouse = self.input.mouse_pos;

        if session.controller().is_dragging() {
            self.hovered = None;
            if self.input.left_pressed {
                session.controller_mut().drag_to(mouse, &view);
            } else if let Some(intent) = session.controller_mut().end_drag()
                && let Err(e) = session.apply_intent(intent)
            {
                log::warn!("transform not stored: {e}");
                self.toast = Some(Toast::error(e.to_string()));
            }
            return actions;
        }

        let selected = session.selected_instance().cloned();
        session.controller_mut().update_hover(mouse, selected.as_ref(), &view);

        let on_handle = session.controller().hovered() != crate::render::gizmo::GizmoAxis::None;
        let hit = if on_handle {
            None
        } else {
            pick_entity(&view.ray(mouse), session.scene(), &self.cache, None)
        };
        self.hovered = hit.as_ref().and_then(|h| h.target.furniture());

        if self.input.left_just_clicked && !shift {
            let grabbed = selected
                .as_ref()
                .is_some_and(|inst| session.controller_mut().begin_drag(mouse, inst, &view));
            if !grabbed {
                match hit {
                    Some(hit) => {
                        if let Err(e) = session.select(hit.target) {
                            log::warn!("pick ignored: {e}");
                        }
                    }
                    None => session.deselect(),
                }
            }
        }
        actions
    }

    fn collect_shortcuts(&self, actions: &mut Vec<UiAction>) {
        let Some(session) = self.workflow.session() else { return };
        let kb = &self.keybindings;
        let input = &self.input;
        let selected = session.selection().furniture();

        let simple = [
            (Action::Undo, UiAction::Undo),
            (Action::Redo, UiAction::Redo),
            (Action::SaveProject, UiAction::SaveProject),
            (Action::SaveRoomFile, UiAction::SaveRoomFile),
            (Action::OpenRoomFile, UiAction::OpenRoomFile),
            (Action::Snapshot, UiAction::Snapshot),
            (Action::ToggleGrid, UiAction::ToggleGrid),
            (Action::Deselect, UiAction::Deselect),
            (Action::CycleFloor, UiAction::CycleFloor),
            (Action::GizmoTranslate, UiAction::SetMode(TransformMode::Translate)),
            (Action::GizmoRotate, UiAction::SetMode(TransformMode::Rotate)),
            (Action::GizmoScale, UiAction::SetMode(TransformMode::Scale)),
        ];
        for (action, ui_action) in simple {
            if kb.is_triggered(action, input) {
                actions.push(ui_action);
            }
        }
        if let Some(id) = selected {
            if kb.is_triggered(Action::Delete, input) {
                actions.push(UiAction::DeleteInstance(id));
            }
            if kb.is_triggered(Action::Duplicate, input) {
                actions.push(UiAction::DuplicateInstance(id));
            }
        }
    }

    fn handle_action(&mut self, action: UiAction) {
        match action {
            UiAction::None => {}
            UiAction::BuildRoom => {
                let draft = self.workflow.draft;
                if let Err(e) = self.workflow.advance_workflow(draft, Instant::now()) {
                    self.toast = Some(Toast::error(e.to_string()));
                }
            }
            UiAction::OpenRoomFile => {
                if !self.can_replace_scene() {
                    return;
                }
                let file = rfd::FileDialog::new()
                    .add_filter("Room", &[ROOM_EXTENSION])
                    .set_title("Open Room")
                    .pick_file();
                if let Some(path) = file {
                    self.open_room_file(&path);
                }
            }
            UiAction::OpenRecent(path) => {
                if self.can_replace_scene() {
                    self.open_room_file(&path);
                }
            }
            UiAction::SaveRoomFile => self.save_room_file(),
            UiAction::SaveProject => {
                if !self.workflow.context().is_authenticated() {
                    self.toast = Some(Toast::error("Sign in to save projects (Settings > Account)"));
                    return;
                }
                self.snapshot_pending = Some(SnapshotPurpose::Project);
            }
            UiAction::Snapshot => self.snapshot_pending = Some(SnapshotPurpose::Standalone),
            UiAction::OpenSettings => self.settings_open = true,
            UiAction::ToggleGrid => {
                self.settings.display.show_grid = !self.settings.display.show_grid;
                self.settings.save();
            }
            UiAction::RequestExit => {
                if self.workflow.request_exit() {
                    self.confirm_exit = true;
                } else {
                    self.leave_room(false);
                }
            }
            UiAction::ConfirmExit(confirmed) => {
                self.confirm_exit = false;
                if confirmed {
                    self.leave_room(true);
                }
            }
            UiAction::Quit => self.quit_requested = true,
            other => self.handle_session_action(other),
        }
    }

    /// Actions that only make sense with a room open.
    fn handle_session_action(&mut self, action: UiAction) {
        let session = match self.workflow.editing() {
            Ok(session) => session,
            Err(e) => {
                log::warn!("{action:?} ignored: {e}");
                return;
            }
        };
        let result = match action {
            UiAction::AddInstance(archetype) => session
                .add_instance(archetype.as_str())
                .map(|_| Some(format!("Added {}", archetype.info().display_name))),
            UiAction::EditInstance(id, patch) => session.update_instance(id, patch).map(|_| None),
            UiAction::DuplicateInstance(id) => session
                .duplicate_instance(id)
                .map(|_| Some("Item duplicated".to_string())),
            UiAction::DeleteInstance(id) => {
                Ok(session.delete_instance(id).then(|| "Item deleted".to_string()))
            }
            UiAction::PaintSurface(key, color) => {
                session.paint_surface(key, color);
                Ok(None)
            }
            UiAction::SetFloorMaterial(material) => {
                session.set_floor_material(material);
                Ok(None)
            }
            UiAction::CycleFloor => {
                let material = session.cycle_floor_material();
                Ok(Some(format!("Floor: {}", material.label())))
            }
            UiAction::SetMode(mode) => {
                session.set_transform_mode(mode);
                Ok(None)
            }
            UiAction::Deselect => {
                session.deselect();
                Ok(None)
            }
            UiAction::Undo => Ok(session.undo().map(|desc| format!("Undo: {desc}"))),
            UiAction::Redo => Ok(session.redo().map(|desc| format!("Redo: {desc}"))),
            _ => Ok(None),
        };
        match result {
            Ok(Some(msg)) => self.toast = Some(Toast::info(msg)),
            Ok(None) => {}
            Err(e) => {
                log::warn!("{e}");
                self.toast = Some(Toast::error(e.to_string()));
            }
        }
    }

    /// Opening a file replaces the current room. Refuse while it holds unsaved work.
    fn can_replace_scene(&mut self) -> bool {
        let busy = self
            .workflow
            .session()
            .is_some_and(|s| s.history().dirty && !s.scene().is_empty());
        if busy {
            self.toast = Some(Toast::error("Save or leave the current room first"));
        }
        !busy
    }

    fn open_room_file(&mut self, path: &Path) {
        let scene = io::load_room_file(path)
            .map_err(|e| e.to_string())
            .and_then(|doc| Scene::from_document(&doc).map_err(|e| e.to_string()));
        match scene {
            Ok(scene) => {
                self.workflow.open_scene(scene);
                self.enter_editing();
                io::remember_recent_file(&mut self.recent_files, path);
                self.last_room_path = Some(path.to_path_buf());
                self.toast = Some(Toast::info(format!("Opened {}", path.display())));
            }
            Err(e) => {
                log::error!("could not open {}: {e}", path.display());
                self.toast = Some(Toast::error(format!("Could not open room: {e}")));
            }
        }
    }

    fn save_room_file(&mut self) {
        let Some(session) = self.workflow.session_mut() else { return };
        let mut dialog = rfd::FileDialog::new()
            .add_filter("Room", &[ROOM_EXTENSION])
            .set_title("Save Room")
            .set_file_name(format!("room.{ROOM_EXTENSION}"));
        if let Some(dir) = self.last_room_path.as_deref().and_then(Path::parent) {
            dialog = dialog.set_directory(dir);
        }
        let Some(mut path) = dialog.save_file() else { return };
        if path.extension().is_none() {
            path.set_extension(ROOM_EXTENSION);
        }
        match io::save_room_file(&io::serialize(session.scene()), &path) {
            Ok(()) => {
                session.mark_saved();
                io::remember_recent_file(&mut self.recent_files, &path);
                self.toast = Some(Toast::info(format!("Saved {}", path.display())));
                self.last_room_path = Some(path);
            }
            Err(e) => {
                log::error!("could not save {}: {e}", path.display());
                self.toast = Some(Toast::error(format!("Save failed: {e}")));
            }
        }
    }

    /// Persist the current scene through the project store.
    fn save_project(&mut self, snapshot: Option<PathBuf>) {
        let context = self.workflow.context().clone();
        let Some(session) = self.workflow.session_mut() else { return };
        let mut doc = io::serialize(session.scene());
        if let Some(path) = snapshot {
            doc = doc.with_snapshot(path.display().to_string());
        }
        match io::save_project(context.as_ref(), &mut self.store, &doc) {
            Ok(id) => {
                session.mark_saved();
                self.toast = Some(Toast::info(format!("Project saved ({id})")));
            }
            Err(e) => {
                log::error!("project save failed: {e}");
                self.toast = Some(Toast::error(format!("Save failed: {e}")));
            }
        }
    }

    fn finish_snapshot(&mut self, purpose: SnapshotPurpose, result: Result<PathBuf, RenderError>) {
        match (purpose, result) {
            (SnapshotPurpose::Standalone, Ok(path)) => {
                log::info!("snapshot saved to {}", path.display());
                self.toast = Some(Toast::info(format!("Snapshot: {}", path.display())));
            }
            (SnapshotPurpose::Standalone, Err(e)) => {
                log::error!("snapshot failed: {e}");
                self.toast = Some(Toast::error(format!("Snapshot failed: {e}")));
            }
            (SnapshotPurpose::Project, result) => {
                let snapshot = result
                    .inspect_err(|e| log::warn!("saving project without snapshot: {e}"))
                    .ok();
                self.save_project(snapshot);
            }
        }
    }

    /// Fresh GPU and cache state for a newly opened room.
    fn enter_editing(&mut self) {
        self.cache.clear();
        self.property_draft = None;
        self.hovered = None;
        let size = self.workflow.session().map(|s| s.scene().room.size_meters());
        if let Some(gpu) = &mut self.gpu {
            gpu.renderer.clear_scene();
            if let Some(size) = size {
                gpu.renderer.camera.frame_room(size);
            }
        }
    }

    fn leave_room(&mut self, confirmed: bool) {
        if self.workflow.exit_workflow(confirmed) == ExitOutcome::Exited {
            self.cache.clear();
            self.property_draft = None;
            self.hovered = None;
            if let Some(gpu) = &mut self.gpu {
                gpu.renderer.clear_scene();
            }
        }
    }

    fn apply_settings(&mut self, account_changed: bool) {
        self.settings.save();
        self.workflow.set_construct_delay(self.settings.editor.construct_delay());
        let dir = self.settings.editor.projects_dir();
        if self.store.dir() != dir {
            self.store = LocalProjectStore::new(dir);
        }
        if account_changed {
            self.workflow.set_context(Rc::new(self.settings.account.session()));
        }
    }

    /// Gizmo, selection outline and marker for this frame.
    fn build_overlay(&self, view: &Viewport, live: Option<(InstanceId, Placement)>) -> Vec<LineVertex> {
        let mut lines = Vec::new();
        let Some(session) = self.workflow.session() else { return lines };
        let Some(inst) = session.selected_instance() else { return lines };

        let placement = match live {
            Some((id, p)) if id == inst.id => p,
            _ => inst.placement(),
        };
        if let Some(shape) = self.cache.get(inst.id) {
            let (min, max) = shape.bounds;
            let model = placement.matrix();
            lines.extend(build_box_outline(min, max, model, self.settings.display.selection_color));
            let top = model.transform_point3(Vec3::new((min.x + max.x) * 0.5, max.y, (min.z + max.z) * 0.5));
            lines.extend(build_selection_marker(top, MARKER_SIZE));
        }
        let controller = session.controller();
        if let Some(frame) = controller.frame_for(inst, view) {
            lines.extend(build_gizmo_lines(&frame, controller.mode(), controller.hovered(), controller.active_axis()));
        }
        lines
    }

    fn redraw(&mut self) {
        let now = Instant::now();
        if self.workflow.poll(now) {
            self.enter_editing();
        }
        if self.toast.as_ref().is_some_and(|t| t.expired(now)) {
            self.toast = None;
        }

        let mut actions = self.process_input();
        self.input.begin_frame();

        // Run egui
        let Some(gpu) = &mut self.gpu else { return };
        let dirty = self.workflow.session().is_some_and(|s| s.history().dirty);
        gpu.window.set_title(if dirty { "Roomcraft 3D *" } else { TITLE });

        let raw_input = gpu.egui_state.take_egui_input(&gpu.window);
        let egui_ctx = gpu.egui_state.egui_ctx().clone();
        let mut ui_action = UiAction::None;
        let mut settings_outcome = SettingsOutcome::default();
        let progress = self.workflow.construction_progress(now);
        let full_output = egui_ctx.run(raw_input, |ctx| {
            // Toasts on the other screens
            if self.workflow.state() != WorkflowState::Editing
                && let Some(toast) = &self.toast
            {
                egui::TopBottomPanel::bottom("toast_bar").show(ctx, |ui| {
                    if toast.error {
                        ui.colored_label(egui::Color32::from_rgb(239, 68, 68), &toast.text);
                    } else {
                        ui.label(&toast.text);
                    }
                });
            }

            ui_action = match self.workflow.state() {
                WorkflowState::DimensionEntry => {
                    crate::ui::draw_dimension_entry(ctx, &mut self.workflow.draft, &self.recent_files)
                }
                WorkflowState::Constructing => {
                    crate::ui::draw_constructing(ctx, progress);
                    UiAction::None
                }
                WorkflowState::Editing => match self.workflow.session() {
                    Some(session) => crate::ui::draw_editor_ui(
                        ctx,
                        session,
                        &mut self.property_draft,
                        self.settings.display.show_grid,
                        self.settings.display.rotation_in_degrees,
                        self.toast.as_ref(),
                        self.confirm_exit,
                    ),
                    None => UiAction::None,
                },
            };

            settings_outcome = draw_settings_dialog(
                ctx,
                &mut self.settings_open,
                &mut self.settings_tab,
                &mut self.settings,
                &self.keybindings,
            );
        });
        gpu.egui_state.handle_platform_output(&gpu.window, full_output.platform_output);

        // Keyboard-triggered actions first, then whatever the panels asked for.
        actions.push(ui_action);
        for action in actions {
            self.handle_action(action);
        }
        if settings_outcome.changed {
            self.apply_settings(settings_outcome.account_changed);
        }

        if let Some(session) = self.workflow.session() {
            self.cache.sync(session.scene(), self.settings.display.show_grid);
        }

        let Some(gpu) = &mut self.gpu else { return };
        let screen = Vec2::new(gpu.renderer.config.width as f32, gpu.renderer.config.height as f32);
        let view = gpu.renderer.camera.viewport(screen);
        let live = self
            .workflow
            .session()
            .and_then(|s| s.controller().live_placement())
            .or_else(|| PropertyDraft::preview(&self.property_draft));

        let overlay = self.build_overlay(&view, live);
        let Some(gpu) = &mut self.gpu else { return };
        let editing = self.workflow.session();
        if let Some(session) = editing {
            let display = &self.settings.display;
            gpu.renderer.prepare_frame(&FrameData {
                scene: session.scene(),
                cache: &self.cache,
                selection: session.selection(),
                hovered: self.hovered,
                live,
                overlay: &overlay,
                selection_color: display.selection_color,
                hover_color: display.hover_color,
            });
        }

        let output = match gpu.renderer.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let size = gpu.window.inner_size();
                gpu.renderer.resize(size.width, size.height);
                return;
            }
            Err(e) => {
                log::error!("surface error: {e}");
                return;
            }
        };
        let view_tex = output.texture.create_view(&wgpu::TextureViewDescriptor::default());

        let paint_jobs = egui_ctx.tessellate(full_output.shapes, full_output.pixels_per_point);
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [gpu.renderer.config.width, gpu.renderer.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        // Update egui textures
        for (id, delta) in &full_output.textures_delta.set {
            gpu.egui_renderer.update_texture(&gpu.renderer.device, &gpu.renderer.queue, *id, delta);
        }

        // Main 3D render pass
        {
            let bg = self.settings.display.bg_color;
            let mut encoder = gpu.renderer.device.create_command_encoder(
                &wgpu::CommandEncoderDescriptor { label: Some("scene_encoder") },
            );
            {
                let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("main_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view_tex,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(wgpu::Color {
                                r: bg[0] as f64,
                                g: bg[1] as f64,
                                b: bg[2] as f64,
                                a: 1.0,
                            }),
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                        view: &gpu.renderer.depth_view,
                        depth_ops: Some(wgpu::Operations {
                            load: wgpu::LoadOp::Clear(1.0),
                            store: wgpu::StoreOp::Store,
                        }),
                        stencil_ops: None,
                    }),
                    ..Default::default()
                });
                if editing.is_some() {
                    gpu.renderer.render_scene(&mut pass, self.settings.display.show_grid);
                }
            }
            gpu.renderer.queue.submit(std::iter::once(encoder.finish()));
        }

        // Capture the viewport before the panels are drawn over it
        let snapshot = self.snapshot_pending.take().map(|purpose| {
            let path = snapshot_path(&self.settings, purpose);
            let result = if editing.is_some() {
                gpu.renderer.capture_snapshot(&output.texture, &path).map(|_| path)
            } else {
                Err(RenderError::Readback("no room to capture".into()))
            };
            (purpose, result)
        });

        // Egui render pass (separate encoder so egui owns the pass)
        {
            let mut encoder = gpu.renderer.device.create_command_encoder(
                &wgpu::CommandEncoderDescriptor { label: Some("egui_encoder") },
            );

            gpu.egui_renderer.update_buffers(
                &gpu.renderer.device,
                &gpu.renderer.queue,
                &mut encoder,
                &paint_jobs,
                &screen_descriptor,
            );

            {
                let mut pass = encoder
                    .begin_render_pass(&wgpu::RenderPassDescriptor {
                        label: Some("egui_pass"),
                        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                            view: &view_tex,
                            resolve_target: None,
                            ops: wgpu::Operations {
                                load: wgpu::LoadOp::Load,
                                store: wgpu::StoreOp::Store,
                            },
                        })],
                        depth_stencil_attachment: None,
                        ..Default::default()
                    })
                    .forget_lifetime();
                gpu.egui_renderer.render(&mut pass, &paint_jobs, &screen_descriptor);
            }

            gpu.renderer.queue.submit(std::iter::once(encoder.finish()));
        }

        output.present();

        // Free egui textures
        for id in &full_output.textures_delta.free {
            gpu.egui_renderer.free_texture(id);
        }

        if let Some((purpose, result)) = snapshot {
            self.finish_snapshot(purpose, result);
        }
    }
}

fn snapshot_path(settings: &Settings, purpose: SnapshotPurpose) -> PathBuf {
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    let prefix = match purpose {
        SnapshotPurpose::Standalone => "snapshot",
        SnapshotPurpose::Project => "project",
    };
    settings
        .editor
        .projects_dir()
        .join("snapshots")
        .join(format!("{prefix}_{stamp}.png"))
}

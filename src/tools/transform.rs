//! Gizmo drag handling.
//!
//! The controller never writes to the scene. While a drag is in progress it
//! holds a live placement for the dragged instance and reports previews; the
//! session applies the single commit emitted when the drag ends.

use glam::{EulerRot, Quat, Vec2, Vec3};

use crate::render::gizmo::{
    compute_angle_on_axis, hit_test, project_ray_onto_axis, project_ray_onto_plane, GizmoAxis, GizmoFrame,
};
use crate::scene::{clamp_scale, FurnitureInstance, InstanceId, Placement};
use crate::tools::TransformMode;
use crate::util::picking::Viewport;

const EPSILON: f32 = 1e-5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransformIntent {
    /// Live feedback. `delta` is the translation offset, the rotation vector
    /// (axis times angle) or the per-axis scale ratio, depending on `mode`.
    Preview { id: InstanceId, mode: TransformMode, delta: Vec3 },
    /// Final placement to store.
    Commit { id: InstanceId, placement: Placement },
}

#[derive(Debug, Clone)]
struct Drag {
    id: InstanceId,
    axis: GizmoAxis,
    frame: GizmoFrame,
    start: Placement,
    live: Placement,
    /// World position on the constraint where the drag started.
    start_point: Vec3,
    start_angle: f32,
    start_distance: f32,
    moved: bool,
}

#[derive(Debug, Default)]
pub struct TransformController {
    mode: TransformMode,
    hovered: GizmoAxis,
    drag: Option<Drag>,
}

impl TransformController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> TransformMode {
        self.mode
    }

    /// Switch gizmo kind. An active drag ends without committing.
    pub fn set_mode(&mut self, mode: TransformMode) {
        if self.mode == mode {
            return;
        }
        if let Some(drag) = self.drag.take() {
            log::debug!("mode switch abandoned drag on {}", drag.id);
        }
        self.mode = mode;
        self.hovered = GizmoAxis::None;
    }

    pub fn hovered(&self) -> GizmoAxis {
        self.hovered
    }

    pub fn active_axis(&self) -> GizmoAxis {
        self.drag.as_ref().map_or(GizmoAxis::None, |d| d.axis)
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Placement to draw for the dragged instance, if any.
    pub fn live_placement(&self) -> Option<(InstanceId, Placement)> {
        self.drag.as_ref().map(|d| (d.id, d.live))
    }

    /// Gizmo frame for `target`, or None when no gizmo should be shown.
    pub fn frame_for(&self, target: &FurnitureInstance, view: &Viewport) -> Option<GizmoFrame> {
        if target.locked {
            return None;
        }
        if let Some(drag) = &self.drag
            && drag.id == target.id
        {
            let mut frame = drag.frame;
            frame.center = drag.live.position;
            return Some(frame);
        }
        Some(GizmoFrame::new(target.position, target.placement().quat(), self.mode, view.camera_pos))
    }

    /// Handle under the pointer for `target`.
    pub fn hit_handle(&self, mouse: Vec2, target: &FurnitureInstance, view: &Viewport) -> GizmoAxis {
        match self.frame_for(target, view) {
            Some(frame) => hit_test(mouse, &frame, self.mode, view.view_proj, view.screen_size),
            None => GizmoAxis::None,
        }
    }

    pub fn update_hover(&mut self, mouse: Vec2, target: Option<&FurnitureInstance>, view: &Viewport) {
        if self.drag.is_some() {
            return;
        }
        self.hovered = target.map_or(GizmoAxis::None, |t| self.hit_handle(mouse, t, view));
    }

    /// Start dragging if the pointer is on a handle. Returns whether a drag began.
    pub fn begin_drag(&mut self, mouse: Vec2, target: &FurnitureInstance, view: &Viewport) -> bool {
        if target.locked {
            return false;
        }
        let axis = self.hit_handle(mouse, target, view);
        if axis == GizmoAxis::None {
            return false;
        }
        let frame = GizmoFrame::new(target.position, target.placement().quat(), self.mode, view.camera_pos);
        let ray = view.ray(mouse);
        let origin = frame.center;

        let Some(start_point) = constraint_point(self.mode, axis, &frame, &ray, view) else {
            return false;
        };
        let start_angle = if self.mode == TransformMode::Rotate {
            compute_angle_on_axis(start_point, origin, frame.axis_dir(axis))
        } else {
            0.0
        };
        let start_distance = (start_point - origin).dot(frame.axis_dir(axis));

        self.drag = Some(Drag {
            id: target.id,
            axis,
            frame,
            start: target.placement(),
            live: target.placement(),
            start_point,
            start_angle,
            start_distance,
            moved: false,
        });
        self.hovered = axis;
        true
    }

    /// Follow the pointer. Returns a preview when the live placement changed.
    pub fn drag_to(&mut self, mouse: Vec2, view: &Viewport) -> Option<TransformIntent> {
        let mode = self.mode;
        let drag = self.drag.as_mut()?;
        let ray = view.ray(mouse);
        let point = constraint_point(mode, drag.axis, &drag.frame, &ray, view)?;
        let origin = drag.frame.center;

        let delta = match mode {
            TransformMode::Translate => {
                let offset = point - drag.start_point;
                drag.live.position = drag.start.position + offset;
                offset
            }
            TransformMode::Rotate => {
                let axis = drag.frame.axis_dir(drag.axis);
                let angle = compute_angle_on_axis(point, origin, axis) - drag.start_angle;
                let q = Quat::from_axis_angle(axis, angle) * drag.start.quat();
                let (x, y, z) = q.to_euler(EulerRot::XYZ);
                drag.live.rotation = Vec3::new(x, y, z);
                axis * angle
            }
            TransformMode::Scale => {
                let i = drag.axis.index()?;
                let ratio = if drag.start_distance.abs() < EPSILON {
                    1.0
                } else {
                    (point - origin).dot(drag.frame.axes[i]) / drag.start_distance
                };
                let mut factor = Vec3::ONE;
                factor[i] = ratio;
                drag.live.scale = clamp_scale(drag.start.scale * factor);
                factor
            }
        };

        let identity = if mode == TransformMode::Scale { Vec3::ONE } else { Vec3::ZERO };
        if !delta.abs_diff_eq(identity, EPSILON) {
            drag.moved = true;
        }
        Some(TransformIntent::Preview { id: drag.id, mode, delta })
    }

    /// Finish the drag. Emits a commit only if the placement actually changed.
    pub fn end_drag(&mut self) -> Option<TransformIntent> {
        let drag = self.drag.take()?;
        if !drag.moved || drag.live == drag.start {
            return None;
        }
        Some(TransformIntent::Commit { id: drag.id, placement: drag.live })
    }

    /// Abandon the drag. Nothing was written, so nothing needs restoring.
    pub fn cancel_drag(&mut self) {
        self.drag = None;
    }

    /// Forget hover and drag state, e.g. after deselecting.
    pub fn detach(&mut self) {
        self.drag = None;
        self.hovered = GizmoAxis::None;
    }
}

fn constraint_point(
    mode: TransformMode,
    axis: GizmoAxis,
    frame: &GizmoFrame,
    ray: &crate::util::picking::Ray,
    view: &Viewport,
) -> Option<Vec3> {
    let origin = frame.center;
    match mode {
        TransformMode::Rotate => project_ray_onto_plane(ray, origin, frame.axis_dir(axis)),
        _ if axis.is_plane() => project_ray_onto_plane(ray, origin, frame.plane_normal(axis)),
        _ => project_ray_onto_axis(ray, origin, frame.axis_dir(axis), view.camera_forward),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::catalog::Archetype;
    use crate::util::picking::project_to_screen;
    use glam::Mat4;

    const SCREEN: Vec2 = Vec2::new(800.0, 600.0);

    fn viewport() -> Viewport {
        let eye = Vec3::new(4.0, 5.0, 6.0);
        Viewport {
            view_proj: Mat4::perspective_rh(45f32.to_radians(), SCREEN.x / SCREEN.y, 0.1, 100.0)
                * Mat4::look_at_rh(eye, Vec3::ZERO, Vec3::Y),
            screen_size: SCREEN,
            camera_pos: eye,
            camera_forward: (Vec3::ZERO - eye).normalize(),
        }
    }

    fn screen(view: &Viewport, p: Vec3) -> Vec2 {
        project_to_screen(p, view.view_proj, view.screen_size).unwrap()
    }

    fn chair() -> FurnitureInstance {
        FurnitureInstance::from_catalog(Archetype::Chair.info())
    }

    /// Point on the translate X shaft, past the plane handles.
    fn on_x_shaft(view: &Viewport) -> Vec2 {
        let size = view.camera_pos.length() * 0.15;
        screen(view, Vec3::new(size * 0.7, 0.0, 0.0))
    }

    #[test]
    fn translate_drag_commits_once() {
        let view = viewport();
        let target = chair();
        let mut ctl = TransformController::new();
        assert!(ctl.begin_drag(on_x_shaft(&view), &target, &view));
        assert_eq!(ctl.active_axis(), GizmoAxis::X);

        let size = view.camera_pos.length() * 0.15;
        let to = screen(&view, Vec3::new(size * 0.7 + 1.0, 0.0, 0.0));
        let preview = ctl.drag_to(to, &view).unwrap();
        let TransformIntent::Preview { id, mode, delta } = preview else { panic!("expected preview") };
        assert_eq!(id, target.id);
        assert_eq!(mode, TransformMode::Translate);
        assert!(delta.abs_diff_eq(Vec3::X, 1e-2), "{delta:?}");

        let (_, live) = ctl.live_placement().unwrap();
        assert!(live.position.abs_diff_eq(Vec3::X, 1e-2));

        let Some(TransformIntent::Commit { id, placement }) = ctl.end_drag() else { panic!("expected commit") };
        assert_eq!(id, target.id);
        assert!(placement.position.abs_diff_eq(Vec3::X, 1e-2));
        assert!(!ctl.is_dragging());
        assert!(ctl.end_drag().is_none());
    }

    #[test]
    fn unmoved_drag_emits_nothing() {
        let view = viewport();
        let target = chair();
        let mut ctl = TransformController::new();
        let at = on_x_shaft(&view);
        assert!(ctl.begin_drag(at, &target, &view));
        ctl.drag_to(at, &view);
        assert_eq!(ctl.end_drag(), None);
    }

    #[test]
    fn locked_instances_get_no_gizmo() {
        let view = viewport();
        let mut target = chair();
        target.locked = true;
        let mut ctl = TransformController::new();
        assert!(ctl.frame_for(&target, &view).is_none());
        assert!(!ctl.begin_drag(on_x_shaft(&view), &target, &view));
    }

    #[test]
    fn mode_switch_ends_drag_without_commit() {
        let view = viewport();
        let target = chair();
        let mut ctl = TransformController::new();
        assert!(ctl.begin_drag(on_x_shaft(&view), &target, &view));
        ctl.set_mode(TransformMode::Rotate);
        assert!(!ctl.is_dragging());
        assert_eq!(ctl.end_drag(), None);
        assert_eq!(ctl.mode(), TransformMode::Rotate);
    }

    #[test]
    fn miss_does_not_start_drag() {
        let view = viewport();
        let mut ctl = TransformController::new();
        assert!(!ctl.begin_drag(Vec2::new(3.0, 3.0), &chair(), &view));
        assert!(ctl.drag_to(Vec2::new(10.0, 10.0), &view).is_none());
    }

    #[test]
    fn scale_drag_is_clamped() {
        let view = viewport();
        let target = chair();
        let mut ctl = TransformController::new();
        ctl.set_mode(TransformMode::Scale);
        let size = view.camera_pos.length() * 0.15;
        assert!(ctl.begin_drag(screen(&view, Vec3::new(size * 0.8, 0.0, 0.0)), &target, &view));
        // Drag through the origin to the other side: ratio goes negative.
        ctl.drag_to(screen(&view, Vec3::new(-size * 0.8, 0.0, 0.0)), &view);
        let (_, live) = ctl.live_placement().unwrap();
        assert_eq!(live.scale.x, crate::scene::MIN_SCALE);
        assert_eq!(live.scale.y, 1.0);
    }
}

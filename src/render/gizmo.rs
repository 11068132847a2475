use std::f32::consts::TAU;

use glam::{Mat4, Quat, Vec2, Vec3};

use crate::render::vertex::LineVertex;
use crate::tools::TransformMode;
use crate::util::picking::{project_to_screen, Ray};

// Axis colors: X=Red, Y=Green, Z=Blue
const AXIS_COLORS: [[f32; 4]; 3] = [
    [1.0, 0.2, 0.2, 1.0],
    [0.2, 1.0, 0.2, 1.0],
    [0.3, 0.5, 1.0, 1.0],
];
const HIGHLIGHT_COLOR: [f32; 4] = [1.0, 1.0, 0.3, 1.0];
const MARKER_COLOR: [f32; 4] = [0.2, 1.0, 0.2, 0.8];
/// Screen-space pick tolerance for shafts and rings, in pixels.
const PICK_THRESHOLD: f32 = 12.0;
const RING_SEGMENTS: usize = 48;
const RING_RADIUS: f32 = 0.85;
const PLANE_OFFSET: f32 = 0.25;
const PLANE_SIZE: f32 = 0.12;

/// Which gizmo axis or plane the user is interacting with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GizmoAxis {
    #[default]
    None,
    X,
    Y,
    Z,
    XY,
    XZ,
    YZ,
}

impl GizmoAxis {
    const AXES: [GizmoAxis; 3] = [GizmoAxis::X, GizmoAxis::Y, GizmoAxis::Z];

    /// Index of a single-axis handle.
    pub fn index(self) -> Option<usize> {
        match self {
            GizmoAxis::X => Some(0),
            GizmoAxis::Y => Some(1),
            GizmoAxis::Z => Some(2),
            _ => None,
        }
    }

    pub fn is_plane(self) -> bool {
        matches!(self, GizmoAxis::XY | GizmoAxis::XZ | GizmoAxis::YZ)
    }

    /// Index of the axis a plane handle is perpendicular to.
    fn plane_normal_index(self) -> Option<usize> {
        match self {
            GizmoAxis::YZ => Some(0),
            GizmoAxis::XZ => Some(1),
            GizmoAxis::XY => Some(2),
            _ => None,
        }
    }
}

/// Where the gizmo sits and which way its handles point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GizmoFrame {
    pub center: Vec3,
    /// Handle directions. World axes, except for scale, which follows the instance.
    pub axes: [Vec3; 3],
    /// World length of an axis handle.
    pub size: f32,
}

impl GizmoFrame {
    pub fn new(center: Vec3, rotation: Quat, mode: TransformMode, camera_pos: Vec3) -> Self {
        let axes = match mode {
            TransformMode::Scale => [rotation * Vec3::X, rotation * Vec3::Y, rotation * Vec3::Z],
            TransformMode::Translate | TransformMode::Rotate => [Vec3::X, Vec3::Y, Vec3::Z],
        };
        Self {
            center,
            axes,
            size: gizmo_scale(center, camera_pos),
        }
    }

    pub fn axis_dir(&self, axis: GizmoAxis) -> Vec3 {
        axis.index().map_or(Vec3::ZERO, |i| self.axes[i])
    }

    /// Normal of the constraint plane for a plane handle.
    pub fn plane_normal(&self, axis: GizmoAxis) -> Vec3 {
        axis.plane_normal_index().map_or(Vec3::Y, |i| self.axes[i])
    }

    fn plane_corners(&self, axis: GizmoAxis) -> [Vec3; 4] {
        let (a, b) = match axis {
            GizmoAxis::XY => (self.axes[0], self.axes[1]),
            GizmoAxis::XZ => (self.axes[0], self.axes[2]),
            _ => (self.axes[1], self.axes[2]),
        };
        let near = self.size * PLANE_OFFSET;
        let far = near + self.size * PLANE_SIZE;
        [
            self.center + a * near + b * near,
            self.center + a * far + b * near,
            self.center + a * far + b * far,
            self.center + a * near + b * far,
        ]
    }

    fn ring(&self, i: usize) -> Vec<Vec3> {
        let (p1, p2) = perpendiculars(self.axes[i]);
        let radius = self.size * RING_RADIUS;
        (0..=RING_SEGMENTS)
            .map(|s| {
                let a = TAU * s as f32 / RING_SEGMENTS as f32;
                self.center + (p1 * a.cos() + p2 * a.sin()) * radius
            })
            .collect()
    }
}

/// Pickable part of the gizmo.
enum Handle {
    Shaft { axis: GizmoAxis, tip: Vec3 },
    Plane { axis: GizmoAxis, corners: [Vec3; 4] },
    Ring { axis: GizmoAxis, points: Vec<Vec3> },
}

/// Handles in pick priority order: plane squares before shafts.
fn handles(frame: &GizmoFrame, mode: TransformMode) -> Vec<Handle> {
    let mut out = Vec::new();
    match mode {
        TransformMode::Translate => {
            for axis in [GizmoAxis::XY, GizmoAxis::XZ, GizmoAxis::YZ] {
                out.push(Handle::Plane { axis, corners: frame.plane_corners(axis) });
            }
            for (i, axis) in GizmoAxis::AXES.into_iter().enumerate() {
                out.push(Handle::Shaft { axis, tip: frame.center + frame.axes[i] * frame.size });
            }
        }
        TransformMode::Scale => {
            for (i, axis) in GizmoAxis::AXES.into_iter().enumerate() {
                out.push(Handle::Shaft { axis, tip: frame.center + frame.axes[i] * frame.size });
            }
        }
        TransformMode::Rotate => {
            for (i, axis) in GizmoAxis::AXES.into_iter().enumerate() {
                out.push(Handle::Ring { axis, points: frame.ring(i) });
            }
        }
    }
    out
}

/// Compute the gizmo visual scale so it appears constant on screen.
pub fn gizmo_scale(center: Vec3, camera_pos: Vec3) -> f32 {
    let dist = center.distance(camera_pos);
    dist * 0.15
}

/// Generate line vertices for the gizmo.
pub fn build_gizmo_lines(
    frame: &GizmoFrame,
    mode: TransformMode,
    hovered: GizmoAxis,
    active: GizmoAxis,
) -> Vec<LineVertex> {
    let mut verts = Vec::new();
    let lit = |axis: GizmoAxis| axis == hovered || axis == active;

    for handle in handles(frame, mode) {
        match handle {
            Handle::Shaft { axis, tip } => {
                let i = axis.index().unwrap_or(0);
                let color = if lit(axis) { HIGHLIGHT_COLOR } else { AXIS_COLORS[i] };
                let dir = frame.axes[i];
                verts.push(lv(frame.center, color));
                verts.push(lv(tip, color));

                let (p1, p2) = perpendiculars(dir);
                if mode == TransformMode::Translate {
                    // Arrow head
                    let base = tip - dir * frame.size * 0.2;
                    let r = frame.size * 0.06;
                    let rim = [base + p1 * r, base + p2 * r, base - p1 * r, base - p2 * r];
                    for j in 0..4 {
                        verts.push(lv(tip, color));
                        verts.push(lv(rim[j], color));
                        verts.push(lv(rim[j], color));
                        verts.push(lv(rim[(j + 1) % 4], color));
                    }
                } else {
                    // Square cap
                    let c = frame.size * 0.05;
                    let cap = [
                        tip + (p1 + p2) * c,
                        tip + (p2 - p1) * c,
                        tip - (p1 + p2) * c,
                        tip + (p1 - p2) * c,
                    ];
                    push_loop(&mut verts, &cap, color);
                }
            }
            Handle::Plane { axis, corners } => {
                let color = if lit(axis) {
                    [1.0, 1.0, 0.3, 0.8]
                } else {
                    let mut c = AXIS_COLORS[axis.plane_normal_index().unwrap_or(0)];
                    c[3] = 0.5;
                    c
                };
                push_loop(&mut verts, &corners, color);
            }
            Handle::Ring { axis, points } => {
                let i = axis.index().unwrap_or(0);
                let color = if lit(axis) { HIGHLIGHT_COLOR } else { AXIS_COLORS[i] };
                for pair in points.windows(2) {
                    verts.push(lv(pair[0], color));
                    verts.push(lv(pair[1], color));
                }
            }
        }
    }

    verts
}

/// Small diamond floating above a selected instance.
pub fn build_selection_marker(top: Vec3, size: f32) -> Vec<LineVertex> {
    let c = top + Vec3::Y * 0.5;
    let tips = [
        c + Vec3::X * size,
        c + Vec3::Z * size,
        c - Vec3::X * size,
        c - Vec3::Z * size,
    ];
    let mut verts = Vec::with_capacity(24);
    push_loop(&mut verts, &tips, MARKER_COLOR);
    for t in tips {
        for pole in [c + Vec3::Y * size, c - Vec3::Y * size] {
            verts.push(lv(t, MARKER_COLOR));
            verts.push(lv(pole, MARKER_COLOR));
        }
    }
    verts
}

/// Wireframe of a local-space bounding box placed by `model`.
pub fn build_box_outline(min: Vec3, max: Vec3, model: Mat4, color: [f32; 4]) -> Vec<LineVertex> {
    let corner = |i: usize| {
        let p = Vec3::new(
            if i & 1 == 0 { min.x } else { max.x },
            if i & 2 == 0 { min.y } else { max.y },
            if i & 4 == 0 { min.z } else { max.z },
        );
        model.transform_point3(p)
    };
    let mut verts = Vec::with_capacity(24);
    for i in 0..8 {
        for bit in [1, 2, 4] {
            if i & bit == 0 {
                verts.push(lv(corner(i), color));
                verts.push(lv(corner(i | bit), color));
            }
        }
    }
    verts
}

/// Hit-test the gizmo in screen space. Returns which axis/plane the mouse is over.
pub fn hit_test(
    mouse_pos: Vec2,
    frame: &GizmoFrame,
    mode: TransformMode,
    view_proj: Mat4,
    screen_size: Vec2,
) -> GizmoAxis {
    let Some(center_2d) = project_to_screen(frame.center, view_proj, screen_size) else {
        return GizmoAxis::None;
    };
    let to_screen = |p: Vec3| project_to_screen(p, view_proj, screen_size);

    let mut best = GizmoAxis::None;
    let mut best_dist = PICK_THRESHOLD;
    for handle in handles(frame, mode) {
        match handle {
            Handle::Plane { axis, corners } => {
                let projected: Option<Vec<Vec2>> = corners.iter().map(|&p| to_screen(p)).collect();
                if let Some(q) = projected
                    && point_in_quad_2d(mouse_pos, q[0], q[1], q[2], q[3])
                {
                    return axis;
                }
            }
            Handle::Shaft { axis, tip } => {
                if let Some(tip_2d) = to_screen(tip) {
                    let d = point_to_segment_dist(mouse_pos, center_2d, tip_2d);
                    if d < best_dist {
                        best_dist = d;
                        best = axis;
                    }
                }
            }
            Handle::Ring { axis, points } => {
                for pair in points.windows(2) {
                    if let (Some(s0), Some(s1)) = (to_screen(pair[0]), to_screen(pair[1])) {
                        let d = point_to_segment_dist(mouse_pos, s0, s1);
                        if d < best_dist {
                            best_dist = d;
                            best = axis;
                        }
                    }
                }
            }
        }
    }
    best
}

/// Project mouse ray onto a constraint axis, returning the world-space point on the axis.
pub fn project_ray_onto_axis(
    ray: &Ray,
    origin: Vec3,
    axis: Vec3,
    camera_forward: Vec3,
) -> Option<Vec3> {
    let plane_normal = constraint_plane_normal(axis, camera_forward);
    let t = ray.intersect_plane(origin, plane_normal)?;
    let point = ray.point_at(t);
    let along = (point - origin).dot(axis);
    Some(origin + axis * along)
}

/// Project mouse ray onto a constraint plane, returning the world-space point.
pub fn project_ray_onto_plane(
    ray: &Ray,
    origin: Vec3,
    plane_normal: Vec3,
) -> Option<Vec3> {
    let t = ray.intersect_plane(origin, plane_normal)?;
    Some(ray.point_at(t))
}

/// Angle of `point` around `axis`, measured in the plane through `origin`.
pub fn compute_angle_on_axis(point: Vec3, origin: Vec3, axis: Vec3) -> f32 {
    let (p1, p2) = perpendiculars(axis);
    let rel = point - origin;
    rel.dot(p2).atan2(rel.dot(p1))
}

/// Normal of the plane containing `axis` that faces the camera best.
fn constraint_plane_normal(axis: Vec3, camera_forward: Vec3) -> Vec3 {
    let cross = camera_forward.cross(axis);
    if cross.length_squared() < 1e-6 {
        // Looking straight down the axis
        let fallback = if axis.x.abs() < 0.9 { Vec3::X } else { Vec3::Y };
        fallback.cross(axis).normalize()
    } else {
        cross.cross(axis).normalize()
    }
}

// --- helpers ---

fn perpendiculars(axis: Vec3) -> (Vec3, Vec3) {
    let ref_vec = if axis.y.abs() < 0.9 { Vec3::Y } else { Vec3::X };
    let p1 = axis.cross(ref_vec).normalize();
    let p2 = axis.cross(p1).normalize();
    (p1, p2)
}

fn lv(pos: Vec3, color: [f32; 4]) -> LineVertex {
    LineVertex {
        position: pos.into(),
        color,
    }
}

fn push_loop(verts: &mut Vec<LineVertex>, points: &[Vec3], color: [f32; 4]) {
    for j in 0..points.len() {
        verts.push(lv(points[j], color));
        verts.push(lv(points[(j + 1) % points.len()], color));
    }
}

/// Distance from a point to a line segment in 2D.
fn point_to_segment_dist(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq < 1e-6 {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

fn point_in_quad_2d(p: Vec2, a: Vec2, b: Vec2, c: Vec2, d: Vec2) -> bool {
    point_in_tri_2d(p, a, b, c) || point_in_tri_2d(p, a, c, d)
}

fn point_in_tri_2d(p: Vec2, a: Vec2, b: Vec2, c: Vec2) -> bool {
    let v0 = c - a;
    let v1 = b - a;
    let v2 = p - a;
    let d00 = v0.dot(v0);
    let d01 = v0.dot(v1);
    let d02 = v0.dot(v2);
    let d11 = v1.dot(v1);
    let d12 = v1.dot(v2);
    let denom = d00 * d11 - d01 * d01;
    if denom.abs() < 1e-9 {
        return false;
    }
    let u = (d11 * d02 - d01 * d12) / denom;
    let v = (d00 * d12 - d01 * d02) / denom;
    u >= 0.0 && v >= 0.0 && u + v <= 1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCREEN: Vec2 = Vec2::new(800.0, 600.0);

    fn view_proj(eye: Vec3) -> Mat4 {
        Mat4::perspective_rh(45f32.to_radians(), SCREEN.x / SCREEN.y, 0.1, 100.0)
            * Mat4::look_at_rh(eye, Vec3::ZERO, Vec3::Y)
    }

    fn unit_frame() -> GizmoFrame {
        GizmoFrame { center: Vec3::ZERO, axes: [Vec3::X, Vec3::Y, Vec3::Z], size: 1.0 }
    }

    #[test]
    fn picks_translate_shaft() {
        let vp = view_proj(Vec3::new(3.0, 4.0, 5.0));
        let f = unit_frame();
        let mouse = project_to_screen(Vec3::new(0.75, 0.0, 0.0), vp, SCREEN).unwrap();
        assert_eq!(hit_test(mouse, &f, TransformMode::Translate, vp, SCREEN), GizmoAxis::X);
    }

    #[test]
    fn plane_handle_wins_over_shafts() {
        let vp = view_proj(Vec3::new(3.0, 4.0, 5.0));
        let f = unit_frame();
        let mid = Vec3::new(0.31, 0.0, 0.31);
        let mouse = project_to_screen(mid, vp, SCREEN).unwrap();
        assert_eq!(hit_test(mouse, &f, TransformMode::Translate, vp, SCREEN), GizmoAxis::XZ);
    }

    #[test]
    fn picks_rotate_ring() {
        let vp = view_proj(Vec3::new(3.0, 4.0, 5.0));
        let f = unit_frame();
        let on_y_ring = Vec3::new(0.6, 0.0, 0.6);
        let mouse = project_to_screen(on_y_ring, vp, SCREEN).unwrap();
        assert_eq!(hit_test(mouse, &f, TransformMode::Rotate, vp, SCREEN), GizmoAxis::Y);
    }

    #[test]
    fn far_mouse_misses() {
        let vp = view_proj(Vec3::new(3.0, 4.0, 5.0));
        let f = unit_frame();
        assert_eq!(hit_test(Vec2::new(5.0, 5.0), &f, TransformMode::Scale, vp, SCREEN), GizmoAxis::None);
    }

    #[test]
    fn scale_frame_follows_rotation() {
        let rot = Quat::from_rotation_y(std::f32::consts::FRAC_PI_2);
        let f = GizmoFrame::new(Vec3::ZERO, rot, TransformMode::Scale, Vec3::new(0.0, 0.0, 10.0));
        assert!(f.axes[0].abs_diff_eq(-Vec3::Z, 1e-5));
        let t = GizmoFrame::new(Vec3::ZERO, rot, TransformMode::Translate, Vec3::new(0.0, 0.0, 10.0));
        assert_eq!(t.axes[0], Vec3::X);
        assert!((t.size - 1.5).abs() < 1e-5);
    }

    #[test]
    fn axis_projection_stays_on_axis() {
        let ray = Ray { origin: Vec3::new(2.0, 5.0, 5.0), direction: Vec3::new(0.0, -1.0, -1.0).normalize() };
        let p = project_ray_onto_axis(&ray, Vec3::ZERO, Vec3::X, ray.direction).unwrap();
        assert!(p.y.abs() < 1e-4 && p.z.abs() < 1e-4);
        assert!((p.x - 2.0).abs() < 1e-3);
    }

    #[test]
    fn angle_is_measured_around_axis() {
        let a0 = compute_angle_on_axis(Vec3::X, Vec3::ZERO, Vec3::Y);
        let a1 = compute_angle_on_axis(Vec3::Z, Vec3::ZERO, Vec3::Y);
        let diff = (a1 - a0).rem_euclid(TAU);
        assert!((diff - std::f32::consts::FRAC_PI_2).abs() < 1e-4 || (diff - 3.0 * std::f32::consts::FRAC_PI_2).abs() < 1e-4);
    }

    #[test]
    fn box_outline_has_twelve_edges() {
        let m = Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0));
        let verts = build_box_outline(Vec3::ZERO, Vec3::ONE, m, MARKER_COLOR);
        assert_eq!(verts.len(), 24);
        for pair in verts.chunks(2) {
            let a = Vec3::from(pair[0].position);
            let b = Vec3::from(pair[1].position);
            assert!((a.distance(b) - 1.0).abs() < 1e-6);
            assert!(a.x >= 1.0 && b.x <= 2.0);
        }
    }
}

use std::f32::consts::{PI, TAU};

use glam::{Vec3, Vec4};
use crate::geometry::mesh::Face;

/// Generate a box (6 quad faces) centered at `center` with `half_size` extents.
pub fn generate_box(center: Vec3, half_size: Vec3, color: Vec4) -> Vec<Face> {
    let h = half_size;
    vec![
        Face::rect(center + Vec3::new(0.0, h.y, 0.0), Vec3::Y, h.x, h.z, color),
        Face::rect(center - Vec3::new(0.0, h.y, 0.0), -Vec3::Y, h.x, h.z, color),
        Face::rect(center + Vec3::new(0.0, 0.0, h.z), Vec3::Z, h.x, h.y, color),
        Face::rect(center - Vec3::new(0.0, 0.0, h.z), -Vec3::Z, h.x, h.y, color),
        Face::rect(center + Vec3::new(h.x, 0.0, 0.0), Vec3::X, h.z, h.y, color),
        Face::rect(center - Vec3::new(h.x, 0.0, 0.0), -Vec3::X, h.z, h.y, color),
    ]
}

fn ring_point(center: Vec3, radius: f32, y: f32, i: usize, segments: usize) -> Vec3 {
    let a = TAU * (i as f32) / (segments as f32);
    center + Vec3::new(radius * a.sin(), y, radius * a.cos())
}

/// Generate a cylinder with `segments` side quads plus top/bottom caps.
pub fn generate_cylinder(center: Vec3, radius: f32, height: f32, segments: usize, color: Vec4) -> Vec<Face> {
    let half_h = height * 0.5;
    let segments = segments.max(3);
    let mut faces = Vec::with_capacity(segments * 3);
    let tc = center + Vec3::new(0.0, half_h, 0.0);
    let bc = center - Vec3::new(0.0, half_h, 0.0);

    for i in 0..segments {
        let bl = ring_point(center, radius, -half_h, i, segments);
        let br = ring_point(center, radius, -half_h, i + 1, segments);
        let tr = ring_point(center, radius, half_h, i + 1, segments);
        let tl = ring_point(center, radius, half_h, i, segments);
        faces.push(Face::new([bl, br, tr, tl], color));
        faces.push(Face::new([tc, tl, tr, tc], color));
        faces.push(Face::new([bc, br, bl, bc], color));
    }

    faces
}

/// Generate a cone with its apex up. `open` leaves out the base cap.
pub fn generate_cone(center: Vec3, radius: f32, height: f32, segments: usize, open: bool, color: Vec4) -> Vec<Face> {
    let half_h = height * 0.5;
    let segments = segments.max(3);
    let apex = center + Vec3::new(0.0, half_h, 0.0);
    let bc = center - Vec3::new(0.0, half_h, 0.0);
    let mut faces = Vec::with_capacity(segments * 2);

    for i in 0..segments {
        let b0 = ring_point(center, radius, -half_h, i, segments);
        let b1 = ring_point(center, radius, -half_h, i + 1, segments);
        faces.push(Face::new([b0, b1, apex, apex], color));
        if !open {
            faces.push(Face::new([bc, b1, b0, bc], color));
        }
    }

    faces
}

/// Generate a UV-sphere tessellated into quads.
pub fn generate_sphere(center: Vec3, radius: f32, rings: usize, segments: usize, color: Vec4) -> Vec<Face> {
    let rings = rings.max(2);
    let segments = segments.max(3);
    let mut faces = Vec::with_capacity(rings * segments);

    for ring in 0..rings {
        let theta0 = PI * (ring as f32) / (rings as f32);
        let theta1 = PI * ((ring + 1) as f32) / (rings as f32);
        let (st0, ct0) = (theta0.sin(), theta0.cos());
        let (st1, ct1) = (theta1.sin(), theta1.cos());

        for seg in 0..segments {
            let phi0 = TAU * (seg as f32) / (segments as f32);
            let phi1 = TAU * ((seg + 1) as f32) / (segments as f32);
            let (sp0, cp0) = (phi0.sin(), phi0.cos());
            let (sp1, cp1) = (phi1.sin(), phi1.cos());

            let p00 = center + radius * Vec3::new(st0 * sp0, ct0, st0 * cp0);
            let p10 = center + radius * Vec3::new(st1 * sp0, ct1, st1 * cp0);
            let p11 = center + radius * Vec3::new(st1 * sp1, ct1, st1 * cp1);
            let p01 = center + radius * Vec3::new(st0 * sp1, ct0, st0 * cp1);

            // Pole rings collapse one edge; rotate the winding so the first
            // three corners stay distinct.
            let positions = if ring == 0 {
                [p10, p11, p01, p00]
            } else if ring == rings - 1 {
                [p01, p00, p10, p11]
            } else {
                [p00, p10, p11, p01]
            };
            faces.push(Face::new(positions, color));
        }
    }

    faces
}

use glam::{Mat4, Vec3, Vec4};
use crate::render::Vertex;

/// A single quad face (4 vertices, 2 triangles). Triangles are stored as
/// degenerate quads with a repeated corner.
#[derive(Clone, Debug, PartialEq)]
pub struct Face {
    pub positions: [Vec3; 4],
    /// Linear RGBA.
    pub color: Vec4,
}

impl Face {
    pub fn new(positions: [Vec3; 4], color: Vec4) -> Self {
        Self { positions, color }
    }

    /// Axis-aligned rectangle on the plane perpendicular to `normal`, wound
    /// counter-clockwise when seen from the `normal` side.
    pub fn rect(center: Vec3, normal: Vec3, half_w: f32, half_h: f32, color: Vec4) -> Self {
        let (right, up) = tangent_basis(normal);
        let r = right * half_w;
        let u = up * half_h;

        Self {
            positions: [
                center - r - u,
                center + r - u,
                center + r + u,
                center - r + u,
            ],
            color,
        }
    }

    pub fn vertices(&self) -> [Vertex; 4] {
        let normal = self.normal();
        std::array::from_fn(|i| Vertex {
            position: self.positions[i].into(),
            normal: normal.into(),
            color: self.color.into(),
        })
    }

    /// The two triangles forming this quad (indices 0,1,2 and 0,2,3).
    pub fn indices(base: u32) -> [u32; 6] {
        [base, base + 1, base + 2, base, base + 2, base + 3]
    }

    pub fn normal(&self) -> Vec3 {
        let e1 = self.positions[1] - self.positions[0];
        let e2 = self.positions[2] - self.positions[0];
        e1.cross(e2).normalize_or_zero()
    }

    pub fn transformed(&self, m: &Mat4) -> Face {
        Face {
            positions: self.positions.map(|p| m.transform_point3(p)),
            color: self.color,
        }
    }
}

/// Compute a tangent basis (right, up) for a given normal direction.
fn tangent_basis(normal: Vec3) -> (Vec3, Vec3) {
    let n = normal.normalize();
    let reference = if n.y.abs() > 0.9 { Vec3::Z } else { Vec3::Y };
    let right = reference.cross(n).normalize();
    let up = n.cross(right).normalize();
    (right, up)
}

/// Axis-aligned bounds of a face list.
pub fn bounds(faces: &[Face]) -> Option<(Vec3, Vec3)> {
    let mut iter = faces.iter().flat_map(|f| f.positions);
    let first = iter.next()?;
    Some(iter.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p))))
}

/// Flatten faces into vertex and index arrays for upload.
pub fn triangulate(faces: &[Face]) -> (Vec<Vertex>, Vec<u32>) {
    let mut vertices = Vec::with_capacity(faces.len() * 4);
    let mut indices = Vec::with_capacity(faces.len() * 6);
    for face in faces {
        let base = vertices.len() as u32;
        vertices.extend_from_slice(&face.vertices());
        indices.extend_from_slice(&Face::indices(base));
    }
    (vertices, indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_faces_its_normal() {
        for n in [Vec3::X, -Vec3::X, Vec3::Y, -Vec3::Y, Vec3::Z, -Vec3::Z] {
            let face = Face::rect(Vec3::ZERO, n, 1.0, 2.0, Vec4::ONE);
            assert!(face.normal().abs_diff_eq(n, 1e-5), "{n:?}");
        }
    }

    #[test]
    fn degenerate_triangle_has_normal() {
        let face = Face::new([Vec3::ZERO, Vec3::X, Vec3::Z, Vec3::ZERO], Vec4::ONE);
        assert!(face.normal().abs_diff_eq(-Vec3::Y, 1e-5));
    }

    #[test]
    fn triangulate_offsets_indices() {
        let faces = vec![
            Face::rect(Vec3::ZERO, Vec3::Y, 1.0, 1.0, Vec4::ONE),
            Face::rect(Vec3::Y, Vec3::Y, 1.0, 1.0, Vec4::ONE),
        ];
        let (v, i) = triangulate(&faces);
        assert_eq!(v.len(), 8);
        assert_eq!(&i[6..], &[4, 5, 6, 4, 6, 7]);
    }
}

//! Procedural furniture shapes.
//!
//! Every archetype is decomposed into a handful of colored primitives placed
//! relative to the instance origin, which sits on the floor at the footprint
//! center. Output depends only on the inputs.

use glam::{Vec3, Vec4};

use crate::geometry::mesh::Face;
use crate::geometry::primitives::{generate_box, generate_cone, generate_cylinder, generate_sphere};
use crate::scene::catalog::Archetype;
use crate::scene::color::Color;

const HANDLE_COLOR: Color = Color::hex(0x333333);
const LEG_SEGMENTS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Primitive {
    Box { size: Vec3 },
    Cylinder { radius: f32, height: f32, segments: usize },
    Cone { radius: f32, height: f32, segments: usize, open: bool },
    Sphere { radius: f32, rings: usize, segments: usize },
}

impl Primitive {
    pub fn tessellate(&self, center: Vec3, color: Vec4) -> Vec<Face> {
        match *self {
            Primitive::Box { size } => generate_box(center, size * 0.5, color),
            Primitive::Cylinder { radius, height, segments } => {
                generate_cylinder(center, radius, height, segments, color)
            }
            Primitive::Cone { radius, height, segments, open } => {
                generate_cone(center, radius, height, segments, open, color)
            }
            Primitive::Sphere { radius, rings, segments } => {
                generate_sphere(center, radius, rings, segments, color)
            }
        }
    }
}

/// One colored primitive. `offset` is the primitive's center in instance space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Part {
    pub primitive: Primitive,
    pub offset: Vec3,
    pub color: Color,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub offset: Vec3,
    pub color: Color,
    pub intensity: f32,
    /// Distance at which the light has fully faded, in meters.
    pub range: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Shape {
    pub parts: Vec<Part>,
    pub lights: Vec<PointLight>,
}

impl Shape {
    fn part(&mut self, primitive: Primitive, offset: Vec3, color: Color) {
        self.parts.push(Part { primitive, offset, color });
    }

    fn slab(&mut self, size: Vec3, offset: Vec3, color: Color) {
        self.part(Primitive::Box { size }, offset, color);
    }

    /// All parts as faces in instance space.
    pub fn tessellate(&self) -> Vec<Face> {
        self.parts
            .iter()
            .flat_map(|p| p.primitive.tessellate(p.offset, p.color.to_linear()))
            .collect()
    }
}

/// Build the shape for `archetype` at the given size (w, h, d in meters).
pub fn build_furniture_shape(archetype: Archetype, dimensions: Vec3, color: Color) -> Shape {
    let (w, h, d) = (dimensions.x, dimensions.y, dimensions.z);
    // Most parts are laid out around the vertical center of the footprint box.
    let mid = Vec3::new(0.0, h / 2.0, 0.0);
    let mut shape = Shape::default();

    match archetype {
        Archetype::Sofa => {
            shape.slab(Vec3::new(w, h / 2.0, d), mid + Vec3::new(0.0, -h / 4.0, 0.0), color);
            shape.slab(Vec3::new(w, h / 2.0, d * 0.2), mid + Vec3::new(0.0, h / 4.0, -d / 2.0 + d * 0.1), color);
            for side in [-1.0, 1.0] {
                shape.slab(Vec3::new(w * 0.2, h / 2.0, d), mid + Vec3::new(side * (w / 2.0 - w * 0.1), 0.0, 0.0), color);
            }
        }
        Archetype::Table => {
            shape.slab(Vec3::new(w, 0.1, d), mid + Vec3::new(0.0, h / 2.0 - 0.05, 0.0), color);
            for (x, z) in corners() {
                let leg = Primitive::Cylinder { radius: 0.05, height: h, segments: LEG_SEGMENTS };
                shape.part(leg, mid + Vec3::new(x * (w / 2.0 - 0.1), -0.05, z * (d / 2.0 - 0.1)), color);
            }
        }
        Archetype::Chair => {
            shape.slab(Vec3::new(w, 0.1, d), mid, color);
            shape.slab(Vec3::new(w, h, 0.1), mid + Vec3::new(0.0, h / 2.0, -d / 2.0 + 0.05), color);
            for (x, z) in corners() {
                let leg = Primitive::Cylinder { radius: 0.03, height: h, segments: LEG_SEGMENTS };
                shape.part(leg, mid + Vec3::new(x * (w / 2.0 - 0.05), -h / 2.0, z * (d / 2.0 - 0.05)), color);
            }
        }
        Archetype::Bed => {
            shape.slab(Vec3::new(w, h * 0.6, d), mid + Vec3::new(0.0, -h * 0.2, 0.0), color);
            shape.slab(Vec3::new(w, h, 0.2), mid + Vec3::new(0.0, h * 0.3, -d / 2.0 + 0.1), color);
            shape.slab(Vec3::new(w * 0.6, 0.2, 0.4), mid + Vec3::new(0.0, 0.0, -d / 2.0 + 0.6), Color::WHITE);
        }
        Archetype::Lamp => {
            let shade_at = mid + Vec3::new(0.0, h / 3.0, 0.0);
            let shade = Primitive::Cone { radius: w / 2.0, height: h / 3.0, segments: 32, open: true };
            shape.part(shade, shade_at, color);
            let pole = Primitive::Cylinder { radius: 0.05, height: h * 0.66, segments: 12 };
            shape.part(pole, mid + Vec3::new(0.0, -h / 6.0, 0.0), color);
            shape.lights.push(PointLight {
                offset: shade_at,
                color: Color::WHITE,
                intensity: 1.5,
                range: 5.0,
            });
        }
        Archetype::Storage => {
            shape.slab(dimensions, mid, color);
            for y in [-0.2, 0.0, 0.2] {
                shape.slab(Vec3::new(w * 0.9, 0.02, 0.05), mid + Vec3::new(0.0, y * h, d / 2.0 + 0.01), HANDLE_COLOR);
            }
        }
        Archetype::Rug => {
            shape.slab(Vec3::new(w, 0.02, d), Vec3::new(0.0, 0.01, 0.0), color);
        }
        Archetype::Decor => {
            let sphere = Primitive::Sphere { radius: w / 2.0, rings: 16, segments: 32 };
            shape.part(sphere, mid, color);
        }
    }

    shape
}

/// Like [`build_furniture_shape`], but keyed by type name. Unknown names get a
/// plain bounding box.
pub fn build_shape_for_type(type_name: &str, dimensions: Vec3, color: Color) -> Shape {
    match type_name.parse::<Archetype>() {
        Ok(archetype) => build_furniture_shape(archetype, dimensions, color),
        Err(_) => {
            log::debug!("no shape for '{type_name}', using a bounding box");
            let mut shape = Shape::default();
            shape.slab(dimensions, Vec3::new(0.0, dimensions.y / 2.0, 0.0), color);
            shape
        }
    }
}

fn corners() -> [(f32, f32); 4] {
    [(-1.0, -1.0), (-1.0, 1.0), (1.0, -1.0), (1.0, 1.0)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::mesh::bounds;

    fn count_where(shape: &Shape, f: impl Fn(&Primitive) -> bool) -> usize {
        shape.parts.iter().filter(|p| f(&p.primitive)).count()
    }

    #[test]
    fn sofa_is_four_slabs() {
        let shape = build_furniture_shape(Archetype::Sofa, Vec3::new(2.2, 0.8, 0.9), Color::hex(0x334155));
        assert_eq!(shape.parts.len(), 4);
        assert!(shape.parts.iter().all(|p| matches!(p.primitive, Primitive::Box { .. })));
        assert!(shape.lights.is_empty());
    }

    #[test]
    fn table_and_chair_have_four_legs() {
        let table = build_furniture_shape(Archetype::Table, Vec3::new(1.2, 0.4, 0.6), Color::WHITE);
        let legs = count_where(&table, |p| matches!(p, Primitive::Cylinder { radius, .. } if *radius == 0.05));
        assert_eq!(legs, 4);

        let chair = build_furniture_shape(Archetype::Chair, Vec3::new(0.8, 0.9, 0.8), Color::WHITE);
        let legs = count_where(&chair, |p| matches!(p, Primitive::Cylinder { radius, .. } if *radius == 0.03));
        assert_eq!(legs, 4);
    }

    #[test]
    fn lamp_emits_one_light_at_the_shade() {
        let shape = build_furniture_shape(Archetype::Lamp, Vec3::new(0.4, 1.6, 0.4), Color::hex(0xf59e0b));
        assert_eq!(shape.lights.len(), 1);
        let light = shape.lights[0];
        assert_eq!(light.intensity, 1.5);
        assert_eq!(light.range, 5.0);
        let shade = shape.parts.iter().find(|p| matches!(p.primitive, Primitive::Cone { open: true, .. })).unwrap();
        assert_eq!(shade.offset, light.offset);
    }

    #[test]
    fn storage_handles_are_dark() {
        let shape = build_furniture_shape(Archetype::Storage, Vec3::new(1.0, 1.8, 0.4), Color::hex(0x475569));
        let handles: Vec<_> = shape.parts.iter().filter(|p| p.color == HANDLE_COLOR).collect();
        assert_eq!(handles.len(), 3);
    }

    #[test]
    fn bed_pillow_ignores_instance_color() {
        let shape = build_furniture_shape(Archetype::Bed, Vec3::new(1.6, 1.0, 2.0), Color::hex(0xef4444));
        assert_eq!(shape.parts.iter().filter(|p| p.color == Color::WHITE).count(), 1);
    }

    #[test]
    fn rug_and_decor_sit_on_the_floor() {
        let rug = build_furniture_shape(Archetype::Rug, Vec3::new(3.0, 0.02, 2.0), Color::WHITE);
        let (lo, hi) = bounds(&rug.tessellate()).unwrap();
        assert!(lo.y.abs() < 1e-5);
        assert!((hi.y - 0.02).abs() < 1e-5);

        let decor = build_furniture_shape(Archetype::Decor, Vec3::splat(0.3), Color::WHITE);
        let (lo, _) = bounds(&decor.tessellate()).unwrap();
        assert!(lo.y.abs() < 1e-4);
    }

    #[test]
    fn unknown_type_is_a_bounding_box() {
        let dims = Vec3::new(1.0, 2.0, 3.0);
        let shape = build_shape_for_type("piano", dims, Color::WHITE);
        assert_eq!(shape.parts.len(), 1);
        let (lo, hi) = bounds(&shape.tessellate()).unwrap();
        assert!((hi - lo).abs_diff_eq(dims, 1e-5));
        assert_eq!(build_shape_for_type("shelf", dims, Color::WHITE), build_furniture_shape(Archetype::Storage, dims, Color::WHITE));
    }

    #[test]
    fn deterministic() {
        let a = build_furniture_shape(Archetype::Chair, Vec3::new(0.8, 0.9, 0.8), Color::WHITE);
        let b = build_furniture_shape(Archetype::Chair, Vec3::new(0.8, 0.9, 0.8), Color::WHITE);
        assert_eq!(a, b);
    }
}

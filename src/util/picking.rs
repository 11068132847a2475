use glam::{Mat4, Vec2, Vec3, Vec4Swizzles};

use crate::geometry::ShapeCache;
use crate::scene::room::SurfaceKey;
use crate::scene::{InstanceId, Placement, Scene};
use crate::tools::edit::Selection;

/// A ray in 3D space with origin and direction.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

/// Nearest thing under the pointer.
#[derive(Debug, Clone, PartialEq)]
pub struct PickHit {
    pub target: Selection,
    pub distance: f32,
    pub position: Vec3,
}

/// Camera state needed to turn pointer positions into rays and back.
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    pub view_proj: Mat4,
    pub screen_size: Vec2,
    pub camera_pos: Vec3,
    pub camera_forward: Vec3,
}

impl Viewport {
    pub fn ray(&self, screen_pos: Vec2) -> Ray {
        Ray::from_screen(screen_pos, self.screen_size, self.view_proj)
    }
}

impl Ray {
    /// Create a ray from screen coordinates (pixels) through the camera.
    /// `screen_pos` is in pixels from top-left, `screen_size` is viewport width/height.
    pub fn from_screen(
        screen_pos: Vec2,
        screen_size: Vec2,
        view_proj: Mat4,
    ) -> Self {
        // Convert screen coords to NDC (-1..1)
        let ndc_x = (2.0 * screen_pos.x / screen_size.x) - 1.0;
        let ndc_y = 1.0 - (2.0 * screen_pos.y / screen_size.y); // Y is flipped

        let inv_vp = view_proj.inverse();

        let near_point = inv_vp.project_point3(Vec3::new(ndc_x, ndc_y, -1.0));
        let far_point = inv_vp.project_point3(Vec3::new(ndc_x, ndc_y, 1.0));

        let direction = (far_point - near_point).normalize();

        Self {
            origin: near_point,
            direction,
        }
    }

    /// Intersect ray with a triangle (Möller–Trumbore algorithm).
    /// Returns distance along ray if hit, None if miss.
    pub fn intersect_triangle(&self, v0: Vec3, v1: Vec3, v2: Vec3) -> Option<f32> {
        let edge1 = v1 - v0;
        let edge2 = v2 - v0;
        let h = self.direction.cross(edge2);
        let a = edge1.dot(h);

        if a.abs() < 1e-7 {
            return None; // Parallel to triangle
        }

        let f = 1.0 / a;
        let s = self.origin - v0;
        let u = f * s.dot(h);

        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(edge1);
        let v = f * self.direction.dot(q);

        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = f * edge2.dot(q);
        if t > 1e-7 {
            Some(t)
        } else {
            None
        }
    }

    /// Intersect ray with a quad (two triangles: 0-1-2 and 0-2-3).
    pub fn intersect_quad(&self, positions: &[Vec3; 4]) -> Option<f32> {
        let t1 = self.intersect_triangle(positions[0], positions[1], positions[2]);
        let t2 = self.intersect_triangle(positions[0], positions[2], positions[3]);

        match (t1, t2) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (Some(a), None) => Some(a),
            (None, Some(b)) => Some(b),
            (None, None) => None,
        }
    }

    /// Intersect ray with an infinite plane defined by a point and normal.
    /// Returns distance along ray if hit, None if parallel.
    pub fn intersect_plane(&self, plane_point: Vec3, plane_normal: Vec3) -> Option<f32> {
        let denom = plane_normal.dot(self.direction);
        if denom.abs() < 1e-7 {
            return None;
        }
        let t = (plane_point - self.origin).dot(plane_normal) / denom;
        if t > 0.0 { Some(t) } else { None }
    }

    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Project a 3D point to 2D screen coordinates.
/// Returns None if the point is behind the camera.
pub fn project_to_screen(pos: Vec3, view_proj: Mat4, screen_size: Vec2) -> Option<Vec2> {
    let clip = view_proj * pos.extend(1.0);
    if clip.w <= 0.0 {
        return None;
    }
    let ndc = clip.xyz() / clip.w;
    Some(Vec2::new(
        (ndc.x + 1.0) * 0.5 * screen_size.x,
        (1.0 - ndc.y) * 0.5 * screen_size.y,
    ))
}

/// Pick the nearest furniture instance or room surface along `ray`.
///
/// Instances are tested in their committed placement unless `live` overrides
/// one of them (an in-progress drag). Walls are tested from the inside only so
/// the camera can see through the wall nearest to it.
pub fn pick_entity(
    ray: &Ray,
    scene: &Scene,
    cache: &ShapeCache,
    live: Option<(InstanceId, Placement)>,
) -> Option<PickHit> {
    let mut closest: Option<PickHit> = None;
    let mut consider = |t: f32, target: Selection| {
        if closest.as_ref().is_none_or(|c| t < c.distance) {
            closest = Some(PickHit { target, distance: t, position: ray.point_at(t) });
        }
    };

    for inst in &scene.instances {
        let Some(shape) = cache.get(inst.id) else { continue };
        let placement = match live {
            Some((id, p)) if id == inst.id => p,
            _ => inst.placement(),
        };
        let m = placement.matrix();
        for face in &shape.faces {
            let world = face.transformed(&m);
            if let Some(t) = ray.intersect_quad(&world.positions) {
                consider(t, Selection::Furniture(inst.id));
            }
        }
    }

    if let Some(room) = cache.room() {
        for surface in &room.surfaces {
            for face in &surface.faces {
                if face.normal().dot(ray.direction) > 0.0 && surface.key != SurfaceKey::Floor {
                    continue;
                }
                if let Some(t) = ray.intersect_quad(&face.positions) {
                    let target = match surface.key {
                        SurfaceKey::Floor => Selection::Floor,
                        key => Selection::Wall(key),
                    };
                    consider(t, target);
                }
            }
        }
    }

    closest
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::catalog::Archetype;
    use crate::scene::room::{RoomDimensions, RoomShell, Unit};
    use crate::scene::FurnitureInstance;

    fn setup() -> (Scene, ShapeCache, InstanceId) {
        let mut scene = Scene::new(RoomShell::with_dimensions(RoomDimensions::new(6.0, 6.0, 3.0, Unit::Meters)));
        let inst = FurnitureInstance::from_catalog(Archetype::Storage.info());
        let id = inst.id;
        scene.push(inst);
        let mut cache = ShapeCache::new();
        cache.sync(&scene, false);
        (scene, cache, id)
    }

    fn down_at(x: f32, z: f32) -> Ray {
        Ray { origin: Vec3::new(x, 2.5, z), direction: -Vec3::Y }
    }

    #[test]
    fn triangle_hit_and_miss() {
        let ray = Ray { origin: Vec3::new(0.2, 1.0, 0.2), direction: -Vec3::Y };
        assert!(ray.intersect_triangle(Vec3::ZERO, Vec3::X, Vec3::Z).is_some());
        let miss = Ray { origin: Vec3::new(2.0, 1.0, 2.0), direction: -Vec3::Y };
        assert!(miss.intersect_triangle(Vec3::ZERO, Vec3::X, Vec3::Z).is_none());
    }

    #[test]
    fn furniture_beats_floor() {
        let (scene, cache, id) = setup();
        let hit = pick_entity(&down_at(0.0, 0.0), &scene, &cache, None).unwrap();
        assert_eq!(hit.target, Selection::Furniture(id));
        assert!((hit.position.y - 1.8).abs() < 1e-3);
    }

    #[test]
    fn empty_floor_is_floor() {
        let (scene, cache, _) = setup();
        let hit = pick_entity(&down_at(2.0, 2.0), &scene, &cache, None).unwrap();
        assert_eq!(hit.target, Selection::Floor);
    }

    #[test]
    fn live_placement_moves_the_hit() {
        let (scene, cache, id) = setup();
        let moved = Placement { position: Vec3::new(2.0, 0.0, 2.0), ..scene.instances[0].placement() };
        let hit = pick_entity(&down_at(2.0, 2.0), &scene, &cache, Some((id, moved))).unwrap();
        assert_eq!(hit.target, Selection::Furniture(id));
        let hit = pick_entity(&down_at(0.0, 0.0), &scene, &cache, Some((id, moved))).unwrap();
        assert_eq!(hit.target, Selection::Floor);
    }

    #[test]
    fn walls_and_ceiling_from_inside() {
        let (scene, cache, _) = setup();
        let toward_left = Ray { origin: Vec3::new(0.0, 1.5, 2.0), direction: -Vec3::X };
        assert_eq!(pick_entity(&toward_left, &scene, &cache, None).unwrap().target, Selection::Wall(SurfaceKey::Left));
        let up = Ray { origin: Vec3::new(2.0, 1.0, 2.0), direction: Vec3::Y };
        assert_eq!(pick_entity(&up, &scene, &cache, None).unwrap().target, Selection::Wall(SurfaceKey::Ceiling));
    }

    #[test]
    fn screen_round_trip() {
        let vp = Mat4::perspective_rh(1.0, 1.0, 0.1, 100.0) * Mat4::look_at_rh(Vec3::new(0.0, 5.0, 5.0), Vec3::ZERO, Vec3::Y);
        let size = Vec2::new(400.0, 400.0);
        let target = Vec3::new(0.5, 0.0, -0.5);
        let screen = project_to_screen(target, vp, size).unwrap();
        let ray = Ray::from_screen(screen, size, vp);
        let t = ray.intersect_plane(Vec3::ZERO, Vec3::Y).unwrap();
        assert!(ray.point_at(t).abs_diff_eq(target, 1e-3));
    }
}

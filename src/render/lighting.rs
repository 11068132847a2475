//! Light rig and GPU uniform layouts for the shaded pipeline.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use crate::geometry::ShapeCache;
use crate::scene::color::Color;
use crate::scene::{InstanceId, Placement, Scene};

pub const MAX_POINT_LIGHTS: usize = 8;

const AMBIENT_INTENSITY: f32 = 0.6;
const HEMI_INTENSITY: f32 = 0.5;
const HEMI_GROUND: Color = Color::hex(0x444444);
const SUN_DIR: Vec3 = Vec3::new(5.0, 10.0, 5.0);
const SUN_INTENSITY: f32 = 0.5;
/// The ceiling light dims once the room gets busy.
const CEILING_BUSY_THRESHOLD: usize = 5;
const CEILING_INTENSITY: f32 = 0.8;
const CEILING_INTENSITY_BUSY: f32 = 0.5;
const CEILING_DROP: f32 = 1.0;

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct GpuPointLight {
    /// xyz = world position, w = range (0 = unbounded)
    pub position: [f32; 4],
    /// rgb = linear color, w = intensity
    pub color: [f32; 4],
}

/// Per-frame uniforms shared by every draw.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct SceneUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub eye: [f32; 4],
    pub ambient: [f32; 4],
    pub sky: [f32; 4],
    pub ground: [f32; 4],
    pub sun_dir: [f32; 4],
    pub sun_color: [f32; 4],
    /// x = number of active point lights
    pub counts: [u32; 4],
    pub lights: [GpuPointLight; MAX_POINT_LIGHTS],
}

/// Per-draw uniforms: placement and highlight.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct ModelUniforms {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 4],
    /// rgb added to the lit color, scaled by w
    pub tint: [f32; 4],
    /// x = gloss
    pub material: [f32; 4],
}

impl ModelUniforms {
    pub fn new(model: Mat4, tint: [f32; 4], gloss: f32) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            normal: model.inverse().transpose().to_cols_array_2d(),
            tint,
            material: [gloss, 0.0, 0.0, 0.0],
        }
    }

    pub fn identity() -> Self {
        Self::new(Mat4::IDENTITY, [0.0; 4], 0.0)
    }
}

impl SceneUniforms {
    /// Build the light rig for `scene`. Lamp lights follow `live` while a drag is in progress.
    pub fn new(
        view_proj: Mat4,
        eye: Vec3,
        scene: &Scene,
        cache: &ShapeCache,
        live: Option<(InstanceId, Placement)>,
    ) -> Self {
        let lights = collect_point_lights(scene, cache, live);
        let mut packed = [GpuPointLight::default(); MAX_POINT_LIGHTS];
        for (slot, light) in packed.iter_mut().zip(&lights) {
            *slot = *light;
        }
        let white = Color::WHITE.to_linear();
        let ground = HEMI_GROUND.to_linear();
        let sun = SUN_DIR.normalize();
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            eye: eye.extend(1.0).into(),
            ambient: (white.truncate() * AMBIENT_INTENSITY).extend(1.0).into(),
            sky: (white.truncate() * HEMI_INTENSITY).extend(1.0).into(),
            ground: (ground.truncate() * HEMI_INTENSITY).extend(1.0).into(),
            sun_dir: sun.extend(0.0).into(),
            sun_color: (white.truncate() * SUN_INTENSITY).extend(1.0).into(),
            counts: [lights.len().min(MAX_POINT_LIGHTS) as u32, 0, 0, 0],
            lights: packed,
        }
    }
}

/// Ceiling light first, then one light per lamp in scene order.
pub fn collect_point_lights(
    scene: &Scene,
    cache: &ShapeCache,
    live: Option<(InstanceId, Placement)>,
) -> Vec<GpuPointLight> {
    let size = scene.room.size_meters();
    let ceiling_intensity = if scene.len() > CEILING_BUSY_THRESHOLD {
        CEILING_INTENSITY_BUSY
    } else {
        CEILING_INTENSITY
    };
    let mut lights = vec![GpuPointLight {
        position: [0.0, (size.y - CEILING_DROP).max(0.0), 0.0, 0.0],
        color: Color::WHITE.to_linear().truncate().extend(ceiling_intensity).into(),
    }];

    for inst in &scene.instances {
        let Some(shape) = cache.get(inst.id) else { continue };
        if shape.lights.is_empty() {
            continue;
        }
        let placement = match live {
            Some((id, p)) if id == inst.id => p,
            _ => inst.placement(),
        };
        let m = placement.matrix();
        for light in &shape.lights {
            if lights.len() == MAX_POINT_LIGHTS {
                log::debug!("point light limit reached, skipping the rest");
                return lights;
            }
            let pos = m.transform_point3(light.offset);
            lights.push(GpuPointLight {
                position: pos.extend(light.range).into(),
                color: light.color.to_linear().truncate().extend(light.intensity).into(),
            });
        }
    }
    lights
}

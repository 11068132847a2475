use std::fmt;

use glam::{EulerRot, Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::scene::catalog::{Archetype, ArchetypeInfo};
use crate::scene::color::Color;

/// Smallest scale multiplier accepted on any axis.
pub const MIN_SCALE: f32 = 0.01;

/// Opaque, session-unique identifier of a placed instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(Uuid);

impl InstanceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// First six hex digits, for compact display in panels.
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..6].to_string()
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for InstanceId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Position, rotation (XYZ Euler radians) and per-axis scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Placement {
    pub const IDENTITY: Placement = Placement {
        position: Vec3::ZERO,
        rotation: Vec3::ZERO,
        scale: Vec3::ONE,
    };

    pub fn quat(&self) -> Quat {
        Quat::from_euler(EulerRot::XYZ, self.rotation.x, self.rotation.y, self.rotation.z)
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.quat(), self.position)
    }
}

/// A piece of furniture placed in the room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FurnitureInstance {
    pub id: InstanceId,
    #[serde(rename = "type")]
    pub archetype: Archetype,
    pub name: String,
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
    pub color: Color,
    /// Width, height, depth in meters. Fixed at creation.
    pub dimensions: Vec3,
    #[serde(default)]
    pub locked: bool,
}

impl FurnitureInstance {
    /// New instance at the room origin with the archetype's defaults.
    pub fn from_catalog(info: &ArchetypeInfo) -> Self {
        Self {
            id: InstanceId::new(),
            archetype: info.archetype,
            name: info.display_name.to_string(),
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
            color: info.default_color,
            dimensions: info.default_dimensions,
            locked: false,
        }
    }

    pub fn placement(&self) -> Placement {
        Placement {
            position: self.position,
            rotation: self.rotation,
            scale: self.scale,
        }
    }

    /// Merge the fields present in `patch`. Non-finite vectors are ignored.
    pub fn apply(&mut self, patch: &InstancePatch) {
        if let Some(p) = patch.position.filter(|v| v.is_finite()) {
            self.position = p;
        }
        if let Some(r) = patch.rotation.filter(|v| v.is_finite()) {
            self.rotation = r;
        }
        if let Some(s) = patch.scale.filter(|v| v.is_finite()) {
            self.scale = clamp_scale(s);
        }
        if let Some(c) = patch.color {
            self.color = c;
        }
        if let Some(l) = patch.locked {
            self.locked = l;
        }
    }
}

pub fn clamp_scale(scale: Vec3) -> Vec3 {
    scale.max(Vec3::splat(MIN_SCALE))
}

/// Partial update for [`FurnitureInstance`]. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstancePatch {
    pub position: Option<Vec3>,
    pub rotation: Option<Vec3>,
    pub scale: Option<Vec3>,
    pub color: Option<Color>,
    pub locked: Option<bool>,
}

impl InstancePatch {
    pub fn position(mut self, p: Vec3) -> Self {
        self.position = Some(p);
        self
    }

    pub fn rotation(mut self, r: Vec3) -> Self {
        self.rotation = Some(r);
        self
    }

    pub fn scale(mut self, s: Vec3) -> Self {
        self.scale = Some(s);
        self
    }

    pub fn color(mut self, c: Color) -> Self {
        self.color = Some(c);
        self
    }

    pub fn locked(mut self, l: bool) -> Self {
        self.locked = Some(l);
        self
    }

    pub fn placement(p: Placement) -> Self {
        Self::default().position(p.position).rotation(p.rotation).scale(p.scale)
    }

    /// Patch that restores every patchable field of `inst`.
    pub fn snapshot(inst: &FurnitureInstance) -> Self {
        Self {
            position: Some(inst.position),
            rotation: Some(inst.rotation),
            scale: Some(inst.scale),
            color: Some(inst.color),
            locked: Some(inst.locked),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

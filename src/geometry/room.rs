use glam::{Vec3, Vec4};

use crate::geometry::mesh::Face;
use crate::geometry::primitives::generate_box;
use crate::scene::color::Color;
use crate::scene::room::{RoomShell, SurfaceKey};

/// Walls are built outside the interior volume by this much.
pub const WALL_THICKNESS: f32 = 0.2;
pub const GRID_CELL: f32 = 1.0;
/// Every n-th grid line is drawn as a section line.
pub const GRID_SECTION_EVERY: i32 = 3;
const GRID_LIFT: f32 = 0.01;
/// Rooms needing more lines than this along either axis get no grid.
pub const MAX_GRID_LINES: usize = 1001;

pub const GRID_CELL_COLOR: Color = Color::hex(0x6f6f6f);
pub const GRID_SECTION_COLOR: Color = Color::hex(0x9d4b4b);

#[derive(Debug, Clone, PartialEq)]
pub struct RoomSurface {
    pub key: SurfaceKey,
    pub color: Color,
    pub faces: Vec<Face>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLine {
    pub from: Vec3,
    pub to: Vec3,
    pub section: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoomGeometry {
    pub surfaces: Vec<RoomSurface>,
    pub grid: Vec<GridLine>,
}

impl RoomGeometry {
    pub fn surface(&self, key: SurfaceKey) -> Option<&RoomSurface> {
        self.surfaces.iter().find(|s| s.key == key)
    }
}

/// Floor, ceiling and four walls of the room, centered on the origin in XZ
/// with the floor at y = 0. Grid lines are added when `show_grid` is set.
pub fn build_room_surfaces(shell: &RoomShell, show_grid: bool) -> RoomGeometry {
    let size = shell.size_meters();
    let (w, h, l) = (size.x, size.y, size.z);
    let t = WALL_THICKNESS;
    let mut surfaces = Vec::with_capacity(SurfaceKey::ALL.len());

    let mut push = |key: SurfaceKey, make: &dyn Fn(Vec4) -> Vec<Face>| {
        let color = shell.surface_color(key);
        surfaces.push(RoomSurface { key, color, faces: make(color.to_linear()) });
    };

    push(SurfaceKey::Floor, &|c| vec![Face::rect(Vec3::ZERO, Vec3::Y, w / 2.0, l / 2.0, c)]);
    push(SurfaceKey::Ceiling, &|c| vec![Face::rect(Vec3::new(0.0, h, 0.0), -Vec3::Y, w / 2.0, l / 2.0, c)]);
    push(SurfaceKey::Back, &|c| {
        generate_box(Vec3::new(0.0, h / 2.0, -l / 2.0 - t / 2.0), Vec3::new(w / 2.0 + t, h / 2.0, t / 2.0), c)
    });
    push(SurfaceKey::Front, &|c| {
        generate_box(Vec3::new(0.0, h / 2.0, l / 2.0 + t / 2.0), Vec3::new(w / 2.0 + t, h / 2.0, t / 2.0), c)
    });
    push(SurfaceKey::Left, &|c| {
        generate_box(Vec3::new(-w / 2.0 - t / 2.0, h / 2.0, 0.0), Vec3::new(t / 2.0, h / 2.0, l / 2.0), c)
    });
    push(SurfaceKey::Right, &|c| {
        generate_box(Vec3::new(w / 2.0 + t / 2.0, h / 2.0, 0.0), Vec3::new(t / 2.0, h / 2.0, l / 2.0), c)
    });

    let grid = if show_grid { grid_lines(w, l) } else { Vec::new() };
    RoomGeometry { surfaces, grid }
}

/// Whether the interior side of a surface faces `eye`. Walls the camera is
/// behind are skipped when drawing so the room stays visible from outside.
pub fn surface_faces_eye(size: Vec3, key: SurfaceKey, eye: Vec3) -> bool {
    let (hw, h, hl) = (size.x / 2.0, size.y, size.z / 2.0);
    match key {
        SurfaceKey::Floor => eye.y >= 0.0,
        SurfaceKey::Ceiling => eye.y < h,
        SurfaceKey::Back => eye.z > -hl,
        SurfaceKey::Front => eye.z < hl,
        SurfaceKey::Left => eye.x > -hw,
        SurfaceKey::Right => eye.x < hw,
    }
}

/// Lines on multiples of [`GRID_CELL`] from the room center, clipped to the floor.
fn grid_lines(width: f32, length: f32) -> Vec<GridLine> {
    let (hw, hl) = (width / 2.0, length / 2.0);
    let (cells_x, cells_z) = ((hw / GRID_CELL).floor(), (hl / GRID_CELL).floor());
    let limit = (MAX_GRID_LINES / 2) as f32;
    if !(cells_x <= limit && cells_z <= limit) {
        log::debug!("room {width} x {length} m too large for a grid");
        return Vec::new();
    }
    let mut lines = Vec::new();

    let nx = cells_x as i32;
    for i in -nx..=nx {
        let x = i as f32 * GRID_CELL;
        lines.push(GridLine {
            from: Vec3::new(x, GRID_LIFT, -hl),
            to: Vec3::new(x, GRID_LIFT, hl),
            section: i % GRID_SECTION_EVERY == 0,
        });
    }
    let nz = cells_z as i32;
    for i in -nz..=nz {
        let z = i as f32 * GRID_CELL;
        lines.push(GridLine {
            from: Vec3::new(-hw, GRID_LIFT, z),
            to: Vec3::new(hw, GRID_LIFT, z),
            section: i % GRID_SECTION_EVERY == 0,
        });
    }

    lines
}

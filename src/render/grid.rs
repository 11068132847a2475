use wgpu::util::DeviceExt;

use crate::geometry::room::{GridLine, GRID_CELL_COLOR, GRID_SECTION_COLOR};
use crate::render::vertex::LineVertex;

/// Floor grid lines, rebuilt whenever the room geometry changes.
pub struct GridRenderer {
    vertex_buffer: Option<wgpu::Buffer>,
    vertex_count: u32,
    generation: u64,
}

impl GridRenderer {
    pub fn new() -> Self {
        Self { vertex_buffer: None, vertex_count: 0, generation: 0 }
    }

    /// Re-upload when the room generation moved on.
    pub fn upload(&mut self, device: &wgpu::Device, lines: &[GridLine], generation: u64) {
        if generation == self.generation && self.vertex_buffer.is_some() {
            return;
        }
        self.generation = generation;
        let verts = build_grid_vertices(lines);
        self.vertex_count = verts.len() as u32;
        self.vertex_buffer = (!verts.is_empty()).then(|| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("grid_vertex_buffer"),
                contents: bytemuck::cast_slice(&verts),
                usage: wgpu::BufferUsages::VERTEX,
            })
        });
    }

    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        if let Some(buffer) = &self.vertex_buffer {
            pass.set_vertex_buffer(0, buffer.slice(..));
            pass.draw(0..self.vertex_count, 0..1);
        }
    }
}

pub fn build_grid_vertices(lines: &[GridLine]) -> Vec<LineVertex> {
    let cell = GRID_CELL_COLOR.to_linear().to_array();
    let section = GRID_SECTION_COLOR.to_linear().to_array();
    let mut verts = Vec::with_capacity(lines.len() * 2);
    for line in lines {
        let color = if line.section { section } else { cell };
        verts.push(LineVertex { position: line.from.into(), color });
        verts.push(LineVertex { position: line.to.into(), color });
    }
    verts
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn section_lines_get_section_color() {
        let lines = [
            GridLine { from: Vec3::ZERO, to: Vec3::X, section: false },
            GridLine { from: Vec3::Z, to: Vec3::ONE, section: true },
        ];
        let verts = build_grid_vertices(&lines);
        assert_eq!(verts.len(), 4);
        assert_eq!(verts[0].color, GRID_CELL_COLOR.to_linear().to_array());
        assert_eq!(verts[3].color, GRID_SECTION_COLOR.to_linear().to_array());
        assert_eq!(verts[3].position, [1.0, 1.0, 1.0]);
    }
}

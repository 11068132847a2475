use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use glam::{Mat4, Vec3};
use thiserror::Error;
use wgpu::util::DeviceExt;

use crate::geometry::mesh::triangulate;
use crate::geometry::{surface_faces_eye, Face, ShapeCache};
use crate::render::camera::Camera;
use crate::render::grid::GridRenderer;
use crate::render::lighting::{ModelUniforms, SceneUniforms};
use crate::render::vertex::{LineVertex, Vertex};
use crate::scene::room::SurfaceKey;
use crate::scene::{InstanceId, Placement, Scene};
use crate::tools::edit::Selection;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const SELECTED_TINT: f32 = 0.25;
const HOVER_TINT: f32 = 0.12;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),
    #[error("no suitable GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),
    #[error("failed to create device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
    #[error("this surface cannot be read back")]
    CaptureUnsupported,
    #[error("readback failed: {0}")]
    Readback(String),
    #[error(transparent)]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// What the renderer needs to know about the editor for one frame.
pub struct FrameData<'a> {
    pub scene: &'a Scene,
    pub cache: &'a ShapeCache,
    pub selection: Selection,
    pub hovered: Option<InstanceId>,
    /// Placement of an instance being dragged. Overrides the stored one.
    pub live: Option<(InstanceId, Placement)>,
    /// Gizmo, selection outline and marker lines, drawn on top.
    pub overlay: &'a [LineVertex],
    pub selection_color: [f32; 4],
    pub hover_color: [f32; 4],
}

/// Index/vertex buffers plus a per-draw uniform.
struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    model_buffer: wgpu::Buffer,
    model_bind_group: wgpu::BindGroup,
    generation: u64,
}

struct RoomMeshes {
    surfaces: Vec<(SurfaceKey, GpuMesh)>,
    size: Vec3,
    generation: u64,
}

pub struct Renderer {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub surface: wgpu::Surface<'static>,
    pub surface_format: wgpu::TextureFormat,
    pub config: wgpu::SurfaceConfiguration,
    pub depth_view: wgpu::TextureView,
    can_capture: bool,

    pub camera: Camera,
    scene_buffer: wgpu::Buffer,
    scene_bind_group: wgpu::BindGroup,
    model_bind_group_layout: wgpu::BindGroupLayout,

    mesh_pipeline: wgpu::RenderPipeline,
    line_pipeline: wgpu::RenderPipeline,
    overlay_pipeline: wgpu::RenderPipeline,
    grid: GridRenderer,

    meshes: HashMap<InstanceId, GpuMesh>,
    room: Option<RoomMeshes>,
    overlay: Option<(wgpu::Buffer, u32)>,
}

impl Renderer {
    pub async fn new(window: Arc<winit::window::Window>) -> Result<Self, RenderError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                ..Default::default()
            })
            .await?;

        let size = window.inner_size();
        let caps = surface.get_capabilities(&adapter);
        let surface_format = caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or(caps.formats.first())
            .copied()
            .unwrap_or(wgpu::TextureFormat::Bgra8UnormSrgb);
        let can_capture = caps.usages.contains(wgpu::TextureUsages::COPY_SRC);
        let mut usage = wgpu::TextureUsages::RENDER_ATTACHMENT;
        if can_capture {
            usage |= wgpu::TextureUsages::COPY_SRC;
        }

        let config = wgpu::SurfaceConfiguration {
            usage,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: caps.alpha_modes.first().copied().unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_view = Self::create_depth_texture(&device, config.width, config.height);

        let mut camera = Camera::new();
        camera.set_aspect(config.width as f32, config.height as f32);

        let scene_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("scene_uniform"),
            size: std::mem::size_of::<SceneUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let uniform_entry = |visibility| wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        let scene_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("scene_bgl"),
                entries: &[uniform_entry(wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT)],
            });
        let model_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("model_bgl"),
                entries: &[uniform_entry(wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT)],
            });

        let scene_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("scene_bg"),
            layout: &scene_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: scene_buffer.as_entire_binding(),
            }],
        });

        // Shaded mesh pipeline
        let mesh_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("mesh_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/mesh.wgsl").into()),
        });

        let mesh_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("mesh_pipeline_layout"),
            bind_group_layouts: &[&scene_bind_group_layout, &model_bind_group_layout],
            push_constant_ranges: &[],
        });

        let mesh_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("mesh_pipeline"),
            layout: Some(&mesh_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &mesh_shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex::LAYOUT],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &mesh_shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                // Open lamp shades are seen from inside too
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        // Line pipelines
        let line_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("line_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/line.wgsl").into()),
        });

        let line_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("line_pipeline_layout"),
            bind_group_layouts: &[&scene_bind_group_layout],
            push_constant_ranges: &[],
        });

        let make_line_pipeline = |label: &str, depth_write_enabled, depth_compare| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&line_pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &line_shader,
                    entry_point: Some("vs_main"),
                    buffers: &[LineVertex::LAYOUT],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &line_shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: surface_format,
                        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::LineList,
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled,
                    depth_compare,
                    stencil: Default::default(),
                    bias: Default::default(),
                }),
                multisample: Default::default(),
                multiview: None,
                cache: None,
            })
        };
        let line_pipeline = make_line_pipeline("line_pipeline", true, wgpu::CompareFunction::LessEqual);
        // Gizmo and selection lines stay visible through furniture
        let overlay_pipeline = make_line_pipeline("overlay_pipeline", false, wgpu::CompareFunction::Always);

        Ok(Self {
            device,
            queue,
            surface,
            surface_format,
            config,
            depth_view,
            can_capture,
            camera,
            scene_buffer,
            scene_bind_group,
            model_bind_group_layout,
            mesh_pipeline,
            line_pipeline,
            overlay_pipeline,
            grid: GridRenderer::new(),
            meshes: HashMap::new(),
            room: None,
            overlay: None,
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_view = Self::create_depth_texture(&self.device, width, height);
        self.camera.set_aspect(width as f32, height as f32);
    }

    /// Drop all GPU copies of scene geometry, e.g. after leaving the editor.
    pub fn clear_scene(&mut self) {
        self.meshes.clear();
        self.room = None;
        self.overlay = None;
    }

    /// Upload per-frame data before the render pass begins. Meshes are only
    /// re-created when the shape cache produced a new generation for them.
    pub fn prepare_frame(&mut self, frame: &FrameData) {
        let uniforms = SceneUniforms::new(
            self.camera.view_projection(),
            self.camera.position,
            frame.scene,
            frame.cache,
            frame.live,
        );
        self.queue.write_buffer(&self.scene_buffer, 0, bytemuck::bytes_of(&uniforms));

        self.meshes.retain(|id, _| frame.cache.get(*id).is_some());
        for inst in &frame.scene.instances {
            let Some(shape) = frame.cache.get(inst.id) else { continue };
            let stale = self.meshes.get(&inst.id).is_none_or(|m| m.generation != shape.generation);
            if stale {
                let mesh = self.create_mesh(&shape.faces, shape.generation, "furniture");
                self.meshes.insert(inst.id, mesh);
            }
            let placement = match frame.live {
                Some((id, p)) if id == inst.id => p,
                _ => inst.placement(),
            };
            let tint = if frame.selection == Selection::Furniture(inst.id) {
                with_strength(frame.selection_color, SELECTED_TINT)
            } else if frame.hovered == Some(inst.id) {
                with_strength(frame.hover_color, HOVER_TINT)
            } else {
                [0.0; 4]
            };
            if let Some(mesh) = self.meshes.get(&inst.id) {
                let model = ModelUniforms::new(placement.matrix(), tint, 0.0);
                self.queue.write_buffer(&mesh.model_buffer, 0, bytemuck::bytes_of(&model));
            }
        }

        if let Some(geometry) = frame.cache.room() {
            let generation = frame.cache.room_generation();
            if self.room.as_ref().is_none_or(|r| r.generation != generation) {
                let surfaces = geometry
                    .surfaces
                    .iter()
                    .map(|s| (s.key, self.create_mesh(&s.faces, generation, s.key.as_str())))
                    .collect();
                self.room = Some(RoomMeshes {
                    surfaces,
                    size: frame.scene.room.size_meters(),
                    generation,
                });
            }
            self.grid.upload(&self.device, &geometry.grid, generation);
        }
        if let Some(room) = &self.room {
            let gloss = frame.scene.room.floor_material.gloss();
            for (key, mesh) in &room.surfaces {
                let picked = match frame.selection {
                    Selection::Wall(k) => k == *key,
                    Selection::Floor => *key == SurfaceKey::Floor,
                    _ => false,
                };
                let tint = if picked { with_strength(frame.selection_color, SELECTED_TINT) } else { [0.0; 4] };
                let gloss = if *key == SurfaceKey::Floor { gloss } else { 0.0 };
                let model = ModelUniforms::new(Mat4::IDENTITY, tint, gloss);
                self.queue.write_buffer(&mesh.model_buffer, 0, bytemuck::bytes_of(&model));
            }
        }

        self.overlay = (!frame.overlay.is_empty()).then(|| {
            let buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("overlay_lines"),
                contents: bytemuck::cast_slice(frame.overlay),
                usage: wgpu::BufferUsages::VERTEX,
            });
            (buffer, frame.overlay.len() as u32)
        });
    }

    pub fn render_scene(&self, pass: &mut wgpu::RenderPass<'_>, show_grid: bool) {
        pass.set_pipeline(&self.mesh_pipeline);
        pass.set_bind_group(0, &self.scene_bind_group, &[]);

        if let Some(room) = &self.room {
            let eye = self.camera.position;
            for (key, mesh) in &room.surfaces {
                if surface_faces_eye(room.size, *key, eye) {
                    draw_mesh(pass, mesh);
                }
            }
        }
        for mesh in self.meshes.values() {
            draw_mesh(pass, mesh);
        }

        pass.set_pipeline(&self.line_pipeline);
        pass.set_bind_group(0, &self.scene_bind_group, &[]);
        if show_grid {
            self.grid.draw(pass);
        }

        if let Some((buffer, count)) = &self.overlay {
            pass.set_pipeline(&self.overlay_pipeline);
            pass.set_vertex_buffer(0, buffer.slice(..));
            pass.draw(0..*count, 0..1);
        }
    }

    /// Copy a presented frame into a PNG file.
    pub fn capture_snapshot(&self, texture: &wgpu::Texture, path: &Path) -> Result<(), RenderError> {
        if !self.can_capture {
            return Err(RenderError::CaptureUnsupported);
        }
        let (width, height) = (texture.width(), texture.height());
        let unpadded = width * 4;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let padded = unpadded.div_ceil(align) * align;

        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("snapshot_readback"),
            size: (padded * height) as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });
        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("snapshot_encoder"),
        });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
        );
        self.queue.submit(std::iter::once(encoder.finish()));

        let slice = buffer.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        self.device
            .poll(wgpu::PollType::Wait)
            .map_err(|e| RenderError::Readback(e.to_string()))?;
        rx.recv()
            .map_err(|e| RenderError::Readback(e.to_string()))?
            .map_err(|e| RenderError::Readback(e.to_string()))?;

        let bgra = matches!(
            texture.format(),
            wgpu::TextureFormat::Bgra8Unorm | wgpu::TextureFormat::Bgra8UnormSrgb
        );
        let mut pixels = Vec::with_capacity((unpadded * height) as usize);
        {
            let data = slice.get_mapped_range();
            for row in data.chunks(padded as usize).take(height as usize) {
                for px in row[..unpadded as usize].chunks_exact(4) {
                    if bgra {
                        pixels.extend_from_slice(&[px[2], px[1], px[0], 255]);
                    } else {
                        pixels.extend_from_slice(&[px[0], px[1], px[2], 255]);
                    }
                }
            }
        }
        buffer.unmap();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let img = image::RgbaImage::from_raw(width, height, pixels)
            .ok_or_else(|| RenderError::Readback("pixel buffer size mismatch".into()))?;
        img.save(path)?;
        Ok(())
    }

    fn create_mesh(&self, faces: &[Face], generation: u64, label: &str) -> GpuMesh {
        let (vertices, indices) = triangulate(faces);
        let vertex_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        let model_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("model_uniform"),
            contents: bytemuck::bytes_of(&ModelUniforms::identity()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let model_bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("model_bg"),
            layout: &self.model_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: model_buffer.as_entire_binding(),
            }],
        });
        GpuMesh {
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
            model_buffer,
            model_bind_group,
            generation,
        }
    }

    fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth_texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&Default::default())
    }
}

fn draw_mesh(pass: &mut wgpu::RenderPass<'_>, mesh: &GpuMesh) {
    if mesh.index_count == 0 {
        return;
    }
    pass.set_bind_group(1, &mesh.model_bind_group, &[]);
    pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
    pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
    pass.draw_indexed(0..mesh.index_count, 0, 0..1);
}

fn with_strength(color: [f32; 4], strength: f32) -> [f32; 4] {
    [color[0], color[1], color[2], strength]
}

//! Offscreen scene renderer.
//!
//! Draws the mirrored scene graph plus the reference grid into a caller
//! provided color target. The actual rasterization is wgpu's business; this
//! module owns the pipelines, unit geometry, and per-frame buffers.

use crate::camera::OrbitCamera;
use crate::geometry::{self, MeshData, Vertex};
use crate::scene_graph::{LightInstance, SceneGraph, Shape};
use crate::{RenderError, Result};
use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use sceneflow_core::{GridParams, LightKind, Vec3};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error};
use wgpu::util::DeviceExt;

const MAX_LIGHTS: usize = 8;
const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct LightRaw {
    position: [f32; 4],
    direction: [f32; 4],
    color: [f32; 4],
    params: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct GlobalsRaw {
    view_proj: [[f32; 4]; 4],
    camera_pos: [f32; 4],
    ambient: [f32; 4],
    counts: [u32; 4],
    lights: [LightRaw; MAX_LIGHTS],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct InstanceRaw {
    model: [[f32; 4]; 4],
    diffuse: [f32; 4],
    ambient: [f32; 4],
    emissive: [f32; 4],
}

impl InstanceRaw {
    const ATTRIBUTES: [wgpu::VertexAttribute; 7] = wgpu::vertex_attr_array![
        2 => Float32x4, 3 => Float32x4, 4 => Float32x4, 5 => Float32x4,
        6 => Float32x4, 7 => Float32x4, 8 => Float32x4,
    ];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<InstanceRaw>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct LineParamsRaw {
    model: [[f32; 4]; 4],
    color: [f32; 4],
}

/// Uploaded geometry ready for drawing.
struct GpuMesh {
    vertex_buf: wgpu::Buffer,
    index_buf: wgpu::Buffer,
    index_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum MeshKey {
    Box,
    Cylinder,
    Plane,
    Sphere,
    External(String),
}

impl MeshKey {
    fn from_shape(shape: &Shape) -> Self {
        match shape {
            Shape::Box => MeshKey::Box,
            Shape::Cylinder => MeshKey::Cylinder,
            Shape::Plane => MeshKey::Plane,
            Shape::Sphere => MeshKey::Sphere,
            Shape::Mesh { uri } => MeshKey::External(uri.clone()),
        }
    }
}

struct GridState {
    params: GridParams,
    visible: bool,
    buffer: Option<(wgpu::Buffer, u32)>,
    dirty: bool,
}

/// Offscreen renderer for the mirrored scene.
pub struct SceneRenderer {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,

    mesh_pipeline: wgpu::RenderPipeline,
    line_pipeline: wgpu::RenderPipeline,

    globals_buf: wgpu::Buffer,
    globals_bg: wgpu::BindGroup,
    line_params_buf: wgpu::Buffer,
    line_bg: wgpu::BindGroup,

    unit_meshes: HashMap<MeshKey, GpuMesh>,
    // External meshes by uri; None marks a load that already failed.
    mesh_cache: HashMap<String, Option<GpuMesh>>,

    instance_buf: wgpu::Buffer,
    instance_capacity: usize,

    depth: Option<(wgpu::TextureView, u32, u32)>,
    grid: GridState,
}

impl SceneRenderer {
    /// Build pipelines and unit geometry for the given color target format.
    pub fn new(
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
        target_format: wgpu::TextureFormat,
        grid_params: GridParams,
    ) -> Result<Self> {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Scene Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/scene.wgsl").into()),
        });

        let globals_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Globals Layout"),
            entries: &[uniform_entry(0)],
        });
        let line_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Line Params Layout"),
            entries: &[uniform_entry(0)],
        });

        let mesh_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Mesh Pipeline Layout"),
                bind_group_layouts: &[&globals_layout],
                push_constant_ranges: &[],
            });
        let line_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Line Pipeline Layout"),
                bind_group_layouts: &[&globals_layout, &line_layout],
                push_constant_ranges: &[],
            });

        let color_target = wgpu::ColorTargetState {
            format: target_format,
            blend: Some(wgpu::BlendState::ALPHA_BLENDING),
            write_mask: wgpu::ColorWrites::ALL,
        };

        let mesh_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Mesh Pipeline"),
            layout: Some(&mesh_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_mesh"),
                buffers: &[Vertex::layout(), InstanceRaw::layout()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_mesh"),
                targets: &[Some(color_target.clone())],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
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

        let line_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Line Pipeline"),
            layout: Some(&line_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_line"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: 12,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![0 => Float32x3],
                }],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_line"),
                targets: &[Some(color_target)],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        let globals_buf = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Globals"),
            size: std::mem::size_of::<GlobalsRaw>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let globals_bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Globals BG"),
            layout: &globals_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_buf.as_entire_binding(),
            }],
        });

        let line_params_buf = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Line Params"),
            size: std::mem::size_of::<LineParamsRaw>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let line_bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Line Params BG"),
            layout: &line_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: line_params_buf.as_entire_binding(),
            }],
        });

        let instance_capacity = 256;
        let instance_buf = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Instances"),
            size: (instance_capacity * std::mem::size_of::<InstanceRaw>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut renderer = Self {
            device,
            queue,
            mesh_pipeline,
            line_pipeline,
            globals_buf,
            globals_bg,
            line_params_buf,
            line_bg,
            unit_meshes: HashMap::new(),
            mesh_cache: HashMap::new(),
            instance_buf,
            instance_capacity,
            depth: None,
            grid: GridState {
                params: grid_params,
                visible: true,
                buffer: None,
                dirty: true,
            },
        };

        renderer.upload_unit_mesh(MeshKey::Box, geometry::unit_box());
        renderer.upload_unit_mesh(MeshKey::Plane, geometry::unit_plane());
        renderer.upload_unit_mesh(MeshKey::Sphere, geometry::unit_sphere(16, 24));
        renderer.upload_unit_mesh(MeshKey::Cylinder, geometry::unit_cylinder(24));

        Ok(renderer)
    }

    fn upload_unit_mesh(&mut self, key: MeshKey, mesh: MeshData) {
        let gpu = self.upload(&mesh, &format!("{key:?}"));
        self.unit_meshes.insert(key, gpu);
    }

    fn upload(&self, mesh: &MeshData, label: &str) -> GpuMesh {
        let vertex_buf = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(&mesh.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
        let index_buf = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(&mesh.indices),
                usage: wgpu::BufferUsages::INDEX,
            });
        GpuMesh {
            vertex_buf,
            index_buf,
            index_count: mesh.indices.len() as u32,
        }
    }

    /// Current grid parameters.
    pub fn grid_params(&self) -> &GridParams {
        &self.grid.params
    }

    /// Whether the grid is currently shown.
    pub fn grid_visible(&self) -> bool {
        self.grid.visible
    }

    /// Replace the grid parameters; geometry is rebuilt on the next frame.
    pub fn set_grid_params(&mut self, params: GridParams) {
        if self.grid.params != params {
            self.grid.params = params;
            self.grid.dirty = true;
        }
    }

    /// Toggle grid rendering without discarding its geometry.
    pub fn set_grid_visible(&mut self, visible: bool) {
        self.grid.visible = visible;
    }

    fn ensure_depth(&mut self, width: u32, height: u32) {
        let needs_new = match &self.depth {
            Some((_, w, h)) => *w != width || *h != height,
            None => true,
        };
        if needs_new {
            let texture = self.device.create_texture(&wgpu::TextureDescriptor {
                label: Some("Viewport Depth"),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: DEPTH_FORMAT,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                view_formats: &[],
            });
            let view = texture.create_view(&Default::default());
            self.depth = Some((view, width, height));
        }
    }

    fn external_mesh(&mut self, uri: &str) -> bool {
        if self.mesh_cache.contains_key(uri) {
            return self.mesh_cache[uri].is_some();
        }
        let loaded = match load_obj(uri) {
            Ok(mesh) => {
                debug!("Loaded mesh {} ({} vertices)", uri, mesh.vertices.len());
                Some(self.upload(&mesh, uri))
            }
            Err(e) => {
                error!("Failed to load mesh {}: {}", uri, e);
                None
            }
        };
        let ok = loaded.is_some();
        self.mesh_cache.insert(uri.to_string(), loaded);
        ok
    }

    fn mesh_for(&self, key: &MeshKey) -> Option<&GpuMesh> {
        match key {
            MeshKey::External(uri) => self.mesh_cache.get(uri).and_then(|m| m.as_ref()),
            primitive => self.unit_meshes.get(primitive),
        }
    }

    fn write_globals(&self, graph: &SceneGraph, camera: &OrbitCamera) {
        let lights = graph.lights();
        let mut raw_lights = [LightRaw::zeroed(); MAX_LIGHTS];
        for (slot, light) in raw_lights.iter_mut().zip(lights.iter()) {
            *slot = encode_light(light);
        }
        if lights.len() > MAX_LIGHTS {
            debug!(
                "Scene has {} lights; only the first {} are shaded",
                lights.len(),
                MAX_LIGHTS
            );
        }

        let globals = GlobalsRaw {
            view_proj: camera.view_projection().to_cols_array_2d(),
            camera_pos: camera.eye().extend(1.0).to_array(),
            ambient: graph.ambient.to_array(),
            counts: [lights.len().min(MAX_LIGHTS) as u32, 0, 0, 0],
            lights: raw_lights,
        };
        self.queue
            .write_buffer(&self.globals_buf, 0, bytemuck::bytes_of(&globals));
    }

    fn rebuild_grid(&mut self) {
        let positions = geometry::grid_lines(&self.grid.params);
        self.grid.buffer = if positions.is_empty() {
            None
        } else {
            let buffer = self
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Grid Lines"),
                    contents: bytemuck::cast_slice(&positions),
                    usage: wgpu::BufferUsages::VERTEX,
                });
            Some((buffer, positions.len() as u32))
        };
        self.grid.dirty = false;
    }

    /// Render one frame into `target`, whose size must match the camera's
    /// image size.
    pub fn render(
        &mut self,
        graph: &SceneGraph,
        camera: &OrbitCamera,
        target: &wgpu::TextureView,
    ) {
        self.ensure_depth(camera.image_width(), camera.image_height());
        self.write_globals(graph, camera);
        if self.grid.dirty {
            self.rebuild_grid();
        }

        // Flatten visuals into per-mesh instance runs.
        let draws = graph.draw_list();
        let mut grouped: HashMap<MeshKey, Vec<InstanceRaw>> = HashMap::new();
        for item in &draws {
            if let Shape::Mesh { uri } = &item.shape {
                if !self.external_mesh(uri) {
                    continue;
                }
            }
            let model = item.world_pose.to_matrix() * Mat4::from_scale(item.scale);
            let m = &item.material;
            let spec = (m.specular.r + m.specular.g + m.specular.b) / 3.0;
            grouped
                .entry(MeshKey::from_shape(&item.shape))
                .or_default()
                .push(InstanceRaw {
                    model: model.to_cols_array_2d(),
                    diffuse: [m.diffuse.r, m.diffuse.g, m.diffuse.b, 1.0 - m.transparency],
                    ambient: [m.ambient.r, m.ambient.g, m.ambient.b, spec],
                    emissive: [m.emissive.r, m.emissive.g, m.emissive.b, 0.0],
                });
        }

        // One contiguous instance upload; ranges index into it per mesh.
        let mut instances: Vec<InstanceRaw> = Vec::new();
        let mut runs: Vec<(MeshKey, std::ops::Range<u32>)> = Vec::new();
        for (key, group) in grouped {
            let start = instances.len() as u32;
            instances.extend_from_slice(&group);
            runs.push((key, start..instances.len() as u32));
        }
        self.write_instances(&instances);

        // Grid transform and color; hidden means fully transparent, the
        // geometry stays resident.
        let grid_alpha = if self.grid.visible {
            self.grid.params.color.a
        } else {
            0.0
        };
        let line_params = LineParamsRaw {
            model: self.grid.params.pose.to_matrix().to_cols_array_2d(),
            color: self.grid.params.color.with_alpha(grid_alpha).to_array(),
        };
        self.queue
            .write_buffer(&self.line_params_buf, 0, bytemuck::bytes_of(&line_params));

        let bg = graph.background;
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Scene Encoder"),
            });
        {
            let depth_view = &self.depth.as_ref().expect("depth created above").0;
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: bg.r as f64,
                            g: bg.g as f64,
                            b: bg.b as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            pass.set_pipeline(&self.mesh_pipeline);
            pass.set_bind_group(0, &self.globals_bg, &[]);
            pass.set_vertex_buffer(1, self.instance_buf.slice(..));
            for (key, range) in &runs {
                let Some(mesh) = self.mesh_for(key) else {
                    continue;
                };
                pass.set_vertex_buffer(0, mesh.vertex_buf.slice(..));
                pass.set_index_buffer(mesh.index_buf.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..mesh.index_count, 0, range.clone());
            }

            if let Some((buffer, count)) = &self.grid.buffer {
                if grid_alpha > 0.0 {
                    pass.set_pipeline(&self.line_pipeline);
                    pass.set_bind_group(0, &self.globals_bg, &[]);
                    pass.set_bind_group(1, &self.line_bg, &[]);
                    pass.set_vertex_buffer(0, buffer.slice(..));
                    pass.draw(0..*count, 0..1);
                }
            }
        }
        self.queue.submit(Some(encoder.finish()));
    }

    fn write_instances(&mut self, instances: &[InstanceRaw]) {
        if instances.is_empty() {
            return;
        }
        if instances.len() > self.instance_capacity {
            self.instance_capacity = instances.len().next_power_of_two();
            self.instance_buf = self.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("Instances"),
                size: (self.instance_capacity * std::mem::size_of::<InstanceRaw>()) as u64,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
        }
        self.queue
            .write_buffer(&self.instance_buf, 0, bytemuck::cast_slice(instances));
    }

    /// Copy a rendered RGBA8 texture back to the CPU.
    pub fn capture(&self, texture: &wgpu::Texture) -> Result<image::RgbaImage> {
        let width = texture.width();
        let height = texture.height();
        let bytes_per_row = width * 4;
        let padded_bytes_per_row =
            bytes_per_row.div_ceil(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT) * wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;

        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Capture Buffer"),
            size: (padded_bytes_per_row * height) as u64,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Capture Encoder"),
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
                    bytes_per_row: Some(padded_bytes_per_row),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        self.queue.submit(Some(encoder.finish()));

        let slice = buffer.slice(..);
        let (tx, rx) = crossbeam_channel::bounded(1);
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        self.device
            .poll(wgpu::PollType::wait_indefinitely())
            .map_err(|e| RenderError::Capture(e.to_string()))?;
        rx.recv()
            .map_err(|_| RenderError::Capture("map callback dropped".to_string()))?
            .map_err(|e| RenderError::Capture(e.to_string()))?;

        let data = slice.get_mapped_range();
        let mut pixels = Vec::with_capacity((bytes_per_row * height) as usize);
        for row in 0..height {
            let start = (row * padded_bytes_per_row) as usize;
            pixels.extend_from_slice(&data[start..start + bytes_per_row as usize]);
        }
        drop(data);
        buffer.unmap();

        image::RgbaImage::from_raw(width, height, pixels)
            .ok_or_else(|| RenderError::Capture("image size mismatch".to_string()))
    }
}

fn uniform_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn encode_light(light: &LightInstance) -> LightRaw {
    let pose = light.world_pose;
    let (kind, direction, inner_cos, outer_cos) = match &light.data.kind {
        LightKind::Point => (0.0, Vec3::ZERO, 0.0, 0.0),
        LightKind::Spot {
            inner_angle,
            outer_angle,
            ..
        } => (
            1.0,
            pose.rotation * Vec3::NEG_Z,
            (inner_angle / 2.0).cos(),
            (outer_angle / 2.0).cos(),
        ),
        LightKind::Directional { direction } => {
            (2.0, (pose.rotation * *direction).normalize_or_zero(), 0.0, 0.0)
        }
    };

    let diffuse = light.data.diffuse;
    LightRaw {
        position: pose.position.extend(kind).to_array(),
        direction: direction.extend(light.data.range).to_array(),
        color: [diffuse.r, diffuse.g, diffuse.b, inner_cos],
        params: [
            light.data.attenuation_constant,
            light.data.attenuation_linear,
            light.data.attenuation_quadratic,
            outer_cos,
        ],
    }
}

fn load_obj(uri: &str) -> std::result::Result<MeshData, String> {
    let (models, _materials) =
        tobj::load_obj(uri, &tobj::GPU_LOAD_OPTIONS).map_err(|e| e.to_string())?;
    if models.is_empty() {
        return Err("file contains no meshes".to_string());
    }

    let mut mesh = MeshData::default();
    for model in &models {
        let base = mesh.vertices.len() as u32;
        let m = &model.mesh;
        let has_normals = m.normals.len() == m.positions.len();
        for i in 0..m.positions.len() / 3 {
            mesh.vertices.push(Vertex {
                position: [
                    m.positions[i * 3],
                    m.positions[i * 3 + 1],
                    m.positions[i * 3 + 2],
                ],
                normal: if has_normals {
                    [m.normals[i * 3], m.normals[i * 3 + 1], m.normals[i * 3 + 2]]
                } else {
                    [0.0, 0.0, 0.0]
                },
            });
        }
        mesh.indices.extend(m.indices.iter().map(|&i| base + i));
    }

    if mesh.vertices.iter().all(|v| v.normal == [0.0, 0.0, 0.0]) {
        accumulate_normals(&mut mesh);
    }
    Ok(mesh)
}

// Area-weighted vertex normals for meshes that ship without any.
fn accumulate_normals(mesh: &mut MeshData) {
    for tri in mesh.indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let pa = Vec3::from(mesh.vertices[a].position);
        let pb = Vec3::from(mesh.vertices[b].position);
        let pc = Vec3::from(mesh.vertices[c].position);
        let n = (pb - pa).cross(pc - pa);
        for &i in &[a, b, c] {
            let cur = Vec3::from(mesh.vertices[i].normal) + n;
            mesh.vertices[i].normal = cur.to_array();
        }
    }
    for v in &mut mesh.vertices {
        let n = Vec3::from(v.normal).normalize_or_zero();
        v.normal = n.to_array();
    }
}

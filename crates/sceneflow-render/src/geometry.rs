//! Unit geometry tessellation and grid line generation.
//!
//! All primitives are unit-sized and centered on the origin; the per-visual
//! scale stretches them to the described dimensions.

use bytemuck::{Pod, Zeroable};
use sceneflow_core::GridParams;

/// Vertex layout shared by the mesh pipelines.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl Vertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];

    /// Vertex buffer layout for pipeline creation.
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// CPU-side mesh: vertices plus triangle indices.
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    fn push_quad(&mut self, corners: [[f32; 3]; 4], normal: [f32; 3]) {
        let base = self.vertices.len() as u32;
        for position in corners {
            self.vertices.push(Vertex { position, normal });
        }
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
}

/// Unit cube, extents -0.5..0.5, per-face normals.
pub fn unit_box() -> MeshData {
    let mut mesh = MeshData::default();
    let h = 0.5;
    // +X, -X, +Y, -Y, +Z, -Z
    mesh.push_quad(
        [[h, -h, -h], [h, h, -h], [h, h, h], [h, -h, h]],
        [1.0, 0.0, 0.0],
    );
    mesh.push_quad(
        [[-h, h, -h], [-h, -h, -h], [-h, -h, h], [-h, h, h]],
        [-1.0, 0.0, 0.0],
    );
    mesh.push_quad(
        [[h, h, -h], [-h, h, -h], [-h, h, h], [h, h, h]],
        [0.0, 1.0, 0.0],
    );
    mesh.push_quad(
        [[-h, -h, -h], [h, -h, -h], [h, -h, h], [-h, -h, h]],
        [0.0, -1.0, 0.0],
    );
    mesh.push_quad(
        [[-h, -h, h], [h, -h, h], [h, h, h], [-h, h, h]],
        [0.0, 0.0, 1.0],
    );
    mesh.push_quad(
        [[-h, h, -h], [h, h, -h], [h, -h, -h], [-h, -h, -h]],
        [0.0, 0.0, -1.0],
    );
    mesh
}

/// Unit plane facing +Z, extents -0.5..0.5.
pub fn unit_plane() -> MeshData {
    let mut mesh = MeshData::default();
    let h = 0.5;
    mesh.push_quad(
        [[-h, -h, 0.0], [h, -h, 0.0], [h, h, 0.0], [-h, h, 0.0]],
        [0.0, 0.0, 1.0],
    );
    mesh
}

/// Unit-diameter sphere (radius 0.5).
pub fn unit_sphere(stacks: u32, slices: u32) -> MeshData {
    let mut mesh = MeshData::default();
    let r = 0.5;

    for stack in 0..=stacks {
        let phi = std::f32::consts::PI * stack as f32 / stacks as f32;
        let (sin_phi, cos_phi) = phi.sin_cos();
        for slice in 0..=slices {
            let theta = std::f32::consts::TAU * slice as f32 / slices as f32;
            let (sin_theta, cos_theta) = theta.sin_cos();
            let n = [sin_phi * cos_theta, sin_phi * sin_theta, cos_phi];
            mesh.vertices.push(Vertex {
                position: [n[0] * r, n[1] * r, n[2] * r],
                normal: n,
            });
        }
    }

    let stride = slices + 1;
    for stack in 0..stacks {
        for slice in 0..slices {
            let a = stack * stride + slice;
            let b = a + stride;
            mesh.indices
                .extend_from_slice(&[a, b, a + 1, a + 1, b, b + 1]);
        }
    }
    mesh
}

/// Unit-diameter, unit-length cylinder along Z (radius 0.5, z -0.5..0.5).
pub fn unit_cylinder(segments: u32) -> MeshData {
    let mut mesh = MeshData::default();
    let r = 0.5;
    let h = 0.5;

    // Side wall with smooth normals.
    for i in 0..=segments {
        let theta = std::f32::consts::TAU * i as f32 / segments as f32;
        let (sin_t, cos_t) = theta.sin_cos();
        let normal = [cos_t, sin_t, 0.0];
        mesh.vertices.push(Vertex {
            position: [cos_t * r, sin_t * r, -h],
            normal,
        });
        mesh.vertices.push(Vertex {
            position: [cos_t * r, sin_t * r, h],
            normal,
        });
    }
    for i in 0..segments {
        let a = i * 2;
        mesh.indices
            .extend_from_slice(&[a, a + 2, a + 1, a + 1, a + 2, a + 3]);
    }

    // Caps as triangle fans around center vertices.
    for (z, normal) in [(-h, [0.0, 0.0, -1.0f32]), (h, [0.0, 0.0, 1.0f32])] {
        let center = mesh.vertices.len() as u32;
        mesh.vertices.push(Vertex {
            position: [0.0, 0.0, z],
            normal,
        });
        for i in 0..=segments {
            let theta = std::f32::consts::TAU * i as f32 / segments as f32;
            let (sin_t, cos_t) = theta.sin_cos();
            mesh.vertices.push(Vertex {
                position: [cos_t * r, sin_t * r, z],
                normal,
            });
        }
        for i in 0..segments {
            let a = center + 1 + i;
            if normal[2] > 0.0 {
                mesh.indices.extend_from_slice(&[center, a, a + 1]);
            } else {
                mesh.indices.extend_from_slice(&[center, a + 1, a]);
            }
        }
    }
    mesh
}

/// Line-list positions for the reference grid, in the grid's local frame.
///
/// One horizontal lattice per vertical level; with a vertical cell count,
/// pillars connect the levels at every line crossing.
pub fn grid_lines(params: &GridParams) -> Vec<[f32; 3]> {
    let mut lines = Vec::new();
    if params.cell_count == 0 || params.cell_length <= 0.0 {
        return lines;
    }

    let half = params.half_extent();
    let step = params.cell_length;
    let levels = params.vertical_cell_count;

    for level in 0..=levels {
        let z = level as f32 * step;
        for i in 0..=params.cell_count {
            let offset = -half + i as f32 * step;
            lines.push([offset, -half, z]);
            lines.push([offset, half, z]);
            lines.push([-half, offset, z]);
            lines.push([half, offset, z]);
        }
    }

    if levels > 0 {
        let top = levels as f32 * step;
        for i in 0..=params.cell_count {
            let x = -half + i as f32 * step;
            for j in 0..=params.cell_count {
                let y = -half + j as f32 * step;
                lines.push([x, y, 0.0]);
                lines.push([x, y, top]);
            }
        }
    }

    lines
}

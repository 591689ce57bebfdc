//! Mesh management module.
//!
//! This module defines the [`Mesh`] struct for managing mesh data on the GPU side and the
//! [`MeshLoader`] cache that owns every loaded mesh.
//! Vertices should implement the [`Vertex`] trait.

use std::rc::Rc;

use bytemuck::{Pod, Zeroable};

use super::{GpuContext, ResourceCache, gpu::Gpu};
use crate::error::{Error, Result};

/// Trait that defines the necessary methods for a vertex.
pub trait Vertex: Pod {
    /// Sets up the vertex attribute pointers for the vertex.
    fn vertex_attribs(gpu: &dyn Gpu);
}

/// A vertex carrying only a position, bound to attribute 0.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PositionVertex {
    pub position: [f32; 3],
}

impl Vertex for PositionVertex {
    fn vertex_attribs(gpu: &dyn Gpu) {
        gpu.vertex_attrib_pointer_f32(0, 3, std::mem::size_of::<Self>() as i32, 0);
        gpu.enable_vertex_attrib_array(0);
    }
}

/// Corners of a regular-ish tetrahedron centred near the origin.
pub const TETRAHEDRON_VERTICES: [PositionVertex; 4] = [
    PositionVertex { position: [0.5, -0.25, 0.0] },
    PositionVertex { position: [-0.25, -0.25, 0.42] },
    PositionVertex { position: [-0.25, -0.25, -0.42] },
    PositionVertex { position: [0.0, 0.5, 0.0] },
];

/// The four faces of [`TETRAHEDRON_VERTICES`].
pub const TETRAHEDRON_INDICES: [u32; 12] = [
    0, 1, 2, //
    0, 1, 3, //
    1, 2, 3, //
    2, 0, 3, //
];

/// Primitive assembly mode of an indexed draw.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DrawMode {
    Points,
    Lines,
    LineStrip,
    #[default]
    Triangles,
    TriangleStrip,
    TriangleFan,
}

impl DrawMode {
    pub fn gl(self) -> u32 {
        match self {
            Self::Points => glow::POINTS,
            Self::Lines => glow::LINES,
            Self::LineStrip => glow::LINE_STRIP,
            Self::Triangles => glow::TRIANGLES,
            Self::TriangleStrip => glow::TRIANGLE_STRIP,
            Self::TriangleFan => glow::TRIANGLE_FAN,
        }
    }
}

/// Represents a mesh stored on the GPU side.
pub struct Mesh {
    gpu: GpuContext,
    draw_mode: DrawMode,
    vao: glow::VertexArray,
    vbo: glow::Buffer,
    ebo: glow::Buffer,
    index_count: usize,
}

impl Mesh {
    /// Creates a new mesh from the given vertex and index data.
    pub fn new<V: Vertex>(
        gpu: &GpuContext,
        vertices: &[V],
        indices: &[u32],
        draw_mode: DrawMode,
    ) -> Result<Self> {
        // Created one by one so a failure part way deletes what already exists.
        let vao = gpu.create_vertex_array().map_err(Error::Gpu)?;
        let vbo = match gpu.create_buffer() {
            Ok(vbo) => vbo,
            Err(e) => {
                gpu.delete_vertex_array(vao);
                return Err(Error::Gpu(e));
            }
        };
        let ebo = match gpu.create_buffer() {
            Ok(ebo) => ebo,
            Err(e) => {
                gpu.delete_buffer(vbo);
                gpu.delete_vertex_array(vao);
                return Err(Error::Gpu(e));
            }
        };

        gpu.bind_vertex_array(Some(vao));
        gpu.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
        gpu.buffer_data_u8_slice(
            glow::ARRAY_BUFFER,
            bytemuck::cast_slice(vertices),
            glow::STATIC_DRAW,
        );

        gpu.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(ebo));
        gpu.buffer_data_u8_slice(
            glow::ELEMENT_ARRAY_BUFFER,
            bytemuck::cast_slice(indices),
            glow::STATIC_DRAW,
        );

        V::vertex_attribs(gpu.as_ref());

        gpu.bind_vertex_array(None);
        gpu.bind_buffer(glow::ARRAY_BUFFER, None);
        gpu.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, None);

        Ok(Self {
            gpu: Rc::clone(gpu),
            draw_mode,
            vao,
            vbo,
            ebo,
            index_count: indices.len(),
        })
    }

    /// Binds the vertex array of the mesh.
    pub fn bind(&self) {
        self.gpu.bind_vertex_array(Some(self.vao));
    }

    /// Draws the mesh.
    pub fn draw(&self) {
        self.bind();
        self.gpu.draw_elements(
            self.draw_mode.gl(),
            self.index_count as i32,
            glow::UNSIGNED_INT,
            0,
        );
        self.gpu.bind_vertex_array(None);
    }

    /// Number of indices drawn, not the vertex count.
    pub fn index_count(&self) -> usize {
        self.index_count
    }

    pub fn draw_mode(&self) -> DrawMode {
        self.draw_mode
    }
}

impl Drop for Mesh {
    fn drop(&mut self) {
        self.gpu.delete_buffer(self.vbo);
        self.gpu.delete_buffer(self.ebo);
        self.gpu.delete_vertex_array(self.vao);
    }
}

/// Caches meshes by name.
pub struct MeshLoader {
    gpu: GpuContext,
    meshes: ResourceCache<Mesh>,
}

impl MeshLoader {
    pub fn new(gpu: &GpuContext) -> Self {
        Self {
            gpu: Rc::clone(gpu),
            meshes: ResourceCache::new("mesh"),
        }
    }

    /// Uploads vertex and index data as a new mesh.
    pub fn load<V: Vertex>(
        &mut self,
        key: &str,
        vertices: &[V],
        indices: &[u32],
        draw_mode: DrawMode,
    ) -> Result<&Mesh> {
        self.meshes.ensure_vacant(key)?;
        let mesh = Mesh::new(&self.gpu, vertices, indices, draw_mode)?;
        self.meshes.insert(key, mesh)
    }

    /// Uploads the built-in tetrahedron.
    pub fn load_tetrahedron(&mut self, key: &str) -> Result<&Mesh> {
        self.load(
            key,
            &TETRAHEDRON_VERTICES,
            &TETRAHEDRON_INDICES,
            DrawMode::Triangles,
        )
    }

    pub fn get(&self, key: &str) -> Result<&Mesh> {
        self.meshes.get(key)
    }

    /// Deletes the buffers and vertex array stored under `key`.
    pub fn unload(&mut self, key: &str) -> Result<()> {
        self.meshes.remove(key).map(drop)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.meshes.contains(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.meshes.keys()
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }
}

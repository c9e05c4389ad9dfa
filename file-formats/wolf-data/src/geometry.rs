//! Per-surface output handed to the GPU upload layer.

use bytemuck::{Pod, Zeroable};

use crate::error::{DataError, Result};

/// Packed vertex layout: position, normal, texture coordinate.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coord: [f32; 2],
}

/// One surface worth of geometry: a vertex buffer and a 16-bit index buffer.
///
/// Render calls fill draw calls in place and never resize them, so a caller
/// can keep two sets and alternate between them across frames.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawCall {
    pub name: String,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u16>,
}

impl DrawCall {
    /// Creates a zeroed draw call with room for the given number of vertices
    /// and indices.
    pub fn with_size(name: impl Into<String>, vertex_count: usize, index_count: usize) -> Self {
        Self {
            name: name.into(),
            vertices: vec![Vertex::default(); vertex_count],
            indices: vec![0; index_count],
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// Checks that this draw call was sized for a surface with the given
    /// counts.
    pub fn check_size(&self, vertex_count: usize, index_count: usize) -> Result<()> {
        if self.vertices.len() != vertex_count {
            return Err(DataError::BufferSizeMismatch {
                what: "vertices",
                expected: vertex_count,
                actual: self.vertices.len(),
            });
        }
        if self.indices.len() != index_count {
            return Err(DataError::BufferSizeMismatch {
                what: "indices",
                expected: index_count,
                actual: self.indices.len(),
            });
        }
        Ok(())
    }
}

/// Surface queries shared by rigid and skeletal models.
///
/// Out-of-range surface indices report zero counts.
pub trait SurfaceSource {
    fn surface_count(&self) -> usize;

    fn surface_name(&self, index: usize) -> Option<&str>;

    fn surface_vertex_count(&self, index: usize) -> usize;

    fn surface_triangle_count(&self, index: usize) -> usize;

    /// Allocates one draw call per surface, sized for rendering this model.
    fn allocate_draw_calls(&self) -> Vec<DrawCall> {
        (0..self.surface_count())
            .map(|i| {
                DrawCall::with_size(
                    self.surface_name(i).unwrap_or_default(),
                    self.surface_vertex_count(i),
                    self.surface_triangle_count(i) * 3,
                )
            })
            .collect()
    }

    /// Checks that `draw_calls` matches what [`allocate_draw_calls`] would
    /// return.
    ///
    /// [`allocate_draw_calls`]: SurfaceSource::allocate_draw_calls
    fn check_draw_calls(&self, draw_calls: &[DrawCall]) -> Result<()> {
        if draw_calls.len() != self.surface_count() {
            return Err(DataError::BufferSizeMismatch {
                what: "draw calls",
                expected: self.surface_count(),
                actual: draw_calls.len(),
            });
        }
        for (i, draw_call) in draw_calls.iter().enumerate() {
            draw_call.check_size(
                self.surface_vertex_count(i),
                self.surface_triangle_count(i) * 3,
            )?;
        }
        Ok(())
    }
}

use glam::Vec3;
use wolf_data::{DrawCall, SurfaceSource, Vertex};

use crate::error::Result;
use crate::model::SkeletalModel;
use crate::skeleton::{FrameInfo, Skeleton};
use crate::surface::{Surface, WeightedVertex};

/// Weighted sum of the vertex's offsets placed by their bones.
///
/// Weights whose bone is not in `skeleton` contribute nothing. Weights are
/// used as stored, without normalising their sum.
pub fn skin_position(skeleton: &Skeleton, vertex: &WeightedVertex) -> Vec3 {
    vertex
        .weights
        .iter()
        .filter_map(|w| Some(skeleton.bone(w.bone)?.transform_point(w.offset) * w.weight))
        .sum()
}

impl SkeletalModel {
    /// Poses the model for `frame_info` and writes every surface into
    /// `draw_calls`.
    ///
    /// The draw calls must have been sized with
    /// [`SurfaceSource::allocate_draw_calls`]. Normals and texture
    /// coordinates are copied from the model unchanged.
    pub fn render(&self, frame_info: &FrameInfo, draw_calls: &mut [DrawCall]) -> Result<()> {
        frame_info.check(self)?;
        self.check_draw_calls(draw_calls)?;

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            self.surfaces()
                .par_iter()
                .zip(draw_calls.par_iter_mut())
                .try_for_each(|(surface, draw_call)| self.skin_surface(surface, frame_info, draw_call))
        }

        #[cfg(not(feature = "parallel"))]
        {
            self.surfaces()
                .iter()
                .zip(draw_calls.iter_mut())
                .try_for_each(|(surface, draw_call)| self.skin_surface(surface, frame_info, draw_call))
        }
    }

    fn skin_surface(
        &self,
        surface: &Surface,
        frame_info: &FrameInfo,
        draw_call: &mut DrawCall,
    ) -> Result<()> {
        let skeleton = Skeleton::evaluate(self, frame_info, &surface.bone_refs)?;

        for (out, vertex) in draw_call.vertices.iter_mut().zip(&surface.vertices) {
            *out = Vertex {
                position: skin_position(&skeleton, vertex).to_array(),
                normal: vertex.normal.to_array(),
                tex_coord: vertex.tex_coord.to_array(),
            };
        }
        draw_call.indices.copy_from_slice(&surface.indices);
        Ok(())
    }
}

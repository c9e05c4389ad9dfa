use glam::{Vec2, Vec3};
use wolf_data::reader::count;
use wolf_data::{QPath, Record, RecordReader};

use crate::error::{MdsError, Result};

/// MDS surface header as stored on disk. Offsets are relative to the start
/// of the surface.
#[derive(Debug, Clone, PartialEq, Record)]
pub struct MdsSurfaceHeader {
    pub ident: [u8; 4],
    pub name: QPath,
    pub shader: QPath,
    pub shader_index: i32,
    pub min_lod: i32,
    /// Negative offset back to the file header
    pub ofs_header: i32,
    pub num_verts: i32,
    pub ofs_verts: i32,
    pub num_triangles: i32,
    pub ofs_triangles: i32,
    pub ofs_collapse_map: i32,
    pub num_bone_references: i32,
    pub ofs_bone_references: i32,
    pub ofs_end: i32,
}

/// Position of `ofs_end` inside a surface header.
pub const MDS_SURFACE_END_FIELD: usize = MdsSurfaceHeader::SIZE - 4;

/// Fixed part of a vertex record; `num_weights` [`Weight`]s follow it.
#[derive(Debug, Clone, PartialEq, Record)]
pub struct VertexHeader {
    pub normal: Vec3,
    pub tex_coords: Vec2,
    pub num_weights: i32,
    pub fixed_parent: i32,
    pub fixed_dist: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Record)]
pub struct Weight {
    pub bone_index: i32,
    pub bone_weight: f32,
    /// Vertex position in the bone's space
    pub offset: Vec3,
}

/// A weight whose bone index has been checked against the model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoneWeight {
    pub bone: usize,
    pub weight: f32,
    pub offset: Vec3,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeightedVertex {
    pub normal: Vec3,
    pub tex_coord: Vec2,
    pub weights: Vec<BoneWeight>,
    pub fixed_parent: i32,
    pub fixed_dist: f32,
}

impl WeightedVertex {
    /// Byte size of this vertex's record.
    pub fn record_size(&self) -> usize {
        VertexHeader::SIZE + self.weights.len() * Weight::SIZE
    }
}

/// A decoded skinned surface.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    pub name: String,
    pub shader: String,
    pub shader_index: i32,
    pub min_lod: i32,
    pub vertices: Vec<WeightedVertex>,
    pub indices: Vec<u16>,
    /// Vertex each vertex collapses into when reducing detail
    pub collapse_map: Vec<i32>,
    /// Bones needed to skin this surface, parents before children
    pub bone_refs: Vec<usize>,
}

impl Surface {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Decodes the surface starting at `start` for a model with `num_bones`
/// bones.
pub(crate) fn read_surface(data: &[u8], start: usize, num_bones: usize) -> Result<Surface> {
    let raw: MdsSurfaceHeader = RecordReader::at(data, start)?.read()?;
    let name = raw.name.to_string_lossy();
    let num_verts = count(raw.num_verts, "num_verts")?;
    let num_triangles = count(raw.num_triangles, "num_triangles")?;
    let num_bone_refs = count(raw.num_bone_references, "num_bone_references")?;

    if num_verts > usize::from(u16::MAX) + 1 {
        return Err(MdsError::CorruptModel(format!(
            "surface {name:?} has {num_verts} vertices, more than 16-bit indices can address"
        )));
    }

    let bone_refs = RecordReader::at_relative(
        data,
        start,
        raw.ofs_bone_references,
        "ofs_bone_references",
    )?
    .read_array::<i32>(num_bone_refs)?
    .into_iter()
    .map(|index| bone_index(index, num_bones, &name))
    .collect::<Result<Vec<_>>>()?;

    // Each vertex carries its own weight list, so the cursor advances by
    // the size of every record rather than a fixed stride.
    let mut cursor = RecordReader::at_relative(data, start, raw.ofs_verts, "ofs_verts")?;
    let mut vertices = Vec::with_capacity(num_verts.min(cursor.remaining() / VertexHeader::SIZE));
    for _ in 0..num_verts {
        let header: VertexHeader = cursor.read()?;
        let num_weights = count(header.num_weights, "num_weights")?;
        let weights = cursor
            .read_array::<Weight>(num_weights)?
            .into_iter()
            .map(|w| {
                let bone = bone_index(w.bone_index, num_bones, &name)?;
                if !bone_refs.contains(&bone) {
                    return Err(MdsError::CorruptModel(format!(
                        "surface {name:?} weights bone {bone} missing from its bone references"
                    )));
                }
                Ok(BoneWeight {
                    bone,
                    weight: w.bone_weight,
                    offset: w.offset,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        vertices.push(WeightedVertex {
            normal: header.normal,
            tex_coord: header.tex_coords,
            weights,
            fixed_parent: header.fixed_parent,
            fixed_dist: header.fixed_dist,
        });
    }

    let triangles = RecordReader::at_relative(data, start, raw.ofs_triangles, "ofs_triangles")?
        .read_array::<[i32; 3]>(num_triangles)?;
    let mut indices = Vec::with_capacity(num_triangles * 3);
    for index in triangles.iter().flatten() {
        match usize::try_from(*index) {
            Ok(i) if i < num_verts => indices.push(i as u16),
            _ => {
                return Err(MdsError::CorruptModel(format!(
                    "surface {name:?} triangle index {index} out of range ({num_verts} vertices)"
                )));
            }
        }
    }

    let collapse_map =
        RecordReader::at_relative(data, start, raw.ofs_collapse_map, "ofs_collapse_map")?
            .read_array::<i32>(num_verts)?;

    log::debug!(
        "MDS surface {:?} at {}: {} vertices, {} triangles, {} bone references",
        name,
        start,
        num_verts,
        num_triangles,
        bone_refs.len()
    );

    Ok(Surface {
        name,
        shader: raw.shader.to_string_lossy(),
        shader_index: raw.shader_index,
        min_lod: raw.min_lod,
        vertices,
        indices,
        collapse_map,
        bone_refs,
    })
}

fn bone_index(index: i32, num_bones: usize, surface: &str) -> Result<usize> {
    match usize::try_from(index) {
        Ok(bone) if bone < num_bones => Ok(bone),
        _ => Err(MdsError::CorruptModel(format!(
            "surface {surface:?} references bone {index}, model has {num_bones}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_sizes() {
        assert_eq!(MdsSurfaceHeader::SIZE, 176);
        assert_eq!(MDS_SURFACE_END_FIELD, 172);
        assert_eq!(VertexHeader::SIZE, 32);
        assert_eq!(Weight::SIZE, 20);
    }

    #[test]
    fn test_vertex_record_size_counts_weights() {
        let vertex = WeightedVertex {
            normal: Vec3::Z,
            tex_coord: Vec2::ZERO,
            weights: vec![
                BoneWeight {
                    bone: 0,
                    weight: 0.5,
                    offset: Vec3::ZERO,
                };
                3
            ],
            fixed_parent: 0,
            fixed_dist: 0.0,
        };
        assert_eq!(vertex.record_size(), 92);
    }

    #[test]
    fn test_bone_index_range() {
        assert_eq!(bone_index(3, 4, "s").unwrap(), 3);
        assert!(matches!(bone_index(4, 4, "s"), Err(MdsError::CorruptModel(_))));
        assert!(matches!(bone_index(-1, 4, "s"), Err(MdsError::CorruptModel(_))));
    }
}

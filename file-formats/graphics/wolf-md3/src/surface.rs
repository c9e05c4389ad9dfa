use glam::{Vec2, Vec3};
use wolf_data::reader::count;
use wolf_data::{QPath, Record, RecordReader, Vertex};

use crate::error::{Md3Error, Result};
use crate::header::{MD3_XYZ_SCALE, MDC_DIST_SCALE, MDC_MAX_OFS, ModelFormat};
use crate::normal::decode_normal;

/// MD3 surface header as stored on disk. All offsets are relative to the
/// start of the surface.
#[derive(Debug, Clone, PartialEq, Record)]
pub struct Md3SurfaceHeader {
    pub ident: [u8; 4],
    pub name: QPath,
    pub flags: i32,
    pub num_frames: i32,
    pub num_shaders: i32,
    pub num_verts: i32,
    pub num_triangles: i32,
    pub ofs_triangles: i32,
    pub ofs_shaders: i32,
    pub ofs_st: i32,
    pub ofs_xyz_normals: i32,
    pub ofs_end: i32,
}

/// MDC surface header as stored on disk.
///
/// `ofs_xyz_normals` holds `num_base_frames` full precision frames and
/// `ofs_xyz_compressed` holds `num_comp_frames` delta frames. The two short
/// tables map each model frame to its base frame and its delta frame (-1
/// when the frame is a base frame).
#[derive(Debug, Clone, PartialEq, Record)]
pub struct MdcSurfaceHeader {
    pub ident: [u8; 4],
    pub name: QPath,
    pub flags: i32,
    pub num_comp_frames: i32,
    pub num_base_frames: i32,
    pub num_shaders: i32,
    pub num_verts: i32,
    pub num_triangles: i32,
    pub ofs_triangles: i32,
    pub ofs_shaders: i32,
    pub ofs_st: i32,
    pub ofs_xyz_normals: i32,
    pub ofs_xyz_compressed: i32,
    pub ofs_frame_base_frames: i32,
    pub ofs_frame_comp_frames: i32,
    pub ofs_end: i32,
}

/// Position of `ofs_end` inside an MD3 surface header.
pub const MD3_SURFACE_END_FIELD: usize = Md3SurfaceHeader::SIZE - 4;

/// Position of `ofs_end` inside an MDC surface header.
pub const MDC_SURFACE_END_FIELD: usize = MdcSurfaceHeader::SIZE - 4;

#[derive(Debug, Clone, PartialEq, Record)]
pub struct Shader {
    pub name: QPath,
    pub shader_index: i32,
}

/// Fixed point position and packed normal of one vertex in one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Record)]
pub struct XyzNormal {
    pub xyz: [i16; 3],
    pub normal: i16,
}

impl XyzNormal {
    pub fn position(&self) -> Vec3 {
        Vec3::new(
            f32::from(self.xyz[0]),
            f32::from(self.xyz[1]),
            f32::from(self.xyz[2]),
        ) * MD3_XYZ_SCALE
    }
}

/// Offset of an MDC compressed vertex from its base frame position.
///
/// Bytes 0 to 2 hold the x, y and z steps biased by [`MDC_MAX_OFS`]; the top
/// byte is a normal index.
pub fn compressed_delta(ofs_vec: u32) -> Vec3 {
    let axis = |shift: u32| ((ofs_vec >> shift) & 255) as i32 - MDC_MAX_OFS;
    Vec3::new(axis(0) as f32, axis(8) as f32, axis(16) as f32) * MDC_DIST_SCALE
}

/// A decoded surface with one vertex buffer per model frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    pub name: String,
    pub flags: i32,
    pub shaders: Vec<Shader>,
    pub indices: Vec<u16>,
    pub tex_coords: Vec<Vec2>,
    pub frames: Vec<Vec<Vertex>>,
}

impl Surface {
    pub fn vertex_count(&self) -> usize {
        self.tex_coords.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn frame_vertices(&self, frame: usize) -> Option<&[Vertex]> {
        self.frames.get(frame).map(Vec::as_slice)
    }
}

/// Where a surface keeps its per-frame positions.
enum FrameSource {
    Md3 {
        num_frames: usize,
    },
    Mdc {
        num_base_frames: usize,
        num_comp_frames: usize,
        ofs_xyz_compressed: i32,
        ofs_frame_base_frames: i32,
        ofs_frame_comp_frames: i32,
    },
}

struct SurfaceLayout {
    name: String,
    flags: i32,
    num_shaders: usize,
    num_verts: usize,
    num_triangles: usize,
    ofs_triangles: i32,
    ofs_shaders: i32,
    ofs_st: i32,
    ofs_xyz_normals: i32,
    frames: FrameSource,
}

impl SurfaceLayout {
    fn read(data: &[u8], start: usize, format: ModelFormat) -> Result<Self> {
        let mut reader = RecordReader::at(data, start)?;
        match format {
            ModelFormat::Md3 => {
                let raw: Md3SurfaceHeader = reader.read()?;
                Ok(Self {
                    name: raw.name.to_string_lossy(),
                    flags: raw.flags,
                    num_shaders: count(raw.num_shaders, "num_shaders")?,
                    num_verts: count(raw.num_verts, "num_verts")?,
                    num_triangles: count(raw.num_triangles, "num_triangles")?,
                    ofs_triangles: raw.ofs_triangles,
                    ofs_shaders: raw.ofs_shaders,
                    ofs_st: raw.ofs_st,
                    ofs_xyz_normals: raw.ofs_xyz_normals,
                    frames: FrameSource::Md3 {
                        num_frames: count(raw.num_frames, "num_frames")?,
                    },
                })
            }
            ModelFormat::Mdc => {
                let raw: MdcSurfaceHeader = reader.read()?;
                Ok(Self {
                    name: raw.name.to_string_lossy(),
                    flags: raw.flags,
                    num_shaders: count(raw.num_shaders, "num_shaders")?,
                    num_verts: count(raw.num_verts, "num_verts")?,
                    num_triangles: count(raw.num_triangles, "num_triangles")?,
                    ofs_triangles: raw.ofs_triangles,
                    ofs_shaders: raw.ofs_shaders,
                    ofs_st: raw.ofs_st,
                    ofs_xyz_normals: raw.ofs_xyz_normals,
                    frames: FrameSource::Mdc {
                        num_base_frames: count(raw.num_base_frames, "num_base_frames")?,
                        num_comp_frames: count(raw.num_comp_frames, "num_comp_frames")?,
                        ofs_xyz_compressed: raw.ofs_xyz_compressed,
                        ofs_frame_base_frames: raw.ofs_frame_base_frames,
                        ofs_frame_comp_frames: raw.ofs_frame_comp_frames,
                    },
                })
            }
        }
    }
}

fn table_len(a: usize, b: usize, what: &str) -> Result<usize> {
    a.checked_mul(b)
        .ok_or_else(|| Md3Error::CorruptModel(format!("{what} table size overflows")))
}

/// Decodes the surface starting at `start` for a model with `num_frames`
/// frames.
pub(crate) fn read_surface(
    data: &[u8],
    start: usize,
    format: ModelFormat,
    num_frames: usize,
) -> Result<Surface> {
    let layout = SurfaceLayout::read(data, start, format)?;
    let num_verts = layout.num_verts;

    if num_verts > usize::from(u16::MAX) + 1 {
        return Err(Md3Error::CorruptModel(format!(
            "surface {:?} has {} vertices, more than 16-bit indices can address",
            layout.name, num_verts
        )));
    }

    let shaders = RecordReader::at_relative(data, start, layout.ofs_shaders, "ofs_shaders")?
        .read_array::<Shader>(layout.num_shaders)?;

    let triangles =
        RecordReader::at_relative(data, start, layout.ofs_triangles, "ofs_triangles")?
            .read_array::<[i32; 3]>(layout.num_triangles)?;
    let mut indices = Vec::with_capacity(layout.num_triangles * 3);
    for index in triangles.iter().flatten() {
        match usize::try_from(*index) {
            Ok(i) if i < num_verts => indices.push(i as u16),
            _ => {
                return Err(Md3Error::CorruptModel(format!(
                    "surface {:?} triangle index {} out of range ({} vertices)",
                    layout.name, index, num_verts
                )));
            }
        }
    }

    // Texture coordinates are shared by every frame.
    let tex_coords = RecordReader::at_relative(data, start, layout.ofs_st, "ofs_st")?
        .read_array::<Vec2>(num_verts)?;

    let frames = match &layout.frames {
        FrameSource::Md3 {
            num_frames: surface_frames,
        } => {
            if *surface_frames < num_frames {
                return Err(Md3Error::CorruptModel(format!(
                    "surface {:?} has {} frames, model has {}",
                    layout.name, surface_frames, num_frames
                )));
            }
            let xyz = RecordReader::at_relative(
                data,
                start,
                layout.ofs_xyz_normals,
                "ofs_xyz_normals",
            )?
            .read_array::<XyzNormal>(table_len(num_verts, num_frames, "xyz")?)?;

            (0..num_frames)
                .map(|frame| {
                    let base = &xyz[frame * num_verts..(frame + 1) * num_verts];
                    base.iter()
                        .zip(&tex_coords)
                        .map(|(v, st)| vertex(v.position(), v.normal, *st))
                        .collect()
                })
                .collect()
        }
        FrameSource::Mdc {
            num_base_frames,
            num_comp_frames,
            ofs_xyz_compressed,
            ofs_frame_base_frames,
            ofs_frame_comp_frames,
        } => {
            let xyz = RecordReader::at_relative(
                data,
                start,
                layout.ofs_xyz_normals,
                "ofs_xyz_normals",
            )?
            .read_array::<XyzNormal>(table_len(num_verts, *num_base_frames, "xyz")?)?;
            let compressed = RecordReader::at_relative(
                data,
                start,
                *ofs_xyz_compressed,
                "ofs_xyz_compressed",
            )?
            .read_array::<u32>(table_len(num_verts, *num_comp_frames, "compressed xyz")?)?;
            let base_frames = RecordReader::at_relative(
                data,
                start,
                *ofs_frame_base_frames,
                "ofs_frame_base_frames",
            )?
            .read_array::<i16>(num_frames)?;
            let comp_frames = RecordReader::at_relative(
                data,
                start,
                *ofs_frame_comp_frames,
                "ofs_frame_comp_frames",
            )?
            .read_array::<i16>(num_frames)?;

            let mut frames = Vec::with_capacity(num_frames);
            for frame in 0..num_frames {
                let base = frame_index(base_frames[frame], *num_base_frames, "base", &layout.name)?;
                let base = &xyz[base * num_verts..(base + 1) * num_verts];

                let delta = match comp_frames[frame] {
                    -1 => None,
                    comp => {
                        let comp = frame_index(comp, *num_comp_frames, "delta", &layout.name)?;
                        Some(&compressed[comp * num_verts..(comp + 1) * num_verts])
                    }
                };

                // The top byte of a compressed entry indexes a normal table;
                // the base frame normal is kept instead.
                let vertices = base
                    .iter()
                    .zip(&tex_coords)
                    .enumerate()
                    .map(|(k, (v, st))| {
                        let offset = delta.map_or(Vec3::ZERO, |d| compressed_delta(d[k]));
                        vertex(v.position() + offset, v.normal, *st)
                    })
                    .collect();
                frames.push(vertices);
            }
            frames
        }
    };

    log::debug!(
        "Surface {:?}: {} vertices, {} triangles, {} shaders",
        layout.name,
        num_verts,
        layout.num_triangles,
        shaders.len()
    );

    Ok(Surface {
        name: layout.name,
        flags: layout.flags,
        shaders,
        indices,
        tex_coords,
        frames,
    })
}

fn frame_index(value: i16, limit: usize, kind: &str, surface: &str) -> Result<usize> {
    match usize::try_from(value) {
        Ok(index) if index < limit => Ok(index),
        _ => Err(Md3Error::CorruptModel(format!(
            "surface {surface:?} references {kind} frame {value}, only {limit} stored"
        ))),
    }
}

fn vertex(position: Vec3, normal: i16, tex_coord: Vec2) -> Vertex {
    Vertex {
        position: position.to_array(),
        normal: decode_normal(normal).to_array(),
        tex_coord: tex_coord.to_array(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_surface_header_sizes() {
        assert_eq!(Md3SurfaceHeader::SIZE, 108);
        assert_eq!(MdcSurfaceHeader::SIZE, 124);
        assert_eq!(Shader::SIZE, 68);
        assert_eq!(XyzNormal::SIZE, 8);
    }

    #[test_case(0x007f_7f7f, Vec3::ZERO ; "centered")]
    #[test_case(0x0080_7f7e, Vec3::new(-0.05, 0.0, 0.05) ; "one step each way")]
    #[test_case(0xff00_00ff, Vec3::new(6.4, -6.35, -6.35) ; "extremes ignore normal byte")]
    fn test_compressed_delta(ofs_vec: u32, expected: Vec3) {
        assert!(compressed_delta(ofs_vec).abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn test_fixed_point_position() {
        let v = XyzNormal {
            xyz: [1, -64, 200],
            normal: 0,
        };
        assert_eq!(v.position(), Vec3::new(1.0 / 64.0, -1.0, 3.125));
    }
}

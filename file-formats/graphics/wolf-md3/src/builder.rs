//! Builder for writing MD3 and MDC files from in-memory geometry.
//!
//! Offsets are computed by the builder; callers describe frames, tags and
//! surfaces only.
//!
//! ```
//! use glam::{Vec2, Vec3};
//! use wolf_md3::builder::{RigidModelBuilder, SurfaceFrames, SurfaceSpec, TagPose};
//! use wolf_md3::{ModelFormat, RigidModel, XyzNormal};
//!
//! let vertex = |x, y, z| XyzNormal { xyz: [x, y, z], normal: 0 };
//! let bytes = RigidModelBuilder::new(ModelFormat::Md3)
//!     .with_name("models/box.md3")
//!     .add_tag("tag_head", vec![TagPose::new(Vec3::new(0.0, 0.0, 32.0), Vec3::ZERO)])
//!     .add_surface(SurfaceSpec {
//!         name: "box".into(),
//!         shaders: vec!["textures/box.tga".into()],
//!         triangles: vec![[0, 1, 2]],
//!         tex_coords: vec![Vec2::ZERO, Vec2::X, Vec2::Y],
//!         frames: SurfaceFrames::Md3(vec![vec![
//!             vertex(0, 0, 0),
//!             vertex(64, 0, 0),
//!             vertex(0, 64, 0),
//!         ]]),
//!     })
//!     .build()
//!     .unwrap();
//!
//! let model = RigidModel::load(&bytes).unwrap();
//! assert_eq!(model.tag_names(), ["tag_head"]);
//! ```

use std::fs;
use std::path::Path;

use glam::{Vec2, Vec3};
use wolf_data::math::angles_to_axis;
use wolf_data::{CName, QPath, Record, RecordWriter};

use crate::error::{Md3Error, Result};
use crate::frame::Frame;
use crate::header::{MD3_XYZ_SCALE, MDC_TAG_ANGLE_SCALE, Md3Header, MdcHeader, ModelFormat};
use crate::surface::{Md3SurfaceHeader, MdcSurfaceHeader, Shader, XyzNormal, compressed_delta};
use crate::tag::{Md3Tag, MdcTag};

/// Position and angles (pitch, yaw, roll in degrees) of a tag in one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TagPose {
    pub origin: Vec3,
    pub angles: Vec3,
}

impl TagPose {
    pub const fn new(origin: Vec3, angles: Vec3) -> Self {
        Self { origin, angles }
    }
}

/// Per-frame vertex data of a surface, in the layout of the target format.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceFrames {
    /// One full precision vertex list per model frame
    Md3(Vec<Vec<XyzNormal>>),
    /// Base and delta frames plus the per-model-frame mapping tables
    Mdc {
        base_frames: Vec<Vec<XyzNormal>>,
        comp_frames: Vec<Vec<u32>>,
        frame_base: Vec<i16>,
        frame_comp: Vec<i16>,
    },
}

impl SurfaceFrames {
    fn frame_count(&self) -> usize {
        match self {
            Self::Md3(frames) => frames.len(),
            Self::Mdc { frame_base, .. } => frame_base.len(),
        }
    }

    /// Decoded positions of model frame `frame`, used for frame bounds.
    fn positions(&self, frame: usize) -> Vec<Vec3> {
        match self {
            Self::Md3(frames) => frames
                .get(frame)
                .map(|v| v.iter().map(XyzNormal::position).collect())
                .unwrap_or_default(),
            Self::Mdc {
                base_frames,
                comp_frames,
                frame_base,
                frame_comp,
            } => {
                let base = frame_base
                    .get(frame)
                    .and_then(|&b| base_frames.get(usize::try_from(b).ok()?));
                let comp = frame_comp
                    .get(frame)
                    .and_then(|&c| comp_frames.get(usize::try_from(c).ok()?));
                base.map(|base| {
                    base.iter()
                        .enumerate()
                        .map(|(k, v)| {
                            let delta = comp
                                .and_then(|c| c.get(k))
                                .map_or(Vec3::ZERO, |&ofs| compressed_delta(ofs));
                            v.position() + delta
                        })
                        .collect()
                })
                .unwrap_or_default()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceSpec {
    pub name: String,
    pub shaders: Vec<String>,
    pub triangles: Vec<[i32; 3]>,
    pub tex_coords: Vec<Vec2>,
    pub frames: SurfaceFrames,
}

impl SurfaceSpec {
    fn vertex_count(&self) -> usize {
        self.tex_coords.len()
    }
}

#[derive(Debug, Clone)]
pub struct RigidModelBuilder {
    format: ModelFormat,
    name: String,
    flags: i32,
    frame_count: usize,
    tags: Vec<(String, Vec<TagPose>)>,
    surfaces: Vec<SurfaceSpec>,
}

impl RigidModelBuilder {
    /// Starts a single-frame model of the given format.
    pub fn new(format: ModelFormat) -> Self {
        Self {
            format,
            name: String::new(),
            flags: 0,
            frame_count: 1,
            tags: Vec::new(),
            surfaces: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_flags(mut self, flags: i32) -> Self {
        self.flags = flags;
        self
    }

    /// Sets the number of model frames. Zero is accepted so that invalid
    /// files can be produced on purpose.
    #[must_use]
    pub fn with_frame_count(mut self, frame_count: usize) -> Self {
        self.frame_count = frame_count;
        self
    }

    /// Adds a tag with one pose per model frame.
    #[must_use]
    pub fn add_tag(mut self, name: impl Into<String>, poses: Vec<TagPose>) -> Self {
        self.tags.push((name.into(), poses));
        self
    }

    #[must_use]
    pub fn add_surface(mut self, surface: SurfaceSpec) -> Self {
        self.surfaces.push(surface);
        self
    }

    fn validate(&self) -> Result<()> {
        for (name, poses) in &self.tags {
            if poses.len() != self.frame_count {
                return Err(Md3Error::Validation(format!(
                    "tag {name:?} has {} poses for {} frames",
                    poses.len(),
                    self.frame_count
                )));
            }
        }

        for surface in &self.surfaces {
            let verts = surface.vertex_count();
            let matches_format = matches!(
                (&surface.frames, self.format),
                (SurfaceFrames::Md3(_), ModelFormat::Md3)
                    | (SurfaceFrames::Mdc { .. }, ModelFormat::Mdc)
            );
            if !matches_format {
                return Err(Md3Error::Validation(format!(
                    "surface {:?} frame data does not match {}",
                    surface.name,
                    self.format.name()
                )));
            }
            if surface.frames.frame_count() != self.frame_count {
                return Err(Md3Error::Validation(format!(
                    "surface {:?} has {} frames, model has {}",
                    surface.name,
                    surface.frames.frame_count(),
                    self.frame_count
                )));
            }

            let lists_ok = match &surface.frames {
                SurfaceFrames::Md3(frames) => frames.iter().all(|f| f.len() == verts),
                SurfaceFrames::Mdc {
                    base_frames,
                    comp_frames,
                    frame_comp,
                    ..
                } => {
                    base_frames.iter().all(|f| f.len() == verts)
                        && comp_frames.iter().all(|f| f.len() == verts)
                        && frame_comp.len() == self.frame_count
                }
            };
            if !lists_ok {
                return Err(Md3Error::Validation(format!(
                    "surface {:?} vertex lists do not match its {} texture coordinates",
                    surface.name, verts
                )));
            }
        }
        Ok(())
    }

    /// Lays out and serialises the model.
    pub fn build(&self) -> Result<Vec<u8>> {
        self.validate()?;

        let num_frames = self.frame_count;
        let num_tags = self.tags.len();
        let header_size = match self.format {
            ModelFormat::Md3 => Md3Header::SIZE,
            ModelFormat::Mdc => MdcHeader::SIZE,
        };

        let ofs_frames = header_size;
        let ofs_tag_names = ofs_frames + Frame::SIZE * num_frames;
        let (ofs_tags, ofs_surfaces) = match self.format {
            ModelFormat::Md3 => (
                ofs_tag_names,
                ofs_tag_names + Md3Tag::SIZE * num_frames * num_tags,
            ),
            ModelFormat::Mdc => {
                let ofs_tags = ofs_tag_names + QPath::SIZE * num_tags;
                (ofs_tags, ofs_tags + MdcTag::SIZE * num_frames * num_tags)
            }
        };

        let surfaces: Vec<Vec<u8>> = self
            .surfaces
            .iter()
            .map(|s| self.write_surface(s))
            .collect::<Result<_>>()?;
        let ofs_end = ofs_surfaces + surfaces.iter().map(Vec::len).sum::<usize>();

        let mut writer = RecordWriter::with_capacity(ofs_end);
        let name = QPath::new(&self.name);
        match self.format {
            ModelFormat::Md3 => writer.write(&Md3Header {
                ident: self.format.magic(),
                version: self.format.version(),
                name,
                flags: self.flags,
                num_frames: num_frames as i32,
                num_tags: num_tags as i32,
                num_surfaces: self.surfaces.len() as i32,
                num_skins: 0,
                ofs_frames: ofs_frames as i32,
                ofs_tags: ofs_tags as i32,
                ofs_surfaces: ofs_surfaces as i32,
                ofs_end: ofs_end as i32,
            }),
            ModelFormat::Mdc => writer.write(&MdcHeader {
                ident: self.format.magic(),
                version: self.format.version(),
                name,
                flags: self.flags,
                num_frames: num_frames as i32,
                num_tags: num_tags as i32,
                num_surfaces: self.surfaces.len() as i32,
                num_skins: 0,
                ofs_frames: ofs_frames as i32,
                ofs_tag_names: ofs_tag_names as i32,
                ofs_tags: ofs_tags as i32,
                ofs_surfaces: ofs_surfaces as i32,
                ofs_end: ofs_end as i32,
            }),
        }

        for frame in 0..num_frames {
            writer.write(&self.frame_record(frame));
        }

        if self.format == ModelFormat::Mdc {
            for (name, _) in &self.tags {
                writer.write(&QPath::new(name));
            }
        }

        for frame in 0..num_frames {
            for (name, poses) in &self.tags {
                let pose = poses[frame];
                match self.format {
                    ModelFormat::Md3 => {
                        let axis = angles_to_axis(pose.angles);
                        writer.write(&Md3Tag {
                            name: QPath::new(name),
                            origin: pose.origin,
                            axis: [axis.col(0), axis.col(1), axis.col(2)],
                        });
                    }
                    ModelFormat::Mdc => writer.write(&MdcTag {
                        xyz: quantise(pose.origin, 1.0 / MD3_XYZ_SCALE),
                        angles: quantise(pose.angles, 1.0 / MDC_TAG_ANGLE_SCALE),
                    }),
                }
            }
        }

        for surface in &surfaces {
            writer.write_bytes(surface);
        }

        Ok(writer.into_inner())
    }

    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, self.build()?)?;
        Ok(())
    }

    fn frame_record(&self, frame: usize) -> Frame {
        let positions: Vec<Vec3> = self
            .surfaces
            .iter()
            .flat_map(|s| s.frames.positions(frame))
            .collect();

        let (mins, maxs) = if positions.is_empty() {
            (Vec3::ZERO, Vec3::ZERO)
        } else {
            positions.iter().fold(
                (Vec3::splat(f32::MAX), Vec3::splat(f32::MIN)),
                |(mins, maxs), p| (mins.min(*p), maxs.max(*p)),
            )
        };
        let radius = positions.iter().map(|p| p.length()).fold(0.0, f32::max);

        Frame {
            bounds: [mins, maxs],
            local_origin: Vec3::ZERO,
            radius,
            name: CName::new(&format!("frame {frame}")),
        }
    }

    fn write_surface(&self, surface: &SurfaceSpec) -> Result<Vec<u8>> {
        let num_verts = surface.vertex_count();
        let header_size = match self.format {
            ModelFormat::Md3 => Md3SurfaceHeader::SIZE,
            ModelFormat::Mdc => MdcSurfaceHeader::SIZE,
        };

        let ofs_shaders = header_size;
        let ofs_triangles = ofs_shaders + Shader::SIZE * surface.shaders.len();
        let ofs_st = ofs_triangles + <[i32; 3]>::SIZE * surface.triangles.len();
        let ofs_xyz_normals = ofs_st + Vec2::SIZE * num_verts;

        let mut body = RecordWriter::new();
        for (index, shader) in surface.shaders.iter().enumerate() {
            body.write(&Shader {
                name: QPath::new(shader),
                shader_index: index as i32,
            });
        }
        for triangle in &surface.triangles {
            body.write(triangle);
        }
        for st in &surface.tex_coords {
            body.write(st);
        }

        let mut writer = RecordWriter::new();
        let name = QPath::new(&surface.name);
        match &surface.frames {
            SurfaceFrames::Md3(frames) => {
                for vertex in frames.iter().flatten() {
                    body.write(vertex);
                }
                let ofs_end = header_size + body.position();
                writer.write(&Md3SurfaceHeader {
                    ident: self.format.magic(),
                    name,
                    flags: 0,
                    num_frames: frames.len() as i32,
                    num_shaders: surface.shaders.len() as i32,
                    num_verts: num_verts as i32,
                    num_triangles: surface.triangles.len() as i32,
                    ofs_triangles: ofs_triangles as i32,
                    ofs_shaders: ofs_shaders as i32,
                    ofs_st: ofs_st as i32,
                    ofs_xyz_normals: ofs_xyz_normals as i32,
                    ofs_end: ofs_end as i32,
                });
            }
            SurfaceFrames::Mdc {
                base_frames,
                comp_frames,
                frame_base,
                frame_comp,
            } => {
                let ofs_xyz_compressed = ofs_xyz_normals + XyzNormal::SIZE * num_verts * base_frames.len();
                let ofs_frame_base_frames = ofs_xyz_compressed + u32::SIZE * num_verts * comp_frames.len();
                let ofs_frame_comp_frames = ofs_frame_base_frames + i16::SIZE * frame_base.len();

                for vertex in base_frames.iter().flatten() {
                    body.write(vertex);
                }
                for ofs_vec in comp_frames.iter().flatten() {
                    body.write(ofs_vec);
                }
                for index in frame_base.iter().chain(frame_comp) {
                    body.write(index);
                }
                // Keep the next surface four-byte aligned.
                while (header_size + body.position()) % 4 != 0 {
                    body.write_u8(0);
                }

                let ofs_end = header_size + body.position();
                writer.write(&MdcSurfaceHeader {
                    ident: self.format.magic(),
                    name,
                    flags: 0,
                    num_comp_frames: comp_frames.len() as i32,
                    num_base_frames: base_frames.len() as i32,
                    num_shaders: surface.shaders.len() as i32,
                    num_verts: num_verts as i32,
                    num_triangles: surface.triangles.len() as i32,
                    ofs_triangles: ofs_triangles as i32,
                    ofs_shaders: ofs_shaders as i32,
                    ofs_st: ofs_st as i32,
                    ofs_xyz_normals: ofs_xyz_normals as i32,
                    ofs_xyz_compressed: ofs_xyz_compressed as i32,
                    ofs_frame_base_frames: ofs_frame_base_frames as i32,
                    ofs_frame_comp_frames: ofs_frame_comp_frames as i32,
                    ofs_end: ofs_end as i32,
                });
            }
        }

        writer.write_bytes(body.as_bytes());
        Ok(writer.into_inner())
    }
}

fn quantise(value: Vec3, scale: f32) -> [i16; 3] {
    let scaled = (value * scale).round();
    [scaled.x as i16, scaled.y as i16, scaled.z as i16]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RigidModel;

    fn triangle_surface(frames: SurfaceFrames) -> SurfaceSpec {
        SurfaceSpec {
            name: "tri".into(),
            shaders: vec![],
            triangles: vec![[0, 1, 2]],
            tex_coords: vec![Vec2::ZERO, Vec2::X, Vec2::Y],
            frames,
        }
    }

    fn xyz(x: i16, y: i16, z: i16) -> XyzNormal {
        XyzNormal {
            xyz: [x, y, z],
            normal: 0,
        }
    }

    #[test]
    fn test_mismatched_frame_data_rejected() {
        let result = RigidModelBuilder::new(ModelFormat::Mdc)
            .add_surface(triangle_surface(SurfaceFrames::Md3(vec![vec![
                xyz(0, 0, 0),
                xyz(1, 0, 0),
                xyz(0, 1, 0),
            ]])))
            .build();
        assert!(matches!(result, Err(Md3Error::Validation(_))));
    }

    #[test]
    fn test_tag_pose_count_must_match_frames() {
        let result = RigidModelBuilder::new(ModelFormat::Md3)
            .with_frame_count(2)
            .add_tag("tag_head", vec![TagPose::new(Vec3::ZERO, Vec3::ZERO)])
            .build();
        assert!(matches!(result, Err(Md3Error::Validation(_))));
    }

    #[test]
    fn test_frame_bounds_cover_vertices() {
        let bytes = RigidModelBuilder::new(ModelFormat::Md3)
            .add_surface(triangle_surface(SurfaceFrames::Md3(vec![vec![
                xyz(-64, 0, 0),
                xyz(128, 0, 0),
                xyz(0, 64, -32),
            ]])))
            .build()
            .unwrap();

        let model = RigidModel::load(&bytes).unwrap();
        let frame = &model.frames()[0];
        assert_eq!(frame.mins(), Vec3::new(-1.0, 0.0, -0.5));
        assert_eq!(frame.maxs(), Vec3::new(2.0, 1.0, 0.0));
        assert_eq!(frame.radius, 2.0);
        assert_eq!(frame.name.to_string_lossy(), "frame 0");
    }

    #[test]
    fn test_md3_tag_axis_written_from_angles() {
        let pose = TagPose::new(Vec3::ZERO, Vec3::new(0.0, 90.0, 0.0));
        let bytes = RigidModelBuilder::new(ModelFormat::Md3)
            .add_tag("tag_weapon", vec![pose])
            .build()
            .unwrap();

        let model = RigidModel::load(&bytes).unwrap();
        let transform = model.tag_transform(0, 0).unwrap();
        assert_eq!(transform.rotation, angles_to_axis(pose.angles));
    }
}

//! Builder for writing MDS files from in-memory skeletons and meshes.
//!
//! ```
//! use glam::{Vec2, Vec3};
//! use wolf_mds::builder::{BonePose, BoneSpec, FramePose, MdsBuilder};
//! use wolf_mds::{FrameInfo, SkeletalModel};
//!
//! let bytes = MdsBuilder::new("models/players/body.mds")
//!     .add_bone(BoneSpec::new("root", None, 0.0))
//!     .add_bone(BoneSpec::new("tag_head", Some(0), 10.0))
//!     .add_frame(FramePose::new(
//!         Vec3::new(0.0, 0.0, 20.0),
//!         vec![BonePose::default(); 2],
//!     ))
//!     .add_tag("tag_head", 1)
//!     .build()
//!     .unwrap();
//!
//! let model = SkeletalModel::load(&bytes).unwrap();
//! let (_, head) = model.lerp_tag("tag_head", &FrameInfo::single(0), 0).unwrap().unwrap();
//! assert!((head.position - Vec3::new(10.0, 0.0, 20.0)).length() < 0.01);
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use glam::{Vec2, Vec3};
use wolf_data::{QPath, Record, RecordWriter};

use crate::bone::{BoneFlags, BoneInfo, CompressedBone};
use crate::error::{MdsError, Result};
use crate::frame::{FrameHeader, frame_size};
use crate::header::{MDS_MAGIC, MDS_MAX_BONES, MDS_VERSION, MdsHeader};
use crate::surface::{MdsSurfaceHeader, VertexHeader, Weight};
use crate::tag::MdsTag;

#[derive(Debug, Clone, PartialEq)]
pub struct BoneSpec {
    pub name: String,
    pub parent: Option<usize>,
    pub torso_weight: f32,
    pub parent_dist: f32,
    pub flags: BoneFlags,
}

impl BoneSpec {
    pub fn new(name: impl Into<String>, parent: Option<usize>, parent_dist: f32) -> Self {
        Self {
            name: name.into(),
            parent,
            torso_weight: 0.0,
            parent_dist,
            flags: BoneFlags::empty(),
        }
    }

    #[must_use]
    pub fn with_torso_weight(mut self, torso_weight: f32) -> Self {
        self.torso_weight = torso_weight;
        self
    }

    #[must_use]
    pub fn with_flags(mut self, flags: BoneFlags) -> Self {
        self.flags = flags;
        self
    }
}

/// Pose of one bone in one frame, in degrees.
///
/// `ofs_angles` is the pitch and yaw of the direction from the parent.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BonePose {
    pub angles: Vec3,
    pub ofs_angles: Vec2,
}

impl BonePose {
    pub const fn new(angles: Vec3, ofs_angles: Vec2) -> Self {
        Self { angles, ofs_angles }
    }

    fn compress(&self) -> CompressedBone {
        CompressedBone {
            angles: [
                angle_to_short(self.angles.x),
                angle_to_short(self.angles.y),
                angle_to_short(self.angles.z),
                0,
            ],
            ofs_angles: [
                angle_to_short(self.ofs_angles.x),
                angle_to_short(self.ofs_angles.y),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FramePose {
    pub bounds: [Vec3; 2],
    pub parent_offset: Vec3,
    pub bones: Vec<BonePose>,
}

impl FramePose {
    pub fn new(parent_offset: Vec3, bones: Vec<BonePose>) -> Self {
        Self {
            bounds: [Vec3::ZERO; 2],
            parent_offset,
            bones,
        }
    }

    #[must_use]
    pub fn with_bounds(mut self, mins: Vec3, maxs: Vec3) -> Self {
        self.bounds = [mins, maxs];
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightSpec {
    pub bone: usize,
    pub weight: f32,
    pub offset: Vec3,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VertexSpec {
    pub normal: Vec3,
    pub tex_coord: Vec2,
    pub weights: Vec<WeightSpec>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SurfaceSpec {
    pub name: String,
    pub shader: String,
    pub min_lod: i32,
    pub triangles: Vec<[i32; 3]>,
    pub vertices: Vec<VertexSpec>,
    /// Written as given when non-empty; otherwise derived from the weights
    /// with every ancestor added, parents first.
    pub bone_refs: Vec<usize>,
}

#[derive(Debug, Clone)]
pub struct MdsBuilder {
    name: String,
    lod_scale: f32,
    lod_bias: f32,
    torso_parent: i32,
    bones: Vec<BoneSpec>,
    frames: Vec<FramePose>,
    tags: Vec<(String, f32, usize)>,
    surfaces: Vec<SurfaceSpec>,
}

impl MdsBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lod_scale: 1.0,
            lod_bias: 0.0,
            torso_parent: 0,
            bones: Vec::new(),
            frames: Vec::new(),
            tags: Vec::new(),
            surfaces: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_lod(mut self, lod_scale: f32, lod_bias: f32) -> Self {
        self.lod_scale = lod_scale;
        self.lod_bias = lod_bias;
        self
    }

    /// Sets the raw torso parent field. Any value is written, so that
    /// models with a bad torso parent can be produced on purpose.
    #[must_use]
    pub fn with_torso_parent(mut self, torso_parent: i32) -> Self {
        self.torso_parent = torso_parent;
        self
    }

    #[must_use]
    pub fn add_bone(mut self, bone: BoneSpec) -> Self {
        self.bones.push(bone);
        self
    }

    /// Adds a frame; it needs one pose per bone.
    #[must_use]
    pub fn add_frame(mut self, frame: FramePose) -> Self {
        self.frames.push(frame);
        self
    }

    #[must_use]
    pub fn add_tag(self, name: impl Into<String>, bone: usize) -> Self {
        self.add_weighted_tag(name, 0.0, bone)
    }

    #[must_use]
    pub fn add_weighted_tag(mut self, name: impl Into<String>, torso_weight: f32, bone: usize) -> Self {
        self.tags.push((name.into(), torso_weight, bone));
        self
    }

    #[must_use]
    pub fn add_surface(mut self, surface: SurfaceSpec) -> Self {
        self.surfaces.push(surface);
        self
    }

    /// Checks counts and indices. Parent cycles are left for the loader to
    /// reject.
    fn validate(&self) -> Result<()> {
        let num_bones = self.bones.len();
        if num_bones > MDS_MAX_BONES {
            return Err(MdsError::Validation(format!(
                "{num_bones} bones, at most {MDS_MAX_BONES} allowed"
            )));
        }

        let check_bone = |bone: usize, what: &str| {
            if bone < num_bones {
                Ok(())
            } else {
                Err(MdsError::Validation(format!(
                    "{what} references bone {bone}, model has {num_bones}"
                )))
            }
        };

        for bone in &self.bones {
            if let Some(parent) = bone.parent {
                check_bone(parent, &format!("bone {:?}", bone.name))?;
            }
        }
        for (index, frame) in self.frames.iter().enumerate() {
            if frame.bones.len() != num_bones {
                return Err(MdsError::Validation(format!(
                    "frame {index} has {} bone poses, model has {num_bones} bones",
                    frame.bones.len()
                )));
            }
        }
        for (name, _, bone) in &self.tags {
            check_bone(*bone, &format!("tag {name:?}"))?;
        }
        for surface in &self.surfaces {
            let what = format!("surface {:?}", surface.name);
            for weight in surface.vertices.iter().flat_map(|v| &v.weights) {
                check_bone(weight.bone, &what)?;
            }
            for &bone in &surface.bone_refs {
                check_bone(bone, &what)?;
            }
        }
        Ok(())
    }

    /// Lays out and serialises the model.
    pub fn build(&self) -> Result<Vec<u8>> {
        self.validate()?;

        let num_bones = self.bones.len();
        let ofs_bones = MdsHeader::SIZE;
        let ofs_frames = ofs_bones + BoneInfo::SIZE * num_bones;
        let ofs_tags = ofs_frames + frame_size(num_bones) * self.frames.len();
        let ofs_surfaces = ofs_tags + MdsTag::SIZE * self.tags.len();

        let mut surfaces = Vec::with_capacity(self.surfaces.len());
        let mut start = ofs_surfaces;
        for surface in &self.surfaces {
            let bytes = self.write_surface(surface, start);
            start += bytes.len();
            surfaces.push(bytes);
        }
        let ofs_end = start;

        let mut writer = RecordWriter::with_capacity(ofs_end);
        writer.write(&MdsHeader {
            ident: MDS_MAGIC,
            version: MDS_VERSION,
            name: QPath::new(&self.name),
            lod_scale: self.lod_scale,
            lod_bias: self.lod_bias,
            num_frames: self.frames.len() as i32,
            num_bones: num_bones as i32,
            ofs_frames: ofs_frames as i32,
            ofs_bones: ofs_bones as i32,
            torso_parent: self.torso_parent,
            num_surfaces: self.surfaces.len() as i32,
            ofs_surfaces: ofs_surfaces as i32,
            num_tags: self.tags.len() as i32,
            ofs_tags: ofs_tags as i32,
            ofs_end: ofs_end as i32,
        });

        for bone in &self.bones {
            writer.write(&BoneInfo {
                name: QPath::new(&bone.name),
                parent: bone.parent.map_or(-1, |p| p as i32),
                torso_weight: bone.torso_weight,
                parent_dist: bone.parent_dist,
                flags: bone.flags.bits(),
            });
        }

        for frame in &self.frames {
            let [mins, maxs] = frame.bounds;
            writer.write(&FrameHeader {
                bounds: frame.bounds,
                local_origin: Vec3::ZERO,
                radius: mins.length().max(maxs.length()),
                parent_offset: frame.parent_offset,
            });
            for pose in &frame.bones {
                writer.write(&pose.compress());
            }
        }

        for (name, torso_weight, bone) in &self.tags {
            writer.write(&MdsTag {
                name: QPath::new(name),
                torso_weight: *torso_weight,
                bone_index: *bone as i32,
            });
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

    fn write_surface(&self, surface: &SurfaceSpec, start: usize) -> Vec<u8> {
        let bone_refs = if surface.bone_refs.is_empty() {
            self.derive_bone_refs(surface)
        } else {
            surface.bone_refs.clone()
        };

        let mut body = RecordWriter::new();
        let ofs_verts = MdsSurfaceHeader::SIZE;
        for vertex in &surface.vertices {
            body.write(&VertexHeader {
                normal: vertex.normal,
                tex_coords: vertex.tex_coord,
                num_weights: vertex.weights.len() as i32,
                fixed_parent: 0,
                fixed_dist: 0.0,
            });
            for weight in &vertex.weights {
                body.write(&Weight {
                    bone_index: weight.bone as i32,
                    bone_weight: weight.weight,
                    offset: weight.offset,
                });
            }
        }

        let ofs_triangles = ofs_verts + body.position();
        for triangle in &surface.triangles {
            body.write(triangle);
        }

        let ofs_collapse_map = ofs_verts + body.position();
        for index in 0..surface.vertices.len() {
            body.write_i32(index as i32);
        }

        let ofs_bone_references = ofs_verts + body.position();
        for &bone in &bone_refs {
            body.write_i32(bone as i32);
        }

        let ofs_end = ofs_verts + body.position();
        let mut writer = RecordWriter::with_capacity(ofs_end);
        writer.write(&MdsSurfaceHeader {
            ident: MDS_MAGIC,
            name: QPath::new(&surface.name),
            shader: QPath::new(&surface.shader),
            shader_index: 0,
            min_lod: surface.min_lod,
            ofs_header: -(start as i32),
            num_verts: surface.vertices.len() as i32,
            ofs_verts: ofs_verts as i32,
            num_triangles: surface.triangles.len() as i32,
            ofs_triangles: ofs_triangles as i32,
            ofs_collapse_map: ofs_collapse_map as i32,
            num_bone_references: bone_refs.len() as i32,
            ofs_bone_references: ofs_bone_references as i32,
            ofs_end: ofs_end as i32,
        });
        writer.write_bytes(body.as_bytes());
        writer.into_inner()
    }

    /// Bones weighted by `surface` plus their ancestors, parents first.
    fn derive_bone_refs(&self, surface: &SurfaceSpec) -> Vec<usize> {
        let mut weighted: Vec<usize> = surface
            .vertices
            .iter()
            .flat_map(|v| v.weights.iter().map(|w| w.bone))
            .collect();
        weighted.sort_unstable();
        weighted.dedup();

        let mut seen = HashSet::new();
        let mut refs = Vec::new();
        for bone in weighted {
            let mut chain = Vec::new();
            let mut current = Some(bone);
            while let Some(index) = current {
                if chain.len() > self.bones.len() || seen.contains(&index) {
                    break;
                }
                chain.push(index);
                current = self.bones.get(index).and_then(|b| b.parent);
            }
            for &index in chain.iter().rev() {
                if seen.insert(index) {
                    refs.push(index);
                }
            }
        }
        refs
    }
}

fn angle_to_short(degrees: f32) -> i16 {
    (degrees * (65536.0 / 360.0)).round() as i32 as i16
}

#[cfg(test)]
mod tests {
    use super::*;
    use wolf_data::math::short_to_angle;

    fn chain_builder() -> MdsBuilder {
        MdsBuilder::new("chain")
            .add_bone(BoneSpec::new("root", None, 0.0))
            .add_bone(BoneSpec::new("spine", Some(0), 4.0))
            .add_bone(BoneSpec::new("hand", Some(1), 4.0))
    }

    #[test]
    fn test_angle_quantisation_wraps() {
        assert_eq!(angle_to_short(90.0), 16384);
        assert_eq!(angle_to_short(350.0), -1820);
        assert!((short_to_angle(angle_to_short(-45.0)) + 45.0).abs() < 0.01);
    }

    #[test]
    fn test_frame_pose_count_must_match_bones() {
        let result = chain_builder()
            .add_frame(FramePose::new(Vec3::ZERO, vec![BonePose::default(); 2]))
            .build();
        assert!(matches!(result, Err(MdsError::Validation(_))));
    }

    #[test]
    fn test_tag_bone_must_exist() {
        let result = chain_builder().add_tag("tag_weapon", 3).build();
        assert!(matches!(result, Err(MdsError::Validation(_))));
    }

    #[test]
    fn test_bone_refs_include_ancestors_parents_first() {
        let surface = SurfaceSpec {
            name: "hand".into(),
            vertices: vec![VertexSpec {
                normal: Vec3::Z,
                tex_coord: Vec2::ZERO,
                weights: vec![WeightSpec {
                    bone: 2,
                    weight: 1.0,
                    offset: Vec3::ZERO,
                }],
            }],
            ..SurfaceSpec::default()
        };
        assert_eq!(chain_builder().derive_bone_refs(&surface), vec![0, 1, 2]);
    }
}

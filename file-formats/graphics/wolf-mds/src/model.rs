use std::fs;
use std::path::Path;

use wolf_data::{RecordChain, RecordReader, SurfaceSource};

use crate::bone::BoneInfo;
use crate::error::{MdsError, Result};
use crate::frame::{Frame, read_frames};
use crate::header::{MDS_MAX_BONES, SkeletalHeader};
use crate::surface::{MDS_SURFACE_END_FIELD, Surface, read_surface};
use crate::tag::{MdsTag, Tag};

/// A decoded MDS model.
///
/// Frames, bones, tags and surfaces are decoded and validated at load time;
/// poses are computed on demand with [`Skeleton::evaluate`],
/// [`render`](Self::render) and [`lerp_tag`](Self::lerp_tag).
///
/// [`Skeleton::evaluate`]: crate::Skeleton::evaluate
#[derive(Debug, Clone)]
pub struct SkeletalModel {
    header: SkeletalHeader,
    bones: Vec<BoneInfo>,
    frames: Vec<Frame>,
    tags: Vec<Tag>,
    surfaces: Vec<Surface>,
    surface_chain_end: usize,
}

impl SkeletalModel {
    /// Decodes a model from an in-memory file.
    pub fn load(data: &[u8]) -> Result<Self> {
        let header = SkeletalHeader::parse(data)?;

        let bones = RecordReader::at(data, header.ofs_bones)?
            .read_array::<BoneInfo>(header.num_bones)?;
        check_bone_parents(&bones)?;

        let frames = read_frames(data, header.ofs_frames, header.num_frames, header.num_bones)?;

        let tags = RecordReader::at(data, header.ofs_tags)?
            .read_array::<MdsTag>(header.num_tags)?
            .into_iter()
            .map(|raw| {
                let name = raw.name.to_string_lossy();
                match usize::try_from(raw.bone_index) {
                    Ok(bone) if bone < bones.len() => Ok(Tag {
                        name,
                        torso_weight: raw.torso_weight,
                        bone,
                    }),
                    _ => Err(MdsError::CorruptModel(format!(
                        "tag {name:?} is bound to bone {}, model has {}",
                        raw.bone_index,
                        bones.len()
                    ))),
                }
            })
            .collect::<Result<Vec<_>>>()?;

        let mut chain = RecordChain::new(
            data,
            header.ofs_surfaces,
            header.num_surfaces,
            MDS_SURFACE_END_FIELD,
        );
        let room = data.len().saturating_sub(header.ofs_surfaces) / (MDS_SURFACE_END_FIELD + 4);
        let mut surfaces = Vec::with_capacity(header.num_surfaces.min(room));
        for start in chain.by_ref() {
            surfaces.push(read_surface(data, start?, header.num_bones)?);
        }

        let surface_chain_end = chain.end();
        if surface_chain_end != header.ofs_end {
            log::warn!(
                "Surface chain of {:?} ends at {}, header declares {}",
                header.name,
                surface_chain_end,
                header.ofs_end
            );
        }

        log::info!(
            "Loaded MDS model {:?}: {} frames, {} bones, {} tags, {} surfaces",
            header.name,
            header.num_frames,
            header.num_bones,
            tags.len(),
            surfaces.len()
        );

        Ok(Self {
            header,
            bones,
            frames,
            tags,
            surfaces,
            surface_chain_end,
        })
    }

    /// Reads and decodes a model file.
    pub fn load_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path).map_err(|e| {
            log::error!("Cannot read {}: {}", path.display(), e);
            e
        })?;
        Self::load(&data)
    }

    pub fn header(&self) -> &SkeletalHeader {
        &self.header
    }

    pub fn name(&self) -> &str {
        &self.header.name
    }

    pub fn lod_scale(&self) -> f32 {
        self.header.lod_scale
    }

    pub fn lod_bias(&self) -> f32 {
        self.header.lod_bias
    }

    /// Raw torso parent field; may name no bone.
    pub fn torso_parent(&self) -> i32 {
        self.header.torso_parent
    }

    pub fn bones(&self) -> &[BoneInfo] {
        &self.bones
    }

    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    /// Index of the first bone named `name`.
    pub fn find_bone(&self, name: &str) -> Option<usize> {
        self.bones.iter().position(|bone| bone.name.matches(name))
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn surfaces(&self) -> &[Surface] {
        &self.surfaces
    }

    pub fn surface(&self, index: usize) -> Option<&Surface> {
        self.surfaces.get(index)
    }

    /// Offset where the surface chain ended while loading.
    pub fn surface_chain_end(&self) -> usize {
        self.surface_chain_end
    }

    pub(crate) fn check_frame(&self, frame: usize) -> Result<()> {
        if frame < self.frames.len() {
            Ok(())
        } else {
            Err(MdsError::FrameOutOfRange {
                frame,
                count: self.frames.len(),
            })
        }
    }
}

/// Every parent must be -1 or an existing bone, and following parents from
/// any bone must reach a root.
fn check_bone_parents(bones: &[BoneInfo]) -> Result<()> {
    for (index, bone) in bones.iter().enumerate() {
        if bone.parent < -1 || bone.parent_index().is_some_and(|p| p >= bones.len()) {
            return Err(MdsError::CorruptModel(format!(
                "bone {index} ({}) has parent {}, model has {} bones",
                bone.name,
                bone.parent,
                bones.len()
            )));
        }

        let mut current = bone.parent_index();
        let mut depth = 0;
        while let Some(parent) = current {
            depth += 1;
            if depth > bones.len().min(MDS_MAX_BONES) {
                return Err(MdsError::CorruptModel(format!(
                    "bone {index} ({}) is part of a parent cycle",
                    bone.name
                )));
            }
            current = bones.get(parent).and_then(BoneInfo::parent_index);
        }
    }
    Ok(())
}

impl SurfaceSource for SkeletalModel {
    fn surface_count(&self) -> usize {
        self.surfaces.len()
    }

    fn surface_name(&self, index: usize) -> Option<&str> {
        self.surfaces.get(index).map(|s| s.name.as_str())
    }

    fn surface_vertex_count(&self, index: usize) -> usize {
        self.surfaces.get(index).map_or(0, Surface::vertex_count)
    }

    fn surface_triangle_count(&self, index: usize) -> usize {
        self.surfaces.get(index).map_or(0, Surface::triangle_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wolf_data::QPath;

    fn bone(parent: i32) -> BoneInfo {
        BoneInfo {
            name: QPath::new("bone"),
            parent,
            torso_weight: 0.0,
            parent_dist: 1.0,
            flags: 0,
        }
    }

    #[test]
    fn test_parent_chain_accepted() {
        assert!(check_bone_parents(&[bone(-1), bone(0), bone(1), bone(0)]).is_ok());
    }

    #[test]
    fn test_parent_out_of_range_rejected() {
        assert!(matches!(
            check_bone_parents(&[bone(-1), bone(2)]),
            Err(MdsError::CorruptModel(_))
        ));
        assert!(matches!(
            check_bone_parents(&[bone(-2)]),
            Err(MdsError::CorruptModel(_))
        ));
    }

    #[test]
    fn test_parent_cycle_rejected() {
        assert!(matches!(
            check_bone_parents(&[bone(-1), bone(2), bone(1)]),
            Err(MdsError::CorruptModel(_))
        ));
        assert!(matches!(
            check_bone_parents(&[bone(0)]),
            Err(MdsError::CorruptModel(_))
        ));
    }
}

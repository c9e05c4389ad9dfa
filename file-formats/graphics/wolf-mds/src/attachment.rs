use wolf_data::Transform;

use crate::bone::BoneInfo;
use crate::error::{MdsError, Result};
use crate::header::MDS_MAX_BONES;
use crate::model::SkeletalModel;
use crate::skeleton::{FrameInfo, Skeleton};

impl SkeletalModel {
    /// `bone` and its ancestors, root first.
    pub fn bone_chain(&self, bone: usize) -> Result<Vec<usize>> {
        let bones = self.bones();
        if bone >= bones.len() {
            return Err(MdsError::BoneOutOfRange {
                index: bone,
                count: bones.len(),
            });
        }

        let mut chain = Vec::new();
        let mut current = Some(bone);
        while let Some(index) = current {
            if chain.len() == MDS_MAX_BONES {
                return Err(MdsError::CorruptModel(format!(
                    "bone {bone} has a chain deeper than {MDS_MAX_BONES}"
                )));
            }
            chain.push(index);
            current = bones.get(index).and_then(BoneInfo::parent_index);
        }
        chain.reverse();
        Ok(chain)
    }

    /// Index of the first tag named `name` at or after `start_index`.
    pub fn find_tag(&self, name: &str, start_index: usize) -> Option<usize> {
        self.tags()
            .iter()
            .enumerate()
            .skip(start_index)
            .find(|(_, tag)| tag.name == name)
            .map(|(index, _)| index)
    }

    /// Finds the first tag named `name` at or after `start_index` and
    /// returns its index with its model-space transform for `frame_info`.
    ///
    /// Only the bones from the root to the tag's bone are evaluated.
    /// Passing the returned index plus one finds the next tag with the same
    /// name.
    pub fn lerp_tag(
        &self,
        name: &str,
        frame_info: &FrameInfo,
        start_index: usize,
    ) -> Result<Option<(usize, Transform)>> {
        frame_info.check(self)?;

        let Some(index) = self.find_tag(name, start_index) else {
            return Ok(None);
        };
        let bone = self.tags()[index].bone;
        let chain = self.bone_chain(bone)?;
        let skeleton = Skeleton::evaluate(self, frame_info, &chain)?;

        Ok(skeleton.bone(bone).map(|transform| (index, *transform)))
    }

    /// Iterates over every tag named `name`.
    pub fn tags_named<'a>(&'a self, name: &'a str, frame_info: &'a FrameInfo) -> TagsNamed<'a> {
        TagsNamed {
            model: self,
            name,
            frame_info,
            next: 0,
            done: false,
        }
    }
}

/// Iterator returned by [`SkeletalModel::tags_named`].
#[derive(Debug)]
pub struct TagsNamed<'a> {
    model: &'a SkeletalModel,
    name: &'a str,
    frame_info: &'a FrameInfo,
    next: usize,
    done: bool,
}

impl Iterator for TagsNamed<'_> {
    type Item = Result<(usize, Transform)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.model.lerp_tag(self.name, self.frame_info, self.next) {
            Ok(Some((index, transform))) => {
                self.next = index + 1;
                Some(Ok((index, transform)))
            }
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

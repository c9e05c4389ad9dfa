//! Bone pose evaluation.
//!
//! A skeleton is evaluated for a list of bone references rather than for
//! the whole model: a tag lookup only needs the chain from the root to the
//! tag's bone, and each surface lists the bones its weights use.
//!
//! Each bone is posed from two channels. The body channel blends `frame`
//! with `old_frame`; the torso channel blends `torso_frame` with
//! `old_torso_frame`. A bone's torso weight selects how much of the torso
//! channel it follows. After posing, bones with a positive torso weight are
//! turned around the torso parent bone by the caller's torso rotation.

use glam::{Affine3A, Mat3, Vec3};
use wolf_data::Transform;
use wolf_data::math::{angle_normalize_180, angles_to_axis};

use crate::bone::BoneInfo;
use crate::error::{MdsError, Result};
use crate::frame::Frame;
use crate::header::MDS_MAX_BONES;
use crate::model::SkeletalModel;

/// Which frames to pose and how to blend them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInfo {
    pub frame: usize,
    pub old_frame: usize,
    /// Weight of `frame`; `old_frame` gets `1 - lerp`
    pub lerp: f32,
    pub torso_frame: usize,
    pub old_torso_frame: usize,
    pub torso_lerp: f32,
    /// Extra rotation applied to torso-weighted bones, usually the aim
    /// direction
    pub torso_rotation: Mat3,
}

impl FrameInfo {
    /// A single unblended frame for both channels.
    pub fn single(frame: usize) -> Self {
        Self::blend(frame, frame, 0.0)
    }

    /// Blends `old_frame` into `frame` with the torso following the body.
    pub fn blend(frame: usize, old_frame: usize, lerp: f32) -> Self {
        Self {
            frame,
            old_frame,
            lerp,
            torso_frame: frame,
            old_torso_frame: old_frame,
            torso_lerp: lerp,
            torso_rotation: Mat3::IDENTITY,
        }
    }

    #[must_use]
    pub fn with_torso(mut self, torso_frame: usize, old_torso_frame: usize, torso_lerp: f32) -> Self {
        self.torso_frame = torso_frame;
        self.old_torso_frame = old_torso_frame;
        self.torso_lerp = torso_lerp;
        self
    }

    #[must_use]
    pub fn with_torso_rotation(mut self, rotation: Mat3) -> Self {
        self.torso_rotation = rotation;
        self
    }

    /// `(back, front)` weights of the body channel.
    ///
    /// Identical frames always give `(0, 1)`, whatever `lerp` says.
    pub fn body_weights(&self) -> (f32, f32) {
        lerp_weights(self.frame, self.old_frame, self.lerp)
    }

    /// `(back, front)` weights of the torso channel.
    pub fn torso_weights(&self) -> (f32, f32) {
        lerp_weights(self.torso_frame, self.old_torso_frame, self.torso_lerp)
    }

    pub(crate) fn check(&self, model: &SkeletalModel) -> Result<()> {
        for frame in [
            self.frame,
            self.old_frame,
            self.torso_frame,
            self.old_torso_frame,
        ] {
            model.check_frame(frame)?;
        }
        Ok(())
    }
}

impl Default for FrameInfo {
    fn default() -> Self {
        Self::single(0)
    }
}

fn lerp_weights(frame: usize, old_frame: usize, lerp: f32) -> (f32, f32) {
    if frame == old_frame {
        (0.0, 1.0)
    } else {
        (1.0 - lerp, lerp)
    }
}

/// Shortest-path blend from angle `from` to angle `to`, in degrees.
pub fn lerp_angle(from: f32, to: f32, lerp: f32) -> f32 {
    back_lerp_angle(to, from, 1.0 - lerp)
}

fn back_lerp_angle(current: f32, old: f32, back: f32) -> f32 {
    current - back * angle_normalize_180(current - old)
}

fn back_lerp_angles(current: Vec3, old: Vec3, back: f32) -> Vec3 {
    Vec3::from_array([0, 1, 2].map(|axis| back_lerp_angle(current[axis], old[axis], back)))
}

/// Moves `body` towards `torso` by `weight`, per axis, the short way round.
fn blend_angles(body: Vec3, torso: Vec3, weight: f32) -> Vec3 {
    Vec3::from_array([0, 1, 2].map(|axis| {
        let mut diff = torso[axis] - body[axis];
        if diff.abs() > 180.0 {
            diff = angle_normalize_180(diff);
        }
        body[axis] + weight * diff
    }))
}

/// Evaluated bone transforms in model space.
///
/// Only the referenced bones and their ancestors are computed; every other
/// slot stays unset.
#[derive(Debug, Clone, PartialEq)]
pub struct Skeleton {
    bones: Vec<Transform>,
    computed: u128,
}

impl Skeleton {
    /// Poses the bones in `bone_refs` (and their ancestors) for
    /// `frame_info`.
    ///
    /// References should list parents before children, as surface bone
    /// lists and [`SkeletalModel::bone_chain`] do.
    pub fn evaluate(
        model: &SkeletalModel,
        frame_info: &FrameInfo,
        bone_refs: &[usize],
    ) -> Result<Self> {
        frame_info.check(model)?;
        let infos = model.bones();
        if let Some(&index) = bone_refs.iter().find(|&&index| index >= infos.len()) {
            return Err(MdsError::BoneOutOfRange {
                index,
                count: infos.len(),
            });
        }

        let frames = model.frames();
        let (back, front) = frame_info.body_weights();
        let (torso_back, torso_front) = frame_info.torso_weights();
        let poser = BonePoser {
            infos,
            frame: &frames[frame_info.frame],
            old_frame: &frames[frame_info.old_frame],
            torso_frame: &frames[frame_info.torso_frame],
            old_torso_frame: &frames[frame_info.old_torso_frame],
            back,
            front,
            torso_back,
            torso_front,
            blending: back != 0.0 || torso_back != 0.0,
        };

        let mut skeleton = Self {
            bones: vec![Transform::IDENTITY; infos.len()],
            computed: 0,
        };

        let mut pending = [0usize; MDS_MAX_BONES];
        for &index in bone_refs {
            // Collect the uncomputed part of the chain up to the root, then
            // pose it root first.
            let mut len = 0;
            let mut current = Some(index);
            while let Some(bone) = current.filter(|&b| !skeleton.is_computed(b)) {
                if len == MDS_MAX_BONES {
                    return Err(MdsError::CorruptModel(format!(
                        "bone {index} has a chain deeper than {MDS_MAX_BONES}"
                    )));
                }
                pending[len] = bone;
                len += 1;
                current = infos.get(bone).and_then(BoneInfo::parent_index);
            }

            for &bone in pending[..len].iter().rev() {
                let transform = poser.pose(bone, &skeleton);
                skeleton.bones[bone] = transform;
                skeleton.computed |= 1 << bone;
            }
        }

        if bone_refs.iter().any(|&index| infos[index].torso_weight > 0.0) {
            let torso_parent = model.torso_parent();
            let parent = model.header().torso_parent_index().ok_or(
                MdsError::TorsoParentOutOfRange {
                    index: torso_parent,
                    count: infos.len(),
                },
            )?;
            let pivot = if bone_refs.contains(&parent) {
                skeleton.bones[parent].position
            } else {
                Vec3::ZERO
            };
            skeleton.apply_torso_rotation(infos, bone_refs, frame_info.torso_rotation, pivot);
        }

        Ok(skeleton)
    }

    /// Transform of bone `index`, if it was computed.
    pub fn bone(&self, index: usize) -> Option<&Transform> {
        if self.is_computed(index) {
            self.bones.get(index)
        } else {
            None
        }
    }

    pub fn is_computed(&self, index: usize) -> bool {
        index < self.bones.len() && self.computed & (1 << index) != 0
    }

    pub fn computed_count(&self) -> usize {
        self.computed.count_ones() as usize
    }

    /// Number of bone slots, computed or not.
    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    /// Computed bones with their indices.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Transform)> {
        self.bones
            .iter()
            .enumerate()
            .filter(|(index, _)| self.is_computed(*index))
    }

    fn apply_torso_rotation(
        &mut self,
        infos: &[BoneInfo],
        bone_refs: &[usize],
        rotation: Mat3,
        pivot: Vec3,
    ) {
        let mut turned = 0u128;
        for &index in bone_refs {
            let info = &infos[index];
            let weight = info.torso_weight;
            if weight <= 0.0 || turned & (1 << index) != 0 {
                continue;
            }
            turned |= 1 << index;

            let bone = &mut self.bones[index];
            if info.is_tag() {
                let rotated_position = rotation * (bone.position - pivot) + pivot;
                let rotated_axes = rotation * bone.rotation;
                bone.position = bone.position.lerp(rotated_position, weight);
                bone.rotation = bone.rotation * (1.0 - weight) + rotated_axes * weight;
            } else {
                let scaled = rotation * weight + Mat3::IDENTITY * (1.0 - weight);
                let turned_bone = Affine3A::from_mat3_translation(scaled, pivot)
                    * Affine3A::from_mat3_translation(bone.rotation, bone.position - pivot);
                bone.rotation = Mat3::from(turned_bone.matrix3);
                bone.position = Vec3::from(turned_bone.translation);
            }
        }
    }
}

/// Frame data and blend weights shared by every bone of one evaluation.
struct BonePoser<'a> {
    infos: &'a [BoneInfo],
    frame: &'a Frame,
    old_frame: &'a Frame,
    torso_frame: &'a Frame,
    old_torso_frame: &'a Frame,
    back: f32,
    front: f32,
    torso_back: f32,
    torso_front: f32,
    /// False when neither channel blends, so frames are read as stored
    blending: bool,
}

impl BonePoser<'_> {
    /// Poses `index`; its parent must already be in `skeleton`.
    fn pose(&self, index: usize, skeleton: &Skeleton) -> Transform {
        let info = &self.infos[index];
        let weight = info.torso_weight;
        let torso = weight != 0.0;
        let full_torso = weight == 1.0;

        let angles = if full_torso {
            self.torso_angles(index)
        } else if torso {
            blend_angles(self.body_angles(index), self.torso_angles(index), weight)
        } else {
            self.body_angles(index)
        };

        let position = match info.parent_index() {
            Some(parent) => {
                let direction = if full_torso {
                    self.torso_direction(index)
                } else if torso {
                    self.body_direction(index)
                        .lerp(self.torso_direction(index), weight)
                } else {
                    self.body_direction(index)
                };
                skeleton.bones[parent].position + direction * info.parent_dist
            }
            None if self.blending => {
                self.frame.parent_offset * self.front + self.old_frame.parent_offset * self.back
            }
            None => self.frame.parent_offset,
        };

        Transform::new(position, angles_to_axis(angles))
    }

    fn body_angles(&self, index: usize) -> Vec3 {
        self.channel_angles(self.frame, self.old_frame, self.back, index)
    }

    fn torso_angles(&self, index: usize) -> Vec3 {
        self.channel_angles(self.torso_frame, self.old_torso_frame, self.torso_back, index)
    }

    fn body_direction(&self, index: usize) -> Vec3 {
        self.channel_direction(self.frame, self.old_frame, self.front, index)
    }

    fn torso_direction(&self, index: usize) -> Vec3 {
        self.channel_direction(self.torso_frame, self.old_torso_frame, self.torso_front, index)
    }

    fn channel_angles(&self, frame: &Frame, old_frame: &Frame, back: f32, index: usize) -> Vec3 {
        let current = frame.bones[index].angles();
        if self.blending {
            back_lerp_angles(current, old_frame.bones[index].angles(), back)
        } else {
            current
        }
    }

    fn channel_direction(&self, frame: &Frame, old_frame: &Frame, front: f32, index: usize) -> Vec3 {
        let current = frame.bones[index].direction();
        if self.blending {
            old_frame.bones[index].direction().lerp(current, front)
        } else {
            current
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(350.0, 10.0, 0.5, 0.0 ; "wraps through zero")]
    #[test_case(10.0, 350.0, 0.5, 0.0 ; "wraps backwards through zero")]
    #[test_case(0.0, 90.0, 0.5, 45.0 ; "plain blend")]
    #[test_case(170.0, -170.0, 0.5, 180.0 ; "wraps through 180")]
    fn test_lerp_angle_shortest_path(from: f32, to: f32, lerp: f32, expected: f32) {
        let result = lerp_angle(from, to, lerp);
        let error = angle_normalize_180(result - expected);
        assert!(error.abs() < 0.01, "lerp_angle({from}, {to}, {lerp}) = {result}");
    }

    #[test]
    fn test_identical_frames_force_front_weight() {
        let info = FrameInfo::blend(3, 3, 0.25);
        assert_eq!(info.body_weights(), (0.0, 1.0));
        assert_eq!(FrameInfo::blend(3, 2, 0.25).body_weights(), (0.75, 0.25));
    }

    #[test]
    fn test_torso_weights_are_independent() {
        let info = FrameInfo::single(1).with_torso(4, 5, 0.5);
        assert_eq!(info.body_weights(), (0.0, 1.0));
        assert_eq!(info.torso_weights(), (0.5, 0.5));
    }

    #[test]
    fn test_blend_angles_short_way_round() {
        let body = Vec3::new(0.0, 170.0, 0.0);
        let torso = Vec3::new(0.0, -170.0, 0.0);
        let blended = blend_angles(body, torso, 0.5);
        assert!(angle_normalize_180(blended.y - 180.0).abs() < 0.01);
    }
}

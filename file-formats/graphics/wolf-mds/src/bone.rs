use bitflags::bitflags;
use glam::Vec3;
use wolf_data::math::{forward_vector, short_to_angle};
use wolf_data::{QPath, Record};

bitflags! {
    /// Per-bone flags from the bone info table.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct BoneFlags: i32 {
        /// Bone exists only as an attachment point for a tag
        const TAG = 0x1;
    }
}

/// Static description of one bone, shared by every frame.
#[derive(Debug, Clone, PartialEq, Record)]
pub struct BoneInfo {
    pub name: QPath,
    /// Parent bone index, -1 for a root
    pub parent: i32,
    /// How strongly the torso channel drives this bone, 0 to 1
    pub torso_weight: f32,
    /// Distance from the parent bone
    pub parent_dist: f32,
    pub flags: i32,
}

impl BoneInfo {
    pub fn parent_index(&self) -> Option<usize> {
        usize::try_from(self.parent).ok()
    }

    pub fn bone_flags(&self) -> BoneFlags {
        BoneFlags::from_bits_retain(self.flags)
    }

    pub fn is_tag(&self) -> bool {
        self.bone_flags().contains(BoneFlags::TAG)
    }
}

/// Compressed pose of one bone in one frame.
///
/// `angles` holds pitch, yaw and roll (the fourth short is unused);
/// `ofs_angles` holds the pitch and yaw of the direction from the parent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Record)]
pub struct CompressedBone {
    pub angles: [i16; 4],
    pub ofs_angles: [i16; 2],
}

impl CompressedBone {
    /// Rotation angles in degrees.
    pub fn angles(&self) -> Vec3 {
        Vec3::new(
            short_to_angle(self.angles[0]),
            short_to_angle(self.angles[1]),
            short_to_angle(self.angles[2]),
        )
    }

    /// Unit direction from the parent bone.
    pub fn direction(&self) -> Vec3 {
        forward_vector(
            short_to_angle(self.ofs_angles[0]),
            short_to_angle(self.ofs_angles[1]),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_sizes() {
        assert_eq!(BoneInfo::SIZE, 80);
        assert_eq!(CompressedBone::SIZE, 12);
    }

    #[test]
    fn test_unknown_flag_bits_retained() {
        let bone = BoneInfo {
            name: QPath::new("tag_weapon"),
            parent: 2,
            torso_weight: 0.0,
            parent_dist: 4.0,
            flags: 0x5,
        };
        assert!(bone.is_tag());
        assert_eq!(bone.bone_flags().bits(), 0x5);
        assert_eq!(bone.parent_index(), Some(2));
    }

    #[test]
    fn test_direction_from_yaw() {
        let bone = CompressedBone {
            angles: [0; 4],
            ofs_angles: [0, 16384],
        };
        let dir = bone.direction();
        assert!((dir - Vec3::Y).length() < 1e-6);
    }
}

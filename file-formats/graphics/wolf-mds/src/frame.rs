use glam::Vec3;
use wolf_data::{Record, RecordReader};

use crate::bone::CompressedBone;
use crate::error::{MdsError, Result};

/// Fixed part of a frame record. `num_bones` compressed bones follow it.
#[derive(Debug, Clone, PartialEq, Record)]
pub struct FrameHeader {
    pub bounds: [Vec3; 2],
    pub local_origin: Vec3,
    pub radius: f32,
    /// Position of the root bone
    pub parent_offset: Vec3,
}

/// One animation frame with the pose of every bone.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub bounds: [Vec3; 2],
    pub local_origin: Vec3,
    pub radius: f32,
    pub parent_offset: Vec3,
    pub bones: Vec<CompressedBone>,
}

impl Frame {
    pub fn mins(&self) -> Vec3 {
        self.bounds[0]
    }

    pub fn maxs(&self) -> Vec3 {
        self.bounds[1]
    }
}

/// Byte size of one frame record in a model with `num_bones` bones.
pub fn frame_size(num_bones: usize) -> usize {
    FrameHeader::SIZE + num_bones * CompressedBone::SIZE
}

pub(crate) fn read_frames(
    data: &[u8],
    ofs_frames: usize,
    num_frames: usize,
    num_bones: usize,
) -> Result<Vec<Frame>> {
    let table = frame_size(num_bones)
        .checked_mul(num_frames)
        .ok_or_else(|| MdsError::CorruptModel("frame table size overflows".to_string()))?;
    let mut reader = RecordReader::at(data, ofs_frames)?;
    if reader.remaining() < table {
        return Err(MdsError::CorruptModel(format!(
            "frame table needs {table} bytes at offset {ofs_frames}, {} available",
            reader.remaining()
        )));
    }

    (0..num_frames)
        .map(|_| {
            let header: FrameHeader = reader.read()?;
            let bones = reader.read_array::<CompressedBone>(num_bones)?;
            Ok(Frame {
                bounds: header.bounds,
                local_origin: header.local_origin,
                radius: header.radius,
                parent_offset: header.parent_offset,
                bones,
            })
        })
        .collect()
}

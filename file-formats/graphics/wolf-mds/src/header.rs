use wolf_data::reader::count;
use wolf_data::{QPath, Record, RecordReader};

use crate::error::{MdsError, Result};

pub const MDS_MAGIC: [u8; 4] = *b"MDSW";
pub const MDS_VERSION: i32 = 4;

/// Upper bound on the bone count, and so on the depth of any bone chain.
pub const MDS_MAX_BONES: usize = 128;

/// MDS file header as stored on disk.
#[derive(Debug, Clone, PartialEq, Record)]
pub struct MdsHeader {
    pub ident: [u8; 4],
    pub version: i32,
    pub name: QPath,
    pub lod_scale: f32,
    pub lod_bias: f32,
    pub num_frames: i32,
    pub num_bones: i32,
    pub ofs_frames: i32,
    pub ofs_bones: i32,
    /// Bone the torso channel rotates around
    pub torso_parent: i32,
    pub num_surfaces: i32,
    pub ofs_surfaces: i32,
    pub num_tags: i32,
    pub ofs_tags: i32,
    pub ofs_end: i32,
}

/// Validated MDS header with counts and offsets checked for sign.
#[derive(Debug, Clone, PartialEq)]
pub struct SkeletalHeader {
    pub name: String,
    pub lod_scale: f32,
    pub lod_bias: f32,
    pub num_frames: usize,
    pub num_bones: usize,
    pub ofs_frames: usize,
    pub ofs_bones: usize,
    /// Kept signed: only checked when torso bones are evaluated.
    pub torso_parent: i32,
    pub num_surfaces: usize,
    pub ofs_surfaces: usize,
    pub num_tags: usize,
    pub ofs_tags: usize,
    pub ofs_end: usize,
}

impl SkeletalHeader {
    /// Parses and validates the header at the start of `data`.
    ///
    /// Magic and version are checked before any other field is read.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut reader = RecordReader::new(data);

        let magic: [u8; 4] = reader.read()?;
        if magic != MDS_MAGIC {
            let actual = String::from_utf8_lossy(&magic).into_owned();
            log::error!("Invalid MDS magic {actual:?}, expected \"MDSW\"");
            return Err(MdsError::InvalidMagic {
                expected: "MDSW".to_string(),
                actual,
            });
        }

        let version = reader.read_i32()?;
        if version != MDS_VERSION {
            log::error!("MDS version mismatch: expected {MDS_VERSION}, got {version}");
            return Err(MdsError::UnsupportedVersion {
                expected: MDS_VERSION,
                actual: version,
            });
        }

        reader.seek(0)?;
        let raw: MdsHeader = reader.read()?;
        let header = Self {
            name: raw.name.to_string_lossy(),
            lod_scale: raw.lod_scale,
            lod_bias: raw.lod_bias,
            num_frames: count(raw.num_frames, "num_frames")?,
            num_bones: count(raw.num_bones, "num_bones")?,
            ofs_frames: count(raw.ofs_frames, "ofs_frames")?,
            ofs_bones: count(raw.ofs_bones, "ofs_bones")?,
            torso_parent: raw.torso_parent,
            num_surfaces: count(raw.num_surfaces, "num_surfaces")?,
            ofs_surfaces: count(raw.ofs_surfaces, "ofs_surfaces")?,
            num_tags: count(raw.num_tags, "num_tags")?,
            ofs_tags: count(raw.ofs_tags, "ofs_tags")?,
            ofs_end: count(raw.ofs_end, "ofs_end")?,
        };

        if header.num_frames < 1 {
            log::error!("Model {:?} has no frames", header.name);
            return Err(MdsError::NoFrames);
        }

        if header.num_bones > MDS_MAX_BONES {
            return Err(MdsError::CorruptModel(format!(
                "{} bones, at most {MDS_MAX_BONES} are supported",
                header.num_bones
            )));
        }

        if header.ofs_end > data.len() {
            log::warn!(
                "Header end offset {} is past the {} byte buffer",
                header.ofs_end,
                data.len()
            );
        }

        log::debug!(
            "MDS header {:?}: {} frames, {} bones, {} tags, {} surfaces, torso parent {}",
            header.name,
            header.num_frames,
            header.num_bones,
            header.num_tags,
            header.num_surfaces,
            header.torso_parent
        );

        Ok(header)
    }

    /// The torso parent as a bone index, if it names an existing bone.
    pub fn torso_parent_index(&self) -> Option<usize> {
        usize::try_from(self.torso_parent)
            .ok()
            .filter(|&index| index < self.num_bones)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wolf_data::RecordWriter;

    fn header(num_frames: i32, num_bones: i32) -> Vec<u8> {
        let size = MdsHeader::SIZE as i32;
        let mut writer = RecordWriter::new();
        writer.write(&MdsHeader {
            ident: MDS_MAGIC,
            version: MDS_VERSION,
            name: QPath::new("body.mds"),
            lod_scale: 1.0,
            lod_bias: 0.0,
            num_frames,
            num_bones,
            ofs_frames: size,
            ofs_bones: size,
            torso_parent: -1,
            num_surfaces: 0,
            ofs_surfaces: size,
            num_tags: 0,
            ofs_tags: size,
            ofs_end: size,
        });
        writer.into_inner()
    }

    #[test]
    fn test_header_size() {
        assert_eq!(MdsHeader::SIZE, 120);
    }

    #[test]
    fn test_parse_header() {
        let header = SkeletalHeader::parse(&header(2, 0)).unwrap();
        assert_eq!(header.name, "body.mds");
        assert_eq!(header.num_frames, 2);
        assert_eq!(header.torso_parent_index(), None);
    }

    #[test]
    fn test_version_checked_before_body() {
        let mut data = MDS_MAGIC.to_vec();
        data.extend_from_slice(&3i32.to_le_bytes());
        assert!(matches!(
            SkeletalHeader::parse(&data),
            Err(MdsError::UnsupportedVersion {
                expected: 4,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_rigid_magic_rejected() {
        let data = b"IDP3\x0f\x00\x00\x00".to_vec();
        assert!(matches!(
            SkeletalHeader::parse(&data),
            Err(MdsError::InvalidMagic { .. })
        ));
    }

    #[test]
    fn test_zero_frames_rejected() {
        assert!(matches!(
            SkeletalHeader::parse(&header(0, 0)),
            Err(MdsError::NoFrames)
        ));
    }

    #[test]
    fn test_too_many_bones_rejected() {
        assert!(matches!(
            SkeletalHeader::parse(&header(1, 129)),
            Err(MdsError::CorruptModel(_))
        ));
    }
}

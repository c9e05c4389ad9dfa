use wolf_data::reader::count;
use wolf_data::{QPath, Record, RecordReader};

use crate::error::{Md3Error, Result};

/// Magic for uncompressed MD3 models
pub const MD3_MAGIC: [u8; 4] = *b"IDP3";
pub const MD3_VERSION: i32 = 15;

/// Magic for compressed MDC models
pub const MDC_MAGIC: [u8; 4] = *b"IDPC";
pub const MDC_VERSION: i32 = 2;

/// Vertex and tag positions are stored as 10.6 fixed point.
pub const MD3_XYZ_SCALE: f32 = 1.0 / 64.0;

/// Degrees per unit of a compressed MDC tag angle.
pub const MDC_TAG_ANGLE_SCALE: f32 = 360.0 / 32700.0;

/// Units per step of a compressed MDC vertex delta.
pub const MDC_DIST_SCALE: f32 = 0.05;

/// Bias of each 8-bit compressed MDC delta.
pub const MDC_MAX_OFS: i32 = 127;

/// Rigid model flavour, selected by the file magic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelFormat {
    /// Full precision vertex frames
    Md3,
    /// Base frames plus 8-bit delta frames, compressed tags
    Mdc,
}

impl ModelFormat {
    pub fn from_magic(magic: [u8; 4]) -> Result<Self> {
        match magic {
            MD3_MAGIC => Ok(Self::Md3),
            MDC_MAGIC => Ok(Self::Mdc),
            _ => {
                let actual = String::from_utf8_lossy(&magic).into_owned();
                log::error!("Unknown rigid model magic {actual:?}, expected IDP3 or IDPC");
                Err(Md3Error::InvalidMagic {
                    expected: "IDP3 or IDPC".to_string(),
                    actual,
                })
            }
        }
    }

    pub const fn magic(self) -> [u8; 4] {
        match self {
            Self::Md3 => MD3_MAGIC,
            Self::Mdc => MDC_MAGIC,
        }
    }

    pub const fn version(self) -> i32 {
        match self {
            Self::Md3 => MD3_VERSION,
            Self::Mdc => MDC_VERSION,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Md3 => "MD3",
            Self::Mdc => "MDC",
        }
    }
}

/// MD3 file header as stored on disk.
#[derive(Debug, Clone, PartialEq, Record)]
pub struct Md3Header {
    pub ident: [u8; 4],
    pub version: i32,
    pub name: QPath,
    pub flags: i32,
    pub num_frames: i32,
    pub num_tags: i32,
    pub num_surfaces: i32,
    pub num_skins: i32,
    pub ofs_frames: i32,
    pub ofs_tags: i32,
    pub ofs_surfaces: i32,
    pub ofs_end: i32,
}

/// MDC file header as stored on disk. Identical to [`Md3Header`] apart from
/// the extra tag name table.
#[derive(Debug, Clone, PartialEq, Record)]
pub struct MdcHeader {
    pub ident: [u8; 4],
    pub version: i32,
    pub name: QPath,
    pub flags: i32,
    pub num_frames: i32,
    pub num_tags: i32,
    pub num_surfaces: i32,
    pub num_skins: i32,
    pub ofs_frames: i32,
    pub ofs_tag_names: i32,
    pub ofs_tags: i32,
    pub ofs_surfaces: i32,
    pub ofs_end: i32,
}

/// Validated header of either rigid format, with counts and offsets checked
/// for sign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RigidHeader {
    pub format: ModelFormat,
    pub name: String,
    pub flags: i32,
    pub num_frames: usize,
    pub num_tags: usize,
    pub num_surfaces: usize,
    pub num_skins: usize,
    pub ofs_frames: usize,
    /// MDC only
    pub ofs_tag_names: Option<usize>,
    pub ofs_tags: usize,
    pub ofs_surfaces: usize,
    pub ofs_end: usize,
}

impl RigidHeader {
    /// Parses and validates the header at the start of `data`.
    ///
    /// Magic and version are checked before any other field is read.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut reader = RecordReader::new(data);

        let format = ModelFormat::from_magic(reader.read()?)?;
        let version = reader.read_i32()?;
        if version != format.version() {
            log::error!(
                "{} version mismatch: expected {}, got {}",
                format.name(),
                format.version(),
                version
            );
            return Err(Md3Error::UnsupportedVersion {
                expected: format.version(),
                actual: version,
            });
        }

        reader.seek(0)?;
        let header = match format {
            ModelFormat::Md3 => Self::from_md3(&reader.read()?)?,
            ModelFormat::Mdc => Self::from_mdc(&reader.read()?)?,
        };

        if header.num_frames < 1 {
            log::error!("Model {:?} has no frames", header.name);
            return Err(Md3Error::NoFrames);
        }

        if header.ofs_end > data.len() {
            log::warn!(
                "Header end offset {} is past the {} byte buffer",
                header.ofs_end,
                data.len()
            );
        }

        log::debug!(
            "{} header {:?}: {} frames, {} tags, {} surfaces",
            format.name(),
            header.name,
            header.num_frames,
            header.num_tags,
            header.num_surfaces
        );

        Ok(header)
    }

    fn from_md3(raw: &Md3Header) -> Result<Self> {
        Ok(Self {
            format: ModelFormat::Md3,
            name: raw.name.to_string_lossy(),
            flags: raw.flags,
            num_frames: count(raw.num_frames, "num_frames")?,
            num_tags: count(raw.num_tags, "num_tags")?,
            num_surfaces: count(raw.num_surfaces, "num_surfaces")?,
            num_skins: count(raw.num_skins, "num_skins")?,
            ofs_frames: count(raw.ofs_frames, "ofs_frames")?,
            ofs_tag_names: None,
            ofs_tags: count(raw.ofs_tags, "ofs_tags")?,
            ofs_surfaces: count(raw.ofs_surfaces, "ofs_surfaces")?,
            ofs_end: count(raw.ofs_end, "ofs_end")?,
        })
    }

    fn from_mdc(raw: &MdcHeader) -> Result<Self> {
        Ok(Self {
            format: ModelFormat::Mdc,
            name: raw.name.to_string_lossy(),
            flags: raw.flags,
            num_frames: count(raw.num_frames, "num_frames")?,
            num_tags: count(raw.num_tags, "num_tags")?,
            num_surfaces: count(raw.num_surfaces, "num_surfaces")?,
            num_skins: count(raw.num_skins, "num_skins")?,
            ofs_frames: count(raw.ofs_frames, "ofs_frames")?,
            ofs_tag_names: Some(count(raw.ofs_tag_names, "ofs_tag_names")?),
            ofs_tags: count(raw.ofs_tags, "ofs_tags")?,
            ofs_surfaces: count(raw.ofs_surfaces, "ofs_surfaces")?,
            ofs_end: count(raw.ofs_end, "ofs_end")?,
        })
    }
}

use std::fmt;

use glam::{Vec2, Vec3};

use crate::error::Result;
use crate::reader::RecordReader;
use crate::writer::RecordWriter;

/// A fixed-size record stored little-endian in a model file.
///
/// Structs made of other records can derive this with
/// `#[derive(wolf_data::Record)]`.
pub trait Record: Sized {
    /// Size of the record on disk, in bytes.
    const SIZE: usize;

    fn read_record(reader: &mut RecordReader<'_>) -> Result<Self>;

    fn write_record(&self, writer: &mut RecordWriter);
}

macro_rules! scalar_record {
    ($($ty:ty => $read:ident, $write:ident;)*) => {
        $(
            impl Record for $ty {
                const SIZE: usize = size_of::<$ty>();

                fn read_record(reader: &mut RecordReader<'_>) -> Result<Self> {
                    reader.$read()
                }

                fn write_record(&self, writer: &mut RecordWriter) {
                    writer.$write(*self);
                }
            }
        )*
    };
}

scalar_record! {
    u8 => read_u8, write_u8;
    i16 => read_i16, write_i16;
    u16 => read_u16, write_u16;
    i32 => read_i32, write_i32;
    u32 => read_u32, write_u32;
    f32 => read_f32, write_f32;
}

impl Record for Vec2 {
    const SIZE: usize = 8;

    fn read_record(reader: &mut RecordReader<'_>) -> Result<Self> {
        reader.read_vec2()
    }

    fn write_record(&self, writer: &mut RecordWriter) {
        writer.write_vec2(*self);
    }
}

impl Record for Vec3 {
    const SIZE: usize = 12;

    fn read_record(reader: &mut RecordReader<'_>) -> Result<Self> {
        reader.read_vec3()
    }

    fn write_record(&self, writer: &mut RecordWriter) {
        writer.write_vec3(*self);
    }
}

impl<T: Record + Copy + Default, const N: usize> Record for [T; N] {
    const SIZE: usize = T::SIZE * N;

    fn read_record(reader: &mut RecordReader<'_>) -> Result<Self> {
        let mut out = [T::default(); N];
        for slot in &mut out {
            *slot = reader.read()?;
        }
        Ok(out)
    }

    fn write_record(&self, writer: &mut RecordWriter) {
        for value in self {
            value.write_record(writer);
        }
    }
}

/// A NUL-padded fixed-length name as stored in id Tech headers.
///
/// The stored bytes may use the full width without a terminator; the name
/// ends at the first NUL or at `N`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CName<const N: usize>([u8; N]);

/// The 64 byte path/name field used throughout the MD3, MDC and MDS formats.
pub type QPath = CName<64>;

impl<const N: usize> CName<N> {
    /// Stores `name`, truncated so that at least one NUL remains.
    pub fn new(name: &str) -> Self {
        let mut bytes = [0u8; N];
        let len = name.len().min(N.saturating_sub(1));
        bytes[..len].copy_from_slice(&name.as_bytes()[..len]);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        let end = memchr::memchr(0, &self.0).unwrap_or(N);
        &self.0[..end]
    }

    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(self.as_bytes()).into_owned()
    }

    /// Exact, case-sensitive comparison.
    pub fn matches(&self, name: &str) -> bool {
        self.as_bytes() == name.as_bytes()
    }

    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }
}

impl<const N: usize> Default for CName<N> {
    fn default() -> Self {
        Self([0; N])
    }
}

impl<const N: usize> fmt::Debug for CName<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.to_string_lossy())
    }
}

impl<const N: usize> fmt::Display for CName<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_lossy())
    }
}

impl<const N: usize> Record for CName<N> {
    const SIZE: usize = N;

    fn read_record(reader: &mut RecordReader<'_>) -> Result<Self> {
        let mut bytes = [0u8; N];
        bytes.copy_from_slice(reader.read_bytes(N)?);
        Ok(Self(bytes))
    }

    fn write_record(&self, writer: &mut RecordWriter) {
        writer.write_bytes(&self.0);
    }
}

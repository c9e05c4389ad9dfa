use byteorder::{ByteOrder, LittleEndian};
use glam::{Vec2, Vec3};

use crate::error::{DataError, Result};
use crate::record::Record;

/// A read-only little-endian cursor over a model file held in memory.
///
/// Model files address their tables through byte offsets stored in headers,
/// so the cursor can be positioned anywhere in the buffer. Every read checks
/// the remaining length first and reports [`DataError::UnexpectedEof`]
/// instead of reading past the end.
#[derive(Debug, Clone)]
pub struct RecordReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> RecordReader<'a> {
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Creates a cursor positioned at `offset`.
    pub fn at(data: &'a [u8], offset: usize) -> Result<Self> {
        let mut reader = Self::new(data);
        reader.seek(offset)?;
        Ok(reader)
    }

    /// Creates a cursor at `base + offset`, where `offset` is a signed offset
    /// field read from the file.
    pub fn at_relative(data: &'a [u8], base: usize, offset: i32, field: &'static str) -> Result<Self> {
        Self::at(data, relative_offset(base, offset, field)?)
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub const fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    pub fn seek(&mut self, offset: usize) -> Result<()> {
        if offset > self.data.len() {
            return Err(DataError::OffsetOutOfBounds {
                offset,
                len: self.data.len(),
            });
        }
        self.pos = offset;
        Ok(())
    }

    pub fn skip(&mut self, count: usize) -> Result<()> {
        self.read_bytes(count).map(|_| ())
    }

    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(count)
            .filter(|&end| end <= self.data.len())
            .ok_or(DataError::UnexpectedEof {
                offset: self.pos,
                needed: count,
                available: self.remaining(),
            })?;

        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(LittleEndian::read_i16(self.read_bytes(2)?))
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(LittleEndian::read_u16(self.read_bytes(2)?))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(LittleEndian::read_i32(self.read_bytes(4)?))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(LittleEndian::read_u32(self.read_bytes(4)?))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(LittleEndian::read_f32(self.read_bytes(4)?))
    }

    pub fn read_vec2(&mut self) -> Result<Vec2> {
        Ok(Vec2::new(self.read_f32()?, self.read_f32()?))
    }

    pub fn read_vec3(&mut self) -> Result<Vec3> {
        Ok(Vec3::new(self.read_f32()?, self.read_f32()?, self.read_f32()?))
    }

    /// Reads a signed 32-bit count field and rejects negative values.
    pub fn read_count(&mut self, field: &'static str) -> Result<usize> {
        let value = self.read_i32()?;
        count(value, field)
    }

    pub fn read<T: Record>(&mut self) -> Result<T> {
        T::read_record(self)
    }

    /// Reads `count` consecutive records.
    ///
    /// The whole table is checked against the remaining length before
    /// anything is allocated, so a corrupt count cannot trigger a huge
    /// allocation.
    pub fn read_array<T: Record>(&mut self, count: usize) -> Result<Vec<T>> {
        let needed = count.checked_mul(T::SIZE).ok_or(DataError::InvalidField {
            field: "record count",
            value: i64::try_from(count).unwrap_or(i64::MAX),
        })?;
        if needed > self.remaining() {
            return Err(DataError::UnexpectedEof {
                offset: self.pos,
                needed,
                available: self.remaining(),
            });
        }

        (0..count).map(|_| self.read()).collect()
    }
}

/// Converts a signed count field into a `usize`.
pub fn count(value: i32, field: &'static str) -> Result<usize> {
    usize::try_from(value).map_err(|_| DataError::InvalidField {
        field,
        value: i64::from(value),
    })
}

/// Resolves a signed offset field relative to `base`.
pub fn relative_offset(base: usize, offset: i32, field: &'static str) -> Result<usize> {
    let offset = count(offset, field)?;
    base.checked_add(offset).ok_or(DataError::InvalidField {
        field,
        value: offset as i64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_little_endian_scalars() {
        let mut data = Vec::new();
        data.extend_from_slice(&(-2i16).to_le_bytes());
        data.extend_from_slice(&0x1234_5678u32.to_le_bytes());
        data.extend_from_slice(&1.5f32.to_le_bytes());

        let mut reader = RecordReader::new(&data);
        assert_eq!(reader.read_i16().unwrap(), -2);
        assert_eq!(reader.read_u32().unwrap(), 0x1234_5678);
        assert_eq!(reader.read_f32().unwrap(), 1.5);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_read_past_end_is_an_error() {
        let data = [1u8, 2, 3];
        let mut reader = RecordReader::new(&data);

        match reader.read_i32() {
            Err(DataError::UnexpectedEof {
                offset,
                needed,
                available,
            }) => {
                assert_eq!(offset, 0);
                assert_eq!(needed, 4);
                assert_eq!(available, 3);
            }
            other => panic!("expected UnexpectedEof, got {other:?}"),
        }
        // A failed read does not move the cursor.
        assert_eq!(reader.position(), 0);
    }

    #[test]
    fn test_seek_outside_buffer() {
        let data = [0u8; 8];
        assert!(RecordReader::at(&data, 8).is_ok());
        assert!(matches!(
            RecordReader::at(&data, 9),
            Err(DataError::OffsetOutOfBounds { offset: 9, len: 8 })
        ));
    }

    #[test]
    fn test_negative_count_rejected() {
        let data = (-1i32).to_le_bytes();
        let mut reader = RecordReader::new(&data);
        assert!(matches!(
            reader.read_count("num_frames"),
            Err(DataError::InvalidField {
                field: "num_frames",
                value: -1
            })
        ));
    }

    #[test]
    fn test_huge_array_rejected_before_allocation() {
        let data = [0u8; 16];
        let mut reader = RecordReader::new(&data);
        assert!(reader.read_array::<u32>(usize::MAX / 2).is_err());
        assert_eq!(reader.read_array::<u32>(4).unwrap(), vec![0; 4]);
    }

    #[test]
    fn test_relative_offset() {
        assert_eq!(relative_offset(100, 24, "ofs_st").unwrap(), 124);
        assert!(relative_offset(100, -4, "ofs_st").is_err());
    }
}

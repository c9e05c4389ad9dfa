use byteorder::{ByteOrder, LittleEndian};
use glam::{Vec2, Vec3};

use crate::error::{DataError, Result};
use crate::record::Record;

/// Growable little-endian output buffer, the write side of [`RecordReader`].
///
/// Model files reference their tables by offset, so writers usually emit a
/// placeholder, remember its position and fill it in with [`patch_i32`]
/// once the table has been laid out.
///
/// [`RecordReader`]: crate::RecordReader
/// [`patch_i32`]: RecordWriter::patch_i32
#[derive(Debug, Clone, Default)]
pub struct RecordWriter {
    buf: Vec<u8>,
}

impl RecordWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn position(&self) -> usize {
        self.buf.len()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn write_i16(&mut self, value: i16) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_u16(&mut self, value: u16) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_i32(&mut self, value: i32) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_u32(&mut self, value: u32) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_f32(&mut self, value: f32) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_vec2(&mut self, value: Vec2) {
        self.write_f32(value.x);
        self.write_f32(value.y);
    }

    pub fn write_vec3(&mut self, value: Vec3) {
        self.write_f32(value.x);
        self.write_f32(value.y);
        self.write_f32(value.z);
    }

    pub fn write<T: Record>(&mut self, value: &T) {
        value.write_record(self);
    }

    /// Overwrites four bytes at `at` with `value`.
    pub fn patch_i32(&mut self, at: usize, value: i32) -> Result<()> {
        let len = self.buf.len();
        let slot = at
            .checked_add(4)
            .filter(|&end| end <= len)
            .map(|end| &mut self.buf[at..end])
            .ok_or(DataError::OffsetOutOfBounds { offset: at, len })?;
        LittleEndian::write_i32(slot, value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RecordReader;

    #[test]
    fn test_patch_placeholder() {
        let mut writer = RecordWriter::new();
        writer.write_i32(0);
        writer.write_u16(7);
        writer.patch_i32(0, writer.position() as i32).unwrap();

        let bytes = writer.into_inner();
        let mut reader = RecordReader::new(&bytes);
        assert_eq!(reader.read_i32().unwrap(), 6);
        assert_eq!(reader.read_u16().unwrap(), 7);
    }

    #[test]
    fn test_patch_out_of_bounds() {
        let mut writer = RecordWriter::new();
        writer.write_u16(1);
        assert!(writer.patch_i32(0, 5).is_err());
    }
}

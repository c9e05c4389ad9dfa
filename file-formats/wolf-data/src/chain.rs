use crate::error::{DataError, Result};
use crate::reader::RecordReader;

/// Iterates over a run of variable-length records that each store their own
/// total length.
///
/// Surfaces in MD3, MDC and MDS files are laid out this way: the record at
/// `start` carries an `ofs_end` field at a fixed position inside it, and the
/// next record begins at `start + ofs_end`. The iterator yields the start
/// offset of each record and stops after the first error.
#[derive(Debug, Clone)]
pub struct RecordChain<'a> {
    data: &'a [u8],
    next: usize,
    remaining: usize,
    end_field: usize,
    failed: bool,
}

impl<'a> RecordChain<'a> {
    /// `end_field` is the byte position of the `ofs_end` field relative to
    /// the start of each record.
    pub fn new(data: &'a [u8], first: usize, count: usize, end_field: usize) -> Self {
        Self {
            data,
            next: first,
            remaining: count,
            end_field,
            failed: false,
        }
    }

    /// Offset just past the last record visited so far.
    ///
    /// Once the iterator is exhausted this is where the chain ends, which
    /// for a well-formed file matches the end offset declared in the header.
    pub fn end(&self) -> usize {
        self.next
    }

    fn advance(&self, start: usize) -> Result<usize> {
        let field = start
            .checked_add(self.end_field)
            .ok_or(DataError::OffsetOutOfBounds {
                offset: start,
                len: self.data.len(),
            })?;
        let length = RecordReader::at(self.data, field)?.read_i32()?;
        if length <= 0 {
            return Err(DataError::InvalidField {
                field: "ofs_end",
                value: i64::from(length),
            });
        }

        let next = start + length as usize;
        if next > self.data.len() {
            return Err(DataError::OffsetOutOfBounds {
                offset: next,
                len: self.data.len(),
            });
        }
        Ok(next)
    }
}

impl Iterator for RecordChain<'_> {
    type Item = Result<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 || self.failed {
            return None;
        }

        let start = self.next;
        match self.advance(start) {
            Ok(next) => {
                self.next = next;
                self.remaining -= 1;
                Some(Ok(start))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

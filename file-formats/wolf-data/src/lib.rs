//! Shared building blocks for the wolfmv model crates.
//!
//! - [`RecordReader`] / [`RecordWriter`]: bounds-checked little-endian access
//!   to offset-addressed model files held in memory
//! - [`Record`]: fixed-size on-disk records, derivable with
//!   `#[derive(Record)]`
//! - [`RecordChain`]: walks variable-length records that store their own size
//! - [`math`]: id Tech angle conventions and [`Transform`]
//! - [`geometry`]: the packed [`Vertex`] and [`DrawCall`] handed to renderers
//!
//! ```
//! use wolf_data::{QPath, Record, RecordReader, RecordWriter};
//!
//! #[derive(Record)]
//! struct Tag {
//!     name: QPath,
//!     bone_index: i32,
//! }
//!
//! let mut writer = RecordWriter::new();
//! writer.write(&Tag { name: QPath::new("tag_head"), bone_index: 3 });
//! let bytes = writer.into_inner();
//! assert_eq!(bytes.len(), Tag::SIZE);
//!
//! let tag: Tag = RecordReader::new(&bytes).read().unwrap();
//! assert!(tag.name.matches("tag_head"));
//! assert_eq!(tag.bone_index, 3);
//! ```

pub mod chain;
pub mod error;
pub mod geometry;
pub mod math;
pub mod reader;
pub mod record;
pub mod writer;

pub use chain::RecordChain;
pub use error::{DataError, Result};
pub use geometry::{DrawCall, SurfaceSource, Vertex};
pub use math::Transform;
pub use reader::RecordReader;
pub use record::{CName, QPath, Record};
pub use wolf_data_derive::Record;
pub use writer::RecordWriter;

pub mod prelude {
    pub use crate::geometry::{DrawCall, SurfaceSource, Vertex};
    pub use crate::math::Transform;
    pub use crate::{CName, QPath, Record, RecordChain, RecordReader, RecordWriter};
}

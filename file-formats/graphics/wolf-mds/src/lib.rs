//! Parser and skeleton evaluator for MDS skeletal models.
//!
//! An MDS file holds a bone hierarchy, one compressed pose per bone per
//! frame, tags bound to bones, and surfaces whose vertices are weighted to
//! several bones. Loading decodes and validates all of it; posing is done
//! per query:
//!
//! - [`Skeleton::evaluate`] poses a list of bones for a [`FrameInfo`]
//! - [`SkeletalModel::render`] skins every surface into caller-owned
//!   draw calls
//! - [`SkeletalModel::lerp_tag`] resolves a named attachment point
//!
//! ```no_run
//! use wolf_data::SurfaceSource;
//! use wolf_mds::{FrameInfo, SkeletalModel};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let model = SkeletalModel::load_path("models/players/body.mds")?;
//! let pose = FrameInfo::blend(12, 11, 0.4);
//!
//! let mut draw_calls = model.allocate_draw_calls();
//! model.render(&pose, &mut draw_calls)?;
//!
//! if let Some((_, head)) = model.lerp_tag("tag_head", &pose, 0)? {
//!     println!("head at {:?}", head.position);
//! }
//! # Ok(())
//! # }
//! ```

pub mod attachment;
pub mod bone;
pub mod builder;
pub mod error;
pub mod frame;
pub mod header;
pub mod model;
pub mod skeleton;
pub mod skinning;
pub mod surface;
pub mod tag;

pub use attachment::TagsNamed;
pub use bone::{BoneFlags, BoneInfo, CompressedBone};
pub use error::{MdsError, Result};
pub use frame::Frame;
pub use header::{MDS_MAX_BONES, SkeletalHeader};
pub use model::SkeletalModel;
pub use skeleton::{FrameInfo, Skeleton};
pub use surface::{BoneWeight, Surface, WeightedVertex};
pub use tag::Tag;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

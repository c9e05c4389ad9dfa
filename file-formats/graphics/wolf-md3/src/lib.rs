//! Parser for MD3 and MDC rigid models.
//!
//! MD3 stores every animation frame at full precision; MDC stores a few base
//! frames and encodes the rest as 8-bit deltas from them. Both carry named
//! tags (attachment points) per frame and a chain of surfaces.
//!
//! ```no_run
//! use wolf_data::SurfaceSource;
//! use wolf_md3::RigidModel;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let model = RigidModel::load_path("models/players/head.mdc")?;
//!
//! let mut draw_calls = model.allocate_draw_calls();
//! model.render(0, &mut draw_calls)?;
//!
//! if let Some((slot, transform)) = model.tag("tag_mouth", 0, 0)? {
//!     println!("tag {slot} at {:?}", transform.position);
//! }
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod error;
pub mod frame;
pub mod header;
pub mod model;
pub mod normal;
pub mod surface;
pub mod tag;

pub use error::{Md3Error, Result};
pub use frame::Frame;
pub use header::{ModelFormat, RigidHeader};
pub use model::RigidModel;
pub use surface::{Shader, Surface, XyzNormal};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Character assembly for Wolfenstein player models.
//!
//! ```no_run
//! use wolf_character::{AnimationTable, Character};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let anims = AnimationTable::load("animations/human_base.wolfanim")?;
//! let mut character = Character::load("models/players/temperate/axis/soldier", "body")?;
//! character.set_animation(anims.get("LEGS_RUN")?);
//!
//! for _ in 0..60 {
//!     character.update(1.0 / 60.0);
//!     let pose = character.pose()?;
//!     println!("{:?}", pose.head_transform.w_axis);
//! }
//! # Ok(())
//! # }
//! ```

pub mod animation;
pub mod character;
pub mod error;
pub mod path;
pub mod skin;
pub mod task_queue;
pub mod texture;

pub use animation::{AnimationClock, AnimationEntry, AnimationTable};
pub use character::{Character, CharacterPose};
pub use error::{CharacterError, Result};
pub use path::resolve_path;
pub use skin::SkinFile;
pub use task_queue::{TaskQueue, TaskSender};
pub use texture::TextureTable;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

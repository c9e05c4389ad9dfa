//! Command implementations for each file type

pub mod anim;
pub mod character;
pub mod md3;
pub mod mds;
pub mod skin;

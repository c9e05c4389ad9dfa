use glam::Vec3;
use wolf_data::{CName, Record};

/// Per-frame bounding volume, shared by MD3 and MDC.
#[derive(Debug, Clone, PartialEq, Record)]
pub struct Frame {
    pub bounds: [Vec3; 2],
    pub local_origin: Vec3,
    pub radius: f32,
    pub name: CName<16>,
}

impl Frame {
    pub fn mins(&self) -> Vec3 {
        self.bounds[0]
    }

    pub fn maxs(&self) -> Vec3 {
        self.bounds[1]
    }
}

use glam::{Mat3, Vec3};
use wolf_data::math::angles_to_axis;
use wolf_data::{QPath, Record, Transform};

use crate::header::{MD3_XYZ_SCALE, MDC_TAG_ANGLE_SCALE};

/// Uncompressed tag: every frame repeats the name next to the transform.
#[derive(Debug, Clone, PartialEq, Record)]
pub struct Md3Tag {
    pub name: QPath,
    pub origin: Vec3,
    pub axis: [Vec3; 3],
}

impl Md3Tag {
    pub fn transform(&self) -> Transform {
        Transform::new(
            self.origin,
            Mat3::from_cols(self.axis[0], self.axis[1], self.axis[2]),
        )
    }
}

/// Compressed tag: fixed point origin and three quantised angles. Names are
/// stored once in a separate table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Record)]
pub struct MdcTag {
    pub xyz: [i16; 3],
    pub angles: [i16; 3],
}

impl MdcTag {
    pub fn transform(&self) -> Transform {
        let position = Vec3::new(
            f32::from(self.xyz[0]),
            f32::from(self.xyz[1]),
            f32::from(self.xyz[2]),
        ) * MD3_XYZ_SCALE;
        let angles = Vec3::new(
            f32::from(self.angles[0]),
            f32::from(self.angles[1]),
            f32::from(self.angles[2]),
        ) * MDC_TAG_ANGLE_SCALE;

        Transform::new(position, angles_to_axis(angles))
    }
}

/// Blends two tag transforms the way attachment points are interpolated
/// between frames: origin and each axis are lerped, then the axes are
/// renormalised.
pub fn lerp_tag_transform(from: &Transform, to: &Transform, lerp: f32) -> Transform {
    let back = 1.0 - lerp;
    let axis = |i: usize| {
        (from.rotation.col(i) * back + to.rotation.col(i) * lerp).normalize_or_zero()
    };

    Transform::new(
        from.position * back + to.position * lerp,
        Mat3::from_cols(axis(0), axis(1), axis(2)),
    )
}

//! Angle conventions shared by the id Tech model formats.
//!
//! Angles are in degrees and ordered pitch, yaw, roll. Rotations are stored
//! as a [`Mat3`] whose columns are the forward, left and up axes, so
//! `rotation * v` combines the axes with the components of `v`.

use glam::{Mat3, Mat4, Vec3};

pub const PITCH: usize = 0;
pub const YAW: usize = 1;
pub const ROLL: usize = 2;

/// Degrees per unit of a 16-bit compressed angle.
pub const SHORT_TO_ANGLE: f32 = 360.0 / 65536.0;

pub fn short_to_angle(value: i16) -> f32 {
    f32::from(value) * SHORT_TO_ANGLE
}

/// Wraps an angle into `[0, 360)` using the 16-bit quantised form.
pub fn angle_normalize_360(angle: f32) -> f32 {
    SHORT_TO_ANGLE * (((angle * (65536.0 / 360.0)) as i32 & 65535) as f32)
}

/// Wraps an angle into `(-180, 180]`.
pub fn angle_normalize_180(angle: f32) -> f32 {
    let angle = angle_normalize_360(angle);
    if angle > 180.0 { angle - 360.0 } else { angle }
}

/// Returns the forward, right and up vectors for `angles`.
pub fn angle_vectors(angles: Vec3) -> (Vec3, Vec3, Vec3) {
    let (sy, cy) = angles[YAW].to_radians().sin_cos();
    let (sp, cp) = angles[PITCH].to_radians().sin_cos();
    let (sr, cr) = angles[ROLL].to_radians().sin_cos();

    let forward = Vec3::new(cp * cy, cp * sy, -sp);
    let right = Vec3::new(
        -sr * sp * cy + cr * sy,
        -sr * sp * sy - cr * cy,
        -sr * cp,
    );
    let up = Vec3::new(cr * sp * cy + sr * sy, cr * sp * sy - sr * cy, cr * cp);

    (forward, right, up)
}

/// Forward vector for a pitch/yaw pair with no roll.
pub fn forward_vector(pitch: f32, yaw: f32) -> Vec3 {
    angle_vectors(Vec3::new(pitch, yaw, 0.0)).0
}

pub fn angles_to_axis(angles: Vec3) -> Mat3 {
    let (forward, right, up) = angle_vectors(angles);
    Mat3::from_cols(forward, -right, up)
}

/// A position and orientation, used for tags and evaluated bones.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Mat3,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Mat3::IDENTITY,
    };

    pub const fn new(position: Vec3, rotation: Mat3) -> Self {
        Self { position, rotation }
    }

    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.position + self.rotation * point
    }

    /// Model matrix placing an attached model at this transform.
    pub fn to_mat4(&self) -> Mat4 {
        let mut matrix = Mat4::from_mat3(self.rotation);
        matrix.w_axis = self.position.extend(1.0);
        matrix
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    const EPSILON: f32 = 1e-4;

    #[test_case(370.0, 10.0 ; "above full turn")]
    #[test_case(-10.0, 350.0 ; "negative")]
    #[test_case(180.0, 180.0 ; "half turn")]
    #[test_case(0.0, 0.0 ; "zero")]
    fn test_normalize_360(input: f32, expected: f32) {
        assert!((angle_normalize_360(input) - expected).abs() < 0.01);
    }

    #[test_case(190.0, -170.0 ; "past half turn")]
    #[test_case(-340.0, 20.0 ; "large negative")]
    #[test_case(180.0, 180.0 ; "half turn stays positive")]
    fn test_normalize_180(input: f32, expected: f32) {
        assert!((angle_normalize_180(input) - expected).abs() < 0.01);
    }

    #[test]
    fn test_short_to_angle() {
        assert_eq!(short_to_angle(16384), 90.0);
        assert_eq!(short_to_angle(-16384), -90.0);
    }

    #[test]
    fn test_zero_angles_give_identity_axis() {
        let axis = angles_to_axis(Vec3::ZERO);
        assert!(axis.abs_diff_eq(Mat3::IDENTITY, EPSILON));
    }

    #[test]
    fn test_yaw_rotates_about_z() {
        let axis = angles_to_axis(Vec3::new(0.0, 90.0, 0.0));
        assert!((axis * Vec3::X).abs_diff_eq(Vec3::Y, EPSILON));
        assert!((axis * Vec3::Y).abs_diff_eq(-Vec3::X, EPSILON));
        assert!((axis * Vec3::Z).abs_diff_eq(Vec3::Z, EPSILON));
    }

    #[test]
    fn test_pitch_points_forward_down() {
        let forward = forward_vector(90.0, 0.0);
        assert!(forward.abs_diff_eq(Vec3::new(0.0, 0.0, -1.0), EPSILON));
    }

    #[test]
    fn test_transform_to_mat4() {
        let transform = Transform::new(
            Vec3::new(1.0, 2.0, 3.0),
            angles_to_axis(Vec3::new(0.0, 90.0, 0.0)),
        );
        let matrix = transform.to_mat4();
        let point = matrix.transform_point3(Vec3::X);
        assert!(point.abs_diff_eq(transform.transform_point(Vec3::X), EPSILON));
        assert!(point.abs_diff_eq(Vec3::new(1.0, 3.0, 3.0), EPSILON));
    }
}

//! Packed latitude/longitude normals used by the MD3 and MDC vertex tables.
//!
//! The high byte is the latitude (rotation about Z), the low byte the
//! longitude (angle from +Z), both in 256ths of a full turn, the spacing of
//! the renderer's lat/long lookup tables.

use std::f32::consts::TAU;

use glam::Vec3;

const STEP: f32 = TAU / 256.0;

pub fn decode_normal(packed: i16) -> Vec3 {
    let packed = packed as u16;
    let lat = f32::from((packed >> 8) & 0xff) * STEP;
    let lng = f32::from(packed & 0xff) * STEP;

    let (sin_lat, cos_lat) = lat.sin_cos();
    let (sin_lng, cos_lng) = lng.sin_cos();
    Vec3::new(cos_lat * sin_lng, sin_lat * sin_lng, cos_lng)
}

pub fn encode_normal(normal: Vec3) -> i16 {
    if normal.x == 0.0 && normal.y == 0.0 {
        return if normal.z > 0.0 { 0 } else { 128 };
    }

    let lat = (normal.y.atan2(normal.x) / STEP) as i32 & 0xff;
    let lng = (normal.z.clamp(-1.0, 1.0).acos() / STEP) as i32 & 0xff;
    ((lat << 8) | lng) as u16 as i16
}

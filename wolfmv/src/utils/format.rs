//! Formatting utilities

use glam::{Mat3, Vec3};
use humansize::{DECIMAL, format_size};

/// Format file size in human-readable format
pub fn format_bytes(bytes: u64) -> String {
    format_size(bytes, DECIMAL)
}

/// Format a vector with two decimals per component
pub fn format_vec3(v: Vec3) -> String {
    format!("({:.2}, {:.2}, {:.2})", v.x, v.y, v.z)
}

/// Format the axes of a rotation, one bracketed column each
pub fn format_axes(m: Mat3) -> String {
    format!(
        "[{} {} {}]",
        format_vec3(m.x_axis),
        format_vec3(m.y_axis),
        format_vec3(m.z_axis)
    )
}

/// Format a blend weight as a percentage
pub fn format_percentage(value: f32) -> String {
    format!("{:.1}%", value * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(1024), "1.02 kB");
        assert_eq!(format_bytes(1048576), "1.05 MB");
    }

    #[test]
    fn test_format_vec3() {
        assert_eq!(format_vec3(Vec3::new(1.0, -2.5, 0.125)), "(1.00, -2.50, 0.13)");
    }

    #[test]
    fn test_format_percentage() {
        assert_eq!(format_percentage(0.25), "25.0%");
        assert_eq!(format_percentage(1.0), "100.0%");
    }
}

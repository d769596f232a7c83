//! Formatting utilities

use glam::{Mat4, Vec3};

/// Format a time in seconds
pub fn format_seconds(seconds: f32) -> String {
    format!("{seconds:.3}s")
}

/// Format a percentage
pub fn format_percentage(value: f64) -> String {
    format!("{value:.1}%")
}

/// Share of `part` in `total`, "N/A" when `total` is zero
pub fn format_ratio(part: usize, total: usize) -> String {
    if total == 0 {
        "N/A".to_string()
    } else {
        format_percentage(part as f64 / total as f64 * 100.0)
    }
}

pub fn format_vec3(v: Vec3) -> String {
    format!("({:.3}, {:.3}, {:.3})", v.x, v.y, v.z)
}

/// Matrix rows as text, in the usual row-by-row reading order
pub fn format_matrix_rows(matrix: &Mat4) -> [String; 4] {
    [0, 1, 2, 3].map(|i| {
        let row = matrix.row(i);
        format!(
            "[{:>9.4} {:>9.4} {:>9.4} {:>9.4}]",
            row.x, row.y, row.z, row.w
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_seconds() {
        assert_eq!(format_seconds(0.0), "0.000s");
        assert_eq!(format_seconds(1.25), "1.250s");
    }

    #[test]
    fn test_format_ratio() {
        assert_eq!(format_ratio(1, 4), "25.0%");
        assert_eq!(format_ratio(0, 0), "N/A");
    }

    #[test]
    fn test_format_matrix_rows() {
        let rows = format_matrix_rows(&Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0)));
        assert_eq!(rows[0], "[   1.0000    0.0000    0.0000    1.0000]");
        assert_eq!(rows[3], "[   0.0000    0.0000    0.0000    1.0000]");
    }

    #[test]
    fn test_format_vec3() {
        assert_eq!(format_vec3(Vec3::new(0.5, -1.0, 2.0)), "(0.500, -1.000, 2.000)");
    }
}

//! Periodic boundary helpers.

use crate::Vec3;

/// Apply minimum image convention for periodic boundaries.
pub fn minimum_image(mut dr: Vec3, box_size: Vec3) -> Vec3 {
    fn wrap(val: f64, size: f64) -> f64 {
        val - size * (val / size).round()
    }
    dr.x = wrap(dr.x, box_size.x);
    dr.y = wrap(dr.y, box_size.y);
    dr.z = wrap(dr.z, box_size.z);
    dr
}

/// Displacement `b - a`, minimum-imaged when a box is present.
#[inline]
pub fn displacement(a: Vec3, b: Vec3, box_size: Option<Vec3>) -> Vec3 {
    let dr = b - a;
    match box_size {
        Some(size) => minimum_image(dr, size),
        None => dr,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimum_image() {
        let box_size = Vec3::new(10.0, 10.0, 10.0);
        let dr = Vec3::new(6.0, 3.0, -7.0);

        let dr_min = minimum_image(dr, box_size);

        assert_eq!(dr_min, Vec3::new(-4.0, 3.0, 3.0));
    }

    #[test]
    fn test_minimum_image_several_boxes_away() {
        let box_size = Vec3::new(2.0, 2.0, 2.0);
        let dr = minimum_image(Vec3::new(7.5, -4.25, 0.5), box_size);
        assert!((dr.x + 0.5).abs() < 1e-12);
        assert!((dr.y + 0.25).abs() < 1e-12);
        assert!((dr.z - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_displacement_without_box() {
        let d = displacement(Vec3::new(1.0, 0.0, 0.0), Vec3::new(9.0, 0.0, 0.0), None);
        assert_eq!(d, Vec3::new(8.0, 0.0, 0.0));
        let d = displacement(
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(9.0, 0.0, 0.0),
            Some(Vec3::new(10.0, 10.0, 10.0)),
        );
        assert!((d.x + 2.0).abs() < 1e-12);
    }
}

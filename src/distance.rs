use nalgebra::Vector3;

use crate::error::{Error, Result};
use crate::segmentation::Plane;
use crate::vector::normalize;

/// Distance of every point to the infinite line through `line_point` with
/// direction `line_vector`.
pub fn distances_to_line(
    points: &[Vector3<f64>],
    line_point: &Vector3<f64>,
    line_vector: &Vector3<f64>,
) -> Result<Vec<f64>> {
    let v = normalize(line_vector)?;
    Ok(points
        .iter()
        .map(|p| {
            let u = p - line_point;
            (u - u.dot(&v) * v).norm()
        })
        .collect())
}

/// Unsigned distance of every point to the plane `ax + by + cz + d = 0`.
pub fn distances_to_plane(points: &[Vector3<f64>], plane: &Plane) -> Result<Vec<f64>> {
    let normal = plane.normal();
    let norm = normal.norm();
    if norm == 0.0 {
        return Err(Error::InvalidPlane);
    }
    Ok(points
        .iter()
        .map(|p| (normal.dot(p) + plane.d).abs() / norm)
        .collect())
}

/// Perpendicular distance of `point` to the line through `start` and `end`.
/// Returns 0 when the three points are collinear (including a degenerate
/// `start == end` span).
pub fn point_line_distance(
    point: &Vector3<f64>,
    start: &Vector3<f64>,
    end: &Vector3<f64>,
) -> f64 {
    let to_start = start - point;
    let to_end = end - point;
    if to_start.cross(&to_end).norm() < 1e-12 {
        return 0.0;
    }
    let u = point - start;
    let v = (end - start).normalize();
    (u - u.dot(&v) * v).norm()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_distances_to_line() {
        let points = vec![
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
            Vector3::new(0.0, 0.0, 1.0),
            Vector3::new(1.0, 1.0, 1.0),
        ];
        let distances = distances_to_line(
            &points,
            &Vector3::new(0.0, 0.0, 0.0),
            &Vector3::new(1.0, 1.0, 1.0),
        )
        .unwrap();
        let expected = 6.0f64.sqrt() / 3.0;
        assert_approx_eq!(distances[0], 0.0);
        assert_approx_eq!(distances[1], expected);
        assert_approx_eq!(distances[2], expected);
        assert_approx_eq!(distances[3], expected);
        assert_approx_eq!(distances[4], 0.0);
    }

    #[test]
    fn test_distances_to_plane() {
        let points = vec![
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
            Vector3::new(0.0, 0.0, 1.0),
        ];
        let plane = Plane {
            a: 0.0,
            b: 0.0,
            c: 1.0,
            d: 0.0,
        };
        let distances = distances_to_plane(&points, &plane).unwrap();
        assert_approx_eq!(distances[0], 0.0);
        assert_approx_eq!(distances[1], 0.0);
        assert_approx_eq!(distances[2], 0.0);
        assert_approx_eq!(distances[3], 1.0);
    }

    #[test]
    fn test_point_line_distance_collinear_is_zero() {
        let d = point_line_distance(
            &Vector3::new(2.0, 0.0, 0.0),
            &Vector3::new(0.0, 0.0, 0.0),
            &Vector3::new(5.0, 0.0, 0.0),
        );
        assert_approx_eq!(d, 0.0);
    }

    #[test]
    fn test_point_line_distance_perpendicular() {
        let d = point_line_distance(
            &Vector3::new(0.0, 3.0, 0.0),
            &Vector3::new(-1.0, 0.0, 0.0),
            &Vector3::new(1.0, 0.0, 0.0),
        );
        assert_approx_eq!(d, 3.0);
    }
}

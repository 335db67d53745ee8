use float_ord::FloatOrd;
use nalgebra::{Vector2, Vector3};

use crate::error::{Error, Result};
use crate::frame::{plane_origin_below, transform_to_plane_coordinates};
use crate::segmentation::Plane;

/// Extracts the boundary of a planar point set via its 2-D convex hull.
///
/// The points are re-projected into the plane frame (so any plane
/// orientation is supported) and the convex hull of the (X, Y) view is
/// computed. Returns the hull vertex indices in counter-clockwise boundary
/// order and the hull edges as index pairs forming a closed polygon.
///
/// Fails with [`Error::DegenerateGeometry`] when fewer than 3 non-collinear
/// points are given.
pub fn detect_plane_edge(
    points: &[Vector3<f64>],
    plane: &Plane,
) -> Result<(Vec<usize>, Vec<[usize; 2]>)> {
    if points.len() < 3 {
        return Err(Error::DegenerateGeometry);
    }
    let origin = plane_origin_below(points, plane);
    let (transformed, _) = transform_to_plane_coordinates(points, &origin, &plane.normal())?;
    let projected: Vec<Vector2<f64>> = transformed.iter().map(|p| p.xy()).collect();

    let hull = convex_hull_2d(&projected);
    if hull.len() < 3 {
        return Err(Error::DegenerateGeometry);
    }

    let edges = hull
        .iter()
        .enumerate()
        .map(|(i, &v)| [v, hull[(i + 1) % hull.len()]])
        .collect();
    Ok((hull, edges))
}

/// Convex hull of a 2-D point set via the monotone chain construction.
/// Returns the hull vertex indices in counter-clockwise order; collinear
/// boundary points are dropped. Fewer than 3 non-collinear input points
/// yield a degenerate hull with fewer than 3 vertices.
pub fn convex_hull_2d(points: &[Vector2<f64>]) -> Vec<usize> {
    if points.len() < 3 {
        return (0..points.len()).collect();
    }
    let mut order: Vec<usize> = (0..points.len()).collect();
    order.sort_by_key(|&i| (FloatOrd(points[i].x), FloatOrd(points[i].y)));

    let cross = |o: usize, a: usize, b: usize| -> f64 {
        let oa = points[a] - points[o];
        let ob = points[b] - points[o];
        oa.x * ob.y - oa.y * ob.x
    };

    let mut hull: Vec<usize> = Vec::with_capacity(points.len() + 1);
    // lower hull
    for &i in &order {
        while hull.len() >= 2 && cross(hull[hull.len() - 2], hull[hull.len() - 1], i) <= 0.0 {
            hull.pop();
        }
        hull.push(i);
    }
    // upper hull
    let lower_len = hull.len() + 1;
    for &i in order.iter().rev().skip(1) {
        while hull.len() >= lower_len && cross(hull[hull.len() - 2], hull[hull.len() - 1], i) <= 0.0
        {
            hull.pop();
        }
        hull.push(i);
    }
    hull.pop();
    hull
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;

    #[test]
    fn test_hull_of_square_with_interior_points() {
        let points = vec![
            Vector2::new(0.0, 0.0),
            Vector2::new(-1.0, -1.0),
            Vector2::new(1.0, -1.0),
            Vector2::new(1.0, 1.0),
            Vector2::new(-1.0, 1.0),
            Vector2::new(0.2, 0.3),
        ];
        let hull = convex_hull_2d(&points);
        assert_eq!(hull.len(), 4);
        assert!(hull.contains(&1));
        assert!(hull.contains(&2));
        assert!(hull.contains(&3));
        assert!(hull.contains(&4));
    }

    #[test]
    fn test_hull_of_collinear_points_is_degenerate() {
        let points = vec![
            Vector2::new(0.0, 0.0),
            Vector2::new(1.0, 0.0),
            Vector2::new(2.0, 0.0),
            Vector2::new(3.0, 0.0),
        ];
        let hull = convex_hull_2d(&points);
        assert!(hull.len() < 3);
    }

    #[test]
    fn test_detect_plane_edge_square_plate() {
        let mut rng = StdRng::seed_from_u64(21);
        let mut points = vec![
            Vector3::new(-10.0, -10.0, 5.0),
            Vector3::new(10.0, -10.0, 5.0),
            Vector3::new(10.0, 10.0, 5.0),
            Vector3::new(-10.0, 10.0, 5.0),
        ];
        for _ in 0..200 {
            points.push(Vector3::new(
                rng.gen_range(-9.0..9.0),
                rng.gen_range(-9.0..9.0),
                5.0,
            ));
        }
        let plane = Plane {
            a: 0.0,
            b: 0.0,
            c: 1.0,
            d: -5.0,
        };
        let (vertices, edges) = detect_plane_edge(&points, &plane).unwrap();
        assert_eq!(vertices.len(), 4);
        assert!(vertices.iter().all(|v| *v < 4));
        assert_eq!(edges.len(), 4);
        // edges form a closed loop over the hull vertices
        for (i, edge) in edges.iter().enumerate() {
            assert_eq!(edge[0], vertices[i]);
            assert_eq!(edge[1], vertices[(i + 1) % vertices.len()]);
        }
    }

    #[test]
    fn test_detect_plane_edge_vertical_plane() {
        // plane x = 0, normal along X; the frame projection must handle it
        let mut rng = StdRng::seed_from_u64(33);
        let mut points = vec![
            Vector3::new(0.0, -5.0, -5.0),
            Vector3::new(0.0, 5.0, -5.0),
            Vector3::new(0.0, 5.0, 5.0),
            Vector3::new(0.0, -5.0, 5.0),
        ];
        for _ in 0..100 {
            points.push(Vector3::new(
                0.0,
                rng.gen_range(-4.0..4.0),
                rng.gen_range(-4.0..4.0),
            ));
        }
        let plane = Plane {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 0.0,
        };
        let (vertices, _) = detect_plane_edge(&points, &plane).unwrap();
        assert_eq!(vertices.len(), 4);
        assert!(vertices.iter().all(|v| *v < 4));
    }

    #[test]
    fn test_detect_plane_edge_degenerate_input() {
        let points = vec![
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(2.0, 0.0, 0.0),
        ];
        let plane = Plane {
            a: 0.0,
            b: 0.0,
            c: 1.0,
            d: 0.0,
        };
        assert!(matches!(
            detect_plane_edge(&points, &plane),
            Err(Error::DegenerateGeometry)
        ));
    }
}

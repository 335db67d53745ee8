use log::debug;
use nalgebra::Vector3;
use rand::prelude::*;

use crate::convexhull::detect_plane_edge;
use crate::error::Result;
use crate::segmentation::{detect_line, Line, Plane};

/// A straight boundary segment of a planar point set.
#[derive(Debug, Clone)]
pub struct EdgeLine {
    /// Indices of the boundary points supporting this edge.
    pub indices: Vec<usize>,
    /// Supporting point with the smallest projection onto the direction.
    pub start: Vector3<f64>,
    /// Supporting point with the largest projection onto the direction.
    pub end: Vector3<f64>,
    pub line: Line,
}

/// Detects the straight edges bounding a planar point set.
///
/// Boundary points are gathered by `boundary_rounds` of convex-hull peeling:
/// each round takes the hull vertices of the points not yet marked as
/// boundary. Edges are then extracted greedily, each as a refined RANSAC
/// line over the remaining boundary points; the winning inliers are removed
/// before the next edge is searched. Extraction stops early once the
/// boundary is exhausted, so fewer than `expected_edges` results can be
/// returned.
pub fn detect_edge_lines<R: Rng + ?Sized>(
    points: &[Vector3<f64>],
    plane: &Plane,
    threshold: f64,
    expected_edges: usize,
    boundary_rounds: usize,
    max_iterations: usize,
    rng: &mut R,
) -> Result<Vec<EdgeLine>> {
    let mut is_boundary = vec![false; points.len()];
    for _ in 0..boundary_rounds {
        let remaining: Vec<usize> = (0..points.len()).filter(|i| !is_boundary[*i]).collect();
        let subset: Vec<Vector3<f64>> = remaining.iter().map(|i| points[*i]).collect();
        let hull = match detect_plane_edge(&subset, plane) {
            Ok((hull, _)) => hull,
            Err(_) => break,
        };
        for local in hull {
            is_boundary[remaining[local]] = true;
        }
    }
    let mut active: Vec<usize> = (0..points.len()).filter(|i| is_boundary[*i]).collect();
    debug!("{} boundary points after peeling", active.len());

    let mut edges = Vec::with_capacity(expected_edges);
    for _ in 0..expected_edges {
        if active.len() < 2 {
            break;
        }
        let subset: Vec<Vector3<f64>> = active.iter().map(|i| points[*i]).collect();
        let (local_inliers, line) =
            match detect_line(&subset, threshold, max_iterations, true, rng) {
                Ok(result) => result,
                Err(_) => break,
            };
        let indices: Vec<usize> = local_inliers.iter().map(|i| active[*i]).collect();

        // extreme supporting points along the line direction
        let projections: Vec<f64> = indices
            .iter()
            .map(|i| points[*i].dot(&line.direction))
            .collect();
        let (mut lo, mut hi) = (0usize, 0usize);
        for (k, t) in projections.iter().enumerate() {
            if *t < projections[lo] {
                lo = k;
            }
            if *t > projections[hi] {
                hi = k;
            }
        }
        let start = points[indices[lo]];
        let end = points[indices[hi]];

        let claimed: Vec<bool> = {
            let mut mask = vec![false; points.len()];
            for i in &indices {
                mask[*i] = true;
            }
            mask
        };
        active.retain(|i| !claimed[*i]);

        edges.push(EdgeLine {
            indices,
            start,
            end,
            line,
        });
    }
    Ok(edges)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use rand::rngs::StdRng;

    fn square_plate(rng: &mut StdRng) -> Vec<Vector3<f64>> {
        let mut points = Vec::new();
        let jitter = |rng: &mut StdRng| rng.gen_range(-0.05..0.05);
        let mut t = -10.0;
        while t <= 10.0 {
            points.push(Vector3::new(t + jitter(rng), -10.0 + jitter(rng), 0.0));
            points.push(Vector3::new(t + jitter(rng), 10.0 + jitter(rng), 0.0));
            points.push(Vector3::new(-10.0 + jitter(rng), t + jitter(rng), 0.0));
            points.push(Vector3::new(10.0 + jitter(rng), t + jitter(rng), 0.0));
            t += 0.5;
        }
        for _ in 0..150 {
            points.push(Vector3::new(
                rng.gen_range(-8.0..8.0),
                rng.gen_range(-8.0..8.0),
                0.0,
            ));
        }
        points
    }

    #[test]
    fn test_detects_four_axis_aligned_edges() {
        let mut rng = StdRng::seed_from_u64(101);
        let points = square_plate(&mut rng);
        let plane = Plane {
            a: 0.0,
            b: 0.0,
            c: 1.0,
            d: 0.0,
        };
        let edges = detect_edge_lines(&points, &plane, 0.2, 4, 3, 400, &mut rng).unwrap();
        assert_eq!(edges.len(), 4);

        for edge in &edges {
            assert!(edge.indices.len() >= 10, "thin edge: {}", edge.indices.len());
            let d = edge.line.direction;
            let axis_aligned = d.x.abs() > 0.99 || d.y.abs() > 0.99;
            assert!(axis_aligned, "direction was {:?}", d);
            // endpoints sit near opposite corners of the side
            assert!((edge.end - edge.start).norm() > 15.0);
            assert_approx_eq!(edge.start.z, 0.0, 1e-9);
        }
    }

    #[test]
    fn test_returns_partial_results_when_boundary_runs_out() {
        let mut rng = StdRng::seed_from_u64(7);
        // a single thin strip only supports one edge worth of points
        let points: Vec<Vector3<f64>> = (0..40)
            .map(|i| Vector3::new(i as f64 * 0.5, rng.gen_range(-0.02..0.02), 0.0))
            .collect();
        let plane = Plane {
            a: 0.0,
            b: 0.0,
            c: 1.0,
            d: 0.0,
        };
        let edges = detect_edge_lines(&points, &plane, 0.2, 4, 2, 200, &mut rng).unwrap();
        assert!(edges.len() < 4);
    }
}

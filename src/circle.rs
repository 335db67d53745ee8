use std::collections::HashSet;

use float_ord::FloatOrd;
use log::debug;
use nalgebra::{Vector2, Vector3};
use rand::prelude::*;

use crate::convexhull::detect_plane_edge;
use crate::error::{Error, Result};
use crate::frame::transform_to_plane_coordinates;
use crate::segmentation::Plane;
use crate::stats;
use crate::vector::{ensure_consistent_direction, normalize};

const RANK_EPSILON: f64 = 1e-9;

/// Circle in 3-D space: center, unit normal of its plane, radius.
#[derive(Debug, Clone, PartialEq)]
pub struct Circle {
    pub center: Vector3<f64>,
    pub normal: Vector3<f64>,
    pub radius: f64,
}

/// Closed-form circle through three points.
///
/// The center is the intersection of the two perpendicular bisectors of
/// (p1, p2) and (p1, p3) within the plane of the three points. The 2x2
/// system is solved over the axis pair with the largest determinant, so no
/// fixed coordinate pair can make it singular.
///
/// Fails with [`Error::CollinearPoints`] when the points do not span a
/// plane.
pub fn fit_circle_exact(
    p1: &Vector3<f64>,
    p2: &Vector3<f64>,
    p3: &Vector3<f64>,
) -> Result<Circle> {
    let edge_a = p2 - p1;
    let edge_b = p3 - p1;
    let cross = edge_a.cross(&edge_b);
    if cross.norm() < RANK_EPSILON {
        return Err(Error::CollinearPoints);
    }
    let normal = cross.normalize();

    let mid1 = (p1 + p2) / 2.0;
    let mid2 = (p1 + p3) / 2.0;
    let v1 = edge_a.cross(&normal);
    let v2 = edge_b.cross(&normal);

    // solve mid1 + t*v1 = mid2 + s*v2 over the best-conditioned axis pair
    let b = mid2 - mid1;
    let (mut det, mut i, mut j) = (0.0f64, 0usize, 1usize);
    for &(pi, pj) in &[(0usize, 1usize), (0, 2), (1, 2)] {
        let candidate = v1[pi] * (-v2[pj]) - (-v2[pi]) * v1[pj];
        if candidate.abs() > det.abs() {
            det = candidate;
            i = pi;
            j = pj;
        }
    }
    if det.abs() < RANK_EPSILON {
        return Err(Error::CollinearPoints);
    }
    let t = (b[i] * (-v2[j]) - (-v2[i]) * b[j]) / det;
    let center = mid1 + t * v1;

    Ok(Circle {
        center,
        normal,
        radius: (center - p1).norm(),
    })
}

/// Robust circle detection on a planar point set.
///
/// The convex-hull boundary of the points is extracted, `iterations` random
/// triples of boundary points are fit exactly (degenerate triples are
/// skipped) and the final circle is the componentwise median over the
/// successful samples; the sample normals are made direction-consistent with
/// the plane normal before taking the median. The returned inliers are all
/// points within `radius + tolerance` of the median center.
pub fn detect_circle<R: Rng + ?Sized>(
    points: &[Vector3<f64>],
    plane: &Plane,
    iterations: usize,
    tolerance: f64,
    rng: &mut R,
) -> Result<(Vec<usize>, Circle)> {
    let (hull, _) = detect_plane_edge(points, plane)?;

    let mut centers = Vec::new();
    let mut normals = Vec::new();
    let mut radii = Vec::new();
    for _ in 0..iterations {
        let sample = rand::seq::index::sample(rng, hull.len(), 3);
        let circle = match fit_circle_exact(
            &points[hull[sample.index(0)]],
            &points[hull[sample.index(1)]],
            &points[hull[sample.index(2)]],
        ) {
            Ok(circle) => circle,
            Err(_) => continue,
        };
        centers.push(circle.center);
        normals.push(circle.normal);
        radii.push(circle.radius);
    }
    if centers.is_empty() {
        return Err(Error::DegenerateGeometry);
    }
    debug!("{} of {} circle samples were usable", centers.len(), iterations);

    let center = stats::median_vector(&centers);
    let consistent = ensure_consistent_direction(&normals, Some(&plane.normal()));
    let normal = normalize(&stats::median_vector(&consistent))?;
    let radius = stats::median(&radii);

    let inliers = points
        .iter()
        .enumerate()
        .filter(|(_, p)| (*p - center).norm() < radius + tolerance)
        .map(|(index, _)| index)
        .collect();
    Ok((
        inliers,
        Circle {
            center,
            normal,
            radius,
        },
    ))
}

/// RANSAC circle detection on a voxelized projection of a planar point set.
///
/// The points are projected into the plane frame and rasterized to a grid of
/// cell size `voxel_size`. Each iteration fits a circle through three random
/// grid points and scores it by the density of grid points inside it; the
/// largest circle whose density clears `density_threshold` wins. This favours
/// filled circular regions over rings, complementing [`detect_circle`].
///
/// Fails with [`Error::UnsupportedOrientation`] when the plane is nearly
/// perpendicular to the XY projection and with [`Error::DetectionFailed`]
/// when no candidate clears the density threshold.
pub fn detect_circle_ransac<R: Rng + ?Sized>(
    points: &[Vector3<f64>],
    plane: &Plane,
    density_threshold: f64,
    voxel_size: f64,
    max_iterations: usize,
    rng: &mut R,
) -> Result<(Vec<usize>, Circle)> {
    if plane.c.abs() < 1e-6 {
        return Err(Error::UnsupportedOrientation);
    }
    let origin = Vector3::new(0.0, 0.0, -plane.d / plane.c);
    let (transformed, frame) =
        transform_to_plane_coordinates(points, &origin, &plane.normal())?;

    // occupancy grid over the XY view
    let min_x = transformed.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
    let min_y = transformed.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
    let mut occupied: HashSet<(i64, i64)> = HashSet::new();
    for p in &transformed {
        occupied.insert((
            ((p.x - min_x) / voxel_size).floor() as i64,
            ((p.y - min_y) / voxel_size).floor() as i64,
        ));
    }
    let mut grid_points: Vec<Vector2<f64>> = occupied
        .iter()
        .map(|(ix, iy)| {
            Vector2::new(*ix as f64 * voxel_size + min_x, *iy as f64 * voxel_size + min_y)
        })
        .collect();
    grid_points.sort_by_key(|g| (FloatOrd(g.x), FloatOrd(g.y)));
    if grid_points.len() < 3 {
        return Err(Error::DegenerateGeometry);
    }

    let mut best: Option<(Vector2<f64>, f64)> = None;
    for _ in 0..max_iterations {
        let sample = rand::seq::index::sample(rng, grid_points.len(), 3);
        let g1 = grid_points[sample.index(0)];
        let g2 = grid_points[sample.index(1)];
        let g3 = grid_points[sample.index(2)];

        // circumcenter of the 2-D triangle
        let a11 = 2.0 * (g2.x - g1.x);
        let a12 = 2.0 * (g2.y - g1.y);
        let a21 = 2.0 * (g3.x - g1.x);
        let a22 = 2.0 * (g3.y - g1.y);
        let det = a11 * a22 - a12 * a21;
        if det.abs() < RANK_EPSILON {
            continue;
        }
        let b1 = g2.norm_squared() - g1.norm_squared();
        let b2 = g3.norm_squared() - g1.norm_squared();
        let center = Vector2::new((b1 * a22 - a12 * b2) / det, (a11 * b2 - b1 * a21) / det);
        let radius = (g1 - center).norm();

        let inside = grid_points
            .iter()
            .filter(|g| (*g - center).norm() < radius)
            .count();
        let density =
            (inside as f64 * voxel_size * voxel_size) / (std::f64::consts::PI * radius * radius);
        let is_better = density > density_threshold
            && best.map(|(_, r)| radius > r).unwrap_or(true);
        if is_better {
            best = Some((center, radius));
        }
    }

    let (center_2d, radius) = best.ok_or(Error::DetectionFailed {
        min_points: 3,
        iterations: max_iterations,
    })?;
    let center = frame.to_world(&Vector3::new(center_2d.x, center_2d.y, 0.0));
    let normal = normalize(&plane.normal())?;
    let inliers = points
        .iter()
        .enumerate()
        .filter(|(_, p)| (*p - center).norm() < radius)
        .map(|(index, _)| index)
        .collect();
    Ok((
        inliers,
        Circle {
            center,
            normal,
            radius,
        },
    ))
}

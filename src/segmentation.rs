use log::debug;
use nalgebra::Vector3;
use rand::prelude::*;
use rand::rngs::SmallRng;
use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::vector::{ensure_consistent_direction, estimate_vector};

/// Cross products below this norm mean the sampled points are collinear.
const COLLINEAR_EPSILON: f64 = 1e-6;

/// Number of inlier triples resampled when refitting a plane.
const NORMAL_RESAMPLES: usize = 10;

/// Plane in coordinate form ax + by + cz + d = 0. Detector results carry a
/// unit-length (a, b, c); the sign of the normal is not canonical.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
}

impl Plane {
    /// The (not necessarily unit) normal vector (a, b, c).
    pub fn normal(&self) -> Vector3<f64> {
        Vector3::new(self.a, self.b, self.c)
    }

    /// Signed distance of a point to the plane, assuming a unit normal.
    pub fn signed_distance(&self, point: &Vector3<f64>) -> f64 {
        self.normal().dot(point) + self.d
    }

    /// Plane through three points, with a unit normal. Fails with
    /// [`Error::CollinearPoints`] when the points do not span a plane.
    pub fn from_points(
        p1: &Vector3<f64>,
        p2: &Vector3<f64>,
        p3: &Vector3<f64>,
    ) -> Result<Plane> {
        let cross = (p2 - p1).cross(&(p3 - p1));
        let norm = cross.norm();
        if norm < COLLINEAR_EPSILON {
            return Err(Error::CollinearPoints);
        }
        let normal = cross / norm;
        Ok(Plane {
            a: normal.x,
            b: normal.y,
            c: normal.z,
            d: -normal.dot(p1),
        })
    }
}

/// Infinite line {p + t*v} through `point` with unit direction `direction`.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub point: Vector3<f64>,
    pub direction: Vector3<f64>,
}

fn sample_plane_candidate<R: Rng + ?Sized>(
    points: &[Vector3<f64>],
    rng: &mut R,
) -> Result<Plane> {
    let indices = rand::seq::index::sample(rng, points.len(), 3);
    Plane::from_points(
        &points[indices.index(0)],
        &points[indices.index(1)],
        &points[indices.index(2)],
    )
}

fn plane_inliers(points: &[Vector3<f64>], plane: &Plane, threshold: f64) -> Vec<usize> {
    points
        .iter()
        .enumerate()
        .filter(|(_, p)| plane.signed_distance(p).abs() <= threshold)
        .map(|(index, _)| index)
        .collect()
}

/// Re-estimates a plane from its inliers: normals of resampled inlier
/// triples are made direction-consistent and averaged with IQR outlier
/// trimming, and d is fixed by the inlier centroid. Falls back to the
/// sampled model when every resampled triple is degenerate.
fn refit_plane<R: Rng + ?Sized>(
    points: &[Vector3<f64>],
    inliers: &[usize],
    sampled: Plane,
    rng: &mut R,
) -> Plane {
    let mut normals = Vec::with_capacity(NORMAL_RESAMPLES);
    for _ in 0..NORMAL_RESAMPLES {
        let p1 = &points[inliers[rng.gen_range(0..inliers.len())]];
        let p2 = &points[inliers[rng.gen_range(0..inliers.len())]];
        let p3 = &points[inliers[rng.gen_range(0..inliers.len())]];
        let cross = (p2 - p1).cross(&(p3 - p1));
        if cross.norm() > COLLINEAR_EPSILON {
            normals.push(cross);
        }
    }
    if normals.is_empty() {
        return sampled;
    }
    let consistent = ensure_consistent_direction(&normals, Some(&sampled.normal()));
    let normal = match estimate_vector(&consistent) {
        Ok(n) => n,
        Err(_) => return sampled,
    };
    let centroid: Vector3<f64> =
        inliers.iter().map(|i| points[*i]).sum::<Vector3<f64>>() / inliers.len() as f64;
    Plane {
        a: normal.x,
        b: normal.y,
        c: normal.z,
        d: -normal.dot(&centroid),
    }
}

/// RANSAC plane detection.
///
/// Samples 3 distinct points per iteration and keeps the candidate with the
/// most inliers (points within `threshold` of the plane). Collinear samples
/// are skipped without consuming the candidate. The returned model is
/// re-estimated from the inliers, the inlier set is the one that won the
/// search.
///
/// Fails with [`Error::InsufficientPoints`] for fewer than 3 points and with
/// [`Error::DetectionFailed`] when no candidate reaches `min_points` inliers
/// within `max_iterations`.
pub fn detect_plane<R: Rng + ?Sized>(
    points: &[Vector3<f64>],
    threshold: f64,
    min_points: usize,
    max_iterations: usize,
    rng: &mut R,
) -> Result<(Vec<usize>, Plane)> {
    if points.len() < 3 {
        return Err(Error::InsufficientPoints {
            needed: 3,
            actual: points.len(),
        });
    }

    let mut best: Option<(Vec<usize>, Plane)> = None;
    for _ in 0..max_iterations {
        let candidate = match sample_plane_candidate(points, rng) {
            Ok(plane) => plane,
            Err(_) => continue,
        };
        let inliers = plane_inliers(points, &candidate, threshold);
        let is_better = best
            .as_ref()
            .map(|(b, _)| inliers.len() > b.len())
            .unwrap_or(true);
        if is_better {
            best = Some((inliers, candidate));
        }
    }

    let (inliers, sampled) = best.ok_or(Error::DetectionFailed {
        min_points,
        iterations: max_iterations,
    })?;
    if inliers.len() < min_points {
        return Err(Error::DetectionFailed {
            min_points,
            iterations: max_iterations,
        });
    }
    debug!(
        "plane search kept {} of {} points as inliers",
        inliers.len(),
        points.len()
    );
    let plane = refit_plane(points, &inliers, sampled, rng);
    Ok((inliers, plane))
}

/// RANSAC plane detection with candidate scoring parallelized across
/// iterations via rayon.
///
/// Each iteration derives its own `SmallRng` from `seed`, so the result is
/// deterministic for a fixed seed; ties between equally good candidates are
/// broken in favour of the lowest iteration index.
pub fn detect_plane_par(
    points: &[Vector3<f64>],
    threshold: f64,
    min_points: usize,
    max_iterations: usize,
    seed: u64,
) -> Result<(Vec<usize>, Plane)> {
    if points.len() < 3 {
        return Err(Error::InsufficientPoints {
            needed: 3,
            actual: points.len(),
        });
    }

    let best = (0..max_iterations)
        .into_par_iter()
        .filter_map(|iteration| {
            let mut rng = SmallRng::seed_from_u64(seed.wrapping_add(iteration as u64));
            let candidate = sample_plane_candidate(points, &mut rng).ok()?;
            let inliers = plane_inliers(points, &candidate, threshold);
            Some((iteration, inliers, candidate))
        })
        .reduce_with(|a, b| {
            // most inliers wins, lowest iteration index breaks ties
            if b.1.len() > a.1.len() || (b.1.len() == a.1.len() && b.0 < a.0) {
                b
            } else {
                a
            }
        });

    let (_, inliers, sampled) = best.ok_or(Error::DetectionFailed {
        min_points,
        iterations: max_iterations,
    })?;
    if inliers.len() < min_points {
        return Err(Error::DetectionFailed {
            min_points,
            iterations: max_iterations,
        });
    }
    let mut refit_rng = SmallRng::seed_from_u64(seed.wrapping_add(max_iterations as u64));
    let plane = refit_plane(points, &inliers, sampled, &mut refit_rng);
    Ok((inliers, plane))
}

fn line_inliers(
    points: &[Vector3<f64>],
    point: &Vector3<f64>,
    direction: &Vector3<f64>,
    threshold: f64,
) -> Vec<usize> {
    points
        .iter()
        .enumerate()
        .filter(|(_, p)| {
            let u = *p - point;
            (u - u.dot(direction) * direction).norm() < threshold
        })
        .map(|(index, _)| index)
        .collect()
}

/// RANSAC line detection.
///
/// Samples 2 distinct points per iteration and keeps the line with the most
/// points within `threshold` of it. With `refine`, the search is repeated
/// once over the winning inliers with the threshold halved (a single
/// refinement pass, not a fixed-point loop).
///
/// Fails with [`Error::InsufficientPoints`] for fewer than 2 points and with
/// [`Error::DegenerateGeometry`] when all points coincide.
pub fn detect_line<R: Rng + ?Sized>(
    points: &[Vector3<f64>],
    threshold: f64,
    max_iterations: usize,
    refine: bool,
    rng: &mut R,
) -> Result<(Vec<usize>, Line)> {
    if points.len() < 2 {
        return Err(Error::InsufficientPoints {
            needed: 2,
            actual: points.len(),
        });
    }

    let mut best: Option<(Vec<usize>, Line)> = None;
    for _ in 0..max_iterations {
        let indices = rand::seq::index::sample(rng, points.len(), 2);
        let p1 = points[indices.index(0)];
        let p2 = points[indices.index(1)];
        let direction = p2 - p1;
        let norm = direction.norm();
        if norm < COLLINEAR_EPSILON {
            continue;
        }
        let direction = direction / norm;

        let inliers = line_inliers(points, &p1, &direction, threshold);
        let is_better = best
            .as_ref()
            .map(|(b, _)| inliers.len() > b.len())
            .unwrap_or(true);
        if is_better {
            best = Some((
                inliers,
                Line {
                    point: p1,
                    direction,
                },
            ));
        }
    }

    let (mut inliers, mut line) = best.ok_or(Error::DegenerateGeometry)?;

    if refine && inliers.len() >= 2 {
        let subset: Vec<Vector3<f64>> = inliers.iter().map(|i| points[*i]).collect();
        let (refined, refined_line) =
            detect_line(&subset, threshold / 2.0, max_iterations, false, rng)?;
        inliers = refined.into_iter().map(|i| inliers[i]).collect();
        line = refined_line;
    }
    Ok((inliers, line))
}

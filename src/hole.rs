use kd_tree::{KdPoint, KdTree};
use log::debug;
use nalgebra::Vector3;
use rand::prelude::*;

use crate::circle::{fit_circle_exact, Circle};
use crate::clustering::cluster_points;
use crate::error::{Error, Result};
use crate::frame::transform_to_plane_coordinates;
use crate::segmentation::Plane;
use crate::stats;
use crate::vector::normalize;

struct PlanarPoint {
    xy: [f64; 2],
    index: usize,
}

impl KdPoint for PlanarPoint {
    type Scalar = f64;
    type Dim = typenum::U2;
    fn at(&self, k: usize) -> f64 {
        self.xy[k]
    }
}

/// Tuning knobs for [`detect_hole_in_plane`].
#[derive(Debug, Clone)]
pub struct HoleParams {
    /// Which sparse-region cluster is the hole, by descending size. The
    /// largest cluster is normally the outer boundary ring, so the default
    /// picks the second largest.
    pub cluster_index: usize,
    /// Points whose k-nearest-neighbour distance exceeds this percentile of
    /// the distribution count as sparse.
    pub density_percentile: f64,
    /// Which neighbour the density measure looks at.
    pub k_nearest: usize,
    /// DBSCAN radius for grouping the sparse points.
    pub cluster_eps: f64,
    /// DBSCAN core-point threshold.
    pub cluster_min_samples: usize,
    /// Number of random boundary triples fit when estimating the center.
    pub fit_iterations: usize,
}

impl Default for HoleParams {
    fn default() -> Self {
        HoleParams {
            cluster_index: 1,
            density_percentile: 95.0,
            k_nearest: 50,
            cluster_eps: 5.0,
            cluster_min_samples: 5,
            fit_iterations: 100,
        }
    }
}

/// Locates a circular hole of known radius in a planar point set.
///
/// The points are projected into the plane frame and scored by the distance
/// to their k-th nearest neighbour; points in the top `density_percentile`
/// of that distribution sit next to a gap in the sampling. Those sparse
/// points are clustered and the cluster selected by `cluster_index` is taken
/// as the hole boundary. Its center is the componentwise median over exact
/// circle fits of random boundary triples; the radius is the caller-supplied
/// `hole_radius`, not an estimate.
///
/// Fails with [`Error::UnsupportedOrientation`] for near-vertical planes and
/// with [`Error::ClusterIndexOutOfRange`] when fewer clusters exist than
/// `cluster_index` requires.
pub fn detect_hole_in_plane<R: Rng + ?Sized>(
    points: &[Vector3<f64>],
    plane: &Plane,
    hole_radius: f64,
    params: &HoleParams,
    rng: &mut R,
) -> Result<(Vec<usize>, Circle)> {
    if plane.c.abs() < 1e-6 {
        return Err(Error::UnsupportedOrientation);
    }
    if points.len() <= params.k_nearest {
        return Err(Error::InsufficientPoints {
            needed: params.k_nearest + 1,
            actual: points.len(),
        });
    }
    let origin = Vector3::new(0.0, 0.0, -plane.d / plane.c);
    let (transformed, _) =
        transform_to_plane_coordinates(points, &origin, &plane.normal())?;

    let items: Vec<PlanarPoint> = transformed
        .iter()
        .enumerate()
        .map(|(index, p)| PlanarPoint {
            xy: [p.x, p.y],
            index,
        })
        .collect();
    let tree = KdTree::build_by_ordered_float(items);

    // distance to the k-th neighbour; nearests() includes the query point
    let kth_distances: Vec<f64> = transformed
        .iter()
        .map(|p| {
            let nearest = tree.nearests(&[p.x, p.y], params.k_nearest + 1);
            nearest
                .last()
                .map(|found| found.squared_distance.sqrt())
                .unwrap_or(0.0)
        })
        .collect();

    let cutoff = stats::percentile(&kth_distances, params.density_percentile);
    let sparse: Vec<usize> = (0..points.len())
        .filter(|i| kth_distances[*i] > cutoff)
        .collect();
    debug!("{} sparse points above the density cutoff", sparse.len());

    let sparse_points: Vec<Vector3<f64>> = sparse.iter().map(|i| transformed[*i]).collect();
    let clusters = cluster_points(
        &sparse_points,
        params.cluster_eps,
        params.cluster_min_samples,
    );
    if clusters.len() <= params.cluster_index {
        return Err(Error::ClusterIndexOutOfRange {
            requested: params.cluster_index,
            available: clusters.len(),
        });
    }
    let boundary: Vec<usize> = clusters[params.cluster_index]
        .iter()
        .map(|i| sparse[*i])
        .collect();
    if boundary.len() < 3 {
        return Err(Error::InsufficientPoints {
            needed: 3,
            actual: boundary.len(),
        });
    }

    let mut centers = Vec::new();
    for _ in 0..params.fit_iterations {
        let sample = rand::seq::index::sample(rng, boundary.len(), 3);
        if let Ok(circle) = fit_circle_exact(
            &points[boundary[sample.index(0)]],
            &points[boundary[sample.index(1)]],
            &points[boundary[sample.index(2)]],
        ) {
            centers.push(circle.center);
        }
    }
    if centers.is_empty() {
        return Err(Error::DegenerateGeometry);
    }

    let circle = Circle {
        center: stats::median_vector(&centers),
        normal: normalize(&plane.normal())?,
        radius: hole_radius,
    };
    Ok((boundary, circle))
}

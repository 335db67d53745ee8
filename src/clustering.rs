use std::collections::VecDeque;

use kd_tree::{KdPoint, KdTree};
use log::debug;
use nalgebra::Vector3;

struct ProjectedPoint {
    xy: [f64; 2],
    index: usize,
}

impl KdPoint for ProjectedPoint {
    type Scalar = f64;
    type Dim = typenum::U2;
    fn at(&self, k: usize) -> f64 {
        self.xy[k]
    }
}

const UNCLASSIFIED: isize = -2;
const NOISE: isize = -1;

/// Radius-based density clustering (DBSCAN) over the (X, Y) coordinates of a
/// point set.
///
/// A point is a core point when at least `min_samples` points (itself
/// included) lie within `eps` of it; clusters are maximal connected sets of
/// core points together with their directly reachable neighbours. Points
/// reachable from no core point are noise and appear in no cluster.
///
/// Returns the clusters as index sets, sorted by descending member count.
pub fn cluster_points(
    points: &[Vector3<f64>],
    eps: f64,
    min_samples: usize,
) -> Vec<Vec<usize>> {
    if points.is_empty() {
        return Vec::new();
    }
    let items: Vec<ProjectedPoint> = points
        .iter()
        .enumerate()
        .map(|(index, p)| ProjectedPoint {
            xy: [p.x, p.y],
            index,
        })
        .collect();
    let tree = KdTree::build_by_ordered_float(items);

    let neighbors_of = |index: usize| -> Vec<usize> {
        tree.within_radius(&[points[index].x, points[index].y], eps)
            .into_iter()
            .map(|item| item.index)
            .collect()
    };

    let mut labels = vec![UNCLASSIFIED; points.len()];
    let mut cluster_id: isize = 0;

    for index in 0..points.len() {
        if labels[index] != UNCLASSIFIED {
            continue;
        }
        let neighbors = neighbors_of(index);
        if neighbors.len() < min_samples {
            labels[index] = NOISE;
            continue;
        }

        labels[index] = cluster_id;
        let mut queue: VecDeque<usize> = neighbors.into_iter().collect();
        while let Some(candidate) = queue.pop_front() {
            if labels[candidate] == NOISE {
                // border point, reachable but not core
                labels[candidate] = cluster_id;
            }
            if labels[candidate] != UNCLASSIFIED {
                continue;
            }
            labels[candidate] = cluster_id;
            let candidate_neighbors = neighbors_of(candidate);
            if candidate_neighbors.len() >= min_samples {
                queue.extend(candidate_neighbors);
            }
        }
        cluster_id += 1;
    }

    let mut clusters: Vec<Vec<usize>> = vec![Vec::new(); cluster_id as usize];
    for (index, label) in labels.iter().enumerate() {
        if *label >= 0 {
            clusters[*label as usize].push(index);
        }
    }
    clusters.sort_by_key(|c| std::cmp::Reverse(c.len()));
    debug!(
        "clustered {} points into {} clusters",
        points.len(),
        clusters.len()
    );
    clusters
}

use std::collections::HashMap;

use nalgebra::Vector3;

/// Downsamples a point cloud on a regular voxel grid.
///
/// Points are binned into cubic cells of edge length `voxel_size` anchored
/// at the minimum corner of the cloud, and each occupied cell is replaced by
/// the centroid of its members. Cells are emitted in lexicographic cell
/// order, so the output is deterministic.
pub fn voxel_grid_filter(points: &[Vector3<f64>], voxel_size: f64) -> Vec<Vector3<f64>> {
    if points.is_empty() {
        return Vec::new();
    }
    let min = points.iter().fold(
        Vector3::repeat(f64::INFINITY),
        |acc: Vector3<f64>, p| acc.inf(p),
    );

    let mut cells: HashMap<(i64, i64, i64), (Vector3<f64>, usize)> = HashMap::new();
    for p in points {
        let key = (
            ((p.x - min.x) / voxel_size).floor() as i64,
            ((p.y - min.y) / voxel_size).floor() as i64,
            ((p.z - min.z) / voxel_size).floor() as i64,
        );
        let entry = cells.entry(key).or_insert((Vector3::zeros(), 0));
        entry.0 += p;
        entry.1 += 1;
    }

    let mut keys: Vec<(i64, i64, i64)> = cells.keys().copied().collect();
    keys.sort_unstable();
    keys.iter()
        .map(|key| {
            let (sum, count) = &cells[key];
            sum / *count as f64
        })
        .collect()
}

use nalgebra::{Matrix3, Rotation3, SymmetricEigen, Unit, Vector3};

use crate::error::{Error, Result};
use crate::stats;

const DIRECTION_EPSILON: f64 = 1e-8;

/// Returns `v / ||v||`, or [`Error::DegenerateVector`] for a zero-length input.
pub fn normalize(v: &Vector3<f64>) -> Result<Vector3<f64>> {
    let norm = v.norm();
    if norm == 0.0 {
        return Err(Error::DegenerateVector);
    }
    Ok(v / norm)
}

/// Rotation matrix that carries the direction of `from` onto the direction of
/// `to`. Parallel inputs yield the identity; anti-parallel inputs yield a 180
/// degree rotation about a canonical perpendicular axis; everything else is a
/// Rodrigues rotation about `from x to`.
pub fn rotation_between(from: &Vector3<f64>, to: &Vector3<f64>) -> Result<Matrix3<f64>> {
    let a = normalize(from)?;
    let b = normalize(to)?;

    if (a - b).norm() < DIRECTION_EPSILON {
        return Ok(Matrix3::identity());
    }
    if (a + b).norm() < DIRECTION_EPSILON {
        let mut perpendicular = a.cross(&Vector3::x());
        if perpendicular.norm() < DIRECTION_EPSILON {
            perpendicular = a.cross(&Vector3::z());
        }
        let axis = Unit::new_normalize(perpendicular);
        return Ok(*Rotation3::from_axis_angle(&axis, std::f64::consts::PI).matrix());
    }

    let axis = Unit::new_normalize(a.cross(&b));
    let angle = a.dot(&b).clamp(-1.0, 1.0).acos();
    Ok(*Rotation3::from_axis_angle(&axis, angle).matrix())
}

/// Flips every sample that points away from the reference so that all of them
/// lie in the same half-space. With no reference, the first sample is used.
pub fn ensure_consistent_direction(
    samples: &[Vector3<f64>],
    reference: Option<&Vector3<f64>>,
) -> Vec<Vector3<f64>> {
    if samples.is_empty() {
        return Vec::new();
    }
    let reference = reference.copied().unwrap_or(samples[0]);
    samples
        .iter()
        .map(|s| if s.dot(&reference) < 0.0 { -s } else { *s })
        .collect()
}

/// Robust mean direction of a set of vectors.
///
/// The samples are normalized and averaged, then samples whose cosine
/// similarity to the mean falls outside 1.5 IQR are discarded before the
/// final average. Callers with sign-ambiguous samples should pass them
/// through [`ensure_consistent_direction`] first.
pub fn estimate_vector(samples: &[Vector3<f64>]) -> Result<Vector3<f64>> {
    if samples.is_empty() {
        return Err(Error::DegenerateVector);
    }
    let units = samples
        .iter()
        .map(normalize)
        .collect::<Result<Vec<_>>>()?;

    let mean = normalize(&(units.iter().sum::<Vector3<f64>>() / units.len() as f64))?;

    let similarities: Vec<f64> = units.iter().map(|u| u.dot(&mean)).collect();
    let q1 = stats::percentile(&similarities, 25.0);
    let q3 = stats::percentile(&similarities, 75.0);
    let iqr = q3 - q1;
    let lower = q1 - 1.5 * iqr;
    let upper = q3 + 1.5 * iqr;

    let filtered: Vector3<f64> = units
        .iter()
        .zip(similarities.iter())
        .filter(|(_, s)| **s >= lower && **s <= upper)
        .map(|(u, _)| u)
        .sum();
    normalize(&filtered)
}

/// Plane normal of a point set via principal component analysis: the
/// eigenvector of the covariance matrix with the smallest eigenvalue.
pub fn pca_normal(points: &[Vector3<f64>]) -> Result<Vector3<f64>> {
    if points.len() < 3 {
        return Err(Error::InsufficientPoints {
            needed: 3,
            actual: points.len(),
        });
    }
    let centroid: Vector3<f64> = points.iter().sum::<Vector3<f64>>() / points.len() as f64;
    let mut covariance = Matrix3::zeros();
    for p in points {
        let centered = p - centroid;
        covariance += centered * centered.transpose();
    }
    covariance /= (points.len() - 1) as f64;

    let eigen = SymmetricEigen::new(covariance);
    let mut min_index = 0;
    for i in 1..3 {
        if eigen.eigenvalues[i] < eigen.eigenvalues[min_index] {
            min_index = i;
        }
    }
    normalize(&eigen.eigenvectors.column(min_index).into_owned())
}

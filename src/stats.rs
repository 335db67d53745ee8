use float_ord::FloatOrd;
use nalgebra::Vector3;

/// Linearly interpolated percentile, matching the numpy default. `p` is in
/// percent, values need not be sorted.
pub(crate) fn percentile(values: &[f64], p: f64) -> f64 {
    debug_assert!(!values.is_empty());
    let mut sorted = values.to_vec();
    sorted.sort_by_key(|v| FloatOrd(*v));
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = (p / 100.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

pub(crate) fn median(values: &[f64]) -> f64 {
    percentile(values, 50.0)
}

/// Componentwise median of a set of vectors.
pub(crate) fn median_vector(samples: &[Vector3<f64>]) -> Vector3<f64> {
    let xs: Vec<f64> = samples.iter().map(|v| v.x).collect();
    let ys: Vec<f64> = samples.iter().map(|v| v.y).collect();
    let zs: Vec<f64> = samples.iter().map(|v| v.z).collect();
    Vector3::new(median(&xs), median(&ys), median(&zs))
}

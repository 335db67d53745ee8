use nalgebra::Vector3;

use crate::distance::point_line_distance;

/// Ramer-Douglas-Peucker polyline simplification.
///
/// `indices` is an ordered sequence of indices into `points` describing the
/// polyline. Returns the minimal ordered subsequence whose shape stays
/// within `epsilon` of the original; the first and last index are always
/// kept. Spans are processed from an explicit work stack so deeply nested
/// splits cannot overflow the call stack.
pub fn ramer_douglas_peucker(
    points: &[Vector3<f64>],
    indices: &[usize],
    epsilon: f64,
) -> Vec<usize> {
    if indices.len() <= 2 {
        return indices.to_vec();
    }

    let mut keep = vec![false; indices.len()];
    keep[0] = true;
    keep[indices.len() - 1] = true;

    let mut spans = vec![(0usize, indices.len() - 1)];
    while let Some((start, end)) = spans.pop() {
        if end - start < 2 {
            continue;
        }
        let a = &points[indices[start]];
        let b = &points[indices[end]];

        let mut max_distance = 0.0;
        let mut split = start;
        for i in start + 1..end {
            let distance = point_line_distance(&points[indices[i]], a, b);
            if distance > max_distance {
                max_distance = distance;
                split = i;
            }
        }

        if max_distance > epsilon {
            keep[split] = true;
            spans.push((start, split));
            spans.push((split, end));
        }
    }

    indices
        .iter()
        .zip(keep.iter())
        .filter(|(_, k)| **k)
        .map(|(i, _)| *i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collinear_points_collapse_to_endpoints() {
        let points: Vec<Vector3<f64>> = (0..6)
            .map(|i| Vector3::new(i as f64, 0.0, 0.0))
            .collect();
        let indices: Vec<usize> = (0..6).collect();
        let result = ramer_douglas_peucker(&points, &indices, 1.0);
        assert_eq!(result, vec![0, 5]);
    }

    #[test]
    fn test_square_corners_survive() {
        let points = vec![
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(2.0, 0.0, 0.0),
            Vector3::new(2.0, 2.0, 0.0),
            Vector3::new(0.0, 2.0, 0.0),
        ];
        let indices: Vec<usize> = (0..4).collect();
        let result = ramer_douglas_peucker(&points, &indices, 0.5);
        assert_eq!(result, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_partial_simplification() {
        let points = vec![
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(2.0, 1.0, 0.0),
            Vector3::new(3.0, 1.0, 0.0),
            Vector3::new(4.0, 0.0, 0.0),
            Vector3::new(5.0, 0.0, 0.0),
        ];
        let indices: Vec<usize> = (0..6).collect();
        let result = ramer_douglas_peucker(&points, &indices, 0.5);
        assert_eq!(result.len(), 3);
        assert_eq!(result[0], 0);
        assert_eq!(*result.last().unwrap(), 5);
    }

    #[test]
    fn test_idempotence() {
        let points = vec![
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.1, 0.0),
            Vector3::new(2.0, 1.5, 0.0),
            Vector3::new(3.0, 1.4, 0.0),
            Vector3::new(4.0, 0.2, 0.0),
            Vector3::new(5.0, 0.0, 0.0),
        ];
        let indices: Vec<usize> = (0..6).collect();
        let once = ramer_douglas_peucker(&points, &indices, 0.5);
        let twice = ramer_douglas_peucker(&points, &once, 0.5);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_short_input_is_returned_unchanged() {
        let points = vec![Vector3::zeros(), Vector3::x()];
        let indices = vec![0, 1];
        assert_eq!(ramer_douglas_peucker(&points, &indices, 0.5), vec![0, 1]);
    }
}

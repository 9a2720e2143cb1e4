use nalgebra as na;

/// Weighted euclidean norm of already-normalized deltas.
#[inline]
pub fn weighted_distance(deltas: na::Vector3<f64>, weights: na::Vector3<f64>) -> f64 {
    deltas.component_mul(&deltas).dot(&weights).sqrt()
}

/// Maps a weighted distance into a similarity where 1.0 means identical.
///
/// The distance is divided by the largest value it can take for unit deltas,
/// `sqrt(sum(weights))`, so unit-range deltas land in `[0, 1]`.
#[inline]
pub fn similarity(deltas: na::Vector3<f64>, weights: na::Vector3<f64>) -> f64 {
    1.0 - weighted_distance(deltas, weights) / weights.sum().sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_is_one() {
        let w = na::Vector3::new(0.3, 0.5, 0.2);
        assert_eq!(similarity(na::Vector3::zeros(), w), 1.0);
    }

    #[test]
    fn unit_deltas_are_zero() {
        let w = na::Vector3::new(0.3, 0.5, 0.2);
        let s = similarity(na::Vector3::new(1.0, 1.0, 1.0), w);
        assert!(s.abs() < 1e-12);
    }

    #[test]
    fn y_dominates_x() {
        let w = na::Vector3::new(0.3, 0.5, 0.2);
        let along_x = similarity(na::Vector3::new(0.2, 0.0, 0.0), w);
        let along_y = similarity(na::Vector3::new(0.0, 0.2, 0.0), w);
        assert!(along_x > along_y);
    }
}

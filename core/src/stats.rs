//! Scalar statistics used by the weighting and promotion logic.

use std::f64::consts::PI;

use crate::{Covariance, Position};

/// Probability density of a normal distribution N(mean, standard_deviation)
/// evaluated at `x`.
///
/// Returns 0 for a non-positive standard deviation; the filter never feeds
/// one in, but a degenerate likelihood is safer than a NaN weight.
pub fn gaussian_pdf(x: f64, mean: f64, standard_deviation: f64) -> f64 {
    if standard_deviation <= 0.0 {
        return 0.0;
    }
    let normalized = (x - mean) / standard_deviation;
    (-0.5 * normalized * normalized).exp() / (standard_deviation * (2.0 * PI).sqrt())
}

/// Population variance of a sample, computed via the sum-of-squares identity
/// `(sum(x^2) - sum(x)^2 / n) / n`.
pub fn variance(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let mut sum = 0.0;
    let mut squared_sum = 0.0;
    for &value in data {
        sum += value;
        squared_sum += value * value;
    }
    let n = data.len() as f64;
    (squared_sum - (sum * sum) / n) / n
}

/// Per-axis population variance of a set of positions, returned as a
/// diagonal covariance. Each axis is computed independently; cross terms are
/// left at zero.
pub fn position_variance(positions: &[Position]) -> Covariance {
    let mut covariance = Covariance::default();
    let xs: Vec<f64> = positions.iter().map(|p| p.x).collect();
    let ys: Vec<f64> = positions.iter().map(|p| p.y).collect();
    let zs: Vec<f64> = positions.iter().map(|p| p.z).collect();
    covariance.x.x = variance(&xs);
    covariance.y.y = variance(&ys);
    covariance.z.z = variance(&zs);
    covariance
}

/// Per-axis variance of a weighted set of positions, returned as a diagonal
/// covariance. `normalized_weights` must sum to one and line up with
/// `positions` index-for-index.
pub fn weighted_position_variance(
    positions: &[Position],
    normalized_weights: &[f64],
) -> Covariance {
    debug_assert_eq!(positions.len(), normalized_weights.len());
    let mut mean = Position::default();
    for (position, &weight) in positions.iter().zip(normalized_weights.iter()) {
        mean.x += weight * position.x;
        mean.y += weight * position.y;
        mean.z += weight * position.z;
    }
    let mut covariance = Covariance::default();
    for (position, &weight) in positions.iter().zip(normalized_weights.iter()) {
        covariance.x.x += weight * (position.x - mean.x).powi(2);
        covariance.y.y += weight * (position.y - mean.y).powi(2);
        covariance.z.z += weight * (position.z - mean.z).powi(2);
    }
    covariance
}

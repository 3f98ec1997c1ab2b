//! Weight normalization and resampling primitives shared by the main SLAM
//! particle set and the landmark bootstrap filters.
//!
//! Both filters reduce to the same three steps: normalize importance
//! weights, estimate degeneracy via the effective sample size, and draw a
//! fresh index set when degeneracy crosses a threshold. Low-variance
//! (systematic) sampling is the primary resampler; roulette-wheel sampling
//! is kept as an independent-draw alternative.

use rand::Rng;
use rand::rngs::StdRng;

/// Normalize a weight vector in place so it sums to one.
///
/// A zero or non-finite sum means every hypothesis has underflowed (or a
/// likelihood went rogue); in that case all weights are reset to uniform
/// rather than letting a division by zero poison the population with NaN.
pub fn normalize_weights(weights: &mut [f64]) {
    if weights.is_empty() {
        return;
    }
    let sum: f64 = weights.iter().sum();
    if sum > 0.0 && sum.is_finite() {
        for weight in weights.iter_mut() {
            *weight /= sum;
        }
    } else {
        tracing::warn!(sum, "weight sum degenerate, resetting to uniform");
        let uniform = 1.0 / weights.len() as f64;
        for weight in weights.iter_mut() {
            *weight = uniform;
        }
    }
}

/// Effective number of particles for a normalized weight vector,
/// `1 / sum(w_i^2)`.
///
/// Ranges from 1 (all mass on one particle) to the population size (uniform
/// weights). Returns 0 for an all-zero input, matching the convention that a
/// dead population always triggers resampling.
pub fn effective_sample_size(normalized_weights: &[f64]) -> f64 {
    let sum_of_squares: f64 = normalized_weights.iter().map(|w| w * w).sum();
    if sum_of_squares > 0.0 {
        1.0 / sum_of_squares
    } else {
        0.0
    }
}

/// Low-variance (systematic) sampling.
///
/// Draws a single uniform offset in [0, 1/S) for S requested samples and
/// probes the cumulative weight distribution at S evenly spaced points,
/// selecting the index whose cumulative sum first covers each probe. The
/// probes span the whole unit interval regardless of how S compares to the
/// weight count, so every index with non-zero weight stays reachable.
/// O(K + S), and the selection variance is strictly lower than independent
/// multinomial draws.
///
/// Returns `num_samples` indices into `normalized_weights`.
pub fn low_variance_sampling(
    normalized_weights: &[f64],
    num_samples: usize,
    rng: &mut StdRng,
) -> Vec<usize> {
    let size = normalized_weights.len();
    assert!(size > 0, "cannot sample from an empty weight vector");
    let step = 1.0 / num_samples as f64;
    let offset = rng.random::<f64>() * step;

    let mut indices = Vec::with_capacity(num_samples);
    let mut cumulative = normalized_weights[0];
    let mut i = 0;
    for j in 0..num_samples {
        let probe = offset + j as f64 * step;
        // The guard keeps accumulated rounding error from walking past the
        // last index.
        while probe > cumulative && i < size - 1 {
            i += 1;
            cumulative += normalized_weights[i];
        }
        indices.push(i);
    }
    indices
}

/// Roulette-wheel sampling: `num_samples` independent draws against the
/// cumulative weight distribution.
///
/// Higher variance than [`low_variance_sampling`]; provided as an
/// alternative, not used by the primary pipeline.
pub fn roulette_wheel_sampling(
    normalized_weights: &[f64],
    num_samples: usize,
    rng: &mut StdRng,
) -> Vec<usize> {
    let mut cumulative_weights = normalized_weights.to_vec();
    cumulative_sum(&mut cumulative_weights);

    let mut indices = Vec::with_capacity(num_samples);
    for _ in 0..num_samples {
        let draw = rng.random::<f64>();
        let mut selected = cumulative_weights.len() - 1;
        for (j, &cumulative) in cumulative_weights.iter().enumerate() {
            if cumulative >= draw {
                selected = j;
                break;
            }
        }
        indices.push(selected);
    }
    indices
}

/// Convert a weight vector to its cumulative sum, in place.
pub fn cumulative_sum(weights: &mut [f64]) {
    for i in 1..weights.len() {
        weights[i] += weights[i - 1];
    }
}

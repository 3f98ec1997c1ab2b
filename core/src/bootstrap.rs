//! Bootstrap particle filter for resolving a landmark position from
//! range-only data.
//!
//! A single proximity reading constrains a landmark to a circle around the
//! user, not a point, so a new landmark cannot be handed straight to an EKF.
//! Each unconfirmed landmark instead gets one of these filters: a cloud of
//! candidate positions seeded on the measured circle, reweighted by every
//! subsequent reading, and resampled when the weights degenerate. Once the
//! candidate cloud has collapsed far enough (variance below the configured
//! gate, after a minimum number of readings) the weighted mean and variance
//! are handed back to the caller as the initial EKF estimate and the filter
//! is discarded.
//!
//! Candidate weights accumulate multiplicatively across measurements, the
//! sequential Bayesian update; resampling resets survivors to weight 1 and
//! injects a batch of fresh uniformly spread candidates so a premature
//! collapse onto the wrong circle intersection can still recover.

use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};
use std::f64::consts::PI;

use crate::angles::polar_to_cartesian;
use crate::sampling::{effective_sample_size, low_variance_sampling, normalize_weights};
use crate::stats::{gaussian_pdf, position_variance, weighted_position_variance};
use crate::{Covariance, Position};

/// One candidate landmark position with its accumulated likelihood weight.
#[derive(Clone, Debug)]
pub struct LandmarkCandidate {
    pub position: Position,
    pub weight: f64,
}

/// Tuning parameters for a [`LandmarkBootstrapFilter`], normally derived
/// from the `bootstrap_*` fields of [`crate::SlamConfig`].
#[derive(Clone, Debug)]
pub struct BootstrapParams {
    /// Number of candidates M.
    pub num_particles: usize,
    /// Standard deviation of a proximity range measurement.
    pub proximity_std: f64,
    /// Effective-sample-size threshold below which the candidate set is
    /// resampled.
    pub effective_particle_threshold: f64,
    /// Number of fresh candidates injected per resample.
    pub num_random_particles: usize,
    /// Promotion gate: all diagonal variances must be below this.
    pub max_variance: f64,
    /// Promotion gate: minimum number of integrated measurements.
    pub min_observations: usize,
}

/// Position-only particle filter for one unconfirmed landmark.
#[derive(Clone, Debug)]
pub struct LandmarkBootstrapFilter {
    params: BootstrapParams,
    candidates: Vec<LandmarkCandidate>,
    measurement_count: usize,
}

impl LandmarkBootstrapFilter {
    pub fn new(params: BootstrapParams) -> Self {
        assert!(params.num_particles > 0, "num_particles must be positive");
        assert!(
            params.num_random_particles < params.num_particles,
            "num_random_particles must be less than num_particles"
        );
        LandmarkBootstrapFilter {
            params,
            candidates: Vec::new(),
            measurement_count: 0,
        }
    }

    /// Number of measurements integrated so far.
    pub fn measurement_count(&self) -> usize {
        self.measurement_count
    }

    /// Current candidate set, mainly for diagnostics and tests.
    pub fn candidates(&self) -> &[LandmarkCandidate] {
        &self.candidates
    }

    /// Integrate one range measurement taken from `user_position`.
    ///
    /// The first measurement seeds the candidate cloud on the measured
    /// circle; later measurements reweight the cloud and trigger a resample
    /// when the effective sample size falls below the threshold.
    pub fn process_proximity_measurement(
        &mut self,
        user_position: &Position,
        distance: f64,
        rng: &mut StdRng,
    ) {
        if self.measurement_count == 0 {
            self.candidates =
                self.random_candidates(self.params.num_particles, user_position, distance, rng);
        } else {
            self.update_weights(user_position, distance);

            let normalized = self.normalized_weights();
            if effective_sample_size(&normalized) < self.params.effective_particle_threshold {
                let keep = self.params.num_particles - self.params.num_random_particles;
                let mut survivors = self.resample(&normalized, keep, rng);
                // Fresh candidates around the current user estimate keep the
                // cloud from collapsing onto a wrong circle intersection.
                survivors.extend(self.random_candidates(
                    self.params.num_random_particles,
                    user_position,
                    distance,
                    rng,
                ));
                self.candidates = survivors;
                tracing::trace!(
                    measurements = self.measurement_count,
                    "bootstrap candidate set resampled"
                );
            }
        }
        self.measurement_count += 1;
    }

    /// Promotion query: the weighted mean position and per-axis variance,
    /// available only once the minimum observation count is reached and
    /// every diagonal variance is below the configured gate. Returns `None`
    /// while the landmark is still unresolved.
    pub fn position_estimate(&self) -> Option<(Position, Covariance)> {
        if self.measurement_count < self.params.min_observations {
            return None;
        }
        // The gate uses the weight-aware variance: the fresh candidates
        // injected on every resample sit on a full measured-radius ring, so
        // the raw cloud spread never collapses even when the posterior has.
        let positions: Vec<Position> = self.candidates.iter().map(|c| c.position).collect();
        let covariance = weighted_position_variance(&positions, &self.normalized_weights());
        if covariance.below_max_variance(self.params.max_variance) {
            Some((self.average_position(), covariance))
        } else {
            None
        }
    }

    /// Per-axis spread of the raw candidate cloud, ignoring weights.
    pub fn candidate_variance(&self) -> Covariance {
        let positions: Vec<Position> = self.candidates.iter().map(|c| c.position).collect();
        position_variance(&positions)
    }

    /// Weighted mean of the candidate cloud.
    fn average_position(&self) -> Position {
        let normalized = self.normalized_weights();
        let mut mean = Position::default();
        for (candidate, weight) in self.candidates.iter().zip(normalized.iter()) {
            mean.x += weight * candidate.position.x;
            mean.y += weight * candidate.position.y;
            mean.z += weight * candidate.position.z;
        }
        mean
    }

    /// Multiply each candidate's weight by the likelihood of the measured
    /// distance given the candidate-to-user range.
    fn update_weights(&mut self, user_position: &Position, distance: f64) {
        for candidate in &mut self.candidates {
            let range = candidate.position.planar_distance(user_position);
            candidate.weight *= gaussian_pdf(distance, range, self.params.proximity_std);
        }
    }

    /// Low-variance resample of the candidate cloud.
    ///
    /// Landmarks do not move, so survivors get a small position jitter
    /// (std/4 per axis) to stand in for a process model; their weights are
    /// reset to 1 so the next measurement starts the likelihood product
    /// afresh.
    fn resample(
        &self,
        normalized_weights: &[f64],
        num_samples: usize,
        rng: &mut StdRng,
    ) -> Vec<LandmarkCandidate> {
        let jitter = Normal::new(0.0, self.params.proximity_std / 4.0).unwrap();
        let indices = low_variance_sampling(normalized_weights, num_samples, rng);
        let mut survivors = Vec::with_capacity(num_samples);
        for index in indices {
            let mut candidate = self.candidates[index].clone();
            candidate.position.x += jitter.sample(rng);
            candidate.position.y += jitter.sample(rng);
            candidate.weight = 1.0;
            survivors.push(candidate);
        }
        survivors
    }

    /// Seed candidates uniformly spaced in angle around `center`, at a
    /// radius drawn from N(mean_radius, proximity_std), all with weight 1.
    fn random_candidates(
        &self,
        count: usize,
        center: &Position,
        mean_radius: f64,
        rng: &mut StdRng,
    ) -> Vec<LandmarkCandidate> {
        let delta_angle = 2.0 * PI / count as f64;
        let radius_noise = Normal::new(0.0, self.params.proximity_std).unwrap();
        let mut candidates = Vec::with_capacity(count);
        for i in 0..count {
            let angle = i as f64 * delta_angle;
            let radius = mean_radius + radius_noise.sample(rng);
            let (dx, dy) = polar_to_cartesian(radius, angle);
            let position = Position::new(center.x + dx, center.y + dy, center.z);
            candidates.push(LandmarkCandidate {
                position,
                weight: 1.0,
            });
        }
        candidates
    }

    fn normalized_weights(&self) -> Vec<f64> {
        let mut weights: Vec<f64> = self.candidates.iter().map(|c| c.weight).collect();
        normalize_weights(&mut weights);
        weights
    }
}

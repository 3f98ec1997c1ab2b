//! The main SLAM particle filter.
//!
//! [`SlamFilter`] owns the particle population, one bootstrap filter per
//! not-yet-confirmed landmark, and the filter-wide random generator. The
//! caller drives the cycle: [`SlamFilter::sample_pose`] on a movement
//! update, [`SlamFilter::observe_proximity`] per range reading,
//! [`SlamFilter::resample`] once all readings for the cycle are in, then
//! the estimate queries.
//!
//! Landmark lifecycle is tracked by a single map of [`LandmarkTrack`]
//! entries: a landmark is either `Initializing` (owned by a bootstrap
//! filter) or `Confirmed` (present in every particle's landmark map).
//! Promotion swaps the map entry and seeds every particle with an identical
//! initial estimate — the one deliberate moment state crosses hypothesis
//! boundaries, since a brand-new landmark has no per-hypothesis history to
//! draw from.

use std::collections::HashMap;

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::bootstrap::{BootstrapParams, LandmarkBootstrapFilter};
use crate::config::SlamConfig;
use crate::error::SlamError;
use crate::particle::Particle;
use crate::sampling::{effective_sample_size, low_variance_sampling, normalize_weights};
use crate::{Landmark, Pose, Position};

/// Lifecycle state of one landmark id.
#[derive(Clone, Debug)]
pub enum LandmarkTrack {
    /// Position still ambiguous; a bootstrap filter is accumulating range
    /// readings.
    Initializing(LandmarkBootstrapFilter),
    /// Promoted: every particle carries its own EKF estimate.
    Confirmed,
}

/// FastSLAM particle filter over user pose and landmark positions.
pub struct SlamFilter {
    config: SlamConfig,
    particles: Vec<Particle>,
    landmark_tracks: HashMap<String, LandmarkTrack>,
    rng: StdRng,
}

impl SlamFilter {
    /// Build a filter from a validated configuration. The population starts
    /// as N identical hypotheses at the identity pose with empty maps.
    ///
    /// When `config.seed` is `None` a fresh seed is drawn, so two filters
    /// built from the same config diverge; fix the seed for reproducible
    /// runs.
    pub fn new(config: SlamConfig) -> Self {
        config.validate();
        let seed = config.seed.unwrap_or_else(rand::random);
        let particles = (0..config.num_particles).map(|_| Particle::new()).collect();
        SlamFilter {
            particles,
            landmark_tracks: HashMap::new(),
            rng: StdRng::seed_from_u64(seed),
            config,
        }
    }

    /// The configuration this filter was built with.
    pub fn config(&self) -> &SlamConfig {
        &self.config
    }

    /// Number of particles N. Fixed at construction.
    pub fn num_particles(&self) -> usize {
        self.particles.len()
    }

    /// Read-only access to the population, mainly for diagnostics and tests.
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Ids of all landmarks promoted to EKF tracking.
    pub fn confirmed_landmarks(&self) -> Vec<&str> {
        self.landmark_tracks
            .iter()
            .filter_map(|(id, track)| match track {
                LandmarkTrack::Confirmed => Some(id.as_str()),
                LandmarkTrack::Initializing(_) => None,
            })
            .collect()
    }

    /// True once `id` has been promoted to per-particle EKF tracking.
    pub fn is_confirmed(&self, id: &str) -> bool {
        matches!(
            self.landmark_tracks.get(id),
            Some(LandmarkTrack::Confirmed)
        )
    }

    /// Effective sample size of the current population.
    pub fn effective_sample_size(&self) -> f64 {
        effective_sample_size(&self.normalized_weights())
    }

    /// Motion update: every particle samples a new pose from the movement
    /// delta and heading, with independent Gaussian process noise.
    pub fn sample_pose(&mut self, movement: (f64, f64), heading: f64) {
        for particle in &mut self.particles {
            particle.sample_pose(
                movement,
                heading,
                self.config.step_std,
                self.config.heading_std,
                &mut self.rng,
            );
        }
    }

    /// Integrate one proximity reading for landmark `id`.
    ///
    /// Unconfirmed landmarks are routed to their bootstrap filter (created
    /// on first sight) and promoted the moment the bootstrap gate opens.
    /// Confirmed landmarks go through every particle's EKF, which also
    /// reweights the population.
    ///
    /// `moved` reports that the beacon was physically relocated. The
    /// transition back to re-initialization is accepted but intentionally
    /// not implemented; the flag is logged and otherwise ignored.
    pub fn observe_proximity(
        &mut self,
        id: &str,
        name: &str,
        distance: f64,
        moved: bool,
    ) -> Result<(), SlamError> {
        if moved {
            tracing::debug!(id, "landmark reported moved; flag is currently a no-op");
        }

        if self.is_confirmed(id) {
            for particle in &mut self.particles {
                particle.process_proximity(id, distance, self.config.measurement_variance)?;
            }
            return Ok(());
        }

        // Bootstrap path. The user estimate is computed up front because the
        // bootstrap filter weighs candidates against it.
        let user_estimate = self.user_position_estimate();
        let params = self.bootstrap_params();
        let track = self
            .landmark_tracks
            .entry(id.to_string())
            .or_insert_with(|| {
                tracing::debug!(id, name, "new landmark sighted, starting bootstrap filter");
                LandmarkTrack::Initializing(LandmarkBootstrapFilter::new(params))
            });
        let LandmarkTrack::Initializing(bootstrap) = track else {
            // is_confirmed() returned false above.
            unreachable!("confirmed landmark reached the bootstrap path");
        };
        bootstrap.process_proximity_measurement(&user_estimate, distance, &mut self.rng);

        if let Some((position, covariance)) = bootstrap.position_estimate() {
            let landmark = Landmark::new(position, covariance, name);
            for particle in &mut self.particles {
                particle.add_landmark(id, landmark.clone());
            }
            self.landmark_tracks
                .insert(id.to_string(), LandmarkTrack::Confirmed);
            tracing::debug!(
                id,
                name,
                x = position.x,
                y = position.y,
                "landmark promoted to per-particle EKF tracking"
            );
        }
        Ok(())
    }

    /// Resample the population by low-variance sampling when the effective
    /// sample size has dropped below the configured threshold; otherwise
    /// leave the population (and its weights) untouched.
    ///
    /// Selected particles are deep-cloned so no landmark map is shared
    /// between survivors, and clone weights are reset to uniform. The
    /// population size is exactly N afterwards in either case.
    pub fn resample(&mut self) {
        let normalized = self.normalized_weights();
        let ess = effective_sample_size(&normalized);
        if ess >= self.config.effective_particle_threshold {
            return;
        }

        let indices = low_variance_sampling(&normalized, self.config.num_particles, &mut self.rng);
        let mut next_generation = Vec::with_capacity(self.config.num_particles);
        for index in indices {
            let mut clone = self.particles[index].clone();
            clone.reset_weight();
            next_generation.push(clone);
        }
        self.particles = next_generation;
        tracing::debug!(
            effective_sample_size = ess,
            "population degenerate, resampled"
        );
    }

    /// Weighted mean of the particle positions.
    pub fn user_position_estimate(&self) -> Position {
        let normalized = self.normalized_weights();
        let mut estimate = Position::default();
        for (particle, weight) in self.particles.iter().zip(normalized.iter()) {
            estimate.x += weight * particle.pose.position.x;
            estimate.y += weight * particle.pose.position.y;
            estimate.z += weight * particle.pose.position.z;
        }
        estimate
    }

    /// Weighted mean pose: position as in [`Self::user_position_estimate`],
    /// heading as the weighted circular mean of the particle headings.
    pub fn user_pose_estimate(&self) -> Pose {
        let normalized = self.normalized_weights();
        let mut sin_sum = 0.0;
        let mut cos_sum = 0.0;
        for (particle, weight) in self.particles.iter().zip(normalized.iter()) {
            sin_sum += weight * particle.pose.heading.sin();
            cos_sum += weight * particle.pose.heading.cos();
        }
        Pose::new(self.user_position_estimate(), sin_sum.atan2(cos_sum))
    }

    /// Weighted mean estimate per confirmed landmark: position and
    /// covariance averaged over the population, keyed by landmark id.
    pub fn landmark_estimates(&self) -> HashMap<String, Landmark> {
        let normalized = self.normalized_weights();
        let mut estimates: HashMap<String, Landmark> = HashMap::new();

        for (particle, &weight) in self.particles.iter().zip(normalized.iter()) {
            for (id, landmark) in &particle.landmarks {
                let entry = estimates.entry(id.clone()).or_insert_with(|| Landmark {
                    name: landmark.name.clone(),
                    ..Landmark::default()
                });
                entry.position.x += weight * landmark.position.x;
                entry.position.y += weight * landmark.position.y;
                entry.position.z += weight * landmark.position.z;
                entry.covariance.x.x += weight * landmark.covariance.x.x;
                entry.covariance.x.y += weight * landmark.covariance.x.y;
                entry.covariance.y.x += weight * landmark.covariance.y.x;
                entry.covariance.y.y += weight * landmark.covariance.y.y;
                entry.covariance.z.z += weight * landmark.covariance.z.z;
            }
        }
        estimates
    }

    fn normalized_weights(&self) -> Vec<f64> {
        let mut weights: Vec<f64> = self.particles.iter().map(|p| p.weight).collect();
        normalize_weights(&mut weights);
        weights
    }

    fn bootstrap_params(&self) -> BootstrapParams {
        BootstrapParams {
            num_particles: self.config.bootstrap_num_particles,
            proximity_std: self.config.proximity_std,
            effective_particle_threshold: self.config.bootstrap_effective_particle_threshold,
            num_random_particles: self.config.bootstrap_num_random_particles,
            max_variance: self.config.bootstrap_max_variance,
            min_observations: self.config.bootstrap_min_observations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn seeded_config(num_particles: usize, seed: u64) -> SlamConfig {
        SlamConfig {
            num_particles,
            effective_particle_threshold: num_particles as f64 / 1.5,
            seed: Some(seed),
            ..Default::default()
        }
    }

    #[test]
    fn test_new_filter_population() {
        let filter = SlamFilter::new(seeded_config(25, 1));
        assert_eq!(filter.num_particles(), 25);
        assert!(filter.confirmed_landmarks().is_empty());
        // Uniform initial weights: full effective sample size.
        assert_approx_eq!(filter.effective_sample_size(), 25.0, 1e-9);
    }

    #[test]
    fn test_sample_pose_moves_estimate() {
        let mut filter = SlamFilter::new(seeded_config(200, 2));
        for _ in 0..10 {
            filter.sample_pose((1.0, 0.5), 0.3);
        }
        let estimate = filter.user_position_estimate();
        // 10 steps of (1.0, 0.5); noise averages out over 200 particles.
        assert!((estimate.x - 10.0).abs() < 0.5, "x = {}", estimate.x);
        assert!((estimate.y - 5.0).abs() < 0.5, "y = {}", estimate.y);

        let pose = filter.user_pose_estimate();
        assert!((pose.heading - 0.3).abs() < 0.1);
    }

    #[test]
    fn test_resample_preserves_population_size() {
        let mut filter = SlamFilter::new(seeded_config(50, 3));
        // Uniform weights: resampling is skipped.
        filter.resample();
        assert_eq!(filter.num_particles(), 50);

        // Force degeneracy: one dominant particle.
        for particle in &mut filter.particles {
            particle.weight = 1e-12;
        }
        filter.particles[7].weight = 1.0;
        filter.resample();
        assert_eq!(filter.num_particles(), 50);
        // Post-resample weights are uniform again.
        assert_approx_eq!(filter.effective_sample_size(), 50.0, 1e-6);
    }

    #[test]
    fn test_resample_selects_dominant_particle() {
        let mut filter = SlamFilter::new(seeded_config(50, 4));
        for particle in &mut filter.particles {
            particle.pose.position.x = -100.0;
            particle.weight = 1e-12;
        }
        filter.particles[11].pose.position.x = 42.0;
        filter.particles[11].weight = 1.0;
        filter.resample();
        // Every survivor must descend from the dominant hypothesis.
        for particle in filter.particles() {
            assert_approx_eq!(particle.pose.position.x, 42.0, 1e-9);
        }
    }

    #[test]
    fn test_unconfirmed_landmark_not_in_estimates() {
        let mut filter = SlamFilter::new(seeded_config(20, 5));
        filter
            .observe_proximity("beacon-1", "Beacon 1", 4.0, false)
            .unwrap();
        assert!(!filter.is_confirmed("beacon-1"));
        assert!(filter.landmark_estimates().is_empty());
    }

    #[test]
    fn test_moved_flag_is_a_no_op() {
        let mut filter = SlamFilter::new(seeded_config(20, 6));
        filter
            .observe_proximity("beacon-1", "Beacon 1", 4.0, false)
            .unwrap();
        let count_before = match filter.landmark_tracks.get("beacon-1") {
            Some(LandmarkTrack::Initializing(bootstrap)) => bootstrap.measurement_count(),
            _ => panic!("expected bootstrap track"),
        };
        filter
            .observe_proximity("beacon-1", "Beacon 1", 4.0, true)
            .unwrap();
        let count_after = match filter.landmark_tracks.get("beacon-1") {
            Some(LandmarkTrack::Initializing(bootstrap)) => bootstrap.measurement_count(),
            _ => panic!("expected bootstrap track"),
        };
        // The moved flag must not reset the bootstrap filter.
        assert_eq!(count_after, count_before + 1);
    }

    #[test]
    fn test_same_seed_reproduces_run() {
        let run = |seed: u64| {
            let mut filter = SlamFilter::new(seeded_config(30, seed));
            for i in 0..5 {
                filter.sample_pose((0.5, 0.1), 0.05 * i as f64);
                filter
                    .observe_proximity("beacon-1", "Beacon 1", 3.0 + 0.1 * i as f64, false)
                    .unwrap();
                filter.resample();
            }
            filter.user_position_estimate()
        };
        let a = run(99);
        let b = run(99);
        assert_approx_eq!(a.x, b.x, 1e-12);
        assert_approx_eq!(a.y, b.y, 1e-12);
    }
}

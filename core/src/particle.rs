//! A single SLAM hypothesis: user pose, landmark map, and importance weight.
//!
//! Each particle owns its landmark map outright. Estimates never alias
//! across particles; resampling clones whole particles so that one
//! hypothesis correcting a landmark cannot bleed into another.

use std::collections::HashMap;

use nalgebra::{Matrix2, Vector2};
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

use crate::angles::wrap_to_pi;
use crate::error::SlamError;
use crate::stats::gaussian_pdf;
use crate::{Landmark, Pose};

/// Floor for the predicted user-to-landmark distance. Keeps the Jacobian
/// finite when a hypothesis walks on top of a landmark.
pub const MIN_PREDICTED_DISTANCE: f64 = 1e-3;

/// One weighted (pose, landmark map) hypothesis.
#[derive(Clone, Debug)]
pub struct Particle {
    pub weight: f64,
    pub pose: Pose,
    pub landmarks: HashMap<String, Landmark>,
}

impl Default for Particle {
    fn default() -> Self {
        Particle::new()
    }
}

impl Particle {
    /// A fresh hypothesis: weight 1, identity pose, empty map.
    pub fn new() -> Self {
        Particle {
            weight: 1.0,
            pose: Pose::default(),
            landmarks: HashMap::new(),
        }
    }

    /// Insert a confirmed landmark estimate into this particle's map.
    pub fn add_landmark(&mut self, id: impl Into<String>, landmark: Landmark) {
        self.landmarks.insert(id.into(), landmark);
    }

    /// Motion update: integrate a movement delta and adopt a new heading,
    /// both perturbed by Gaussian process noise.
    ///
    /// The movement is added to the current position (integration, not
    /// replacement); the heading replaces the previous one. Noise is drawn
    /// independently per particle so the population spreads and subsequent
    /// reweighting has hypotheses to discriminate between.
    pub fn sample_pose(
        &mut self,
        movement: (f64, f64),
        heading: f64,
        step_std: f64,
        heading_std: f64,
        rng: &mut StdRng,
    ) {
        let normal = Normal::new(0.0, 1.0).unwrap();
        let (dx, dy) = movement;
        self.pose.position.x += dx + step_std * normal.sample(rng);
        self.pose.position.y += dy + step_std * normal.sample(rng);
        self.pose.heading = wrap_to_pi(heading + heading_std * normal.sample(rng));
    }

    /// EKF update of one confirmed landmark from a measured range, followed
    /// by the importance-weight update.
    ///
    /// The observation model is the planar distance from this particle's
    /// pose to the landmark estimate, linearized in the landmark position:
    /// `H = (-dx/d, -dy/d)` with `d` the predicted distance. The Kalman
    /// correction moves the landmark along the range residual, shrinks its
    /// covariance, and scales the particle weight by the Gaussian likelihood
    /// of the innovation.
    ///
    /// Returns [`SlamError::UnknownLandmark`] when `id` is not in this
    /// particle's map; the caller promised it was confirmed, so a miss is a
    /// bookkeeping inconsistency, not a condition to paper over.
    pub fn process_proximity(
        &mut self,
        id: &str,
        distance: f64,
        measurement_variance: f64,
    ) -> Result<(), SlamError> {
        let landmark = self
            .landmarks
            .get_mut(id)
            .ok_or_else(|| SlamError::UnknownLandmark { id: id.to_string() })?;

        let dx = self.pose.position.x - landmark.position.x;
        let dy = self.pose.position.y - landmark.position.y;
        let predicted_distance = (dx * dx + dy * dy).sqrt().max(MIN_PREDICTED_DISTANCE);

        let innovation = distance - predicted_distance;
        let jacobian = Vector2::new(-dx / predicted_distance, -dy / predicted_distance);

        // Planar block of the landmark covariance.
        let covariance = Matrix2::new(
            landmark.covariance.x.x,
            landmark.covariance.x.y,
            landmark.covariance.y.x,
            landmark.covariance.y.y,
        );

        // Innovation covariance: S = H C H^T + R.
        let cov_h = covariance * jacobian;
        let innovation_covariance = jacobian.dot(&cov_h) + measurement_variance;

        // Kalman gain K = C H^T / S.
        let gain = cov_h / innovation_covariance;

        landmark.position.x += gain.x * innovation;
        landmark.position.y += gain.y * innovation;

        // Covariance correction: C -= K S K^T, applied symmetrically.
        let decrement = gain * gain.transpose() * innovation_covariance;
        landmark.covariance.x.x -= decrement[(0, 0)];
        landmark.covariance.x.y -= decrement[(0, 1)];
        landmark.covariance.y.x -= decrement[(1, 0)];
        landmark.covariance.y.y -= decrement[(1, 1)];

        debug_assert!(
            landmark.covariance.x.x >= -1e-9 && landmark.covariance.y.y >= -1e-9,
            "landmark covariance diagonal went negative for `{id}`"
        );

        self.weight *= gaussian_pdf(distance, predicted_distance, innovation_covariance.sqrt());
        Ok(())
    }

    pub fn reset_weight(&mut self) {
        self.weight = 1.0;
    }
}

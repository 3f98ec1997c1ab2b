//! Range-only FastSLAM core for proximity-beacon indoor localization
//!
//! This crate implements the estimation core of a simultaneous localization
//! and mapping (SLAM) system driven by range-only proximity readings, such as
//! the RSSI-derived distances reported by BLE beacons. The transport layer
//! that produces those readings, and the platform glue around it, are
//! deliberately out of scope: the crate consumes exactly two inputs — a
//! planar movement/heading delta for the user, and a `(landmark id, measured
//! distance)` pair — and produces two outputs — a best-estimate user pose and
//! a map of landmark id to estimated position with uncertainty.
//!
//! The estimator is a Rao-Blackwellized particle filter in the FastSLAM
//! style. Each particle carries a full hypothesis: a candidate user pose plus
//! its own map of landmark estimates, each tracked by an independent
//! two-dimensional extended Kalman filter. Because a single range reading
//! constrains a landmark to a circle rather than a point, a landmark cannot
//! be handed to an EKF on first contact; instead every not-yet-resolved
//! landmark is estimated by a dedicated bootstrap particle filter
//! ([`bootstrap::LandmarkBootstrapFilter`]) until its position variance drops
//! below a configured gate, at which point the landmark is promoted into
//! every particle's map and tracked by EKF updates from then on.
//!
//! The update cycle, driven entirely by the caller:
//!
//! 1. [`filter::SlamFilter::sample_pose`] — propagate every particle's pose
//!    from the movement/heading input plus Gaussian process noise.
//! 2. [`filter::SlamFilter::observe_proximity`] — integrate one range
//!    reading, routed to either the bootstrap filter or the per-particle
//!    EKFs.
//! 3. [`filter::SlamFilter::resample`] — resample the population when the
//!    effective sample size indicates weight degeneracy.
//! 4. [`filter::SlamFilter::user_position_estimate`] /
//!    [`filter::SlamFilter::landmark_estimates`] — query weighted estimates.
//!
//! Everything runs synchronously on the caller's thread; the filter owns a
//! single seeded random generator, so a fixed [`config::SlamConfig::seed`]
//! reproduces a run exactly.
//!
//! Primarily built off of two crate dependencies:
//! - [`nalgebra`](https://crates.io/crates/nalgebra): linear algebra for the
//!   planar EKF update.
//! - [`rand`](https://crates.io/crates/rand) /
//!   [`rand_distr`](https://crates.io/crates/rand_distr): Gaussian and
//!   uniform draws for pose sampling, candidate seeding, and resampling.
//!
//! This module defines the plain data types shared across the crate:
//! positions, covariances, poses, and confirmed landmark estimates.

pub mod angles;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod filter;
pub mod particle;
pub mod sampling;
pub mod stats;

pub use config::SlamConfig;
pub use error::SlamError;
pub use filter::SlamFilter;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// A point in the map frame. The filter itself is planar; `z` is carried
/// through estimates unchanged so that callers with floor information can
/// attach it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Position { x, y, z }
    }

    /// Euclidean distance to another position, in the x-y plane only.
    pub fn planar_distance(&self, other: &Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn add(&mut self, other: &Position) {
        self.x += other.x;
        self.y += other.y;
        self.z += other.z;
    }

    pub fn scale(&mut self, factor: f64) {
        self.x *= factor;
        self.y *= factor;
        self.z *= factor;
    }
}

impl From<Vector3<f64>> for Position {
    fn from(v: Vector3<f64>) -> Self {
        Position::new(v.x, v.y, v.z)
    }
}

impl From<Position> for Vector3<f64> {
    fn from(p: Position) -> Self {
        Vector3::new(p.x, p.y, p.z)
    }
}

/// A symmetric 3x3 covariance stored as three rows. The EKF only touches the
/// upper-left planar block; the `z` row exists so landmark estimates round
/// out to the same dimensionality as positions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Covariance {
    pub x: Position,
    pub y: Position,
    pub z: Position,
}

impl Covariance {
    /// Diagonal covariance from per-axis variances.
    pub fn from_diagonal(var_x: f64, var_y: f64, var_z: f64) -> Self {
        let mut covariance = Covariance::default();
        covariance.x.x = var_x;
        covariance.y.y = var_y;
        covariance.z.z = var_z;
        covariance
    }

    /// The three diagonal entries (the per-axis variances).
    pub fn diagonal(&self) -> (f64, f64, f64) {
        (self.x.x, self.y.y, self.z.z)
    }

    /// True when every diagonal entry is strictly below `max_variance`.
    pub fn below_max_variance(&self, max_variance: f64) -> bool {
        self.x.x < max_variance && self.y.y < max_variance && self.z.z < max_variance
    }
}

/// A user pose hypothesis: planar position plus heading in radians.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Position,
    pub heading: f64,
}

impl Pose {
    pub fn new(position: Position, heading: f64) -> Self {
        Pose { position, heading }
    }
}

/// A confirmed landmark estimate: position, covariance, and the
/// human-readable name reported alongside the landmark id.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub position: Position,
    pub covariance: Covariance,
    pub name: String,
}

impl Landmark {
    pub fn new(position: Position, covariance: Covariance, name: impl Into<String>) -> Self {
        Landmark {
            position,
            covariance,
            name: name.into(),
        }
    }
}

//! Filter configuration.
//!
//! All tuning knobs for the main particle set and the landmark bootstrap
//! filters live in a single [`SlamConfig`] struct so a deployment can be
//! described by one file. Defaults are reasonable for pedestrian-scale
//! indoor tracking with BLE-derived ranges in meters.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

/// Configuration for a [`crate::SlamFilter`] instance.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SlamConfig {
    /// Number of particles N in the main filter. Fixed for the lifetime of
    /// the filter.
    pub num_particles: usize,
    /// Resample the main population when the effective sample size drops
    /// below this value.
    pub effective_particle_threshold: f64,
    /// Standard deviation of the Gaussian noise added to each movement
    /// component during pose sampling (meters).
    pub step_std: f64,
    /// Standard deviation of the Gaussian noise added to the heading during
    /// pose sampling (radians).
    pub heading_std: f64,
    /// Measurement noise variance R used by the per-landmark EKF updates.
    pub measurement_variance: f64,
    /// Standard deviation of a proximity range measurement (meters). Used to
    /// seed and reweight bootstrap candidates.
    pub proximity_std: f64,
    /// Number of candidates M in each landmark bootstrap filter.
    pub bootstrap_num_particles: usize,
    /// Number of fresh uniformly seeded candidates R injected on each
    /// bootstrap resample to keep candidate diversity.
    pub bootstrap_num_random_particles: usize,
    /// Resample a bootstrap filter when its effective sample size drops
    /// below this value.
    pub bootstrap_effective_particle_threshold: f64,
    /// Minimum number of range measurements before a landmark may be
    /// promoted to EKF tracking.
    pub bootstrap_min_observations: usize,
    /// Every diagonal entry of the candidate-position variance must be below
    /// this value before a landmark is promoted.
    pub bootstrap_max_variance: f64,
    /// Seed for the filter's random generator. `None` draws a fresh seed at
    /// construction; set a value for reproducible runs.
    pub seed: Option<u64>,
}

impl Default for SlamConfig {
    fn default() -> Self {
        SlamConfig {
            num_particles: 100,
            effective_particle_threshold: 100.0 / 1.5,
            step_std: 0.15,
            heading_std: 0.1,
            measurement_variance: 2.0,
            proximity_std: 0.3,
            bootstrap_num_particles: 50,
            bootstrap_num_random_particles: 5,
            bootstrap_effective_particle_threshold: 50.0 / 1.5,
            bootstrap_min_observations: 10,
            bootstrap_max_variance: 0.5,
            seed: None,
        }
    }
}

impl SlamConfig {
    /// Panic if the configuration is internally inconsistent. Called by the
    /// filter constructor; exposed so callers can validate a loaded file
    /// early.
    pub fn validate(&self) {
        assert!(self.num_particles > 0, "num_particles must be positive");
        assert!(
            self.bootstrap_num_particles > 0,
            "bootstrap_num_particles must be positive"
        );
        assert!(
            self.bootstrap_num_random_particles < self.bootstrap_num_particles,
            "bootstrap_num_random_particles must be less than bootstrap_num_particles"
        );
        assert!(self.step_std >= 0.0, "step_std must be non-negative");
        assert!(self.heading_std >= 0.0, "heading_std must be non-negative");
        assert!(
            self.proximity_std > 0.0,
            "proximity_std must be positive"
        );
        assert!(
            self.measurement_variance > 0.0,
            "measurement_variance must be positive"
        );
        assert!(
            self.bootstrap_max_variance > 0.0,
            "bootstrap_max_variance must be positive"
        );
    }

    /// Write the configuration to a JSON file (pretty-printed).
    pub fn to_json<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self).map_err(io::Error::other)
    }

    /// Read the configuration from a JSON file.
    pub fn from_json<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = File::open(path)?;
        serde_json::from_reader(file).map_err(io::Error::other)
    }

    /// Write the configuration as YAML.
    pub fn to_yaml<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let mut file = File::create(path)?;
        let s = serde_yaml::to_string(self).map_err(io::Error::other)?;
        file.write_all(s.as_bytes())
    }

    /// Read the configuration from YAML.
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = File::open(path)?;
        serde_yaml::from_reader(file).map_err(io::Error::other)
    }

    /// Write the configuration as TOML.
    pub fn to_toml<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let mut file = File::create(path)?;
        let s = toml::to_string(self).map_err(io::Error::other)?;
        file.write_all(s.as_bytes())
    }

    /// Read the configuration from TOML.
    pub fn from_toml<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let mut s = String::new();
        let mut file = File::open(path)?;
        file.read_to_string(&mut s)?;
        toml::from_str(&s).map_err(io::Error::other)
    }

    /// Generic write: choose format by file extension (.json/.yaml/.yml/.toml).
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let p = path.as_ref();
        let ext = p
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_lowercase());
        match ext.as_deref() {
            Some("json") => self.to_json(p),
            Some("yaml") | Some("yml") => self.to_yaml(p),
            Some("toml") => self.to_toml(p),
            _ => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "unsupported file extension",
            )),
        }
    }

    /// Generic read: choose format by file extension (.json/.yaml/.yml/.toml).
    pub fn from_file<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let p = path.as_ref();
        let ext = p
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_lowercase());
        match ext.as_deref() {
            Some("json") => Self::from_json(p),
            Some("yaml") | Some("yml") => Self::from_yaml(p),
            Some("toml") => Self::from_toml(p),
            _ => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "unsupported file extension",
            )),
        }
    }
}

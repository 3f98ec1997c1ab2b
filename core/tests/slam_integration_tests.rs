//! End-to-end scenarios for the range-only FastSLAM filter.
//!
//! These tests drive full update cycles (pose sampling, proximity
//! observation, resampling) against a known ground truth and check that the
//! filter discovers, promotes, and refines landmarks while tracking the
//! user. All scenarios use fixed seeds so failures reproduce.

use fastslam::{Position, SlamConfig, SlamFilter};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

/// Waypoints of a square walk that gives the range-only filter geometric
/// diversity around the landmark under test.
fn square_path_step(cycle: usize) -> (f64, f64) {
    // 6 m legs of 2 m steps: 3 east, 3 north, 3 west, 3 south, repeat.
    match (cycle / 3) % 4 {
        0 => (2.0, 0.0),
        1 => (0.0, 2.0),
        2 => (-2.0, 0.0),
        _ => (0.0, -2.0),
    }
}

fn heading_of(step: (f64, f64)) -> f64 {
    step.1.atan2(step.0)
}

#[test]
fn test_end_to_end_single_landmark_slam() {
    let landmark_truth = Position::new(10.0, 0.0, 0.0);
    let min_observations = 10;

    let config = SlamConfig {
        num_particles: 100,
        effective_particle_threshold: 100.0 / 1.5,
        bootstrap_min_observations: min_observations,
        seed: Some(1234),
        ..Default::default()
    };
    let mut filter = SlamFilter::new(config);

    let mut measurement_rng = StdRng::seed_from_u64(5678);
    let measurement_noise = Normal::new(0.0, 0.05).unwrap();

    let mut true_position = Position::new(0.0, 0.0, 0.0);
    let mut observations = 0;
    let mut confirmed_at = None;

    for cycle in 0..60 {
        let step = square_path_step(cycle);
        true_position.x += step.0;
        true_position.y += step.1;
        filter.sample_pose(step, heading_of(step));

        let true_range = true_position.planar_distance(&landmark_truth);
        let measured = true_range + measurement_noise.sample(&mut measurement_rng);
        filter
            .observe_proximity("beacon-1", "Entrance beacon", measured, false)
            .unwrap();
        observations += 1;

        if filter.is_confirmed("beacon-1") && confirmed_at.is_none() {
            confirmed_at = Some(observations);
        }
        // The promotion gate must hold back early, ambiguous estimates.
        if observations < min_observations {
            assert!(
                !filter.is_confirmed("beacon-1"),
                "confirmed after only {observations} observations"
            );
        }

        filter.resample();
        assert_eq!(filter.num_particles(), 100);
    }

    let confirmed_at = confirmed_at.expect("landmark never promoted in 60 cycles");
    assert!(confirmed_at >= min_observations);

    let estimates = filter.landmark_estimates();
    let estimate = estimates
        .get("beacon-1")
        .expect("confirmed landmark missing from estimates");
    assert_eq!(estimate.name, "Entrance beacon");
    let error = estimate.position.planar_distance(&landmark_truth);
    assert!(error < 1.5, "landmark error {error} m");
}

#[test]
fn test_user_tracking_stays_bounded() {
    let config = SlamConfig {
        num_particles: 100,
        seed: Some(42),
        ..Default::default()
    };
    let mut filter = SlamFilter::new(config);

    let mut true_position = Position::new(0.0, 0.0, 0.0);
    for cycle in 0..40 {
        let step = square_path_step(cycle);
        true_position.x += step.0;
        true_position.y += step.1;
        filter.sample_pose(step, heading_of(step));
    }

    // With no observations the weights stay uniform, so the estimate is the
    // dead-reckoned mean; it must stay near the true track because the
    // process noise is zero-mean.
    let estimate = filter.user_position_estimate();
    let error = estimate.planar_distance(&true_position);
    assert!(error < 1.0, "dead-reckoning drift {error} m");
}

#[test]
fn test_two_landmarks_promote_independently() {
    let landmark_a = Position::new(6.0, 2.0, 0.0);
    let landmark_b = Position::new(-2.0, 8.0, 0.0);

    let config = SlamConfig {
        num_particles: 100,
        seed: Some(7),
        ..Default::default()
    };
    let mut filter = SlamFilter::new(config);

    let mut measurement_rng = StdRng::seed_from_u64(11);
    let noise = Normal::new(0.0, 0.05).unwrap();

    let mut true_position = Position::new(0.0, 0.0, 0.0);
    for cycle in 0..80 {
        let step = square_path_step(cycle);
        true_position.x += step.0;
        true_position.y += step.1;
        filter.sample_pose(step, heading_of(step));

        for (id, name, truth) in [
            ("beacon-a", "Beacon A", &landmark_a),
            ("beacon-b", "Beacon B", &landmark_b),
        ] {
            let measured =
                true_position.planar_distance(truth) + noise.sample(&mut measurement_rng);
            filter.observe_proximity(id, name, measured, false).unwrap();
        }
        filter.resample();
    }

    assert!(filter.is_confirmed("beacon-a"));
    assert!(filter.is_confirmed("beacon-b"));

    let estimates = filter.landmark_estimates();
    assert_eq!(estimates.len(), 2);
    assert!(estimates["beacon-a"].position.planar_distance(&landmark_a) < 1.5);
    assert!(estimates["beacon-b"].position.planar_distance(&landmark_b) < 1.5);
}

#[test]
fn test_population_size_invariant_under_forced_degeneracy() {
    let config = SlamConfig {
        num_particles: 64,
        seed: Some(3),
        ..Default::default()
    };
    let mut filter = SlamFilter::new(config);

    let mut true_position = Position::new(0.0, 0.0, 0.0);
    let landmark_truth = Position::new(4.0, 4.0, 0.0);
    for cycle in 0..50 {
        let step = square_path_step(cycle);
        true_position.x += step.0;
        true_position.y += step.1;
        filter.sample_pose(step, heading_of(step));
        let range = true_position.planar_distance(&landmark_truth);
        filter
            .observe_proximity("beacon-1", "Beacon 1", range, false)
            .unwrap();
        filter.resample();
        assert_eq!(filter.num_particles(), 64);
    }
}

#[test]
fn test_estimates_survive_config_round_trip() {
    // A config written to disk and reloaded must drive an identical run.
    let dir = std::env::temp_dir();
    let path = dir.join("fastslam_integration_config.toml");
    let config = SlamConfig {
        num_particles: 40,
        seed: Some(77),
        ..Default::default()
    };
    config.to_file(&path).unwrap();
    let reloaded = SlamConfig::from_file(&path).unwrap();
    std::fs::remove_file(&path).ok();

    let run = |config: SlamConfig| {
        let mut filter = SlamFilter::new(config);
        for cycle in 0..10 {
            let step = square_path_step(cycle);
            filter.sample_pose(step, heading_of(step));
            filter
                .observe_proximity("beacon-1", "Beacon 1", 5.0, false)
                .unwrap();
            filter.resample();
        }
        filter.user_position_estimate()
    };

    let a = run(config);
    let b = run(reloaded);
    assert_eq!(a, b);
}

//! End-to-end flight tests: keyframes to flight file to projected galaxies.

use approx::assert_relative_eq;
use flightpath::camera::{CameraPathBuilder, InterpolationMode, DEFAULT_SMOOTHING};
use flightpath::config::FlightConfig;
use flightpath::flight_file::FlightFile;
use flightpath::keyframe::KeyframeSequence;
use flightpath::storyboard::Storyboard;
use flightpath::{GalaxyCatalog, GalaxyRecord, ScaleFactorTable, SnapshotInterpolator};
use nalgebra::Vector3;

fn galaxy(id: i64, snapshot: i64, mass_dm: f64, position: [f64; 3], descendant: i64) -> GalaxyRecord {
    GalaxyRecord::new(
        id,
        snapshot,
        mass_dm,
        Vector3::new(position[0], position[1], position[2]),
        descendant,
        0.0,
    )
}

/// One galaxy sitting at the origin from snapshot 19 to 21, a light
/// companion that never passes the mass floor, and a galaxy drifting
/// along x.
fn catalog() -> GalaxyCatalog {
    GalaxyCatalog::new(vec![
        galaxy(1, 19, 1e11, [0.0, 0.0, 0.0], 2),
        galaxy(2, 20, 1e11, [0.0, 0.0, 0.0], 3),
        galaxy(3, 21, 1e11, [0.0, 0.0, 0.0], 4),
        galaxy(10, 19, 1e8, [0.1, 0.0, 0.0], 11),
        galaxy(11, 20, 1e8, [0.1, 0.0, 0.0], 12),
        galaxy(20, 19, 5e10, [0.0, 0.0, 0.0], 21),
        galaxy(21, 20, 5e10, [10.0, 0.0, 0.0], 22),
    ])
}

/// Orbit the origin at radius 5 and height 1 while the universe ages from
/// snapshot 19 to snapshot 20.
fn keyframes() -> KeyframeSequence {
    KeyframeSequence::from_rows(&[[
        0.0, 20.0, 0.50, 0.54, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.05, 5.0, 0.0, 0.0, 1.0,
    ]])
    .unwrap()
}

#[test]
fn test_midpoint_between_snapshots() {
    let interpolator = SnapshotInterpolator::default();
    let galaxies = interpolator.interpolate(0.52, &catalog()).unwrap();

    let drifting = galaxies.iter().find(|g| g.id == 20).unwrap();
    assert_relative_eq!(drifting.position, Vector3::new(5.0, 0.0, 0.0), epsilon = 1e-9);

    // The light companion is below the mass floor
    assert!(galaxies.iter().all(|g| g.id != 10));
}

#[test]
fn test_snapshot_frames_match_catalog() {
    let table = ScaleFactorTable::new();
    let interpolator = SnapshotInterpolator::default();
    let galaxies = interpolator
        .interpolate(table.scale_factor(19).unwrap(), &catalog())
        .unwrap();

    let ids: Vec<i64> = galaxies.iter().map(|g| g.id).collect();
    assert_eq!(ids, vec![1, 20]);
    assert_eq!(galaxies[1].position, Vector3::zeros());
}

#[test]
fn test_flight_round_trip_and_storyboard() {
    let dir = tempfile::tempdir().unwrap();
    let keyframe_path = dir.path().join("keyframes.json");
    let flight_path = dir.path().join("flight.txt");

    keyframes().save_to_file(&keyframe_path).unwrap();
    let sequence = KeyframeSequence::load_from_file(&keyframe_path).unwrap();

    let config = FlightConfig::default();
    let trajectory = config.path_builder().build(&sequence, None).unwrap();
    assert_eq!(trajectory.len(), 21);
    assert!(trajectory.max_orthonormality_error() < 1e-6);

    FlightFile::new(config.simulation_label.clone(), trajectory.clone())
        .save(&flight_path)
        .unwrap();
    let flight = FlightFile::load(&flight_path).unwrap();
    assert_eq!(flight.header, "RefL0025N0376");
    assert_eq!(flight.trajectory.len(), trajectory.len());
    assert!(flight.trajectory.max_orthonormality_error() < 1e-4);

    let summary = flight.trajectory.summary().unwrap();
    assert_eq!((summary.first_frame, summary.last_frame), (0, 20));
    assert_relative_eq!(summary.min_scale_factor, 0.50, epsilon = 1e-12);
    assert_relative_eq!(summary.max_scale_factor, 0.54, epsilon = 1e-12);

    let views = Storyboard::new(config.interpolator(), config.region)
        .render(&flight.trajectory, &catalog())
        .unwrap();
    assert_eq!(views.len(), 21);

    for (frame, view) in views.iter().enumerate() {
        assert_eq!(view.frame, frame as i64);

        // The orbited galaxy stays dead centre
        let centre = view
            .galaxies
            .iter()
            .find(|g| g.galaxy.position.norm() < 1e-9 && g.galaxy.mass_dm == 1e11)
            .unwrap_or_else(|| panic!("frame {frame}: centre galaxy missing"));
        assert_relative_eq!(centre.point.x, 0.0, epsilon = 1e-3);
        assert_relative_eq!(centre.point.y, 0.0, epsilon = 1e-3);
        // Depth is the orbit distance, less whatever the spline smooths away
        assert_relative_eq!(centre.point.depth, 26f64.sqrt(), epsilon = 0.1);

        assert!(view.galaxies.iter().all(|g| g.galaxy.mass_dm >= 1e10));
    }

    // Galaxy identity follows the snapshot the frame lands on
    assert_eq!(views[0].galaxies[0].galaxy.id, 1);
    assert_eq!(views[20].galaxies[0].galaxy.id, 2);
}

#[test]
fn test_linear_and_spline_paths_agree_on_samples() {
    let sequence = keyframes();
    let linear = CameraPathBuilder::new(InterpolationMode::Linear, DEFAULT_SMOOTHING)
        .build(&sequence, None)
        .unwrap();
    let spline = CameraPathBuilder::default().build(&sequence, None).unwrap();

    assert_eq!(linear.len(), spline.len());
    for (a, b) in linear.iter().zip(spline.iter()) {
        assert_eq!(a.frame, b.frame);
        // Smoothing pulls the spline slightly inside the orbit
        assert!((a.position - b.position).norm() < 0.5);
        assert_relative_eq!(a.scale_factor, b.scale_factor, epsilon = 1e-12);
    }
}

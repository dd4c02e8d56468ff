//! Camera flight paths through cosmological simulation boxes
//!
//! This crate turns a handful of authored keyframes into a smooth per-frame
//! camera trajectory, stores it as a flight file, and projects catalog
//! galaxies (placed at each frame's scale factor) into the camera's view.
//!
//! # Key Modules
//!
//! - [`snapshots`]: snapshot scale factor table and bracketing
//! - [`interpolation`]: galaxy positions between snapshots
//! - [`keyframe`]: authored camera segments and their orbit model
//! - [`camera`]: orthonormal bases, path building and perspective projection
//! - [`flight_file`]: the fixed-column flight-path text format
//! - [`storyboard`]: per-frame projected galaxy sets, evaluated in parallel
//!
//! # Examples
//!
//! ```
//! use flightpath::camera::CameraPathBuilder;
//! use flightpath::keyframe::KeyframeSequence;
//!
//! // Orbit the origin at radius 5, a quarter turn over 20 frames
//! let sequence = KeyframeSequence::from_rows(&[[
//!     0.0, 20.0, 0.5, 0.6, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0785, 5.0, 0.0, 0.0, 1.0,
//! ]])?;
//! let trajectory = CameraPathBuilder::default().build(&sequence, None)?;
//! assert_eq!(trajectory.len(), 21);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod algo;
pub mod camera;
pub mod catalog;
pub mod config;
pub mod flight_file;
pub mod interpolation;
pub mod keyframe;
pub mod shared_args;
pub mod snapshots;
pub mod storyboard;

pub use camera::{CameraBasis, CameraPathBuilder, DenseTrajectory, TrajectoryRecord};
pub use catalog::{GalaxyCatalog, GalaxyRecord};
pub use config::FlightConfig;
pub use flight_file::FlightFile;
pub use interpolation::{InterpolatedGalaxy, SnapshotInterpolator};
pub use keyframe::{Keyframe, KeyframeSequence};
pub use snapshots::ScaleFactorTable;
pub use storyboard::{FrameView, Storyboard};

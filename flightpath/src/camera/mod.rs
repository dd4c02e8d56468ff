//! Camera frames, paths and projection.

pub mod basis;
pub mod path;
pub mod projection;
pub mod trajectory;

pub use basis::{cross_basis, orthonormalise, BasisError, CameraBasis};
pub use path::{CameraPathBuilder, InterpolationMode, PathError, DEFAULT_SMOOTHING};
pub use projection::{
    centre_of_view, project, project_frame, to_camera_space, ProjectedPoint, ProjectionError,
    ViewRegion,
};
pub use trajectory::{DenseTrajectory, TrajectoryRecord, TrajectorySummary};

//! Dense per-frame camera trajectories.

use std::fmt;

use nalgebra::Vector3;

use super::basis::CameraBasis;

/// Camera state for one output frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrajectoryRecord {
    pub frame: i64,
    pub scale_factor: f64,
    pub position: Vector3<f64>,
    pub basis: CameraBasis,
}

/// One record per output frame, in frame order.
///
/// Trajectories are produced whole by the path builder or read whole from a
/// flight file. To change one, regenerate it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DenseTrajectory {
    records: Vec<TrajectoryRecord>,
}

impl DenseTrajectory {
    pub fn new(records: Vec<TrajectoryRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[TrajectoryRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrajectoryRecord> {
        self.records.iter()
    }

    /// Worst orthonormality error over every record's basis.
    pub fn max_orthonormality_error(&self) -> f64 {
        self.records
            .iter()
            .map(|r| r.basis.orthonormality_error())
            .fold(0.0, f64::max)
    }

    pub fn summary(&self) -> Option<TrajectorySummary> {
        let first = self.records.first()?;
        let last = self.records.last()?;

        let (min_sf, max_sf) = self
            .records
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), r| {
                (lo.min(r.scale_factor), hi.max(r.scale_factor))
            });

        let path_length = self
            .records
            .windows(2)
            .map(|w| (w[1].position - w[0].position).norm())
            .sum();

        Some(TrajectorySummary {
            frames: self.records.len(),
            first_frame: first.frame,
            last_frame: last.frame,
            min_scale_factor: min_sf,
            max_scale_factor: max_sf,
            path_length,
            max_orthonormality_error: self.max_orthonormality_error(),
        })
    }
}

impl<'a> IntoIterator for &'a DenseTrajectory {
    type Item = &'a TrajectoryRecord;
    type IntoIter = std::slice::Iter<'a, TrajectoryRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Headline numbers for a trajectory.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrajectorySummary {
    pub frames: usize,
    pub first_frame: i64,
    pub last_frame: i64,
    pub min_scale_factor: f64,
    pub max_scale_factor: f64,
    /// Total distance travelled by the camera
    pub path_length: f64,
    pub max_orthonormality_error: f64,
}

impl fmt::Display for TrajectorySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Frames:        {} ({}..={})",
            self.frames, self.first_frame, self.last_frame
        )?;
        writeln!(
            f,
            "Scale factor:  {:.5} .. {:.5}",
            self.min_scale_factor, self.max_scale_factor
        )?;
        writeln!(f, "Path length:   {:.3}", self.path_length)?;
        write!(
            f,
            "Basis error:   {:.2e}",
            self.max_orthonormality_error
        )
    }
}

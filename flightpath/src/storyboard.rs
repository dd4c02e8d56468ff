//! Per-frame galaxy views along a flight path.
//!
//! For every frame of a trajectory the storyboard places catalog galaxies at
//! the frame's scale factor, moves them into the frame's camera space and
//! projects them. Frames are independent, so they are evaluated in parallel
//! and gathered back in frame order.
//!
//! Drawing the projected points is left to the caller.

use std::io::Write;

use log::{debug, info};
use rayon::prelude::*;
use thiserror::Error;

use crate::camera::{project_frame, DenseTrajectory, ProjectedPoint, ProjectionError, ViewRegion};
use crate::catalog::GalaxyCatalog;
use crate::interpolation::{InterpolatedGalaxy, SnapshotInterpolator};
use crate::snapshots::SnapshotError;

#[derive(Error, Debug)]
pub enum StoryboardError {
    #[error("Frame {frame}: {source}")]
    Snapshot {
        frame: i64,
        #[source]
        source: SnapshotError,
    },

    #[error("Frame {frame}: {source}")]
    Projection {
        frame: i64,
        #[source]
        source: ProjectionError,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A projected point and the galaxy it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedGalaxy {
    pub point: ProjectedPoint,
    pub galaxy: InterpolatedGalaxy,
}

/// Everything visible from the camera on one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameView {
    pub frame: i64,
    pub scale_factor: f64,
    /// Visible galaxies in catalog order
    pub galaxies: Vec<ProjectedGalaxy>,
}

impl FrameView {
    /// Visible galaxies ordered farthest first, for painter's-order drawing.
    pub fn depth_sorted(&self) -> Vec<&ProjectedGalaxy> {
        let mut sorted: Vec<&ProjectedGalaxy> = self.galaxies.iter().collect();
        sorted.sort_by(|a, b| b.point.depth.total_cmp(&a.point.depth));
        sorted
    }
}

/// Renders frame views for a trajectory through a catalog.
#[derive(Debug, Clone)]
pub struct Storyboard {
    pub interpolator: SnapshotInterpolator,
    pub region: ViewRegion,
}

impl Storyboard {
    pub fn new(interpolator: SnapshotInterpolator, region: ViewRegion) -> Self {
        Self {
            interpolator,
            region,
        }
    }

    /// One view per trajectory record, in trajectory order.
    ///
    /// # Errors
    ///
    /// Fails on the first frame (in frame order) whose scale factor lies
    /// outside the snapshot table, or whose camera cannot be inverted.
    pub fn render(
        &self,
        trajectory: &DenseTrajectory,
        catalog: &GalaxyCatalog,
    ) -> Result<Vec<FrameView>, StoryboardError> {
        self.region
            .validate()
            .map_err(|source| StoryboardError::Projection {
                frame: trajectory.records().first().map_or(0, |r| r.frame),
                source,
            })?;

        info!(
            "Rendering {} frames against {} catalog records",
            trajectory.len(),
            catalog.len()
        );

        let views = trajectory
            .records()
            .par_iter()
            .map(|record| {
                let frame = record.frame;
                let galaxies = self
                    .interpolator
                    .interpolate(record.scale_factor, catalog)
                    .map_err(|source| StoryboardError::Snapshot { frame, source })?;

                let positions: Vec<_> = galaxies.iter().map(|g| g.position).collect();
                let points = project_frame(&record.basis, &record.position, &positions, &self.region)
                    .map_err(|source| StoryboardError::Projection { frame, source })?;

                debug!(
                    "Frame {}: {} of {} galaxies in view",
                    frame,
                    points.len(),
                    galaxies.len()
                );

                Ok(FrameView {
                    frame,
                    scale_factor: record.scale_factor,
                    galaxies: points
                        .into_iter()
                        .map(|point| ProjectedGalaxy {
                            galaxy: galaxies[point.original_index].clone(),
                            point,
                        })
                        .collect(),
                })
            })
            .collect::<Result<Vec<_>, StoryboardError>>()?;

        Ok(views)
    }
}

/// Write views as text rows of `frame index galaxy_id x y z`, where `index`
/// is the galaxy's position in that frame's interpolated set and `x y z` are
/// normalized device coordinates.
pub fn write_frame_views<W: Write>(views: &[FrameView], mut writer: W) -> Result<(), StoryboardError> {
    writeln!(writer, "# frame index galaxy_id ndc_x ndc_y ndc_z")?;
    for view in views {
        for entry in &view.galaxies {
            writeln!(
                writer,
                "{} {} {} {:.6} {:.6} {:.6}",
                view.frame,
                entry.point.original_index,
                entry.galaxy.id,
                entry.point.x,
                entry.point.y,
                entry.point.z
            )?;
        }
    }
    writer.flush()?;
    Ok(())
}

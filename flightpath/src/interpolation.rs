//! Galaxy positions between snapshots.
//!
//! The catalog only knows where galaxies are at snapshot times. For a frame
//! at an arbitrary scale factor, each galaxy in the earlier bracketing
//! snapshot is paired with its descendant in the later one and its position
//! is blended linearly in scale factor.
//!
//! Two filters apply before blending:
//! - galaxies below the dark matter mass floor are dropped (small subhalos
//!   are not shown in fly-throughs at all), and
//! - galaxies whose descendant is missing from the later snapshot are
//!   dropped for that frame (mergers and lost tracks).

use std::collections::{HashMap, HashSet};

use log::{debug, warn};
use nalgebra::Vector3;

use crate::algo::periodic::{minimum_image, periodic_wrap};
use crate::catalog::{GalaxyCatalog, GalaxyRecord};
use crate::snapshots::{ScaleFactorTable, SnapshotError};

/// Default dark matter mass floor in solar masses.
pub const DEFAULT_MIN_DM_MASS: f64 = 1e10;

/// A galaxy placed at an arbitrary scale factor.
///
/// Identity fields come from the earlier bracketing snapshot, only the
/// position is blended.
#[derive(Debug, Clone, PartialEq)]
pub struct InterpolatedGalaxy {
    pub id: i64,
    pub snapshot: i64,
    pub mass_dm: f64,
    pub position: Vector3<f64>,
    pub redshift: f64,
}

impl From<&GalaxyRecord> for InterpolatedGalaxy {
    fn from(record: &GalaxyRecord) -> Self {
        Self {
            id: record.id,
            snapshot: record.snapshot,
            mass_dm: record.mass_dm,
            position: record.position,
            redshift: record.redshift,
        }
    }
}

/// Places catalog galaxies at arbitrary scale factors.
#[derive(Debug, Clone)]
pub struct SnapshotInterpolator {
    table: ScaleFactorTable,
    min_mass_dm: f64,
    /// Periodic box side; when set, displacements use the minimum image
    box_size: Option<f64>,
}

impl Default for SnapshotInterpolator {
    fn default() -> Self {
        Self::new(ScaleFactorTable::new())
    }
}

impl SnapshotInterpolator {
    pub fn new(table: ScaleFactorTable) -> Self {
        Self {
            table,
            min_mass_dm: DEFAULT_MIN_DM_MASS,
            box_size: None,
        }
    }

    /// Override the dark matter mass floor.
    pub fn with_min_mass(mut self, min_mass_dm: f64) -> Self {
        self.min_mass_dm = min_mass_dm;
        self
    }

    /// Treat positions as living in a periodic box of this side length.
    ///
    /// Interpolated positions then take the short way across box faces and
    /// are wrapped back into `[0, box_size)`. Without this, a galaxy crossing
    /// a box face between snapshots is interpolated straight across the
    /// whole box.
    pub fn with_periodic_box(mut self, box_size: Option<f64>) -> Self {
        self.box_size = box_size;
        self
    }

    pub fn table(&self) -> &ScaleFactorTable {
        &self.table
    }

    /// Galaxy positions at `scale_factor`.
    ///
    /// Output follows the catalog order of the earlier snapshot. A frame with
    /// no qualifying galaxies yields an empty vector.
    ///
    /// # Errors
    ///
    /// `SnapshotError::OutOfRange` when `scale_factor` lies outside the
    /// snapshot table so no bracketing pair exists.
    pub fn interpolate(
        &self,
        scale_factor: f64,
        catalog: &GalaxyCatalog,
    ) -> Result<Vec<InterpolatedGalaxy>, SnapshotError> {
        let bracket = self.table.find_snapnums(scale_factor);
        let before_sf = self.table.scale_factor(bracket.before)?;
        let after_sf = self.table.scale_factor(bracket.after)?;

        let before_gals: Vec<&GalaxyRecord> = catalog
            .filter(|r| r.snapshot == bracket.before && r.mass_dm >= self.min_mass_dm)
            .collect();

        if bracket.is_exact() {
            // Keep only galaxies with a tracked descendant so the galaxy set
            // does not jump when a frame lands exactly on a snapshot
            let descendant_ids: HashSet<i64> =
                before_gals.iter().map(|r| r.descendant_id).collect();
            let survivors: HashSet<i64> = catalog
                .filter(|r| descendant_ids.contains(&r.id))
                .map(|r| r.id)
                .collect();
            return Ok(before_gals
                .into_iter()
                .filter(|r| survivors.contains(&r.descendant_id))
                .map(InterpolatedGalaxy::from)
                .collect());
        }

        let after_gals: HashMap<i64, &GalaxyRecord> = catalog
            .by_snapshot(bracket.after)
            .map(|r| (r.id, r))
            .collect();

        let frac = (scale_factor - before_sf) / (after_sf - before_sf);

        let mut dropped = 0usize;
        let mut galaxies = Vec::with_capacity(before_gals.len());
        for before in before_gals {
            let Some(after) = after_gals.get(&before.descendant_id) else {
                dropped += 1;
                continue;
            };

            let mut galaxy = InterpolatedGalaxy::from(before);
            galaxy.position = match self.box_size {
                Some(box_size) => {
                    let delta = minimum_image(&(after.position - before.position), box_size);
                    periodic_wrap(&(before.position + delta * frac), box_size, None)
                }
                None => before.position + (after.position - before.position) * frac,
            };
            galaxies.push(galaxy);
        }

        debug!(
            "a={scale_factor:.4}: snapshots {}..{}, {} galaxies, {} without descendant",
            bracket.before,
            bracket.after,
            galaxies.len(),
            dropped
        );
        if galaxies.is_empty() {
            warn!("No galaxies to show at scale factor {scale_factor:.4}");
        }

        Ok(galaxies)
    }
}

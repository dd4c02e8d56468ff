//! Simulation snapshot scale factors.
//!
//! The simulation writes 29 snapshots, numbered 0..=28, each at a known
//! cosmological scale factor `a = 1 / (1 + z)`. Camera frames are placed at
//! arbitrary scale factors, so galaxy positions for a frame come from the two
//! snapshots that bracket it.

use thiserror::Error;

/// Scale factor of every snapshot, indexed by snapshot number.
pub const SNAPSHOT_SCALE_FACTORS: [f64; 29] = [
    0.05, 0.06, 0.09, 0.10, 0.11, 0.12, 0.14, 0.15, 0.17, 0.18, 0.20, 0.22, 0.25, 0.29, 0.31,
    0.33, 0.37, 0.40, 0.44, 0.50, 0.54, 0.58, 0.62, 0.67, 0.73, 0.79, 0.85, 0.91, 1.00,
];

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SnapshotError {
    #[error("Snapshot {snapshot} is outside the table (valid range 0..{len})")]
    OutOfRange { snapshot: i64, len: usize },
}

/// Snapshots either side of a scale factor.
///
/// Indices are signed and unchecked: a scale factor below the first entry
/// gives `before == -1`, one above the last gives `after == len`. Resolve
/// them through [`ScaleFactorTable::scale_factor`] to get a checked value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotBracket {
    pub before: i64,
    pub after: i64,
}

impl SnapshotBracket {
    /// True when the scale factor sits exactly on a snapshot.
    pub fn is_exact(&self) -> bool {
        self.before == self.after
    }
}

/// Monotonic snapshot number to scale factor lookup.
#[derive(Debug, Clone, Copy)]
pub struct ScaleFactorTable {
    values: &'static [f64],
}

impl Default for ScaleFactorTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ScaleFactorTable {
    /// The table for the standard 29 snapshot run.
    pub const fn new() -> Self {
        Self {
            values: &SNAPSHOT_SCALE_FACTORS,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        self.values
    }

    /// Checked lookup of a snapshot's scale factor.
    pub fn scale_factor(&self, snapshot: i64) -> Result<f64, SnapshotError> {
        usize::try_from(snapshot)
            .ok()
            .and_then(|idx| self.values.get(idx).copied())
            .ok_or(SnapshotError::OutOfRange {
                snapshot,
                len: self.values.len(),
            })
    }

    /// Find the snapshots either side of `scale_factor`.
    ///
    /// The nearest entry is found by minimum absolute difference. On a tie
    /// the lower snapshot wins since the table is scanned in ascending order
    /// and only a strictly smaller difference replaces the current best.
    ///
    /// No clamping is applied; see [`SnapshotBracket`].
    pub fn find_snapnums(&self, scale_factor: f64) -> SnapshotBracket {
        let mut nearest = 0usize;
        let mut best = f64::INFINITY;
        for (idx, value) in self.values.iter().enumerate() {
            let diff = (value - scale_factor).abs();
            if diff < best {
                best = diff;
                nearest = idx;
            }
        }

        let nearest_value = self.values[nearest];
        let nearest = nearest as i64;
        if nearest_value == scale_factor {
            SnapshotBracket {
                before: nearest,
                after: nearest,
            }
        } else if nearest_value > scale_factor {
            SnapshotBracket {
                before: nearest - 1,
                after: nearest,
            }
        } else {
            SnapshotBracket {
                before: nearest,
                after: nearest + 1,
            }
        }
    }
}

/// Convert a scale factor to redshift, `z = 1/a - 1`.
pub fn scale_factor_to_redshift(scale_factor: f64) -> f64 {
    1.0 / scale_factor - 1.0
}

/// Convert a redshift to scale factor, `a = 1 / (1 + z)`.
pub fn redshift_to_scale_factor(redshift: f64) -> f64 {
    1.0 / (1.0 + redshift)
}

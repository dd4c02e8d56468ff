//! Authored camera keyframes.
//!
//! A keyframe describes what the camera does over a range of frames: which
//! point it looks at, and how it orbits that point. The orbit is parameterised
//! around a rotation axis `n` with local time `t = frame - start_frame`:
//!
//! ```text
//! r(t) = radial_offset  + radial_velocity  * t
//! θ(t) = angular_offset + angular_velocity * t      (radians)
//! h(t) = height_offset  + height_velocity  * t
//!
//! camera(t) = target + r(t) (cos θ e₁ + sin θ e₂) + h(t) n
//! ```
//!
//! where `e₁`, `e₂` complete `n` to a right-handed orthonormal frame.
//!
//! The target is either a free point in the box, or an offset from a catalog
//! galaxy as it was at the snapshot the keyframe was authored against.

use std::path::Path;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::GalaxyCatalog;

/// Number of numeric columns in an authoring table row.
pub const KEYFRAME_COLUMNS: usize = 16;

/// Largest frame number, positive or negative, a keyframe may name.
pub const MAX_FRAME_INDEX: i64 = 1_000_000_000;

/// Most frames a flight may span, counted from its first frame to its last.
pub const MAX_FRAME_SPAN: i64 = 1_000_000;

#[derive(Error, Debug)]
pub enum KeyframeError {
    #[error("Keyframe {index}: {reason}")]
    Invalid { index: usize, reason: String },

    #[error("Keyframe {index} is anchored to galaxy {id} but no catalog was supplied")]
    MissingCatalog { index: usize, id: i64 },

    #[error("Galaxy {id} not found in snapshot {snapshot}")]
    GalaxyNotFound { id: i64, snapshot: i64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A catalog galaxy a keyframe is positioned relative to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalaxyAnchor {
    pub id: i64,
    /// Snapshot the keyframe was authored against
    pub snapshot: i64,
}

/// One authored camera segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    /// Galaxy the target is relative to; `None` for a free target
    #[serde(default)]
    pub galaxy: Option<GalaxyAnchor>,
    pub start_frame: i64,
    pub end_frame: i64,
    pub start_scale_factor: f64,
    pub end_scale_factor: f64,
    /// Look target, relative to the anchor galaxy when there is one
    pub target_offset: Vector3<f64>,
    pub rotation_axis: Vector3<f64>,
    #[serde(default)]
    pub radial_velocity: f64,
    /// Radians per frame
    #[serde(default)]
    pub angular_velocity: f64,
    #[serde(default)]
    pub radial_offset: f64,
    /// Radians
    #[serde(default)]
    pub angular_offset: f64,
    #[serde(default)]
    pub height_velocity: f64,
    #[serde(default)]
    pub height_offset: f64,
}

impl Keyframe {
    /// Build a free-target keyframe from an authoring table row.
    ///
    /// Column order: start frame, end frame, start scale factor, end scale
    /// factor, target x, y, z, axis x, y, z, radial velocity, angular
    /// velocity, radial offset, angular offset, height velocity, height
    /// offset. Frame columns are rounded to the nearest integer.
    ///
    /// `index` is the row's position in its table and is only used for
    /// error reporting. The result is not validated beyond its frame cells.
    pub fn from_row(row: &[f64; KEYFRAME_COLUMNS], index: usize) -> Result<Self, KeyframeError> {
        let frame = |value: f64, name: &str| -> Result<i64, KeyframeError> {
            let rounded = value.round();
            if !rounded.is_finite() || rounded.abs() > MAX_FRAME_INDEX as f64 {
                return Err(KeyframeError::Invalid {
                    index,
                    reason: format!("{name} frame {value} is not a usable frame number"),
                });
            }
            Ok(rounded as i64)
        };

        Ok(Self {
            galaxy: None,
            start_frame: frame(row[0], "start")?,
            end_frame: frame(row[1], "end")?,
            start_scale_factor: row[2],
            end_scale_factor: row[3],
            target_offset: Vector3::new(row[4], row[5], row[6]),
            rotation_axis: Vector3::new(row[7], row[8], row[9]),
            radial_velocity: row[10],
            angular_velocity: row[11],
            radial_offset: row[12],
            angular_offset: row[13],
            height_velocity: row[14],
            height_offset: row[15],
        })
    }

    /// Check the keyframe can drive the path builder.
    pub fn validate(&self, index: usize) -> Result<(), KeyframeError> {
        let invalid = |reason: String| KeyframeError::Invalid { index, reason };

        let scalars = [
            self.start_scale_factor,
            self.end_scale_factor,
            self.radial_velocity,
            self.angular_velocity,
            self.radial_offset,
            self.angular_offset,
            self.height_velocity,
            self.height_offset,
        ];
        if scalars.iter().any(|v| !v.is_finite())
            || self.target_offset.iter().any(|v| !v.is_finite())
            || self.rotation_axis.iter().any(|v| !v.is_finite())
        {
            return Err(invalid("contains a non-finite value".to_string()));
        }

        for frame in [self.start_frame, self.end_frame] {
            if !(-MAX_FRAME_INDEX..=MAX_FRAME_INDEX).contains(&frame) {
                return Err(invalid(format!("frame {frame} outside ±{MAX_FRAME_INDEX}")));
            }
        }

        if self.end_frame < self.start_frame {
            return Err(invalid(format!(
                "end frame {} precedes start frame {}",
                self.end_frame, self.start_frame
            )));
        }

        if self.end_frame - self.start_frame > MAX_FRAME_SPAN {
            return Err(invalid(format!(
                "frames {}..={} span more than {MAX_FRAME_SPAN} frames",
                self.start_frame, self.end_frame
            )));
        }

        for sf in [self.start_scale_factor, self.end_scale_factor] {
            if sf <= 0.0 || sf > 1.0 {
                return Err(invalid(format!("scale factor {sf} outside (0, 1]")));
            }
        }

        // A single frame has one scale factor
        if self.start_frame == self.end_frame && self.start_scale_factor != self.end_scale_factor {
            return Err(invalid(format!(
                "single frame {} has two scale factors, {} and {}",
                self.start_frame, self.start_scale_factor, self.end_scale_factor
            )));
        }

        if self.rotation_axis.norm() < f64::EPSILON {
            return Err(invalid("rotation axis has zero length".to_string()));
        }

        Ok(())
    }

    /// Frames covered by this keyframe, inclusive.
    pub fn frames(&self) -> impl Iterator<Item = i64> {
        self.start_frame..=self.end_frame
    }

    /// Unit rotation axis.
    pub fn axis(&self) -> Vector3<f64> {
        self.rotation_axis.normalize()
    }

    /// Camera displacement from the target at `frame`.
    pub fn orbit_offset(&self, frame: i64) -> Vector3<f64> {
        let t = (frame - self.start_frame) as f64;
        let radius = self.radial_offset + self.radial_velocity * t;
        let angle = self.angular_offset + self.angular_velocity * t;
        let height = self.height_offset + self.height_velocity * t;

        let n = self.axis();
        let (e1, e2) = orbit_plane(&n);
        (e1 * angle.cos() + e2 * angle.sin()) * radius + n * height
    }
}

/// Two unit vectors spanning the plane perpendicular to unit vector `n`,
/// ordered so that `e₁ × e₂ = n`.
pub(crate) fn orbit_plane(n: &Vector3<f64>) -> (Vector3<f64>, Vector3<f64>) {
    // Cross with whichever world axis is least aligned with n
    let reference = if n.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    let e2 = n.cross(&reference).normalize();
    let e1 = e2.cross(n);
    (e1, e2)
}

/// Ordered keyframes for one flight.
///
/// Order is significant: it is the order the camera visits the segments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyframeSequence {
    keyframes: Vec<Keyframe>,
}

impl KeyframeSequence {
    /// Build a sequence, validating every keyframe.
    ///
    /// The flight as a whole, from the earliest start frame to the latest end
    /// frame, is held to [`MAX_FRAME_SPAN`] as well.
    pub fn new(keyframes: Vec<Keyframe>) -> Result<Self, KeyframeError> {
        let mut first = i64::MAX;
        let mut last = i64::MIN;
        for (index, keyframe) in keyframes.iter().enumerate() {
            keyframe.validate(index)?;

            first = first.min(keyframe.start_frame);
            last = last.max(keyframe.end_frame);
            if last - first > MAX_FRAME_SPAN {
                return Err(KeyframeError::Invalid {
                    index,
                    reason: format!(
                        "flight frames {first}..={last} span more than {MAX_FRAME_SPAN} frames"
                    ),
                });
            }
        }
        Ok(Self { keyframes })
    }

    /// Build a sequence of free-target keyframes from authoring table rows.
    pub fn from_rows(rows: &[[f64; KEYFRAME_COLUMNS]]) -> Result<Self, KeyframeError> {
        let keyframes = rows
            .iter()
            .enumerate()
            .map(|(index, row)| Keyframe::from_row(row, index))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(keyframes)
    }

    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }

    pub fn len(&self) -> usize {
        self.keyframes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    /// Absolute look target of every keyframe.
    ///
    /// Anchored keyframes add their offset to the anchor galaxy's catalog
    /// position at the authored snapshot.
    pub fn resolve_targets(
        &self,
        catalog: Option<&GalaxyCatalog>,
    ) -> Result<Vec<Vector3<f64>>, KeyframeError> {
        self.keyframes
            .iter()
            .enumerate()
            .map(|(index, keyframe)| match keyframe.galaxy {
                None => Ok(keyframe.target_offset),
                Some(anchor) => {
                    let catalog = catalog.ok_or(KeyframeError::MissingCatalog {
                        index,
                        id: anchor.id,
                    })?;
                    catalog
                        .filter(|r| r.id == anchor.id && r.snapshot == anchor.snapshot)
                        .next()
                        .map(|r| r.position + keyframe.target_offset)
                        .ok_or(KeyframeError::GalaxyNotFound {
                            id: anchor.id,
                            snapshot: anchor.snapshot,
                        })
                }
            })
            .collect()
    }

    /// Save to JSON file
    pub fn save_to_file(&self, path: &Path) -> Result<(), KeyframeError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load from JSON file, validating every keyframe
    pub fn load_from_file(path: &Path) -> Result<Self, KeyframeError> {
        let json = std::fs::read_to_string(path)?;
        let raw: KeyframeSequence = serde_json::from_str(&json)?;
        Self::new(raw.keyframes)
    }
}

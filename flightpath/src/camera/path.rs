//! Dense camera paths from sparse keyframes.
//!
//! The builder turns a [`KeyframeSequence`] into one [`TrajectoryRecord`] per
//! integer frame:
//!
//! 1. Every keyframe is sampled with its orbit model at each frame it covers.
//!    Where keyframes overlap, the earlier keyframe in the sequence wins.
//! 2. The samples are fitted with a smoothing spline per coordinate (or a
//!    linear, extrapolating interpolant in [`InterpolationMode::Linear`]) and
//!    the fit is evaluated at every frame from the earliest start to the
//!    latest end, filling any gaps between keyframes.
//! 3. Scale factor is fitted in `log10` through each keyframe's start and end
//!    values and clamped to the present day (`a <= 1`).
//! 4. Look targets and rotation axes are blended linearly between keyframes.
//!    The camera looks from its position to the target, with the rotation
//!    axis as the "up" hint.

use std::collections::BTreeMap;

use clap::ValueEnum;
use log::{debug, info};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::basis::{BasisError, CameraBasis};
use super::trajectory::{DenseTrajectory, TrajectoryRecord};
use crate::algo::{Interp3, InterpError, LinearInterpolator, SmoothingSpline, Spline3, SplineError};
use crate::catalog::GalaxyCatalog;
use crate::keyframe::{KeyframeError, KeyframeSequence};

/// Default roughness penalty for position splines.
pub const DEFAULT_SMOOTHING: f64 = 3.0;

#[derive(Error, Debug)]
pub enum PathError {
    #[error("Keyframe sequence is empty")]
    NoKeyframes,

    #[error("Keyframe error: {0}")]
    Keyframe(#[from] KeyframeError),

    #[error("Spline fit failed: {0}")]
    Spline(#[from] SplineError),

    #[error("Interpolation failed: {0}")]
    Interp(#[from] InterpError),

    #[error("Frame {frame}: {source}")]
    Basis {
        frame: i64,
        #[source]
        source: BasisError,
    },
}

/// How positions and scale factors are fitted between samples.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum InterpolationMode {
    /// Cubic smoothing spline
    #[default]
    Spline,
    /// Piecewise linear, extrapolating past the end samples
    Linear,
}

/// A fitted 3-vector curve over frame number.
enum VectorCurve {
    Constant(Vector3<f64>),
    Spline(Spline3),
    Linear(Interp3),
}

impl VectorCurve {
    fn evaluate(&self, frame: f64) -> Vector3<f64> {
        match self {
            VectorCurve::Constant(v) => *v,
            VectorCurve::Spline(s) => s.evaluate(frame),
            VectorCurve::Linear(l) => l.evaluate(frame),
        }
    }
}

/// A fitted scalar curve over frame number.
enum ScalarCurve {
    Constant(f64),
    Spline(SmoothingSpline),
    Linear(LinearInterpolator),
}

impl ScalarCurve {
    fn evaluate(&self, frame: f64) -> f64 {
        match self {
            ScalarCurve::Constant(v) => *v,
            ScalarCurve::Spline(s) => s.evaluate(frame),
            ScalarCurve::Linear(l) => l.evaluate(frame),
        }
    }
}

fn split_samples<T: Copy>(samples: &BTreeMap<i64, T>) -> (Vec<f64>, Vec<T>) {
    samples.iter().map(|(&f, &v)| (f as f64, v)).unzip()
}

fn linear_vector_curve(samples: &BTreeMap<i64, Vector3<f64>>) -> Result<VectorCurve, InterpError> {
    if samples.len() == 1 {
        let (_, value) = split_samples(samples);
        return Ok(VectorCurve::Constant(value[0]));
    }
    let (frames, values) = split_samples(samples);
    Ok(VectorCurve::Linear(Interp3::new(&frames, &values)?))
}

/// Builds dense trajectories from keyframe sequences.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPathBuilder {
    pub mode: InterpolationMode,
    /// Roughness penalty for position splines, ignored in linear mode
    pub smoothing: f64,
}

impl Default for CameraPathBuilder {
    fn default() -> Self {
        Self {
            mode: InterpolationMode::Spline,
            smoothing: DEFAULT_SMOOTHING,
        }
    }
}

impl CameraPathBuilder {
    pub fn new(mode: InterpolationMode, smoothing: f64) -> Self {
        Self { mode, smoothing }
    }

    /// Evaluate the camera at every integer frame the sequence spans.
    ///
    /// `catalog` is only needed when keyframes are anchored to galaxies.
    ///
    /// # Errors
    ///
    /// * `PathError::NoKeyframes` for an empty sequence
    /// * `PathError::Keyframe` if an anchored target cannot be resolved
    /// * `PathError::Basis` if the look direction vanishes or lines up with
    ///   the rotation axis on some frame
    pub fn build(
        &self,
        sequence: &KeyframeSequence,
        catalog: Option<&GalaxyCatalog>,
    ) -> Result<DenseTrajectory, PathError> {
        let keyframes = sequence.keyframes();
        if keyframes.is_empty() {
            return Err(PathError::NoKeyframes);
        }
        let targets = sequence.resolve_targets(catalog)?;

        let mut positions = BTreeMap::new();
        let mut scale_factors = BTreeMap::new();
        let mut look_targets = BTreeMap::new();
        let mut axes = BTreeMap::new();

        for (keyframe, target) in keyframes.iter().zip(&targets) {
            for frame in keyframe.frames() {
                positions
                    .entry(frame)
                    .or_insert_with(|| target + keyframe.orbit_offset(frame));
            }
            for (frame, sf) in [
                (keyframe.start_frame, keyframe.start_scale_factor),
                (keyframe.end_frame, keyframe.end_scale_factor),
            ] {
                scale_factors.entry(frame).or_insert(sf.log10());
                look_targets.entry(frame).or_insert(*target);
                axes.entry(frame).or_insert_with(|| keyframe.axis());
            }
        }

        let (first_frame, last_frame) = match (positions.keys().next(), positions.keys().last()) {
            (Some(&first), Some(&last)) => (first, last),
            _ => return Err(PathError::NoKeyframes),
        };
        info!(
            "Building {:?} camera path for frames {}..={} from {} keyframes",
            self.mode,
            first_frame,
            last_frame,
            keyframes.len()
        );
        debug!(
            "{} position samples, {} scale factor control points",
            positions.len(),
            scale_factors.len()
        );

        let position_curve = self.position_curve(&positions)?;
        let scale_factor_curve = self.scale_factor_curve(&scale_factors)?;
        let target_curve = linear_vector_curve(&look_targets)?;
        let axis_curve = linear_vector_curve(&axes)?;

        let records = (first_frame..=last_frame)
            .map(|frame| {
                let t = frame as f64;
                let position = position_curve.evaluate(t);
                let look = target_curve.evaluate(t) - position;
                let basis = CameraBasis::from_look(&look, &axis_curve.evaluate(t))
                    .map_err(|source| PathError::Basis { frame, source })?;
                let scale_factor = 10f64.powf(scale_factor_curve.evaluate(t)).min(1.0);

                Ok(TrajectoryRecord {
                    frame,
                    scale_factor,
                    position,
                    basis,
                })
            })
            .collect::<Result<Vec<_>, PathError>>()?;

        Ok(DenseTrajectory::new(records))
    }

    fn position_curve(&self, samples: &BTreeMap<i64, Vector3<f64>>) -> Result<VectorCurve, PathError> {
        if samples.len() == 1 {
            return Ok(linear_vector_curve(samples)?);
        }
        let (frames, points) = split_samples(samples);
        Ok(match self.mode {
            InterpolationMode::Spline => {
                VectorCurve::Spline(Spline3::new(&frames, &points, self.smoothing)?)
            }
            InterpolationMode::Linear => VectorCurve::Linear(Interp3::new(&frames, &points)?),
        })
    }

    /// Fit `log10(a)` through the control points. The spline variant
    /// interpolates its knots exactly.
    fn scale_factor_curve(&self, samples: &BTreeMap<i64, f64>) -> Result<ScalarCurve, PathError> {
        let (frames, values) = split_samples(samples);
        if values.len() == 1 {
            return Ok(ScalarCurve::Constant(values[0]));
        }
        Ok(match self.mode {
            InterpolationMode::Spline => {
                ScalarCurve::Spline(SmoothingSpline::new(frames, values, 0.0)?)
            }
            InterpolationMode::Linear => {
                ScalarCurve::Linear(LinearInterpolator::new(frames, values)?)
            }
        })
    }
}

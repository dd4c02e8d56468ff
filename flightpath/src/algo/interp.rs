//! Piecewise linear interpolation with linear extrapolation.
//!
//! This is the fallback curve used by the path builder when smoothing is not
//! wanted. Unlike a clamped interpolant, queries outside the knot range keep
//! following the slope of the nearest end segment, so camera motion authored
//! at the edges of a keyframe range continues smoothly past it.

use nalgebra::Vector3;
use thiserror::Error;

/// Errors that can occur while building an interpolator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InterpError {
    #[error("Input vectors must have at least 2 points")]
    InsufficientData,
    #[error("Input vectors must have the same length")]
    MismatchedLengths,
    #[error("X values must be strictly increasing (violated at index {0})")]
    UnsortedData(usize),
    #[error("Non-finite value at index {0}")]
    NonFinite(usize),
}

/// Checks knot arrays shared by every 1D curve in this crate.
pub(crate) fn validate_knots(xs: &[f64], ys: &[f64]) -> Result<(), InterpError> {
    if xs.len() != ys.len() {
        return Err(InterpError::MismatchedLengths);
    }

    if xs.len() < 2 {
        return Err(InterpError::InsufficientData);
    }

    for (i, (x, y)) in xs.iter().zip(ys).enumerate() {
        if !x.is_finite() || !y.is_finite() {
            return Err(InterpError::NonFinite(i));
        }
    }

    for i in 1..xs.len() {
        if xs[i] <= xs[i - 1] {
            return Err(InterpError::UnsortedData(i));
        }
    }

    Ok(())
}

/// Index of the segment `[xs[i], xs[i + 1]]` used to evaluate `x`.
///
/// Values left of the range map to the first segment and values right of
/// the range to the last one, which is what makes evaluation extrapolate.
pub(crate) fn segment_index(xs: &[f64], x: f64) -> usize {
    let last = xs.len() - 2;
    match xs.binary_search_by(|probe| probe.total_cmp(&x)) {
        Ok(exact) => exact.min(last),
        Err(insert) => insert.saturating_sub(1).min(last),
    }
}

/// 1D linear interpolant that extrapolates beyond its knots.
///
/// # Examples
///
/// ```rust
/// use flightpath::algo::interp::LinearInterpolator;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let interp = LinearInterpolator::new(vec![0.0, 1.0, 2.0], vec![0.0, 1.0, 4.0])?;
/// assert_eq!(interp.evaluate(1.5), 2.5);
/// assert_eq!(interp.evaluate(3.0), 7.0); // continues the last slope
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct LinearInterpolator {
    xs: Vec<f64>,
    ys: Vec<f64>,
}

impl LinearInterpolator {
    /// Build an interpolant from strictly increasing `xs` and matching `ys`.
    ///
    /// # Errors
    ///
    /// * `InterpError::InsufficientData` - fewer than 2 knots
    /// * `InterpError::MismatchedLengths` - `xs` and `ys` differ in length
    /// * `InterpError::UnsortedData` - `xs` is not strictly increasing
    /// * `InterpError::NonFinite` - a knot contains NaN or infinity
    pub fn new(xs: Vec<f64>, ys: Vec<f64>) -> Result<Self, InterpError> {
        validate_knots(&xs, &ys)?;
        Ok(Self { xs, ys })
    }

    /// Evaluate at `x`, extrapolating linearly outside the knot range.
    pub fn evaluate(&self, x: f64) -> f64 {
        let i = segment_index(&self.xs, x);
        let (x1, x2) = (self.xs[i], self.xs[i + 1]);
        let (y1, y2) = (self.ys[i], self.ys[i + 1]);

        let t = (x - x1) / (x2 - x1);
        y1 + t * (y2 - y1)
    }

    /// Range covered by the knots.
    pub fn domain(&self) -> (f64, f64) {
        (self.xs[0], self.xs[self.xs.len() - 1])
    }
}

/// Three independent linear interpolants sharing one parameter axis.
#[derive(Debug, Clone)]
pub struct Interp3 {
    x: LinearInterpolator,
    y: LinearInterpolator,
    z: LinearInterpolator,
}

impl Interp3 {
    /// Build from parameter values and matching 3-vectors.
    pub fn new(params: &[f64], points: &[Vector3<f64>]) -> Result<Self, InterpError> {
        if params.len() != points.len() {
            return Err(InterpError::MismatchedLengths);
        }
        let component = |axis: usize| -> Result<LinearInterpolator, InterpError> {
            LinearInterpolator::new(params.to_vec(), points.iter().map(|p| p[axis]).collect())
        };
        Ok(Self {
            x: component(0)?,
            y: component(1)?,
            z: component(2)?,
        })
    }

    pub fn evaluate(&self, t: f64) -> Vector3<f64> {
        Vector3::new(
            self.x.evaluate(t),
            self.y.evaluate(t),
            self.z.evaluate(t),
        )
    }
}

//! Natural cubic smoothing splines.
//!
//! Camera paths are authored as a handful of rough samples, so the path
//! builder fits a smoothing spline through them rather than an exact
//! interpolant. The fitted curve `g` minimises
//!
//! ```text
//! Σ (yᵢ - g(xᵢ))² + λ ∫ g''(x)² dx
//! ```
//!
//! The minimiser is a natural cubic spline with knots at the data points.
//! It is found with the Reinsch formulation: the second derivatives γ at the
//! interior knots solve the pentadiagonal system `(R + λ QᵀQ) γ = Qᵀ y`, and
//! the knot values are `g = y - λ Q γ`. With `λ = 0` this reduces to the
//! interpolating natural cubic spline.
//!
//! # Mathematical Background
//!
//! With `hᵢ = xᵢ₊₁ - xᵢ`, `Q` is the `n × (n-2)` second-difference matrix and
//! `R` the `(n-2) × (n-2)` symmetric tridiagonal matrix
//!
//! ```text
//! R[j,j]   = (hⱼ₋₁ + hⱼ) / 3
//! R[j,j+1] = hⱼ / 6
//! ```
//!
//! Outside the knot range a natural spline continues as a straight line.

use nalgebra::Vector3;
use thiserror::Error;

use super::interp::{segment_index, validate_knots, InterpError};

/// Errors that can occur while fitting a smoothing spline.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SplineError {
    #[error("Invalid knots: {0}")]
    Knots(#[from] InterpError),

    #[error("Smoothing weight must be finite and non-negative, got {0}")]
    InvalidSmoothing(f64),

    #[error("Spline system is not positive definite")]
    Singular,
}

/// A fitted natural cubic smoothing spline.
///
/// # Examples
///
/// ```rust
/// use flightpath::algo::spline::SmoothingSpline;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let xs = vec![0.0, 1.0, 2.0, 3.0];
/// let ys = vec![0.0, 1.0, 4.0, 9.0];
///
/// // No smoothing: passes through every knot
/// let spline = SmoothingSpline::new(xs, ys, 0.0)?;
/// assert!((spline.evaluate(2.0) - 4.0).abs() < 1e-10);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct SmoothingSpline {
    xs: Vec<f64>,
    /// Fitted values at the knots
    values: Vec<f64>,
    /// Second derivatives at the knots (zero at both ends)
    second_derivs: Vec<f64>,
}

impl SmoothingSpline {
    /// Fit a smoothing spline with roughness penalty `smoothing`.
    ///
    /// # Errors
    ///
    /// * `SplineError::Knots` - fewer than 2 knots, mismatched lengths,
    ///   unsorted or non-finite input
    /// * `SplineError::InvalidSmoothing` - negative or non-finite penalty
    /// * `SplineError::Singular` - the banded system could not be factored
    pub fn new(xs: Vec<f64>, ys: Vec<f64>, smoothing: f64) -> Result<Self, SplineError> {
        validate_knots(&xs, &ys)?;
        if !smoothing.is_finite() || smoothing < 0.0 {
            return Err(SplineError::InvalidSmoothing(smoothing));
        }

        let n = xs.len();
        if n == 2 {
            // No interior knots, the fit is the chord
            return Ok(Self {
                xs,
                values: ys,
                second_derivs: vec![0.0; 2],
            });
        }

        let h: Vec<f64> = xs.windows(2).map(|w| w[1] - w[0]).collect();
        let m = n - 2;

        // Column k of Q belongs to interior knot k + 1 and touches rows k..=k+2
        let q: Vec<[f64; 3]> = (0..m)
            .map(|k| {
                let (h_left, h_right) = (h[k], h[k + 1]);
                [1.0 / h_left, -1.0 / h_left - 1.0 / h_right, 1.0 / h_right]
            })
            .collect();

        // Bands of (R + λ QᵀQ): diagonal, first and second super-diagonal
        let mut bands = vec![[0.0; 3]; m];
        for k in 0..m {
            let qk = q[k];
            bands[k][0] = (h[k] + h[k + 1]) / 3.0
                + smoothing * (qk[0] * qk[0] + qk[1] * qk[1] + qk[2] * qk[2]);
            if k + 1 < m {
                let next = q[k + 1];
                bands[k][1] = h[k + 1] / 6.0 + smoothing * (qk[1] * next[0] + qk[2] * next[1]);
            }
            if k + 2 < m {
                bands[k][2] = smoothing * qk[2] * q[k + 2][0];
            }
        }

        let rhs: Vec<f64> = (0..m)
            .map(|k| q[k][0] * ys[k] + q[k][1] * ys[k + 1] + q[k][2] * ys[k + 2])
            .collect();
        let gamma = solve_banded(&bands, &rhs)?;

        // g = y - λ Q γ
        let mut values = ys;
        for (k, (qk, g)) in q.iter().zip(&gamma).enumerate() {
            for (offset, coeff) in qk.iter().enumerate() {
                values[k + offset] -= smoothing * coeff * g;
            }
        }

        let mut second_derivs = vec![0.0; n];
        second_derivs[1..=m].copy_from_slice(&gamma);

        Ok(Self {
            xs,
            values,
            second_derivs,
        })
    }

    /// Evaluate the spline at `x`.
    ///
    /// Inside the knot range this is the cubic piece for the containing
    /// segment. Outside it the curve continues linearly with the end slope.
    pub fn evaluate(&self, x: f64) -> f64 {
        let n = self.xs.len();
        let first = self.xs[0];
        let last = self.xs[n - 1];

        if x < first {
            return self.values[0] + (x - first) * self.end_slope(false);
        }
        if x > last {
            return self.values[n - 1] + (x - last) * self.end_slope(true);
        }

        let i = segment_index(&self.xs, x);
        let (x1, x2) = (self.xs[i], self.xs[i + 1]);
        let (g1, g2) = (self.values[i], self.values[i + 1]);
        let (c1, c2) = (self.second_derivs[i], self.second_derivs[i + 1]);
        let h = x2 - x1;
        let (dl, dr) = (x - x1, x2 - x);

        (dl * g2 + dr * g1) / h - dl * dr / 6.0 * ((1.0 + dl / h) * c2 + (1.0 + dr / h) * c1)
    }

    fn end_slope(&self, right: bool) -> f64 {
        let n = self.xs.len();
        if right {
            let h = self.xs[n - 1] - self.xs[n - 2];
            (self.values[n - 1] - self.values[n - 2]) / h + h * self.second_derivs[n - 2] / 6.0
        } else {
            let h = self.xs[1] - self.xs[0];
            (self.values[1] - self.values[0]) / h - h * self.second_derivs[1] / 6.0
        }
    }

    /// Fitted values at the knots.
    pub fn fitted_values(&self) -> &[f64] {
        &self.values
    }
}

/// Solve a symmetric positive definite pentadiagonal system.
///
/// `bands[i]` holds `A[i][i]`, `A[i][i+1]` and `A[i][i+2]`. Uses a banded
/// Cholesky factorisation `A = L Lᵀ`, so the cost is linear in the size.
fn solve_banded(bands: &[[f64; 3]], rhs: &[f64]) -> Result<Vec<f64>, SplineError> {
    let m = rhs.len();
    let a = |i: usize, j: usize| -> f64 {
        // Lower triangle access, i >= j
        match i - j {
            0 => bands[j][0],
            1 => bands[j][1],
            2 => bands[j][2],
            _ => 0.0,
        }
    };

    // lower[i] = [L(i, i-2), L(i, i-1), L(i, i)]
    let mut lower = vec![[0.0; 3]; m];
    let l = |lower: &[[f64; 3]], i: usize, j: usize| -> f64 {
        if j + 2 < i {
            0.0
        } else {
            lower[i][2 - (i - j)]
        }
    };

    for i in 0..m {
        for j in i.saturating_sub(2)..=i {
            let mut sum = a(i, j);
            for k in i.saturating_sub(2)..j {
                sum -= l(&lower, i, k) * l(&lower, j, k);
            }
            if i == j {
                if !(sum > 0.0) {
                    return Err(SplineError::Singular);
                }
                lower[i][2] = sum.sqrt();
            } else {
                lower[i][2 - (i - j)] = sum / lower[j][2];
            }
        }
    }

    // Forward substitution L z = b
    let mut z = vec![0.0; m];
    for i in 0..m {
        let mut sum = rhs[i];
        for k in i.saturating_sub(2)..i {
            sum -= l(&lower, i, k) * z[k];
        }
        z[i] = sum / lower[i][2];
    }

    // Back substitution Lᵀ x = z
    let mut x = vec![0.0; m];
    for i in (0..m).rev() {
        let mut sum = z[i];
        for k in (i + 1)..(i + 3).min(m) {
            sum -= l(&lower, k, i) * x[k];
        }
        x[i] = sum / lower[i][2];
    }

    Ok(x)
}

/// Three smoothing splines sharing one parameter axis, one per coordinate.
#[derive(Debug, Clone)]
pub struct Spline3 {
    x: SmoothingSpline,
    y: SmoothingSpline,
    z: SmoothingSpline,
}

impl Spline3 {
    pub fn new(
        params: &[f64],
        points: &[Vector3<f64>],
        smoothing: f64,
    ) -> Result<Self, SplineError> {
        if params.len() != points.len() {
            return Err(InterpError::MismatchedLengths.into());
        }
        let component = |axis: usize| {
            SmoothingSpline::new(
                params.to_vec(),
                points.iter().map(|p| p[axis]).collect(),
                smoothing,
            )
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

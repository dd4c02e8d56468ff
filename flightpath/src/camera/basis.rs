//! Orthonormal camera frames.
//!
//! A camera frame is built from a look direction and a rough "up" hint. The
//! look direction becomes the camera's z axis. The hint loses its component
//! along the look direction (one Gram-Schmidt step) and becomes the y axis.
//! The x axis completes the frame as `y × z`, making `(x, y, z)`
//! right-handed.

use nalgebra::{Matrix3, Vector3};
use thiserror::Error;

/// Vectors shorter than this are treated as zero when building a frame.
pub const DEGENERATE_NORM: f64 = 1e-9;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BasisError {
    #[error("Degenerate basis: {0}")]
    Degenerate(String),

    #[error("Camera matrix is singular and cannot be inverted")]
    Singular,
}

/// Remove the component of `raw` along unit vector `first`, then normalise.
///
/// # Errors
///
/// `BasisError::Degenerate` when `raw` is (nearly) parallel to `first`, so
/// nothing is left after the projection is removed.
pub fn orthonormalise(raw: &Vector3<f64>, first: &Vector3<f64>) -> Result<Vector3<f64>, BasisError> {
    let residual = raw - first * raw.dot(first);
    let norm = residual.norm();
    if !(norm > DEGENERATE_NORM * raw.norm().max(1.0)) {
        return Err(BasisError::Degenerate(format!(
            "vector {raw:?} is parallel to {first:?}"
        )));
    }
    Ok(residual / norm)
}

/// Normalised cross product `a × b`.
pub fn cross_basis(a: &Vector3<f64>, b: &Vector3<f64>) -> Result<Vector3<f64>, BasisError> {
    let c = a.cross(b);
    let norm = c.norm();
    if !(norm > DEGENERATE_NORM) {
        return Err(BasisError::Degenerate(format!(
            "vectors {a:?} and {b:?} are parallel"
        )));
    }
    Ok(c / norm)
}

/// Camera orientation as three world-space unit vectors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraBasis {
    pub x: Vector3<f64>,
    pub y: Vector3<f64>,
    /// Look direction
    pub z: Vector3<f64>,
}

impl CameraBasis {
    /// Frame looking along `look` with `up_hint` as the approximate y axis.
    pub fn from_look(look: &Vector3<f64>, up_hint: &Vector3<f64>) -> Result<Self, BasisError> {
        let look_norm = look.norm();
        if !(look_norm > DEGENERATE_NORM) {
            return Err(BasisError::Degenerate(
                "look direction has zero length".to_string(),
            ));
        }
        let z = look / look_norm;
        let y = orthonormalise(up_hint, &z)?;
        let x = cross_basis(&y, &z)?;
        Ok(Self { x, y, z })
    }

    /// The identity orientation.
    pub fn identity() -> Self {
        Self {
            x: Vector3::x(),
            y: Vector3::y(),
            z: Vector3::z(),
        }
    }

    /// Rotation matrix whose columns are the basis vectors.
    pub fn to_matrix(&self) -> Matrix3<f64> {
        Matrix3::from_columns(&[self.x, self.y, self.z])
    }

    /// Largest deviation from orthonormality over all dot products.
    pub fn orthonormality_error(&self) -> f64 {
        let m = self.to_matrix();
        (m.transpose() * m - Matrix3::identity()).amax()
    }
}

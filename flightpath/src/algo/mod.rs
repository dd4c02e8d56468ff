//! Numerical building blocks for camera path generation
//!
//! This module provides 1D curve fitting (linear and smoothing spline) and
//! periodic box geometry used by the trajectory and interpolation code.

pub mod interp;
pub mod periodic;
pub mod spline;

pub use interp::{Interp3, InterpError, LinearInterpolator};
pub use periodic::{minimum_image, periodic_wrap};
pub use spline::{SmoothingSpline, Spline3, SplineError};

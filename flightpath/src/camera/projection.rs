//! Galaxy projection utilities for fly-through rendering.
//!
//! This module maps world-space galaxy positions onto the image plane of a
//! camera on the flight path. It handles both geometric steps a renderer
//! needs before it can draw anything.
//!
//! # Key Functions
//!
//! - **Camera transform**: World to camera coordinates through the inverse of
//!   the camera's affine frame
//! - **Perspective projection**: Camera coordinates to normalized device
//!   coordinates with a fixed 45° field of view
//! - **Frustum clipping**: Drop everything outside the unit cube, remembering
//!   which input each survivor came from
//!
//! # Projection Geometry
//!
//! The camera frame is the 4×4 affine matrix
//!
//! ```text
//! | x₀ y₀ z₀ p₀ |
//! | x₁ y₁ z₁ p₁ |
//! | x₂ y₂ z₂ p₂ |
//! | 0  0  0  1  |
//! ```
//!
//! with basis vectors as columns and the camera position as translation. Its
//! inverse takes world points into camera space, where the camera looks along
//! +z. The perspective matrix then maps the depth range `[near, far]` onto
//! `[-1, 1]`, with `near = depth × 10⁻⁴` and `far = depth`.
//!
//! # Examples
//!
//! ```rust
//! use flightpath::camera::basis::CameraBasis;
//! use flightpath::camera::projection::{project, to_camera_space, ViewRegion};
//! use nalgebra::Vector3;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let region = ViewRegion::new(16.0, 9.0, 25.0)?;
//! let basis = CameraBasis::identity();
//! let camera = Vector3::new(0.0, 0.0, -10.0);
//!
//! let galaxies = [Vector3::new(0.0, 0.0, 0.0), Vector3::new(0.0, 0.0, -20.0)];
//! let in_camera = to_camera_space(&basis, &camera, &galaxies, true)?;
//! let visible = project(&in_camera, &region);
//!
//! // The galaxy behind the camera is clipped
//! assert_eq!(visible.len(), 1);
//! assert_eq!(visible[0].original_index, 0);
//! # Ok(())
//! # }
//! ```

use std::f64::consts::FRAC_PI_4;

use nalgebra::{Matrix4, Vector3, Vector4};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::basis::{BasisError, CameraBasis};

/// Vertical field of view of every rendered frame
pub const FIELD_OF_VIEW_RAD: f64 = FRAC_PI_4;

/// Near plane distance as a fraction of the view depth
pub const NEAR_PLANE_FRACTION: f64 = 1e-4;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProjectionError {
    #[error("View region must have positive finite extents, got {width} x {height} x {depth}")]
    InvalidRegion { width: f64, height: f64, depth: f64 },

    #[error(transparent)]
    Basis(#[from] BasisError),
}

/// Extent of the rendered view: image aspect plus depth of field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewRegion {
    pub width: f64,
    pub height: f64,
    /// Distance to the far clip plane
    pub depth: f64,
}

impl ViewRegion {
    pub fn new(width: f64, height: f64, depth: f64) -> Result<Self, ProjectionError> {
        let region = Self {
            width,
            height,
            depth,
        };
        region.validate()?;
        Ok(region)
    }

    pub fn validate(&self) -> Result<(), ProjectionError> {
        let ok = |v: f64| v.is_finite() && v > 0.0;
        if ok(self.width) && ok(self.height) && ok(self.depth) {
            Ok(())
        } else {
            Err(ProjectionError::InvalidRegion {
                width: self.width,
                height: self.height,
                depth: self.depth,
            })
        }
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.width / self.height
    }

    pub fn near(&self) -> f64 {
        self.depth * NEAR_PLANE_FRACTION
    }

    pub fn far(&self) -> f64 {
        self.depth
    }
}

/// A galaxy that survived clipping, in normalized device coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedPoint {
    pub x: f64,
    pub y: f64,
    /// -1 at the near plane, +1 at the far plane
    pub z: f64,
    /// Homogeneous w after the perspective divide, always 1
    pub w: f64,
    /// Camera-space depth along the look axis (clip w before the divide)
    pub depth: f64,
    /// Position of this point in the projected input
    pub original_index: usize,
}

/// Affine camera-to-world matrix for a camera frame at `position`.
pub fn camera_matrix(basis: &CameraBasis, position: &Vector3<f64>) -> Matrix4<f64> {
    let mut m = Matrix4::identity();
    m.fixed_view_mut::<3, 3>(0, 0).copy_from(&basis.to_matrix());
    m.fixed_view_mut::<3, 1>(0, 3).copy_from(position);
    m
}

/// Transform world points into camera space.
///
/// With `invert` set (the normal world to camera direction) the camera matrix
/// is inverted first. Without it, camera-space input is taken back to world
/// space. Output points are homogeneous.
///
/// # Errors
///
/// `BasisError::Singular` if the camera matrix cannot be inverted.
pub fn to_camera_space(
    basis: &CameraBasis,
    position: &Vector3<f64>,
    points: &[Vector3<f64>],
    invert: bool,
) -> Result<Vec<Vector4<f64>>, BasisError> {
    let mut transform = camera_matrix(basis, position);
    if invert {
        transform = transform.try_inverse().ok_or(BasisError::Singular)?;
    }

    Ok(points
        .iter()
        .map(|p| transform * p.push(1.0))
        .collect())
}

/// Perspective matrix for `region` with the fixed field of view.
#[rustfmt::skip]
pub fn perspective_matrix(region: &ViewRegion) -> Matrix4<f64> {
    let d = 1.0 / (FIELD_OF_VIEW_RAD / 2.0).tan();
    let near = region.near();
    let far = region.far();

    Matrix4::new(
        d / region.aspect_ratio(), 0.0, 0.0, 0.0,
        0.0, d, 0.0, 0.0,
        0.0, 0.0, (-near - far) / (near - far), (2.0 * near * far) / (near - far),
        0.0, 0.0, 1.0, 0.0,
    )
}

/// Project camera-space points and clip to the unit cube.
///
/// Survivors keep input order; callers needing painter's order should sort
/// by depth themselves.
pub fn project(camera_points: &[Vector4<f64>], region: &ViewRegion) -> Vec<ProjectedPoint> {
    let projection = perspective_matrix(region);

    camera_points
        .iter()
        .enumerate()
        .filter_map(|(index, point)| {
            let clip = projection * point;
            let depth = clip.w;
            if depth == 0.0 {
                return None;
            }
            let (x, y, z) = (clip.x / depth, clip.y / depth, clip.z / depth);

            // Comparisons are false for NaN, so those drop out too
            let inside = x.abs() <= 1.0 && y.abs() <= 1.0 && z.abs() <= 1.0;
            inside.then_some(ProjectedPoint {
                x,
                y,
                z,
                w: clip.w / depth,
                depth,
                original_index: index,
            })
        })
        .collect()
}

/// Transform and project world points for one camera frame.
pub fn project_frame(
    basis: &CameraBasis,
    position: &Vector3<f64>,
    points: &[Vector3<f64>],
    region: &ViewRegion,
) -> Result<Vec<ProjectedPoint>, ProjectionError> {
    let in_camera = to_camera_space(basis, position, points, true)?;
    Ok(project(&in_camera, region))
}

/// World position of the point half the view depth straight ahead.
pub fn centre_of_view(
    basis: &CameraBasis,
    position: &Vector3<f64>,
    region: &ViewRegion,
) -> Vector3<f64> {
    let ahead = camera_matrix(basis, position) * Vector4::new(0.0, 0.0, region.depth / 2.0, 1.0);
    ahead.xyz()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square_region() -> ViewRegion {
        ViewRegion::new(1.0, 1.0, 100.0).unwrap()
    }

    #[test]
    fn test_region_validation() {
        assert!(ViewRegion::new(16.0, 9.0, 25.0).is_ok());
        assert!(matches!(
            ViewRegion::new(16.0, 0.0, 25.0),
            Err(ProjectionError::InvalidRegion { .. })
        ));
        assert!(ViewRegion::new(16.0, 9.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_camera_space_round_trip() {
        let basis =
            CameraBasis::from_look(&Vector3::new(1.0, 1.0, 0.0), &Vector3::new(0.0, 0.0, 1.0))
                .unwrap();
        let position = Vector3::new(3.0, -2.0, 7.0);
        let points = vec![Vector3::new(1.0, 2.0, 3.0), Vector3::new(-4.0, 0.5, 9.0)];

        let in_camera = to_camera_space(&basis, &position, &points, true).unwrap();
        let back: Vec<Vector3<f64>> = in_camera.iter().map(|p| p.xyz()).collect();
        let world = to_camera_space(&basis, &position, &back, false).unwrap();

        for (original, restored) in points.iter().zip(&world) {
            assert_relative_eq!(*original, restored.xyz(), epsilon = 1e-10);
            assert_relative_eq!(restored.w, 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_camera_space_puts_look_target_on_z_axis() {
        let position = Vector3::new(10.0, 0.0, 0.0);
        let basis = CameraBasis::from_look(&(-position), &Vector3::z()).unwrap();
        let in_camera = to_camera_space(&basis, &position, &[Vector3::zeros()], true).unwrap();

        assert_relative_eq!(in_camera[0], Vector4::new(0.0, 0.0, 10.0, 1.0), epsilon = 1e-12);
    }

    #[test]
    fn test_singular_basis_is_error() {
        let flat = CameraBasis {
            x: Vector3::x(),
            y: Vector3::x(),
            z: Vector3::z(),
        };
        assert_eq!(
            to_camera_space(&flat, &Vector3::zeros(), &[Vector3::zeros()], true),
            Err(BasisError::Singular)
        );
    }

    #[test]
    fn test_near_and_far_planes_map_to_unit_depth() {
        let region = square_region();
        let projection = perspective_matrix(&region);

        let near = projection * Vector4::new(0.0, 0.0, region.near(), 1.0);
        let far = projection * Vector4::new(0.0, 0.0, region.far(), 1.0);

        assert_relative_eq!(near.z / near.w, -1.0, epsilon = 1e-9);
        assert_relative_eq!(far.z / far.w, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_field_of_view_edge() {
        let region = square_region();
        let half_angle = FIELD_OF_VIEW_RAD / 2.0;
        let depth = 50.0;
        let edge = depth * half_angle.tan();

        let points = vec![
            Vector4::new(edge * 0.99, 0.0, depth, 1.0),
            Vector4::new(edge * 1.01, 0.0, depth, 1.0),
            Vector4::new(0.0, -edge * 1.01, depth, 1.0),
        ];
        let visible = project(&points, &region);

        assert_eq!(visible.len(), 1);
        assert_relative_eq!(visible[0].x, 0.99, epsilon = 1e-9);
        assert_relative_eq!(visible[0].depth, depth, epsilon = 1e-12);
    }

    #[test]
    fn test_aspect_ratio_widens_horizontal_field() {
        let wide = ViewRegion::new(2.0, 1.0, 100.0).unwrap();
        let depth = 50.0;
        let edge = depth * (FIELD_OF_VIEW_RAD / 2.0).tan();

        // Outside the vertical half-angle but inside the widened horizontal one
        let visible = project(&[Vector4::new(edge * 1.5, 0.0, depth, 1.0)], &wide);
        assert_eq!(visible.len(), 1);
        assert_relative_eq!(visible[0].x, 0.75, epsilon = 1e-9);
    }

    #[test]
    fn test_clipping_preserves_original_indices() {
        let region = square_region();
        let mut points: Vec<Vector4<f64>> = (0..10)
            .map(|i| Vector4::new(0.1 * i as f64, 0.0, 20.0 + i as f64, 1.0))
            .collect();
        points[2] = Vector4::new(0.0, 0.0, -5.0, 1.0); // behind the camera
        points[5] = Vector4::new(0.0, 0.0, 500.0, 1.0); // past the far plane
        points[7] = Vector4::new(0.0, 80.0, 30.0, 1.0); // above the frustum

        let visible = project(&points, &region);
        let indices: Vec<usize> = visible.iter().map(|p| p.original_index).collect();

        assert_eq!(indices, vec![0, 1, 3, 4, 6, 8, 9]);
    }

    #[test]
    fn test_point_on_camera_plane_is_dropped() {
        let visible = project(&[Vector4::new(1.0, 1.0, 0.0, 1.0)], &square_region());
        assert!(visible.is_empty());
    }

    #[test]
    fn test_project_frame_and_centre_of_view() {
        let region = square_region();
        let position = Vector3::new(0.0, 0.0, -30.0);
        let basis = CameraBasis::identity();

        let centre = centre_of_view(&basis, &position, &region);
        assert_relative_eq!(centre, Vector3::new(0.0, 0.0, 20.0), epsilon = 1e-12);

        let visible = project_frame(&basis, &position, &[centre], &region).unwrap();
        assert_eq!(visible.len(), 1);
        assert_relative_eq!(visible[0].x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(visible[0].depth, 50.0, epsilon = 1e-12);
    }

    #[test]
    fn test_divide_normalises_w_and_keeps_depth() {
        let visible = project(&[Vector4::new(0.0, 0.0, 50.0, 1.0)], &square_region());

        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].w, 1.0);
        assert_relative_eq!(visible[0].depth, 50.0, epsilon = 1e-12);
    }
}

//! Periodic box helpers.
//!
//! Cosmological volumes are periodic: a galaxy leaving one face of the box
//! re-enters through the opposite face. These helpers map coordinates and
//! displacements back onto the copy of the box that matters to the caller.

use nalgebra::Vector3;

/// Wrap `pos` into the periodic box of side `box_size`.
///
/// Without a centre, coordinates land in `[0, box_size)`. With a centre, they
/// land on the periodic copy nearest to it, i.e. within half a box of the
/// centre along each axis. Coordinates may start any number of boxes away.
///
/// ```rust
/// use flightpath::algo::periodic::periodic_wrap;
/// use nalgebra::Vector3;
///
/// let wrapped = periodic_wrap(&Vector3::new(26.0, -1.0, 12.5), 25.0, None);
/// assert!((wrapped - Vector3::new(1.0, 24.0, 12.5)).norm() < 1e-12);
/// ```
pub fn periodic_wrap(
    pos: &Vector3<f64>,
    box_size: f64,
    centre: Option<&Vector3<f64>>,
) -> Vector3<f64> {
    match centre {
        None => pos.map(|c| {
            // rem_euclid rounds tiny negatives up to box_size itself
            let wrapped = c.rem_euclid(box_size);
            if wrapped < box_size {
                wrapped
            } else {
                0.0
            }
        }),
        Some(centre) => {
            let half = 0.5 * box_size;
            (pos - centre).map(|d| (d + half).rem_euclid(box_size) - half) + centre
        }
    }
}

/// Shortest periodic displacement equivalent to `delta`.
///
/// Each component lands in `[-box_size / 2, box_size / 2)`.
pub fn minimum_image(delta: &Vector3<f64>, box_size: f64) -> Vector3<f64> {
    let half = 0.5 * box_size;
    delta.map(|d| (d + half).rem_euclid(box_size) - half)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_wrap_into_box() {
        let pos = Vector3::new(-0.5, 25.0, 60.0);
        assert_relative_eq!(
            periodic_wrap(&pos, 25.0, None),
            Vector3::new(24.5, 0.0, 10.0),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_wrap_tiny_negative_stays_below_box() {
        let wrapped = periodic_wrap(&Vector3::new(-1e-17, 0.0, 25.0 - 1e-15), 25.0, None);
        assert!(wrapped.iter().all(|&c| (0.0..25.0).contains(&c)), "{wrapped:?}");
        assert_eq!(wrapped.x, 0.0);
    }

    #[test]
    fn test_wrap_near_centre() {
        let centre = Vector3::new(1.0, 1.0, 1.0);
        let pos = Vector3::new(24.0, 2.0, -23.5);
        let wrapped = periodic_wrap(&pos, 25.0, Some(&centre));

        assert_relative_eq!(wrapped, Vector3::new(-1.0, 2.0, 1.5), epsilon = 1e-12);
        for axis in 0..3 {
            assert!((wrapped[axis] - centre[axis]).abs() <= 12.5);
        }
    }

    #[test]
    fn test_minimum_image() {
        let delta = Vector3::new(24.0, -24.0, 3.0);
        assert_relative_eq!(
            minimum_image(&delta, 25.0),
            Vector3::new(-1.0, 1.0, 3.0),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_minimum_image_many_boxes_away() {
        let delta = Vector3::new(101.0, -76.0, 0.0);
        assert_relative_eq!(
            minimum_image(&delta, 25.0),
            Vector3::new(1.0, -1.0, 0.0),
            epsilon = 1e-12
        );
    }
}

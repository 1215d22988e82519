use crate::core::models::lattice::HandedOrders;
use nalgebra::{Matrix2, Point2, Vector2};
use thiserror::Error;

/// Below this magnitude the sine of the angle between two base vectors is treated as zero.
pub const DEGENERACY_EPSILON: f64 = 1e-9;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeometryError {
    #[error(
        "Degenerate lattice: the base vectors are (anti)parallel (sine of enclosed angle = {sine:.3e})"
    )]
    DegenerateLattice { sine: f64 },

    #[error("Invalid image scale: pixel size {pixel_size} and image height {image_height} must be positive")]
    InvalidScale { pixel_size: f64, image_height: f64 },
}

/// Returns the length of a vector and its angle from the +x axis in degrees, in `[0, 180]`.
///
/// The angle is measured as `acos(x / length)`, so vectors below the x axis report the same
/// angle as their mirror image above it. Lattice vectors always point upward.
pub fn vector_length_angle(v: &Vector2<f64>) -> (f64, f64) {
    let length = v.x.hypot(v.y);
    let angle = (v.x / length).clamp(-1.0, 1.0).acos().to_degrees();
    (length, angle)
}

/// A real-space base vector in polar form: length in Å and angle in degrees from +x.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RealSpaceVector {
    pub length: f64,
    pub angle: f64,
}

impl RealSpaceVector {
    pub fn components(&self) -> Vector2<f64> {
        let theta = self.angle.to_radians();
        Vector2::new(self.length * theta.cos(), self.length * theta.sin())
    }
}

/// The pair of real-space vectors dual to a pair of reciprocal base vectors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RealSpaceBasis {
    pub first: RealSpaceVector,
    pub second: RealSpaceVector,
}

impl RealSpaceBasis {
    pub fn components(&self) -> (Vector2<f64>, Vector2<f64>) {
        (self.first.components(), self.second.components())
    }

    /// Basis vectors as the columns of a matrix, mapping `(i, j)` to `(x, y)`.
    pub fn matrix(&self) -> Matrix2<f64> {
        let (v1, v2) = self.components();
        Matrix2::from_columns(&[v1, v2])
    }

    pub fn point(&self, i: i64, j: i64) -> Vector2<f64> {
        let (v1, v2) = self.components();
        v1 * i as f64 + v2 * j as f64
    }

    /// Real-space x-distance of one full turn: `n1·x1 + n2'·x2`.
    pub fn circumference(&self, orders: HandedOrders) -> f64 {
        let (v1, v2) = self.components();
        orders.first as f64 * v1.x + orders.second as f64 * v2.x
    }
}

/// Converts two reciprocal base vectors (pixels) into the dual real-space vectors (Å).
///
/// Each real-space vector is perpendicular to the opposite reciprocal vector, and its length is
/// the inverse of the reciprocal spacing between the lattice rows it crosses, scaled by the
/// image height and pixel size.
pub fn reciprocal_to_real(
    v1: &Vector2<f64>,
    v2: &Vector2<f64>,
    pixel_size: f64,
    image_height: f64,
) -> Result<RealSpaceBasis, GeometryError> {
    if !(pixel_size > 0.0 && image_height > 0.0) {
        return Err(GeometryError::InvalidScale {
            pixel_size,
            image_height,
        });
    }
    let (l1, a1) = vector_length_angle(v1);
    let (l2, a2) = vector_length_angle(v2);

    let sine = ((a2 - a1).to_radians()).sin();
    if !sine.is_finite() || sine.abs() < DEGENERACY_EPSILON {
        return Err(GeometryError::DegenerateLattice { sine });
    }

    let scale = pixel_size * image_height;
    Ok(RealSpaceBasis {
        first: RealSpaceVector {
            length: scale / (l1 * sine).abs(),
            angle: -(a2 - 90.0),
        },
        second: RealSpaceVector {
            length: scale / (l2 * sine).abs(),
            angle: -(a1 - 90.0),
        },
    })
}

/// A ruler reading between two image points, in Å.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    pub width: f64,
    pub height: f64,
    pub length: f64,
}

impl Measurement {
    pub fn between(a: Point2<f64>, b: Point2<f64>, pixel_size: f64) -> Self {
        let width = (a.x - b.x).abs() * pixel_size;
        let height = (a.y - b.y).abs() * pixel_size;
        Self {
            width,
            height,
            length: width.hypot(height),
        }
    }

    /// Helix radius suggested by a ruler drawn across the full width of the tube.
    pub fn suggested_radius(&self) -> f64 {
        self.width / 2.0
    }

    /// The same reading after the pixel size changed from `old` to `new`.
    pub fn rescaled(&self, old_pixel_size: f64, new_pixel_size: f64) -> Self {
        let factor = new_pixel_size / old_pixel_size;
        let width = self.width * factor;
        let height = self.height * factor;
        Self {
            width,
            height,
            length: width.hypot(height),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    #[test]
    fn vector_length_angle_reports_degrees_from_positive_x() {
        let (l, a) = vector_length_angle(&Vector2::new(3.0, 4.0));
        assert!(f64_approx_equal(l, 5.0));
        assert!(f64_approx_equal(a, 53.13010235415598));

        let (_, a) = vector_length_angle(&Vector2::new(-1.0, 1.0));
        assert!(f64_approx_equal(a, 135.0));
    }

    #[test]
    fn reciprocal_to_real_produces_dual_basis() {
        let basis = reciprocal_to_real(
            &Vector2::new(15.0, 4.0),
            &Vector2::new(-5.0, 12.0),
            1.0,
            200.0,
        )
        .unwrap();
        let (r1, r2) = basis.components();
        assert!(f64_approx_equal(r1.x, 12.0), "x1 = {}", r1.x);
        assert!(f64_approx_equal(r1.y, -5.0), "y1 = {}", r1.y);
        assert!(f64_approx_equal(r2.x, 4.0), "x2 = {}", r2.x);
        assert!(f64_approx_equal(r2.y, 15.0), "y2 = {}", r2.y);
    }

    #[test]
    fn real_space_vectors_are_perpendicular_to_mirrored_opposite_vectors() {
        let v1 = Vector2::new(11.0, 6.0);
        let v2 = Vector2::new(-7.0, 18.0);
        let (r1, r2) = reciprocal_to_real(&v1, &v2, 1.3, 256.0)
            .unwrap()
            .components();
        let mirror = |v: Vector2<f64>| Vector2::new(-v.x, v.y);
        assert!(r1.dot(&mirror(v2)).abs() < 1e-9);
        assert!(r2.dot(&mirror(v1)).abs() < 1e-9);
    }

    #[test]
    fn circumference_uses_handed_orders() {
        let basis = reciprocal_to_real(
            &Vector2::new(15.0, 4.0),
            &Vector2::new(-5.0, 12.0),
            1.0,
            200.0,
        )
        .unwrap();
        let c = basis.circumference(HandedOrders {
            first: 3,
            second: 1,
        });
        assert!(f64_approx_equal(c, 40.0));
    }

    #[test]
    fn parallel_vectors_are_degenerate() {
        let result = reciprocal_to_real(
            &Vector2::new(2.0, 4.0),
            &Vector2::new(4.0, 8.0),
            1.0,
            200.0,
        );
        assert!(matches!(result, Err(GeometryError::DegenerateLattice { .. })));
    }

    #[test]
    fn non_positive_scale_is_rejected() {
        let result = reciprocal_to_real(
            &Vector2::new(15.0, 4.0),
            &Vector2::new(-5.0, 12.0),
            0.0,
            200.0,
        );
        assert!(matches!(result, Err(GeometryError::InvalidScale { .. })));
    }

    #[test]
    fn ruler_measures_in_angstrom() {
        let m = Measurement::between(Point2::new(10.0, 20.0), Point2::new(40.0, 60.0), 2.0);
        assert!(f64_approx_equal(m.width, 60.0));
        assert!(f64_approx_equal(m.height, 80.0));
        assert!(f64_approx_equal(m.length, 100.0));
        assert!(f64_approx_equal(m.suggested_radius(), 30.0));

        let r = m.rescaled(2.0, 1.0);
        assert!(f64_approx_equal(r.length, 50.0));
    }
}

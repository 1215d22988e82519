use crate::core::utils::geometry::vector_length_angle;
use nalgebra::{Point2, Vector2};
use std::fmt;
use thiserror::Error;

/// Base vector used when a spectrum is first loaded, in pixels from the origin.
pub const DEFAULT_BASE_VECTOR_1: (f64, f64) = (15.0, 4.0);
/// Second default base vector, pointing to the left of the meridian.
pub const DEFAULT_BASE_VECTOR_2: (f64, f64) = (-5.0, 12.0);

/// Identifies one of the two reciprocal base vectors of a lattice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VectorSlot {
    /// The first base vector, always the one with the smaller angle from the +x axis.
    First,
    /// The second base vector, always the one with the larger angle from the +x axis.
    Second,
}

impl VectorSlot {
    fn index(self) -> usize {
        match self {
            VectorSlot::First => 0,
            VectorSlot::Second => 1,
        }
    }

    fn other(self) -> Self {
        match self {
            VectorSlot::First => VectorSlot::Second,
            VectorSlot::Second => VectorSlot::First,
        }
    }
}

impl fmt::Display for VectorSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VectorSlot::First => write!(f, "base vector 1"),
            VectorSlot::Second => write!(f, "base vector 2"),
        }
    }
}

/// The reason a base vector assignment was refused.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum VectorRejection {
    #[error("does not end on a layerline above the equator")]
    OffLayerline,
    #[error("has angle {angle:.2}°, which must lie strictly between {lower:.2}° and {upper:.2}°")]
    OutOfOrder { angle: f64, lower: f64, upper: f64 },
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LatticeError {
    #[error("Invalid layerline spacing {0}: the spacing must be a positive number of pixels")]
    InvalidSpacing(f64),

    #[error("Invalid {slot} ({x:.2}, {y:.2}): {reason}")]
    InvalidVector {
        slot: VectorSlot,
        x: f64,
        y: f64,
        reason: VectorRejection,
    },
}

/// Bessel orders in the signed form used by the lattice geometry.
///
/// The user enters both orders as the azimuthal indices of the layerlines the two base vectors
/// end on. The family generated by vector 2 is counted in the opposite sense whenever vector 2
/// lies to the right of the meridian (angle below 90°), so in that case the handed second order
/// is the negated user value. Every geometric quantity downstream (the refinement constraint,
/// the circumference, the equatorial lattice index and the predicted peak labels) is expressed
/// with the handed pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandedOrders {
    pub first: i32,
    pub second: i32,
}

impl HandedOrders {
    pub fn from_user(first: i32, second: i32, angle2_degrees: f64) -> Self {
        let second = if angle2_degrees < 90.0 { -second } else { second };
        Self { first, second }
    }
}

/// The reciprocal-space description of one power spectrum.
///
/// Both base vectors are stored in pixels relative to [`origin`](Self::origin). Their `y`
/// components are kept on integer multiples of the layerline spacing at all times, and the
/// angle of vector 1 is always strictly smaller than the angle of vector 2, so that the two
/// vectors never describe a degenerate (zero-area) lattice.
#[derive(Debug, Clone, PartialEq)]
pub struct LatticeModel {
    origin: Point2<f64>,
    layerline_spacing: f64,
    base_vectors: [Vector2<f64>; 2],
    bessel_orders: [i32; 2],
}

impl LatticeModel {
    /// Creates a model with the default base vectors snapped onto the given layerline spacing.
    ///
    /// # Errors
    ///
    /// Returns [`LatticeError::InvalidSpacing`] if the spacing is not a positive finite number,
    /// or [`LatticeError::InvalidVector`] if snapping the defaults breaks the angle ordering.
    pub fn new(origin: Point2<f64>, layerline_spacing: f64) -> Result<Self, LatticeError> {
        let (x1, y1) = DEFAULT_BASE_VECTOR_1;
        let (x2, y2) = DEFAULT_BASE_VECTOR_2;
        validate_spacing(layerline_spacing)?;
        let mut model = Self {
            origin,
            layerline_spacing,
            base_vectors: [Vector2::new(x1, y1), Vector2::new(x2, y2)],
            bessel_orders: [0, 0],
        };
        model.snap_to_layerlines(true);
        model.validate()?;
        Ok(model)
    }

    /// Builds a model from explicit values, snapping both vectors onto the layerlines.
    ///
    /// Stored values are taken as given: a vector whose `y` snaps onto the equator is rejected
    /// just as [`LatticeModel::set_base_vector`] rejects it.
    ///
    /// # Errors
    ///
    /// Returns an error if the spacing is invalid, a vector does not end above the equator, or
    /// the angle ordering between the two vectors does not hold.
    pub fn from_parts(
        origin: Point2<f64>,
        layerline_spacing: f64,
        base_vector_1: Vector2<f64>,
        base_vector_2: Vector2<f64>,
        bessel_orders: (i32, i32),
    ) -> Result<Self, LatticeError> {
        validate_spacing(layerline_spacing)?;
        let mut model = Self {
            origin,
            layerline_spacing,
            base_vectors: [base_vector_1, base_vector_2],
            bessel_orders: [bessel_orders.0, bessel_orders.1],
        };
        model.snap_to_layerlines(false);
        model.validate()?;
        Ok(model)
    }

    pub fn origin(&self) -> Point2<f64> {
        self.origin
    }

    pub fn set_origin(&mut self, origin: Point2<f64>) {
        self.origin = origin;
    }

    pub fn layerline_spacing(&self) -> f64 {
        self.layerline_spacing
    }

    /// Changes the layerline spacing and re-snaps both base vectors onto the new layerlines.
    ///
    /// The model is left untouched if the new spacing is rejected.
    pub fn set_layerline_spacing(&mut self, spacing: f64) -> Result<(), LatticeError> {
        validate_spacing(spacing)?;
        let previous = self.clone();
        self.layerline_spacing = spacing;
        self.snap_to_layerlines(true);
        if let Err(e) = self.validate() {
            *self = previous;
            return Err(e);
        }
        Ok(())
    }

    pub fn base_vector(&self, slot: VectorSlot) -> Vector2<f64> {
        self.base_vectors[slot.index()]
    }

    pub fn base_vectors(&self) -> (Vector2<f64>, Vector2<f64>) {
        (self.base_vectors[0], self.base_vectors[1])
    }

    /// Assigns a base vector, snapping its `y` component to the nearest layerline.
    ///
    /// # Errors
    ///
    /// Returns [`LatticeError::InvalidVector`] if the snapped vector does not end on a
    /// layerline above the equator, or if it violates the ordering
    /// `0° < angle1 < angle2 < 180°`. The model is unchanged on error.
    pub fn set_base_vector(
        &mut self,
        slot: VectorSlot,
        x: f64,
        y: f64,
    ) -> Result<(), LatticeError> {
        let snapped = Vector2::new(x, self.snap(y));
        let invalid = |reason| LatticeError::InvalidVector { slot, x, y, reason };

        if !(snapped.y > 0.0) || !x.is_finite() {
            return Err(invalid(VectorRejection::OffLayerline));
        }
        check_order(slot, &snapped, &self.base_vector(slot.other())).map_err(invalid)?;

        self.base_vectors[slot.index()] = snapped;
        Ok(())
    }

    /// Replaces the `x` components of both vectors at once, keeping their layerlines.
    ///
    /// Used by the refiner, which moves both vectors together. Both vectors are checked
    /// against each other before anything is written.
    pub fn set_x_components(&mut self, x1: f64, x2: f64) -> Result<(), LatticeError> {
        let v1 = Vector2::new(x1, self.base_vectors[0].y);
        let v2 = Vector2::new(x2, self.base_vectors[1].y);
        check_order(VectorSlot::First, &v1, &v2).map_err(|reason| {
            LatticeError::InvalidVector {
                slot: VectorSlot::First,
                x: x1,
                y: v1.y,
                reason,
            }
        })?;
        self.base_vectors = [v1, v2];
        Ok(())
    }

    pub fn vector_angle(&self, slot: VectorSlot) -> f64 {
        vector_length_angle(&self.base_vector(slot)).1
    }

    /// Returns the Bessel orders as entered by the user.
    pub fn bessel_orders(&self) -> (i32, i32) {
        (self.bessel_orders[0], self.bessel_orders[1])
    }

    pub fn set_bessel_orders(&mut self, first: i32, second: i32) {
        self.bessel_orders = [first, second];
    }

    /// Returns the Bessel orders with the handedness rule applied to the second order.
    pub fn handed_orders(&self) -> HandedOrders {
        HandedOrders::from_user(
            self.bessel_orders[0],
            self.bessel_orders[1],
            self.vector_angle(VectorSlot::Second),
        )
    }

    /// Rounds a height above the origin to the nearest layerline.
    pub fn snap(&self, y: f64) -> f64 {
        (y / self.layerline_spacing).round() * self.layerline_spacing
    }

    /// Index of the layerline a base vector ends on.
    pub fn layerline_index(&self, slot: VectorSlot) -> i64 {
        (self.base_vector(slot).y / self.layerline_spacing).round() as i64
    }

    /// With `lift_equator`, a vector snapping onto the equator moves to the first layerline.
    fn snap_to_layerlines(&mut self, lift_equator: bool) {
        for i in 0..2 {
            let mut y = self.snap(self.base_vectors[i].y);
            if lift_equator && y == 0.0 {
                y = self.layerline_spacing;
            }
            self.base_vectors[i].y = y;
        }
    }

    fn validate(&self) -> Result<(), LatticeError> {
        for slot in [VectorSlot::First, VectorSlot::Second] {
            let v = self.base_vector(slot);
            if !(v.y > 0.0) || !v.x.is_finite() {
                return Err(LatticeError::InvalidVector {
                    slot,
                    x: v.x,
                    y: v.y,
                    reason: VectorRejection::OffLayerline,
                });
            }
        }
        let (v1, v2) = self.base_vectors();
        check_order(VectorSlot::First, &v1, &v2).map_err(|reason| LatticeError::InvalidVector {
            slot: VectorSlot::First,
            x: v1.x,
            y: v1.y,
            reason,
        })
    }
}

fn validate_spacing(spacing: f64) -> Result<(), LatticeError> {
    if spacing.is_finite() && spacing > 0.0 {
        Ok(())
    } else {
        Err(LatticeError::InvalidSpacing(spacing))
    }
}

fn check_order(
    slot: VectorSlot,
    candidate: &Vector2<f64>,
    other: &Vector2<f64>,
) -> Result<(), VectorRejection> {
    let angle = vector_length_angle(candidate).1;
    let other_angle = vector_length_angle(other).1;
    let (lower, upper) = match slot {
        VectorSlot::First => (0.0, other_angle),
        VectorSlot::Second => (other_angle, 180.0),
    };
    if lower < angle && angle < upper {
        Ok(())
    } else {
        Err(VectorRejection::OutOfOrder {
            angle,
            lower,
            upper,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model_with_spacing(spacing: f64) -> LatticeModel {
        LatticeModel::new(Point2::new(100.0, 100.0), spacing).unwrap()
    }

    #[test]
    fn new_model_snaps_default_vectors_onto_layerlines() {
        let model = model_with_spacing(5.0);
        let (v1, v2) = model.base_vectors();
        assert_eq!(v1, Vector2::new(15.0, 5.0));
        assert_eq!(v2, Vector2::new(-5.0, 10.0));
    }

    #[test]
    fn new_model_lifts_vectors_that_snap_onto_equator() {
        let model = model_with_spacing(20.0);
        let (v1, v2) = model.base_vectors();
        assert_eq!(v1.y, 20.0);
        assert_eq!(v2.y, 20.0);
    }

    #[test]
    fn stored_vector_on_equator_is_rejected_not_lifted() {
        let result = LatticeModel::from_parts(
            Point2::new(100.0, 100.0),
            20.0,
            Vector2::new(15.0, 4.0),
            Vector2::new(-5.0, 40.0),
            (3, 1),
        );
        assert!(matches!(
            result,
            Err(LatticeError::InvalidVector {
                slot: VectorSlot::First,
                reason: VectorRejection::OffLayerline,
                ..
            })
        ));
    }

    #[test]
    fn non_positive_spacing_is_rejected() {
        assert_eq!(
            LatticeModel::new(Point2::origin(), 0.0),
            Err(LatticeError::InvalidSpacing(0.0))
        );
        assert!(LatticeModel::new(Point2::origin(), -2.0).is_err());
        assert!(LatticeModel::new(Point2::origin(), f64::NAN).is_err());
    }

    #[test]
    fn set_base_vector_rounds_y_to_nearest_layerline() {
        let mut model = model_with_spacing(4.0);
        model.set_base_vector(VectorSlot::First, 14.0, 9.1).unwrap();
        assert_eq!(model.base_vector(VectorSlot::First), Vector2::new(14.0, 8.0));
        assert_eq!(model.layerline_index(VectorSlot::First), 2);
    }

    #[test]
    fn set_base_vector_rejects_vector_that_rounds_to_equator() {
        let mut model = model_with_spacing(4.0);
        let before = model.clone();
        let result = model.set_base_vector(VectorSlot::First, 10.0, 1.5);
        assert!(matches!(
            result,
            Err(LatticeError::InvalidVector {
                reason: VectorRejection::OffLayerline,
                ..
            })
        ));
        assert_eq!(model, before);
    }

    #[test]
    fn set_base_vector_rejects_vector_below_equator() {
        let mut model = model_with_spacing(4.0);
        assert!(model.set_base_vector(VectorSlot::Second, -5.0, -8.0).is_err());
    }

    #[test]
    fn first_vector_must_have_smaller_angle_than_second() {
        let mut model = model_with_spacing(4.0);
        let result = model.set_base_vector(VectorSlot::First, -20.0, 4.0);
        assert!(matches!(
            result,
            Err(LatticeError::InvalidVector {
                slot: VectorSlot::First,
                reason: VectorRejection::OutOfOrder { .. },
                ..
            })
        ));
    }

    #[test]
    fn second_vector_must_have_larger_angle_than_first() {
        let mut model = model_with_spacing(4.0);
        let result = model.set_base_vector(VectorSlot::Second, 30.0, 4.0);
        assert!(matches!(
            result,
            Err(LatticeError::InvalidVector {
                slot: VectorSlot::Second,
                reason: VectorRejection::OutOfOrder { .. },
                ..
            })
        ));
        model.set_base_vector(VectorSlot::Second, 5.0, 12.0).unwrap();
        assert!(model.vector_angle(VectorSlot::Second) < 90.0);
    }

    #[test]
    fn parallel_vectors_are_rejected() {
        let mut model = model_with_spacing(4.0);
        let result = model.set_base_vector(VectorSlot::First, -10.0, 24.0);
        assert!(result.is_err());
    }

    #[test]
    fn changing_spacing_resnaps_vectors() {
        let mut model = model_with_spacing(4.0);
        model.set_layerline_spacing(6.0).unwrap();
        let (v1, v2) = model.base_vectors();
        assert_eq!(v1.y, 6.0);
        assert_eq!(v2.y, 12.0);
    }

    #[test]
    fn rejected_spacing_leaves_model_unchanged() {
        let mut model = model_with_spacing(4.0);
        let before = model.clone();
        assert!(model.set_layerline_spacing(0.0).is_err());
        assert_eq!(model, before);
    }

    #[test]
    fn handed_orders_flip_second_order_when_vector_two_is_right_of_meridian() {
        let mut model = model_with_spacing(4.0);
        model.set_bessel_orders(3, 1);
        assert_eq!(model.handed_orders(), HandedOrders { first: 3, second: 1 });

        model.set_base_vector(VectorSlot::Second, 5.0, 12.0).unwrap();
        assert_eq!(
            model.handed_orders(),
            HandedOrders {
                first: 3,
                second: -1
            }
        );
        assert_eq!(model.bessel_orders(), (3, 1));
    }

    #[test]
    fn set_x_components_keeps_layerlines_and_checks_order() {
        let mut model = model_with_spacing(4.0);
        model.set_x_components(12.0, -4.0).unwrap();
        assert_eq!(model.base_vectors().0, Vector2::new(12.0, 4.0));
        assert_eq!(model.base_vectors().1, Vector2::new(-4.0, 12.0));

        let before = model.clone();
        assert!(model.set_x_components(-40.0, 40.0).is_err());
        assert_eq!(model, before);
    }
}

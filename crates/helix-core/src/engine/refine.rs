use super::config::{ImageGeometry, RefinementConfig};
use super::error::EngineError;
use crate::core::models::lattice::{HandedOrders, LatticeModel};
use crate::core::utils::geometry::reciprocal_to_real;
use nalgebra::Vector2;
use tracing::{debug, info, instrument, warn};

/// Result of a successful refinement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RefinementOutcome {
    pub x1: f64,
    pub x2: f64,
    pub residual: f64,
    /// Function evaluations spent by the bounded search; zero when the starting guess was
    /// already consistent.
    pub iterations: usize,
}

/// Adjusts the `x` components of both base vectors so that the real-space lattice closes
/// on itself after one turn.
///
/// For a helix, walking `n1` steps along the first real-space vector and `n2'` steps along the
/// second must return to the same height. With `x2` tied to `x1` through `x2 = -n2'·x1/n1`, the
/// refiner searches `x1` in a bracket around a weighted starting guess for the point where
/// `|n1·y1 + n2'·y2|` in real space vanishes.
///
/// The vectors in place before the last call are remembered so the refinement can be undone.
#[derive(Debug, Clone)]
pub struct LatticeRefiner {
    config: RefinementConfig,
    snapshot: Option<(Vector2<f64>, Vector2<f64>)>,
}

impl LatticeRefiner {
    pub fn new(config: RefinementConfig) -> Self {
        Self {
            config,
            snapshot: None,
        }
    }

    pub fn config(&self) -> &RefinementConfig {
        &self.config
    }

    pub fn has_snapshot(&self) -> bool {
        self.snapshot.is_some()
    }

    /// Refines the model in place.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidParameter`] when the orders do not define a search
    /// interval, and [`EngineError::NonConvergentRefinement`] when the final residual exceeds
    /// the tolerance. In the latter case the model holds the attempted values (when they form
    /// a valid lattice) and [`undo`](Self::undo) restores the previous ones.
    #[instrument(skip_all, name = "lattice_refinement")]
    pub fn refine(
        &mut self,
        model: &mut LatticeModel,
        image: &ImageGeometry,
    ) -> Result<RefinementOutcome, EngineError> {
        let orders = model.handed_orders();
        let (v1, v2) = model.base_vectors();

        if orders.first == 0 {
            return Err(EngineError::InvalidParameter {
                name: "bessel_order_1",
                reason: "the first Bessel order must be non-zero to tie x2 to x1".into(),
            });
        }
        let weight = orders.first as f64 / (orders.first as f64 + (orders.second as f64).abs());
        let guess = (v1.x + v2.x.abs()) * weight;
        if !guess.is_finite() || guess == 0.0 {
            return Err(EngineError::InvalidParameter {
                name: "bessel_orders",
                reason: format!(
                    "orders ({}, {}) give a degenerate starting guess {guess}",
                    orders.first, orders.second
                ),
            });
        }

        let span = self.config.bound_span;
        let (a, b) = (guess * (1.0 - span), guess * (1.0 + span));
        let (lower, upper) = (a.min(b), a.max(b));
        info!(guess, lower, upper, "Refining base vector x components.");

        let objective = |x1: f64| {
            consistency_residual(x1, v1.y, v2.y, orders, image).unwrap_or(f64::INFINITY)
        };

        let (x1, residual, iterations) = {
            let start = objective(guess);
            if start <= self.config.tolerance {
                debug!(residual = start, "Starting guess is already consistent.");
                (guess, start, 0)
            } else {
                bounded_minimize(
                    objective,
                    lower,
                    upper,
                    self.config.abscissa_tolerance,
                    self.config.max_iterations,
                )
            }
        };
        let x2 = tied_x2(x1, orders);

        self.snapshot = Some((v1, v2));
        let applied = model.set_x_components(x1, x2);

        if !(residual <= self.config.tolerance) {
            warn!(residual, x1, x2, "Refinement did not converge.");
            if let Err(e) = applied {
                debug!(error = %e, "Attempted vectors do not form a valid lattice; model unchanged.");
            }
            return Err(EngineError::NonConvergentRefinement {
                residual,
                tolerance: self.config.tolerance,
                x1,
                x2,
            });
        }
        applied?;

        info!(x1, x2, residual, iterations, "Refinement converged.");
        Ok(RefinementOutcome {
            x1,
            x2,
            residual,
            iterations,
        })
    }

    /// Restores the base vectors in place before the last refinement. Returns `false` when
    /// there is nothing to restore.
    pub fn undo(&mut self, model: &mut LatticeModel) -> Result<bool, EngineError> {
        let Some((v1, v2)) = self.snapshot.take() else {
            return Ok(false);
        };
        model.set_x_components(v1.x, v2.x)?;
        Ok(true)
    }
}

fn tied_x2(x1: f64, orders: HandedOrders) -> f64 {
    -(orders.second as f64) * x1 / orders.first as f64
}

/// `|n1·y1 + n2'·y2|` of the real-space basis obtained for a trial `x1`.
fn consistency_residual(
    x1: f64,
    y1: f64,
    y2: f64,
    orders: HandedOrders,
    image: &ImageGeometry,
) -> Option<f64> {
    let x2 = tied_x2(x1, orders);
    let basis = reciprocal_to_real(
        &Vector2::new(x1, y1),
        &Vector2::new(x2, y2),
        image.pixel_size,
        image.height as f64,
    )
    .ok()?;
    let (r1, r2) = basis.components();
    let residual = (r1.y * orders.first as f64 + r2.y * orders.second as f64).abs();
    residual.is_finite().then_some(residual)
}

/// Brent's bounded scalar minimization (golden section with parabolic steps).
///
/// Returns the best abscissa, its function value and the number of evaluations.
fn bounded_minimize<F: Fn(f64) -> f64>(
    f: F,
    lower: f64,
    upper: f64,
    xatol: f64,
    max_evaluations: usize,
) -> (f64, f64, usize) {
    let sqrt_eps = f64::EPSILON.sqrt();
    let golden_mean = 0.5 * (3.0 - 5f64.sqrt());
    let (mut a, mut b) = (lower, upper);

    let mut fulc = a + golden_mean * (b - a);
    let (mut nfc, mut xf) = (fulc, fulc);
    let (mut rat, mut e): (f64, f64) = (0.0, 0.0);
    let mut fx = f(xf);
    let mut evaluations = 1;
    let (mut ffulc, mut fnfc) = (fx, fx);
    let mut xm = 0.5 * (a + b);
    let mut tol1 = sqrt_eps * xf.abs() + xatol / 3.0;
    let mut tol2 = 2.0 * tol1;

    while (xf - xm).abs() > tol2 - 0.5 * (b - a) && evaluations < max_evaluations {
        let mut golden = true;

        if e.abs() > tol1 {
            golden = false;
            let mut r = (xf - nfc) * (fx - ffulc);
            let mut q = (xf - fulc) * (fx - fnfc);
            let mut p = (xf - fulc) * q - (xf - nfc) * r;
            q = 2.0 * (q - r);
            if q > 0.0 {
                p = -p;
            }
            q = q.abs();
            r = e;
            e = rat;

            if p.abs() < (0.5 * q * r).abs() && p > q * (a - xf) && p < q * (b - xf) {
                rat = p / q;
                let x = xf + rat;
                if (x - a) < tol2 || (b - x) < tol2 {
                    rat = tol1 * sign_or_one(xm - xf);
                }
            } else {
                golden = true;
            }
        }

        if golden {
            e = if xf >= xm { a - xf } else { b - xf };
            rat = golden_mean * e;
        }

        let x = xf + sign_or_one(rat) * rat.abs().max(tol1);
        let fu = f(x);
        evaluations += 1;

        if fu <= fx {
            if x >= xf {
                a = xf;
            } else {
                b = xf;
            }
            (fulc, ffulc) = (nfc, fnfc);
            (nfc, fnfc) = (xf, fx);
            (xf, fx) = (x, fu);
        } else {
            if x < xf {
                a = x;
            } else {
                b = x;
            }
            if fu <= fnfc || nfc == xf {
                (fulc, ffulc) = (nfc, fnfc);
                (nfc, fnfc) = (x, fu);
            } else if fu <= ffulc || fulc == xf || fulc == nfc {
                (fulc, ffulc) = (x, fu);
            }
        }

        xm = 0.5 * (a + b);
        tol1 = sqrt_eps * xf.abs() + xatol / 3.0;
        tol2 = 2.0 * tol1;
    }

    (xf, fx, evaluations)
}

fn sign_or_one(v: f64) -> f64 {
    if v < 0.0 { -1.0 } else { 1.0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::lattice::VectorSlot;
    use nalgebra::Point2;

    const TOLERANCE: f64 = 1e-9;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    fn image() -> ImageGeometry {
        ImageGeometry {
            width: 200,
            height: 200,
            pixel_size: 1.0,
        }
    }

    fn model(orders: (i32, i32)) -> LatticeModel {
        let mut model = LatticeModel::new(Point2::new(100.0, 100.0), 4.0).unwrap();
        model.set_bessel_orders(orders.0, orders.1);
        model
    }

    #[test]
    fn consistent_lattice_keeps_its_vectors() {
        let mut model = model((3, 1));
        let mut refiner = LatticeRefiner::new(RefinementConfig::default());
        let outcome = refiner.refine(&mut model, &image()).unwrap();

        assert!(f64_approx_equal(outcome.x1, 15.0));
        assert!(f64_approx_equal(outcome.x2, -5.0));
        assert!(outcome.residual <= 1e-8);
        assert_eq!(outcome.iterations, 0);
        assert_eq!(model.base_vector(VectorSlot::First).y, 4.0);
    }

    #[test]
    fn refinement_ties_x2_to_x1_through_orders() {
        let mut model = model((3, 2));
        let mut refiner = LatticeRefiner::new(RefinementConfig::default());
        let outcome = refiner.refine(&mut model, &image()).unwrap();

        assert!(f64_approx_equal(outcome.x1, 12.0));
        assert!(f64_approx_equal(outcome.x2, -8.0));
        let (v1, v2) = model.base_vectors();
        assert!(f64_approx_equal(v1.x, 12.0));
        assert!(f64_approx_equal(v2.x, -8.0));
    }

    #[test]
    fn second_order_flips_when_vector_two_is_right_of_meridian() {
        let mut model = model((3, 1));
        model.set_base_vector(VectorSlot::Second, 5.0, 12.0).unwrap();
        let mut refiner = LatticeRefiner::new(RefinementConfig::default());
        let outcome = refiner.refine(&mut model, &image()).unwrap();
        assert!(f64_approx_equal(outcome.x1, 15.0));
        assert!(f64_approx_equal(outcome.x2, 5.0));
    }

    #[test]
    fn undo_restores_previous_vectors() {
        let mut model = model((3, 2));
        let before = model.clone();
        let mut refiner = LatticeRefiner::new(RefinementConfig::default());
        refiner.refine(&mut model, &image()).unwrap();
        assert_ne!(model, before);

        assert!(refiner.undo(&mut model).unwrap());
        assert_eq!(model, before);
        assert!(!refiner.undo(&mut model).unwrap());
    }

    #[test]
    fn non_convergence_keeps_attempted_values_and_can_be_undone() {
        let mut model = model((3, 2));
        let before = model.clone();
        let config = RefinementConfig {
            tolerance: -1.0,
            ..RefinementConfig::default()
        };
        let mut refiner = LatticeRefiner::new(config);
        let result = refiner.refine(&mut model, &image());

        match result {
            Err(EngineError::NonConvergentRefinement { x1, x2, .. }) => {
                let (v1, v2) = model.base_vectors();
                assert_eq!(v1.x, x1);
                assert_eq!(v2.x, x2);
            }
            other => panic!("expected non-convergence, got {other:?}"),
        }
        refiner.undo(&mut model).unwrap();
        assert_eq!(model, before);
    }

    #[test]
    fn degenerate_orders_do_not_converge() {
        // x2 = 3·x1 keeps vector 2 parallel to vector 1 for every trial x1.
        let mut model = model((1, -3));
        let before = model.clone();
        let mut refiner = LatticeRefiner::new(RefinementConfig::default());
        let result = refiner.refine(&mut model, &image());
        assert!(matches!(
            result,
            Err(EngineError::NonConvergentRefinement { residual, .. }) if residual.is_infinite()
        ));
        assert_eq!(model, before);
    }

    #[test]
    fn zero_first_order_is_rejected() {
        let mut model = model((0, 1));
        let mut refiner = LatticeRefiner::new(RefinementConfig::default());
        let result = refiner.refine(&mut model, &image());
        assert!(matches!(
            result,
            Err(EngineError::InvalidParameter {
                name: "bessel_order_1",
                ..
            })
        ));
        assert!(!refiner.has_snapshot());
    }

    #[test]
    fn bounded_minimize_finds_parabola_vertex() {
        let (x, fx, evaluations) = bounded_minimize(|x| (x - 2.0).powi(2) + 1.0, 0.0, 5.0, 1e-10, 500);
        assert!((x - 2.0).abs() < 1e-6);
        assert!((fx - 1.0).abs() < 1e-10);
        assert!(evaluations < 500);
    }

    #[test]
    fn bounded_minimize_respects_bounds() {
        let (x, _, _) = bounded_minimize(|x| x, 1.0, 3.0, 1e-10, 500);
        assert!((1.0..1.0 + 1e-4).contains(&x));
    }
}

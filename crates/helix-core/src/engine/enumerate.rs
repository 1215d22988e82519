use super::config::EnumerationConfig;
use super::error::EngineError;
use crate::core::models::points::{PointLattice, RealSpacePoint, Window};
use crate::core::utils::geometry::{DEGENERACY_EPSILON, GeometryError, RealSpaceBasis};
use itertools::{Itertools, iproduct};
use nalgebra::Vector2;
use tracing::debug;

/// Generates every lattice point `i·v1 + j·v2` of a real-space basis inside a window.
#[derive(Debug, Clone)]
pub struct RealSpacePointEnumerator {
    config: EnumerationConfig,
}

impl RealSpacePointEnumerator {
    pub fn new(config: EnumerationConfig) -> Self {
        Self { config }
    }

    pub fn enumerate(
        &self,
        basis: &RealSpaceBasis,
        window: &Window,
    ) -> Result<PointLattice, EngineError> {
        if !window.is_valid() {
            return Err(EngineError::InvalidParameter {
                name: "window",
                reason: format!("{window:?} is not a finite, ordered region"),
            });
        }

        let matrix = basis.matrix();
        let (v1, v2) = basis.components();
        let sine = matrix.determinant() / (v1.norm() * v2.norm());
        let inverse = match matrix.try_inverse() {
            Some(inv) if sine.abs() >= DEGENERACY_EPSILON => inv,
            _ => return Err(GeometryError::DegenerateLattice { sine }.into()),
        };

        // The window is convex, so the coefficient ranges are bounded by its corners.
        let coefficients = window
            .corners()
            .iter()
            .map(|&(x, y)| inverse * Vector2::new(x, y))
            .collect_vec();
        let i_range = coefficient_range(coefficients.iter().map(|c| c.x));
        let j_range = coefficient_range(coefficients.iter().map(|c| c.y));

        // Sized in floating point so that huge windows are refused before any integer cast.
        let span = |r: &(f64, f64)| r.1 - r.0 + 1.0;
        let estimated = span(&i_range) * span(&j_range);
        if !estimated.is_finite() || estimated > self.config.max_points as f64 {
            return Err(EngineError::WindowTooLarge {
                estimated,
                limit: self.config.max_points,
            });
        }
        let i_range = (i_range.0 as i64, i_range.1 as i64);
        let j_range = (j_range.0 as i64, j_range.1 as i64);

        let points = iproduct!(i_range.0..=i_range.1, j_range.0..=j_range.1)
            .filter_map(|(i, j)| {
                let p = basis.point(i, j);
                window
                    .contains(p.x, p.y)
                    .then_some(RealSpacePoint { i, j, x: p.x, y: p.y })
            })
            .collect_vec();

        debug!(
            candidates = estimated,
            kept = points.len(),
            "Enumerated real-space lattice points."
        );
        Ok(PointLattice::new(points))
    }
}

fn coefficient_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    (lo.floor(), hi.ceil())
}

use thiserror::Error;

use crate::core::models::lattice::LatticeError;
use crate::core::models::profile::ProfileShapeError;
use crate::core::models::spectrum::SpectrumError;
use crate::core::utils::geometry::GeometryError;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    #[error("Lattice model error: {source}")]
    Lattice {
        #[from]
        source: LatticeError,
    },

    #[error("Lattice geometry error: {source}")]
    Geometry {
        #[from]
        source: GeometryError,
    },

    #[error("Equatorial lattice point ({i}, {j}) is not in the enumerated window")]
    MissingEquatorialPoint { i: i64, j: i64 },

    #[error(
        "Invalid radius range: radius {radius} with error {radius_error} (the radius must be positive and the error in [0, radius))"
    )]
    InvalidRadiusRange { radius: f64, radius_error: f64 },

    #[error("Both query points snap to lattice point ({i}, {j}) and no later point exists to pair with")]
    AmbiguousStrandPair { i: i64, j: i64 },

    #[error(
        "Lattice refinement did not converge: residual {residual:.3e} exceeds tolerance {tolerance:.1e} (x1 = {x1:.4}, x2 = {x2:.4})"
    )]
    NonConvergentRefinement {
        residual: f64,
        tolerance: f64,
        x1: f64,
        x2: f64,
    },

    #[error("Real-space circumference {0:.4} is not positive; check the Bessel orders")]
    NonPositiveCircumference(f64),

    #[error("Enumeration window spans about {estimated:.0} lattice points, more than the limit of {limit}")]
    WindowTooLarge { estimated: f64, limit: usize },

    #[error("Invalid layerline profile: {source}")]
    InvalidProfile {
        #[from]
        source: ProfileShapeError,
    },

    #[error("Power spectrum error: {source}")]
    Spectrum {
        #[from]
        source: SpectrumError,
    },

    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

//! # Core Models Module
//!
//! Data structures describing one indexed power spectrum.
//!
//! ## Key Components
//!
//! - [`lattice`] - The reciprocal-space lattice model (origin, layerline spacing, base vectors
//!   and Bessel orders) and its assignment invariants
//! - [`points`] - Real-space lattice points, the enumeration window and the ordered point set
//! - [`strand`] - Helical strand families and the collection of strand lines drawn on a lattice
//! - [`profile`] - One layerline's radial amplitude and phase profile
//! - [`spectrum`] - The power spectrum arrays, their geometry and layerline guides
//!
//! ## Usage
//!
//! ```ignore
//! use helixdex::core::models::lattice::{LatticeModel, VectorSlot};
//! use nalgebra::Point2;
//!
//! let mut model = LatticeModel::new(Point2::new(100.0, 100.0), 4.0)?;
//! model.set_base_vector(VectorSlot::First, 15.0, 4.0)?;
//! model.set_base_vector(VectorSlot::Second, -5.0, 12.0)?;
//! model.set_bessel_orders(3, 1);
//! ```

pub mod lattice;
pub mod points;
pub mod profile;
pub mod spectrum;
pub mod strand;

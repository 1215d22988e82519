//! # helixdex Core Library
//!
//! A library for indexing the reciprocal-space lattice of helical diffraction patterns and
//! deriving the real-space helical symmetry (rise, twist and n-start) of the specimen.
//!
//! ## Architectural Philosophy
//!
//! The library follows a strict three-layer architecture so that each concern can be tested
//! in isolation:
//!
//! - **[`core`]: The Foundation.** Plain data models (`LatticeModel`, `PointLattice`,
//!   `LayerlineProfile`, `PowerSpectrum`), the reciprocal/real-space transform, special
//!   functions, image moments and the text/CSV formats used to persist parameters and profiles.
//!
//! - **[`engine`]: The Logic Core.** The numerical operations acting on the models: the
//!   constrained lattice refinement, real-space point enumeration, automatic symmetry
//!   extraction, manual strand matching, Bessel profile fitting and diffraction peak prediction.
//!
//! - **[`workflows`]: The Public API.** Complete procedures that chain the engine steps
//!   (refine, enumerate, extract) or build derived products such as the reconstruction command
//!   and a 3D helical model, reporting progress along the way.

pub mod core;
pub mod engine;
pub mod workflows;

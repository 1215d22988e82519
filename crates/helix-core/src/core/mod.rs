//! # Core Module
//!
//! This module provides the fundamental building blocks for helical lattice indexing: the
//! data models describing a power spectrum and its lattice, the geometric transform between
//! reciprocal and real space, and the file formats used to exchange parameters.
//!
//! ## Architecture
//!
//! - **Lattice Representation** ([`models`]) - Lattice model, real-space points, strands,
//!   layerline profiles and the power spectrum container
//! - **File I/O** ([`io`]) - Parameter records, layerline profile CSV files and the
//!   reconstruction command format
//! - **Mathematics** ([`utils`]) - Reciprocal/real-space geometry, Bessel functions,
//!   correlation statistics and intensity moments for filament alignment
//!
//! ## Scientific Foundation
//!
//! The diffraction pattern of a helix is a set of layerlines whose amplitude along the radial
//! direction follows `|J_n(2πRr)|`, where `n` is the Bessel order contributing to the
//! layerline. Two independent reciprocal vectors terminating on layerlines fix the real-space
//! surface lattice of the helix, from which rise, twist and the number of starts follow.

pub mod io;
pub mod models;
pub mod utils;

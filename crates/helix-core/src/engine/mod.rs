//! # Engine Module
//!
//! This module implements the numerical operations of helical lattice indexing. Each operation
//! takes plain models from [`crate::core`] and returns new values or typed errors; nothing here
//! reads files or holds global state.
//!
//! ## Overview
//!
//! Indexing starts from two reciprocal base vectors and their Bessel orders. The refiner moves
//! the vectors until the real-space lattice closes after one turn, the enumerator lays out the
//! real-space points in a window around one turn, and the symmetry extractor reads rise, twist
//! and n-start off the lowest rows. Manual strand matching and Bessel profile fitting work
//! alongside as independent checks.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Tolerances, limits and window expansion for every step
//! - **Refinement** ([`refine`]) - Bounded 1-D search enforcing lattice consistency, with undo
//! - **Enumeration** ([`enumerate`]) - Real-space lattice points inside a rectangular window
//! - **Symmetry** ([`symmetry`]) - Automatic rise, twist and n-start with strand lines
//! - **Strand Matching** ([`strand`]) - Symmetry of a hand-picked strand via an R-tree lookup
//! - **Bessel Fitting** ([`bessel`]) - Layerline profile against `|J_n|` with a phase check
//! - **Peak Prediction** ([`peaks`]) - Labeled diffraction peaks of the refined lattice
//! - **Progress Monitoring** ([`progress`]) - Phase events for callers driving a workflow
//! - **Error Handling** ([`error`]) - Engine error type carrying the offending values

pub mod bessel;
pub mod config;
pub mod enumerate;
pub mod error;
pub mod peaks;
pub mod progress;
pub mod refine;
pub mod strand;
pub mod symmetry;

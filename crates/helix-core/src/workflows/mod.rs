//! # Workflows Module
//!
//! High-level entry points that chain engine operations into the procedures a user runs on
//! one power spectrum.
//!
//! ## Overview
//!
//! Each workflow takes owned models and explicit configuration, reports progress through a
//! [`ProgressReporter`](crate::engine::progress::ProgressReporter) where it has phases, and
//! returns plain data for the caller to print, plot or persist.
//!
//! ## Architecture
//!
//! - **Indexing Workflow** ([`index`]) - Refinement, real-space enumeration and automatic
//!   symmetry extraction in one pass, keeping the refiner for undo
//! - **Layerline Fitting** ([`fit`]) - Profile extraction from a spectrum and Bessel fitting
//! - **Helical Model** ([`model`]) - Reconstruction command defaults and a 3D subunit layout

pub mod fit;
pub mod index;
pub mod model;

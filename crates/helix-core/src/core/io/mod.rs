//! Provides input/output functionality for the files exchanged with the user.
//!
//! This module contains the plain-text parameter record that stores one indexed spectrum,
//! the CSV format for layerline profiles and the formatting of the external helical
//! reconstruction command. File formats share a trait-based interface for reading and
//! writing through buffered streams or paths.

pub mod command;
pub mod params;
pub mod profile;
pub mod traits;

use crate::core::io::command::{PointGroup, ReconstructionCommand};
use crate::core::models::strand::Strand;
use crate::engine::error::EngineError;
use nalgebra::Point3;
use std::f64::consts::PI;
use tracing::{debug, instrument};

const FALLBACK_SUBUNIT_DIAMETER: f64 = 30.0;
const FALLBACK_BOX_DIMENSION: u32 = 200;
/// Samples per rise along a displayed strand curve.
const CURVE_SAMPLES_PER_RISE: usize = 50;
/// Upper bound on subunits plus strand-curve samples in one helical model.
pub const MAX_MODEL_VERTICES: usize = 2_000_000;

/// Everything the reconstruction defaults are derived from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HelixSummary {
    pub strand: Strand,
    pub circumference: f64,
    /// Helix radius in Å, or 0 when unknown.
    pub helix_radius: f64,
    pub pixel_size: f64,
    /// Width of the source image in pixels, if known.
    pub image_width: Option<usize>,
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round_ties_even() / factor
}

/// Suggests the parameters of a helical initial-model simulation.
///
/// The tube diameter comes from the helix radius when it is known and from the real-space
/// circumference otherwise. The subunit diameter assumes one subunit fills the surface patch
/// of one rise on one strand.
pub fn reconstruction_command(summary: &HelixSummary) -> ReconstructionCommand {
    let circumference = if summary.helix_radius != 0.0 {
        2.0 * PI * summary.helix_radius
    } else {
        summary.circumference
    };
    let tube_diameter = (circumference / PI).round_ties_even();

    let strand = summary.strand;
    let subunit_area = circumference * strand.rise / strand.n_start as f64 / PI;
    let subunit_diameter = if strand.n_start > 0 && subunit_area.is_finite() && subunit_area >= 0.0
    {
        (2.0 * subunit_area.sqrt()).round_ties_even()
    } else {
        FALLBACK_SUBUNIT_DIAMETER
    };

    ReconstructionCommand {
        rise: round_to(strand.rise, 2),
        twist: round_to(strand.twist, 1),
        point_group: PointGroup(strand.n_start.max(1)),
        tube_diameter,
        subunit_diameter,
        box_dimension: summary
            .image_width
            .and_then(|w| u32::try_from(w).ok())
            .unwrap_or(FALLBACK_BOX_DIMENSION),
        pixel_size: round_to(summary.pixel_size, 2),
    }
}

/// Subunit positions and strand curves of a helix inside a cubic box, in Å.
#[derive(Debug, Clone, PartialEq)]
pub struct HelicalModel {
    pub tube_radius: f64,
    pub box_length: f64,
    pub subunits: Vec<Point3<f64>>,
    /// One curve per symmetry-related strand.
    pub strands: Vec<Vec<Point3<f64>>>,
}

/// Lays out subunits on a cylinder according to a reconstruction command.
///
/// Subunit `i` of copy `j` sits at height `i·rise` and azimuth `i·twist + j·360/n`.
#[instrument(skip_all, name = "helical_model")]
pub fn helical_model(command: &ReconstructionCommand) -> Result<HelicalModel, EngineError> {
    if !(command.rise > 0.0) {
        return Err(EngineError::InvalidParameter {
            name: "rise",
            reason: format!("{} must be positive to stack subunits", command.rise),
        });
    }
    let copies = command.point_group.order();
    if copies == 0 {
        return Err(EngineError::InvalidParameter {
            name: "point_group",
            reason: "C0 has no copies to place".into(),
        });
    }
    let tube_radius = command.tube_diameter / 2.0;
    let box_length = command.box_dimension as f64 * command.pixel_size;

    let heights = (box_length / command.rise).floor() + 1.0;
    let vertices = copies as f64 * heights * (1.0 + CURVE_SAMPLES_PER_RISE as f64);
    if !vertices.is_finite() || vertices > MAX_MODEL_VERTICES as f64 {
        return Err(EngineError::InvalidParameter {
            name: "rise",
            reason: format!(
                "{} Å in a {box_length:.1} Å box with {copies} copies needs about {vertices:.0} \
                 vertices (limit {MAX_MODEL_VERTICES})",
                command.rise
            ),
        });
    }
    let copy_angle = 360.0 / copies as f64;
    let at = |azimuth: f64, z: f64| {
        let phi = azimuth.to_radians();
        Point3::new(tube_radius * phi.cos(), tube_radius * phi.sin(), z)
    };

    let n_points = (box_length / command.rise) as usize + 1;
    let subunits = (0..n_points)
        .flat_map(|i| (0..copies).map(move |j| (i as f64, j as f64)))
        .map(|(i, j)| at(i * command.twist + j * copy_angle, i * command.rise))
        .collect();

    let step = command.rise / CURVE_SAMPLES_PER_RISE as f64;
    let samples = (box_length / step).ceil() as usize;
    let strands = (0..copies)
        .map(|j| {
            (0..samples)
                .map(|k| {
                    let z = k as f64 * step;
                    at(z / command.rise * command.twist + j as f64 * copy_angle, z)
                })
                .collect()
        })
        .collect();

    debug!(subunits = n_points * copies as usize, "Built helical model.");
    Ok(HelicalModel {
        tube_radius,
        box_length,
        subunits,
        strands,
    })
}

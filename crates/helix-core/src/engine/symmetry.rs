use super::error::EngineError;
use crate::core::models::lattice::HandedOrders;
use crate::core::models::points::{PointLattice, row_height};
use crate::core::models::strand::{Strand, StrandLine};
use crate::core::utils::geometry::RealSpaceBasis;
use tracing::{debug, info};

/// Row steps at or below this height (Å) belong to the same row.
const MIN_ROW_STEP: f64 = 1e-4;
const TWIST_TIE_TOLERANCE: f64 = 1e-9;

/// Symmetry derived automatically from an ordered point lattice.
#[derive(Debug, Clone, PartialEq)]
pub struct SymmetryReport {
    pub strand: Strand,
    pub circumference: f64,
    /// Row number of each lattice point, in lattice order: 0 for the equator, 1 for the first
    /// row above it and so on. Points below the equator have no row number.
    pub sequence_ids: Vec<Option<u32>>,
    /// The strand family through the equatorial points, one line per start.
    pub lines: Vec<StrandLine>,
}

/// Reads rise, twist and n-start off the lowest rows of a point lattice.
///
/// The rise is the height of the first row above the equator. Each point on that row is a
/// candidate for the next subunit along a strand; its azimuth, folded into `(-180°, 180°]`
/// relative to either end of the turn, is a twist candidate and the smallest one wins. Every
/// equatorial point strictly inside one turn starts another equivalent strand.
#[derive(Debug, Clone, Default)]
pub struct SymmetryExtractor;

impl SymmetryExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(
        &self,
        lattice: &PointLattice,
        basis: &RealSpaceBasis,
        orders: HandedOrders,
    ) -> Result<SymmetryReport, EngineError> {
        if orders.first == 0 || orders.second == 0 {
            return Err(EngineError::InvalidParameter {
                name: "bessel_orders",
                reason: format!(
                    "both orders must be non-zero to define two equatorial points, got ({}, {})",
                    orders.first, orders.second
                ),
            });
        }
        let circumference = basis.circumference(orders);
        if !(circumference > 0.0) {
            return Err(EngineError::NonPositiveCircumference(circumference));
        }
        for (i, j) in [(0, 0), (orders.first as i64, orders.second as i64)] {
            if lattice.find(i, j).is_none() {
                return Err(EngineError::MissingEquatorialPoint { i, j });
            }
        }

        let c_rounded = row_height(circumference);
        let mut rise = None;
        let mut twist = 360.0_f64;
        let mut n_start = 1u32;
        let mut seq = 0u32;
        let mut sequence_ids = Vec::with_capacity(lattice.len());
        let points = lattice.points();

        for (idx, p) in points.iter().enumerate() {
            let y_r = row_height(p.y);
            if y_r < 0.0 {
                sequence_ids.push(None);
                continue;
            }
            if y_r == 0.0 {
                seq = 0;
                let x_r = row_height(p.x);
                if 0.0 < x_r && x_r < c_rounded {
                    n_start += 1;
                }
            } else if let Some(prev) = idx.checked_sub(1).map(|k| points[k].y) {
                let step = p.y - prev;
                if step > MIN_ROW_STEP {
                    if seq == 0 {
                        rise = Some(step);
                    }
                    seq += 1;
                }
            }
            sequence_ids.push(Some(seq));

            if seq == 1 {
                let direct = 360.0 * p.x / circumference;
                let wrapped = 360.0 * (p.x - circumference) / circumference;
                let candidate = if direct.abs() <= wrapped.abs() {
                    direct
                } else {
                    wrapped
                };
                if twist.abs() > candidate.abs() + TWIST_TIE_TOLERANCE {
                    twist = candidate;
                } else if (twist + candidate).abs() < TWIST_TIE_TOLERANCE {
                    twist = twist.abs();
                }
            }
        }

        let Some(rise) = rise else {
            return Err(EngineError::InvalidParameter {
                name: "window",
                reason: "no lattice row above the equator lies inside the window".into(),
            });
        };

        let lines = strand_lines(lattice, rise, twist, circumference);
        let strand = Strand {
            rise,
            twist,
            n_start,
        };
        info!(
            rise,
            twist,
            n_start,
            circumference,
            "Extracted helical symmetry."
        );

        Ok(SymmetryReport {
            strand,
            circumference,
            sequence_ids,
            lines,
        })
    }
}

fn strand_lines(
    lattice: &PointLattice,
    rise: f64,
    twist: f64,
    circumference: f64,
) -> Vec<StrandLine> {
    if twist.abs() < TWIST_TIE_TOLERANCE {
        debug!("Twist is zero; strands are vertical and no lines are drawn.");
        return Vec::new();
    }
    let slope = rise * 360.0 / (twist * circumference);
    let c_rounded = row_height(circumference);

    let mut lines: Vec<StrandLine> = Vec::new();
    for p in lattice.iter().filter(|p| row_height(p.y) == 0.0) {
        let x_r = row_height(p.x);
        let excluded = x_r < 0.0
            || x_r > c_rounded
            || (x_r == 0.0 && twist < 0.0)
            || (x_r == c_rounded && twist > 0.0);
        if excluded {
            continue;
        }
        let line = StrandLine::through_equator(p.x, slope, circumference);
        if !lines.contains(&line) {
            lines.push(line);
        }
    }
    lines
}

use super::config::StrandConfig;
use super::error::EngineError;
use crate::core::models::points::{PointLattice, RealSpacePoint, row_height};
use crate::core::models::strand::{Strand, StrandLine};
use nalgebra::Point2;
use rstar::{AABB, PointDistance, RTree, RTreeObject};
use tracing::{debug, info};

/// A lattice point stored in the R-tree together with its position in the lattice.
#[derive(Clone, Debug)]
struct IndexedPoint {
    position: [f64; 2],
    index: usize,
}

impl RTreeObject for IndexedPoint {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.position)
    }
}

impl PointDistance for IndexedPoint {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.position[0] - point[0];
        let dy = self.position[1] - point[1];
        dx * dx + dy * dy
    }
}

/// A strand family picked by hand through two lattice points.
#[derive(Debug, Clone, PartialEq)]
pub struct ManualStrand {
    pub strand: Strand,
    /// The lattice points the two queries snapped to, in query order.
    pub anchors: [RealSpacePoint; 2],
    /// The strand line across one turn (or between the anchors for an axial strand).
    pub line: StrandLine,
}

/// Derives the symmetry of the strand family through two arbitrary lattice points.
///
/// Each query position snaps to its nearest lattice point. The rise and twist are the
/// steps between the two anchors; the number of starts follows from the horizontal gap
/// between the strand line and the nearest parallel line through another lattice point.
pub struct StrandMatcher<'a> {
    lattice: &'a PointLattice,
    tree: RTree<IndexedPoint>,
    circumference: f64,
    config: StrandConfig,
}

impl<'a> StrandMatcher<'a> {
    pub fn new(
        lattice: &'a PointLattice,
        circumference: f64,
        config: StrandConfig,
    ) -> Result<Self, EngineError> {
        if !(circumference > 0.0) {
            return Err(EngineError::NonPositiveCircumference(circumference));
        }
        if lattice.is_empty() {
            return Err(EngineError::InvalidParameter {
                name: "lattice",
                reason: "no lattice points to match against".into(),
            });
        }
        let entries = lattice
            .iter()
            .enumerate()
            .map(|(index, p)| IndexedPoint {
                position: [p.x, p.y],
                index,
            })
            .collect();
        Ok(Self {
            lattice,
            tree: RTree::bulk_load(entries),
            circumference,
            config,
        })
    }

    fn nearest(&self, query: Point2<f64>) -> Result<usize, EngineError> {
        self.tree
            .nearest_neighbor(&[query.x, query.y])
            .map(|entry| entry.index)
            .ok_or_else(|| EngineError::InvalidParameter {
                name: "query",
                reason: format!("no lattice point near ({}, {})", query.x, query.y),
            })
    }

    pub fn match_pair(
        &self,
        first: Point2<f64>,
        second: Point2<f64>,
    ) -> Result<ManualStrand, EngineError> {
        let idx1 = self.nearest(first)?;
        let mut idx2 = self.nearest(second)?;
        if idx1 == idx2 {
            idx2 = idx1 + 1;
        }
        let a = *self.lattice.get(idx1).ok_or(EngineError::InvalidParameter {
            name: "query",
            reason: "nearest point index out of range".into(),
        })?;
        let Some(&b) = self.lattice.get(idx2) else {
            return Err(EngineError::AmbiguousStrandPair { i: a.i, j: a.j });
        };
        debug!(first = ?(a.i, a.j), second = ?(b.i, b.j), "Snapped queries to lattice points.");

        let c = self.circumference;
        let (dx, dy) = (b.x - a.x, b.y - a.y);
        let rise = dy.abs();
        let line = if dx == 0.0 {
            StrandLine::new(Point2::new(a.x, a.y), Point2::new(b.x, b.y))
        } else {
            let slope = dy / dx;
            let y_at_origin = a.y - a.x * slope;
            StrandLine::new(
                Point2::new(0.0, y_at_origin),
                Point2::new(c, c * slope + y_at_origin),
            )
        };

        let strand = if row_height(rise) == 0.0 {
            Strand {
                rise,
                twist: 0.0,
                n_start: 0,
            }
        } else {
            let twist = if b.y > a.y { dx } else { -dx } * 360.0 / c;
            let threshold = c * self.config.coincidence_fraction;
            let gap = self
                .lattice
                .iter()
                .enumerate()
                .filter(|(k, _)| *k != idx1 && *k != idx2)
                .map(|(_, p)| (a.x + (p.y - a.y) * dx / dy - p.x).abs())
                .filter(|&d| d > threshold)
                .fold(f64::INFINITY, f64::min);
            let n_start = if gap.is_finite() {
                (c / gap).round() as u32
            } else {
                debug!("No parallel strand in view; assuming a single start.");
                1
            };
            Strand {
                rise,
                twist,
                n_start,
            }
        };

        info!(
            rise = strand.rise,
            twist = strand.twist,
            n_start = strand.n_start,
            "Matched manual strand."
        );
        Ok(ManualStrand {
            strand,
            anchors: [a, b],
            line,
        })
    }
}

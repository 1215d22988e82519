use std::cmp::Ordering;

/// Number of decimals at which two point heights are considered the same lattice row.
pub const ROW_DECIMALS: i32 = 5;

/// Rounds a height so that points on the same lattice row compare equal despite
/// floating-point noise from the basis combination.
pub fn row_height(y: f64) -> f64 {
    let scale = 10f64.powi(ROW_DECIMALS);
    (y * scale).round() / scale
}

/// One point `i·v1 + j·v2` of the real-space surface lattice, in Å.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RealSpacePoint {
    pub i: i64,
    pub j: i64,
    pub x: f64,
    pub y: f64,
}

impl RealSpacePoint {
    pub fn is_origin(&self) -> bool {
        self.i == 0 && self.j == 0
    }

    /// Canonical ordering of a point lattice: by row height, then by the first coefficient.
    pub fn canonical_cmp(&self, other: &Self) -> Ordering {
        row_height(self.y)
            .total_cmp(&row_height(other.y))
            .then(self.i.cmp(&other.i))
            .then(self.j.cmp(&other.j))
    }
}

/// Number of steps each edge of the display window has been expanded by.
///
/// Negative steps shrink the window below its default extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WindowExpansion {
    pub x_low: i32,
    pub x_high: i32,
    pub y_low: i32,
    pub y_high: i32,
}

/// An axis-aligned real-space region, bounds inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Window {
    pub x_low: f64,
    pub x_high: f64,
    pub y_low: f64,
    pub y_high: f64,
}

impl Window {
    pub fn new(x_low: f64, x_high: f64, y_low: f64, y_high: f64) -> Self {
        Self {
            x_low,
            x_high,
            y_low,
            y_high,
        }
    }

    /// The display window for a lattice of the given circumference.
    ///
    /// `row_height` is `|y1| + |y2|` of the real-space basis. With no expansion the window
    /// spans slightly more than one turn horizontally and five row heights vertically.
    pub fn for_lattice(circumference: f64, row_height: f64, expansion: WindowExpansion) -> Self {
        let grow = |steps: i32| 2f64.powf(steps as f64 / 2.0);
        Self {
            x_low: -0.002 * grow(expansion.x_low) * circumference,
            x_high: (1.0 + 0.002 * grow(expansion.x_high)) * circumference,
            y_low: -0.2 * grow(expansion.y_low),
            y_high: (5.0 + expansion.y_high as f64 / 4.0) * row_height,
        }
    }

    pub fn is_valid(&self) -> bool {
        [self.x_low, self.x_high, self.y_low, self.y_high]
            .iter()
            .all(|v| v.is_finite())
            && self.x_low <= self.x_high
            && self.y_low <= self.y_high
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.x_low <= x && x <= self.x_high && self.y_low <= y && y <= self.y_high
    }

    pub fn contains_origin(&self) -> bool {
        self.contains(0.0, 0.0)
    }

    /// The window mirrored about `y = 0`.
    pub fn reflected(&self) -> Self {
        Self {
            x_low: self.x_low,
            x_high: self.x_high,
            y_low: -self.y_high,
            y_high: -self.y_low,
        }
    }

    pub fn corners(&self) -> [(f64, f64); 4] {
        [
            (self.x_low, self.y_low),
            (self.x_high, self.y_low),
            (self.x_low, self.y_high),
            (self.x_high, self.y_high),
        ]
    }
}

/// The lattice points falling inside a window, kept in canonical order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PointLattice {
    points: Vec<RealSpacePoint>,
}

impl PointLattice {
    pub fn new(mut points: Vec<RealSpacePoint>) -> Self {
        points.sort_by(RealSpacePoint::canonical_cmp);
        Self { points }
    }

    pub fn points(&self) -> &[RealSpacePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RealSpacePoint> {
        self.points.iter()
    }

    pub fn get(&self, index: usize) -> Option<&RealSpacePoint> {
        self.points.get(index)
    }

    pub fn position(&self, i: i64, j: i64) -> Option<usize> {
        self.points.iter().position(|p| p.i == i && p.j == j)
    }

    pub fn find(&self, i: i64, j: i64) -> Option<&RealSpacePoint> {
        self.position(i, j).map(|idx| &self.points[idx])
    }
}

impl<'a> IntoIterator for &'a PointLattice {
    type Item = &'a RealSpacePoint;
    type IntoIter = std::slice::Iter<'a, RealSpacePoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

use nalgebra::Point2;

const SAME_LINE_TOLERANCE: f64 = 1e-9;

/// Helical symmetry of one strand family.
///
/// `rise` is the axial step between consecutive subunits along the helix (Å), `twist` the
/// azimuthal step in degrees (positive for a right-handed progression with increasing height)
/// and `n_start` the number of equivalent strands in one turn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Strand {
    pub rise: f64,
    pub twist: f64,
    pub n_start: u32,
}

/// A straight strand line in real space, given by its two end points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrandLine {
    pub start: Point2<f64>,
    pub end: Point2<f64>,
}

impl StrandLine {
    pub fn new(start: Point2<f64>, end: Point2<f64>) -> Self {
        Self { start, end }
    }

    /// The segment over `x ∈ [0, circumference]` of the line with the given slope passing
    /// through `(x0, 0)`.
    pub fn through_equator(x0: f64, slope: f64, circumference: f64) -> Self {
        let y_at_origin = -slope * x0;
        let y_at_circumference = slope * circumference + y_at_origin;
        Self {
            start: Point2::new(0.0, y_at_origin),
            end: Point2::new(circumference, y_at_circumference),
        }
    }

    fn same_as(&self, other: &Self) -> bool {
        (self.start - other.start).norm() < SAME_LINE_TOLERANCE
            && (self.end - other.end).norm() < SAME_LINE_TOLERANCE
    }
}

/// The strand lines currently drawn over a point lattice.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StrandSet {
    lines: Vec<StrandLine>,
}

impl StrandSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a line unless an identical one is already present. Returns whether it was added.
    pub fn add(&mut self, line: StrandLine) -> bool {
        if self.lines.iter().any(|l| l.same_as(&line)) {
            return false;
        }
        self.lines.push(line);
        true
    }

    pub fn extend<I: IntoIterator<Item = StrandLine>>(&mut self, lines: I) -> usize {
        lines.into_iter().filter(|l| self.add(*l)).count()
    }

    pub fn remove_last(&mut self) -> Option<StrandLine> {
        self.lines.pop()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn lines(&self) -> &[StrandLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

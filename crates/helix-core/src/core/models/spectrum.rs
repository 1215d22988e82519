use super::profile::{LayerlineProfile, ProfileShapeError};
use nalgebra::{DMatrix, Point2};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SpectrumError {
    #[error("Power spectrum is empty")]
    Empty,

    #[error("Phase array is {phase_rows}x{phase_cols} but amplitude array is {rows}x{cols}")]
    ShapeMismatch {
        rows: usize,
        cols: usize,
        phase_rows: usize,
        phase_cols: usize,
    },

    #[error("Invalid pixel size {0}: must be a positive number of Å per pixel")]
    InvalidPixelSize(f64),

    #[error("Layerline spacing {0} must be positive")]
    InvalidSpacing(f64),

    #[error(
        "Profile window rows {row_low}..={row_high}, columns {col_low}..={col_high} fall outside the {rows}x{cols} spectrum"
    )]
    OutOfBounds {
        row_low: i64,
        row_high: i64,
        col_low: i64,
        col_high: i64,
        rows: usize,
        cols: usize,
    },

    #[error("Extracted profile is malformed: {0}")]
    Profile(#[from] ProfileShapeError),
}

/// A centered Fourier power spectrum with its optional phases.
///
/// Row 0 of the matrices is the top of the image. Phases are stored in radians and are
/// zero-filled when the source had no phase information.
#[derive(Debug, Clone, PartialEq)]
pub struct PowerSpectrum {
    amplitude: DMatrix<f64>,
    phase: DMatrix<f64>,
    has_phase: bool,
    pixel_size: f64,
}

impl PowerSpectrum {
    pub fn new(
        amplitude: DMatrix<f64>,
        phase: Option<DMatrix<f64>>,
        pixel_size: f64,
    ) -> Result<Self, SpectrumError> {
        if amplitude.is_empty() {
            return Err(SpectrumError::Empty);
        }
        if !(pixel_size.is_finite() && pixel_size > 0.0) {
            return Err(SpectrumError::InvalidPixelSize(pixel_size));
        }
        let (rows, cols) = amplitude.shape();
        let has_phase = phase.is_some();
        let phase = match phase {
            Some(p) if p.shape() != (rows, cols) => {
                return Err(SpectrumError::ShapeMismatch {
                    rows,
                    cols,
                    phase_rows: p.nrows(),
                    phase_cols: p.ncols(),
                });
            }
            Some(p) => p,
            None => DMatrix::zeros(rows, cols),
        };
        Ok(Self {
            amplitude,
            phase,
            has_phase,
            pixel_size,
        })
    }

    pub fn amplitude(&self) -> &DMatrix<f64> {
        &self.amplitude
    }

    pub fn phase(&self) -> &DMatrix<f64> {
        &self.phase
    }

    pub fn has_phase(&self) -> bool {
        self.has_phase
    }

    pub fn pixel_size(&self) -> f64 {
        self.pixel_size
    }

    pub fn width(&self) -> usize {
        self.amplitude.ncols()
    }

    pub fn height(&self) -> usize {
        self.amplitude.nrows()
    }

    /// The image center, where an unshifted transform has its zero frequency.
    pub fn default_origin(&self) -> Point2<f64> {
        Point2::new(self.width() as f64 / 2.0, self.height() as f64 / 2.0)
    }

    /// Averages the four mirror-related quadrants of the amplitudes.
    ///
    /// Row 0 and column 0 have no mirror partner in an even-sized centered transform and are
    /// kept as they are.
    pub fn symmetrized(&self) -> Self {
        let (rows, cols) = self.amplitude.shape();
        let a = &self.amplitude;
        let averaged = DMatrix::from_fn(rows, cols, |r, c| {
            if r == 0 || c == 0 {
                a[(r, c)]
            } else {
                let (mr, mc) = (rows - r, cols - c);
                (a[(r, c)] + a[(mr, c)] + a[(r, mc)] + a[(mr, mc)]) / 4.0
            }
        });
        Self {
            amplitude: averaged,
            ..self.clone()
        }
    }

    /// Heights of the layerline guides above the origin row, `origin_y + i·spacing`.
    pub fn layerline_rows(&self, origin_y: f64, spacing: f64) -> Result<Vec<f64>, SpectrumError> {
        if !(spacing.is_finite() && spacing > 0.0) {
            return Err(SpectrumError::InvalidSpacing(spacing));
        }
        let count = (self.height() as f64 / (2.0 * spacing)) as usize;
        Ok((1..=count).map(|i| origin_y + i as f64 * spacing).collect())
    }

    /// Axial repeat distance in Å implied by a layerline spacing.
    pub fn repeat_distance(&self, spacing: f64) -> Result<f64, SpectrumError> {
        if !(spacing.is_finite() && spacing > 0.0) {
            return Err(SpectrumError::InvalidSpacing(spacing));
        }
        Ok(self.height() as f64 / spacing * self.pixel_size)
    }

    /// Extracts the radial profile of the layerline between two row offsets from the origin.
    ///
    /// Amplitudes are averaged over rows `rows.0..=rows.1` (in either order) and over a
    /// horizontal window of `width` pixels centered on the origin, then shifted so that the
    /// minimum is zero. Phases are read from the middle row and converted to degrees.
    pub fn layerline_profile(
        &self,
        origin: Point2<f64>,
        rows: (i64, i64),
        width: usize,
    ) -> Result<LayerlineProfile, SpectrumError> {
        let origin_row = origin.y as i64;
        let origin_col = origin.x as i64;
        let (mut y1, mut y2) = (rows.0 + origin_row, rows.1 + origin_row);
        if y1 > y2 {
            std::mem::swap(&mut y1, &mut y2);
        }
        let half = (width as f64 / 2.0).round_ties_even() as i64;
        let (x1, x2) = (origin_col - half, origin_col + half);

        let (nrows, ncols) = self.amplitude.shape();
        if y1 < 0 || x1 < 0 || y2 >= nrows as i64 || x2 >= ncols as i64 {
            return Err(SpectrumError::OutOfBounds {
                row_low: y1,
                row_high: y2,
                col_low: x1,
                col_high: x2,
                rows: nrows,
                cols: ncols,
            });
        }

        let row_count = (y2 - y1 + 1) as f64;
        let mut amplitude: Vec<f64> = (x1..=x2)
            .map(|c| {
                (y1..=y2)
                    .map(|r| self.amplitude[(r as usize, c as usize)])
                    .sum::<f64>()
                    / row_count
            })
            .collect();
        let floor = amplitude.iter().copied().fold(f64::INFINITY, f64::min);
        amplitude.iter_mut().for_each(|a| *a -= floor);

        let phase = self.has_phase.then(|| {
            let phase_row = ((y1 + y2) as f64 / 2.0).round_ties_even() as usize;
            (x1..=x2)
                .map(|c| self.phase[(phase_row, c as usize)].to_degrees())
                .collect()
        });

        Ok(LayerlineProfile::new(
            (-half..=half).collect(),
            amplitude,
            phase,
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn ramp(rows: usize, cols: usize) -> DMatrix<f64> {
        DMatrix::from_fn(rows, cols, |r, c| (r * cols + c) as f64)
    }

    #[test]
    fn rejects_bad_inputs() {
        assert_eq!(
            PowerSpectrum::new(DMatrix::zeros(0, 0), None, 1.0),
            Err(SpectrumError::Empty)
        );
        assert!(matches!(
            PowerSpectrum::new(ramp(4, 4), None, 0.0),
            Err(SpectrumError::InvalidPixelSize(_))
        ));
        assert!(matches!(
            PowerSpectrum::new(ramp(4, 4), Some(DMatrix::zeros(4, 3)), 1.0),
            Err(SpectrumError::ShapeMismatch { phase_cols: 3, .. })
        ));
    }

    #[test]
    fn missing_phase_is_zero_filled() {
        let s = PowerSpectrum::new(ramp(4, 6), None, 1.0).unwrap();
        assert!(!s.has_phase());
        assert_eq!(s.phase().shape(), (4, 6));
        assert!(s.phase().iter().all(|&p| p == 0.0));
        assert_eq!(s.default_origin(), Point2::new(3.0, 2.0));
    }

    #[test]
    fn symmetrize_averages_mirrored_quadrants() {
        let s = PowerSpectrum::new(ramp(4, 4), None, 1.0).unwrap().symmetrized();
        let a = s.amplitude();
        // (1,1), (3,1), (1,3), (3,3) -> 5, 13, 7, 15
        assert_eq!(a[(1, 1)], 10.0);
        assert_eq!(a[(3, 3)], 10.0);
        assert_eq!(a[(0, 2)], 2.0);
        assert_eq!(a[(2, 0)], 8.0);
    }

    #[test]
    fn layerline_guides_cover_half_the_height() {
        let s = PowerSpectrum::new(ramp(200, 200), None, 1.5).unwrap();
        let rows = s.layerline_rows(100.0, 8.0).unwrap();
        assert_eq!(rows.len(), 12);
        assert_eq!(rows[0], 108.0);
        assert_eq!(rows[11], 196.0);
        assert_eq!(s.repeat_distance(8.0).unwrap(), 37.5);
        assert!(s.layerline_rows(100.0, 0.0).is_err());
    }

    #[test]
    fn profile_averages_rows_and_subtracts_minimum() {
        let s = PowerSpectrum::new(ramp(10, 10), None, 1.0).unwrap();
        let profile = s
            .layerline_profile(Point2::new(5.0, 5.0), (2, 1), 4)
            .unwrap();
        assert_eq!(profile.radial_index(), &[-2, -1, 0, 1, 2]);
        assert_eq!(profile.amplitude(), &[0.0, 1.0, 2.0, 3.0, 4.0]);
        assert!(profile.phase().is_none());
    }

    #[test]
    fn profile_reads_phase_of_middle_row_in_degrees() {
        let phase = DMatrix::from_fn(10, 10, |r, _| if r == 7 { PI / 2.0 } else { 0.0 });
        let s = PowerSpectrum::new(ramp(10, 10), Some(phase), 1.0).unwrap();
        let profile = s
            .layerline_profile(Point2::new(5.0, 5.0), (1, 3), 2)
            .unwrap();
        let phases = profile.phase().unwrap();
        assert_eq!(phases.len(), 3);
        assert!(phases.iter().all(|p| (p - 90.0).abs() < 1e-12));
    }

    #[test]
    fn profile_outside_spectrum_is_rejected() {
        let s = PowerSpectrum::new(ramp(10, 10), None, 1.0).unwrap();
        let result = s.layerline_profile(Point2::new(5.0, 5.0), (3, 6), 2);
        assert!(matches!(result, Err(SpectrumError::OutOfBounds { .. })));
    }
}

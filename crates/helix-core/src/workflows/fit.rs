use crate::core::models::profile::LayerlineProfile;
use crate::core::models::spectrum::PowerSpectrum;
use crate::engine::bessel::{BesselFit, BesselProfileFitter};
use crate::engine::config::{FittingConfig, ImageGeometry};
use crate::engine::error::EngineError;
use nalgebra::Point2;
use tracing::{info, instrument};

/// The Bessel order and helix radius a layerline is tested against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BesselHypothesis {
    pub order: i32,
    /// Helix radius in Å.
    pub radius: f64,
    pub radius_error: f64,
}

/// Where on the spectrum a layerline profile is read from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerlineSelection {
    pub origin: Point2<f64>,
    /// Row offsets from the origin bounding the layerline.
    pub rows: (i64, i64),
    /// Horizontal extent in pixels, centered on the origin.
    pub width: usize,
}

/// Fits an already extracted profile.
pub fn run_on_profile(
    profile: &LayerlineProfile,
    hypothesis: &BesselHypothesis,
    image: &ImageGeometry,
    config: &FittingConfig,
) -> Result<BesselFit, EngineError> {
    BesselProfileFitter::new(*config).fit(
        profile,
        hypothesis.order,
        hypothesis.radius,
        hypothesis.radius_error,
        image,
    )
}

/// Reads a layerline profile off a power spectrum and fits it.
#[instrument(skip_all, name = "layerline_fit_workflow")]
pub fn run_on_spectrum(
    spectrum: &PowerSpectrum,
    selection: &LayerlineSelection,
    hypothesis: &BesselHypothesis,
    config: &FittingConfig,
) -> Result<(LayerlineProfile, BesselFit), EngineError> {
    let profile = spectrum.layerline_profile(selection.origin, selection.rows, selection.width)?;
    info!(
        samples = profile.len(),
        has_phase = profile.phase().is_some(),
        "Extracted layerline profile."
    );
    let image = ImageGeometry {
        width: spectrum.width(),
        height: spectrum.height(),
        pixel_size: spectrum.pixel_size(),
    };
    let fit = run_on_profile(&profile, hypothesis, &image, config)?;
    Ok((profile, fit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::utils::special::bessel_j;
    use nalgebra::DMatrix;
    use std::f64::consts::PI;

    fn hypothesis() -> BesselHypothesis {
        BesselHypothesis {
            order: 1,
            radius: 50.0,
            radius_error: 5.0,
        }
    }

    #[test]
    fn fits_profile_read_from_spectrum() {
        let (rows, cols) = (64, 256);
        let scale = 2.0 * PI * 50.0 / (cols as f64 * 1.08);
        let amplitude = DMatrix::from_fn(rows, cols, |r, c| {
            if (40..=42).contains(&r) {
                bessel_j(1, scale * (c as f64 - 128.0)).abs()
            } else {
                0.0
            }
        });
        let spectrum = PowerSpectrum::new(amplitude, None, 1.08).unwrap();
        let selection = LayerlineSelection {
            origin: Point2::new(128.0, 32.0),
            rows: (8, 10),
            width: 40,
        };

        let (profile, fit) =
            run_on_spectrum(&spectrum, &selection, &hypothesis(), &FittingConfig::default())
                .unwrap();
        assert_eq!(profile.len(), 41);
        assert!(fit.correlation.unwrap() > 0.99);
        assert!(fit.phase.is_none());
    }

    #[test]
    fn out_of_bounds_selection_is_reported() {
        let spectrum = PowerSpectrum::new(DMatrix::zeros(16, 16), None, 1.0).unwrap();
        let selection = LayerlineSelection {
            origin: Point2::new(8.0, 8.0),
            rows: (2, 20),
            width: 4,
        };
        let result =
            run_on_spectrum(&spectrum, &selection, &hypothesis(), &FittingConfig::default());
        assert!(matches!(result, Err(EngineError::Spectrum { .. })));
    }
}

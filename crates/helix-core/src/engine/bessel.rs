use super::config::{FittingConfig, ImageGeometry};
use super::error::EngineError;
use crate::core::models::profile::LayerlineProfile;
use crate::core::utils::special::bessel_j;
use crate::core::utils::stats::pearson;
use itertools::Itertools;
use std::f64::consts::PI;
use tracing::{debug, info, instrument};

/// A Bessel amplitude curve sampled on a radial grid.
#[derive(Debug, Clone, PartialEq)]
pub struct BesselCurve {
    /// Helix radius (Å) the curve was computed for.
    pub radius: f64,
    pub radial: Vec<f64>,
    pub values: Vec<f64>,
}

impl BesselCurve {
    fn sample(order: i32, radius: f64, radial: Vec<f64>, image: &ImageGeometry) -> Self {
        let scale = 2.0 * PI * radius / (image.width as f64 * image.pixel_size);
        let values = radial
            .iter()
            .map(|&r| bessel_j(order, scale * r).abs())
            .collect();
        Self {
            radius,
            radial,
            values,
        }
    }

    fn peak_scaled(mut self, target: f64) -> Self {
        let max = self.max();
        let factor = if max > 0.0 { target / max } else { 0.0 };
        self.values.iter_mut().for_each(|v| *v *= factor);
        self
    }

    pub fn max(&self) -> f64 {
        self.values.iter().copied().fold(0.0, f64::max)
    }
}

/// Phase antisymmetry across the meridian.
///
/// For a layerline dominated by one Bessel order `n`, phases at `±r` differ by 0° for even `n`
/// and by 180° for odd `n`.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseCheck {
    pub radial_index: Vec<i64>,
    /// `|phase(r) - phase(-r)|` folded into `[0, 180]`.
    pub difference: Vec<f64>,
    /// Radial positions of the first Bessel maximum on both sides of the meridian.
    pub peak_pair: [i64; 2],
    pub expected: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BesselFit {
    pub order: i32,
    /// Pearson correlation between the data and the Bessel curve on the data grid; `None`
    /// when either has no variance.
    pub correlation: Option<f64>,
    pub curve: BesselCurve,
    /// Curve for `radius - radius_error`.
    pub lower: BesselCurve,
    /// Curve for `radius + radius_error`.
    pub upper: BesselCurve,
    pub phase: Option<PhaseCheck>,
}

/// Compares a layerline amplitude profile against `|J_n(2πRr)|` for an assumed order and radius.
#[derive(Debug, Clone, Default)]
pub struct BesselProfileFitter {
    config: FittingConfig,
}

impl BesselProfileFitter {
    pub fn new(config: FittingConfig) -> Self {
        Self { config }
    }

    #[instrument(skip_all, name = "bessel_fit", fields(order = order, radius = radius))]
    pub fn fit(
        &self,
        profile: &LayerlineProfile,
        order: i32,
        radius: f64,
        radius_error: f64,
        image: &ImageGeometry,
    ) -> Result<BesselFit, EngineError> {
        if !(radius > 0.0) || !(radius_error >= 0.0 && radius_error < radius) {
            return Err(EngineError::InvalidRadiusRange {
                radius,
                radius_error,
            });
        }
        if !(image.pixel_size > 0.0) || image.width == 0 {
            return Err(EngineError::InvalidParameter {
                name: "image",
                reason: format!(
                    "width {} and pixel size {} must both be positive",
                    image.width, image.pixel_size
                ),
            });
        }

        let radial = profile.radial_index().iter().map(|&r| r as f64).collect_vec();
        let data_max = profile.max_amplitude();

        let native = BesselCurve::sample(order, radius, radial.clone(), image);
        let correlation = pearson(&native.values, profile.amplitude());

        let fine = oversampled_grid(&radial, self.config.oversampling);
        let curve = BesselCurve::sample(order, radius, fine.clone(), image).peak_scaled(data_max);
        let lower = BesselCurve::sample(order, radius - radius_error, fine.clone(), image)
            .peak_scaled(data_max);
        let upper =
            BesselCurve::sample(order, radius + radius_error, fine, image).peak_scaled(data_max);

        let phase = profile
            .phase()
            .map(|phase| phase_check(profile.radial_index(), phase, &native, order));

        match correlation {
            Some(cc) => info!(correlation = cc, "Compared layerline profile with Bessel curve."),
            None => debug!("Correlation undefined for a flat profile or curve."),
        }

        Ok(BesselFit {
            order,
            correlation,
            curve,
            lower,
            upper,
            phase,
        })
    }
}

fn oversampled_grid(radial: &[f64], factor: usize) -> Vec<f64> {
    let (Some(&first), Some(&last)) = (radial.first(), radial.last()) else {
        return Vec::new();
    };
    let count = factor * radial.len();
    if count < 2 {
        return vec![first; count];
    }
    let step = (last - first) / (count - 1) as f64;
    (0..count).map(|k| first + k as f64 * step).collect()
}

fn phase_check(
    radial_index: &[i64],
    phase: &[f64],
    native: &BesselCurve,
    order: i32,
) -> PhaseCheck {
    let difference = phase
        .iter()
        .zip(phase.iter().rev())
        .map(|(a, b)| {
            let d = (a - b).abs();
            if d <= 180.0 { d } else { 360.0 - d }
        })
        .collect();
    let max = native.max();
    let peak = native
        .values
        .iter()
        .position(|&v| v == max)
        .and_then(|k| radial_index.get(k))
        .copied()
        .unwrap_or(0);
    PhaseCheck {
        radial_index: radial_index.to_vec(),
        difference,
        peak_pair: [-peak, peak],
        expected: if order % 2 == 0 { 0.0 } else { 180.0 },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    fn image() -> ImageGeometry {
        ImageGeometry {
            width: 256,
            height: 256,
            pixel_size: 1.08,
        }
    }

    fn synthetic_profile(order: i32, radius: f64, phase: Option<Vec<f64>>) -> LayerlineProfile {
        let radial = (-20..=20).collect_vec();
        let scale = 2.0 * PI * radius / (256.0 * 1.08);
        let amplitude = radial
            .iter()
            .map(|&r| 3.0 * bessel_j(order, scale * r as f64).abs())
            .collect();
        LayerlineProfile::new(radial, amplitude, phase).unwrap()
    }

    #[test]
    fn curves_are_non_negative_and_peak_scaled() {
        let profile = synthetic_profile(1, 50.0, None);
        let fit = BesselProfileFitter::default()
            .fit(&profile, 1, 50.0, 5.0, &image())
            .unwrap();

        let data_max = profile.max_amplitude();
        for curve in [&fit.curve, &fit.lower, &fit.upper] {
            assert_eq!(curve.values.len(), 5 * profile.len());
            assert!(curve.values.iter().all(|&v| v >= 0.0));
            assert!((curve.max() - data_max).abs() < TOLERANCE);
            assert_eq!(curve.radial.first(), Some(&-20.0));
            assert!((curve.radial.last().unwrap() - 20.0).abs() < TOLERANCE);
        }
        assert_eq!(fit.lower.radius, 45.0);
        assert_eq!(fit.upper.radius, 55.0);
    }

    #[test]
    fn matching_profile_correlates_perfectly() {
        let profile = synthetic_profile(1, 50.0, None);
        let fit = BesselProfileFitter::default()
            .fit(&profile, 1, 50.0, 5.0, &image())
            .unwrap();
        assert!((fit.correlation.unwrap() - 1.0).abs() < 1e-12);
        assert!(fit.phase.is_none());

        let wrong = BesselProfileFitter::default()
            .fit(&profile, 4, 50.0, 5.0, &image())
            .unwrap();
        assert!(wrong.correlation.unwrap() < 0.9);
    }

    #[test]
    fn invalid_radius_ranges_are_rejected() {
        let profile = synthetic_profile(1, 50.0, None);
        let fitter = BesselProfileFitter::default();
        for (radius, error) in [(50.0, 60.0), (50.0, 50.0), (0.0, 0.0), (-10.0, 1.0), (50.0, -1.0)] {
            assert_eq!(
                fitter.fit(&profile, 1, radius, error, &image()),
                Err(EngineError::InvalidRadiusRange {
                    radius,
                    radius_error: error
                })
            );
        }
    }

    #[test]
    fn flat_profile_has_no_correlation() {
        let profile = LayerlineProfile::new((-3..=3).collect(), vec![0.0; 7], None).unwrap();
        let fit = BesselProfileFitter::default()
            .fit(&profile, 2, 50.0, 0.0, &image())
            .unwrap();
        assert_eq!(fit.correlation, None);
        assert!(fit.curve.values.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn odd_order_phase_check_expects_half_turn() {
        let phase = (-20..=20)
            .map(|r: i64| if r < 0 { -90.0 } else { 90.0 })
            .collect();
        let profile = synthetic_profile(1, 50.0, Some(phase));
        let fit = BesselProfileFitter::default()
            .fit(&profile, 1, 50.0, 5.0, &image())
            .unwrap();
        let check = fit.phase.unwrap();

        assert_eq!(check.expected, 180.0);
        assert_eq!(check.difference[0], 180.0);
        assert_eq!(check.difference[20], 0.0);
        assert_eq!(check.peak_pair[0], -check.peak_pair[1]);
        assert!(check.peak_pair[0] != 0);
    }

    #[test]
    fn phase_difference_wraps_around_full_turn() {
        let mut phase = vec![0.0; 5];
        phase[0] = 10.0;
        phase[4] = 350.0;
        let profile =
            LayerlineProfile::new((-2..=2).collect(), vec![1.0, 2.0, 0.0, 2.0, 1.0], Some(phase))
                .unwrap();
        let check = BesselProfileFitter::default()
            .fit(&profile, 2, 50.0, 0.0, &image())
            .unwrap()
            .phase
            .unwrap();
        assert_eq!(check.expected, 0.0);
        assert!((check.difference[0] - 20.0).abs() < TOLERANCE);
        assert!((check.difference[4] - 20.0).abs() < TOLERANCE);
    }

    #[test]
    fn oversampled_grid_spans_profile() {
        let grid = oversampled_grid(&[-2.0, -1.0, 0.0, 1.0, 2.0], 5);
        assert_eq!(grid.len(), 25);
        assert_eq!(grid[0], -2.0);
        assert!((grid[24] - 2.0).abs() < TOLERANCE);
        assert_eq!(oversampled_grid(&[3.0], 1), vec![3.0]);
    }
}

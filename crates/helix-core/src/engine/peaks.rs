use crate::core::models::lattice::LatticeModel;
use nalgebra::Point2;
use tracing::debug;

/// Number of lattice steps taken below and above the origin along one base vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepRange {
    pub lower: u32,
    pub upper: u32,
}

impl Default for StepRange {
    fn default() -> Self {
        Self { lower: 0, upper: 2 }
    }
}

/// A predicted diffraction peak in pixel coordinates, labeled with its Bessel order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictedPeak {
    pub position: Point2<f64>,
    pub order: i64,
    /// Mirror image across the meridian of a lattice peak.
    pub mirrored: bool,
}

/// Predicts the peaks of the refined reciprocal lattice above the equator.
///
/// Every combination `i·v1 + j·v2` with `i` and `j` inside their step ranges that lands above
/// the origin is a peak with Bessel order `i·n1 - j·n2'`. Its mirror image across the meridian
/// carries the opposite order. The origin itself is always reported with order 0.
pub fn predict_peaks(
    model: &LatticeModel,
    first: StepRange,
    second: StepRange,
) -> Vec<PredictedPeak> {
    let origin = model.origin();
    let (v1, v2) = model.base_vectors();
    let orders = model.handed_orders();

    let mut lattice = vec![PredictedPeak {
        position: origin,
        order: 0,
        mirrored: false,
    }];
    let mut mirrors = Vec::new();

    for i in -(first.lower as i64)..=first.upper as i64 {
        for j in -(second.lower as i64)..=second.upper as i64 {
            let offset = v1 * i as f64 + v2 * j as f64;
            if offset.y <= 0.0 {
                continue;
            }
            let order = i * orders.first as i64 - j * orders.second as i64;
            lattice.push(PredictedPeak {
                position: origin + offset,
                order,
                mirrored: false,
            });
            mirrors.push(PredictedPeak {
                position: Point2::new(origin.x - offset.x, origin.y + offset.y),
                order: -order,
                mirrored: true,
            });
        }
    }

    debug!(peaks = lattice.len() + mirrors.len(), "Predicted diffraction peaks.");
    lattice.extend(mirrors);
    lattice
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::lattice::VectorSlot;

    fn model() -> LatticeModel {
        let mut model = LatticeModel::new(Point2::new(100.0, 100.0), 4.0).unwrap();
        model.set_bessel_orders(3, 1);
        model
    }

    #[test]
    fn default_ranges_label_lattice_peaks() {
        let peaks = predict_peaks(&model(), StepRange::default(), StepRange::default());

        // (i, j) in 0..=2 x 0..=2 minus the origin, all above the equator.
        let lattice: Vec<_> = peaks.iter().filter(|p| !p.mirrored).collect();
        let mirrors: Vec<_> = peaks.iter().filter(|p| p.mirrored).collect();
        assert_eq!(lattice.len(), 9);
        assert_eq!(mirrors.len(), 8);

        assert_eq!(peaks[0].order, 0);
        assert_eq!(peaks[0].position, Point2::new(100.0, 100.0));

        let v1_peak = lattice
            .iter()
            .find(|p| p.position == Point2::new(115.0, 104.0))
            .unwrap();
        assert_eq!(v1_peak.order, 3);
        let v2_peak = lattice
            .iter()
            .find(|p| p.position == Point2::new(95.0, 112.0))
            .unwrap();
        assert_eq!(v2_peak.order, -1);
    }

    #[test]
    fn mirror_peaks_carry_opposite_order() {
        let peaks = predict_peaks(&model(), StepRange::default(), StepRange::default());
        let lattice: Vec<_> = peaks.iter().filter(|p| !p.mirrored && p.order != 0).collect();
        for peak in lattice {
            let mirrored_x = 200.0 - peak.position.x;
            assert!(peaks.iter().any(|m| m.mirrored
                && m.order == -peak.order
                && m.position == Point2::new(mirrored_x, peak.position.y)));
        }
    }

    #[test]
    fn wide_ranges_keep_only_peaks_above_the_equator() {
        let wide = StepRange { lower: 3, upper: 3 };
        let peaks = predict_peaks(&model(), wide, wide);
        assert!(peaks.iter().skip(1).all(|p| p.position.y > 100.0));
        assert!(peaks.iter().any(|p| p.position == Point2::new(80.0, 108.0)));
    }

    #[test]
    fn second_order_follows_vector_handedness() {
        let mut model = model();
        model.set_base_vector(VectorSlot::Second, 5.0, 12.0).unwrap();
        let peaks = predict_peaks(&model, StepRange::default(), StepRange::default());
        let v2_peak = peaks
            .iter()
            .find(|p| !p.mirrored && p.position == Point2::new(105.0, 112.0))
            .unwrap();
        assert_eq!(v2_peak.order, 1);
    }
}

use crate::core::models::lattice::LatticeModel;
use crate::core::models::points::{PointLattice, Window};
use crate::core::utils::geometry::{RealSpaceBasis, reciprocal_to_real};
use crate::engine::config::IndexingConfig;
use crate::engine::enumerate::RealSpacePointEnumerator;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::refine::{LatticeRefiner, RefinementOutcome};
use crate::engine::symmetry::{SymmetryExtractor, SymmetryReport};
use tracing::{info, instrument};

#[derive(Debug, Clone)]
pub struct IndexingResult {
    pub refinement: RefinementOutcome,
    pub basis: RealSpaceBasis,
    pub window: Window,
    pub lattice: PointLattice,
    pub symmetry: SymmetryReport,
}

impl IndexingResult {
    pub fn circumference(&self) -> f64 {
        self.symmetry.circumference
    }
}

/// Refines the model in place and derives its helical symmetry.
///
/// The refiner is returned alongside the result so the caller can undo the refinement later.
/// A failed step leaves the model with whatever the refiner last wrote.
#[instrument(skip_all, name = "indexing_workflow")]
pub fn run(
    model: &mut LatticeModel,
    config: &IndexingConfig,
    reporter: &ProgressReporter,
) -> Result<(IndexingResult, LatticeRefiner), EngineError> {
    // === Phase 1: Refinement ===
    reporter.report(Progress::PhaseStart { name: "Refinement" });
    let mut refiner = LatticeRefiner::new(config.refinement);
    let refinement = refiner.refine(model, &config.image)?;
    reporter.report(Progress::PhaseFinish);

    // === Phase 2: Real-space lattice ===
    reporter.report(Progress::PhaseStart {
        name: "Real-Space Lattice",
    });
    let (v1, v2) = model.base_vectors();
    let basis = reciprocal_to_real(&v1, &v2, config.image.pixel_size, config.image.height as f64)?;
    let orders = model.handed_orders();
    let circumference = basis.circumference(orders);
    if !(circumference > 0.0) {
        return Err(EngineError::NonPositiveCircumference(circumference));
    }

    let (r1, r2) = basis.components();
    let window = Window::for_lattice(circumference, r1.y.abs() + r2.y.abs(), config.window);
    let lattice = RealSpacePointEnumerator::new(config.enumeration).enumerate(&basis, &window)?;
    reporter.report(Progress::Message(format!(
        "{} lattice points in view",
        lattice.len()
    )));
    reporter.report(Progress::PhaseFinish);

    // === Phase 3: Symmetry ===
    reporter.report(Progress::PhaseStart { name: "Symmetry" });
    let symmetry = SymmetryExtractor::new().extract(&lattice, &basis, orders)?;
    reporter.report(Progress::PhaseFinish);

    info!(
        rise = symmetry.strand.rise,
        twist = symmetry.strand.twist,
        n_start = symmetry.strand.n_start,
        "Indexing complete."
    );
    Ok((
        IndexingResult {
            refinement,
            basis,
            window,
            lattice,
            symmetry,
        },
        refiner,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::params::{ParameterRecord, ParamsFile};
    use crate::core::io::traits::RecordFile;
    use crate::engine::config::IndexingConfigBuilder;
    use nalgebra::{Point2, Vector2};
    use std::io::Cursor;
    use std::sync::Mutex;

    const TOLERANCE: f64 = 1e-6;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    fn setup(orders: (i32, i32)) -> (LatticeModel, IndexingConfig) {
        let mut model = LatticeModel::new(Point2::new(100.0, 100.0), 4.0).unwrap();
        model.set_bessel_orders(orders.0, orders.1);
        let config = IndexingConfigBuilder::new()
            .pixel_size(1.0)
            .image_size(200, 200)
            .build()
            .unwrap();
        (model, config)
    }

    #[test]
    fn indexes_one_start_lattice_end_to_end() {
        let (mut model, config) = setup((3, 1));
        let events = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|e| {
            events.lock().unwrap().push(e);
        }));

        let (result, refiner) = run(&mut model, &config, &reporter).unwrap();
        drop(reporter);

        assert!(result.refinement.residual <= 1e-8);
        assert!(f64_approx_equal(result.circumference(), 40.0));
        assert_eq!(result.lattice.len(), 24);
        assert!(f64_approx_equal(result.symmetry.strand.rise, 5.0));
        assert!(f64_approx_equal(result.symmetry.strand.twist, -108.0));
        assert_eq!(result.symmetry.strand.n_start, 1);
        assert!(refiner.has_snapshot());

        let events = events.into_inner().unwrap();
        assert_eq!(events[0], Progress::PhaseStart { name: "Refinement" });
        assert_eq!(
            events.iter().filter(|e| **e == Progress::PhaseFinish).count(),
            3
        );
    }

    #[test]
    fn refined_vectors_are_written_back_and_undoable() {
        let (mut model, config) = setup((3, 2));
        let before = model.base_vectors();
        let (result, mut refiner) = run(&mut model, &config, &ProgressReporter::new()).unwrap();

        assert!(f64_approx_equal(result.symmetry.strand.rise, 50.0 / 11.0));
        assert!(f64_approx_equal(model.base_vectors().0.x, 12.0));

        assert!(refiner.undo(&mut model).unwrap());
        assert_eq!(model.base_vectors(), before);
    }

    /// A (3,2) lattice drawn away from the consistent solution on a 256 px, 1.08 Å/px image.
    fn perturbed_three_two_lattice() -> (LatticeModel, IndexingConfig) {
        let model = LatticeModel::from_parts(
            Point2::new(128.0, 128.0),
            4.0,
            Vector2::new(13.7, 4.0),
            Vector2::new(-6.3, 12.0),
            (3, 2),
        )
        .unwrap();
        let config = IndexingConfigBuilder::new()
            .pixel_size(1.08)
            .image_size(256, 256)
            .build()
            .unwrap();
        (model, config)
    }

    fn relative_difference(a: f64, b: f64) -> f64 {
        (a - b).abs() / a.abs().max(b.abs()).max(f64::MIN_POSITIVE)
    }

    #[test]
    fn perturbed_lattice_refines_to_a_consistent_one() {
        let (mut model, config) = perturbed_three_two_lattice();
        let before = model.base_vectors();
        let (result, _) = run(&mut model, &config, &ProgressReporter::new()).unwrap();

        assert!(result.refinement.residual <= 1e-8);
        assert_ne!(model.base_vectors(), before);
        assert!(result.circumference() > 0.0);
        assert!(result.symmetry.strand.rise > 0.0);
    }

    #[test]
    fn lattice_built_on_the_helical_tie_is_already_consistent() {
        // x2 = -n2·x1/n1 with (n1, n2) = (3, 1) closes the helix for any x1.
        let x1 = 16.5;
        let mut model = LatticeModel::from_parts(
            Point2::new(100.0, 100.0),
            4.0,
            Vector2::new(x1, 4.0),
            Vector2::new(-x1 / 3.0, 12.0),
            (3, 1),
        )
        .unwrap();
        let (_, config) = setup((3, 1));
        let before = model.base_vectors();

        let (result, _) = run(&mut model, &config, &ProgressReporter::new()).unwrap();

        assert!(result.refinement.residual <= 1e-8);
        assert!(f64_approx_equal(model.base_vectors().0.x, before.0.x));
        assert!(f64_approx_equal(model.base_vectors().1.x, before.1.x));
        assert!(result.symmetry.strand.rise > 0.0);
    }

    #[test]
    fn symmetry_survives_a_write_and_reindex_cycle() {
        let (mut model, config) = perturbed_three_two_lattice();
        let (first, _) = run(&mut model, &config, &ProgressReporter::new()).unwrap();

        let record = ParameterRecord::from_model(&model, config.image.pixel_size, 0.0)
            .with_real_space(first.basis)
            .with_symmetry(first.symmetry.strand);
        let mut buffer = Vec::new();
        ParamsFile::write_to(&record, &mut buffer).unwrap();
        let mut reloaded = ParamsFile::read_from(&mut Cursor::new(buffer))
            .unwrap()
            .to_model()
            .unwrap();

        let (second, _) = run(&mut reloaded, &config, &ProgressReporter::new()).unwrap();
        let (a, b) = (first.symmetry.strand, second.symmetry.strand);
        assert!(relative_difference(a.rise, b.rise) <= 1e-6);
        assert!(relative_difference(a.twist, b.twist) <= 1e-6);
        assert_eq!(a.n_start, b.n_start);
    }

    #[test]
    fn negative_circumference_stops_the_workflow() {
        let (mut model, config) = setup((-3, -1));
        let result = run(&mut model, &config, &ProgressReporter::new());
        assert!(result.is_err());
    }
}

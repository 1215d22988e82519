use super::{LoadedLattice, index_lattice, load_lattice};
use crate::cli::IndexArgs;
use crate::error::{CliError, Result};
use helixdex::core::io::params::{ParameterRecord, ParamsFile};
use helixdex::core::io::traits::RecordFile;
use helixdex::workflows::index::IndexingResult;
use tracing::info;

pub fn run(args: IndexArgs) -> Result<()> {
    let mut loaded = load_lattice(&args.lattice)?;

    println!("Indexing lattice from {}...", args.lattice.params.display());
    let (result, _refiner) = index_lattice(&mut loaded)?;

    print_summary(&result);
    if args.show_points {
        print_points(&result);
    }

    if let Some(output) = &args.output {
        let record = updated_record(&loaded, &result);
        info!("Writing refined parameter record to {:?}", output);
        ParamsFile::write_to_path(&record, output)
            .map_err(|e| CliError::file_parsing(output, e))?;
        println!("✓ Refined parameters written to: {}", output.display());
    }

    Ok(())
}

fn updated_record(loaded: &LoadedLattice, result: &IndexingResult) -> ParameterRecord {
    ParameterRecord::from_model(
        &loaded.model,
        loaded.config.image.pixel_size,
        loaded.record.helix_radius,
    )
    .with_real_space(result.basis)
    .with_symmetry(result.symmetry.strand)
}

fn print_summary(result: &IndexingResult) {
    let refinement = &result.refinement;
    let basis = &result.basis;
    let strand = &result.symmetry.strand;

    println!(
        "Refinement:     x1 = {:.4}, x2 = {:.4} (residual {:.2e}, {} evaluations)",
        refinement.x1, refinement.x2, refinement.residual, refinement.iterations
    );
    println!(
        "Real space:     vector 1 = {:.3} Å at {:.2}°, vector 2 = {:.3} Å at {:.2}°",
        basis.first.length, basis.first.angle, basis.second.length, basis.second.angle
    );
    println!("Circumference:  {:.3} Å", result.circumference());
    println!("Lattice points: {}", result.lattice.len());
    println!("Rise/subunit:   {:.4} Å", strand.rise);
    println!("Twist/subunit:  {:.4}°", strand.twist);
    println!("n-start:        {}", strand.n_start);
}

fn print_points(result: &IndexingResult) {
    println!("{:>5} {:>5} {:>12} {:>12} {:>5}", "i", "j", "x (Å)", "y (Å)", "row");
    for (point, row) in result
        .lattice
        .iter()
        .zip(result.symmetry.sequence_ids.iter())
    {
        let row = row.map_or_else(|| "-".to_string(), |r| r.to_string());
        println!(
            "{:>5} {:>5} {:>12.3} {:>12.3} {:>5}",
            point.i, point.j, point.x, point.y, row
        );
    }
}

use crate::cli::FitArgs;
use crate::config::PartialIndexingConfig;
use crate::error::{CliError, Result};
use helixdex::core::io::profile::ProfileCsv;
use helixdex::core::io::traits::RecordFile;
use helixdex::engine::bessel::BesselFit;
use helixdex::engine::config::ImageGeometry;
use helixdex::workflows::fit::{self, BesselHypothesis};
use tracing::{info, warn};

pub fn run(args: FitArgs) -> Result<()> {
    let config = PartialIndexingConfig::load(args.config.as_deref())?.fitting_config()?;

    info!("Loading layerline profile from {:?}", &args.profile);
    let profile = ProfileCsv::read_from_path(&args.profile)
        .map_err(|e| CliError::file_parsing(&args.profile, e))?;

    let hypothesis = BesselHypothesis {
        order: args.order,
        radius: args.radius,
        radius_error: args.radius_error,
    };
    // Only the width enters the Bessel argument.
    let image = ImageGeometry {
        width: args.width,
        height: args.width,
        pixel_size: args.pixel_size,
    };

    let result = fit::run_on_profile(&profile, &hypothesis, &image, &config)?;
    print_fit(&result);
    Ok(())
}

fn print_fit(result: &BesselFit) {
    println!("Bessel order:   {}", result.order);
    match result.correlation {
        Some(r) => println!("Correlation:    {:.4}", r),
        None => {
            warn!("Correlation is undefined for a constant profile or curve.");
            println!("Correlation:    undefined");
        }
    }
    println!(
        "Radius range:   {:.2} / {:.2} / {:.2} Å",
        result.lower.radius, result.curve.radius, result.upper.radius
    );
    println!(
        "Curve samples:  {} (peak {:.4})",
        result.curve.values.len(),
        result.curve.max()
    );

    if let Some(phase) = &result.phase {
        println!(
            "Phase check:    expected {:.0}° difference, first maximum at r = {} / {}",
            phase.expected, phase.peak_pair[0], phase.peak_pair[1]
        );
        println!("{:>8} {:>12}", "r", "Δphase (°)");
        for (r, d) in phase.radial_index.iter().zip(&phase.difference) {
            println!("{:>8} {:>12.1}", r, d);
        }
    }
}

use super::{index_lattice, load_lattice};
use crate::cli::CommandArgs;
use crate::error::{CliError, Result};
use helixdex::core::io::command::PointGroup;
use helixdex::workflows::model::{self, HelixSummary};
use tracing::info;

pub fn run(args: CommandArgs) -> Result<()> {
    let mut loaded = load_lattice(&args.lattice)?;
    let (result, _refiner) = index_lattice(&mut loaded)?;

    let summary = HelixSummary {
        strand: result.symmetry.strand,
        circumference: result.circumference(),
        helix_radius: loaded.record.helix_radius,
        pixel_size: loaded.config.image.pixel_size,
        image_width: Some(loaded.config.image.width),
    };
    let mut command = model::reconstruction_command(&summary);

    if let Some(group) = &args.point_group {
        command.point_group = group
            .parse::<PointGroup>()
            .map_err(|e| CliError::Argument(e.to_string()))?;
    }
    if let Some(box_dimension) = args.box_dimension {
        command.box_dimension = box_dimension;
    }
    info!(point_group = %command.point_group, box_dimension = command.box_dimension, "Reconstruction parameters resolved.");

    println!("{}", command);

    if args.show_model {
        let helix = model::helical_model(&command)?;
        println!(
            "Helical model:  {} subunits on a {:.1} Å radius tube in a {:.1} Å box",
            helix.subunits.len(),
            helix.tube_radius,
            helix.box_length
        );
        println!("{:>10} {:>10} {:>10}", "x (Å)", "y (Å)", "z (Å)");
        for p in &helix.subunits {
            println!("{:>10.2} {:>10.2} {:>10.2}", p.x, p.y, p.z);
        }
    }
    Ok(())
}

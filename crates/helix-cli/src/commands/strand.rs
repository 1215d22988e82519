use super::{index_lattice, load_lattice};
use crate::cli::StrandArgs;
use crate::error::Result;
use helixdex::engine::strand::StrandMatcher;
use nalgebra::Point2;
use tracing::info;

pub fn run(args: StrandArgs) -> Result<()> {
    let mut loaded = load_lattice(&args.lattice)?;
    let (result, _refiner) = index_lattice(&mut loaded)?;

    let matcher = StrandMatcher::new(
        &result.lattice,
        result.circumference(),
        loaded.config.strand,
    )?;
    let from = Point2::new(args.from.0, args.from.1);
    let to = Point2::new(args.to.0, args.to.1);
    info!(?from, ?to, "Matching strand through the picked positions.");
    let manual = matcher.match_pair(from, to)?;

    let [a, b] = manual.anchors;
    println!(
        "Anchors:        ({}, {}) at ({:.3}, {:.3}) Å -> ({}, {}) at ({:.3}, {:.3}) Å",
        a.i, a.j, a.x, a.y, b.i, b.j, b.x, b.y
    );
    println!(
        "Strand line:    ({:.3}, {:.3}) -> ({:.3}, {:.3}) Å",
        manual.line.start.x, manual.line.start.y, manual.line.end.x, manual.line.end.y
    );
    println!("Rise/subunit:   {:.4} Å", manual.strand.rise);
    println!("Twist/subunit:  {:.4}°", manual.strand.twist);
    println!("n-start:        {}", manual.strand.n_start);

    Ok(())
}

use super::{model_from_record, read_record};
use crate::cli::PeaksArgs;
use crate::error::Result;
use helixdex::engine::peaks::{StepRange, predict_peaks};

pub fn run(args: PeaksArgs) -> Result<()> {
    let record = read_record(&args.params)?;
    let model = model_from_record(&record)?;

    let to_range = |(lower, upper): (u32, u32)| StepRange { lower, upper };
    let peaks = predict_peaks(&model, to_range(args.steps1), to_range(args.steps2));

    println!("{:>10} {:>10} {:>6} {:>8}", "x (px)", "y (px)", "order", "mirror");
    for peak in &peaks {
        println!(
            "{:>10.2} {:>10.2} {:>6} {:>8}",
            peak.position.x,
            peak.position.y,
            peak.order,
            if peak.mirrored { "yes" } else { "" }
        );
    }
    Ok(())
}

use crate::error::Result;
use std::fs::File;
use std::path::Path;
use tracing_subscriber::{EnvFilter, fmt, fmt::format::FmtSpan, prelude::*};

/// Overrides the verbosity flags with a full filter, e.g. `helixdex::engine::refine=trace`.
pub const LOG_ENV: &str = "HELIXDEX_LOG";

/// Crates whose events follow the verbosity flags; everything else stays at `warn`.
const OWN_TARGETS: [&str; 2] = ["helixdex", "helixdex_cli"];

fn filter_directives(verbosity: u8, quiet: bool) -> String {
    if quiet {
        return "off".to_string();
    }
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    std::iter::once("warn".to_string())
        .chain(OWN_TARGETS.iter().map(|target| format!("{target}={level}")))
        .collect::<Vec<_>>()
        .join(",")
}

fn build_filter(verbosity: u8, quiet: bool) -> EnvFilter {
    if quiet {
        return EnvFilter::new("off");
    }
    EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(verbosity, quiet)))
}

/// Console output stays compact; the optional log file also records when the refinement,
/// enumeration and symmetry spans close, so their timings can be read back.
pub fn setup_logging(verbosity: u8, quiet: bool, log_file: Option<&Path>) -> Result<()> {
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .compact();

    let file_layer = match log_file {
        Some(path) => Some(
            fmt::layer()
                .with_writer(File::create(path)?)
                .with_ansi(false)
                .with_target(true)
                .with_span_events(FmtSpan::CLOSE),
        ),
        None => None,
    };

    tracing_subscriber::registry()
        .with(build_filter(verbosity, quiet))
        .with(stderr_layer)
        .with(file_layer)
        .init();
    Ok(())
}

use helixdex::engine::progress::{Progress, ProgressCallback};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::warn;

const SPINNER_TICK_MS: u64 = 80;

/// Spinner plus the indexing phase it is currently showing.
struct PhaseSpinner {
    bar: ProgressBar,
    phase: Option<&'static str>,
    completed: usize,
    detail: Option<String>,
}

impl PhaseSpinner {
    fn start(&mut self, name: &'static str) {
        self.phase = Some(name);
        self.detail = None;
        self.bar.reset();
        self.bar.set_prefix(format!("[{}]", self.completed + 1));
        self.bar.set_message(name);
        self.bar
            .enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
    }

    /// Workflow messages (e.g. the number of lattice points in view) annotate the phase line.
    fn annotate(&mut self, detail: String) {
        match self.phase {
            Some(name) => self.bar.set_message(format!("{name}: {detail}")),
            None => self.bar.println(format!("  {detail}")),
        }
        self.detail = Some(detail);
    }

    fn finish(&mut self) {
        let Some(name) = self.phase.take() else {
            return;
        };
        self.completed += 1;
        self.bar.disable_steady_tick();
        let summary = match self.detail.take() {
            Some(detail) => format!("✓ {name}: {detail}"),
            None => format!("✓ {name}"),
        };
        self.bar.finish_with_message(summary);
    }
}

/// Shows the refinement, real-space lattice and symmetry phases as a spinner on stderr.
#[derive(Clone)]
pub struct CliProgressHandler {
    state: Arc<Mutex<PhaseSpinner>>,
}

impl CliProgressHandler {
    pub fn new() -> Self {
        Self::with_draw_target(ProgressDrawTarget::stderr())
    }

    fn with_draw_target(target: ProgressDrawTarget) -> Self {
        let bar = ProgressBar::new_spinner().with_style(Self::spinner_style());
        bar.set_draw_target(target);
        bar.finish_and_clear();

        Self {
            state: Arc::new(Mutex::new(PhaseSpinner {
                bar,
                phase: None,
                completed: 0,
                detail: None,
            })),
        }
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let state = self.state.clone();

        Box::new(move |progress: Progress| {
            let Ok(mut spinner) = state.lock() else {
                warn!("Indexing spinner state was poisoned; dropping progress event.");
                return;
            };

            match progress {
                Progress::PhaseStart { name } => spinner.start(name),
                Progress::Message(detail) => spinner.annotate(detail),
                Progress::PhaseFinish => spinner.finish(),
            }
        })
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::with_template("{prefix:.dim} {spinner:.green} {msg} ({elapsed})")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }
}

impl Default for CliProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}

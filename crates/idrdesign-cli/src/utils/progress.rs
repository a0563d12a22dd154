use idrdesign::engine::progress::{Progress, ProgressCallback};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::warn;

const SPINNER_TICK_MS: u64 = 80;

/// One bar for a whole design run: its length is the number of searches and
/// its message follows the most recent round.
#[derive(Clone)]
pub struct CliProgressHandler {
    pb: Arc<Mutex<ProgressBar>>,
}

impl CliProgressHandler {
    pub fn new() -> Self {
        Self::with_draw_target(ProgressDrawTarget::stderr())
    }

    fn with_draw_target(target: ProgressDrawTarget) -> Self {
        let pb = ProgressBar::new(0)
            .with_style(Self::bar_style())
            .with_message("Initializing...");
        pb.set_draw_target(target);
        pb.finish_and_clear();

        Self {
            pb: Arc::new(Mutex::new(pb)),
        }
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let pb_clone = self.pb.clone();

        Box::new(move |progress: Progress| {
            let Ok(pb_guard) = pb_clone.lock() else {
                warn!("Progress bar mutex was poisoned. Cannot update progress.");
                return;
            };

            match progress {
                Progress::SearchStart {
                    search,
                    total,
                    start,
                    distance,
                } => {
                    if pb_guard.is_finished() {
                        pb_guard.reset();
                        pb_guard.set_length(total as u64);
                        pb_guard.set_position(0);
                        pb_guard.enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
                    }
                    pb_guard.set_message(format!(
                        "search {} from {} (d={:.4})",
                        search + 1,
                        abbreviate(&start),
                        distance
                    ));
                }
                Progress::Round {
                    search,
                    iteration,
                    distance,
                    step_size,
                    ..
                } => {
                    pb_guard.set_message(format!(
                        "search {} round {} (d={:.4}, step={:.2e})",
                        search + 1,
                        iteration,
                        distance,
                        step_size
                    ));
                }
                Progress::SearchFinish {
                    search,
                    iterations,
                    distance,
                } => {
                    pb_guard.inc(1);
                    pb_guard.println(format!(
                        "  ✓ search {} converged after {} round(s), distance {:.6}",
                        search + 1,
                        iterations,
                        distance
                    ));
                    if pb_guard.position() >= pb_guard.length().unwrap_or(0) {
                        pb_guard.disable_steady_tick();
                        pb_guard.finish_with_message("✓ Done");
                    }
                }
                Progress::Message(msg) => {
                    if !pb_guard.is_finished() {
                        pb_guard.println(format!("  {}", msg));
                    } else {
                        pb_guard.set_message(msg);
                    }
                }
            }
        })
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .map(|style| style.progress_chars("##-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
    }
}

impl Default for CliProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}

fn abbreviate(sequence: &str) -> String {
    const SHOWN: usize = 12;
    if sequence.len() <= SHOWN {
        sequence.to_string()
    } else {
        format!("{}…", &sequence[..SHOWN])
    }
}

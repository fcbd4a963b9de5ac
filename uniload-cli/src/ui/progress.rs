//! Terminal rendering of orchestration snapshots.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use uniload::orchestrator::{OrchestrationState, Snapshot};

const BAR_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>3}% {wide_msg}";

const PROGRESS_CHARS: &str = "#>-";

/// Draws one progress bar for a download cycle.
pub struct ProgressRenderer {
    bar: ProgressBar,
    last_state: Option<OrchestrationState>,
    metadata_shown: bool,
}

impl ProgressRenderer {
    pub fn new() -> Self {
        let bar = ProgressBar::new(100);
        match ProgressStyle::with_template(BAR_TEMPLATE) {
            Ok(bar_style) => bar.set_style(bar_style.progress_chars(PROGRESS_CHARS)),
            Err(e) => tracing::debug!(error = %e, "Falling back to default progress style"),
        }
        bar.enable_steady_tick(std::time::Duration::from_millis(120));

        Self {
            bar,
            last_state: None,
            metadata_shown: false,
        }
    }

    /// Reflect `snapshot` on screen.
    pub fn render(&mut self, snapshot: &Snapshot) {
        if !self.metadata_shown {
            if let Some(metadata) = &snapshot.metadata {
                self.bar.println(format!(
                    "{} {}",
                    style("Title:   ").bold(),
                    metadata.display_title()
                ));
                self.bar.println(format!(
                    "{} {}",
                    style("Duration:").bold(),
                    metadata.display_duration()
                ));
                self.bar.println(format!(
                    "{} {}",
                    style("Platform:").bold(),
                    metadata.platform_label
                ));
                self.metadata_shown = true;
            }
        }

        if self.last_state != Some(snapshot.state) {
            self.bar.set_message(snapshot.state.caption());
            self.last_state = Some(snapshot.state);
        }
        self.bar.set_position(snapshot.progress_percent());
    }

    /// Leave the bar in its final state.
    pub fn finish(&self, snapshot: &Snapshot) {
        match snapshot.state {
            OrchestrationState::Completed => {
                self.bar.set_position(100);
                self.bar
                    .finish_with_message(style(snapshot.state.caption()).green().to_string());
            }
            OrchestrationState::Failed => {
                self.bar
                    .abandon_with_message(style(snapshot.state.caption()).red().to_string());
            }
            _ => self.bar.abandon(),
        }
    }
}

impl Default for ProgressRenderer {
    fn default() -> Self {
        Self::new()
    }
}

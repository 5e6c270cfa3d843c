use std::io::IsTerminal;

use indicatif::{ProgressBar, ProgressStyle};
use lmsx_core::{StepOutcome, StepReport};
use lmsx_export::PipelineObserver;

/// Step progress bar on stderr; inert when stderr is not a terminal.
pub struct StepProgress {
    bar: Option<ProgressBar>,
}

fn terminal_columns() -> Option<usize> {
    std::env::var("COLUMNS")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
}

fn bar_template() -> &'static str {
    match terminal_columns() {
        Some(cols) if cols >= 110 => "{bar:40.cyan/blue} {pos}/{len} {msg}",
        Some(cols) if cols >= 80 => "{wide_bar:.cyan/blue} {pos}/{len} {msg}",
        _ => "{wide_bar:.cyan/blue} {percent}% {msg}",
    }
}

impl StepProgress {
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        if !enabled || !std::io::stderr().is_terminal() {
            return Self { bar: None };
        }

        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template(bar_template())
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        Self { bar: Some(bar) }
    }

    pub fn finish_clear(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}

impl PipelineObserver for StepProgress {
    fn planned(&self, steps: usize) {
        if let Some(bar) = &self.bar {
            bar.set_length(u64::try_from(steps).unwrap_or_default());
        }
    }

    fn step_started(&self, name: &str) {
        if let Some(bar) = &self.bar {
            bar.set_message(name.to_string());
        }
    }

    fn step_finished(&self, report: &StepReport) {
        if let Some(bar) = &self.bar {
            if let StepOutcome::Failed { reason } = &report.outcome {
                bar.println(format!("{} failed: {reason}", report.name));
            }
            bar.inc(1);
        }
    }
}

impl Drop for StepProgress {
    fn drop(&mut self) {
        self.finish_clear();
    }
}

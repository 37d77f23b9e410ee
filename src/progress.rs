//! Terminal progress for rollouts
//!
//! Wraps an indicatif bar sized to the number of units. Unit results are
//! printed above the bar and also forwarded to the log.

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use scheduler::{EventSink, LogEvents, Mode, Stage, UnitOutcome, Vertex};

const TEMPLATE: &str = "{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}";

/// Event sink that drives a progress bar
pub struct ConsoleEvents {
    pb: ProgressBar,
    log: LogEvents,
}

impl ConsoleEvents {
    pub fn new(units: usize) -> Self {
        let pb = ProgressBar::new(units as u64);
        let style = ProgressStyle::default_bar()
            .template(TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-");
        pb.set_style(style);
        Self { pb, log: LogEvents }
    }

    /// Remove the bar once the run is over
    pub fn finish(&self) {
        self.pb.finish_and_clear();
    }
}

impl EventSink for ConsoleEvents {
    fn on_run_start(&self, mode: Mode, stages: &[&Stage]) {
        self.log.on_run_start(mode, stages);
    }

    fn on_stage_start(&self, mode: Mode, number: usize, total: usize, stage: &Stage) {
        self.pb.println(format!(
            "{} Stage {number}/{total}: {}",
            "→".cyan(),
            stage.labels().join(", ")
        ));
        self.pb
            .set_message(format!("{} stage {number}/{total}", mode.progressive()));
        self.log.on_stage_start(mode, number, total, stage);
    }

    fn on_vertex_start(&self, mode: Mode, number: usize, vertex: &Vertex) {
        self.log.on_vertex_start(mode, number, vertex);
    }

    fn on_vertex_complete(&self, mode: Mode, number: usize, vertex: &Vertex, outcome: &UnitOutcome) {
        let line = match outcome {
            UnitOutcome::Applied => format!("  {} {} {}", "✓".green(), vertex.label(), mode.past().dimmed()),
            UnitOutcome::Failed { error } => {
                let first = error.lines().next().unwrap_or_default();
                format!("  {} {} ({first})", "✗".red(), vertex.label())
            }
        };
        self.pb.println(line);
        self.pb.inc(1);
        self.log.on_vertex_complete(mode, number, vertex, outcome);
    }

    fn on_stage_complete(&self, mode: Mode, number: usize, total: usize, failed: usize) {
        self.log.on_stage_complete(mode, number, total, failed);
    }
}

impl Drop for ConsoleEvents {
    fn drop(&mut self) {
        if !self.pb.is_finished() {
            self.pb.finish_and_clear();
        }
    }
}

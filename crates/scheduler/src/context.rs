//! Provisioner and event sink traits
//!
//! These traits keep the scheduler independent of how units are actually
//! deployed and of how progress is shown.

use crate::stager::Stage;
use crate::types::{Mode, UnitOutcome, Vertex};
use anyhow::Result;

/// Applies or tears down a single (project, stack) unit
///
/// Calls for different vertices may run concurrently, so implementations
/// must be safe to share across threads. Timeouts and cancellation of an
/// individual call are the provisioner's own business.
pub trait Provisioner: Send + Sync {
    /// Deploy or destroy `vertex`
    fn apply_unit(&self, vertex: &Vertex, mode: Mode) -> Result<()>;
}

impl<F> Provisioner for F
where
    F: Fn(&Vertex, Mode) -> Result<()> + Send + Sync,
{
    fn apply_unit(&self, vertex: &Vertex, mode: Mode) -> Result<()> {
        self(vertex, mode)
    }
}

/// Receives stage and vertex events during execution
///
/// Vertex events arrive from worker threads, stage events from the
/// thread driving the run.
pub trait EventSink: Send + Sync {
    /// Called before the first stage, with stages in execution order
    fn on_run_start(&self, _mode: Mode, _stages: &[&Stage]) {}

    /// Called when a stage is dispatched (`number` is 1-based)
    fn on_stage_start(&self, mode: Mode, number: usize, total: usize, stage: &Stage);

    /// Called when a worker starts on a vertex
    fn on_vertex_start(&self, mode: Mode, number: usize, vertex: &Vertex);

    /// Called when a provisioner call returns
    fn on_vertex_complete(&self, mode: Mode, number: usize, vertex: &Vertex, outcome: &UnitOutcome);

    /// Called once every task of a stage has finished
    fn on_stage_complete(&self, mode: Mode, number: usize, total: usize, failed: usize);
}

/// No-op event sink
pub struct NoEvents;

impl EventSink for NoEvents {
    fn on_stage_start(&self, _mode: Mode, _number: usize, _total: usize, _stage: &Stage) {}
    fn on_vertex_start(&self, _mode: Mode, _number: usize, _vertex: &Vertex) {}
    fn on_vertex_complete(
        &self,
        _mode: Mode,
        _number: usize,
        _vertex: &Vertex,
        _outcome: &UnitOutcome,
    ) {
    }
    fn on_stage_complete(&self, _mode: Mode, _number: usize, _total: usize, _failed: usize) {}
}

/// Event sink that reports through the `log` facade
pub struct LogEvents;

impl EventSink for LogEvents {
    fn on_run_start(&self, mode: Mode, stages: &[&Stage]) {
        log::info!("[{mode}] Execution schedule: {} stage(s)", stages.len());
        for (i, stage) in stages.iter().enumerate() {
            log::info!("[{mode}] stage={} units=[{}]", i + 1, stage.labels().join(", "));
        }
    }

    fn on_stage_start(&self, mode: Mode, number: usize, total: usize, stage: &Stage) {
        log::info!(
            "[{mode}] stage={number}/{total} Executing stage ({} unit(s))",
            stage.len()
        );
    }

    fn on_vertex_start(&self, mode: Mode, number: usize, vertex: &Vertex) {
        log::info!(
            "[{mode}] stage={number} project={} stack={} {}",
            vertex.project,
            vertex.stack,
            mode.progressive()
        );
    }

    fn on_vertex_complete(&self, mode: Mode, number: usize, vertex: &Vertex, outcome: &UnitOutcome) {
        match outcome {
            UnitOutcome::Applied => log::info!(
                "[{mode}] stage={number} project={} stack={} Successfully {}",
                vertex.project,
                vertex.stack,
                mode.past()
            ),
            UnitOutcome::Failed { error } => log::error!(
                "[{mode}] stage={number} project={} stack={} Failed: {error}",
                vertex.project,
                vertex.stack
            ),
        }
    }

    fn on_stage_complete(&self, mode: Mode, number: usize, total: usize, failed: usize) {
        if failed == 0 {
            log::info!("[{mode}] stage={number}/{total} Completed stage");
        } else {
            log::error!("[{mode}] stage={number}/{total} Stage failed: {failed} unit(s) failed");
        }
    }
}

//! Execution engine - drives stages with per-vertex parallelism
//!
//! Stages run strictly one after another. Inside a stage every vertex gets
//! its own worker and the engine waits for all of them before looking at
//! the outcome. Any failure stops the run after that stage; vertices that
//! did succeed are left applied.

use crate::context::{EventSink, NoEvents, Provisioner};
use crate::error::{Error, Result};
use crate::record::RunRecord;
use crate::stager::{Stage, StagePlan};
use crate::types::{ExecuteOptions, Mode, RunSummary, UnitOutcome, Vertex, VertexFailure};
use rayon::prelude::*;
use std::panic::{AssertUnwindSafe, catch_unwind};

/// Execute a plan in the order given by `mode`
///
/// # Arguments
/// * `plan` - Stages computed by the stager
/// * `mode` - Deploy walks stages forward, destroy walks them backward
/// * `provisioner` - Applies individual vertices
/// * `events` - Receives stage and vertex events
/// * `opts` - Worker limits
/// * `record` - Collects vertex outcomes for this run
///
/// # Returns
/// Summary of applied vertices, or the first failing stage
pub fn execute<P, E>(
    plan: &StagePlan,
    mode: Mode,
    provisioner: &P,
    events: &E,
    opts: &ExecuteOptions,
    record: &RunRecord,
) -> Result<RunSummary>
where
    P: Provisioner + ?Sized,
    E: EventSink + ?Sized,
{
    let stages = plan.ordered(mode);
    let total = stages.len();
    let mut summary = RunSummary {
        mode,
        stages: 0,
        applied: Vec::with_capacity(total),
    };

    if stages.is_empty() {
        log::info!("[{mode}] Nothing to do: no units declared");
        return Ok(summary);
    }

    events.on_run_start(mode, &stages);

    for (i, stage) in stages.into_iter().enumerate() {
        let number = i + 1;
        events.on_stage_start(mode, number, total, stage);

        let results = execute_stage(stage, number, mode, provisioner, events, opts, record)?;

        let mut completed = Vec::new();
        let mut failures = Vec::new();
        for (vertex, outcome) in results {
            match outcome {
                UnitOutcome::Applied => completed.push(vertex),
                UnitOutcome::Failed { error } => failures.push(VertexFailure { vertex, error }),
            }
        }

        events.on_stage_complete(mode, number, total, failures.len());

        if !failures.is_empty() {
            return Err(Error::StageFailed {
                stage: number,
                total_stages: total,
                failures,
                completed,
            });
        }

        summary.stages += 1;
        summary.applied.push(completed);
    }

    Ok(summary)
}

/// Execute a plan without event reporting or a caller-owned record
pub fn execute_simple<P>(
    plan: &StagePlan,
    mode: Mode,
    provisioner: &P,
    opts: &ExecuteOptions,
) -> Result<RunSummary>
where
    P: Provisioner + ?Sized,
{
    execute(plan, mode, provisioner, &NoEvents, opts, &RunRecord::new())
}

/// Run every vertex of a stage concurrently and wait for all of them
///
/// Results keep the stage's (project, stack) order.
fn execute_stage<P, E>(
    stage: &Stage,
    number: usize,
    mode: Mode,
    provisioner: &P,
    events: &E,
    opts: &ExecuteOptions,
    record: &RunRecord,
) -> Result<Vec<(Vertex, UnitOutcome)>>
where
    P: Provisioner + ?Sized,
    E: EventSink + ?Sized,
{
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(opts.workers_for(stage.len()))
        .thread_name(move |i| format!("{mode}-stage{number}-{i}"))
        .build()
        .map_err(|e| Error::ThreadPool {
            stage: number,
            message: e.to_string(),
        })?;

    let results = pool.install(|| {
        stage
            .vertices
            .par_iter()
            .with_max_len(1)
            .map(|vertex| {
                events.on_vertex_start(mode, number, vertex);
                let outcome = apply_vertex(provisioner, vertex, mode);
                record.record(vertex, &outcome);
                events.on_vertex_complete(mode, number, vertex, &outcome);
                (vertex.clone(), outcome)
            })
            .collect()
    });

    Ok(results)
}

/// Apply a single vertex, turning errors and panics into a failed outcome
fn apply_vertex<P>(provisioner: &P, vertex: &Vertex, mode: Mode) -> UnitOutcome
where
    P: Provisioner + ?Sized,
{
    match catch_unwind(AssertUnwindSafe(|| provisioner.apply_unit(vertex, mode))) {
        Ok(Ok(())) => UnitOutcome::Applied,
        Ok(Err(e)) => UnitOutcome::Failed {
            error: format!("{e:#}"),
        },
        Err(panic) => {
            let detail = panic
                .downcast_ref::<&str>()
                .map(ToString::to_string)
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            UnitOutcome::Failed {
                error: format!("provisioner panicked: {detail}"),
            }
        }
    }
}

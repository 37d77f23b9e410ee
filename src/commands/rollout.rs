//! `deploy` and `destroy`
//!
//! Loads the plan, shows it, asks for confirmation and then hands the
//! stages to the scheduler with a process-backed provisioner.

use anyhow::{Context as AnyhowContext, Result, bail};
use scheduler::{Error, EventSink, ExecuteOptions, LogEvents, Mode, RunRecord, RunSummary, StagePlan, Vertex};
use std::io::IsTerminal;

use crate::Context;
use crate::cli::RunArgs;
use crate::commands::{LoadedPlan, load_plan};
use crate::config::config_root;
use crate::preview;
use crate::progress::ConsoleEvents;
use crate::provisioner::CommandProvisioner;
use crate::source::ProjectSource;
use crate::ui;

/// Line printed when nothing was applied
pub const NO_CHANGES: &str = "No changes were made";

/// Run a deploy or destroy
pub fn run(ctx: &Context, mode: Mode, args: &RunArgs) -> Result<()> {
    let record = RunRecord::new();
    match execute(ctx, mode, args, &record) {
        Ok(()) => Ok(()),
        Err(e) => {
            for cause in e.chain() {
                log::debug!("{cause}");
            }
            let report = match e.downcast_ref::<Error>() {
                Some(err) => {
                    print_failures(err);
                    failure_report(err, &record.applied())
                }
                None => {
                    ui::error(&format!("{e:#}"));
                    NO_CHANGES.to_string()
                }
            };
            bail!("{report}")
        }
    }
}

fn execute(ctx: &Context, mode: Mode, args: &RunArgs, record: &RunRecord) -> Result<()> {
    let LoadedPlan { config, plan, .. } = load_plan(&ctx.config)?;

    if let Some(out) = plan_output(ctx, &plan, mode, args.preview) {
        print!("{out}");
    }

    if args.preview {
        return Ok(());
    }
    if plan.is_empty() {
        log::info!("[{mode}] Nothing to do");
        if !ctx.json {
            ui::info("Nothing to do");
        }
        return Ok(());
    }

    if !args.yes && std::io::stdin().is_terminal() && !confirm(mode, plan.vertex_count())? {
        ui::warn("Aborted, no changes made");
        return Ok(());
    }

    let source = ProjectSource::from_args(&ctx.source, &config_root(&ctx.config));
    log::info!("Using projects from {}", source.describe());
    let root = source.prepare()?;

    let org = ctx.org.clone().or(config.org);
    let mut provisioner = CommandProvisioner::new(config.provisioner, root, org);
    let opts = ExecuteOptions { jobs: args.jobs };

    let console = ctx
        .show_progress()
        .then(|| ConsoleEvents::new(plan.vertex_count()));
    if console.is_some() {
        provisioner = provisioner.with_stderr_level(log::Level::Info);
    }
    let events: &dyn EventSink = match &console {
        Some(console) => console,
        None => &LogEvents,
    };

    let result = scheduler::execute(&plan, mode, &provisioner, events, &opts, record);
    if let Some(console) = &console {
        console.finish();
    }

    let summary = result?;
    print_summary(ctx, &summary)
}

/// What to print on stdout before running
///
/// JSON runs keep stdout machine-readable: a preview prints the plan as
/// one JSON object and a real run leaves the schedule to the log.
fn plan_output(ctx: &Context, plan: &StagePlan, mode: Mode, preview: bool) -> Option<String> {
    match (ctx.json, preview) {
        (true, true) => Some(format!("{}\n", preview::plan_json(plan, mode))),
        (true, false) => None,
        (false, _) => Some(preview::render_plan(plan, mode)),
    }
}

fn confirm(mode: Mode, units: usize) -> Result<bool> {
    let default = matches!(mode, Mode::Deploy);
    dialoguer::Confirm::new()
        .with_prompt(format!("{} {units} unit(s)?", mode.title()))
        .default(default)
        .interact()
        .context("Failed to read confirmation")
}

fn print_summary(ctx: &Context, summary: &RunSummary) -> Result<()> {
    if ctx.json {
        println!("{}", serde_json::to_string(summary)?);
    } else {
        ui::success(&format!(
            "{} unit(s) {} across {} stage(s)",
            summary.total(),
            summary.mode.past(),
            summary.stages
        ));
    }
    Ok(())
}

fn print_failures(err: &Error) {
    match err {
        Error::StageFailed { failures, .. } => {
            for failure in failures {
                ui::error(&failure.to_string());
            }
        }
        other => ui::error(&other.to_string()),
    }
}

/// One-line account of what a failed run left behind
///
/// `applied` is everything the run applied, so units from earlier stages
/// are named and can be resumed by hand.
pub fn failure_report(err: &Error, applied: &[Vertex]) -> String {
    if err.is_pre_execution() {
        return NO_CHANGES.to_string();
    }
    let Some(stage) = err.failed_stage() else {
        return NO_CHANGES.to_string();
    };

    let (head, in_stage, failed) = match err {
        Error::StageFailed {
            total_stages,
            failures,
            completed,
            ..
        } => (
            format!("Stage {stage} of {total_stages} failed"),
            completed.as_slice(),
            failures.iter().map(|f| &f.vertex).collect::<Vec<_>>(),
        ),
        _ => (format!("Stage {stage} could not start"), &[][..], Vec::new()),
    };

    let earlier: Vec<&Vertex> = applied.iter().filter(|v| !in_stage.contains(*v)).collect();
    format!(
        "{head}; {}; in stage {stage}: applied [{}], failed [{}]",
        earlier_stages(stage, &earlier),
        join(in_stage.iter()),
        join(failed.into_iter())
    )
}

fn earlier_stages(stage: usize, applied: &[&Vertex]) -> String {
    let units = join(applied.iter().copied());
    match stage {
        0 | 1 => "no earlier stages".to_string(),
        2 => format!("stage 1 fully applied [{units}]"),
        n => format!("stages 1..{} fully applied [{units}]", n - 1),
    }
}

fn join<'a>(vertices: impl Iterator<Item = &'a Vertex>) -> String {
    vertices.map(Vertex::label).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use scheduler::VertexFailure;

    fn stage_failed(stage: usize) -> Error {
        Error::StageFailed {
            stage,
            total_stages: 4,
            failures: vec![VertexFailure {
                vertex: Vertex::new("eks", "prod"),
                error: "boom".into(),
            }],
            completed: vec![Vertex::new("eks", "dev")],
        }
    }

    fn write_config(dir: &std::path::Path, body: &str) -> std::path::PathBuf {
        let config = dir.join("projects.yaml");
        std::fs::write(&config, body).unwrap();
        config
    }

    #[test]
    fn test_failure_report_names_earlier_units() {
        let applied = vec![
            Vertex::new("vpc", "dev"),
            Vertex::new("dns", "dev"),
            Vertex::new("eks", "dev"),
        ];
        assert_eq!(
            failure_report(&stage_failed(3), &applied),
            "Stage 3 of 4 failed; stages 1..2 fully applied [vpc:dev, dns:dev]; in stage 3: applied [eks:dev], failed [eks:prod]"
        );
        assert_eq!(
            failure_report(&stage_failed(2), &applied[..1]),
            "Stage 2 of 4 failed; stage 1 fully applied [vpc:dev]; in stage 2: applied [eks:dev], failed [eks:prod]"
        );
    }

    #[test]
    fn test_failure_report_first_stage() {
        let report = failure_report(&stage_failed(1), &[Vertex::new("eks", "dev")]);
        assert_eq!(
            report,
            "Stage 1 of 4 failed; no earlier stages; in stage 1: applied [eks:dev], failed [eks:prod]"
        );
    }

    #[test]
    fn test_failure_report_pre_execution() {
        let missing = Error::MissingDependency {
            project: "eks".into(),
            dependency: "vpc".into(),
        };
        let cycle = Error::Cycle {
            vertices: vec![Vertex::new("a", "x"), Vertex::new("b", "x")],
        };
        let pool = Error::ThreadPool {
            stage: 1,
            message: "no threads".into(),
        };

        assert_eq!(failure_report(&missing, &[]), NO_CHANGES);
        assert_eq!(failure_report(&cycle, &[]), NO_CHANGES);
        assert_eq!(failure_report(&pool, &[]), NO_CHANGES);
    }

    #[test]
    fn test_failure_report_pool_in_later_stage() {
        let pool = Error::ThreadPool {
            stage: 3,
            message: "no threads".into(),
        };
        assert_eq!(
            failure_report(&pool, &[Vertex::new("vpc", "dev"), Vertex::new("eks", "dev")]),
            "Stage 3 could not start; stages 1..2 fully applied [vpc:dev, eks:dev]; in stage 3: applied [], failed []"
        );
    }

    #[test]
    fn test_plan_output_keeps_json_stdout_clean() {
        let plan = StagePlan::default();
        let json = Context {
            json: true,
            ..Context::default()
        };

        let preview = plan_output(&json, &plan, Mode::Deploy, true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&preview).unwrap();
        assert_eq!(value["mode"], "deploy");
        assert!(plan_output(&json, &plan, Mode::Deploy, false).is_none());

        colored::control::set_override(false);
        let table = plan_output(&Context::default(), &plan, Mode::Deploy, false).unwrap();
        assert!(table.contains("Deploy Plan:"));
    }

    #[test]
    fn test_run_reports_no_changes_for_bad_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_config(dir.path(), "projects:\n  - name: eks\n    dependsOn: [vpc]\n");

        let ctx = Context {
            config,
            json: true,
            ..Context::default()
        };
        let args = RunArgs {
            yes: true,
            ..RunArgs::default()
        };

        let err = run(&ctx, Mode::Deploy, &args).unwrap_err();
        assert_eq!(err.to_string(), NO_CHANGES);
    }

    #[test]
    fn test_preview_does_not_touch_source() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_config(dir.path(), "projects:\n  - name: vpc\n    stacks: [dev]\n");

        let ctx = Context {
            config,
            json: true,
            source: crate::cli::SourceArgs {
                path: Some("/definitely/not/here".into()),
                ..Default::default()
            },
            ..Context::default()
        };
        let args = RunArgs {
            preview: true,
            ..RunArgs::default()
        };

        assert!(run(&ctx, Mode::Destroy, &args).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn test_quiet_deploy_names_units_applied_before_failure() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("vpc")).unwrap();
        std::fs::create_dir(dir.path().join("dns")).unwrap();
        // `true` succeeds for every invocation; `eks` has no directory
        let config = write_config(
            dir.path(),
            "projects:\n  - name: vpc\n    stacks: [dev]\n  - name: dns\n    stacks: [dev]\n  - name: eks\n    stacks: [dev]\n    dependsOn: [vpc, dns]\nprovisioner:\n  command: \"true\"\n",
        );

        let ctx = Context {
            config,
            quiet: true,
            ..Context::default()
        };
        let args = RunArgs {
            yes: true,
            ..RunArgs::default()
        };

        let err = run(&ctx, Mode::Deploy, &args).unwrap_err();
        let report = err.to_string();
        assert!(report.starts_with("Stage 2 of 2 failed; stage 1 fully applied ["));
        assert!(report.contains("vpc:dev"));
        assert!(report.contains("dns:dev"));
        assert!(report.ends_with("; in stage 2: applied [], failed [eks:dev]"));
    }
}

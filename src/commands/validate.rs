//! `validate` - check a rollout file without provisioning anything

use anyhow::Result;
use serde::Serialize;

use crate::Context;
use crate::commands::{LoadedPlan, load_plan};
use crate::ui;

/// Counts reported by `validate`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub projects: usize,
    pub units: usize,
    pub dependencies: usize,
    pub stages: usize,
}

impl ValidationReport {
    pub fn from_plan(loaded: &LoadedPlan) -> Self {
        Self {
            projects: scheduler::merge_declarations(&loaded.config.projects).len(),
            units: loaded.graph.len(),
            dependencies: loaded.graph.edge_count(),
            stages: loaded.plan.len(),
        }
    }
}

pub fn run(ctx: &Context) -> Result<()> {
    let loaded = load_plan(&ctx.config)?;
    let report = ValidationReport::from_plan(&loaded);

    if ctx.json {
        println!("{}", serde_json::to_string(&report)?);
        return Ok(());
    }

    ui::header(&format!("Rollout file: {}", ctx.config.display()));
    ui::field("Projects", &report.projects.to_string());
    ui::field("Units", &report.units.to_string());
    ui::field("Dependencies", &report.dependencies.to_string());
    ui::field("Stages", &report.stages.to_string());
    for (i, stage) in loaded.plan.stages().iter().enumerate() {
        ui::field(&format!("Stage {}", i + 1), &ui::label_list(&stage.labels()));
    }
    println!();
    ui::success("Rollout file is valid");
    Ok(())
}

pub mod rollout;
pub mod validate;

use anyhow::Result;
use scheduler::{DependencyGraph, StagePlan};
use std::path::Path;

use crate::config::RolloutConfig;

/// Everything a command needs once the rollout file has been read
#[derive(Debug)]
pub struct LoadedPlan {
    pub config: RolloutConfig,
    pub graph: DependencyGraph,
    pub plan: StagePlan,
}

/// Read the rollout file, then build its graph and stages
///
/// Scheduler errors are returned unwrapped so callers can downcast them.
pub fn load_plan(path: &Path) -> Result<LoadedPlan> {
    let config = RolloutConfig::load(path)?;
    let graph = DependencyGraph::build(&config.projects)?;
    let plan = StagePlan::build(&graph)?;

    log::debug!(
        "Planned {} unit(s) with {} edge(s) into {} stage(s)",
        graph.len(),
        graph.edge_count(),
        plan.len()
    );

    Ok(LoadedPlan {
        config,
        graph,
        plan,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_load_plan() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("projects.yaml");
        fs::write(
            &path,
            "projects:\n  - name: vpc\n    stacks: [dev]\n  - name: eks\n    stacks: [dev]\n    dependsOn: [vpc]\n",
        )
        .unwrap();

        let loaded = load_plan(&path).unwrap();
        assert_eq!(loaded.graph.len(), 2);
        assert_eq!(loaded.plan.len(), 2);
    }

    #[test]
    fn test_load_plan_keeps_scheduler_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("projects.yaml");
        fs::write(
            &path,
            "projects:\n  - name: eks\n    stacks: [dev]\n    dependsOn: [vpc]\n",
        )
        .unwrap();

        let err = load_plan(&path).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<scheduler::Error>(),
            Some(scheduler::Error::MissingDependency { .. })
        ));
    }
}

//! Plan preview rendering
//!
//! Turns a stage plan into a numbered table of `project:stack` labels.
//! Steps are numbered in execution order for both deploy and destroy.
//! `--json` runs get the same stages as a JSON object instead.

use colored::Colorize;
use scheduler::{Mode, StagePlan};

/// Width of the step column
const STEP_WIDTH: usize = 8;

/// Render the plan as it would execute for `mode`
pub fn render_plan(plan: &StagePlan, mode: Mode) -> String {
    let stages = plan.ordered(mode);
    let mut out = String::new();

    out.push('\n');
    out.push_str(&format!("{}\n\n", format!("{} Plan:", mode.title()).magenta().bold()));

    if stages.is_empty() {
        out.push_str(&format!("{}\n", "(nothing to do)".dimmed()));
        return out;
    }

    let max_width = stages
        .iter()
        .flat_map(|stage| stage.vertices.iter())
        .map(|vertex| vertex.label().chars().count())
        .max()
        .unwrap_or(0);
    let separator = "─".repeat(max_width + STEP_WIDTH + 4).dimmed().to_string();

    out.push_str(&format!(
        "{}{}\n\n",
        pad("Step", STEP_WIDTH).blue().bold(),
        "Stacks".blue().bold()
    ));
    out.push_str(&separator);
    out.push('\n');

    for (i, stage) in stages.iter().enumerate() {
        let step = pad(&format!("Step {}", i + 1), STEP_WIDTH);
        for (j, label) in stage.labels().iter().enumerate() {
            let prefix = if j == 0 {
                step.cyan().to_string()
            } else {
                " ".repeat(STEP_WIDTH)
            };
            out.push_str(&format!("{prefix}{}\n", label.bright_black()));
        }
        if i + 1 < stages.len() {
            out.push_str(&separator);
            out.push('\n');
        }
    }

    out.push_str(&separator);
    out.push_str("\n\n");
    out
}

/// Plan as JSON, stages in execution order
pub fn plan_json(plan: &StagePlan, mode: Mode) -> serde_json::Value {
    let stages: Vec<Vec<String>> = plan.ordered(mode).iter().map(|stage| stage.labels()).collect();
    serde_json::json!({
        "mode": mode,
        "stages": stages,
    })
}

/// Left-align `text` in a column of `width`, keeping at least one space
fn pad(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len < width {
        format!("{text}{}", " ".repeat(width - len))
    } else {
        format!("{text} ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scheduler::{DependencyGraph, ProjectDeclaration};

    fn plan() -> StagePlan {
        let graph = DependencyGraph::build(&[
            ProjectDeclaration::new("vpc").with_stacks(["dev", "prod"]),
            ProjectDeclaration::new("eks")
                .with_stacks(["dev"])
                .with_depends_on(["vpc"]),
        ])
        .unwrap();
        StagePlan::build(&graph).unwrap()
    }

    fn plain(plan: &StagePlan, mode: Mode) -> String {
        colored::control::set_override(false);
        render_plan(plan, mode)
    }

    #[test]
    fn test_render_deploy_plan() {
        let out = plain(&plan(), Mode::Deploy);
        let lines: Vec<&str> = out.lines().collect();

        assert!(out.contains("Deploy Plan:"));
        assert!(lines.contains(&"Step 1  vpc:dev"));
        assert!(lines.contains(&"        vpc:prod"));
        assert!(lines.contains(&"Step 2  eks:dev"));

        let step1 = out.find("Step 1").unwrap();
        let step2 = out.find("Step 2").unwrap();
        assert!(step1 < step2);
    }

    #[test]
    fn test_render_destroy_plan_reverses_stages() {
        let out = plain(&plan(), Mode::Destroy);
        let lines: Vec<&str> = out.lines().collect();

        assert!(out.contains("Destroy Plan:"));
        assert!(lines.contains(&"Step 1  eks:dev"));
        assert!(lines.contains(&"Step 2  vpc:dev"));
    }

    #[test]
    fn test_separator_width_tracks_longest_label() {
        let out = plain(&plan(), Mode::Deploy);
        let expected = "─".repeat("vpc:prod".len() + STEP_WIDTH + 4);
        assert!(out.lines().any(|line| line == expected));
    }

    #[test]
    fn test_render_empty_plan() {
        let out = plain(&StagePlan::default(), Mode::Deploy);
        assert!(out.contains("(nothing to do)"));
        assert!(!out.contains("Step 1"));
    }

    #[test]
    fn test_plan_json_follows_execution_order() {
        let value = plan_json(&plan(), Mode::Destroy);
        assert_eq!(value["mode"], "destroy");
        assert_eq!(
            value["stages"],
            serde_json::json!([["eks:dev"], ["vpc:dev", "vpc:prod"]])
        );

        let empty = plan_json(&StagePlan::default(), Mode::Deploy);
        assert_eq!(empty["stages"], serde_json::json!([]));
    }

    #[test]
    fn test_pad() {
        assert_eq!(pad("Step", 8), "Step    ");
        assert_eq!(pad("Step 100", 8), "Step 100 ");
    }
}

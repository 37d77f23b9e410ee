use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rollout")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Deploy and destroy multi-project infrastructure in dependency order", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json: bool,

    /// Path to the rollout file (YAML, JSON or TOML)
    #[arg(
        short,
        long,
        global = true,
        env = "ROLLOUT_CONFIG",
        default_value = "projects.yaml"
    )]
    pub config: PathBuf,

    #[command(flatten)]
    pub source: SourceArgs,

    /// Organization that owns the stacks
    #[arg(long, global = true, env = "ROLLOUT_ORG")]
    pub org: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Clone, Debug, Default)]
pub struct SourceArgs {
    /// Local directory containing one sub-directory per project
    #[arg(long = "path", global = true, conflicts_with = "git_url")]
    pub path: Option<String>,

    /// Git repository containing one sub-directory per project
    #[arg(long, global = true)]
    pub git_url: Option<String>,

    /// Git branch to check out
    #[arg(long, global = true, default_value = "main")]
    pub git_branch: String,
}

#[derive(Subcommand)]
pub enum Command {
    /// Deploy every project stack, dependencies first
    Deploy(RunArgs),

    /// Destroy every project stack, dependents first
    Destroy(RunArgs),

    /// Check the rollout file: references, cycles and stage count
    Validate,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Clone, Debug, Default)]
pub struct RunArgs {
    /// Show the execution plan without changing anything
    #[arg(short, long)]
    pub preview: bool,

    /// Maximum concurrent units per stage (0 = no limit)
    #[arg(short, long, default_value = "0")]
    pub jobs: usize,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_deploy_preview() {
        let cli = Cli::try_parse_from(["rollout", "deploy", "--preview", "--config", "infra.yaml"])
            .unwrap();
        assert_eq!(cli.config, PathBuf::from("infra.yaml"));
        match cli.command {
            Command::Deploy(args) => {
                assert!(args.preview);
                assert_eq!(args.jobs, 0);
                assert!(!args.yes);
            }
            _ => panic!("expected deploy"),
        }
    }

    #[test]
    fn test_parse_destroy_with_source() {
        let cli = Cli::try_parse_from([
            "rollout",
            "--git-url",
            "https://example.com/infra.git",
            "--org",
            "acme",
            "destroy",
            "-y",
            "--jobs",
            "2",
        ])
        .unwrap();
        assert_eq!(cli.org.as_deref(), Some("acme"));
        assert_eq!(cli.source.git_branch, "main");
        assert!(matches!(cli.command, Command::Destroy(RunArgs { yes: true, jobs: 2, .. })));
    }

    #[test]
    fn test_path_conflicts_with_git_url() {
        let result = Cli::try_parse_from([
            "rollout",
            "--path",
            "./infra",
            "--git-url",
            "https://example.com/infra.git",
            "validate",
        ]);
        assert!(result.is_err());
    }
}

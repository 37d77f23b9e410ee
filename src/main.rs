mod cli;
mod commands;
mod config;
mod logging;
mod preview;
mod progress;
mod provisioner;
mod runner;
mod source;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command, SourceArgs};
use scheduler::Mode;
use std::io;
use std::path::PathBuf;
use std::time::Instant;

/// Global context for the application
#[derive(Debug, Clone, Default)]
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
    pub json: bool,
    pub config: PathBuf,
    pub source: SourceArgs,
    pub org: Option<String>,
}

impl Context {
    /// Whether to draw a progress bar instead of relying on log output
    pub fn show_progress(&self) -> bool {
        !self.json && !self.quiet && self.verbose == 0
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(cli.verbose, cli.quiet, cli.json);
    if cli.json {
        ui::disable_colors();
    }

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
        json: cli.json,
        config: cli.config,
        source: cli.source,
        org: cli.org,
    };

    let start = Instant::now();
    let result = match cli.command {
        Command::Deploy(args) => commands::rollout::run(&ctx, Mode::Deploy, &args),
        Command::Destroy(args) => commands::rollout::run(&ctx, Mode::Destroy, &args),
        Command::Validate => commands::validate::run(&ctx),
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "rollout", &mut io::stdout());
            return Ok(());
        }
    };
    log::info!("Finished in {:.2?}", start.elapsed());

    result
}

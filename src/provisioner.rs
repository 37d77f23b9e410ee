//! Provisioner backed by an infrastructure-as-code CLI
//!
//! Each (project, stack) unit maps to `<root>/<project>` and a stack name
//! qualified by the organization, e.g. `acme/prod`.

use anyhow::Result;
use scheduler::{Mode, Provisioner, Vertex};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::ProvisionerConfig;
use crate::runner::{self, Stream};

/// Why a unit could not be applied
#[derive(Debug, Error)]
pub enum UnitError {
    #[error("project directory not found: {}", .0.display())]
    MissingProjectDir(PathBuf),

    #[error("`{command}` exited with {status}{}", format_tail(.stderr_tail))]
    CommandFailed {
        command: String,
        status: String,
        stderr_tail: Vec<String>,
    },
}

fn format_tail(tail: &[String]) -> String {
    if tail.is_empty() {
        String::new()
    } else {
        format!(":\n  {}", tail.join("\n  "))
    }
}

/// Applies units by running the configured CLI in each project directory
#[derive(Debug, Clone)]
pub struct CommandProvisioner {
    config: ProvisionerConfig,
    root: PathBuf,
    org: Option<String>,
    stderr_level: log::Level,
}

impl CommandProvisioner {
    pub fn new(config: ProvisionerConfig, root: PathBuf, org: Option<String>) -> Self {
        Self {
            config,
            root,
            org,
            stderr_level: log::Level::Warn,
        }
    }

    /// Level for the CLI's stderr lines
    ///
    /// A progress bar owns stderr while it is drawn, so console runs pass
    /// `Info` to keep these lines below the default filter.
    pub fn with_stderr_level(mut self, level: log::Level) -> Self {
        self.stderr_level = level;
        self
    }

    fn line_level(&self, stream: Stream) -> log::Level {
        match stream {
            Stream::Stdout => log::Level::Info,
            Stream::Stderr => self.stderr_level,
        }
    }

    /// Stack name as the CLI knows it
    pub fn qualified_stack(&self, stack: &str) -> String {
        match self.org.as_deref() {
            Some(org) if !org.is_empty() => format!("{org}/{stack}"),
            _ => stack.to_string(),
        }
    }

    /// Directory holding the project's program
    pub fn project_dir(&self, project: &str) -> PathBuf {
        self.root.join(project)
    }

    /// Argument lists to run, in order, for one unit
    pub fn invocations(&self, vertex: &Vertex, mode: Mode, dir: &Path) -> Vec<Vec<String>> {
        let stack = self.qualified_stack(&vertex.stack);
        let cwd = dir.to_string_lossy().to_string();

        let select = vec![
            "stack".to_string(),
            "select".to_string(),
            "--create".to_string(),
            stack.clone(),
            "--cwd".to_string(),
            cwd.clone(),
        ];

        let verb = match mode {
            Mode::Deploy => "up",
            Mode::Destroy => "destroy",
        };
        let mut apply = vec![
            verb.to_string(),
            "--yes".to_string(),
            "--skip-preview".to_string(),
            "--stack".to_string(),
            stack,
            "--cwd".to_string(),
            cwd,
        ];
        apply.extend(self.config.args.iter().cloned());

        vec![select, apply]
    }

    fn run(&self, vertex: &Vertex, args: &[String], dir: &Path) -> Result<()> {
        let label = vertex.label();
        log::debug!("[{label}] {} {}", self.config.command, args.join(" "));

        let output = runner::run_streaming(&self.config.command, args, dir, |stream, line| {
            if !line.is_empty() {
                log::log!(self.line_level(stream), "[{label}] {line}");
            }
        })?;

        if output.status.success() {
            Ok(())
        } else {
            Err(UnitError::CommandFailed {
                command: format!("{} {}", self.config.command, args.first().map_or("", String::as_str)),
                status: output.status.to_string(),
                stderr_tail: output.stderr_tail,
            }
            .into())
        }
    }
}

impl Provisioner for CommandProvisioner {
    fn apply_unit(&self, vertex: &Vertex, mode: Mode) -> Result<()> {
        let dir = self.project_dir(&vertex.project);
        if !dir.is_dir() {
            return Err(UnitError::MissingProjectDir(dir).into());
        }

        for args in self.invocations(vertex, mode, &dir) {
            self.run(vertex, &args, &dir)?;
        }
        Ok(())
    }
}

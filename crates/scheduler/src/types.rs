//! Core types for staged rollouts

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A project as declared in the rollout file
///
/// Several declarations may share a name; they are merged before
/// graph construction (see [`crate::merge`]).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDeclaration {
    pub name: String,
    #[serde(default)]
    pub stacks: Vec<String>,
    #[serde(default)]
    pub depends_on: Vec<String>,
}

impl ProjectDeclaration {
    /// Create a declaration with no stacks and no dependencies
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stacks: Vec::new(),
            depends_on: Vec::new(),
        }
    }

    /// Add stacks this project participates in
    pub fn with_stacks<I, S>(mut self, stacks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stacks.extend(stacks.into_iter().map(Into::into));
        self
    }

    /// Add projects this project depends on
    pub fn with_depends_on<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends_on.extend(deps.into_iter().map(Into::into));
        self
    }
}

/// Effective declaration of a project after merging duplicates
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Project {
    pub name: String,
    pub stacks: BTreeSet<String>,
    pub depends_on: BTreeSet<String>,
}

impl Project {
    /// Whether this project is deployed into `stack`
    pub fn has_stack(&self, stack: &str) -> bool {
        self.stacks.contains(stack)
    }

    /// Fold another declaration of the same project into this one
    pub fn absorb(&mut self, decl: &ProjectDeclaration) {
        self.stacks.extend(decl.stacks.iter().cloned());
        self.depends_on.extend(decl.depends_on.iter().cloned());
    }
}

impl From<&ProjectDeclaration> for Project {
    fn from(decl: &ProjectDeclaration) -> Self {
        let mut project = Self {
            name: decl.name.clone(),
            ..Default::default()
        };
        project.absorb(decl);
        project
    }
}

/// One deployable unit: a project inside a stack
///
/// Ordering is by project name, then stack name, which is the
/// presentation order used within a stage.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Vertex {
    pub project: String,
    pub stack: String,
}

impl Vertex {
    pub fn new(project: impl Into<String>, stack: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            stack: stack.into(),
        }
    }

    /// Label used in plans and logs (`project:stack`)
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Vertex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.project, self.stack)
    }
}

/// Direction of a rollout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Producers before consumers
    Deploy,
    /// Consumers before producers
    Destroy,
}

impl Mode {
    /// Verb for log lines ("Deploying", "Destroying")
    pub fn progressive(&self) -> &'static str {
        match self {
            Self::Deploy => "Deploying",
            Self::Destroy => "Destroying",
        }
    }

    /// Past tense ("deployed", "destroyed")
    pub fn past(&self) -> &'static str {
        match self {
            Self::Deploy => "deployed",
            Self::Destroy => "destroyed",
        }
    }

    /// Noun for plan titles ("Deploy", "Destroy")
    pub fn title(&self) -> &'static str {
        match self {
            Self::Deploy => "Deploy",
            Self::Destroy => "Destroy",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deploy => write!(f, "deploy"),
            Self::Destroy => write!(f, "destroy"),
        }
    }
}

/// Result of applying a single vertex
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitOutcome {
    /// The provisioner reported success
    Applied,
    /// The provisioner reported failure
    Failed { error: String },
}

/// A vertex whose provisioner call failed, with its cause
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VertexFailure {
    pub vertex: Vertex,
    pub error: String,
}

impl fmt::Display for VertexFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "project '{}' in stack '{}': {}",
            self.vertex.project, self.vertex.stack, self.error
        )
    }
}

/// Options for execution
#[derive(Debug, Clone, Default)]
pub struct ExecuteOptions {
    /// Maximum concurrent provisioner calls per stage (0 = one per vertex)
    pub jobs: usize,
}

impl ExecuteOptions {
    /// Number of workers to use for a stage of `len` vertices
    pub fn workers_for(&self, len: usize) -> usize {
        let len = len.max(1);
        if self.jobs == 0 { len } else { self.jobs.min(len) }
    }
}

/// Summary of a successful run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub mode: Mode,
    /// Number of stages executed
    pub stages: usize,
    /// Applied vertices, one list per stage in execution order, each
    /// sorted by (project, stack)
    pub applied: Vec<Vec<Vertex>>,
}

impl RunSummary {
    /// Total vertices applied
    pub fn total(&self) -> usize {
        self.applied.iter().map(Vec::len).sum()
    }
}

//! Error types for the scheduler crate

use crate::types::{Vertex, VertexFailure};
use thiserror::Error;

/// Errors that can occur while planning or executing a rollout
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A project depends on a project that was never declared
    #[error("project '{project}' depends on missing project '{dependency}'")]
    MissingDependency { project: String, dependency: String },

    /// Stages cannot be formed because the remaining vertices depend on each other
    #[error("dependency cycle among: {}", join_labels(.vertices))]
    Cycle { vertices: Vec<Vertex> },

    /// One or more provisioner calls in a stage failed
    #[error(
        "stage {stage} of {total_stages} failed: {}",
        .failures.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
    )]
    StageFailed {
        /// 1-based stage number in execution order
        stage: usize,
        total_stages: usize,
        failures: Vec<VertexFailure>,
        /// Vertices of the failed stage that were applied anyway
        completed: Vec<Vertex>,
    },

    /// The worker pool for a stage could not be created
    #[error("failed to start workers for stage {stage}: {message}")]
    ThreadPool { stage: usize, message: String },
}

impl Error {
    /// Whether the error happened before any provisioner call
    ///
    /// `StageFailed` in stage 1 is still an execution error: some
    /// vertices of that stage may have been applied.
    pub fn is_pre_execution(&self) -> bool {
        match self {
            Self::MissingDependency { .. } | Self::Cycle { .. } => true,
            Self::ThreadPool { stage, .. } => *stage == 1,
            Self::StageFailed { .. } => false,
        }
    }

    /// Stage at which execution stopped, if execution started
    pub fn failed_stage(&self) -> Option<usize> {
        match self {
            Self::StageFailed { stage, .. } => Some(*stage),
            Self::ThreadPool { stage, .. } if *stage > 1 => Some(*stage),
            _ => None,
        }
    }
}

fn join_labels(vertices: &[Vertex]) -> String {
    vertices
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type for scheduler operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_dependency_names_both() {
        let err = Error::MissingDependency {
            project: "eks".into(),
            dependency: "vpc".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("eks"));
        assert!(msg.contains("vpc"));
        assert!(err.is_pre_execution());
    }

    #[test]
    fn test_cycle_display() {
        let err = Error::Cycle {
            vertices: vec![Vertex::new("a", "x"), Vertex::new("b", "x")],
        };
        assert_eq!(err.to_string(), "dependency cycle among: a:x, b:x");
        assert!(err.is_pre_execution());
        assert_eq!(err.failed_stage(), None);
    }

    #[test]
    fn test_stage_failed_is_execution_error() {
        let err = Error::StageFailed {
            stage: 2,
            total_stages: 3,
            failures: vec![VertexFailure {
                vertex: Vertex::new("eks", "prod"),
                error: "boom".into(),
            }],
            completed: vec![Vertex::new("rds", "prod")],
        };
        assert!(!err.is_pre_execution());
        assert_eq!(err.failed_stage(), Some(2));
        assert_eq!(
            err.to_string(),
            "stage 2 of 3 failed: project 'eks' in stack 'prod': boom"
        );
    }

    #[test]
    fn test_thread_pool_stage_one_changed_nothing() {
        let err = Error::ThreadPool {
            stage: 1,
            message: "no threads".into(),
        };
        assert!(err.is_pre_execution());

        let later = Error::ThreadPool {
            stage: 3,
            message: "no threads".into(),
        };
        assert!(!later.is_pre_execution());
        assert_eq!(later.failed_stage(), Some(3));
    }
}

//! Topological stager - groups vertices into concurrency-safe stages
//!
//! Leveling is Kahn-style: each pass collects every unplaced vertex whose
//! dependencies were all placed in earlier passes. Every vertex therefore
//! lands in the earliest stage its dependencies allow, and the number of
//! stages equals the length of the longest dependency chain.

use crate::error::{Error, Result};
use crate::graph::DependencyGraph;
use crate::types::{Mode, Vertex};
use std::collections::BTreeSet;

/// A set of vertices that can be applied concurrently
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    /// 0-based position in deploy order
    pub index: usize,
    /// Vertices sorted by project, then stack
    pub vertices: Vec<Vertex>,
}

impl Stage {
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Vertex labels in presentation order
    pub fn labels(&self) -> Vec<String> {
        self.vertices.iter().map(Vertex::label).collect()
    }
}

/// Ordered stages in deploy order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StagePlan {
    stages: Vec<Stage>,
}

impl StagePlan {
    /// Compute stages for a graph
    ///
    /// Fails with [`Error::Cycle`] when some vertices can never be placed;
    /// no partial plan is returned.
    pub fn build(graph: &DependencyGraph) -> Result<Self> {
        let mut placed: BTreeSet<&Vertex> = BTreeSet::new();
        let mut remaining: Vec<&Vertex> = graph.vertices().collect();
        let mut stages = Vec::new();

        while !remaining.is_empty() {
            let (ready, blocked): (Vec<&Vertex>, Vec<&Vertex>) = remaining
                .into_iter()
                .partition(|vertex| graph.dependencies(vertex).all(|dep| placed.contains(dep)));

            if ready.is_empty() {
                return Err(Error::Cycle {
                    vertices: blocked.into_iter().cloned().collect(),
                });
            }

            // Graph iteration order already sorts by (project, stack)
            placed.extend(ready.iter().copied());
            stages.push(Stage {
                index: stages.len(),
                vertices: ready.into_iter().cloned().collect(),
            });
            remaining = blocked;
        }

        Ok(Self { stages })
    }

    /// Stages in deploy order
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Stages in the order they run for `mode`
    ///
    /// Destroy is the exact reverse of deploy.
    pub fn ordered(&self, mode: Mode) -> Vec<&Stage> {
        match mode {
            Mode::Deploy => self.stages.iter().collect(),
            Mode::Destroy => self.stages.iter().rev().collect(),
        }
    }

    /// Stage index (deploy order) that holds `vertex`
    pub fn stage_of(&self, vertex: &Vertex) -> Option<usize> {
        self.stages
            .iter()
            .find(|stage| stage.vertices.contains(vertex))
            .map(|stage| stage.index)
    }

    /// Number of stages
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Whether there is nothing to do
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Total number of vertices across all stages
    pub fn vertex_count(&self) -> usize {
        self.stages.iter().map(Stage::len).sum()
    }
}

//! Dependency graph of (project, stack) vertices
//!
//! Vertices exist for every stack a project participates in. Edges only
//! connect vertices of the same stack: `(dep, s) -> (p, s)` exists when
//! `p` depends on `dep` and both are deployed into `s`. A dependency on a
//! project that is absent from `s` is simply not materialized there.

use crate::error::{Error, Result};
use crate::merge::{ProjectMap, merge_declarations};
use crate::types::{ProjectDeclaration, Vertex};
use std::collections::{BTreeMap, BTreeSet};

/// Immutable vertex and edge set derived from project declarations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    vertices: BTreeSet<Vertex>,
    /// Map from a vertex to the vertices it depends on
    dependencies: BTreeMap<Vertex, BTreeSet<Vertex>>,
}

impl DependencyGraph {
    /// Build the graph from raw declarations
    ///
    /// Duplicate declarations are merged first. Fails if any `dependsOn`
    /// entry names a project that was never declared.
    pub fn build(declarations: &[ProjectDeclaration]) -> Result<Self> {
        let projects = merge_declarations(declarations);
        validate_references(&projects)?;
        Ok(Self::from_projects(&projects))
    }

    /// Build the graph from already merged and validated projects
    pub fn from_projects(projects: &ProjectMap) -> Self {
        let mut graph = Self::default();

        for project in projects.values() {
            for stack in &project.stacks {
                graph.add_vertex(Vertex::new(&project.name, stack));
            }
        }

        for project in projects.values() {
            for stack in &project.stacks {
                let vertex = Vertex::new(&project.name, stack);
                for dep in &project.depends_on {
                    let in_stack = projects.get(dep).is_some_and(|d| d.has_stack(stack));
                    if in_stack {
                        graph.add_edge(Vertex::new(dep, stack), vertex.clone());
                    } else {
                        log::trace!("Skipping {dep} -> {vertex}: '{dep}' is not in stack '{stack}'");
                    }
                }
            }
        }

        graph
    }

    fn add_vertex(&mut self, vertex: Vertex) {
        self.dependencies.entry(vertex.clone()).or_default();
        self.vertices.insert(vertex);
    }

    /// Add edge `from -> to`: `to` depends on `from`
    fn add_edge(&mut self, from: Vertex, to: Vertex) {
        self.dependencies.entry(to).or_default().insert(from);
    }

    /// All vertices, in (project, stack) order
    pub fn vertices(&self) -> impl Iterator<Item = &Vertex> {
        self.vertices.iter()
    }

    /// Whether the graph contains the vertex
    pub fn contains(&self, vertex: &Vertex) -> bool {
        self.vertices.contains(vertex)
    }

    /// Vertices that `vertex` depends on
    pub fn dependencies(&self, vertex: &Vertex) -> impl Iterator<Item = &Vertex> {
        self.dependencies.get(vertex).into_iter().flatten()
    }

    /// Vertices that depend on `vertex`
    pub fn dependents<'a>(&'a self, vertex: &'a Vertex) -> impl Iterator<Item = &'a Vertex> {
        self.dependencies
            .iter()
            .filter(move |(_, deps)| deps.contains(vertex))
            .map(|(v, _)| v)
    }

    /// All edges as `(from, to)` pairs, where `to` depends on `from`
    pub fn edges(&self) -> impl Iterator<Item = (&Vertex, &Vertex)> {
        self.dependencies
            .iter()
            .flat_map(|(to, deps)| deps.iter().map(move |from| (from, to)))
    }

    /// Number of edges
    pub fn edge_count(&self) -> usize {
        self.dependencies.values().map(BTreeSet::len).sum()
    }

    /// Number of vertices
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Whether the graph has no vertices
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

/// Check that every `dependsOn` entry names a declared project
///
/// Projects and dependencies are visited in name order, so the error
/// reported for a given input is always the same.
pub fn validate_references(projects: &ProjectMap) -> Result<()> {
    for project in projects.values() {
        if let Some(missing) = project
            .depends_on
            .iter()
            .find(|dep| !projects.contains_key(*dep))
        {
            return Err(Error::MissingDependency {
                project: project.name.clone(),
                dependency: missing.clone(),
            });
        }
    }
    Ok(())
}

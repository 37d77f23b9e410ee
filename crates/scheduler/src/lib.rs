//! # Scheduler
//!
//! Dependency-aware staged execution for multi-project rollouts.
//!
//! Projects are declared with the stacks they deploy into and the projects
//! they depend on. The scheduler turns those declarations into stages of
//! (project, stack) units that can be applied concurrently, then drives
//! each stage through a provisioner.
//!
//! ## Core Concepts
//!
//! - **ProjectDeclaration**: A named project, its stacks and its dependencies
//! - **Vertex**: One (project, stack) unit, the atom of scheduling
//! - **DependencyGraph**: Vertices plus same-stack dependency edges
//! - **StagePlan**: Vertices grouped into stages, earliest possible first
//! - **Executor**: Applies stages forward (deploy) or backward (destroy)
//!
//! ## Example
//!
//! ```
//! use scheduler::{
//!     DependencyGraph, ExecuteOptions, Mode, ProjectDeclaration, StagePlan, Vertex,
//!     execute_simple,
//! };
//!
//! let declarations = vec![
//!     ProjectDeclaration::new("vpc").with_stacks(["dev"]),
//!     ProjectDeclaration::new("eks")
//!         .with_stacks(["dev"])
//!         .with_depends_on(["vpc"]),
//! ];
//!
//! let graph = DependencyGraph::build(&declarations)?;
//! let plan = StagePlan::build(&graph)?;
//! assert_eq!(plan.len(), 2);
//!
//! let provisioner = |vertex: &Vertex, mode: Mode| -> anyhow::Result<()> {
//!     println!("{mode} {vertex}");
//!     Ok(())
//! };
//! let summary = execute_simple(&plan, Mode::Deploy, &provisioner, &ExecuteOptions::default())?;
//! assert_eq!(summary.total(), 2);
//! # Ok::<(), scheduler::Error>(())
//! ```
//!
//! ## Provider Traits
//!
//! - [`Provisioner`]: Deploys or destroys a single vertex
//! - [`EventSink`]: Receives stage and vertex events
//!
//! Neither trait assumes a particular infrastructure tool or UI.

pub mod context;
pub mod error;
pub mod executor;
pub mod graph;
pub mod merge;
pub mod record;
pub mod stager;
pub mod types;

// Re-export main types at crate root
pub use context::{EventSink, LogEvents, NoEvents, Provisioner};
pub use error::{Error, Result};
pub use executor::{execute, execute_simple};
pub use graph::{DependencyGraph, validate_references};
pub use merge::{ProjectMap, merge_declarations};
pub use record::RunRecord;
pub use stager::{Stage, StagePlan};
pub use types::{
    ExecuteOptions, Mode, Project, ProjectDeclaration, RunSummary, UnitOutcome, Vertex,
    VertexFailure,
};

//! Declaration merging
//!
//! Declarations sharing a project name collapse into one effective
//! [`Project`] whose stacks and dependencies are the union of all of them.
//! The fold is order-independent and idempotent.

use crate::types::{Project, ProjectDeclaration};
use std::collections::BTreeMap;

/// Effective projects keyed by name
pub type ProjectMap = BTreeMap<String, Project>;

/// Fold declarations into one effective project per name
pub fn merge_declarations<'a, I>(declarations: I) -> ProjectMap
where
    I: IntoIterator<Item = &'a ProjectDeclaration>,
{
    declarations
        .into_iter()
        .fold(ProjectMap::new(), |mut projects, decl| {
            projects
                .entry(decl.name.clone())
                .and_modify(|project| project.absorb(decl))
                .or_insert_with(|| Project::from(decl));
            projects
        })
}

//! Dependency edits gated by an edit session.
//!
//! The form picks a dependent task, a prerequisite task and whether to link
//! or unlink them. The graph has the final say: a cycle found at commit time
//! becomes the session's error message.

use serde::{Deserialize, Serialize};

use crate::core::dag::{DependencyGraph, DependencyUpdate};
use crate::core::task::TaskId;
use crate::edit::session::{EditSession, Validate};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyAction {
    #[default]
    Add,
    Remove,
}

/// The dependency form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyEdit {
    pub dependent: Option<TaskId>,
    pub prerequisite: Option<TaskId>,
    pub action: DependencyAction,
}

impl DependencyEdit {
    /// Form for adding a prerequisite to `dependent`.
    pub fn for_task(dependent: TaskId) -> Self {
        Self {
            dependent: Some(dependent),
            ..Self::default()
        }
    }

    pub fn add(dependent: TaskId, prerequisite: TaskId) -> Self {
        Self {
            dependent: Some(dependent),
            prerequisite: Some(prerequisite),
            action: DependencyAction::Add,
        }
    }

    pub fn remove(dependent: TaskId, prerequisite: TaskId) -> Self {
        Self {
            dependent: Some(dependent),
            prerequisite: Some(prerequisite),
            action: DependencyAction::Remove,
        }
    }

    /// Run the edit against `graph`.
    ///
    /// # Errors
    /// `Validation` if an id is missing, otherwise whatever the graph
    /// returns.
    pub fn apply(&self, graph: &mut DependencyGraph) -> Result<DependencyUpdate> {
        let (dependent, prerequisite) = match (self.dependent, self.prerequisite) {
            (Some(d), Some(p)) => (d, p),
            _ => {
                return Err(Error::Validation(
                    "Both tasks must be selected".to_string(),
                ))
            }
        };
        match self.action {
            DependencyAction::Add => graph.add_dependency(dependent, prerequisite),
            DependencyAction::Remove => Ok(graph.remove_dependency(dependent, prerequisite)),
        }
    }
}

impl Validate for DependencyEdit {
    fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.dependent.is_none() {
            errors.push("Task must be selected".to_string());
        }
        if self.prerequisite.is_none() {
            errors.push("Dependency task must be selected".to_string());
        }
        if self.dependent.is_some() && self.dependent == self.prerequisite {
            errors.push("A task cannot depend on itself".to_string());
        }
        errors
    }
}

/// Commit a dependency edit through the graph.
///
/// The session must be Dirty+Valid. Graph errors are folded into the
/// session's error message; the graph and the session's dirtiness are left
/// as they were.
///
/// # Errors
/// `Validation` when the session cannot commit, or the graph error.
pub fn apply_dependency_edit(
    session: &mut EditSession<DependencyEdit>,
    graph: &mut DependencyGraph,
) -> Result<DependencyUpdate> {
    session.commit_with(|edit| edit.apply(graph))
}

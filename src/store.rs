//! Task and milestone stores.
//!
//! The engine does not own domain data. Hosts plug their persistence in
//! through these traits; [`InMemoryStore`] backs tests and embedders that
//! keep everything in memory.

use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::core::milestone::{Milestone, MilestoneId};
use crate::core::task::{ProjectId, TaskId, TaskNode};
use crate::error::{Error, Result};

pub trait TaskStore {
    /// All tasks of a project.
    ///
    /// # Errors
    /// `ProjectNotFound` for unknown projects.
    fn list_tasks_for_project(&self, project_id: ProjectId) -> Result<Vec<TaskNode>>;

    fn get_task(&self, id: TaskId) -> Result<Option<TaskNode>>;

    /// Insert or replace a task.
    fn persist(&mut self, task: TaskNode) -> Result<()>;

    /// Like [`TaskStore::get_task`], but a missing task is an error.
    fn require_task(&self, id: TaskId) -> Result<TaskNode> {
        self.get_task(id)?.ok_or(Error::TaskNotFound(id))
    }
}

pub trait MilestoneStore {
    /// All milestones of a project.
    ///
    /// # Errors
    /// `ProjectNotFound` for unknown projects.
    fn list_milestones_for_project(&self, project_id: ProjectId) -> Result<Vec<Milestone>>;
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    projects: BTreeSet<ProjectId>,
    tasks: BTreeMap<TaskId, TaskNode>,
    milestones: BTreeMap<MilestoneId, Milestone>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a project with no tasks yet.
    pub fn add_project(&mut self, project_id: ProjectId) {
        self.projects.insert(project_id);
    }

    pub fn insert_milestone(&mut self, milestone: Milestone) {
        self.projects.insert(milestone.project_id);
        self.milestones.insert(milestone.id, milestone);
    }

    /// Id one past the highest stored task id.
    pub fn next_task_id(&self) -> TaskId {
        self.tasks
            .keys()
            .next_back()
            .map(|id| TaskId(id.0 + 1))
            .unwrap_or(TaskId(1))
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    fn check_project(&self, project_id: ProjectId) -> Result<()> {
        if self.projects.contains(&project_id) {
            Ok(())
        } else {
            Err(Error::ProjectNotFound(project_id))
        }
    }
}

impl TaskStore for InMemoryStore {
    fn list_tasks_for_project(&self, project_id: ProjectId) -> Result<Vec<TaskNode>> {
        self.check_project(project_id)?;
        Ok(self
            .tasks
            .values()
            .filter(|t| t.project_id == project_id)
            .cloned()
            .collect())
    }

    fn get_task(&self, id: TaskId) -> Result<Option<TaskNode>> {
        Ok(self.tasks.get(&id).cloned())
    }

    fn persist(&mut self, task: TaskNode) -> Result<()> {
        debug!(task = %task.id, project = %task.project_id, "task persisted");
        self.projects.insert(task.project_id);
        self.tasks.insert(task.id, task);
        Ok(())
    }
}

impl MilestoneStore for InMemoryStore {
    fn list_milestones_for_project(&self, project_id: ProjectId) -> Result<Vec<Milestone>> {
        self.check_project(project_id)?;
        Ok(self
            .milestones
            .values()
            .filter(|m| m.project_id == project_id)
            .cloned()
            .collect())
    }
}

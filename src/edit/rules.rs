//! Rule sets for the task and milestone forms.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::core::milestone::{Milestone, MilestoneId};
use crate::core::task::{MemberId, Priority, ProjectId, SubsystemId, TaskId, TaskNode};
use crate::edit::session::{join_errors, Validate};
use crate::error::{Error, Result};

/// Editable fields of a task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskDraft {
    /// `None` for a task that has not been stored yet.
    pub id: Option<TaskId>,
    pub title: String,
    pub project_id: Option<ProjectId>,
    pub subsystem_id: Option<SubsystemId>,
    pub estimated_hours: Option<f64>,
    pub actual_hours: f64,
    pub priority: Priority,
    pub progress: i64,
    pub completed: bool,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub assigned_members: BTreeSet<MemberId>,
}

impl TaskDraft {
    /// Blank form for a new task in `project_id`, starting on `start_date`.
    pub fn new(project_id: ProjectId, start_date: NaiveDate) -> Self {
        Self {
            project_id: Some(project_id),
            start_date: Some(start_date),
            ..Self::default()
        }
    }

    /// Form pre-filled from a stored task.
    pub fn from_task(task: &TaskNode) -> Self {
        Self {
            id: Some(task.id),
            title: task.title.clone(),
            project_id: Some(task.project_id),
            subsystem_id: Some(task.subsystem_id),
            estimated_hours: task.estimated_hours,
            actual_hours: task.actual_hours,
            priority: task.priority,
            progress: i64::from(task.progress()),
            completed: task.is_completed(),
            start_date: Some(task.start_date()),
            end_date: task.end_date(),
            assigned_members: task.assigned_members.clone(),
        }
    }

    /// Write the draft onto `base`, leaving its dependency sets alone.
    ///
    /// Progress is applied before the completion flag, so a draft that was
    /// reopened at 100% stays reopened.
    ///
    /// # Errors
    /// Returns `Validation` if the draft breaks its rules, or the error from
    /// the date or progress setters.
    pub fn apply_to(&self, base: &TaskNode) -> Result<TaskNode> {
        self.check()?;
        let mut task = base.clone();
        self.write_fields(&mut task)?;
        Ok(task)
    }

    /// Build a new task record with the given id.
    ///
    /// # Errors
    /// Same as [`TaskDraft::apply_to`].
    pub fn into_task(&self, id: TaskId) -> Result<TaskNode> {
        self.check()?;
        let fields = (self.project_id, self.subsystem_id, self.start_date);
        let (project, subsystem, start) = match fields {
            (Some(p), Some(s), Some(d)) => (p, s, d),
            _ => return Err(Error::Validation("Task draft is incomplete".to_string())),
        };
        let mut task = TaskNode::new(id, &self.title, project, subsystem, start);
        self.write_fields(&mut task)?;
        Ok(task)
    }

    fn check(&self) -> Result<()> {
        match join_errors(&self.validate()) {
            Some(message) => Err(Error::Validation(message)),
            None => Ok(()),
        }
    }

    fn write_fields(&self, task: &mut TaskNode) -> Result<()> {
        if let Some(start) = self.start_date {
            task.set_dates(start, self.end_date)?;
        }
        task.set_progress(self.progress)?;
        task.set_completed(self.completed);

        task.title = self.title.trim().to_string();
        if let Some(project) = self.project_id {
            task.project_id = project;
        }
        if let Some(subsystem) = self.subsystem_id {
            task.subsystem_id = subsystem;
        }
        task.estimated_hours = self.estimated_hours;
        task.actual_hours = self.actual_hours;
        task.priority = self.priority;
        task.assigned_members = self.assigned_members.clone();
        Ok(())
    }
}

impl Validate for TaskDraft {
    fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.title.trim().is_empty() {
            errors.push("Task title cannot be empty".to_string());
        }
        if self.project_id.is_none() {
            errors.push("Project must be set".to_string());
        }
        if self.subsystem_id.is_none() {
            errors.push("Subsystem must be set".to_string());
        }
        if let Some(hours) = self.estimated_hours {
            if !(hours >= 0.0) {
                errors.push("Estimated hours cannot be negative".to_string());
            }
        }
        if !(0..=100).contains(&self.progress) {
            errors.push("Progress must be between 0 and 100".to_string());
        }

        match (self.start_date, self.end_date) {
            (None, _) => errors.push("Start date cannot be empty".to_string()),
            (Some(start), Some(end)) if end < start => {
                errors.push("End date cannot be before start date".to_string())
            }
            _ => {}
        }

        errors
    }
}

/// Editable fields of a milestone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneDraft {
    pub id: Option<MilestoneId>,
    pub name: String,
    pub project_id: Option<ProjectId>,
    pub date: Option<NaiveDate>,
}

impl MilestoneDraft {
    pub fn new(project_id: ProjectId) -> Self {
        Self {
            project_id: Some(project_id),
            ..Self::default()
        }
    }

    pub fn from_milestone(milestone: &Milestone) -> Self {
        Self {
            id: Some(milestone.id),
            name: milestone.name.clone(),
            project_id: Some(milestone.project_id),
            date: Some(milestone.date),
        }
    }

    /// # Errors
    /// Returns `Validation` with the joined rule violations.
    pub fn into_milestone(&self, id: MilestoneId) -> Result<Milestone> {
        if let Some(message) = join_errors(&self.validate()) {
            return Err(Error::Validation(message));
        }
        match (self.project_id, self.date) {
            (Some(project), Some(date)) => Ok(Milestone::new(id, self.name.trim(), date, project)),
            _ => Err(Error::Validation("Milestone draft is incomplete".to_string())),
        }
    }
}

impl Validate for MilestoneDraft {
    fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.name.trim().is_empty() {
            errors.push("Milestone name cannot be empty".to_string());
        }
        if self.date.is_none() {
            errors.push("Milestone date cannot be empty".to_string());
        }
        if self.project_id.is_none() {
            errors.push("Project must be set".to_string());
        }
        errors
    }
}

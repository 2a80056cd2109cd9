//! Renderable timeline entries.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::core::milestone::{Milestone, MilestoneId};
use crate::core::task::{MemberId, Priority, ProjectId, SubsystemId, TaskId, TaskNode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryKind {
    Task,
    Milestone,
}

/// A dependency arrow between two entries, as entry ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntryLink {
    pub from: String,
    pub to: String,
}

/// One bar or diamond on the Gantt chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    /// `task_<id>` or `milestone_<id>`.
    pub id: String,
    pub title: String,
    pub start_date: NaiveDate,
    /// Same as `start_date` for milestones, `None` for open-ended tasks.
    pub end_date: Option<NaiveDate>,
    pub kind: EntryKind,
    /// Incoming dependency arrows.
    pub dependencies: Vec<EntryLink>,
    pub on_critical_path: bool,
    pub project_id: ProjectId,
    pub subsystem_id: Option<SubsystemId>,
    pub assigned_members: BTreeSet<MemberId>,
    pub progress: u8,
    pub completed: bool,
    pub priority: Option<Priority>,
}

pub fn task_entry_id(id: TaskId) -> String {
    format!("task_{}", id)
}

pub fn milestone_entry_id(id: MilestoneId) -> String {
    format!("milestone_{}", id)
}

impl TimelineEntry {
    pub fn from_task(task: &TaskNode) -> Self {
        Self {
            id: task_entry_id(task.id),
            title: task.title.clone(),
            start_date: task.start_date(),
            end_date: task.end_date(),
            kind: EntryKind::Task,
            dependencies: Vec::new(),
            on_critical_path: false,
            project_id: task.project_id,
            subsystem_id: Some(task.subsystem_id),
            assigned_members: task.assigned_members.clone(),
            progress: task.progress(),
            completed: task.is_completed(),
            priority: Some(task.priority),
        }
    }

    pub fn from_milestone(milestone: &Milestone) -> Self {
        Self {
            id: milestone_entry_id(milestone.id),
            title: milestone.name.clone(),
            start_date: milestone.date,
            end_date: Some(milestone.date),
            kind: EntryKind::Milestone,
            dependencies: Vec::new(),
            on_critical_path: false,
            project_id: milestone.project_id,
            subsystem_id: None,
            assigned_members: BTreeSet::new(),
            progress: 0,
            completed: false,
            priority: None,
        }
    }

    pub fn is_task(&self) -> bool {
        self.kind == EntryKind::Task
    }

    pub fn is_milestone(&self) -> bool {
        self.kind == EntryKind::Milestone
    }

    /// The task id behind a task entry.
    pub fn task_id(&self) -> Option<TaskId> {
        if !self.is_task() {
            return None;
        }
        self.id.strip_prefix("task_")?.parse().ok()
    }

    /// Check whether the entry's span touches `[start, end]`.
    ///
    /// Open-ended entries always do.
    pub fn intersects(&self, start: NaiveDate, end: NaiveDate) -> bool {
        match self.end_date {
            None => true,
            Some(entry_end) => self.start_date <= end && entry_end >= start,
        }
    }

    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.is_task() && !self.completed && self.end_date.is_some_and(|end| end < today)
    }

    /// Progress a task should have reached by `today` if work were spread
    /// evenly over its span. `None` for milestones and open-ended tasks.
    pub fn expected_progress(&self, today: NaiveDate) -> Option<f64> {
        let end = self.end_date.filter(|_| self.is_task())?;
        if today < self.start_date {
            return Some(0.0);
        }
        if today >= end {
            return Some(100.0);
        }
        let total = (end - self.start_date).num_days() as f64;
        let elapsed = (today - self.start_date).num_days() as f64;
        Some(elapsed / total * 100.0)
    }

    /// A running task whose progress lags its expected progress.
    pub fn is_behind_schedule(&self, today: NaiveDate) -> bool {
        if self.completed || today < self.start_date {
            return false;
        }
        if self.end_date.is_some_and(|end| today > end) {
            return false;
        }
        self.expected_progress(today)
            .is_some_and(|expected| f64::from(self.progress) < expected)
    }
}

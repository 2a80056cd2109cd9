//! Task data model for the dependency graph and timeline.
//!
//! A `TaskNode` is the in-memory view of a task supplied by the surrounding
//! task store. Progress, completion, dates and dependency sets are not
//! publicly writable: they change only through [`crate::core::progress`],
//! [`TaskNode::set_dates`] and [`crate::core::dag::DependencyUpdate`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::core::progress;
use crate::error::{Error, Result};

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                Ok(Self(s.trim().parse()?))
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }
    };
}

numeric_id!(
    /// Identifier of a task. Ordered so that graph algorithms can break ties
    /// deterministically (lower id first).
    TaskId
);
numeric_id!(
    /// Identifier of the project that owns tasks and milestones.
    ProjectId
);
numeric_id!(
    /// Identifier of the subsystem a task belongs to.
    SubsystemId
);
numeric_id!(
    /// Identifier of a team member assigned to tasks.
    MemberId
);

/// Task priority.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::Low => write!(f, "low"),
            Priority::Medium => write!(f, "medium"),
            Priority::High => write!(f, "high"),
            Priority::Critical => write!(f, "critical"),
        }
    }
}

/// A task as seen by the dependency graph and the timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskNode {
    /// Unique identifier for this task.
    pub id: TaskId,
    /// Human-readable title.
    pub title: String,
    /// Estimated effort in hours. `None` when the task has not been estimated.
    pub estimated_hours: Option<f64>,
    /// Effort actually spent, in hours.
    #[serde(default)]
    pub actual_hours: f64,
    #[serde(default)]
    pub priority: Priority,
    pub(crate) progress: u8,
    pub(crate) completed: bool,
    pub(crate) start_date: NaiveDate,
    /// `None` until the task is scheduled.
    pub(crate) end_date: Option<NaiveDate>,
    /// Owning project.
    pub project_id: ProjectId,
    /// Owning subsystem.
    pub subsystem_id: SubsystemId,
    /// Team members assigned to this task.
    #[serde(default)]
    pub assigned_members: BTreeSet<MemberId>,
    /// Tasks that must finish before this one.
    #[serde(default)]
    pub(crate) pre_dependencies: BTreeSet<TaskId>,
    /// Tasks waiting on this one.
    #[serde(default)]
    pub(crate) post_dependencies: BTreeSet<TaskId>,
}

impl TaskNode {
    /// Create an unscheduled, unstarted task.
    pub fn new(
        id: TaskId,
        title: &str,
        project_id: ProjectId,
        subsystem_id: SubsystemId,
        start_date: NaiveDate,
    ) -> Self {
        Self {
            id,
            title: title.to_string(),
            estimated_hours: None,
            actual_hours: 0.0,
            priority: Priority::default(),
            progress: 0,
            completed: false,
            start_date,
            end_date: None,
            project_id,
            subsystem_id,
            assigned_members: BTreeSet::new(),
            pre_dependencies: BTreeSet::new(),
            post_dependencies: BTreeSet::new(),
        }
    }

    pub fn with_estimate(mut self, hours: f64) -> Self {
        self.estimated_hours = Some(hours);
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_member(mut self, member: MemberId) -> Self {
        self.assigned_members.insert(member);
        self
    }

    /// Schedule the task over `[start, end]`.
    ///
    /// # Errors
    /// Returns `InvalidRange` if `end` is before `start`.
    pub fn with_dates(mut self, start: NaiveDate, end: Option<NaiveDate>) -> Result<Self> {
        self.set_dates(start, end)?;
        Ok(self)
    }

    /// Set start and end dates together so the ordering invariant is checked
    /// against the pair.
    ///
    /// # Errors
    /// Returns `InvalidRange` if `end` is before `start`; the task is left
    /// unchanged.
    pub fn set_dates(&mut self, start: NaiveDate, end: Option<NaiveDate>) -> Result<()> {
        if let Some(end) = end {
            if end < start {
                return Err(Error::InvalidRange { start, end });
            }
        }
        self.start_date = start;
        self.end_date = end;
        Ok(())
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn end_date(&self) -> Option<NaiveDate> {
        self.end_date
    }

    /// Tasks that must finish before this one.
    pub fn pre_dependencies(&self) -> &BTreeSet<TaskId> {
        &self.pre_dependencies
    }

    /// Tasks that wait on this one.
    pub fn post_dependencies(&self) -> &BTreeSet<TaskId> {
        &self.post_dependencies
    }

    /// Set progress, keeping the completion flag consistent.
    ///
    /// See [`progress::set_progress`].
    pub fn set_progress(&mut self, value: i64) -> Result<()> {
        progress::set_progress(self, value)
    }

    /// Set the completion flag, keeping progress consistent.
    ///
    /// See [`progress::set_completed`].
    pub fn set_completed(&mut self, flag: bool) {
        progress::set_completed(self, flag)
    }

    /// A task with no end date is open-ended.
    pub fn is_open_ended(&self) -> bool {
        self.end_date.is_none()
    }

    /// Check whether the task's span touches `[start, end]`.
    ///
    /// Open-ended tasks always intersect.
    pub fn intersects(&self, start: NaiveDate, end: NaiveDate) -> bool {
        match self.end_date {
            None => true,
            Some(task_end) => self.start_date <= end && task_end >= start,
        }
    }

    /// Check whether the task ended before `today` without being completed.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.completed && self.end_date.is_some_and(|end| end < today)
    }

    /// Check the record-level invariants of a task loaded from elsewhere.
    ///
    /// # Errors
    /// Returns `InvalidRange` for inverted dates, `Range` for progress above
    /// 100, and `Validation` when a 100% task is not flagged completed.
    pub fn check_invariants(&self) -> Result<()> {
        if let Some(end) = self.end_date {
            if end < self.start_date {
                return Err(Error::InvalidRange {
                    start: self.start_date,
                    end,
                });
            }
        }
        if self.progress > 100 {
            return Err(Error::Range(i64::from(self.progress)));
        }
        if self.completed && self.progress != 100 {
            return Err(Error::Validation(format!(
                "Task {} is completed but progress is {}",
                self.id, self.progress
            )));
        }
        Ok(())
    }
}

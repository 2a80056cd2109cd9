//! Project milestones.
//!
//! Milestones are fixed dates on the timeline. They never take part in the
//! dependency graph.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::task::ProjectId;

/// Identifier of a milestone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MilestoneId(pub u64);

impl std::fmt::Display for MilestoneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    pub id: MilestoneId,
    pub name: String,
    pub date: NaiveDate,
    pub project_id: ProjectId,
}

impl Milestone {
    pub fn new(id: MilestoneId, name: &str, date: NaiveDate, project_id: ProjectId) -> Self {
        Self {
            id,
            name: name.to_string(),
            date,
            project_id,
        }
    }

    /// A milestone is a single day; it falls in a window when that day does.
    pub fn within(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.date >= start && self.date <= end
    }
}

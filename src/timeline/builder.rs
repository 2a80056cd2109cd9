//! Builds the timeline for one project and date window.

use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::core::dag::DependencyGraph;
use crate::core::milestone::{Milestone, MilestoneId};
use crate::core::task::{ProjectId, TaskId, TaskNode};
use crate::error::{Error, Result};
use crate::timeline::entry::{task_entry_id, EntryKind, EntryLink, TimelineEntry};

pub struct TimelineBuilder;

impl TimelineBuilder {
    /// Turn a project's tasks and milestones into timeline entries.
    ///
    /// Includes every task of `project_id` whose span touches
    /// `[start, end]`, every open-ended task, and every milestone dated
    /// inside the window. Repeated ids are kept once. Dependency arrows are
    /// taken from `graph` and only kept when both ends made it in.
    ///
    /// Entries are ordered by start date, then tasks before milestones,
    /// then id.
    ///
    /// # Errors
    /// Returns `InvalidRange` if `end` is before `start`.
    pub fn build(
        project_id: ProjectId,
        start: NaiveDate,
        end: NaiveDate,
        tasks: &[TaskNode],
        milestones: &[Milestone],
        graph: &DependencyGraph,
    ) -> Result<Vec<TimelineEntry>> {
        if end < start {
            return Err(Error::InvalidRange { start, end });
        }

        let mut included_tasks: BTreeMap<TaskId, &TaskNode> = BTreeMap::new();
        for task in tasks {
            if task.project_id == project_id && task.intersects(start, end) {
                included_tasks.entry(task.id).or_insert(task);
            }
        }

        let mut included_milestones: BTreeMap<MilestoneId, &Milestone> = BTreeMap::new();
        for milestone in milestones {
            if milestone.project_id == project_id && milestone.within(start, end) {
                included_milestones.entry(milestone.id).or_insert(milestone);
            }
        }

        let present: BTreeSet<TaskId> = included_tasks.keys().copied().collect();
        let mut keyed: Vec<((NaiveDate, EntryKind, u64), TimelineEntry)> =
            Vec::with_capacity(included_tasks.len() + included_milestones.len());

        for (id, task) in &included_tasks {
            let mut entry = TimelineEntry::from_task(task);
            entry.dependencies = graph
                .pre_dependencies_of(*id)
                .intersection(&present)
                .map(|pre| EntryLink {
                    from: task_entry_id(*pre),
                    to: entry.id.clone(),
                })
                .collect();
            keyed.push(((entry.start_date, EntryKind::Task, id.0), entry));
        }
        for (id, milestone) in &included_milestones {
            let entry = TimelineEntry::from_milestone(milestone);
            keyed.push(((entry.start_date, EntryKind::Milestone, id.0), entry));
        }

        keyed.sort_by(|a, b| a.0.cmp(&b.0));
        let entries: Vec<TimelineEntry> = keyed.into_iter().map(|(_, entry)| entry).collect();

        debug!(
            project = %project_id,
            %start,
            %end,
            tasks = included_tasks.len(),
            milestones = included_milestones.len(),
            "timeline built"
        );
        Ok(entries)
    }

    /// Every dependency arrow in `entries`.
    pub fn links(entries: &[TimelineEntry]) -> Vec<EntryLink> {
        entries
            .iter()
            .flat_map(|entry| entry.dependencies.iter().cloned())
            .collect()
    }
}

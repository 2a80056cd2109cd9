//! Critical path analysis.
//!
//! Classic forward/backward pass over the dependency graph restricted to a
//! task subset. Durations are the tasks' estimates converted to whole
//! minutes; tasks without a usable estimate get the configured fallback.
//!
//! A task is critical when its slack is zero, which is the same as lying on
//! some maximum-length source to sink chain inside the subset.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::config::Config;
use crate::core::dag::DependencyGraph;
use crate::core::task::{TaskId, TaskNode};
use crate::timeline::entry::TimelineEntry;

const MINUTES_PER_HOUR: f64 = 60.0;

/// Longest duration one task can count for, about two million years. Keeps
/// the passes clear of `i64` overflow for any realistic task count.
const MAX_TASK_MINUTES: i64 = 1 << 40;

/// Earliest and latest times of one task, in minutes from project start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSchedule {
    pub duration: i64,
    pub earliest_start: i64,
    pub earliest_finish: i64,
    pub latest_start: i64,
    pub latest_finish: i64,
}

impl TaskSchedule {
    /// Slack (float): how far the task can slip without delaying the project.
    pub fn slack(&self) -> i64 {
        self.latest_start.saturating_sub(self.earliest_start)
    }

    pub fn is_critical(&self) -> bool {
        self.slack() == 0
    }
}

/// Result of one critical path run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CriticalPathAnalysis {
    pub schedules: BTreeMap<TaskId, TaskSchedule>,
    /// Critical tasks in dependency order.
    pub critical_tasks: Vec<TaskId>,
    /// Edges `(prerequisite, dependent)` joining two critical tasks with no
    /// gap between them.
    pub critical_edges: Vec<(TaskId, TaskId)>,
    /// Length of the longest chain, in minutes.
    pub total_duration: i64,
}

impl CriticalPathAnalysis {
    pub fn is_critical(&self, id: TaskId) -> bool {
        self.schedules.get(&id).is_some_and(TaskSchedule::is_critical)
    }

    pub fn slack_hours(&self, id: TaskId) -> Option<f64> {
        self.schedules
            .get(&id)
            .map(|s| s.slack() as f64 / MINUTES_PER_HOUR)
    }

    pub fn total_duration_hours(&self) -> f64 {
        self.total_duration as f64 / MINUTES_PER_HOUR
    }

    pub fn critical_set(&self) -> BTreeSet<TaskId> {
        self.critical_tasks.iter().copied().collect()
    }

    /// Set `on_critical_path` on task entries. Every other entry is reset
    /// to `false`.
    pub fn annotate(&self, entries: &mut [TimelineEntry]) {
        for entry in entries.iter_mut() {
            entry.on_critical_path = entry.task_id().is_some_and(|id| self.is_critical(id));
        }
    }
}

/// Computes critical paths. Holds no state between runs.
#[derive(Debug, Clone, Copy)]
pub struct CriticalPathAnalyzer {
    fallback_minutes: i64,
}

impl Default for CriticalPathAnalyzer {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl CriticalPathAnalyzer {
    pub fn new(fallback_hours: f64) -> Self {
        Self {
            fallback_minutes: hours_to_minutes(fallback_hours).unwrap_or(0),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.fallback_task_hours)
    }

    /// Duration of a task in minutes.
    pub fn duration_of(&self, task: &TaskNode) -> i64 {
        task.estimated_hours
            .and_then(hours_to_minutes)
            .unwrap_or(self.fallback_minutes)
    }

    /// Run the analysis over `tasks`, using only graph edges between them.
    ///
    /// Duplicate tasks count once, first occurrence wins.
    pub fn analyze(&self, tasks: &[TaskNode], graph: &DependencyGraph) -> CriticalPathAnalysis {
        let mut durations: BTreeMap<TaskId, i64> = BTreeMap::new();
        for task in tasks {
            durations
                .entry(task.id)
                .or_insert_with(|| self.duration_of(task));
        }
        if durations.is_empty() {
            return CriticalPathAnalysis::default();
        }

        let subset: BTreeSet<TaskId> = durations.keys().copied().collect();
        let order = graph.topological_order_within(&subset);
        let pre_in_subset = |id: TaskId| -> Vec<TaskId> {
            graph
                .pre_dependencies_of(id)
                .intersection(&subset)
                .copied()
                .collect()
        };
        let post_in_subset = |id: TaskId| -> Vec<TaskId> {
            graph
                .post_dependencies_of(id)
                .intersection(&subset)
                .copied()
                .collect()
        };

        // Forward pass
        let mut earliest_finish: BTreeMap<TaskId, i64> = BTreeMap::new();
        let mut earliest_start: BTreeMap<TaskId, i64> = BTreeMap::new();
        for &id in &order {
            let start = pre_in_subset(id)
                .into_iter()
                .filter_map(|p| earliest_finish.get(&p).copied())
                .max()
                .unwrap_or(0);
            earliest_start.insert(id, start);
            earliest_finish.insert(id, start.saturating_add(durations[&id]));
        }
        let total_duration = earliest_finish.values().copied().max().unwrap_or(0);

        // Backward pass
        let mut latest_start: BTreeMap<TaskId, i64> = BTreeMap::new();
        let mut schedules = BTreeMap::new();
        for &id in order.iter().rev() {
            let finish = post_in_subset(id)
                .into_iter()
                .filter_map(|s| latest_start.get(&s).copied())
                .min()
                .unwrap_or(total_duration);
            let duration = durations[&id];
            let start = finish.saturating_sub(duration);
            latest_start.insert(id, start);
            schedules.insert(
                id,
                TaskSchedule {
                    duration,
                    earliest_start: earliest_start[&id],
                    earliest_finish: earliest_finish[&id],
                    latest_start: start,
                    latest_finish: finish,
                },
            );
        }

        let critical_tasks: Vec<TaskId> = order
            .iter()
            .copied()
            .filter(|id| schedules[id].is_critical())
            .collect();

        let mut critical_edges = Vec::new();
        for &id in &critical_tasks {
            let finish = schedules[&id].earliest_finish;
            for next in post_in_subset(id) {
                let next_schedule = &schedules[&next];
                if next_schedule.is_critical() && next_schedule.earliest_start == finish {
                    critical_edges.push((id, next));
                }
            }
        }

        debug!(
            tasks = schedules.len(),
            critical = critical_tasks.len(),
            total_minutes = total_duration,
            "critical path computed"
        );

        CriticalPathAnalysis {
            schedules,
            critical_tasks,
            critical_edges,
            total_duration,
        }
    }
}

fn hours_to_minutes(hours: f64) -> Option<i64> {
    if hours.is_finite() && hours >= 0.0 {
        Some(((hours * MINUTES_PER_HOUR).round() as i64).min(MAX_TASK_MINUTES))
    } else {
        None
    }
}

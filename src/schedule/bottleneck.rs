//! Bottleneck detection: the most connected tasks of a project.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::core::dag::DependencyGraph;
use crate::core::task::TaskId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bottleneck {
    pub task_id: TaskId,
    /// Direct prerequisites.
    pub incoming: usize,
    /// Direct dependents.
    pub outgoing: usize,
}

impl Bottleneck {
    pub fn degree(&self) -> usize {
        self.incoming + self.outgoing
    }
}

/// Tasks of `subset` ranked by direct dependency count, highest first.
///
/// Returns the top quarter of the subset (at least one task). Only edges
/// inside the subset count, tasks with no edges are never reported, and
/// ties go to the lower id.
pub fn find_bottlenecks(graph: &DependencyGraph, subset: &BTreeSet<TaskId>) -> Vec<Bottleneck> {
    let mut ranked: Vec<Bottleneck> = subset
        .iter()
        .map(|&task_id| Bottleneck {
            task_id,
            incoming: graph.pre_dependencies_of(task_id).intersection(subset).count(),
            outgoing: graph.post_dependencies_of(task_id).intersection(subset).count(),
        })
        .filter(|b| b.degree() > 0)
        .collect();

    ranked.sort_by(|a, b| b.degree().cmp(&a.degree()).then(a.task_id.cmp(&b.task_id)));
    ranked.truncate((subset.len() / 4).max(1));
    ranked
}

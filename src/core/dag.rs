//! Task dependency graph.
//!
//! The graph stores edges as id pairs in a petgraph `DiGraphMap`, pointing
//! from prerequisite to dependent. Task content stays with the task store;
//! the graph is rebuilt from it with [`DependencyGraph::from_tasks`] and
//! pushes its pre/post sets back with [`DependencyGraph::sync_tasks`].

use petgraph::graphmap::DiGraphMap;
use petgraph::visit::{Dfs, Reversed};
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap, HashMap, HashSet, VecDeque};
use tracing::{debug, warn};

use crate::core::task::{TaskId, TaskNode};
use crate::error::{Error, Result};

/// Pre/post sets of both endpoints after an edge was added or removed.
///
/// Apply it to the task views with [`DependencyUpdate::apply_to`] so that the
/// mirrored sets on the nodes change together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyUpdate {
    pub dependent: TaskId,
    pub prerequisite: TaskId,
    pub dependent_pre: BTreeSet<TaskId>,
    pub dependent_post: BTreeSet<TaskId>,
    pub prerequisite_pre: BTreeSet<TaskId>,
    pub prerequisite_post: BTreeSet<TaskId>,
}

impl DependencyUpdate {
    /// Write the updated sets into whichever of the two tasks are present.
    pub fn apply_to(&self, tasks: &mut [TaskNode]) {
        for task in tasks.iter_mut() {
            if task.id == self.dependent {
                task.pre_dependencies = self.dependent_pre.clone();
                task.post_dependencies = self.dependent_post.clone();
            } else if task.id == self.prerequisite {
                task.pre_dependencies = self.prerequisite_pre.clone();
                task.post_dependencies = self.prerequisite_post.clone();
            }
        }
    }
}

/// The prerequisite relation between tasks of one project.
///
/// An edge `prerequisite -> dependent` means the prerequisite must finish
/// before the dependent. The graph is acyclic at all times: every insertion
/// is checked before it happens, and a rejected insertion leaves the graph
/// untouched.
#[derive(Clone, Default)]
pub struct DependencyGraph {
    graph: DiGraphMap<TaskId, ()>,
}

impl DependencyGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self {
            graph: DiGraphMap::new(),
        }
    }

    /// Rebuild the graph from task views.
    ///
    /// Both the pre- and post-dependency sets are read, so a store that only
    /// kept one side still produces the full mirrored relation. Tasks are
    /// replayed in id order, which makes the reported error deterministic.
    ///
    /// # Errors
    /// Returns `SelfDependency` or `CircularDependency` if the stored
    /// relation is not a DAG.
    pub fn from_tasks(tasks: &[TaskNode]) -> Result<Self> {
        let mut graph = Self::new();
        let mut ordered: Vec<&TaskNode> = tasks.iter().collect();
        ordered.sort_by_key(|t| t.id);

        for task in &ordered {
            graph.add_task(task.id);
        }
        for task in &ordered {
            for pre in &task.pre_dependencies {
                graph.add_dependency(task.id, *pre)?;
            }
            for post in &task.post_dependencies {
                graph.add_dependency(*post, task.id)?;
            }
        }

        debug!(
            tasks = graph.task_count(),
            dependencies = graph.dependency_count(),
            "dependency graph rehydrated"
        );
        Ok(graph)
    }

    /// Register a task with no edges. Returns `false` if it was already known.
    pub fn add_task(&mut self, id: TaskId) -> bool {
        if self.graph.contains_node(id) {
            return false;
        }
        self.graph.add_node(id);
        true
    }

    /// Drop a task and every edge touching it.
    ///
    /// Returns the tasks whose pre/post sets changed as a result.
    pub fn remove_task(&mut self, id: TaskId) -> BTreeSet<TaskId> {
        let touched: BTreeSet<TaskId> = self
            .graph
            .neighbors_directed(id, Direction::Incoming)
            .chain(self.graph.neighbors_directed(id, Direction::Outgoing))
            .collect();
        self.graph.remove_node(id);
        touched
    }

    /// Record that `dependent` cannot proceed until `prerequisite` is done.
    ///
    /// Unknown ids are registered. Adding an edge that already exists is a
    /// no-op that still reports the current sets.
    ///
    /// # Errors
    /// - `SelfDependency` if both ids are the same task
    /// - `CircularDependency` if `prerequisite` already depends, directly or
    ///   transitively, on `dependent`
    ///
    /// On error the graph is unchanged.
    pub fn add_dependency(
        &mut self,
        dependent: TaskId,
        prerequisite: TaskId,
    ) -> Result<DependencyUpdate> {
        if dependent == prerequisite {
            warn!(task = %dependent, "rejected self dependency");
            return Err(Error::SelfDependency(dependent));
        }

        if self.reaches(dependent, prerequisite) {
            warn!(%dependent, %prerequisite, "rejected circular dependency");
            return Err(Error::CircularDependency {
                dependent,
                prerequisite,
            });
        }

        self.graph.add_edge(prerequisite, dependent, ());
        debug!(%dependent, %prerequisite, "dependency added");
        Ok(self.update_for(dependent, prerequisite))
    }

    /// Remove the edge `prerequisite -> dependent`.
    ///
    /// Removing an edge that does not exist is not an error.
    pub fn remove_dependency(
        &mut self,
        dependent: TaskId,
        prerequisite: TaskId,
    ) -> DependencyUpdate {
        if self.graph.remove_edge(prerequisite, dependent).is_some() {
            debug!(%dependent, %prerequisite, "dependency removed");
        }
        self.update_for(dependent, prerequisite)
    }

    /// Check whether adding `prerequisite -> dependent` would be rejected.
    pub fn would_create_cycle(&self, dependent: TaskId, prerequisite: TaskId) -> bool {
        dependent == prerequisite || self.reaches(dependent, prerequisite)
    }

    /// Depth-first search from `from` along prerequisite -> dependent edges.
    ///
    /// The walk visits each node at most once, so it is bounded by the node
    /// count.
    fn reaches(&self, from: TaskId, target: TaskId) -> bool {
        if !self.graph.contains_node(from) || !self.graph.contains_node(target) {
            return false;
        }

        let limit = self.graph.node_count();
        let mut visited: HashSet<TaskId> = HashSet::with_capacity(limit);
        let mut stack = vec![from];

        while let Some(node) = stack.pop() {
            if node == target {
                return true;
            }
            if !visited.insert(node) || visited.len() > limit {
                continue;
            }
            stack.extend(
                self.graph
                    .neighbors_directed(node, Direction::Outgoing)
                    .filter(|n| !visited.contains(n)),
            );
        }
        false
    }

    fn update_for(&self, dependent: TaskId, prerequisite: TaskId) -> DependencyUpdate {
        DependencyUpdate {
            dependent,
            prerequisite,
            dependent_pre: self.pre_dependencies_of(dependent),
            dependent_post: self.post_dependencies_of(dependent),
            prerequisite_pre: self.pre_dependencies_of(prerequisite),
            prerequisite_post: self.post_dependencies_of(prerequisite),
        }
    }

    /// Direct prerequisites of a task.
    pub fn pre_dependencies_of(&self, id: TaskId) -> BTreeSet<TaskId> {
        if !self.graph.contains_node(id) {
            return BTreeSet::new();
        }
        self.graph
            .neighbors_directed(id, Direction::Incoming)
            .collect()
    }

    /// Direct dependents of a task.
    pub fn post_dependencies_of(&self, id: TaskId) -> BTreeSet<TaskId> {
        if !self.graph.contains_node(id) {
            return BTreeSet::new();
        }
        self.graph
            .neighbors_directed(id, Direction::Outgoing)
            .collect()
    }

    /// Every task that must finish, directly or transitively, before `id`.
    pub fn all_prerequisites(&self, id: TaskId) -> BTreeSet<TaskId> {
        if !self.graph.contains_node(id) {
            return BTreeSet::new();
        }
        let reversed = Reversed(&self.graph);
        let mut dfs = Dfs::new(reversed, id);
        let mut found = BTreeSet::new();
        while let Some(node) = dfs.next(reversed) {
            if node != id {
                found.insert(node);
            }
        }
        found
    }

    /// Every task waiting, directly or transitively, on `id`.
    pub fn all_dependents(&self, id: TaskId) -> BTreeSet<TaskId> {
        if !self.graph.contains_node(id) {
            return BTreeSet::new();
        }
        let mut dfs = Dfs::new(&self.graph, id);
        let mut found = BTreeSet::new();
        while let Some(node) = dfs.next(&self.graph) {
            if node != id {
                found.insert(node);
            }
        }
        found
    }

    /// Shortest chain of dependency edges leading from `from` to `to`.
    ///
    /// Returns the path including both endpoints, `[from]` when they are the
    /// same task, and an empty vector when `to` does not depend on `from`.
    pub fn shortest_dependency_path(&self, from: TaskId, to: TaskId) -> Vec<TaskId> {
        if !self.graph.contains_node(from) || !self.graph.contains_node(to) {
            return Vec::new();
        }
        if from == to {
            return vec![from];
        }

        let mut predecessor: HashMap<TaskId, TaskId> = HashMap::new();
        let mut queue = VecDeque::from([from]);
        let mut visited = HashSet::from([from]);

        while let Some(current) = queue.pop_front() {
            for next in self.post_dependencies_of(current) {
                if !visited.insert(next) {
                    continue;
                }
                predecessor.insert(next, current);
                if next == to {
                    let mut path = vec![to];
                    let mut node = to;
                    while let Some(&prev) = predecessor.get(&node) {
                        path.push(prev);
                        node = prev;
                    }
                    path.reverse();
                    return path;
                }
                queue.push_back(next);
            }
        }
        Vec::new()
    }

    /// All tasks in dependency order, lowest id first among tasks that are
    /// ready at the same time.
    pub fn topological_order(&self) -> Vec<TaskId> {
        let all: BTreeSet<TaskId> = self.graph.nodes().collect();
        self.topological_order_within(&all)
    }

    /// Dependency order of a subset, using only edges inside the subset.
    ///
    /// Ids in `subset` that the graph does not know are treated as isolated.
    pub fn topological_order_within(&self, subset: &BTreeSet<TaskId>) -> Vec<TaskId> {
        let mut in_degree: BTreeMap<TaskId, usize> = subset.iter().map(|id| (*id, 0)).collect();
        for id in subset {
            for next in self.post_dependencies_of(*id) {
                if let Some(degree) = in_degree.get_mut(&next) {
                    *degree += 1;
                }
            }
        }

        let mut ready: BinaryHeap<Reverse<TaskId>> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(id, _)| Reverse(*id))
            .collect();

        let mut order = Vec::with_capacity(subset.len());
        while let Some(Reverse(id)) = ready.pop() {
            order.push(id);
            for next in self.post_dependencies_of(id) {
                if let Some(degree) = in_degree.get_mut(&next) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.push(Reverse(next));
                    }
                }
            }
        }
        order
    }

    /// Task id to direct prerequisites, for every known task.
    pub fn dependency_map(&self) -> BTreeMap<TaskId, BTreeSet<TaskId>> {
        self.graph
            .nodes()
            .map(|id| (id, self.pre_dependencies_of(id)))
            .collect()
    }

    /// Every edge as `(prerequisite, dependent)`, sorted.
    pub fn edges(&self) -> Vec<(TaskId, TaskId)> {
        let mut edges: Vec<(TaskId, TaskId)> =
            self.graph.all_edges().map(|(from, to, _)| (from, to)).collect();
        edges.sort();
        edges
    }

    /// Push the graph's pre/post sets into the task views.
    ///
    /// Tasks the graph does not know end up with empty sets.
    pub fn sync_tasks(&self, tasks: &mut [TaskNode]) {
        for task in tasks.iter_mut() {
            task.pre_dependencies = self.pre_dependencies_of(task.id);
            task.post_dependencies = self.post_dependencies_of(task.id);
        }
    }

    /// Check whether `dependent` directly depends on `prerequisite`.
    pub fn has_dependency(&self, dependent: TaskId, prerequisite: TaskId) -> bool {
        self.graph.contains_edge(prerequisite, dependent)
    }

    pub fn contains_task(&self, id: TaskId) -> bool {
        self.graph.contains_node(id)
    }

    pub fn task_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn dependency_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }
}

impl std::fmt::Debug for DependencyGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DependencyGraph")
            .field("tasks", &self.task_count())
            .field("dependencies", &self.dependency_count())
            .finish()
    }
}

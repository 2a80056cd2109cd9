//! Timeline service: store access plus build, annotate and filter.
//!
//! The service holds no derived state. Every call reads the project's tasks
//! from the store and rebuilds the dependency graph from them, so the answer
//! always reflects the store.

use chrono::{Duration, NaiveDate};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::core::dag::{DependencyGraph, DependencyUpdate};
use crate::core::task::{ProjectId, TaskId, TaskNode};
use crate::edit::dependency::{apply_dependency_edit, DependencyEdit};
use crate::edit::session::EditSession;
use crate::error::{Error, Result};
use crate::schedule::bottleneck::{find_bottlenecks, Bottleneck};
use crate::schedule::critical_path::{CriticalPathAnalysis, CriticalPathAnalyzer};
use crate::store::{MilestoneStore, TaskStore};
use crate::timeline::builder::TimelineBuilder;
use crate::timeline::entry::TimelineEntry;
use crate::timeline::filter::{FilterCriteria, TimelineFilter};

pub struct TimelineService<S> {
    store: S,
    analyzer: CriticalPathAnalyzer,
}

impl<S: TaskStore + MilestoneStore> TimelineService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            analyzer: CriticalPathAnalyzer::default(),
        }
    }

    pub fn with_config(store: S, config: &Config) -> Self {
        Self {
            store,
            analyzer: CriticalPathAnalyzer::from_config(config),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Rehydrate the dependency graph of a project from the store.
    ///
    /// # Errors
    /// `ProjectNotFound`, or a graph error if the stored dependencies are
    /// not a DAG.
    pub fn graph_for(&self, project_id: ProjectId) -> Result<DependencyGraph> {
        let tasks = self.store.list_tasks_for_project(project_id)?;
        DependencyGraph::from_tasks(&tasks)
    }

    /// The project's timeline over `[start, end]`, with critical tasks
    /// flagged.
    ///
    /// The critical path is computed over all the project's tasks, not only
    /// the ones in the window.
    ///
    /// # Errors
    /// `ProjectNotFound`, `InvalidRange`, or a graph error from
    /// rehydration.
    pub fn timeline(
        &self,
        project_id: ProjectId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<TimelineEntry>> {
        let tasks = self.store.list_tasks_for_project(project_id)?;
        let milestones = self.store.list_milestones_for_project(project_id)?;
        let graph = DependencyGraph::from_tasks(&tasks)?;

        let mut entries =
            TimelineBuilder::build(project_id, start, end, &tasks, &milestones, &graph)?;
        self.analyzer.analyze(&tasks, &graph).annotate(&mut entries);
        Ok(entries)
    }

    /// [`TimelineService::timeline`] narrowed by a named filter.
    ///
    /// # Errors
    /// Same as `timeline`, plus `UnsupportedFilter` and `Validation` from
    /// the filter.
    pub fn filtered_timeline(
        &self,
        project_id: ProjectId,
        start: NaiveDate,
        end: NaiveDate,
        filter: &str,
        criteria: &FilterCriteria,
    ) -> Result<Vec<TimelineEntry>> {
        let entries = self.timeline(project_id, start, end)?;
        TimelineFilter::apply_named(&entries, filter, criteria)
    }

    /// Everything scheduled on `date`, using the window `[date, date + 1]`.
    pub fn timeline_for_date(
        &self,
        project_id: ProjectId,
        date: NaiveDate,
    ) -> Result<Vec<TimelineEntry>> {
        self.timeline(project_id, date, date + Duration::days(1))
    }

    /// Task id to direct prerequisites, for every task of the project.
    pub fn dependency_map(
        &self,
        project_id: ProjectId,
    ) -> Result<BTreeMap<TaskId, BTreeSet<TaskId>>> {
        Ok(self.graph_for(project_id)?.dependency_map())
    }

    pub fn critical_path(&self, project_id: ProjectId) -> Result<CriticalPathAnalysis> {
        let tasks = self.store.list_tasks_for_project(project_id)?;
        let graph = DependencyGraph::from_tasks(&tasks)?;
        Ok(self.analyzer.analyze(&tasks, &graph))
    }

    /// The project's most connected tasks. See [`find_bottlenecks`].
    pub fn bottlenecks(&self, project_id: ProjectId) -> Result<Vec<Bottleneck>> {
        let tasks = self.store.list_tasks_for_project(project_id)?;
        let graph = DependencyGraph::from_tasks(&tasks)?;
        let ids: BTreeSet<TaskId> = tasks.iter().map(|t| t.id).collect();
        Ok(find_bottlenecks(&graph, &ids))
    }

    /// Commit a dependency form and persist both affected tasks.
    ///
    /// The graph is rebuilt from the dependent task's project. Graph errors
    /// are folded into the session and nothing is persisted.
    ///
    /// # Errors
    /// `TaskNotFound` if a selected task is missing from the store, or
    /// `Validation` if the two tasks belong to different projects. The
    /// session is not touched in either case. Otherwise whatever the commit
    /// returned.
    pub fn commit_dependency_edit(
        &mut self,
        session: &mut EditSession<DependencyEdit>,
    ) -> Result<DependencyUpdate> {
        let draft = session.draft().clone();
        let dependent = draft
            .dependent
            .map(|id| self.store.require_task(id))
            .transpose()?;
        let prerequisite = draft
            .prerequisite
            .map(|id| self.store.require_task(id))
            .transpose()?;
        if let (Some(dependent), Some(prerequisite)) = (&dependent, &prerequisite) {
            if dependent.project_id != prerequisite.project_id {
                warn!(
                    dependent = %dependent.id,
                    prerequisite = %prerequisite.id,
                    "rejected cross-project dependency"
                );
                return Err(Error::Validation(
                    "Tasks must be in the same project".to_string(),
                ));
            }
        }

        let mut graph = match &dependent {
            Some(task) => self.graph_for(task.project_id)?,
            None => DependencyGraph::new(),
        };
        let update = apply_dependency_edit(session, &mut graph)?;

        let mut touched = vec![
            self.store.require_task(update.dependent)?,
            self.store.require_task(update.prerequisite)?,
        ];
        update.apply_to(&mut touched);
        for task in touched {
            self.store.persist(task)?;
        }
        info!(
            dependent = %update.dependent,
            prerequisite = %update.prerequisite,
            "dependency edit saved"
        );
        Ok(update)
    }

    /// Set a task's progress and persist it.
    ///
    /// # Errors
    /// `TaskNotFound`, or `Range` for values outside `0..=100` (nothing is
    /// persisted).
    pub fn update_progress(&mut self, id: TaskId, progress: i64) -> Result<TaskNode> {
        let mut task = self.store.require_task(id)?;
        task.set_progress(progress)?;
        self.store.persist(task.clone())?;
        debug!(task = %id, progress, "progress saved");
        Ok(task)
    }

    /// Set a task's completion flag and persist it.
    pub fn set_completed(&mut self, id: TaskId, completed: bool) -> Result<TaskNode> {
        let mut task = self.store.require_task(id)?;
        task.set_completed(completed);
        self.store.persist(task.clone())?;
        debug!(task = %id, completed, "completion saved");
        Ok(task)
    }
}

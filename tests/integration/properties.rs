//! Property tests for the graph, progress, timeline and zoom invariants.

use std::collections::BTreeSet;

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;

use taskline::core::dag::DependencyGraph;
use taskline::core::task::{TaskId, TaskNode};
use taskline::timeline::{
    FilterCriteria, FilterOption, TimelineBuilder, TimelineEntry, TimelineFilter, ZoomController,
};

use crate::fixtures::{date, task, DRIVETRAIN, PROJECT};

const TASKS: u64 = 8;

#[derive(Debug, Clone)]
enum GraphOp {
    Add(u64, u64),
    Remove(u64, u64),
}

fn graph_op_strategy() -> impl Strategy<Value = GraphOp> {
    prop_oneof![
        3 => (1..=TASKS, 1..=TASKS).prop_map(|(d, p)| GraphOp::Add(d, p)),
        1 => (1..=TASKS, 1..=TASKS).prop_map(|(d, p)| GraphOp::Remove(d, p)),
    ]
}

#[derive(Debug, Clone)]
enum ProgressOp {
    SetProgress(i64),
    Complete,
}

fn progress_op_strategy() -> impl Strategy<Value = ProgressOp> {
    prop_oneof![
        4 => (-20i64..130).prop_map(ProgressOp::SetProgress),
        1 => Just(ProgressOp::Complete),
    ]
}

// Task spans as (start offset, length) in days from Jan 1; `None` length is
// open-ended.
fn spans_strategy() -> impl Strategy<Value = Vec<(i64, Option<i64>)>> {
    proptest::collection::vec((0i64..90, proptest::option::of(0i64..30)), 0..20)
}

fn tasks_from_spans(spans: &[(i64, Option<i64>)]) -> Vec<TaskNode> {
    let base = date(1, 1);
    spans
        .iter()
        .enumerate()
        .map(|(i, (offset, length))| {
            let start = base + Duration::days(*offset);
            let id = i as u64 + 1;
            match length {
                Some(length) => task(id, start, start + Duration::days(*length)),
                None => TaskNode::new(TaskId(id), "open", PROJECT, DRIVETRAIN, start),
            }
        })
        .collect()
}

fn window(start_offset: i64, length: i64) -> (NaiveDate, NaiveDate) {
    let start = date(1, 1) + Duration::days(start_offset);
    (start, start + Duration::days(length))
}

proptest! {
    #[test]
    fn test_graph_stays_acyclic(ops in proptest::collection::vec(graph_op_strategy(), 0..40)) {
        let mut graph = DependencyGraph::new();
        for id in 1..=TASKS {
            graph.add_task(TaskId(id));
        }

        for op in ops {
            match op {
                GraphOp::Add(d, p) => {
                    let before = graph.edges();
                    if graph.add_dependency(TaskId(d), TaskId(p)).is_err() {
                        prop_assert_eq!(graph.edges(), before);
                    }
                }
                GraphOp::Remove(d, p) => {
                    graph.remove_dependency(TaskId(d), TaskId(p));
                }
            }
            // Kahn's order only covers every task when there is no cycle.
            prop_assert_eq!(graph.topological_order().len(), graph.task_count());
        }
    }

    #[test]
    fn test_task_views_stay_mirrored(ops in proptest::collection::vec(graph_op_strategy(), 0..40)) {
        let mut graph = DependencyGraph::new();
        let mut tasks: Vec<TaskNode> = (1..=TASKS)
            .map(|id| task(id, date(1, 1), date(1, 2)))
            .collect();

        for op in ops {
            let update = match op {
                GraphOp::Add(d, p) => graph.add_dependency(TaskId(d), TaskId(p)).ok(),
                GraphOp::Remove(d, p) => Some(graph.remove_dependency(TaskId(d), TaskId(p))),
            };
            if let Some(update) = update {
                update.apply_to(&mut tasks);
            }
        }

        for a in &tasks {
            prop_assert_eq!(a.pre_dependencies(), &graph.pre_dependencies_of(a.id));
            for b in &tasks {
                prop_assert_eq!(
                    a.pre_dependencies().contains(&b.id),
                    b.post_dependencies().contains(&a.id)
                );
            }
        }
    }

    #[test]
    fn test_progress_matches_completion(
        ops in proptest::collection::vec(progress_op_strategy(), 1..30),
    ) {
        let mut node = task(1, date(1, 1), date(1, 5));

        for op in ops {
            match op {
                ProgressOp::SetProgress(value) => {
                    let before = node.progress();
                    let result = node.set_progress(value);
                    if (0..=100).contains(&value) {
                        prop_assert!(result.is_ok());
                        prop_assert_eq!(i64::from(node.progress()), value);
                    } else {
                        prop_assert!(result.is_err());
                        prop_assert_eq!(node.progress(), before);
                    }
                }
                ProgressOp::Complete => node.set_completed(true),
            }
            prop_assert_eq!(node.progress() == 100, node.is_completed());
        }
    }

    #[test]
    fn test_zoom_stays_within_limits(
        span in 7i64..=730,
        steps in proptest::collection::vec(any::<bool>(), 0..40),
    ) {
        let start = date(6, 1);
        let mut zoom = ZoomController::new(start, start + Duration::days(span)).unwrap();

        for zoom_in in steps {
            let before = zoom.span_days();
            if zoom_in {
                zoom.zoom_in();
                prop_assert!(zoom.span_days() <= before);
            } else {
                zoom.zoom_out();
                prop_assert!(zoom.span_days() >= before);
            }
            prop_assert!(zoom.span_days() >= 7);
            prop_assert!(zoom.span_days() <= 730);
        }
    }

    #[test]
    fn test_timeline_lists_each_intersecting_task_once(
        spans in spans_strategy(),
        window_start in 0i64..90,
        window_length in 0i64..60,
    ) {
        let tasks = tasks_from_spans(&spans);
        let graph = DependencyGraph::from_tasks(&tasks).unwrap();
        let (start, end) = window(window_start, window_length);
        // Every task listed twice still yields one entry each.
        let doubled: Vec<TaskNode> = tasks.iter().chain(tasks.iter()).cloned().collect();

        let entries = TimelineBuilder::build(PROJECT, start, end, &doubled, &[], &graph).unwrap();
        let ids: Vec<TaskId> = entries.iter().filter_map(TimelineEntry::task_id).collect();
        let unique: BTreeSet<TaskId> = ids.iter().copied().collect();

        prop_assert_eq!(ids.len(), unique.len());
        for node in &tasks {
            prop_assert_eq!(unique.contains(&node.id), node.intersects(start, end));
        }
    }

    #[test]
    fn test_filters_leave_input_untouched(
        spans in spans_strategy(),
        option in prop_oneof![
            Just(FilterOption::All),
            Just(FilterOption::CriticalPath),
            Just(FilterOption::Overdue),
            Just(FilterOption::Completed),
            Just(FilterOption::BehindSchedule),
        ],
        today_offset in 0i64..120,
    ) {
        let tasks = tasks_from_spans(&spans);
        let graph = DependencyGraph::from_tasks(&tasks).unwrap();
        let (start, end) = window(0, 120);
        let entries = TimelineBuilder::build(PROJECT, start, end, &tasks, &[], &graph).unwrap();
        let snapshot = entries.clone();
        let today = date(1, 1) + Duration::days(today_offset);
        let criteria = FilterCriteria::default().with_today(today);

        let filtered = TimelineFilter::apply(&entries, option, &criteria).unwrap();

        prop_assert_eq!(&entries, &snapshot);
        prop_assert!(filtered.len() <= entries.len());
        prop_assert!(filtered.iter().all(|e| entries.contains(e)));
    }
}

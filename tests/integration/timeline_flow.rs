//! Timeline build, critical path, filters and zoom working together.

use std::collections::BTreeMap;

use taskline::config::Config;
use taskline::core::dag::DependencyGraph;
use taskline::core::milestone::{Milestone, MilestoneId};
use taskline::core::task::TaskId;
use taskline::schedule::critical_path::CriticalPathAnalyzer;
use taskline::store::InMemoryStore;
use taskline::timeline::{
    FilterCriteria, FilterOption, TimelineBuilder, TimelineEntry, TimelineFilter,
    TimelineService, ZoomController,
};
use taskline::Error;

use crate::fixtures::{
    date, estimated_task, robot_service, robot_store, task, ALICE, BOB, ELECTRICAL, PROJECT,
};

fn ids(entries: &[TimelineEntry]) -> Vec<&str> {
    entries.iter().map(|e| e.id.as_str()).collect()
}

// Build tests

/// A January window keeps the mid-January task and drops the February one.
#[test]
fn test_window_excludes_tasks_outside() {
    let tasks = vec![
        task(1, date(1, 10), date(1, 20)),
        task(2, date(2, 1), date(2, 5)),
    ];
    let graph = DependencyGraph::from_tasks(&tasks).unwrap();

    let entries =
        TimelineBuilder::build(PROJECT, date(1, 1), date(1, 31), &tasks, &[], &graph).unwrap();

    assert_eq!(ids(&entries), vec!["task_1"]);
}

#[test]
fn test_project_timeline_contents_and_order() {
    let entries = robot_service()
        .timeline(PROJECT, date(1, 1), date(1, 31))
        .unwrap();

    assert_eq!(
        ids(&entries),
        vec!["milestone_1", "task_1", "task_5", "task_2", "task_4", "task_3"]
    );
    let links = TimelineBuilder::links(&entries);
    assert_eq!(links.len(), 2);
    assert!(links
        .iter()
        .any(|link| link.from == "task_1" && link.to == "task_2"));
}

#[test]
fn test_links_are_dropped_when_prerequisite_is_outside() {
    let entries = robot_service()
        .timeline(PROJECT, date(1, 15), date(1, 31))
        .unwrap();

    let cut = entries.iter().find(|e| e.id == "task_2").unwrap();
    assert!(cut.dependencies.is_empty());
    let weld = entries.iter().find(|e| e.id == "task_3").unwrap();
    assert_eq!(weld.dependencies.len(), 1);
}

#[test]
fn test_timeline_for_single_day() {
    let entries = robot_service().timeline_for_date(PROJECT, date(1, 16)).unwrap();
    assert_eq!(ids(&entries), vec!["task_5", "task_2", "task_4"]);
}

#[test]
fn test_inverted_window_is_rejected() {
    let result = robot_service().timeline(PROJECT, date(2, 1), date(1, 1));
    assert!(matches!(result, Err(Error::InvalidRange { .. })));
}

#[test]
fn test_timeline_serializes_for_renderer() {
    let entries = robot_service()
        .timeline(PROJECT, date(1, 1), date(1, 10))
        .unwrap();
    let json = serde_json::to_value(&entries).unwrap();

    assert_eq!(json[0]["kind"], "MILESTONE");
    assert_eq!(json[0]["start_date"], "2024-01-06");
    assert_eq!(json[1]["kind"], "TASK");
}

// Critical path tests

/// A -> B -> C at two days each is critical; a two-day side task is not.
#[test]
fn test_chain_is_critical_and_side_task_is_not() {
    let tasks = vec![
        estimated_task(1, date(1, 1), date(1, 2), 48.0),
        estimated_task(2, date(1, 3), date(1, 4), 48.0),
        estimated_task(3, date(1, 5), date(1, 6), 48.0),
        estimated_task(4, date(1, 1), date(1, 2), 48.0),
    ];
    let mut graph = DependencyGraph::new();
    graph.add_dependency(TaskId(2), TaskId(1)).unwrap();
    graph.add_dependency(TaskId(3), TaskId(2)).unwrap();

    let analysis = CriticalPathAnalyzer::default().analyze(&tasks, &graph);

    assert_eq!(analysis.critical_tasks, vec![TaskId(1), TaskId(2), TaskId(3)]);
    assert!(!analysis.is_critical(TaskId(4)));
    assert_eq!(analysis.slack_hours(TaskId(4)), Some(96.0));
    assert_eq!(analysis.total_duration_hours(), 144.0);
}

#[test]
fn test_timeline_marks_critical_entries() {
    let entries = robot_service()
        .timeline(PROJECT, date(1, 1), date(1, 31))
        .unwrap();

    let critical: Vec<&str> = entries
        .iter()
        .filter(|e| e.on_critical_path)
        .map(|e| e.id.as_str())
        .collect();
    assert_eq!(critical, vec!["task_1", "task_2", "task_3"]);
}

/// Tasks outside the window still shape the critical path.
#[test]
fn test_critical_path_ignores_window() {
    let entries = robot_service()
        .timeline(PROJECT, date(1, 18), date(1, 31))
        .unwrap();

    let weld = entries.iter().find(|e| e.id == "task_3").unwrap();
    assert!(weld.on_critical_path);
}

#[test]
fn test_configured_fallback_duration() {
    let config = Config {
        fallback_task_hours: 4.0,
        ..Config::default()
    };
    let service = TimelineService::with_config(robot_store(), &config);

    let analysis = service.critical_path(PROJECT).unwrap();

    assert_eq!(analysis.total_duration_hours(), 80.0);
    assert_eq!(analysis.slack_hours(TaskId(5)), Some(76.0));
    assert_eq!(analysis.slack_hours(TaskId(4)), Some(72.0));
}

#[test]
fn test_bottlenecks_of_project() {
    let bottlenecks = robot_service().bottlenecks(PROJECT).unwrap();

    assert_eq!(bottlenecks.len(), 1);
    assert_eq!(bottlenecks[0].task_id, TaskId(2));
    assert_eq!(bottlenecks[0].degree(), 2);
}

// Filter tests

#[test]
fn test_named_filters_on_service() {
    let service = robot_service();
    let window = |filter: &str, criteria: &FilterCriteria| {
        service
            .filtered_timeline(PROJECT, date(1, 1), date(1, 31), filter, criteria)
            .unwrap()
    };

    assert_eq!(
        ids(&window("CRITICAL_PATH", &FilterCriteria::default())),
        vec!["milestone_1", "task_1", "task_2", "task_3"]
    );
    assert_eq!(
        ids(&window("SUBSYSTEM", &FilterCriteria::subsystem(ELECTRICAL))),
        vec!["milestone_1", "task_4"]
    );
    assert_eq!(
        ids(&window("team-member", &FilterCriteria::member(BOB))),
        vec!["milestone_1", "task_5"]
    );
    assert_eq!(
        ids(&window(
            "OVERDUE",
            &FilterCriteria::default().with_today(date(1, 18))
        )),
        vec!["task_1", "task_2", "task_4"]
    );
}

#[test]
fn test_progress_changes_reach_filters() {
    let mut service = robot_service();
    let today = FilterCriteria::default().with_today(date(1, 16));

    let behind = service
        .filtered_timeline(PROJECT, date(1, 1), date(1, 31), "BEHIND_SCHEDULE", &today)
        .unwrap();
    assert_eq!(ids(&behind), vec!["task_2", "task_4"]);

    service.update_progress(TaskId(2), 60).unwrap();
    service.set_completed(TaskId(4), true).unwrap();

    let behind = service
        .filtered_timeline(PROJECT, date(1, 1), date(1, 31), "BEHIND_SCHEDULE", &today)
        .unwrap();
    assert!(behind.is_empty());
    let completed = service
        .filtered_timeline(PROJECT, date(1, 1), date(1, 31), "COMPLETED", &today)
        .unwrap();
    assert_eq!(ids(&completed), vec!["task_4"]);
}

#[test]
fn test_filter_from_query_pairs() {
    let entries = robot_service()
        .timeline(PROJECT, date(1, 1), date(1, 31))
        .unwrap();
    let pairs: BTreeMap<String, String> = [
        ("member".to_string(), ALICE.to_string()),
        ("start".to_string(), "2024-01-14".to_string()),
        ("end".to_string(), "2024-01-31".to_string()),
    ]
    .into_iter()
    .collect();
    let criteria = FilterCriteria::from_pairs(&pairs).unwrap();

    let filtered = TimelineFilter::apply(&entries, FilterOption::TeamMember, &criteria).unwrap();

    assert_eq!(ids(&filtered), vec!["task_4"]);
}

#[test]
fn test_filter_errors() {
    let service = robot_service();

    let missing = service.filtered_timeline(
        PROJECT,
        date(1, 1),
        date(1, 31),
        "SUBSYSTEM",
        &FilterCriteria::default(),
    );
    assert!(matches!(missing, Err(Error::Validation(_))));

    let unknown = service.filtered_timeline(
        PROJECT,
        date(1, 1),
        date(1, 31),
        "STARRED",
        &FilterCriteria::default(),
    );
    assert!(matches!(unknown, Err(Error::UnsupportedFilter(name)) if name == "STARRED"));
}

// Zoom tests

/// Zooming into a 60-day window with a 7-day floor stops above the floor.
#[test]
fn test_repeated_zoom_in_stops_at_minimum() {
    let mut zoom = ZoomController::new(date(1, 1), date(3, 1)).unwrap();
    assert_eq!(zoom.span_days(), 60);

    let mut spans = Vec::new();
    for _ in 0..9 {
        zoom.zoom_in();
        spans.push(zoom.span_days());
    }

    assert!(spans.iter().all(|span| *span >= 7));
    assert_eq!(&spans[..4], &[36, 22, 14, 10]);
    assert!(!zoom.zoom_in());
    assert_eq!(zoom.span_days(), 10);
}

#[test]
fn test_zoomed_window_drives_timeline() {
    let service = robot_service();
    let mut zoom = ZoomController::new(date(1, 1), date(3, 1)).unwrap();

    let (start, end) = zoom.window();
    assert_eq!(service.timeline(PROJECT, start, end).unwrap().len(), 7);

    assert!(zoom.zoom_in());
    let (start, end) = zoom.window();
    assert_eq!((start, end), (date(1, 13), date(2, 18)));
    assert_eq!(
        ids(&service.timeline(PROJECT, start, end).unwrap()),
        vec!["task_5", "task_2", "task_4", "task_3"]
    );
}

#[test]
fn test_configured_zoom_window() {
    let config = Config {
        days_before_today: 7,
        days_after_today: 7,
        min_span_days: 12,
        ..Config::default()
    };
    let mut zoom = ZoomController::from_config(&config, date(1, 15));

    assert_eq!(zoom.window(), (date(1, 8), date(1, 22)));
    assert!(!zoom.zoom_in());

    let mut store = InMemoryStore::new();
    store.insert_milestone(Milestone::new(MilestoneId(9), "Scrimmage", date(1, 20), PROJECT));
    let service = TimelineService::new(store);
    let (start, end) = zoom.window();
    assert_eq!(
        ids(&service.timeline(PROJECT, start, end).unwrap()),
        vec!["milestone_9"]
    );
}

//! Progress and completion edits end to end.

use taskline::core::task::TaskId;
use taskline::edit::rules::TaskDraft;
use taskline::edit::session::{EditSession, SessionCommand, SessionState};
use taskline::store::TaskStore;
use taskline::Error;

use crate::fixtures::{date, robot_service, task, DRIVETRAIN, PROJECT};

/// 60% -> 100% completes the task; un-completing keeps 100%.
#[test]
fn test_complete_then_reopen() {
    let mut task = task(1, date(1, 10), date(1, 20));
    task.set_progress(60).unwrap();
    assert!(!task.is_completed());

    task.set_progress(100).unwrap();
    assert!(task.is_completed());

    task.set_completed(false);
    assert!(!task.is_completed());
    assert_eq!(task.progress(), 100);
}

#[test]
fn test_progress_below_100_reopens() {
    let mut task = task(1, date(1, 10), date(1, 20));
    task.set_completed(true);
    assert_eq!(task.progress(), 100);

    task.set_progress(90).unwrap();

    assert!(!task.is_completed());
    assert_eq!(task.progress(), 90);
}

#[test]
fn test_out_of_range_progress_is_rejected() {
    let mut task = task(1, date(1, 10), date(1, 20));
    task.set_progress(40).unwrap();

    assert!(matches!(task.set_progress(101), Err(Error::Range(101))));
    assert!(matches!(task.set_progress(-1), Err(Error::Range(-1))));
    assert_eq!(task.progress(), 40);
}

#[test]
fn test_service_progress_updates_are_persisted() {
    let mut service = robot_service();

    service.update_progress(TaskId(2), 60).unwrap();
    service.update_progress(TaskId(2), 100).unwrap();
    let stored = service.store().require_task(TaskId(2)).unwrap();
    assert!(stored.is_completed());

    service.set_completed(TaskId(2), false).unwrap();
    let stored = service.store().require_task(TaskId(2)).unwrap();
    assert!(!stored.is_completed());
    assert_eq!(stored.progress(), 100);
}

#[test]
fn test_service_progress_unknown_task() {
    let mut service = robot_service();
    assert!(matches!(
        service.update_progress(TaskId(99), 10),
        Err(Error::TaskNotFound(TaskId(99)))
    ));
}

#[test]
fn test_edit_form_saves_progress_and_keeps_links() {
    let mut service = robot_service();
    let stored = service.store().require_task(TaskId(2)).unwrap();
    let mut session = EditSession::for_edit(TaskDraft::from_task(&stored));
    assert_eq!(session.state(), SessionState::CleanValid);

    session.on_field_changed(|draft| draft.progress = 100);
    session.on_field_changed(|draft| draft.completed = true);
    let draft = SessionCommand::Save
        .execute(&mut session)
        .unwrap()
        .unwrap();
    let updated = draft.apply_to(&stored).unwrap();
    service.store_mut().persist(updated).unwrap();

    let reloaded = service.store().require_task(TaskId(2)).unwrap();
    assert!(reloaded.is_completed());
    assert!(reloaded.check_invariants().is_ok());
    assert_eq!(reloaded.pre_dependencies(), stored.pre_dependencies());
    assert_eq!(reloaded.post_dependencies(), stored.post_dependencies());
}

#[test]
fn test_edit_form_blocks_bad_progress() {
    let stored = task(1, date(1, 10), date(1, 20));
    let mut session = EditSession::for_edit(TaskDraft::from_task(&stored));

    session.on_field_changed(|draft| draft.progress = 150);

    assert_eq!(session.state(), SessionState::DirtyInvalid);
    assert_eq!(
        session.error_message(),
        Some("Progress must be between 0 and 100")
    );
    assert!(matches!(
        SessionCommand::Save.execute(&mut session),
        Err(Error::Validation(_))
    ));
}

#[test]
fn test_new_task_form_lists_every_broken_rule() {
    let mut session = EditSession::for_new(TaskDraft::new(PROJECT, date(1, 10)));
    assert_eq!(session.state(), SessionState::CleanInvalid);
    assert!(session.error_message().is_none());

    session.on_field_changed(|draft| draft.end_date = Some(date(1, 5)));

    let message = session.error_message().unwrap_or_default().to_string();
    assert!(message.contains("Task title cannot be empty"));
    assert!(message.contains("Subsystem must be set"));
    assert!(message.contains("End date cannot be before start date"));

    session.on_field_changed(|draft| {
        draft.title = "Mount bumpers".to_string();
        draft.subsystem_id = Some(DRIVETRAIN);
        draft.end_date = Some(date(1, 14));
    });
    let draft = session.commit().unwrap();
    let created = draft.into_task(TaskId(6)).unwrap();

    assert_eq!(created.title, "Mount bumpers");
    assert_eq!(created.end_date(), Some(date(1, 14)));
    assert_eq!(created.progress(), 0);
}

use chrono::NaiveDate;
use std::fs;
use std::path::Path;
use taskflow::commands::*;
use taskflow::linking::{AutoAnswer, CascadeOutcome};
use taskflow::models::{DailyStatus, Priority, ProjectStatus, ProjectTask};
use taskflow::storage::{Collection, PersistenceGateway};
use taskflow::store::TaskStore;
use taskflow::Error;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
}

fn open(dir: &Path) -> TaskStore {
    TaskStore::open(PersistenceGateway::open_dir(dir), today())
}

/// Runs `f` against a store over a fresh directory whose collections start
/// empty, so the sample data stays out of the way.
fn with_test_db<F>(f: F)
where
    F: FnOnce(&mut TaskStore, &Path),
{
    let dir = tempfile::tempdir().unwrap();
    for c in Collection::ALL {
        fs::write(dir.path().join(format!("{}.json", c.key())), "[]").unwrap();
    }
    let mut store = open(dir.path());
    f(&mut store, dir.path());
}

fn add_launch_task(store: &mut TaskStore, notes: Option<&str>) -> ProjectTask {
    let notes = notes.map(String::from);
    cmd_project_add(store, "Launch".into(), "Copy".into(), None, None, None, notes, true).unwrap()
}

#[test]
fn test_first_launch_seeds_sample_data() {
    let dir = tempfile::tempdir().unwrap();
    let store = open(dir.path());
    assert_eq!(store.project_tasks().len(), 13);
    assert_eq!(store.daily_tasks().len(), 2);
    assert!(dir.path().join("taskflow_projects_v1.json").exists());
    assert!(dir.path().join("taskflow_daily_v1.json").exists());
}

#[test]
fn test_add_and_reload() {
    with_test_db(|store, dir| {
        cmd_project_add(
            store,
            "Launch".into(),
            "Write copy".into(),
            Some("2025-03-20".into()),
            None,
            Some(Priority::High),
            None,
            true,
        )
        .unwrap();

        let reopened = open(dir);
        let tasks = reopened.project_tasks();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].task_name, "Write copy");
        assert_eq!(tasks[0].status, ProjectStatus::Pending);
        assert_eq!(tasks[0].priority, Some(Priority::High));
        assert_eq!(tasks[0].delivery_date, NaiveDate::from_ymd_opt(2025, 3, 20));
    });
}

#[test]
fn test_add_rejects_bad_input() {
    with_test_db(|store, _| {
        let err = cmd_project_add(
            store,
            "Launch".into(),
            "Copy".into(),
            Some("20/03/2025".into()),
            None,
            None,
            None,
            true,
        );
        assert!(matches!(err, Err(Error::Invalid { field: "date", .. })));
        let err = cmd_project_add(store, "  ".into(), "Copy".into(), None, None, None, None, true);
        assert!(err.is_err());
        assert!(store.project_tasks().is_empty());
    });
}

#[test]
fn test_edit_and_clear_due_date() {
    with_test_db(|store, _| {
        let task = cmd_project_add(
            store,
            "Launch".into(),
            "Copy".into(),
            Some("2025-03-20".into()),
            None,
            None,
            None,
            true,
        )
        .unwrap();

        let edited = cmd_project_edit(
            store,
            &task.id[..4],
            None,
            Some("Final copy".into()),
            Some(String::new()),
            Some(ProjectStatus::InProgress),
            None,
            None,
            true,
        )
        .unwrap();
        assert_eq!(edited.task_name, "Final copy");
        assert_eq!(edited.delivery_date, None);
        assert_eq!(edited.status, ProjectStatus::InProgress);

        let nothing = cmd_project_edit(store, &task.id, None, None, None, None, None, None, true);
        assert!(nothing.is_err());
    });
}

#[test]
fn test_complete_and_remove_project_task() {
    with_test_db(|store, _| {
        let task = add_launch_task(store, None);
        cmd_project_done(store, &task.id, true).unwrap();
        assert!(store.project_tasks()[0].is_completed());

        cmd_project_remove(store, &task.id, true, true).unwrap();
        assert!(store.project_tasks().is_empty());

        let missing = cmd_project_done(store, &task.id, true);
        assert!(matches!(missing, Err(Error::TaskNotFound { .. })));
    });
}

#[test]
fn test_move_then_complete_removes_project_task_on_yes() {
    with_test_db(|store, dir| {
        let task = add_launch_task(store, Some("tone: warm"));
        let daily = cmd_move(store, &task.id, true).unwrap();
        assert_eq!(daily.original_task_id.as_deref(), Some(task.id.as_str()));
        assert_eq!(daily.link_notes, "[Launch] tone: warm");
        assert_eq!(daily.status, DailyStatus::Ongoing);
        // Moving copies; the source stays put.
        assert_eq!(store.project_tasks().len(), 1);

        let outcome =
            cmd_daily_done(store, &daily.id, today(), &mut AutoAnswer(true), true).unwrap();
        assert_eq!(outcome, Some(CascadeOutcome::Removed));
        assert!(store.project_tasks().is_empty());

        let reopened = open(dir);
        assert!(reopened.project_tasks().is_empty());
        assert_eq!(reopened.daily_tasks()[0].completed_date, Some(today()));
    });
}

#[test]
fn test_declining_the_cascade_keeps_project_task() {
    with_test_db(|store, _| {
        let task = add_launch_task(store, None);
        let daily = cmd_move(store, &task.id, true).unwrap();

        let outcome =
            cmd_daily_done(store, &daily.id, today(), &mut AutoAnswer(false), true).unwrap();
        assert_eq!(outcome, Some(CascadeOutcome::Kept));
        assert_eq!(store.project_tasks().len(), 1);
        assert!(store.daily_tasks()[0].is_done());
    });
}

#[test]
fn test_dangling_link_completes_without_prompt() {
    with_test_db(|store, _| {
        let task = add_launch_task(store, None);
        let daily = cmd_move(store, &task.id, true).unwrap();
        cmd_project_remove(store, &task.id, true, true).unwrap();

        let mut asked = false;
        let mut confirm = |_: &taskflow::linking::CascadeCandidate| {
            asked = true;
            true
        };
        let outcome = cmd_daily_done(store, &daily.id, today(), &mut confirm, true).unwrap();
        assert_eq!(outcome, None);
        assert!(!asked);
        assert!(store.daily_tasks()[0].is_done());
    });
}

#[test]
fn test_restore_does_not_bring_back_project_task() {
    with_test_db(|store, _| {
        let task = add_launch_task(store, None);
        let daily = cmd_move(store, &task.id, true).unwrap();
        cmd_daily_done(store, &daily.id, today(), &mut AutoAnswer(true), true).unwrap();

        cmd_daily_restore(store, &daily.id, true).unwrap();
        let restored = &store.daily_tasks()[0];
        assert_eq!(restored.status, DailyStatus::Ongoing);
        assert_eq!(restored.completed_date, None);
        assert_eq!(restored.original_task_id.as_deref(), Some(task.id.as_str()));
        assert!(store.project_tasks().is_empty());
    });
}

#[test]
fn test_daily_add_edit_and_remove() {
    with_test_db(|store, _| {
        let daily = cmd_daily_add(
            store,
            "Review PRs".into(),
            Some("1h 30m".into()),
            None,
            None,
            today(),
            true,
        )
        .unwrap();
        assert_eq!(daily.minutes(), 90);

        let done_now = cmd_daily_add(
            store,
            "Standup".into(),
            None,
            None,
            Some(DailyStatus::Done),
            today(),
            true,
        )
        .unwrap();
        assert_eq!(done_now.completed_date, Some(today()));
        assert_eq!(done_now.duration, "0m");

        let edited = cmd_daily_edit(
            store,
            &daily.id,
            None,
            Some("45m".into()),
            None,
            Some(DailyStatus::Remaining),
            true,
        )
        .unwrap();
        assert_eq!(edited.minutes(), 45);
        assert_eq!(edited.status, DailyStatus::Remaining);

        let to_done =
            cmd_daily_edit(store, &daily.id, None, None, None, Some(DailyStatus::Done), true);
        assert!(to_done.is_err());

        cmd_daily_remove(store, &daily.id, true, true).unwrap();
        assert_eq!(store.daily_tasks().len(), 1);
    });
}

#[test]
fn test_typed_durations_are_normalised() {
    with_test_db(|store, _| {
        let mut add = |name: &str, duration: &str| {
            cmd_daily_add(store, name.into(), Some(duration.into()), None, None, today(), true)
                .unwrap()
        };
        let plain = add("A", "90");
        assert_eq!(plain.duration, "1h 30m");
        let squashed = add("B", "2h15m");
        assert_eq!(squashed.duration, "2h 15m");
        let junk = add("C", "a while");
        assert_eq!(junk.duration, "a while");
        assert_eq!(junk.minutes(), 0);
    });
}

#[test]
fn test_ambiguous_prefix_is_rejected() {
    with_test_db(|store, _| {
        cmd_daily_add(store, "A".into(), None, None, None, today(), true).unwrap();
        cmd_daily_add(store, "B".into(), None, None, None, today(), true).unwrap();
        // Ids are random; only check ambiguity when they share a prefix.
        let ids: Vec<String> = store.daily_tasks().iter().map(|t| t.id.clone()).collect();
        let shared: String = ids[0]
            .chars()
            .zip(ids[1].chars())
            .take_while(|(a, b)| a == b)
            .map(|(a, _)| a)
            .collect();
        if !shared.is_empty() {
            let res = cmd_daily_restore(store, &shared, true);
            assert!(matches!(res, Err(Error::AmbiguousId { count: 2, .. })));
        }
        assert!(matches!(
            cmd_daily_restore(store, "zzzz", true),
            Err(Error::TaskNotFound { .. })
        ));
    });
}

#[test]
fn test_export_writes_csv() {
    with_test_db(|store, dir| {
        cmd_project_add(store, "هدنة".into(), "خطة".into(), None, None, None, None, true)
            .unwrap();
        let out = dir.join("exports");
        let path = cmd_export(store, ExportKind::CsvProjects, &out, today(), true).unwrap();
        assert_eq!(path, out.join("Project_Tasks_2025-03-14.csv"));

        let bytes = fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"\xEF\xBB\xBF"));
        assert!(String::from_utf8_lossy(&bytes).contains("هدنة"));
    });
}

#[test]
fn test_reset_restores_sample_data() {
    with_test_db(|store, _| {
        cmd_reset(store, true, today()).unwrap();
        assert_eq!(store.project_tasks().len(), 13);
        assert_eq!(store.daily_tasks().len(), 2);
    });
}

#[test]
fn test_corrupt_file_falls_back_to_seed_without_overwriting() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("taskflow_projects_v1.json");
    fs::write(&path, "{ not json").unwrap();

    let store = open(dir.path());
    assert_eq!(store.project_tasks().len(), 13);
    assert_eq!(fs::read_to_string(&path).unwrap(), "{ not json");
}

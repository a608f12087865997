use chrono::{Duration, NaiveDate};
use taskflow::duration::{format_minutes, parse_duration};
use taskflow::models::{DailyStatus, DailyTask, Priority, ProjectStatus, ProjectTask};
use taskflow::seed;
use taskflow::views::*;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
}

fn done(name: &str, duration: &str, on: Option<NaiveDate>) -> DailyTask {
    let mut t = DailyTask::new(name);
    t.duration = duration.into();
    t.status = DailyStatus::Done;
    t.completed_date = on;
    t
}

#[test]
fn test_grouping_seed_data_keeps_every_task() {
    let mut tasks = seed::project_tasks();
    let mut undated = ProjectTask::new("جلاس", "no date yet");
    undated.priority = Some(Priority::High);
    tasks.push(undated);
    let mut unprioritised = ProjectTask::new("هدنة", "unprioritised");
    unprioritised.priority = None;
    tasks.push(unprioritised);

    let project = tasks[0].project_name.clone();
    let filters = [
        ProjectFilter::default(),
        ProjectFilter { status: Some(ProjectStatus::Pending), ..Default::default() },
        ProjectFilter { status: Some(ProjectStatus::Completed), ..Default::default() },
        ProjectFilter { project: Some(project.clone()), ..Default::default() },
        ProjectFilter { priority: Some(Priority::High), ..Default::default() },
    ];

    for filter in &filters {
        let mut expected: Vec<&str> = tasks
            .iter()
            .filter(|t| filter.status.map_or(true, |s| t.status == s))
            .filter(|t| filter.project.as_ref().map_or(true, |p| &t.project_name == p))
            .filter(|t| filter.priority.map_or(true, |p| t.priority == Some(p)))
            .map(|t| t.id.as_str())
            .collect();
        expected.sort_unstable();
        assert!(!expected.is_empty(), "{:?} matches nothing", filter);

        for sort in [SortBy::Date, SortBy::Priority] {
            let groups = group_projects(&tasks, filter, sort);
            let mut flattened: Vec<&str> = groups
                .iter()
                .flat_map(|g| g.tasks.iter().map(|t| t.id.as_str()))
                .collect();
            flattened.sort_unstable();
            // Same length as the sorted ids, so nothing is listed twice.
            assert_eq!(flattened, expected, "{:?} / {:?}", filter, sort);

            for g in &groups {
                assert!(g.tasks.iter().all(|t| t.project_name == g.project_name));
            }
            if sort == SortBy::Date {
                for g in &groups {
                    let dates: Vec<_> = g.tasks.iter().map(|t| t.delivery_date).collect();
                    let dated: Vec<_> = dates.iter().flatten().collect();
                    assert!(dated.windows(2).all(|w| w[0] <= w[1]));
                    // Undated tasks sort after dated ones.
                    let first_undated =
                        dates.iter().position(Option::is_none).unwrap_or(dates.len());
                    assert!(dates[first_undated..].iter().all(Option::is_none));
                }
            }
        }
    }
}

#[test]
fn test_filter_by_status_and_project() {
    let tasks = seed::project_tasks();
    let name = tasks[0].project_name.clone();
    let filter = ProjectFilter {
        status: Some(ProjectStatus::Pending),
        project: Some(name.clone()),
        priority: None,
    };
    let groups = group_projects(&tasks, &filter, SortBy::Priority);
    assert!(groups.len() <= 1);
    for g in groups {
        assert_eq!(g.project_name, name);
        assert!(g.tasks.iter().all(|t| t.status == ProjectStatus::Pending));
    }
}

#[test]
fn test_one_of_four_completed_is_twenty_five_percent() {
    let mut tasks: Vec<ProjectTask> =
        (0..4).map(|i| ProjectTask::new("Launch", format!("t{}", i))).collect();
    tasks[2].status = ProjectStatus::Completed;
    assert_eq!(project_completion(&tasks, "Launch"), 25);
    assert_eq!(project_completion(&tasks, "Missing"), 0);

    let stats = dashboard_stats(&tasks, &[]);
    assert_eq!(stats.total_tasks, 4);
    assert_eq!(stats.total_projects, 1);
    assert_eq!(stats.completed_tasks, 1);
    assert_eq!(stats.pending_tasks, 3);
}

#[test]
fn test_archive_groups_by_day_with_totals() {
    let yesterday = today() - Duration::days(1);
    let tasks = vec![
        done("a", "30m", Some(yesterday)),
        done("b", "1h", Some(today())),
        DailyTask::new("still open"),
        done("c", "45m", Some(yesterday)),
        done("d", "15m", None),
    ];

    let groups = group_archive(&tasks);
    let dates: Vec<_> = groups.iter().map(|g| g.date).collect();
    // The unknown-date bucket leads, then days newest first.
    assert_eq!(dates, vec![None, Some(today()), Some(yesterday)]);
    assert_eq!(groups[0].total_minutes, 15);
    assert_eq!(groups[2].total_minutes, 75);
    assert_eq!(format_minutes(groups[2].total_minutes), "1س 15د");
    let names: Vec<_> = groups[2].tasks.iter().map(|t| t.task_name.as_str()).collect();
    assert_eq!(names, vec!["a", "c"]);
}

#[test]
fn test_daily_totals() {
    let mut open = DailyTask::new("open");
    open.duration = "1h 30m".into();
    let mut broken = DailyTask::new("broken");
    broken.duration = "soon".into();
    let tasks = vec![
        open,
        broken,
        done("today", ">4h", Some(today())),
        done("earlier", "2h", Some(today() - Duration::days(3))),
    ];

    assert_eq!(total_planned_minutes(&tasks), 90);
    assert_eq!(completed_minutes_on(&tasks, today()), 240);
    assert_eq!(parse_duration("soon"), 0);
    let (planner, archive) = split_daily(&tasks);
    assert_eq!(planner.len(), 2);
    assert_eq!(archive.len(), 2);
}

#[test]
fn test_board_lists_open_tasks_only() {
    let mut a = ProjectTask::new("Launch", "late");
    a.delivery_date = Some(today() + Duration::days(5));
    let mut b = ProjectTask::new("Launch", "soon");
    b.delivery_date = Some(today() + Duration::days(1));
    let mut c = ProjectTask::new("Launch", "finished");
    c.status = ProjectStatus::Completed;
    let mut d = ProjectTask::new("Wrap-up", "archived");
    d.status = ProjectStatus::Completed;

    let tasks = [a, b, c, d];
    let board = project_board(&tasks);
    assert_eq!(board.len(), 2);
    let names: Vec<_> = board[0].remaining.iter().map(|t| t.task_name.as_str()).collect();
    assert_eq!(names, vec!["soon", "late"]);
    assert!(board[1].remaining.is_empty());
    assert_eq!(days_until(today() - Duration::days(2), today()), -2);
}

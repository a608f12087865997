//! Read-only views derived from the task collections.
//!
//! Nothing here mutates its input. Functions that depend on the calendar take
//! `today` explicitly.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use crate::models::{DailyStatus, DailyTask, Priority, ProjectStatus, ProjectTask};

/// Equality filters over project tasks. `None` matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectFilter {
    pub status: Option<ProjectStatus>,
    pub project: Option<String>,
    pub priority: Option<Priority>,
}

impl ProjectFilter {
    pub fn matches(&self, task: &ProjectTask) -> bool {
        if let Some(p) = &self.project {
            if &task.project_name != p {
                return false;
            }
        }
        if let Some(s) = self.status {
            if task.status != s {
                return false;
            }
        }
        if let Some(p) = self.priority {
            // Stored priority, not the effective one: an unset priority only
            // survives the "all" filter.
            if task.priority != Some(p) {
                return false;
            }
        }
        true
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.project.is_none() && self.priority.is_none()
    }
}

/// Ordering of tasks inside a project group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortBy {
    /// Delivery date ascending, undated last.
    #[default]
    Date,
    /// Priority descending, unset counts as medium.
    Priority,
}

impl SortBy {
    pub fn toggle(self) -> Self {
        match self {
            SortBy::Date => SortBy::Priority,
            SortBy::Priority => SortBy::Date,
        }
    }
}

fn by_delivery_date(a: &ProjectTask, b: &ProjectTask) -> Ordering {
    match (a.delivery_date, b.delivery_date) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => a.cmp(&b),
    }
}

fn by_priority(a: &ProjectTask, b: &ProjectTask) -> Ordering {
    b.effective_priority()
        .weight()
        .cmp(&a.effective_priority().weight())
}

/// Tasks of one project after filtering and sorting.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectGroup<'a> {
    pub project_name: &'a str,
    pub tasks: Vec<&'a ProjectTask>,
}

/// Filters, groups by project name and sorts each group.
///
/// Groups come back in ascending name order; sorting within a group is
/// stable.
pub fn group_projects<'a>(
    tasks: &'a [ProjectTask],
    filter: &ProjectFilter,
    sort: SortBy,
) -> Vec<ProjectGroup<'a>> {
    let mut groups: BTreeMap<&'a str, Vec<&'a ProjectTask>> = BTreeMap::new();
    for task in tasks.iter().filter(|t| filter.matches(t)) {
        groups.entry(task.project_name.as_str()).or_default().push(task);
    }
    groups
        .into_iter()
        .map(|(project_name, mut tasks)| {
            match sort {
                SortBy::Date => tasks.sort_by(|a, b| by_delivery_date(a, b)),
                SortBy::Priority => tasks.sort_by(|a, b| by_priority(a, b)),
            }
            ProjectGroup {
                project_name,
                tasks,
            }
        })
        .collect()
}

/// Distinct project names in ascending order.
pub fn project_names(tasks: &[ProjectTask]) -> Vec<&str> {
    tasks
        .iter()
        .map(|t| t.project_name.as_str())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Number of distinct projects.
pub fn project_count(tasks: &[ProjectTask]) -> usize {
    project_names(tasks).len()
}

/// One card on the project board: the tasks still open in a project.
#[derive(Debug, Clone, PartialEq)]
pub struct BoardColumn<'a> {
    pub project_name: &'a str,
    pub remaining: Vec<&'a ProjectTask>,
}

/// Per project, the not-completed tasks ordered by delivery date.
///
/// Projects whose tasks are all completed still get an (empty) column.
pub fn project_board(tasks: &[ProjectTask]) -> Vec<BoardColumn<'_>> {
    project_names(tasks)
        .into_iter()
        .map(|name| {
            let mut remaining: Vec<&ProjectTask> = tasks
                .iter()
                .filter(|t| t.project_name == name && !t.is_completed())
                .collect();
            remaining.sort_by(|a, b| by_delivery_date(a, b));
            BoardColumn {
                project_name: name,
                remaining,
            }
        })
        .collect()
}

/// Signed number of days from `today` until `date`.
pub fn days_until(date: NaiveDate, today: NaiveDate) -> i64 {
    (date - today).num_days()
}

/// Planner entries (not done) and archive entries (done), in list order.
pub fn split_daily(tasks: &[DailyTask]) -> (Vec<&DailyTask>, Vec<&DailyTask>) {
    tasks.iter().partition(|t| t.status != DailyStatus::Done)
}

pub fn planner(tasks: &[DailyTask]) -> Vec<&DailyTask> {
    split_daily(tasks).0
}

pub fn archive(tasks: &[DailyTask]) -> Vec<&DailyTask> {
    split_daily(tasks).1
}

/// Done tasks sharing a completion date. `date` is `None` for the
/// "unknown date" bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveGroup<'a> {
    pub date: Option<NaiveDate>,
    pub tasks: Vec<&'a DailyTask>,
    pub total_minutes: u32,
}

/// Groups the archive by completion date. Undated entries form the first
/// group, then dated groups follow newest first.
pub fn group_archive(tasks: &[DailyTask]) -> Vec<ArchiveGroup<'_>> {
    let mut groups: BTreeMap<Option<NaiveDate>, ArchiveGroup<'_>> = BTreeMap::new();
    for task in tasks.iter().filter(|t| t.is_done()) {
        let group = groups
            .entry(task.completed_date)
            .or_insert_with(|| ArchiveGroup {
                date: task.completed_date,
                tasks: Vec::new(),
                total_minutes: 0,
            });
        group.tasks.push(task);
        group.total_minutes = group.total_minutes.saturating_add(task.minutes());
    }
    let unknown = groups.remove(&None);
    unknown
        .into_iter()
        .chain(groups.into_values().rev())
        .collect()
}

fn sum_minutes<'a>(tasks: impl IntoIterator<Item = &'a DailyTask>) -> u32 {
    tasks
        .into_iter()
        .fold(0u32, |acc, t| acc.saturating_add(t.minutes()))
}

/// Minutes planned across all entries still on the planner.
pub fn total_planned_minutes(tasks: &[DailyTask]) -> u32 {
    sum_minutes(tasks.iter().filter(|t| !t.is_done()))
}

/// Minutes of work finished on `today`.
pub fn completed_minutes_on(tasks: &[DailyTask], today: NaiveDate) -> u32 {
    sum_minutes(
        tasks
            .iter()
            .filter(|t| t.is_done() && t.completed_date == Some(today)),
    )
}

/// `round(100 * completed / total)`, zero when there is nothing to complete.
pub fn completion_percent(completed: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    // Integer form of half-up rounding.
    ((200 * completed + total) / (2 * total)) as u32
}

/// Completion of one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectProgress<'a> {
    pub project_name: &'a str,
    pub completed: usize,
    pub total: usize,
    pub percent: u32,
}

/// Completion per project, ordered by project name.
pub fn project_progress(tasks: &[ProjectTask]) -> Vec<ProjectProgress<'_>> {
    let mut counts: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for task in tasks {
        let entry = counts.entry(task.project_name.as_str()).or_default();
        entry.1 += 1;
        if task.is_completed() {
            entry.0 += 1;
        }
    }
    counts
        .into_iter()
        .map(|(project_name, (completed, total))| ProjectProgress {
            project_name,
            completed,
            total,
            percent: completion_percent(completed, total),
        })
        .collect()
}

/// Completion percentage of a single project; zero for unknown projects.
pub fn project_completion(tasks: &[ProjectTask], project: &str) -> u32 {
    let (completed, total) = tasks
        .iter()
        .filter(|t| t.project_name == project)
        .fold((0, 0), |(c, n), t| (c + usize::from(t.is_completed()), n + 1));
    completion_percent(completed, total)
}

/// Project task count per status, always in Completed, In Progress, Pending
/// order and including zero counts.
pub fn status_breakdown(tasks: &[ProjectTask]) -> Vec<(ProjectStatus, usize)> {
    [
        ProjectStatus::Completed,
        ProjectStatus::InProgress,
        ProjectStatus::Pending,
    ]
    .into_iter()
    .map(|s| (s, tasks.iter().filter(|t| t.status == s).count()))
    .collect()
}

/// Headline figures for the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardStats {
    pub total_tasks: usize,
    pub total_projects: usize,
    pub completed_tasks: usize,
    pub pending_tasks: usize,
    pub daily_done: usize,
}

pub fn dashboard_stats(project_tasks: &[ProjectTask], daily_tasks: &[DailyTask]) -> DashboardStats {
    DashboardStats {
        total_tasks: project_tasks.len(),
        total_projects: project_count(project_tasks),
        completed_tasks: project_tasks.iter().filter(|t| t.is_completed()).count(),
        pending_tasks: project_tasks
            .iter()
            .filter(|t| t.status == ProjectStatus::Pending)
            .count(),
        daily_done: daily_tasks.iter().filter(|t| t.is_done()).count(),
    }
}

/// Project tasks due exactly on `today`.
pub fn due_on(tasks: &[ProjectTask], today: NaiveDate) -> Vec<&ProjectTask> {
    tasks
        .iter()
        .filter(|t| t.delivery_date == Some(today))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn ptask(
        id: &str,
        project: &str,
        date: Option<NaiveDate>,
        priority: Option<Priority>,
    ) -> ProjectTask {
        let mut t = ProjectTask::new(project, id);
        t.id = id.to_string();
        t.delivery_date = date;
        t.priority = priority;
        t
    }

    #[test]
    fn date_sort_puts_undated_last_and_is_stable() {
        let tasks = vec![
            ptask("a", "P", None, None),
            ptask("b", "P", Some(date(2024, 1, 5)), None),
            ptask("c", "P", None, None),
            ptask("d", "P", Some(date(2024, 1, 1)), None),
        ];
        let groups = group_projects(&tasks, &ProjectFilter::default(), SortBy::Date);
        let ids: Vec<&str> = groups[0].tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["d", "b", "a", "c"]);
    }

    #[test]
    fn priority_sort_defaults_to_medium() {
        let tasks = vec![
            ptask("low", "P", None, Some(Priority::Low)),
            ptask("unset", "P", None, None),
            ptask("high", "P", None, Some(Priority::High)),
            ptask("med", "P", None, Some(Priority::Medium)),
        ];
        let groups = group_projects(&tasks, &ProjectFilter::default(), SortBy::Priority);
        let ids: Vec<&str> = groups[0].tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["high", "unset", "med", "low"]);
    }

    #[test]
    fn groups_are_name_ordered_and_filtered() {
        let mut done = ptask("x", "Zeta", None, None);
        done.status = ProjectStatus::Completed;
        let tasks = vec![done, ptask("y", "Alpha", None, None), ptask("z", "Zeta", None, None)];

        let groups = group_projects(&tasks, &ProjectFilter::default(), SortBy::Date);
        let names: Vec<&str> = groups.iter().map(|g| g.project_name).collect();
        assert_eq!(names, vec!["Alpha", "Zeta"]);

        let filter = ProjectFilter {
            status: Some(ProjectStatus::Completed),
            ..Default::default()
        };
        let groups = group_projects(&tasks, &filter, SortBy::Date);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].tasks[0].id, "x");
    }

    #[test]
    fn percent_rounds_half_up_and_guards_zero() {
        assert_eq!(completion_percent(1, 4), 25);
        assert_eq!(completion_percent(0, 0), 0);
        assert_eq!(completion_percent(2, 3), 67);
        assert_eq!(completion_percent(1, 8), 13);
        assert_eq!(completion_percent(3, 3), 100);
    }

    #[test]
    fn archive_groups_unknown_first_then_newest() {
        let mk = |id: &str, dur: &str, d: Option<NaiveDate>| {
            let mut t = DailyTask::new(id);
            t.id = id.to_string();
            t.duration = dur.to_string();
            t.status = DailyStatus::Done;
            t.completed_date = d;
            t
        };
        let tasks = vec![
            mk("a", "30m", Some(date(2024, 1, 2))),
            mk("b", "1h", None),
            mk("c", "1h", Some(date(2024, 1, 3))),
            mk("d", "15m", Some(date(2024, 1, 2))),
            DailyTask::new("open"),
        ];
        let groups = group_archive(&tasks);
        let dates: Vec<Option<NaiveDate>> = groups.iter().map(|g| g.date).collect();
        assert_eq!(dates, vec![None, Some(date(2024, 1, 3)), Some(date(2024, 1, 2))]);
        assert_eq!(groups[0].total_minutes, 60);
        assert_eq!(groups[2].total_minutes, 45);
        assert_eq!(groups[2].tasks.len(), 2);
    }

    #[test]
    fn board_skips_completed_tasks() {
        let mut done = ptask("done", "P", Some(date(2024, 1, 1)), None);
        done.status = ProjectStatus::Completed;
        let tasks = vec![
            done,
            ptask("later", "P", None, None),
            ptask("soon", "P", Some(date(2024, 2, 1)), None),
        ];
        let board = project_board(&tasks);
        let ids: Vec<&str> = board[0].remaining.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["soon", "later"]);
    }

    #[test]
    fn days_until_is_signed() {
        let today = date(2024, 3, 10);
        assert_eq!(days_until(date(2024, 3, 8), today), -2);
        assert_eq!(days_until(today, today), 0);
    }
}

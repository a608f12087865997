use std::io::{self, Write};
use std::path::Path;

use chrono::NaiveDate;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};

use crate::ai;
use crate::config::Settings;
use crate::duration::{canonical_duration, format_minutes, parse_duration, DURATION_OPTIONS};
use crate::error::{Error, Result};
use crate::export;
use crate::linking::{
    complete_daily_task, move_to_daily, resolve_cascade, restore_daily_task, CascadeCandidate,
    CascadeOutcome, ConfirmCascade,
};
use crate::models::{
    parse_date, DailyStatus, DailyTask, DailyTaskPatch, Priority, ProjectStatus, ProjectTask,
    ProjectTaskPatch,
};
use crate::notify::{DesktopBackend, Notifier};
use crate::store::TaskStore;
use crate::views::{self, ProjectFilter, SortBy};

/// Asks a yes/no question on stdin. Anything but `y`/`yes` is a no.
pub fn prompt_yes_no(question: &str) -> bool {
    print!("{} [y/N] ", question);
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut input = String::new();
    if io::stdin().read_line(&mut input).is_err() {
        return false;
    }
    matches!(input.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Cascade confirmation on the terminal.
pub struct StdinConfirm;

impl ConfirmCascade for StdinConfirm {
    fn confirm(&mut self, candidate: &CascadeCandidate) -> bool {
        prompt_yes_no(&format!(
            "\"{}\" is linked to project \"{}\". \
             Remove it from the project list now that it is finished?",
            candidate.task_name, candidate.project_name
        ))
    }
}

fn short_id(id: &str) -> &str {
    id.get(..6).unwrap_or(id)
}

fn bold(text: &str) -> Cell {
    Cell::new(text).add_attribute(Attribute::Bold)
}

fn date_text(d: Option<NaiveDate>) -> String {
    d.map(|d| d.to_string()).unwrap_or_else(|| "-".into())
}

fn project_status_color(s: ProjectStatus) -> Color {
    match s {
        ProjectStatus::Completed => Color::Green,
        ProjectStatus::InProgress => Color::Yellow,
        ProjectStatus::Pending => Color::Grey,
    }
}

fn priority_color(p: Priority) -> Color {
    match p {
        Priority::High => Color::Red,
        Priority::Medium => Color::Yellow,
        Priority::Low => Color::Blue,
    }
}

fn daily_status_color(s: DailyStatus) -> Color {
    match s {
        DailyStatus::Ongoing => Color::Yellow,
        DailyStatus::Remaining => Color::Grey,
        DailyStatus::Done => Color::Green,
    }
}

fn new_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(headers.iter().map(|h| bold(h)).collect::<Vec<_>>());
    table
}

fn parse_optional_date(raw: Option<String>) -> Result<Option<NaiveDate>> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => parse_date(s).map(Some).map_err(|e| Error::invalid("date", e)),
    }
}

/// Adds a project task at the top of the list.
#[allow(clippy::too_many_arguments)]
pub fn cmd_project_add(
    store: &mut TaskStore,
    project: String,
    name: String,
    due: Option<String>,
    status: Option<ProjectStatus>,
    priority: Option<Priority>,
    notes: Option<String>,
    silent: bool,
) -> Result<ProjectTask> {
    let mut task = ProjectTask::new(project, name);
    task.delivery_date = parse_optional_date(due)?;
    task.status = status.unwrap_or(ProjectStatus::Pending);
    task.priority = Some(priority.unwrap_or(Priority::Medium));
    task.notes = notes.filter(|n| !n.trim().is_empty());
    let task = store.add_project_task(task)?;
    if !silent {
        println!("Task added to '{}' (id = {})", task.project_name, task.id);
    }
    Ok(task)
}

/// Prints project tasks grouped by project with a progress line per group.
pub fn cmd_project_list(store: &TaskStore, filter: &ProjectFilter, sort: SortBy) {
    let tasks = store.project_tasks();
    let groups = views::group_projects(tasks, filter, sort);
    if groups.is_empty() {
        println!("No project tasks found.");
        return;
    }

    for group in groups {
        let percent = views::project_completion(tasks, group.project_name);
        println!(
            "\n{} ({} tasks, {}% complete)",
            group.project_name,
            group.tasks.len(),
            percent
        );
        let mut table = new_table(&["ID", "Task", "Due", "Status", "Priority", "Notes"]);
        for t in group.tasks {
            let priority = t.effective_priority();
            table.add_row(vec![
                Cell::new(short_id(&t.id)),
                Cell::new(&t.task_name),
                Cell::new(date_text(t.delivery_date)),
                Cell::new(t.status).fg(project_status_color(t.status)),
                Cell::new(priority).fg(priority_color(priority)),
                Cell::new(t.notes.as_deref().unwrap_or("")),
            ]);
        }
        println!("{table}");
    }
}

/// Prints the open tasks of every project with due-date badges.
pub fn cmd_project_board(store: &TaskStore, today: NaiveDate) {
    let board = views::project_board(store.project_tasks());
    if board.is_empty() {
        println!("No projects yet.");
        return;
    }
    for column in board {
        println!("\n{} ({} remaining)", column.project_name, column.remaining.len());
        if column.remaining.is_empty() {
            println!("  All tasks done.");
            continue;
        }
        let mut table = new_table(&["ID", "Task", "Due", "When", "Priority"]);
        for t in column.remaining {
            let (when, color) = match t.delivery_date.map(|d| views::days_until(d, today)) {
                Some(days) if days < 0 => (format!("{}d overdue", days.abs()), Color::Red),
                Some(0) => ("Today".to_string(), Color::DarkYellow),
                Some(days) => (format!("{}d", days), Color::Reset),
                None => ("-".to_string(), Color::Reset),
            };
            table.add_row(vec![
                Cell::new(short_id(&t.id)),
                Cell::new(&t.task_name),
                Cell::new(date_text(t.delivery_date)),
                Cell::new(when).fg(color),
                Cell::new(t.effective_priority()),
            ]);
        }
        println!("{table}");
    }
}

/// Edits fields of a project task. `due` of `""` clears the date.
#[allow(clippy::too_many_arguments)]
pub fn cmd_project_edit(
    store: &mut TaskStore,
    id: &str,
    project: Option<String>,
    name: Option<String>,
    due: Option<String>,
    status: Option<ProjectStatus>,
    priority: Option<Priority>,
    notes: Option<String>,
    silent: bool,
) -> Result<ProjectTask> {
    let id = store.resolve_project_id(id)?;
    let delivery_date = match due {
        Some(d) => Some(parse_optional_date(Some(d))?),
        None => None,
    };
    let patch = ProjectTaskPatch {
        project_name: project,
        task_name: name,
        delivery_date,
        status,
        priority,
        notes: notes.map(|n| Some(n).filter(|n| !n.trim().is_empty())),
    };
    if patch.is_empty() {
        return Err(Error::invalid("edit", "nothing to change"));
    }
    let task = store.update_project_task(&id, &patch)?;
    if !silent {
        println!("Task {} updated.", task.id);
    }
    Ok(task)
}

/// Marks a project task as completed.
pub fn cmd_project_done(store: &mut TaskStore, id: &str, silent: bool) -> Result<()> {
    let id = store.resolve_project_id(id)?;
    store.complete_project_task(&id)?;
    if !silent {
        println!("Task {} marked as completed.", id);
    }
    Ok(())
}

/// Deletes a project task, asking first unless `force` is set.
pub fn cmd_project_remove(
    store: &mut TaskStore,
    id: &str,
    force: bool,
    silent: bool,
) -> Result<()> {
    let id = store.resolve_project_id(id)?;
    if !force && !prompt_yes_no("Delete this task permanently?") {
        println!("Aborted.");
        return Ok(());
    }
    let removed = store.delete_project_task(&id)?;
    if !silent {
        println!("Task '{}' removed.", removed.task_name);
    }
    Ok(())
}

/// Copies a project task to the daily planner.
pub fn cmd_move(store: &mut TaskStore, id: &str, silent: bool) -> Result<DailyTask> {
    let id = store.resolve_project_id(id)?;
    let daily = move_to_daily(store, &id)?;
    if !silent {
        println!(
            "Copied \"{}\" to the daily planner (id = {}).",
            daily.task_name, daily.id
        );
    }
    Ok(daily)
}

/// Rewrites typed durations like `90` or `1h30m` to the planner's form.
/// Unrecognised text is kept as typed and counts as zero minutes.
fn normalize_duration(raw: &str, silent: bool) -> String {
    let raw = raw.trim();
    if raw.is_empty() || DURATION_OPTIONS.contains(&raw) {
        return raw.to_string();
    }
    match parse_duration(raw) {
        0 if raw.chars().all(|c| c == '0' || c == 'm') => "0m".to_string(),
        0 => {
            if !silent {
                println!(
                    "Unrecognised duration '{}', counted as 0. Try one of: {}",
                    raw,
                    DURATION_OPTIONS.join(", ")
                );
            }
            raw.to_string()
        }
        mins => canonical_duration(mins),
    }
}

pub fn cmd_daily_add(
    store: &mut TaskStore,
    name: String,
    duration: Option<String>,
    notes: Option<String>,
    status: Option<DailyStatus>,
    today: NaiveDate,
    silent: bool,
) -> Result<DailyTask> {
    let mut task = DailyTask::new(name);
    if let Some(d) = duration {
        task.duration = normalize_duration(&d, silent);
    }
    task.link_notes = notes.unwrap_or_default();
    task.status = status.unwrap_or(DailyStatus::Ongoing);
    let task = store.add_daily_task(task, today)?;
    if !silent {
        println!("Daily task added (id = {})", task.id);
    }
    Ok(task)
}

/// Prints the planner with planned and completed-today totals.
pub fn cmd_daily_list(store: &TaskStore, today: NaiveDate) {
    let tasks = store.daily_tasks();
    let planner = views::planner(tasks);
    println!(
        "Planned: {} | Completed today: {}",
        format_minutes(views::total_planned_minutes(tasks)),
        format_minutes(views::completed_minutes_on(tasks, today))
    );
    if planner.is_empty() {
        println!("Planner is empty.");
        return;
    }
    let mut table = new_table(&["ID", "Task", "Duration", "Status", "Notes", "Linked"]);
    for t in planner {
        let linked = match t.original_task_id.as_deref() {
            Some(pid) if store.project_task(pid).is_some() => "yes",
            Some(_) => "removed",
            None => "",
        };
        table.add_row(vec![
            Cell::new(short_id(&t.id)),
            Cell::new(&t.task_name),
            Cell::new(format_minutes(t.minutes())),
            Cell::new(t.status).fg(daily_status_color(t.status)),
            Cell::new(&t.link_notes),
            Cell::new(linked),
        ]);
    }
    println!("{table}");
}

/// Prints done tasks grouped by completion date.
pub fn cmd_daily_archive(store: &TaskStore) {
    let groups = views::group_archive(store.daily_tasks());
    if groups.is_empty() {
        println!("Archive is empty.");
        return;
    }
    for group in groups {
        let label = group
            .date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "Unknown date".into());
        println!("\n{} (total {})", label, format_minutes(group.total_minutes));
        let mut table = new_table(&["ID", "Task", "Duration", "Notes"]);
        for t in group.tasks {
            table.add_row(vec![
                Cell::new(short_id(&t.id)),
                Cell::new(&t.task_name),
                Cell::new(format_minutes(t.minutes())),
                Cell::new(&t.link_notes),
            ]);
        }
        println!("{table}");
    }
}

pub fn cmd_daily_edit(
    store: &mut TaskStore,
    id: &str,
    name: Option<String>,
    duration: Option<String>,
    notes: Option<String>,
    status: Option<DailyStatus>,
    silent: bool,
) -> Result<DailyTask> {
    let id = store.resolve_daily_id(id)?;
    let patch = DailyTaskPatch {
        task_name: name,
        duration: duration.map(|d| normalize_duration(&d, silent)),
        link_notes: notes,
        status,
    };
    if patch.is_empty() {
        return Err(Error::invalid("edit", "nothing to change"));
    }
    let task = store.update_daily_task(&id, &patch)?;
    if !silent {
        println!("Daily task {} updated.", task.id);
    }
    Ok(task)
}

/// Completes a daily task and, for linked tasks, offers to remove the
/// project original.
pub fn cmd_daily_done(
    store: &mut TaskStore,
    id: &str,
    today: NaiveDate,
    confirm: &mut dyn ConfirmCascade,
    silent: bool,
) -> Result<Option<CascadeOutcome>> {
    let id = store.resolve_daily_id(id)?;
    let candidate = complete_daily_task(store, &id, today)?;
    if !silent {
        println!("Daily task {} marked as done.", id);
    }
    let Some(candidate) = candidate else {
        return Ok(None);
    };
    let outcome = resolve_cascade(store, &candidate, confirm);
    if !silent {
        match outcome {
            CascadeOutcome::Removed => println!(
                "Removed \"{}\" from project '{}'.",
                candidate.task_name, candidate.project_name
            ),
            CascadeOutcome::Kept => println!("Kept the project task."),
            CascadeOutcome::Gone => {}
        }
    }
    Ok(Some(outcome))
}

pub fn cmd_daily_restore(store: &mut TaskStore, id: &str, silent: bool) -> Result<()> {
    let id = store.resolve_daily_id(id)?;
    let task = restore_daily_task(store, &id)?;
    if !silent {
        println!("\"{}\" moved back to the planner.", task.task_name);
    }
    Ok(())
}

pub fn cmd_daily_remove(store: &mut TaskStore, id: &str, force: bool, silent: bool) -> Result<()> {
    let id = store.resolve_daily_id(id)?;
    if !force && !prompt_yes_no("Delete this record permanently?") {
        println!("Aborted.");
        return Ok(());
    }
    let removed = store.delete_daily_task(&id)?;
    if !silent {
        println!("Daily task '{}' removed.", removed.task_name);
    }
    Ok(())
}

/// Prints headline numbers, status breakdown and per-project progress.
pub fn cmd_dashboard(store: &TaskStore, today: NaiveDate) {
    let projects = store.project_tasks();
    let daily = store.daily_tasks();
    let stats = views::dashboard_stats(projects, daily);

    let mut table = new_table(&["Total tasks", "Projects", "Completed", "Pending", "Daily done"]);
    table.add_row(vec![
        Cell::new(stats.total_tasks),
        Cell::new(stats.total_projects),
        Cell::new(stats.completed_tasks).fg(Color::Green),
        Cell::new(stats.pending_tasks).fg(Color::Red),
        Cell::new(stats.daily_done),
    ]);
    println!("{table}");

    let mut table = new_table(&["Status", "Tasks"]);
    for (status, count) in views::status_breakdown(projects) {
        table.add_row(vec![
            Cell::new(status).fg(project_status_color(status)),
            Cell::new(count),
        ]);
    }
    println!("{table}");

    let mut table = new_table(&["Project", "Done", "Progress"]);
    for p in views::project_progress(projects) {
        table.add_row(vec![
            Cell::new(p.project_name),
            Cell::new(format!("{}/{}", p.completed, p.total)),
            Cell::new(format!("{}%", p.percent)),
        ]);
    }
    println!("{table}");

    println!(
        "Planned: {} | Completed today: {}",
        format_minutes(views::total_planned_minutes(daily)),
        format_minutes(views::completed_minutes_on(daily, today))
    );
}

/// What to export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Excel,
    CsvProjects,
    CsvDaily,
    History,
}

pub fn cmd_export(
    store: &TaskStore,
    kind: ExportKind,
    dir: &Path,
    today: NaiveDate,
    silent: bool,
) -> Result<std::path::PathBuf> {
    let path = match kind {
        ExportKind::Excel => {
            export::export_workbook(dir, store.project_tasks(), store.daily_tasks(), today)?
        }
        ExportKind::CsvProjects => export::export_csv(
            dir,
            export::PROJECT_CSV_LABEL,
            store.project_tasks(),
            today,
        )?,
        ExportKind::CsvDaily => {
            export::export_csv(dir, export::DAILY_CSV_LABEL, store.daily_tasks(), today)?
        }
        ExportKind::History => {
            export::export_daily_history(dir, views::archive(store.daily_tasks()), today)?
        }
    };
    if !silent {
        println!("Exported to {}", path.display());
    }
    Ok(path)
}

/// Sends reminders for project tasks due today.
pub fn cmd_notify_check(store: &TaskStore, settings: &Settings, today: NaiveDate) {
    let mut notifier = Notifier::new(DesktopBackend, settings.notifications.enabled);
    if !notifier.request_permission() {
        println!("Notifications are disabled.");
        return;
    }
    let sent = notifier.check_upcoming(store.project_tasks(), today);
    println!("Sent {} reminder(s).", sent);
}

/// Sends a single test notification.
pub fn cmd_notify_test(settings: &Settings) {
    let mut notifier = Notifier::new(DesktopBackend, settings.notifications.enabled);
    if notifier.request_permission() && notifier.notify("TaskFlow", "Notifications are enabled.") {
        println!("Notification sent.");
    } else {
        println!("Notifications are unavailable.");
    }
}

/// Prints the AI productivity summary.
pub fn cmd_summary(store: &TaskStore, settings: &Settings) {
    let text =
        ai::summarize_with_settings(&settings.ai, store.project_tasks(), store.daily_tasks());
    println!("{}", text);
}

/// Wipes stored data and re-seeds the defaults.
pub fn cmd_reset(store: &mut TaskStore, force: bool, today: NaiveDate) -> Result<()> {
    if !force
        && !prompt_yes_no("Are you sure you want to delete all tasks? This cannot be undone.")
    {
        println!("Aborted.");
        return Ok(());
    }
    store.reset(today)?;
    println!("Data reset to the default sample tasks.");
    Ok(())
}

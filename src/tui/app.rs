use chrono::{Local, NaiveDate};
use ratatui::widgets::TableState;
use tracing::{info, warn};

use crate::ai;
use crate::config::Settings;
use crate::duration::format_minutes;
use crate::export;
use crate::linking::{
    complete_daily_task, move_to_daily, resolve_cascade, restore_daily_task, AutoAnswer,
    CascadeCandidate,
};
use crate::models::{
    parse_date, DailyStatus, DailyTask, DailyTaskPatch, Priority, ProjectStatus, ProjectTask,
    ProjectTaskPatch,
};
use crate::notify::{NotificationBackend, Notifier};
use crate::store::TaskStore;
use crate::views::{self, ProjectFilter, SortBy};

/// Source of the current local date.
pub type Clock = Box<dyn Fn() -> NaiveDate>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
    Adding,
    /// Waiting for y/n on a linked project task.
    Confirm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    Projects,
    Daily,
    Archive,
    Dashboard,
}

impl ViewMode {
    pub fn next(self) -> Self {
        match self {
            ViewMode::Projects => ViewMode::Daily,
            ViewMode::Daily => ViewMode::Archive,
            ViewMode::Archive => ViewMode::Dashboard,
            ViewMode::Dashboard => ViewMode::Projects,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ViewMode::Projects => "Projects",
            ViewMode::Daily => "Daily Planner",
            ViewMode::Archive => "Archive",
            ViewMode::Dashboard => "Dashboard",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputField {
    None,
    Name,
    Project,
    Due,
    Priority,
    Notes,
    Duration,
}

/// One row of the current table.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayItem {
    ProjectHeader {
        name: String,
        count: usize,
        percent: u32,
    },
    Project(ProjectTask),
    DateHeader {
        label: String,
        total_minutes: u32,
    },
    Daily(DailyTask),
}

/// State for the multi-step add wizard.
#[derive(Debug, Default)]
pub struct AddState {
    pub step: usize,
    pub project: String,
    pub name: String,
}

pub struct App {
    pub store: TaskStore,
    pub settings: Settings,
    clock: Clock,
    pub view_mode: ViewMode,
    pub display_items: Vec<DisplayItem>,
    pub state: TableState,
    pub input_mode: InputMode,
    pub input_field: InputField,
    pub input_buffer: String,
    pub target_id: Option<String>,
    pub add_state: AddState,
    pub filter: ProjectFilter,
    pub sort: SortBy,
    pub pending_cascade: Option<CascadeCandidate>,
    pub message: Option<String>,
    /// Last AI summary shown on the dashboard.
    pub summary: Option<String>,
}

fn cycle<T: Copy + PartialEq>(current: Option<T>, all: &[T]) -> Option<T> {
    match current {
        None => all.first().copied(),
        Some(c) => {
            let i = all.iter().position(|x| *x == c).map_or(all.len(), |i| i + 1);
            all.get(i).copied()
        }
    }
}

impl App {
    pub fn new(store: TaskStore, settings: Settings) -> App {
        App::with_clock(store, settings, Box::new(|| Local::now().date_naive()))
    }

    pub fn with_clock(store: TaskStore, settings: Settings, clock: Clock) -> App {
        let mut app = App {
            store,
            settings,
            clock,
            view_mode: ViewMode::Projects,
            display_items: Vec::new(),
            state: TableState::default(),
            input_mode: InputMode::Normal,
            input_field: InputField::None,
            input_buffer: String::new(),
            target_id: None,
            add_state: AddState::default(),
            filter: ProjectFilter::default(),
            sort: SortBy::default(),
            pending_cascade: None,
            message: None,
            summary: None,
        };
        app.reload();
        app
    }

    /// The local date, read afresh on every call.
    pub fn today(&self) -> NaiveDate {
        (self.clock)()
    }

    /// Rebuilds the rows of the current view from the store.
    pub fn reload(&mut self) {
        self.display_items.clear();
        match self.view_mode {
            ViewMode::Projects => {
                let tasks = self.store.project_tasks();
                for group in views::group_projects(tasks, &self.filter, self.sort) {
                    self.display_items.push(DisplayItem::ProjectHeader {
                        name: group.project_name.to_string(),
                        count: group.tasks.len(),
                        percent: views::project_completion(tasks, group.project_name),
                    });
                    for t in group.tasks {
                        self.display_items.push(DisplayItem::Project(t.clone()));
                    }
                }
            }
            ViewMode::Daily => {
                for t in views::planner(self.store.daily_tasks()) {
                    self.display_items.push(DisplayItem::Daily(t.clone()));
                }
            }
            ViewMode::Archive => {
                for group in views::group_archive(self.store.daily_tasks()) {
                    let label = group
                        .date
                        .map(|d| d.to_string())
                        .unwrap_or_else(|| "Unknown date".into());
                    self.display_items.push(DisplayItem::DateHeader {
                        label,
                        total_minutes: group.total_minutes,
                    });
                    for t in group.tasks {
                        self.display_items.push(DisplayItem::Daily(t.clone()));
                    }
                }
            }
            ViewMode::Dashboard => {}
        }

        if self.display_items.is_empty() {
            self.state.select(None);
        } else if let Some(i) = self.state.selected() {
            if i >= self.display_items.len() {
                self.state.select(Some(self.display_items.len() - 1));
            }
        } else {
            self.state.select(Some(0));
        }
    }

    pub fn next(&mut self) {
        if self.display_items.is_empty() {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i + 1 < self.display_items.len() => i + 1,
            _ => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        if self.display_items.is_empty() {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => self.display_items.len() - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    pub fn toggle_view(&mut self) {
        self.view_mode = self.view_mode.next();
        self.state.select(None);
        self.reload();
    }

    fn selected(&self) -> Option<&DisplayItem> {
        self.state.selected().and_then(|i| self.display_items.get(i))
    }

    fn selected_project(&self) -> Option<&ProjectTask> {
        match self.selected() {
            Some(DisplayItem::Project(t)) => Some(t),
            _ => None,
        }
    }

    fn selected_daily(&self) -> Option<&DailyTask> {
        match self.selected() {
            Some(DisplayItem::Daily(t)) => Some(t),
            _ => None,
        }
    }

    fn report<T>(&mut self, res: crate::Result<T>) -> Option<T> {
        match res {
            Ok(v) => Some(v),
            Err(e) => {
                self.message = Some(e.to_string());
                None
            }
        }
    }

    /// Space: completes the selected task. A linked daily task may open the
    /// confirm popup.
    pub fn complete_selected(&mut self) {
        match self.view_mode {
            ViewMode::Projects => {
                if let Some(id) = self.selected_project().map(|t| t.id.clone()) {
                    let res = self.store.complete_project_task(&id);
                    self.report(res);
                }
            }
            ViewMode::Daily => {
                if let Some(id) = self.selected_daily().map(|t| t.id.clone()) {
                    let today = self.today();
                    let res = complete_daily_task(&mut self.store, &id, today);
                    if let Some(Some(candidate)) = self.report(res) {
                        self.pending_cascade = Some(candidate);
                        self.input_mode = InputMode::Confirm;
                    }
                }
            }
            _ => {}
        }
        self.reload();
    }

    /// Answers the confirm popup.
    pub fn answer_cascade(&mut self, remove: bool) {
        if let Some(candidate) = self.pending_cascade.take() {
            resolve_cascade(&mut self.store, &candidate, &mut AutoAnswer(remove));
        }
        self.input_mode = InputMode::Normal;
        self.reload();
    }

    pub fn restore_selected(&mut self) {
        if self.view_mode != ViewMode::Archive {
            return;
        }
        if let Some(id) = self.selected_daily().map(|t| t.id.clone()) {
            let res = restore_daily_task(&mut self.store, &id);
            self.report(res);
            self.reload();
        }
    }

    pub fn delete_selected(&mut self) {
        let res = match self.selected() {
            Some(DisplayItem::Project(t)) => {
                let id = t.id.clone();
                self.store.delete_project_task(&id).map(|_| ())
            }
            Some(DisplayItem::Daily(t)) => {
                let id = t.id.clone();
                self.store.delete_daily_task(&id).map(|_| ())
            }
            _ => return,
        };
        self.report(res);
        self.reload();
    }

    /// Copies the selected project task to the planner.
    pub fn move_selected(&mut self) {
        if let Some(id) = self.selected_project().map(|t| t.id.clone()) {
            let res = move_to_daily(&mut self.store, &id);
            if let Some(daily) = self.report(res) {
                self.message = Some(format!("Copied \"{}\" to the planner", daily.task_name));
            }
        }
    }

    /// Advances the status of the selected task one step.
    pub fn cycle_status(&mut self) {
        let res = match self.selected() {
            Some(DisplayItem::Project(t)) => {
                let status = match t.status {
                    ProjectStatus::Pending => ProjectStatus::InProgress,
                    ProjectStatus::InProgress => ProjectStatus::Completed,
                    ProjectStatus::Completed => ProjectStatus::Pending,
                };
                let patch = ProjectTaskPatch {
                    status: Some(status),
                    ..Default::default()
                };
                let id = t.id.clone();
                self.store.update_project_task(&id, &patch).map(|_| ())
            }
            Some(DisplayItem::Daily(t)) if !t.is_done() => {
                let status = match t.status {
                    DailyStatus::Ongoing => DailyStatus::Remaining,
                    _ => DailyStatus::Ongoing,
                };
                let patch = DailyTaskPatch {
                    status: Some(status),
                    ..Default::default()
                };
                let id = t.id.clone();
                self.store.update_daily_task(&id, &patch).map(|_| ())
            }
            _ => return,
        };
        self.report(res);
        self.reload();
    }

    pub fn cycle_status_filter(&mut self) {
        self.filter.status = cycle(self.filter.status, &ProjectStatus::ALL);
        self.reload();
    }

    pub fn cycle_priority_filter(&mut self) {
        self.filter.priority = cycle(self.filter.priority, &Priority::ALL);
        self.reload();
    }

    pub fn cycle_project_filter(&mut self) {
        let names: Vec<String> = views::project_names(self.store.project_tasks())
            .into_iter()
            .map(str::to_string)
            .collect();
        self.filter.project = match &self.filter.project {
            None => names.first().cloned(),
            Some(current) => {
                let i = names.iter().position(|n| n == current).map_or(names.len(), |i| i + 1);
                names.get(i).cloned()
            }
        };
        self.reload();
    }

    pub fn toggle_sort(&mut self) {
        self.sort = self.sort.toggle();
        self.reload();
    }

    pub fn export(&mut self) {
        let res = export::export_workbook(
            &self.settings.export_dir,
            self.store.project_tasks(),
            self.store.daily_tasks(),
            self.today(),
        );
        match res {
            Ok(path) => self.message = Some(format!("Exported to {}", path.display())),
            Err(e) => {
                warn!(error = %e, "export failed");
                self.message = Some(e.to_string());
            }
        }
    }

    pub fn start_add(&mut self) {
        if !matches!(self.view_mode, ViewMode::Projects | ViewMode::Daily) {
            return;
        }
        self.input_mode = InputMode::Adding;
        self.add_state = AddState::default();
        self.input_buffer.clear();
    }

    pub fn start_edit(&mut self, field: InputField) {
        let prefill = match (self.selected(), field) {
            (Some(DisplayItem::Project(t)), InputField::Name) => t.task_name.clone(),
            (Some(DisplayItem::Project(t)), InputField::Project) => t.project_name.clone(),
            (Some(DisplayItem::Project(t)), InputField::Due) => {
                t.delivery_date.map(|d| d.to_string()).unwrap_or_default()
            }
            (Some(DisplayItem::Project(t)), InputField::Priority) => {
                t.effective_priority().to_string()
            }
            (Some(DisplayItem::Project(t)), InputField::Notes) => {
                t.notes.clone().unwrap_or_default()
            }
            (Some(DisplayItem::Daily(t)), InputField::Name) => t.task_name.clone(),
            (Some(DisplayItem::Daily(t)), InputField::Notes) => t.link_notes.clone(),
            (Some(DisplayItem::Daily(t)), InputField::Duration) => t.duration.clone(),
            _ => return,
        };
        self.target_id = match self.selected() {
            Some(DisplayItem::Project(t)) => Some(t.id.clone()),
            Some(DisplayItem::Daily(t)) => Some(t.id.clone()),
            _ => None,
        };
        self.input_mode = InputMode::Editing;
        self.input_field = field;
        self.input_buffer = prefill;
    }

    pub fn cancel_input(&mut self) {
        self.input_mode = InputMode::Normal;
        self.input_field = InputField::None;
        self.input_buffer.clear();
        self.target_id = None;
    }

    pub fn handle_input(&mut self) {
        match self.input_mode {
            InputMode::Adding => self.handle_adding_input(),
            InputMode::Editing => self.handle_editing_input(),
            _ => {}
        }
    }

    fn handle_adding_input(&mut self) {
        let value = self.input_buffer.trim().to_string();
        match (self.view_mode, self.add_state.step) {
            (ViewMode::Projects, 0) => {
                if value.is_empty() {
                    return;
                }
                self.add_state.project = value;
            }
            (ViewMode::Projects, 1) | (ViewMode::Daily, 0) => {
                if value.is_empty() {
                    return;
                }
                self.add_state.name = value;
            }
            (ViewMode::Projects, 2) => {
                let due = if value.is_empty() {
                    None
                } else {
                    match parse_date(&value) {
                        Ok(d) => Some(d),
                        Err(e) => {
                            self.message = Some(e);
                            return;
                        }
                    }
                };
                let res = self.store.quick_add_project_task(
                    &self.add_state.project,
                    &self.add_state.name,
                    due,
                );
                self.report(res);
                self.finish_input();
                return;
            }
            (ViewMode::Daily, 1) => {
                let mut task = DailyTask::new(self.add_state.name.clone());
                if !value.is_empty() {
                    task.duration = value;
                }
                let res = self.store.add_daily_task(task, self.today());
                self.report(res);
                self.finish_input();
                return;
            }
            _ => return,
        }
        self.add_state.step += 1;
        self.input_buffer.clear();
    }

    fn handle_editing_input(&mut self) {
        let Some(id) = self.target_id.clone() else {
            self.cancel_input();
            return;
        };
        let value = self.input_buffer.clone();
        let res = match self.view_mode {
            ViewMode::Projects => {
                let mut patch = ProjectTaskPatch::default();
                match self.input_field {
                    InputField::Name => patch.task_name = Some(value),
                    InputField::Project => patch.project_name = Some(value),
                    InputField::Due => {
                        patch.delivery_date = match value.trim() {
                            "" => Some(None),
                            s => match parse_date(s) {
                                Ok(d) => Some(Some(d)),
                                Err(e) => {
                                    self.message = Some(e);
                                    return;
                                }
                            },
                        }
                    }
                    InputField::Priority => match value.parse::<Priority>() {
                        Ok(p) => patch.priority = Some(p),
                        Err(e) => {
                            self.message = Some(e);
                            return;
                        }
                    },
                    InputField::Notes => {
                        patch.notes = Some(Some(value).filter(|n| !n.trim().is_empty()))
                    }
                    _ => {}
                }
                self.store.update_project_task(&id, &patch).map(|_| ())
            }
            ViewMode::Daily | ViewMode::Archive => {
                let mut patch = DailyTaskPatch::default();
                match self.input_field {
                    InputField::Name => patch.task_name = Some(value),
                    InputField::Notes => patch.link_notes = Some(value),
                    InputField::Duration => patch.duration = Some(value),
                    _ => {}
                }
                self.store.update_daily_task(&id, &patch).map(|_| ())
            }
            ViewMode::Dashboard => Ok(()),
        };
        self.report(res);
        self.finish_input();
    }

    fn finish_input(&mut self) {
        self.cancel_input();
        self.reload();
    }

    /// Planned and completed-today totals for the planner footer.
    pub fn daily_totals(&self) -> (String, String) {
        let tasks = self.store.daily_tasks();
        (
            format_minutes(views::total_planned_minutes(tasks)),
            format_minutes(views::completed_minutes_on(tasks, self.today())),
        )
    }

    /// Sends reminders for project tasks due today if notifications are
    /// allowed.
    pub fn check_reminders<B: NotificationBackend>(&mut self, notifier: &mut Notifier<B>) {
        if !notifier.request_permission() {
            return;
        }
        let sent = notifier.check_upcoming(self.store.project_tasks(), self.today());
        if sent > 0 {
            info!(sent, "sent delivery reminders");
            self.message = Some(format!("Sent {} reminder(s) for tasks due today", sent));
        }
    }

    /// Fetches the AI summary shown on the dashboard.
    pub fn summarize(&mut self) {
        if self.view_mode != ViewMode::Dashboard {
            return;
        }
        self.summary = Some(ai::summarize_with_settings(
            &self.settings.ai,
            self.store.project_tasks(),
            self.store.daily_tasks(),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use crate::ai::MISSING_KEY_MESSAGE;
    use crate::linking::create_linked_daily_task;
    use crate::storage::{Collection, MemoryStore, PersistenceGateway};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
    }

    fn empty_store() -> TaskStore {
        let mem = MemoryStore::new();
        for c in Collection::ALL {
            mem.insert_raw(c.key(), "[]");
        }
        TaskStore::open(PersistenceGateway::new(mem), today())
    }

    fn app() -> App {
        App::with_clock(empty_store(), Settings::default(), Box::new(today))
    }

    #[derive(Default)]
    struct Recorder {
        shown: RefCell<Vec<String>>,
    }

    impl NotificationBackend for &Recorder {
        fn is_available(&self) -> bool {
            true
        }

        fn show(&self, _title: &str, body: &str) -> anyhow::Result<()> {
            self.shown.borrow_mut().push(body.to_string());
            Ok(())
        }
    }

    fn type_text(app: &mut App, text: &str) {
        app.input_buffer = text.to_string();
        app.handle_input();
    }

    #[test]
    fn add_wizard_creates_a_project_task() {
        let mut app = app();
        app.start_add();
        type_text(&mut app, "Launch");
        type_text(&mut app, "Write copy");
        type_text(&mut app, "2024-06-12");

        assert_eq!(app.input_mode, InputMode::Normal);
        let task = &app.store.project_tasks()[0];
        assert_eq!(task.task_name, "Write copy");
        assert_eq!(task.delivery_date, NaiveDate::from_ymd_opt(2024, 6, 12));
        assert!(matches!(app.display_items[0], DisplayItem::ProjectHeader { .. }));
    }

    #[test]
    fn completing_a_linked_task_waits_for_confirmation() {
        let mut app = app();
        let project = app
            .store
            .quick_add_project_task("Launch", "Write copy", None)
            .unwrap();
        let daily = create_linked_daily_task(&project);
        app.store.add_daily_task(daily, today()).unwrap();

        app.toggle_view();
        assert_eq!(app.view_mode, ViewMode::Daily);
        app.state.select(Some(0));
        app.complete_selected();
        assert_eq!(app.input_mode, InputMode::Confirm);
        assert!(app.store.daily_tasks()[0].is_done());

        app.answer_cascade(true);
        assert_eq!(app.input_mode, InputMode::Normal);
        assert!(app.store.project_tasks().is_empty());
    }

    #[test]
    fn filters_cycle_back_to_all() {
        let mut app = app();
        for _ in 0..ProjectStatus::ALL.len() {
            app.cycle_status_filter();
        }
        assert_eq!(app.filter.status, Some(ProjectStatus::Completed));
        app.cycle_status_filter();
        assert_eq!(app.filter.status, None);
    }

    #[test]
    fn bad_date_keeps_the_popup_open() {
        let mut app = app();
        app.store.quick_add_project_task("Launch", "Copy", None).unwrap();
        app.reload();
        app.state.select(Some(1));
        app.start_edit(InputField::Due);
        type_text(&mut app, "not a date");
        assert_eq!(app.input_mode, InputMode::Editing);
        assert!(app.message.is_some());
    }

    #[test]
    fn session_follows_the_clock_past_midnight() {
        let day = Rc::new(Cell::new(today()));
        let clock = Rc::clone(&day);
        let mut app = App::with_clock(
            empty_store(),
            Settings::default(),
            Box::new(move || clock.get()),
        );
        for name in ["late night", "early morning"] {
            let mut task = DailyTask::new(name);
            task.duration = "30m".into();
            app.store.add_daily_task(task, today()).unwrap();
        }
        app.toggle_view();

        app.state.select(Some(0));
        app.complete_selected();
        let next_day = today().succ_opt().unwrap();
        day.set(next_day);
        app.state.select(Some(0));
        app.complete_selected();

        let dates: Vec<_> = app
            .store
            .daily_tasks()
            .iter()
            .map(|t| t.completed_date)
            .collect();
        assert!(dates.contains(&Some(today())));
        assert!(dates.contains(&Some(next_day)));
        assert_eq!(app.today(), next_day);
        assert_eq!(app.daily_totals().1, format_minutes(30));
    }

    #[test]
    fn reminders_cover_tasks_due_today() {
        let mut app = app();
        app.store
            .quick_add_project_task("Launch", "Send invites", Some(today()))
            .unwrap();
        app.store
            .quick_add_project_task("Launch", "Follow up", today().succ_opt())
            .unwrap();

        let rec = Recorder::default();
        let mut notifier = Notifier::new(&rec, true);
        app.check_reminders(&mut notifier);
        assert_eq!(rec.shown.borrow().len(), 1);
        assert!(app.message.is_some());

        let rec = Recorder::default();
        let mut muted = Notifier::new(&rec, false);
        app.check_reminders(&mut muted);
        assert!(rec.shown.borrow().is_empty());
    }

    #[test]
    fn dashboard_summary_without_key_explains_setup() {
        let mut app = app();
        app.summarize();
        assert_eq!(app.summary, None);
        while app.view_mode != ViewMode::Dashboard {
            app.toggle_view();
        }
        app.summarize();
        assert_eq!(app.summary.as_deref(), Some(MISSING_KEY_MESSAGE));
    }
}

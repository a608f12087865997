use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Clear, Gauge, Paragraph, Row, Table, Wrap},
    Frame,
};

use super::app::{App, DisplayItem, InputField, InputMode, ViewMode};
use crate::duration::format_minutes;
use crate::models::{DailyStatus, Priority, ProjectStatus};
use crate::views;

pub fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // Table
            Constraint::Length(3)  // Help
        ].as_ref())
        .split(f.area());

    match app.view_mode {
        ViewMode::Projects => render_projects(f, app, chunks[0]),
        ViewMode::Daily | ViewMode::Archive => render_daily(f, app, chunks[0]),
        ViewMode::Dashboard => render_dashboard(f, app, chunks[0]),
    }

    let help_text = match app.input_mode {
        InputMode::Normal => match app.view_mode {
            ViewMode::Projects => concat!(
                "q: Quit | Tab: View | a: Add | Space: Done | s: Status | m: To Daily | ",
                "n/p/t/i/e: Edit | d: Del | S/P/G: Filter | o: Sort | x: Export"
            ),
            ViewMode::Daily => concat!(
                "q: Quit | Tab: View | a: Add | Space: Done | s: Status | ",
                "n/h/e: Edit | d: Del | x: Export"
            ),
            ViewMode::Archive => "q: Quit | Tab: View | r: Restore | d: Del | x: Export",
            ViewMode::Dashboard => "q: Quit | Tab: View | A: AI Summary | x: Export",
        },
        InputMode::Editing => "Enter: Save | Esc: Cancel",
        InputMode::Adding => "Enter: Next Step | Esc: Cancel",
        InputMode::Confirm => "y: Remove project task | n: Keep it",
    };
    let help_text = match &app.message {
        Some(msg) => format!("{} | {}", msg, help_text),
        None => help_text.to_string(),
    };

    let help = Paragraph::new(help_text)
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::ALL));

    f.render_widget(help, chunks[1]);

    match app.input_mode {
        InputMode::Editing | InputMode::Adding => {
            let area = centered_rect(60, 3, f.area());
            f.render_widget(Clear, area);
            let input = Paragraph::new(app.input_buffer.as_str())
                .style(Style::default().fg(Color::Yellow))
                .block(Block::default().borders(Borders::ALL).title(input_title(app)));
            f.render_widget(input, area);
        }
        InputMode::Confirm => {
            if let Some(c) = &app.pending_cascade {
                let area = centered_rect(60, 4, f.area());
                f.render_widget(Clear, area);
                let text = format!(
                    "\"{}\" is done. Remove it from project \"{}\"? (y/n)",
                    c.task_name, c.project_name
                );
                let popup = Paragraph::new(text)
                    .style(Style::default().fg(Color::Yellow))
                    .block(Block::default().borders(Borders::ALL).title("Linked task"));
                f.render_widget(popup, area);
            }
        }
        InputMode::Normal => {}
    }
}

fn input_title(app: &App) -> &'static str {
    match app.input_mode {
        InputMode::Adding => match (app.view_mode, app.add_state.step) {
            (ViewMode::Projects, 0) => "Add Task: Enter Project",
            (ViewMode::Projects, 1) => "Add Task: Enter Name",
            (ViewMode::Projects, _) => "Add Task: Enter Due Date (YYYY-MM-DD, optional)",
            (_, 0) => "Add Daily Task: Enter Name",
            _ => "Add Daily Task: Enter Duration (e.g. 1h 30m)",
        },
        InputMode::Editing => match app.input_field {
            InputField::Name => "Edit Name",
            InputField::Project => "Edit Project",
            InputField::Due => "Edit Due Date (YYYY-MM-DD, empty clears)",
            InputField::Priority => "Edit Priority (High/Medium/Low)",
            InputField::Notes => "Edit Notes",
            InputField::Duration => "Edit Duration",
            InputField::None => "Edit",
        },
        _ => "",
    }
}

fn header_style() -> Style {
    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
}

fn highlight_style() -> Style {
    Style::default().add_modifier(Modifier::BOLD).bg(Color::DarkGray)
}

fn project_status_color(s: ProjectStatus) -> Color {
    match s {
        ProjectStatus::Completed => Color::Green,
        ProjectStatus::InProgress => Color::Yellow,
        ProjectStatus::Pending => Color::Gray,
    }
}

fn render_projects(f: &mut Frame, app: &mut App, area: Rect) {
    let today = app.today();
    let rows: Vec<Row> = app
        .display_items
        .iter()
        .map(|item| match item {
            DisplayItem::ProjectHeader { name, count, percent } => Row::new(vec![
                Cell::from(format!("{} ({})", name, count)),
                Cell::from(""),
                Cell::from(""),
                Cell::from(format!("{}%", percent)),
                Cell::from(""),
            ])
            .style(Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD)),
            DisplayItem::Project(t) => {
                let due = t.delivery_date.map(|d| d.to_string()).unwrap_or_default();
                let when = match t.delivery_date.map(|d| views::days_until(d, today)) {
                    Some(days) if days < 0 => format!("{} ({}d overdue)", due, days.abs()),
                    Some(0) => "Today".to_string(),
                    Some(_) => due,
                    None => "-".to_string(),
                };
                let priority = t.effective_priority();
                let priority_color = match priority {
                    Priority::High => Color::Red,
                    Priority::Medium => Color::Yellow,
                    Priority::Low => Color::Blue,
                };
                Row::new(vec![
                    Cell::from(format!("  {}", t.task_name)),
                    Cell::from(when),
                    Cell::from(t.status.as_str())
                        .style(Style::default().fg(project_status_color(t.status))),
                    Cell::from(priority.as_str()).style(Style::default().fg(priority_color)),
                    Cell::from(t.notes.clone().unwrap_or_default()),
                ])
            }
            _ => Row::new(Vec::<Cell>::new()),
        })
        .collect();

    let widths = [
        Constraint::Min(24),
        Constraint::Length(24),
        Constraint::Length(12),
        Constraint::Length(8),
        Constraint::Min(10),
    ];

    let mut title = format!("TaskFlow - Projects (sort: {:?}", app.sort);
    if let Some(s) = app.filter.status {
        title.push_str(&format!(", status: {}", s));
    }
    if let Some(p) = app.filter.priority {
        title.push_str(&format!(", priority: {}", p));
    }
    if let Some(p) = &app.filter.project {
        title.push_str(&format!(", project: {}", p));
    }
    title.push(')');

    let table = Table::new(rows, widths)
        .header(Row::new(vec!["Task", "Due", "Status", "Priority", "Notes"])
            .style(header_style())
            .bottom_margin(1))
        .block(Block::default().borders(Borders::ALL).title(title))
        .row_highlight_style(highlight_style())
        .highlight_symbol(">> ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_daily(f: &mut Frame, app: &mut App, area: Rect) {
    let rows: Vec<Row> = app
        .display_items
        .iter()
        .map(|item| match item {
            DisplayItem::DateHeader { label, total_minutes } => Row::new(vec![
                Cell::from(label.clone()),
                Cell::from(format_minutes(*total_minutes)),
                Cell::from(""),
                Cell::from(""),
            ])
            .style(Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD)),
            DisplayItem::Daily(t) => {
                let color = match t.status {
                    DailyStatus::Ongoing => Color::Yellow,
                    DailyStatus::Remaining => Color::Gray,
                    DailyStatus::Done => Color::Green,
                };
                Row::new(vec![
                    Cell::from(t.task_name.clone()),
                    Cell::from(format_minutes(t.minutes())),
                    Cell::from(t.status.as_str()).style(Style::default().fg(color)),
                    Cell::from(t.link_notes.clone()),
                ])
            }
            _ => Row::new(Vec::<Cell>::new()),
        })
        .collect();

    let widths = [
        Constraint::Min(24),
        Constraint::Length(10),
        Constraint::Length(10),
        Constraint::Min(16),
    ];

    let title = match app.view_mode {
        ViewMode::Archive => "TaskFlow - Archive".to_string(),
        _ => {
            let (planned, done) = app.daily_totals();
            format!("TaskFlow - Daily Planner (planned {}, done today {})", planned, done)
        }
    };

    let table = Table::new(rows, widths)
        .header(Row::new(vec!["Task", "Duration", "Status", "Notes"])
            .style(header_style())
            .bottom_margin(1))
        .block(Block::default().borders(Borders::ALL).title(title))
        .row_highlight_style(highlight_style())
        .highlight_symbol(">> ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_dashboard(f: &mut Frame, app: &App, area: Rect) {
    let projects = app.store.project_tasks();
    let stats = views::dashboard_stats(projects, app.store.daily_tasks());
    let progress = views::project_progress(projects);

    let mut constraints = vec![Constraint::Length(4)];
    constraints.extend(progress.iter().map(|_| Constraint::Length(3)));
    constraints.push(Constraint::Min(0));
    let block = Block::default().borders(Borders::ALL).title("TaskFlow - Dashboard");
    let inner = block.inner(area);
    f.render_widget(block, area);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(inner);

    let breakdown = views::status_breakdown(projects)
        .into_iter()
        .map(|(s, n)| format!("{}: {}", s, n))
        .collect::<Vec<_>>()
        .join("  ");
    let summary = Paragraph::new(format!(
        "Tasks: {}  Projects: {}  Completed: {}  Pending: {}  Daily done: {}\n{}",
        stats.total_tasks,
        stats.total_projects,
        stats.completed_tasks,
        stats.pending_tasks,
        stats.daily_done,
        breakdown
    ));
    f.render_widget(summary, chunks[0]);

    for (i, p) in progress.iter().enumerate() {
        let gauge = Gauge::default()
            .block(Block::default().borders(Borders::ALL).title(p.project_name))
            .gauge_style(Style::default().fg(Color::Green))
            .percent(p.percent.min(100) as u16)
            .label(format!("{}/{} ({}%)", p.completed, p.total, p.percent));
        f.render_widget(gauge, chunks[i + 1]);
    }

    let text = app
        .summary
        .as_deref()
        .unwrap_or("Press A for an AI summary of your progress.");
    let insight = Paragraph::new(text)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("AI Insights"));
    f.render_widget(insight, chunks[progress.len() + 1]);
}

fn centered_rect(percent_x: u16, height: u16, r: Rect) -> Rect {
    let margin = r.height.saturating_sub(height) / 2;
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(margin),
            Constraint::Length(height),
            Constraint::Length(margin),
        ].as_ref())
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ].as_ref())
        .split(popup_layout[1])[1]
}

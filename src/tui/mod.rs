pub mod app;
pub mod ui;

use std::io;

use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use tracing::{error, info};

use crate::config::Settings;
use crate::notify::{DesktopBackend, Notifier};
use crate::store::TaskStore;
use app::{App, InputField, InputMode};
use ui::ui;

pub fn run_tui(store: TaskStore, settings: Settings) -> anyhow::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut notifier = Notifier::new(DesktopBackend, settings.notifications.enabled);
    let mut app = App::new(store, settings);
    app.check_reminders(&mut notifier);
    info!("interactive session started");

    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = &res {
        error!(error = %err, "interactive session failed");
    }
    res.map_err(Into::into)
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        match app.input_mode {
            InputMode::Normal => {
                app.message = None;
                match key.code {
                    KeyCode::Char('q') => return Ok(()),
                    KeyCode::Down | KeyCode::Char('j') => app.next(),
                    KeyCode::Up | KeyCode::Char('k') => app.previous(),
                    KeyCode::Tab | KeyCode::Char('v') => app.toggle_view(),
                    KeyCode::Char(' ') => app.complete_selected(),
                    KeyCode::Char('r') => app.restore_selected(),
                    KeyCode::Char('d') | KeyCode::Delete => app.delete_selected(),
                    KeyCode::Char('m') => app.move_selected(),
                    KeyCode::Char('s') => app.cycle_status(),
                    KeyCode::Char('a') => app.start_add(),
                    KeyCode::Char('n') => app.start_edit(InputField::Name),
                    KeyCode::Char('p') => app.start_edit(InputField::Project),
                    KeyCode::Char('t') => app.start_edit(InputField::Due),
                    KeyCode::Char('i') => app.start_edit(InputField::Priority),
                    KeyCode::Char('e') => app.start_edit(InputField::Notes),
                    KeyCode::Char('h') => app.start_edit(InputField::Duration),
                    KeyCode::Char('S') => app.cycle_status_filter(),
                    KeyCode::Char('P') => app.cycle_priority_filter(),
                    KeyCode::Char('G') => app.cycle_project_filter(),
                    KeyCode::Char('o') => app.toggle_sort(),
                    KeyCode::Char('x') => app.export(),
                    KeyCode::Char('A') => app.summarize(),
                    _ => {}
                }
            }
            InputMode::Confirm => match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => app.answer_cascade(true),
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    app.answer_cascade(false)
                }
                _ => {}
            },
            InputMode::Editing | InputMode::Adding => match key.code {
                KeyCode::Enter => app.handle_input(),
                KeyCode::Esc => app.cancel_input(),
                KeyCode::Char(c) => {
                    app.input_buffer.push(c);
                }
                KeyCode::Backspace => {
                    app.input_buffer.pop();
                }
                _ => {}
            },
        }
    }
}

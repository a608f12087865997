//! # TaskFlow
//!
//! A local task manager with two lists: project tasks grouped by project, and
//! a daily planner of time-boxed work. Both live on disk as JSON and can be
//! driven from the command line or an interactive terminal UI.
//!
//! ## Usage
//!
//! ### Interactive Mode (TUI)
//!
//! ```bash
//! taskflow
//! # or explicitly
//! taskflow ui
//! ```
//!
//! #### TUI Key Bindings
//!
//! *   `q`: Quit
//! *   `Tab` / `v`: Cycle Projects, Daily Planner, Archive and Dashboard
//! *   `a`: Add task
//! *   `Space`: Complete selected task
//! *   `s`: Advance status
//! *   `m`: Copy project task to the daily planner
//! *   `r`: Restore archived task
//! *   `d`: Delete selected task
//! *   `n`, `p`, `t`, `i`, `e`, `h`: Edit name, project, due date, priority, notes, duration
//! *   `S`, `P`, `G`: Cycle status, priority and project filters
//! *   `o`: Toggle sort between date and priority
//! *   `x`: Export a workbook
//! *   `A`: AI summary (Dashboard)
//!
//! Reminders for tasks due today are sent when the TUI starts.
//!
//! ### Command Line Interface (CLI)
//!
//! ```bash
//! taskflow project add "Launch" "Write copy" --due 2025-12-01 --priority High
//! taskflow project list --status Pending --sort priority
//! taskflow move <ID>
//! taskflow daily add "Review PRs" --duration "1h 30m"
//! taskflow daily done <ID>
//! taskflow export excel
//! ```
//!
//! IDs may be shortened to any unique prefix.
//!
//! ## Data Storage
//!
//! Collections are saved in your local data directory under `taskflow/`.
//! Override it with `TASKFLOW_DATA_DIR` or `data_dir` in `config.yaml`.

use std::io;
use std::path::PathBuf;

use anyhow::Context;
use chrono::Local;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};

use taskflow::commands::*;
use taskflow::config::Settings;
use taskflow::linking::AutoAnswer;
use taskflow::logging::{self, LogTarget};
use taskflow::models::{DailyStatus, Priority, ProjectStatus};
use taskflow::storage::PersistenceGateway;
use taskflow::store::TaskStore;
use taskflow::tui::run_tui;
use taskflow::views::{ProjectFilter, SortBy};

#[derive(Parser)]
#[command(name = "taskflow")]
#[command(about = "Project and daily task manager", long_about = None)]
struct Cli {
    /// Log destination: off, stdout, stderr or a file path
    #[arg(long, global = true)]
    log: Option<String>,
    /// Debug-level logging
    #[arg(short, long, global = true)]
    verbose: bool,
    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage project tasks
    Project {
        #[command(subcommand)]
        command: ProjectCommands,
    },
    /// Manage the daily planner
    Daily {
        #[command(subcommand)]
        command: DailyCommands,
    },
    /// Copy a project task to the daily planner
    Move {
        id: String,
    },
    /// Show progress statistics
    Dashboard,
    /// Write tasks to a spreadsheet or CSV file
    Export {
        #[arg(value_enum)]
        kind: ExportArg,
        /// Output directory
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Desktop reminders
    Notify {
        #[command(subcommand)]
        command: NotifyCommands,
    },
    /// AI productivity summary
    Summary,
    /// Delete all data and restore the sample tasks
    Reset {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for (bash, zsh, fish, powershell, elvish)
        shell: String,
    },
    /// Open interactive TUI
    Ui,
}

#[derive(Subcommand)]
enum ProjectCommands {
    /// Add a project task
    Add {
        /// Project name
        project: String,
        /// Task name (quoted if it has spaces)
        name: String,
        /// Delivery date in YYYY-MM-DD
        #[arg(short, long)]
        due: Option<String>,
        #[arg(short, long)]
        status: Option<ProjectStatus>,
        #[arg(short, long)]
        priority: Option<Priority>,
        #[arg(short, long)]
        notes: Option<String>,
    },
    /// List tasks grouped by project
    List {
        #[arg(short, long)]
        status: Option<ProjectStatus>,
        /// Only this project
        #[arg(short = 'P', long)]
        project: Option<String>,
        #[arg(short, long)]
        priority: Option<Priority>,
        #[arg(long, value_enum, default_value_t = SortArg::Date)]
        sort: SortArg,
    },
    /// Show open tasks per project with due-date badges
    Board,
    /// Edit a project task
    Edit {
        id: String,
        #[arg(short = 'P', long)]
        project: Option<String>,
        #[arg(short, long)]
        name: Option<String>,
        /// New delivery date; an empty string clears it
        #[arg(short, long)]
        due: Option<String>,
        #[arg(short, long)]
        status: Option<ProjectStatus>,
        #[arg(short, long)]
        priority: Option<Priority>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Mark a project task as completed
    Done {
        id: String,
    },
    /// Remove a project task
    Remove {
        id: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Subcommand)]
enum DailyCommands {
    /// Add a daily task
    Add {
        name: String,
        /// Duration such as 30m, 1h 30m or >4h
        #[arg(short, long)]
        duration: Option<String>,
        #[arg(short, long)]
        notes: Option<String>,
        #[arg(short, long)]
        status: Option<DailyStatus>,
    },
    /// Show the planner
    List,
    /// Show done tasks grouped by day
    Archive,
    /// Edit a daily task
    Edit {
        id: String,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        duration: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        /// Ongoing or Remaining; use `done` to complete
        #[arg(short, long)]
        status: Option<DailyStatus>,
    },
    /// Complete a daily task
    Done {
        id: String,
        /// Remove the linked project task without asking
        #[arg(short, long, conflicts_with = "keep")]
        yes: bool,
        /// Keep the linked project task without asking
        #[arg(short, long)]
        keep: bool,
    },
    /// Move a done task back to the planner
    Restore {
        id: String,
    },
    /// Remove a daily task
    Remove {
        id: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Subcommand)]
enum NotifyCommands {
    /// Remind about project tasks due today
    Check,
    /// Send a test notification
    Test,
}

#[derive(Clone, Copy, ValueEnum)]
enum SortArg {
    Date,
    Priority,
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportArg {
    Excel,
    CsvProjects,
    CsvDaily,
    History,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Some(Commands::Completions { shell }) = &cli.command {
        let shell_enum = match shell.as_str() {
            "bash" => Shell::Bash,
            "zsh" => Shell::Zsh,
            "fish" => Shell::Fish,
            "powershell" => Shell::PowerShell,
            "elvish" => Shell::Elvish,
            _ => anyhow::bail!("Unsupported shell: {}", shell),
        };
        let mut cmd = Cli::command();
        generate(shell_enum, &mut cmd, "taskflow", &mut io::stdout());
        return Ok(());
    }

    let mut settings = match &cli.config {
        Some(path) => Settings::from_file(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => Settings::load().context("loading config")?,
    };
    if cli.config.is_some() {
        settings.apply_env(|k| std::env::var(k).ok());
    }

    let interactive = matches!(cli.command, None | Some(Commands::Ui));
    let target = match &cli.log {
        Some(raw) => LogTarget::parse(raw),
        // Keep the terminal clean while the TUI owns it.
        None if interactive => LogTarget::File(logging::session_log_path(&settings.data_dir)),
        None => LogTarget::Stderr,
    };
    logging::init(&target, cli.verbose)?;

    let today = Local::now().date_naive();
    let gateway = PersistenceGateway::open_dir(&settings.data_dir);
    let mut store = TaskStore::open(gateway, today);

    match cli.command {
        Some(Commands::Project { command }) => match command {
            ProjectCommands::Add { project, name, due, status, priority, notes } => {
                cmd_project_add(&mut store, project, name, due, status, priority, notes, false)?;
            }
            ProjectCommands::List { status, project, priority, sort } => {
                let filter = ProjectFilter { status, project, priority };
                let sort = match sort {
                    SortArg::Date => SortBy::Date,
                    SortArg::Priority => SortBy::Priority,
                };
                cmd_project_list(&store, &filter, sort);
            }
            ProjectCommands::Board => cmd_project_board(&store, today),
            ProjectCommands::Edit { id, project, name, due, status, priority, notes } => {
                cmd_project_edit(
                    &mut store, &id, project, name, due, status, priority, notes, false,
                )?;
            }
            ProjectCommands::Done { id } => cmd_project_done(&mut store, &id, false)?,
            ProjectCommands::Remove { id, force } => {
                cmd_project_remove(&mut store, &id, force, false)?
            }
        },
        Some(Commands::Daily { command }) => match command {
            DailyCommands::Add { name, duration, notes, status } => {
                cmd_daily_add(&mut store, name, duration, notes, status, today, false)?;
            }
            DailyCommands::List => cmd_daily_list(&store, today),
            DailyCommands::Archive => cmd_daily_archive(&store),
            DailyCommands::Edit { id, name, duration, notes, status } => {
                cmd_daily_edit(&mut store, &id, name, duration, notes, status, false)?;
            }
            DailyCommands::Done { id, yes, keep } => {
                if yes || keep {
                    cmd_daily_done(&mut store, &id, today, &mut AutoAnswer(yes), false)?;
                } else {
                    cmd_daily_done(&mut store, &id, today, &mut StdinConfirm, false)?;
                }
            }
            DailyCommands::Restore { id } => cmd_daily_restore(&mut store, &id, false)?,
            DailyCommands::Remove { id, force } => cmd_daily_remove(&mut store, &id, force, false)?,
        },
        Some(Commands::Move { id }) => {
            cmd_move(&mut store, &id, false)?;
        }
        Some(Commands::Dashboard) => cmd_dashboard(&store, today),
        Some(Commands::Export { kind, out }) => {
            let kind = match kind {
                ExportArg::Excel => ExportKind::Excel,
                ExportArg::CsvProjects => ExportKind::CsvProjects,
                ExportArg::CsvDaily => ExportKind::CsvDaily,
                ExportArg::History => ExportKind::History,
            };
            let dir = out.unwrap_or_else(|| settings.export_dir.clone());
            cmd_export(&store, kind, &dir, today, false)?;
        }
        Some(Commands::Notify { command }) => match command {
            NotifyCommands::Check => cmd_notify_check(&store, &settings, today),
            NotifyCommands::Test => cmd_notify_test(&settings),
        },
        Some(Commands::Summary) => cmd_summary(&store, &settings),
        Some(Commands::Reset { force }) => cmd_reset(&mut store, force, today)?,
        Some(Commands::Completions { .. }) => {}
        Some(Commands::Ui) | None => run_tui(store, settings)?,
    }
    Ok(())
}

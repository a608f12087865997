//! Spreadsheet and CSV export of task snapshots.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use rust_xlsxwriter::{Format, Workbook};
use tracing::info;

use crate::error::Result;
use crate::models::{DailyTask, ProjectTask, DATE_FORMAT};

/// Byte-order mark so spreadsheet tools read the CSV as UTF-8.
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

pub const REPORT_LABEL: &str = "TaskFlow_Report";
pub const HISTORY_LABEL: &str = "Daily_History";
pub const PROJECT_CSV_LABEL: &str = "Project_Tasks";
pub const DAILY_CSV_LABEL: &str = "Daily_Tasks";

/// A record that can be written as one spreadsheet row.
pub trait ExportRow {
    /// Column headers, matching the stored field names.
    const HEADERS: &'static [&'static str];

    fn cells(&self) -> Vec<String>;
}

fn date_cell(d: Option<NaiveDate>) -> String {
    d.map(|d| d.format(DATE_FORMAT).to_string())
        .unwrap_or_default()
}

impl ExportRow for ProjectTask {
    const HEADERS: &'static [&'static str] = &[
        "id",
        "projectName",
        "taskName",
        "deliveryDate",
        "status",
        "priority",
        "notes",
    ];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.project_name.clone(),
            self.task_name.clone(),
            date_cell(self.delivery_date),
            self.status.to_string(),
            self.priority.map(|p| p.to_string()).unwrap_or_default(),
            self.notes.clone().unwrap_or_default(),
        ]
    }
}

impl ExportRow for DailyTask {
    const HEADERS: &'static [&'static str] = &[
        "id",
        "taskName",
        "duration",
        "linkNotes",
        "status",
        "completedDate",
        "originalTaskId",
    ];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.task_name.clone(),
            self.duration.clone(),
            self.link_notes.clone(),
            self.status.to_string(),
            date_cell(self.completed_date),
            self.original_task_id.clone().unwrap_or_default(),
        ]
    }
}

/// `<label>_<YYYY-MM-DD>.<ext>`
pub fn export_file_name(label: &str, today: NaiveDate, ext: &str) -> String {
    format!("{}_{}.{}", label, today.format(DATE_FORMAT), ext)
}

fn prepare_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

/// Renders rows as BOM-prefixed CSV with a header line.
pub fn csv_bytes<'a, T, I>(rows: I) -> Result<Vec<u8>>
where
    T: ExportRow + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let mut out = UTF8_BOM.to_vec();
    {
        let mut writer = csv::Writer::from_writer(&mut out);
        writer.write_record(T::HEADERS)?;
        for row in rows {
            writer.write_record(row.cells())?;
        }
        writer.flush()?;
    }
    Ok(out)
}

/// Writes one collection as `<label>_<date>.csv` into `dir`.
pub fn export_csv<'a, T, I>(dir: &Path, label: &str, rows: I, today: NaiveDate) -> Result<PathBuf>
where
    T: ExportRow + 'a,
    I: IntoIterator<Item = &'a T>,
{
    prepare_dir(dir)?;
    let path = dir.join(export_file_name(label, today, "csv"));
    let bytes = csv_bytes(rows)?;
    let mut f = fs::File::create(&path)?;
    f.write_all(&bytes)?;
    info!(path = %path.display(), "exported CSV");
    Ok(path)
}

fn write_sheet<'a, T, I>(workbook: &mut Workbook, name: &str, rows: I) -> Result<()>
where
    T: ExportRow + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let header = Format::new().set_bold();
    let sheet = workbook.add_worksheet();
    sheet.set_name(name)?;
    for (col, title) in T::HEADERS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *title, &header)?;
    }
    for (i, row) in rows.into_iter().enumerate() {
        for (col, cell) in row.cells().into_iter().enumerate() {
            if !cell.is_empty() {
                sheet.write_string(i as u32 + 1, col as u16, cell)?;
            }
        }
    }
    Ok(())
}

/// Writes both collections to a two-sheet workbook.
pub fn export_workbook(
    dir: &Path,
    project_tasks: &[ProjectTask],
    daily_tasks: &[DailyTask],
    today: NaiveDate,
) -> Result<PathBuf> {
    prepare_dir(dir)?;
    let mut workbook = Workbook::new();
    write_sheet(&mut workbook, "Project Tasks", project_tasks)?;
    write_sheet(&mut workbook, "Daily Tasks", daily_tasks)?;
    let path = dir.join(export_file_name(REPORT_LABEL, today, "xlsx"));
    workbook.save(&path)?;
    info!(path = %path.display(), "exported workbook");
    Ok(path)
}

/// Writes the done daily tasks to a single-sheet workbook.
pub fn export_daily_history<'a, I>(dir: &Path, archive: I, today: NaiveDate) -> Result<PathBuf>
where
    I: IntoIterator<Item = &'a DailyTask>,
{
    prepare_dir(dir)?;
    let mut workbook = Workbook::new();
    write_sheet(&mut workbook, "Daily History", archive)?;
    let path = dir.join(export_file_name(HISTORY_LABEL, today, "xlsx"));
    workbook.save(&path)?;
    info!(path = %path.display(), "exported daily history");
    Ok(path)
}

//! Moves work between the project list and the daily planner.
//!
//! Completing a linked daily task is a two-phase operation. Phase one commits
//! the completion and hands back a [`CascadeCandidate`] when the source project
//! task still exists. Phase two, [`resolve_cascade`], asks a
//! [`ConfirmCascade`] whether to delete that project task.

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::models::{new_id, DailyStatus, DailyTask, ProjectTask};
use crate::store::TaskStore;

/// A project task that may be removed now that its daily copy is done.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CascadeCandidate {
    pub daily_task_id: String,
    pub project_task_id: String,
    pub task_name: String,
    pub project_name: String,
}

/// What phase two did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CascadeOutcome {
    /// The project task was deleted.
    Removed,
    /// The user chose to keep the project task.
    Kept,
    /// The project task disappeared before the decision; nothing to do.
    Gone,
}

/// Decides whether a linked project task is removed.
pub trait ConfirmCascade {
    fn confirm(&mut self, candidate: &CascadeCandidate) -> bool;
}

impl<F> ConfirmCascade for F
where
    F: FnMut(&CascadeCandidate) -> bool,
{
    fn confirm(&mut self, candidate: &CascadeCandidate) -> bool {
        self(candidate)
    }
}

/// Fixed answer, for non-interactive callers.
#[derive(Debug, Clone, Copy)]
pub struct AutoAnswer(pub bool);

impl ConfirmCascade for AutoAnswer {
    fn confirm(&mut self, _: &CascadeCandidate) -> bool {
        self.0
    }
}

/// Link notes for a copied task: `[Project] notes`, or just `[Project]`.
/// Notes are carried over exactly as stored.
pub fn link_notes_for(task: &ProjectTask) -> String {
    match task.notes.as_deref() {
        Some(notes) if !notes.is_empty() => format!("[{}] {}", task.project_name, notes),
        _ => format!("[{}]", task.project_name),
    }
}

/// Builds the daily copy of a project task. The source is not touched.
pub fn create_linked_daily_task(source: &ProjectTask) -> DailyTask {
    DailyTask {
        id: new_id(),
        task_name: source.task_name.clone(),
        duration: "0m".to_string(),
        link_notes: link_notes_for(source),
        status: DailyStatus::Ongoing,
        completed_date: None,
        original_task_id: Some(source.id.clone()),
    }
}

/// Copies a project task to the top of the daily planner.
///
/// Copying the same task again creates another linked entry.
pub fn move_to_daily(store: &mut TaskStore, project_task_id: &str) -> Result<DailyTask> {
    let source = store
        .project_task(project_task_id)
        .cloned()
        .ok_or_else(|| Error::project_not_found(project_task_id))?;
    let linked = create_linked_daily_task(&source);

    let mut tasks = Vec::with_capacity(store.daily_tasks().len() + 1);
    tasks.push(linked.clone());
    tasks.extend(store.daily_tasks().iter().cloned());
    store.replace_daily_tasks(tasks);

    info!(project_task = %source.id, daily_task = %linked.id, "copied task to daily planner");
    Ok(linked)
}

/// Phase one: marks a daily task done on `today`.
///
/// Returns a candidate when the task links to a project task that still
/// exists. A dangling link yields `None`.
pub fn complete_daily_task(
    store: &mut TaskStore,
    daily_task_id: &str,
    today: NaiveDate,
) -> Result<Option<CascadeCandidate>> {
    let mut tasks = store.daily_tasks().to_vec();
    let task = tasks
        .iter_mut()
        .find(|t| t.id == daily_task_id)
        .ok_or_else(|| Error::daily_not_found(daily_task_id))?;
    task.status = DailyStatus::Done;
    task.completed_date = Some(today);
    let original = task.original_task_id.clone();
    store.replace_daily_tasks(tasks);

    let candidate = original
        .as_deref()
        .and_then(|id| store.project_task(id))
        .map(|p| CascadeCandidate {
            daily_task_id: daily_task_id.to_string(),
            project_task_id: p.id.clone(),
            task_name: p.task_name.clone(),
            project_name: p.project_name.clone(),
        });
    if candidate.is_none() && original.is_some() {
        debug!(daily_task = daily_task_id, "linked project task no longer exists");
    }
    Ok(candidate)
}

/// Phase two: asks `confirm` and removes the project task on a yes.
///
/// The project task is looked up again first, so a deletion that happened in
/// between is not an error.
pub fn resolve_cascade(
    store: &mut TaskStore,
    candidate: &CascadeCandidate,
    confirm: &mut dyn ConfirmCascade,
) -> CascadeOutcome {
    if store.project_task(&candidate.project_task_id).is_none() {
        return CascadeOutcome::Gone;
    }
    if !confirm.confirm(candidate) {
        return CascadeOutcome::Kept;
    }
    let tasks = store
        .project_tasks()
        .iter()
        .filter(|t| t.id != candidate.project_task_id)
        .cloned()
        .collect();
    store.replace_project_tasks(tasks);
    info!(project_task = %candidate.project_task_id, "removed linked project task");
    CascadeOutcome::Removed
}

/// Both phases in sequence.
pub fn complete_with_cascade(
    store: &mut TaskStore,
    daily_task_id: &str,
    today: NaiveDate,
    confirm: &mut dyn ConfirmCascade,
) -> Result<Option<CascadeOutcome>> {
    let candidate = complete_daily_task(store, daily_task_id, today)?;
    Ok(candidate.map(|c| resolve_cascade(store, &c, confirm)))
}

/// Moves a done task back to the planner as ongoing and clears its date.
///
/// A project task removed by an earlier cascade is not brought back.
pub fn restore_daily_task(store: &mut TaskStore, daily_task_id: &str) -> Result<DailyTask> {
    let mut tasks = store.daily_tasks().to_vec();
    let task = tasks
        .iter_mut()
        .find(|t| t.id == daily_task_id)
        .ok_or_else(|| Error::daily_not_found(daily_task_id))?;
    task.status = DailyStatus::Ongoing;
    task.completed_date = None;
    let restored = task.clone();
    store.replace_daily_tasks(tasks);
    Ok(restored)
}

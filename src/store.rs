//! Authoritative in-memory task collections.
//!
//! Every mutation replaces a whole collection and immediately persists it.
//! Persistence failures are logged and swallowed: memory stays the source of
//! truth for the session.

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::{
    new_id, DailyStatus, DailyTask, DailyTaskPatch, ProjectStatus, ProjectTask, ProjectTaskPatch,
};
use crate::storage::{Collection, PersistenceGateway};

pub struct TaskStore {
    gateway: PersistenceGateway,
    project_tasks: Vec<ProjectTask>,
    daily_tasks: Vec<DailyTask>,
}

fn resolve_id<'a, I>(kind: &'static str, prefix: &str, ids: I) -> Result<String>
where
    I: Iterator<Item = &'a str> + Clone,
{
    let prefix = prefix.trim();
    if prefix.is_empty() {
        return Err(Error::invalid("id", "must not be empty"));
    }
    if let Some(exact) = ids.clone().find(|id| *id == prefix) {
        return Ok(exact.to_string());
    }
    let matches: Vec<&str> = ids.filter(|id| id.starts_with(prefix)).collect();
    match matches.as_slice() {
        [] => Err(Error::TaskNotFound {
            kind,
            id: prefix.to_string(),
        }),
        [one] => Ok(one.to_string()),
        many => Err(Error::AmbiguousId {
            kind,
            prefix: prefix.to_string(),
            count: many.len(),
        }),
    }
}

fn require_text(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::invalid(field, "must not be empty"));
    }
    Ok(())
}

impl TaskStore {
    /// Loads both collections, seeding any that are absent.
    pub fn open(gateway: PersistenceGateway, today: NaiveDate) -> Self {
        let project_tasks = gateway.load_project_tasks();
        let daily_tasks = gateway.load_daily_tasks(today);
        Self {
            gateway,
            project_tasks,
            daily_tasks,
        }
    }

    pub fn project_tasks(&self) -> &[ProjectTask] {
        &self.project_tasks
    }

    pub fn daily_tasks(&self) -> &[DailyTask] {
        &self.daily_tasks
    }

    /// Replaces the project collection and persists it.
    pub fn replace_project_tasks(&mut self, tasks: Vec<ProjectTask>) {
        self.project_tasks = tasks;
        self.persist(Collection::ProjectTasks);
    }

    /// Replaces the daily collection and persists it.
    pub fn replace_daily_tasks(&mut self, tasks: Vec<DailyTask>) {
        self.daily_tasks = tasks;
        self.persist(Collection::DailyTasks);
    }

    fn persist(&self, collection: Collection) {
        let res = match collection {
            Collection::ProjectTasks => self.gateway.save(collection, &self.project_tasks),
            Collection::DailyTasks => self.gateway.save(collection, &self.daily_tasks),
        };
        match res {
            Ok(()) => debug!(collection = collection.key(), "saved collection"),
            Err(e) => warn!(collection = collection.key(), error = %e, "failed to save collection"),
        }
    }

    pub fn project_task(&self, id: &str) -> Option<&ProjectTask> {
        self.project_tasks.iter().find(|t| t.id == id)
    }

    pub fn daily_task(&self, id: &str) -> Option<&DailyTask> {
        self.daily_tasks.iter().find(|t| t.id == id)
    }

    /// Resolves a full id or a unique id prefix to a project task id.
    pub fn resolve_project_id(&self, prefix: &str) -> Result<String> {
        resolve_id(
            "project",
            prefix,
            self.project_tasks.iter().map(|t| t.id.as_str()),
        )
    }

    /// Resolves a full id or a unique id prefix to a daily task id.
    pub fn resolve_daily_id(&self, prefix: &str) -> Result<String> {
        resolve_id("daily", prefix, self.daily_tasks.iter().map(|t| t.id.as_str()))
    }

    fn unique_project_id(&self, candidate: String) -> String {
        let mut id = candidate;
        while self.project_task(&id).is_some() {
            id = new_id();
        }
        id
    }

    fn unique_daily_id(&self, candidate: String) -> String {
        let mut id = candidate;
        while self.daily_task(&id).is_some() {
            id = new_id();
        }
        id
    }

    /// Adds a project task at the top of the list.
    pub fn add_project_task(&mut self, mut task: ProjectTask) -> Result<ProjectTask> {
        task.project_name = task.project_name.trim().to_string();
        require_text("project name", &task.project_name)?;
        require_text("task name", &task.task_name)?;
        task.id = self.unique_project_id(task.id);

        let mut tasks = Vec::with_capacity(self.project_tasks.len() + 1);
        tasks.push(task.clone());
        tasks.extend(self.project_tasks.iter().cloned());
        self.replace_project_tasks(tasks);
        Ok(task)
    }

    /// Appends a pending, medium priority task to `project`.
    pub fn quick_add_project_task(
        &mut self,
        project: &str,
        task_name: &str,
        delivery_date: Option<NaiveDate>,
    ) -> Result<ProjectTask> {
        let mut task = ProjectTask::new(project.trim(), task_name);
        require_text("project name", &task.project_name)?;
        require_text("task name", &task.task_name)?;
        task.id = self.unique_project_id(task.id);
        task.delivery_date = delivery_date;

        let mut tasks = self.project_tasks.clone();
        tasks.push(task.clone());
        self.replace_project_tasks(tasks);
        Ok(task)
    }

    pub fn update_project_task(
        &mut self,
        id: &str,
        patch: &ProjectTaskPatch,
    ) -> Result<ProjectTask> {
        if let Some(p) = &patch.project_name {
            require_text("project name", p)?;
        }
        if let Some(n) = &patch.task_name {
            require_text("task name", n)?;
        }
        let mut tasks = self.project_tasks.clone();
        let task = tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| Error::project_not_found(id))?;
        patch.apply(task);
        let updated = task.clone();
        self.replace_project_tasks(tasks);
        Ok(updated)
    }

    /// Marks a project task as completed.
    pub fn complete_project_task(&mut self, id: &str) -> Result<ProjectTask> {
        self.update_project_task(
            id,
            &ProjectTaskPatch {
                status: Some(ProjectStatus::Completed),
                ..Default::default()
            },
        )
    }

    /// Removes a project task. Removing the last task of a project removes
    /// the project.
    pub fn delete_project_task(&mut self, id: &str) -> Result<ProjectTask> {
        let removed = self
            .project_task(id)
            .cloned()
            .ok_or_else(|| Error::project_not_found(id))?;
        let tasks = self
            .project_tasks
            .iter()
            .filter(|t| t.id != id)
            .cloned()
            .collect();
        self.replace_project_tasks(tasks);
        Ok(removed)
    }

    /// Adds a daily task at the top of the planner. A task added as done is
    /// stamped with `today`.
    pub fn add_daily_task(&mut self, mut task: DailyTask, today: NaiveDate) -> Result<DailyTask> {
        require_text("task name", &task.task_name)?;
        task.id = self.unique_daily_id(task.id);
        if task.duration.trim().is_empty() {
            task.duration = "0m".to_string();
        }
        task.completed_date = if task.is_done() { Some(today) } else { None };

        let mut tasks = Vec::with_capacity(self.daily_tasks.len() + 1);
        tasks.push(task.clone());
        tasks.extend(self.daily_tasks.iter().cloned());
        self.replace_daily_tasks(tasks);
        Ok(task)
    }

    /// Edits a daily task. Completion is not a field edit and is rejected
    /// here; moving a done task back to another status clears its date.
    pub fn update_daily_task(&mut self, id: &str, patch: &DailyTaskPatch) -> Result<DailyTask> {
        if patch.status == Some(DailyStatus::Done) {
            return Err(Error::invalid(
                "status",
                "use completion to mark a daily task as done",
            ));
        }
        if let Some(n) = &patch.task_name {
            require_text("task name", n)?;
        }
        let mut tasks = self.daily_tasks.clone();
        let task = tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| Error::daily_not_found(id))?;
        patch.apply(task);
        let updated = task.clone();
        self.replace_daily_tasks(tasks);
        Ok(updated)
    }

    pub fn delete_daily_task(&mut self, id: &str) -> Result<DailyTask> {
        let removed = self
            .daily_task(id)
            .cloned()
            .ok_or_else(|| Error::daily_not_found(id))?;
        let tasks = self
            .daily_tasks
            .iter()
            .filter(|t| t.id != id)
            .cloned()
            .collect();
        self.replace_daily_tasks(tasks);
        Ok(removed)
    }

    /// Wipes persisted data and reloads the seed collections.
    pub fn reset(&mut self, today: NaiveDate) -> Result<()> {
        self.gateway.reset()?;
        self.project_tasks = self.gateway.load_project_tasks();
        self.daily_tasks = self.gateway.load_daily_tasks(today);
        Ok(())
    }
}

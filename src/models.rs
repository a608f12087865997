use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::warn;
use uuid::Uuid;

/// Storage and display format for every date in the app.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

const ID_LEN: usize = 9;

/// Generates a short opaque identifier.
pub fn new_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(ID_LEN);
    id
}

/// Parses a `YYYY-MM-DD` string, tolerating blanks and full ISO timestamps.
///
/// Returns `None` for empty input. Unparseable input is logged and treated as
/// "no date".
pub fn parse_date_lenient(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(d) = NaiveDate::parse_from_str(raw, DATE_FORMAT) {
        return Some(d);
    }
    if let Some(prefix) = raw.get(..10) {
        if let Ok(d) = NaiveDate::parse_from_str(prefix, DATE_FORMAT) {
            return Some(d);
        }
    }
    warn!(value = raw, "ignoring unparseable date");
    None
}

/// Strict date parsing for user input.
pub fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|e| format!("invalid date '{}': {}. Use YYYY-MM-DD.", raw, e))
}

/// Delivery dates are stored as `""` when unset.
mod blank_date {
    use super::*;

    pub fn serialize<S: Serializer>(date: &Option<NaiveDate>, s: S) -> Result<S::Ok, S::Error> {
        match date {
            Some(d) => s.serialize_str(&d.format(DATE_FORMAT).to_string()),
            None => s.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        Ok(raw.as_deref().and_then(parse_date_lenient))
    }
}

fn lenient_date<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
    let raw: Option<String> = Option::deserialize(d)?;
    Ok(raw.as_deref().and_then(parse_date_lenient))
}

fn blank_to_none<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let raw: Option<String> = Option::deserialize(d)?;
    Ok(raw.filter(|s| !s.trim().is_empty()))
}

fn normalize_key(s: &str) -> String {
    s.trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Lifecycle state of a project task.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProjectStatus {
    Pending,
    #[serde(rename = "In Progress")]
    InProgress,
    Completed,
}

impl ProjectStatus {
    pub const ALL: [ProjectStatus; 3] = [
        ProjectStatus::Pending,
        ProjectStatus::InProgress,
        ProjectStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Pending => "Pending",
            ProjectStatus::InProgress => "In Progress",
            ProjectStatus::Completed => "Completed",
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_key(s).as_str() {
            "pending" => Ok(ProjectStatus::Pending),
            "inprogress" | "progress" => Ok(ProjectStatus::InProgress),
            "completed" | "complete" | "done" => Ok(ProjectStatus::Completed),
            _ => Err(format!(
                "unknown project status '{}'. Use pending, in-progress or completed.",
                s
            )),
        }
    }
}

/// Relative importance of a project task.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

    /// Sort weight; higher sorts first.
    pub fn weight(&self) -> u8 {
        match self {
            Priority::High => 3,
            Priority::Medium => 2,
            Priority::Low => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_key(s).as_str() {
            "high" | "h" => Ok(Priority::High),
            "medium" | "med" | "m" => Ok(Priority::Medium),
            "low" | "l" => Ok(Priority::Low),
            _ => Err(format!("unknown priority '{}'. Use high, medium or low.", s)),
        }
    }
}

/// Lifecycle state of a daily planner entry.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DailyStatus {
    Ongoing,
    Remaining,
    Done,
}

impl DailyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DailyStatus::Ongoing => "Ongoing",
            DailyStatus::Remaining => "Remaining",
            DailyStatus::Done => "Done",
        }
    }
}

impl fmt::Display for DailyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DailyStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_key(s).as_str() {
            "ongoing" => Ok(DailyStatus::Ongoing),
            "remaining" => Ok(DailyStatus::Remaining),
            "done" => Ok(DailyStatus::Done),
            _ => Err(format!(
                "unknown daily status '{}'. Use ongoing, remaining or done.",
                s
            )),
        }
    }
}

/// A unit of work belonging to a named project.
///
/// Projects have no entity of their own: a project exists while at least one
/// task carries its name.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectTask {
    /// Opaque identifier, immutable once assigned.
    pub id: String,
    /// Name of the project this task is grouped under.
    pub project_name: String,
    /// Free text description.
    pub task_name: String,
    /// Planned delivery date, serialized as `""` when unset.
    #[serde(default, with = "blank_date")]
    pub delivery_date: Option<NaiveDate>,
    pub status: ProjectStatus,
    /// `None` behaves as [`Priority::Medium`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    /// Free text, may contain a URL.
    #[serde(
        default,
        deserialize_with = "blank_to_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub notes: Option<String>,
}

impl ProjectTask {
    /// Creates a pending, medium priority task with a fresh id.
    pub fn new(project_name: impl Into<String>, task_name: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            project_name: project_name.into(),
            task_name: task_name.into(),
            delivery_date: None,
            status: ProjectStatus::Pending,
            priority: Some(Priority::Medium),
            notes: None,
        }
    }

    pub fn effective_priority(&self) -> Priority {
        self.priority.unwrap_or(Priority::Medium)
    }

    pub fn is_completed(&self) -> bool {
        self.status == ProjectStatus::Completed
    }
}

/// A unit of work on the daily planner or, once done, in the archive.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailyTask {
    pub id: String,
    pub task_name: String,
    /// Free-form duration token such as `1h 30m`, see [`crate::duration`].
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub link_notes: String,
    pub status: DailyStatus,
    /// Set exactly while `status` is [`DailyStatus::Done`].
    #[serde(
        default,
        deserialize_with = "lenient_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub completed_date: Option<NaiveDate>,
    /// Weak reference to the project task this entry was copied from.
    /// May dangle once that task is deleted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_task_id: Option<String>,
}

impl DailyTask {
    /// Creates an ongoing entry with a zero duration and a fresh id.
    pub fn new(task_name: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            task_name: task_name.into(),
            duration: "0m".to_string(),
            link_notes: String::new(),
            status: DailyStatus::Ongoing,
            completed_date: None,
            original_task_id: None,
        }
    }

    pub fn is_done(&self) -> bool {
        self.status == DailyStatus::Done
    }

    /// Duration of this entry in minutes.
    pub fn minutes(&self) -> u32 {
        crate::duration::parse_duration(&self.duration)
    }
}

/// Field-level edit of a project task. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct ProjectTaskPatch {
    pub project_name: Option<String>,
    pub task_name: Option<String>,
    /// `Some(None)` clears the date.
    pub delivery_date: Option<Option<NaiveDate>>,
    pub status: Option<ProjectStatus>,
    pub priority: Option<Priority>,
    /// `Some(None)` clears the notes.
    pub notes: Option<Option<String>>,
}

impl ProjectTaskPatch {
    pub fn is_empty(&self) -> bool {
        self.project_name.is_none()
            && self.task_name.is_none()
            && self.delivery_date.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.notes.is_none()
    }

    pub fn apply(&self, task: &mut ProjectTask) {
        if let Some(p) = &self.project_name {
            task.project_name = p.trim().to_string();
        }
        if let Some(n) = &self.task_name {
            task.task_name = n.clone();
        }
        if let Some(d) = self.delivery_date {
            task.delivery_date = d;
        }
        if let Some(s) = self.status {
            task.status = s;
        }
        if let Some(p) = self.priority {
            task.priority = Some(p);
        }
        if let Some(n) = &self.notes {
            task.notes = n.clone().filter(|s| !s.trim().is_empty());
        }
    }
}

/// Field-level edit of a daily task. Transitions into `Done` go through
/// [`crate::linking::complete_daily_task`] instead.
#[derive(Debug, Clone, Default)]
pub struct DailyTaskPatch {
    pub task_name: Option<String>,
    pub duration: Option<String>,
    pub link_notes: Option<String>,
    pub status: Option<DailyStatus>,
}

impl DailyTaskPatch {
    pub fn is_empty(&self) -> bool {
        self.task_name.is_none()
            && self.duration.is_none()
            && self.link_notes.is_none()
            && self.status.is_none()
    }

    pub fn apply(&self, task: &mut DailyTask) {
        if let Some(n) = &self.task_name {
            task.task_name = n.clone();
        }
        if let Some(d) = &self.duration {
            task.duration = d.trim().to_string();
        }
        if let Some(l) = &self.link_notes {
            task.link_notes = l.clone();
        }
        if let Some(s) = self.status {
            task.status = s;
            if s != DailyStatus::Done {
                task.completed_date = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_task_uses_original_field_names() {
        let json = r#"{
            "id": "abc123xyz",
            "projectName": "Launch",
            "taskName": "Write copy",
            "deliveryDate": "",
            "status": "In Progress"
        }"#;
        let task: ProjectTask = serde_json::from_str(json).unwrap();
        assert_eq!(task.delivery_date, None);
        assert_eq!(task.status, ProjectStatus::InProgress);
        assert_eq!(task.effective_priority(), Priority::Medium);
        assert_eq!(task.notes, None);

        let back = serde_json::to_value(&task).unwrap();
        assert_eq!(back["deliveryDate"], "");
        assert_eq!(back["projectName"], "Launch");
        assert!(back.get("priority").is_none());
    }

    #[test]
    fn daily_task_tolerates_bad_completed_date() {
        let json = r#"{"id":"d1","taskName":"Review","duration":"1h","linkNotes":"",
            "status":"Done","completedDate":"yesterday"}"#;
        let task: DailyTask = serde_json::from_str(json).unwrap();
        assert!(task.is_done());
        assert_eq!(task.completed_date, None);
        assert_eq!(task.minutes(), 60);
    }

    #[test]
    fn status_parsing_is_forgiving() {
        assert_eq!("in-progress".parse::<ProjectStatus>(), Ok(ProjectStatus::InProgress));
        assert_eq!("In Progress".parse::<ProjectStatus>(), Ok(ProjectStatus::InProgress));
        assert_eq!("LOW".parse::<Priority>(), Ok(Priority::Low));
        assert!("later".parse::<DailyStatus>().is_err());
    }

    #[test]
    fn ids_are_short_and_distinct() {
        let a = new_id();
        let b = new_id();
        assert_eq!(a.len(), 9);
        assert_ne!(a, b);
    }

    #[test]
    fn patch_out_of_done_clears_completed_date() {
        let mut task = DailyTask::new("Call");
        task.status = DailyStatus::Done;
        task.completed_date = NaiveDate::from_ymd_opt(2024, 1, 2);
        DailyTaskPatch {
            status: Some(DailyStatus::Remaining),
            ..Default::default()
        }
        .apply(&mut task);
        assert_eq!(task.status, DailyStatus::Remaining);
        assert_eq!(task.completed_date, None);
    }
}

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::{empty_as_none, is_blank, merge_text};
use crate::error::CozyError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Backlog,
    Todo,
    #[serde(rename = "in progress")]
    InProgress,
    Done,
    Canceled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskLabel {
    Bug,
    Feature,
    Documentation,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 5] = [
        TaskStatus::Backlog,
        TaskStatus::Todo,
        TaskStatus::InProgress,
        TaskStatus::Done,
        TaskStatus::Canceled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Backlog => "backlog",
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in progress",
            TaskStatus::Done => "done",
            TaskStatus::Canceled => "canceled",
        }
    }
}

impl TaskPriority {
    pub const ALL: [TaskPriority; 3] = [TaskPriority::Low, TaskPriority::Medium, TaskPriority::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
        }
    }
}

impl TaskLabel {
    pub const ALL: [TaskLabel; 3] = [TaskLabel::Bug, TaskLabel::Feature, TaskLabel::Documentation];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskLabel::Bug => "bug",
            TaskLabel::Feature => "feature",
            TaskLabel::Documentation => "documentation",
        }
    }
}

/// Parse one of `options` by its wire name. `in-progress` and `in_progress`
/// are accepted for `in progress` since spaces are awkward on a command line.
fn parse_named<T: Copy>(
    field: &'static str,
    input: &str,
    options: &[T],
    name: impl Fn(&T) -> &'static str,
) -> Result<T, CozyError> {
    let normalized = input.trim().to_lowercase().replace(['-', '_'], " ");
    options
        .iter()
        .find(|&option| name(option) == normalized)
        .copied()
        .ok_or_else(|| {
            let valid: Vec<_> = options.iter().map(&name).collect();
            CozyError::validation(
                field,
                format!("unknown {field} '{input}'. Expected one of: {}", valid.join(", ")),
            )
        })
}

impl FromStr for TaskStatus {
    type Err = CozyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_named("status", s, &TaskStatus::ALL, TaskStatus::as_str)
    }
}

impl FromStr for TaskPriority {
    type Err = CozyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_named("priority", s, &TaskPriority::ALL, TaskPriority::as_str)
    }
}

impl FromStr for TaskLabel {
    type Err = CozyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_named("label", s, &TaskLabel::ALL, TaskLabel::as_str)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for TaskLabel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The task service sends `"label": ""` for unlabeled tasks.
fn optional_label<'de, D>(deserializer: D) -> Result<Option<TaskLabel>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(s) if s.is_empty() => Ok(None),
        Some(s) => s.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub project_id: i64,
    pub title: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    #[serde(default, deserialize_with = "optional_label")]
    pub label: Option<TaskLabel>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewTask {
    pub title: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<TaskLabel>,
    #[serde(skip_serializing_if = "is_blank")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        NewTask {
            title: title.into(),
            status: TaskStatus::Todo,
            priority: TaskPriority::Medium,
            label: None,
            description: None,
            due_date: None,
            start_time: None,
            end_time: None,
        }
    }
}

/// Fields the user changed. A blank description clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub label: Option<TaskLabel>,
    pub due_date: Option<DateTime<Utc>>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        *self == TaskPatch::default()
    }

    pub fn apply_to(&self, current: &Task) -> TaskUpdate {
        TaskUpdate {
            title: self.title.clone().unwrap_or_else(|| current.title.clone()),
            description: merge_text(&self.description, &current.description),
            status: self.status.unwrap_or(current.status),
            priority: self.priority.unwrap_or(current.priority),
            label: self.label.or(current.label),
            due_date: self.due_date.or(current.due_date),
            start_time: self.start_time.or(current.start_time),
            end_time: self.end_time.or(current.end_time),
        }
    }
}

/// Body of `PUT /projects/{project_id}/tasks/{task_id}`: every editable
/// column. Omitted optional fields are cleared by the service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskUpdate {
    pub title: String,
    #[serde(skip_serializing_if = "is_blank")]
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<TaskLabel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
}

/// Body of `PATCH /tasks/{id}/status`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct StatusUpdate {
    pub status: TaskStatus,
}

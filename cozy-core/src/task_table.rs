//! Filtering and sorting for the task table. Filter state lives in the URL
//! (`/tasks?projectId=1&status=todo,done&sort=-priority`).

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::CozyError;
use crate::filter::{decode_tokens, encode_tokens, write_param};
use crate::location::Location;
use crate::model::{Task, TaskLabel, TaskPriority, TaskStatus};

pub const SEARCH_PARAM: &str = "q";
pub const STATUS_PARAM: &str = "status";
pub const PRIORITY_PARAM: &str = "priority";
pub const LABEL_PARAM: &str = "label";
pub const SORT_PARAM: &str = "sort";

/// Empty sets mean "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub search: Option<String>,
    pub statuses: BTreeSet<TaskStatus>,
    pub priorities: BTreeSet<TaskPriority>,
    pub labels: BTreeSet<TaskLabel>,
}

impl TaskFilter {
    pub fn from_location(location: &Location) -> Self {
        TaskFilter {
            search: location
                .param(SEARCH_PARAM)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            statuses: location.param(STATUS_PARAM).map(decode_tokens).unwrap_or_default(),
            priorities: location.param(PRIORITY_PARAM).map(decode_tokens).unwrap_or_default(),
            labels: location.param(LABEL_PARAM).map(decode_tokens).unwrap_or_default(),
        }
    }

    pub fn write_to(&self, location: Location) -> Location {
        let location = write_param(location, SEARCH_PARAM, self.search.clone());
        let location = write_param(location, STATUS_PARAM, encode_tokens(&self.statuses));
        let location = write_param(location, PRIORITY_PARAM, encode_tokens(&self.priorities));
        write_param(location, LABEL_PARAM, encode_tokens(&self.labels))
    }

    pub fn is_empty(&self) -> bool {
        self.search.is_none()
            && self.statuses.is_empty()
            && self.priorities.is_empty()
            && self.labels.is_empty()
    }

    pub fn matches(&self, task: &Task) -> bool {
        if let Some(search) = &self.search {
            if !task.title.to_lowercase().contains(&search.to_lowercase()) {
                return false;
            }
        }
        if !self.statuses.is_empty() && !self.statuses.contains(&task.status) {
            return false;
        }
        if !self.priorities.is_empty() && !self.priorities.contains(&task.priority) {
            return false;
        }
        if !self.labels.is_empty() && !task.label.is_some_and(|l| self.labels.contains(&l)) {
            return false;
        }
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    Id,
    Title,
    Status,
    Priority,
    DueDate,
}

impl SortField {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::Id => "id",
            SortField::Title => "title",
            SortField::Status => "status",
            SortField::Priority => "priority",
            SortField::DueDate => "due",
        }
    }
}

/// Sort key for the table. Defaults to ascending id so rows keep a stable order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TaskSort {
    pub field: SortField,
    pub descending: bool,
}

impl TaskSort {
    pub fn from_location(location: &Location) -> Result<Self, CozyError> {
        location
            .param(SORT_PARAM)
            .map(str::parse)
            .transpose()
            .map(Option::unwrap_or_default)
    }

    pub fn write_to(&self, location: Location) -> Location {
        if *self == TaskSort::default() {
            location.without_param(SORT_PARAM)
        } else {
            location.with_param(SORT_PARAM, self.to_string())
        }
    }

    fn compare(&self, a: &Task, b: &Task) -> Ordering {
        // Tasks without a due date go last in either direction.
        if self.field == SortField::DueDate {
            match (a.due_date, b.due_date) {
                (Some(_), None) => return Ordering::Less,
                (None, Some(_)) => return Ordering::Greater,
                _ => {}
            }
        }

        let ordering = match self.field {
            SortField::Id => a.id.cmp(&b.id),
            SortField::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
            SortField::Status => a.status.cmp(&b.status),
            SortField::Priority => a.priority.cmp(&b.priority),
            SortField::DueDate => a.due_date.cmp(&b.due_date),
        };
        let ordering = if self.descending { ordering.reverse() } else { ordering };

        ordering.then(a.id.cmp(&b.id))
    }

    pub fn sort(&self, tasks: &mut [&Task]) {
        tasks.sort_by(|a, b| self.compare(a, b));
    }
}

impl fmt::Display for TaskSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.descending {
            f.write_str("-")?;
        }
        f.write_str(self.field.as_str())
    }
}

/// `priority` sorts ascending, `-priority` descending.
impl FromStr for TaskSort {
    type Err = CozyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (descending, name) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };

        let field = match name.to_lowercase().as_str() {
            "id" => SortField::Id,
            "title" => SortField::Title,
            "status" => SortField::Status,
            "priority" => SortField::Priority,
            "due" | "due_date" | "due-date" => SortField::DueDate,
            other => {
                return Err(CozyError::validation(
                    "sort",
                    format!("Unknown sort field '{other}'. Expected id, title, status, priority or due"),
                ))
            }
        };

        Ok(TaskSort { field, descending })
    }
}

/// Rows the table shows: filtered, then sorted.
pub fn visible_tasks<'a>(tasks: &'a [Task], filter: &TaskFilter, sort: &TaskSort) -> Vec<&'a Task> {
    let mut rows: Vec<&Task> = tasks.iter().filter(|t| filter.matches(t)).collect();
    sort.sort(&mut rows);
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn task(id: i64, title: &str, status: TaskStatus, priority: TaskPriority, due_day: Option<u32>) -> Task {
        Task {
            id,
            project_id: 1,
            title: title.into(),
            description: None,
            status,
            priority,
            label: None,
            due_date: due_day.map(|d| Utc.with_ymd_and_hms(2025, 3, d, 0, 0, 0).unwrap()),
            start_time: None,
            end_time: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn tasks() -> Vec<Task> {
        vec![
            task(1, "Write docs", TaskStatus::Todo, TaskPriority::Low, Some(20)),
            task(2, "Fix login bug", TaskStatus::InProgress, TaskPriority::High, None),
            task(3, "Release", TaskStatus::Done, TaskPriority::Medium, Some(10)),
            task(4, "Plan sprint", TaskStatus::Todo, TaskPriority::High, Some(15)),
        ]
    }

    fn ids(rows: &[&Task]) -> Vec<i64> {
        rows.iter().map(|t| t.id).collect()
    }

    #[test]
    fn filter_reads_url_params() {
        let location = Location::parse("/tasks?projectId=1&status=todo,in%20progress&priority=high&q=%20plan%20");
        let filter = TaskFilter::from_location(&location);

        assert_eq!(filter.search.as_deref(), Some("plan"));
        assert_eq!(filter.statuses, BTreeSet::from([TaskStatus::Todo, TaskStatus::InProgress]));
        assert_eq!(filter.priorities, BTreeSet::from([TaskPriority::High]));

        let tasks = tasks();
        assert_eq!(ids(&visible_tasks(&tasks, &filter, &TaskSort::default())), vec![4]);
    }

    #[test]
    fn filter_writes_back_and_clears() {
        let filter = TaskFilter {
            statuses: BTreeSet::from([TaskStatus::Done, TaskStatus::Todo]),
            ..Default::default()
        };
        let location = filter.write_to(Location::parse("/tasks?projectId=1&priority=low"));
        assert_eq!(location.param(STATUS_PARAM), Some("todo,done"));
        assert_eq!(location.param(PRIORITY_PARAM), None);
        assert_eq!(location.param("projectId"), Some("1"));
        assert_eq!(TaskFilter::from_location(&location), filter);
    }

    #[test]
    fn label_filter_excludes_unlabeled() {
        let mut tasks = tasks();
        tasks[1].label = Some(TaskLabel::Bug);
        let filter = TaskFilter {
            labels: BTreeSet::from([TaskLabel::Bug]),
            ..Default::default()
        };
        assert_eq!(ids(&visible_tasks(&tasks, &filter, &TaskSort::default())), vec![2]);
    }

    #[test]
    fn sort_by_priority_descending_breaks_ties_by_id() {
        let tasks = tasks();
        let sort: TaskSort = "-priority".parse().unwrap();
        assert_eq!(ids(&visible_tasks(&tasks, &TaskFilter::default(), &sort)), vec![2, 4, 3, 1]);
        assert_eq!(sort.to_string(), "-priority");
    }

    #[test]
    fn missing_due_dates_sort_last_both_ways() {
        let tasks = tasks();
        let asc: TaskSort = "due".parse().unwrap();
        let desc: TaskSort = "-due".parse().unwrap();
        assert_eq!(ids(&visible_tasks(&tasks, &TaskFilter::default(), &asc)), vec![3, 4, 1, 2]);
        assert_eq!(ids(&visible_tasks(&tasks, &TaskFilter::default(), &desc)), vec![1, 4, 3, 2]);
    }

    #[test]
    fn sort_param_round_trips_through_location() {
        let location = Location::parse("/tasks");
        let sort = TaskSort { field: SortField::Title, descending: false };
        let location = sort.write_to(location);
        assert_eq!(location.param(SORT_PARAM), Some("title"));
        assert_eq!(TaskSort::from_location(&location).unwrap(), sort);

        assert_eq!(TaskSort::from_location(&Location::parse("/tasks")).unwrap(), TaskSort::default());
        assert!(TaskSort::from_location(&Location::parse("/tasks?sort=color")).is_err());
    }
}

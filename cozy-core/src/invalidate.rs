//! Maps completed mutations onto the cached queries they make stale.
//!
//! The services cascade deletes (a project takes its tasks with it, a
//! calendar its events), so deleting a parent also invalidates the child
//! list scoped to it. Event lists are only ever fetched by range, so a
//! calendar's "list" is every range query whose selection includes it.

use std::sync::Arc;

use tracing::debug;

use crate::error::{CozyError, CozyResult};
use crate::model::{Calendar, Event, Project, Task};
use crate::notify::{Notice, Notifier};
use crate::query::{KeyPattern, QueryCache, QueryKey};

/// A mutation the server has confirmed.
#[derive(Debug, Clone)]
pub enum Mutation {
    ProjectCreated(Project),
    ProjectUpdated(Project),
    ProjectDeleted { project_id: i64 },
    TaskCreated(Task),
    TaskUpdated(Task),
    TaskStatusChanged { task_id: i64, project_id: i64 },
    TaskDeleted { task_id: i64, project_id: i64 },
    CalendarCreated(Calendar),
    CalendarUpdated(Calendar),
    CalendarDeleted { calendar_id: i64 },
    EventCreated(Event),
    EventUpdated(Event),
    EventDeleted { event_id: i64, calendar_id: i64 },
}

/// What kind of mutation failed, for the error notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    CreateProject,
    UpdateProject,
    DeleteProject,
    CreateTask,
    UpdateTask,
    UpdateTaskStatus,
    DeleteTask,
    CreateCalendar,
    UpdateCalendar,
    DeleteCalendar,
    CreateEvent,
    UpdateEvent,
    DeleteEvent,
}

impl MutationKind {
    fn failure_message(self) -> &'static str {
        match self {
            MutationKind::CreateProject => "Failed to create project",
            MutationKind::UpdateProject => "Failed to update project",
            MutationKind::DeleteProject => "Failed to delete project",
            MutationKind::CreateTask => "Failed to create task",
            MutationKind::UpdateTask => "Failed to update task",
            MutationKind::UpdateTaskStatus => "Failed to update task status",
            MutationKind::DeleteTask => "Failed to delete task",
            MutationKind::CreateCalendar => "Failed to create calendar",
            MutationKind::UpdateCalendar => "Failed to update calendar",
            MutationKind::DeleteCalendar => "Failed to delete calendar",
            MutationKind::CreateEvent => "Failed to create event",
            MutationKind::UpdateEvent => "Failed to update event",
            MutationKind::DeleteEvent => "Failed to delete event",
        }
    }
}

impl Mutation {
    /// Key patterns this mutation makes stale.
    pub fn invalidates(&self) -> Vec<KeyPattern> {
        use KeyPattern::{CalendarEvents, Exact};

        match self {
            Mutation::ProjectCreated(_) | Mutation::ProjectUpdated(_) => {
                vec![Exact(QueryKey::Projects)]
            }
            Mutation::ProjectDeleted { project_id } => vec![
                Exact(QueryKey::Projects),
                Exact(QueryKey::Tasks(*project_id)),
            ],
            Mutation::TaskCreated(task) | Mutation::TaskUpdated(task) => {
                vec![Exact(QueryKey::Tasks(task.project_id))]
            }
            Mutation::TaskStatusChanged { project_id, .. }
            | Mutation::TaskDeleted { project_id, .. } => {
                vec![Exact(QueryKey::Tasks(*project_id))]
            }
            Mutation::CalendarCreated(_) | Mutation::CalendarUpdated(_) => {
                vec![Exact(QueryKey::Calendars)]
            }
            Mutation::CalendarDeleted { calendar_id } => vec![
                Exact(QueryKey::Calendars),
                CalendarEvents(*calendar_id),
            ],
            Mutation::EventCreated(event) | Mutation::EventUpdated(event) => {
                vec![CalendarEvents(event.calendar_id)]
            }
            Mutation::EventDeleted { calendar_id, .. } => vec![CalendarEvents(*calendar_id)],
        }
    }

    pub fn success_message(&self) -> &'static str {
        match self {
            Mutation::ProjectCreated(_) => "Project created",
            Mutation::ProjectUpdated(_) => "Project updated",
            Mutation::ProjectDeleted { .. } => "Project deleted",
            Mutation::TaskCreated(_) => "Task created",
            Mutation::TaskUpdated(_) => "Task updated",
            Mutation::TaskStatusChanged { .. } => "Task status updated",
            Mutation::TaskDeleted { .. } => "Task deleted",
            Mutation::CalendarCreated(_) => "Calendar created",
            Mutation::CalendarUpdated(_) => "Calendar updated",
            Mutation::CalendarDeleted { .. } => "Calendar deleted",
            Mutation::EventCreated(_) => "Event created",
            Mutation::EventUpdated(_) => "Event updated",
            Mutation::EventDeleted { .. } => "Event deleted",
        }
    }
}

/// Invalidates cache keys after mutations and reports the outcome.
#[derive(Clone)]
pub struct InvalidationRouter {
    cache: QueryCache,
    notifier: Arc<dyn Notifier>,
}

impl InvalidationRouter {
    pub fn new(cache: QueryCache, notifier: Arc<dyn Notifier>) -> Self {
        InvalidationRouter { cache, notifier }
    }

    /// Returns the number of cache entries marked stale.
    pub fn on_success(&self, mutation: &Mutation) -> usize {
        let marked = mutation
            .invalidates()
            .iter()
            .map(|pattern| self.cache.invalidate(pattern))
            .sum();

        debug!(?mutation, marked, "mutation settled");
        self.notifier.notify(Notice::success(mutation.success_message()));
        marked
    }

    /// Failed mutations leave the cache alone.
    pub fn on_error(&self, kind: MutationKind, err: &CozyError) {
        self.notifier
            .notify(Notice::error(format!("{}: {err}", kind.failure_message())));
    }

    /// Route a mutation outcome. `describe` turns the server's answer into
    /// the [`Mutation`] that happened.
    pub fn settle<T>(
        &self,
        kind: MutationKind,
        result: CozyResult<T>,
        describe: impl FnOnce(&T) -> Mutation,
    ) -> CozyResult<T> {
        match result {
            Ok(value) => {
                self.on_success(&describe(&value));
                Ok(value)
            }
            Err(err) => {
                self.on_error(kind, &err);
                Err(err)
            }
        }
    }
}

//! Resource types returned by the cozy services, and the typed payloads sent to them.
//!
//! All resources are server-owned. The client never edits them in place;
//! it sends a payload and refetches.
//!
//! The services' `PUT` endpoints replace every editable column, so edits are
//! expressed as a `*Patch` (only what the user changed) and merged onto the
//! current record into a complete `*Update` body before sending.

mod calendar;
mod event;
mod project;
mod task;
mod user;

pub use calendar::{Calendar, CalendarPatch, CalendarUpdate, NewCalendar};
pub use event::{Event, EventPatch, EventUpdate, NewEvent};
pub use project::{NewProject, Project, ProjectPatch, ProjectUpdate};
pub use task::{
    NewTask, StatusUpdate, Task, TaskLabel, TaskPatch, TaskPriority, TaskStatus, TaskUpdate,
};
pub use user::{AuthResponse, LoginRequest, RegisterRequest, User};

use serde::{Deserialize, Deserializer};

/// Something a picker can select: it has a numeric id and a display name.
pub trait Identified {
    fn id(&self) -> i64;
    fn name(&self) -> &str;
}

/// Serialization guard: optional text fields are dropped when unset or blank,
/// so the services never see `""` for "no value".
pub(crate) fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(|s| s.trim().is_empty())
}

/// Merge one optional text field of a patch: `None` keeps `current`, a
/// blank value clears it.
pub(crate) fn merge_text(patch: &Option<String>, current: &Option<String>) -> Option<String> {
    match patch {
        Some(value) if value.trim().is_empty() => None,
        Some(value) => Some(value.clone()),
        None => current.clone(),
    }
}

/// Go services emit `""` for unset optional strings.
pub(crate) fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}

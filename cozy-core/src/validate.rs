//! Client-side payload checks. These run before any request is sent, and
//! report the offending field.

use chrono::{DateTime, Utc};

use crate::error::{CozyError, CozyResult};
use crate::model::{
    CalendarUpdate, EventUpdate, LoginRequest, NewCalendar, NewEvent, NewProject, NewTask,
    ProjectUpdate, RegisterRequest, TaskUpdate,
};

const MAX_TITLE_LEN: usize = 255;

pub trait Validate {
    fn validate(&self) -> CozyResult<()>;
}

fn required(field: &'static str, value: &str, label: &str) -> CozyResult<()> {
    if value.trim().is_empty() {
        return Err(CozyError::validation(field, format!("{label} is required.")));
    }
    Ok(())
}

fn title(value: &str) -> CozyResult<()> {
    required("title", value, "Title")?;
    if value.chars().count() > MAX_TITLE_LEN {
        return Err(CozyError::validation(
            "title",
            format!("Title must be at most {MAX_TITLE_LEN} characters."),
        ));
    }
    Ok(())
}

/// `#RRGGBB`, surrounding whitespace ignored.
pub fn is_hex_color(value: &str) -> bool {
    let value = value.trim();
    value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit())
}

fn color(value: Option<&str>) -> CozyResult<()> {
    match value.map(str::trim) {
        Some(c) if !c.is_empty() && !is_hex_color(c) => Err(CozyError::validation(
            "color",
            "Invalid color format, must be #RRGGBB hex code.",
        )),
        _ => Ok(()),
    }
}

/// Deliberately loose: one `@` with something on both sides and a dot in the domain.
pub fn is_email(value: &str) -> bool {
    let value = value.trim();
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !value.contains(char::is_whitespace)
        }
        None => false,
    }
}

fn email(value: &str) -> CozyResult<()> {
    required("email", value, "Email")?;
    if !is_email(value) {
        return Err(CozyError::validation("email", "Invalid email address."));
    }
    Ok(())
}

fn end_after_start(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    allow_equal: bool,
) -> CozyResult<()> {
    if let (Some(start), Some(end)) = (start, end) {
        if end < start || (end == start && !allow_equal) {
            return Err(CozyError::validation(
                "end_time",
                "End date/time must be after start date/time.",
            ));
        }
    }
    Ok(())
}

impl Validate for LoginRequest {
    fn validate(&self) -> CozyResult<()> {
        email(&self.email)?;
        required("password", &self.password, "Password")
    }
}

impl Validate for RegisterRequest {
    fn validate(&self) -> CozyResult<()> {
        required("username", &self.username, "Username")?;
        email(&self.email)?;
        required("password", &self.password, "Password")
    }
}

impl Validate for NewProject {
    fn validate(&self) -> CozyResult<()> {
        required("name", &self.name, "Project name")
    }
}

impl Validate for ProjectUpdate {
    fn validate(&self) -> CozyResult<()> {
        required("name", &self.name, "Project name")
    }
}

impl Validate for NewTask {
    fn validate(&self) -> CozyResult<()> {
        title(&self.title)?;
        end_after_start(self.start_time, self.end_time, true)
    }
}

impl Validate for TaskUpdate {
    fn validate(&self) -> CozyResult<()> {
        title(&self.title)?;
        end_after_start(self.start_time, self.end_time, true)
    }
}

impl Validate for NewCalendar {
    fn validate(&self) -> CozyResult<()> {
        required("name", &self.name, "Calendar name")?;
        color(self.color.as_deref())
    }
}

impl Validate for CalendarUpdate {
    fn validate(&self) -> CozyResult<()> {
        required("name", &self.name, "Calendar name")?;
        color(self.color.as_deref())
    }
}

impl Validate for NewEvent {
    fn validate(&self) -> CozyResult<()> {
        if self.calendar_id <= 0 {
            return Err(CozyError::validation("calendar_id", "Calendar is required."));
        }
        title(&self.title)?;
        end_after_start(Some(self.start_time), Some(self.end_time), false)?;
        color(self.color.as_deref())
    }
}

impl Validate for EventUpdate {
    fn validate(&self) -> CozyResult<()> {
        title(&self.title)?;
        end_after_start(Some(self.start_time), Some(self.end_time), false)?;
        color(self.color.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Event, EventPatch};
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 20, hour, 0, 0).unwrap()
    }

    fn event(start: u32, end: u32) -> NewEvent {
        NewEvent {
            calendar_id: 1,
            title: "Standup".into(),
            description: None,
            start_time: at(start),
            end_time: at(end),
            location: None,
            color: None,
        }
    }

    fn field_of(err: CozyError) -> &'static str {
        match err {
            CozyError::Validation { field, .. } => field,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn event_end_before_start_is_rejected() {
        assert!(event(9, 10).validate().is_ok());
        assert_eq!(field_of(event(10, 9).validate().unwrap_err()), "end_time");
        assert_eq!(field_of(event(10, 10).validate().unwrap_err()), "end_time");
    }

    #[test]
    fn event_requires_calendar_and_title() {
        let mut e = event(9, 10);
        e.calendar_id = 0;
        assert_eq!(field_of(e.validate().unwrap_err()), "calendar_id");

        let mut e = event(9, 10);
        e.title = "   ".into();
        assert_eq!(field_of(e.validate().unwrap_err()), "title");
    }

    #[test]
    fn merged_event_edit_is_checked_against_existing_times() {
        let current = Event {
            id: 4,
            calendar_id: 1,
            user_id: 1,
            title: "Standup".into(),
            description: None,
            start_time: at(9),
            end_time: at(10),
            location: None,
            color: None,
            created_at: None,
            updated_at: None,
        };

        // Only the start moves, past the end the event already has.
        let patch = EventPatch {
            start_time: Some(at(11)),
            ..Default::default()
        };
        assert_eq!(field_of(patch.apply_to(&current).validate().unwrap_err()), "end_time");

        let patch = EventPatch {
            title: Some("  ".into()),
            ..Default::default()
        };
        assert_eq!(field_of(patch.apply_to(&current).validate().unwrap_err()), "title");
    }

    #[test]
    fn cleared_project_name_is_rejected() {
        let update = ProjectUpdate {
            name: " ".into(),
            description: String::new(),
        };
        assert_eq!(field_of(update.validate().unwrap_err()), "name");
    }

    #[test]
    fn calendar_color_must_be_hex() {
        let mut cal = NewCalendar {
            name: "Work".into(),
            ..Default::default()
        };
        assert!(cal.validate().is_ok());

        cal.color = Some("#3b82F6".into());
        assert!(cal.validate().is_ok());

        cal.color = Some("blue".into());
        assert_eq!(field_of(cal.validate().unwrap_err()), "color");

        cal.color = Some(String::new());
        assert!(cal.validate().is_ok());
    }

    #[test]
    fn task_title_length_is_bounded() {
        assert!(NewTask::new("a".repeat(255)).validate().is_ok());
        assert_eq!(
            field_of(NewTask::new("a".repeat(256)).validate().unwrap_err()),
            "title"
        );
    }

    #[test]
    fn login_checks_email_shape() {
        let login = |email: &str| LoginRequest {
            email: email.into(),
            password: "hunter2".into(),
        };
        assert!(login("ada@example.com").validate().is_ok());
        assert_eq!(field_of(login("ada@example").validate().unwrap_err()), "email");
        assert_eq!(field_of(login("").validate().unwrap_err()), "email");
        assert!(!is_email("a b@example.com"));
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{empty_as_none, is_blank, merge_text};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub calendar_id: i64,
    #[serde(default)]
    pub user_id: i64,
    pub title: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub color: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Event {
    /// Whether any part of the event falls inside `[start, end)`.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start_time < end && self.end_time > start
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NewEvent {
    pub calendar_id: i64,
    pub title: String,
    #[serde(skip_serializing_if = "is_blank")]
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "is_blank")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "is_blank")]
    pub color: Option<String>,
}

/// Fields the user changed. The owning calendar cannot be changed. Blank
/// optional text clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub color: Option<String>,
}

impl EventPatch {
    pub fn is_empty(&self) -> bool {
        *self == EventPatch::default()
    }

    pub fn apply_to(&self, current: &Event) -> EventUpdate {
        EventUpdate {
            title: self.title.clone().unwrap_or_else(|| current.title.clone()),
            description: merge_text(&self.description, &current.description),
            start_time: self.start_time.unwrap_or(current.start_time),
            end_time: self.end_time.unwrap_or(current.end_time),
            location: merge_text(&self.location, &current.location),
            color: merge_text(&self.color, &current.color),
        }
    }
}

/// Body of `PUT /events/{id}`. Title and both times are always required.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventUpdate {
    pub title: String,
    #[serde(skip_serializing_if = "is_blank")]
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "is_blank")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "is_blank")]
    pub color: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn moving_an_event_keeps_the_rest() {
        let current = Event {
            id: 10,
            calendar_id: 2,
            user_id: 1,
            title: "Standup".into(),
            description: None,
            start_time: Utc.with_ymd_and_hms(2025, 3, 20, 9, 0, 0).unwrap(),
            end_time: Utc.with_ymd_and_hms(2025, 3, 20, 9, 15, 0).unwrap(),
            location: Some("Room 4".into()),
            color: Some("#10B981".into()),
            created_at: None,
            updated_at: None,
        };
        let patch = EventPatch {
            end_time: Some(Utc.with_ymd_and_hms(2025, 3, 20, 9, 30, 0).unwrap()),
            location: Some(String::new()),
            ..Default::default()
        };

        let update = patch.apply_to(&current);
        assert_eq!(update.title, "Standup");
        assert_eq!(update.start_time, current.start_time);
        assert_eq!(update.end_time, Utc.with_ymd_and_hms(2025, 3, 20, 9, 30, 0).unwrap());
        assert_eq!(update.location, None);
        assert_eq!(update.color.as_deref(), Some("#10B981"));
    }
}

use std::fmt;

use chrono::{DateTime, Utc};

use crate::calendar_view::TimeRange;

/// Identifies one cached query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    Me,
    Projects,
    Tasks(i64),
    Calendars,
    /// Events of several calendars within `[start, end)`. Ids are sorted and
    /// deduplicated so the same selection always maps to the same key.
    EventRange {
        calendar_ids: Vec<i64>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

impl QueryKey {
    pub fn event_range(calendar_ids: impl IntoIterator<Item = i64>, range: &TimeRange) -> Self {
        let mut calendar_ids: Vec<i64> = calendar_ids.into_iter().collect();
        calendar_ids.sort_unstable();
        calendar_ids.dedup();

        QueryKey::EventRange {
            calendar_ids,
            start: range.start,
            end: range.end,
        }
    }

    /// Whether this is an event query covering `calendar_id`.
    fn includes_calendar(&self, calendar_id: i64) -> bool {
        match self {
            QueryKey::EventRange { calendar_ids, .. } => calendar_ids.binary_search(&calendar_id).is_ok(),
            _ => false,
        }
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryKey::Me => write!(f, "me"),
            QueryKey::Projects => write!(f, "projects"),
            QueryKey::Tasks(project_id) => write!(f, "tasks/{project_id}"),
            QueryKey::Calendars => write!(f, "calendars"),
            QueryKey::EventRange {
                calendar_ids,
                start,
                end,
            } => {
                let ids: Vec<String> = calendar_ids.iter().map(i64::to_string).collect();
                write!(
                    f,
                    "events[{}]/{}..{}",
                    ids.join(","),
                    start.to_rfc3339(),
                    end.to_rfc3339()
                )
            }
        }
    }
}

/// Selects a family of keys to invalidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyPattern {
    Exact(QueryKey),
    /// Every event range query whose calendar selection includes this calendar.
    CalendarEvents(i64),
}

impl KeyPattern {
    pub fn matches(&self, key: &QueryKey) -> bool {
        match self {
            KeyPattern::Exact(exact) => exact == key,
            KeyPattern::CalendarEvents(calendar_id) => key.includes_calendar(*calendar_id),
        }
    }
}

impl From<QueryKey> for KeyPattern {
    fn from(key: QueryKey) -> Self {
        KeyPattern::Exact(key)
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{empty_as_none, is_blank, merge_text, Identified};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Calendar {
    pub id: i64,
    #[serde(default)]
    pub user_id: i64,
    pub name: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub description: Option<String>,
    /// Hex code like `#3B82F6`.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub color: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Identified for Calendar {
    fn id(&self) -> i64 {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NewCalendar {
    pub name: String,
    #[serde(skip_serializing_if = "is_blank")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "is_blank")]
    pub color: Option<String>,
}

/// Fields the user changed. Blank description or color clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CalendarPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
}

impl CalendarPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.color.is_none()
    }

    pub fn apply_to(&self, current: &Calendar) -> CalendarUpdate {
        CalendarUpdate {
            name: self.name.clone().unwrap_or_else(|| current.name.clone()),
            description: merge_text(&self.description, &current.description),
            color: merge_text(&self.color, &current.color),
        }
    }
}

/// Body of `PUT /calendars/{id}`. The service overwrites name, description
/// and color from it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarUpdate {
    pub name: String,
    #[serde(skip_serializing_if = "is_blank")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "is_blank")]
    pub color: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renaming_keeps_description_and_color() {
        let current = Calendar {
            id: 3,
            user_id: 1,
            name: "Work".into(),
            description: Some("Office hours".into()),
            color: Some("#3B82F6".into()),
            created_at: None,
            updated_at: None,
        };
        let patch = CalendarPatch {
            name: Some("Job".into()),
            ..Default::default()
        };

        assert_eq!(
            patch.apply_to(&current),
            CalendarUpdate {
                name: "Job".into(),
                description: Some("Office hours".into()),
                color: Some("#3B82F6".into()),
            }
        );
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{empty_as_none, is_blank, merge_text, Identified};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Identified for Project {
    fn id(&self) -> i64 {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NewProject {
    pub name: String,
    #[serde(skip_serializing_if = "is_blank")]
    pub description: Option<String>,
}

/// Fields the user changed. A blank description clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl ProjectPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none()
    }

    pub fn apply_to(&self, current: &Project) -> ProjectUpdate {
        ProjectUpdate {
            name: self.name.clone().unwrap_or_else(|| current.name.clone()),
            description: merge_text(&self.description, &current.description).unwrap_or_default(),
        }
    }
}

/// Body of `PUT /projects/{id}`. The description is always sent; an empty
/// string is how the service is told to clear it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectUpdate {
    pub name: String,
    pub description: String,
}

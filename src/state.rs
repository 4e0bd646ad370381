//! Per-view URL state kept between invocations, so `cozy tasks list` picks up
//! the project and filters from last time the way a browser tab would.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use cozy_core::location::{Location, Navigator};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Tasks,
    Calendar,
    Login,
}

impl View {
    pub fn home(&self) -> &'static str {
        match self {
            View::Tasks => "/tasks",
            View::Calendar => "/calendar",
            View::Login => "/login",
        }
    }

    /// The view that renders `path`, if any.
    pub fn for_path(path: &str) -> Option<View> {
        [View::Tasks, View::Calendar, View::Login]
            .into_iter()
            .find(|view| path.starts_with(view.home()))
    }
}

#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
struct StateFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tasks: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    calendar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    login: Option<String>,
    /// The calendar filter's one-time default has been applied.
    #[serde(default)]
    calendar_default_applied: bool,
}

pub struct ViewState {
    path: PathBuf,
    file: StateFile,
}

impl ViewState {
    pub fn default_path() -> Result<PathBuf> {
        Ok(dirs::data_dir()
            .context("Could not determine data directory")?
            .join("cozy")
            .join("state.toml"))
    }

    pub fn load() -> Result<Self> {
        Self::load_from(Self::default_path()?)
    }

    pub fn load_from(path: PathBuf) -> Result<Self> {
        let file = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse {}", path.display()))?
        } else {
            StateFile::default()
        };

        Ok(ViewState { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn slot(&mut self, view: View) -> &mut Option<String> {
        match view {
            View::Tasks => &mut self.file.tasks,
            View::Calendar => &mut self.file.calendar,
            View::Login => &mut self.file.login,
        }
    }

    pub fn location(&self, view: View) -> Location {
        let stored = match view {
            View::Tasks => &self.file.tasks,
            View::Calendar => &self.file.calendar,
            View::Login => &self.file.login,
        };
        stored
            .as_deref()
            .map(Location::parse)
            .unwrap_or_else(|| Location::new(view.home()))
    }

    pub fn navigator(&self, view: View) -> ViewNavigator {
        ViewNavigator::new(self.location(view))
    }

    pub fn store(&mut self, view: View, nav: &ViewNavigator) {
        *self.slot(view) = Some(nav.location().to_string());
    }

    pub fn set_location(&mut self, view: View, location: &Location) {
        *self.slot(view) = Some(location.to_string());
    }

    pub fn calendar_default_applied(&self) -> bool {
        self.file.calendar_default_applied
    }

    pub fn set_calendar_default_applied(&mut self, applied: bool) {
        self.file.calendar_default_applied = applied;
    }

    /// Drop everything tied to the previous user.
    pub fn reset(&mut self) {
        self.file = StateFile::default();
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let contents = toml::to_string(&self.file).context("Failed to serialize view state")?;
        std::fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        Ok(())
    }
}

/// A one-entry history: the CLI has no back button, so push and replace
/// both just move the current location.
pub struct ViewNavigator {
    location: Location,
}

impl ViewNavigator {
    pub fn new(location: Location) -> Self {
        ViewNavigator { location }
    }
}

impl Navigator for ViewNavigator {
    fn location(&self) -> Location {
        self.location.clone()
    }

    fn push(&mut self, location: Location) {
        debug!(from = %self.location, to = %location, "push");
        self.location = location;
    }

    fn replace(&mut self, location: Location) {
        debug!(from = %self.location, to = %location, "replace");
        self.location = location;
    }
}

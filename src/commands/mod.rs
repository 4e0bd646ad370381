pub mod auth;
pub mod calendars;
pub mod config;
pub mod events;
pub mod open;
pub mod projects;
pub mod tasks;

use std::fmt;

use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use cozy_core::model::Project;
use cozy_core::route::{self, RouteDecision};
use cozy_core::selection::{Resolution, SelectionResolver};
use cozy_core::{AppContext, CozyError, CozyResult, Loadable};
use dialoguer::Confirm;

use crate::state::{View, ViewNavigator, ViewState};
use crate::utils::tui::with_spinner;

/// An error the notifier has already shown to the user.
#[derive(Debug)]
pub struct Reported;

impl fmt::Display for Reported {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("error already reported")
    }
}

impl std::error::Error for Reported {}

pub trait ReportedExt<T> {
    /// Turn a mutation error, which the notifier already printed, into [`Reported`].
    fn reported(self) -> Result<T>;
}

impl<T> ReportedExt<T> for CozyResult<T> {
    fn reported(self) -> Result<T> {
        self.map_err(|_| anyhow::Error::new(Reported))
    }
}

/// Refuse to show a protected view without a session, remembering where the
/// user was headed.
pub fn gate_view(ctx: &AppContext, state: &mut ViewState, view: View) -> Result<()> {
    let requested = state.location(view);
    let decision = route::gate(requested.path(), ctx.is_logged_in());

    if let RouteDecision::RedirectToLogin { .. } = decision {
        state.set_location(View::Login, &decision.destination(&requested));
        return Err(CozyError::NotAuthenticated.into());
    }
    Ok(())
}

/// Unwrap a resolution into the selected entity, if any.
pub fn resolved<E>(resolution: Resolution<E>, what: &str) -> Result<Option<E>> {
    match resolution {
        Resolution::Selected(entity) => Ok(Some(entity)),
        Resolution::Cleared | Resolution::Loading => Ok(None),
        Resolution::Failed(err) => anyhow::bail!("Failed to load {what}: {err}"),
    }
}

/// The tasks view's current project: from `--project` if given (a history
/// push), otherwise reconciled from the stored URL.
pub async fn current_project(
    ctx: &AppContext,
    state: &mut ViewState,
    explicit: Option<i64>,
) -> Result<(ViewNavigator, Vec<Project>, Option<Project>)> {
    gate_view(ctx, state, View::Tasks)?;

    let mut nav = state.navigator(View::Tasks);
    let mut resolver = SelectionResolver::projects();
    let projects = Loadable::from_result(with_spinner("Loading projects", ctx.projects()).await);

    if let (Some(id), Some(list)) = (explicit, projects.as_ready()) {
        resolver.select(&mut nav, list, id)?;
    }

    let project = resolved(resolver.resolve(&mut nav, &projects), "projects")?;
    state.store(View::Tasks, &nav);

    let list = projects.as_ready().cloned().unwrap_or_default();
    Ok((nav, list, project))
}

pub fn require_project(project: Option<Project>) -> Result<Project> {
    project.context("No projects yet. Create one with `cozy projects add <name>`")
}

/// Ask before destructive actions unless `--yes` was passed.
pub fn confirm(prompt: String, yes: bool) -> Result<bool> {
    if yes {
        return Ok(true);
    }
    Ok(Confirm::new().with_prompt(prompt).default(false).interact()?)
}

/// Accepts `2025-03-20T15:00`, `2025-03-20 15:00`, RFC 3339, or a bare date
/// (local midnight). Naive times are local.
pub fn parse_datetime(input: &str) -> Result<DateTime<Utc>> {
    let input = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }

    let naive = ["%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(input, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(chrono::NaiveTime::MIN))
        })
        .with_context(|| {
            format!("Invalid date/time '{input}'. Expected YYYY-MM-DD or YYYY-MM-DDTHH:MM")
        })?;

    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("'{input}' does not exist in the local time zone"))
}

/// Parse durations like "30m", "1h", "2h 30m".
pub fn parse_duration(input: &str) -> Result<chrono::Duration> {
    let std = humantime::parse_duration(input.trim())
        .with_context(|| format!("Invalid duration '{input}'. Examples: 30m, 1h, 2h 30m"))?;
    chrono::Duration::from_std(std).context("Duration is too long")
}

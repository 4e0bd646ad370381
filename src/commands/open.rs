use anyhow::{Context, Result};
use cozy_core::location::Location;
use cozy_core::route::{self, RouteDecision};
use cozy_core::AppContext;
use owo_colors::OwoColorize;

use crate::state::{View, ViewState};

/// Point a view at `path` the way following a link would, subject to the
/// same session gate the app applies.
pub fn run(ctx: &AppContext, state: &mut ViewState, path: &str) -> Result<()> {
    let requested: Location = path
        .parse()
        .with_context(|| format!("Invalid path '{path}'"))?;
    let decision = route::gate(requested.path(), ctx.is_logged_in());
    let destination = decision.destination(&requested);

    match &decision {
        RouteDecision::Allow => {}
        RouteDecision::RedirectToLogin { .. } => {
            state.set_location(View::Login, &destination);
            println!("{} requires a login. Run `cozy login` to continue there.", requested.path());
            return Ok(());
        }
        RouteDecision::Redirect(_) => {
            println!("{}", format!("Already logged in, redirected to {destination}").dimmed());
        }
    }

    match View::for_path(destination.path()) {
        Some(View::Login) | None => println!("{destination}"),
        Some(view) => {
            state.set_location(view, &destination);
            println!("{destination}");
        }
    }
    Ok(())
}

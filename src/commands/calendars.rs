use anyhow::{bail, Result};
use clap::Subcommand;
use cozy_core::filter::MultiSelectFilter;
use cozy_core::location::Navigator;
use cozy_core::model::{Calendar, CalendarPatch, NewCalendar};
use cozy_core::selection::SelectionResolver;
use cozy_core::{AppContext, Loadable};
use owo_colors::OwoColorize;

use super::{confirm, gate_view, resolved, ReportedExt};
use crate::render::Render;
use crate::state::{View, ViewNavigator, ViewState};
use crate::utils::tui::with_spinner;

#[derive(Subcommand)]
pub enum CalendarCommands {
    /// List calendars. [x] marks calendars shown in `events list`, * the
    /// one new events go to.
    List,
    /// Create a calendar
    Add {
        name: String,

        /// Hex color like #3B82F6
        #[arg(short, long)]
        color: Option<String>,

        #[arg(short, long)]
        description: Option<String>,
    },
    /// Change a calendar
    Edit {
        id: i64,

        #[arg(short, long)]
        name: Option<String>,

        #[arg(short, long)]
        color: Option<String>,

        #[arg(short, long)]
        description: Option<String>,
    },
    /// Delete a calendar and its events
    Rm {
        id: i64,

        #[arg(short, long)]
        yes: bool,
    },
    /// Make this the calendar new events go to
    Use { id: i64 },
}

/// The calendar view's state after reconciling the stored URL with the
/// loaded calendars.
pub struct CalendarState {
    pub nav: ViewNavigator,
    pub calendars: Vec<Calendar>,
    pub target: Option<Calendar>,
    pub filter: MultiSelectFilter,
}

/// Load calendars, apply the one-time filter default and resolve the target
/// calendar. `select` is an explicit choice of target.
pub async fn calendar_state(
    ctx: &AppContext,
    state: &mut ViewState,
    select: Option<i64>,
) -> Result<CalendarState> {
    gate_view(ctx, state, View::Calendar)?;

    let mut nav = state.navigator(View::Calendar);
    let calendars = Loadable::from_result(with_spinner("Loading calendars", ctx.calendars()).await);

    let mut filter = MultiSelectFilter::calendars().with_default_applied(state.calendar_default_applied());
    filter.apply_default(&mut nav, &calendars);

    let mut resolver = SelectionResolver::calendars();
    if let (Some(id), Some(list)) = (select, calendars.as_ready()) {
        resolver.select(&mut nav, list, id)?;
    }
    let target = resolved(resolver.resolve(&mut nav, &calendars), "calendars")?;

    state.store(View::Calendar, &nav);
    state.set_calendar_default_applied(filter.default_applied());

    Ok(CalendarState {
        nav,
        calendars: calendars.as_ready().cloned().unwrap_or_default(),
        target,
        filter,
    })
}

pub async fn run(ctx: &AppContext, state: &mut ViewState, command: CalendarCommands) -> Result<()> {
    match command {
        CalendarCommands::List => list(ctx, state, None).await,
        CalendarCommands::Add {
            name,
            color,
            description,
        } => {
            let calendar = ctx
                .create_calendar(&NewCalendar {
                    name,
                    description,
                    color,
                })
                .await
                .reported()?;
            println!("{}", calendar.render());
            Ok(())
        }
        CalendarCommands::Edit {
            id,
            name,
            color,
            description,
        } => {
            let patch = CalendarPatch {
                name,
                description,
                color,
            };
            if patch.is_empty() {
                bail!("Nothing to update. Pass at least one of --name, --color, --description");
            }

            let calendar = ctx.update_calendar(id, &patch).await.reported()?;
            println!("{}", calendar.render());
            Ok(())
        }
        CalendarCommands::Rm { id, yes } => {
            if !confirm(format!("Delete calendar #{id} and all of its events?"), yes)? {
                return Ok(());
            }
            ctx.delete_calendar(id).await.reported()?;

            // Drop the id from the filter too; the target re-resolves on its own.
            let mut cal = calendar_state(ctx, state, None).await?;
            let mut selected = cal.filter.selected(&cal.nav.location());
            if selected.remove(&id) {
                cal.filter.set_selected(&mut cal.nav, &selected);
                state.store(View::Calendar, &cal.nav);
            }
            print_calendars(&cal);
            Ok(())
        }
        CalendarCommands::Use { id } => list(ctx, state, Some(id)).await,
    }
}

async fn list(ctx: &AppContext, state: &mut ViewState, select: Option<i64>) -> Result<()> {
    let cal = calendar_state(ctx, state, select).await?;
    print_calendars(&cal);
    Ok(())
}

fn print_calendars(cal: &CalendarState) {
    if cal.calendars.is_empty() {
        println!("{}", "No calendars yet. Create one with `cozy calendars add <name>`".dimmed());
        return;
    }

    let shown = cal.filter.selected(&cal.nav.location());
    let target = cal.target.as_ref().map(|c| c.id);
    for calendar in &cal.calendars {
        let check = if shown.contains(&calendar.id) { "[x]" } else { "[ ]" };
        let marker = if Some(calendar.id) == target { "*".green().to_string() } else { " ".to_string() };
        println!("{check}{marker} {}", calendar.render());
    }
}

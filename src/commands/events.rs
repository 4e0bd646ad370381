use std::collections::BTreeSet;

use anyhow::{bail, Result};
use chrono::Local;
use clap::Subcommand;
use cozy_core::calendar_view::{events_by_day, parse_date, CalendarCursor, CalendarView};
use cozy_core::location::Navigator;
use cozy_core::model::{EventPatch, NewEvent};
use cozy_core::AppContext;
use owo_colors::OwoColorize;

use super::calendars::calendar_state;
use super::{confirm, parse_datetime, parse_duration, ReportedExt};
use crate::render::Render;
use crate::state::{View, ViewState};
use crate::utils::tui::with_spinner;

#[derive(Subcommand)]
pub enum EventCommands {
    /// Show events of the selected calendars. View, date and calendar
    /// selection are remembered.
    List {
        /// Show exactly these calendars (comma-separated ids)
        #[arg(short, long, value_delimiter = ',')]
        calendars: Vec<i64>,

        /// Flip these calendars in or out of the selection
        #[arg(short, long, value_delimiter = ',')]
        toggle: Vec<i64>,

        /// month, week or day
        #[arg(long)]
        view: Option<CalendarView>,

        /// Jump to this date (YYYY-MM-DD)
        #[arg(short, long)]
        date: Option<String>,

        /// Page forward one view unit
        #[arg(long, conflicts_with_all = ["prev", "today"])]
        next: bool,

        /// Page back one view unit
        #[arg(long, conflicts_with = "today")]
        prev: bool,

        /// Jump back to today
        #[arg(long, conflicts_with = "date")]
        today: bool,
    },
    /// Create an event
    Add {
        title: String,

        /// Start, e.g. 2025-03-20T15:00
        #[arg(short, long)]
        start: String,

        /// End; defaults to start plus --duration
        #[arg(short, long, conflicts_with = "duration")]
        end: Option<String>,

        #[arg(long, default_value = "1h")]
        duration: String,

        /// Calendar id; defaults to the current calendar
        #[arg(short, long)]
        calendar: Option<i64>,

        #[arg(short, long)]
        location: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        color: Option<String>,
    },
    /// Change an event
    Edit {
        id: i64,

        #[arg(short, long)]
        title: Option<String>,

        #[arg(short, long)]
        start: Option<String>,

        #[arg(short, long)]
        end: Option<String>,

        #[arg(short, long)]
        location: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        color: Option<String>,
    },
    /// Delete an event
    Rm {
        id: i64,

        #[arg(short, long)]
        yes: bool,
    },
}

pub async fn run(ctx: &AppContext, state: &mut ViewState, command: EventCommands) -> Result<()> {
    match command {
        EventCommands::List {
            calendars,
            toggle,
            view,
            date,
            next,
            prev,
            today,
        } => {
            let mut cal = calendar_state(ctx, state, None).await?;

            if !calendars.is_empty() {
                let ids: BTreeSet<i64> = calendars.into_iter().collect();
                cal.filter.set_selected(&mut cal.nav, &ids);
            }
            for id in toggle {
                cal.filter.toggle(&mut cal.nav, id);
            }

            let now = Local::now().date_naive();
            let location = cal.nav.location();
            let mut cursor = if today {
                CalendarCursor::new(CalendarCursor::from_location(&location, now)?.view, now)
            } else {
                CalendarCursor::from_location(&location, now)?
            };
            if let Some(view) = view {
                cursor.view = view;
            }
            if let Some(date) = date {
                cursor.anchor = parse_date(&date)?;
            }
            if next {
                cursor = cursor.next();
            } else if prev {
                cursor = cursor.previous();
            }

            let location = cal.nav.location();
            let target = cursor.write_to(location.clone(), now);
            if target != location {
                cal.nav.replace(target);
            }
            state.store(View::Calendar, &cal.nav);
            state.set_calendar_default_applied(cal.filter.default_applied());

            let visible = cal.filter.visible(&cal.nav.location(), &cal.calendars);
            let range = cursor.range(&Local)?;
            let events = with_spinner("Loading events", ctx.events_in_range(&visible, &range)).await?;

            println!("{}", cursor.title().bold());
            if visible.is_empty() {
                println!(
                    "{}",
                    "No calendars selected. Pick some with `cozy events list --calendars <ids>`".dimmed()
                );
                return Ok(());
            }

            let days = events_by_day(&events, &range, &Local);
            if days.is_empty() {
                println!("{}", "No events".dimmed());
            }
            for (day, on_day) in days {
                println!();
                println!("{}", day.format("%a %b %-d").to_string().underline());
                for event in on_day {
                    println!("{}", event.render());
                }
            }
            Ok(())
        }
        EventCommands::Add {
            title,
            start,
            end,
            duration,
            calendar,
            location,
            description,
            color,
        } => {
            let calendar_id = match calendar {
                Some(id) => id,
                None => match calendar_state(ctx, state, None).await?.target {
                    Some(calendar) => calendar.id,
                    None => bail!("No calendars yet. Create one with `cozy calendars add <name>`"),
                },
            };

            let start_time = parse_datetime(&start)?;
            let end_time = match end {
                Some(end) => parse_datetime(&end)?,
                None => start_time + parse_duration(&duration)?,
            };

            let event = ctx
                .create_event(&NewEvent {
                    calendar_id,
                    title,
                    description,
                    start_time,
                    end_time,
                    location,
                    color,
                })
                .await
                .reported()?;
            println!("{}", event.render());
            Ok(())
        }
        EventCommands::Edit {
            id,
            title,
            start,
            end,
            location,
            description,
            color,
        } => {
            let patch = EventPatch {
                title,
                description,
                start_time: start.as_deref().map(parse_datetime).transpose()?,
                end_time: end.as_deref().map(parse_datetime).transpose()?,
                location,
                color,
            };
            if patch.is_empty() {
                bail!("Nothing to update. Pass at least one of --title, --start, --end, --location, --description, --color");
            }

            let event = ctx.update_event(id, &patch).await.reported()?;
            println!("{}", event.render());
            Ok(())
        }
        EventCommands::Rm { id, yes } => {
            let event = ctx.event(id).await?;
            if !confirm(format!("Delete event '{}'?", event.title), yes)? {
                return Ok(());
            }
            ctx.delete_event(event.calendar_id, id).await.reported()
        }
    }
}

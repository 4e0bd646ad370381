use anyhow::Result;
use cozy_core::session::SessionStore;
use cozy_core::{AppContext, CozyConfig};
use owo_colors::OwoColorize;

use crate::state::ViewState;

pub fn run(ctx: &AppContext, store: &SessionStore, state: &ViewState) -> Result<()> {
    let config = ctx.config();

    println!("{}", "Paths".bold());
    println!("  config   {}", CozyConfig::config_path()?.display());
    println!("  session  {}", store.path().display());
    println!("  state    {}", state.path().display());

    println!();
    println!("{}", "Services".bold());
    println!("  auth       {}", config.services.auth);
    println!("  tasks      {}", config.services.tasks);
    println!("  calendars  {}", config.services.calendars);
    println!("  events     {}", config.services.events);

    let cache = &config.cache;
    println!();
    println!("{}", "Cache".bold());
    println!("  stale_time       {}", humantime::format_duration(cache.stale_time));
    println!("  gc_time          {}", humantime::format_duration(cache.gc_time));
    println!("  query_retries    {}", cache.query_retries);
    println!("  retry_delay      {}", humantime::format_duration(cache.retry_delay));
    println!("  request_timeout  {}", humantime::format_duration(cache.request_timeout));

    println!();
    match ctx.session() {
        Some(session) => println!(
            "Logged in as {} until {}",
            session.user.display_name(),
            session.expires_at.format("%Y-%m-%d %H:%M UTC")
        ),
        None => println!("{}", "Not logged in".dimmed()),
    }
    Ok(())
}

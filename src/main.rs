mod commands;
mod logging;
mod notify;
mod render;
mod state;
mod utils;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cozy_core::session::SessionStore;
use cozy_core::{AppContext, CozyConfig};

use crate::notify::ConsoleNotifier;
use crate::state::ViewState;

#[derive(Parser)]
#[command(name = "cozy")]
#[command(about = "Manage your cozy projects, tasks, calendars and events from the terminal")]
struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Less log output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    quiet: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and remember the session
    Login {
        #[arg(short, long)]
        email: Option<String>,
    },
    /// Create an account
    Register {
        #[arg(short, long)]
        username: Option<String>,

        #[arg(short, long)]
        email: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Navigate to an app path, e.g. "/tasks?projectId=2&status=todo"
    Open { path: String },
    /// Show config and data paths
    Config,
    /// Manage projects
    Projects {
        #[command(subcommand)]
        command: commands::projects::ProjectCommands,
    },
    /// Manage tasks in the current project
    Tasks {
        #[command(subcommand)]
        command: commands::tasks::TaskCommands,
    },
    /// Manage calendars
    Calendars {
        #[command(subcommand)]
        command: commands::calendars::CalendarCommands,
    },
    /// Browse and manage events
    Events {
        #[command(subcommand)]
        command: commands::events::EventCommands,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_tracing(cli.verbose, cli.quiet)?;

    let config = CozyConfig::load().context("Failed to load config")?;
    let store = SessionStore::open_default()?;
    let session = store.load()?;
    let mut state = ViewState::load()?;
    let mut ctx = AppContext::new(config, session, Arc::new(ConsoleNotifier))?;

    let result = match cli.command {
        Commands::Login { email } => commands::auth::login(&mut ctx, &store, &mut state, email).await,
        Commands::Register { username, email } => {
            commands::auth::register(&ctx, username, email).await
        }
        Commands::Logout => commands::auth::logout(&mut ctx, &store),
        Commands::Whoami => commands::auth::whoami(&ctx).await,
        Commands::Open { path } => commands::open::run(&ctx, &mut state, &path),
        Commands::Config => commands::config::run(&ctx, &store, &state),
        Commands::Projects { command } => commands::projects::run(&ctx, &mut state, command).await,
        Commands::Tasks { command } => commands::tasks::run(&ctx, &mut state, command).await,
        Commands::Calendars { command } => commands::calendars::run(&ctx, &mut state, command).await,
        Commands::Events { command } => commands::events::run(&ctx, &mut state, command).await,
    };

    // Keep URL state even when the command itself failed.
    state.save()?;

    match result {
        // The notifier already printed it.
        Err(err) if err.is::<commands::Reported>() => std::process::exit(1),
        other => other,
    }
}

use anyhow::Result;
use cozy_core::model::{LoginRequest, RegisterRequest};
use cozy_core::route;
use cozy_core::session::SessionStore;
use cozy_core::AppContext;
use dialoguer::{Input, Password};
use owo_colors::OwoColorize;

use super::ReportedExt;
use crate::state::{View, ViewState};
use crate::utils::tui::with_spinner;

fn prompt_if_missing(value: Option<String>, prompt: &str) -> Result<String> {
    match value {
        Some(value) => Ok(value),
        None => Ok(Input::<String>::new().with_prompt(prompt).interact_text()?),
    }
}

pub async fn login(
    ctx: &mut AppContext,
    store: &SessionStore,
    state: &mut ViewState,
    email: Option<String>,
) -> Result<()> {
    let email = prompt_if_missing(email, "Email")?;
    let password = Password::new().with_prompt("Password").interact()?;

    // Read before the reset below wipes it.
    let bounced_from = state.location(View::Login);

    let session = ctx
        .login(&LoginRequest { email, password })
        .await
        .reported()?;
    store.save(&session)?;

    state.reset();
    let destination = route::after_login(&bounced_from);
    if let Some(view) = View::for_path(destination.path()) {
        state.set_location(view, &destination);
    }

    println!("Logged in as {}", session.user.display_name().bold());
    match View::for_path(destination.path()) {
        Some(View::Calendar) => println!("{}", "Continue with `cozy events list`".dimmed()),
        _ => println!("{}", "Continue with `cozy tasks list`".dimmed()),
    }
    Ok(())
}

pub async fn register(ctx: &AppContext, username: Option<String>, email: Option<String>) -> Result<()> {
    let username = prompt_if_missing(username, "Username")?;
    let email = prompt_if_missing(email, "Email")?;
    let password = Password::new()
        .with_prompt("Password")
        .with_confirmation("Repeat password", "Passwords don't match")
        .interact()?;

    ctx.register(&RegisterRequest {
        username,
        email,
        password,
    })
    .await
    .reported()?;

    println!("{}", "Now log in with `cozy login`".dimmed());
    Ok(())
}

pub fn logout(ctx: &mut AppContext, store: &SessionStore) -> Result<()> {
    if !ctx.is_logged_in() {
        println!("{}", "Not logged in".dimmed());
        return Ok(());
    }

    ctx.logout();
    store.clear()?;
    Ok(())
}

pub async fn whoami(ctx: &AppContext) -> Result<()> {
    let user = with_spinner("Loading profile", ctx.me()).await?;
    let session = ctx.require_session()?;

    println!("{} <{}>", user.display_name().bold(), user.email);
    println!(
        "{}",
        format!("session expires {}", session.expires_at.format("%Y-%m-%d %H:%M UTC")).dimmed()
    );
    Ok(())
}

use anyhow::{bail, Result};
use clap::Subcommand;
use cozy_core::model::{NewProject, ProjectPatch};
use owo_colors::OwoColorize;

use super::{confirm, current_project, ReportedExt};
use crate::render::Render;
use crate::state::ViewState;
use cozy_core::AppContext;

#[derive(Subcommand)]
pub enum ProjectCommands {
    /// List projects; the current one is marked with *
    List,
    /// Create a project
    Add {
        name: String,

        #[arg(short, long)]
        description: Option<String>,
    },
    /// Rename or re-describe a project
    Edit {
        id: i64,

        #[arg(short, long)]
        name: Option<String>,

        #[arg(short, long)]
        description: Option<String>,
    },
    /// Delete a project and all of its tasks
    Rm {
        id: i64,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Switch the tasks view to this project
    Use { id: i64 },
}

pub async fn run(ctx: &AppContext, state: &mut ViewState, command: ProjectCommands) -> Result<()> {
    match command {
        ProjectCommands::List => list(ctx, state, None).await,
        ProjectCommands::Add { name, description } => {
            let project = ctx
                .create_project(&NewProject { name, description })
                .await
                .reported()?;
            println!("{}", project.render());
            Ok(())
        }
        ProjectCommands::Edit {
            id,
            name,
            description,
        } => {
            let patch = ProjectPatch { name, description };
            if patch.is_empty() {
                bail!("Nothing to update. Pass --name or --description");
            }

            let project = ctx.update_project(id, &patch).await.reported()?;
            println!("{}", project.render());
            Ok(())
        }
        ProjectCommands::Rm { id, yes } => {
            if !confirm(format!("Delete project #{id} and all of its tasks?"), yes)? {
                return Ok(());
            }
            ctx.delete_project(id).await.reported()?;
            // Re-resolve so a deleted current project falls back to another one.
            list(ctx, state, None).await
        }
        ProjectCommands::Use { id } => list(ctx, state, Some(id)).await,
    }
}

async fn list(ctx: &AppContext, state: &mut ViewState, select: Option<i64>) -> Result<()> {
    let (_, projects, current) = current_project(ctx, state, select).await?;

    if projects.is_empty() {
        println!("{}", "No projects yet. Create one with `cozy projects add <name>`".dimmed());
        return Ok(());
    }

    let current_id = current.map(|p| p.id);
    for project in &projects {
        let marker = if Some(project.id) == current_id { "*".green().to_string() } else { " ".to_string() };
        println!("{marker} {}", project.render());
    }

    Ok(())
}

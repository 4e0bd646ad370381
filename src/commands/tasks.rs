use std::collections::BTreeSet;

use anyhow::{bail, Result};
use clap::Subcommand;
use cozy_core::location::Navigator;
use cozy_core::model::{NewTask, TaskLabel, TaskPatch, TaskPriority, TaskStatus};
use cozy_core::task_table::{visible_tasks, TaskFilter, TaskSort};
use cozy_core::AppContext;
use owo_colors::OwoColorize;

use super::{confirm, current_project, parse_datetime, require_project, ReportedExt};
use crate::render::Render;
use crate::state::{View, ViewState};
use crate::utils::tui::with_spinner;

#[derive(Subcommand)]
pub enum TaskCommands {
    /// Show the current project's tasks. Filter flags are remembered.
    List {
        /// Switch to this project first
        #[arg(short, long)]
        project: Option<i64>,

        /// Only these statuses (comma-separated)
        #[arg(long, value_delimiter = ',')]
        status: Vec<TaskStatus>,

        /// Only these priorities (comma-separated)
        #[arg(long, value_delimiter = ',')]
        priority: Vec<TaskPriority>,

        /// Only these labels (comma-separated)
        #[arg(long, value_delimiter = ',')]
        label: Vec<TaskLabel>,

        /// Title contains this text
        #[arg(short, long)]
        search: Option<String>,

        /// Sort by id, title, status, priority or due; prefix with - for descending
        #[arg(long, allow_hyphen_values = true)]
        sort: Option<TaskSort>,

        /// Drop all remembered filters
        #[arg(long)]
        clear: bool,
    },
    /// Add a task to the current project
    Add {
        title: String,

        #[arg(short, long)]
        project: Option<i64>,

        #[arg(short, long)]
        description: Option<String>,

        #[arg(long)]
        status: Option<TaskStatus>,

        #[arg(long)]
        priority: Option<TaskPriority>,

        #[arg(long)]
        label: Option<TaskLabel>,

        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<String>,
    },
    /// Change a task
    Edit {
        id: i64,

        #[arg(short, long)]
        title: Option<String>,

        #[arg(short, long)]
        description: Option<String>,

        #[arg(long)]
        status: Option<TaskStatus>,

        #[arg(long)]
        priority: Option<TaskPriority>,

        #[arg(long)]
        label: Option<TaskLabel>,

        #[arg(long)]
        due: Option<String>,
    },
    /// Set a task's status
    Status { id: i64, status: TaskStatus },
    /// Delete a task
    Rm {
        id: i64,

        #[arg(short, long)]
        yes: bool,
    },
}

pub async fn run(ctx: &AppContext, state: &mut ViewState, command: TaskCommands) -> Result<()> {
    match command {
        TaskCommands::List {
            project,
            status,
            priority,
            label,
            search,
            sort,
            clear,
        } => {
            let (mut nav, _, current) = current_project(ctx, state, project).await?;
            let Some(project) = current else {
                println!("{}", "No projects yet. Create one with `cozy projects add <name>`".dimmed());
                return Ok(());
            };

            let location = nav.location();
            let mut filter = if clear { TaskFilter::default() } else { TaskFilter::from_location(&location) };
            if let Some(search) = search {
                let search = search.trim();
                filter.search = (!search.is_empty()).then(|| search.to_string());
            }
            if !status.is_empty() {
                filter.statuses = status.into_iter().collect::<BTreeSet<_>>();
            }
            if !priority.is_empty() {
                filter.priorities = priority.into_iter().collect();
            }
            if !label.is_empty() {
                filter.labels = label.into_iter().collect();
            }
            let sort = match sort {
                Some(sort) => sort,
                None if clear => TaskSort::default(),
                None => TaskSort::from_location(&location)?,
            };

            // Filters rewrite the current entry rather than adding history.
            let target = sort.write_to(filter.write_to(location.clone()));
            if target != location {
                nav.replace(target);
            }
            state.store(View::Tasks, &nav);

            let tasks = with_spinner("Loading tasks", ctx.tasks(project.id)).await?;
            let rows = visible_tasks(&tasks, &filter, &sort);

            println!(
                "{} {}",
                project.name.bold(),
                format!("({} of {} tasks)", rows.len(), tasks.len()).dimmed()
            );
            if !filter.is_empty() || sort != TaskSort::default() {
                println!("{}", nav.location().to_string().dimmed());
            }
            for task in rows {
                println!("  {}", task.render());
            }
            Ok(())
        }
        TaskCommands::Add {
            title,
            project,
            description,
            status,
            priority,
            label,
            due,
        } => {
            let (_, _, current) = current_project(ctx, state, project).await?;
            let project = require_project(current)?;

            let mut task = NewTask::new(title);
            task.description = description;
            task.label = label;
            if let Some(status) = status {
                task.status = status;
            }
            if let Some(priority) = priority {
                task.priority = priority;
            }
            task.due_date = due.as_deref().map(parse_datetime).transpose()?;

            let task = ctx.create_task(project.id, &task).await.reported()?;
            println!("  {}", task.render());
            Ok(())
        }
        TaskCommands::Edit {
            id,
            title,
            description,
            status,
            priority,
            label,
            due,
        } => {
            let patch = TaskPatch {
                title,
                description,
                status,
                priority,
                label,
                due_date: due.as_deref().map(parse_datetime).transpose()?,
                ..Default::default()
            };
            if patch.is_empty() {
                bail!("Nothing to update. Pass at least one of --title, --description, --status, --priority, --label, --due");
            }

            let task = ctx.update_task(id, &patch).await.reported()?;
            println!("  {}", task.render());
            Ok(())
        }
        TaskCommands::Status { id, status } => {
            let task = ctx.task(id).await?;
            ctx.update_task_status(task.project_id, id, status)
                .await
                .reported()
        }
        TaskCommands::Rm { id, yes } => {
            let task = ctx.task(id).await?;
            if !confirm(format!("Delete task '{}'?", task.title), yes)? {
                return Ok(());
            }
            ctx.delete_task(task.project_id, id).await.reported()
        }
    }
}

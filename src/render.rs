//! Terminal rendering for cozy types.
//!
//! Extension traits that add colored output to cozy-core types using owo_colors.

use chrono::{DateTime, Local, Utc};
use cozy_core::model::{Calendar, Event, Project, Task, TaskPriority, TaskStatus};
use owo_colors::OwoColorize;

pub trait Render {
    fn render(&self) -> String;
}

impl Render for TaskStatus {
    fn render(&self) -> String {
        let label = format!("{:<11}", self.as_str());
        match self {
            TaskStatus::Backlog | TaskStatus::Canceled => label.dimmed().to_string(),
            TaskStatus::Todo => label,
            TaskStatus::InProgress => label.yellow().to_string(),
            TaskStatus::Done => label.green().to_string(),
        }
    }
}

impl Render for TaskPriority {
    fn render(&self) -> String {
        let label = format!("{:<6}", self.as_str());
        match self {
            TaskPriority::Low => label.dimmed().to_string(),
            TaskPriority::Medium => label.yellow().to_string(),
            TaskPriority::High => label.red().to_string(),
        }
    }
}

impl Render for Task {
    fn render(&self) -> String {
        let id = format!("#{:<4}", self.id);
        let label = self
            .label
            .map(|l| format!(" [{l}]").cyan().to_string())
            .unwrap_or_default();
        let due = self
            .due_date
            .map(|d| format!("  due {}", d.with_timezone(&Local).format("%b %-d")).dimmed().to_string())
            .unwrap_or_default();

        format!(
            "{} {} {} {}{}{}",
            id.dimmed(),
            self.status.render(),
            self.priority.render(),
            self.title,
            label,
            due
        )
    }
}

impl Render for Project {
    fn render(&self) -> String {
        match &self.description {
            Some(desc) => format!("{} {}  {}", format!("#{:<4}", self.id).dimmed(), self.name, desc.dimmed()),
            None => format!("{} {}", format!("#{:<4}", self.id).dimmed(), self.name),
        }
    }
}

/// `#RRGGBB` as an RGB triple.
fn hex_rgb(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = hex.trim().strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}

pub fn swatch(color: Option<&str>) -> String {
    match color.and_then(hex_rgb) {
        Some((r, g, b)) => "●".truecolor(r, g, b).to_string(),
        None => "●".dimmed().to_string(),
    }
}

impl Render for Calendar {
    fn render(&self) -> String {
        format!(
            "{} {} {}",
            format!("#{:<4}", self.id).dimmed(),
            swatch(self.color.as_deref()),
            self.name
        )
    }
}

fn local_time(dt: &DateTime<Utc>) -> String {
    dt.with_timezone(&Local).format("%H:%M").to_string()
}

impl Render for Event {
    fn render(&self) -> String {
        let time = format!("{}-{}", local_time(&self.start_time), local_time(&self.end_time));
        let location = self
            .location
            .as_deref()
            .map(|l| format!(" @ {l}").dimmed().to_string())
            .unwrap_or_default();

        format!(
            "  {} {} {}{} {}",
            swatch(self.color.as_deref()),
            time,
            self.title,
            location,
            format!("#{}", self.id).dimmed()
        )
    }
}

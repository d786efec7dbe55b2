//! Daily task commands.
//!
//! - `growth task add <title>` - Add a task (today unless `--date`)
//! - `growth task list` - Today's tasks, incomplete first
//! - `growth task toggle <id>` - Flip done/not done
//! - `growth task update <id>` - Edit title or feedback
//! - `growth task delete <id>` - Delete a task

use super::{format_day, open_coordinator, parse_date};
use crate::cli::TaskCommands;
use crate::coordinator::Coordinator;
use crate::error::{Error, Result};
use crate::model::{DayWindow, Task};
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Serialize)]
struct TaskOutput {
    id: i64,
    title: String,
    is_completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    ai_feedback: Option<String>,
    date: String,
}

impl From<Task> for TaskOutput {
    fn from(t: Task) -> Self {
        Self {
            id: t.id,
            title: t.title,
            is_completed: t.is_completed,
            ai_feedback: t.ai_feedback,
            date: format_day(t.date),
        }
    }
}

#[derive(Serialize)]
struct TaskListOutput {
    tasks: Vec<TaskOutput>,
    count: usize,
    completed: usize,
}

/// Execute a task command.
///
/// # Errors
///
/// Returns `NotInitialized` when there is no database, `TaskNotFound` for an
/// unknown ID, a validation error, or a database error.
pub fn execute(
    command: &TaskCommands,
    db_path: Option<&PathBuf>,
    actor: Option<&str>,
    json_output: bool,
) -> Result<()> {
    let coord = open_coordinator(db_path, actor)?;

    match command {
        TaskCommands::Add { title, date } => execute_add(&coord, title, date.as_deref(), json_output),
        TaskCommands::List { date, all } => execute_list(&coord, date.as_deref(), *all, json_output),
        TaskCommands::Toggle { id } => execute_toggle(&coord, *id, json_output),
        TaskCommands::Update { id, title, feedback } => {
            execute_update(&coord, *id, title.as_deref(), feedback.as_deref(), json_output)
        }
        TaskCommands::Delete { id } => execute_delete(&coord, *id, json_output),
    }
}

fn require_task(coord: &Coordinator, id: i64) -> Result<Task> {
    coord
        .read(|s| s.get_task(id))?
        .ok_or(Error::TaskNotFound { id })
}

fn execute_add(coord: &Coordinator, title: &str, date: Option<&str>, json_output: bool) -> Result<()> {
    let id = match date {
        None => coord.add_task(title)?,
        Some(raw) => {
            let window = DayWindow::for_date(parse_date(raw)?);
            // Today's tasks keep the creation time as their date
            let task = if window == DayWindow::today() {
                Task::new(title)
            } else {
                Task::new(title).with_date(window.start)
            };
            coord.add_dated_task(&task)?
        }
    };
    let task = require_task(coord, id)?;

    if crate::is_silent() {
        println!("{id}");
    } else if json_output {
        println!("{}", serde_json::to_string_pretty(&TaskOutput::from(task))?);
    } else {
        println!("Added mission: {}", task.title);
        println!("  ID:   {}", task.id);
        println!("  Date: {}", format_day(task.date));
    }

    Ok(())
}

fn execute_list(coord: &Coordinator, date: Option<&str>, all: bool, json_output: bool) -> Result<()> {
    let tasks = if all {
        coord.read(|s| s.list_all_tasks())?
    } else {
        let window = match date {
            Some(raw) => DayWindow::for_date(parse_date(raw)?),
            None => DayWindow::today(),
        };
        coord.read(|s| s.list_tasks_for_day(window))?
    };

    print_task_list(tasks, json_output)
}

/// Print tasks as CSV, JSON or a checklist.
pub(crate) fn print_task_list(tasks: Vec<Task>, json_output: bool) -> Result<()> {
    if crate::is_csv() {
        println!("id,date,title,completed");
        for task in &tasks {
            println!(
                "{},{},{},{}",
                task.id,
                format_day(task.date),
                crate::csv_escape(&task.title),
                task.is_completed
            );
        }
    } else if json_output {
        let output = TaskListOutput {
            count: tasks.len(),
            completed: tasks.iter().filter(|t| t.is_completed).count(),
            tasks: tasks.into_iter().map(TaskOutput::from).collect(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if tasks.is_empty() {
        println!("No missions. Ask the coach to get started: growth coach \"your goal\"");
    } else {
        for task in tasks {
            let check = if task.is_completed { "[x]".green() } else { "[ ]".normal() };
            let title = if task.is_completed {
                task.title.dimmed().strikethrough()
            } else {
                task.title.normal()
            };
            println!("  {check} {title} {}", format!("#{}", task.id).dimmed());
            if let Some(feedback) = &task.ai_feedback {
                println!("      {}", feedback.italic());
            }
        }
    }

    Ok(())
}

fn execute_toggle(coord: &Coordinator, id: i64, json_output: bool) -> Result<()> {
    let task = require_task(coord, id)?;
    let task = coord.toggle_task(&task)?.ok_or(Error::TaskNotFound { id })?;

    if crate::is_silent() {
        println!("{id}");
    } else if json_output {
        println!("{}", serde_json::to_string_pretty(&TaskOutput::from(task))?);
    } else if task.is_completed {
        println!("{} Done: {}", "✓".green(), task.title);
    } else {
        println!("Reopened: {}", task.title);
    }

    Ok(())
}

fn execute_update(
    coord: &Coordinator,
    id: i64,
    title: Option<&str>,
    feedback: Option<&str>,
    json_output: bool,
) -> Result<()> {
    let mut task = require_task(coord, id)?;
    if let Some(title) = title {
        task.title = title.to_string();
    }
    if let Some(feedback) = feedback {
        task.ai_feedback = Some(feedback.to_string());
    }

    if !coord.update_task(&task)? {
        return Err(Error::TaskNotFound { id });
    }
    let updated = require_task(coord, id)?;

    if crate::is_silent() {
        println!("{id}");
    } else if json_output {
        println!("{}", serde_json::to_string_pretty(&TaskOutput::from(updated))?);
    } else {
        println!("Updated mission: {}", updated.title);
    }

    Ok(())
}

fn execute_delete(coord: &Coordinator, id: i64, json_output: bool) -> Result<()> {
    let task = require_task(coord, id)?;
    let deleted = coord.delete_task(&task)?;

    if crate::is_silent() {
        println!("{id}");
    } else if json_output {
        println!("{}", serde_json::json!({ "id": id, "deleted": deleted }));
    } else {
        println!("Deleted mission: {}", task.title);
    }

    Ok(())
}

//! `growth today` - the dashboard.
//!
//! Shows how many 5-year visions are on file and lists today's missions,
//! incomplete first.

use super::{format_day, open_coordinator};
use crate::error::Result;
use crate::model::DayWindow;
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Serialize)]
struct TodayOutput {
    date: String,
    five_year_plans: usize,
    tasks: Vec<TodayTask>,
    completed: usize,
    count: usize,
}

#[derive(Serialize)]
struct TodayTask {
    id: i64,
    title: String,
    is_completed: bool,
}

/// Execute the dashboard command.
///
/// # Errors
///
/// Returns `NotInitialized` when there is no database.
pub fn execute(db_path: Option<&PathBuf>, actor: Option<&str>, json_output: bool) -> Result<()> {
    let coord = open_coordinator(db_path, actor)?;

    let mut visions = coord.five_year_plans();
    let mut missions = coord.today_tasks();
    visions.try_next();
    missions.try_next();

    let visions = visions.current();
    let tasks = missions.current();
    let done = tasks.iter().filter(|t| t.is_completed).count();
    let date = format_day(DayWindow::today().start);

    if crate::is_csv() {
        return super::task::print_task_list(tasks.clone(), false);
    }

    if json_output {
        let output = TodayOutput {
            date,
            five_year_plans: visions.len(),
            completed: done,
            count: tasks.len(),
            tasks: tasks
                .iter()
                .map(|t| TodayTask {
                    id: t.id,
                    title: t.title.clone(),
                    is_completed: t.is_completed,
                })
                .collect(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("{}", "GROWTH HUB".bold());
    println!();
    println!(
        "  5-Year Vision: {}",
        format!("{} ACTIVE", visions.len()).cyan().bold()
    );
    println!();
    println!("{} {}", "TODAY'S MISSIONS".yellow().bold(), format!("({date}, {done}/{})", tasks.len()).dimmed());
    super::task::print_task_list(tasks.clone(), false)
}

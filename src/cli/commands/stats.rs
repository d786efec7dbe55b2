//! `growth stats` - completion counts per rank and for tasks.

use super::open_coordinator;
use crate::error::Result;
use crate::model::{PlanType, Stats};
use crate::validate::parse_plan_type;
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

const BAR_WIDTH: usize = 20;

#[derive(Serialize)]
struct StatsRow {
    name: &'static str,
    completed: u64,
    total: u64,
    remaining: u64,
    percent: u8,
}

impl StatsRow {
    fn new(name: &'static str, stats: Stats) -> Self {
        Self {
            name,
            completed: stats.completed,
            total: stats.total,
            remaining: stats.remaining(),
            percent: stats.percent(),
        }
    }
}

#[derive(Serialize)]
struct StatsOutput {
    plans: Vec<StatsRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tasks: Option<StatsRow>,
}

/// Execute the stats command.
///
/// # Errors
///
/// Returns `NotInitialized` when there is no database, or `InvalidArgument`
/// for an unknown rank.
pub fn execute(
    plan_type: Option<&str>,
    db_path: Option<&PathBuf>,
    actor: Option<&str>,
    json_output: bool,
) -> Result<()> {
    let coord = open_coordinator(db_path, actor)?;

    let output = match plan_type {
        Some(raw) => {
            let plan_type = parse_plan_type(raw)?;
            let mut live = coord.plan_stats(plan_type);
            live.try_next();
            StatsOutput {
                plans: vec![StatsRow::new(plan_type.as_str(), *live.current())],
                tasks: None,
            }
        }
        None => {
            let mut tasks = coord.task_stats();
            tasks.try_next();
            let plans = coord
                .read(|s| s.all_plan_stats())?
                .into_iter()
                .map(|(t, stats)| StatsRow::new(t.as_str(), stats))
                .collect();
            StatsOutput {
                plans,
                tasks: Some(StatsRow::new("TASKS", *tasks.current())),
            }
        }
    };

    if crate::is_csv() {
        println!("name,completed,total,remaining,percent");
        for row in output.plans.iter().chain(output.tasks.iter()) {
            println!(
                "{},{},{},{},{}",
                row.name, row.completed, row.total, row.remaining, row.percent
            );
        }
    } else if json_output {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", "DATA CENTER".bold());
        println!();
        for row in &output.plans {
            let label = PlanType::parse(row.name).map_or(row.name, |t| t.label());
            print_row(label, row);
        }
        if let Some(tasks) = &output.tasks {
            println!();
            print_row("Daily missions", tasks);
        }
    }

    Ok(())
}

fn print_row(label: &str, row: &StatsRow) {
    println!(
        "  {label:<18} {} {:>3}% {}",
        bar(row.percent).green(),
        row.percent,
        format!("({}/{}, {} left)", row.completed, row.total, row.remaining).dimmed()
    );
}

fn bar(percent: u8) -> String {
    let filled = usize::from(percent) * BAR_WIDTH / 100;
    format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bar_bounds() {
        assert_eq!(bar(0).chars().filter(|c| *c == '█').count(), 0);
        assert_eq!(bar(100).chars().filter(|c| *c == '█').count(), BAR_WIDTH);
        assert_eq!(bar(50).chars().count(), BAR_WIDTH);
    }
}

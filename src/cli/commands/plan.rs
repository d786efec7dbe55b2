//! Plan management commands.
//!
//! Commands for managing the goal tree:
//! - `growth plan create <title> --type <rank>` - Create a plan
//! - `growth plan list` - List plans
//! - `growth plan children <id>` - List a plan's children
//! - `growth plan show <id>` - Show plan details
//! - `growth plan tree` - Show the full goal tree
//! - `growth plan orphans` - List plans cut off from the tree
//! - `growth plan update <id>` - Update a plan
//! - `growth plan complete <id>` - Mark a plan complete
//! - `growth plan delete <id>` - Delete a plan
//! - `growth plan history <id>` - Show the audit trail

use super::{format_timestamp, open_coordinator};
use crate::cli::{PlanCommands, PlanCreateArgs, PlanUpdateArgs};
use crate::coordinator::Coordinator;
use crate::error::{Error, Result};
use crate::model::{Plan, PlanNode};
use crate::storage::Event;
use crate::validate::parse_plan_type;
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Serialize)]
struct PlanOutput {
    id: i64,
    title: String,
    description: String,
    #[serde(rename = "type")]
    plan_type: &'static str,
    parent_id: Option<i64>,
    is_completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    ai_coaching_tip: Option<String>,
    created_at: String,
}

impl From<Plan> for PlanOutput {
    fn from(p: Plan) -> Self {
        Self {
            id: p.id,
            title: p.title,
            description: p.description,
            plan_type: p.plan_type.as_str(),
            parent_id: p.parent_id,
            is_completed: p.is_completed,
            ai_coaching_tip: p.ai_coaching_tip,
            created_at: format_timestamp(p.created_at),
        }
    }
}

#[derive(Serialize)]
struct PlanListOutput {
    plans: Vec<PlanOutput>,
    count: usize,
}

impl PlanListOutput {
    fn new(plans: Vec<Plan>) -> Self {
        Self {
            count: plans.len(),
            plans: plans.into_iter().map(PlanOutput::from).collect(),
        }
    }
}

#[derive(Serialize)]
struct DeleteOutput {
    id: i64,
    deleted: bool,
    orphaned_children: usize,
}

#[derive(Serialize)]
struct HistoryOutput {
    plan_id: i64,
    events: Vec<Event>,
    count: usize,
}

/// Execute a plan command.
///
/// # Errors
///
/// Returns `NotInitialized` when there is no database, `PlanNotFound` for an
/// unknown ID, a validation error, or a database error.
pub fn execute(
    command: &PlanCommands,
    db_path: Option<&PathBuf>,
    actor: Option<&str>,
    json_output: bool,
) -> Result<()> {
    let coord = open_coordinator(db_path, actor)?;

    match command {
        PlanCommands::Create(args) => execute_create(&coord, args, json_output),
        PlanCommands::List { plan_type } => execute_list(&coord, plan_type.as_deref(), json_output),
        PlanCommands::Children { id } => execute_children(&coord, *id, json_output),
        PlanCommands::Show { id } => execute_show(&coord, *id, json_output),
        PlanCommands::Tree => execute_tree(&coord, json_output),
        PlanCommands::Orphans => execute_orphans(&coord, json_output),
        PlanCommands::Update(args) => execute_update(&coord, args, json_output),
        PlanCommands::Complete { id, undo } => execute_complete(&coord, *id, !*undo, json_output),
        PlanCommands::Delete { id } => execute_delete(&coord, *id, json_output),
        PlanCommands::History { id, limit } => execute_history(&coord, *id, *limit, json_output),
    }
}

fn require_plan(coord: &Coordinator, id: i64) -> Result<Plan> {
    coord
        .read(|s| s.get_plan(id))?
        .ok_or(Error::PlanNotFound { id })
}

fn status_icon(completed: bool) -> colored::ColoredString {
    if completed { "✓".green() } else { "○".normal() }
}

fn execute_create(coord: &Coordinator, args: &PlanCreateArgs, json_output: bool) -> Result<()> {
    let plan_type = parse_plan_type(&args.plan_type)?;

    let mut plan = Plan::new(args.title.as_str(), plan_type);
    if let Some(parent) = args.parent {
        plan = plan.with_parent(parent);
    }
    if let Some(ref description) = args.description {
        plan = plan.with_description(description);
    }
    if let Some(ref tip) = args.tip {
        plan = plan.with_coaching_tip(tip);
    }

    let id = coord.add_plan(&plan)?;
    let plan = require_plan(coord, id)?;

    if crate::is_silent() {
        println!("{id}");
        return Ok(());
    }

    if json_output {
        println!("{}", serde_json::to_string_pretty(&PlanOutput::from(plan))?);
    } else {
        println!("Created {} plan: {}", plan.plan_type.label(), plan.title);
        println!("  ID:     {}", plan.id);
        if let Some(parent) = plan.parent_id {
            println!("  Parent: {parent}");
        }
    }

    Ok(())
}

fn execute_list(coord: &Coordinator, plan_type: Option<&str>, json_output: bool) -> Result<()> {
    let plans = match plan_type {
        Some(raw) => {
            let plan_type = parse_plan_type(raw)?;
            coord.read(|s| s.list_plans_by_type(plan_type))?
        }
        None => coord.read(|s| s.list_all_plans())?,
    };

    print_plan_list(plans, json_output, "No plans found.\n\nCreate one with: growth plan create \"Vision\" --type five_year")
}

fn execute_children(coord: &Coordinator, id: i64, json_output: bool) -> Result<()> {
    let children = coord.read(|s| s.list_child_plans(id))?;
    print_plan_list(children, json_output, &format!("Plan {id} has no children."))
}

fn execute_orphans(coord: &Coordinator, json_output: bool) -> Result<()> {
    let orphans = coord.read(|s| s.list_orphan_plans())?;
    print_plan_list(orphans, json_output, "No orphaned plans.")
}

fn print_plan_list(plans: Vec<Plan>, json_output: bool, empty_message: &str) -> Result<()> {
    if crate::is_csv() {
        println!("id,type,title,parent_id,completed");
        for plan in &plans {
            println!(
                "{},{},{},{},{}",
                plan.id,
                plan.plan_type.as_str(),
                crate::csv_escape(&plan.title),
                plan.parent_id.map(|p| p.to_string()).unwrap_or_default(),
                plan.is_completed
            );
        }
    } else if json_output {
        println!("{}", serde_json::to_string_pretty(&PlanListOutput::new(plans))?);
    } else if plans.is_empty() {
        println!("{empty_message}");
    } else {
        println!("Plans ({}):\n", plans.len());
        for plan in plans {
            println!(
                "  {} {} {}",
                status_icon(plan.is_completed),
                plan.title.bold(),
                format!("[{}]", plan.plan_type.label()).dimmed()
            );
            match plan.parent_id {
                Some(parent) => println!("    ID: {}  Parent: {parent}", plan.id),
                None => println!("    ID: {}", plan.id),
            }
        }
    }

    Ok(())
}

fn execute_show(coord: &Coordinator, id: i64, json_output: bool) -> Result<()> {
    let plan = require_plan(coord, id)?;
    let children = coord.read(|s| s.list_child_plans(id))?;

    if json_output {
        let output = serde_json::json!({
            "plan": PlanOutput::from(plan),
            "children": children.into_iter().map(PlanOutput::from).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("Plan: {} {}", status_icon(plan.is_completed), plan.title.bold());
    println!("  ID:     {}", plan.id);
    println!("  Rank:   {}", plan.plan_type.label());
    if let Some(parent) = plan.parent_id {
        println!("  Parent: {parent}");
    }
    println!("  Created: {}", format_timestamp(plan.created_at));

    if !plan.description.is_empty() {
        println!();
        println!("Description:");
        for line in plan.description.lines() {
            println!("  {line}");
        }
    }

    if let Some(tip) = &plan.ai_coaching_tip {
        println!();
        println!("{}", "Coaching tip:".cyan().bold());
        println!("  {tip}");
    }

    if !children.is_empty() {
        println!();
        println!("Children ({}):", children.len());
        for child in children {
            println!("  {} {} ({})", status_icon(child.is_completed), child.title, child.id);
        }
    }

    Ok(())
}

fn execute_tree(coord: &Coordinator, json_output: bool) -> Result<()> {
    let forest = coord.read(|s| s.plan_tree())?;

    if json_output {
        let output = serde_json::json!({ "roots": forest, "count": forest.len() });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if forest.is_empty() {
        println!("No 5-year visions yet.");
    } else {
        for root in &forest {
            print_node(root, 0);
        }
    }

    Ok(())
}

fn print_node(node: &PlanNode, depth: usize) {
    let indent = "  ".repeat(depth);
    let stats = node.stats();
    println!(
        "{indent}{} {} {} {}",
        status_icon(node.plan.is_completed),
        node.plan.title.bold(),
        format!("[{} #{}]", node.plan.plan_type.label(), node.plan.id).dimmed(),
        format!("{}/{}", stats.completed, stats.total).dimmed()
    );
    for child in &node.children {
        print_node(child, depth + 1);
    }
}

fn execute_update(coord: &Coordinator, args: &PlanUpdateArgs, json_output: bool) -> Result<()> {
    let mut plan = require_plan(coord, args.id)?;

    if let Some(ref title) = args.title {
        plan.title.clone_from(title);
    }
    if let Some(ref description) = args.description {
        plan.description.clone_from(description);
    }
    if let Some(ref tip) = args.tip {
        plan.ai_coaching_tip = Some(tip.clone());
    }

    if !coord.update_plan(&plan)? {
        return Err(Error::PlanNotFound { id: args.id });
    }
    let updated = require_plan(coord, args.id)?;

    if crate::is_silent() {
        println!("{}", updated.id);
    } else if json_output {
        println!("{}", serde_json::to_string_pretty(&PlanOutput::from(updated))?);
    } else {
        println!("Updated plan: {}", updated.title);
        if args.description.is_some() {
            println!("  Description updated");
        }
        if args.tip.is_some() {
            println!("  Coaching tip updated");
        }
    }

    Ok(())
}

fn execute_complete(coord: &Coordinator, id: i64, completed: bool, json_output: bool) -> Result<()> {
    let plan = require_plan(coord, id)?;
    coord.set_plan_completed(&plan, completed)?;
    let updated = require_plan(coord, id)?;

    if crate::is_silent() {
        println!("{id}");
    } else if json_output {
        println!("{}", serde_json::to_string_pretty(&PlanOutput::from(updated))?);
    } else if completed {
        println!("{} Completed: {}", "✓".green(), updated.title);
    } else {
        println!("Reopened: {}", updated.title);
    }

    Ok(())
}

fn execute_delete(coord: &Coordinator, id: i64, json_output: bool) -> Result<()> {
    let plan = require_plan(coord, id)?;
    let deleted = coord.delete_plan(&plan)?;
    let orphaned = coord.read(|s| s.list_child_plans(id))?.len();

    if crate::is_silent() {
        println!("{id}");
    } else if json_output {
        let output = DeleteOutput {
            id,
            deleted,
            orphaned_children: orphaned,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("Deleted plan: {}", plan.title);
        if orphaned > 0 {
            println!(
                "  {} {orphaned} child plan(s) are now detached (see: growth plan orphans)",
                "warning:".yellow()
            );
        }
    }

    Ok(())
}

fn execute_history(coord: &Coordinator, id: i64, limit: u32, json_output: bool) -> Result<()> {
    let events = coord.read(|s| s.get_history("plan", id, Some(limit)))?;

    if json_output {
        let output = HistoryOutput {
            plan_id: id,
            count: events.len(),
            events,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if events.is_empty() {
        println!("No history for plan {id}.");
    } else {
        for event in events {
            let change = match (&event.old_value, &event.new_value) {
                (Some(old), Some(new)) => format!(" {old} → {new}"),
                (None, Some(new)) => format!(" {new}"),
                (Some(old), None) => format!(" {old}"),
                (None, None) => String::new(),
            };
            println!(
                "  {} {} by {}{change}",
                format_timestamp(event.created_at).dimmed(),
                event.event_type.as_str(),
                event.actor
            );
        }
    }

    Ok(())
}

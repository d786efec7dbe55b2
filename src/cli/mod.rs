//! CLI definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for list/query commands.
#[derive(ValueEnum, Clone, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table (default)
    #[default]
    Table,
    /// JSON (same as --json)
    Json,
    /// Comma-separated values
    Csv,
}

pub mod commands;

/// Growth plan tracker - five-rank goal tree, daily missions and progress stats
#[derive(Parser, Debug)]
#[command(name = "growth", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Database path (default: ~/.growthplan/data/growth.db)
    #[arg(long, global = true, env = "GROWTH_DB")]
    pub db: Option<PathBuf>,

    /// Actor name for audit trail
    #[arg(long, global = true, env = "GROWTH_ACTOR")]
    pub actor: Option<String>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Output format (table, json, csv)
    #[arg(long, value_enum, global = true, default_value_t)]
    pub format: OutputFormat,

    /// Output only the ID (for scripting)
    #[arg(long, global = true)]
    pub silent: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the database and apply the schema
    Init {
        /// Recreate an existing database file
        #[arg(long)]
        force: bool,
    },

    /// Print version information
    Version,

    /// Goal tree management (5-year → year → quarter → month → week)
    Plan {
        #[command(subcommand)]
        command: PlanCommands,
    },

    /// Daily missions
    Task {
        #[command(subcommand)]
        command: TaskCommands,
    },

    /// Dashboard: active visions and today's missions
    Today,

    /// Completion stats per rank and for tasks
    Stats {
        /// Only this rank (five_year, year, quarter, month, week)
        #[arg(short = 't', long = "type")]
        plan_type: Option<String>,
    },

    /// Ask the AI coach to critique a goal and break it into daily metrics
    Coach {
        /// The goal, in your own words
        #[arg(required = true, num_args = 1..)]
        goal: Vec<String>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completions.
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

// ============================================================================
// Plan Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum PlanCommands {
    /// Create a new plan
    Create(PlanCreateArgs),

    /// List plans (all ranks when no type is given)
    List {
        /// Only this rank (five_year, year, quarter, month, week)
        #[arg(short = 't', long = "type")]
        plan_type: Option<String>,
    },

    /// List the direct children of a plan
    Children {
        /// Parent plan ID
        id: i64,
    },

    /// Show plan details
    Show {
        /// Plan ID
        id: i64,
    },

    /// Show the goal tree under every 5-year vision
    Tree,

    /// List plans whose parent was deleted
    Orphans,

    /// Update a plan
    Update(PlanUpdateArgs),

    /// Mark a plan complete
    Complete {
        /// Plan ID
        id: i64,

        /// Reopen instead of completing
        #[arg(long)]
        undo: bool,
    },

    /// Delete a plan (children are kept)
    Delete {
        /// Plan ID
        id: i64,
    },

    /// Show the audit history of a plan
    History {
        /// Plan ID
        id: i64,

        /// Maximum events to return
        #[arg(short, long, default_value = "20")]
        limit: u32,
    },
}

#[derive(Args, Debug)]
pub struct PlanCreateArgs {
    /// Plan title
    pub title: String,

    /// Plan rank (five_year, year, quarter, month, week)
    #[arg(short = 't', long = "type")]
    pub plan_type: String,

    /// Parent plan ID (required for every rank below five_year)
    #[arg(short, long)]
    pub parent: Option<i64>,

    /// Longer description
    #[arg(short, long)]
    pub description: Option<String>,

    /// Coaching note to attach
    #[arg(long)]
    pub tip: Option<String>,
}

#[derive(Args, Debug)]
pub struct PlanUpdateArgs {
    /// Plan ID
    pub id: i64,

    /// New title
    #[arg(long)]
    pub title: Option<String>,

    /// New description
    #[arg(short, long)]
    pub description: Option<String>,

    /// Coaching tip to attach
    #[arg(long)]
    pub tip: Option<String>,
}

// ============================================================================
// Task Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// Add a task
    Add {
        /// Task title
        title: String,

        /// Day the task belongs to (YYYY-MM-DD, default today)
        #[arg(long)]
        date: Option<String>,
    },

    /// List tasks for one day (default today)
    List {
        /// Day to list (YYYY-MM-DD)
        #[arg(long, conflicts_with = "all")]
        date: Option<String>,

        /// List every task, newest first
        #[arg(long)]
        all: bool,
    },

    /// Flip a task between done and not done
    Toggle {
        /// Task ID
        id: i64,
    },

    /// Update a task
    Update {
        /// Task ID
        id: i64,

        /// New title
        #[arg(long)]
        title: Option<String>,

        /// Feedback note to attach
        #[arg(long)]
        feedback: Option<String>,
    },

    /// Delete a task
    Delete {
        /// Task ID
        id: i64,
    },
}

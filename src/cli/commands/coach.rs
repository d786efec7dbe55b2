//! `growth coach <goal…>` - ask the generative coach about a goal.
//!
//! The answer is printed as-is. It is never parsed or saved.

use crate::coach::{self, FALLBACK_RESPONSE};
use crate::error::{Error, Result};
use colored::Colorize;
use serde::Serialize;
use tracing::warn;

#[derive(Serialize)]
struct CoachOutput<'a> {
    goal: &'a str,
    response: &'a str,
    fallback: bool,
}

/// Execute the coach command.
///
/// A missing API key is reported as a configuration error. Request failures
/// print the fallback text and succeed.
///
/// # Errors
///
/// Returns `Error::Config` when no API key is configured, or an error if the
/// async runtime cannot start.
pub fn execute(goal: &[String], json: bool) -> Result<()> {
    let goal = goal.join(" ");
    let provider = coach::configured_provider()?;

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| Error::Other(format!("Failed to create async runtime: {e}")))?;

    if !json && !crate::is_silent() {
        println!("{}", "Thinking hard...".dimmed());
    }

    let response = rt.block_on(coach::advise(&provider, &goal));
    let fallback = response == FALLBACK_RESPONSE;
    if fallback {
        warn!("Coach unavailable, showing fallback text");
    }

    if json {
        let output = CoachOutput {
            goal: &goal,
            response: &response,
            fallback,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        if !crate::is_silent() {
            println!("{}", "AI GROWTH COACH".magenta().bold());
            println!();
        }
        println!("{response}");
    }

    Ok(())
}

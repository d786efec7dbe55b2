//! Coaching prompt template.

/// Text shown when the coach cannot answer.
pub const FALLBACK_RESPONSE: &str = "Brain short-circuited... try again in a moment.";

/// Build the strict-coach prompt for one user goal.
///
/// Asks for a single blunt critique line, then exactly three quantifiable
/// daily task metrics.
#[must_use]
pub fn coaching_prompt(goal: &str) -> String {
    format!(
        "You are a strict growth coach. The user says: {goal}. \
         Analyse this goal, give one line of sharp-tongued critique, \
         then break it down into exactly 3 quantifiable daily task metrics.",
        goal = goal.trim()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_trimmed_goal() {
        let prompt = coaching_prompt("  lose 3 pounds next month \n");
        assert!(prompt.contains("The user says: lose 3 pounds next month."));
        assert!(prompt.contains("exactly 3 quantifiable daily task metrics"));
    }
}

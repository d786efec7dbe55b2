//! Generative-text coach.
//!
//! Sends a goal to a hosted model and returns its critique and daily-metric
//! breakdown as display text. Responses are never parsed or persisted, and
//! any failure degrades to [`FALLBACK_RESPONSE`].
//!
//! # Configuration
//!
//! ```json
//! // ~/.growthplan/config.json
//! { "coach": { "api_key": "...", "model": "gemini-1.5-flash" } }
//! ```
//!
//! `GROWTH_COACH_API_KEY`, `GROWTH_COACH_MODEL` and `GROWTH_COACH_ENDPOINT`
//! override the file.

pub mod config;
pub mod gemini;
pub mod prompt;
pub mod provider;

pub use config::{CoachSettings, GrowthConfig, ResolvedCoach, load_config};
pub use gemini::GeminiCoach;
pub use prompt::{FALLBACK_RESPONSE, coaching_prompt};
pub use provider::CoachProvider;

use tracing::{debug, warn};

/// Ask the coach about one goal.
///
/// One request, no retry. Blank goals, failures and empty answers all yield
/// [`FALLBACK_RESPONSE`].
pub async fn advise<P: CoachProvider>(provider: &P, goal: &str) -> String {
    if goal.trim().is_empty() {
        return FALLBACK_RESPONSE.to_string();
    }

    let prompt = coaching_prompt(goal);
    debug!(provider = provider.name(), model = provider.model(), "Requesting coaching");

    match provider.generate(&prompt).await {
        Ok(text) if !text.trim().is_empty() => text,
        Ok(_) => {
            warn!(provider = provider.name(), "Coach returned an empty answer");
            FALLBACK_RESPONSE.to_string()
        }
        Err(e) => {
            warn!(provider = provider.name(), error = %e, "Coach request failed");
            FALLBACK_RESPONSE.to_string()
        }
    }
}

/// Build the configured provider from the settings file and environment.
///
/// # Errors
///
/// Returns `Error::Config` when no API key is configured, or an error from
/// reading the settings file.
pub fn configured_provider() -> crate::error::Result<GeminiCoach> {
    let config = load_config()?;
    let resolved = config::resolve(config.coach.as_ref())?;
    GeminiCoach::new(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use std::sync::Mutex;

    /// Canned provider that records the prompts it receives.
    struct FakeCoach {
        answer: Result<String>,
        prompts: Mutex<Vec<String>>,
    }

    impl FakeCoach {
        fn answering(answer: Result<String>) -> Self {
            Self {
                answer,
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    impl CoachProvider for FakeCoach {
        fn name(&self) -> &str {
            "fake"
        }

        fn model(&self) -> &str {
            "fake-1"
        }

        async fn generate(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            match &self.answer {
                Ok(text) => Ok(text.clone()),
                Err(e) => Err(Error::Coach(e.to_string())),
            }
        }
    }

    #[tokio::test]
    async fn test_advise_returns_text_as_is() {
        let coach = FakeCoach::answering(Ok("Lazy goal.\n1. 10k steps".into()));
        let text = advise(&coach, "lose 3 pounds").await;
        assert_eq!(text, "Lazy goal.\n1. 10k steps");

        let prompts = coach.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("lose 3 pounds"));
    }

    #[tokio::test]
    async fn test_advise_falls_back_on_failure() {
        let coach = FakeCoach::answering(Err(Error::Coach("503".into())));
        assert_eq!(advise(&coach, "run a marathon").await, FALLBACK_RESPONSE);
        assert_eq!(coach.calls(), 1);
    }

    #[tokio::test]
    async fn test_advise_falls_back_on_empty_answer() {
        let coach = FakeCoach::answering(Ok("   ".into()));
        assert_eq!(advise(&coach, "read more").await, FALLBACK_RESPONSE);
    }

    #[tokio::test]
    async fn test_blank_goal_skips_request() {
        let coach = FakeCoach::answering(Ok("never".into()));
        assert_eq!(advise(&coach, "  ").await, FALLBACK_RESPONSE);
        assert_eq!(coach.calls(), 0);
    }
}

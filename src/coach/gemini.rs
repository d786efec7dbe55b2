//! Gemini coach provider.
//!
//! Talks to the hosted `generateContent` endpoint with a single text part.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

use super::config::ResolvedCoach;
use super::provider::CoachProvider;

/// Gemini generative-text provider.
pub struct GeminiCoach {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl GeminiCoach {
    /// Create a provider from resolved settings.
    ///
    /// # Errors
    ///
    /// Returns `Error::Coach` if the HTTP client cannot be built.
    pub fn new(settings: ResolvedCoach) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| Error::Coach(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: settings.endpoint,
            model: settings.model,
            api_key: settings.api_key,
        })
    }

    fn url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.endpoint, self.model
        )
    }
}

/// Request body for `generateContent`.
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

impl<'a> GenerateRequest<'a> {
    fn single(text: &'a str) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![RequestPart { text }],
            }],
        }
    }
}

/// Response body for `generateContent`.
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate, if any.
    fn text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
        (!text.trim().is_empty()).then_some(text)
    }
}

impl CoachProvider for GeminiCoach {
    fn name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let response = self
            .client
            .post(self.url())
            .query(&[("key", self.api_key.as_str())])
            .json(&GenerateRequest::single(prompt))
            .send()
            .await
            .map_err(|e| Error::Coach(format!("Gemini request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error = response.text().await.unwrap_or_default();
            return Err(Error::Coach(format!("Gemini returned {status}: {error}")));
        }

        let data: GenerateResponse = response
            .json()
            .await
            .map_err(|e| Error::Coach(format!("Failed to parse Gemini response: {e}")))?;

        data.text()
            .ok_or_else(|| Error::Coach("Gemini returned no text".into()))
    }
}

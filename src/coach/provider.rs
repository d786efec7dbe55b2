//! Coach provider trait.
//!
//! Defines the interface that generative-text backends implement.
//! Uses async methods for HTTP-based providers.

use crate::error::Result;

/// Trait for generative-text coach providers.
///
/// A provider takes one free-text prompt and answers with free text. The
/// answer is opaque display text: nothing parses or stores it.
pub trait CoachProvider: Send + Sync {
    /// Short provider name for logs.
    fn name(&self) -> &str;

    /// Model identifier the provider talks to.
    fn model(&self) -> &str;

    /// Send one prompt, return the generated text.
    fn generate(&self, prompt: &str) -> impl std::future::Future<Output = Result<String>> + Send;
}

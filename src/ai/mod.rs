//! AI-powered spending advice.
//!
//! Provider: Gemini (Google). The advisor pipeline aggregates a user's
//! finances into a snapshot, renders it into a prompt and asks the provider
//! for a short piece of advice.

pub mod advisor;
pub mod gemini;
pub mod prompts;
pub mod snapshot;
pub mod types;

pub use advisor::{Advisor, AdvisorError, AdvisorOptions};
pub use gemini::{GeminiClient, GeminiSettings};
pub use snapshot::{aggregate, ExpenseLabels, FinancialSnapshot, LabelSource};
pub use types::*;

use async_trait::async_trait;

/// Single-shot text completion.
///
/// Implementations are configured once (model, temperature, credential) and
/// shared across requests.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Model identifier, for logging.
    fn model(&self) -> &str;

    async fn generate(&self, prompt: &str) -> Result<String, AiError>;
}

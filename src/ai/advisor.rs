//! Advisor pipeline: load data, aggregate, render, generate.

use crate::ai::prompts::{build_advice_prompt, DEFAULT_MAX_LABELS};
use crate::ai::snapshot::{aggregate, ExpenseLabels, LabelSource};
use crate::ai::{AiError, TextGenerator};
use crate::db::{FinanceStore, StoreError};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Failure of one advisor request, tagged by origin.
#[derive(Debug, Error)]
pub enum AdvisorError {
    #[error("failed to load financial data: {0}")]
    DataAccess(#[from] StoreError),
    #[error("advice generation failed: {0}")]
    Generation(#[from] AiError),
}

impl AdvisorError {
    /// Machine-readable origin used in API error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DataAccess(_) => "data_unavailable",
            Self::Generation(_) => "generation_failed",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AdvisorOptions {
    pub label_source: LabelSource,
    pub max_labels: usize,
}

impl Default for AdvisorOptions {
    fn default() -> Self {
        Self {
            label_source: LabelSource::Description,
            max_labels: DEFAULT_MAX_LABELS,
        }
    }
}

/// Turns a user's stored finances into short advice text.
///
/// Holds no per-request state, so one instance serves all requests.
pub struct Advisor {
    store: Arc<dyn FinanceStore>,
    generator: Arc<dyn TextGenerator>,
    options: AdvisorOptions,
}

impl Advisor {
    pub fn new(
        store: Arc<dyn FinanceStore>,
        generator: Arc<dyn TextGenerator>,
        options: AdvisorOptions,
    ) -> Self {
        Self {
            store,
            generator,
            options,
        }
    }

    /// Build the prompt for a user without calling the provider.
    pub fn prepare_prompt(&self, user_id: Uuid) -> Result<String, AdvisorError> {
        let transactions = self.store.list_transactions(user_id)?;
        let debts = self.store.list_debts(user_id)?;

        let labels = match self.options.label_source {
            LabelSource::Description => ExpenseLabels::Description,
            LabelSource::Category => {
                ExpenseLabels::from_categories(&self.store.list_categories(user_id)?)
            }
        };

        let snapshot = aggregate(&transactions, &debts, &labels);
        log::debug!(
            "Snapshot for {}: {} transactions, {} labels, {} debts",
            user_id,
            transactions.len(),
            snapshot.expense_by_label.len(),
            snapshot.debt_names.len()
        );

        Ok(build_advice_prompt(&snapshot, self.options.max_labels))
    }

    /// Run the full pipeline. Exactly one generation call per invocation;
    /// the provider's text is returned unmodified.
    pub async fn analyze(&self, user_id: Uuid) -> Result<String, AdvisorError> {
        let prompt = self.prepare_prompt(user_id)?;
        let advice = self.generator.generate(&prompt).await?;
        log::info!(
            "Generated advice for {} with {} ({} chars)",
            user_id,
            self.generator.model(),
            advice.len()
        );
        Ok(advice)
    }
}

//! Financial snapshot aggregation
//!
//! Reduces a user's transactions and debts to the handful of numbers the
//! advice prompt needs. Pure and deterministic: no I/O, no clock.

use crate::models::{Category, Debt, Transaction};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Bucket for expenses without a usable label
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Where expense labels come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LabelSource {
    /// Free-text transaction description
    #[default]
    Description,
    /// Name of the referenced category
    Category,
}

/// Resolves the grouping label of an expense transaction.
#[derive(Debug, Clone, Default)]
pub enum ExpenseLabels {
    #[default]
    Description,
    /// Category id -> category name
    Category(HashMap<i64, String>),
}

impl ExpenseLabels {
    pub fn from_categories(categories: &[Category]) -> Self {
        Self::Category(
            categories
                .iter()
                .map(|c| (c.id, c.name.clone()))
                .collect(),
        )
    }

    /// The label exactly as stored; only blank labels are bucketed.
    pub fn label_for(&self, txn: &Transaction) -> String {
        let label = match self {
            Self::Description => txn.description.as_deref(),
            Self::Category(names) => txn.category_id.and_then(|id| names.get(&id)).map(String::as_str),
        };

        match label {
            Some(label) if !label.trim().is_empty() => label.to_string(),
            _ => UNCATEGORIZED.to_string(),
        }
    }
}

/// Ephemeral per-request aggregate of a user's finances.
///
/// Sums are in cents, widened to `i128` so that adding any number of stored
/// `i64` amounts cannot overflow.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FinancialSnapshot {
    pub total_income: i128,
    pub total_expense: i128,
    /// `(income - expense) / income * 100`, or 0 without income
    pub savings_rate: f64,
    pub expense_by_label: BTreeMap<String, i128>,
    pub debt_names: Vec<String>,
    /// Transactions whose type is neither income nor expense
    pub ignored_transactions: usize,
}

impl FinancialSnapshot {
    pub fn has_debts(&self) -> bool {
        !self.debt_names.is_empty()
    }
}

/// Savings rate in percent. Zero income yields 0 instead of a division error.
pub fn savings_rate(total_income: i128, total_expense: i128) -> f64 {
    if total_income > 0 {
        (total_income - total_expense) as f64 / total_income as f64 * 100.0
    } else {
        0.0
    }
}

/// Build a snapshot from rows already scoped to a single user.
pub fn aggregate(
    transactions: &[Transaction],
    debts: &[Debt],
    labels: &ExpenseLabels,
) -> FinancialSnapshot {
    let mut snapshot = FinancialSnapshot::default();

    for txn in transactions {
        let amount = i128::from(txn.amount);
        if txn.is_income() {
            snapshot.total_income += amount;
        } else if txn.is_expense() {
            snapshot.total_expense += amount;
            *snapshot
                .expense_by_label
                .entry(labels.label_for(txn))
                .or_insert(0) += amount;
        } else {
            snapshot.ignored_transactions += 1;
        }
    }

    if snapshot.ignored_transactions > 0 {
        log::warn!(
            "Excluded {} transaction(s) with unrecognized type from the snapshot",
            snapshot.ignored_transactions
        );
    }

    snapshot.savings_rate = savings_rate(snapshot.total_income, snapshot.total_expense);
    snapshot.debt_names = debts.iter().map(|d| d.name.clone()).collect();
    snapshot
}

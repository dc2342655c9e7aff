//! AI prompt building functions
//!
//! Renders a [`FinancialSnapshot`] into the advice instruction sent to the
//! text generation provider.

use crate::ai::snapshot::FinancialSnapshot;
use crate::models::amounts;

/// Default number of expense labels listed before folding the rest
pub const DEFAULT_MAX_LABELS: usize = 10;

/// Word budget requested from the model
pub const ADVICE_WORD_LIMIT: u32 = 100;

/// Placeholder for empty lists
const NONE_MARKER: &str = "(none)";

fn money(cents: i128) -> String {
    let formatted = amounts::format(cents);
    match formatted.strip_prefix('-') {
        Some(abs) => format!("-${}", abs),
        None => format!("${}", formatted),
    }
}

/// Expense labels sorted by amount (descending, ties by label), capped at
/// `max_labels` entries. The remainder is folded into one "Other" line.
fn render_expenses(snapshot: &FinancialSnapshot, max_labels: usize) -> String {
    if snapshot.expense_by_label.is_empty() {
        return format!(" {}", NONE_MARKER);
    }

    let mut entries: Vec<(&String, &i128)> = snapshot.expense_by_label.iter().collect();
    entries.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

    let shown = entries.len().min(max_labels.max(1));
    let mut lines: Vec<String> = entries[..shown]
        .iter()
        .map(|(label, cents)| format!("    - {}: {}", label, money(**cents)))
        .collect();

    let rest = &entries[shown..];
    if !rest.is_empty() {
        let rest_total: i128 = rest.iter().map(|(_, cents)| **cents).sum();
        lines.push(format!(
            "    - Other ({} more labels): {}",
            rest.len(),
            money(rest_total)
        ));
    }

    format!("\n{}", lines.join("\n"))
}

/// Debt names, one bullet per line.
fn render_debts(snapshot: &FinancialSnapshot) -> String {
    if !snapshot.has_debts() {
        return format!(" {}", NONE_MARKER);
    }

    let lines: Vec<String> = snapshot
        .debt_names
        .iter()
        .map(|name| format!("    - {}", name))
        .collect();
    format!("\n{}", lines.join("\n"))
}

/// Build the advice prompt for a snapshot.
///
/// The debt task is only included when the user has debts; otherwise the
/// prompt says so explicitly.
pub fn build_advice_prompt(snapshot: &FinancialSnapshot, max_labels: usize) -> String {
    let debt_task = if snapshot.has_debts() {
        "3. Recommend a payoff strategy for their debts."
    } else {
        "3. They have no debts, so do not give a debt payoff recommendation."
    };

    format!(
        r#"You are a brutal but helpful financial planner. Analyze this user's monthly snapshot:

- Total Income: {income}
- Total Spent: {expense}
- Savings Rate: {rate:.1}%
- Top Expenses:{expenses}
- Debts:{debts}

Task:
1. Identify exactly 1 bad spending habit.
2. Give exactly 1 specific action to save money next week.
{debt_task}

Keep it short (under {words} words)."#,
        income = money(snapshot.total_income),
        expense = money(snapshot.total_expense),
        rate = snapshot.savings_rate,
        expenses = render_expenses(snapshot, max_labels),
        debts = render_debts(snapshot),
        debt_task = debt_task,
        words = ADVICE_WORD_LIMIT,
    )
}

//! Demo data for local development.
//!
//! Three months of salary, rent and utilities plus a spread of everyday
//! merchant spending and one credit card. Price variation is derived from the
//! row index, so seeding twice yields the same data.

use super::{Database, FinanceStore, StoreResult};
use crate::models::{amounts, DebtCreate, Transaction, EXPENSE, INCOME};
use chrono::{Duration, NaiveDate};
use std::collections::HashMap;
use uuid::Uuid;

pub const DEMO_EMAIL: &str = "demo@smartfinance.com";

const CATEGORY_NAMES: &[&str] = &[
    "Rent",
    "Groceries",
    "Dining Out",
    "Utilities",
    "Entertainment",
    "Transport",
    "Salary",
];

/// (merchant, average cost, category)
const MERCHANTS: &[(&str, f64, &str)] = &[
    ("Starbucks", 6.50, "Dining Out"),
    ("Chipotle", 14.20, "Dining Out"),
    ("Uber", 25.00, "Transport"),
    ("Netflix", 15.99, "Entertainment"),
    ("Kroger", 85.00, "Groceries"),
    ("Whole Foods", 120.00, "Groceries"),
    ("Shell Station", 45.00, "Transport"),
    ("Cinema AMC", 30.00, "Entertainment"),
];

const DAILY_EXPENSES: usize = 40;
const MONTHS: i64 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedSummary {
    pub user_id: Uuid,
    pub created_user: bool,
    pub transactions: usize,
    pub created_debt: bool,
}

/// Spread in [0.8, 1.2] for the i-th generated expense
fn price_factor(i: usize) -> f64 {
    let percent = 80 + (i * 37 + 11) % 41;
    percent as f64 / 100.0
}

pub fn seed_demo_data(db: &Database, today: NaiveDate) -> StoreResult<SeedSummary> {
    let (user, created_user) = match db.get_user_by_email(DEMO_EMAIL)? {
        Some(user) => (user, false),
        None => (db.create_user(DEMO_EMAIL)?, true),
    };

    let mut categories: HashMap<&str, i64> = HashMap::new();
    for name in CATEGORY_NAMES {
        categories.insert(*name, db.ensure_category(name, true)?);
    }

    let start = today - Duration::days(90);
    let mut rows = Vec::new();
    let mut push = |category: &str, cents: i64, description: &str, date: NaiveDate, kind: &str| {
        rows.push(Transaction {
            id: Uuid::new_v4(),
            user_id: user.id,
            category_id: categories.get(category).copied(),
            amount: cents,
            description: Some(description.to_string()),
            date,
            kind: kind.to_string(),
        });
    };

    for month in 0..MONTHS {
        let month_date = start + Duration::days(month * 30);
        push("Salary", 250_000, "Bi-weekly Paycheck", month_date, INCOME);
        push("Salary", 250_000, "Bi-weekly Paycheck", month_date + Duration::days(15), INCOME);
        push("Rent", 150_000, "Apartment Rent", month_date, EXPENSE);
        push("Utilities", 12_050, "Electric Bill", month_date + Duration::days(5), EXPENSE);
    }

    for i in 0..DAILY_EXPENSES {
        let (merchant, avg_cost, category) = MERCHANTS[(i * 5 + 3) % MERCHANTS.len()];
        let cents = amounts::from_decimal(avg_cost * price_factor(i));
        let date = start + Duration::days(((i * 53) % 91) as i64);
        push(category, cents, merchant, date, EXPENSE);
    }

    let removed = db.replace_transactions(user.id, &rows)?;
    if removed > 0 {
        log::info!("Replaced {} previous demo transactions", removed);
    }

    let created_debt = if db.list_debts(user.id)?.is_empty() {
        db.create_debt(
            user.id,
            &DebtCreate {
                name: "Chase Sapphire Reserve".to_string(),
                current_balance: 4500.00,
                apr: 22.99,
                min_payment: 150.00,
            },
        )?;
        true
    } else {
        false
    };

    Ok(SeedSummary {
        user_id: user.id,
        created_user,
        transactions: rows.len(),
        created_debt,
    })
}

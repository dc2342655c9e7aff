//! Domain types shared by the storage layer, the HTTP API and the advisor.
//!
//! Monetary values are fixed-point integers (cents). Conversion to and from
//! the decimal JSON representation happens only at the API edge.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Fixed-point scales (SINGLE SOURCE OF TRUTH)
// =============================================================================

/// Factor for converting amounts (stored in cents)
pub const AMOUNT_FACTOR: i64 = 100;

/// Factor for converting APR percentages (stored in hundredths of a percent)
pub const RATE_FACTOR: i64 = 100;

/// Largest storable amount magnitude in cents (99,999,999.99)
pub const MAX_AMOUNT_CENTS: i64 = 9_999_999_999;

/// Largest storable APR magnitude in hundredths of a percent (999.99%)
pub const MAX_RATE_HUNDREDTHS: i64 = 99_999;

/// Transaction type for money coming in
pub const INCOME: &str = "income";

/// Transaction type for money going out
pub const EXPENSE: &str = "expense";

/// Helper functions for amount conversions
pub mod amounts {
    use super::{AMOUNT_FACTOR, MAX_AMOUNT_CENTS};

    /// Convert from cents to decimal
    pub fn to_decimal(cents: i64) -> f64 {
        cents as f64 / AMOUNT_FACTOR as f64
    }

    /// Convert from decimal to cents
    pub fn from_decimal(amount: f64) -> i64 {
        (amount * AMOUNT_FACTOR as f64).round() as i64
    }

    /// Convert from decimal to cents, rejecting non-finite values and
    /// magnitudes above [`MAX_AMOUNT_CENTS`].
    pub fn checked_from_decimal(amount: f64) -> Option<i64> {
        if !amount.is_finite() {
            return None;
        }
        let cents = (amount * AMOUNT_FACTOR as f64).round();
        if cents.abs() > MAX_AMOUNT_CENTS as f64 {
            return None;
        }
        Some(cents as i64)
    }

    /// Render cents as a plain decimal string with two places, without going
    /// through floating point (e.g. `-1205` -> `"-12.05"`).
    pub fn format(cents: i128) -> String {
        let sign = if cents < 0 { "-" } else { "" };
        let abs = cents.unsigned_abs();
        let factor = AMOUNT_FACTOR as u128;
        format!("{}{}.{:02}", sign, abs / factor, abs % factor)
    }
}

/// Helper functions for APR conversions
pub mod rates {
    use super::{MAX_RATE_HUNDREDTHS, RATE_FACTOR};

    pub fn to_decimal(hundredths: i64) -> f64 {
        hundredths as f64 / RATE_FACTOR as f64
    }

    pub fn from_decimal(percent: f64) -> i64 {
        (percent * RATE_FACTOR as f64).round() as i64
    }

    pub fn checked_from_decimal(percent: f64) -> Option<i64> {
        if !percent.is_finite() {
            return None;
        }
        let hundredths = (percent * RATE_FACTOR as f64).round();
        if hundredths.abs() > MAX_RATE_HUNDREDTHS as f64 {
            return None;
        }
        Some(hundredths as i64)
    }
}

// =============================================================================
// Stored entities
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub user_id: Option<Uuid>,
    pub name: String,
    pub is_system: bool,
}

/// A recorded income or expense.
///
/// `kind` is kept as free text: rows with a type other than `income` or
/// `expense` can exist and must survive a round trip through storage.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub category_id: Option<i64>,
    /// Amount in cents
    pub amount: i64,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub kind: String,
}

impl Transaction {
    pub fn is_income(&self) -> bool {
        self.kind == INCOME
    }

    pub fn is_expense(&self) -> bool {
        self.kind == EXPENSE
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Debt {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    /// Outstanding balance in cents
    pub current_balance: i64,
    /// APR in hundredths of a percent (22.99% -> 2299)
    pub apr: i64,
    /// Minimum payment in cents
    pub min_payment: i64,
}

// =============================================================================
// API schemas
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct UserCreate {
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
        }
    }
}

/// Input data for recording a transaction
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionCreate {
    pub amount: f64,
    #[serde(default)]
    pub description: Option<String>,
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub category_id: Option<i64>,
}

/// Transaction data returned to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub amount: f64,
    pub description: Option<String>,
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub kind: String,
    pub category_id: Option<i64>,
}

impl From<Transaction> for TransactionResponse {
    fn from(txn: Transaction) -> Self {
        Self {
            id: txn.id,
            user_id: txn.user_id,
            amount: amounts::to_decimal(txn.amount),
            description: txn.description,
            date: txn.date,
            kind: txn.kind,
            category_id: txn.category_id,
        }
    }
}

/// Input data for recording a debt
#[derive(Debug, Clone, Deserialize)]
pub struct DebtCreate {
    pub name: String,
    pub current_balance: f64,
    pub apr: f64,
    #[serde(default)]
    pub min_payment: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub current_balance: f64,
    pub apr: f64,
    pub min_payment: f64,
}

impl From<Debt> for DebtResponse {
    fn from(debt: Debt) -> Self {
        Self {
            id: debt.id,
            user_id: debt.user_id,
            name: debt.name,
            current_balance: amounts::to_decimal(debt.current_balance),
            apr: rates::to_decimal(debt.apr),
            min_payment: amounts::to_decimal(debt.min_payment),
        }
    }
}

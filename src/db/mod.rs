//! SQLite storage for users, categories, transactions and debts.
//!
//! The [`Database`] handle is created once by the process entry point and
//! shared through application state. All amounts are stored as integer cents.

pub mod seed;

use crate::models::{
    amounts, rates, Category, Debt, DebtCreate, Transaction, TransactionCreate, User,
};
use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;
use uuid::Uuid;

/// Default page size for transaction listings
pub const DEFAULT_PAGE_LIMIT: u32 = 100;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("failed to lock database: {0}")]
    Lock(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0}")]
    Invalid(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Read side of the storage layer consumed by the advisor pipeline.
///
/// Implementations return rows already scoped to the given user.
pub trait FinanceStore: Send + Sync {
    fn list_transactions(&self, user_id: Uuid) -> StoreResult<Vec<Transaction>>;

    fn list_debts(&self, user_id: Uuid) -> StoreResult<Vec<Debt>>;

    /// System categories plus the ones owned by `user_id`.
    fn list_categories(&self, user_id: Uuid) -> StoreResult<Vec<Category>>;
}

pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a database file and ensure the schema exists.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path)?;

        // Enable WAL mode for better concurrent access
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn connection(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Lock(e.to_string()))
    }

    // =========================================================================
    // Users
    // =========================================================================

    pub fn create_user(&self, email: &str) -> StoreResult<User> {
        let conn = self.connection()?;

        let exists: Option<String> = conn
            .query_row("SELECT id FROM users WHERE email = ?1", [email], |row| row.get(0))
            .optional()?;
        if exists.is_some() {
            return Err(StoreError::Conflict("Email already registered".to_string()));
        }

        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            created_at: Utc::now(),
        };
        conn.execute(
            "INSERT INTO users (id, email, created_at) VALUES (?1, ?2, ?3)",
            params![user.id.to_string(), user.email, user.created_at],
        )?;
        Ok(user)
    }

    pub fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let conn = self.connection()?;
        conn.query_row(
            "SELECT id, email, created_at FROM users WHERE email = ?1",
            [email],
            user_from_row,
        )
        .optional()
        .map_err(StoreError::from)
    }

    pub fn get_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let conn = self.connection()?;
        conn.query_row(
            "SELECT id, email, created_at FROM users WHERE id = ?1",
            [id.to_string()],
            user_from_row,
        )
        .optional()
        .map_err(StoreError::from)
    }

    fn require_user(&self, id: Uuid) -> StoreResult<()> {
        match self.get_user(id)? {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound(format!("User {}", id))),
        }
    }

    // =========================================================================
    // Categories
    // =========================================================================

    /// Return the id of the system category `name`, creating it if needed.
    pub fn ensure_category(&self, name: &str, is_system: bool) -> StoreResult<i64> {
        let conn = self.connection()?;

        let existing: Option<i64> = conn
            .query_row(
                "SELECT id FROM categories WHERE name = ?1 AND user_id IS NULL",
                [name],
                |row| row.get(0),
            )
            .optional()?;
        if let Some(id) = existing {
            return Ok(id);
        }

        conn.execute(
            "INSERT INTO categories (user_id, name, is_system) VALUES (NULL, ?1, ?2)",
            params![name, is_system],
        )?;
        Ok(conn.last_insert_rowid())
    }

    // =========================================================================
    // Transactions
    // =========================================================================

    pub fn create_transaction(
        &self,
        user_id: Uuid,
        input: &TransactionCreate,
    ) -> StoreResult<Transaction> {
        let amount = checked_amount("amount", input.amount)?;
        self.require_user(user_id)?;
        let txn = Transaction {
            id: Uuid::new_v4(),
            user_id,
            category_id: input.category_id,
            amount,
            description: input.description.clone(),
            date: input.date,
            kind: input.kind.clone(),
        };
        self.insert_transaction(&txn)?;
        Ok(txn)
    }

    pub fn insert_transaction(&self, txn: &Transaction) -> StoreResult<()> {
        let conn = self.connection()?;
        insert_transaction_row(&conn, txn)?;
        Ok(())
    }

    /// Replace all transactions of a user in one SQLite transaction. On error
    /// nothing is changed. Returns the number of removed rows.
    pub fn replace_transactions(&self, user_id: Uuid, txns: &[Transaction]) -> StoreResult<usize> {
        let mut conn = self.connection()?;
        let tx = conn.transaction()?;

        let removed = tx.execute(
            "DELETE FROM transactions WHERE user_id = ?1",
            [user_id.to_string()],
        )?;
        for txn in txns {
            insert_transaction_row(&tx, txn)?;
        }

        tx.commit()?;
        Ok(removed)
    }

    /// Paginated transaction listing for one user.
    pub fn get_transactions(
        &self,
        user_id: Uuid,
        skip: u32,
        limit: u32,
    ) -> StoreResult<Vec<Transaction>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, user_id, category_id, amount, description, date, type
            FROM transactions
            WHERE user_id = ?1
            ORDER BY date, rowid
            LIMIT ?2 OFFSET ?3
            "#,
        )?;
        let rows = stmt.query_map(
            params![user_id.to_string(), limit, skip],
            transaction_from_row,
        )?;
        rows.collect::<Result<Vec<_>, _>>().map_err(StoreError::from)
    }

    // =========================================================================
    // Debts
    // =========================================================================

    pub fn create_debt(&self, user_id: Uuid, input: &DebtCreate) -> StoreResult<Debt> {
        let current_balance = checked_amount("current_balance", input.current_balance)?;
        let min_payment = checked_amount("min_payment", input.min_payment)?;
        let apr = rates::checked_from_decimal(input.apr)
            .ok_or_else(|| StoreError::Invalid(format!("apr {} is out of range", input.apr)))?;
        self.require_user(user_id)?;
        let debt = Debt {
            id: Uuid::new_v4(),
            user_id,
            name: input.name.clone(),
            current_balance,
            apr,
            min_payment,
        };

        let conn = self.connection()?;
        conn.execute(
            r#"
            INSERT INTO debts (id, user_id, name, current_balance, apr, min_payment)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                debt.id.to_string(),
                debt.user_id.to_string(),
                debt.name,
                debt.current_balance,
                debt.apr,
                debt.min_payment,
            ],
        )?;
        Ok(debt)
    }
}

impl FinanceStore for Database {
    fn list_transactions(&self, user_id: Uuid) -> StoreResult<Vec<Transaction>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, user_id, category_id, amount, description, date, type
            FROM transactions
            WHERE user_id = ?1
            ORDER BY date, rowid
            "#,
        )?;
        let rows = stmt.query_map([user_id.to_string()], transaction_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(StoreError::from)
    }

    fn list_debts(&self, user_id: Uuid) -> StoreResult<Vec<Debt>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, user_id, name, current_balance, apr, min_payment
            FROM debts
            WHERE user_id = ?1
            ORDER BY rowid
            "#,
        )?;
        let rows = stmt.query_map([user_id.to_string()], |row| {
            Ok(Debt {
                id: uuid_column(row, 0)?,
                user_id: uuid_column(row, 1)?,
                name: row.get(2)?,
                current_balance: row.get(3)?,
                apr: row.get(4)?,
                min_payment: row.get(5)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(StoreError::from)
    }

    fn list_categories(&self, user_id: Uuid) -> StoreResult<Vec<Category>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, user_id, name, is_system
            FROM categories
            WHERE user_id IS NULL OR user_id = ?1
            ORDER BY id
            "#,
        )?;
        let rows = stmt.query_map([user_id.to_string()], |row| {
            let owner: Option<String> = row.get(1)?;
            let owner = owner
                .map(|s| Uuid::parse_str(&s).map_err(|e| conversion_error(1, e)))
                .transpose()?;
            Ok(Category {
                id: row.get(0)?,
                user_id: owner,
                name: row.get(2)?,
                is_system: row.get(3)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(StoreError::from)
    }
}

fn init_schema(conn: &Connection) -> StoreResult<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            email TEXT UNIQUE NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS categories (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id TEXT,
            name TEXT NOT NULL,
            is_system INTEGER NOT NULL DEFAULT 0,
            FOREIGN KEY (user_id) REFERENCES users(id)
        );

        CREATE TABLE IF NOT EXISTS transactions (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            category_id INTEGER,
            amount INTEGER NOT NULL,
            description TEXT,
            date TEXT NOT NULL,
            type TEXT NOT NULL,
            FOREIGN KEY (user_id) REFERENCES users(id),
            FOREIGN KEY (category_id) REFERENCES categories(id)
        );
        CREATE INDEX IF NOT EXISTS idx_transactions_user ON transactions(user_id);

        CREATE TABLE IF NOT EXISTS debts (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            name TEXT NOT NULL,
            current_balance INTEGER NOT NULL,
            apr INTEGER NOT NULL,
            min_payment INTEGER NOT NULL DEFAULT 0,
            FOREIGN KEY (user_id) REFERENCES users(id)
        );
        CREATE INDEX IF NOT EXISTS idx_debts_user ON debts(user_id);
        "#,
    )?;
    Ok(())
}

fn checked_amount(field: &str, value: f64) -> StoreResult<i64> {
    amounts::checked_from_decimal(value)
        .ok_or_else(|| StoreError::Invalid(format!("{} {} is out of range", field, value)))
}

fn insert_transaction_row(conn: &Connection, txn: &Transaction) -> rusqlite::Result<()> {
    conn.execute(
        r#"
        INSERT INTO transactions (id, user_id, category_id, amount, description, date, type)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
        params![
            txn.id.to_string(),
            txn.user_id.to_string(),
            txn.category_id,
            txn.amount,
            txn.description,
            txn.date,
            txn.kind,
        ],
    )?;
    Ok(())
}

fn conversion_error(idx: usize, err: uuid::Error) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(err))
}

fn uuid_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(idx)?;
    Uuid::parse_str(&raw).map_err(|e| conversion_error(idx, e))
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: uuid_column(row, 0)?,
        email: row.get(1)?,
        created_at: row.get(2)?,
    })
}

fn transaction_from_row(row: &Row<'_>) -> rusqlite::Result<Transaction> {
    let date: NaiveDate = row.get(5)?;
    Ok(Transaction {
        id: uuid_column(row, 0)?,
        user_id: uuid_column(row, 1)?,
        category_id: row.get(2)?,
        amount: row.get(3)?,
        description: row.get(4)?,
        date,
        kind: row.get(6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expense(amount: f64, description: &str, day: u32) -> TransactionCreate {
        TransactionCreate {
            amount,
            description: Some(description.to_string()),
            date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            kind: "expense".to_string(),
            category_id: None,
        }
    }

    #[test]
    fn test_duplicate_email_is_conflict() {
        let db = Database::open_in_memory().unwrap();
        db.create_user("demo@smartfinance.com").unwrap();

        let err = db.create_user("demo@smartfinance.com").unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert_eq!(err.to_string(), "Email already registered");
    }

    #[test]
    fn test_user_lookup() {
        let db = Database::open_in_memory().unwrap();
        let user = db.create_user("a@example.com").unwrap();

        let by_email = db.get_user_by_email("a@example.com").unwrap().unwrap();
        assert_eq!(by_email.id, user.id);
        assert_eq!(db.get_user(user.id).unwrap().unwrap().email, "a@example.com");
        assert!(db.get_user_by_email("missing@example.com").unwrap().is_none());
    }

    #[test]
    fn test_transactions_are_scoped_and_stored_in_cents() {
        let db = Database::open_in_memory().unwrap();
        let alice = db.create_user("alice@example.com").unwrap();
        let bob = db.create_user("bob@example.com").unwrap();

        db.create_transaction(alice.id, &expense(6.5, "Starbucks", 2)).unwrap();
        db.create_transaction(alice.id, &expense(120.50, "Electric Bill", 1)).unwrap();
        db.create_transaction(bob.id, &expense(15.99, "Netflix", 1)).unwrap();

        let txns = db.list_transactions(alice.id).unwrap();
        assert_eq!(txns.len(), 2);
        // Ordered by date
        assert_eq!(txns[0].description.as_deref(), Some("Electric Bill"));
        assert_eq!(txns[0].amount, 12050);
        assert_eq!(txns[1].amount, 650);
        assert!(txns.iter().all(|t| t.user_id == alice.id));
    }

    #[test]
    fn test_unrecognized_type_is_preserved() {
        let db = Database::open_in_memory().unwrap();
        let user = db.create_user("x@example.com").unwrap();
        let mut input = expense(10.0, "Refund", 1);
        input.kind = "transfer".to_string();
        db.create_transaction(user.id, &input).unwrap();

        let txns = db.list_transactions(user.id).unwrap();
        assert_eq!(txns[0].kind, "transfer");
    }

    #[test]
    fn test_pagination() {
        let db = Database::open_in_memory().unwrap();
        let user = db.create_user("p@example.com").unwrap();
        for day in 1..=5 {
            db.create_transaction(user.id, &expense(day as f64, "Coffee", day)).unwrap();
        }

        let page = db.get_transactions(user.id, 1, 2).unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].amount, 200);
        assert_eq!(page[1].amount, 300);

        let all = db.get_transactions(user.id, 0, DEFAULT_PAGE_LIMIT).unwrap();
        assert_eq!(all.len(), 5);
    }

    #[test]
    fn test_replace_transactions() {
        let db = Database::open_in_memory().unwrap();
        let user = db.create_user("d@example.com").unwrap();
        db.create_transaction(user.id, &expense(1.0, "Coffee", 1)).unwrap();
        let kept = db.create_transaction(user.id, &expense(2.0, "Coffee", 2)).unwrap();

        let removed = db.replace_transactions(user.id, &[kept.clone()]).unwrap();
        assert_eq!(removed, 2);
        assert_eq!(db.list_transactions(user.id).unwrap(), vec![kept]);
    }

    #[test]
    fn test_failed_replace_keeps_previous_rows() {
        let db = Database::open_in_memory().unwrap();
        let user = db.create_user("r@example.com").unwrap();
        let original = db.create_transaction(user.id, &expense(5.0, "Kroger", 1)).unwrap();

        let good = Transaction {
            id: Uuid::new_v4(),
            ..original.clone()
        };
        // Unknown category violates the foreign key on the second insert
        let bad = Transaction {
            id: Uuid::new_v4(),
            category_id: Some(9999),
            ..original.clone()
        };

        assert!(db.replace_transactions(user.id, &[good, bad]).is_err());
        assert_eq!(db.list_transactions(user.id).unwrap(), vec![original]);
    }

    #[test]
    fn test_out_of_range_amounts_are_rejected() {
        let db = Database::open_in_memory().unwrap();
        let user = db.create_user("big@example.com").unwrap();

        for amount in [9.0e16, -1.0e9, f64::NAN, f64::INFINITY] {
            let err = db.create_transaction(user.id, &expense(amount, "Yacht", 1)).unwrap_err();
            assert!(matches!(err, StoreError::Invalid(_)), "{} accepted", amount);
        }
        assert!(db.list_transactions(user.id).unwrap().is_empty());

        let ok = db.create_transaction(user.id, &expense(99_999_999.99, "House", 1)).unwrap();
        assert_eq!(ok.amount, 9_999_999_999);

        let debt = |current_balance: f64, apr: f64, min_payment: f64| DebtCreate {
            name: "Card".to_string(),
            current_balance,
            apr,
            min_payment,
        };
        assert!(matches!(db.create_debt(user.id, &debt(1.0e12, 20.0, 0.0)), Err(StoreError::Invalid(_))));
        assert!(matches!(db.create_debt(user.id, &debt(100.0, 5000.0, 0.0)), Err(StoreError::Invalid(_))));
        assert!(matches!(db.create_debt(user.id, &debt(100.0, 20.0, f64::NAN)), Err(StoreError::Invalid(_))));
        assert!(db.list_debts(user.id).unwrap().is_empty());
    }

    #[test]
    fn test_debts_roundtrip() {
        let db = Database::open_in_memory().unwrap();
        let user = db.create_user("debt@example.com").unwrap();
        db.create_debt(
            user.id,
            &DebtCreate {
                name: "Chase Sapphire Reserve".to_string(),
                current_balance: 4500.0,
                apr: 22.99,
                min_payment: 150.0,
            },
        )
        .unwrap();

        let debts = db.list_debts(user.id).unwrap();
        assert_eq!(debts.len(), 1);
        assert_eq!(debts[0].current_balance, 450_000);
        assert_eq!(debts[0].apr, 2299);
        assert_eq!(debts[0].min_payment, 15_000);
    }

    #[test]
    fn test_ensure_category_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        let user = db.create_user("c@example.com").unwrap();
        let first = db.ensure_category("Groceries", true).unwrap();
        let second = db.ensure_category("Groceries", true).unwrap();
        assert_eq!(first, second);

        let categories = db.list_categories(user.id).unwrap();
        assert_eq!(categories.len(), 1);
        assert!(categories[0].is_system);
        assert_eq!(categories[0].user_id, None);
    }

    #[test]
    fn test_open_file_database_keeps_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("finance.db");

        let id = {
            let db = Database::open(&path).unwrap();
            db.create_user("persist@example.com").unwrap().id
        };

        let db = Database::open(&path).unwrap();
        assert!(db.get_user(id).unwrap().is_some());
    }
}

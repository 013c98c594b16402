use std::str::FromStr;

use chrono::NaiveDate;
use rusqlite::Connection;
use rust_decimal::Decimal;

use crate::error::StorageError;
use crate::models::transaction::{Category, MAX_AMOUNT, Transaction, TransactionType};

/// Column values exactly as SQLite hands them back, before any parsing.
struct StoredRow {
    id: String,
    date: String,
    description: String,
    amount: String,
    transaction_type: String,
    category: String,
}

impl StoredRow {
    fn into_transaction(self) -> Result<Transaction, StorageError> {
        let corrupt = |reason: String| StorageError::CorruptRow {
            id: self.id.clone(),
            reason,
        };

        let date = NaiveDate::parse_from_str(&self.date, "%Y-%m-%d")
            .map_err(|e| corrupt(format!("bad date '{}': {}", self.date, e)))?;
        let amount = Decimal::from_str(&self.amount)
            .map_err(|e| corrupt(format!("bad amount '{}': {}", self.amount, e)))?;
        if amount.abs() > MAX_AMOUNT {
            return Err(corrupt(format!("amount '{}' is out of range", self.amount)));
        }
        let transaction_type = TransactionType::from_str(&self.transaction_type)
            .map_err(|e| corrupt(e.to_string()))?;
        let category = Category::from_str(&self.category).map_err(|e| corrupt(e.to_string()))?;

        Ok(Transaction::new(
            self.id,
            date,
            self.description,
            amount,
            transaction_type,
            category,
        ))
    }
}

/// Insert one row. The raw SQLite error is returned so callers can tell an id
/// collision apart from other failures.
pub fn insert_transaction(conn: &Connection, transaction: &Transaction) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO transactions (id, date, description, amount, transaction_type, category) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            &transaction.id,
            transaction.date.format("%Y-%m-%d").to_string(),
            &transaction.description,
            transaction.amount.to_string(),
            transaction.transaction_type.as_str(),
            transaction.category.as_str(),
        ],
    )?;
    Ok(())
}

/// True when `error` is a primary key violation, i.e. the id is already taken.
pub fn is_duplicate_id(error: &rusqlite::Error) -> bool {
    matches!(
        error,
        rusqlite::Error::SqliteFailure(sql_error, _)
            if sql_error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}

pub fn get_all_transactions(conn: &Connection) -> Result<Vec<Transaction>, StorageError> {
    let mut stmt = conn.prepare(
        "SELECT id, date, description, amount, transaction_type, category FROM transactions",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok(StoredRow {
            id: row.get(0)?,
            date: row.get(1)?,
            description: row.get(2)?,
            amount: row.get(3)?,
            transaction_type: row.get(4)?,
            category: row.get(5)?,
        })
    })?;

    let mut transactions = Vec::new();
    for row in rows {
        transactions.push(row?.into_transaction()?);
    }

    Ok(transactions)
}

pub fn count_transactions(conn: &Connection) -> Result<usize, StorageError> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM transactions", [], |row| row.get(0))?;
    Ok(count as usize)
}

/// Returns whether a row was deleted.
pub fn remove_transaction(conn: &Connection, id: &str) -> Result<bool, StorageError> {
    let rows_affected = conn.execute("DELETE FROM transactions WHERE id = ?1", [id])?;
    Ok(rows_affected > 0)
}

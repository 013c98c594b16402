use std::path::Path;

use rusqlite::{Connection, Result};

const CREATE_TRANSACTIONS_TABLE: &str = "CREATE TABLE IF NOT EXISTS transactions (
    id TEXT PRIMARY KEY,
    date TEXT NOT NULL,
    description TEXT NOT NULL CHECK (length(trim(description)) > 0),
    amount TEXT NOT NULL,
    transaction_type TEXT NOT NULL CHECK (transaction_type IN ('income', 'expense')),
    category TEXT NOT NULL CHECK (category IN (
        'salary', 'freelance', 'investment', 'food', 'transportation',
        'entertainment', 'shopping', 'utilities', 'other'
    ))
)";

pub fn establish_connection(path: impl AsRef<Path>) -> Result<Connection> {
    let path = path.as_ref();
    let conn = Connection::open(path)?;
    initialize(&conn)?;
    tracing::debug!("opened ledger database at {}", path.display());
    Ok(conn)
}

/// Create the schema if it does not exist yet.
pub fn initialize(conn: &Connection) -> Result<()> {
    conn.execute(CREATE_TRANSACTIONS_TABLE, [])?;
    Ok(())
}

#[cfg(test)]
pub fn establish_test_connection() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    initialize(&conn)?;
    Ok(conn)
}

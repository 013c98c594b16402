//! Error types shared by the store, the summary engine and the front ends.

use std::io;

/// Everything that can go wrong in a ledger operation.
///
/// None of these are fatal: the caller reports the error and the session carries on.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// The user typed something that cannot become a transaction.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The database could not be read or written.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// A report was requested but there is nothing to put in it.
    #[error("no transactions to report, add a transaction first")]
    EmptyReport,

    /// Writing an export file failed.
    #[error("could not write export to {path}: {source}")]
    Export {
        path: String,
        #[source]
        source: io::Error,
    },

    /// The terminal could not be set up, drawn to or read from.
    #[error("terminal error: {0}")]
    Terminal(#[source] io::Error),

    /// Reading or parsing an import file failed.
    #[error("import failed: {0}")]
    Import(String),
}

/// Rejected user input. Nothing is persisted when one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("description cannot be empty")]
    EmptyDescription,

    #[error("invalid amount '{0}', provide a number")]
    InvalidAmount(String),

    #[error("amount must be greater than zero")]
    NonPositiveAmount,

    #[error("amount is too large, the limit is 1000000000000000000")]
    AmountTooLarge,

    #[error("invalid transaction type '{0}', use 'income' or 'expense'")]
    InvalidType(String),

    #[error("invalid category '{0}', use one of: salary, freelance, investment, food, transportation, entertainment, shopping, utilities, other")]
    InvalidCategory(String),

    #[error("expected 5 comma separated fields (date, description, amount, type, category) but got {0}")]
    WrongFieldCount(usize),

    #[error("could not read the transaction line: {0}")]
    MalformedLine(String),

    #[error("invalid date '{0}', use YYYY-MM-DD")]
    InvalidDate(String),

    #[error("invalid filter '{0}', use 'all', 'income' or 'expense'")]
    InvalidFilter(String),

    #[error("unknown export format '{0}', use 'text' or 'csv'")]
    InvalidExportFormat(String),
}

/// Failure of the backing SQLite database.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Sql(#[from] rusqlite::Error),

    /// A stored row could not be turned back into a transaction.
    #[error("corrupt row for transaction {id}: {reason}")]
    CorruptRow { id: String, reason: String },

    /// No free id could be found after several attempts.
    #[error("could not generate a unique transaction id")]
    IdExhausted,
}

impl LedgerError {
    pub fn is_validation(&self) -> bool {
        matches!(self, LedgerError::Validation(_))
    }
}

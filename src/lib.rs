//! A personal finance ledger.
//!
//! Income and expense records live in a local SQLite database behind a
//! [`TransactionStore`]. Totals and list views are derived from the stored
//! records by the functions in [`operations::summary`].

pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod format;
pub mod logging;
pub mod models;
pub mod operations;
pub mod shell;
pub mod store;

pub use error::{LedgerError, StorageError, ValidationError};
pub use format::{category_display_name, format_currency};
pub use models::transaction::{Category, Transaction, TransactionType};
pub use operations::add::TransactionDraft;
pub use operations::summary::{Totals, TypeFilter, compute_totals, filter_and_sort};
pub use store::TransactionStore;

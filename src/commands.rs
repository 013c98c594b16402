//! One function per user command. Each returns the text to show, so the shell
//! and the one-shot subcommands print exactly the same thing.

use std::fmt::Write as _;
use std::path::Path;
use std::str::FromStr;

use crate::config::Command;
use crate::error::LedgerError;
use crate::format::{category_display_name, format_currency, format_signed};
use crate::models::transaction::Transaction;
use crate::operations::add::{TransactionDraft, today};
use crate::operations::import::import_csv_to_store;
use crate::operations::report::{ExportFormat, export_report};
use crate::operations::summary::{Totals, TypeFilter, compute_totals, filter_and_sort};
use crate::store::TransactionStore;

const NO_TRANSACTIONS: &str = "No transactions found.";

/// Run a non-interactive command. `Browse` and `Shell` are handled by the caller.
pub fn execute(store: &TransactionStore, command: &Command) -> Result<String, LedgerError> {
    match command {
        Command::Add {
            description,
            amount,
            transaction_type,
            category,
            date,
        } => {
            let draft = TransactionDraft::parse(description, amount, transaction_type, category, date.as_deref())?;
            add(store, draft)
        }
        Command::Remove { id } => remove(store, id),
        Command::List { filter } => list(store, TypeFilter::from_str(filter)?),
        Command::Summary => summary(store),
        Command::Export { format, output } => {
            let format = ExportFormat::from_str(format)?;
            export(store, format, output.as_deref())
        }
        Command::Import { path } => import(store, path),
        Command::Browse | Command::Shell => Ok(String::new()),
    }
}

pub fn add(store: &TransactionStore, draft: TransactionDraft) -> Result<String, LedgerError> {
    let transaction = store.add(draft)?;
    Ok(format!(
        "Transaction added: {} ({})",
        describe(&transaction),
        transaction.id
    ))
}

pub fn remove(store: &TransactionStore, id: &str) -> Result<String, LedgerError> {
    let id = id.trim();
    if store.delete(id)? {
        Ok(format!("Transaction {id} removed."))
    } else {
        Ok(format!("No transaction with id {id}, nothing removed."))
    }
}

pub fn list(store: &TransactionStore, filter: TypeFilter) -> Result<String, LedgerError> {
    let transactions = store.load_all()?;
    Ok(render_list(&filter_and_sort(&transactions, filter)))
}

pub fn summary(store: &TransactionStore) -> Result<String, LedgerError> {
    let transactions = store.load_all()?;
    Ok(render_totals(&compute_totals(&transactions)))
}

pub fn export(store: &TransactionStore, format: ExportFormat, output: Option<&Path>) -> Result<String, LedgerError> {
    if store.is_empty()? {
        return Err(LedgerError::EmptyReport);
    }

    let transactions = store.load_all()?;
    let path = export_report(&transactions, format, output, today())?;
    Ok(format!("Report written to {}", path.display()))
}

pub fn import(store: &TransactionStore, path: &Path) -> Result<String, LedgerError> {
    let imported = import_csv_to_store(store, path)?;
    Ok(format!("Successfully imported {} transactions.", imported.len()))
}

/// Table of already sorted transactions.
pub fn render_list(transactions: &[Transaction]) -> String {
    if transactions.is_empty() {
        return NO_TRANSACTIONS.to_string();
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<10}  {:<30}  {:<14}  {:>18}  {}",
        "Date", "Description", "Category", "Amount", "Id"
    );
    for transaction in transactions {
        let _ = writeln!(
            out,
            "{:<10}  {:<30}  {:<14}  {:>18}  {}",
            transaction.date.format("%Y-%m-%d"),
            transaction.description,
            category_display_name(transaction.category),
            format_signed(transaction.amount, transaction.transaction_type),
            transaction.id
        );
    }
    out.pop();
    out
}

pub fn render_totals(totals: &Totals) -> String {
    format!(
        "Balance: {}\nIncome:  {}\nExpense: {}",
        format_currency(totals.balance),
        format_currency(totals.income),
        format_currency(totals.expense)
    )
}

fn describe(transaction: &Transaction) -> String {
    format!(
        "{} {} {} on {}",
        transaction.description,
        format_signed(transaction.amount, transaction.transaction_type),
        category_display_name(transaction.category),
        transaction.date.format("%Y-%m-%d")
    )
}

//! The transaction store: the single owner of the ledger database.

use std::path::Path;

use rusqlite::Connection;

use crate::db::{connection, repository};
use crate::error::{LedgerError, StorageError};
use crate::models::transaction::Transaction;
use crate::operations::add::{TransactionDraft, generate_id, today};

const MAX_ID_ATTEMPTS: usize = 5;

/// Handle to the persisted set of transactions.
///
/// Every mutation is committed before the method returns, so a following
/// [`TransactionStore::load_all`] always sees it. A failed call leaves the
/// database untouched.
pub struct TransactionStore {
    conn: Connection,
}

impl TransactionStore {
    /// Open (or create) the ledger database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let conn = connection::establish_connection(path).map_err(StorageError::from)?;
        Ok(Self { conn })
    }

    /// Wrap an existing connection, creating the schema if needed.
    pub fn from_connection(conn: Connection) -> Result<Self, LedgerError> {
        connection::initialize(&conn).map_err(StorageError::from)?;
        Ok(Self { conn })
    }

    /// Validate and persist a new transaction.
    pub fn add(&self, draft: TransactionDraft) -> Result<Transaction, LedgerError> {
        if let Err(e) = draft.validate() {
            tracing::warn!("rejected transaction: {e}");
            return Err(e.into());
        }

        let transaction = insert_with_fresh_id(&self.conn, draft)?;
        tracing::info!(
            id = %transaction.id,
            kind = %transaction.transaction_type,
            amount = %transaction.amount,
            "added transaction"
        );
        Ok(transaction)
    }

    /// Persist several drafts at once. Either all of them are stored or none are.
    pub fn add_all(&self, drafts: Vec<TransactionDraft>) -> Result<Vec<Transaction>, LedgerError> {
        for draft in &drafts {
            draft.validate()?;
        }

        let sql_transaction = self.conn.unchecked_transaction().map_err(StorageError::from)?;
        let mut added = Vec::with_capacity(drafts.len());
        for draft in drafts {
            added.push(insert_with_fresh_id(&sql_transaction, draft)?);
        }
        sql_transaction.commit().map_err(StorageError::from)?;

        tracing::info!("added {} transactions", added.len());
        Ok(added)
    }

    /// Remove the transaction with `id`. Returns `false` if there was none.
    pub fn delete(&self, id: &str) -> Result<bool, LedgerError> {
        let removed = repository::remove_transaction(&self.conn, id)?;
        if removed {
            tracing::info!(%id, "deleted transaction");
        } else {
            tracing::debug!(%id, "delete requested for unknown transaction");
        }
        Ok(removed)
    }

    /// Every stored transaction, in no particular order.
    pub fn load_all(&self) -> Result<Vec<Transaction>, LedgerError> {
        let transactions = repository::get_all_transactions(&self.conn).inspect_err(|e| {
            tracing::error!("could not load transactions: {e}");
        })?;
        tracing::debug!("loaded {} transactions", transactions.len());
        Ok(transactions)
    }

    pub fn len(&self) -> Result<usize, LedgerError> {
        Ok(repository::count_transactions(&self.conn)?)
    }

    pub fn is_empty(&self) -> Result<bool, LedgerError> {
        Ok(self.len()? == 0)
    }
}

fn insert_with_fresh_id(conn: &Connection, draft: TransactionDraft) -> Result<Transaction, LedgerError> {
    let today = today();
    for _ in 0..MAX_ID_ATTEMPTS {
        let transaction = draft.clone().into_transaction(generate_id(), today);
        match repository::insert_transaction(conn, &transaction) {
            Ok(()) => return Ok(transaction),
            Err(e) if repository::is_duplicate_id(&e) => {
                tracing::warn!(id = %transaction.id, "generated id already exists, retrying");
            }
            Err(e) => {
                tracing::error!("could not insert transaction: {e}");
                return Err(StorageError::from(e).into());
            }
        }
    }

    Err(StorageError::IdExhausted.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connection::establish_test_connection;
    use crate::error::ValidationError;
    use crate::models::transaction::{Category, TransactionType};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use std::collections::HashSet;

    fn test_store() -> TransactionStore {
        TransactionStore::from_connection(establish_test_connection().unwrap()).unwrap()
    }

    fn draft(description: &str, amount: i64, transaction_type: TransactionType) -> TransactionDraft {
        TransactionDraft::new(description, Decimal::new(amount, 0), transaction_type, Category::Other)
    }

    #[test]
    fn test_add_then_load_all_contains_new_record() {
        let store = test_store();
        store.add(draft("Groceries", 40, TransactionType::Expense)).unwrap();

        let added = store
            .add(draft("Salary", 100, TransactionType::Income).on(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()))
            .unwrap();

        let all = store.load_all().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all.iter().filter(|t| t.id == added.id).count(), 1);
        let stored = all.iter().find(|t| t.id == added.id).unwrap();
        assert_eq!(stored.amount, Decimal::new(100, 0));
        assert_eq!(stored.date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    }

    #[test]
    fn test_add_defaults_date_to_today() {
        let store = test_store();
        let added = store.add(draft("Lunch", 12, TransactionType::Expense)).unwrap();
        assert_eq!(added.date, today());
    }

    #[test]
    fn test_add_generates_unique_ids() {
        let store = test_store();
        for i in 0..50 {
            store.add(draft(&format!("Item {i}"), 1, TransactionType::Expense)).unwrap();
        }

        let ids: HashSet<String> = store.load_all().unwrap().into_iter().map(|t| t.id).collect();
        assert_eq!(ids.len(), 50);
    }

    #[test]
    fn test_add_rejects_empty_description_without_persisting() {
        let store = test_store();
        store.add(draft("Existing", 5, TransactionType::Income)).unwrap();

        let result = store.add(draft("   ", 10, TransactionType::Expense));
        assert!(matches!(result, Err(LedgerError::Validation(ValidationError::EmptyDescription))));
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn test_add_rejects_non_positive_amount_without_persisting() {
        let store = test_store();

        for amount in [0, -40] {
            let result = store.add(draft("Refund", amount, TransactionType::Expense));
            assert!(matches!(result, Err(LedgerError::Validation(ValidationError::NonPositiveAmount))));
        }
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn test_delete_existing_removes_only_that_record() {
        let store = test_store();
        let keep = store.add(draft("Keep", 1, TransactionType::Income)).unwrap();
        let remove = store.add(draft("Remove", 2, TransactionType::Expense)).unwrap();

        assert!(store.delete(&remove.id).unwrap());

        let all = store.load_all().unwrap();
        assert_eq!(all, vec![keep]);
    }

    #[test]
    fn test_delete_missing_is_a_no_op() {
        let store = test_store();
        store.add(draft("Keep", 1, TransactionType::Income)).unwrap();
        let before = store.load_all().unwrap();

        assert!(!store.delete("does-not-exist").unwrap());
        assert_eq!(store.load_all().unwrap(), before);
    }

    #[test]
    fn test_delete_twice_second_returns_false() {
        let store = test_store();
        let added = store.add(draft("Once", 1, TransactionType::Income)).unwrap();

        assert!(store.delete(&added.id).unwrap());
        assert!(!store.delete(&added.id).unwrap());
    }

    #[test]
    fn test_load_all_is_idempotent() {
        let store = test_store();
        store.add(draft("A", 1, TransactionType::Income)).unwrap();
        store.add(draft("B", 2, TransactionType::Expense)).unwrap();

        let mut first = store.load_all().unwrap();
        let mut second = store.load_all().unwrap();
        first.sort_by(|a, b| a.id.cmp(&b.id));
        second.sort_by(|a, b| a.id.cmp(&b.id));
        assert_eq!(first, second);
    }

    #[test]
    fn test_add_all_is_all_or_nothing() {
        let store = test_store();
        let drafts = vec![
            draft("Good", 10, TransactionType::Income),
            draft("", 10, TransactionType::Income),
        ];

        assert!(store.add_all(drafts).is_err());
        assert!(store.is_empty().unwrap());

        let added = store
            .add_all(vec![draft("One", 1, TransactionType::Income), draft("Two", 2, TransactionType::Expense)])
            .unwrap();
        assert_eq!(added.len(), 2);
        assert_eq!(store.len().unwrap(), 2);
    }

    #[test]
    fn test_storage_failure_surfaces_as_storage_error() {
        let store = test_store();
        store.conn.execute("DROP TABLE transactions", []).unwrap();

        let result = store.add(draft("Lunch", 5, TransactionType::Expense));
        assert!(matches!(result, Err(LedgerError::Storage(_))));
        assert!(matches!(store.load_all(), Err(LedgerError::Storage(_))));
    }

    #[test]
    fn test_transactions_survive_reopening_the_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.db");

        let added = {
            let store = TransactionStore::open(&path).unwrap();
            store.add(draft("Persisted", 7, TransactionType::Income)).unwrap()
        };

        let reopened = TransactionStore::open(&path).unwrap();
        assert_eq!(reopened.load_all().unwrap(), vec![added]);
    }
}

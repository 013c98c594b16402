use std::fs::File;
use std::path::Path;

use crate::error::LedgerError;
use crate::models::transaction::Transaction;
use crate::operations::add::{TransactionDraft, field_reader};
use crate::store::TransactionStore;

/// Import headerless `date,description,amount,type,category` rows.
///
/// Every row is validated before anything is written, and the rows are stored
/// in a single database transaction.
pub fn import_csv_to_store(store: &TransactionStore, path: &Path) -> Result<Vec<Transaction>, LedgerError> {
    let drafts = read_csv(path)?;
    let imported = store.add_all(drafts)?;
    tracing::info!("imported {} transactions from {}", imported.len(), path.display());
    Ok(imported)
}

fn read_csv(path: &Path) -> Result<Vec<TransactionDraft>, LedgerError> {
    let file = File::open(path)
        .map_err(|e| LedgerError::Import(format!("failed to open file '{}': {}", path.display(), e)))?;

    let mut reader = field_reader(file);

    let mut drafts = Vec::new();

    for (line_index, result) in reader.records().enumerate() {
        let line = line_index + 1;
        let record = result.map_err(|e| LedgerError::Import(format!("CSV parse error on line {line}: {e}")))?;

        if record.len() != 5 {
            return Err(LedgerError::Import(format!(
                "invalid number of columns on line {line}: expected 5, got {}",
                record.len()
            )));
        }

        let field = |i: usize| record.get(i).unwrap_or("");
        let draft = TransactionDraft::parse(field(1), field(2), field(3), field(4), Some(field(0)))
            .map_err(|e| LedgerError::Import(format!("line {line}: {e}")))?;

        drafts.push(draft);
    }

    Ok(drafts)
}

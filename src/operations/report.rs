use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::NaiveDate;

use crate::error::{LedgerError, ValidationError};
use crate::format::{category_display_name, format_currency, transaction_type_label};
use crate::models::transaction::Transaction;
use crate::operations::summary::{TypeFilter, filter_and_sort};

const REPORT_TITLE: &str = "Financial Report";
const TABLE_TITLE: &str = "Transactions";
const CONTINUED_TABLE_TITLE: &str = "Transactions (continued)";
const FIRST_PAGE_ROWS: usize = 25;
const CONTINUATION_PAGE_ROWS: usize = 29;
const DESCRIPTION_PREVIEW_CHARS: usize = 15;
const PAGE_BREAK: char = '\u{0c}';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Text,
    Csv,
}

impl ExportFormat {
    fn extension(self) -> &'static str {
        match self {
            ExportFormat::Text => "txt",
            ExportFormat::Csv => "csv",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" | "txt" => Ok(ExportFormat::Text),
            "csv" => Ok(ExportFormat::Csv),
            _ => Err(ValidationError::InvalidExportFormat(s.trim().to_string())),
        }
    }
}

/// `financial_report_2025-01-31.txt`
pub fn default_file_name(format: ExportFormat, generated_on: NaiveDate) -> String {
    format!(
        "financial_report_{}.{}",
        generated_on.format("%Y-%m-%d"),
        format.extension()
    )
}

/// Write the report for `transactions` and return the path it was written to.
pub fn export_report(
    transactions: &[Transaction],
    format: ExportFormat,
    path: Option<&Path>,
    generated_on: NaiveDate,
) -> Result<PathBuf, LedgerError> {
    if transactions.is_empty() {
        return Err(LedgerError::EmptyReport);
    }

    let path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(default_file_name(format, generated_on)));
    let export_error = |source: io::Error| LedgerError::Export {
        path: path.display().to_string(),
        source,
    };

    match format {
        ExportFormat::Text => {
            let report = render_text_report(transactions, generated_on)?;
            fs::write(&path, report).map_err(export_error)?;
        }
        ExportFormat::Csv => write_csv(transactions, &path).map_err(export_error)?,
    }

    tracing::info!(
        "exported {} transactions to {}",
        transactions.len(),
        path.display()
    );
    Ok(path)
}

/// Paginated plain-text report, newest transactions first.
///
/// Every page after the first starts with a continuation title and repeats the
/// table header. Pages are separated by a form feed.
pub fn render_text_report(
    transactions: &[Transaction],
    generated_on: NaiveDate,
) -> Result<String, LedgerError> {
    if transactions.is_empty() {
        return Err(LedgerError::EmptyReport);
    }

    let sorted = filter_and_sort(transactions, TypeFilter::All);
    let mut report = String::new();
    let _ = writeln!(report, "{REPORT_TITLE}");
    let _ = writeln!(report, "Generated on: {}", generated_on.format("%-d %B %Y"));
    let _ = writeln!(report);

    for (page, rows) in paginate(&sorted).into_iter().enumerate() {
        if page > 0 {
            report.push(PAGE_BREAK);
            report.push('\n');
            let _ = writeln!(report, "{CONTINUED_TABLE_TITLE}");
        } else {
            let _ = writeln!(report, "{TABLE_TITLE}");
        }
        push_table_header(&mut report);
        for transaction in rows {
            push_row(&mut report, transaction);
        }
    }

    Ok(report)
}

fn paginate(transactions: &[Transaction]) -> Vec<&[Transaction]> {
    let split = transactions.len().min(FIRST_PAGE_ROWS);
    let (first, rest) = transactions.split_at(split);

    let mut pages = vec![first];
    pages.extend(rest.chunks(CONTINUATION_PAGE_ROWS));
    pages
}

fn push_table_header(report: &mut String) {
    let _ = writeln!(
        report,
        "{:<10}  {:<18}  {:<14}  {:>16}  {}",
        "Date", "Description", "Category", "Amount", "Type"
    );
    let _ = writeln!(report, "{}", "-".repeat(72));
}

fn push_row(report: &mut String, transaction: &Transaction) {
    let _ = writeln!(
        report,
        "{:<10}  {:<18}  {:<14}  {:>16}  {}",
        transaction.date.format("%Y-%m-%d"),
        preview_description(&transaction.description),
        category_display_name(transaction.category),
        format_currency(transaction.amount),
        transaction_type_label(transaction.transaction_type),
    );
}

/// The first 15 characters, followed by `...` when something was cut off.
pub fn preview_description(description: &str) -> String {
    if description.chars().count() > DESCRIPTION_PREVIEW_CHARS {
        let mut preview: String = description.chars().take(DESCRIPTION_PREVIEW_CHARS).collect();
        preview.push_str("...");
        preview
    } else {
        description.to_string()
    }
}

fn write_csv(transactions: &[Transaction], path: &Path) -> io::Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["date", "description", "category", "amount", "type"])?;

    for transaction in filter_and_sort(transactions, TypeFilter::All) {
        writer.write_record([
            transaction.date.format("%Y-%m-%d").to_string(),
            transaction.description.clone(),
            transaction.category.as_str().to_string(),
            transaction.amount.to_string(),
            transaction.transaction_type.as_str().to_string(),
        ])?;
    }

    writer.flush()
}

use std::io;
use std::str::FromStr;

use chrono::{Local, NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::ValidationError;
use crate::models::transaction::{Category, MAX_AMOUNT, Transaction, TransactionType};

const ID_SUFFIX_LEN: usize = 9;
const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// User input for a new transaction, before it has an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionDraft {
    pub description: String,
    pub amount: Decimal,
    pub transaction_type: TransactionType,
    pub category: Category,
    /// `None` means today.
    pub date: Option<NaiveDate>,
}

impl TransactionDraft {
    pub fn new(
        description: impl Into<String>,
        amount: Decimal,
        transaction_type: TransactionType,
        category: Category,
    ) -> Self {
        Self {
            description: description.into(),
            amount,
            transaction_type,
            category,
            date: None,
        }
    }

    pub fn on(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    /// Build a draft from raw text fields. An empty or missing date means today.
    pub fn parse(
        description: &str,
        amount: &str,
        transaction_type: &str,
        category: &str,
        date: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let date = match date.map(str::trim) {
            Some(raw) if !raw.is_empty() => Some(parse_date(raw)?),
            _ => None,
        };

        let draft = Self {
            description: description.to_string(),
            amount: parse_amount(amount)?,
            transaction_type: TransactionType::from_str(transaction_type)?,
            category: Category::from_str(category)?,
            date,
        };
        draft.validate()?;
        Ok(draft)
    }

    /// Parse `date, description, amount, type, category`. The date field may be left empty.
    ///
    /// Fields follow CSV quoting, so `2024-01-01, "Rice, eggs", 40, expense, food` works.
    pub fn from_line(line: &str) -> Result<Self, ValidationError> {
        let normalized = skip_blanks_after_commas(line.trim());
        let mut reader = field_reader(normalized.as_bytes());

        let record = match reader.records().next() {
            Some(record) => record.map_err(|e| ValidationError::MalformedLine(e.to_string()))?,
            None => return Err(ValidationError::WrongFieldCount(0)),
        };
        if record.len() != 5 {
            return Err(ValidationError::WrongFieldCount(record.len()));
        }

        let field = |i: usize| record.get(i).unwrap_or("");
        Self::parse(field(1), field(2), field(3), field(4), Some(field(0)))
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.description.trim().is_empty() {
            return Err(ValidationError::EmptyDescription);
        }
        if self.amount <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveAmount);
        }
        if self.amount > MAX_AMOUNT {
            return Err(ValidationError::AmountTooLarge);
        }
        Ok(())
    }

    /// Turn a validated draft into a record with the given id.
    pub(crate) fn into_transaction(self, id: String, today: NaiveDate) -> Transaction {
        Transaction::new(
            id,
            self.date.unwrap_or(today),
            self.description.trim().to_string(),
            self.amount.abs(),
            self.transaction_type,
            self.category,
        )
    }
}

/// Headerless `date,description,amount,type,category` reader shared by the shell and CSV import.
pub(crate) fn field_reader<R: io::Read>(input: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .has_headers(false)
        .flexible(true)
        .from_reader(input)
}

/// A quote only opens a quoted field when it is the field's first character,
/// so blanks typed after a comma are dropped before the line reaches the reader.
fn skip_blanks_after_commas(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut in_quotes = false;
    let mut after_comma = false;

    for ch in line.chars() {
        if after_comma && ch.is_whitespace() {
            continue;
        }
        after_comma = false;
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => after_comma = true,
            _ => {}
        }
        out.push(ch);
    }
    out
}

/// Parse an amount typed by the user. NaN, infinities and non-numbers are rejected.
pub fn parse_amount(raw: &str) -> Result<Decimal, ValidationError> {
    let raw = raw.trim();
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .map_err(|_| ValidationError::InvalidAmount(raw.to_string()))
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| ValidationError::InvalidDate(raw.trim().to_string()))
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Millisecond timestamp followed by a random base-36 suffix.
///
/// Collisions are unlikely but possible; the store retries on a duplicate id.
pub fn generate_id() -> String {
    let millis = Utc::now().timestamp_millis();
    format!("{}{}", millis, base36_suffix(Uuid::new_v4().as_u128()))
}

fn base36_suffix(mut random: u128) -> String {
    let mut suffix = [b'0'; ID_SUFFIX_LEN];
    for slot in suffix.iter_mut().rev() {
        *slot = BASE36[(random % 36) as usize];
        random /= 36;
    }
    suffix.iter().map(|&b| b as char).collect()
}

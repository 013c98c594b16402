use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::error::ValidationError;

/// Largest amount a single transaction may carry (10^18).
///
/// Far below `Decimal::MAX`, so summing every record a ledger can hold stays in range.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0xA764_0000, 0x0DE0_B6B3, 0, false, 0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    /// Name used on the command line and in the database.
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            _ => Err(ValidationError::InvalidType(s.trim().to_string())),
        }
    }
}

/// The closed set of categories a transaction can be filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Salary,
    Freelance,
    Investment,
    Food,
    Transportation,
    Entertainment,
    Shopping,
    Utilities,
    Other,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Category::Salary,
        Category::Freelance,
        Category::Investment,
        Category::Food,
        Category::Transportation,
        Category::Entertainment,
        Category::Shopping,
        Category::Utilities,
        Category::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Salary => "salary",
            Category::Freelance => "freelance",
            Category::Investment => "investment",
            Category::Food => "food",
            Category::Transportation => "transportation",
            Category::Entertainment => "entertainment",
            Category::Shopping => "shopping",
            Category::Utilities => "utilities",
            Category::Other => "other",
        }
    }

    /// Human readable label for lists and reports.
    pub fn display_name(self) -> &'static str {
        match self {
            Category::Salary => "Salary",
            Category::Freelance => "Freelance",
            Category::Investment => "Investment",
            Category::Food => "Food",
            Category::Transportation => "Transportation",
            Category::Entertainment => "Entertainment",
            Category::Shopping => "Shopping",
            Category::Utilities => "Utilities",
            Category::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == wanted)
            .ok_or_else(|| ValidationError::InvalidCategory(s.trim().to_string()))
    }
}

/// A recorded income or expense.
///
/// Records are never edited in place. To change one, delete it and add a new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub id: String,
    pub date: NaiveDate,
    pub description: String,
    /// Always positive, the sign lives in `transaction_type`.
    pub amount: Decimal,
    pub transaction_type: TransactionType,
    pub category: Category,
}

impl Transaction {
    pub fn new(
        id: String,
        date: NaiveDate,
        description: String,
        amount: Decimal,
        transaction_type: TransactionType,
        category: Category,
    ) -> Self {
        Self {
            id,
            date,
            description,
            amount,
            transaction_type,
            category,
        }
    }

    pub fn is_income(&self) -> bool {
        self.transaction_type == TransactionType::Income
    }
}

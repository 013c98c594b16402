//! Totals and list views derived from a set of transactions. Nothing here touches the database.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;

use crate::error::ValidationError;
use crate::models::transaction::{Transaction, TransactionType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Totals {
    pub income: Decimal,
    pub expense: Decimal,
    /// `income - expense`, negative when spending exceeds earnings.
    pub balance: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TypeFilter {
    #[default]
    All,
    Income,
    Expense,
}

impl TypeFilter {
    pub fn matches(self, transaction: &Transaction) -> bool {
        match self {
            TypeFilter::All => true,
            TypeFilter::Income => transaction.transaction_type == TransactionType::Income,
            TypeFilter::Expense => transaction.transaction_type == TransactionType::Expense,
        }
    }

    /// All -> Income -> Expense -> All
    pub fn next(self) -> Self {
        match self {
            TypeFilter::All => TypeFilter::Income,
            TypeFilter::Income => TypeFilter::Expense,
            TypeFilter::Expense => TypeFilter::All,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TypeFilter::All => "all",
            TypeFilter::Income => "income",
            TypeFilter::Expense => "expense",
        }
    }
}

impl fmt::Display for TypeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TypeFilter {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(TypeFilter::All),
            "income" => Ok(TypeFilter::Income),
            "expense" => Ok(TypeFilter::Expense),
            _ => Err(ValidationError::InvalidFilter(s.trim().to_string())),
        }
    }
}

/// Sum income and expense and derive the balance.
///
/// Stored amounts are capped at [`MAX_AMOUNT`](crate::models::transaction::MAX_AMOUNT), so real ledgers never get near the
/// `Decimal` range; the sums saturate at its bounds instead of panicking.
pub fn compute_totals(transactions: &[Transaction]) -> Totals {
    let (income, expense) = transactions.iter().fold(
        (Decimal::ZERO, Decimal::ZERO),
        |(income, expense), transaction| match transaction.transaction_type {
            TransactionType::Income => (income.saturating_add(transaction.amount), expense),
            TransactionType::Expense => (income, expense.saturating_add(transaction.amount)),
        },
    );

    Totals {
        income,
        expense,
        balance: income.saturating_sub(expense),
    }
}

/// Keep the transactions matching `filter`, newest first.
///
/// Records on the same date are ordered by id, descending, so the result does not
/// depend on the order the records were loaded in.
pub fn filter_and_sort(transactions: &[Transaction], filter: TypeFilter) -> Vec<Transaction> {
    let mut filtered: Vec<Transaction> = transactions
        .iter()
        .filter(|transaction| filter.matches(transaction))
        .cloned()
        .collect();

    filtered.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.id.cmp(&a.id)));
    filtered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::transaction::Category;
    use chrono::NaiveDate;

    fn create_test_transaction(id: &str, amount: i64, transaction_type: TransactionType, date: &str) -> Transaction {
        Transaction::new(
            id.to_string(),
            NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            "Test Description".to_string(),
            Decimal::new(amount, 0),
            transaction_type,
            Category::Other,
        )
    }

    fn sample() -> Vec<Transaction> {
        vec![
            create_test_transaction("1", 100, TransactionType::Income, "2024-01-01"),
            create_test_transaction("2", 40, TransactionType::Expense, "2024-01-02"),
            create_test_transaction("3", 25, TransactionType::Income, "2024-03-15"),
            create_test_transaction("4", 10, TransactionType::Expense, "2023-12-31"),
        ]
    }

    #[test]
    fn test_compute_totals_empty() {
        assert_eq!(
            compute_totals(&[]),
            Totals {
                income: Decimal::ZERO,
                expense: Decimal::ZERO,
                balance: Decimal::ZERO,
            }
        );
    }

    #[test]
    fn test_compute_totals_example() {
        let transactions = vec![
            create_test_transaction("1", 100, TransactionType::Income, "2024-01-01"),
            create_test_transaction("2", 40, TransactionType::Expense, "2024-01-02"),
        ];

        let totals = compute_totals(&transactions);
        assert_eq!(totals.income, Decimal::new(100, 0));
        assert_eq!(totals.expense, Decimal::new(40, 0));
        assert_eq!(totals.balance, Decimal::new(60, 0));
    }

    #[test]
    fn test_compute_totals_negative_balance() {
        let transactions = vec![
            create_test_transaction("1", 10, TransactionType::Income, "2024-01-01"),
            create_test_transaction("2", 35, TransactionType::Expense, "2024-01-02"),
        ];

        assert_eq!(compute_totals(&transactions).balance, Decimal::new(-25, 0));
    }

    #[test]
    fn test_compute_totals_keeps_decimal_precision() {
        let mut transactions = Vec::new();
        for i in 0..10 {
            let mut t = create_test_transaction(&i.to_string(), 0, TransactionType::Income, "2024-01-01");
            t.amount = Decimal::new(1, 1);
            transactions.push(t);
        }

        assert_eq!(compute_totals(&transactions).income, Decimal::ONE);
    }

    #[test]
    fn test_compute_totals_at_decimal_limit_does_not_panic() {
        let mut huge_income = create_test_transaction("1", 0, TransactionType::Income, "2024-01-01");
        huge_income.amount = Decimal::MAX;
        let mut huge_expense = create_test_transaction("2", 0, TransactionType::Expense, "2024-01-01");
        huge_expense.amount = Decimal::MAX;

        let totals = compute_totals(&[huge_income.clone(), huge_income, huge_expense.clone(), huge_expense]);
        assert_eq!(totals.income, Decimal::MAX);
        assert_eq!(totals.expense, Decimal::MAX);
        assert_eq!(totals.balance, Decimal::ZERO);
    }

    #[test]
    fn test_filter_and_sort_income_only_newest_first() {
        let result = filter_and_sort(&sample(), TypeFilter::Income);

        let ids: Vec<&str> = result.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["3", "1"]);
        assert!(result.iter().all(|t| t.transaction_type == TransactionType::Income));
    }

    #[test]
    fn test_filter_and_sort_expense_only() {
        let result = filter_and_sort(&sample(), TypeFilter::Expense);

        let ids: Vec<&str> = result.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "4"]);
    }

    #[test]
    fn test_filter_and_sort_all_preserves_count() {
        let transactions = sample();
        let result = filter_and_sort(&transactions, TypeFilter::All);

        assert_eq!(result.len(), transactions.len());
        assert!(result.windows(2).all(|pair| pair[0].date >= pair[1].date));
    }

    #[test]
    fn test_filter_and_sort_same_date_is_deterministic() {
        let a = create_test_transaction("a", 1, TransactionType::Income, "2024-05-05");
        let b = create_test_transaction("b", 2, TransactionType::Income, "2024-05-05");

        let forward = filter_and_sort(&[a.clone(), b.clone()], TypeFilter::All);
        let backward = filter_and_sort(&[b, a], TypeFilter::All);
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_filter_and_sort_empty() {
        assert!(filter_and_sort(&[], TypeFilter::Income).is_empty());
    }

    #[test]
    fn test_type_filter_from_str() {
        assert_eq!("ALL".parse::<TypeFilter>().unwrap(), TypeFilter::All);
        assert_eq!("expense".parse::<TypeFilter>().unwrap(), TypeFilter::Expense);
        assert_eq!(
            "transfers".parse::<TypeFilter>(),
            Err(ValidationError::InvalidFilter("transfers".to_string()))
        );
    }

    #[test]
    fn test_type_filter_cycles() {
        assert_eq!(TypeFilter::All.next().next().next(), TypeFilter::All);
    }
}

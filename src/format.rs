//! Display labels shared by the shell, the browser and the report.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::transaction::{Category, TransactionType};

const CURRENCY_PREFIX: &str = "Rp";
const THOUSANDS_SEPARATOR: char = '.';

pub fn category_display_name(category: Category) -> &'static str {
    category.display_name()
}

pub fn transaction_type_label(transaction_type: TransactionType) -> &'static str {
    match transaction_type {
        TransactionType::Income => "Income",
        TransactionType::Expense => "Expense",
    }
}

/// Format an amount as whole rupiah, e.g. `Rp 1.500.000` or `-Rp 25.000`.
pub fn format_currency(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    let digits = rounded.abs().trunc().to_string();

    format!("{sign}{CURRENCY_PREFIX} {}", group_thousands(&digits))
}

/// Signed amount as shown in lists: `+Rp 100` for income, `-Rp 40` for expenses.
pub fn format_signed(amount: Decimal, transaction_type: TransactionType) -> String {
    match transaction_type {
        TransactionType::Income => format!("+{}", format_currency(amount)),
        TransactionType::Expense => format!("-{}", format_currency(amount)),
    }
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(THOUSANDS_SEPARATOR);
        }
        grouped.push(ch);
    }
    grouped
}

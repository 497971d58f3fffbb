//! Expense record and input validation.
//!
//! # Responsibility
//! - Define the persisted expense shape.
//! - Parse raw amount input the way the entry form filters it.
//!
//! # Invariants
//! - `amount` is never negative.
//! - `description` is never blank.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

static AMOUNT_INPUT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d*\.?\d*$").expect("valid amount regex"));

/// Expense identifier: creation timestamp in epoch milliseconds.
pub type ExpenseId = i64;

/// One recorded company expense.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub id: ExpenseId,
    pub amount: Decimal,
    pub description: String,
    /// Refreshed to "today" on every edit.
    pub date: NaiveDate,
    pub category: String,
}

impl Expense {
    /// Checks record-level invariants.
    ///
    /// # Errors
    /// - `NegativeAmount` when `amount < 0`.
    /// - `MissingDescription` when `description` is blank.
    pub fn validate(&self) -> Result<(), ExpenseValidationError> {
        if self.amount.is_sign_negative() && !self.amount.is_zero() {
            return Err(ExpenseValidationError::NegativeAmount);
        }
        if self.description.trim().is_empty() {
            return Err(ExpenseValidationError::MissingDescription);
        }
        Ok(())
    }
}

/// Input validation failures for expense create/edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpenseValidationError {
    MissingAmount,
    MissingDescription,
    InvalidAmount(String),
    NegativeAmount,
}

impl ExpenseValidationError {
    /// Arabic message shown to the user.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::MissingAmount | Self::MissingDescription => "الرجاء إدخال المبلغ والوصف",
            Self::InvalidAmount(_) | Self::NegativeAmount => "الرجاء إدخال مبلغ صحيح",
        }
    }
}

impl Display for ExpenseValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingAmount => write!(f, "amount is required"),
            Self::MissingDescription => write!(f, "description is required"),
            Self::InvalidAmount(value) => write!(f, "invalid amount `{value}`"),
            Self::NegativeAmount => write!(f, "amount must not be negative"),
        }
    }
}

impl Error for ExpenseValidationError {}

/// Parses raw amount input.
///
/// Accepts only digits with at most one decimal point, e.g. `50`, `12.5`,
/// `.75`, `3.`.
///
/// # Errors
/// - `MissingAmount` for empty input.
/// - `InvalidAmount` for anything else the entry form would not accept.
pub fn parse_amount(input: &str) -> Result<Decimal, ExpenseValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ExpenseValidationError::MissingAmount);
    }
    if !AMOUNT_INPUT_RE.is_match(trimmed) || trimmed == "." {
        return Err(ExpenseValidationError::InvalidAmount(trimmed.to_string()));
    }

    let mut normalized = trimmed.trim_end_matches('.').to_string();
    if normalized.starts_with('.') {
        normalized.insert(0, '0');
    }
    Decimal::from_str(&normalized)
        .map_err(|_| ExpenseValidationError::InvalidAmount(trimmed.to_string()))
}

/// Formats an amount the way totals are displayed: two fraction digits.
pub fn format_amount(amount: Decimal) -> String {
    format!(
        "{:.2}",
        amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    )
}

#[cfg(test)]
mod tests {
    use super::{format_amount, parse_amount, Expense, ExpenseValidationError};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    #[test]
    fn parse_amount_accepts_form_shapes() {
        assert_eq!(parse_amount("50").unwrap(), Decimal::new(50, 0));
        assert_eq!(parse_amount(" 12.5 ").unwrap(), Decimal::new(125, 1));
        assert_eq!(parse_amount(".75").unwrap(), Decimal::new(75, 2));
        assert_eq!(parse_amount("3.").unwrap(), Decimal::new(3, 0));
    }

    #[test]
    fn parse_amount_rejects_empty_and_malformed_input() {
        assert_eq!(parse_amount("  "), Err(ExpenseValidationError::MissingAmount));
        assert!(matches!(
            parse_amount("-5"),
            Err(ExpenseValidationError::InvalidAmount(_))
        ));
        assert!(matches!(
            parse_amount("1.2.3"),
            Err(ExpenseValidationError::InvalidAmount(_))
        ));
        assert!(matches!(
            parse_amount("."),
            Err(ExpenseValidationError::InvalidAmount(_))
        ));
        assert!(matches!(
            parse_amount("abc"),
            Err(ExpenseValidationError::InvalidAmount(_))
        ));
    }

    #[test]
    fn validate_rejects_blank_description_and_negative_amount() {
        let mut expense = Expense {
            id: 1,
            amount: Decimal::new(10, 0),
            description: "   ".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            category: "عام".to_string(),
        };
        assert_eq!(
            expense.validate(),
            Err(ExpenseValidationError::MissingDescription)
        );

        expense.description = "paper".to_string();
        expense.amount = Decimal::new(-1, 0);
        assert_eq!(expense.validate(), Err(ExpenseValidationError::NegativeAmount));
    }

    #[test]
    fn format_amount_uses_two_fraction_digits() {
        assert_eq!(format_amount(Decimal::new(50, 0)), "50.00");
        assert_eq!(format_amount(Decimal::new(12345, 3)), "12.35");
    }
}

//! Derived expense aggregates.
//!
//! # Responsibility
//! - Compute dashboard figures from the full expense list.
//!
//! # Invariants
//! - Every function is pure: same list and `today` give the same result.
//! - Nothing is maintained incrementally; callers recompute after each
//!   mutation.
//! - Trailing window is `date >= today - 7d`; the prior window is
//!   `today - 14d <= date < today - 7d`.
//! - No function panics on overflow: sums saturate at `Decimal::MAX` and the
//!   week-over-week ratio is `None` when it cannot be represented.

use crate::model::expense::Expense;
use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashSet;

const WEEK_DAYS: u64 = 7;

/// Summed amount for one category label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: Decimal,
}

/// All derived figures shown next to the expense list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpenseSummary {
    pub count: usize,
    pub total: Decimal,
    pub trailing_week_total: Decimal,
    pub prior_week_total: Decimal,
    /// First-seen order over the list.
    pub category_totals: Vec<CategoryTotal>,
    pub average_per_day: Decimal,
    /// Percent change against the prior week; absent when not computable.
    pub week_over_week_change: Option<Decimal>,
}

/// Sum of all amounts.
pub fn total(expenses: &[Expense]) -> Decimal {
    saturating_sum(expenses.iter().map(|expense| expense.amount))
}

/// Sum of amounts dated within the last seven days, inclusive of the bound.
pub fn trailing_week_total(expenses: &[Expense], today: NaiveDate) -> Decimal {
    let start = days_back(today, WEEK_DAYS);
    saturating_sum(
        expenses
            .iter()
            .filter(|expense| expense.date >= start)
            .map(|expense| expense.amount),
    )
}

/// Sum of amounts dated 8 to 14 days back.
pub fn prior_week_total(expenses: &[Expense], today: NaiveDate) -> Decimal {
    let start = days_back(today, WEEK_DAYS * 2);
    let end = days_back(today, WEEK_DAYS);
    saturating_sum(
        expenses
            .iter()
            .filter(|expense| expense.date >= start && expense.date < end)
            .map(|expense| expense.amount),
    )
}

/// Per-category sums in first-seen order.
pub fn category_totals(expenses: &[Expense]) -> Vec<CategoryTotal> {
    let mut totals: Vec<CategoryTotal> = Vec::new();
    for expense in expenses {
        match totals
            .iter_mut()
            .find(|entry| entry.category == expense.category)
        {
            Some(entry) => entry.total = entry.total.saturating_add(expense.amount),
            None => totals.push(CategoryTotal {
                category: expense.category.clone(),
                total: expense.amount,
            }),
        }
    }
    totals
}

/// Total divided by the number of distinct dates; zero for an empty list.
pub fn average_per_day(expenses: &[Expense]) -> Decimal {
    let distinct_days = expenses
        .iter()
        .map(|expense| expense.date)
        .collect::<HashSet<_>>()
        .len();
    if distinct_days == 0 {
        return Decimal::ZERO;
    }
    total(expenses)
        .checked_div(Decimal::from(distinct_days))
        .unwrap_or(Decimal::MAX)
}

/// Percent change of the trailing week against the prior week.
///
/// Returns `None` with fewer than two records, an empty prior week, or a
/// ratio too large for `Decimal`.
pub fn week_over_week_change(expenses: &[Expense], today: NaiveDate) -> Option<Decimal> {
    if expenses.len() < 2 {
        return None;
    }
    let prior = prior_week_total(expenses, today);
    if prior.is_zero() {
        return None;
    }
    let current = trailing_week_total(expenses, today);
    current
        .checked_sub(prior)?
        .checked_div(prior)?
        .checked_mul(Decimal::ONE_HUNDRED)
}

/// Computes every derived figure for the current list.
pub fn summarize(expenses: &[Expense], today: NaiveDate) -> ExpenseSummary {
    ExpenseSummary {
        count: expenses.len(),
        total: total(expenses),
        trailing_week_total: trailing_week_total(expenses, today),
        prior_week_total: prior_week_total(expenses, today),
        category_totals: category_totals(expenses),
        average_per_day: average_per_day(expenses),
        week_over_week_change: week_over_week_change(expenses, today),
    }
}

fn saturating_sum(amounts: impl Iterator<Item = Decimal>) -> Decimal {
    amounts.fold(Decimal::ZERO, Decimal::saturating_add)
}

fn days_back(today: NaiveDate, days: u64) -> NaiveDate {
    today.checked_sub_days(Days::new(days)).unwrap_or(NaiveDate::MIN)
}

//! Expense book use-cases.
//!
//! # Responsibility
//! - Own the in-memory expense and category lists for one session.
//! - Validate form input, mutate, and write each changed slice through to the
//!   local store.
//! - Gate deletes behind an explicit confirmation step.
//!
//! # Invariants
//! - Expenses are ordered most-recent-first (new records are prepended).
//! - After every successful mutation the stored JSON equals the in-memory
//!   slice; failed operations leave both untouched.
//! - Category labels are unique after trimming (case-sensitive).
//! - The sum of all amounts fits in a `Decimal`; a create or edit that would
//!   overflow it is rejected as an invalid amount.

use crate::clock::{next_record_id, Clock, SystemClock};
use crate::metrics::{summarize, ExpenseSummary};
use crate::model::category::{default_categories, normalize_category};
use crate::model::expense::{parse_amount, Expense, ExpenseId, ExpenseValidationError};
use crate::service::pending_delete::DeleteConfirmation;
use crate::storage::local_store::{
    load_json, save_json, LocalStore, StoreError, CATEGORIES_KEY, EXPENSES_KEY,
};
use chrono::NaiveDate;
use log::{info, warn};
use rust_decimal::Decimal;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ExpenseResult<T> = Result<T, ExpenseServiceError>;

/// Service error for expense and category use-cases.
#[derive(Debug)]
pub enum ExpenseServiceError {
    Validation(ExpenseValidationError),
    UnknownCategory(String),
    BlankCategory,
    DuplicateCategory(String),
    NotFound(ExpenseId),
    NoPendingDelete,
    Store(StoreError),
}

impl ExpenseServiceError {
    /// Arabic message shown to the user; store failures share a generic one.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Validation(err) => err.user_message(),
            Self::UnknownCategory(_) => "الفئة غير موجودة",
            Self::BlankCategory => "الرجاء إدخال اسم الفئة",
            Self::DuplicateCategory(_) => "هذه الفئة موجودة بالفعل",
            Self::NotFound(_) => "المصروف غير موجود",
            Self::NoPendingDelete => "لا يوجد مصروف بانتظار تأكيد الحذف",
            Self::Store(_) => "حدث خطأ أثناء حفظ البيانات",
        }
    }
}

impl Display for ExpenseServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::UnknownCategory(name) => write!(f, "unknown category `{name}`"),
            Self::BlankCategory => write!(f, "category name cannot be blank"),
            Self::DuplicateCategory(name) => write!(f, "category `{name}` already exists"),
            Self::NotFound(id) => write!(f, "expense not found: {id}"),
            Self::NoPendingDelete => write!(f, "no expense is pending deletion"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ExpenseServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ExpenseValidationError> for ExpenseServiceError {
    fn from(value: ExpenseValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StoreError> for ExpenseServiceError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Expense and category data layer over a local store.
pub struct ExpenseBook<S: LocalStore, C: Clock = SystemClock> {
    store: S,
    clock: C,
    expenses: Vec<Expense>,
    categories: Vec<String>,
    pending_delete: DeleteConfirmation<ExpenseId>,
}

impl<S: LocalStore> ExpenseBook<S, SystemClock> {
    /// Opens the book using the host clock.
    pub fn open(store: S) -> ExpenseResult<Self> {
        Self::open_with_clock(store, SystemClock)
    }
}

impl<S: LocalStore, C: Clock> ExpenseBook<S, C> {
    /// Loads persisted expenses and categories.
    ///
    /// A store that has never held categories starts from the default set.
    pub fn open_with_clock(store: S, clock: C) -> ExpenseResult<Self> {
        let mut book = Self {
            store,
            clock,
            expenses: Vec::new(),
            categories: Vec::new(),
            pending_delete: DeleteConfirmation::Idle,
        };
        book.reload()?;
        Ok(book)
    }

    /// Re-reads both slices from the store, dropping any pending delete.
    pub fn reload(&mut self) -> ExpenseResult<()> {
        self.expenses = load_json(&self.store, EXPENSES_KEY)?.unwrap_or_default();
        self.categories =
            load_json(&self.store, CATEGORIES_KEY)?.unwrap_or_else(default_categories);
        self.pending_delete = DeleteConfirmation::Idle;
        info!(
            "event=expense_book_load module=expense status=ok expenses={} categories={}",
            self.expenses.len(),
            self.categories.len()
        );
        Ok(())
    }

    /// Expenses, most recent first.
    pub fn expenses(&self) -> &[Expense] {
        &self.expenses
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn get(&self, id: ExpenseId) -> Option<&Expense> {
        self.expenses.iter().find(|expense| expense.id == id)
    }

    /// Records a new expense from raw form input and prepends it.
    ///
    /// # Errors
    /// - `Validation` when amount or description is missing, or the amount is
    ///   malformed.
    /// - `UnknownCategory` when `category` is not in the category list.
    pub fn create(
        &mut self,
        amount: &str,
        description: &str,
        category: &str,
    ) -> ExpenseResult<Expense> {
        let (amount, description, category) = self.check_input(amount, description, category)?;
        self.ensure_total_fits(amount, None)?;
        let last_id = self.expenses.iter().map(|expense| expense.id).max();
        let expense = Expense {
            id: next_record_id(&self.clock, last_id),
            amount,
            description,
            date: self.clock.today(),
            category,
        };
        expense.validate()?;

        self.expenses.insert(0, expense.clone());
        if let Err(err) = self.persist_expenses() {
            self.expenses.remove(0);
            return Err(err);
        }

        info!(
            "event=expense_create module=expense status=ok id={} count={}",
            expense.id,
            self.expenses.len()
        );
        Ok(expense)
    }

    /// Replaces an expense's fields in place and refreshes its date.
    ///
    /// Returns `Ok(None)` without touching the store when `id` is unknown.
    pub fn update(
        &mut self,
        id: ExpenseId,
        amount: &str,
        description: &str,
        category: &str,
    ) -> ExpenseResult<Option<Expense>> {
        let Some(index) = self.index_of(id) else {
            warn!("event=expense_update module=expense status=skipped reason=not_found id={id}");
            return Ok(None);
        };

        let (amount, description, category) = self.check_input(amount, description, category)?;
        self.ensure_total_fits(amount, Some(index))?;
        let updated = Expense {
            id,
            amount,
            description,
            date: self.clock.today(),
            category,
        };
        updated.validate()?;

        let previous = std::mem::replace(&mut self.expenses[index], updated.clone());
        if let Err(err) = self.persist_expenses() {
            self.expenses[index] = previous;
            return Err(err);
        }

        info!("event=expense_update module=expense status=ok id={id}");
        Ok(Some(updated))
    }

    /// First delete phase: marks `id` as awaiting confirmation.
    pub fn request_delete(&mut self, id: ExpenseId) -> ExpenseResult<()> {
        if self.index_of(id).is_none() {
            return Err(ExpenseServiceError::NotFound(id));
        }
        self.pending_delete.request(id);
        Ok(())
    }

    /// Abandons a pending delete. The list is left untouched.
    pub fn cancel_delete(&mut self) -> Option<ExpenseId> {
        self.pending_delete.cancel()
    }

    pub fn pending_delete(&self) -> Option<ExpenseId> {
        self.pending_delete.pending()
    }

    /// Second delete phase: removes the pending expense and persists.
    pub fn confirm_delete(&mut self) -> ExpenseResult<Expense> {
        let id = self
            .pending_delete
            .confirm()
            .ok_or(ExpenseServiceError::NoPendingDelete)?;
        let index = self.index_of(id).ok_or(ExpenseServiceError::NotFound(id))?;

        let removed = self.expenses.remove(index);
        if let Err(err) = self.persist_expenses() {
            self.expenses.insert(index, removed);
            return Err(err);
        }

        info!(
            "event=expense_delete module=expense status=ok id={id} count={}",
            self.expenses.len()
        );
        Ok(removed)
    }

    /// Appends a new category label.
    ///
    /// # Errors
    /// - `BlankCategory` when `name` is blank after trimming.
    /// - `DuplicateCategory` on an exact (case-sensitive) match.
    pub fn add_category(&mut self, name: &str) -> ExpenseResult<String> {
        let label = normalize_category(name).ok_or(ExpenseServiceError::BlankCategory)?;
        if self.categories.iter().any(|existing| existing == &label) {
            return Err(ExpenseServiceError::DuplicateCategory(label));
        }

        self.categories.push(label.clone());
        if let Err(err) = save_json(&self.store, CATEGORIES_KEY, &self.categories) {
            self.categories.pop();
            return Err(err.into());
        }

        info!(
            "event=category_add module=expense status=ok count={}",
            self.categories.len()
        );
        Ok(label)
    }

    /// Derived figures as of the clock's current date.
    pub fn summary(&self) -> ExpenseSummary {
        self.summary_at(self.clock.today())
    }

    pub fn summary_at(&self, today: NaiveDate) -> ExpenseSummary {
        summarize(&self.expenses, today)
    }

    fn check_input(
        &self,
        amount: &str,
        description: &str,
        category: &str,
    ) -> ExpenseResult<(Decimal, String, String)> {
        if amount.trim().is_empty() {
            return Err(ExpenseValidationError::MissingAmount.into());
        }
        let description = description.trim();
        if description.is_empty() {
            return Err(ExpenseValidationError::MissingDescription.into());
        }
        let amount = parse_amount(amount)?;

        let category = category.trim();
        if !self.categories.iter().any(|known| known == category) {
            return Err(ExpenseServiceError::UnknownCategory(category.to_string()));
        }

        Ok((amount, description.to_string(), category.to_string()))
    }

    /// Rejects `amount` when the list total, with the record at `replacing`
    /// swapped out, would no longer be representable.
    fn ensure_total_fits(&self, amount: Decimal, replacing: Option<usize>) -> ExpenseResult<()> {
        self.expenses
            .iter()
            .enumerate()
            .filter(|(index, _)| Some(*index) != replacing)
            .try_fold(amount, |sum, (_, expense)| sum.checked_add(expense.amount))
            .map(|_| ())
            .ok_or_else(|| ExpenseValidationError::InvalidAmount(amount.to_string()).into())
    }

    fn index_of(&self, id: ExpenseId) -> Option<usize> {
        self.expenses.iter().position(|expense| expense.id == id)
    }

    fn persist_expenses(&self) -> ExpenseResult<()> {
        save_json(&self.store, EXPENSES_KEY, &self.expenses)?;
        Ok(())
    }
}

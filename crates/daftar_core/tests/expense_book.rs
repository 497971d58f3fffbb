use chrono::NaiveDate;
use daftar_core::db::open_db;
use daftar_core::db::open_db_in_memory;
use daftar_core::storage::local_store::{CATEGORIES_KEY, EXPENSES_KEY};
use daftar_core::{
    Expense, ExpenseBook, ExpenseServiceError, ExpenseValidationError, FixedClock, LocalStore,
    SqliteLocalStore, StoreError, StoreResult,
};
use rust_decimal::Decimal;
use std::cell::Cell;
use std::str::FromStr;

fn clock(day: u32) -> FixedClock {
    FixedClock(
        NaiveDate::from_ymd_opt(2026, 3, day)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap(),
    )
}

fn dec(value: &str) -> Decimal {
    Decimal::from_str(value).unwrap()
}

fn stored_expenses<S: LocalStore>(store: &S) -> Vec<Expense> {
    let raw = store.get_item(EXPENSES_KEY).unwrap().unwrap_or_default();
    if raw.is_empty() {
        return Vec::new();
    }
    serde_json::from_str(&raw).unwrap()
}

#[test]
fn fresh_store_starts_with_default_categories_and_no_expenses() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteLocalStore::new(&conn);
    let book = ExpenseBook::open_with_clock(store, clock(10)).unwrap();

    assert!(book.expenses().is_empty());
    assert_eq!(book.categories(), ["عام", "مواد", "معدات", "خدمات"]);
    assert_eq!(store.get_item(CATEGORIES_KEY).unwrap(), None);
}

#[test]
fn single_expense_in_custom_category() {
    let conn = open_db_in_memory().unwrap();
    let mut book = ExpenseBook::open_with_clock(SqliteLocalStore::new(&conn), clock(10)).unwrap();

    book.add_category("أجهزة إعلانات").unwrap();
    let created = book.create("50", "ads", "أجهزة إعلانات").unwrap();

    assert_eq!(book.expenses().len(), 1);
    assert_eq!(created.date, NaiveDate::from_ymd_opt(2026, 3, 10).unwrap());
    let summary = book.summary();
    assert_eq!(daftar_core::format_amount(summary.total), "50.00");
    assert_eq!(summary.category_totals.len(), 1);
    assert_eq!(summary.category_totals[0].category, "أجهزة إعلانات");
    assert_eq!(
        daftar_core::format_amount(summary.category_totals[0].total),
        "50.00"
    );
}

#[test]
fn two_expenses_in_same_category_sum_per_category() {
    let conn = open_db_in_memory().unwrap();
    let mut book = ExpenseBook::open_with_clock(SqliteLocalStore::new(&conn), clock(10)).unwrap();

    book.create("100", "cement", "مواد").unwrap();
    book.create("200", "bricks", "مواد").unwrap();

    let summary = book.summary();
    assert_eq!(summary.total, dec("300"));
    assert_eq!(summary.category_totals[0].total, dec("300"));
    assert_eq!(summary.average_per_day, dec("300"));
    assert_eq!(book.summary(), summary);
}

#[test]
fn new_expenses_are_listed_first_with_unique_ids() {
    let conn = open_db_in_memory().unwrap();
    let mut book = ExpenseBook::open_with_clock(SqliteLocalStore::new(&conn), clock(10)).unwrap();

    let first = book.create("1", "first", "عام").unwrap();
    let second = book.create("2", "second", "عام").unwrap();

    assert!(second.id > first.id);
    let ids: Vec<i64> = book.expenses().iter().map(|expense| expense.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);
}

#[test]
fn edit_amount_updates_total_and_keeps_length() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteLocalStore::new(&conn);
    let created = ExpenseBook::open_with_clock(store, clock(10))
        .unwrap()
        .create("50", "ads", "عام")
        .unwrap();

    let mut book = ExpenseBook::open_with_clock(store, clock(12)).unwrap();
    assert_eq!(book.summary().total, dec("50"));

    let updated = book
        .update(created.id, "75", "ads", "عام")
        .unwrap()
        .expect("expense should exist");

    assert_eq!(book.expenses().len(), 1);
    assert_eq!(book.summary().total, dec("75"));
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.date, NaiveDate::from_ymd_opt(2026, 3, 12).unwrap());
    assert_eq!(stored_expenses(&store), book.expenses());
}

#[test]
fn update_of_unknown_id_is_a_no_op() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteLocalStore::new(&conn);
    let mut book = ExpenseBook::open_with_clock(store, clock(10)).unwrap();

    assert_eq!(book.update(42, "1", "x", "عام").unwrap(), None);
    assert_eq!(store.get_item(EXPENSES_KEY).unwrap(), None);
}

#[test]
fn missing_fields_are_rejected_without_changing_list() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteLocalStore::new(&conn);
    let mut book = ExpenseBook::open_with_clock(store, clock(10)).unwrap();
    book.create("10", "kept", "عام").unwrap();

    let err = book.create("", "ads", "عام").unwrap_err();
    assert!(matches!(
        err,
        ExpenseServiceError::Validation(ExpenseValidationError::MissingAmount)
    ));
    let err = book.create("50", "   ", "عام").unwrap_err();
    assert!(matches!(
        err,
        ExpenseServiceError::Validation(ExpenseValidationError::MissingDescription)
    ));
    let err = book.create("-5", "ads", "عام").unwrap_err();
    assert!(matches!(
        err,
        ExpenseServiceError::Validation(ExpenseValidationError::InvalidAmount(_))
    ));
    let err = book.create("5", "ads", "missing").unwrap_err();
    assert!(matches!(err, ExpenseServiceError::UnknownCategory(_)));

    assert_eq!(book.expenses().len(), 1);
    assert_eq!(stored_expenses(&store), book.expenses());
}

#[test]
fn persisted_list_tracks_every_mutation() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteLocalStore::new(&conn);
    let mut book = ExpenseBook::open_with_clock(store, clock(10)).unwrap();

    let a = book.create("10", "a", "عام").unwrap();
    assert_eq!(stored_expenses(&store), book.expenses());
    let b = book.create("20.5", "b", "مواد").unwrap();
    assert_eq!(stored_expenses(&store), book.expenses());
    book.update(a.id, "11", "a2", "خدمات").unwrap();
    assert_eq!(stored_expenses(&store), book.expenses());
    book.request_delete(b.id).unwrap();
    book.confirm_delete().unwrap();
    assert_eq!(stored_expenses(&store), book.expenses());
    assert_eq!(book.expenses().len(), 1);
}

#[test]
fn delete_requires_confirmation() {
    let conn = open_db_in_memory().unwrap();
    let mut book = ExpenseBook::open_with_clock(SqliteLocalStore::new(&conn), clock(10)).unwrap();
    let created = book.create("10", "a", "عام").unwrap();

    book.request_delete(created.id).unwrap();
    assert_eq!(book.pending_delete(), Some(created.id));
    assert_eq!(book.expenses().len(), 1);

    assert_eq!(book.cancel_delete(), Some(created.id));
    assert!(matches!(
        book.confirm_delete().unwrap_err(),
        ExpenseServiceError::NoPendingDelete
    ));
    assert_eq!(book.expenses().len(), 1);

    assert!(matches!(
        book.request_delete(999).unwrap_err(),
        ExpenseServiceError::NotFound(999)
    ));

    book.request_delete(created.id).unwrap();
    let removed = book.confirm_delete().unwrap();
    assert_eq!(removed.id, created.id);
    assert!(book.expenses().is_empty());
    assert_eq!(book.pending_delete(), None);
}

#[test]
fn duplicate_and_blank_categories_are_rejected() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteLocalStore::new(&conn);
    let mut book = ExpenseBook::open_with_clock(store, clock(10)).unwrap();

    assert_eq!(book.add_category("  نقل  ").unwrap(), "نقل");
    let before = book.categories().len();
    assert!(matches!(
        book.add_category("نقل ").unwrap_err(),
        ExpenseServiceError::DuplicateCategory(_)
    ));
    assert!(matches!(
        book.add_category("   ").unwrap_err(),
        ExpenseServiceError::BlankCategory
    ));
    assert_eq!(book.categories().len(), before);

    let stored: Vec<String> =
        serde_json::from_str(&store.get_item(CATEGORIES_KEY).unwrap().unwrap()).unwrap();
    assert_eq!(stored, book.categories());
}

#[test]
fn reopening_file_store_yields_same_lists() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("daftar.sqlite3");

    let (expenses, categories) = {
        let conn = open_db(&path).unwrap();
        let mut book =
            ExpenseBook::open_with_clock(SqliteLocalStore::new(&conn), clock(10)).unwrap();
        book.add_category("أجهزة إعلانات").unwrap();
        book.create("50", "ads", "أجهزة إعلانات").unwrap();
        book.create("12.25", "tea", "عام").unwrap();
        (book.expenses().to_vec(), book.categories().to_vec())
    };

    let conn = open_db(&path).unwrap();
    let book = ExpenseBook::open_with_clock(SqliteLocalStore::new(&conn), clock(11)).unwrap();
    assert_eq!(book.expenses(), expenses.as_slice());
    assert_eq!(book.categories(), categories.as_slice());
}

#[test]
fn amounts_that_would_overflow_the_total_are_rejected() {
    let max_amount = "79228162514264337593543950335";
    let conn = open_db_in_memory().unwrap();
    let store = SqliteLocalStore::new(&conn);
    let mut book = ExpenseBook::open_with_clock(store, clock(10)).unwrap();

    let big = book.create(max_amount, "first", "عام").unwrap();
    let err = book.create(max_amount, "second", "عام").unwrap_err();
    assert!(matches!(
        err,
        ExpenseServiceError::Validation(ExpenseValidationError::InvalidAmount(_))
    ));
    assert!(book.create("1", "third", "عام").is_err());
    assert_eq!(book.expenses().len(), 1);
    assert_eq!(book.summary().total, Decimal::MAX);

    // Replacing a record's own amount does not count the old value.
    book.update(big.id, max_amount, "first again", "عام")
        .unwrap()
        .expect("expense should exist");

    book.update(big.id, "1", "first", "عام").unwrap();
    let small = book.create("5", "small", "عام").unwrap();
    let err = book
        .update(small.id, max_amount, "small", "عام")
        .unwrap_err();
    assert!(matches!(
        err,
        ExpenseServiceError::Validation(ExpenseValidationError::InvalidAmount(_))
    ));
    assert_eq!(book.get(small.id).unwrap().amount, dec("5"));
    assert_eq!(book.summary().total, dec("6"));
    assert_eq!(stored_expenses(&store), book.expenses());
}

#[test]
fn summary_survives_huge_week_over_week_ratio() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteLocalStore::new(&conn);
    ExpenseBook::open_with_clock(store, clock(1))
        .unwrap()
        .create("0.01", "prior week", "عام")
        .unwrap();

    let mut book = ExpenseBook::open_with_clock(store, clock(10)).unwrap();
    book.create("1000000000000000000000000000", "this week", "عام")
        .unwrap();

    let summary = book.summary();
    assert_eq!(summary.prior_week_total, dec("0.01"));
    assert_eq!(summary.week_over_week_change, None);
}

struct FlakyStore<S> {
    inner: S,
    fail_writes: Cell<bool>,
}

impl<S: LocalStore> LocalStore for FlakyStore<S> {
    fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
        self.inner.get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> StoreResult<()> {
        if self.fail_writes.get() {
            return Err(StoreError::from(rusqlite::Error::InvalidQuery));
        }
        self.inner.set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> StoreResult<()> {
        self.inner.remove_item(key)
    }
}

#[test]
fn failed_write_leaves_memory_and_store_unchanged() {
    let conn = open_db_in_memory().unwrap();
    let store = FlakyStore {
        inner: SqliteLocalStore::new(&conn),
        fail_writes: Cell::new(false),
    };
    let mut book = ExpenseBook::open_with_clock(&store, clock(10)).unwrap();
    let kept = book.create("10", "kept", "عام").unwrap();

    store.fail_writes.set(true);
    assert!(matches!(
        book.create("20", "lost", "عام").unwrap_err(),
        ExpenseServiceError::Store(_)
    ));
    assert!(matches!(
        book.update(kept.id, "99", "changed", "عام").unwrap_err(),
        ExpenseServiceError::Store(_)
    ));
    book.request_delete(kept.id).unwrap();
    assert!(book.confirm_delete().is_err());
    assert!(book.add_category("جديد").is_err());

    assert_eq!(book.expenses(), [kept]);
    assert_eq!(stored_expenses(&store.inner), book.expenses());
    assert_eq!(book.categories().len(), 4);
}

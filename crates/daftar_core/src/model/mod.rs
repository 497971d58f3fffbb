//! Domain records persisted in the local store.
//!
//! # Responsibility
//! - Define the expense, category and note shapes shared by books, metrics
//!   and the CLI.
//! - Validate user input before it reaches a book.
//!
//! # Invariants
//! - Record ids are creation timestamps in epoch milliseconds, unique per
//!   data set.
//! - Dates are ISO 8601 calendar dates (`YYYY-MM-DD`).

pub mod category;
pub mod expense;
pub mod note;

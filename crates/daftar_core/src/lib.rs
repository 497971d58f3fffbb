//! Core domain logic for Daftar, a personal expense book and notes pad.
//! This crate is the single source of truth for business invariants.

pub mod auth;
pub mod clock;
pub mod config;
pub mod db;
pub mod logging;
pub mod metrics;
pub mod model;
pub mod service;
pub mod storage;

pub use auth::gate::{AuthGate, AuthGateError, GateCredentials, LoginOutcome, ResetOutcome};
pub use auth::hosted::{HostedAuthConfig, HostedAuthProvider};
pub use auth::provider::{AuthError, AuthProvider, AuthResult, AuthUser, Session};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{AppConfig, AuthSettings, ConfigError};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use metrics::{CategoryTotal, ExpenseSummary};
pub use model::category::{default_categories, DEFAULT_CATEGORY};
pub use model::expense::{format_amount, Expense, ExpenseId, ExpenseValidationError};
pub use model::note::{Note, NoteId, NoteType, NoteValidationError};
pub use service::expense_service::{ExpenseBook, ExpenseResult, ExpenseServiceError};
pub use service::note_service::{NoteBook, NoteResult, NoteServiceError};
pub use storage::local_store::{LocalStore, SqliteLocalStore, StoreError, StoreResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

//! Local key-value persistence.
//!
//! # Responsibility
//! - Provide the `getItem/setItem/removeItem` contract every data set persists
//!   through.
//! - Keep SQLite details out of the books and the auth client.
//!
//! # Invariants
//! - Values are opaque UTF-8 strings; typed access goes through
//!   `load_json`/`save_json`.
//! - Writes are immediate (write-through); there is no batching layer.

pub mod local_store;

//! Core use-case services.
//!
//! # Responsibility
//! - Expose the expense and note books the front end drives.
//! - Keep front ends decoupled from storage details.

pub mod expense_service;
pub mod note_service;
pub mod pending_delete;

//! Authentication gate over a hosted auth provider.
//!
//! # Responsibility
//! - Define the provider capability the rest of the app depends on.
//! - Implement the hosted REST client and its retrying HTTP transport.
//! - Apply the single-user login policy (username check, provisioning
//!   fallback, password reset).
//!
//! # Invariants
//! - The provider is always injected; there is no process-wide client.
//! - Passwords and tokens are never written to logs.

pub mod gate;
pub mod hosted;
pub mod provider;
pub mod transport;

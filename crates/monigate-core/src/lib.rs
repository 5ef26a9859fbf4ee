//! monigate core: transport-agnostic domain types and the shared error surface.
//!
//! This crate defines the identity model, per-request event records, and the
//! error taxonomy shared by the gateway and its tests. It intentionally carries
//! no HTTP or runtime dependencies so it can be reused by other front ends.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths must surface as `MonigateError`/`Result`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod event;
pub mod identity;

/// Shared result type.
pub use error::{Result, MonigateError};
pub use event::{AuditEntry, RequestEvent};
pub use identity::{Identity, Role};

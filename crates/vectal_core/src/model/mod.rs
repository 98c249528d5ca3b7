//! Domain records for notes and tasks.
//!
//! # Responsibility
//! - Define the canonical shapes persisted by the repository layer.
//! - Keep record-level invariants (`validate`, version bookkeeping) next to
//!   the data they guard.
//!
//! # Invariants
//! - Every record is identified by a stable UUID.
//! - Note version history is append-only.

pub mod note;
pub mod task;

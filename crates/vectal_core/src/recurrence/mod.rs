//! Recurrence rules for repeating tasks.
//!
//! # Responsibility
//! - Parse and serialize the compact recurrence grammar.
//! - Compute future occurrence timestamps deterministically.
//!
//! # Invariants
//! - Everything here is pure: no I/O, no shared state.
//! - Malformed rules surface as `None`/empty results, never as errors.

pub mod engine;
pub mod rule;

pub use engine::{advance, generate_occurrences, next_occurrence, CalendarTimestamp};
pub use rule::{
    parse, parse_general, serialize, Frequency, ParsedRecurrence, RawRule, RecurrenceError,
    RecurrenceSpec,
};

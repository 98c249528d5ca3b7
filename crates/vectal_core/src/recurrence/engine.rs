//! Occurrence computation over recurrence rules.
//!
//! # Responsibility
//! - Advance an anchor timestamp by whole recurrence periods.
//! - Materialize finite occurrence sequences.
//!
//! # Invariants
//! - Occurrence `k` is `k` periods from the anchor, never chained from
//!   occurrence `k - 1`.
//! - Arithmetic is naive calendar arithmetic on the anchor's local fields;
//!   an anchor offset is carried through unchanged.
//! - Month/year overflow clamps to the last valid day of the target month.
//! - Unknown rules and out-of-range results yield `None`, never a panic.

use super::rule::{parse_general, Frequency, RecurrenceSpec};
use chrono::{DateTime, Days, Duration, Months, NaiveDateTime, Offset, TimeZone};

/// Timestamp that supports calendar-field arithmetic.
///
/// Implementors expose their wall-clock fields and rebuild themselves from
/// shifted fields while keeping any zone information they carry.
pub trait CalendarTimestamp: Sized {
    /// Wall-clock date and time fields.
    fn local_fields(&self) -> NaiveDateTime;

    /// Same zone/offset as `self`, with new wall-clock fields.
    fn with_local_fields(&self, local: NaiveDateTime) -> Option<Self>;
}

impl CalendarTimestamp for NaiveDateTime {
    fn local_fields(&self) -> NaiveDateTime {
        *self
    }

    fn with_local_fields(&self, local: NaiveDateTime) -> Option<Self> {
        Some(local)
    }
}

impl<Tz: TimeZone> CalendarTimestamp for DateTime<Tz> {
    fn local_fields(&self) -> NaiveDateTime {
        self.naive_local()
    }

    fn with_local_fields(&self, local: NaiveDateTime) -> Option<Self> {
        let offset = self.offset().clone();
        let offset_seconds = i64::from(offset.fix().local_minus_utc());
        let utc = local.checked_sub_signed(Duration::seconds(offset_seconds))?;
        Some(DateTime::from_naive_utc_and_offset(utc, offset))
    }
}

/// Advances `anchor` by `count` periods of `spec`.
///
/// `count == 0` returns the anchor itself.
pub fn advance<T: CalendarTimestamp>(anchor: &T, spec: RecurrenceSpec, count: u32) -> Option<T> {
    let periods = spec.interval().checked_mul(count)?;
    let local = anchor.local_fields();
    let shifted = match spec.frequency() {
        Frequency::Daily => local.checked_add_days(Days::new(u64::from(periods)))?,
        Frequency::Weekly => local.checked_add_days(Days::new(u64::from(periods) * 7))?,
        Frequency::Monthly => local.checked_add_months(Months::new(periods))?,
        Frequency::Yearly => local.checked_add_months(Months::new(periods.checked_mul(12)?))?,
    };
    anchor.with_local_fields(shifted)
}

/// Computes the occurrence `count` periods after `anchor` for a general-form
/// rule such as `FREQ=WEEKLY;INTERVAL=2`.
///
/// Returns `None` when the rule does not name a known frequency, including
/// shorthand strings like `daily`.
pub fn next_occurrence<T: CalendarTimestamp>(anchor: &T, rule: &str, count: u32) -> Option<T> {
    let spec = parse_general(rule).to_spec()?;
    advance(anchor, spec, count)
}

/// Computes occurrences `1..=n` periods after `anchor`.
///
/// An unknown rule yields an empty list. The list stops early only if a
/// later occurrence falls outside the representable date range.
pub fn generate_occurrences<T: CalendarTimestamp>(anchor: &T, rule: &str, n: u32) -> Vec<T> {
    let Some(spec) = parse_general(rule).to_spec() else {
        return Vec::new();
    };
    (1..=n)
        .map_while(|count| advance(anchor, spec, count))
        .collect()
}

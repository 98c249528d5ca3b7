//! Recurrence rule grammar.
//!
//! # Responsibility
//! - Parse shorthand (`daily`) and general (`FREQ=DAILY;INTERVAL=2`) inputs.
//! - Serialize typed specs back to the general form.
//!
//! # Invariants
//! - `RecurrenceSpec::interval` is always `>= 1`.
//! - Parsing never fails loudly: malformed input maps to
//!   `ParsedRecurrence::Unparseable` or an empty `RawRule`.
//! - General-form keys and values are kept verbatim (case-sensitive).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

pub const FREQ_KEY: &str = "FREQ";
pub const INTERVAL_KEY: &str = "INTERVAL";

/// Error for typed recurrence construction.
///
/// Only caller-side validation paths produce this; the parser itself maps
/// bad input to sentinel values instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecurrenceError {
    UnknownFrequency(String),
    ZeroInterval,
}

impl Display for RecurrenceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownFrequency(value) => write!(
                f,
                "unknown frequency `{value}`; expected daily|weekly|monthly|yearly"
            ),
            Self::ZeroInterval => write!(f, "recurrence interval must be >= 1"),
        }
    }
}

impl Error for RecurrenceError {}

/// Repeat unit of a recurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    /// Upper-case token used in the general form.
    pub fn as_rule_token(self) -> &'static str {
        match self {
            Self::Daily => "DAILY",
            Self::Weekly => "WEEKLY",
            Self::Monthly => "MONTHLY",
            Self::Yearly => "YEARLY",
        }
    }

    /// Matches a general-form `FREQ` value exactly as written.
    pub fn from_rule_token(token: &str) -> Option<Self> {
        match token {
            "DAILY" => Some(Self::Daily),
            "WEEKLY" => Some(Self::Weekly),
            "MONTHLY" => Some(Self::Monthly),
            "YEARLY" => Some(Self::Yearly),
            _ => None,
        }
    }
}

impl FromStr for Frequency {
    type Err = RecurrenceError;

    /// Case-insensitive parse used for shorthand input and request params.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            _ => Err(RecurrenceError::UnknownFrequency(value.to_string())),
        }
    }
}

impl Display for Frequency {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_rule_token())
    }
}

/// Typed frequency + interval pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecurrenceSpec {
    frequency: Frequency,
    interval: u32,
}

impl RecurrenceSpec {
    /// Creates a spec, rejecting a zero interval.
    pub fn new(frequency: Frequency, interval: u32) -> Result<Self, RecurrenceError> {
        if interval == 0 {
            return Err(RecurrenceError::ZeroInterval);
        }
        Ok(Self {
            frequency,
            interval,
        })
    }

    /// Shorthand spec: one period of `frequency`.
    pub fn every(frequency: Frequency) -> Self {
        Self {
            frequency,
            interval: 1,
        }
    }

    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    pub fn interval(&self) -> u32 {
        self.interval
    }

    /// General-form text for this spec.
    pub fn to_rule_string(&self) -> String {
        serialize(self.frequency, self.interval)
    }
}

impl Display for RecurrenceSpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_rule_string())
    }
}

/// Raw `KEY=VALUE` mapping of a general-form rule.
///
/// Keys keep their original spelling; an empty mapping means the input had
/// no recognizable structure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRule {
    fields: BTreeMap<String, String>,
}

impl RawRule {
    /// Looks up a key verbatim (`"FREQ"`, not `"freq"`).
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Known frequency from `FREQ`, if any.
    pub fn frequency(&self) -> Option<Frequency> {
        self.get(FREQ_KEY).and_then(Frequency::from_rule_token)
    }

    /// Interval from `INTERVAL`; a missing key means 1.
    ///
    /// Returns `None` for non-numeric or zero values.
    pub fn interval(&self) -> Option<u32> {
        match self.get(INTERVAL_KEY) {
            None => Some(1),
            Some(value) => value.parse::<u32>().ok().filter(|interval| *interval >= 1),
        }
    }

    /// Typed view of this rule, when it names a known frequency.
    pub fn to_spec(&self) -> Option<RecurrenceSpec> {
        Some(RecurrenceSpec {
            frequency: self.frequency()?,
            interval: self.interval()?,
        })
    }
}

/// Result of [`parse`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedRecurrence {
    /// Empty input: no recurrence configured.
    None,
    /// Single-word input such as `weekly`.
    Shorthand(RecurrenceSpec),
    /// `;`-delimited `KEY=VALUE` pairs, kept raw.
    General(RawRule),
    /// Input matched neither grammar.
    Unparseable,
}

impl ParsedRecurrence {
    /// Typed spec for shorthand input or a general rule with a known `FREQ`.
    pub fn spec(&self) -> Option<RecurrenceSpec> {
        match self {
            Self::Shorthand(spec) => Some(*spec),
            Self::General(raw) => raw.to_spec(),
            Self::None | Self::Unparseable => None,
        }
    }

    /// Raw mapping, only for general-form input.
    pub fn raw(&self) -> Option<&RawRule> {
        match self {
            Self::General(raw) => Some(raw),
            _ => None,
        }
    }
}

/// Parses shorthand or general recurrence input.
pub fn parse(input: &str) -> ParsedRecurrence {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return ParsedRecurrence::None;
    }

    if let Ok(frequency) = trimmed.parse::<Frequency>() {
        return ParsedRecurrence::Shorthand(RecurrenceSpec::every(frequency));
    }

    let raw = parse_general(input);
    if raw.is_empty() {
        ParsedRecurrence::Unparseable
    } else {
        ParsedRecurrence::General(raw)
    }
}

/// Parses only the general `KEY=VALUE;KEY=VALUE` form.
///
/// Segments without `=` or with an empty key are skipped; the last value of
/// a repeated key wins.
pub fn parse_general(input: &str) -> RawRule {
    let mut fields = BTreeMap::new();
    for segment in input.split(';') {
        let Some((key, value)) = segment.split_once('=') else {
            continue;
        };
        if key.is_empty() {
            continue;
        }
        fields.insert(key.to_string(), value.to_string());
    }
    RawRule { fields }
}

/// Serializes a frequency and interval to `FREQ=<FREQ>;INTERVAL=<n>`.
pub fn serialize(frequency: Frequency, interval: u32) -> String {
    format!(
        "{FREQ_KEY}={};{INTERVAL_KEY}={interval}",
        frequency.as_rule_token()
    )
}

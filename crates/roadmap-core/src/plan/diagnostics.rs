//! Structured record of what the decoder and normalizer had to do.
//!
//! Recovery from malformed cells is silent to callers by default; this value
//! is how they (and tests) find out which strategy worked and what was
//! dropped along the way.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

/// A decoding strategy, in the order the decoder tries them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecodeStrategy {
    Direct,
    DoubleEncoded,
    EntityDecoded,
    EntityDoubleEncoded,
    Substring,
    /// The brace span of the raw text, tried when the entity-decoded span
    /// did not parse.
    RawSubstring,
}

impl fmt::Display for DecodeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Direct => "direct",
            Self::DoubleEncoded => "double_encoded",
            Self::EntityDecoded => "entity_decoded",
            Self::EntityDoubleEncoded => "entity_double_encoded",
            Self::Substring => "substring",
            Self::RawSubstring => "raw_substring",
        };
        f.write_str(s)
    }
}

/// What a single decode attempt produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    /// Parsed to an object or array; the attempt won.
    Structured,
    /// Parsed, but to a scalar, which is not a plan.
    Scalar,
    /// Not valid JSON.
    Invalid,
    /// Nothing to try (no entities to decode, no braces to slice).
    Skipped,
}

/// One recovery step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RecoveryEvent {
    DecodeAttempt {
        strategy: DecodeStrategy,
        outcome: AttemptOutcome,
    },
    /// The decoded value was not an object, so it cannot be a plan.
    NotAnObject { kind: &'static str },
    /// A month-keyed mapping was turned into the milestone sequence.
    MonthKeysRecovered { source: String, count: usize },
    /// A key in a month-keyed mapping that names no month.
    MonthKeyIgnored { key: String },
    /// `monthly_plan` was itself an encoded string and was decoded again.
    NestedPlanDecoded,
    /// `monthly_plan` had a shape no milestone list can be read from.
    MonthlyPlanUnrecoverable { kind: &'static str },
    EntryDropped { index: usize, kind: &'static str },
    CourseRecDropped { index: usize, kind: &'static str },
    GoalFromAlias { index: usize },
    WeeklyPracticesDefaulted { index: usize },
    WeeklyPracticeDropped {
        index: usize,
        position: usize,
        kind: &'static str,
    },
}

/// Ordered list of recovery events for one decode/normalize run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Diagnostics {
    events: Vec<RecoveryEvent>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: RecoveryEvent) {
        self.events.push(event);
    }

    pub(crate) fn attempt(&mut self, strategy: DecodeStrategy, outcome: AttemptOutcome) {
        self.push(RecoveryEvent::DecodeAttempt { strategy, outcome });
    }

    pub fn events(&self) -> &[RecoveryEvent] {
        &self.events
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// The strategy that produced the decoded value, if any did.
    pub fn succeeded_strategy(&self) -> Option<DecodeStrategy> {
        self.events.iter().find_map(|event| match event {
            RecoveryEvent::DecodeAttempt {
                strategy,
                outcome: AttemptOutcome::Structured,
            } => Some(*strategy),
            _ => None,
        })
    }

    /// Indices (in the recovered sequence) of milestone entries that were
    /// dropped.
    pub fn dropped_entries(&self) -> Vec<usize> {
        self.events
            .iter()
            .filter_map(|event| match event {
                RecoveryEvent::EntryDropped { index, .. } => Some(*index),
                _ => None,
            })
            .collect()
    }

    /// Whether any upstream data was discarded rather than repaired.
    pub fn has_data_loss(&self) -> bool {
        self.events.iter().any(|event| {
            matches!(
                event,
                RecoveryEvent::EntryDropped { .. }
                    | RecoveryEvent::CourseRecDropped { .. }
                    | RecoveryEvent::WeeklyPracticeDropped { .. }
                    | RecoveryEvent::MonthlyPlanUnrecoverable { .. }
            )
        })
    }
}

/// JSON type name used in diagnostics.
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

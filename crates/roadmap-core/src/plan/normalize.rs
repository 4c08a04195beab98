//! Plan normalization: recover a canonical [`RoadmapPlan`] from a decoded
//! but possibly misshapen value.
//!
//! Two passes:
//!
//! - **key normalization** finds the milestone data when it is not under
//!   `monthly_plan`, e.g. months serialized as `"1"`, `"month 2"` object keys;
//! - **loose object normalization** resolves `monthly_plan` into one ordered
//!   sequence and repairs each entry.
//!
//! The result re-normalizes to itself, so callers may apply it more than once.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};

use super::decode::decode_traced;
use super::diagnostics::{Diagnostics, RecoveryEvent, json_kind};
use super::types::{CourseRec, MilestoneEntry, RoadmapPlan};

const MONTHLY_PLAN: &str = "monthly_plan";
const MONTHLY_PLAN_CAMEL: &str = "monthlyPlan";
const ROOT_SOURCE: &str = "<root>";

fn month_key_re() -> &'static Regex {
    static MONTH_KEY_RE: OnceLock<Regex> = OnceLock::new();
    MONTH_KEY_RE.get_or_init(|| {
        Regex::new(r"(?i)^\s*(?:(?:month|milestone)[\s_-]*)?(\d{1,4})\s*$")
            .expect("valid month key regex")
    })
}

/// Month number named by a mapping key: `"3"`, `"month 3"`, `"Milestone_3"`.
pub fn month_number(key: &str) -> Option<u32> {
    let captures = month_key_re().captures(key)?;
    captures.get(1)?.as_str().parse().ok()
}

/// Normalize a decoded plan value.
///
/// Returns `None` when `parsed` is absent or not an object.
pub fn normalize(parsed: Option<&Value>) -> Option<RoadmapPlan> {
    normalize_traced(parsed, &mut Diagnostics::new())
}

/// [`normalize`], recording every repair and drop in `diag`.
pub fn normalize_traced(parsed: Option<&Value>, diag: &mut Diagnostics) -> Option<RoadmapPlan> {
    let parsed = parsed?;
    let Some(object) = parsed.as_object() else {
        diag.push(RecoveryEvent::NotAnObject {
            kind: json_kind(parsed),
        });
        return None;
    };

    let monthly_plan = locate_monthly_plan(object, diag)
        .and_then(|raw| resolve_sequence(raw, diag, true))
        .map(|items| normalize_entries(items, diag))
        .filter(|entries| !entries.is_empty());

    Some(RoadmapPlan {
        northstar: scalar_string(object.get("northstar")).unwrap_or_default(),
        monthly_plan,
    })
}

// ---------------------------------------------------------------------------
// Pass 1: key normalization
// ---------------------------------------------------------------------------

/// Find the raw milestone data for the plan object.
///
/// `monthly_plan` wins, then `monthlyPlan`, then the first field holding a
/// month-keyed mapping, then month-keyed fields on the plan object itself.
fn locate_monthly_plan(object: &Map<String, Value>, diag: &mut Diagnostics) -> Option<Value> {
    for key in [MONTHLY_PLAN, MONTHLY_PLAN_CAMEL] {
        match object.get(key) {
            None | Some(Value::Null) => {}
            Some(value) => return Some(value.clone()),
        }
    }

    let nested = object.iter().find(|(key, value)| {
        key.as_str() != "northstar"
            && value
                .as_object()
                .is_some_and(|inner| inner.keys().any(|k| month_number(k).is_some()))
    });
    if let Some((key, value)) = nested {
        let Value::Object(mapping) = value else {
            return None;
        };
        return Some(Value::Array(months_from_mapping(mapping, key, diag)));
    }

    if object.keys().any(|k| month_number(k).is_some()) {
        return Some(Value::Array(months_from_mapping(object, ROOT_SOURCE, diag)));
    }

    None
}

/// Turn a month-keyed mapping into a sequence ordered by month number.
///
/// Keys naming no month are skipped. Keys naming the same month keep the
/// mapping's iteration order.
fn months_from_mapping(
    mapping: &Map<String, Value>,
    source: &str,
    diag: &mut Diagnostics,
) -> Vec<Value> {
    let mut months: Vec<(u32, &Value)> = Vec::with_capacity(mapping.len());
    for (key, value) in mapping {
        match month_number(key) {
            Some(number) => months.push((number, value)),
            None if source == ROOT_SOURCE => {}
            None => diag.push(RecoveryEvent::MonthKeyIgnored { key: key.clone() }),
        }
    }
    months.sort_by_key(|(number, _)| *number);

    diag.push(RecoveryEvent::MonthKeysRecovered {
        source: source.to_owned(),
        count: months.len(),
    });
    months.into_iter().map(|(_, value)| value.clone()).collect()
}

// ---------------------------------------------------------------------------
// Pass 2: loose object normalization
// ---------------------------------------------------------------------------

/// Resolve raw `monthly_plan` data into a sequence of raw entries.
///
/// `allow_nested` permits one round of decoding when the data is itself an
/// encoded string.
fn resolve_sequence(raw: Value, diag: &mut Diagnostics, allow_nested: bool) -> Option<Vec<Value>> {
    match raw {
        Value::Array(items) => Some(items),
        Value::Object(mapping) => {
            if mapping.keys().any(|k| month_number(k).is_some()) {
                Some(months_from_mapping(&mapping, MONTHLY_PLAN, diag))
            } else {
                diag.push(RecoveryEvent::MonthlyPlanUnrecoverable { kind: "object" });
                None
            }
        }
        Value::String(text) if allow_nested => match decode_traced(Some(&text), diag) {
            Some(decoded) => {
                diag.push(RecoveryEvent::NestedPlanDecoded);
                resolve_sequence(decoded, diag, false)
            }
            None => {
                diag.push(RecoveryEvent::MonthlyPlanUnrecoverable { kind: "string" });
                None
            }
        },
        other => {
            diag.push(RecoveryEvent::MonthlyPlanUnrecoverable {
                kind: json_kind(&other),
            });
            None
        }
    }
}

/// Repair each entry; entries that are not objects are dropped.
fn normalize_entries(items: Vec<Value>, diag: &mut Diagnostics) -> Vec<MilestoneEntry> {
    items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| match item {
            Value::Object(entry) => Some(normalize_entry(index, entry, diag)),
            other => {
                diag.push(RecoveryEvent::EntryDropped {
                    index,
                    kind: json_kind(other),
                });
                None
            }
        })
        .collect()
}

fn normalize_entry(
    index: usize,
    entry: &Map<String, Value>,
    diag: &mut Diagnostics,
) -> MilestoneEntry {
    let milestone = scalar_string(entry.get("milestone"));
    let goal = match scalar_string(entry.get("goal")).filter(|g| !g.is_empty()) {
        Some(goal) => goal,
        None => match &milestone {
            Some(alias) => {
                diag.push(RecoveryEvent::GoalFromAlias { index });
                alias.clone()
            }
            None => String::new(),
        },
    };

    let course_rec = match entry.get("course_rec") {
        None | Some(Value::Null) => None,
        Some(Value::Object(rec)) => Some(CourseRec::from_object(rec)),
        Some(other) => {
            diag.push(RecoveryEvent::CourseRecDropped {
                index,
                kind: json_kind(other),
            });
            None
        }
    };

    MilestoneEntry {
        focus: scalar_string(entry.get("focus")).unwrap_or_default(),
        goal,
        milestone,
        weekly_practices: weekly_practices(index, entry.get("weekly_practices"), diag),
        course_rec,
    }
}

fn weekly_practices(index: usize, raw: Option<&Value>, diag: &mut Diagnostics) -> Vec<String> {
    match raw {
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .filter_map(|(position, item)| {
                let practice = scalar_string(Some(item));
                if practice.is_none() {
                    diag.push(RecoveryEvent::WeeklyPracticeDropped {
                        index,
                        position,
                        kind: json_kind(item),
                    });
                }
                practice
            })
            .collect(),
        Some(Value::String(single)) if !single.trim().is_empty() => vec![single.clone()],
        _ => {
            diag.push(RecoveryEvent::WeeklyPracticesDefaulted { index });
            Vec::new()
        }
    }
}

/// Strings as-is, numbers and booleans stringified, anything else absent.
fn scalar_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

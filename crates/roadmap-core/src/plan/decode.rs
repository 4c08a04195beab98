//! Tolerant decoding of raw plan cells.
//!
//! Strategies run strictest first and the first one that yields an object
//! or array wins:
//!
//! 1. direct parse,
//! 2. parse again when step 1 produced a JSON string (double encoding),
//! 3. steps 1-2 on the HTML-entity-decoded text,
//! 4. parse the span from the first `{` to the last `}`, on the
//!    entity-decoded text and then, if that changed anything, on the raw text.
//!
//! Scalars never count as success. Nothing here fails: unrecoverable input
//! yields `None`.

use serde_json::Value;

use super::diagnostics::{AttemptOutcome, DecodeStrategy, Diagnostics};
use super::entities::decode_entities;

/// Decode a raw cell into a JSON object or array.
pub fn decode(raw: Option<&str>) -> Option<Value> {
    decode_traced(raw, &mut Diagnostics::new())
}

/// [`decode`], recording every attempt in `diag`.
pub fn decode_traced(raw: Option<&str>, diag: &mut Diagnostics) -> Option<Value> {
    let raw = raw?;

    if let Some(value) = parse_layers(
        raw,
        DecodeStrategy::Direct,
        DecodeStrategy::DoubleEncoded,
        diag,
    ) {
        return Some(value);
    }

    let decoded = decode_entities(raw);
    if decoded != raw {
        if let Some(value) = parse_layers(
            &decoded,
            DecodeStrategy::EntityDecoded,
            DecodeStrategy::EntityDoubleEncoded,
            diag,
        ) {
            return Some(value);
        }
    } else {
        diag.attempt(DecodeStrategy::EntityDecoded, AttemptOutcome::Skipped);
    }

    if let Some(value) = extract_embedded(&decoded, DecodeStrategy::Substring, diag) {
        return Some(value);
    }
    if decoded != raw {
        return extract_embedded(raw, DecodeStrategy::RawSubstring, diag);
    }
    None
}

/// Decode a value that may already be parsed.
///
/// Objects and arrays pass through, strings are decoded as raw cells, other
/// scalars yield `None`.
pub fn decode_value(value: &Value) -> Option<Value> {
    decode_value_traced(value, &mut Diagnostics::new())
}

/// [`decode_value`], recording every attempt in `diag`.
pub fn decode_value_traced(value: &Value, diag: &mut Diagnostics) -> Option<Value> {
    match value {
        Value::Object(_) | Value::Array(_) => {
            diag.attempt(DecodeStrategy::Direct, AttemptOutcome::Structured);
            Some(value.clone())
        }
        Value::String(text) => decode_traced(Some(text), diag),
        Value::Null => None,
        _ => {
            diag.attempt(DecodeStrategy::Direct, AttemptOutcome::Scalar);
            None
        }
    }
}

fn is_structured(value: &Value) -> bool {
    matches!(value, Value::Object(_) | Value::Array(_))
}

/// Parse `text`, and when it holds a JSON string, parse that string once more.
fn parse_layers(
    text: &str,
    outer: DecodeStrategy,
    inner: DecodeStrategy,
    diag: &mut Diagnostics,
) -> Option<Value> {
    match serde_json::from_str::<Value>(text) {
        Ok(value) if is_structured(&value) => {
            diag.attempt(outer, AttemptOutcome::Structured);
            Some(value)
        }
        Ok(Value::String(inner_text)) => {
            diag.attempt(outer, AttemptOutcome::Scalar);
            match serde_json::from_str::<Value>(&inner_text) {
                Ok(value) if is_structured(&value) => {
                    diag.attempt(inner, AttemptOutcome::Structured);
                    Some(value)
                }
                Ok(_) => {
                    diag.attempt(inner, AttemptOutcome::Scalar);
                    None
                }
                Err(_) => {
                    diag.attempt(inner, AttemptOutcome::Invalid);
                    None
                }
            }
        }
        Ok(_) => {
            diag.attempt(outer, AttemptOutcome::Scalar);
            None
        }
        Err(_) => {
            diag.attempt(outer, AttemptOutcome::Invalid);
            None
        }
    }
}

/// Parse the span between the first `{` and the last `}`.
fn extract_embedded(
    text: &str,
    strategy: DecodeStrategy,
    diag: &mut Diagnostics,
) -> Option<Value> {
    let span = match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => {
            diag.attempt(strategy, AttemptOutcome::Skipped);
            return None;
        }
    };

    match serde_json::from_str::<Value>(span) {
        Ok(value) if is_structured(&value) => {
            diag.attempt(strategy, AttemptOutcome::Structured);
            Some(value)
        }
        Ok(_) => {
            diag.attempt(strategy, AttemptOutcome::Scalar);
            None
        }
        Err(_) => {
            diag.attempt(strategy, AttemptOutcome::Invalid);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::diagnostics::RecoveryEvent;
    use serde_json::json;

    fn decode_with_strategy(raw: &str) -> (Option<Value>, Option<DecodeStrategy>) {
        let mut diag = Diagnostics::new();
        let value = decode_traced(Some(raw), &mut diag);
        (value, diag.succeeded_strategy())
    }

    #[test]
    fn direct_object() {
        let (value, strategy) = decode_with_strategy(r#"{"northstar":"x","monthly_plan":[]}"#);
        assert_eq!(value, Some(json!({ "northstar": "x", "monthly_plan": [] })));
        assert_eq!(strategy, Some(DecodeStrategy::Direct));
    }

    #[test]
    fn direct_array() {
        let (value, strategy) = decode_with_strategy("  [1, 2]\n");
        assert_eq!(value, Some(json!([1, 2])));
        assert_eq!(strategy, Some(DecodeStrategy::Direct));
    }

    #[test]
    fn double_encoded_returns_inner_object() {
        let raw = r#""{\"northstar\":\"x\",\"monthly_plan\":[]}""#;
        let (value, strategy) = decode_with_strategy(raw);
        assert_eq!(value, Some(json!({ "northstar": "x", "monthly_plan": [] })));
        assert_eq!(strategy, Some(DecodeStrategy::DoubleEncoded));
    }

    #[test]
    fn entity_encoded() {
        let (value, strategy) = decode_with_strategy("{&quot;northstar&quot;:&quot;x&quot;}");
        assert_eq!(value, Some(json!({ "northstar": "x" })));
        assert_eq!(strategy, Some(DecodeStrategy::EntityDecoded));
    }

    #[test]
    fn entity_encoded_and_double_encoded() {
        let raw = r#"&quot;{\&quot;northstar\&quot;:\&quot;x\&quot;}&quot;"#;
        let (value, strategy) = decode_with_strategy(raw);
        assert_eq!(value, Some(json!({ "northstar": "x" })));
        assert_eq!(strategy, Some(DecodeStrategy::EntityDoubleEncoded));
    }

    #[test]
    fn embedded_in_text() {
        let raw = r#"LOG: prefix {"northstar":"x","monthly_plan":[]} trailing"#;
        let (value, strategy) = decode_with_strategy(raw);
        assert_eq!(value, Some(json!({ "northstar": "x", "monthly_plan": [] })));
        assert_eq!(strategy, Some(DecodeStrategy::Substring));
    }

    #[test]
    fn embedded_after_entity_decoding() {
        let raw = "saved: {&quot;northstar&quot;:&quot;x&quot;} (truncated";
        let (value, strategy) = decode_with_strategy(raw);
        assert_eq!(value, Some(json!({ "northstar": "x" })));
        assert_eq!(strategy, Some(DecodeStrategy::Substring));
    }

    #[test]
    fn embedded_with_entities_inside_string_values() {
        let raw = r#"LOG: {"northstar":"say &quot;hi&quot;","monthly_plan":[]} end"#;
        let mut diag = Diagnostics::new();
        let value = decode_traced(Some(raw), &mut diag);
        assert_eq!(
            value,
            Some(json!({ "northstar": "say &quot;hi&quot;", "monthly_plan": [] }))
        );
        assert_eq!(diag.succeeded_strategy(), Some(DecodeStrategy::RawSubstring));
        assert!(diag.events().contains(&RecoveryEvent::DecodeAttempt {
            strategy: DecodeStrategy::Substring,
            outcome: AttemptOutcome::Invalid,
        }));
    }

    #[test]
    fn irrecoverable_input() {
        assert_eq!(decode(None), None);
        assert_eq!(decode(Some("not json at all")), None);
        assert_eq!(decode(Some("")), None);
        assert_eq!(decode(Some("} backwards {")), None);
        assert_eq!(decode(Some("{ broken")), None);
    }

    #[test]
    fn scalars_are_rejected() {
        assert_eq!(decode(Some("42")), None);
        assert_eq!(decode(Some("true")), None);
        assert_eq!(decode(Some("null")), None);
        assert_eq!(decode(Some(r#""just a string""#)), None);
        assert_eq!(decode(Some(r#""\"quoted twice\"""#)), None);
    }

    #[test]
    fn attempts_are_recorded_in_order() {
        let mut diag = Diagnostics::new();
        assert_eq!(decode_traced(Some("not json at all"), &mut diag), None);
        assert_eq!(
            diag.events(),
            &[
                RecoveryEvent::DecodeAttempt {
                    strategy: DecodeStrategy::Direct,
                    outcome: AttemptOutcome::Invalid,
                },
                RecoveryEvent::DecodeAttempt {
                    strategy: DecodeStrategy::EntityDecoded,
                    outcome: AttemptOutcome::Skipped,
                },
                RecoveryEvent::DecodeAttempt {
                    strategy: DecodeStrategy::Substring,
                    outcome: AttemptOutcome::Skipped,
                },
            ]
        );
    }

    #[test]
    fn decode_value_variants() {
        assert_eq!(decode_value(&json!({ "a": 1 })), Some(json!({ "a": 1 })));
        assert_eq!(decode_value(&json!([])), Some(json!([])));
        assert_eq!(
            decode_value(&json!(r#"{"northstar":"x"}"#)),
            Some(json!({ "northstar": "x" }))
        );
        assert_eq!(decode_value(&json!(null)), None);
        assert_eq!(decode_value(&json!(7)), None);
    }
}

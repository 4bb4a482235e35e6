//! Lossy sanitizer from [`RawValue`] graphs to plain JSON.
//!
//! Strategy table for the unsafe categories:
//! - repeated or cyclic shared nodes -> `"[Circular]"`
//! - `NaN` / `+Infinity` / `-Infinity` -> tagged strings
//! - timestamps -> RFC 3339 strings
//! - patterns, elements, callables -> their source text
//!
//! A single exotic field never fails the containing batch: every input
//! produces some JSON value.

use crate::value::{RawValue, lock_shared};
use serde_json::{Map, Number, Value};
use std::collections::HashSet;
use std::sync::Arc;

/// Marker substituted for a shared node that was already serialized.
pub const CIRCULAR_MARKER: &str = "[Circular]";

/// Resolve a value graph into plain JSON.
pub fn sanitize(value: &RawValue) -> Value {
    let mut seen = HashSet::new();
    encode(value, &mut seen)
}

fn encode(value: &RawValue, seen: &mut HashSet<usize>) -> Value {
    match value {
        RawValue::Null => Value::Null,
        RawValue::Bool(flag) => Value::Bool(*flag),
        RawValue::Number(number) => encode_number(*number),
        RawValue::Text(text) => Value::String(text.clone()),
        RawValue::Timestamp(at) => Value::String(at.to_rfc3339()),
        RawValue::Pattern(source) => Value::String(source.clone()),
        RawValue::Element(markup) => Value::String(markup.clone()),
        RawValue::Callable(source) => Value::String(source.clone()),
        RawValue::List(items) => {
            // Identity check before taking the lock: a cyclic reference
            // would otherwise deadlock on its own mutex.
            if !seen.insert(Arc::as_ptr(items) as usize) {
                return Value::String(CIRCULAR_MARKER.to_string());
            }
            let snapshot = lock_shared(items).clone();
            Value::Array(snapshot.iter().map(|item| encode(item, seen)).collect())
        }
        RawValue::Map(pairs) => {
            if !seen.insert(Arc::as_ptr(pairs) as usize) {
                return Value::String(CIRCULAR_MARKER.to_string());
            }
            let snapshot = lock_shared(pairs).clone();
            let mut object = Map::new();
            for (key, item) in &snapshot {
                object.insert(key.clone(), encode(item, seen));
            }
            Value::Object(object)
        }
    }
}

fn encode_number(number: f64) -> Value {
    if number.is_nan() {
        return Value::String("NaN".to_string());
    }
    if number.is_infinite() {
        let tag = if number.is_sign_positive() {
            "Infinity"
        } else {
            "-Infinity"
        };
        return Value::String(tag.to_string());
    }
    Number::from_f64(number).map_or(Value::Null, Value::Number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::SharedMap;
    use chrono::{DateTime, Utc};
    use serde_json::json;
    use std::sync::Mutex;

    #[test]
    fn plain_shapes_pass_through() {
        let value = RawValue::map(vec![
            ("event".to_string(), RawValue::from("page_view")),
            ("count".to_string(), RawValue::from(3_i64)),
            ("active".to_string(), RawValue::from(true)),
            ("missing".to_string(), RawValue::Null),
            (
                "items".to_string(),
                RawValue::list(vec![RawValue::from("a"), RawValue::from("b")]),
            ),
        ]);

        assert_eq!(
            sanitize(&value),
            json!({
                "event": "page_view",
                "count": 3.0,
                "active": true,
                "missing": null,
                "items": ["a", "b"],
            })
        );
    }

    #[test]
    fn cycle_is_marked_not_fatal() {
        let pairs: SharedMap = Arc::new(Mutex::new(vec![(
            "event".to_string(),
            RawValue::from("loop"),
        )]));
        let cyclic = RawValue::Map(Arc::clone(&pairs));
        lock_shared(&pairs).push(("self".to_string(), cyclic.clone()));

        assert_eq!(
            sanitize(&cyclic),
            json!({"event": "loop", "self": CIRCULAR_MARKER})
        );
    }

    #[test]
    fn repeated_reference_is_marked() {
        let inner = RawValue::map(vec![("n".to_string(), RawValue::from(1_i64))]);
        let value = RawValue::list(vec![inner.clone(), inner]);

        assert_eq!(sanitize(&value), json!([{"n": 1.0}, CIRCULAR_MARKER]));
    }

    #[test]
    fn exotic_categories_encode_deterministically() {
        struct Case {
            name: &'static str,
            input: RawValue,
            expected: Value,
        }

        let cases = vec![
            Case {
                name: "nan",
                input: RawValue::Number(f64::NAN),
                expected: json!("NaN"),
            },
            Case {
                name: "positive infinity",
                input: RawValue::Number(f64::INFINITY),
                expected: json!("Infinity"),
            },
            Case {
                name: "negative infinity",
                input: RawValue::Number(f64::NEG_INFINITY),
                expected: json!("-Infinity"),
            },
            Case {
                name: "timestamp",
                input: RawValue::Timestamp(
                    DateTime::<Utc>::from_timestamp(1_714_564_800, 0).unwrap_or_default(),
                ),
                expected: json!("2024-05-01T12:00:00+00:00"),
            },
            Case {
                name: "pattern",
                input: RawValue::Pattern("/gtm\\..+/".to_string()),
                expected: json!("/gtm\\..+/"),
            },
            Case {
                name: "element",
                input: RawValue::Element("<div id=\"banner\"></div>".to_string()),
                expected: json!("<div id=\"banner\"></div>"),
            },
            Case {
                name: "callable",
                input: RawValue::Callable("function gtag(){dataLayer.push(arguments);}".to_string()),
                expected: json!("function gtag(){dataLayer.push(arguments);}"),
            },
        ];

        for case in cases {
            assert_eq!(sanitize(&case.input), case.expected, "{}", case.name);
        }
    }

    #[test]
    fn unserializable_field_does_not_fail_siblings() {
        let items: crate::value::SharedList = Arc::new(Mutex::new(Vec::new()));
        let cyclic = RawValue::List(Arc::clone(&items));
        lock_shared(&items).push(cyclic.clone());

        let value = RawValue::map(vec![
            ("bad".to_string(), cyclic),
            ("good".to_string(), RawValue::from("kept")),
        ]);

        assert_eq!(
            sanitize(&value),
            json!({"bad": [CIRCULAR_MARKER], "good": "kept"})
        );
    }
}

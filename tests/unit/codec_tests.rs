//! Unit tests for the wire value codec.
//!
//! Covers:
//! - round-trip for every kind of the closed value set, including nesting
//! - number widening to f64 and the documented lossy fallbacks
//! - defined behavior for kindless and non-finite wire values
//! - fail-soft structural encoding of arbitrary Rust values

use std::collections::HashMap;

use prost_types::value::Kind;
use prost_types::Value;

use agent_conduit::codec::{decode_value, encode_value, to_value};

// ── Round-trip over the closed kind set ──────────────────────────────────────

/// Null, bool, float, and string values survive a full encode/decode
/// round-trip unchanged.
#[test]
fn scalar_values_round_trip() {
    for value in [
        serde_json::Value::Null,
        serde_json::json!(true),
        serde_json::json!(false),
        serde_json::json!(1.5),
        serde_json::json!(-273.15),
        serde_json::json!("hello"),
        serde_json::json!(""),
    ] {
        let decoded = decode_value(encode_value(value.clone()));
        assert_eq!(decoded, value, "round-trip must preserve {value}");
    }
}

/// Lists round-trip with order and length preserved.
#[test]
fn lists_round_trip_in_order() {
    let value = serde_json::json!(["a", "b", "c", 1.0, true, null]);
    let decoded = decode_value(encode_value(value.clone()));
    assert_eq!(decoded, value);
}

/// Maps round-trip with the key set and cardinality preserved, including
/// nested lists and maps.
#[test]
fn nested_maps_round_trip() {
    let value = serde_json::json!({
        "name": "relay",
        "enabled": true,
        "weights": [0.25, 0.75],
        "meta": {
            "depth": 3.0,
            "tags": ["wire", "codec"],
            "inner": { "empty": {} },
        },
    });
    let decoded = decode_value(encode_value(value.clone()));
    assert_eq!(decoded, value);
}

/// An empty list and an empty map are preserved, not collapsed to null.
#[test]
fn empty_containers_round_trip() {
    let value = serde_json::json!({ "list": [], "map": {} });
    let decoded = decode_value(encode_value(value.clone()));
    assert_eq!(decoded, value);
}

// ── Number widening ──────────────────────────────────────────────────────────

/// Integers widen to f64 on the wire; the decoded value compares equal
/// under f64 equality even though the JSON representation changes from
/// integer to float.
#[test]
fn integers_widen_to_f64() {
    let encoded = encode_value(serde_json::json!(42));
    match encoded.kind {
        Some(Kind::NumberValue(n)) => assert!((n - 42.0).abs() < f64::EPSILON),
        other => panic!("expected NumberValue, got {other:?}"),
    }

    let decoded = decode_value(encode_value(serde_json::json!(42)));
    assert_eq!(
        decoded.as_f64(),
        Some(42.0),
        "decoded integer must equal its f64 widening"
    );
}

/// Integer magnitudes beyond 2^53 lose precision rather than failing.
#[test]
fn large_integers_lose_precision_silently() {
    let original = i64::MAX;
    let decoded = decode_value(encode_value(serde_json::json!(original)));

    let widened = decoded.as_f64().expect("decoded value must be a number");
    // f64 cannot hold i64::MAX exactly; the widened value is close, not equal.
    assert!((widened - 9.223_372_036_854_776e18).abs() < 1e4);
}

// ── Defined fallbacks ────────────────────────────────────────────────────────

/// A wire value with no kind set decodes to null.
#[test]
fn kindless_wire_value_decodes_to_null() {
    let decoded = decode_value(Value { kind: None });
    assert_eq!(decoded, serde_json::Value::Null);
}

/// Non-finite wire numbers have no JSON counterpart and decode to null.
#[test]
fn non_finite_numbers_decode_to_null() {
    for number in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
        let decoded = decode_value(Value {
            kind: Some(Kind::NumberValue(number)),
        });
        assert_eq!(decoded, serde_json::Value::Null);
    }
}

// ── Best-effort structural encoding ──────────────────────────────────────────

#[derive(serde::Serialize)]
struct Payload {
    name: &'static str,
    attempts: u32,
}

/// Arbitrary serializable Rust values encode through their serde
/// structure.
#[test]
fn serializable_values_encode_structurally() {
    let payload = Payload {
        name: "retry",
        attempts: 3,
    };
    let decoded = decode_value(to_value(&payload));

    assert_eq!(decoded["name"], serde_json::json!("retry"));
    assert_eq!(decoded["attempts"].as_f64(), Some(3.0));
}

/// Values serde cannot represent as JSON fail soft to wire null rather
/// than erroring.
#[test]
fn unrepresentable_values_fail_soft_to_null() {
    // Maps with non-string (tuple) keys cannot be serialized to JSON.
    let mut weird: HashMap<(u8, u8), u8> = HashMap::new();
    weird.insert((1, 2), 3);

    let encoded = to_value(&weird);
    assert!(
        matches!(encoded.kind, Some(Kind::NullValue(_))),
        "unsupported input must encode as wire null, got {encoded:?}"
    );
}

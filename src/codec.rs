//! Conversion between wire values and dynamic JSON values.
//!
//! The wire representation is the protobuf well-known
//! [`google.protobuf.Value`](prost_types::Value); the language-side
//! representation is [`serde_json::Value`]. Both are closed recursive
//! variants over null, bool, number, string, list, and string-keyed map,
//! so the pair of conversions is total: neither direction can fail.
//!
//! Numbers widen to `f64` on the wire. Integer magnitudes beyond 2^53
//! lose precision, and a number with no `f64` representation at all
//! encodes as `0.0`. Non-finite wire numbers (NaN, infinities) have no
//! JSON counterpart and decode to null.

use prost_types::value::Kind;
use prost_types::{ListValue, Struct, Value};
use serde::Serialize;

/// Decode a wire value into a dynamic JSON value.
///
/// A value with no kind set (possible on the wire) decodes to null, as
/// does a non-finite number. Lists and structs decode recursively with
/// order, length, and key set preserved.
#[must_use]
pub fn decode_value(value: Value) -> serde_json::Value {
    match value.kind {
        None | Some(Kind::NullValue(_)) => serde_json::Value::Null,
        Some(Kind::BoolValue(flag)) => serde_json::Value::Bool(flag),
        Some(Kind::NumberValue(number)) => serde_json::Number::from_f64(number)
            .map_or(serde_json::Value::Null, serde_json::Value::Number),
        Some(Kind::StringValue(text)) => serde_json::Value::String(text),
        Some(Kind::ListValue(list)) => {
            serde_json::Value::Array(list.values.into_iter().map(decode_value).collect())
        }
        Some(Kind::StructValue(fields)) => serde_json::Value::Object(
            fields
                .fields
                .into_iter()
                .map(|(key, field)| (key, decode_value(field)))
                .collect(),
        ),
    }
}

/// Encode a dynamic JSON value into a wire value.
///
/// Structural inverse of [`decode_value`]: `decode_value(encode_value(v))`
/// reproduces `v` for every value whose numbers are exactly representable
/// as `f64`. Integers outside that range are widened lossily; a number
/// with no `f64` form encodes as `0.0`.
#[must_use]
pub fn encode_value(value: serde_json::Value) -> Value {
    let kind = match value {
        serde_json::Value::Null => Kind::NullValue(0),
        serde_json::Value::Bool(flag) => Kind::BoolValue(flag),
        serde_json::Value::Number(number) => Kind::NumberValue(number.as_f64().unwrap_or(0.0)),
        serde_json::Value::String(text) => Kind::StringValue(text),
        serde_json::Value::Array(items) => Kind::ListValue(ListValue {
            values: items.into_iter().map(encode_value).collect(),
        }),
        serde_json::Value::Object(map) => Kind::StructValue(Struct {
            fields: map
                .into_iter()
                .map(|(key, field)| (key, encode_value(field)))
                .collect(),
        }),
    };

    Value { kind: Some(kind) }
}

/// Best-effort structural encoding of an arbitrary Rust value.
///
/// Serializes `value` through serde and encodes the resulting JSON tree.
/// Values serde cannot represent as JSON (for example maps with
/// non-string keys) fail soft to wire null; this function never errors.
pub fn to_value<T: Serialize>(value: &T) -> Value {
    match serde_json::to_value(value) {
        Ok(json) => encode_value(json),
        Err(_) => Value {
            kind: Some(Kind::NullValue(0)),
        },
    }
}

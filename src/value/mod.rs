mod codec;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

pub use codec::{decode_fields, decode_value, encode_fields, encode_value};

/// A single Firestore wire value.
///
/// The REST protocol represents every field as an object with exactly one
/// type tag set. Modeling that as an enum makes the invalid "two tags" and
/// "zero tags" shapes unrepresentable. Integers travel as decimal strings on
/// the wire to avoid precision loss beyond the JSON safe integer range; in
/// memory they are `i64`.
#[derive(Clone, Debug, PartialEq)]
pub enum WireValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Double(f64),
    String(String),
    Timestamp(DateTime<Utc>),
    Array(Vec<WireValue>),
    Map(BTreeMap<String, WireValue>),
}

impl WireValue {
    pub fn null() -> Self {
        WireValue::Null
    }

    pub fn from_bool(value: bool) -> Self {
        WireValue::Boolean(value)
    }

    pub fn from_integer(value: i64) -> Self {
        WireValue::Integer(value)
    }

    pub fn from_double(value: f64) -> Self {
        WireValue::Double(value)
    }

    pub fn from_string(value: impl Into<String>) -> Self {
        WireValue::String(value.into())
    }

    pub fn from_timestamp(value: DateTime<Utc>) -> Self {
        WireValue::Timestamp(value)
    }

    pub fn from_array(values: Vec<WireValue>) -> Self {
        WireValue::Array(values)
    }

    pub fn from_map(fields: BTreeMap<String, WireValue>) -> Self {
        WireValue::Map(fields)
    }

    /// Converts a native JSON value into its wire counterpart.
    ///
    /// Numbers become `Integer` when they are mathematically integral and fit
    /// in `i64`, otherwise `Double`. Anything outside the closed set the wire
    /// format can carry (in practice only `u64` beyond `i64::MAX`) falls back
    /// to its string representation: lossy, but the encoder never fails.
    pub fn from_json(value: &serde_json::Value) -> Self {
        codec::wire_from_json(value)
    }

    /// The inverse of [`WireValue::from_json`] per tag.
    ///
    /// `Integer` maps back to a native number; precision loss above 2^53 is
    /// an accepted limitation once the value reaches consumers that treat
    /// JSON numbers as doubles. `Timestamp` renders as its ISO-8601 string
    /// because JSON has no instant type.
    pub fn to_json(&self) -> serde_json::Value {
        codec::json_from_wire(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builds_basic_values() {
        match WireValue::from_string("hello") {
            WireValue::String(value) => assert_eq!(value, "hello"),
            other => panic!("unexpected value {other:?}"),
        }
    }

    #[test]
    fn integral_json_numbers_become_integers() {
        assert_eq!(WireValue::from_json(&json!(5)), WireValue::Integer(5));
        assert_eq!(WireValue::from_json(&json!(5.5)), WireValue::Double(5.5));
    }

    #[test]
    fn out_of_range_numbers_fall_back_to_strings() {
        let value = WireValue::from_json(&json!(u64::MAX));
        assert_eq!(value, WireValue::String(u64::MAX.to_string()));
    }
}

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Map as JsonMap, Value as JsonValue};

use crate::error::{decode_failure, StoreResult};
use crate::value::WireValue;

/// Encodes a field map into the `"fields"` object of a document body.
pub fn encode_fields(fields: &BTreeMap<String, WireValue>) -> JsonValue {
    let mut encoded = JsonMap::new();
    for (name, value) in fields {
        encoded.insert(name.clone(), encode_value(value));
    }
    JsonValue::Object(encoded)
}

/// Decodes the `"fields"` object of a document body.
///
/// A body without a `fields` key is a document that exists but has no user
/// fields; it decodes to an empty map.
pub fn decode_fields(body: &JsonValue) -> StoreResult<BTreeMap<String, WireValue>> {
    let fields_object = match body.get("fields") {
        Some(fields) => fields
            .as_object()
            .ok_or_else(|| decode_failure("'fields' must be an object"))?,
        None => return Ok(BTreeMap::new()),
    };

    let mut fields = BTreeMap::new();
    for (name, value) in fields_object {
        fields.insert(name.clone(), decode_value(value)?);
    }
    Ok(fields)
}

pub fn encode_value(value: &WireValue) -> JsonValue {
    match value {
        WireValue::Null => json!({ "nullValue": JsonValue::Null }),
        WireValue::Boolean(boolean) => json!({ "booleanValue": boolean }),
        WireValue::Integer(integer) => json!({ "integerValue": integer.to_string() }),
        WireValue::Double(double) => json!({ "doubleValue": double }),
        WireValue::String(string) => json!({ "stringValue": string }),
        WireValue::Timestamp(timestamp) => {
            json!({ "timestampValue": encode_timestamp(timestamp) })
        }
        WireValue::Array(values) => {
            let values = values.iter().map(encode_value).collect::<Vec<_>>();
            json!({ "arrayValue": { "values": values } })
        }
        WireValue::Map(fields) => json!({
            "mapValue": {
                "fields": encode_fields(fields)
            }
        }),
    }
}

pub fn decode_value(value: &JsonValue) -> StoreResult<WireValue> {
    let object = value
        .as_object()
        .ok_or_else(|| decode_failure("Expected a tagged value object"))?;

    if let Some(null_value) = object.get("nullValue") {
        if null_value.is_null() {
            return Ok(WireValue::Null);
        }
    }
    if let Some(bool_value) = object.get("booleanValue") {
        let value = bool_value
            .as_bool()
            .ok_or_else(|| decode_failure("booleanValue must be a bool"))?;
        return Ok(WireValue::Boolean(value));
    }
    if let Some(integer_value) = object.get("integerValue") {
        let parsed = match integer_value {
            JsonValue::String(value) => i64::from_str(value)
                .map_err(|err| decode_failure(format!("Invalid integerValue: {err}")))?,
            JsonValue::Number(number) => number
                .as_i64()
                .ok_or_else(|| decode_failure("integerValue out of range"))?,
            _ => return Err(decode_failure("integerValue must be a string or number")),
        };
        return Ok(WireValue::Integer(parsed));
    }
    if let Some(double_value) = object.get("doubleValue") {
        let parsed = match double_value {
            JsonValue::Number(number) => number
                .as_f64()
                .ok_or_else(|| decode_failure("Invalid doubleValue"))?,
            JsonValue::String(value) => value
                .parse::<f64>()
                .map_err(|err| decode_failure(format!("Invalid doubleValue: {err}")))?,
            _ => return Err(decode_failure("doubleValue must be a number or string")),
        };
        return Ok(WireValue::Double(parsed));
    }
    if let Some(string_value) = object.get("stringValue") {
        let value = string_value
            .as_str()
            .ok_or_else(|| decode_failure("stringValue must be a string"))?;
        return Ok(WireValue::String(value.to_string()));
    }
    if let Some(timestamp_value) = object.get("timestampValue") {
        let value = timestamp_value
            .as_str()
            .ok_or_else(|| decode_failure("timestampValue must be a string"))?;
        return Ok(WireValue::Timestamp(parse_timestamp(value)?));
    }
    if let Some(array_value) = object.get("arrayValue") {
        let decoded = match array_value.get("values").and_then(JsonValue::as_array) {
            Some(entries) => entries
                .iter()
                .map(decode_value)
                .collect::<StoreResult<Vec<_>>>()?,
            // An empty arrayValue omits "values" entirely.
            None => Vec::new(),
        };
        return Ok(WireValue::Array(decoded));
    }
    if let Some(map_value) = object.get("mapValue") {
        return Ok(WireValue::Map(decode_fields(map_value)?));
    }

    Err(decode_failure("Unknown wire value tag"))
}

pub(super) fn wire_from_json(value: &JsonValue) -> WireValue {
    match value {
        JsonValue::Null => WireValue::Null,
        JsonValue::Bool(boolean) => WireValue::Boolean(*boolean),
        JsonValue::Number(number) => wire_from_number(number),
        JsonValue::String(string) => WireValue::String(string.clone()),
        JsonValue::Array(entries) => {
            WireValue::Array(entries.iter().map(wire_from_json).collect())
        }
        JsonValue::Object(entries) => {
            let mut fields = BTreeMap::new();
            for (name, entry) in entries {
                fields.insert(name.clone(), wire_from_json(entry));
            }
            WireValue::Map(fields)
        }
    }
}

fn wire_from_number(number: &serde_json::Number) -> WireValue {
    if let Some(integer) = number.as_i64() {
        return WireValue::Integer(integer);
    }
    // u64 beyond i64::MAX: the lossy-but-safe escape hatch. Checked before
    // the float path because as_f64 would silently round it.
    if number.as_u64().is_some() {
        return WireValue::String(number.to_string());
    }
    if let Some(double) = number.as_f64() {
        // A float with no fractional part still encodes as an integer, the
        // way a dynamically typed caller would expect.
        if double.is_finite() && double.fract() == 0.0 && double.abs() < i64::MAX as f64 {
            return WireValue::Integer(double as i64);
        }
        return WireValue::Double(double);
    }
    WireValue::String(number.to_string())
}

pub(super) fn json_from_wire(value: &WireValue) -> JsonValue {
    match value {
        WireValue::Null => JsonValue::Null,
        WireValue::Boolean(boolean) => JsonValue::Bool(*boolean),
        WireValue::Integer(integer) => json!(integer),
        WireValue::Double(double) => json!(double),
        WireValue::String(string) => JsonValue::String(string.clone()),
        WireValue::Timestamp(timestamp) => JsonValue::String(encode_timestamp(timestamp)),
        WireValue::Array(entries) => {
            JsonValue::Array(entries.iter().map(json_from_wire).collect())
        }
        WireValue::Map(fields) => {
            let mut object = JsonMap::new();
            for (name, entry) in fields {
                object.insert(name.clone(), json_from_wire(entry));
            }
            JsonValue::Object(object)
        }
    }
}

fn encode_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_timestamp(value: &str) -> StoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|datetime| datetime.with_timezone(&Utc))
        .map_err(|err| decode_failure(format!("Invalid timestampValue: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn integers_travel_as_decimal_strings() {
        assert_eq!(
            encode_value(&WireValue::Integer(5)),
            json!({ "integerValue": "5" })
        );
        assert_eq!(
            encode_value(&WireValue::Double(5.5)),
            json!({ "doubleValue": 5.5 })
        );
    }

    #[test]
    fn maps_encode_with_nested_fields() {
        let mut fields = BTreeMap::new();
        fields.insert("a".to_string(), WireValue::Integer(1));
        fields.insert("b".to_string(), WireValue::String("x".to_string()));
        assert_eq!(
            encode_value(&WireValue::Map(fields)),
            json!({
                "mapValue": {
                    "fields": {
                        "a": { "integerValue": "1" },
                        "b": { "stringValue": "x" }
                    }
                }
            })
        );
    }

    #[test]
    fn timestamps_encode_as_utc_iso8601() {
        let timestamp = Utc.with_ymd_and_hms(2024, 6, 1, 12, 30, 0).unwrap();
        assert_eq!(
            encode_value(&WireValue::Timestamp(timestamp)),
            json!({ "timestampValue": "2024-06-01T12:30:00.000Z" })
        );
    }

    #[test]
    fn decode_accepts_integer_numbers_and_strings() {
        assert_eq!(
            decode_value(&json!({ "integerValue": "42" })).unwrap(),
            WireValue::Integer(42)
        );
        assert_eq!(
            decode_value(&json!({ "integerValue": 42 })).unwrap(),
            WireValue::Integer(42)
        );
    }

    #[test]
    fn decode_handles_empty_array_value() {
        assert_eq!(
            decode_value(&json!({ "arrayValue": {} })).unwrap(),
            WireValue::Array(Vec::new())
        );
    }

    #[test]
    fn decode_rejects_unknown_tags() {
        let err = decode_value(&json!({ "referenceValue": "x" })).unwrap_err();
        assert!(err.to_string().contains("Unknown wire value tag"));
    }

    #[test]
    fn roundtrip_preserves_json_safe_values() {
        let native = json!({
            "name": "Ada",
            "age": 42,
            "rating": 4.5,
            "verified": true,
            "notes": JsonValue::Null,
            "tags": ["buyer", "produce"],
            "stats": { "orders": 17, "spend": 120.75 }
        });
        let wire = WireValue::from_json(&native);
        let encoded = encode_value(&wire);
        let decoded = decode_value(&encoded).unwrap();
        assert_eq!(decoded.to_json(), native);
    }

    #[test]
    fn roundtrip_preserves_timestamps() {
        let timestamp = Utc.with_ymd_and_hms(2024, 2, 29, 8, 15, 42).unwrap();
        let encoded = encode_value(&WireValue::Timestamp(timestamp));
        assert_eq!(
            decode_value(&encoded).unwrap(),
            WireValue::Timestamp(timestamp)
        );
    }

    #[test]
    fn fields_without_key_decode_to_empty_map() {
        assert!(decode_fields(&json!({})).unwrap().is_empty());
    }
}

use serde_json::{json, Value as JsonValue};

use crate::value::{encode_value, WireValue};

/// Comparison applied by a field filter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterOperator {
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    ArrayContains,
}

impl FilterOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::Equal => "EQUAL",
            FilterOperator::NotEqual => "NOT_EQUAL",
            FilterOperator::LessThan => "LESS_THAN",
            FilterOperator::LessThanOrEqual => "LESS_THAN_OR_EQUAL",
            FilterOperator::GreaterThan => "GREATER_THAN",
            FilterOperator::GreaterThanOrEqual => "GREATER_THAN_OR_EQUAL",
            FilterOperator::ArrayContains => "ARRAY_CONTAINS",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FieldFilter {
    field_path: String,
    operator: FilterOperator,
    value: WireValue,
}

impl FieldFilter {
    pub fn new(
        field_path: impl Into<String>,
        operator: FilterOperator,
        value: WireValue,
    ) -> Self {
        Self {
            field_path: field_path.into(),
            operator,
            value,
        }
    }

    pub fn equal(field_path: impl Into<String>, value: WireValue) -> Self {
        Self::new(field_path, FilterOperator::Equal, value)
    }
}

/// Immutable filter/limit descriptor for a single collection.
///
/// Built per call, never persisted. Result order is whatever the remote
/// store returns; callers needing a specific order sort client-side.
#[derive(Clone, Debug, PartialEq)]
pub struct StructuredQuery {
    collection_id: String,
    filter: FieldFilter,
    limit: Option<u32>,
}

impl StructuredQuery {
    pub fn new(collection_id: impl Into<String>, filter: FieldFilter) -> Self {
        Self {
            collection_id: collection_id.into(),
            filter,
            limit: None,
        }
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn collection_id(&self) -> &str {
        &self.collection_id
    }

    pub(crate) fn to_request_body(&self) -> JsonValue {
        let mut structured = serde_json::Map::new();
        structured.insert(
            "from".to_string(),
            json!([{ "collectionId": self.collection_id }]),
        );
        structured.insert(
            "where".to_string(),
            json!({
                "fieldFilter": {
                    "field": { "fieldPath": self.filter.field_path },
                    "op": self.filter.operator.as_str(),
                    "value": encode_value(&self.filter.value)
                }
            }),
        );
        if let Some(limit) = self.limit {
            structured.insert("limit".to_string(), json!(limit));
        }
        json!({ "structuredQuery": JsonValue::Object(structured) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_filter_and_limit() {
        let query = StructuredQuery::new(
            "users",
            FieldFilter::equal("type", WireValue::from_string("buyer")),
        )
        .with_limit(10);

        assert_eq!(
            query.to_request_body(),
            json!({
                "structuredQuery": {
                    "from": [{ "collectionId": "users" }],
                    "where": {
                        "fieldFilter": {
                            "field": { "fieldPath": "type" },
                            "op": "EQUAL",
                            "value": { "stringValue": "buyer" }
                        }
                    },
                    "limit": 10
                }
            })
        );
    }

    #[test]
    fn limit_is_omitted_when_unset() {
        let query = StructuredQuery::new(
            "users",
            FieldFilter::equal("type", WireValue::from_string("farmer")),
        );
        let body = query.to_request_body();
        assert!(body["structuredQuery"].get("limit").is_none());
    }
}

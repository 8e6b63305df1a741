use std::collections::BTreeMap;

use crate::model::ResourcePath;
use crate::value::WireValue;

/// A document returned by a read or query.
///
/// Snapshots are read-only once returned: mutating the local copy has no
/// effect on the remote store.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    path: ResourcePath,
    fields: BTreeMap<String, WireValue>,
}

impl Document {
    pub fn new(path: ResourcePath, fields: BTreeMap<String, WireValue>) -> Self {
        Self { path, fields }
    }

    pub fn path(&self) -> &ResourcePath {
        &self.path
    }

    /// The document id (final path segment).
    pub fn id(&self) -> &str {
        self.path.last_segment().unwrap_or_default()
    }

    pub fn fields(&self) -> &BTreeMap<String, WireValue> {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&WireValue> {
        self.fields.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exposes_id_and_fields() {
        let path = ResourcePath::document("users/ada").unwrap();
        let mut fields = BTreeMap::new();
        fields.insert("type".to_string(), WireValue::from_string("buyer"));
        let document = Document::new(path, fields);
        assert_eq!(document.id(), "ada");
        assert_eq!(
            document.field("type"),
            Some(&WireValue::from_string("buyer"))
        );
    }
}

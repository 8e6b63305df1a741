use std::fmt::{Display, Formatter};

use crate::error::{invalid_path, StoreResult};

/// A slash-delimited resource path relative to the database root.
///
/// Segments alternate collection and document id: an even number of segments
/// addresses a document (`listings/123`), an odd number a collection
/// (`listings`, `listings/123/bids`).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ResourcePath {
    segments: Vec<String>,
}

impl ResourcePath {
    pub fn from_string(path: &str) -> StoreResult<Self> {
        if path.trim().is_empty() {
            return Err(invalid_path("Resource path must not be empty"));
        }

        let segments: Vec<String> = path
            .trim_matches('/')
            .split('/')
            .map(|segment| segment.to_string())
            .collect();

        if segments.iter().any(|segment| segment.is_empty()) {
            return Err(invalid_path(format!("Found empty segment in '{path}'")));
        }

        Ok(Self { segments })
    }

    /// Parses a path and checks it addresses a document.
    pub fn document(path: &str) -> StoreResult<Self> {
        let parsed = Self::from_string(path)?;
        if !parsed.is_document() {
            return Err(invalid_path(format!(
                "'{path}' does not address a document (odd segment count)"
            )));
        }
        Ok(parsed)
    }

    /// Parses a path and checks it addresses a collection.
    pub fn collection(path: &str) -> StoreResult<Self> {
        let parsed = Self::from_string(path)?;
        if !parsed.is_collection() {
            return Err(invalid_path(format!(
                "'{path}' does not address a collection (even segment count)"
            )));
        }
        Ok(parsed)
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn is_document(&self) -> bool {
        !self.segments.is_empty() && self.segments.len() % 2 == 0
    }

    pub fn is_collection(&self) -> bool {
        self.segments.len() % 2 == 1
    }

    /// Last segment: the document id for document paths, the collection id
    /// for collection paths.
    pub fn last_segment(&self) -> Option<&str> {
        self.segments.last().map(|s| s.as_str())
    }

    pub fn canonical_string(&self) -> String {
        self.segments.join("/")
    }
}

impl Display for ResourcePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.canonical_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_render_path() {
        let path = ResourcePath::document("listings/l1/bids/b2").unwrap();
        assert_eq!(path.len(), 4);
        assert_eq!(path.last_segment(), Some("b2"));
        assert_eq!(path.canonical_string(), "listings/l1/bids/b2");
    }

    #[test]
    fn rejects_empty_path() {
        assert!(ResourcePath::from_string("").is_err());
        assert!(ResourcePath::from_string("  ").is_err());
    }

    #[test]
    fn rejects_empty_segments() {
        let err = ResourcePath::from_string("listings//l1").unwrap_err();
        assert!(err.to_string().contains("empty segment"));
    }

    #[test]
    fn document_paths_need_even_segments() {
        assert!(ResourcePath::document("listings/l1").is_ok());
        assert!(ResourcePath::document("listings").is_err());
    }

    #[test]
    fn collection_paths_need_odd_segments() {
        assert!(ResourcePath::collection("listings").is_ok());
        assert!(ResourcePath::collection("listings/l1/bids").is_ok());
        assert!(ResourcePath::collection("listings/l1").is_err());
    }

    #[test]
    fn leading_and_trailing_slashes_are_trimmed() {
        let path = ResourcePath::from_string("/listings/l1/").unwrap();
        assert_eq!(path.canonical_string(), "listings/l1");
    }
}

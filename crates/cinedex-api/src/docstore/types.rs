//! Document-store envelope types.

use serde::Deserialize;
use serde::de::DeserializeOwned;

/// A stored document: server-issued metadata plus the typed payload.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Document<T> {
    /// Store-generated document ID.
    #[serde(rename = "$id")]
    pub id: String,
    /// Creation timestamp (RFC 3339), set by the store.
    #[serde(rename = "$createdAt", default)]
    pub created_at: Option<String>,
    /// Collection payload fields.
    #[serde(flatten)]
    pub data: T,
}

/// A page of documents from a list operation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(bound = "T: DeserializeOwned")]
pub struct DocumentList<T> {
    /// Total matching documents.
    pub total: u64,
    /// Documents on this page.
    pub documents: Vec<Document<T>>,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::indexing_slicing)]

    use super::*;

    #[derive(Debug, PartialEq, Eq, Deserialize)]
    struct Payload {
        title: String,
    }

    #[test]
    fn test_document_flattens_payload() {
        // Arrange
        let json = r#"{"$id":"doc1","$createdAt":"2026-08-27T10:00:00.000+00:00","title":"Dune"}"#;

        // Act
        let doc: Document<Payload> = serde_json::from_str(json).unwrap();

        // Assert
        assert_eq!(doc.id, "doc1");
        assert_eq!(doc.data.title, "Dune");
        assert!(doc.created_at.is_some());
    }

    #[test]
    fn test_document_list() {
        // Arrange
        let json = r#"{"total":2,"documents":[{"$id":"a","title":"Dune"},{"$id":"b","title":"Arrival"}]}"#;

        // Act
        let list: DocumentList<Payload> = serde_json::from_str(json).unwrap();

        // Assert
        assert_eq!(list.total, 2);
        assert_eq!(list.documents[1].data.title, "Arrival");
    }
}

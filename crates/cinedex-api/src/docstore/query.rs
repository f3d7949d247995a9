//! Query string helpers for document listing.

/// Builds the JSON-encoded query strings the document store expects in
/// `queries[]` parameters.
#[derive(Debug)]
pub struct Query;

impl Query {
    /// Matches documents whose `attribute` equals `value`.
    #[must_use]
    pub fn equal(attribute: &str, value: &str) -> String {
        serde_json::json!({
            "method": "equal",
            "attribute": attribute,
            "values": [value],
        })
        .to_string()
    }

    /// Orders results by `attribute`, descending.
    #[must_use]
    pub fn order_desc(attribute: &str) -> String {
        serde_json::json!({
            "method": "orderDesc",
            "attribute": attribute,
        })
        .to_string()
    }

    /// Limits the result count.
    #[must_use]
    pub fn limit(count: u32) -> String {
        serde_json::json!({
            "method": "limit",
            "values": [count],
        })
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_equal_query_shape() {
        // Arrange & Act
        let q: serde_json::Value = serde_json::from_str(&Query::equal("searchTerm", "dune")).unwrap();

        // Assert
        assert_eq!(q["method"], "equal");
        assert_eq!(q["attribute"], "searchTerm");
        assert_eq!(q["values"][0], "dune");
    }

    #[test]
    fn test_order_desc_query_shape() {
        // Arrange & Act
        let q: serde_json::Value = serde_json::from_str(&Query::order_desc("count")).unwrap();

        // Assert
        assert_eq!(q["method"], "orderDesc");
        assert_eq!(q["attribute"], "count");
    }

    #[test]
    fn test_limit_query_shape() {
        // Arrange & Act
        let q: serde_json::Value = serde_json::from_str(&Query::limit(10)).unwrap();

        // Assert
        assert_eq!(q["method"], "limit");
        assert_eq!(q["values"][0], 10);
    }
}

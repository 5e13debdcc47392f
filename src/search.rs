/// Normalize a string for case-insensitive matching.
pub fn normalize(s: &str) -> String {
    s.to_lowercase()
}

/// An empty query means "no filter". Whitespace is significant.
pub fn normalize_query(query: &str) -> Option<String> {
    if query.is_empty() {
        None
    } else {
        Some(normalize(query))
    }
}

/// True when any of `fields` contains the already-normalized `needle`.
pub fn matches_any<'a>(needle: &str, fields: impl IntoIterator<Item = &'a str>) -> bool {
    fields
        .into_iter()
        .any(|field| normalize(field).contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_query() {
        assert_eq!(normalize_query(""), None);
        assert_eq!(normalize_query("AlI"), Some("ali".to_string()));
        assert_eq!(normalize_query(" "), Some(" ".to_string()));
    }

    #[test]
    fn test_matches_any() {
        assert!(matches_any("ali", ["Alice Smith", "0123"]));
        assert!(matches_any("555", ["Bob", "(555) 123"]));
        assert!(!matches_any("zed", ["Alice", "alice@example.com"]));
    }
}

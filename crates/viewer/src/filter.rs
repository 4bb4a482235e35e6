//! Local entry filtering.

/// Case-insensitive substring match over a serialized entry. An empty
/// query matches everything. Never re-queries the hub.
pub fn is_matching(text: &str, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    text.to_lowercase().contains(&query.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_query_matches_everything() {
        assert!(is_matching("", ""));
        assert!(is_matching(r#"{"event":"page_view"}"#, ""));
    }

    #[test]
    fn match_is_case_insensitive() {
        let serialized = r#"{"event":"Select_Item","value":12}"#;
        assert!(is_matching(serialized, "select_item"));
        assert!(is_matching(serialized, "SELECT"));
        assert!(is_matching(serialized, "\"value\":12"));
        assert!(!is_matching(serialized, "purchase"));
    }
}

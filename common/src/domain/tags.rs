//! Helpers for the free-form string lists carried by products (tags and
//! category names).

/// Trims every entry and drops the blank ones, keeping order and duplicates.
pub fn clean_names<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .map(|n| n.as_ref().trim().to_string())
        .filter(|n| !n.is_empty())
        .collect()
}

/// Tags are stored as a single comma separated column. A comma inside a
/// tag is a separator, so `"retro, arcade"` is stored as two tags.
pub fn join_tags(tags: &[String]) -> String {
    clean_names(tags.iter().flat_map(|t| t.split(','))).join(",")
}

pub fn split_tags(raw: &str) -> Vec<String> {
    clean_names(raw.split(','))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_names_keeps_order_and_duplicates() {
        let cleaned = clean_names(["  Tools ", "", "Games", "   ", "Tools"]);
        assert_eq!(cleaned, vec!["Tools", "Games", "Tools"]);
    }

    #[test]
    fn tags_round_trip_through_column() {
        let raw = join_tags(&["rust".to_string(), " cli, tui ".to_string()]);
        assert_eq!(raw, "rust,cli,tui");
        assert_eq!(split_tags(&raw), vec!["rust", "cli", "tui"]);
        assert!(split_tags("").is_empty());
    }
}

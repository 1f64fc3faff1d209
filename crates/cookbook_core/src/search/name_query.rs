//! LIKE-pattern construction for case-insensitive substring search.
//!
//! # Invariants
//! - Blank terms produce no pattern; the caller returns an empty result
//!   instead of scanning the table.
//! - `%`, `_` and `\` in the user term match literally, never as
//!   wildcards. Queries using these patterns must declare `ESCAPE '\'`.

/// Builds a `%term%` LIKE pattern, or `None` for a blank term.
pub fn build_like_pattern(term: &str) -> Option<String> {
    let trimmed = term.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(format!("%{}%", escape_like_term(trimmed)))
}

fn escape_like_term(raw: &str) -> String {
    raw.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::build_like_pattern;

    #[test]
    fn blank_term_builds_no_pattern() {
        assert_eq!(build_like_pattern(""), None);
        assert_eq!(build_like_pattern("   "), None);
    }

    #[test]
    fn plain_term_is_wrapped_in_wildcards() {
        assert_eq!(build_like_pattern(" curry "), Some("%curry%".to_string()));
    }

    #[test]
    fn wildcard_characters_are_escaped() {
        assert_eq!(
            build_like_pattern("100%_pure\\"),
            Some("%100\\%\\_pure\\\\%".to_string())
        );
    }
}

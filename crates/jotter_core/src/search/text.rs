//! Substring query normalization.
//!
//! # Invariants
//! - Blank queries never reach SQL.
//! - Non-blank queries are matched as given, whitespace included.
//! - `%`, `_` and `\` in user text are escaped with `\` so `LIKE ... ESCAPE '\'`
//!   treats them literally.
//! - Case folding follows SQLite `LIKE`: ASCII letters only.

/// Returns `None` for a blank query, otherwise the query unchanged.
///
/// Surrounding whitespace is part of the needle: `" cat"` does not match
/// `"concatenate"`.
pub fn normalize_query(query: &str) -> Option<String> {
    if query.trim().is_empty() {
        None
    } else {
        Some(query.to_string())
    }
}

/// Wraps `needle` as a `%needle%` pattern with wildcard characters escaped.
pub fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::{like_pattern, normalize_query};

    #[test]
    fn blank_query_normalizes_to_none() {
        assert_eq!(normalize_query("   "), None);
        assert_eq!(normalize_query(" milk "), Some(" milk ".to_string()));
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }
}

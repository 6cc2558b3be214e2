//! Small text helpers.

/// Strips one pair of matching quotes.
///
/// Whitespace outside the quotes is ignored. Anything that is not wrapped in
/// a matching pair of `"` or `'` comes back unchanged.
pub fn unquote(s: &str) -> &str {
    let trimmed = s.trim();
    for quote in ['"', '\''] {
        if trimmed.len() >= 2 && trimmed.starts_with(quote) && trimmed.ends_with(quote) {
            return &trimmed[1..trimmed.len() - 1];
        }
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("\"abc\""), "abc");
        assert_eq!(unquote("'abc'"), "abc");
        assert_eq!(unquote("abc"), "abc");
        assert_eq!(unquote("  \"padded\"  "), "padded");
        assert_eq!(unquote("\"\""), "");
    }

    #[test]
    fn test_mismatched_quotes_untouched() {
        assert_eq!(unquote("\"abc'"), "\"abc'");
        assert_eq!(unquote("'abc"), "'abc");
        assert_eq!(unquote("\""), "\"");
        assert_eq!(unquote(" abc "), " abc ");
    }
}

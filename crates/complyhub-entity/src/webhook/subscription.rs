//! Event subscription patterns.
//!
//! An endpoint subscribes with a list of patterns. A pattern is an exact
//! event type (`action.created`), a prefix wildcard (`action.*`) matching
//! every type that starts with `action.`, or `*` matching everything.

/// Subscribe-to-everything pattern.
pub const WILDCARD: &str = "*";

/// Check whether `pattern` matches `event_type`.
pub fn pattern_matches(pattern: &str, event_type: &str) -> bool {
    if pattern == WILDCARD {
        return true;
    }
    match pattern.strip_suffix('*') {
        Some(prefix) if prefix.ends_with('.') => event_type.starts_with(prefix),
        _ => pattern == event_type,
    }
}

/// Check whether any of `patterns` matches `event_type`.
pub fn any_matches(patterns: &[String], event_type: &str) -> bool {
    patterns.iter().any(|p| pattern_matches(p, event_type))
}

/// Check that a pattern is well formed: non-empty, no whitespace, and `*`
/// only as the whole pattern or as a trailing `.*`.
pub fn is_valid_pattern(pattern: &str) -> bool {
    if pattern.is_empty() || pattern.chars().any(char::is_whitespace) {
        return false;
    }
    if pattern == WILDCARD {
        return true;
    }
    match pattern.find('*') {
        None => true,
        Some(idx) => idx == pattern.len() - 1 && idx >= 2 && pattern[..idx].ends_with('.'),
    }
}

/// Trim, drop blanks and de-duplicate, keeping first-seen order.
pub fn normalize_patterns<I, S>(patterns: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for pattern in patterns {
        let trimmed = pattern.as_ref().trim();
        if !trimmed.is_empty() && !out.iter().any(|p| p == trimmed) {
            out.push(trimmed.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        assert!(pattern_matches("action.created", "action.created"));
        assert!(!pattern_matches("action.created", "action.status_changed"));
    }

    #[test]
    fn test_prefix_wildcard() {
        assert!(pattern_matches("action.*", "action.created"));
        assert!(pattern_matches("action.*", "action.status_changed"));
        assert!(!pattern_matches("action.*", "actions.created"));
        assert!(!pattern_matches("action.*", "action"));
    }

    #[test]
    fn test_global_wildcard() {
        assert!(pattern_matches("*", "anything.at.all"));
    }

    #[test]
    fn test_pattern_validation() {
        assert!(is_valid_pattern("certificate.expired"));
        assert!(is_valid_pattern("certificate.*"));
        assert!(is_valid_pattern("*"));
        assert!(!is_valid_pattern(""));
        assert!(!is_valid_pattern("cert *"));
        assert!(!is_valid_pattern("cert*"));
        assert!(!is_valid_pattern("*.created"));
        assert!(!is_valid_pattern(".*"));
    }

    #[test]
    fn test_normalize_dedups_and_trims() {
        let out = normalize_patterns(["  a.b ", "a.b", "", "   ", "c.*"]);
        assert_eq!(out, vec!["a.b".to_string(), "c.*".to_string()]);
    }
}

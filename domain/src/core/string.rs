//! String utilities for the domain layer.

/// Truncate a string to a maximum length with ellipsis (UTF-8 safe)
///
/// Uses byte length for max_len but ensures truncation occurs at valid
/// UTF-8 character boundaries.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        let target = max_len.saturating_sub(3);
        let end = floor_char_boundary(s, target);
        format!("{}...", s[..end].trim_end())
    }
}

/// Cut a string at `max_len` bytes and append a `... [truncated]` marker.
///
/// Used for context documents and proposals embedded in prompts.
pub fn truncate_marked(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        let end = floor_char_boundary(s, max_len);
        format!("{}... [truncated]", &s[..end])
    }
}

/// Collapse all whitespace runs (including newlines) into single spaces.
pub fn one_line(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn floor_char_boundary(s: &str, index: usize) -> usize {
    let mut end = index.min(s.len());
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    end
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_ascii() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 8), "hello...");
    }

    #[test]
    fn test_truncate_multibyte() {
        // "é" is 2 bytes; cutting inside it must step back to a boundary
        assert_eq!(truncate("ééééé", 8), "éé...");
        assert_eq!(truncate("ééééé", 20), "ééééé");
    }

    #[test]
    fn test_truncate_marked() {
        assert_eq!(truncate_marked("short", 10), "short");
        assert_eq!(truncate_marked("abcdefghij", 4), "abcd... [truncated]");
    }

    #[test]
    fn test_one_line() {
        assert_eq!(one_line("  a\n\nb\t c  "), "a b c");
    }
}

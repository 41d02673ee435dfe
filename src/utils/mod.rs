//! Small string helpers shared across the crate.

/// Find the largest valid UTF-8 boundary at or before the given byte index.
#[inline]
fn safe_byte_boundary(s: &str, max_bytes: usize) -> usize {
    if max_bytes >= s.len() {
        return s.len();
    }
    s.char_indices()
        .map(|(i, _)| i)
        .take_while(|&i| i <= max_bytes)
        .last()
        .unwrap_or(0)
}

/// Truncate a string to maximum byte length, returning a borrowed slice
/// (UTF-8 safe). Truncation respects character boundaries to avoid panics
/// with multi-byte characters.
#[inline]
pub fn truncate_str(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        s
    } else {
        let boundary = safe_byte_boundary(s, max_len);
        &s[..boundary]
    }
}

/// First line of a message, truncated to `max_len` bytes (UTF-8 safe).
/// Used when a raw log blob has to fit into a signature message field.
pub fn first_line_truncated(s: &str, max_len: usize) -> String {
    let first = s.lines().next().unwrap_or(s);
    truncate_str(first, max_len).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_respects_utf8_boundaries() {
        let s = "héllo wörld";
        let t = truncate_str(s, 2);
        assert!(t.len() <= 2);
        assert!(s.starts_with(t));
    }

    #[test]
    fn truncate_noop_when_short() {
        assert_eq!(truncate_str("abc", 10), "abc");
    }

    #[test]
    fn first_line_only() {
        let logs = "Deployment failed: timeout\nstack trace line 1\nstack trace line 2";
        assert_eq!(
            first_line_truncated(logs, 100),
            "Deployment failed: timeout"
        );
    }

    #[test]
    fn first_line_caps_length() {
        let long = "x".repeat(300);
        assert_eq!(first_line_truncated(&long, 100).len(), 100);
    }
}

//! Truncation Utilities
//!
//! Caps large textual results (CSV views, procedure sources) for summaries,
//! keeping the head and tail and respecting UTF-8 boundaries.

/// Summary budget used by the tools
pub const SUMMARY_BYTES: usize = 4000;

pub fn truncate_text(content: &str, max_bytes: usize) -> String {
    if content.len() <= max_bytes {
        return content.to_string();
    }

    if max_bytes == 0 {
        return format!("... [{} bytes truncated] ...", content.len());
    }

    let half = max_bytes / 2;

    let mut prefix_end = half;
    while !content.is_char_boundary(prefix_end) {
        prefix_end -= 1;
    }

    let mut suffix_start = content.len() - half;
    while !content.is_char_boundary(suffix_start) {
        suffix_start += 1;
    }
    if suffix_start < prefix_end {
        suffix_start = prefix_end;
    }

    let prefix = &content[..prefix_end];
    let suffix = &content[suffix_start..];
    let truncated = content.len() - (prefix.len() + suffix.len());

    format!("{} ... [{} bytes truncated] ... {}", prefix, truncated, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_untouched() {
        assert_eq!(truncate_text("a,b\n1,2\n", 100), "a,b\n1,2\n");
    }

    #[test]
    fn test_keeps_head_and_tail() {
        let text = "0123456789".repeat(10);
        let out = truncate_text(&text, 20);
        assert!(out.starts_with("0123456789"));
        assert!(out.ends_with("0123456789"));
        assert!(out.contains("[80 bytes truncated]"));
    }

    #[test]
    fn test_multibyte_boundaries() {
        let text = "é".repeat(50);
        let out = truncate_text(&text, 7);
        assert_eq!(out, "é ... [96 bytes truncated] ... é");
    }
}

/// Truncate `text` to at most `limit` characters, appending a marker when
/// truncation occurred. Operates on `char` boundaries so it never panics on
/// multi-byte UTF-8 input.
pub fn truncate_preview(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let mut out: String = text.chars().take(limit).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_unchanged() {
        assert_eq!(truncate_preview("hi", 500), "hi");
    }

    #[test]
    fn long_text_is_truncated_with_marker() {
        let text = "a".repeat(600);
        let preview = truncate_preview(&text, 500);
        assert_eq!(preview.len(), 503);
        assert!(preview.ends_with("..."));
    }
}

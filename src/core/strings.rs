/// Cut `text` to at most `max_chars` characters, appending `...` when cut
pub fn truncate_preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => format!("{}...", &text[..byte_index]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_preview() {
        assert_eq!(truncate_preview("Hello", 10), "Hello");
        assert_eq!(truncate_preview("Hello", 5), "Hello");
        assert_eq!(truncate_preview("Hello world", 5), "Hello...");
        assert_eq!(truncate_preview("", 3), "");
        assert_eq!(truncate_preview("ñandú ñandú", 5), "ñandú...");
    }
}

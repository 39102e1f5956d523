//! Character-based string helpers shared by the extractor, prompt builder
//! and publisher.

/// Returns at most `max_chars` characters of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// First `max_chars` characters followed by `...`.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    format!("{}...", truncate_chars(text, max_chars).trim())
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

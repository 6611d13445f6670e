//! Text limits and normalization shared by the gate, the facade and adapters.

/// Request characters kept before classification and fingerprinting
pub const MAX_REQUEST_CHARS: usize = 2_000;
/// Response characters kept before classification and fingerprinting
pub const MAX_RESPONSE_CHARS: usize = 3_000;
/// Request characters carried into entry metadata
pub const MAX_ORIGINAL_REQUEST_CHARS: usize = 500;
pub const MAX_CONTENT_CHARS: usize = 10_000;
pub const MAX_SUMMARY_CHARS: usize = 200;
pub const MAX_CONTEXT_CHARS: usize = 500;
pub const MAX_CLASSIFIER_TAGS: usize = 5;
pub const MAX_ENTRY_TAGS: usize = 10;

/// Keep at most `max` characters (not bytes) of `text`.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Lower-case and trim tags, dropping empties and repeats while keeping order.
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut normalized: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.as_ref().trim().to_lowercase();
        if !tag.is_empty() && !normalized.contains(&tag) {
            normalized.push(tag);
        }
    }
    normalized
}

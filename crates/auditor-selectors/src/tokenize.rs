//! Tokenization of document text for selection scoring (§4.10).

/// Lowercases, splits on non-alphanumeric boundaries, drops tokens shorter
/// than three characters, and keeps first-seen order with no duplicates.
#[must_use]
pub fn tokenize(text: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut tokens = Vec::new();
    for raw in text.to_lowercase().split(|c: char| !c.is_ascii_alphanumeric()) {
        if raw.len() < 3 {
            continue;
        }
        if seen.insert(raw.to_string()) {
            tokens.push(raw.to_string());
        }
    }
    tokens
}

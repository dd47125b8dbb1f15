//! Term normalization.

/// Unescapes and lower-cases a literal term.
///
/// A backslash directly followed by punctuation or whitespace is dropped and the escaped
/// character is kept verbatim. Every other character is lower-cased.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '\\'
            && let Some(&next) = chars.peek()
            && is_escapable(next)
        {
            out.push(next);
            chars.next();
            continue;
        }
        out.extend(ch.to_lowercase());
    }

    out
}

/// Returns true for characters a backslash can escape.
pub fn is_escapable(ch: char) -> bool {
    ch.is_ascii_punctuation() || ch.is_whitespace()
}

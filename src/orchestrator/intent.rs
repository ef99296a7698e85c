//! Keyword intent classification for free-text queries

pub const REVERSE_KEYWORD: &str = "reverse";
pub const FIXED_DATA_PHRASE: &str = "fixed data";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Reverse the remainder after the keyword; empty when nothing follows it
    Reverse { text: String },
    FixedData,
    Unknown,
}

/// Byte offset of the first ASCII case-insensitive occurrence of `needle` that
/// stands as a whole word (not flanked by letters or digits)
fn find_word(haystack: &str, needle: &str) -> Option<usize> {
    haystack.char_indices().map(|(i, _)| i).find(|&i| {
        let end = i + needle.len();
        let matches = haystack
            .get(i..end)
            .map_or(false, |window| window.eq_ignore_ascii_case(needle));
        if !matches {
            return false;
        }

        let before = haystack[..i].chars().next_back();
        let after = haystack[end..].chars().next();
        !before.map_or(false, char::is_alphanumeric) && !after.map_or(false, char::is_alphanumeric)
    })
}

/// Classify in priority order: reverse, fixed data, unknown.
///
/// The reverse remainder keeps the caller's original casing.
pub fn classify(query: &str) -> Intent {
    let query = query.trim();

    if let Some(pos) = find_word(query, REVERSE_KEYWORD) {
        let rest = &query[pos + REVERSE_KEYWORD.len()..];
        let text = rest
            .trim_start_matches(|c: char| c == ':' || c.is_whitespace())
            .trim_end();
        return Intent::Reverse {
            text: text.to_string(),
        };
    }

    if find_word(query, FIXED_DATA_PHRASE).is_some() {
        return Intent::FixedData;
    }

    Intent::Unknown
}

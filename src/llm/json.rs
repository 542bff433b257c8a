//! Helpers for digging structured data out of free-form model output.

/// Strip a Markdown code fence (```` ``` ```` or ```` ```json ````)
/// wrapping the text, if present.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Drop the info string ("json", "JSON", ...) up to the first newline
    let rest = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };

    let rest = rest.trim_end();
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Extract the outermost JSON object from the text: everything between the
/// first `{` and the last `}`.
pub fn extract_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end >= start).then(|| &text[start..=end])
}

/// Parse a non-empty JSON array of strings, tolerating fence wrapping and
/// prose around the array itself.
pub fn parse_string_array(text: &str) -> Option<Vec<String>> {
    let cleaned = strip_code_fences(text);
    let start = cleaned.find('[')?;
    let end = cleaned.rfind(']')?;
    if end < start {
        return None;
    }
    serde_json::from_str::<Vec<String>>(&cleaned[start..=end])
        .ok()
        .filter(|parsed| !parsed.is_empty())
}

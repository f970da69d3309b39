//! Pulls a JSON payload out of LLM prose.

use serde::de::DeserializeOwned;

fn find_ignore_ascii_case(haystack: &str, needle: &str) -> Option<usize> {
    haystack
        .char_indices()
        .map(|(i, _)| i)
        .find(|&i| {
            haystack
                .get(i..i + needle.len())
                .is_some_and(|s| s.eq_ignore_ascii_case(needle))
        })
}

/// Body of the fence opening at `fence_start`. The rest of the opening line is
/// the info string and is dropped; an unclosed fence runs to the end.
fn fence_body(text: &str, fence_start: usize) -> &str {
    let after = &text[fence_start + 3..];
    let body_start = after.find('\n').map(|i| i + 1).unwrap_or(after.len());
    let body = &after[body_start..];
    match body.find("```") {
        Some(end) => body[..end].trim(),
        None => body.trim(),
    }
}

fn json_fence(text: &str) -> Option<&str> {
    let start = find_ignore_ascii_case(text, "```json")?;
    Some(fence_body(text, start))
}

fn any_fence(text: &str) -> Option<&str> {
    let start = text.find("```")?;
    Some(fence_body(text, start))
}

/// First `{` through last `}`.
pub fn brace_slice(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// The JSON candidate of `text`: a `json` fence, then any fence, then the
/// outermost braces, then the trimmed text.
pub fn extract_json_block(text: &str) -> &str {
    json_fence(text)
        .filter(|s| !s.is_empty())
        .or_else(|| any_fence(text).filter(|s| !s.is_empty()))
        .or_else(|| brace_slice(text))
        .unwrap_or_else(|| text.trim())
}

/// Decodes the extracted candidate, retrying its brace slice on failure.
pub fn decode_layered<T: DeserializeOwned>(text: &str) -> Result<T, serde_json::Error> {
    let candidate = extract_json_block(text);
    match serde_json::from_str(candidate) {
        Ok(value) => Ok(value),
        Err(first) => match brace_slice(candidate) {
            Some(inner) if inner != candidate => serde_json::from_str(inner),
            _ => Err(first),
        },
    }
}

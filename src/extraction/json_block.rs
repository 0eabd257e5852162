//! JSON block extraction from free-text model output
//!
//! Grammar, first match wins:
//!
//! 1. A ```` ```json ```` fence: the block runs to the next ```` ``` ```` or to
//!    the end of the text when the closing fence is missing.
//! 2. Any other ```` ``` ```` fence, same rule. A bare info string on the
//!    opening line (for example `javascript`) is dropped.
//! 3. No fence: the text from the first `{` to the last `}`.
//! 4. Otherwise the whole trimmed text.

use serde_json::Value;

/// Where the candidate JSON text was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockSource {
    JsonFence,
    GenericFence,
    Braces,
    WholeText,
}

/// A candidate JSON slice located in model output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JsonBlock<'a> {
    pub source: BlockSource,
    pub text: &'a str,
}

/// Outcome of parsing model output as JSON
#[derive(Debug, Clone, PartialEq)]
pub enum JsonBlockResult {
    Parsed { value: Value, source: BlockSource },
    /// Nothing but whitespace to parse
    Empty,
    /// A candidate was found but is not valid JSON
    Malformed {
        source: BlockSource,
        candidate: String,
        error: String,
    },
}

impl JsonBlockResult {
    pub fn into_value(self) -> Option<Value> {
        match self {
            JsonBlockResult::Parsed { value, .. } => Some(value),
            _ => None,
        }
    }
}

const JSON_FENCE: &str = "```json";
const FENCE: &str = "```";

/// Locates the first JSON candidate in `content`
pub fn locate(content: &str) -> JsonBlock<'_> {
    let trimmed = content.trim();

    if let Some(start_idx) = trimmed.find(JSON_FENCE) {
        let after_fence = &trimmed[start_idx + JSON_FENCE.len()..];
        return JsonBlock {
            source: BlockSource::JsonFence,
            text: until_closing_fence(after_fence),
        };
    }

    if let Some(start_idx) = trimmed.find(FENCE) {
        let after_fence = strip_info_string(&trimmed[start_idx + FENCE.len()..]);
        return JsonBlock {
            source: BlockSource::GenericFence,
            text: until_closing_fence(after_fence),
        };
    }

    if !trimmed.starts_with('{') && !trimmed.starts_with('[') {
        if let (Some(open), Some(close)) = (trimmed.find('{'), trimmed.rfind('}')) {
            if open < close {
                return JsonBlock {
                    source: BlockSource::Braces,
                    text: &trimmed[open..=close],
                };
            }
        }
    }

    JsonBlock {
        source: BlockSource::WholeText,
        text: trimmed,
    }
}

/// Locates and parses the first JSON candidate in `content`
pub fn parse(content: &str) -> JsonBlockResult {
    let block = locate(content);
    if block.text.is_empty() {
        return JsonBlockResult::Empty;
    }

    match serde_json::from_str::<Value>(block.text) {
        Ok(value) => JsonBlockResult::Parsed {
            value,
            source: block.source,
        },
        Err(e) => JsonBlockResult::Malformed {
            source: block.source,
            candidate: block.text.to_string(),
            error: e.to_string(),
        },
    }
}

fn until_closing_fence(text: &str) -> &str {
    match text.find(FENCE) {
        Some(end_idx) => text[..end_idx].trim(),
        None => text.trim(),
    }
}

fn strip_info_string(text: &str) -> &str {
    let Some(newline) = text.find('\n') else {
        return text;
    };
    let first_line = text[..newline].trim();
    let is_info_string = !first_line.is_empty()
        && first_line
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '+');

    if is_info_string {
        &text[newline + 1..]
    } else {
        text
    }
}

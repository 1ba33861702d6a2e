use log::debug;
use serde_json::{Map, Value};

use crate::llm::types::{CompletionResponse, Part};

/// Normalize a completion response to plain, trimmed text.
///
/// Never fails. A response that carries no recognizable text yields `""`, and an unknown shape
/// is stringified whole.
pub fn extract_text(response: &CompletionResponse) -> String {
    let text = match response {
        CompletionResponse::TextField(text) => text.as_str().to_string(),
        CompletionResponse::OutputList(parts) => {
            parts.first().map(Part::text).unwrap_or_default().to_string()
        }
        CompletionResponse::Unknown(Value::String(s)) => s.clone(),
        CompletionResponse::Unknown(Value::Null) => String::new(),
        CompletionResponse::Unknown(other) => other.to_string(),
    };

    debug!("Completion raw output length: {}", text.len());
    text.trim().to_string()
}

/// Parse the JSON object embedded in noisy model output.
///
/// Takes everything from the first `{` to the last `}` and parses it. If that fails, trailing
/// commas before `}`/`]` are removed and the parse is retried once. Returns an empty map when
/// there is nothing usable.
pub fn extract_json(text: &str) -> Map<String, Value> {
    let Some(candidate) = outermost_braces(text) else {
        return Map::new();
    };

    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(candidate) {
        return map;
    }

    let cleaned = strip_trailing_commas(candidate);
    match serde_json::from_str::<Value>(&cleaned) {
        Ok(Value::Object(map)) => map,
        Ok(_) => Map::new(),
        Err(e) => {
            debug!("Lenient JSON repair failed: {}", e);
            Map::new()
        }
    }
}

fn outermost_braces(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

/// Drops every `,` whose next non-whitespace character closes an object or array.
///
/// Commas inside string literals are left alone.
pub fn strip_trailing_commas(json: &str) -> String {
    let chars: Vec<char> = json.chars().collect();
    let mut out = String::with_capacity(json.len());
    let mut in_string = false;
    let mut escaped = false;

    for (i, &c) in chars.iter().enumerate() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            ',' => {
                let next = chars[i + 1..].iter().find(|ch| !ch.is_whitespace());
                if !matches!(next, Some('}') | Some(']')) {
                    out.push(c);
                }
            }
            _ => out.push(c),
        }
    }

    out
}

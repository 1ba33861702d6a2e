use serde_json::Value;
use std::collections::HashSet;

const ELLIPSIS: &str = " ...";

/// Cut `text` to at most `max_chars` characters, appending ` ...` when anything was dropped.
///
/// Counting is done on `char`s so the cut never lands inside a UTF-8 sequence.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}{}", &text[..byte_idx], ELLIPSIS),
        None => text.to_string(),
    }
}

pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Remove repeated entries by exact equality, keeping the first occurrence of each.
pub fn dedup_preserving_order<I>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    let mut deduped = Vec::new();

    for item in items {
        if seen.insert(item.clone()) {
            deduped.push(item);
        }
    }

    deduped
}

/// Whether a JSON value counts as present: not null, not false, not zero, not empty.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

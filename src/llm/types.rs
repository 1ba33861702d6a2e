use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::utils::is_truthy;

/// A completion-service answer whose exact shape is not guaranteed across service versions.
///
/// Decoding never fails: whatever does not match a known shape is kept as [`Unknown`] and
/// stringified on extraction.
///
/// [`Unknown`]: CompletionResponse::Unknown
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionResponse {
    /// A body that exposes its generated text directly.
    TextField(String),
    /// A body with an `output` container. Only the first part is consulted.
    OutputList(Vec<Part>),
    Unknown(Value),
}

/// One element of an `output` container.
#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    /// `{"content": "..."}` (or `contents`)
    Content(String),
    /// `{"content": [{"text": "..."}, ...]}`
    Blocks(Vec<TextBlock>),
    /// A bare string element.
    Plain(String),
    Unrecognized,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextBlock {
    #[serde(default)]
    pub text: Option<String>,
}

impl CompletionResponse {
    pub fn text(text: impl Into<String>) -> Self {
        CompletionResponse::TextField(text.into())
    }

    /// Classify an arbitrary JSON body.
    pub fn from_value(value: Value) -> Self {
        let map = match value {
            Value::Object(map) => map,
            other => return CompletionResponse::Unknown(other),
        };

        if let Some(text) = non_empty_str(map.get("text")) {
            return CompletionResponse::TextField(text.to_string());
        }

        if let Some(text) = decode_candidates(&map) {
            return CompletionResponse::TextField(text);
        }

        match map.get("output") {
            Some(Value::Array(items)) => {
                CompletionResponse::OutputList(items.iter().map(Part::from_value).collect())
            }
            Some(single) => CompletionResponse::OutputList(vec![Part::from_value(single)]),
            None => CompletionResponse::Unknown(Value::Object(map)),
        }
    }
}

impl From<Value> for CompletionResponse {
    fn from(value: Value) -> Self {
        CompletionResponse::from_value(value)
    }
}

impl Part {
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::String(s) => Part::Plain(s.clone()),
            Value::Object(map) => {
                let content = match map.get("content") {
                    Some(v) if is_truthy(v) => Some(v),
                    _ => map.get("contents"),
                };
                match content {
                    Some(Value::String(s)) => Part::Content(s.clone()),
                    Some(Value::Array(items)) => Part::Blocks(
                        items
                            .iter()
                            .map(|item| TextBlock {
                                text: item
                                    .get("text")
                                    .and_then(Value::as_str)
                                    .map(str::to_string),
                            })
                            .collect(),
                    ),
                    _ => Part::Unrecognized,
                }
            }
            _ => Part::Unrecognized,
        }
    }

    /// The text carried by this part, or `""` when it carries none.
    pub fn text(&self) -> &str {
        match self {
            Part::Content(s) | Part::Plain(s) => s.as_str(),
            Part::Blocks(blocks) => blocks
                .iter()
                .filter_map(|b| b.text.as_deref())
                .find(|t| !t.is_empty())
                .unwrap_or(""),
            Part::Unrecognized => "",
        }
    }
}

/// Joins the text parts of the first candidate of a `generateContent` REST body.
fn decode_candidates(map: &Map<String, Value>) -> Option<String> {
    let parts = map
        .get("candidates")?
        .as_array()?
        .first()?
        .get("content")?
        .get("parts")?
        .as_array()?;

    let text: String = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(Value::as_str))
        .collect();

    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}

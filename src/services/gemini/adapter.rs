//! Adapter layer: Convert Gemini responses to [`ExtractedParams`]
//!
//! The model answers in free text. The parameter object may be bare, wrapped
//! in a fenced ```json block, or wrapped in an
//! `{"intent": ..., "data": {...}}` envelope. Anything else is a
//! [`ServiceError::Parse`], which the intent parser treats as recoverable.

use serde_json::Value;

use super::dto;
use crate::services::domain::{ExtractedParams, ServiceError};

/// Intent name that carries playlist parameters
const PLAYLIST_INTENT: &str = "create_playlist";

/// Convert a generate response to extracted parameters.
pub fn to_params(response: dto::GenerateResponse) -> Result<ExtractedParams, ServiceError> {
    let text = response_text(&response)
        .ok_or_else(|| ServiceError::Parse("response has no text candidate".to_string()))?;
    params_from_text(&text)
}

/// Concatenate the text parts of the first candidate.
fn response_text(response: &dto::GenerateResponse) -> Option<String> {
    let content = response.candidates.first()?.content.as_ref()?;
    let text: String = content
        .parts
        .iter()
        .filter_map(|p| p.text.as_deref())
        .collect();
    (!text.trim().is_empty()).then_some(text)
}

/// Pull parameters out of the model's text.
pub fn params_from_text(text: &str) -> Result<ExtractedParams, ServiceError> {
    let json = extract_json_block(text)
        .ok_or_else(|| ServiceError::Parse("no JSON object in response".to_string()))?;
    let value: Value =
        serde_json::from_str(json).map_err(|e| ServiceError::Parse(e.to_string()))?;

    let value = match value {
        Value::Object(mut map) if map.contains_key("intent") || map.contains_key("data") => {
            if let Some(intent) = map.get("intent").and_then(Value::as_str)
                && intent != PLAYLIST_INTENT
            {
                return Err(ServiceError::Parse(format!(
                    "expected {} intent, got {}",
                    PLAYLIST_INTENT, intent
                )));
            }
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    };

    if !value.is_object() {
        return Err(ServiceError::Parse(
            "parameters are not a JSON object".to_string(),
        ));
    }
    serde_json::from_value(value).map_err(|e| ServiceError::Parse(e.to_string()))
}

/// Find the JSON object in `text`: the body of a fenced code block if there
/// is one, otherwise the span from the first `{` to the last `}`.
fn extract_json_block(text: &str) -> Option<&str> {
    if let Some(start) = text.find("```") {
        let after = &text[start + 3..];
        let after = after.strip_prefix("json").unwrap_or(after);
        if let Some(end) = after.find("```") {
            let body = after[..end].trim();
            if body.starts_with('{') {
                return Some(body);
            }
        }
    }

    let open = text.find('{')?;
    let close = text.rfind('}')?;
    (close > open).then(|| &text[open..=close])
}

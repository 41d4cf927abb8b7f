//! Validation of the service's text answer into an `ExtractionResult`

use credito_core::{Entry, ExtractionResult};
use serde_json::{Map, Value};

use crate::error::{ExtractError, Result};

/// Parse the model's answer. Any contract violation is `MalformedResponse`.
pub fn parse_extraction(text: &str) -> Result<ExtractionResult> {
    let body = strip_code_fence(text);
    let value: Value = serde_json::from_str(body)
        .map_err(|e| ExtractError::MalformedResponse(format!("response is not valid JSON: {e}")))?;

    let obj = value
        .as_object()
        .ok_or_else(|| ExtractError::MalformedResponse("top-level value is not an object".into()))?;

    let client_name = match obj.get("clientName") {
        None => return Err(ExtractError::MalformedResponse("missing clientName field".into())),
        Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(other) => {
            return Err(ExtractError::MalformedResponse(format!(
                "clientName is not text: {other}"
            )));
        }
    };

    let raw_entries = obj
        .get("entries")
        .and_then(Value::as_array)
        .ok_or_else(|| ExtractError::MalformedResponse("entries is missing or not a list".into()))?;

    let entries = raw_entries
        .iter()
        .enumerate()
        .map(|(i, v)| parse_entry(i, v))
        .collect::<Result<Vec<_>>>()?;

    Ok(ExtractionResult { client_name, entries })
}

fn parse_entry(index: usize, value: &Value) -> Result<Entry> {
    let obj = value.as_object().ok_or_else(|| {
        ExtractError::MalformedResponse(format!("entry {index} is not an object"))
    })?;

    let amount = match obj.get("amount") {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|a| a.is_finite())
    .ok_or_else(|| ExtractError::MalformedResponse(format!("entry {index} has no numeric amount")))?;

    Ok(Entry {
        description: text_field(obj, "description"),
        amount,
        date: text_field(obj, "date"),
    })
}

/// Kept byte for byte: grouping and the date check see exactly what was sent
fn text_field(obj: &Map<String, Value>, key: &str) -> String {
    obj.get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_default()
}

/// Drop a surrounding ```json fence if the model added one.
fn strip_code_fence(text: &str) -> &str {
    let t = text.trim();
    let Some(rest) = t.strip_prefix("```") else {
        return t;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

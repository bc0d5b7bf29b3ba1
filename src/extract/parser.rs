use super::ExtractError;

/// Extract the fenced ```json block from a model response and parse it.
///
/// Parsing is strict: a malformed or missing block fails the extraction
/// rather than salvaging a partial object.
pub fn parse_json_block(response: &str) -> Result<serde_json::Value, ExtractError> {
    let json_str = extract_json_block(response)?;
    serde_json::from_str(&json_str).map_err(|e| ExtractError::JsonParsing(e.to_string()))
}

fn extract_json_block(response: &str) -> Result<String, ExtractError> {
    let json_start = response
        .find("```json")
        .ok_or_else(|| ExtractError::MalformedResponse("No JSON block found".into()))?;
    let content_start = json_start + 7;

    let content_end = response[content_start..]
        .find("```")
        .ok_or_else(|| ExtractError::MalformedResponse("Unclosed JSON block".into()))?;

    Ok(response[content_start..content_start + content_end]
        .trim()
        .to_string())
}

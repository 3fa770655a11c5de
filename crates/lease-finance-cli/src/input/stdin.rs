use serde_json::Value;
use std::io::{self, Read};

/// Read a piped document from stdin: JSON first, then YAML (saved scenarios
/// are often YAML). Returns `None` when stdin is a terminal or empty.
pub fn read_stdin() -> Result<Option<Value>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    let document = buffer.trim();
    if document.is_empty() {
        return Ok(None);
    }

    parse_document(document).map(Some)
}

/// Parse a JSON or YAML document into a JSON value.
pub fn parse_document(document: &str) -> Result<Value, Box<dyn std::error::Error>> {
    match serde_json::from_str::<Value>(document) {
        Ok(value) => Ok(value),
        Err(json_err) => {
            let value: Value = serde_yaml::from_str(document).map_err(|yaml_err| {
                format!("input is neither JSON ({json_err}) nor YAML ({yaml_err})")
            })?;
            tracing::debug!("parsed YAML document");
            Ok(value)
        }
    }
}

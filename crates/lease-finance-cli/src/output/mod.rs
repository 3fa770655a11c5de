pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Render status-tagged results (IRR, payback) as a single readable cell.
/// Returns `None` for ordinary objects.
pub fn render_tagged(value: &Value) -> Option<String> {
    let map = value.as_object()?;
    let status = map.get("status")?.as_str()?;
    let text = match status {
        "converged" => map.get("rate").map(scalar_text)?,
        "periods" => map.get("periods").map(scalar_text)?,
        "never" => "Never".to_string(),
        "not_applicable" => "N/A".to_string(),
        "not_converged" => match map.get("reason").and_then(Value::as_str) {
            Some(reason) => format!("not converged ({})", reason.replace('_', " ")),
            None => "not converged".to_string(),
        },
        _ => return None,
    };
    Some(text)
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Split an object into scalar fields and nested row collections
/// (schedules, investor returns) that print as their own sections.
pub fn partition_sections(
    map: &serde_json::Map<String, Value>,
) -> (Vec<(&String, &Value)>, Vec<(&String, &Vec<Value>)>) {
    let mut fields = Vec::new();
    let mut sections = Vec::new();
    for (key, val) in map {
        match val {
            Value::Array(rows) if rows.first().is_some_and(Value::is_object) => {
                sections.push((key, rows))
            }
            _ => fields.push((key, val)),
        }
    }
    (fields, sections)
}

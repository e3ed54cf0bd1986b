//! Template filters available inside manifest bodies

use base64::Engine as _;
use minijinja::{Error, ErrorKind, Value};

/// Filters registered on every environment, for diagnostics
pub const AVAILABLE_FILTERS: &[&str] = &[
    "toyaml",
    "tojson",
    "b64encode",
    "b64decode",
    "quote",
    "indent",
    "nindent",
    "dnslabel",
];

fn to_json(value: &Value) -> Result<serde_json::Value, Error> {
    serde_json::to_value(value).map_err(|e| Error::new(ErrorKind::InvalidOperation, e.to_string()))
}

/// Render a value as a YAML fragment without the document marker
///
/// Usage: {{ parameter.labels | toyaml | nindent(4) }}
pub fn toyaml(value: Value) -> Result<String, Error> {
    let yaml = serde_yaml::to_string(&to_json(&value)?)
        .map_err(|e| Error::new(ErrorKind::InvalidOperation, e.to_string()))?;
    Ok(yaml.trim_start_matches("---\n").trim_end().to_string())
}

/// Render a value as compact JSON, which is also valid flow-style YAML
pub fn tojson(value: Value) -> Result<String, Error> {
    serde_json::to_string(&to_json(&value)?)
        .map_err(|e| Error::new(ErrorKind::InvalidOperation, e.to_string()))
}

#[must_use]
pub fn b64encode(value: String) -> String {
    base64::engine::general_purpose::STANDARD.encode(value.as_bytes())
}

pub fn b64decode(value: String) -> Result<String, Error> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(value.as_bytes())
        .map_err(|e| Error::new(ErrorKind::InvalidOperation, format!("base64 decode error: {}", e)))?;
    String::from_utf8(bytes)
        .map_err(|e| Error::new(ErrorKind::InvalidOperation, format!("UTF-8 decode error: {}", e)))
}

/// Double-quote a value so YAML keeps it a string (`"80"` rather than `80`)
#[must_use]
pub fn quote(value: Value) -> String {
    let raw = value.as_str().map(str::to_string).unwrap_or_else(|| value.to_string());
    format!("\"{}\"", raw.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Prefix every non-empty line with `spaces` spaces
#[must_use]
pub fn indent(value: String, spaces: usize) -> String {
    let pad = " ".repeat(spaces);
    value
        .lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{}{}", pad, line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Like `indent`, with a leading newline
#[must_use]
pub fn nindent(value: String, spaces: usize) -> String {
    format!("\n{}", indent(value, spaces))
}

/// Lowercase a value into an RFC 1123 label usable as a resource name
///
/// Usage: {{ parameter.appName | dnslabel }}
#[must_use]
pub fn dnslabel(value: String) -> String {
    let mut label = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch.to_ascii_lowercase() {
            c @ ('a'..='z' | '0'..='9') => label.push(c),
            _ if !label.ends_with('-') => label.push('-'),
            _ => {}
        }
    }
    let mut label = label.trim_matches('-').to_string();
    label.truncate(63);
    label.trim_end_matches('-').to_string()
}

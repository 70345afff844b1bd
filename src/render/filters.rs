//! Custom Tera filters available to builder and index templates.

use std::collections::HashMap;

use tera::{Result, Value};

/// Prefix that continues a doc comment on the next line of a generated method.
pub const COMMENT_CONTINUATION: &str = "    /// ";

/// Upper-case the first character, leave the rest untouched.
pub(crate) fn capitalize_first(value: &Value, _args: &HashMap<String, Value>) -> Result<Value> {
    let s = value
        .as_str()
        .ok_or_else(|| tera::Error::msg("capitalize_first filter expects a string"))?;
    let mut chars = s.chars();
    let out = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    };
    Ok(Value::String(out))
}

/// Continue every embedded line break as a doc comment line.
/// CRLF and lone CR count as line breaks.
pub(crate) fn comment(value: &Value, _args: &HashMap<String, Value>) -> Result<Value> {
    let s = value
        .as_str()
        .ok_or_else(|| tera::Error::msg("comment filter expects a string"))?;
    let continued = s
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace('\n', &format!("\n{}", COMMENT_CONTINUATION));
    Ok(Value::String(continued))
}

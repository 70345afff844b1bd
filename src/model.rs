//! Data model for extracted filter documentation: format-agnostic.

use serde::Serialize;

/// One documented filter.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterRecord {
    /// Last identifier-like token of the heading text
    pub name: String,
    /// Parameters in document order
    pub parameters: Vec<ParameterRecord>,
}

/// A named option of a filter, or one allowed value of such an option.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterRecord {
    /// First comma-separated token of the term
    pub name: String,
    /// Remaining comma-separated tokens, trimmed
    pub aliases: Vec<String>,
    /// Raw description text, verbatim
    pub description: String,
    /// Enumerated values (one level deep; always empty on a value itself)
    pub allowed_values: Vec<ParameterRecord>,
}

impl ParameterRecord {
    /// Assign `name` and `aliases` from a raw term like `"w, width"`.
    pub fn set_label(&mut self, raw: &str) {
        let mut parts = raw.split(',').map(str::trim);
        self.name = parts.next().unwrap_or_default().to_string();
        self.aliases = parts.filter(|p| !p.is_empty()).map(str::to_string).collect();
    }
}

//! Template context: a filter record plus the Rust names derived from it.

use crate::model::{FilterRecord, ParameterRecord};
use heck::{ToPascalCase, ToSnakeCase};
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

const KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "crate",
    "do", "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl",
    "in", "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub",
    "ref", "return", "self", "static", "struct", "super", "trait", "true", "try", "type",
    "typeof", "unsafe", "unsized", "use", "virtual", "where", "while", "yield",
];

/// Methods every generated builder defines for itself.
const RESERVED: &[&str] = &["new", "options", "to_filter_string"];

#[derive(Debug, Serialize)]
pub struct FilterView<'a> {
    pub name: &'a str,
    /// Quoted Rust string literal of `name`
    pub literal: String,
    pub module: String,
    pub type_name: String,
    pub parameters: Vec<ParameterView<'a>>,
}

#[derive(Debug, Serialize)]
pub struct ParameterView<'a> {
    pub name: &'a str,
    pub literal: String,
    pub ident: String,
    pub aliases: &'a [String],
    pub description: &'a str,
    pub allowed_values: &'a [ParameterRecord],
}

/// Index entry for one generated module.
#[derive(Debug, Serialize)]
pub struct IndexEntry<'a> {
    pub name: &'a str,
    pub module: String,
    pub type_name: String,
}

#[derive(Debug, Serialize)]
pub struct IndexView<'a> {
    pub count: usize,
    pub filters: Vec<IndexEntry<'a>>,
}

impl<'a> FilterView<'a> {
    pub fn new(record: &'a FilterRecord) -> Self {
        let mut seen = HashSet::new();
        let parameters = record
            .parameters
            .iter()
            .filter_map(|p| {
                let ident = ident(&p.name);
                if !seen.insert(ident.clone()) {
                    debug!(filter = %record.name, parameter = %p.name, "duplicate parameter skipped");
                    return None;
                }
                Some(ParameterView {
                    name: &p.name,
                    literal: format!("{:?}", p.name),
                    ident,
                    aliases: &p.aliases,
                    description: &p.description,
                    allowed_values: &p.allowed_values,
                })
            })
            .collect();

        Self {
            name: &record.name,
            literal: format!("{:?}", record.name),
            module: ident(&record.name),
            type_name: type_name(&record.name),
            parameters,
        }
    }
}

impl<'a> IndexView<'a> {
    pub fn new(records: &'a [FilterRecord]) -> Self {
        Self {
            count: records.len(),
            filters: records
                .iter()
                .map(|r| IndexEntry {
                    name: &r.name,
                    module: ident(&r.name),
                    type_name: type_name(&r.name),
                })
                .collect(),
        }
    }
}

/// Snake-case Rust identifier for a documented name.
pub fn ident(name: &str) -> String {
    let mut ident = name.to_snake_case();
    if ident.is_empty() {
        return "value".to_string();
    }
    if ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    if KEYWORDS.contains(&ident.as_str()) || RESERVED.contains(&ident.as_str()) {
        ident.push('_');
    }
    ident
}

/// Builder type name: `scale` → `ScaleFilter`.
/// Never bare `Filter`, which the index declares as the trait.
pub fn type_name(name: &str) -> String {
    let pascal = name.to_pascal_case();
    if pascal.is_empty() {
        "ValueFilter".to_string()
    } else if pascal.starts_with(|c: char| c.is_ascii_digit()) {
        format!("F{}Filter", pascal)
    } else {
        format!("{}Filter", pascal)
    }
}

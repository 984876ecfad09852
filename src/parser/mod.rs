//! Constraint document decoding
//!
//! Documents arrive as JSON or TOML. Both are decoded with serde into the same
//! [`Document`] shape; syntax and type errors keep their byte span so they can
//! be rendered with source context.

pub mod document;
pub mod position;

use std::path::Path;

pub use document::{Document, ElementSpec, PlotSpec, Priority};
pub use position::{Anchor, HAlign, Position, VAlign};

use crate::error::MalformedInputError;

/// Serialization format of a constraint document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocumentFormat {
    #[default]
    Json,
    Toml,
}

impl DocumentFormat {
    /// Guess the format from a file extension, defaulting to JSON
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => DocumentFormat::Toml,
            _ => DocumentFormat::Json,
        }
    }
}

impl std::fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentFormat::Json => write!(f, "JSON"),
            DocumentFormat::Toml => write!(f, "TOML"),
        }
    }
}

/// Parse a document in the given format
pub fn parse(source: &str, format: DocumentFormat) -> Result<Document, MalformedInputError> {
    match format {
        DocumentFormat::Json => parse_json(source),
        DocumentFormat::Toml => parse_toml(source),
    }
}

/// Parse a JSON document
pub fn parse_json(source: &str) -> Result<Document, MalformedInputError> {
    serde_json::from_str(source).map_err(|err| {
        let span = line_column_to_offset(source, err.line(), err.column())
            .map(|offset| offset..(offset + 1).min(source.len()));
        MalformedInputError::syntax(DocumentFormat::Json, strip_position(&err.to_string()), span)
    })
}

/// Parse a TOML document
pub fn parse_toml(source: &str) -> Result<Document, MalformedInputError> {
    toml::from_str(source).map_err(|err| {
        MalformedInputError::syntax(
            DocumentFormat::Toml,
            err.message().trim().to_string(),
            err.span(),
        )
    })
}

/// Convert serde_json's 1-based line/column into a byte offset
fn line_column_to_offset(source: &str, line: usize, column: usize) -> Option<usize> {
    if line == 0 {
        return None;
    }
    let mut offset = 0;
    for (index, text) in source.split_inclusive('\n').enumerate() {
        if index + 1 == line {
            return Some((offset + column.saturating_sub(1)).min(source.len()));
        }
        offset += text.len();
    }
    Some(source.len())
}

/// serde_json appends " at line L column C"; the span already carries it
fn strip_position(message: &str) -> String {
    match message.rfind(" at line ") {
        Some(index) => message[..index].to_string(),
        None => message.to_string(),
    }
}

//! Loading SCD and bundle files into typed documents.

use crate::document::{Bundle, ScdDocument};
use miette::Diagnostic;
use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Errors raised while turning a file into a document.
#[derive(Debug, Error, Diagnostic)]
pub enum ParseError {
    /// The file could not be read.
    #[error("Failed to read {path}: {source}")]
    #[diagnostic(code(scs::parse::io))]
    Io {
        /// File that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// The file is not valid YAML.
    #[error("Invalid YAML in {path}{location}: {message}")]
    #[diagnostic(code(scs::parse::yaml))]
    Yaml {
        /// File that failed to parse.
        path: PathBuf,
        /// ` (line L, column C)` when the parser reports a position.
        location: String,
        /// Parser message.
        message: String,
    },

    /// The file contains no document.
    #[error("File is empty: {path}")]
    #[diagnostic(code(scs::parse::empty))]
    Empty {
        /// Empty file.
        path: PathBuf,
    },

    /// The top-level value is not a mapping.
    #[error("Expected a mapping at the top level of {path}, found {found}")]
    #[diagnostic(
        code(scs::parse::not_a_mapping),
        help("SCDs and bundles are YAML mappings with at least an `id` field")
    )]
    NotAMapping {
        /// Offending file.
        path: PathBuf,
        /// Kind of value that was found instead.
        found: &'static str,
    },
}

impl ParseError {
    /// Path of the file that failed.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Io { path, .. }
            | Self::Yaml { path, .. }
            | Self::Empty { path }
            | Self::NotAMapping { path, .. } => path,
        }
    }
}

/// Reads YAML (or JSON) documents from disk.
///
/// Each call opens, reads and closes its file; nothing is cached.
#[derive(Debug, Clone, Copy, Default)]
pub struct Parser;

impl Parser {
    /// Creates a new parser.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Loads an SCD.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] if the file is unreadable, malformed, empty,
    /// or not a mapping.
    pub fn load_scd(&self, path: &Path) -> Result<ScdDocument, ParseError> {
        load_mapping(path).map(ScdDocument::from_value)
    }

    /// Loads a bundle.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Parser::load_scd`].
    pub fn load_bundle(&self, path: &Path) -> Result<Bundle, ParseError> {
        load_mapping(path).map(Bundle::from_value)
    }
}

fn load_mapping(path: &Path) -> Result<Value, ParseError> {
    debug!("Parsing {}", path.display());

    let content = std::fs::read_to_string(path).map_err(|e| ParseError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_mapping(&content, path)
}

/// Parses document text. Split from [`load_mapping`] for testing.
fn parse_mapping(content: &str, path: &Path) -> Result<Value, ParseError> {
    if content.trim().is_empty() {
        return Err(ParseError::Empty {
            path: path.to_path_buf(),
        });
    }

    let value: Value = serde_yaml::from_str(content).map_err(|e| ParseError::Yaml {
        path: path.to_path_buf(),
        location: e
            .location()
            .map(|l| format!(" (line {}, column {})", l.line(), l.column()))
            .unwrap_or_default(),
        message: e.to_string(),
    })?;

    match value {
        Value::Object(_) => Ok(value),
        Value::Null => Err(ParseError::Empty {
            path: path.to_path_buf(),
        }),
        other => Err(ParseError::NotAMapping {
            path: path.to_path_buf(),
            found: kind_of(&other),
        }),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Field;

    fn parse(content: &str) -> Result<Value, ParseError> {
        parse_mapping(content, Path::new("doc.yaml"))
    }

    #[test]
    fn parses_yaml_mapping() {
        let value = parse("id: scd:meta:roles\ntype: meta\n").unwrap();
        assert_eq!(value["id"], "scd:meta:roles");
    }

    #[test]
    fn accepts_json() {
        let value = parse(r#"{"id": "scd:meta:roles", "version": "1.0.0"}"#).unwrap();
        assert_eq!(value["version"], "1.0.0");
    }

    #[test]
    fn keeps_timestamps_as_strings() {
        let value = parse("created_at: 2024-01-01T00:00:00Z\n").unwrap();
        assert_eq!(value["created_at"], "2024-01-01T00:00:00Z");
    }

    #[test]
    fn rejects_broken_yaml_with_location() {
        let err = parse("id: [unclosed\n").unwrap_err();
        assert!(matches!(err, ParseError::Yaml { .. }));
        assert!(err.to_string().contains("doc.yaml"));
    }

    #[test]
    fn rejects_empty_document() {
        assert!(matches!(parse(""), Err(ParseError::Empty { .. })));
    }

    #[test]
    fn rejects_top_level_sequence() {
        let err = parse("- a\n- b\n").unwrap_err();
        assert!(err.to_string().contains("found a sequence"));
    }

    #[test]
    fn load_scd_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roles.yaml");
        std::fs::write(&path, "id: scd:meta:roles\ntitle: Roles\n").unwrap();

        let doc = Parser::new().load_scd(&path).unwrap();
        assert_eq!(doc.title, Some(Field::Text("Roles".into())));
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = Parser::new()
            .load_bundle(Path::new("/nonexistent/bundle.yaml"))
            .unwrap_err();
        assert!(matches!(err, ParseError::Io { .. }));
        assert_eq!(err.path(), Path::new("/nonexistent/bundle.yaml"));
    }
}

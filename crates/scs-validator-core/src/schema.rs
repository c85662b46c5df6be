//! Structural validation against JSON schemas.

use crate::document::{Bundle, ScdDocument};
use crate::stage::StructureValidator;
use crate::types::{Diagnostic, Stage, ValidationResult};
use miette::Diagnostic as MietteDiagnostic;
use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// File name of the SCD schema inside the schema directory.
pub const SCD_SCHEMA_FILE: &str = "scd.schema.json";

/// File name of the bundle schema inside the schema directory.
pub const BUNDLE_SCHEMA_FILE: &str = "bundle.schema.json";

/// Errors raised while loading schemas.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum SchemaError {
    /// Schema file could not be read.
    #[error("Failed to read schema {path}: {source}")]
    #[diagnostic(code(scs::schema::io))]
    Io {
        /// Schema path.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// Schema file is not JSON.
    #[error("Schema {path} is not valid JSON: {source}")]
    #[diagnostic(code(scs::schema::json))]
    Json {
        /// Schema path.
        path: PathBuf,
        /// Underlying JSON error.
        source: serde_json::Error,
    },

    /// Schema file is JSON but not a usable JSON schema.
    #[error("Schema {path} is not a valid JSON schema: {message}")]
    #[diagnostic(code(scs::schema::invalid))]
    Invalid {
        /// Schema path.
        path: PathBuf,
        /// Compiler message.
        message: String,
    },
}

/// Validates documents against the SCD and bundle JSON schemas.
pub struct SchemaValidator {
    scd: jsonschema::Validator,
    bundle: jsonschema::Validator,
}

impl std::fmt::Debug for SchemaValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaValidator").finish_non_exhaustive()
    }
}

impl SchemaValidator {
    /// Loads both schemas from a directory.
    ///
    /// # Errors
    ///
    /// Returns an error if either schema is unreadable or invalid.
    pub fn from_dir(dir: &Path) -> Result<Self, SchemaError> {
        debug!("Loading schemas from {}", dir.display());
        Ok(Self {
            scd: compile(&dir.join(SCD_SCHEMA_FILE))?,
            bundle: compile(&dir.join(BUNDLE_SCHEMA_FILE))?,
        })
    }

    /// Builds a validator from in-memory schemas.
    ///
    /// # Errors
    ///
    /// Returns an error if either schema is invalid.
    pub fn from_values(scd: &Value, bundle: &Value) -> Result<Self, SchemaError> {
        Ok(Self {
            scd: build(scd, Path::new("<scd schema>"))?,
            bundle: build(bundle, Path::new("<bundle schema>"))?,
        })
    }

    fn check(
        validator: &jsonschema::Validator,
        instance: &Value,
        stage: Stage,
        scd_id: &str,
        path: &Path,
    ) -> ValidationResult {
        let mut result = ValidationResult::new(stage);
        for error in validator.iter_errors(instance) {
            let pointer = error.instance_path.to_string();
            let pointer = if pointer.is_empty() { "/" } else { &pointer };
            result.push(
                Diagnostic::error(stage, format!("{pointer}: {error}"))
                    .with_scd_id(scd_id)
                    .with_file(Some(path)),
            );
        }
        result
    }
}

impl StructureValidator for SchemaValidator {
    fn validate_scd(&self, doc: &ScdDocument, path: &Path) -> ValidationResult {
        Self::check(&self.scd, doc.raw(), Stage::Schema, doc.id_or_unknown(), path)
    }

    fn validate_bundle(&self, bundle: &Bundle, path: &Path) -> ValidationResult {
        Self::check(
            &self.bundle,
            bundle.raw(),
            Stage::BundleSchema,
            bundle.id_or_unknown(),
            path,
        )
    }
}

fn compile(path: &Path) -> Result<jsonschema::Validator, SchemaError> {
    let content = std::fs::read_to_string(path).map_err(|e| SchemaError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let schema: Value = serde_json::from_str(&content).map_err(|e| SchemaError::Json {
        path: path.to_path_buf(),
        source: e,
    })?;
    build(&schema, path)
}

fn build(schema: &Value, path: &Path) -> Result<jsonschema::Validator, SchemaError> {
    jsonschema::validator_for(schema).map_err(|e| SchemaError::Invalid {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

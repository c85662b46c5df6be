//! Traits for the pipeline's pluggable stages.
//!
//! The pipeline only talks to stages through these traits. Each built-in
//! validator implements one; tests swap in stubs to drive specific paths.

use crate::document::{Bundle, ScdDocument};
use crate::parser::{ParseError, Parser};
use crate::resolver::ResolvedScd;
use crate::types::ValidationResult;
use std::path::Path;

/// Turns files into documents.
pub trait DocumentLoader {
    /// Loads an SCD.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] for unreadable or malformed input.
    fn load_scd(&self, path: &Path) -> Result<ScdDocument, ParseError>;

    /// Loads a bundle.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] for unreadable or malformed input.
    fn load_bundle(&self, path: &Path) -> Result<Bundle, ParseError>;
}

impl DocumentLoader for Parser {
    fn load_scd(&self, path: &Path) -> Result<ScdDocument, ParseError> {
        Parser::load_scd(self, path)
    }

    fn load_bundle(&self, path: &Path) -> Result<Bundle, ParseError> {
        Parser::load_bundle(self, path)
    }
}

/// Structural (schema) validation.
pub trait StructureValidator {
    /// Validates an SCD; returns a `schema` result.
    fn validate_scd(&self, doc: &ScdDocument, path: &Path) -> ValidationResult;

    /// Validates a bundle; returns a `bundle_schema` result.
    fn validate_bundle(&self, bundle: &Bundle, path: &Path) -> ValidationResult;
}

/// Bundle organization and type-shape rules.
pub trait OrganizationValidator {
    /// Validates a bundle; returns a `bundle` result.
    fn validate_bundle(&self, bundle: &Bundle, path: &Path) -> ValidationResult;
}

/// Cross-document relationship checks.
pub trait RelationshipValidator {
    /// Validates relationships among the resolved documents of a bundle.
    fn validate_relationships(
        &self,
        docs: &[ResolvedScd],
        bundle_type: &str,
        path: &Path,
    ) -> ValidationResult;
}

/// Project-wide completeness checks.
pub trait CompletenessValidator {
    /// Validates that a project bundle is complete.
    fn validate_completeness(
        &self,
        bundle: &Bundle,
        docs: &[ResolvedScd],
        path: &Path,
        project_root: &Path,
    ) -> ValidationResult;
}

//! Semantic validation: intra-document consistency checks.
//!
//! Every rule runs on every document. A failing rule never suppresses the
//! others, so one call reports everything wrong with a document at once.

mod rules;

pub use rules::{
    builtin_rules, parse_iso8601, IdFormat, ProvenanceCreatedBy, ProvenancePresent,
    ProvenanceRationale, ProvenanceTimestamps, RequiredStrings, TierTypeMatch, VersionFormat,
};

use crate::context::DocumentContext;
use crate::document::ScdDocument;
use crate::rule::SemanticRuleBox;
use crate::rules::SemanticRules;
use crate::types::{Diagnostic, Stage, ValidationResult};
use std::path::Path;
use tracing::debug;

/// Runs semantic rules over single documents.
///
/// The validator is immutable once built; `validate_scd` has no side effects.
pub struct SemanticValidator {
    rules: Vec<SemanticRuleBox>,
    overrides: SemanticRules,
}

impl Default for SemanticValidator {
    fn default() -> Self {
        Self::new(SemanticRules::default())
    }
}

impl SemanticValidator {
    /// Creates a validator with the built-in rules and the given overrides.
    #[must_use]
    pub fn new(overrides: SemanticRules) -> Self {
        Self::with_rules(builtin_rules(), overrides)
    }

    /// Creates a validator with a custom rule set.
    #[must_use]
    pub fn with_rules(rules: Vec<SemanticRuleBox>, overrides: SemanticRules) -> Self {
        Self { rules, overrides }
    }

    /// Returns the registered rules.
    #[must_use]
    pub fn rules(&self) -> &[SemanticRuleBox] {
        &self.rules
    }

    /// Validates one document.
    #[must_use]
    pub fn validate_scd(&self, doc: &ScdDocument, file_path: Option<&Path>) -> ValidationResult {
        let ctx = DocumentContext::new(doc, file_path);
        let mut result = ValidationResult::new(Stage::Semantic);

        for rule in &self.rules {
            if !self.overrides.is_rule_enabled(rule.name()) {
                debug!("Skipping disabled rule: {}", rule.name());
                continue;
            }

            let severity = self
                .overrides
                .rule_severity(rule.name())
                .unwrap_or_else(|| rule.default_severity());

            for message in rule.check(&ctx, doc) {
                result.push(
                    Diagnostic::new(severity, Stage::Semantic, message)
                        .with_code(rule.code())
                        .with_scd_id(ctx.scd_id)
                        .with_file(file_path),
                );
            }
        }

        result
    }
}

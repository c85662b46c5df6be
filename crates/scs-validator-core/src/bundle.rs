//! Bundle organization and type-shape rules.

use crate::document::{Bundle, ScdId};
use crate::rules::{BundleRules, ImportPolicy, RulesError};
use crate::stage::OrganizationValidator;
use crate::types::{Diagnostic, Severity, Stage, ValidationResult};
use regex::Regex;
use std::collections::HashSet;
use std::path::Path;

/// Checks how a bundle is organized: ID format, known type, import policy,
/// and which SCD tiers it may reference.
#[derive(Debug, Clone)]
pub struct BundleValidator {
    rules: BundleRules,
    id_pattern: Regex,
}

impl BundleValidator {
    /// Creates a validator from bundle rules.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured ID pattern is not a valid regex.
    pub fn new(rules: BundleRules) -> Result<Self, RulesError> {
        let id_pattern = Regex::new(&rules.id_pattern).map_err(|e| RulesError::InvalidPattern {
            key: "bundle.id_pattern",
            pattern: rules.id_pattern.clone(),
            message: e.to_string(),
        })?;
        Ok(Self { rules, id_pattern })
    }
}

impl OrganizationValidator for BundleValidator {
    fn validate_bundle(&self, bundle: &Bundle, path: &Path) -> ValidationResult {
        let mut result = ValidationResult::new(Stage::Bundle);
        let bundle_id = bundle.id_or_unknown();
        let diag = |severity: Severity, message: String| {
            Diagnostic::new(severity, Stage::Bundle, message)
                .with_scd_id(bundle_id)
                .with_file(Some(path))
        };

        result.set_detail("scd_count", bundle.scds.len());

        if !self.id_pattern.is_match(bundle_id) {
            result.push(diag(
                Severity::Error,
                format!(
                    "Bundle ID '{bundle_id}' does not match required pattern '{}'",
                    self.rules.id_pattern
                ),
            ));
        }

        if bundle.scds.is_empty() && bundle.imports.is_empty() {
            result.push(diag(
                Severity::Warning,
                "Bundle declares neither 'scds' nor 'imports'".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        let mut parsed = Vec::new();
        for reference in &bundle.scds {
            let Some(text) = reference.as_text() else {
                result.push(diag(
                    Severity::Error,
                    format!("SCD reference '{reference}' is not a string"),
                ));
                continue;
            };
            if !seen.insert(text) {
                result.push(diag(
                    Severity::Warning,
                    format!("Duplicate SCD reference '{text}'"),
                ));
                continue;
            }
            match ScdId::parse(text) {
                Ok(id) => parsed.push(id),
                Err(e) => {
                    result.push(diag(Severity::Error, format!("Invalid SCD reference: {e}")));
                }
            }
        }

        let bundle_type = bundle.type_or_unknown();
        let Some(type_rules) = self.rules.types.get(bundle_type) else {
            let known: Vec<&str> = self.rules.types.keys().map(String::as_str).collect();
            result.push(diag(
                Severity::Error,
                format!(
                    "Unknown bundle type '{bundle_type}', expected one of: {}",
                    known.join(", ")
                ),
            ));
            return result;
        };

        let imports = &bundle.imports;
        match type_rules.imports {
            ImportPolicy::Forbidden if !imports.is_empty() => result.push(diag(
                Severity::Error,
                format!(
                    "Bundles of type '{bundle_type}' must not declare 'imports' (found {})",
                    imports.len()
                ),
            )),
            ImportPolicy::Required if imports.is_empty() => result.push(diag(
                Severity::Error,
                format!("Bundles of type '{bundle_type}' must declare at least one import"),
            )),
            _ => {}
        }

        for id in parsed {
            if !type_rules.tiers.contains(&id.tier()) {
                result.push(diag(
                    Severity::Error,
                    format!(
                        "Bundle of type '{bundle_type}' cannot include {} SCD '{id}'",
                        id.tier()
                    ),
                ));
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RulesLoader;
    use serde_json::{json, Value};

    fn validate(value: Value) -> ValidationResult {
        let rules = RulesLoader::new().unwrap().bundle().clone();
        BundleValidator::new(rules)
            .unwrap()
            .validate_bundle(&Bundle::from_value(value), Path::new("bundle.yaml"))
    }

    #[test]
    fn well_formed_project_bundle_passes() {
        let result = validate(json!({
            "id": "bundle:acme",
            "type": "project",
            "imports": ["bundle:scs-meta"],
            "scds": ["scd:project:system-context", "scd:meta:roles"],
        }));
        assert!(result.passed, "{result:#?}");
        assert!(result.warnings.is_empty());
        assert_eq!(result.details["scd_count"], 2);
    }

    #[test]
    fn bad_bundle_id_is_error() {
        let result = validate(json!({"id": "acme", "type": "project", "scds": ["scd:project:a"]}));
        assert!(!result.passed);
        assert!(result.errors[0].message.contains("Bundle ID 'acme'"));
    }

    #[test]
    fn unknown_type_stops_type_rules() {
        let result = validate(json!({
            "id": "bundle:x",
            "type": "galaxy",
            "imports": ["bundle:y"],
            "scds": ["scd:project:a"],
        }));
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].message.starts_with("Unknown bundle type 'galaxy'"));
    }

    #[test]
    fn meta_bundle_forbids_imports_and_other_tiers() {
        let result = validate(json!({
            "id": "bundle:meta",
            "type": "meta",
            "imports": ["bundle:other"],
            "scds": ["scd:meta:roles", "scd:project:leak"],
        }));
        assert_eq!(result.errors.len(), 2);
        assert!(result.errors[0].message.contains("must not declare 'imports'"));
        assert!(result.errors[1]
            .message
            .contains("cannot include project SCD 'scd:project:leak'"));
    }

    #[test]
    fn duplicates_warn_and_invalid_refs_error() {
        let result = validate(json!({
            "id": "bundle:acme",
            "type": "project",
            "scds": ["scd:project:a", "scd:project:a", "scd:nope"],
        }));
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].message.contains("Duplicate"));
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].message.starts_with("Invalid SCD reference"));
    }

    #[test]
    fn empty_bundle_warns() {
        let result = validate(json!({"id": "bundle:empty", "type": "project", "scds": []}));
        assert!(result.passed);
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn invalid_id_pattern_is_rules_error() {
        let rules = BundleRules {
            id_pattern: "(".into(),
            ..BundleRules::default()
        };
        assert!(matches!(
            BundleValidator::new(rules),
            Err(RulesError::InvalidPattern { .. })
        ));
    }
}

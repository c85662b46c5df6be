//! Project completeness checks.

use crate::document::{Bundle, Field, ScdId, Tier};
use crate::resolver::ResolvedScd;
use crate::rules::CompletenessRules;
use crate::stage::CompletenessValidator as CompletenessStage;
use crate::types::{Diagnostic, Stage, ValidationResult};
use std::collections::HashSet;
use std::path::Path;

/// Checks that a project bundle covers the SCDs and files a project needs.
#[derive(Debug, Clone, Default)]
pub struct CompletenessValidator {
    rules: CompletenessRules,
}

impl CompletenessValidator {
    /// Creates a validator from completeness rules.
    #[must_use]
    pub fn new(rules: CompletenessRules) -> Self {
        Self { rules }
    }
}

impl CompletenessStage for CompletenessValidator {
    fn validate_completeness(
        &self,
        bundle: &Bundle,
        docs: &[ResolvedScd],
        path: &Path,
        project_root: &Path,
    ) -> ValidationResult {
        let mut result = ValidationResult::new(Stage::Completeness);
        let bundle_id = bundle.id_or_unknown();

        let present: HashSet<String> = bundle
            .scds
            .iter()
            .filter_map(Field::as_text)
            .filter_map(|r| ScdId::parse(r).ok())
            .filter(|id| id.tier() == Tier::Project)
            .map(|id| id.name().to_string())
            .collect();

        let mut required_present = 0_usize;
        for name in &self.rules.required_scds {
            if present.contains(name) {
                required_present += 1;
            } else {
                result.push(
                    Diagnostic::error(
                        Stage::Completeness,
                        format!("Required SCD 'scd:project:{name}' is missing from the bundle"),
                    )
                    .with_scd_id(bundle_id)
                    .with_file(Some(path)),
                );
            }
        }

        for name in self
            .rules
            .recommended_scds
            .iter()
            .filter(|n| !present.contains(*n))
        {
            result.push(
                Diagnostic::warning(
                    Stage::Completeness,
                    format!("Recommended SCD 'scd:project:{name}' is missing from the bundle"),
                )
                .with_scd_id(bundle_id)
                .with_file(Some(path)),
            );
        }

        for resolved in docs {
            for field in &self.rules.required_fields {
                let filled = resolved
                    .doc
                    .get(field)
                    .and_then(serde_json::Value::as_str)
                    .is_some_and(|s| !s.trim().is_empty());
                if !filled {
                    result.push(
                        Diagnostic::warning(
                            Stage::Completeness,
                            format!("SCD is missing a non-empty '{field}'"),
                        )
                        .with_scd_id(resolved.reference.to_string())
                        .with_file(Some(&resolved.path)),
                    );
                }
            }
        }

        for file in &self.rules.project_files {
            if !project_root.join(file).exists() {
                result.push(
                    Diagnostic::warning(
                        Stage::Completeness,
                        format!("Expected project file '{file}' was not found"),
                    )
                    .with_scd_id(bundle_id)
                    .with_file(Some(path)),
                );
            }
        }

        result.set_detail("required_present", required_present);
        result.set_detail("required_total", self.rules.required_scds.len());
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::ScdDocument;
    use serde_json::json;
    use std::path::PathBuf;

    fn rules() -> CompletenessRules {
        CompletenessRules {
            required_scds: vec!["system-context".into()],
            recommended_scds: vec!["tech-stack".into(), "data-model".into()],
            required_fields: vec!["title".into()],
            project_files: vec!["README.md".into()],
        }
    }

    fn resolved(id: &str, title: Option<&str>) -> ResolvedScd {
        let mut raw = json!({"id": id});
        if let Some(title) = title {
            raw["title"] = json!(title);
        }
        ResolvedScd {
            reference: ScdId::parse(id).unwrap(),
            path: PathBuf::from("x.yaml"),
            doc: ScdDocument::from_value(raw),
        }
    }

    fn run(scds: &[&str], docs: &[ResolvedScd], root: &Path) -> ValidationResult {
        let bundle = Bundle::from_value(json!({"id": "bundle:p", "type": "project", "scds": scds}));
        CompletenessValidator::new(rules()).validate_completeness(
            &bundle,
            docs,
            Path::new("bundle.yaml"),
            root,
        )
    }

    #[test]
    fn complete_project_has_no_findings() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("README.md"), "# p").unwrap();
        let docs = [resolved("scd:project:system-context", Some("Context"))];
        let result = run(
            &[
                "scd:project:system-context",
                "scd:project:tech-stack",
                "scd:project:data-model",
            ],
            &docs,
            dir.path(),
        );
        assert!(!result.has_findings(), "{result:#?}");
        assert_eq!(result.details["required_present"], 1);
        assert_eq!(result.details["required_total"], 1);
    }

    #[test]
    fn missing_required_is_error_and_recommended_is_warning() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("README.md"), "").unwrap();
        let result = run(&["scd:project:tech-stack"], &[], dir.path());
        assert!(!result.passed);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].message.contains("scd:project:system-context"));
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].message.contains("data-model"));
        assert_eq!(result.details["required_present"], 0);
    }

    #[test]
    fn required_name_in_other_tier_does_not_count() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("README.md"), "").unwrap();
        let result = run(&["scd:meta:system-context"], &[], dir.path());
        assert_eq!(result.errors.len(), 1);
    }

    #[test]
    fn blank_required_field_and_missing_file_warn() {
        let dir = tempfile::tempdir().unwrap();
        let docs = [resolved("scd:project:system-context", Some("  "))];
        let result = run(
            &[
                "scd:project:system-context",
                "scd:project:tech-stack",
                "scd:project:data-model",
            ],
            &docs,
            dir.path(),
        );
        assert!(result.passed);
        let messages: Vec<&str> = result.warnings.iter().map(|w| w.message.as_str()).collect();
        assert_eq!(
            messages,
            [
                "SCD is missing a non-empty 'title'",
                "Expected project file 'README.md' was not found",
            ]
        );
    }
}

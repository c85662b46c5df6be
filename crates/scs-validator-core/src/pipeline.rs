//! Pipeline orchestration: stage ordering, short-circuiting and aggregation.

use crate::bundle::BundleValidator;
use crate::completeness::CompletenessValidator;
use crate::parser::Parser;
use crate::relationship::RelationshipValidator;
use crate::resolver::resolve_refs;
use crate::rules::{RulesError, RulesLoader};
use crate::schema::{SchemaError, SchemaValidator};
use crate::semantic::SemanticValidator;
use crate::stage::{
    CompletenessValidator as CompletenessStage, DocumentLoader, OrganizationValidator,
    RelationshipValidator as RelationshipStage, StructureValidator,
};
use crate::types::{Diagnostic, Stage, ValidationResult};

use miette::Diagnostic as MietteDiagnostic;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Bundle type that triggers completeness checking.
pub const PROJECT_BUNDLE_TYPE: &str = "project";

/// Errors that can occur while assembling a pipeline.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum PipelineError {
    /// Rules could not be loaded.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Rules(#[from] RulesError),

    /// Schemas could not be loaded.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Schema(#[from] SchemaError),

    /// Neither a schema directory nor a structure validator was given.
    #[error("No schema directory or structure validator configured")]
    #[diagnostic(code(scs::pipeline::no_schemas))]
    NoSchemas,
}

/// Builder for configuring a [`Pipeline`].
///
/// Every stage defaults to the built-in implementation configured from the
/// rules. Structural validation needs either [`PipelineBuilder::schema_dir`]
/// or [`PipelineBuilder::structure`].
#[derive(Default)]
pub struct PipelineBuilder {
    rules: Option<RulesLoader>,
    schema_dir: Option<PathBuf>,
    loader: Option<Box<dyn DocumentLoader>>,
    structure: Option<Box<dyn StructureValidator>>,
    semantic: Option<SemanticValidator>,
    organization: Option<Box<dyn OrganizationValidator>>,
    relationships: Option<Box<dyn RelationshipStage>>,
    completeness: Option<Box<dyn CompletenessStage>>,
}

impl PipelineBuilder {
    /// Creates a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the rules used to configure the built-in stages.
    #[must_use]
    pub fn rules(mut self, rules: RulesLoader) -> Self {
        self.rules = Some(rules);
        self
    }

    /// Sets the directory holding the JSON schemas.
    #[must_use]
    pub fn schema_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.schema_dir = Some(dir.into());
        self
    }

    /// Replaces the document loader.
    #[must_use]
    pub fn loader(mut self, loader: impl DocumentLoader + 'static) -> Self {
        self.loader = Some(Box::new(loader));
        self
    }

    /// Replaces the structural validator.
    #[must_use]
    pub fn structure(mut self, validator: impl StructureValidator + 'static) -> Self {
        self.structure = Some(Box::new(validator));
        self
    }

    /// Replaces the semantic rule engine.
    #[must_use]
    pub fn semantic(mut self, validator: SemanticValidator) -> Self {
        self.semantic = Some(validator);
        self
    }

    /// Replaces the bundle organization validator.
    #[must_use]
    pub fn organization(mut self, validator: impl OrganizationValidator + 'static) -> Self {
        self.organization = Some(Box::new(validator));
        self
    }

    /// Replaces the relationship validator.
    #[must_use]
    pub fn relationships(mut self, validator: impl RelationshipStage + 'static) -> Self {
        self.relationships = Some(Box::new(validator));
        self
    }

    /// Replaces the completeness validator.
    #[must_use]
    pub fn completeness(mut self, validator: impl CompletenessStage + 'static) -> Self {
        self.completeness = Some(Box::new(validator));
        self
    }

    /// Builds the pipeline.
    ///
    /// # Errors
    ///
    /// Returns an error if the rules or schemas cannot be loaded, or if no
    /// structural validation is configured.
    pub fn build(self) -> Result<Pipeline, PipelineError> {
        let rules = match self.rules {
            Some(rules) => rules,
            None => RulesLoader::new()?,
        };

        let structure: Box<dyn StructureValidator> = match (self.structure, self.schema_dir) {
            (Some(structure), _) => structure,
            (None, Some(dir)) => Box::new(SchemaValidator::from_dir(&dir)?),
            (None, None) => return Err(PipelineError::NoSchemas),
        };

        let organization: Box<dyn OrganizationValidator> = match self.organization {
            Some(organization) => organization,
            None => Box::new(BundleValidator::new(rules.bundle().clone())?),
        };

        Ok(Pipeline {
            loader: self.loader.unwrap_or_else(|| Box::new(Parser::new())),
            structure,
            semantic: self
                .semantic
                .unwrap_or_else(|| SemanticValidator::new(rules.semantic().clone())),
            organization,
            relationships: self.relationships.unwrap_or_else(|| {
                Box::new(RelationshipValidator::new(rules.relationships().clone()))
            }),
            completeness: self.completeness.unwrap_or_else(|| {
                Box::new(CompletenessValidator::new(rules.completeness().clone()))
            }),
        })
    }
}

/// Runs the validation stages in order and aggregates their results.
///
/// Use [`Pipeline::builder()`] to construct an instance.
pub struct Pipeline {
    loader: Box<dyn DocumentLoader>,
    structure: Box<dyn StructureValidator>,
    semantic: SemanticValidator,
    organization: Box<dyn OrganizationValidator>,
    relationships: Box<dyn RelationshipStage>,
    completeness: Box<dyn CompletenessStage>,
}

impl Pipeline {
    /// Creates a new builder for configuring a pipeline.
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Validates a set of independent SCD files.
    ///
    /// A file that fails to parse is reported under `syntax` and skipped by
    /// the later stages; the remaining files are still validated. Always
    /// returns `[syntax, schema, semantic]`.
    #[must_use]
    pub fn validate_files(&self, paths: &[PathBuf]) -> Vec<ValidationResult> {
        let mut syntax = ValidationResult::new(Stage::Syntax);
        let mut schema = ValidationResult::new(Stage::Schema);
        let mut semantic = ValidationResult::new(Stage::Semantic);
        let mut files_checked = 0_u64;

        for path in paths {
            info!("Validating {}", path.display());

            let doc = match self.loader.load_scd(path) {
                Ok(doc) => doc,
                Err(e) => {
                    warn!("Skipping {}: {e}", path.display());
                    syntax.push(Diagnostic::error(Stage::Syntax, e.to_string()).with_file(Some(path)));
                    continue;
                }
            };
            files_checked += 1;

            debug!("Running schema stage on {}", path.display());
            schema.absorb(self.structure.validate_scd(&doc, path));
            debug!("Running semantic stage on {}", path.display());
            semantic.absorb(self.semantic.validate_scd(&doc, Some(path)));
        }

        for result in [&mut syntax, &mut schema, &mut semantic] {
            result.set_detail("files_checked", files_checked);
        }
        vec![syntax, schema, semantic]
    }

    /// Validates a bundle and the SCDs it references.
    ///
    /// Returns `[syntax, bundle_schema]` if the bundle fails its schema.
    /// Otherwise returns `[syntax, bundle_schema, semantic, bundle]`, followed
    /// by `relationships` and `completeness` when those stages reported
    /// anything.
    #[must_use]
    pub fn validate_bundle(&self, path: &Path, skip_completeness: bool) -> Vec<ValidationResult> {
        info!("Validating bundle {}", path.display());

        let mut syntax = ValidationResult::new(Stage::Syntax);
        let mut semantic = ValidationResult::new(Stage::Semantic);

        let bundle = match self.loader.load_bundle(path) {
            Ok(bundle) => bundle,
            Err(e) => {
                warn!("Bundle failed to parse: {e}");
                syntax.push(Diagnostic::error(Stage::Syntax, e.to_string()).with_file(Some(path)));
                return vec![
                    syntax,
                    ValidationResult::new(Stage::BundleSchema),
                    semantic,
                    ValidationResult::new(Stage::Bundle),
                ];
            }
        };

        debug!("Running bundle schema stage");
        let bundle_schema = self.structure.validate_bundle(&bundle, path);
        if !bundle_schema.passed {
            debug!("Bundle schema failed, skipping remaining stages");
            return vec![syntax, bundle_schema];
        }

        debug!("Running bundle organization stage");
        let organization = self.organization.validate_bundle(&bundle, path);

        let project_root = project_root(path);
        let mut relationships = ValidationResult::new(Stage::Relationships);
        let mut docs = Vec::new();

        if bundle.has_scd_refs() {
            debug!("Resolving SCD references under {}", project_root.display());
            docs = resolve_refs(
                &bundle,
                &project_root,
                &*self.loader,
                &mut syntax,
                &mut semantic,
            );

            for resolved in &docs {
                debug!("Running semantic stage on {}", resolved.reference);
                semantic.absorb(self.semantic.validate_scd(&resolved.doc, Some(&resolved.path)));
            }
            semantic.set_detail("files_checked", docs.len());

            debug!("Running relationship stage over {} documents", docs.len());
            relationships =
                self.relationships
                    .validate_relationships(&docs, bundle.type_or_unknown(), path);
        }

        let completeness = if bundle.type_or_unknown() == PROJECT_BUNDLE_TYPE && !skip_completeness {
            debug!("Running completeness stage");
            Some(
                self.completeness
                    .validate_completeness(&bundle, &docs, path, &project_root),
            )
        } else {
            None
        };

        let mut results = vec![syntax, bundle_schema, semantic, organization];
        if relationships.has_findings() {
            results.push(relationships);
        }
        if let Some(completeness) = completeness.filter(ValidationResult::has_findings) {
            results.push(completeness);
        }
        results
    }
}

/// Directory a bundle's references are resolved against.
fn project_root(bundle_path: &Path) -> PathBuf {
    match bundle_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Derives the process exit code from aggregated results.
///
/// Any failed result gives 1. Otherwise warnings give 2 in strict mode.
/// Everything else is 0.
#[must_use]
pub fn exit_code(results: &[ValidationResult], strict: bool) -> u8 {
    if results.iter().any(|r| !r.passed) {
        1
    } else if strict && results.iter().any(|r| !r.warnings.is_empty()) {
        2
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Bundle, ScdDocument};
    use std::fs;

    /// Accepts everything.
    struct AcceptAll;

    impl StructureValidator for AcceptAll {
        fn validate_scd(&self, _doc: &ScdDocument, _path: &Path) -> ValidationResult {
            ValidationResult::new(Stage::Schema)
        }

        fn validate_bundle(&self, _bundle: &Bundle, _path: &Path) -> ValidationResult {
            ValidationResult::new(Stage::BundleSchema)
        }
    }

    /// Rejects every bundle.
    struct RejectBundles;

    impl StructureValidator for RejectBundles {
        fn validate_scd(&self, _doc: &ScdDocument, _path: &Path) -> ValidationResult {
            ValidationResult::new(Stage::Schema)
        }

        fn validate_bundle(&self, _bundle: &Bundle, _path: &Path) -> ValidationResult {
            let mut result = ValidationResult::new(Stage::BundleSchema);
            result.add_error("/: 'scds' is a required property");
            result
        }
    }

    fn pipeline(structure: impl StructureValidator + 'static) -> Pipeline {
        Pipeline::builder().structure(structure).build().unwrap()
    }

    fn write(dir: &Path, rel: &str, content: &str) -> PathBuf {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    const GOOD_SCD: &str = "\
id: scd:project:system-context
type: project
version: 1.0.0
title: System context
description: How the system fits together
provenance:
  created_by: alice
  created_at: 2024-01-01T00:00:00Z
  rationale: Initial design
";

    #[test]
    fn build_without_schemas_fails() {
        assert!(matches!(
            Pipeline::builder().build(),
            Err(PipelineError::NoSchemas)
        ));
    }

    #[test]
    fn file_set_returns_three_results_in_order() {
        let results = pipeline(AcceptAll).validate_files(&[]);
        let stages: Vec<Stage> = results.iter().map(|r| r.stage).collect();
        assert_eq!(stages, [Stage::Syntax, Stage::Schema, Stage::Semantic]);
        assert!(results.iter().all(|r| r.files_checked() == Some(0)));
        assert_eq!(exit_code(&results, true), 0);
    }

    #[test]
    fn unparsable_file_is_excluded_but_others_continue() {
        let dir = tempfile::tempdir().unwrap();
        let files = [
            write(dir.path(), "a.yaml", GOOD_SCD),
            write(dir.path(), "b.yaml", "id: [broken\n"),
            write(dir.path(), "c.yaml", "id: scd:meta:roles\ntype: project\n"),
        ];
        let results = pipeline(AcceptAll).validate_files(&files);

        assert_eq!(results[0].errors.len(), 1);
        assert_eq!(results[0].errors[0].file_path.as_deref(), Some(files[1].as_path()));
        assert_eq!(results[1].files_checked(), Some(2));
        assert_eq!(results[2].files_checked(), Some(2));
        // c.yaml: type mismatch, and no provenance
        assert_eq!(results[2].errors.len(), 1);
        assert_eq!(results[2].warnings.len(), 1);
        assert_eq!(exit_code(&results, false), 1);
    }

    #[test]
    fn bundle_schema_failure_short_circuits() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = write(dir.path(), "bundle.yaml", "id: bundle:demo\ntype: project\n");
        let results = pipeline(RejectBundles).validate_bundle(&bundle, false);

        let stages: Vec<Stage> = results.iter().map(|r| r.stage).collect();
        assert_eq!(stages, [Stage::Syntax, Stage::BundleSchema]);
        assert_eq!(exit_code(&results, false), 1);
        assert_eq!(exit_code(&results, true), 1);
    }

    #[test]
    fn unparsable_bundle_yields_empty_later_stages() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = write(dir.path(), "bundle.yaml", "scds: [\n");
        let results = pipeline(AcceptAll).validate_bundle(&bundle, false);

        let stages: Vec<Stage> = results.iter().map(|r| r.stage).collect();
        assert_eq!(
            stages,
            [Stage::Syntax, Stage::BundleSchema, Stage::Semantic, Stage::Bundle]
        );
        assert!(!results[0].passed);
        assert!(results[1..].iter().all(|r| !r.has_findings()));
    }

    #[test]
    fn project_bundle_runs_every_stage() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "project/system-context.yaml", GOOD_SCD);
        let bundle = write(
            dir.path(),
            "bundle.yaml",
            "id: bundle:demo\ntype: project\nscds:\n  - scd:project:system-context\n",
        );
        let results = pipeline(AcceptAll).validate_bundle(&bundle, false);

        let stages: Vec<Stage> = results.iter().map(|r| r.stage).collect();
        // relationships is clean and filtered; completeness warns about
        // recommended SCDs
        assert_eq!(
            stages,
            [
                Stage::Syntax,
                Stage::BundleSchema,
                Stage::Semantic,
                Stage::Bundle,
                Stage::Completeness
            ]
        );
        assert!(results[2].passed, "{:#?}", results[2]);
        assert_eq!(results[2].files_checked(), Some(1));
        assert_eq!(exit_code(&results, false), 0);
        assert_eq!(exit_code(&results, true), 2);
    }

    #[test]
    fn skip_completeness_omits_stage() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "project/system-context.yaml", GOOD_SCD);
        let bundle = write(
            dir.path(),
            "bundle.yaml",
            "id: bundle:demo\ntype: project\nscds:\n  - scd:project:system-context\n",
        );
        let results = pipeline(AcceptAll).validate_bundle(&bundle, true);
        assert_eq!(results.len(), 4);
        assert_eq!(exit_code(&results, true), 0);
    }

    #[test]
    fn unresolved_reference_fails_semantic() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = write(
            dir.path(),
            "bundle.yaml",
            "id: bundle:std\ntype: standards\nscds:\n  - scd:standards:missing\n",
        );
        let results = pipeline(AcceptAll).validate_bundle(&bundle, false);
        assert_eq!(results.len(), 4);
        assert!(!results[2].passed);
        assert_eq!(results[2].files_checked(), Some(0));
    }

    #[test]
    fn exit_code_table() {
        let clean = ValidationResult::new(Stage::Semantic);
        let mut warned = ValidationResult::new(Stage::Semantic);
        warned.add_warning("w");
        let mut failed = ValidationResult::new(Stage::Schema);
        failed.add_error("e");

        let cases = [
            (vec![clean.clone()], false, 0),
            (vec![clean.clone()], true, 0),
            (vec![clean.clone(), warned.clone()], false, 0),
            (vec![clean.clone(), warned.clone()], true, 2),
            (vec![warned.clone(), failed.clone()], false, 1),
            (vec![warned, failed], true, 1),
            (vec![], true, 0),
        ];
        for (results, strict, expected) in cases {
            assert_eq!(exit_code(&results, strict), expected, "strict={strict}");
        }
    }
}

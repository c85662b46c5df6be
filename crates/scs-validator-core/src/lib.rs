//! # scs-validator-core
//!
//! Validation pipeline for SCDs (structured content documents) and bundles.
//!
//! This crate provides:
//!
//! - [`Pipeline`] for running the validation stages in order
//! - [`SemanticRule`] trait and the built-in semantic rules
//! - [`ValidationResult`] and [`Diagnostic`] for representing findings
//! - [`Reporter`] for rendering results as text or JSON
//! - [`stage`] traits for swapping in custom stage implementations
//!
//! ## Example
//!
//! ```ignore
//! use scs_validator_core::{exit_code, Pipeline};
//!
//! let pipeline = Pipeline::builder().schema_dir("./schema").build()?;
//! let results = pipeline.validate_bundle(Path::new("bundle.yaml"), false);
//! std::process::exit(exit_code(&results, false).into());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod bundle;
mod completeness;
mod context;
mod document;
mod parser;
mod pipeline;
mod relationship;
mod report;
mod resolver;
mod rule;
mod rules;
mod schema;
mod semantic;
mod types;

/// Traits implemented by the pipeline's stages.
pub mod stage;

pub use bundle::BundleValidator;
pub use completeness::CompletenessValidator;
pub use context::DocumentContext;
pub use document::{
    Bundle, Field, IdError, Provenance, Relationship, ScdDocument, ScdId, Tier, UNKNOWN_ID,
};
pub use parser::{ParseError, Parser};
pub use pipeline::{exit_code, Pipeline, PipelineBuilder, PipelineError, PROJECT_BUNDLE_TYPE};
pub use relationship::RelationshipValidator;
pub use report::{ReportFormat, Reporter};
pub use resolver::{locate, resolve_refs, ResolvedScd, SCD_EXTENSIONS};
pub use rule::{SemanticRule, SemanticRuleBox};
pub use rules::{
    BundleRules, BundleTypeRules, CompletenessRules, ImportPolicy, RelationshipRules, RuleConfig,
    RulesConfig, RulesError, RulesLoader, SemanticRules,
};
pub use schema::{SchemaError, SchemaValidator, BUNDLE_SCHEMA_FILE, SCD_SCHEMA_FILE};
pub use semantic::{
    builtin_rules, parse_iso8601, IdFormat, ProvenanceCreatedBy, ProvenancePresent,
    ProvenanceRationale, ProvenanceTimestamps, RequiredStrings, SemanticValidator, TierTypeMatch,
    VersionFormat,
};
pub use types::{Diagnostic, Severity, Stage, ValidationResult};

//! Rule configuration shared by the validation stages.

use crate::document::Tier;
use crate::types::Severity;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// Built-in rules, compiled into the binary.
const DEFAULT_RULES: &str = include_str!("../rules/default.toml");

/// Top-level rules configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RulesConfig {
    /// Per-rule overrides for the semantic engine.
    #[serde(default)]
    pub semantic: SemanticRules,

    /// Bundle organization rules.
    #[serde(default)]
    pub bundle: BundleRules,

    /// Relationship graph rules.
    #[serde(default)]
    pub relationships: RelationshipRules,

    /// Project completeness rules.
    #[serde(default)]
    pub completeness: CompletenessRules,
}

impl RulesConfig {
    /// Parses rules from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn parse(content: &str) -> Result<Self, RulesError> {
        toml::from_str(content).map_err(|e| RulesError::Parse {
            source_name: "built-in rules".to_string(),
            message: e.to_string(),
        })
    }
}

/// Overrides for semantic rules, keyed by rule name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SemanticRules {
    /// Per-rule configuration.
    #[serde(default)]
    pub rules: HashMap<String, RuleConfig>,
}

impl SemanticRules {
    /// Checks if a rule is enabled.
    #[must_use]
    pub fn is_rule_enabled(&self, rule_name: &str) -> bool {
        self.rules
            .get(rule_name)
            .map_or(true, |c| c.enabled.unwrap_or(true))
    }

    /// Gets the severity override for a rule.
    #[must_use]
    pub fn rule_severity(&self, rule_name: &str) -> Option<Severity> {
        self.rules.get(rule_name).and_then(|c| c.severity)
    }
}

/// Per-rule configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Whether this rule is enabled.
    #[serde(default)]
    pub enabled: Option<bool>,

    /// Severity override for this rule.
    #[serde(default)]
    pub severity: Option<Severity>,
}

/// Whether a bundle type may (or must) import other bundles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportPolicy {
    /// Imports are optional.
    #[default]
    Allowed,
    /// Imports must not be declared.
    Forbidden,
    /// At least one import must be declared.
    Required,
}

/// Shape rules for one bundle type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleTypeRules {
    /// Tiers of SCDs this bundle type may reference.
    #[serde(default = "all_tiers")]
    pub tiers: Vec<Tier>,

    /// Import policy.
    #[serde(default)]
    pub imports: ImportPolicy,
}

impl Default for BundleTypeRules {
    fn default() -> Self {
        Self {
            tiers: all_tiers(),
            imports: ImportPolicy::default(),
        }
    }
}

fn all_tiers() -> Vec<Tier> {
    Tier::ALL.to_vec()
}

/// Bundle organization rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleRules {
    /// Regex every bundle ID must match.
    #[serde(default = "default_bundle_id_pattern")]
    pub id_pattern: String,

    /// Known bundle types.
    #[serde(default)]
    pub types: BTreeMap<String, BundleTypeRules>,
}

impl Default for BundleRules {
    fn default() -> Self {
        Self {
            id_pattern: default_bundle_id_pattern(),
            types: BTreeMap::new(),
        }
    }
}

fn default_bundle_id_pattern() -> String {
    r"^bundle:[a-zA-Z0-9._-]+$".to_string()
}

/// Relationship graph rules.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelationshipRules {
    /// Known relationship types.
    #[serde(default)]
    pub types: Vec<String>,

    /// Relationship types that must not form cycles.
    #[serde(default)]
    pub acyclic: Vec<String>,

    /// Tier name → tiers it may point at. Tiers missing here are unrestricted.
    #[serde(default)]
    pub allowed_targets: BTreeMap<String, Vec<Tier>>,
}

impl RelationshipRules {
    /// Returns true if `from` may point at `to`.
    #[must_use]
    pub fn allows(&self, from: Tier, to: Tier) -> bool {
        self.allowed_targets
            .get(from.as_str())
            .map_or(true, |targets| targets.contains(&to))
    }
}

/// Project completeness rules.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompletenessRules {
    /// Project-tier SCD names every project bundle must reference.
    #[serde(default)]
    pub required_scds: Vec<String>,

    /// Project-tier SCD names every project bundle should reference.
    #[serde(default)]
    pub recommended_scds: Vec<String>,

    /// Top-level fields every bundled SCD should carry.
    #[serde(default)]
    pub required_fields: Vec<String>,

    /// Files expected under the project root.
    #[serde(default)]
    pub project_files: Vec<String>,
}

/// Loads rule configuration: built-in defaults plus optional overrides.
#[derive(Debug, Clone)]
pub struct RulesLoader {
    config: RulesConfig,
}

impl RulesLoader {
    /// Loads the built-in rules.
    ///
    /// # Errors
    ///
    /// Returns an error if the built-in rules fail to parse.
    pub fn new() -> Result<Self, RulesError> {
        Ok(Self {
            config: RulesConfig::parse(DEFAULT_RULES)?,
        })
    }

    /// Wraps an existing configuration.
    #[must_use]
    pub fn from_config(config: RulesConfig) -> Self {
        Self { config }
    }

    /// Replaces the completeness rules with the contents of a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn with_completeness_rules(mut self, path: &Path) -> Result<Self, RulesError> {
        let content = std::fs::read_to_string(path).map_err(|e| RulesError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        self.config.completeness = toml::from_str(&content).map_err(|e| RulesError::Parse {
            source_name: path.display().to_string(),
            message: e.to_string(),
        })?;
        tracing::debug!("Loaded completeness rules from {}", path.display());
        Ok(self)
    }

    /// The full configuration.
    #[must_use]
    pub fn config(&self) -> &RulesConfig {
        &self.config
    }

    /// Semantic rule overrides.
    #[must_use]
    pub fn semantic(&self) -> &SemanticRules {
        &self.config.semantic
    }

    /// Bundle organization rules.
    #[must_use]
    pub fn bundle(&self) -> &BundleRules {
        &self.config.bundle
    }

    /// Relationship rules.
    #[must_use]
    pub fn relationships(&self) -> &RelationshipRules {
        &self.config.relationships
    }

    /// Completeness rules.
    #[must_use]
    pub fn completeness(&self) -> &CompletenessRules {
        &self.config.completeness
    }
}

/// Rule configuration errors.
#[derive(Debug, thiserror::Error, Diagnostic)]
pub enum RulesError {
    /// IO error reading a rules file.
    #[error("Failed to read rules file {path}: {source}")]
    #[diagnostic(code(scs::rules::io))]
    Io {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// Parse error in a rules file.
    #[error("Failed to parse rules from {source_name}: {message}")]
    #[diagnostic(code(scs::rules::parse))]
    Parse {
        /// File path, or "built-in rules".
        source_name: String,
        /// Parse error message.
        message: String,
    },

    /// A configured pattern is not a valid regex.
    #[error("Invalid pattern `{pattern}` in {key}: {message}")]
    #[diagnostic(code(scs::rules::pattern))]
    InvalidPattern {
        /// Configuration key holding the pattern.
        key: &'static str,
        /// The pattern as written.
        pattern: String,
        /// Regex compiler message.
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_in_rules_load() {
        let loader = RulesLoader::new().unwrap();
        assert!(loader.bundle().types.contains_key("project"));
        assert_eq!(
            loader.bundle().types["meta"].imports,
            ImportPolicy::Forbidden
        );
        assert!(loader
            .relationships()
            .types
            .iter()
            .any(|t| t == "depends-on"));
        assert_eq!(loader.completeness().required_scds, vec!["system-context"]);
    }

    #[test]
    fn semantic_rules_enabled_by_default() {
        let loader = RulesLoader::new().unwrap();
        assert!(loader.semantic().is_rule_enabled("version-format"));
        assert_eq!(loader.semantic().rule_severity("version-format"), None);
    }

    #[test]
    fn parse_semantic_overrides() {
        let toml = r#"
[semantic.rules.provenance-rationale]
severity = "error"

[semantic.rules.version-format]
enabled = false
"#;
        let config = RulesConfig::parse(toml).expect("Failed to parse");
        assert!(!config.semantic.is_rule_enabled("version-format"));
        assert_eq!(
            config.semantic.rule_severity("provenance-rationale"),
            Some(Severity::Error)
        );
    }

    #[test]
    fn tier_targets_unrestricted_when_unlisted() {
        let rules = RelationshipRules::default();
        assert!(rules.allows(Tier::Meta, Tier::Project));

        let loader = RulesLoader::new().unwrap();
        assert!(!loader.relationships().allows(Tier::Meta, Tier::Project));
        assert!(loader.relationships().allows(Tier::Project, Tier::Meta));
    }

    #[test]
    fn completeness_rules_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("completeness.toml");
        std::fs::write(&path, "required_scds = [\"tech-stack\"]\n").unwrap();

        let loader = RulesLoader::new()
            .unwrap()
            .with_completeness_rules(&path)
            .unwrap();
        assert_eq!(loader.completeness().required_scds, vec!["tech-stack"]);
        assert!(loader.completeness().recommended_scds.is_empty());
        // Other sections untouched.
        assert!(loader.bundle().types.contains_key("project"));
    }

    #[test]
    fn malformed_completeness_rules_fail() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("completeness.toml");
        std::fs::write(&path, "required_scds = \"not-a-list\"\n").unwrap();

        let err = RulesLoader::new()
            .unwrap()
            .with_completeness_rules(&path)
            .unwrap_err();
        assert!(matches!(err, RulesError::Parse { .. }));
    }

    #[test]
    fn missing_completeness_rules_fail() {
        let err = RulesLoader::new()
            .unwrap()
            .with_completeness_rules(Path::new("/nonexistent/rules.toml"))
            .unwrap_err();
        assert!(matches!(err, RulesError::Io { .. }));
    }
}

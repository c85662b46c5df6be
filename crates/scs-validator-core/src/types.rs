//! Core types for validation diagnostics and per-stage results.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational finding; only fails the run under `--strict`.
    Warning,
    /// Finding that fails the stage.
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Validation stage that produced a result or diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Parsing raw files into documents.
    Syntax,
    /// Structural schema validation of individual SCDs.
    Schema,
    /// Structural schema validation of a bundle.
    BundleSchema,
    /// Intra-document consistency rules.
    Semantic,
    /// Bundle organization and type-shape rules.
    Bundle,
    /// Cross-document relationship graph.
    Relationships,
    /// Project-wide completeness.
    Completeness,
}

impl Stage {
    /// Returns the stable label used in reports.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Syntax => "syntax",
            Self::Schema => "schema",
            Self::BundleSchema => "bundle_schema",
            Self::Semantic => "semantic",
            Self::Bundle => "bundle",
            Self::Relationships => "relationships",
            Self::Completeness => "completeness",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single error or warning raised by a validation stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Whether this blocks the stage or is informational.
    pub severity: Severity,
    /// Stage that raised the diagnostic. Kept when results are merged.
    pub stage: Stage,
    /// Human-readable message.
    pub message: String,
    /// Rule code (e.g., "SCD002"), if the diagnostic came from a named rule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// ID of the document the diagnostic concerns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scd_id: Option<String>,
    /// File the diagnostic concerns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<PathBuf>,
}

impl Diagnostic {
    /// Creates a new diagnostic.
    #[must_use]
    pub fn new(severity: Severity, stage: Stage, message: impl Into<String>) -> Self {
        Self {
            severity,
            stage,
            message: message.into(),
            code: None,
            scd_id: None,
            file_path: None,
        }
    }

    /// Creates an error-level diagnostic.
    #[must_use]
    pub fn error(stage: Stage, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, stage, message)
    }

    /// Creates a warning-level diagnostic.
    #[must_use]
    pub fn warning(stage: Stage, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, stage, message)
    }

    /// Attaches a rule code.
    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Attaches the concerned document ID.
    #[must_use]
    pub fn with_scd_id(mut self, scd_id: impl Into<String>) -> Self {
        self.scd_id = Some(scd_id.into());
        self
    }

    /// Attaches the concerned file path, if known.
    #[must_use]
    pub fn with_file(mut self, path: Option<&Path>) -> Self {
        self.file_path = path.map(Path::to_path_buf);
        self
    }

    /// Formats the diagnostic as a single report line (without color).
    #[must_use]
    pub fn format(&self) -> String {
        use std::fmt::Write;
        let mut output = String::new();
        if let Some(code) = &self.code {
            let _ = write!(output, "[{code}] ");
        }
        output.push_str(&self.message);
        if let Some(scd_id) = &self.scd_id {
            let _ = write!(output, " (scd: {scd_id})");
        }
        if let Some(path) = &self.file_path {
            let _ = write!(output, " at {}", path.display());
        }
        output
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}: {}", self.stage, self.severity, self.format())
    }
}

/// Outcome of one validation stage.
///
/// `passed` starts `true` and flips to `false` as soon as an error is
/// recorded. Warnings never affect it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Stage this result belongs to.
    pub stage: Stage,
    /// False once any error has been recorded.
    pub passed: bool,
    /// Errors, in the order they were raised.
    pub errors: Vec<Diagnostic>,
    /// Warnings, in the order they were raised.
    pub warnings: Vec<Diagnostic>,
    /// Free-form stage details (e.g. `files_checked`).
    pub details: BTreeMap<String, serde_json::Value>,
}

impl ValidationResult {
    /// Creates an empty, passing result for a stage.
    #[must_use]
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            passed: true,
            errors: Vec::new(),
            warnings: Vec::new(),
            details: BTreeMap::new(),
        }
    }

    /// Records a diagnostic, routing it by severity.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Error => {
                self.passed = false;
                self.errors.push(diagnostic);
            }
            Severity::Warning => self.warnings.push(diagnostic),
        }
    }

    /// Records an error-level diagnostic for this stage.
    pub fn add_error(&mut self, message: impl Into<String>) -> &mut Diagnostic {
        self.push(Diagnostic::error(self.stage, message));
        let last = self.errors.len() - 1;
        &mut self.errors[last]
    }

    /// Records a warning-level diagnostic for this stage.
    pub fn add_warning(&mut self, message: impl Into<String>) -> &mut Diagnostic {
        self.push(Diagnostic::warning(self.stage, message));
        let last = self.warnings.len() - 1;
        &mut self.warnings[last]
    }

    /// Appends another result's diagnostics to this one.
    ///
    /// Diagnostics keep their own stage tag; details are not merged.
    pub fn absorb(&mut self, other: Self) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
        if !other.passed {
            self.passed = false;
        }
    }

    /// Number of errors recorded.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Number of warnings recorded.
    #[must_use]
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Returns true if at least one error or warning was recorded.
    #[must_use]
    pub fn has_findings(&self) -> bool {
        !self.errors.is_empty() || !self.warnings.is_empty()
    }

    /// Sets a detail entry.
    pub fn set_detail(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.details.insert(key.into(), value.into());
    }

    /// Returns the `files_checked` detail, if set.
    #[must_use]
    pub fn files_checked(&self) -> Option<u64> {
        self.details
            .get("files_checked")
            .and_then(serde_json::Value::as_u64)
    }
}

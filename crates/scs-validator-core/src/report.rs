//! Rendering of aggregated results as text or JSON.

use crate::pipeline::exit_code;
use crate::types::{Diagnostic, ValidationResult};
use serde::Serialize;
use std::fmt::Write;

const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const GREEN: &str = "\x1b[32m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Report output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// Machine-readable JSON.
    Json,
}

/// Renders validation results.
#[derive(Debug, Clone, Copy)]
pub struct Reporter {
    use_color: bool,
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new(true)
    }
}

#[derive(Serialize)]
struct Summary {
    errors: usize,
    warnings: usize,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    validator_version: &'a str,
    strict: bool,
    passed: bool,
    summary: Summary,
    results: &'a [ValidationResult],
}

impl Reporter {
    /// Creates a reporter. ANSI colors apply to text output only.
    #[must_use]
    pub fn new(use_color: bool) -> Self {
        Self { use_color }
    }

    /// Renders results in the given format.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render(
        &self,
        results: &[ValidationResult],
        version: &str,
        strict: bool,
        format: ReportFormat,
    ) -> Result<String, serde_json::Error> {
        match format {
            ReportFormat::Text => Ok(self.render_text(results, strict)),
            ReportFormat::Json => Self::render_json(results, version, strict),
        }
    }

    fn render_json(
        results: &[ValidationResult],
        version: &str,
        strict: bool,
    ) -> Result<String, serde_json::Error> {
        let report = JsonReport {
            validator_version: version,
            strict,
            passed: exit_code(results, strict) == 0,
            summary: summarize(results),
            results,
        };
        serde_json::to_string_pretty(&report)
    }

    fn render_text(&self, results: &[ValidationResult], strict: bool) -> String {
        let mut out = String::new();

        for result in results {
            let header = if result.passed {
                self.paint(GREEN, "[PASS]")
            } else {
                self.paint(RED, "[FAIL]")
            };
            let _ = writeln!(
                out,
                "{header} {} ({} error(s), {} warning(s))",
                self.paint(BOLD, result.stage.as_str()),
                result.error_count(),
                result.warning_count()
            );
            for error in &result.errors {
                self.write_diagnostic(&mut out, RED, "error", error);
            }
            for warning in &result.warnings {
                self.write_diagnostic(&mut out, YELLOW, "warning", warning);
            }
        }

        let summary = summarize(results);
        let (color, verdict) = match exit_code(results, strict) {
            0 => (GREEN, "PASSED"),
            2 => (YELLOW, "FAILED (strict mode: warnings present)"),
            _ => (RED, "FAILED"),
        };
        let _ = writeln!(
            out,
            "\nSummary: {} error(s), {} warning(s)",
            summary.errors, summary.warnings
        );
        let _ = writeln!(out, "Result: {}", self.paint(color, verdict));
        out
    }

    fn write_diagnostic(&self, out: &mut String, color: &str, label: &str, diagnostic: &Diagnostic) {
        let _ = writeln!(out, "  {}: {}", self.paint(color, label), diagnostic.format());
    }

    fn paint(&self, color: &str, text: &str) -> String {
        if self.use_color {
            format!("{color}{text}{RESET}")
        } else {
            text.to_string()
        }
    }
}

fn summarize(results: &[ValidationResult]) -> Summary {
    Summary {
        errors: results.iter().map(ValidationResult::error_count).sum(),
        warnings: results.iter().map(ValidationResult::warning_count).sum(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Stage;
    use std::path::Path;

    fn sample() -> Vec<ValidationResult> {
        let syntax = ValidationResult::new(Stage::Syntax);
        let mut semantic = ValidationResult::new(Stage::Semantic);
        semantic.push(
            Diagnostic::warning(Stage::Semantic, "Provenance section is empty")
                .with_code("SCD003")
                .with_scd_id("scd:meta:roles")
                .with_file(Some(Path::new("meta/roles.yaml"))),
        );
        vec![syntax, semantic]
    }

    #[test]
    fn text_without_color_lists_stages_and_verdict() {
        let text = Reporter::new(false)
            .render(&sample(), "0.3.0", false, ReportFormat::Text)
            .unwrap();
        assert!(text.contains("[PASS] syntax (0 error(s), 0 warning(s))"));
        assert!(text.contains(
            "  warning: [SCD003] Provenance section is empty (scd: scd:meta:roles) at meta/roles.yaml"
        ));
        assert!(text.contains("Summary: 0 error(s), 1 warning(s)"));
        assert!(text.ends_with("Result: PASSED\n"));
        assert!(!text.contains('\x1b'));
    }

    #[test]
    fn strict_verdict_mentions_warnings() {
        let text = Reporter::new(false)
            .render(&sample(), "0.3.0", true, ReportFormat::Text)
            .unwrap();
        assert!(text.ends_with("Result: FAILED (strict mode: warnings present)\n"));
    }

    #[test]
    fn failed_stage_gets_fail_header() {
        let mut results = sample();
        results[0].add_error("Invalid YAML");
        let text = Reporter::new(false)
            .render(&results, "0.3.0", false, ReportFormat::Text)
            .unwrap();
        assert!(text.contains("[FAIL] syntax (1 error(s), 0 warning(s))"));
        assert!(text.contains("  error: Invalid YAML\n"));
        assert!(text.ends_with("Result: FAILED\n"));
    }

    #[test]
    fn color_wraps_headers() {
        let text = Reporter::new(true)
            .render(&sample(), "0.3.0", false, ReportFormat::Text)
            .unwrap();
        assert!(text.contains("\x1b[32m[PASS]\x1b[0m"));
    }

    #[test]
    fn json_report_shape() {
        let json = Reporter::default()
            .render(&sample(), "0.3.0", true, ReportFormat::Json)
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["validator_version"], "0.3.0");
        assert_eq!(value["strict"], true);
        assert_eq!(value["passed"], false);
        assert_eq!(value["summary"]["errors"], 0);
        assert_eq!(value["summary"]["warnings"], 1);
        assert_eq!(value["results"][1]["stage"], "semantic");
        assert_eq!(value["results"][1]["warnings"][0]["code"], "SCD003");
        assert!(!json.contains('\x1b'));
    }
}

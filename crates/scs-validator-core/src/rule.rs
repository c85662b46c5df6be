//! Rule trait for semantic document checks.

use crate::context::DocumentContext;
use crate::document::ScdDocument;
use crate::types::Severity;

/// A semantic rule evaluated against one parsed SCD.
///
/// Rules are stateless: the same document always yields the same findings.
/// Each finding is a message; the engine turns it into a diagnostic with the
/// rule's code and (possibly overridden) severity.
///
/// # Example
///
/// ```ignore
/// use scs_validator_core::{DocumentContext, ScdDocument, SemanticRule};
///
/// pub struct RequireOwner;
///
/// impl SemanticRule for RequireOwner {
///     fn name(&self) -> &'static str { "require-owner" }
///     fn code(&self) -> &'static str { "SCD100" }
///
///     fn check(&self, _ctx: &DocumentContext<'_>, doc: &ScdDocument) -> Vec<String> {
///         if doc.get("owner").is_none() {
///             vec!["Field 'owner' is required".to_string()]
///         } else {
///             vec![]
///         }
///     }
/// }
/// ```
pub trait SemanticRule: Send + Sync {
    /// Returns the kebab-case name of this rule (e.g., "version-format").
    fn name(&self) -> &'static str;

    /// Returns the rule code (e.g., "SCD002").
    fn code(&self) -> &'static str;

    /// Returns a brief description of what this rule checks.
    fn description(&self) -> &'static str {
        ""
    }

    /// Returns the default severity for findings from this rule.
    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    /// Checks a document and returns one message per finding.
    fn check(&self, ctx: &DocumentContext<'_>, doc: &ScdDocument) -> Vec<String>;
}

/// Type alias for boxed `SemanticRule` trait objects.
pub type SemanticRuleBox = Box<dyn SemanticRule>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct TestRule;

    impl SemanticRule for TestRule {
        fn name(&self) -> &'static str {
            "test-rule"
        }
        fn code(&self) -> &'static str {
            "TEST001"
        }
        fn description(&self) -> &'static str {
            "A test rule"
        }

        fn check(&self, ctx: &DocumentContext<'_>, _doc: &ScdDocument) -> Vec<String> {
            vec![format!("checked {}", ctx.scd_id)]
        }
    }

    #[test]
    fn test_rule_trait() {
        let rule = TestRule;
        assert_eq!(rule.name(), "test-rule");
        assert_eq!(rule.code(), "TEST001");
        assert_eq!(rule.default_severity(), Severity::Error);

        let doc = ScdDocument::from_value(json!({"id": "scd:meta:roles"}));
        let ctx = DocumentContext::new(&doc, None);
        assert_eq!(rule.check(&ctx, &doc), vec!["checked scd:meta:roles"]);
    }
}

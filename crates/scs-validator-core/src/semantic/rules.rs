//! Built-in semantic rules.
//!
//! | Code | Name | Severity |
//! |------|------|----------|
//! | SCD001 | `tier-type-match` | error |
//! | SCD002 | `version-format` | error |
//! | SCD003 | `provenance-present` | warning |
//! | SCD004 | `provenance-created-by` | error |
//! | SCD005 | `provenance-timestamps` | error |
//! | SCD006 | `provenance-rationale` | warning |
//! | SCD007 | `id-format` | error |
//! | SCD008 | `required-strings` | error |

use crate::context::DocumentContext;
use crate::document::{Field, IdError, Provenance, ScdDocument, ScdId};
use crate::rule::{SemanticRule, SemanticRuleBox};
use crate::types::Severity;
use chrono::{DateTime, NaiveDate, NaiveTime};

/// Returns all built-in rules, in evaluation order.
#[must_use]
pub fn builtin_rules() -> Vec<SemanticRuleBox> {
    vec![
        Box::new(TierTypeMatch),
        Box::new(VersionFormat),
        Box::new(ProvenancePresent),
        Box::new(ProvenanceCreatedBy),
        Box::new(ProvenanceTimestamps),
        Box::new(ProvenanceRationale),
        Box::new(IdFormat),
        Box::new(RequiredStrings),
    ]
}

/// Provenance with at least one entry; sub-checks only run on this.
fn populated_provenance(doc: &ScdDocument) -> Option<&Provenance> {
    doc.provenance.as_ref().filter(|p| !p.is_empty())
}

/// `type` must equal the tier encoded in `id`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TierTypeMatch;

impl SemanticRule for TierTypeMatch {
    fn name(&self) -> &'static str {
        "tier-type-match"
    }

    fn code(&self) -> &'static str {
        "SCD001"
    }

    fn description(&self) -> &'static str {
        "The 'type' field must match the tier encoded in the ID"
    }

    fn check(&self, ctx: &DocumentContext<'_>, doc: &ScdDocument) -> Vec<String> {
        // No derivable tier is the id-format rule's (and schema's) concern.
        let Some(tier) = ctx.tier else {
            return vec![];
        };

        match &doc.scd_type {
            None => vec!["Missing 'type' field".to_string()],
            Some(field) if field.is_empty() => vec!["Missing 'type' field".to_string()],
            Some(field) if field.as_text() == Some(tier.as_str()) => vec![],
            Some(field) => vec![format!(
                "Type '{field}' does not match tier '{tier}' in ID '{}'",
                ctx.scd_id
            )],
        }
    }
}

/// `version` must be a semantic version.
#[derive(Debug, Clone, Copy, Default)]
pub struct VersionFormat;

impl SemanticRule for VersionFormat {
    fn name(&self) -> &'static str {
        "version-format"
    }

    fn code(&self) -> &'static str {
        "SCD002"
    }

    fn description(&self) -> &'static str {
        "The 'version' field must follow semantic versioning"
    }

    fn check(&self, _ctx: &DocumentContext<'_>, doc: &ScdDocument) -> Vec<String> {
        let Some(version) = doc.version.as_ref().filter(|v| !v.is_empty()) else {
            return vec![];
        };

        let reason = match version {
            Field::Text(text) => match semver::Version::parse(text) {
                Ok(_) => return vec![],
                Err(e) => e.to_string(),
            },
            Field::Other(_) => "expected a string".to_string(),
        };
        vec![format!(
            "Version '{version}' is not valid semantic versioning: {reason}"
        )]
    }
}

/// Warns when the provenance section is missing or empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProvenancePresent;

impl SemanticRule for ProvenancePresent {
    fn name(&self) -> &'static str {
        "provenance-present"
    }

    fn code(&self) -> &'static str {
        "SCD003"
    }

    fn description(&self) -> &'static str {
        "Documents should carry a provenance section"
    }

    fn default_severity(&self) -> Severity {
        Severity::Warning
    }

    fn check(&self, _ctx: &DocumentContext<'_>, doc: &ScdDocument) -> Vec<String> {
        if populated_provenance(doc).is_some() {
            vec![]
        } else {
            vec!["Provenance section is empty".to_string()]
        }
    }
}

/// `provenance.created_by` must be a non-blank string.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProvenanceCreatedBy;

impl SemanticRule for ProvenanceCreatedBy {
    fn name(&self) -> &'static str {
        "provenance-created-by"
    }

    fn code(&self) -> &'static str {
        "SCD004"
    }

    fn description(&self) -> &'static str {
        "Provenance must name its author in 'created_by'"
    }

    fn check(&self, _ctx: &DocumentContext<'_>, doc: &ScdDocument) -> Vec<String> {
        let Some(provenance) = populated_provenance(doc) else {
            return vec![];
        };

        let named = provenance
            .created_by
            .as_ref()
            .and_then(Field::as_text)
            .is_some_and(|s| !s.trim().is_empty());
        if named {
            vec![]
        } else {
            vec!["Provenance 'created_by' is required and must not be empty".to_string()]
        }
    }
}

/// `provenance.created_at` / `updated_at` must be ISO8601.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProvenanceTimestamps;

impl SemanticRule for ProvenanceTimestamps {
    fn name(&self) -> &'static str {
        "provenance-timestamps"
    }

    fn code(&self) -> &'static str {
        "SCD005"
    }

    fn description(&self) -> &'static str {
        "Provenance timestamps must be ISO8601"
    }

    fn check(&self, _ctx: &DocumentContext<'_>, doc: &ScdDocument) -> Vec<String> {
        let Some(provenance) = populated_provenance(doc) else {
            return vec![];
        };

        [
            ("created_at", &provenance.created_at),
            ("updated_at", &provenance.updated_at),
        ]
        .into_iter()
        .filter_map(|(name, value)| {
            let value = value.as_ref().filter(|v| !v.is_empty())?;
            let reason = match value {
                Field::Text(text) => parse_iso8601(text).err()?,
                Field::Other(_) => "expected a string".to_string(),
            };
            Some(format!(
                "Provenance '{name}' is not valid ISO8601 format: {reason}"
            ))
        })
        .collect()
    }
}

/// Calendar date layouts, extended and basic.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y%m%d"];

/// Time-of-day layouts with at least hours and minutes.
const TIME_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M", "%H%M%S%.f", "%H%M"];

/// Accepts ISO8601 dates and date-times, with or without an offset.
///
/// Both extended (`2024-01-01T10:30:00`) and basic (`20240101T103000`)
/// layouts are accepted, as are hour-only times and hour-only offsets. A
/// trailing `Z` is read as `+00:00`. On failure the RFC 3339 parser's reason
/// is returned.
pub fn parse_iso8601(timestamp: &str) -> Result<(), String> {
    let normalized = match timestamp.strip_suffix('Z') {
        Some(rest) => format!("{rest}+00:00"),
        None => timestamp.to_string(),
    };

    match DateTime::parse_from_rfc3339(&normalized) {
        Ok(_) => Ok(()),
        Err(_) if is_iso8601(&normalized) => Ok(()),
        Err(e) => Err(e.to_string()),
    }
}

fn is_iso8601(value: &str) -> bool {
    let Some((date, time)) = value.split_once(['T', ' ']) else {
        return is_date(value);
    };
    let (clock, offset) = match time.find(['+', '-']) {
        Some(i) => (&time[..i], Some(&time[i + 1..])),
        None => (time, None),
    };
    is_date(date) && is_clock(clock) && offset.map_or(true, is_utc_offset)
}

fn is_date(value: &str) -> bool {
    DATE_FORMATS
        .iter()
        .any(|fmt| NaiveDate::parse_from_str(value, fmt).is_ok())
}

fn is_clock(value: &str) -> bool {
    // chrono needs minutes to build a time, so bare hours are checked here
    two_digits_below(value, 24)
        || TIME_FORMATS
            .iter()
            .any(|fmt| NaiveTime::parse_from_str(value, fmt).is_ok())
}

/// `HH`, `HHMM` or `HH:MM`, without the sign.
fn is_utc_offset(value: &str) -> bool {
    if !value.is_ascii() {
        return false;
    }
    let (hours, minutes) = match value.len() {
        2 => (value, "00"),
        4 => value.split_at(2),
        5 if value.as_bytes()[2] == b':' => (&value[..2], &value[3..]),
        _ => return false,
    };
    two_digits_below(hours, 24) && two_digits_below(minutes, 60)
}

fn two_digits_below(value: &str, limit: u32) -> bool {
    value.len() == 2
        && value.bytes().all(|b| b.is_ascii_digit())
        && value.parse::<u32>().is_ok_and(|v| v < limit)
}

/// Warns when `provenance.rationale` is absent or blank.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProvenanceRationale;

impl SemanticRule for ProvenanceRationale {
    fn name(&self) -> &'static str {
        "provenance-rationale"
    }

    fn code(&self) -> &'static str {
        "SCD006"
    }

    fn description(&self) -> &'static str {
        "Provenance should explain why the document exists"
    }

    fn default_severity(&self) -> Severity {
        Severity::Warning
    }

    fn check(&self, _ctx: &DocumentContext<'_>, doc: &ScdDocument) -> Vec<String> {
        let Some(provenance) = populated_provenance(doc) else {
            return vec![];
        };

        let missing = provenance
            .rationale
            .as_ref()
            .map_or(true, |r| r.is_empty() || r.is_blank_text());
        if missing {
            vec!["Provenance 'rationale' is recommended but missing".to_string()]
        } else {
            vec![]
        }
    }
}

/// `id` must be `scd:<tier>:<name>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdFormat;

impl SemanticRule for IdFormat {
    fn name(&self) -> &'static str {
        "id-format"
    }

    fn code(&self) -> &'static str {
        "SCD007"
    }

    fn description(&self) -> &'static str {
        "IDs must match scd:<meta|project|standards>:<name>"
    }

    fn check(&self, ctx: &DocumentContext<'_>, doc: &ScdDocument) -> Vec<String> {
        if let Some(id @ Field::Other(_)) = &doc.id {
            return vec![IdError::NoTier(id.to_string()).to_string()];
        }
        match ScdId::parse(ctx.scd_id) {
            Ok(_) => vec![],
            Err(e) => vec![e.to_string()],
        }
    }
}

/// `title` and `description`, when present as strings, must not be blank.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequiredStrings;

impl SemanticRule for RequiredStrings {
    fn name(&self) -> &'static str {
        "required-strings"
    }

    fn code(&self) -> &'static str {
        "SCD008"
    }

    fn description(&self) -> &'static str {
        "Title and description must not be blank"
    }

    fn check(&self, _ctx: &DocumentContext<'_>, doc: &ScdDocument) -> Vec<String> {
        [("title", &doc.title), ("description", &doc.description)]
            .into_iter()
            .filter(|(_, value)| value.as_ref().is_some_and(Field::is_blank_text))
            .map(|(name, _)| format!("Field '{name}' must not be empty"))
            .collect()
    }
}

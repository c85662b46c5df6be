//! Typed views over parsed SCDs and bundles.
//!
//! Documents are parsed into a raw [`serde_json::Value`] first (that is what
//! the schema validator sees) and then projected into the types here. The
//! projection never fails: fields that are absent stay `None`, fields with
//! an unexpected type are kept as [`Field::Other`] so rules can tell
//! "missing" from "present but wrong".

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::LazyLock;

/// `scd:<tier>:<rest>` with the tier captured. `<rest>` is checked separately
/// by [`NAME_RE`] so tier derivation and full-ID validation share one parser.
#[allow(clippy::expect_used)]
static ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^scd:(meta|project|standards):(.*)$").expect("ID pattern is valid")
});

#[allow(clippy::expect_used)]
static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9._-]+$").expect("name pattern is valid"));

/// Placeholder used in diagnostics when a document carries no usable `id`.
pub const UNKNOWN_ID: &str = "unknown";

/// Tier encoded in an SCD ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Vocabulary and conventions shared by every project.
    Meta,
    /// Project-specific context.
    Project,
    /// External standards and policies.
    Standards,
}

impl Tier {
    /// All tiers, in canonical order.
    pub const ALL: [Tier; 3] = [Tier::Meta, Tier::Project, Tier::Standards];

    /// Returns the tier as written in IDs and `type` fields.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Meta => "meta",
            Self::Project => "project",
            Self::Standards => "standards",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "meta" => Ok(Self::Meta),
            "project" => Ok(Self::Project),
            "standards" => Ok(Self::Standards),
            other => Err(format!("unknown tier `{other}`")),
        }
    }
}

/// Why a string is not a well-formed SCD ID.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// No `scd:<tier>:` prefix with a known tier.
    #[error("ID '{0}' does not match required pattern 'scd:<tier>:<name>'")]
    NoTier(String),
    /// The tier is recognised but the name part is not.
    #[error("ID '{id}' does not match required pattern 'scd:<tier>:<name>'")]
    InvalidName {
        /// Full ID as written.
        id: String,
        /// Tier that could still be derived.
        tier: Tier,
    },
}

impl IdError {
    /// Returns the tier if the prefix was recognised.
    #[must_use]
    pub fn tier(&self) -> Option<Tier> {
        match self {
            Self::NoTier(_) => None,
            Self::InvalidName { tier, .. } => Some(*tier),
        }
    }
}

/// A well-formed SCD ID: `scd:<tier>:<name>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScdId {
    tier: Tier,
    name: String,
}

impl ScdId {
    /// Parses an ID.
    ///
    /// # Errors
    ///
    /// Returns [`IdError::InvalidName`] when the tier prefix is valid but the
    /// name is not, and [`IdError::NoTier`] otherwise.
    pub fn parse(id: &str) -> Result<Self, IdError> {
        let Some(caps) = ID_RE.captures(id) else {
            return Err(IdError::NoTier(id.to_string()));
        };
        let tier = caps[1]
            .parse::<Tier>()
            .map_err(|_| IdError::NoTier(id.to_string()))?;
        let name = &caps[2];
        if !NAME_RE.is_match(name) {
            return Err(IdError::InvalidName {
                id: id.to_string(),
                tier,
            });
        }
        Ok(Self {
            tier,
            name: name.to_string(),
        })
    }

    /// Derives the tier from an ID, even when the name part is malformed.
    #[must_use]
    pub fn tier_of(id: &str) -> Option<Tier> {
        match Self::parse(id) {
            Ok(parsed) => Some(parsed.tier),
            Err(e) => e.tier(),
        }
    }

    /// Tier encoded in the ID.
    #[must_use]
    pub fn tier(&self) -> Tier {
        self.tier
    }

    /// Name part of the ID.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Display for ScdId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "scd:{}:{}", self.tier, self.name)
    }
}

/// A scalar field that was present in the source document.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    /// A string value (possibly empty or whitespace).
    Text(String),
    /// Any non-string value.
    Other(Value),
}

impl Field {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::String(s) => Some(Self::Text(s.clone())),
            other => Some(Self::Other(other.clone())),
        }
    }

    /// Returns the string value, if this is text.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Other(_) => None,
        }
    }

    /// True for text that is empty after trimming.
    #[must_use]
    pub fn is_blank_text(&self) -> bool {
        self.as_text().is_some_and(|s| s.trim().is_empty())
    }

    /// True for empty strings and for falsy non-string scalars.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(s) => s.is_empty(),
            Self::Other(Value::Bool(b)) => !b,
            Self::Other(Value::Array(a)) => a.is_empty(),
            Self::Other(Value::Object(o)) => o.is_empty(),
            Self::Other(_) => false,
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Other(v) => write!(f, "{v}"),
        }
    }
}

fn field(map: &Map<String, Value>, key: &str) -> Option<Field> {
    map.get(key).and_then(Field::from_value)
}

/// Provenance section of an SCD.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Provenance {
    /// Author of the document.
    pub created_by: Option<Field>,
    /// Creation timestamp (ISO8601).
    pub created_at: Option<Field>,
    /// Last update timestamp (ISO8601).
    pub updated_at: Option<Field>,
    /// Why the document exists.
    pub rationale: Option<Field>,
    entries: usize,
}

impl Provenance {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Object(map) => Some(Self {
                created_by: field(map, "created_by"),
                created_at: field(map, "created_at"),
                updated_at: field(map, "updated_at"),
                rationale: field(map, "rationale"),
                entries: map.len(),
            }),
            Value::String(s) if s.is_empty() => Some(Self::default()),
            Value::Array(a) if a.is_empty() => Some(Self::default()),
            // Present but not a mapping: no sub-field is usable.
            _ => Some(Self {
                entries: 1,
                ..Self::default()
            }),
        }
    }

    /// True when the section has no entries at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }
}

/// A typed edge from one SCD to another.
#[derive(Debug, Clone, PartialEq)]
pub struct Relationship {
    /// Relationship type (e.g., "depends-on").
    pub kind: Option<Field>,
    /// Target SCD ID.
    pub target: Option<Field>,
}

/// A parsed SCD.
#[derive(Debug, Clone, PartialEq)]
pub struct ScdDocument {
    /// Document ID, expected as `scd:<tier>:<name>`.
    pub id: Option<Field>,
    /// Declared tier.
    pub scd_type: Option<Field>,
    /// Semantic version of the document.
    pub version: Option<Field>,
    /// Human title.
    pub title: Option<Field>,
    /// Human description.
    pub description: Option<Field>,
    /// Provenance section.
    pub provenance: Option<Provenance>,
    /// Outgoing relationships.
    pub relationships: Vec<Relationship>,
    raw: Value,
}

impl ScdDocument {
    /// Builds the typed view over a parsed mapping.
    #[must_use]
    pub fn from_value(raw: Value) -> Self {
        let empty = Map::new();
        let map = raw.as_object().unwrap_or(&empty);
        let relationships = map
            .get("relationships")
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(Value::as_object)
                    .map(|rel| Relationship {
                        kind: field(rel, "type"),
                        target: field(rel, "target"),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            id: field(map, "id"),
            scd_type: field(map, "type"),
            version: field(map, "version"),
            title: field(map, "title"),
            description: field(map, "description"),
            provenance: map.get("provenance").and_then(Provenance::from_value),
            relationships,
            raw,
        }
    }

    /// Returns the ID as text, or [`UNKNOWN_ID`] when it is missing or not a string.
    #[must_use]
    pub fn id_or_unknown(&self) -> &str {
        self.id
            .as_ref()
            .and_then(Field::as_text)
            .unwrap_or(UNKNOWN_ID)
    }

    /// Parses the ID, if present and well-formed.
    #[must_use]
    pub fn scd_id(&self) -> Option<ScdId> {
        self.id
            .as_ref()
            .and_then(Field::as_text)
            .and_then(|id| ScdId::parse(id).ok())
    }

    /// Looks up a top-level field by name.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.raw.get(key)
    }

    /// The document exactly as parsed.
    #[must_use]
    pub fn raw(&self) -> &Value {
        &self.raw
    }
}

/// A parsed bundle.
#[derive(Debug, Clone, PartialEq)]
pub struct Bundle {
    /// Bundle ID.
    pub id: Option<Field>,
    /// Free-form bundle type (e.g., "project").
    pub bundle_type: Option<Field>,
    /// Bundle version.
    pub version: Option<Field>,
    /// SCD references, in declaration order.
    pub scds: Vec<Field>,
    /// Other bundles this bundle imports.
    pub imports: Vec<Field>,
    raw: Value,
}

impl Bundle {
    /// Builds the typed view over a parsed mapping.
    #[must_use]
    pub fn from_value(raw: Value) -> Self {
        let empty = Map::new();
        let map = raw.as_object().unwrap_or(&empty);
        let list = |key: &str| -> Vec<Field> {
            map.get(key)
                .and_then(Value::as_array)
                .map(|items| items.iter().filter_map(Field::from_value).collect())
                .unwrap_or_default()
        };

        Self {
            id: field(map, "id"),
            bundle_type: field(map, "type"),
            version: field(map, "version"),
            scds: list("scds"),
            imports: list("imports"),
            raw,
        }
    }

    /// Returns the ID as text, or [`UNKNOWN_ID`].
    #[must_use]
    pub fn id_or_unknown(&self) -> &str {
        self.id
            .as_ref()
            .and_then(Field::as_text)
            .unwrap_or(UNKNOWN_ID)
    }

    /// Returns the bundle type as text, or [`UNKNOWN_ID`].
    #[must_use]
    pub fn type_or_unknown(&self) -> &str {
        self.bundle_type
            .as_ref()
            .and_then(Field::as_text)
            .unwrap_or(UNKNOWN_ID)
    }

    /// True if the bundle declares at least one SCD reference.
    #[must_use]
    pub fn has_scd_refs(&self) -> bool {
        !self.scds.is_empty()
    }

    /// The bundle exactly as parsed.
    #[must_use]
    pub fn raw(&self) -> &Value {
        &self.raw
    }
}

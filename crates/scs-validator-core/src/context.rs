//! Context types for rule execution.

use crate::document::{ScdDocument, ScdId, Tier};
use std::path::Path;

/// Context provided to semantic rules.
///
/// Holds what every rule would otherwise recompute from the document: the
/// ID used in diagnostics and the tier derived from it.
#[derive(Debug, Clone)]
pub struct DocumentContext<'a> {
    /// Document ID, or `unknown` when missing.
    pub scd_id: &'a str,
    /// Tier derived from the ID prefix, if any.
    pub tier: Option<Tier>,
    /// File the document was loaded from.
    pub file_path: Option<&'a Path>,
}

impl<'a> DocumentContext<'a> {
    /// Creates a new document context.
    #[must_use]
    pub fn new(doc: &'a ScdDocument, file_path: Option<&'a Path>) -> Self {
        let scd_id = doc.id_or_unknown();
        Self {
            scd_id,
            tier: ScdId::tier_of(scd_id),
            file_path,
        }
    }
}

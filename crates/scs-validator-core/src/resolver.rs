//! Resolution of bundle SCD references to files under the project root.
//!
//! A reference `scd:<tier>:<name>` resolves to the first existing file among
//! `<root>/<tier>/<name>.yaml`, `.yml` and `.json`.

use crate::document::{Bundle, Field, ScdDocument, ScdId};
use crate::stage::DocumentLoader;
use crate::types::{Diagnostic, Stage, ValidationResult};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Extensions tried, in order, when locating an SCD file.
pub const SCD_EXTENSIONS: &[&str] = &["yaml", "yml", "json"];

/// An SCD loaded on behalf of a bundle.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedScd {
    /// Reference as written in the bundle.
    pub reference: ScdId,
    /// File the document was loaded from.
    pub path: PathBuf,
    /// Parsed document.
    pub doc: ScdDocument,
}

/// Returns the file an SCD ID resolves to, if one exists.
#[must_use]
pub fn locate(root: &Path, id: &ScdId) -> Option<PathBuf> {
    let dir = root.join(id.tier().as_str());
    SCD_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{}.{ext}", id.name())))
        .find(|candidate| candidate.is_file())
}

/// Loads every SCD a bundle references.
///
/// Parse failures go to `syntax`; missing files and ID mismatches go to
/// `semantic`. References that are not valid SCD IDs are skipped here (the
/// bundle organization stage reports them). Each ID is loaded at most once.
pub fn resolve_refs(
    bundle: &Bundle,
    root: &Path,
    loader: &dyn DocumentLoader,
    syntax: &mut ValidationResult,
    semantic: &mut ValidationResult,
) -> Vec<ResolvedScd> {
    let mut seen = HashSet::new();
    let mut resolved = Vec::new();

    for reference in bundle.scds.iter().filter_map(Field::as_text) {
        let Ok(id) = ScdId::parse(reference) else {
            debug!("Skipping malformed reference {reference}");
            continue;
        };
        if !seen.insert(id.clone()) {
            continue;
        }

        let Some(path) = locate(root, &id) else {
            warn!("Could not resolve {id} under {}", root.display());
            semantic.push(
                Diagnostic::error(
                    Stage::Semantic,
                    format!(
                        "SCD reference could not be resolved: expected {}/{}.{{{}}}",
                        id.tier(),
                        id.name(),
                        SCD_EXTENSIONS.join(",")
                    ),
                )
                .with_scd_id(id.to_string()),
            );
            continue;
        };

        match loader.load_scd(&path) {
            Ok(doc) => {
                let declared = doc.id_or_unknown();
                if declared != reference {
                    semantic.push(
                        Diagnostic::error(
                            Stage::Semantic,
                            format!("File declares ID '{declared}' but is referenced as '{id}'"),
                        )
                        .with_scd_id(id.to_string())
                        .with_file(Some(&path)),
                    );
                }
                resolved.push(ResolvedScd {
                    reference: id,
                    path,
                    doc,
                });
            }
            Err(e) => {
                syntax.push(
                    Diagnostic::error(Stage::Syntax, e.to_string())
                        .with_scd_id(id.to_string())
                        .with_file(Some(&path)),
                );
            }
        }
    }

    resolved
}

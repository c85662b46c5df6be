//! Relationship graph validation across the SCDs of a bundle.

use crate::document::{Field, ScdId};
use crate::resolver::ResolvedScd;
use crate::rules::RelationshipRules;
use crate::stage::RelationshipValidator as RelationshipStage;
use crate::types::{Diagnostic, Severity, Stage, ValidationResult};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;
use tracing::debug;

/// Validates typed relationships between SCDs.
#[derive(Debug, Clone, Default)]
pub struct RelationshipValidator {
    rules: RelationshipRules,
}

impl RelationshipValidator {
    /// Creates a validator from relationship rules.
    #[must_use]
    pub fn new(rules: RelationshipRules) -> Self {
        Self { rules }
    }
}

/// A relationship that passed the per-edge checks.
struct Edge<'a> {
    kind: &'a str,
    from: ScdId,
    to: ScdId,
}

impl RelationshipStage for RelationshipValidator {
    fn validate_relationships(
        &self,
        docs: &[ResolvedScd],
        bundle_type: &str,
        path: &Path,
    ) -> ValidationResult {
        let mut result = ValidationResult::new(Stage::Relationships);
        let included: HashSet<&ScdId> = docs.iter().map(|d| &d.reference).collect();
        let mut edges = Vec::new();

        for resolved in docs {
            let source = resolved.doc.scd_id().unwrap_or_else(|| resolved.reference.clone());
            let diag = |severity: Severity, message: String| {
                Diagnostic::new(severity, Stage::Relationships, message)
                    .with_scd_id(source.to_string())
                    .with_file(Some(&resolved.path))
            };

            for (index, rel) in resolved.doc.relationships.iter().enumerate() {
                let Some(kind) = rel.kind.as_ref().and_then(Field::as_text) else {
                    result.push(diag(
                        Severity::Error,
                        format!("Relationship #{} is missing a 'type'", index + 1),
                    ));
                    continue;
                };
                if !self.rules.types.iter().any(|t| t == kind) {
                    result.push(diag(
                        Severity::Error,
                        format!(
                            "Unknown relationship type '{kind}', expected one of: {}",
                            self.rules.types.join(", ")
                        ),
                    ));
                    continue;
                }

                let Some(target) = rel.target.as_ref().and_then(Field::as_text) else {
                    result.push(diag(
                        Severity::Error,
                        format!("Relationship '{kind}' is missing a 'target'"),
                    ));
                    continue;
                };
                let target = match ScdId::parse(target) {
                    Ok(id) => id,
                    Err(e) => {
                        result.push(diag(
                            Severity::Error,
                            format!("Invalid relationship target: {e}"),
                        ));
                        continue;
                    }
                };

                if target == source {
                    result.push(diag(
                        Severity::Error,
                        format!("SCD '{source}' cannot '{kind}' itself"),
                    ));
                    continue;
                }

                if !self.rules.allows(source.tier(), target.tier()) {
                    result.push(diag(
                        Severity::Error,
                        format!(
                            "{} SCD '{source}' cannot '{kind}' {} SCD '{target}' in a '{bundle_type}' bundle",
                            source.tier(),
                            target.tier()
                        ),
                    ));
                }

                if !included.contains(&target) {
                    result.push(diag(
                        Severity::Warning,
                        format!("'{kind}' target '{target}' is not included in the bundle"),
                    ));
                }

                edges.push(Edge {
                    kind,
                    from: source.clone(),
                    to: target,
                });
            }
        }

        for cycle in self.find_cycles(&edges) {
            let members: Vec<String> = cycle.iter().map(ToString::to_string).collect();
            result.push(
                Diagnostic::error(
                    Stage::Relationships,
                    format!(
                        "Relationship cycle detected: {} -> {}",
                        members.join(" -> "),
                        members[0]
                    ),
                )
                .with_scd_id(members[0].clone())
                .with_file(Some(path)),
            );
        }

        result.set_detail("relationships_checked", edges.len());
        debug!(
            "Checked {} relationships across {} documents",
            edges.len(),
            docs.len()
        );
        result
    }
}

impl RelationshipValidator {
    /// Finds the elementary cycles among edges whose type must stay acyclic.
    ///
    /// Each cycle is reported once, starting from its smallest member.
    fn find_cycles(&self, edges: &[Edge<'_>]) -> Vec<Vec<ScdId>> {
        let mut graph: BTreeMap<&ScdId, BTreeSet<&ScdId>> = BTreeMap::new();
        for edge in edges
            .iter()
            .filter(|e| self.rules.acyclic.iter().any(|t| t == e.kind))
        {
            graph.entry(&edge.from).or_default().insert(&edge.to);
        }

        let mut cycles = BTreeSet::new();
        for &start in graph.keys() {
            let mut path = vec![start];
            extend(start, &graph, &mut path, &mut cycles);
        }
        cycles.into_iter().collect()
    }
}

/// Walks simple paths from `path[0]` through larger nodes only, recording
/// every path that closes back on its start.
fn extend<'a>(
    start: &'a ScdId,
    graph: &BTreeMap<&'a ScdId, BTreeSet<&'a ScdId>>,
    path: &mut Vec<&'a ScdId>,
    cycles: &mut BTreeSet<Vec<ScdId>>,
) {
    let Some(&node) = path.last() else {
        return;
    };
    let Some(next) = graph.get(node) else {
        return;
    };
    for &target in next {
        if target == start {
            cycles.insert(path.iter().map(|n| (*n).clone()).collect());
        } else if target > start && !path.contains(&target) {
            path.push(target);
            extend(start, graph, path, cycles);
            path.pop();
        }
    }
}

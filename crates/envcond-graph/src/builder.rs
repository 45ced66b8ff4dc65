//! Graph builder
//!
//! Resolves or creates the `ParseGroup` for each input triple and emits one
//! edge per distinct (subject, predicate, text) triple. Groups live in an
//! arena (`Vec<ParseGroup>`) indexed by a value-equality key, so the same
//! table always produces the same grouping and the same ids.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use envcond_core::{Edge, GroupKeyMode, ParseGroup, RawTriple, Result};
use envcond_extractor::ComponentAssembler;

/// Namespace for name-based group ids
const GROUP_NAMESPACE: Uuid = Uuid::from_u128(0x6f1c_2a4e_93d7_5b08_a1e4_c25d_7f30_9b62);

/// Value-equality key of a parse group
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct GroupKey {
    scope: Option<(String, String)>,
    raw_text: String,
}

impl GroupKey {
    fn new(mode: GroupKeyMode, triple: &RawTriple) -> Self {
        let scope = match mode {
            GroupKeyMode::RawText => None,
            GroupKeyMode::SubjectPredicateText => {
                Some((triple.subject.clone(), triple.predicate.clone()))
            }
        };
        Self {
            scope,
            raw_text: triple.raw_text.clone(),
        }
    }

    fn id(&self) -> Uuid {
        let name = match &self.scope {
            None => self.raw_text.clone(),
            // Length prefixes keep the encoding unambiguous for any field content
            Some((subject, predicate)) => format!(
                "{}:{subject}{}:{predicate}{}",
                subject.len(),
                predicate.len(),
                self.raw_text
            ),
        };
        Uuid::new_v5(&GROUP_NAMESPACE, name.as_bytes())
    }
}

/// Counters for one build
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildSummary {
    /// Triples turned into edges
    pub triples_processed: usize,
    /// Exact repeats of an earlier triple
    pub duplicate_triples: usize,
    /// Triples rejected as malformed
    pub rows_skipped: usize,
    /// Groups parsed for the first time
    pub groups_created: usize,
    /// Edges that pointed at an existing group
    pub groups_reused: usize,
    /// Components across all groups
    pub components_emitted: usize,
}

/// The finished parse graph
#[derive(Debug, Clone, Default, Serialize)]
pub struct ParseGraph {
    /// Groups in creation order
    pub groups: Vec<ParseGroup>,
    /// Edges in input order
    pub edges: Vec<Edge>,
    #[serde(skip)]
    pub summary: BuildSummary,
}

impl ParseGraph {
    /// Look up a group by id
    pub fn group(&self, id: Uuid) -> Option<&ParseGroup> {
        self.groups.iter().find(|g| g.id == id)
    }

    /// Group referenced by an edge
    pub fn group_for(&self, edge: &Edge) -> Option<&ParseGroup> {
        self.group(edge.group)
    }
}

/// Builds a `ParseGraph` from input triples
pub struct GraphBuilder {
    assembler: ComponentAssembler,
    key_mode: GroupKeyMode,
    /// Group arena
    groups: Vec<ParseGroup>,
    /// Group key -> arena index
    group_index: HashMap<GroupKey, usize>,
    /// Triples already turned into edges
    seen_triples: HashSet<(String, String, String)>,
    edges: Vec<Edge>,
    summary: BuildSummary,
}

impl GraphBuilder {
    /// Create a new builder
    pub fn new(assembler: ComponentAssembler, key_mode: GroupKeyMode) -> Self {
        Self {
            assembler,
            key_mode,
            groups: Vec::new(),
            group_index: HashMap::new(),
            seen_triples: HashSet::new(),
            edges: Vec::new(),
            summary: BuildSummary::default(),
        }
    }

    /// Add one triple; returns the id of the group it points at, or `None`
    /// when the triple is malformed and skipped
    pub fn add_triple(&mut self, triple: &RawTriple) -> Option<Uuid> {
        if triple.subject.trim().is_empty() || triple.predicate.trim().is_empty() {
            warn!(row = triple.row, "skipping triple with missing subject or predicate");
            self.summary.rows_skipped += 1;
            return None;
        }

        let key = GroupKey::new(self.key_mode, triple);
        let (subject, predicate, raw_text) = triple.key();
        let triple_key = (subject.to_string(), predicate.to_string(), raw_text.to_string());
        if self.seen_triples.contains(&triple_key) {
            debug!(row = triple.row, "duplicate triple");
            self.summary.duplicate_triples += 1;
            return self.group_index.get(&key).map(|&idx| self.groups[idx].id);
        }

        let idx = match self.group_index.get(&key) {
            Some(&idx) => {
                self.summary.groups_reused += 1;
                idx
            }
            None => match self.create_group(key) {
                Ok(idx) => idx,
                Err(e) => {
                    warn!(row = triple.row, error = %e, "skipping triple");
                    self.summary.rows_skipped += 1;
                    return None;
                }
            },
        };
        let group_id = self.groups[idx].id;

        self.seen_triples.insert(triple_key);
        self.edges.push(Edge {
            subject: triple.subject.clone(),
            predicate: triple.predicate.clone(),
            group: group_id,
        });
        self.summary.triples_processed += 1;

        Some(group_id)
    }

    /// Add every triple in order
    pub fn add_all<'a, I>(&mut self, triples: I)
    where
        I: IntoIterator<Item = &'a RawTriple>,
    {
        for triple in triples {
            self.add_triple(triple);
        }
    }

    fn create_group(&mut self, key: GroupKey) -> Result<usize> {
        let components = self.assembler.assemble(&key.raw_text);
        let group = ParseGroup::new(key.id(), key.raw_text.clone(), components)?;
        self.summary.groups_created += 1;
        self.summary.components_emitted += group.components.len();

        let idx = self.groups.len();
        self.groups.push(group);
        self.group_index.insert(key, idx);
        Ok(idx)
    }

    /// Current counters
    pub fn summary(&self) -> &BuildSummary {
        &self.summary
    }

    /// Finish the build
    pub fn build(self) -> ParseGraph {
        ParseGraph {
            groups: self.groups,
            edges: self.edges,
            summary: self.summary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use envcond_core::NoMatchPolicy;
    use envcond_extractor::FactorProfile;

    fn builder(mode: GroupKeyMode) -> GraphBuilder {
        let assembler =
            ComponentAssembler::new(&FactorProfile::temperature(), NoMatchPolicy::WholeText)
                .unwrap();
        GraphBuilder::new(assembler, mode)
    }

    fn triple(subject: &str, predicate: &str, text: &str) -> RawTriple {
        RawTriple::new(subject, predicate, text, 1)
    }

    #[test]
    fn test_same_text_shares_group() {
        let mut builder = builder(GroupKeyMode::RawText);
        let id1 = builder.add_triple(&triple("NCBITaxon:562", "METPO:2000303", "37°C"));
        let id2 = builder.add_triple(&triple("NCBITaxon:1423", "METPO:2000303", "37°C"));

        assert_eq!(id1, id2);
        let graph = builder.build();
        assert_eq!(graph.groups.len(), 1);
        assert_eq!(graph.edges.len(), 2);
        assert_eq!(graph.summary.groups_created, 1);
        assert_eq!(graph.summary.groups_reused, 1);
    }

    #[test]
    fn test_scoped_key_separates_predicates() {
        let mut builder = builder(GroupKeyMode::SubjectPredicateText);
        let id1 = builder.add_triple(&triple("s", "optimum_temp", "37°C"));
        let id2 = builder.add_triple(&triple("s", "growth_temp", "37°C"));

        assert_ne!(id1, id2);
        let graph = builder.build();
        assert_eq!(graph.groups.len(), 2);
        assert_eq!(graph.groups[0].components, graph.groups[1].components);
    }

    #[test]
    fn test_duplicate_triples_collapse() {
        let mut builder = builder(GroupKeyMode::RawText);
        let t = triple("s", "p", "20-30°C");
        let id1 = builder.add_triple(&t);
        let id2 = builder.add_triple(&t);

        assert_eq!(id1, id2);
        let graph = builder.build();
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.summary.duplicate_triples, 1);
        assert_eq!(graph.summary.triples_processed, 1);
    }

    #[test]
    fn test_malformed_triple_skipped() {
        let mut builder = builder(GroupKeyMode::RawText);
        assert!(builder.add_triple(&triple("", "p", "37°C")).is_none());
        assert!(builder.add_triple(&triple("s", "p", "  ")).is_none());
        assert_eq!(builder.summary().rows_skipped, 2);
        assert!(builder.build().groups.is_empty());
    }

    #[test]
    fn test_blank_text_is_rejected_by_group_validation() {
        let mut builder = builder(GroupKeyMode::RawText);
        assert!(builder.add_triple(&triple("s", "p", "\t ")).is_none());
        assert!(builder.add_triple(&triple("s", "p", "\t ")).is_none());

        let summary = builder.summary().clone();
        assert_eq!(summary.rows_skipped, 2);
        assert_eq!(summary.groups_created, 0);
        assert_eq!(summary.duplicate_triples, 0);
        assert!(builder.build().edges.is_empty());
    }

    #[test]
    fn test_scoped_ids_do_not_collide_on_control_chars() {
        let mut builder = builder(GroupKeyMode::SubjectPredicateText);
        let a = builder.add_triple(&triple("a\u{1F}b", "c", "37°C"));
        let b = builder.add_triple(&triple("a", "b\u{1F}c", "37°C"));
        assert_ne!(a, b);
        assert_eq!(builder.build().groups.len(), 2);
    }

    #[test]
    fn test_ids_are_reproducible() {
        let mut first = builder(GroupKeyMode::RawText);
        let mut second = builder(GroupKeyMode::RawText);
        let a = first.add_triple(&triple("s", "p", "above 45°C"));
        let b = second.add_triple(&triple("other", "q", "above 45°C"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_group_lookup_by_edge() {
        let mut builder = builder(GroupKeyMode::RawText);
        builder.add_all(&[triple("s", "p", "thermophilic"), triple("t", "p", "25, 30, and 35°C")]);
        let graph = builder.build();

        let group = graph.group_for(&graph.edges[1]).unwrap();
        assert_eq!(group.raw_text, "25, 30, and 35°C");
        assert_eq!(group.components.len(), 3);
        assert_eq!(graph.summary.components_emitted, 4);
    }
}

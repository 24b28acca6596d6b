use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::identity::field_key::FieldKey;
use crate::identity::object_id::compute_identity;
use crate::scan::candidate::CandidateEntry;
use crate::scene::scene_model::SceneGraph;

pub type Candidate<G> = CandidateEntry<<G as SceneGraph>::Node, <G as SceneGraph>::Behavior>;

/// Counters for one pass over the tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanOutcome {
    pub visited_nodes: usize,
    pub visited_behaviors: usize,

    /// Behavior slots whose defining script is missing
    pub skipped_behaviors: usize,

    /// Candidates appended by this pass (already-known keys excluded)
    pub new_candidates: usize,
}

/// Finds unset object-reference fields and remembers what it has reported.
///
/// The known set lives as long as the scanner, so scanning the same tree
/// again appends nothing. Call [`Scanner::clear`] before scanning a tree that
/// replaced the previous one.
pub struct Scanner<G: SceneGraph> {
    known: HashSet<FieldKey>,
    candidates: Vec<Candidate<G>>,
}

impl<G: SceneGraph> Scanner<G> {
    pub fn new() -> Self {
        Self {
            known: HashSet::new(),
            candidates: Vec::new(),
        }
    }

    /// Scan every root of the graph.
    pub fn scan(&mut self, graph: &G) -> ScanOutcome {
        let roots = graph.roots();
        self.scan_from(graph, &roots)
    }

    /// Depth-first pre-order walk from each root in turn.
    ///
    /// Overlapping roots are fine: a key reached twice keeps its first entry.
    pub fn scan_from(&mut self, graph: &G, roots: &[G::Node]) -> ScanOutcome {
        let mut outcome = ScanOutcome::default();

        for root in roots {
            let mut stack = vec![root.clone()];
            while let Some(node) = stack.pop() {
                outcome.visited_nodes += 1;
                self.visit_node(graph, &node, &mut outcome);

                let mut children = graph.children(&node);
                children.reverse();
                stack.extend(children);
            }
        }

        debug!(
            nodes = outcome.visited_nodes,
            behaviors = outcome.visited_behaviors,
            skipped = outcome.skipped_behaviors,
            new = outcome.new_candidates,
            total = self.candidates.len(),
            "scan complete"
        );
        outcome
    }

    fn visit_node(&mut self, graph: &G, node: &G::Node, outcome: &mut ScanOutcome) {
        for (slot, behavior) in graph.behaviors(node).into_iter().enumerate() {
            let Some(behavior) = behavior else {
                outcome.skipped_behaviors += 1;
                warn!(
                    node = %graph.node_name(node),
                    slot,
                    "skipping behavior with missing script"
                );
                continue;
            };
            outcome.visited_behaviors += 1;

            let object_id = compute_identity(graph, &behavior);
            let behavior_type = graph.behavior_type(&behavior);

            for field in graph.fields(&behavior) {
                if !field.is_unset_reference() {
                    continue;
                }

                let key = FieldKey::new(object_id.clone(), field.path);
                if self.known.contains(&key) {
                    continue;
                }

                trace!(key = %key, "new candidate");
                self.known.insert(key.clone());
                self.candidates.push(CandidateEntry {
                    key,
                    node: node.clone(),
                    behavior: behavior.clone(),
                    node_name: graph.node_name(node),
                    behavior_type: behavior_type.clone(),
                    field_display_name: field.display_name,
                });
                outcome.new_candidates += 1;
            }
        }
    }

    /// Candidates in discovery order.
    pub fn candidates(&self) -> &[Candidate<G>] {
        &self.candidates
    }

    pub fn find(&self, key: &FieldKey) -> Option<&Candidate<G>> {
        self.candidates.iter().find(|c| &c.key == key)
    }

    pub fn is_known(&self, key: &FieldKey) -> bool {
        self.known.contains(key)
    }

    pub fn known_len(&self) -> usize {
        self.known.len()
    }

    /// Drop candidates failing `keep`, which may also update the ones it
    /// keeps. Dropped keys leave the known set too, so a later scan can report
    /// them again if they come back.
    pub fn retain_mut<F>(&mut self, mut keep: F)
    where
        F: FnMut(&mut Candidate<G>) -> bool,
    {
        let known = &mut self.known;
        self.candidates.retain_mut(|c| {
            let kept = keep(c);
            if !kept {
                known.remove(&c.key);
            }
            kept
        });
    }

    pub fn clear(&mut self) {
        self.known.clear();
        self.candidates.clear();
    }
}

impl<G: SceneGraph> Default for Scanner<G> {
    fn default() -> Self {
        Self::new()
    }
}

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use tracing::{debug, info};

use crate::filter::category::CategoryFilter;
use crate::identity::field_key::FieldKey;
use crate::identity::object_id::{Resolution, resolve_identity};
use crate::scan::scanner::{Candidate, ScanOutcome, Scanner};
use crate::scene::scene_model::{ObjectRef, SceneGraph};
use crate::session::error::SessionError;
use crate::store::ack_store::{AckStore, AcknowledgedSet};
use crate::store::kv_store::KeyValueStore;

/// Which visible candidates a bulk acknowledgment applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AckMode {
    /// Fields still holding nothing
    Unset,
    /// Fields the user has since filled in
    Set,
    All,
}

impl AckMode {
    fn matches(&self, value: &Option<ObjectRef>) -> bool {
        match self {
            AckMode::Unset => value.is_none(),
            AckMode::Set => value.is_some(),
            AckMode::All => true,
        }
    }
}

impl FromStr for AckMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "unset" | "none" => Ok(AckMode::Unset),
            "set" | "attached" => Ok(AckMode::Set),
            "all" => Ok(AckMode::All),
            other => Err(format!("unknown mode '{other}' (expected unset, set or all)")),
        }
    }
}

impl fmt::Display for AckMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AckMode::Unset => "unset",
            AckMode::Set => "set",
            AckMode::All => "all",
        };
        f.write_str(s)
    }
}

/// What one reconciliation pass removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Candidates whose behavior or field no longer exists
    pub stale_candidates: usize,

    /// Acknowledged keys dropped from memory (the store keeps them)
    pub stale_acknowledgments: usize,
}

// ============================================================================
// Session
// ============================================================================

/// Review state for one loaded tree.
///
/// Owns the scanner (known set + candidate list), the acknowledged set and
/// its backing store, and the category filter. Nothing here is global: two
/// sessions never see each other's state.
pub struct Session<G: SceneGraph, S: KeyValueStore, F: CategoryFilter> {
    scanner: Scanner<G>,
    acknowledged: AcknowledgedSet,
    store: AckStore<S>,
    filter: F,
    last_outcome: ScanOutcome,
}

impl<G, S, F> Session<G, S, F>
where
    G: SceneGraph,
    S: KeyValueStore,
    F: CategoryFilter,
{
    /// Restore acknowledgments and run the first scan.
    pub fn open(graph: &G, store: S, filter: F) -> Result<Self, SessionError> {
        let mut session = Self {
            scanner: Scanner::new(),
            acknowledged: AcknowledgedSet::new(),
            store: AckStore::new(store),
            filter,
            last_outcome: ScanOutcome::default(),
        };
        session.on_tree_reloaded(graph)?;
        Ok(session)
    }

    /// Scan again without forgetting what is already listed.
    pub fn rescan(&mut self, graph: &G) -> ScanOutcome {
        self.last_outcome = self.scanner.scan(graph);
        self.last_outcome.clone()
    }

    /// The host swapped in a different tree instance.
    ///
    /// Everything keyed to the old tree is rebuilt off to the side and then
    /// swapped in, so the session never holds a half-cleared list.
    pub fn on_tree_reloaded(&mut self, graph: &G) -> Result<ScanOutcome, SessionError> {
        let acknowledged = self.store.load()?;

        let mut scanner = Scanner::new();
        let outcome = scanner.scan(graph);
        self.filter.register_types(&graph.declared_types());

        self.scanner = scanner;
        self.acknowledged = acknowledged;
        self.last_outcome = outcome.clone();

        info!(
            candidates = self.scanner.candidates().len(),
            acknowledged = self.acknowledged.len(),
            "session rebuilt for tree"
        );
        Ok(outcome)
    }

    /// Drop candidates and acknowledgments whose behavior is gone, and rebind
    /// surviving candidates to the behavior's current handles.
    ///
    /// Resolution runs to completion before anything is changed, so a fatal
    /// identity error leaves the session untouched.
    pub fn reconcile(&mut self, graph: &G) -> Result<ReconcileReport, SessionError> {
        let mut rebound = Vec::with_capacity(self.scanner.candidates().len());
        for candidate in self.scanner.candidates() {
            let live = match resolve_identity(graph, &candidate.key.object_id)? {
                Resolution::Live { node, behavior } => graph
                    .field_value(&behavior, &candidate.key.property_path)
                    .map(|_| (node, behavior)),
                Resolution::Stale => None,
            };
            rebound.push(live);
        }

        let mut stale_acks = Vec::new();
        for key in self.acknowledged.iter() {
            if resolve_identity(graph, &key.object_id)?.is_stale() {
                stale_acks.push(key.clone());
            }
        }

        let mut report = ReconcileReport::default();
        let mut rebound = rebound.into_iter();
        self.scanner.retain_mut(|candidate| match rebound.next().flatten() {
            Some((node, behavior)) => {
                candidate.node = node;
                candidate.behavior = behavior;
                true
            }
            None => {
                report.stale_candidates += 1;
                false
            }
        });

        for key in &stale_acks {
            self.acknowledged.remove(key);
        }
        report.stale_acknowledgments = stale_acks.len();

        if report != ReconcileReport::default() {
            debug!(
                stale_candidates = report.stale_candidates,
                stale_acknowledgments = report.stale_acknowledgments,
                "dropped stale entries"
            );
        }
        Ok(report)
    }

    /// Candidates to show: reconciled, not acknowledged, category switched on.
    pub fn current_candidates(&mut self, graph: &G) -> Result<Vec<&Candidate<G>>, SessionError> {
        self.reconcile(graph)?;
        Ok(self.visible())
    }

    /// Visible candidates as of the last reconciliation.
    pub fn visible(&self) -> Vec<&Candidate<G>> {
        self.scanner
            .candidates()
            .iter()
            .filter(|c| !self.acknowledged.contains(&c.key))
            .filter(|c| self.filter.get(c.category()))
            .collect()
    }

    pub fn has_pending(&mut self, graph: &G) -> Result<bool, SessionError> {
        Ok(!self.current_candidates(graph)?.is_empty())
    }

    /// Stop flagging this field. Returns false if it was already acknowledged;
    /// the record is persisted either way.
    pub fn acknowledge(&mut self, key: &FieldKey) -> Result<bool, SessionError> {
        self.store.append(key)?;
        Ok(self.acknowledged.insert(key.clone()))
    }

    /// Acknowledge every visible candidate whose current value matches `mode`.
    pub fn acknowledge_all_matching(
        &mut self,
        graph: &G,
        mode: AckMode,
    ) -> Result<Vec<FieldKey>, SessionError> {
        let keys: Vec<FieldKey> = self
            .current_candidates(graph)?
            .into_iter()
            .filter(|c| {
                c.current_value(graph)
                    .map(|value| mode.matches(&value))
                    .unwrap_or(false)
            })
            .map(|c| c.key.clone())
            .collect();

        for key in &keys {
            self.acknowledge(key)?;
        }

        info!(mode = %mode, count = keys.len(), "bulk acknowledgment");
        Ok(keys)
    }

    /// Forget every acknowledgment, in memory and in the store.
    pub fn reset_all(&mut self) -> Result<(), SessionError> {
        self.store.reset()?;
        self.acknowledged.clear();
        Ok(())
    }

    /// Node to jump to for this key, if its behavior still exists.
    pub fn focus(&self, graph: &G, key: &FieldKey) -> Result<Option<G::Node>, SessionError> {
        match resolve_identity(graph, &key.object_id)? {
            Resolution::Live { node, .. } => Ok(Some(node)),
            Resolution::Stale => Ok(None),
        }
    }

    /// Write a value into the field behind `key`. Returns false when the
    /// behavior is gone.
    pub fn assign(
        &self,
        graph: &mut G,
        key: &FieldKey,
        value: Option<ObjectRef>,
    ) -> Result<bool, SessionError> {
        match resolve_identity(graph, &key.object_id)? {
            Resolution::Live { behavior, .. } => {
                graph.write_field(&behavior, &key.property_path, value)?;
                Ok(true)
            }
            Resolution::Stale => Ok(false),
        }
    }

    pub fn is_acknowledged(&self, key: &FieldKey) -> bool {
        self.acknowledged.contains(key)
    }

    pub fn acknowledged(&self) -> &AcknowledgedSet {
        &self.acknowledged
    }

    /// Every candidate found so far, acknowledged or filtered ones included.
    pub fn all_candidates(&self) -> &[Candidate<G>] {
        self.scanner.candidates()
    }

    /// Counters of the most recent scan.
    pub fn last_outcome(&self) -> &ScanOutcome {
        &self.last_outcome
    }

    pub fn scanner(&self) -> &Scanner<G> {
        &self.scanner
    }

    pub fn store(&self) -> &AckStore<S> {
        &self.store
    }

    pub fn filter(&self) -> &F {
        &self.filter
    }

    pub fn filter_mut(&mut self) -> &mut F {
        &mut self.filter
    }

    pub fn into_parts(self) -> (S, F) {
        (self.store.into_inner(), self.filter)
    }
}

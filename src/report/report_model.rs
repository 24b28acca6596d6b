use serde::Serialize;

use crate::filter::category::CategoryFilter;
use crate::scan::scanner::{Candidate, ScanOutcome};
use crate::scene::scene_model::SceneGraph;
use crate::session::error::SessionError;
use crate::session::session::Session;
use crate::store::kv_store::KeyValueStore;

// ============================================================================
// Review report rows
// ============================================================================

/// One row of the review list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateRow {
    /// `"<node> > <Type> > <Field>"`
    pub label: String,

    pub object_id: String,
    pub property_path: String,
    pub category: String,

    /// Current value; `None` while still unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    pub acknowledged: bool,
}

impl CandidateRow {
    pub fn from_candidate<G: SceneGraph>(
        graph: &G,
        candidate: &Candidate<G>,
        acknowledged: bool,
    ) -> Self {
        Self {
            label: candidate.label(),
            object_id: candidate.key.object_id.to_string(),
            property_path: candidate.key.property_path.clone(),
            category: candidate.category().to_string(),
            value: candidate
                .current_value(graph)
                .flatten()
                .map(|v| v.to_string()),
            acknowledged,
        }
    }
}

/// Snapshot of a review session after a scan.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewReport {
    pub scene: String,
    pub outcome: ScanOutcome,
    pub rows: Vec<CandidateRow>,

    /// Candidates hidden because they were acknowledged
    pub hidden_acknowledged: usize,

    /// Candidates hidden because their category is switched off
    pub hidden_filtered: usize,
}

impl ReviewReport {
    pub fn visible_count(&self) -> usize {
        self.rows.iter().filter(|r| !r.acknowledged).count()
    }

    pub fn is_clean(&self) -> bool {
        self.visible_count() == 0
    }
}

impl ReviewReport {
    /// Reconcile the session against `graph` and collect its rows.
    ///
    /// With `include_acknowledged`, acknowledged candidates are listed too
    /// (marked as such); filtered-out categories are only counted.
    pub fn build<G, S, F>(
        session: &mut Session<G, S, F>,
        graph: &G,
        scene: &str,
        outcome: ScanOutcome,
        include_acknowledged: bool,
    ) -> Result<Self, SessionError>
    where
        G: SceneGraph,
        S: KeyValueStore,
        F: CategoryFilter,
    {
        session.reconcile(graph)?;

        let mut rows = Vec::new();
        let mut hidden_acknowledged = 0;
        let mut hidden_filtered = 0;

        for candidate in session.all_candidates() {
            let acknowledged = session.is_acknowledged(&candidate.key);
            if acknowledged {
                hidden_acknowledged += 1;
                if include_acknowledged {
                    rows.push(CandidateRow::from_candidate(graph, candidate, true));
                }
                continue;
            }
            if !session.filter().get(candidate.category()) {
                hidden_filtered += 1;
                continue;
            }
            rows.push(CandidateRow::from_candidate(graph, candidate, false));
        }

        Ok(Self {
            scene: scene.to_string(),
            outcome,
            rows,
            hidden_acknowledged,
            hidden_filtered,
        })
    }
}

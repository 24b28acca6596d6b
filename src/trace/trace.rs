use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::identity::field_key::FieldKey;
use crate::scan::scanner::ScanOutcome;

/// One line of the session event log.
#[derive(Debug, Serialize)]
pub struct SessionEvent {
    pub timestamp_ms: u128,

    /// `scan`, `acknowledge`, `acknowledge_all`, `reset`, `assign`
    pub event: String,

    pub scene: String,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub keys: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<ScanOutcome>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl SessionEvent {
    pub fn now(event: &str, scene: &str) -> Self {
        Self {
            timestamp_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or(0),
            event: event.to_string(),
            scene: scene.to_string(),
            keys: vec![],
            outcome: None,
            detail: None,
        }
    }

    pub fn with_key(mut self, key: &FieldKey) -> Self {
        self.keys.push(key.to_string());
        self
    }

    pub fn with_keys(mut self, keys: &[FieldKey]) -> Self {
        self.keys.extend(keys.iter().map(|k| k.to_string()));
        self
    }

    pub fn with_outcome(mut self, outcome: &ScanOutcome) -> Self {
        self.outcome = Some(outcome.clone());
        self
    }

    pub fn with_detail(mut self, detail: impl ToString) -> Self {
        self.detail = Some(detail.to_string());
        self
    }
}

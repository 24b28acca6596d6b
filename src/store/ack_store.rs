use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::identity::field_key::FieldKey;
use crate::identity::object_id::ObjectId;
use crate::store::kv_store::{KeyValueStore, StoreError};

// ============================================================================
// Persisted layout
// ============================================================================
//
//   ignoreCount               -> N
//   globalObjectIdString{i}   -> object id of record i
//   propertyPath{i}           -> property path of record i      (0 <= i < N)

pub const COUNT_KEY: &str = "ignoreCount";

pub fn object_id_key(index: usize) -> String {
    format!("globalObjectIdString{index}")
}

pub fn property_path_key(index: usize) -> String {
    format!("propertyPath{index}")
}

/// Field keys the user chose to stop seeing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AcknowledgedSet {
    keys: HashSet<FieldKey>,
}

impl AcknowledgedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the key was already present.
    pub fn insert(&mut self, key: FieldKey) -> bool {
        self.keys.insert(key)
    }

    pub fn contains(&self, key: &FieldKey) -> bool {
        self.keys.contains(key)
    }

    pub fn remove(&mut self, key: &FieldKey) -> bool {
        self.keys.remove(key)
    }

    pub fn retain<F: FnMut(&FieldKey) -> bool>(&mut self, keep: F) {
        self.keys.retain(keep);
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldKey> {
        self.keys.iter()
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }
}

impl FromIterator<FieldKey> for AcknowledgedSet {
    fn from_iter<I: IntoIterator<Item = FieldKey>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}

/// Reads and writes the acknowledged list in a flat store.
///
/// `append` writes the record first and bumps the count last. If the process
/// dies in between, the record sits past the count and is never read: at most
/// one acknowledgment is lost, nothing is corrupted. Duplicate records are
/// tolerated and collapse on load.
pub struct AckStore<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> AckStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    /// Number of records under the header; missing or malformed reads as 0.
    pub fn record_count(&self) -> usize {
        self.store
            .get(COUNT_KEY)
            .and_then(|raw| raw.trim().parse().ok())
            .unwrap_or(0)
    }

    /// Load every record below the header into a set.
    ///
    /// A missing or malformed header is rewritten as `"0"`. A record with an
    /// absent half is skipped.
    pub fn load(&mut self) -> Result<AcknowledgedSet, StoreError> {
        let count = match self.store.get(COUNT_KEY) {
            None => {
                self.store.set(COUNT_KEY, Some("0"))?;
                0
            }
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(n) => n,
                Err(_) => {
                    warn!(header = %raw, "malformed acknowledgment count, resetting to 0");
                    self.store.set(COUNT_KEY, Some("0"))?;
                    0
                }
            },
        };

        let mut set = AcknowledgedSet::new();
        for i in 0..count {
            let object_id = self.store.get(&object_id_key(i));
            let path = self.store.get(&property_path_key(i));

            match (object_id, path) {
                (Some(object_id), Some(path)) => {
                    set.insert(FieldKey::new(ObjectId::from_raw(object_id), path));
                }
                _ => warn!(index = i, "incomplete acknowledgment record skipped"),
            }
        }

        debug!(records = count, unique = set.len(), "acknowledgments loaded");
        Ok(set)
    }

    /// Append one record and bump the header. Returns the record's index.
    pub fn append(&mut self, key: &FieldKey) -> Result<usize, StoreError> {
        let index = self.record_count();

        self.store
            .set(&object_id_key(index), Some(key.object_id.as_str()))?;
        self.store
            .set(&property_path_key(index), Some(key.property_path.as_str()))?;
        let bumped = (index + 1).to_string();
        self.store.set(COUNT_KEY, Some(bumped.as_str()))?;

        info!(key = %key, index, "acknowledgment persisted");
        Ok(index)
    }

    /// Remove every record below the header, then the header itself.
    pub fn reset(&mut self) -> Result<(), StoreError> {
        let count = self.record_count();

        for i in 0..count {
            self.store.set(&object_id_key(i), None)?;
            self.store.set(&property_path_key(i), None)?;
        }
        self.store.set(COUNT_KEY, None)?;

        info!(records = count, "acknowledgments cleared");
        Ok(())
    }
}

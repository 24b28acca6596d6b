use std::fmt;

use serde::{Deserialize, Serialize};

use crate::identity::object_id::ObjectId;

/// One serialized field of one behavior: the unit that gets flagged and
/// acknowledged.
///
/// Equality and hashing are structural on both parts. The property path is
/// compared as an exact string: `items[3]` and `items[2]` are different keys
/// even if a list shift made them address the same logical element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FieldKey {
    pub object_id: ObjectId,
    pub property_path: String,
}

impl FieldKey {
    pub fn new(object_id: ObjectId, property_path: impl Into<String>) -> Self {
        Self {
            object_id,
            property_path: property_path.into(),
        }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.object_id, self.property_path)
    }
}

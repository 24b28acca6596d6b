//! Durable identity for behaviors attached to scene nodes.
//!
//! An [`ObjectId`] is derived from where the behavior is stored (the scene's
//! guid and the local id it was saved under), never from where it currently
//! sits in a list. An earlier scheme keyed behaviors by their index in the
//! node's behavior list; removing an earlier behavior shifted every later
//! index, so acknowledgments silently moved to the wrong behavior. Any new
//! identity source must stay independent of sibling order for that reason.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::scene::scene_model::{ObjectKind, ObjectLocation, SceneGraph, SceneObject};

const PREFIX: &str = "obj";
const VERSION: &str = "v1";

/// Serialization-stable identifier of a behavior instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(String);

impl ObjectId {
    /// Format a storage location as `obj:v1:<kind>:<scope-guid>:<local-id>`.
    pub fn from_location(location: &ObjectLocation) -> Self {
        ObjectId(format!(
            "{PREFIX}:{VERSION}:{}:{}:{}",
            location.kind.as_str(),
            location.scope_guid,
            location.local_id
        ))
    }

    /// Wrap a string read back from storage. Not validated here; a malformed
    /// id simply never resolves.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        ObjectId(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Recover the storage location, or `None` if the string is not one of ours.
    pub fn location(&self) -> Option<ObjectLocation> {
        let mut parts = self.0.splitn(5, ':');
        if parts.next()? != PREFIX || parts.next()? != VERSION {
            return None;
        }
        let kind = ObjectKind::parse(parts.next()?)?;
        let scope_guid = parts.next()?;

        // the guid never contains ':', the local id is the last segment
        let local_id = parts.next()?.parse().ok()?;
        if scope_guid.is_empty() {
            return None;
        }

        Some(ObjectLocation {
            kind,
            scope_guid: scope_guid.to_string(),
            local_id,
        })
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of resolving an identifier against a live graph.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<N, B> {
    Live { node: N, behavior: B },

    /// The behavior no longer exists (deleted, or the id is unreadable)
    Stale,
}

impl<N, B> Resolution<N, B> {
    pub fn is_stale(&self) -> bool {
        matches!(self, Resolution::Stale)
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum IdentityError {
    /// The id was computed from a behavior but now names something else.
    /// Points at a broken identity source, not at user data.
    #[error("identity {id} resolved to a non-behavior object")]
    NotABehavior { id: String },
}

pub fn compute_identity<G: SceneGraph>(graph: &G, behavior: &G::Behavior) -> ObjectId {
    ObjectId::from_location(&graph.locate(behavior))
}

/// Resolve an id back to a live behavior.
///
/// Missing objects and unreadable ids are [`Resolution::Stale`]. Only a
/// location that resolves to a node instead of a behavior is an error.
pub fn resolve_identity<G: SceneGraph>(
    graph: &G,
    id: &ObjectId,
) -> Result<Resolution<G::Node, G::Behavior>, IdentityError> {
    let Some(location) = id.location() else {
        debug!(id = %id, "unparsable object id treated as stale");
        return Ok(Resolution::Stale);
    };

    match graph.find(&location) {
        None => Ok(Resolution::Stale),
        Some(SceneObject::Behavior { node, behavior }) => Ok(Resolution::Live { node, behavior }),
        Some(SceneObject::Node(_)) => Err(IdentityError::NotABehavior { id: id.to_string() }),
    }
}

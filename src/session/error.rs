use thiserror::Error;

use crate::identity::object_id::IdentityError;
use crate::scene::error::SceneError;
use crate::store::kv_store::StoreError;

#[derive(Debug, Error)]
pub enum SessionError {
    /// Invariant violation in the identity source; not recoverable
    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Scene(#[from] SceneError),
}

impl SessionError {
    /// True for errors that mean the engine itself is broken rather than
    /// that some I/O failed.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SessionError::Identity(_))
    }
}

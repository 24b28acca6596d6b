//! Finds serialized object-reference fields left unset in a scene tree and
//! tracks which of them the user has acknowledged as intentional.
//!
//! Layers, leaves first:
//!
//! - [`identity`]: durable behavior ids and the `(id, property path)` key
//! - [`scan`]: depth-first scanner with a session-long known set
//! - [`store`]: acknowledged keys persisted in a flat key/value store
//! - [`session`]: reconciliation and the API a review UI drives
//!
//! [`scene`], [`filter`], [`report`], [`trace`] and [`cli`] are the
//! collaborators around that core: the tree model, category switches, output
//! and the command-line host.

pub mod cli;
pub mod filter;
pub mod identity;
pub mod report;
pub mod scan;
pub mod scene;
pub mod session;
pub mod store;
pub mod trace;

pub use identity::field_key::FieldKey;
pub use identity::object_id::{IdentityError, ObjectId, Resolution, compute_identity, resolve_identity};
pub use scan::candidate::CandidateEntry;
pub use scan::scanner::{ScanOutcome, Scanner};
pub use scene::scene_model::{ObjectRef, SceneGraph};
pub use session::error::SessionError;
pub use session::session::{AckMode, Session};
pub use store::ack_store::{AckStore, AcknowledgedSet};
pub use store::kv_store::{JsonFileStore, KeyValueStore, MemoryStore};

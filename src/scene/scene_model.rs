use std::fmt;

use serde::{Deserialize, Serialize};

use crate::scene::error::SceneError;

// ============================================================================
// Object model shared by every scene graph implementation
// ============================================================================

/// A reference to another object in the scene or asset store.
///
/// The core never dereferences it; it only cares whether a field holds one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectRef(pub String);

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What kind of serialized value a field holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    ObjectReference,
    Integer,
    Float,
    Boolean,
    Text,
    Struct,
    List,
}

/// One serializable field as seen by the scanner.
///
/// `path` addresses the field inside its behavior, nested members included
/// (`settings.target`, `waypoints[2]`).
#[derive(Debug, Clone, PartialEq)]
pub struct FieldInfo {
    pub path: String,
    pub display_name: String,
    pub kind: FieldKind,

    /// Only meaningful for `FieldKind::ObjectReference`
    pub value: Option<ObjectRef>,
}

impl FieldInfo {
    /// True for an object-reference field that currently points at nothing.
    pub fn is_unset_reference(&self) -> bool {
        self.kind == FieldKind::ObjectReference && self.value.is_none()
    }
}

/// Whether a location names a node or one of its attached behaviors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Node,
    Behavior,
}

impl ObjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::Node => "node",
            ObjectKind::Behavior => "behavior",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "node" => Some(ObjectKind::Node),
            "behavior" => Some(ObjectKind::Behavior),
            _ => None,
        }
    }
}

/// Where an object lives in persistent storage.
///
/// `scope_guid` names the stored scene or asset, `local_id` is the id the
/// object was saved under inside it. Neither depends on sibling order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectLocation {
    pub kind: ObjectKind,
    pub scope_guid: String,
    pub local_id: u64,
}

/// Declared behavior type, as offered by the host's type registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BehaviorType {
    pub name: String,

    /// Menu path such as `Rendering/Camera`; built-in types carry one
    #[serde(default)]
    pub menu_path: Option<String>,

    /// Scripts written by the project rather than shipped with the engine
    #[serde(default)]
    pub user_authored: bool,

    /// Declares at least one object-reference field, nested ones included
    #[serde(default)]
    pub has_object_references: bool,
}

/// Result of looking a location up in a live graph.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneObject<N, B> {
    Node(N),
    Behavior { node: N, behavior: B },
}

// ============================================================================
// Tree/object model collaborator
// ============================================================================

/// The hierarchical scene the scanner walks.
///
/// Handles (`Node`, `Behavior`) are transient: they are only valid against the
/// graph instance that produced them. Anything that must outlive a reload goes
/// through [`SceneGraph::locate`] and [`SceneGraph::find`].
pub trait SceneGraph {
    type Node: Clone + fmt::Debug;
    type Behavior: Clone + fmt::Debug;

    fn roots(&self) -> Vec<Self::Node>;

    fn children(&self, node: &Self::Node) -> Vec<Self::Node>;

    /// Attached behaviors in declaration order. `None` marks a slot whose
    /// defining script is missing.
    fn behaviors(&self, node: &Self::Node) -> Vec<Option<Self::Behavior>>;

    /// Every serializable field of the behavior in visiting order: a parent
    /// field comes before its members, list elements in index order.
    fn fields(&self, behavior: &Self::Behavior) -> Vec<FieldInfo>;

    fn behavior_type(&self, behavior: &Self::Behavior) -> BehaviorType;

    fn node_name(&self, node: &Self::Node) -> String;

    /// Storage location of a behavior, stable across save and reload.
    fn locate(&self, behavior: &Self::Behavior) -> ObjectLocation;

    /// Look a location up in this graph. `None` when nothing lives there.
    fn find(&self, location: &ObjectLocation) -> Option<SceneObject<Self::Node, Self::Behavior>>;

    /// Current value of one object-reference field. Outer `None` when the
    /// path no longer exists or no longer holds a reference.
    fn field_value(&self, behavior: &Self::Behavior, path: &str) -> Option<Option<ObjectRef>>;

    fn write_field(
        &mut self,
        behavior: &Self::Behavior,
        path: &str,
        value: Option<ObjectRef>,
    ) -> Result<(), SceneError>;

    /// All behavior types known to the host, used to build category lists.
    fn declared_types(&self) -> Vec<BehaviorType>;
}

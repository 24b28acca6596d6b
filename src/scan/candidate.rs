use crate::filter::category::USER_SCRIPTS;
use crate::identity::field_key::FieldKey;
use crate::scene::scene_model::{BehaviorType, ObjectRef, SceneGraph};

/// An unset object-reference field found by a scan.
///
/// Holds transient handles into the graph it was scanned from; the session
/// throws every entry away when the graph is reloaded.
#[derive(Debug, Clone)]
pub struct CandidateEntry<N, B> {
    pub key: FieldKey,

    pub node: N,
    pub behavior: B,

    pub node_name: String,
    pub behavior_type: BehaviorType,
    pub field_display_name: String,
}

impl<N, B> CandidateEntry<N, B> {
    /// Filter category: built-in types are their own category, every
    /// user-authored script shares one.
    pub fn category(&self) -> &str {
        category_of(&self.behavior_type)
    }

    /// `"Player > CameraRig > Target Camera"`
    pub fn label(&self) -> String {
        format!(
            "{} > {} > {}",
            self.node_name, self.behavior_type.name, self.field_display_name
        )
    }

    pub fn property_path(&self) -> &str {
        &self.key.property_path
    }
}

impl<N: Clone, B: Clone> CandidateEntry<N, B> {
    /// Read the field's current value through the live graph.
    /// Outer `None` if the field is gone.
    pub fn current_value<G>(&self, graph: &G) -> Option<Option<ObjectRef>>
    where
        G: SceneGraph<Node = N, Behavior = B>,
    {
        graph.field_value(&self.behavior, &self.key.property_path)
    }

    /// True if the field still exists and holds no object.
    pub fn is_unset<G>(&self, graph: &G) -> bool
    where
        G: SceneGraph<Node = N, Behavior = B>,
    {
        matches!(self.current_value(graph), Some(None))
    }
}

pub fn category_of(behavior_type: &BehaviorType) -> &str {
    if behavior_type.user_authored {
        USER_SCRIPTS
    } else {
        &behavior_type.name
    }
}

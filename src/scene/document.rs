use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};

use crate::scene::error::SceneError;
use crate::scene::scene_model::{
    BehaviorType, FieldInfo, FieldKind, ObjectKind, ObjectLocation, ObjectRef, SceneGraph,
    SceneObject,
};

// ============================================================================
// Serialized scene model
// ============================================================================

/// A scene file: declared behavior types plus a tree of nodes.
///
/// Every node and behavior carries the `local_id` it was saved under. Ids are
/// unique within the document and survive reordering, reparenting and
/// save/reload, which is what makes them usable as durable identities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDocument {
    /// Identifies this stored scene among all scenes and assets
    pub scope_guid: String,

    #[serde(default)]
    pub types: Vec<TypeDecl>,

    #[serde(default)]
    pub roots: Vec<NodeData>,
}

/// A behavior type known to the project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDecl {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub menu_path: Option<String>,

    #[serde(default)]
    pub user_authored: bool,

    /// Field schema; only used to decide whether the type can hold references
    #[serde(default)]
    pub fields: Vec<FieldDecl>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    pub kind: FieldKind,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<FieldDecl>,
}

impl FieldDecl {
    fn declares_reference(&self) -> bool {
        self.kind == FieldKind::ObjectReference
            || self.members.iter().any(FieldDecl::declares_reference)
    }
}

impl TypeDecl {
    pub fn to_behavior_type(&self) -> BehaviorType {
        BehaviorType {
            name: self.name.clone(),
            menu_path: self.menu_path.clone(),
            user_authored: self.user_authored,
            has_object_references: self.fields.iter().any(FieldDecl::declares_reference),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeData {
    pub local_id: u64,
    pub name: String,

    #[serde(default)]
    pub behaviors: Vec<BehaviorData>,

    #[serde(default)]
    pub children: Vec<NodeData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorData {
    pub local_id: u64,

    #[serde(rename = "type")]
    pub type_name: String,

    #[serde(default)]
    pub fields: Vec<FieldData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldData {
    pub name: String,

    #[serde(flatten)]
    pub value: FieldValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldValue {
    ObjectReference {
        #[serde(default)]
        value: Option<ObjectRef>,
    },
    Integer {
        value: i64,
    },
    Float {
        value: f64,
    },
    Boolean {
        value: bool,
    },
    Text {
        value: String,
    },
    Struct {
        #[serde(default)]
        fields: Vec<FieldData>,
    },
    List {
        #[serde(default)]
        items: Vec<FieldValue>,
    },
}

impl FieldValue {
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::ObjectReference { .. } => FieldKind::ObjectReference,
            FieldValue::Integer { .. } => FieldKind::Integer,
            FieldValue::Float { .. } => FieldKind::Float,
            FieldValue::Boolean { .. } => FieldKind::Boolean,
            FieldValue::Text { .. } => FieldKind::Text,
            FieldValue::Struct { .. } => FieldKind::Struct,
            FieldValue::List { .. } => FieldKind::List,
        }
    }

    fn reference(&self) -> Option<ObjectRef> {
        match self {
            FieldValue::ObjectReference { value } => value.clone(),
            _ => None,
        }
    }
}

// ============================================================================
// Transient handles
// ============================================================================

/// Child-index path from a root. Only valid until the tree changes shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeHandle(pub Vec<usize>);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BehaviorHandle {
    pub node: NodeHandle,
    pub index: usize,
}

// ============================================================================
// Loading and saving
// ============================================================================

impl SceneDocument {
    pub fn new(scope_guid: &str) -> Self {
        Self {
            scope_guid: scope_guid.to_string(),
            types: Vec::new(),
            roots: Vec::new(),
        }
    }

    pub fn from_json_str(content: &str) -> Result<Self, SceneError> {
        let doc: Self = serde_json::from_str(content).map_err(|source| SceneError::Json {
            context: "<string>".to_string(),
            source,
        })?;
        doc.check_ids()?;
        Ok(doc)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, SceneError> {
        let doc: Self = serde_yaml::from_str(content).map_err(|source| SceneError::Yaml {
            context: "<string>".to_string(),
            source,
        })?;
        doc.check_ids()?;
        Ok(doc)
    }

    /// Load a scene file. `.yaml`/`.yml` are read as YAML, anything else as JSON.
    pub fn load(path: &Path) -> Result<Self, SceneError> {
        let display = path.display().to_string();
        let content = std::fs::read_to_string(path).map_err(|source| SceneError::Read {
            path: display.clone(),
            source,
        })?;

        let doc: Self = if is_yaml(path) {
            serde_yaml::from_str(&content).map_err(|source| SceneError::Yaml {
                context: display,
                source,
            })?
        } else {
            serde_json::from_str(&content).map_err(|source| SceneError::Json {
                context: display,
                source,
            })?
        };
        doc.check_ids()?;
        Ok(doc)
    }

    /// Every node and behavior must carry its own non-zero `local_id`;
    /// identities are derived from it.
    pub fn check_ids(&self) -> Result<(), SceneError> {
        fn walk(nodes: &[NodeData], seen: &mut HashSet<u64>) -> Result<(), SceneError> {
            for node in nodes {
                let behaviors = node
                    .behaviors
                    .iter()
                    .map(|b| (b.local_id, format!("{} on '{}'", b.type_name, node.name)));
                let ids = std::iter::once((node.local_id, format!("node '{}'", node.name)))
                    .chain(behaviors);

                for (local_id, name) in ids {
                    if local_id == 0 {
                        return Err(SceneError::ReservedId { name });
                    }
                    if !seen.insert(local_id) {
                        return Err(SceneError::DuplicateId { local_id });
                    }
                }
                walk(&node.children, seen)?;
            }
            Ok(())
        }

        walk(&self.roots, &mut HashSet::new())
    }

    pub fn save(&self, path: &Path) -> Result<(), SceneError> {
        let display = path.display().to_string();
        let content = if is_yaml(path) {
            serde_yaml::to_string(self).map_err(|source| SceneError::Yaml {
                context: display.clone(),
                source,
            })?
        } else {
            serde_json::to_string_pretty(self).map_err(|source| SceneError::Json {
                context: display.clone(),
                source,
            })?
        };

        std::fs::write(path, content).map_err(|source| SceneError::Write {
            path: display,
            source,
        })
    }

    pub fn declare_type(&mut self, decl: TypeDecl) {
        self.types.retain(|t| t.name != decl.name);
        self.types.push(decl);
    }

    fn type_decl(&self, name: &str) -> Option<&TypeDecl> {
        self.types.iter().find(|t| t.name == name)
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

// ============================================================================
// Tree navigation and editing
// ============================================================================

impl SceneDocument {
    pub fn node(&self, handle: &NodeHandle) -> Option<&NodeData> {
        let (first, rest) = handle.0.split_first()?;
        let mut node = self.roots.get(*first)?;
        for idx in rest {
            node = node.children.get(*idx)?;
        }
        Some(node)
    }

    pub fn node_mut(&mut self, handle: &NodeHandle) -> Option<&mut NodeData> {
        let (first, rest) = handle.0.split_first()?;
        let mut node = self.roots.get_mut(*first)?;
        for idx in rest {
            node = node.children.get_mut(*idx)?;
        }
        Some(node)
    }

    /// `Level/Player/Camera` style path of node names.
    pub fn node_path(&self, handle: &NodeHandle) -> Option<String> {
        let mut names = Vec::with_capacity(handle.0.len());
        for depth in 1..=handle.0.len() {
            let prefix = NodeHandle(handle.0[..depth].to_vec());
            names.push(self.node(&prefix)?.name.as_str());
        }
        Some(names.join("/"))
    }

    pub fn behavior(&self, handle: &BehaviorHandle) -> Option<&BehaviorData> {
        self.node(&handle.node)?.behaviors.get(handle.index)
    }

    fn behavior_mut(&mut self, handle: &BehaviorHandle) -> Option<&mut BehaviorData> {
        self.node_mut(&handle.node)?.behaviors.get_mut(handle.index)
    }

    /// Add a node under `parent`, or as a new root. Returns its handle.
    pub fn add_node(
        &mut self,
        parent: Option<&NodeHandle>,
        name: &str,
    ) -> Result<NodeHandle, SceneError> {
        let local_id = self.allocate_local_id(&format!("node/{name}"));
        let data = NodeData {
            local_id,
            name: name.to_string(),
            behaviors: Vec::new(),
            children: Vec::new(),
        };

        match parent {
            None => {
                self.roots.push(data);
                Ok(NodeHandle(vec![self.roots.len() - 1]))
            }
            Some(p) => {
                let node = self
                    .node_mut(p)
                    .ok_or_else(|| SceneError::NodeNotFound(p.0.clone()))?;
                node.children.push(data);
                let mut path = p.0.clone();
                path.push(node.children.len() - 1);
                Ok(NodeHandle(path))
            }
        }
    }

    /// Attach a behavior at the end of the node's behavior list.
    pub fn add_behavior(
        &mut self,
        node: &NodeHandle,
        type_name: &str,
        fields: Vec<FieldData>,
    ) -> Result<BehaviorHandle, SceneError> {
        let seed = {
            let data = self
                .node(node)
                .ok_or_else(|| SceneError::NodeNotFound(node.0.clone()))?;
            format!("behavior/{}/{}/{}", data.local_id, type_name, data.behaviors.len())
        };
        let local_id = self.allocate_local_id(&seed);

        let data = self
            .node_mut(node)
            .ok_or_else(|| SceneError::NodeNotFound(node.0.clone()))?;
        data.behaviors.push(BehaviorData {
            local_id,
            type_name: type_name.to_string(),
            fields,
        });

        Ok(BehaviorHandle {
            node: node.clone(),
            index: data.behaviors.len() - 1,
        })
    }

    pub fn remove_behavior(&mut self, handle: &BehaviorHandle) -> Result<BehaviorData, SceneError> {
        let node = self
            .node_mut(&handle.node)
            .ok_or_else(|| SceneError::NodeNotFound(handle.node.0.clone()))?;
        if handle.index >= node.behaviors.len() {
            return Err(SceneError::BehaviorNotFound {
                node: handle.node.0.clone(),
                index: handle.index,
            });
        }
        Ok(node.behaviors.remove(handle.index))
    }

    /// Detach a node (with its subtree) from the tree.
    pub fn remove_node(&mut self, handle: &NodeHandle) -> Result<NodeData, SceneError> {
        let not_found = || SceneError::NodeNotFound(handle.0.clone());
        let (last, parent) = handle.0.split_last().ok_or_else(not_found)?;

        let siblings = if parent.is_empty() {
            &mut self.roots
        } else {
            &mut self
                .node_mut(&NodeHandle(parent.to_vec()))
                .ok_or_else(not_found)?
                .children
        };

        if *last >= siblings.len() {
            return Err(not_found());
        }
        Ok(siblings.remove(*last))
    }

    /// Move a node under a new parent (or to the root list), keeping its ids.
    pub fn reparent(
        &mut self,
        handle: &NodeHandle,
        new_parent: Option<&NodeHandle>,
    ) -> Result<(), SceneError> {
        if let Some(p) = new_parent {
            if p.0.starts_with(&handle.0) {
                return Err(SceneError::InvalidParent(p.0.clone()));
            }
        }

        // Resolve the parent by id so the removal below does not invalidate it
        let parent_id = match new_parent {
            Some(p) => Some(
                self.node(p)
                    .ok_or_else(|| SceneError::NodeNotFound(p.0.clone()))?
                    .local_id,
            ),
            None => None,
        };

        let data = self.remove_node(handle)?;
        match parent_id {
            None => self.roots.push(data),
            Some(id) => {
                let parent = find_node_mut(&mut self.roots, id)
                    .ok_or_else(|| SceneError::NodeNotFound(handle.0.clone()))?;
                parent.children.push(data);
            }
        }
        Ok(())
    }

    /// Derive a fresh local id from a content fingerprint.
    ///
    /// The seed names the new object (its owner and type); a counter is mixed
    /// in only to step past collisions with ids already in the document.
    fn allocate_local_id(&self, seed: &str) -> u64 {
        let used = self.used_ids();
        let mut counter: u64 = 0;
        loop {
            let id = fingerprint_id(&format!("{}/{}/{}", self.scope_guid, seed, counter));
            if id != 0 && !used.contains(&id) {
                return id;
            }
            counter += 1;
        }
    }

    fn used_ids(&self) -> HashSet<u64> {
        fn walk(nodes: &[NodeData], out: &mut HashSet<u64>) {
            for node in nodes {
                out.insert(node.local_id);
                out.extend(node.behaviors.iter().map(|b| b.local_id));
                walk(&node.children, out);
            }
        }

        let mut out = HashSet::new();
        walk(&self.roots, &mut out);
        out
    }
}

fn fingerprint_id(text: &str) -> u64 {
    let mut hasher = Sha1::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();

    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(bytes)
}

fn find_node_mut(nodes: &mut [NodeData], local_id: u64) -> Option<&mut NodeData> {
    for node in nodes {
        if node.local_id == local_id {
            return Some(node);
        }
        if let Some(found) = find_node_mut(&mut node.children, local_id) {
            return Some(found);
        }
    }
    None
}

// ============================================================================
// Field paths
// ============================================================================

#[derive(Debug, PartialEq)]
enum PathStep<'a> {
    Member(&'a str),
    Index(usize),
}

/// Split `settings.targets[1].anchor` into member and index steps.
fn parse_path(path: &str) -> Option<Vec<PathStep<'_>>> {
    let mut steps = Vec::new();
    for segment in path.split('.') {
        let (name, mut rest) = match segment.find('[') {
            Some(pos) => segment.split_at(pos),
            None => (segment, ""),
        };
        if name.is_empty() {
            return None;
        }
        steps.push(PathStep::Member(name));

        while !rest.is_empty() {
            let close = rest.find(']')?;
            let index = rest.get(1..close)?.parse().ok()?;
            steps.push(PathStep::Index(index));
            rest = &rest[close + 1..];
            if !rest.is_empty() && !rest.starts_with('[') {
                return None;
            }
        }
    }
    Some(steps)
}

fn value_at<'a>(fields: &'a [FieldData], path: &str) -> Option<&'a FieldValue> {
    let steps = parse_path(path)?;
    let mut current: Option<&FieldValue> = None;

    for step in steps {
        current = match (step, current) {
            (PathStep::Member(name), None) => Some(&fields.iter().find(|f| f.name == name)?.value),
            (PathStep::Member(name), Some(FieldValue::Struct { fields })) => {
                Some(&fields.iter().find(|f| f.name == name)?.value)
            }
            (PathStep::Index(i), Some(FieldValue::List { items })) => Some(items.get(i)?),
            _ => return None,
        };
    }
    current
}

fn value_at_mut<'a>(fields: &'a mut [FieldData], path: &str) -> Option<&'a mut FieldValue> {
    let steps = parse_path(path)?;
    let (first, rest) = steps.split_first()?;
    let PathStep::Member(name) = first else {
        return None;
    };
    let mut current = &mut fields.iter_mut().find(|f| f.name == *name)?.value;

    for step in rest {
        current = match (step, current) {
            (PathStep::Member(name), FieldValue::Struct { fields }) => {
                &mut fields.iter_mut().find(|f| f.name == *name)?.value
            }
            (PathStep::Index(i), FieldValue::List { items }) => items.get_mut(*i)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Flatten fields in visiting order: parent first, then members / elements.
fn collect_fields(fields: &[FieldData], prefix: Option<&str>, out: &mut Vec<FieldInfo>) {
    for field in fields {
        let path = match prefix {
            Some(p) => format!("{}.{}", p, field.name),
            None => field.name.clone(),
        };
        collect_value(&field.value, path, nicify_name(&field.name), out);
    }
}

fn collect_value(value: &FieldValue, path: String, display_name: String, out: &mut Vec<FieldInfo>) {
    out.push(FieldInfo {
        path: path.clone(),
        display_name,
        kind: value.kind(),
        value: value.reference(),
    });

    match value {
        FieldValue::Struct { fields } => collect_fields(fields, Some(&path), out),
        FieldValue::List { items } => {
            for (i, item) in items.iter().enumerate() {
                collect_value(item, format!("{path}[{i}]"), format!("Element {i}"), out);
            }
        }
        _ => {}
    }
}

/// `targetCamera` / `_targetCamera` / `m_TargetCamera` -> `Target Camera`
pub fn nicify_name(name: &str) -> String {
    let trimmed = name.strip_prefix("m_").unwrap_or(name).trim_start_matches('_');

    let mut out = String::new();
    let mut prev: Option<char> = None;
    for c in trimmed.chars() {
        match prev {
            None => out.extend(c.to_uppercase()),
            Some(p) => {
                if c.is_uppercase() && !p.is_uppercase() {
                    out.push(' ');
                }
                out.push(c);
            }
        }
        prev = Some(c);
    }
    out
}

// ============================================================================
// SceneGraph implementation
// ============================================================================

impl SceneGraph for SceneDocument {
    type Node = NodeHandle;
    type Behavior = BehaviorHandle;

    fn roots(&self) -> Vec<NodeHandle> {
        (0..self.roots.len()).map(|i| NodeHandle(vec![i])).collect()
    }

    fn children(&self, node: &NodeHandle) -> Vec<NodeHandle> {
        let count = self.node(node).map(|n| n.children.len()).unwrap_or(0);
        (0..count)
            .map(|i| {
                let mut path = node.0.clone();
                path.push(i);
                NodeHandle(path)
            })
            .collect()
    }

    fn behaviors(&self, node: &NodeHandle) -> Vec<Option<BehaviorHandle>> {
        let Some(data) = self.node(node) else {
            return Vec::new();
        };

        data.behaviors
            .iter()
            .enumerate()
            .map(|(index, b)| {
                self.type_decl(&b.type_name).map(|_| BehaviorHandle {
                    node: node.clone(),
                    index,
                })
            })
            .collect()
    }

    fn fields(&self, behavior: &BehaviorHandle) -> Vec<FieldInfo> {
        let mut out = Vec::new();
        if let Some(data) = self.behavior(behavior) {
            collect_fields(&data.fields, None, &mut out);
        }
        out
    }

    fn behavior_type(&self, behavior: &BehaviorHandle) -> BehaviorType {
        let type_name = self
            .behavior(behavior)
            .map(|b| b.type_name.as_str())
            .unwrap_or_default();

        match self.type_decl(type_name) {
            Some(decl) => decl.to_behavior_type(),
            None => BehaviorType {
                name: type_name.to_string(),
                menu_path: None,
                user_authored: true,
                has_object_references: false,
            },
        }
    }

    fn node_name(&self, node: &NodeHandle) -> String {
        self.node(node).map(|n| n.name.clone()).unwrap_or_default()
    }

    fn locate(&self, behavior: &BehaviorHandle) -> ObjectLocation {
        ObjectLocation {
            kind: ObjectKind::Behavior,
            scope_guid: self.scope_guid.clone(),
            local_id: self.behavior(behavior).map(|b| b.local_id).unwrap_or(0),
        }
    }

    /// Ids share one namespace per document, so a location may turn out to
    /// name a node even when its kind says behavior; the caller decides.
    fn find(&self, location: &ObjectLocation) -> Option<SceneObject<NodeHandle, BehaviorHandle>> {
        fn walk(
            nodes: &[NodeData],
            path: &mut Vec<usize>,
            local_id: u64,
        ) -> Option<SceneObject<NodeHandle, BehaviorHandle>> {
            for (i, node) in nodes.iter().enumerate() {
                path.push(i);
                if node.local_id == local_id {
                    return Some(SceneObject::Node(NodeHandle(path.clone())));
                }
                if let Some(index) = node.behaviors.iter().position(|b| b.local_id == local_id) {
                    let handle = NodeHandle(path.clone());
                    return Some(SceneObject::Behavior {
                        node: handle.clone(),
                        behavior: BehaviorHandle { node: handle, index },
                    });
                }
                if let Some(found) = walk(&node.children, path, local_id) {
                    return Some(found);
                }
                path.pop();
            }
            None
        }

        if location.scope_guid != self.scope_guid {
            return None;
        }
        walk(&self.roots, &mut Vec::new(), location.local_id)
    }

    fn field_value(&self, behavior: &BehaviorHandle, path: &str) -> Option<Option<ObjectRef>> {
        let data = self.behavior(behavior)?;
        match value_at(&data.fields, path)? {
            FieldValue::ObjectReference { value } => Some(value.clone()),
            _ => None,
        }
    }

    fn write_field(
        &mut self,
        behavior: &BehaviorHandle,
        path: &str,
        value: Option<ObjectRef>,
    ) -> Result<(), SceneError> {
        let data = self
            .behavior_mut(behavior)
            .ok_or_else(|| SceneError::BehaviorNotFound {
                node: behavior.node.0.clone(),
                index: behavior.index,
            })?;
        let owner = data.type_name.clone();

        let slot = value_at_mut(&mut data.fields, path).ok_or_else(|| SceneError::FieldNotFound {
            behavior: owner,
            path: path.to_string(),
        })?;

        match slot {
            FieldValue::ObjectReference { value: current } => {
                *current = value;
                Ok(())
            }
            _ => Err(SceneError::NotAReference {
                path: path.to_string(),
            }),
        }
    }

    fn declared_types(&self) -> Vec<BehaviorType> {
        self.types.iter().map(TypeDecl::to_behavior_type).collect()
    }
}

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SceneError {
    /// Handle does not point at a node in this document
    #[error("node {0:?} not found")]
    NodeNotFound(Vec<usize>),

    /// A node cannot be moved under itself or its own descendants
    #[error("node {0:?} cannot become the parent")]
    InvalidParent(Vec<usize>),

    /// Two objects in one document were saved under the same id
    #[error("local id {local_id} is used by more than one object")]
    DuplicateId { local_id: u64 },

    #[error("{name} has local id 0, which is reserved")]
    ReservedId { name: String },

    #[error("behavior slot {index} on node {node:?} not found")]
    BehaviorNotFound { node: Vec<usize>, index: usize },

    #[error("field '{path}' not found on {behavior}")]
    FieldNotFound { behavior: String, path: String },

    /// Only object-reference fields accept an `ObjectRef`
    #[error("field '{path}' is not an object reference")]
    NotAReference { path: String },

    #[error("failed to read scene file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write scene file '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error in scene '{context}': {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("YAML error in scene '{context}': {source}")]
    Yaml {
        context: String,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Errors from node storage operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NodeError {
    /// No node exists at the path.
    #[error("path not found: {0}")]
    PathNotFound(String),

    /// A node already exists at the path.
    #[error("item exists: {0}")]
    ItemExists(String),

    /// The node name is not valid.
    #[error("invalid node name: {0}")]
    InvalidName(String),

    /// Attempted to remove the root node.
    #[error("cannot remove the root node")]
    RootRemoval,

    /// The backing session reported a failure.
    #[error("backend error: {0}")]
    Backend(String),
}

/// Result alias for node operations.
pub type NodeResult<T> = Result<T, NodeError>;

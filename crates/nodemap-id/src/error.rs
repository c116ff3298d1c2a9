//! Error types for id resolution.

use nodemap_node::NodeError;
use thiserror::Error;

/// Errors that can occur while resolving a path identifier.
///
/// These are configuration or data problems, never transient.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdError {
    /// The identifier field is empty or absent.
    #[error("{class}: identifier field is empty")]
    MissingIdentifier { class: String },

    /// Neither identifier, parent nor name is set.
    #[error("{class}: no identifier, parent or name set")]
    NoIdentificationParameters { class: String },

    /// A name is set but no parent.
    #[error("{class}: no parent set")]
    NoParent { class: String },

    /// A parent is set but no name.
    #[error("{class}: no node name set")]
    NoName { class: String },

    /// The parent's own path is not known.
    #[error("{class}: path of parent {parent} cannot be resolved")]
    ParentPathUnresolved { class: String, parent: String },

    /// A delegate or slugifier failed or produced nothing.
    #[error("{class}: id generation failed: {reason}")]
    GenerationFailed { class: String, reason: String },

    /// The generator names a field the class does not map.
    #[error("{class}: field {field:?} is not mapped")]
    UnmappedField { class: String, field: String },

    /// A composed name is not a valid node name.
    #[error("{class}: invalid node name {name:?}: {reason}")]
    InvalidName {
        class: String,
        name: String,
        reason: String,
    },

    /// Node storage failed while resolving.
    #[error("node error: {0}")]
    Node(#[from] NodeError),
}

impl IdError {
    pub(crate) fn generation_failed(class: &str, reason: impl Into<String>) -> Self {
        Self::GenerationFailed {
            class: class.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result alias for id resolution.
pub type IdResult<T> = Result<T, IdError>;

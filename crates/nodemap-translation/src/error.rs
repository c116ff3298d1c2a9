//! Error types for translation operations.

use nodemap_node::NodeError;
use thiserror::Error;

/// Errors from translation strategies.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TranslationError {
    /// A translation-only operation was called on the untranslated layout.
    #[error("illegal translation operation: {operation} is not supported without a translation layer")]
    IllegalTranslationOperation { operation: &'static str },

    /// A field value cannot be encoded to or decoded from node properties.
    #[error("codec error for field {field}: {reason}")]
    Codec { field: String, reason: String },

    /// The strategy is misconfigured.
    #[error("translation configuration error: {0}")]
    Configuration(String),

    /// Node storage failed.
    #[error("node error: {0}")]
    Node(#[from] NodeError),
}

impl TranslationError {
    pub fn illegal(operation: &'static str) -> Self {
        Self::IllegalTranslationOperation { operation }
    }

    pub fn codec(field: &str, reason: impl Into<String>) -> Self {
        Self::Codec {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result alias for translation operations.
pub type TranslationResult<T> = Result<T, TranslationError>;

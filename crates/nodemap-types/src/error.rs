use thiserror::Error;

/// Errors produced while building or validating foundation types.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid path {path}: {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("invalid node name {name:?}: {reason}")]
    InvalidNodeName { name: String, reason: String },

    #[error("invalid locale {locale:?}: {reason}")]
    InvalidLocale { locale: String, reason: String },

    #[error("mapping configuration error for {class}: {reason}")]
    Configuration { class: String, reason: String },

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl TypeError {
    /// Create a configuration error for a class.
    pub fn configuration(class: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Configuration {
            class: class.into(),
            reason: reason.into(),
        }
    }
}

/// Result alias for type operations.
pub type TypeResult<T> = Result<T, TypeError>;

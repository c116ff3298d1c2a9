/// Errors raised while delivering a lifecycle event.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    /// A per-class callback method failed.
    #[error("callback {method} failed on {event}: {reason}")]
    Callback {
        event: String,
        method: String,
        reason: String,
    },

    /// A listener on the bus failed.
    #[error("listener failed on {event}: {reason}")]
    Listener { event: String, reason: String },
}

/// Result alias for lifecycle operations.
pub type LifecycleResult<T> = Result<T, LifecycleError>;

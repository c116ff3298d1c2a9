use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::debug;

use crate::error::{LifecycleError, LifecycleResult};
use crate::event::{LifecycleEvent, LifecycleEventArgs};

/// The shared event bus consulted after per-class callbacks.
pub trait ListenerRegistry: Send + Sync {
    /// Returns `true` if anything listens for `event`.
    fn has_listeners(&self, event: LifecycleEvent) -> bool;

    /// Deliver `args` to every listener of `event`.
    fn dispatch(&self, event: LifecycleEvent, args: &LifecycleEventArgs) -> LifecycleResult<()>;
}

/// A single subscriber on an [`EventManager`].
pub trait Listener: Send + Sync {
    fn on_event(&self, args: &LifecycleEventArgs) -> Result<(), String>;
}

impl<F> Listener for F
where
    F: Fn(&LifecycleEventArgs) -> Result<(), String> + Send + Sync,
{
    fn on_event(&self, args: &LifecycleEventArgs) -> Result<(), String> {
        self(args)
    }
}

/// In-process [`ListenerRegistry`]: listeners per event, called in
/// subscription order.
///
/// Delivery stops at the first failing listener.
#[derive(Default)]
pub struct EventManager {
    listeners: RwLock<HashMap<LifecycleEvent, Vec<Arc<dyn Listener>>>>,
}

impl EventManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe `listener` to each of `events`.
    pub fn subscribe(&self, events: &[LifecycleEvent], listener: Arc<dyn Listener>) {
        let mut map = self.listeners.write().expect("lock poisoned");
        for event in events {
            map.entry(*event).or_default().push(Arc::clone(&listener));
        }
    }

    /// Drop every listener of `event`.
    pub fn clear(&self, event: LifecycleEvent) {
        self.listeners.write().expect("lock poisoned").remove(&event);
    }

    pub fn listener_count(&self, event: LifecycleEvent) -> usize {
        self.listeners
            .read()
            .expect("lock poisoned")
            .get(&event)
            .map_or(0, Vec::len)
    }
}

impl ListenerRegistry for EventManager {
    fn has_listeners(&self, event: LifecycleEvent) -> bool {
        self.listener_count(event) > 0
    }

    fn dispatch(&self, event: LifecycleEvent, args: &LifecycleEventArgs) -> LifecycleResult<()> {
        // Snapshot so listeners may subscribe without deadlocking.
        let listeners: Vec<Arc<dyn Listener>> = self
            .listeners
            .read()
            .expect("lock poisoned")
            .get(&event)
            .cloned()
            .unwrap_or_default();
        debug!(%event, document = %args.document, count = listeners.len(), "dispatching to listeners");
        for listener in listeners {
            listener
                .on_event(args)
                .map_err(|reason| LifecycleError::Listener {
                    event: event.to_string(),
                    reason,
                })?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for EventManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let map = self.listeners.read().expect("lock poisoned");
        f.debug_struct("EventManager")
            .field("events", &map.len())
            .finish()
    }
}

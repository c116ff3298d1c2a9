use std::sync::Arc;

use nodemap_types::{Document, StrategyContext};
use tracing::debug;

use crate::error::{LifecycleError, LifecycleResult};
use crate::event::{Channels, LifecycleEvent, LifecycleEventArgs};
use crate::listener::{EventManager, ListenerRegistry};

/// An object whose class may declare callback methods.
pub trait CallbackTarget {
    /// Run the callback method named `method`.
    fn invoke_callback(&mut self, method: &str, args: &LifecycleEventArgs) -> Result<(), String>;
}

impl CallbackTarget for Document {
    fn invoke_callback(&mut self, method: &str, _args: &LifecycleEventArgs) -> Result<(), String> {
        Err(format!(
            "document of class {} has no method {method}",
            self.class_name()
        ))
    }
}

/// Routes an event occurrence to the object's callbacks and to the listener
/// bus.
///
/// Compute [`Channels`] once per occurrence with
/// [`subscribed_channels`](Self::subscribed_channels) and pass it to
/// [`invoke`](Self::invoke).
#[derive(Clone)]
pub struct LifecycleDispatcher {
    listeners: Arc<dyn ListenerRegistry>,
}

impl LifecycleDispatcher {
    pub fn new(listeners: Arc<dyn ListenerRegistry>) -> Self {
        Self { listeners }
    }

    pub fn listeners(&self) -> &Arc<dyn ListenerRegistry> {
        &self.listeners
    }

    /// Channels that have anything to run for `event` on this class.
    pub fn subscribed_channels(&self, context: &StrategyContext, event: LifecycleEvent) -> Channels {
        let mut channels = Channels::NONE;
        if !context.callbacks_for(event.as_str()).is_empty() {
            channels = channels | Channels::CALLBACKS;
        }
        if self.listeners.has_listeners(event) {
            channels = channels | Channels::MANAGER;
        }
        channels
    }

    /// Run the class's callbacks in declaration order, then the listener bus
    /// once. Only the channels in `channels` run.
    pub fn invoke(
        &self,
        context: &StrategyContext,
        event: LifecycleEvent,
        object: &mut dyn CallbackTarget,
        args: &LifecycleEventArgs,
        channels: Channels,
    ) -> LifecycleResult<()> {
        if channels.contains(Channels::CALLBACKS) {
            for method in context.callbacks_for(event.as_str()) {
                debug!(%event, class = %context.class_name, method = %method, "invoking callback");
                object
                    .invoke_callback(method, args)
                    .map_err(|reason| LifecycleError::Callback {
                        event: event.to_string(),
                        method: method.clone(),
                        reason,
                    })?;
            }
        }
        if channels.contains(Channels::MANAGER) {
            self.listeners.dispatch(event, args)?;
        }
        Ok(())
    }
}

impl Default for LifecycleDispatcher {
    fn default() -> Self {
        Self::new(Arc::new(EventManager::new()))
    }
}

impl std::fmt::Debug for LifecycleDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleDispatcher").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nodemap_types::DocumentKey;
    use std::sync::Mutex;

    /// Records every call it sees, in order.
    #[derive(Default)]
    struct Spy {
        calls: Mutex<Vec<String>>,
        listening: Vec<LifecycleEvent>,
    }

    impl Spy {
        fn listening(events: &[LifecycleEvent]) -> Arc<Self> {
            Arc::new(Self {
                listening: events.to_vec(),
                ..Default::default()
            })
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().expect("lock poisoned").clone()
        }
    }

    impl ListenerRegistry for Spy {
        fn has_listeners(&self, event: LifecycleEvent) -> bool {
            self.listening.contains(&event)
        }

        fn dispatch(&self, event: LifecycleEvent, _args: &LifecycleEventArgs) -> LifecycleResult<()> {
            self.calls
                .lock()
                .expect("lock poisoned")
                .push(format!("bus:{event}"));
            Ok(())
        }
    }

    /// Host object whose callbacks append to the spy's log.
    struct Page {
        spy: Arc<Spy>,
        fail_on: Option<&'static str>,
    }

    impl CallbackTarget for Page {
        fn invoke_callback(&mut self, method: &str, _args: &LifecycleEventArgs) -> Result<(), String> {
            if self.fail_on == Some(method) {
                return Err("boom".into());
            }
            self.spy
                .calls
                .lock()
                .expect("lock poisoned")
                .push(format!("cb:{method}"));
            Ok(())
        }
    }

    fn context() -> StrategyContext {
        StrategyContext::builder("Page")
            .identifier("id")
            .callback("prePersist", "stamp")
            .callback("prePersist", "validate")
            .build()
            .unwrap()
    }

    fn args(event: LifecycleEvent) -> LifecycleEventArgs {
        LifecycleEventArgs::new(event, DocumentKey::generate(), "Page")
    }

    // ---- channel computation ----

    #[test]
    fn no_callbacks_no_listeners_is_empty_and_silent() {
        let spy = Spy::listening(&[]);
        let dispatcher = LifecycleDispatcher::new(spy.clone());
        let ctx = context();
        let event = LifecycleEvent::PostLoad;

        let channels = dispatcher.subscribed_channels(&ctx, event);
        assert!(channels.is_empty());

        let mut page = Page {
            spy: spy.clone(),
            fail_on: None,
        };
        dispatcher
            .invoke(&ctx, event, &mut page, &args(event), channels)
            .unwrap();
        assert!(spy.calls().is_empty());
    }

    #[test]
    fn channels_reflect_callbacks_and_listeners() {
        let spy = Spy::listening(&[LifecycleEvent::PrePersist, LifecycleEvent::PostRemove]);
        let dispatcher = LifecycleDispatcher::new(spy);
        let ctx = context();

        assert_eq!(
            dispatcher.subscribed_channels(&ctx, LifecycleEvent::PrePersist),
            Channels::CALLBACKS | Channels::MANAGER
        );
        assert_eq!(
            dispatcher.subscribed_channels(&ctx, LifecycleEvent::PostRemove),
            Channels::MANAGER
        );
    }

    // ---- invocation ----

    #[test]
    fn callbacks_in_order_then_bus_once() {
        let spy = Spy::listening(&[LifecycleEvent::PrePersist]);
        let dispatcher = LifecycleDispatcher::new(spy.clone());
        let ctx = context();
        let event = LifecycleEvent::PrePersist;
        let channels = dispatcher.subscribed_channels(&ctx, event);

        let mut page = Page {
            spy: spy.clone(),
            fail_on: None,
        };
        dispatcher
            .invoke(&ctx, event, &mut page, &args(event), channels)
            .unwrap();
        assert_eq!(spy.calls(), vec!["cb:stamp", "cb:validate", "bus:prePersist"]);
    }

    #[test]
    fn channels_not_passed_do_not_run() {
        let spy = Spy::listening(&[LifecycleEvent::PrePersist]);
        let dispatcher = LifecycleDispatcher::new(spy.clone());
        let ctx = context();
        let event = LifecycleEvent::PrePersist;

        let mut page = Page {
            spy: spy.clone(),
            fail_on: None,
        };
        dispatcher
            .invoke(&ctx, event, &mut page, &args(event), Channels::MANAGER)
            .unwrap();
        assert_eq!(spy.calls(), vec!["bus:prePersist"]);
    }

    #[test]
    fn failing_callback_skips_the_bus() {
        let spy = Spy::listening(&[LifecycleEvent::PrePersist]);
        let dispatcher = LifecycleDispatcher::new(spy.clone());
        let ctx = context();
        let event = LifecycleEvent::PrePersist;
        let channels = dispatcher.subscribed_channels(&ctx, event);

        let mut page = Page {
            spy: spy.clone(),
            fail_on: Some("validate"),
        };
        let err = dispatcher
            .invoke(&ctx, event, &mut page, &args(event), channels)
            .unwrap_err();
        assert!(matches!(err, LifecycleError::Callback { ref method, .. } if method == "validate"));
        assert_eq!(spy.calls(), vec!["cb:stamp"]);
    }

    #[test]
    fn document_has_no_callback_methods() {
        let dispatcher = LifecycleDispatcher::default();
        let ctx = context();
        let event = LifecycleEvent::PrePersist;
        let mut doc = Document::new("Page");
        let err = dispatcher
            .invoke(&ctx, event, &mut doc, &args(event), Channels::CALLBACKS)
            .unwrap_err();
        assert!(matches!(err, LifecycleError::Callback { .. }));
    }
}

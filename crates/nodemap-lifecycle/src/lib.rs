//! Lifecycle events for nodemap.
//!
//! An event occurrence is delivered on up to two channels: the callback
//! methods the object's class declares for it, then the shared listener bus.
//! [`LifecycleDispatcher::subscribed_channels`] computes which channels have
//! anything to do so callers can skip building event arguments entirely.

pub mod dispatcher;
pub mod error;
pub mod event;
pub mod listener;

pub use dispatcher::{CallbackTarget, LifecycleDispatcher};
pub use error::{LifecycleError, LifecycleResult};
pub use event::{Channels, LifecycleEvent, LifecycleEventArgs};
pub use listener::{EventManager, Listener, ListenerRegistry};

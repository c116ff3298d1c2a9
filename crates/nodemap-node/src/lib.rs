//! Node storage interface for nodemap.
//!
//! Strategies read and write node properties and children through the
//! [`NodeHandle`] trait and look nodes up through [`NodeSession`]. The
//! storage session owns the nodes; a handle is only a reference to a
//! location in its tree.
//!
//! # Storage Backends
//!
//! - [`MemoryRepository`] -- `BTreeMap`-based tree for tests and embedding
//!
//! # Design Rules
//!
//! 1. Handles take `&self`; the session serializes mutation internally.
//! 2. Setting a property to `Value::Null` removes it.
//! 3. Removing a node removes its whole subtree. The root cannot be removed.
//! 4. Storage errors are propagated, never silently ignored.

pub mod error;
pub mod memory;
pub mod traits;

pub use error::{NodeError, NodeResult};
pub use memory::{MemoryNode, MemoryRepository};
pub use traits::{NodeHandle, NodeSession};

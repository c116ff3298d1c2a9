//! The [`NodeHandle`] and [`NodeSession`] traits.
//!
//! Any backend (in-memory, remote repository client) implements these to let
//! nodemap strategies read and write the tree.

use nodemap_types::{path, Value};

use crate::error::NodeResult;

/// Reference to a location in the repository tree.
///
/// Handles are cheap to clone and all methods take `&self`: the session that
/// issued the handle owns the node data.
pub trait NodeHandle: Clone {
    /// Absolute path of this node.
    fn path(&self) -> &str;

    /// Last segment of the path.
    fn name(&self) -> &str {
        path::name_of(self.path())
    }

    /// Returns `true` if the node has a property called `name`.
    fn has_property(&self, name: &str) -> NodeResult<bool>;

    /// Read a property. Returns `Ok(None)` if it does not exist.
    fn property(&self, name: &str) -> NodeResult<Option<Value>>;

    /// Write a property. `Value::Null` removes it.
    fn set_property(&self, name: &str, value: Value) -> NodeResult<()>;

    /// All property names, sorted.
    fn property_names(&self) -> NodeResult<Vec<String>>;

    /// Returns `true` if a direct child called `name` exists.
    fn has_child(&self, name: &str) -> NodeResult<bool>;

    /// Fetch a direct child. Fails if it does not exist.
    fn child(&self, name: &str) -> NodeResult<Self>;

    /// Create a direct child. Fails if it already exists.
    fn add_child(&self, name: &str) -> NodeResult<Self>;

    /// Names of all direct children, sorted.
    fn child_names(&self) -> NodeResult<Vec<String>>;

    /// Remove this node and its subtree.
    fn remove(&self) -> NodeResult<()>;

    /// Property names starting with `prefix`.
    fn property_names_with_prefix(&self, prefix: &str) -> NodeResult<Vec<String>> {
        Ok(self
            .property_names()?
            .into_iter()
            .filter(|n| n.starts_with(prefix))
            .collect())
    }

    /// Child names starting with `prefix`.
    fn child_names_with_prefix(&self, prefix: &str) -> NodeResult<Vec<String>> {
        Ok(self
            .child_names()?
            .into_iter()
            .filter(|n| n.starts_with(prefix))
            .collect())
    }
}

/// A storage session that hands out node handles by path.
pub trait NodeSession {
    type Node: NodeHandle;

    /// Handle to the root node.
    fn root(&self) -> Self::Node;

    /// Handle to the node at `path`. Fails if no node exists there.
    fn node(&self, path: &str) -> NodeResult<Self::Node>;

    /// Returns `true` if a node exists at `path`.
    fn node_exists(&self, path: &str) -> bool {
        self.node(path).is_ok()
    }

    /// All nodes whose property `name` equals `value`, in path order.
    fn nodes_with_property(&self, name: &str, value: &Value) -> NodeResult<Vec<Self::Node>>;
}

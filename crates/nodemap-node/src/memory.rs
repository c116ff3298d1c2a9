use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use nodemap_types::{join_path, parent_of, validate_node_name, Value, ROOT_PATH};
use tracing::debug;

use crate::error::{NodeError, NodeResult};
use crate::traits::{NodeHandle, NodeSession};

type Tree = BTreeMap<String, BTreeMap<String, Value>>;

/// In-memory repository tree keyed by absolute path.
///
/// Intended for tests and embedding. Every node is an entry in a `BTreeMap`
/// from path to its property map, behind a shared `RwLock`. Cloning the
/// repository clones the handle, not the data.
#[derive(Clone)]
pub struct MemoryRepository {
    tree: Arc<RwLock<Tree>>,
}

impl MemoryRepository {
    /// Create a repository holding only the root node.
    pub fn new() -> Self {
        let mut tree = Tree::new();
        tree.insert(ROOT_PATH.to_string(), BTreeMap::new());
        Self {
            tree: Arc::new(RwLock::new(tree)),
        }
    }

    /// Number of nodes, root included.
    pub fn node_count(&self) -> usize {
        self.tree.read().expect("lock poisoned").len()
    }

    /// Create every missing node along `path` and return the last one.
    pub fn create_path(&self, path: &str) -> NodeResult<MemoryNode> {
        nodemap_types::validate_path(path).map_err(|e| NodeError::InvalidName(e.to_string()))?;
        let mut node = self.root();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            node = if node.has_child(segment)? {
                node.child(segment)?
            } else {
                node.add_child(segment)?
            };
        }
        Ok(node)
    }

    fn handle(&self, path: String) -> MemoryNode {
        MemoryNode {
            path,
            tree: Arc::clone(&self.tree),
        }
    }
}

impl Default for MemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryRepository")
            .field("node_count", &self.node_count())
            .finish()
    }
}

impl NodeSession for MemoryRepository {
    type Node = MemoryNode;

    fn root(&self) -> MemoryNode {
        self.handle(ROOT_PATH.to_string())
    }

    fn node(&self, path: &str) -> NodeResult<MemoryNode> {
        let tree = self.tree.read().expect("lock poisoned");
        if tree.contains_key(path) {
            Ok(self.handle(path.to_string()))
        } else {
            Err(NodeError::PathNotFound(path.to_string()))
        }
    }

    fn nodes_with_property(&self, name: &str, value: &Value) -> NodeResult<Vec<MemoryNode>> {
        let tree = self.tree.read().expect("lock poisoned");
        Ok(tree
            .iter()
            .filter(|(_, props)| props.get(name) == Some(value))
            .map(|(path, _)| self.handle(path.clone()))
            .collect())
    }
}

/// Handle to a node of a [`MemoryRepository`].
#[derive(Clone)]
pub struct MemoryNode {
    path: String,
    tree: Arc<RwLock<Tree>>,
}

impl MemoryNode {
    fn with_props<T>(&self, f: impl FnOnce(&BTreeMap<String, Value>) -> T) -> NodeResult<T> {
        let tree = self.tree.read().expect("lock poisoned");
        tree.get(&self.path)
            .map(f)
            .ok_or_else(|| NodeError::PathNotFound(self.path.clone()))
    }

    fn children_of(tree: &Tree, path: &str) -> Vec<String> {
        let prefix = if path == ROOT_PATH {
            ROOT_PATH.to_string()
        } else {
            format!("{path}/")
        };
        tree.range(prefix.clone()..)
            .take_while(|(k, _)| k.starts_with(&prefix))
            .filter(|(k, _)| parent_of(k) == Some(path))
            .map(|(k, _)| k[prefix.len()..].to_string())
            .collect()
    }
}

impl std::fmt::Debug for MemoryNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryNode").field("path", &self.path).finish()
    }
}

impl NodeHandle for MemoryNode {
    fn path(&self) -> &str {
        &self.path
    }

    fn has_property(&self, name: &str) -> NodeResult<bool> {
        self.with_props(|props| props.contains_key(name))
    }

    fn property(&self, name: &str) -> NodeResult<Option<Value>> {
        self.with_props(|props| props.get(name).cloned())
    }

    fn set_property(&self, name: &str, value: Value) -> NodeResult<()> {
        let mut tree = self.tree.write().expect("lock poisoned");
        let props = tree
            .get_mut(&self.path)
            .ok_or_else(|| NodeError::PathNotFound(self.path.clone()))?;
        if value.is_null() {
            props.remove(name);
        } else {
            props.insert(name.to_string(), value);
        }
        Ok(())
    }

    fn property_names(&self) -> NodeResult<Vec<String>> {
        self.with_props(|props| props.keys().cloned().collect())
    }

    fn has_child(&self, name: &str) -> NodeResult<bool> {
        let tree = self.tree.read().expect("lock poisoned");
        if !tree.contains_key(&self.path) {
            return Err(NodeError::PathNotFound(self.path.clone()));
        }
        Ok(tree.contains_key(&join_path(&self.path, name)))
    }

    fn child(&self, name: &str) -> NodeResult<Self> {
        let child_path = join_path(&self.path, name);
        let tree = self.tree.read().expect("lock poisoned");
        if tree.contains_key(&child_path) {
            Ok(Self {
                path: child_path,
                tree: Arc::clone(&self.tree),
            })
        } else {
            Err(NodeError::PathNotFound(child_path))
        }
    }

    fn add_child(&self, name: &str) -> NodeResult<Self> {
        validate_node_name(name).map_err(|e| NodeError::InvalidName(e.to_string()))?;
        let child_path = join_path(&self.path, name);
        let mut tree = self.tree.write().expect("lock poisoned");
        if !tree.contains_key(&self.path) {
            return Err(NodeError::PathNotFound(self.path.clone()));
        }
        if tree.contains_key(&child_path) {
            return Err(NodeError::ItemExists(child_path));
        }
        tree.insert(child_path.clone(), BTreeMap::new());
        debug!(path = %child_path, "node added");
        Ok(Self {
            path: child_path,
            tree: Arc::clone(&self.tree),
        })
    }

    fn child_names(&self) -> NodeResult<Vec<String>> {
        let tree = self.tree.read().expect("lock poisoned");
        if !tree.contains_key(&self.path) {
            return Err(NodeError::PathNotFound(self.path.clone()));
        }
        Ok(Self::children_of(&tree, &self.path))
    }

    fn remove(&self) -> NodeResult<()> {
        if self.path == ROOT_PATH {
            return Err(NodeError::RootRemoval);
        }
        let mut tree = self.tree.write().expect("lock poisoned");
        if tree.remove(&self.path).is_none() {
            return Err(NodeError::PathNotFound(self.path.clone()));
        }
        let prefix = format!("{}/", self.path);
        tree.retain(|k, _| !k.starts_with(&prefix));
        debug!(path = %self.path, "node removed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_repository_has_root() {
        let repo = MemoryRepository::new();
        assert_eq!(repo.node_count(), 1);
        assert_eq!(repo.root().path(), "/");
        assert!(repo.node_exists("/"));
    }

    #[test]
    fn add_and_fetch_children() {
        let repo = MemoryRepository::new();
        let cms = repo.root().add_child("cms").unwrap();
        assert_eq!(cms.path(), "/cms");
        let page = cms.add_child("page").unwrap();
        assert_eq!(page.path(), "/cms/page");
        assert_eq!(page.name(), "page");

        assert!(cms.has_child("page").unwrap());
        assert_eq!(cms.child("page").unwrap().path(), "/cms/page");
        assert_eq!(repo.root().child_names().unwrap(), vec!["cms"]);
    }

    #[test]
    fn child_names_are_direct_children_only() {
        let repo = MemoryRepository::new();
        repo.create_path("/a/b/c").unwrap();
        repo.create_path("/a/d").unwrap();
        repo.create_path("/ab").unwrap();
        let a = repo.node("/a").unwrap();
        assert_eq!(a.child_names().unwrap(), vec!["b", "d"]);
        assert_eq!(repo.root().child_names().unwrap(), vec!["a", "ab"]);
    }

    #[test]
    fn duplicate_child_is_rejected() {
        let repo = MemoryRepository::new();
        repo.root().add_child("x").unwrap();
        let err = repo.root().add_child("x").unwrap_err();
        assert_eq!(err, NodeError::ItemExists("/x".into()));
    }

    #[test]
    fn invalid_child_name_is_rejected() {
        let repo = MemoryRepository::new();
        assert!(matches!(
            repo.root().add_child("a/b"),
            Err(NodeError::InvalidName(_))
        ));
    }

    #[test]
    fn set_null_removes_property() {
        let repo = MemoryRepository::new();
        let node = repo.root().add_child("n").unwrap();
        node.set_property("title", Value::from("Hello")).unwrap();
        assert!(node.has_property("title").unwrap());
        assert_eq!(node.property("title").unwrap(), Some(Value::from("Hello")));

        node.set_property("title", Value::Null).unwrap();
        assert!(!node.has_property("title").unwrap());
        assert_eq!(node.property("title").unwrap(), None);
    }

    #[test]
    fn empty_list_property_is_kept() {
        let repo = MemoryRepository::new();
        let node = repo.root().add_child("n").unwrap();
        node.set_property("marker", Value::List(Vec::new())).unwrap();
        assert!(node.has_property("marker").unwrap());
    }

    #[test]
    fn prefix_filters() {
        let repo = MemoryRepository::new();
        let node = repo.root().add_child("n").unwrap();
        node.set_property("locale:en-title", Value::from("a")).unwrap();
        node.set_property("other", Value::from("b")).unwrap();
        node.add_child("locale:de").unwrap();
        node.add_child("plain").unwrap();
        assert_eq!(
            node.property_names_with_prefix("locale:").unwrap(),
            vec!["locale:en-title"]
        );
        assert_eq!(node.child_names_with_prefix("locale:").unwrap(), vec!["locale:de"]);
    }

    #[test]
    fn remove_drops_subtree() {
        let repo = MemoryRepository::new();
        repo.create_path("/a/b/c").unwrap();
        repo.create_path("/ab").unwrap();
        repo.node("/a").unwrap().remove().unwrap();
        assert!(!repo.node_exists("/a"));
        assert!(!repo.node_exists("/a/b/c"));
        assert!(repo.node_exists("/ab"));
    }

    #[test]
    fn root_cannot_be_removed() {
        let repo = MemoryRepository::new();
        assert_eq!(repo.root().remove().unwrap_err(), NodeError::RootRemoval);
    }

    #[test]
    fn stale_handle_reports_missing_path() {
        let repo = MemoryRepository::new();
        let node = repo.root().add_child("gone").unwrap();
        node.remove().unwrap();
        assert!(matches!(node.child_names(), Err(NodeError::PathNotFound(_))));
        assert!(matches!(
            node.set_property("x", Value::from(1i64)),
            Err(NodeError::PathNotFound(_))
        ));
    }

    #[test]
    fn nodes_with_property_matches_value() {
        let repo = MemoryRepository::new();
        let a = repo.create_path("/a").unwrap();
        let b = repo.create_path("/b").unwrap();
        a.set_property("class", Value::from("Page")).unwrap();
        b.set_property("class", Value::from("Post")).unwrap();
        let found = repo
            .nodes_with_property("class", &Value::from("Page"))
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].path(), "/a");
    }
}

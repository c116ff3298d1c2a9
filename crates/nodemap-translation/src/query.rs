//! Join descriptions for filtering on child-stored translations.
//!
//! Nothing here executes a query. A query layer supplies a [`QueryFactory`]
//! and receives back whatever source type it builds.

/// Kind of join between two selectors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum JoinType {
    Inner,
    LeftOuter,
    RightOuter,
}

/// How to join a document node with its locale child.
///
/// The join condition is "child's node name equals `child_node_name`" and the
/// child is a descendant of the parent selector.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TranslationJoin {
    pub join_type: JoinType,
    pub parent_selector: String,
    pub child_selector: String,
    pub child_node_type: Option<String>,
    pub child_node_name: String,
}

/// Builds query sources for a query layer.
pub trait QueryFactory {
    type Source;

    /// A selector over nodes of `node_type` (any type if `None`) named `alias`.
    fn selector(&self, node_type: Option<&str>, alias: &str) -> Self::Source;

    /// Join `left` with `right` as described by `join`.
    fn join(&self, left: Self::Source, right: Self::Source, join: &TranslationJoin) -> Self::Source;
}

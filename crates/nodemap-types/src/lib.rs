//! Foundation types for nodemap.
//!
//! nodemap maps in-memory objects onto nodes of a hierarchical, path-addressed
//! content repository. This crate holds the vocabulary shared by every other
//! nodemap crate.
//!
//! # Key Types
//!
//! - [`Value`] -- Typed property value stored on a node or held by a field
//! - [`Locale`] -- Language code used to key translated field values
//! - [`DocumentKey`] -- Stable in-memory identity of a mapped object
//! - [`ParentRef`] -- How an object names its parent (by key or by path)
//! - [`FieldMapping`] / [`StrategyContext`] -- Per-class mapping metadata
//! - [`FieldAccessor`] -- Get/set capability over an object's named fields
//! - [`Document`] -- Dynamic record implementing [`FieldAccessor`]

pub mod error;
pub mod locale;
pub mod mapping;
pub mod path;
pub mod record;
pub mod value;

pub use error::{TypeError, TypeResult};
pub use locale::Locale;
pub use mapping::{
    AssocMapping, FieldMapping, IdGeneratorKind, IdGeneratorOptions, StrategyContext,
    StrategyContextBuilder, TranslatorKind,
};
pub use path::{join_path, name_of, parent_of, validate_node_name, validate_path, ROOT_PATH};
pub use record::{Document, DocumentKey, FieldAccessor, ParentRef};
pub use value::Value;

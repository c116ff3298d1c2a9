//! Path identifier resolution for nodemap.
//!
//! Before an object is stored, its node path must be known. This crate
//! computes that path from the object's fields, its parent linkage and the
//! class's configured [`IdGeneratorKind`](nodemap_types::IdGeneratorKind).
//!
//! # Generators
//!
//! - **Assigned** -- the identifier field is the path
//! - **ParentComposed** -- parent path + node-name field
//! - **AutoNamed** -- parent path + a synthesized name unique among siblings
//! - **RepositoryDelegated** -- a per-class callback computes the path
//! - **FieldSlugified** -- parent path + slug of a designated field
//!
//! Parents are never held by reference. A parent is either an absolute path
//! or a [`DocumentKey`](nodemap_types::DocumentKey) that the [`IdRegistry`]
//! maps to an already-resolved path.
//!
//! # Modules
//!
//! - [`error`] -- [`IdError`] and the [`IdResult`] alias
//! - [`generator`] -- [`IdGenerator`] and its resolution environment
//! - [`registry`] -- the [`IdRegistry`] trait and [`InMemoryIdRegistry`]
//! - [`names`] -- auto-name synthesis and the default slugifier

pub mod error;
pub mod generator;
pub mod names;
pub mod registry;

pub use error::{IdError, IdResult};
pub use generator::{IdEnv, IdGenerator, RepositoryDelegate, Slugifier};
pub use names::{generate_auto_name, slugify};
pub use registry::{IdRegistry, InMemoryIdRegistry};

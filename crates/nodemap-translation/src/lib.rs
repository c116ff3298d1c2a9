//! Localized field persistence for nodemap.
//!
//! A translatable field holds one value per locale. This crate projects those
//! values onto node storage under one of three layouts, all reachable through
//! the closed [`TranslationStrategy`] enum:
//!
//! - [`AttributeStrategy`] -- `{prefix}:{locale}-{property}` properties on the
//!   document node, plus a `{prefix}:{locale}nullfields` marker listing the
//!   fields that were explicitly null
//! - [`ChildStrategy`] -- the same properties, written on a child node named
//!   `{prefix}:{locale}`
//! - [`NonTranslatedStrategy`] -- plain properties; translation-only
//!   operations fail with
//!   [`TranslationError::IllegalTranslationOperation`]
//!
//! Multivalue and associative fields are flattened to node properties by an
//! injected [`PropertyCodec`]; [`DefaultCodec`] is used when none is given.
//!
//! # Modules
//!
//! - [`error`] -- [`TranslationError`]
//! - [`codec`] -- [`PropertyCodec`], [`DefaultCodec`], plain property helpers
//! - [`attribute`], [`child`], [`non_translated`] -- the three layouts
//! - [`strategy`] -- [`TranslationStrategy`]
//! - [`query`] -- join description for filtering on child-stored translations

pub mod attribute;
pub mod child;
pub mod codec;
pub mod error;
pub mod non_translated;
pub mod query;
pub mod strategy;

pub use attribute::AttributeStrategy;
pub use child::ChildStrategy;
pub use codec::{read_plain_field, write_plain_field, DefaultCodec, EncodedField, PropertyCodec};
pub use error::{TranslationError, TranslationResult};
pub use non_translated::NonTranslatedStrategy;
pub use query::{JoinType, QueryFactory, TranslationJoin};
pub use strategy::TranslationStrategy;

/// Default namespace prefix for translated property and node names.
pub const DEFAULT_PREFIX: &str = "locale";

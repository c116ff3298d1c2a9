//! High-level nodemap API.
//!
//! [`DocumentMapper`] ties the lower crates together over one
//! [`NodeSession`](nodemap_node::NodeSession): it resolves a document's path
//! with the class's id generator, creates the node, writes plain fields,
//! projects translatable fields through the class's translation layout, and
//! fires lifecycle events around each step. [`TranslationConverter`] migrates
//! stored documents between translation layouts in bounded batches.

pub mod config;
pub mod converter;
pub mod error;
pub mod mapper;

pub use config::MapperConfig;
pub use converter::TranslationConverter;
pub use error::{MapperError, MapperResult};
pub use mapper::{DocumentMapper, Mapped, CLASS_PROPERTY};

// Re-export key types
pub use nodemap_id::{IdGenerator, InMemoryIdRegistry};
pub use nodemap_lifecycle::{
    CallbackTarget, EventManager, LifecycleEvent, LifecycleEventArgs, ListenerRegistry,
};
pub use nodemap_locale::{LocaleConfig, LocalePreferenceTable};
pub use nodemap_node::{MemoryRepository, NodeHandle, NodeSession};
pub use nodemap_translation::{PropertyCodec, TranslationStrategy};
pub use nodemap_types::{
    Document, DocumentKey, FieldAccessor, FieldMapping, IdGeneratorKind, Locale, ParentRef,
    StrategyContext, TranslatorKind, Value,
};

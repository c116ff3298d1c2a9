use thiserror::Error;

#[derive(Debug, Error)]
pub enum MapperError {
    #[error("no mapping registered for class {0}")]
    UnknownClass(String),

    #[error("document not found: {0}")]
    DocumentNotFound(String),

    #[error("document {key} is already persisted at {path}")]
    AlreadyPersisted { key: String, path: String },

    #[error("config error: {0}")]
    Config(String),

    #[error("type error: {0}")]
    Type(#[from] nodemap_types::TypeError),

    #[error("node error: {0}")]
    Node(#[from] nodemap_node::NodeError),

    #[error("id error: {0}")]
    Id(#[from] nodemap_id::IdError),

    #[error("locale error: {0}")]
    Locale(#[from] nodemap_locale::LocaleError),

    #[error("translation error: {0}")]
    Translation(#[from] nodemap_translation::TranslationError),

    #[error("lifecycle error: {0}")]
    Lifecycle(#[from] nodemap_lifecycle::LifecycleError),
}

pub type MapperResult<T> = Result<T, MapperError>;

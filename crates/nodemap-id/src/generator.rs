//! The [`IdGenerator`] strategy family.
//!
//! A generator is selected once per class with [`IdGenerator::for_kind`] and
//! then asked to [`resolve`](IdGenerator::resolve) the path of each object
//! about to be stored. Resolution is deterministic apart from AutoNamed's
//! name draw and only reads: object fields, the id registry, and (AutoNamed
//! only) the parent's current child names.

use std::fmt;
use std::sync::Arc;

use nodemap_node::{NodeHandle, NodeSession};
use nodemap_types::{
    join_path, validate_node_name, validate_path, FieldAccessor, IdGeneratorKind, ParentRef,
    StrategyContext, Value,
};
use tracing::{debug, warn};

use crate::error::{IdError, IdResult};
use crate::names::generate_auto_name;
use crate::registry::IdRegistry;

/// Injected slug function for [`IdGenerator::FieldSlugified`].
pub type Slugifier = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Per-class callback for [`IdGenerator::RepositoryDelegated`].
///
/// Returns the full path, or a failure reason.
pub type RepositoryDelegate =
    Arc<dyn Fn(&dyn FieldAccessor, Option<&ParentRef>) -> Result<String, String> + Send + Sync>;

/// External collaborators a generator may consult.
pub struct IdEnv<'a, S> {
    pub registry: &'a dyn IdRegistry,
    pub session: &'a S,
}

impl<'a, S> IdEnv<'a, S> {
    pub fn new(registry: &'a dyn IdRegistry, session: &'a S) -> Self {
        Self { registry, session }
    }
}

/// A path identifier strategy.
#[derive(Clone)]
pub enum IdGenerator {
    Assigned,
    ParentComposed,
    AutoNamed,
    RepositoryDelegated { delegate: Option<RepositoryDelegate> },
    FieldSlugified { slugifier: Option<Slugifier> },
}

impl IdGenerator {
    /// Select the generator for a configured kind.
    ///
    /// Delegated and slugging generators start without their callback; attach
    /// it with [`with_delegate`](Self::with_delegate) or
    /// [`with_slugifier`](Self::with_slugifier).
    pub fn for_kind(kind: IdGeneratorKind) -> Self {
        match kind {
            IdGeneratorKind::Assigned => Self::Assigned,
            IdGeneratorKind::Parent => Self::ParentComposed,
            IdGeneratorKind::Auto => Self::AutoNamed,
            IdGeneratorKind::Repository => Self::RepositoryDelegated { delegate: None },
            IdGeneratorKind::FieldSlugger => Self::FieldSlugified { slugifier: None },
        }
    }

    /// Attach a repository delegate. No effect on other variants.
    pub fn with_delegate(self, delegate: RepositoryDelegate) -> Self {
        match self {
            Self::RepositoryDelegated { .. } => Self::RepositoryDelegated {
                delegate: Some(delegate),
            },
            other => other,
        }
    }

    /// Attach a slugifier. No effect on other variants.
    pub fn with_slugifier(self, slugifier: Slugifier) -> Self {
        match self {
            Self::FieldSlugified { .. } => Self::FieldSlugified {
                slugifier: Some(slugifier),
            },
            other => other,
        }
    }

    /// The configured kind this generator implements.
    pub fn kind(&self) -> IdGeneratorKind {
        match self {
            Self::Assigned => IdGeneratorKind::Assigned,
            Self::ParentComposed => IdGeneratorKind::Parent,
            Self::AutoNamed => IdGeneratorKind::Auto,
            Self::RepositoryDelegated { .. } => IdGeneratorKind::Repository,
            Self::FieldSlugified { .. } => IdGeneratorKind::FieldSlugger,
        }
    }

    /// Compute the path of `object`.
    ///
    /// `parent_hint` takes precedence over the context's parent field.
    pub fn resolve<S: NodeSession>(
        &self,
        object: &dyn FieldAccessor,
        context: &StrategyContext,
        parent_hint: Option<&ParentRef>,
        env: &IdEnv<'_, S>,
    ) -> IdResult<String> {
        let path = match self {
            Self::Assigned => resolve_assigned(object, context),
            Self::ParentComposed => resolve_parent_composed(object, context, parent_hint, env),
            Self::AutoNamed => resolve_auto_named(object, context, parent_hint, env),
            Self::RepositoryDelegated { delegate } => {
                resolve_delegated(delegate.as_ref(), object, context, parent_hint)
            }
            Self::FieldSlugified { slugifier } => {
                resolve_slugified(slugifier.as_ref(), object, context, parent_hint, env)
            }
        }?;
        debug!(class = %context.class_name, generator = ?self.kind(), path = %path, "id resolved");
        Ok(path)
    }
}

impl fmt::Debug for IdGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Assigned => f.write_str("Assigned"),
            Self::ParentComposed => f.write_str("ParentComposed"),
            Self::AutoNamed => f.write_str("AutoNamed"),
            Self::RepositoryDelegated { delegate } => f
                .debug_struct("RepositoryDelegated")
                .field("delegate", &delegate.is_some())
                .finish(),
            Self::FieldSlugified { slugifier } => f
                .debug_struct("FieldSlugified")
                .field("slugifier", &slugifier.is_some())
                .finish(),
        }
    }
}

// ---------------------------------------------------------------------------
// Field helpers
// ---------------------------------------------------------------------------

fn non_blank_string(object: &dyn FieldAccessor, field: Option<&String>) -> Option<String> {
    let field = field?;
    match object.get(field) {
        Value::String(s) if !s.is_empty() => Some(s),
        _ => None,
    }
}

fn identifier(object: &dyn FieldAccessor, context: &StrategyContext) -> Option<String> {
    non_blank_string(object, context.identifier_field.as_ref())
}

fn node_name(object: &dyn FieldAccessor, context: &StrategyContext) -> Option<String> {
    non_blank_string(object, context.node_name_field.as_ref())
}

fn parent_ref(
    object: &dyn FieldAccessor,
    context: &StrategyContext,
    parent_hint: Option<&ParentRef>,
) -> Option<ParentRef> {
    if let Some(hint) = parent_hint {
        return Some(hint.clone());
    }
    let field = context.parent_field.as_ref()?;
    ParentRef::from_value(&object.get(field))
}

fn parent_path(
    parent: &ParentRef,
    context: &StrategyContext,
    registry: &dyn IdRegistry,
) -> IdResult<String> {
    let unresolved = |parent: String| IdError::ParentPathUnresolved {
        class: context.class_name.clone(),
        parent,
    };
    match parent {
        ParentRef::Document(key) => registry
            .resolved_path_of(*key)
            .ok_or_else(|| unresolved(key.to_string())),
        ParentRef::Path(path) => {
            validate_path(path).map_err(|_| unresolved(path.clone()))?;
            Ok(path.clone())
        }
    }
}

fn compose(parent_path: &str, name: &str, context: &StrategyContext) -> IdResult<String> {
    validate_node_name(name).map_err(|e| IdError::InvalidName {
        class: context.class_name.clone(),
        name: name.to_string(),
        reason: e.to_string(),
    })?;
    Ok(join_path(parent_path, name))
}

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn resolve_assigned(object: &dyn FieldAccessor, context: &StrategyContext) -> IdResult<String> {
    identifier(object, context).ok_or_else(|| IdError::MissingIdentifier {
        class: context.class_name.clone(),
    })
}

fn resolve_parent_composed<S: NodeSession>(
    object: &dyn FieldAccessor,
    context: &StrategyContext,
    parent_hint: Option<&ParentRef>,
    env: &IdEnv<'_, S>,
) -> IdResult<String> {
    let parent = parent_ref(object, context, parent_hint);
    let name = node_name(object, context);
    let class = || context.class_name.clone();

    match (parent, name) {
        (Some(parent), Some(name)) => {
            let base = parent_path(&parent, context, env.registry)?;
            compose(&base, &name, context)
        }
        (parent, name) => {
            // An explicit identifier wins when the composition is incomplete.
            if let Some(id) = identifier(object, context) {
                return Ok(id);
            }
            Err(match (parent, name) {
                (None, None) => IdError::NoIdentificationParameters { class: class() },
                (None, Some(_)) => IdError::NoParent { class: class() },
                _ => IdError::NoName { class: class() },
            })
        }
    }
}

fn resolve_auto_named<S: NodeSession>(
    object: &dyn FieldAccessor,
    context: &StrategyContext,
    parent_hint: Option<&ParentRef>,
    env: &IdEnv<'_, S>,
) -> IdResult<String> {
    if node_name(object, context).is_some() {
        return resolve_parent_composed(object, context, parent_hint, env);
    }

    let Some(parent) = parent_ref(object, context, parent_hint) else {
        return identifier(object, context).ok_or_else(|| IdError::NoIdentificationParameters {
            class: context.class_name.clone(),
        });
    };
    let base = parent_path(&parent, context, env.registry)?;

    // A parent that is not committed yet (cascading create) cannot list its
    // children; that counts as having none.
    let siblings = match env.session.node(&base).and_then(|node| node.child_names()) {
        Ok(names) => names,
        Err(e) => {
            warn!(parent = %base, error = %e, "cannot list siblings; assuming none");
            Vec::new()
        }
    };

    let name = generate_auto_name(&siblings, context.id_options.auto_name_prefix.as_deref());
    compose(&base, &name, context)
}

fn resolve_delegated(
    delegate: Option<&RepositoryDelegate>,
    object: &dyn FieldAccessor,
    context: &StrategyContext,
    parent_hint: Option<&ParentRef>,
) -> IdResult<String> {
    let class = &context.class_name;
    let delegate =
        delegate.ok_or_else(|| IdError::generation_failed(class, "no repository delegate"))?;
    let path = delegate(object, parent_hint).map_err(|reason| IdError::generation_failed(class, reason))?;
    if path.is_empty() {
        return Err(IdError::generation_failed(class, "delegate returned an empty id"));
    }
    validate_path(&path).map_err(|e| IdError::generation_failed(class, e.to_string()))?;
    Ok(path)
}

fn resolve_slugified<S: NodeSession>(
    slugifier: Option<&Slugifier>,
    object: &dyn FieldAccessor,
    context: &StrategyContext,
    parent_hint: Option<&ParentRef>,
    env: &IdEnv<'_, S>,
) -> IdResult<String> {
    let class = &context.class_name;
    let parent = parent_ref(object, context, parent_hint)
        .ok_or_else(|| IdError::NoParent { class: class.clone() })?;

    let field = context
        .id_options
        .slug_field
        .as_ref()
        .ok_or_else(|| IdError::generation_failed(class, "no slug field configured"))?;
    if context.field_mapping(field).is_none() {
        return Err(IdError::UnmappedField {
            class: class.clone(),
            field: field.clone(),
        });
    }

    let source = non_blank_string(object, Some(field))
        .ok_or_else(|| IdError::generation_failed(class, format!("slug field {field:?} is empty")))?;
    let slugifier =
        slugifier.ok_or_else(|| IdError::generation_failed(class, "no slugifier configured"))?;
    let slug = slugifier(&source);
    if slug.is_empty() {
        return Err(IdError::generation_failed(
            class,
            format!("slug of {source:?} is empty"),
        ));
    }

    let base = parent_path(&parent, context, env.registry)?;
    compose(&base, &slug, context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::names::slugify;
    use crate::registry::InMemoryIdRegistry;
    use nodemap_node::MemoryRepository;
    use nodemap_types::{Document, DocumentKey, FieldMapping};

    fn context(kind: IdGeneratorKind) -> StrategyContext {
        StrategyContext::builder("Page")
            .identifier("id")
            .parent("parent")
            .node_name("name")
            .slug_field("title")
            .id_generator(kind)
            .field(FieldMapping::new("id"))
            .field(FieldMapping::new("name"))
            .field(FieldMapping::new("title"))
            .build()
            .unwrap()
    }

    fn resolve(
        generator: &IdGenerator,
        doc: &Document,
        ctx: &StrategyContext,
        hint: Option<&ParentRef>,
        registry: &InMemoryIdRegistry,
        repo: &MemoryRepository,
    ) -> IdResult<String> {
        generator.resolve(doc, ctx, hint, &IdEnv::new(registry, repo))
    }

    struct Fixture {
        registry: InMemoryIdRegistry,
        repo: MemoryRepository,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                registry: InMemoryIdRegistry::new(),
                repo: MemoryRepository::new(),
            }
        }

        fn run(&self, generator: &IdGenerator, doc: &Document, hint: Option<&ParentRef>) -> IdResult<String> {
            let ctx = context(generator.kind());
            resolve(generator, doc, &ctx, hint, &self.registry, &self.repo)
        }

        /// Register a parent document at `path` and return its key.
        fn parent_at(&self, path: &str) -> DocumentKey {
            let key = DocumentKey::generate();
            self.registry.register(key, path);
            key
        }
    }

    // ---- Assigned ----

    #[test]
    fn assigned_returns_identifier_verbatim() {
        let fx = Fixture::new();
        let doc = Document::new("Page").with("id", "/cms/about");
        assert_eq!(fx.run(&IdGenerator::Assigned, &doc, None).unwrap(), "/cms/about");
    }

    #[test]
    fn assigned_without_identifier_fails() {
        let fx = Fixture::new();
        let doc = Document::new("Page").with("id", "");
        assert!(matches!(
            fx.run(&IdGenerator::Assigned, &doc, None),
            Err(IdError::MissingIdentifier { .. })
        ));
    }

    // ---- ParentComposed ----

    #[test]
    fn parent_root_yields_single_slash() {
        let fx = Fixture::new();
        let parent = fx.parent_at("/");
        let doc = Document::new("Page")
            .with("parent", Value::Reference(parent))
            .with("name", "x");
        assert_eq!(fx.run(&IdGenerator::ParentComposed, &doc, None).unwrap(), "/x");
    }

    #[test]
    fn parent_path_plus_name() {
        let fx = Fixture::new();
        let parent = fx.parent_at("/a");
        let doc = Document::new("Page")
            .with("parent", Value::Reference(parent))
            .with("name", "x");
        assert_eq!(fx.run(&IdGenerator::ParentComposed, &doc, None).unwrap(), "/a/x");
    }

    #[test]
    fn parent_given_as_path_string() {
        let fx = Fixture::new();
        let doc = Document::new("Page").with("parent", "/a/b").with("name", "x");
        assert_eq!(fx.run(&IdGenerator::ParentComposed, &doc, None).unwrap(), "/a/b/x");
    }

    #[test]
    fn parent_hint_overrides_field() {
        let fx = Fixture::new();
        let doc = Document::new("Page").with("parent", "/a").with("name", "x");
        let hint = ParentRef::Path("/hinted".into());
        assert_eq!(
            fx.run(&IdGenerator::ParentComposed, &doc, Some(&hint)).unwrap(),
            "/hinted/x"
        );
    }

    #[test]
    fn nothing_set_is_no_identification_parameters() {
        let fx = Fixture::new();
        let doc = Document::new("Page");
        assert!(matches!(
            fx.run(&IdGenerator::ParentComposed, &doc, None),
            Err(IdError::NoIdentificationParameters { .. })
        ));
    }

    #[test]
    fn name_without_parent_is_no_parent() {
        let fx = Fixture::new();
        let doc = Document::new("Page").with("name", "x");
        assert!(matches!(
            fx.run(&IdGenerator::ParentComposed, &doc, None),
            Err(IdError::NoParent { .. })
        ));
    }

    #[test]
    fn parent_without_name_is_no_name() {
        let fx = Fixture::new();
        let doc = Document::new("Page").with("parent", "/a");
        assert!(matches!(
            fx.run(&IdGenerator::ParentComposed, &doc, None),
            Err(IdError::NoName { .. })
        ));
    }

    #[test]
    fn explicit_identifier_wins_when_incomplete() {
        let fx = Fixture::new();
        let doc = Document::new("Page").with("id", "/explicit").with("name", "x");
        assert_eq!(
            fx.run(&IdGenerator::ParentComposed, &doc, None).unwrap(),
            "/explicit"
        );
    }

    #[test]
    fn composed_path_wins_over_identifier_when_complete() {
        let fx = Fixture::new();
        let doc = Document::new("Page")
            .with("id", "/explicit")
            .with("parent", "/a")
            .with("name", "x");
        assert_eq!(fx.run(&IdGenerator::ParentComposed, &doc, None).unwrap(), "/a/x");
    }

    #[test]
    fn unregistered_parent_is_unresolved() {
        let fx = Fixture::new();
        let doc = Document::new("Page")
            .with("parent", Value::Reference(DocumentKey::generate()))
            .with("name", "x");
        assert!(matches!(
            fx.run(&IdGenerator::ParentComposed, &doc, None),
            Err(IdError::ParentPathUnresolved { .. })
        ));
    }

    #[test]
    fn invalid_name_is_rejected() {
        let fx = Fixture::new();
        let doc = Document::new("Page").with("parent", "/a").with("name", "x/y");
        assert!(matches!(
            fx.run(&IdGenerator::ParentComposed, &doc, None),
            Err(IdError::InvalidName { .. })
        ));
    }

    // ---- AutoNamed ----

    #[test]
    fn auto_named_children_get_distinct_names() {
        let fx = Fixture::new();
        fx.repo.create_path("/news").unwrap();
        let parent = fx.parent_at("/news");
        let first = Document::new("Page").with("parent", Value::Reference(parent));
        let second = Document::new("Page").with("parent", Value::Reference(parent));

        let a = fx.run(&IdGenerator::AutoNamed, &first, None).unwrap();
        let b = fx.run(&IdGenerator::AutoNamed, &second, None).unwrap();
        assert!(a.starts_with("/news/"));
        assert!(b.starts_with("/news/"));
        assert_ne!(a, b);
    }

    #[test]
    fn auto_named_avoids_existing_siblings() {
        let fx = Fixture::new();
        let news = fx.repo.create_path("/news").unwrap();
        for i in 0..20 {
            news.add_child(&format!("existing{i}")).unwrap();
        }
        let doc = Document::new("Page").with("parent", "/news");
        let path = fx.run(&IdGenerator::AutoNamed, &doc, None).unwrap();
        let name = nodemap_types::name_of(&path).to_string();
        assert!(!news.child_names().unwrap().contains(&name));
    }

    #[test]
    fn auto_named_uses_explicit_name() {
        let fx = Fixture::new();
        let doc = Document::new("Page").with("parent", "/news").with("name", "fixed");
        assert_eq!(fx.run(&IdGenerator::AutoNamed, &doc, None).unwrap(), "/news/fixed");
    }

    // Known risk surface: a sibling-listing failure is indistinguishable from
    // an uncommitted parent and is swallowed.
    #[test]
    fn auto_named_treats_unlistable_parent_as_empty() {
        let fx = Fixture::new();
        let doc = Document::new("Page").with("parent", "/not/yet/committed");
        let path = fx.run(&IdGenerator::AutoNamed, &doc, None).unwrap();
        assert!(path.starts_with("/not/yet/committed/"));
    }

    #[test]
    fn auto_named_without_parent_falls_back_to_identifier() {
        let fx = Fixture::new();
        let doc = Document::new("Page").with("id", "/given");
        assert_eq!(fx.run(&IdGenerator::AutoNamed, &doc, None).unwrap(), "/given");
        assert!(matches!(
            fx.run(&IdGenerator::AutoNamed, &Document::new("Page"), None),
            Err(IdError::NoIdentificationParameters { .. })
        ));
    }

    #[test]
    fn auto_named_applies_prefix() {
        let fx = Fixture::new();
        let ctx = StrategyContext::builder("Page")
            .parent("parent")
            .auto_name_prefix("item-")
            .id_generator(IdGeneratorKind::Auto)
            .build()
            .unwrap();
        let doc = Document::new("Page").with("parent", "/");
        let path = resolve(&IdGenerator::AutoNamed, &doc, &ctx, None, &fx.registry, &fx.repo).unwrap();
        assert!(path.starts_with("/item-"));
    }

    // ---- RepositoryDelegated ----

    #[test]
    fn delegated_uses_callback() {
        let fx = Fixture::new();
        let generator = IdGenerator::for_kind(IdGeneratorKind::Repository).with_delegate(Arc::new(
            |object: &dyn FieldAccessor, _: Option<&ParentRef>| -> Result<String, String> {
                Ok(format!("/functional/{}", object.get("title").as_str().unwrap_or("none")))
            },
        ));
        let doc = Document::new("Page").with("title", "report");
        assert_eq!(fx.run(&generator, &doc, None).unwrap(), "/functional/report");
    }

    #[test]
    fn delegated_failures_are_generation_failed() {
        let fx = Fixture::new();
        let doc = Document::new("Page");

        let missing = IdGenerator::for_kind(IdGeneratorKind::Repository);
        assert!(matches!(
            fx.run(&missing, &doc, None),
            Err(IdError::GenerationFailed { .. })
        ));

        let failing = missing
            .clone()
            .with_delegate(Arc::new(|_: &dyn FieldAccessor, _: Option<&ParentRef>| -> Result<String, String> {
                Err("backend down".to_string())
            }));
        let err = fx.run(&failing, &doc, None).unwrap_err();
        assert!(err.to_string().contains("backend down"));

        let empty = missing.with_delegate(Arc::new(|_: &dyn FieldAccessor, _: Option<&ParentRef>| -> Result<String, String> {
            Ok(String::new())
        }));
        assert!(matches!(
            fx.run(&empty, &doc, None),
            Err(IdError::GenerationFailed { .. })
        ));
    }

    // ---- FieldSlugified ----

    fn slugger() -> IdGenerator {
        IdGenerator::for_kind(IdGeneratorKind::FieldSlugger).with_slugifier(Arc::new(slugify))
    }

    #[test]
    fn slugified_appends_slug_to_parent() {
        let fx = Fixture::new();
        let parent = fx.parent_at("/blog");
        let doc = Document::new("Page")
            .with("parent", Value::Reference(parent))
            .with("title", "Hello World!");
        assert_eq!(fx.run(&slugger(), &doc, None).unwrap(), "/blog/hello-world");
    }

    #[test]
    fn slugified_requires_parent() {
        let fx = Fixture::new();
        let doc = Document::new("Page").with("title", "Hello");
        assert!(matches!(
            fx.run(&slugger(), &doc, None),
            Err(IdError::NoParent { .. })
        ));
    }

    #[test]
    fn slugified_rejects_empty_field() {
        let fx = Fixture::new();
        let doc = Document::new("Page").with("parent", "/blog");
        assert!(matches!(
            fx.run(&slugger(), &doc, None),
            Err(IdError::GenerationFailed { .. })
        ));
    }

    #[test]
    fn slugified_rejects_unmapped_field() {
        let fx = Fixture::new();
        let ctx = StrategyContext::builder("Page")
            .parent("parent")
            .slug_field("headline")
            .id_generator(IdGeneratorKind::FieldSlugger)
            .build()
            .unwrap();
        let doc = Document::new("Page").with("parent", "/blog").with("headline", "x");
        assert!(matches!(
            resolve(&slugger(), &doc, &ctx, None, &fx.registry, &fx.repo),
            Err(IdError::UnmappedField { .. })
        ));
    }

    #[test]
    fn slugified_without_slugifier_fails() {
        let fx = Fixture::new();
        let generator = IdGenerator::for_kind(IdGeneratorKind::FieldSlugger);
        let doc = Document::new("Page").with("parent", "/blog").with("title", "x");
        assert!(matches!(
            fx.run(&generator, &doc, None),
            Err(IdError::GenerationFailed { .. })
        ));
    }

    #[test]
    fn factory_round_trips_kind() {
        for kind in [
            IdGeneratorKind::Assigned,
            IdGeneratorKind::Parent,
            IdGeneratorKind::Auto,
            IdGeneratorKind::Repository,
            IdGeneratorKind::FieldSlugger,
        ] {
            assert_eq!(IdGenerator::for_kind(kind).kind(), kind);
        }
    }
}

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use nodemap_id::{IdEnv, IdGenerator, IdRegistry, InMemoryIdRegistry};
use nodemap_lifecycle::{
    CallbackTarget, LifecycleDispatcher, LifecycleEvent, LifecycleEventArgs, ListenerRegistry,
};
use nodemap_locale::{LocaleError, LocaleFallbackResolver, LocalePreferenceTable};
use nodemap_node::{NodeError, NodeHandle, NodeSession};
use nodemap_translation::{
    read_plain_field, write_plain_field, DefaultCodec, PropertyCodec, TranslationError,
    TranslationStrategy,
};
use nodemap_types::{
    name_of, parent_of, validate_path, Document, DocumentKey, FieldAccessor, Locale, ParentRef,
    StrategyContext, TranslatorKind, Value,
};
use tracing::{debug, warn};

use crate::config::MapperConfig;
use crate::converter::TranslationConverter;
use crate::error::{MapperError, MapperResult};

/// Node property recording which class a node was stored as.
pub const CLASS_PROPERTY: &str = "nodemap:class";

/// An object the mapper can store: field access, callbacks, and a class.
pub trait Mapped: FieldAccessor + CallbackTarget {
    fn class_name(&self) -> &str;
}

impl Mapped for Document {
    fn class_name(&self) -> &str {
        Document::class_name(self)
    }
}

/// Everything registered for one class.
pub(crate) struct ClassMapping {
    pub context: StrategyContext,
    pub generator: IdGenerator,
    pub translation: TranslationStrategy,
}

/// Where an event occurred.
struct Occurrence<'a> {
    key: DocumentKey,
    path: Option<&'a str>,
    locale: Option<&'a Locale>,
}

impl<'a> Occurrence<'a> {
    fn at(key: DocumentKey, path: &'a str) -> Self {
        Self {
            key,
            path: Some(path),
            locale: None,
        }
    }

    fn in_locale(mut self, locale: &'a Locale) -> Self {
        self.locale = Some(locale);
        self
    }
}

/// Stores and loads mapped documents over a [`NodeSession`].
///
/// Each registered class brings a [`StrategyContext`]; the mapper resolves
/// paths with the class's [`IdGenerator`], projects translatable fields with
/// its [`TranslationStrategy`], and fires lifecycle events around every
/// transition.
pub struct DocumentMapper<S: NodeSession> {
    session: S,
    config: MapperConfig,
    classes: HashMap<String, ClassMapping>,
    registry: InMemoryIdRegistry,
    locales: LocaleFallbackResolver,
    dispatcher: LifecycleDispatcher,
    codec: Arc<dyn PropertyCodec>,
}

impl<S: NodeSession> DocumentMapper<S> {
    pub fn new(session: S, config: MapperConfig) -> MapperResult<Self> {
        config.validate()?;
        let locales = LocaleFallbackResolver::from_config(&config.locales)?;
        Ok(Self {
            session,
            config,
            classes: HashMap::new(),
            registry: InMemoryIdRegistry::new(),
            locales,
            dispatcher: LifecycleDispatcher::default(),
            codec: Arc::new(DefaultCodec),
        })
    }

    /// Use `listeners` as the listener bus.
    pub fn with_listeners(mut self, listeners: Arc<dyn ListenerRegistry>) -> Self {
        self.dispatcher = LifecycleDispatcher::new(listeners);
        self
    }

    /// Use `codec` for classes registered from now on.
    pub fn with_codec(mut self, codec: Arc<dyn PropertyCodec>) -> Self {
        self.codec = codec;
        self
    }

    // ---- Configuration ----

    /// Register a class with the generator its context names.
    pub fn register(&mut self, context: StrategyContext) -> MapperResult<()> {
        let generator = IdGenerator::for_kind(context.id_generator);
        self.register_with_generator(context, generator)
    }

    /// Register a class with a prepared generator (one carrying a delegate
    /// or slugifier).
    pub fn register_with_generator(
        &mut self,
        context: StrategyContext,
        generator: IdGenerator,
    ) -> MapperResult<()> {
        context.validate()?;
        if generator.kind() != context.id_generator {
            return Err(MapperError::Config(format!(
                "class {} declares {:?} ids but got a {:?} generator",
                context.class_name,
                context.id_generator,
                generator.kind()
            )));
        }
        let kind = context.translator.unwrap_or(TranslatorKind::NonTranslated);
        let translation = TranslationStrategy::for_kind(kind, &self.config.translation_prefix)?
            .with_codec(Arc::clone(&self.codec));
        debug!(class = %context.class_name, translator = ?kind, "class registered");
        self.classes.insert(
            context.class_name.clone(),
            ClassMapping {
                context,
                generator,
                translation,
            },
        );
        Ok(())
    }

    /// Replace the locale preference table.
    pub fn set_locale_preferences(
        &mut self,
        table: LocalePreferenceTable,
        default_locale: Locale,
    ) -> MapperResult<()> {
        self.locales.set_preferences(table, default_locale)?;
        Ok(())
    }

    /// Switch the session locale. Regional codes fall back to their base
    /// language.
    pub fn set_locale(&mut self, locale: &Locale) -> MapperResult<()> {
        self.locales.set_current_locale(locale)?;
        Ok(())
    }

    pub fn current_locale(&self) -> &Locale {
        self.locales.current_locale()
    }

    pub fn locales(&self) -> &LocaleFallbackResolver {
        &self.locales
    }

    pub fn context(&self, class: &str) -> Option<&StrategyContext> {
        self.classes.get(class).map(|m| &m.context)
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    pub fn registry(&self) -> &InMemoryIdRegistry {
        &self.registry
    }

    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    /// Batch converter for moving a class between translation layouts.
    pub fn converter(&self) -> TranslationConverter<'_, S> {
        TranslationConverter::new(self)
    }

    // ---- Document operations ----

    /// Store a new document and return its path.
    pub fn persist<D: Mapped>(
        &self,
        doc: &mut D,
        parent_hint: Option<&ParentRef>,
    ) -> MapperResult<String> {
        let key = doc.key();
        if let Some(path) = self.registry.resolved_path_of(key) {
            return Err(MapperError::AlreadyPersisted {
                key: key.to_string(),
                path,
            });
        }
        let mapping = self.mapping(doc.class_name())?;
        let ctx = &mapping.context;

        self.fire(ctx, LifecycleEvent::PrePersist, &mut *doc, Occurrence {
            key,
            path: None,
            locale: None,
        })?;

        let path = {
            let env = IdEnv::new(&self.registry, &self.session);
            mapping.generator.resolve(&*doc, ctx, parent_hint, &env)?
        };
        validate_path(&path)?;
        let locale = if ctx.is_translated() {
            Some(self.bound_locale(ctx, &*doc)?)
        } else {
            None
        };
        let parent_path = parent_of(&path).ok_or_else(|| {
            MapperError::Config(format!("class {} resolved to the root path", ctx.class_name))
        })?;
        let node = self.session.node(parent_path)?.add_child(name_of(&path))?;
        let previous_id = ctx.identifier_field.as_ref().map(|field| doc.get(field));
        if let Err(e) = self.fill_new_node(mapping, doc, &node, &path, locale.as_ref()) {
            // Undo the half-written node so a corrected retry can create it.
            if let Err(cleanup) = node.remove() {
                warn!(path = %path, error = %cleanup, "cannot remove partially persisted node");
            }
            if let (Some(field), Some(value)) = (&ctx.identifier_field, previous_id) {
                doc.set(field, value);
            }
            return Err(e);
        }
        self.registry.register(key, path.as_str());

        self.fire(ctx, LifecycleEvent::PostPersist, &mut *doc, Occurrence::at(key, &path))?;
        debug!(class = %ctx.class_name, document = %key, path = %path, "document persisted");
        Ok(path)
    }

    /// Write a persisted document's current field values back to its node.
    ///
    /// Translatable fields go to the document's bound locale.
    pub fn update<D: Mapped>(&self, doc: &mut D) -> MapperResult<()> {
        let key = doc.key();
        let path = self.path_of(&*doc)?;
        let mapping = self.mapping(doc.class_name())?;
        let ctx = &mapping.context;
        let node = self.session.node(&path)?;

        self.fire(ctx, LifecycleEvent::PreUpdate, &mut *doc, Occurrence::at(key, &path))?;
        self.write_plain_fields(mapping, &*doc, &node)?;
        if ctx.is_translated() {
            let locale = self.bound_locale(ctx, &*doc)?;
            self.write_translation(mapping, doc, &node, &locale, true)?;
        } else {
            self.write_untranslated(mapping, &*doc, &node)?;
        }
        self.fire(ctx, LifecycleEvent::PostUpdate, &mut *doc, Occurrence::at(key, &path))?;
        Ok(())
    }

    /// Load the document stored at `path`, translated into the current
    /// locale or the first available fallback.
    ///
    /// A [`Document`] has no callback methods, so classes declaring
    /// `postLoad` or `postLoadTranslation` callbacks are loaded into their
    /// host type with [`load_into`](Self::load_into).
    pub fn load(&self, path: &str) -> MapperResult<Document> {
        let node = self.mapped_node(path)?;
        let class = stored_class(&node, path)?;
        let mapping = self.mapping(&class)?;
        let ctx = &mapping.context;
        for event in [LifecycleEvent::PostLoad, LifecycleEvent::PostLoadTranslation] {
            if !ctx.callbacks_for(event.as_str()).is_empty() {
                return Err(MapperError::Config(format!(
                    "class {class} declares {event} callbacks; load it into its host type"
                )));
            }
        }

        let key = self
            .registry
            .key_for_path(path)
            .unwrap_or_else(DocumentKey::generate);
        let mut doc = Document::with_key(key, class.as_str());
        self.fill_loaded(mapping, &mut doc, &node, path)?;
        Ok(doc)
    }

    /// Load the document stored at `path` into `doc`, an object of the
    /// stored class. `doc`'s key becomes the one registered for `path`.
    pub fn load_into<D: Mapped>(&self, path: &str, doc: &mut D) -> MapperResult<()> {
        let node = self.mapped_node(path)?;
        let class = stored_class(&node, path)?;
        if class != doc.class_name() {
            return Err(MapperError::Config(format!(
                "{path} holds a {class}, not a {}",
                doc.class_name()
            )));
        }
        let mapping = self.mapping(&class)?;
        self.fill_loaded(mapping, doc, &node, path)
    }

    /// Load translatable fields into `doc`.
    ///
    /// Tries `locale` (the current locale if `None`) and then, if `fallback`,
    /// the rest of its fallback order. Returns the locale actually loaded.
    pub fn find_translation<D: Mapped>(
        &self,
        doc: &mut D,
        locale: Option<&Locale>,
        fallback: bool,
    ) -> MapperResult<Locale> {
        let path = self.path_of(&*doc)?;
        let mapping = self.translated_mapping(doc.class_name(), "find_translation")?;
        let node = self.session.node(&path)?;
        self.load_translation(mapping, doc, &node, &path, locale, fallback)
    }

    /// Store `doc`'s translatable field values as its `locale` translation.
    pub fn bind_translation<D: Mapped>(&self, doc: &mut D, locale: &Locale) -> MapperResult<()> {
        let path = self.path_of(&*doc)?;
        let mapping = self.translated_mapping(doc.class_name(), "bind_translation")?;
        if !self.locales.is_configured(locale) {
            return Err(LocaleError::missing(locale).into());
        }
        let node = self.session.node(&path)?;
        self.write_translation(mapping, doc, &node, locale, true)
    }

    /// Delete one translation of `doc`.
    pub fn remove_translation<D: Mapped>(&self, doc: &mut D, locale: &Locale) -> MapperResult<()> {
        let key = doc.key();
        let path = self.path_of(&*doc)?;
        let mapping = self.translated_mapping(doc.class_name(), "remove_translation")?;
        let ctx = &mapping.context;
        let node = self.session.node(&path)?;

        self.fire(
            ctx,
            LifecycleEvent::PreRemoveTranslation,
            &mut *doc,
            Occurrence::at(key, &path).in_locale(locale),
        )?;
        mapping.translation.remove_one(&*doc, &node, ctx, locale)?;
        self.fire(
            ctx,
            LifecycleEvent::PostRemoveTranslation,
            &mut *doc,
            Occurrence::at(key, &path).in_locale(locale),
        )?;
        Ok(())
    }

    /// Locales `doc` has translations for, sorted.
    pub fn locales_for<D: Mapped>(&self, doc: &D) -> MapperResult<Vec<Locale>> {
        let path = self.path_of(doc)?;
        let mapping = self.translated_mapping(doc.class_name(), "locales_for")?;
        let node = self.session.node(&path)?;
        Ok(mapping
            .translation
            .locales_present(doc, &node, &mapping.context)?)
    }

    /// Delete `doc`'s node and everything below it.
    pub fn remove<D: Mapped>(&self, doc: &mut D) -> MapperResult<()> {
        let key = doc.key();
        let path = self.path_of(&*doc)?;
        let mapping = self.mapping(doc.class_name())?;
        let ctx = &mapping.context;
        let node = self.session.node(&path)?;

        self.fire(ctx, LifecycleEvent::PreRemove, &mut *doc, Occurrence::at(key, &path))?;
        node.remove()?;
        let dropped = self.registry.unregister_subtree(&path);
        self.fire(ctx, LifecycleEvent::PostRemove, &mut *doc, Occurrence::at(key, &path))?;
        debug!(document = %key, path = %path, dropped, "document removed");
        Ok(())
    }

    /// Path `doc` was persisted or loaded at.
    pub fn path_of(&self, doc: &dyn FieldAccessor) -> MapperResult<String> {
        let key = doc.key();
        self.registry
            .resolved_path_of(key)
            .ok_or_else(|| MapperError::DocumentNotFound(key.to_string()))
    }

    // ---- internals ----

    pub(crate) fn mapping(&self, class: &str) -> MapperResult<&ClassMapping> {
        self.classes
            .get(class)
            .ok_or_else(|| MapperError::UnknownClass(class.to_string()))
    }

    fn translated_mapping(&self, class: &str, operation: &'static str) -> MapperResult<&ClassMapping> {
        let mapping = self.mapping(class)?;
        if !mapping.context.is_translated() {
            return Err(TranslationError::illegal(operation).into());
        }
        Ok(mapping)
    }

    pub(crate) fn codec(&self) -> Arc<dyn PropertyCodec> {
        Arc::clone(&self.codec)
    }

    fn mapped_node(&self, path: &str) -> MapperResult<S::Node> {
        self.session.node(path).map_err(|e| match e {
            NodeError::PathNotFound(p) => MapperError::DocumentNotFound(p),
            other => other.into(),
        })
    }

    /// Fill `doc` from its node, register it at `path`, fire `postLoad`.
    ///
    /// Nothing is registered when the fields cannot be loaded.
    fn fill_loaded<D: Mapped, N: NodeHandle>(
        &self,
        mapping: &ClassMapping,
        doc: &mut D,
        node: &N,
        path: &str,
    ) -> MapperResult<()> {
        let ctx = &mapping.context;
        let key = doc.key();
        if let Some(field) = &ctx.identifier_field {
            doc.set(field, Value::from(path));
        }
        if let Some(field) = &ctx.node_name_field {
            doc.set(field, Value::from(name_of(path)));
        }
        if let (Some(field), Some(parent)) = (&ctx.parent_field, parent_of(path)) {
            let parent_ref = match self.registry.key_for_path(parent) {
                Some(parent_key) => Value::Reference(parent_key),
                None => Value::from(parent),
            };
            doc.set(field, parent_ref);
        }
        for m in ctx.untranslated_mappings() {
            if let Some(value) = read_plain_field(node, m, self.codec.as_ref())? {
                doc.set(&m.field, value);
            }
        }

        if ctx.is_translated() {
            self.load_translation(mapping, doc, node, path, None, true)?;
        } else if let TranslationStrategy::NonTranslated(plain) = &mapping.translation {
            for (field, value) in plain.read_fields(node, ctx, &ctx.translatable_fields)? {
                doc.set(&field, value);
            }
        }
        self.registry.register(key, path);

        self.fire(ctx, LifecycleEvent::PostLoad, &mut *doc, Occurrence::at(key, path))
    }

    fn load_translation<D: Mapped, N: NodeHandle>(
        &self,
        mapping: &ClassMapping,
        doc: &mut D,
        node: &N,
        path: &str,
        locale: Option<&Locale>,
        fallback: bool,
    ) -> MapperResult<Locale> {
        let ctx = &mapping.context;
        let key = doc.key();
        let requested = locale
            .cloned()
            .unwrap_or_else(|| self.locales.current_locale().clone());
        let mut candidates = vec![requested.clone()];
        if fallback {
            for candidate in self.locales.fallback_order(Some(&requested))? {
                if !candidates.contains(&candidate) {
                    candidates.push(candidate);
                }
            }
        }

        for candidate in candidates {
            if !mapping.translation.load(&mut *doc, node, ctx, &candidate)? {
                continue;
            }
            if let Some(field) = &ctx.locale_field {
                doc.set(field, Value::from(candidate.as_str()));
            }
            if candidate != requested {
                debug!(document = %key, %requested, loaded = %candidate, "translation fell back");
            }
            self.fire(
                ctx,
                LifecycleEvent::PostLoadTranslation,
                &mut *doc,
                Occurrence::at(key, path).in_locale(&candidate),
            )?;
            return Ok(candidate);
        }
        Err(LocaleError::missing(&requested).into())
    }

    /// The locale `doc` is bound to: its locale field if set, otherwise the
    /// session locale.
    fn bound_locale(&self, ctx: &StrategyContext, doc: &dyn FieldAccessor) -> MapperResult<Locale> {
        let bound = ctx
            .locale_field
            .as_deref()
            .map(|field| doc.get(field))
            .and_then(|v| v.as_str().filter(|s| !s.is_empty()).map(Locale::parse));
        let locale = match bound {
            Some(parsed) => parsed?,
            None => self.locales.current_locale().clone(),
        };
        if !self.locales.is_configured(&locale) {
            return Err(LocaleError::missing(&locale).into());
        }
        Ok(locale)
    }

    /// Write everything a freshly created node holds.
    fn fill_new_node<D: Mapped, N: NodeHandle>(
        &self,
        mapping: &ClassMapping,
        doc: &mut D,
        node: &N,
        path: &str,
        locale: Option<&Locale>,
    ) -> MapperResult<()> {
        let ctx = &mapping.context;
        node.set_property(CLASS_PROPERTY, Value::from(ctx.class_name.as_str()))?;
        if let Some(field) = &ctx.identifier_field {
            doc.set(field, Value::from(path));
        }
        self.write_plain_fields(mapping, &*doc, node)?;
        match locale {
            Some(locale) => self.write_translation(mapping, doc, node, locale, false),
            None => self.write_untranslated(mapping, &*doc, node),
        }
    }

    fn write_plain_fields<N: NodeHandle>(
        &self,
        mapping: &ClassMapping,
        doc: &dyn FieldAccessor,
        node: &N,
    ) -> MapperResult<()> {
        for m in mapping.context.untranslated_mappings() {
            write_plain_field(node, m, &doc.get(&m.field), self.codec.as_ref())?;
        }
        Ok(())
    }

    /// Translatable fields of a class without a translation layer.
    fn write_untranslated<N: NodeHandle>(
        &self,
        mapping: &ClassMapping,
        doc: &dyn FieldAccessor,
        node: &N,
    ) -> MapperResult<()> {
        let ctx = &mapping.context;
        if ctx.translatable_fields.is_empty() {
            return Ok(());
        }
        let values = translatable_values(ctx, doc);
        mapping
            .translation
            .save(&values, node, ctx, self.locales.default_locale())?;
        Ok(())
    }

    fn write_translation<D: Mapped, N: NodeHandle>(
        &self,
        mapping: &ClassMapping,
        doc: &mut D,
        node: &N,
        locale: &Locale,
        may_exist: bool,
    ) -> MapperResult<()> {
        let ctx = &mapping.context;
        let key = doc.key();
        let exists = may_exist
            && mapping
                .translation
                .locales_present(&*doc, node, ctx)?
                .contains(locale);
        let event = if exists {
            LifecycleEvent::PreUpdateTranslation
        } else {
            LifecycleEvent::PreCreateTranslation
        };
        self.fire(ctx, event, &mut *doc, Occurrence::at(key, node.path()).in_locale(locale))?;

        let values = translatable_values(ctx, &*doc);
        mapping.translation.save(&values, node, ctx, locale)?;
        if let Some(field) = &ctx.locale_field {
            doc.set(field, Value::from(locale.as_str()));
        }
        Ok(())
    }

    /// Deliver `event` on whichever channels have subscribers.
    fn fire(
        &self,
        ctx: &StrategyContext,
        event: LifecycleEvent,
        object: &mut dyn CallbackTarget,
        at: Occurrence<'_>,
    ) -> MapperResult<()> {
        let channels = self.dispatcher.subscribed_channels(ctx, event);
        if channels.is_empty() {
            return Ok(());
        }
        let mut args = LifecycleEventArgs::new(event, at.key, ctx.class_name.as_str());
        args.path = at.path.map(str::to_string);
        args.locale = at.locale.cloned();
        self.dispatcher.invoke(ctx, event, object, &args, channels)?;
        Ok(())
    }
}

impl<S: NodeSession> std::fmt::Debug for DocumentMapper<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentMapper")
            .field("classes", &self.classes.len())
            .field("registered", &self.registry.len())
            .field("locale", self.locales.current_locale())
            .finish_non_exhaustive()
    }
}

/// Class a mapped node was stored as.
fn stored_class<N: NodeHandle>(node: &N, path: &str) -> MapperResult<String> {
    node.property(CLASS_PROPERTY)?
        .and_then(|v| v.as_str().map(str::to_string))
        .ok_or_else(|| MapperError::DocumentNotFound(format!("{path} is not a mapped node")))
}

/// Current values of a class's translatable fields.
pub(crate) fn translatable_values(
    ctx: &StrategyContext,
    doc: &dyn FieldAccessor,
) -> BTreeMap<String, Value> {
    ctx.translatable_fields
        .iter()
        .map(|field| (field.clone(), doc.get(field)))
        .collect()
}

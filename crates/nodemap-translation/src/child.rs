//! Per-locale child nodes under the document node.

use std::collections::BTreeMap;
use std::sync::Arc;

use nodemap_node::NodeHandle;
use nodemap_types::{FieldAccessor, Locale, StrategyContext, Value};
use tracing::debug;

use crate::attribute::AttributeStrategy;
use crate::codec::PropertyCodec;
use crate::error::TranslationResult;
use crate::query::{JoinType, QueryFactory, TranslationJoin};

/// Stores a locale's translated fields on a child node named
/// `{prefix}:{locale}`, with the same property names as
/// [`AttributeStrategy`].
#[derive(Clone, Debug)]
pub struct ChildStrategy {
    inner: AttributeStrategy,
}

impl ChildStrategy {
    pub fn new(prefix: &str) -> TranslationResult<Self> {
        Ok(Self {
            inner: AttributeStrategy::new(prefix)?,
        })
    }

    pub fn with_codec(self, codec: Arc<dyn PropertyCodec>) -> Self {
        Self {
            inner: self.inner.with_codec(codec),
        }
    }

    pub fn prefix(&self) -> &str {
        self.inner.prefix()
    }

    /// Name of the child node holding `locale`.
    pub fn child_name(&self, locale: &Locale) -> String {
        format!("{}:{}", self.inner.prefix(), locale)
    }

    fn locale_child<N: NodeHandle>(&self, node: &N, locale: &Locale) -> TranslationResult<Option<N>> {
        let name = self.child_name(locale);
        if node.has_child(&name)? {
            Ok(Some(node.child(&name)?))
        } else {
            Ok(None)
        }
    }

    pub fn save<N: NodeHandle>(
        &self,
        fields: &BTreeMap<String, Value>,
        node: &N,
        context: &StrategyContext,
        locale: &Locale,
    ) -> TranslationResult<()> {
        let child = match self.locale_child(node, locale)? {
            Some(child) => child,
            None => node.add_child(&self.child_name(locale))?,
        };
        self.inner.write_translation(fields, &child, context, locale)?;
        debug!(class = %context.class_name, path = child.path(), %locale, "child translation saved");
        Ok(())
    }

    pub fn load<N: NodeHandle>(
        &self,
        object: &mut dyn FieldAccessor,
        node: &N,
        context: &StrategyContext,
        locale: &Locale,
    ) -> TranslationResult<bool> {
        let Some(child) = self.locale_child(node, locale)? else {
            return Ok(false);
        };
        let Some(values) = self.inner.read_translation(&child, context, locale)? else {
            return Ok(false);
        };
        for (field, value) in values {
            object.set(&field, value);
        }
        Ok(true)
    }

    pub fn remove_one<N: NodeHandle>(
        &self,
        _object: &dyn FieldAccessor,
        node: &N,
        context: &StrategyContext,
        locale: &Locale,
    ) -> TranslationResult<()> {
        if let Some(child) = self.locale_child(node, locale)? {
            child.remove()?;
            debug!(class = %context.class_name, path = node.path(), %locale, "child translation removed");
        }
        Ok(())
    }

    pub fn remove_all<N: NodeHandle>(
        &self,
        object: &dyn FieldAccessor,
        node: &N,
        context: &StrategyContext,
    ) -> TranslationResult<()> {
        for locale in self.locales_present(object, node, context)? {
            self.remove_one(object, node, context, &locale)?;
        }
        Ok(())
    }

    /// Locales of the `{prefix}:` children, sorted.
    pub fn locales_present<N: NodeHandle>(
        &self,
        _object: &dyn FieldAccessor,
        node: &N,
        _context: &StrategyContext,
    ) -> TranslationResult<Vec<Locale>> {
        let prefix = format!("{}:", self.inner.prefix());
        let mut locales: Vec<Locale> = node
            .child_names_with_prefix(&prefix)?
            .iter()
            .filter_map(|name| name.strip_prefix(&prefix))
            .filter(|code| !code.is_empty())
            .map(Locale::new)
            .collect();
        locales.sort();
        Ok(locales)
    }

    /// Selector and property to filter on. The selector is the locale child
    /// joined in by [`Self::alter_query_for_translation`].
    pub fn translated_property_path(
        &self,
        alias: &str,
        property: &str,
        locale: &Locale,
    ) -> (String, String) {
        (
            child_alias(alias),
            self.inner.translated_property_name(locale, property),
        )
    }

    /// Describe the join of selector `alias` with its `locale` child.
    pub fn translation_join(&self, alias: &str, locale: &Locale) -> TranslationJoin {
        TranslationJoin {
            join_type: JoinType::RightOuter,
            parent_selector: alias.to_string(),
            child_selector: child_alias(alias),
            child_node_type: None,
            child_node_name: self.child_name(locale),
        }
    }

    /// Join `source` with a selector over the locale child of `alias`.
    pub fn alter_query_for_translation<Q: QueryFactory>(
        &self,
        factory: &Q,
        source: Q::Source,
        alias: &str,
        locale: &Locale,
    ) -> Q::Source {
        let join = self.translation_join(alias, locale);
        let child = factory.selector(join.child_node_type.as_deref(), &join.child_selector);
        factory.join(source, child, &join)
    }
}

fn child_alias(alias: &str) -> String {
    format!("{alias}_translation")
}

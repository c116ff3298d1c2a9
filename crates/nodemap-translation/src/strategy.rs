use std::collections::BTreeMap;
use std::sync::Arc;

use nodemap_node::NodeHandle;
use nodemap_types::{FieldAccessor, Locale, StrategyContext, TranslatorKind, Value};

use crate::attribute::AttributeStrategy;
use crate::child::ChildStrategy;
use crate::codec::PropertyCodec;
use crate::error::{TranslationError, TranslationResult};
use crate::non_translated::NonTranslatedStrategy;

/// One of the three storage layouts for translatable fields.
#[derive(Clone, Debug)]
pub enum TranslationStrategy {
    Attribute(AttributeStrategy),
    Child(ChildStrategy),
    NonTranslated(NonTranslatedStrategy),
}

impl TranslationStrategy {
    /// Build the strategy for `kind` under `prefix`.
    pub fn for_kind(kind: TranslatorKind, prefix: &str) -> TranslationResult<Self> {
        Ok(match kind {
            TranslatorKind::Attribute => Self::Attribute(AttributeStrategy::new(prefix)?),
            TranslatorKind::Child => Self::Child(ChildStrategy::new(prefix)?),
            TranslatorKind::NonTranslated => Self::NonTranslated(NonTranslatedStrategy::new()),
        })
    }

    pub fn with_codec(self, codec: Arc<dyn PropertyCodec>) -> Self {
        match self {
            Self::Attribute(s) => Self::Attribute(s.with_codec(codec)),
            Self::Child(s) => Self::Child(s.with_codec(codec)),
            Self::NonTranslated(s) => Self::NonTranslated(s.with_codec(codec)),
        }
    }

    pub fn kind(&self) -> TranslatorKind {
        match self {
            Self::Attribute(_) => TranslatorKind::Attribute,
            Self::Child(_) => TranslatorKind::Child,
            Self::NonTranslated(_) => TranslatorKind::NonTranslated,
        }
    }

    /// Returns `true` unless this is the untranslated layout.
    pub fn is_translated(&self) -> bool {
        !matches!(self, Self::NonTranslated(_))
    }

    pub fn save<N: NodeHandle>(
        &self,
        fields: &BTreeMap<String, Value>,
        node: &N,
        context: &StrategyContext,
        locale: &Locale,
    ) -> TranslationResult<()> {
        match self {
            Self::Attribute(s) => s.save(fields, node, context, locale),
            Self::Child(s) => s.save(fields, node, context, locale),
            Self::NonTranslated(s) => s.save(fields, node, context, locale),
        }
    }

    pub fn load<N: NodeHandle>(
        &self,
        object: &mut dyn FieldAccessor,
        node: &N,
        context: &StrategyContext,
        locale: &Locale,
    ) -> TranslationResult<bool> {
        match self {
            Self::Attribute(s) => s.load(object, node, context, locale),
            Self::Child(s) => s.load(object, node, context, locale),
            Self::NonTranslated(s) => s.load(object, node, context, locale),
        }
    }

    pub fn remove_one<N: NodeHandle>(
        &self,
        object: &dyn FieldAccessor,
        node: &N,
        context: &StrategyContext,
        locale: &Locale,
    ) -> TranslationResult<()> {
        match self {
            Self::Attribute(s) => s.remove_one(object, node, context, locale),
            Self::Child(s) => s.remove_one(object, node, context, locale),
            Self::NonTranslated(s) => s.remove_one(object, node, context, locale),
        }
    }

    pub fn remove_all<N: NodeHandle>(
        &self,
        object: &dyn FieldAccessor,
        node: &N,
        context: &StrategyContext,
    ) -> TranslationResult<()> {
        match self {
            Self::Attribute(s) => s.remove_all(object, node, context),
            Self::Child(s) => s.remove_all(object, node, context),
            Self::NonTranslated(s) => s.remove_all(object, node, context),
        }
    }

    pub fn locales_present<N: NodeHandle>(
        &self,
        object: &dyn FieldAccessor,
        node: &N,
        context: &StrategyContext,
    ) -> TranslationResult<Vec<Locale>> {
        match self {
            Self::Attribute(s) => s.locales_present(object, node, context),
            Self::Child(s) => s.locales_present(object, node, context),
            Self::NonTranslated(s) => s.locales_present(object, node, context),
        }
    }

    /// Selector alias and property name a query should filter on.
    pub fn translated_property_path(
        &self,
        alias: &str,
        property: &str,
        locale: &Locale,
    ) -> TranslationResult<(String, String)> {
        match self {
            Self::Attribute(s) => Ok(s.translated_property_path(alias, property, locale)),
            Self::Child(s) => Ok(s.translated_property_path(alias, property, locale)),
            Self::NonTranslated(_) => Err(TranslationError::illegal("translated_property_path")),
        }
    }
}

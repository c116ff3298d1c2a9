//! Per-locale properties on the document node.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use nodemap_node::NodeHandle;
use nodemap_types::{FieldAccessor, Locale, StrategyContext, Value};
use regex::Regex;
use tracing::debug;

use crate::codec::{DefaultCodec, PropertyCodec, PropertyNames};
use crate::error::{TranslationError, TranslationResult};

/// Suffix of the per-locale marker property listing explicitly-null fields.
const NULL_FIELDS_SUFFIX: &str = "nullfields";

/// Stores each translated field as `{prefix}:{locale}-{property}` on the
/// node itself.
///
/// A locale whose fields are all null would leave no property behind, so
/// every save also writes `{prefix}:{locale}nullfields` listing the null
/// fields. The marker's presence alone proves the locale exists.
#[derive(Clone)]
pub struct AttributeStrategy {
    prefix: String,
    codec: Arc<dyn PropertyCodec>,
    field_pattern: Regex,
    marker_pattern: Regex,
}

impl AttributeStrategy {
    /// Create a strategy using `prefix` as the property namespace.
    pub fn new(prefix: &str) -> TranslationResult<Self> {
        if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(TranslationError::Configuration(format!(
                "invalid translation prefix {prefix:?}"
            )));
        }
        let escaped = regex::escape(prefix);
        let compile = |pattern: String| {
            Regex::new(&pattern).map_err(|e| TranslationError::Configuration(e.to_string()))
        };
        Ok(Self {
            prefix: prefix.to_string(),
            codec: Arc::new(DefaultCodec),
            field_pattern: compile(format!("^{escaped}:([A-Za-z0-9_]+)-"))?,
            marker_pattern: compile(format!("^{escaped}:([A-Za-z0-9_]+){NULL_FIELDS_SUFFIX}$"))?,
        })
    }

    /// Replace the property codec.
    pub fn with_codec(mut self, codec: Arc<dyn PropertyCodec>) -> Self {
        self.codec = codec;
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// `{prefix}:{locale}-{property}`
    pub fn translated_property_name(&self, locale: &Locale, property: &str) -> String {
        format!("{}:{}-{}", self.prefix, locale, property)
    }

    /// `{prefix}:{locale}nullfields`
    pub fn null_fields_property(&self, locale: &Locale) -> String {
        format!("{}:{}{}", self.prefix, locale, NULL_FIELDS_SUFFIX)
    }

    /// Selector and property a query should filter on for a translated field.
    pub fn translated_property_path(
        &self,
        alias: &str,
        property: &str,
        locale: &Locale,
    ) -> (String, String) {
        (alias.to_string(), self.translated_property_name(locale, property))
    }

    pub fn save<N: NodeHandle>(
        &self,
        fields: &BTreeMap<String, Value>,
        node: &N,
        context: &StrategyContext,
        locale: &Locale,
    ) -> TranslationResult<()> {
        self.write_translation(fields, node, context, locale)?;
        debug!(class = %context.class_name, path = node.path(), %locale, "attribute translation saved");
        Ok(())
    }

    /// Returns `false`, leaving `object` untouched, when `locale` has no data.
    pub fn load<N: NodeHandle>(
        &self,
        object: &mut dyn FieldAccessor,
        node: &N,
        context: &StrategyContext,
        locale: &Locale,
    ) -> TranslationResult<bool> {
        let Some(values) = self.read_translation(node, context, locale)? else {
            return Ok(false);
        };
        for (field, value) in values {
            object.set(&field, value);
        }
        debug!(class = %context.class_name, path = node.path(), %locale, "attribute translation loaded");
        Ok(true)
    }

    pub fn remove_one<N: NodeHandle>(
        &self,
        _object: &dyn FieldAccessor,
        node: &N,
        context: &StrategyContext,
        locale: &Locale,
    ) -> TranslationResult<()> {
        self.clear_translation(node, context, locale)?;
        debug!(class = %context.class_name, path = node.path(), %locale, "attribute translation removed");
        Ok(())
    }

    pub fn remove_all<N: NodeHandle>(
        &self,
        object: &dyn FieldAccessor,
        node: &N,
        context: &StrategyContext,
    ) -> TranslationResult<()> {
        for locale in self.locales_present(object, node, context)? {
            self.clear_translation(node, context, &locale)?;
        }
        Ok(())
    }

    /// Distinct locales found among the node's prefixed properties, sorted.
    pub fn locales_present<N: NodeHandle>(
        &self,
        _object: &dyn FieldAccessor,
        node: &N,
        _context: &StrategyContext,
    ) -> TranslationResult<Vec<Locale>> {
        let names = node.property_names_with_prefix(&format!("{}:", self.prefix))?;
        let locales: BTreeSet<Locale> = names
            .iter()
            .filter_map(|name| {
                self.field_pattern
                    .captures(name)
                    .or_else(|| self.marker_pattern.captures(name))
                    .and_then(|caps| caps.get(1))
                    .map(|m| Locale::new(m.as_str()))
            })
            .collect();
        Ok(locales.into_iter().collect())
    }

    // -----------------------------------------------------------------------
    // Layout primitives, shared with the child-node layout
    // -----------------------------------------------------------------------

    fn names(&self, context: &StrategyContext, locale: &Locale) -> Vec<(String, PropertyNames)> {
        context
            .translated_mappings()
            .map(|m| {
                let names = PropertyNames::renamed(m, |p| self.translated_property_name(locale, p));
                (m.field.clone(), names)
            })
            .collect()
    }

    pub(crate) fn write_translation<N: NodeHandle>(
        &self,
        fields: &BTreeMap<String, Value>,
        node: &N,
        context: &StrategyContext,
        locale: &Locale,
    ) -> TranslationResult<()> {
        let mut null_fields = Vec::new();
        for mapping in context.translated_mappings() {
            let names =
                PropertyNames::renamed(mapping, |p| self.translated_property_name(locale, p));
            let value = fields.get(&mapping.field).cloned().unwrap_or_default();
            if value.is_null() {
                null_fields.push(Value::String(mapping.field.clone()));
                names.clear(node)?;
            } else {
                let encoded = self.codec.encode(mapping, &value)?;
                names.write(node, encoded)?;
            }
        }
        node.set_property(&self.null_fields_property(locale), Value::List(null_fields))?;
        Ok(())
    }

    /// Field values stored for `locale`, or `None` if the locale is absent.
    ///
    /// Fields without stored data read as null.
    pub(crate) fn read_translation<N: NodeHandle>(
        &self,
        node: &N,
        context: &StrategyContext,
        locale: &Locale,
    ) -> TranslationResult<Option<BTreeMap<String, Value>>> {
        let mut found = node.has_property(&self.null_fields_property(locale))?;
        let mut values = BTreeMap::new();
        for mapping in context.translated_mappings() {
            let names =
                PropertyNames::renamed(mapping, |p| self.translated_property_name(locale, p));
            let value = match names.read(node)? {
                Some(encoded) => {
                    found = true;
                    self.codec.decode(mapping, encoded)?
                }
                None => Value::Null,
            };
            values.insert(mapping.field.clone(), value);
        }
        Ok(found.then_some(values))
    }

    pub(crate) fn clear_translation<N: NodeHandle>(
        &self,
        node: &N,
        context: &StrategyContext,
        locale: &Locale,
    ) -> TranslationResult<()> {
        for (_, names) in self.names(context, locale) {
            names.clear(node)?;
        }
        node.set_property(&self.null_fields_property(locale), Value::Null)?;
        Ok(())
    }
}

impl fmt::Debug for AttributeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeStrategy")
            .field("prefix", &self.prefix)
            .finish()
    }
}

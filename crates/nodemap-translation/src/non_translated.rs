use std::collections::BTreeMap;
use std::sync::Arc;

use nodemap_node::NodeHandle;
use nodemap_types::{FieldAccessor, FieldMapping, Locale, StrategyContext, Value};
use tracing::debug;

use crate::codec::{read_plain_field, write_plain_field, DefaultCodec, PropertyCodec};
use crate::error::{TranslationError, TranslationResult};

/// The "no translation" layout: fields live under their plain property names.
///
/// Only [`save`](Self::save) and [`remove_all`](Self::remove_all) are
/// meaningful. The locale-addressed operations fail with
/// [`TranslationError::IllegalTranslationOperation`].
#[derive(Clone)]
pub struct NonTranslatedStrategy {
    codec: Arc<dyn PropertyCodec>,
}

impl NonTranslatedStrategy {
    pub fn new() -> Self {
        Self {
            codec: Arc::new(DefaultCodec),
        }
    }

    pub fn with_codec(mut self, codec: Arc<dyn PropertyCodec>) -> Self {
        self.codec = codec;
        self
    }

    /// Write `fields` under their plain property names. The locale is
    /// ignored.
    pub fn save<N: NodeHandle>(
        &self,
        fields: &BTreeMap<String, Value>,
        node: &N,
        context: &StrategyContext,
        _locale: &Locale,
    ) -> TranslationResult<()> {
        for (field, value) in fields {
            let fallback;
            let mapping = match context.field_mapping(field) {
                Some(m) => m,
                None => {
                    fallback = FieldMapping::new(field.as_str());
                    &fallback
                }
            };
            write_plain_field(node, mapping, value, self.codec.as_ref())?;
        }
        debug!(class = %context.class_name, path = node.path(), count = fields.len(), "plain fields saved");
        Ok(())
    }

    pub fn load<N: NodeHandle>(
        &self,
        _object: &mut dyn FieldAccessor,
        _node: &N,
        _context: &StrategyContext,
        _locale: &Locale,
    ) -> TranslationResult<bool> {
        Err(TranslationError::illegal("load"))
    }

    pub fn remove_one<N: NodeHandle>(
        &self,
        _object: &dyn FieldAccessor,
        _node: &N,
        _context: &StrategyContext,
        _locale: &Locale,
    ) -> TranslationResult<()> {
        Err(TranslationError::illegal("remove_one"))
    }

    /// Clear the plain properties of the context's translatable fields.
    pub fn remove_all<N: NodeHandle>(
        &self,
        _object: &dyn FieldAccessor,
        node: &N,
        context: &StrategyContext,
    ) -> TranslationResult<()> {
        for mapping in context.translated_mappings() {
            write_plain_field(node, mapping, &Value::Null, self.codec.as_ref())?;
        }
        Ok(())
    }

    pub fn locales_present<N: NodeHandle>(
        &self,
        _object: &dyn FieldAccessor,
        _node: &N,
        _context: &StrategyContext,
    ) -> TranslationResult<Vec<Locale>> {
        Err(TranslationError::illegal("locales_present"))
    }

    /// Plain values of `fields`; fields without a stored value read as null.
    pub fn read_fields<N: NodeHandle>(
        &self,
        node: &N,
        context: &StrategyContext,
        fields: &[String],
    ) -> TranslationResult<BTreeMap<String, Value>> {
        let mut values = BTreeMap::new();
        for field in fields {
            let fallback;
            let mapping = match context.field_mapping(field) {
                Some(m) => m,
                None => {
                    fallback = FieldMapping::new(field.as_str());
                    &fallback
                }
            };
            let value = read_plain_field(node, mapping, self.codec.as_ref())?.unwrap_or_default();
            values.insert(field.clone(), value);
        }
        Ok(values)
    }
}

impl Default for NonTranslatedStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for NonTranslatedStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("NonTranslatedStrategy")
    }
}

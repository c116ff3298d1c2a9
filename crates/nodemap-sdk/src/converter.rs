use std::collections::BTreeMap;

use nodemap_node::{NodeHandle, NodeSession};
use nodemap_translation::TranslationStrategy;
use nodemap_types::{Document, Locale, StrategyContext, TranslatorKind, Value};
use tracing::{debug, warn};

use crate::error::{MapperError, MapperResult};
use crate::mapper::{translatable_values, DocumentMapper, CLASS_PROPERTY};

/// Moves a class's translatable fields from a previous layout to the one it
/// is registered with now, a bounded batch at a time.
///
/// ```ignore
/// while mapper.converter().convert("Article", TranslatorKind::Attribute, &[])? {}
/// ```
pub struct TranslationConverter<'a, S: NodeSession> {
    mapper: &'a DocumentMapper<S>,
}

impl<'a, S: NodeSession> TranslationConverter<'a, S> {
    pub(crate) fn new(mapper: &'a DocumentMapper<S>) -> Self {
        Self { mapper }
    }

    /// Convert up to `conversion_batch_size` documents of `class` whose data
    /// is still stored under `previous`.
    ///
    /// `locales` names the locales plain values are copied into when
    /// `previous` is the untranslated layout; empty means the default
    /// locale only. Returns `true` if unconverted documents remain.
    pub fn convert(
        &self,
        class: &str,
        previous: TranslatorKind,
        locales: &[Locale],
    ) -> MapperResult<bool> {
        let mapping = self.mapper.mapping(class)?;
        let target_ctx = &mapping.context;
        let target = &mapping.translation;
        if target.kind() == previous {
            return Err(MapperError::Config(format!(
                "class {class} already uses {previous:?} translation"
            )));
        }
        if target_ctx.translatable_fields.is_empty() {
            return Err(MapperError::Config(format!(
                "class {class} has no translatable fields"
            )));
        }

        let mut source_ctx = target_ctx.clone();
        source_ctx.translator = Some(previous);
        let source =
            TranslationStrategy::for_kind(previous, &self.mapper.config().translation_prefix)?
                .with_codec(self.mapper.codec());

        let mut pending = Vec::new();
        for node in self
            .mapper
            .session()
            .nodes_with_property(CLASS_PROPERTY, &Value::from(class))?
        {
            if self.has_source_data(&source, &node, &source_ctx)? {
                pending.push(node);
            }
        }

        let batch = self.mapper.config().conversion_batch_size;
        for node in pending.iter().take(batch) {
            // Layouts never share property or child names, so the target is
            // written before the source is cleared.
            let translations = self.read_source(&source, node, &source_ctx, locales)?;
            self.write_target(target, node, target_ctx, translations)?;
            source.remove_all(&class_stub(class), node, &source_ctx)?;
        }
        let remaining = pending.len().saturating_sub(batch);
        debug!(
            class,
            from = ?previous,
            to = ?target.kind(),
            converted = pending.len() - remaining,
            remaining,
            "translation batch converted"
        );
        Ok(remaining > 0)
    }

    fn has_source_data<N: NodeHandle>(
        &self,
        source: &TranslationStrategy,
        node: &N,
        ctx: &StrategyContext,
    ) -> MapperResult<bool> {
        Ok(match source {
            TranslationStrategy::NonTranslated(plain) => plain
                .read_fields(node, ctx, &ctx.translatable_fields)?
                .values()
                .any(|v| !v.is_null()),
            translated => !translated
                .locales_present(&class_stub(&ctx.class_name), node, ctx)?
                .is_empty(),
        })
    }

    /// Field values per locale under the source layout.
    fn read_source<N: NodeHandle>(
        &self,
        source: &TranslationStrategy,
        node: &N,
        ctx: &StrategyContext,
        locales: &[Locale],
    ) -> MapperResult<Vec<(Locale, BTreeMap<String, Value>)>> {
        if let TranslationStrategy::NonTranslated(plain) = source {
            let values = plain.read_fields(node, ctx, &ctx.translatable_fields)?;
            let targets = if locales.is_empty() {
                vec![self.mapper.locales().default_locale().clone()]
            } else {
                locales.to_vec()
            };
            return Ok(targets.into_iter().map(|l| (l, values.clone())).collect());
        }

        let mut out = Vec::new();
        for locale in source.locales_present(&class_stub(&ctx.class_name), node, ctx)? {
            let mut doc = class_stub(&ctx.class_name);
            if source.load(&mut doc, node, ctx, &locale)? {
                out.push((locale, translatable_values(ctx, &doc)));
            }
        }
        Ok(out)
    }

    fn write_target<N: NodeHandle>(
        &self,
        target: &TranslationStrategy,
        node: &N,
        ctx: &StrategyContext,
        translations: Vec<(Locale, BTreeMap<String, Value>)>,
    ) -> MapperResult<()> {
        if target.is_translated() {
            for (locale, values) in &translations {
                target.save(values, node, ctx, locale)?;
            }
            return Ok(());
        }

        // Plain properties hold one value per field: keep the first locale
        // of the default order that has data.
        let order = self.mapper.locales().default_order();
        let chosen = order
            .iter()
            .find_map(|l| translations.iter().find(|(have, _)| have == l))
            .or_else(|| translations.first());
        let Some((locale, values)) = chosen else {
            return Ok(());
        };
        if locale != self.mapper.locales().default_locale() {
            warn!(
                path = node.path(),
                locale = %locale,
                "no default-locale translation; untranslated values taken from another locale"
            );
        }
        target.save(values, node, ctx, locale)?;
        Ok(())
    }
}

/// Stand-in object for strategy calls that only need the class.
fn class_stub(class: &str) -> Document {
    Document::new(class)
}

impl<S: NodeSession> std::fmt::Debug for TranslationConverter<'_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranslationConverter").finish_non_exhaustive()
    }
}

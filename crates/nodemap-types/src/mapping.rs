//! Per-class mapping metadata.
//!
//! A [`StrategyContext`] bundles everything the id and translation strategies
//! need to know about one class: which fields carry the identifier, parent and
//! node name, how ids are generated, how translations are laid out, and how
//! each field maps onto a node property. It is built once at configuration
//! time (from code via [`StrategyContext::builder`] or from TOML) and shared
//! read-only afterwards.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{TypeError, TypeResult};

/// Which id generation strategy a class uses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdGeneratorKind {
    /// The identifier field is the path.
    #[default]
    Assigned,
    /// Parent path plus node-name field.
    Parent,
    /// Parent path plus a synthesized unique name.
    Auto,
    /// A per-class repository callback computes the path.
    Repository,
    /// Parent path plus a slug of a designated field.
    FieldSlugger,
}

/// Which physical layout a class uses for translated fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranslatorKind {
    /// Prefixed per-locale properties on the document node.
    Attribute,
    /// Per-locale child nodes holding prefixed properties.
    Child,
    /// No translation layer: plain properties.
    #[serde(rename = "none")]
    NonTranslated,
}

/// Options consumed by specific id generators.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdGeneratorOptions {
    /// Field whose value the slugging generator turns into the node name.
    #[serde(default)]
    pub slug_field: Option<String>,
    /// Prefix for names synthesized by the auto generator.
    #[serde(default)]
    pub auto_name_prefix: Option<String>,
}

/// Companion properties for an associative multivalue field.
///
/// The values are stored positionally under the field's property; the keys
/// go to `keys_property` and the keys whose value was null to
/// `nulls_property`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssocMapping {
    pub keys_property: String,
    #[serde(default)]
    pub nulls_property: Option<String>,
}

/// How one field maps onto a node property.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    /// Field name on the object.
    pub field: String,
    /// Physical property name on the node.
    pub property: String,
    #[serde(default)]
    pub multivalue: bool,
    #[serde(default)]
    pub translated: bool,
    #[serde(default)]
    pub assoc: Option<AssocMapping>,
}

impl FieldMapping {
    /// A single-valued, untranslated field stored under its own name.
    pub fn new(field: impl Into<String>) -> Self {
        let field = field.into();
        Self {
            property: field.clone(),
            field,
            multivalue: false,
            translated: false,
            assoc: None,
        }
    }

    /// Store under a different property name.
    pub fn property(mut self, property: impl Into<String>) -> Self {
        self.property = property.into();
        self
    }

    /// Mark the field as multivalued.
    pub fn multivalue(mut self) -> Self {
        self.multivalue = true;
        self
    }

    /// Mark the field as translated.
    pub fn translated(mut self) -> Self {
        self.translated = true;
        self
    }

    /// Mark the field as an associative multivalue with companion properties.
    pub fn assoc(mut self, keys_property: impl Into<String>, nulls_property: Option<&str>) -> Self {
        self.multivalue = true;
        self.assoc = Some(AssocMapping {
            keys_property: keys_property.into(),
            nulls_property: nulls_property.map(str::to_string),
        });
        self
    }
}

/// Per-class configuration bundle consumed by every strategy.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyContext {
    pub class_name: String,
    #[serde(default)]
    pub identifier_field: Option<String>,
    #[serde(default)]
    pub parent_field: Option<String>,
    #[serde(default)]
    pub node_name_field: Option<String>,
    /// Field that carries the locale an object is currently bound to.
    #[serde(default)]
    pub locale_field: Option<String>,
    #[serde(default)]
    pub id_generator: IdGeneratorKind,
    #[serde(default)]
    pub id_options: IdGeneratorOptions,
    #[serde(default)]
    pub translator: Option<TranslatorKind>,
    /// Translatable field names, in declaration order.
    #[serde(default)]
    pub translatable_fields: Vec<String>,
    #[serde(default)]
    pub fields: Vec<FieldMapping>,
    /// Event name -> callback method names, in declaration order.
    #[serde(default)]
    pub lifecycle_callbacks: BTreeMap<String, Vec<String>>,
}

impl StrategyContext {
    /// Start building a context for `class_name`.
    pub fn builder(class_name: impl Into<String>) -> StrategyContextBuilder {
        StrategyContextBuilder {
            context: StrategyContext {
                class_name: class_name.into(),
                ..Default::default()
            },
        }
    }

    /// Parse and validate a context declared in TOML.
    pub fn from_toml_str(source: &str) -> TypeResult<Self> {
        let context: Self =
            toml::from_str(source).map_err(|e| TypeError::Serialization(e.to_string()))?;
        context.validate()?;
        Ok(context)
    }

    /// Mapping for `field`, if declared.
    pub fn field_mapping(&self, field: &str) -> Option<&FieldMapping> {
        self.fields.iter().find(|m| m.field == field)
    }

    /// Returns `true` if `field` is declared translatable.
    pub fn is_translatable(&self, field: &str) -> bool {
        self.translatable_fields.iter().any(|f| f == field)
    }

    /// Mappings of translatable fields, in declaration order.
    pub fn translated_mappings(&self) -> impl Iterator<Item = &FieldMapping> {
        self.translatable_fields
            .iter()
            .filter_map(|f| self.field_mapping(f))
    }

    /// Mappings of plain data fields (not translated, and not one of the
    /// identifier, parent, node-name or locale fields).
    pub fn untranslated_mappings(&self) -> impl Iterator<Item = &FieldMapping> {
        self.fields.iter().filter(|m| {
            !m.translated
                && Some(&m.field) != self.identifier_field.as_ref()
                && Some(&m.field) != self.parent_field.as_ref()
                && Some(&m.field) != self.node_name_field.as_ref()
                && Some(&m.field) != self.locale_field.as_ref()
        })
    }

    /// Callback methods registered for `event`, in declaration order.
    pub fn callbacks_for(&self, event: &str) -> &[String] {
        self.lifecycle_callbacks
            .get(event)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Returns `true` if the class stores any field through a translation layer.
    pub fn is_translated(&self) -> bool {
        !self.translatable_fields.is_empty()
            && !matches!(self.translator, None | Some(TranslatorKind::NonTranslated))
    }

    /// Check internal consistency.
    pub fn validate(&self) -> TypeResult<()> {
        let class = &self.class_name;
        if class.is_empty() {
            return Err(TypeError::configuration(class, "class name must not be empty"));
        }

        for field in &self.translatable_fields {
            match self.field_mapping(field) {
                None => {
                    return Err(TypeError::configuration(
                        class,
                        format!("translatable field {field:?} has no mapping"),
                    ))
                }
                Some(m) if !m.translated => {
                    return Err(TypeError::configuration(
                        class,
                        format!("field {field:?} is listed translatable but not marked translated"),
                    ))
                }
                Some(_) => {}
            }
        }

        if !self.translatable_fields.is_empty() && self.translator.is_none() {
            return Err(TypeError::configuration(
                class,
                "translatable fields declared without a translator",
            ));
        }

        match self.id_generator {
            IdGeneratorKind::Assigned if self.identifier_field.is_none() => Err(
                TypeError::configuration(class, "assigned ids require an identifier field"),
            ),
            IdGeneratorKind::Parent if self.node_name_field.is_none() => Err(
                TypeError::configuration(class, "parent ids require a node-name field"),
            ),
            IdGeneratorKind::FieldSlugger if self.id_options.slug_field.is_none() => Err(
                TypeError::configuration(class, "slugged ids require a slug field option"),
            ),
            _ => Ok(()),
        }
    }
}

/// Code-side builder for [`StrategyContext`].
#[derive(Debug)]
pub struct StrategyContextBuilder {
    context: StrategyContext,
}

impl StrategyContextBuilder {
    pub fn identifier(mut self, field: &str) -> Self {
        self.context.identifier_field = Some(field.to_string());
        self
    }

    pub fn parent(mut self, field: &str) -> Self {
        self.context.parent_field = Some(field.to_string());
        self
    }

    pub fn node_name(mut self, field: &str) -> Self {
        self.context.node_name_field = Some(field.to_string());
        self
    }

    pub fn locale_field(mut self, field: &str) -> Self {
        self.context.locale_field = Some(field.to_string());
        self
    }

    pub fn id_generator(mut self, kind: IdGeneratorKind) -> Self {
        self.context.id_generator = kind;
        self
    }

    pub fn slug_field(mut self, field: &str) -> Self {
        self.context.id_options.slug_field = Some(field.to_string());
        self
    }

    pub fn auto_name_prefix(mut self, prefix: &str) -> Self {
        self.context.id_options.auto_name_prefix = Some(prefix.to_string());
        self
    }

    pub fn translator(mut self, kind: TranslatorKind) -> Self {
        self.context.translator = Some(kind);
        self
    }

    /// Add a field mapping. Translated mappings are also appended to the
    /// translatable field list.
    pub fn field(mut self, mapping: FieldMapping) -> Self {
        if mapping.translated && !self.context.is_translatable(&mapping.field) {
            self.context.translatable_fields.push(mapping.field.clone());
        }
        self.context.fields.push(mapping);
        self
    }

    /// Register a lifecycle callback method for `event`.
    pub fn callback(mut self, event: &str, method: &str) -> Self {
        self.context
            .lifecycle_callbacks
            .entry(event.to_string())
            .or_default()
            .push(method.to_string());
        self
    }

    /// Validate and return the context.
    pub fn build(self) -> TypeResult<StrategyContext> {
        self.context.validate()?;
        Ok(self.context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article() -> StrategyContext {
        StrategyContext::builder("Article")
            .identifier("id")
            .parent("parent")
            .node_name("name")
            .id_generator(IdGeneratorKind::Parent)
            .translator(TranslatorKind::Attribute)
            .field(FieldMapping::new("id"))
            .field(FieldMapping::new("name"))
            .field(FieldMapping::new("title").translated())
            .field(FieldMapping::new("body").property("content").translated())
            .field(FieldMapping::new("views"))
            .callback("prePersist", "on_create")
            .build()
            .unwrap()
    }

    #[test]
    fn builder_collects_translatable_fields_in_order() {
        let ctx = article();
        assert_eq!(ctx.translatable_fields, vec!["title", "body"]);
        let props: Vec<_> = ctx.translated_mappings().map(|m| m.property.as_str()).collect();
        assert_eq!(props, vec!["title", "content"]);
    }

    #[test]
    fn untranslated_mappings_skip_structural_fields() {
        let ctx = article();
        let fields: Vec<_> = ctx.untranslated_mappings().map(|m| m.field.as_str()).collect();
        assert_eq!(fields, vec!["views"]);
    }

    #[test]
    fn callbacks_lookup() {
        let ctx = article();
        assert_eq!(ctx.callbacks_for("prePersist"), ["on_create".to_string()]);
        assert!(ctx.callbacks_for("postPersist").is_empty());
    }

    #[test]
    fn translatable_without_translator_is_rejected() {
        let err = StrategyContext::builder("Article")
            .identifier("id")
            .field(FieldMapping::new("title").translated())
            .build()
            .unwrap_err();
        assert!(matches!(err, TypeError::Configuration { .. }));
    }

    #[test]
    fn parent_generator_requires_name_field() {
        let err = StrategyContext::builder("Page")
            .parent("parent")
            .id_generator(IdGeneratorKind::Parent)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("node-name"));
    }

    #[test]
    fn parse_from_toml() {
        let ctx = StrategyContext::from_toml_str(
            r#"
            class_name = "Page"
            parent_field = "parent"
            node_name_field = "name"
            id_generator = "parent"
            translator = "child"
            translatable_fields = ["title"]

            [[fields]]
            field = "title"
            property = "title"
            translated = true

            [[fields]]
            field = "tags"
            property = "tags"
            multivalue = true
            assoc = { keys_property = "tagKeys" }

            [lifecycle_callbacks]
            postLoad = ["warm_cache"]
            "#,
        )
        .unwrap();
        assert_eq!(ctx.translator, Some(TranslatorKind::Child));
        assert_eq!(ctx.id_generator, IdGeneratorKind::Parent);
        let tags = ctx.field_mapping("tags").unwrap();
        assert_eq!(tags.assoc.as_ref().unwrap().keys_property, "tagKeys");
        assert!(ctx.is_translated());
    }

    #[test]
    fn unknown_generator_kind_is_a_config_error() {
        let err = StrategyContext::from_toml_str(
            r#"
            class_name = "Page"
            id_generator = "sequence"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, TypeError::Serialization(_)));
    }

    #[test]
    fn non_translated_translator_is_not_translated() {
        let ctx = StrategyContext::builder("Page")
            .identifier("id")
            .translator(TranslatorKind::NonTranslated)
            .field(FieldMapping::new("title").translated())
            .build()
            .unwrap();
        assert!(!ctx.is_translated());
    }
}

//! Flattening field values into node properties.
//!
//! Nodes store scalars and ordered lists only. A multivalue field becomes a
//! list; an associative field becomes three properties: the non-null values
//! in key order, their keys, and (optionally) the keys whose value was null.

use nodemap_node::{NodeHandle, NodeResult};
use nodemap_types::{FieldMapping, Value};

use crate::error::{TranslationError, TranslationResult};

/// A field value split into the properties it is stored as.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EncodedField {
    pub value: Value,
    pub keys: Option<Value>,
    pub nulls: Option<Value>,
}

/// Encodes and decodes one field's value for node storage.
pub trait PropertyCodec: Send + Sync {
    fn encode(&self, mapping: &FieldMapping, value: &Value) -> TranslationResult<EncodedField>;

    fn decode(&self, mapping: &FieldMapping, stored: EncodedField) -> TranslationResult<Value>;
}

/// Positional/associative codec matching [`FieldMapping`] flags.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultCodec;

impl PropertyCodec for DefaultCodec {
    fn encode(&self, mapping: &FieldMapping, value: &Value) -> TranslationResult<EncodedField> {
        if value.is_null() {
            return Ok(EncodedField::default());
        }

        if let Some(assoc) = &mapping.assoc {
            let entries: Vec<(String, Value)> = match value {
                Value::Map(map) => map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
                Value::List(items) => items
                    .iter()
                    .enumerate()
                    .map(|(i, v)| (i.to_string(), v.clone()))
                    .collect(),
                other => {
                    return Err(TranslationError::codec(
                        &mapping.field,
                        format!("associative field cannot hold a {}", other.type_name()),
                    ))
                }
            };
            let mut values = Vec::new();
            let mut keys = Vec::new();
            let mut nulls = Vec::new();
            for (key, v) in entries {
                if v.is_null() {
                    nulls.push(Value::String(key));
                } else {
                    keys.push(Value::String(key));
                    values.push(v);
                }
            }
            let nulls = match &assoc.nulls_property {
                Some(_) if !nulls.is_empty() => Some(Value::List(nulls)),
                _ => None,
            };
            return Ok(EncodedField {
                value: Value::List(values),
                keys: Some(Value::List(keys)),
                nulls,
            });
        }

        let stored = match (mapping.multivalue, value) {
            (_, Value::Map(_)) => {
                return Err(TranslationError::codec(
                    &mapping.field,
                    "keyed values need an associative mapping",
                ))
            }
            (true, Value::List(_)) => value.clone(),
            (true, scalar) => Value::List(vec![scalar.clone()]),
            (false, Value::List(_)) => {
                return Err(TranslationError::codec(
                    &mapping.field,
                    "single-valued field cannot hold a list",
                ))
            }
            (false, scalar) => scalar.clone(),
        };
        Ok(EncodedField {
            value: stored,
            ..Default::default()
        })
    }

    fn decode(&self, mapping: &FieldMapping, stored: EncodedField) -> TranslationResult<Value> {
        if mapping.assoc.is_some() {
            let values = match stored.value {
                Value::Null => Vec::new(),
                Value::List(items) => items,
                scalar => vec![scalar],
            };
            let keys = stored.keys.map(|k| k.string_items()).unwrap_or_default();
            if keys.len() != values.len() {
                return Err(TranslationError::codec(
                    &mapping.field,
                    format!("{} keys for {} values", keys.len(), values.len()),
                ));
            }
            let mut map: std::collections::BTreeMap<String, Value> =
                keys.into_iter().zip(values).collect();
            if let Some(nulls) = stored.nulls {
                for key in nulls.string_items() {
                    map.insert(key, Value::Null);
                }
            }
            return Ok(Value::Map(map));
        }

        Ok(match (mapping.multivalue, stored.value) {
            (_, Value::Null) => Value::Null,
            (true, Value::List(items)) => Value::List(items),
            (true, scalar) => Value::List(vec![scalar]),
            (false, v) => v,
        })
    }
}

/// Property names one field is stored under.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct PropertyNames {
    pub value: String,
    pub keys: Option<String>,
    pub nulls: Option<String>,
}

impl PropertyNames {
    /// The mapping's own property names.
    pub fn plain(mapping: &FieldMapping) -> Self {
        Self::renamed(mapping, |p| p.to_string())
    }

    /// Every property name of the mapping passed through `rename`.
    pub fn renamed(mapping: &FieldMapping, rename: impl Fn(&str) -> String) -> Self {
        Self {
            value: rename(&mapping.property),
            keys: mapping.assoc.as_ref().map(|a| rename(&a.keys_property)),
            nulls: mapping
                .assoc
                .as_ref()
                .and_then(|a| a.nulls_property.as_deref())
                .map(&rename),
        }
    }

    /// Write an encoded field. Missing parts clear their property.
    pub fn write<N: NodeHandle>(&self, node: &N, encoded: EncodedField) -> NodeResult<()> {
        node.set_property(&self.value, encoded.value)?;
        if let Some(keys) = &self.keys {
            node.set_property(keys, encoded.keys.unwrap_or_default())?;
        }
        if let Some(nulls) = &self.nulls {
            node.set_property(nulls, encoded.nulls.unwrap_or_default())?;
        }
        Ok(())
    }

    /// Read an encoded field, or `None` when neither the value nor the nulls
    /// property exists.
    pub fn read<N: NodeHandle>(&self, node: &N) -> NodeResult<Option<EncodedField>> {
        let value = node.property(&self.value)?;
        let nulls = match &self.nulls {
            Some(name) => node.property(name)?,
            None => None,
        };
        if value.is_none() && nulls.is_none() {
            return Ok(None);
        }
        let keys = match &self.keys {
            Some(name) => node.property(name)?,
            None => None,
        };
        Ok(Some(EncodedField {
            value: value.unwrap_or_default(),
            keys,
            nulls,
        }))
    }

    /// Remove every property of the field.
    pub fn clear<N: NodeHandle>(&self, node: &N) -> NodeResult<()> {
        self.write(node, EncodedField::default())
    }
}

/// Store `value` under the mapping's plain property names.
pub fn write_plain_field<N: NodeHandle>(
    node: &N,
    mapping: &FieldMapping,
    value: &Value,
    codec: &dyn PropertyCodec,
) -> TranslationResult<()> {
    let encoded = codec.encode(mapping, value)?;
    PropertyNames::plain(mapping).write(node, encoded)?;
    Ok(())
}

/// Read the value stored under the mapping's plain property names.
pub fn read_plain_field<N: NodeHandle>(
    node: &N,
    mapping: &FieldMapping,
    codec: &dyn PropertyCodec,
) -> TranslationResult<Option<Value>> {
    match PropertyNames::plain(mapping).read(node)? {
        Some(encoded) => Ok(Some(codec.decode(mapping, encoded)?)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nodemap_node::{MemoryRepository, NodeSession};
    use std::collections::BTreeMap;

    fn tags() -> FieldMapping {
        FieldMapping::new("tags").assoc("tagKeys", Some("tagNulls"))
    }

    #[test]
    fn scalar_passes_through() {
        let m = FieldMapping::new("title");
        let enc = DefaultCodec.encode(&m, &Value::from("x")).unwrap();
        assert_eq!(enc.value, Value::from("x"));
        assert_eq!(enc.keys, None);
    }

    #[test]
    fn single_field_rejects_list() {
        let m = FieldMapping::new("title");
        assert!(DefaultCodec.encode(&m, &Value::from(vec!["a"])).is_err());
    }

    #[test]
    fn multivalue_wraps_scalar() {
        let m = FieldMapping::new("names").multivalue();
        let enc = DefaultCodec.encode(&m, &Value::from("a")).unwrap();
        assert_eq!(enc.value, Value::from(vec!["a"]));
    }

    #[test]
    fn assoc_splits_keys_values_and_nulls() {
        let map = Value::Map(BTreeMap::from([
            ("a".to_string(), Value::from("one")),
            ("b".to_string(), Value::Null),
            ("c".to_string(), Value::from("three")),
        ]));
        let enc = DefaultCodec.encode(&tags(), &map).unwrap();
        assert_eq!(enc.value, Value::from(vec!["one", "three"]));
        assert_eq!(enc.keys, Some(Value::from(vec!["a", "c"])));
        assert_eq!(enc.nulls, Some(Value::from(vec!["b"])));

        let back = DefaultCodec.decode(&tags(), enc).unwrap();
        assert_eq!(back, map);
    }

    #[test]
    fn assoc_without_nulls_property_drops_null_entries() {
        let m = FieldMapping::new("tags").assoc("tagKeys", None);
        let map = Value::Map(BTreeMap::from([
            ("a".to_string(), Value::from("one")),
            ("b".to_string(), Value::Null),
        ]));
        let enc = DefaultCodec.encode(&m, &map).unwrap();
        assert_eq!(enc.nulls, None);
        let back = DefaultCodec.decode(&m, enc).unwrap();
        assert_eq!(
            back,
            Value::Map(BTreeMap::from([("a".to_string(), Value::from("one"))]))
        );
    }

    #[test]
    fn assoc_key_count_mismatch_is_an_error() {
        let stored = EncodedField {
            value: Value::from(vec!["one", "two"]),
            keys: Some(Value::from(vec!["a"])),
            nulls: None,
        };
        assert!(matches!(
            DefaultCodec.decode(&tags(), stored),
            Err(TranslationError::Codec { .. })
        ));
    }

    #[test]
    fn plain_field_roundtrip_on_node() {
        let repo = MemoryRepository::new();
        let node = repo.root().add_child("n").unwrap();
        let map = Value::Map(BTreeMap::from([("k".to_string(), Value::Long(7))]));

        write_plain_field(&node, &tags(), &map, &DefaultCodec).unwrap();
        assert_eq!(node.property("tagKeys").unwrap(), Some(Value::from(vec!["k"])));
        assert_eq!(read_plain_field(&node, &tags(), &DefaultCodec).unwrap(), Some(map));

        write_plain_field(&node, &tags(), &Value::Null, &DefaultCodec).unwrap();
        assert_eq!(read_plain_field(&node, &tags(), &DefaultCodec).unwrap(), None);
        assert!(!node.has_property("tagKeys").unwrap());
    }

    #[test]
    fn renamed_names_cover_companions() {
        let names = PropertyNames::renamed(&tags(), |p| format!("locale:en-{p}"));
        assert_eq!(names.value, "locale:en-tags");
        assert_eq!(names.keys.as_deref(), Some("locale:en-tagKeys"));
        assert_eq!(names.nulls.as_deref(), Some("locale:en-tagNulls"));
    }
}

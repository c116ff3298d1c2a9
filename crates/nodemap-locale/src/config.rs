use std::collections::BTreeMap;
use std::path::Path;

use nodemap_types::Locale;
use serde::{Deserialize, Serialize};

use crate::error::{LocaleError, LocaleResult};

/// Mapping from locale to its ordered fallback locales.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalePreferenceTable {
    orders: BTreeMap<Locale, Vec<Locale>>,
}

impl LocalePreferenceTable {
    /// Build a table, validating every locale code it mentions.
    pub fn new(orders: BTreeMap<Locale, Vec<Locale>>) -> LocaleResult<Self> {
        let table = Self { orders };
        table.validate()?;
        Ok(table)
    }

    /// Build a table from `(locale, order)` pairs of string codes.
    pub fn from_pairs<'a, I>(pairs: I) -> LocaleResult<Self>
    where
        I: IntoIterator<Item = (&'a str, Vec<&'a str>)>,
    {
        let orders = pairs
            .into_iter()
            .map(|(key, order)| {
                (
                    Locale::new(key),
                    order.into_iter().map(Locale::new).collect(),
                )
            })
            .collect();
        Self::new(orders)
    }

    /// Check every key and every fallback entry is a well-formed code.
    pub fn validate(&self) -> LocaleResult<()> {
        for (key, order) in &self.orders {
            key.validate()?;
            for locale in order {
                locale.validate()?;
            }
        }
        Ok(())
    }

    /// Returns `true` if `locale` is a key.
    pub fn contains(&self, locale: &Locale) -> bool {
        self.orders.contains_key(locale)
    }

    /// Fallback order configured for `locale`.
    pub fn order(&self, locale: &Locale) -> Option<&[Locale]> {
        self.orders.get(locale).map(Vec::as_slice)
    }

    /// All configured locales, sorted.
    pub fn locales(&self) -> impl Iterator<Item = &Locale> {
        self.orders.keys()
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

/// Locale settings as declared in configuration.
///
/// ```toml
/// default_locale = "en"
///
/// [preferences]
/// en = ["en", "de"]
/// de = ["de", "en"]
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocaleConfig {
    pub default_locale: Locale,
    pub preferences: LocalePreferenceTable,
}

impl LocaleConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(source: &str) -> LocaleResult<Self> {
        let config: Self = toml::from_str(source).map_err(|e| LocaleError::Config(e.to_string()))?;
        config.preferences.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> LocaleResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| LocaleError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&source)
    }
}

impl Default for LocaleConfig {
    fn default() -> Self {
        let en = Locale::new("en");
        Self {
            preferences: LocalePreferenceTable {
                orders: BTreeMap::from([(en.clone(), vec![en.clone()])]),
            },
            default_locale: en,
        }
    }
}

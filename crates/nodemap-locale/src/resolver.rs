use nodemap_types::Locale;
use tracing::debug;

use crate::config::{LocaleConfig, LocalePreferenceTable};
use crate::error::{LocaleError, LocaleResult};

/// Chooses which locales to try, in which order.
///
/// Invariants: the default locale is always a key of the table, and so is
/// the current locale when one is set.
#[derive(Clone, Debug)]
pub struct LocaleFallbackResolver {
    table: LocalePreferenceTable,
    default_locale: Locale,
    current: Option<Locale>,
}

impl LocaleFallbackResolver {
    /// Create a resolver. Fails if `default_locale` is not a key of `table`.
    pub fn new(table: LocalePreferenceTable, default_locale: Locale) -> LocaleResult<Self> {
        if !table.contains(&default_locale) {
            return Err(LocaleError::InvalidDefault(default_locale));
        }
        Ok(Self {
            table,
            default_locale,
            current: None,
        })
    }

    /// Create a resolver from declared configuration.
    pub fn from_config(config: &LocaleConfig) -> LocaleResult<Self> {
        Self::new(config.preferences.clone(), config.default_locale.clone())
    }

    /// Replace the preference table and default locale.
    ///
    /// A current locale that is not a key of the new table is dropped.
    pub fn set_preferences(
        &mut self,
        table: LocalePreferenceTable,
        default_locale: Locale,
    ) -> LocaleResult<()> {
        if !table.contains(&default_locale) {
            return Err(LocaleError::InvalidDefault(default_locale));
        }
        if let Some(current) = &self.current {
            if !table.contains(current) {
                debug!(locale = %current, "current locale dropped by new preferences");
                self.current = None;
            }
        }
        self.table = table;
        self.default_locale = default_locale;
        Ok(())
    }

    /// Fallback order for `for_locale`, or for the current locale if `None`.
    pub fn fallback_order(&self, for_locale: Option<&Locale>) -> LocaleResult<Vec<Locale>> {
        let locale = for_locale.unwrap_or_else(|| self.current_locale());
        self.table
            .order(locale)
            .map(<[Locale]>::to_vec)
            .ok_or_else(|| LocaleError::missing(locale))
    }

    /// Fallback order of the default locale, regardless of the current one.
    pub fn default_order(&self) -> Vec<Locale> {
        self.table
            .order(&self.default_locale)
            .map(<[Locale]>::to_vec)
            .unwrap_or_default()
    }

    /// Adopt `locale` as the current locale.
    ///
    /// An unknown regional code falls back to its base language
    /// (`en_GB` -> `en`) when that is configured.
    pub fn set_current_locale(&mut self, locale: &Locale) -> LocaleResult<()> {
        if self.table.contains(locale) {
            self.current = Some(locale.clone());
            return Ok(());
        }
        match locale.base_language() {
            Some(base) if self.table.contains(&base) => {
                debug!(requested = %locale, adopted = %base, "region stripped from locale");
                self.current = Some(base);
                Ok(())
            }
            _ => Err(LocaleError::missing(locale)),
        }
    }

    /// The adopted locale, or the default if none was set.
    pub fn current_locale(&self) -> &Locale {
        self.current.as_ref().unwrap_or(&self.default_locale)
    }

    /// The default locale.
    pub fn default_locale(&self) -> &Locale {
        &self.default_locale
    }

    /// Returns `true` if `locale` is configured.
    pub fn is_configured(&self, locale: &Locale) -> bool {
        self.table.contains(locale)
    }

    /// All configured locales, sorted.
    pub fn locales(&self) -> Vec<Locale> {
        self.table.locales().cloned().collect()
    }
}

use nodemap_types::{Locale, TypeError};
use thiserror::Error;

/// Errors from locale configuration and resolution.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LocaleError {
    /// The locale is not a key of the preference table.
    #[error("missing translation: locale {locale} is not configured")]
    MissingTranslation { locale: Locale },

    /// The default locale is not a key of the preference table.
    #[error("default locale {0} is not a key of the preference table")]
    InvalidDefault(Locale),

    /// A locale code in the table is malformed.
    #[error("invalid locale: {0}")]
    InvalidLocale(#[from] TypeError),

    /// The configuration could not be read or parsed.
    #[error("locale configuration error: {0}")]
    Config(String),
}

impl LocaleError {
    pub fn missing(locale: &Locale) -> Self {
        Self::MissingTranslation {
            locale: locale.clone(),
        }
    }
}

/// Result alias for locale operations.
pub type LocaleResult<T> = Result<T, LocaleError>;

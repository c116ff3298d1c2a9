//! Locale fallback resolution for nodemap.
//!
//! A [`LocalePreferenceTable`] maps each locale to the ordered list of
//! locales to try when reading a translation for it. The
//! [`LocaleFallbackResolver`] owns that table, the default locale, and the
//! session's current locale; callers pass it by reference instead of relying
//! on ambient global state.
//!
//! # Modules
//!
//! - [`error`] -- [`LocaleError`]
//! - [`config`] -- [`LocalePreferenceTable`] and TOML-backed [`LocaleConfig`]
//! - [`resolver`] -- [`LocaleFallbackResolver`]

pub mod config;
pub mod error;
pub mod resolver;

pub use config::{LocaleConfig, LocalePreferenceTable};
pub use error::{LocaleError, LocaleResult};
pub use resolver::LocaleFallbackResolver;

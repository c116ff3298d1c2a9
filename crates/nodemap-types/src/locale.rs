//! Locale codes.
//!
//! Locales are compared as plain codes (`en`, `de`, `en_GB`). Translation
//! layouts embed the code into property and node names, so a valid locale
//! is limited to ASCII alphanumerics and `_`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{TypeError, TypeResult};

/// A language code such as `en` or `en_GB`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Locale(String);

impl Locale {
    /// Wrap a code without validating it.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Wrap a code, rejecting anything that cannot be embedded in a
    /// property or node name.
    pub fn parse(code: &str) -> TypeResult<Self> {
        let locale = Self::new(code);
        locale.validate()?;
        Ok(locale)
    }

    /// Check the code is non-empty and made of `[A-Za-z0-9_]`.
    pub fn validate(&self) -> TypeResult<()> {
        if self.0.is_empty() {
            return Err(TypeError::InvalidLocale {
                locale: self.0.clone(),
                reason: "locale must not be empty".into(),
            });
        }
        if let Some(ch) = self
            .0
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '_'))
        {
            return Err(TypeError::InvalidLocale {
                locale: self.0.clone(),
                reason: format!("contains forbidden character: {ch:?}"),
            });
        }
        Ok(())
    }

    /// The code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The base language: the first two characters (`en_GB` -> `en`).
    ///
    /// Returns `None` when the code is already two characters or shorter.
    pub fn base_language(&self) -> Option<Locale> {
        let base: String = self.0.chars().take(2).collect();
        if base.len() == self.0.len() {
            None
        } else {
            Some(Self(base))
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Locale {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

impl From<String> for Locale {
    fn from(code: String) -> Self {
        Self(code)
    }
}

impl AsRef<str> for Locale {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parse_accepts_region_codes() {
        assert!(Locale::parse("en").is_ok());
        assert!(Locale::parse("en_GB").is_ok());
        assert!(Locale::parse("zh_Hant_TW").is_ok());
    }

    #[test]
    fn parse_rejects_separators() {
        assert!(Locale::parse("").is_err());
        assert!(Locale::parse("en-GB").is_err());
        assert!(Locale::parse("en:GB").is_err());
        assert!(Locale::parse("e n").is_err());
    }

    #[test]
    fn base_language_strips_region() {
        assert_eq!(Locale::new("en_GB").base_language(), Some(Locale::new("en")));
        assert_eq!(Locale::new("en").base_language(), None);
    }

    proptest! {
        #[test]
        fn base_language_is_two_char_prefix(code in "[a-z]{2}_[A-Z]{2}") {
            let base = Locale::new(code.clone()).base_language().unwrap();
            prop_assert_eq!(base.as_str(), &code[..2]);
        }
    }
}

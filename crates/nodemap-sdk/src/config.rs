use std::path::Path;

use nodemap_locale::LocaleConfig;
use serde::{Deserialize, Serialize};

use crate::error::{MapperError, MapperResult};

/// Mapper settings.
///
/// ```toml
/// translation_prefix = "locale"
/// conversion_batch_size = 200
///
/// [locales]
/// default_locale = "en"
///
/// [locales.preferences]
/// en = ["en", "de"]
/// de = ["de", "en"]
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperConfig {
    pub locales: LocaleConfig,
    /// Namespace for translated property and child-node names.
    pub translation_prefix: String,
    /// Documents converted per [`TranslationConverter`](crate::TranslationConverter) call.
    pub conversion_batch_size: usize,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            locales: LocaleConfig::default(),
            translation_prefix: nodemap_translation::DEFAULT_PREFIX.to_string(),
            conversion_batch_size: 200,
        }
    }
}

impl MapperConfig {
    pub fn from_toml_str(source: &str) -> MapperResult<Self> {
        let config: Self =
            toml::from_str(source).map_err(|e| MapperError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> MapperResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| MapperError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> MapperResult<()> {
        if self.conversion_batch_size == 0 {
            return Err(MapperError::Config(
                "conversion_batch_size must be at least 1".into(),
            ));
        }
        self.locales.preferences.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nodemap_types::Locale;
    use std::io::Write;

    #[test]
    fn default_config() {
        let c = MapperConfig::default();
        assert_eq!(c.translation_prefix, "locale");
        assert_eq!(c.conversion_batch_size, 200);
        assert_eq!(c.locales.default_locale, Locale::new("en"));
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let c = MapperConfig::from_toml_str("translation_prefix = \"lang\"\n").unwrap();
        assert_eq!(c.translation_prefix, "lang");
        assert_eq!(c.conversion_batch_size, 200);
    }

    #[test]
    fn zero_batch_is_rejected() {
        assert!(matches!(
            MapperConfig::from_toml_str("conversion_batch_size = 0\n"),
            Err(MapperError::Config(_))
        ));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            conversion_batch_size = 10

            [locales]
            default_locale = "de"

            [locales.preferences]
            de = ["de", "en"]
            en = ["en"]
            "#
        )
        .unwrap();
        let c = MapperConfig::load(file.path()).unwrap();
        assert_eq!(c.conversion_batch_size, 10);
        assert_eq!(c.locales.default_locale, Locale::new("de"));
        assert_eq!(c.locales.preferences.len(), 2);
    }
}

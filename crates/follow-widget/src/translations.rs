//! Locale-keyed UI strings.

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::warn;

use crate::error::Result;

pub const KEY_FOLLOWING_TITLE: &str = "following_modal.title";
pub const KEY_FOLLOWING_SUBTITLE: &str = "following_modal.subtitle";
pub const KEY_FOLLOWING_CONTINUE: &str = "following_modal.continue";
pub const KEY_QR_HEADER: &str = "following_modal.qr_header";
pub const KEY_QR_ALT: &str = "following_modal.qr_alt";

/// Source of translated strings for one locale.
#[async_trait]
pub trait TranslationLoader: Send + Sync {
    async fn load(&self, locale: &str) -> Result<HashMap<String, String>>;
}

/// Loader backed by a fixed table, keyed by locale.
#[derive(Default)]
pub struct StaticTranslationLoader {
    tables: HashMap<String, HashMap<String, String>>,
}

impl StaticTranslationLoader {
    pub fn new(tables: HashMap<String, HashMap<String, String>>) -> Self {
        Self { tables }
    }
}

#[async_trait]
impl TranslationLoader for StaticTranslationLoader {
    async fn load(&self, locale: &str) -> Result<HashMap<String, String>> {
        Ok(self.tables.get(locale).cloned().unwrap_or_default())
    }
}

/// Resolved translation table. Lookups on a missing key fall back to the
/// key itself so untranslated UI stays legible.
#[derive(Debug, Clone, Default)]
pub struct Translations {
    strings: HashMap<String, String>,
}

impl Translations {
    /// Load the table for `locale`. A load failure produces an empty table
    /// after logging; every lookup then falls back to its key.
    pub async fn load(loader: &dyn TranslationLoader, locale: &str) -> Self {
        match loader.load(locale).await {
            Ok(strings) => Self { strings },
            Err(error) => {
                warn!(%error, locale, "translation load failed, using keys as text");
                Self::default()
            }
        }
    }

    pub fn translate(&self, key: &str) -> String {
        self.strings
            .get(key)
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }

    /// Translate `key`, replacing each `{name}` placeholder with its paired
    /// value.
    pub fn translate_with(&self, key: &str, replacements: &[(&str, &str)]) -> String {
        let mut text = self.translate(key);
        for (name, value) in replacements {
            text = text.replace(&format!("{{{name}}}"), value);
        }
        text
    }

    pub fn translate_or(&self, key: &str, fallback: &str) -> String {
        self.strings
            .get(key)
            .cloned()
            .unwrap_or_else(|| fallback.to_string())
    }
}

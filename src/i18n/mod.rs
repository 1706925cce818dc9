//! Internationalization (i18n) support
//!
//! `pt-BR` and `en` strings are built in. A site may override or add
//! languages with YAML (or JSON) files in its `languages/` directory.

use anyhow::Result;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Languages compiled into the binary
const BUILTIN: &[(&str, &str)] = &[
    ("en", include_str!("languages/en.yml")),
    ("pt-BR", include_str!("languages/pt-BR.yml")),
];

const FALLBACK_LANGUAGE: &str = "en";

type LanguageData = HashMap<String, serde_yaml::Value>;

/// Internationalization handler
#[derive(Debug, Clone)]
pub struct I18n {
    /// Current language
    language: String,
    /// Language data: lang -> key -> translation
    translations: HashMap<String, LanguageData>,
}

impl I18n {
    /// Create an empty handler
    pub fn new(language: &str) -> Self {
        Self {
            language: language.to_string(),
            translations: HashMap::new(),
        }
    }

    /// Create a handler preloaded with the built-in languages
    pub fn with_builtin(language: &str) -> Self {
        let mut i18n = Self::new(language);
        for (lang, source) in BUILTIN {
            if let Err(e) = i18n.add_language(lang, source) {
                tracing::error!("Built-in language {} is invalid: {}", lang, e);
            }
        }
        i18n
    }

    /// Parse a language document and merge it over any existing strings
    pub fn add_language(&mut self, lang: &str, source: &str) -> Result<()> {
        let data: LanguageData = serde_yaml::from_str(source)?;
        let entry = self.translations.entry(lang.to_string()).or_default();
        for (key, value) in data {
            entry.insert(key, value);
        }
        Ok(())
    }

    /// Load language files from a directory
    pub fn load_languages<P: AsRef<Path>>(&mut self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        if !dir.exists() {
            return Ok(());
        }

        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }

            let ext = path.extension().and_then(|e| e.to_str());
            if !matches!(ext, Some("yml") | Some("yaml") | Some("json")) {
                continue;
            }

            let Some(lang) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let lang = lang.to_string();

            // YAML is a superset of JSON, one parser covers both
            let content = fs::read_to_string(&path)?;
            match self.add_language(&lang, &content) {
                Ok(()) => tracing::debug!("Loaded language file: {:?}", path),
                Err(e) => tracing::warn!("Failed to parse language file {:?}: {}", path, e),
            }
        }

        Ok(())
    }

    /// Get a translation by key; nested keys use dots (`post.edited`)
    pub fn get(&self, key: &str) -> String {
        self.lookup(key).unwrap_or_else(|| key.to_string())
    }

    /// Get a translation and substitute each `%s` with the next argument
    pub fn get_with(&self, key: &str, args: &[&str]) -> String {
        let mut result = self.get(key);
        for arg in args {
            if let Some(pos) = result.find("%s") {
                result.replace_range(pos..pos + 2, arg);
            }
        }
        result
    }

    /// Get a pluralized translation, substituting `%d` with the count
    pub fn get_plural(&self, key: &str, count: u64) -> String {
        let zero_key = format!("{}.zero", key);
        let plural_key = if count == 0 && self.has(&zero_key) {
            zero_key
        } else if count == 1 {
            format!("{}.one", key)
        } else {
            format!("{}.other", key)
        };

        self.get(&plural_key).replace("%d", &count.to_string())
    }

    /// Get a translation substituting `%d` with a number
    pub fn get_count(&self, key: &str, count: u64) -> String {
        self.get(key).replace("%d", &count.to_string())
    }

    /// Check if a translation exists
    pub fn has(&self, key: &str) -> bool {
        self.lookup(key).is_some()
    }

    fn lookup(&self, key: &str) -> Option<String> {
        if let Some(value) = self
            .translations
            .get(&self.language)
            .and_then(|data| get_nested_value(data, key))
        {
            return Some(yaml_value_to_string(value));
        }

        // Fallback to English
        if self.language != FALLBACK_LANGUAGE {
            if let Some(value) = self
                .translations
                .get(FALLBACK_LANGUAGE)
                .and_then(|data| get_nested_value(data, key))
            {
                return Some(yaml_value_to_string(value));
            }
        }

        None
    }

    /// All translations for the current language, keyed with dot notation
    pub fn get_all_translations(&self) -> HashMap<String, String> {
        let mut result = HashMap::new();

        if let Some(lang_data) = self.translations.get(&self.language) {
            flatten_translations(lang_data, "", &mut result);
        }

        if self.language != FALLBACK_LANGUAGE {
            if let Some(en_data) = self.translations.get(FALLBACK_LANGUAGE) {
                let mut en_result = HashMap::new();
                flatten_translations(en_data, "", &mut en_result);
                for (k, v) in en_result {
                    result.entry(k).or_insert(v);
                }
            }
        }

        result
    }
}

impl Default for I18n {
    fn default() -> Self {
        Self::with_builtin(FALLBACK_LANGUAGE)
    }
}

/// Get a nested value from a YAML map using dot notation
fn get_nested_value<'a>(data: &'a LanguageData, key: &str) -> Option<&'a serde_yaml::Value> {
    let mut parts = key.split('.');
    let mut current = data.get(parts.next()?)?;

    for part in parts {
        match current {
            serde_yaml::Value::Mapping(map) => {
                current = map.get(serde_yaml::Value::String(part.to_string()))?;
            }
            _ => return None,
        }
    }

    Some(current)
}

/// Convert a YAML value to a string
fn yaml_value_to_string(value: &serde_yaml::Value) -> String {
    match value {
        serde_yaml::Value::String(s) => s.clone(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Null => String::new(),
        _ => format!("{:?}", value),
    }
}

/// Flatten translations into a HashMap with dot-notation keys
fn flatten_translations(data: &LanguageData, prefix: &str, result: &mut HashMap<String, String>) {
    for (key, value) in data {
        let full_key = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };

        match value {
            serde_yaml::Value::Mapping(map) => {
                let nested: LanguageData = map
                    .iter()
                    .filter_map(|(k, v)| k.as_str().map(|k| (k.to_string(), v.clone())))
                    .collect();
                flatten_translations(&nested, &full_key, result);
            }
            serde_yaml::Value::Sequence(_) | serde_yaml::Value::Tagged(_) => {}
            other => {
                result.insert(full_key, yaml_value_to_string(other));
            }
        }
    }
}

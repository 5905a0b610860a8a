use crate::PhiAccessError;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt::Debug;

/// Looks up localized reason strings by dotted key.
pub trait Translator: Debug + Send + Sync {
    /// The translation at `key`, or `None` when there is none.
    fn translate(&self, key: &str) -> Option<String>;

    /// Locale reported when a translation is missing.
    fn locale(&self) -> &str;
}

/// A flat, single-locale table of translations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    locale: String,
    entries: HashMap<String, String>,
}

impl Catalog {
    /// An empty catalog for `locale`.
    pub fn new(locale: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
            entries: HashMap::new(),
        }
    }

    /// Add or replace the translation at `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Builder form of [`Catalog::insert`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Load the `locale` section of a nested JSON document such as
    /// `{"en": {"phi": {"sample": {"index": {"patient_info": "..."}}}}}`.
    ///
    /// Nested objects are flattened into dotted keys; non-string leaves are
    /// ignored. A document without the locale yields an empty catalog.
    pub fn from_json(locale: impl Into<String>, json: &str) -> Result<Self, PhiAccessError> {
        let mut catalog = Catalog::new(locale);
        let document: Value = serde_json::from_str(json)
            .map_err(|error| PhiAccessError::Config(error.to_string()))?;

        if let Some(section) = document.get(&catalog.locale) {
            flatten(String::new(), section, &mut catalog.entries);
        }

        Ok(catalog)
    }

    /// Number of translations.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no translations.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn flatten(prefix: String, value: &Value, entries: &mut HashMap<String, String>) {
    match value {
        Value::Object(children) => {
            for (name, child) in children {
                let key = if prefix.is_empty() {
                    name.clone()
                } else {
                    format!("{prefix}.{name}")
                };
                flatten(key, child, entries);
            }
        }
        Value::String(text) if !prefix.is_empty() => {
            entries.insert(prefix, text.clone());
        }
        _ => {}
    }
}

impl Translator for Catalog {
    fn translate(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn locale(&self) -> &str {
        &self.locale
    }
}

//! Translation options: which fields of a record type are translatable and
//! under which policies.
//!
//! Option sets are plain builders. Inheritance between option sets is
//! explicit composition via `extend`; the translator applies the same merge
//! when a schema inherits options from registered ancestors. Once an option
//! set has produced shadow fields for a concrete type it is sealed and can no
//! longer be extended.

use std::collections::BTreeMap;

use crate::errors::{Result, TranslationError};
use crate::value::Value;

/// Value substituted when a fallback chain is exhausted.
///
/// `Lazy` defers computation to first use (e.g. a localized placeholder that
/// is expensive to build).
#[derive(Debug, Clone)]
pub enum FallbackValue {
    Literal(Value),
    Lazy(fn() -> Value),
}

impl FallbackValue {
    pub fn resolve(&self) -> Value {
        match self {
            FallbackValue::Literal(value) => value.clone(),
            FallbackValue::Lazy(produce) => produce(),
        }
    }
}

/// Which translated fields are required, per language.
#[derive(Debug, Clone, Default)]
pub enum RequiredLanguages {
    /// Nothing beyond storage nullability.
    #[default]
    None,
    /// Every translated field is required in the named languages.
    ForAll(Vec<String>),
    /// Map from language code (plus optional "default" key) to the base
    /// names required in that language.
    PerLanguage(BTreeMap<String, Vec<String>>),
}

impl RequiredLanguages {
    /// Whether `field`'s shadow is required in `lang`.
    pub fn requires(&self, lang: &str, field: &str) -> bool {
        match self {
            RequiredLanguages::None => false,
            RequiredLanguages::ForAll(langs) => langs.iter().any(|l| l == lang),
            RequiredLanguages::PerLanguage(map) => map
                .get(lang)
                .or_else(|| map.get("default"))
                .map(|fields| fields.iter().any(|f| f == field))
                .unwrap_or(false),
        }
    }

    /// Language codes this policy mentions, for registration-time validation.
    pub fn languages(&self) -> Vec<&str> {
        match self {
            RequiredLanguages::None => Vec::new(),
            RequiredLanguages::ForAll(langs) => langs.iter().map(String::as_str).collect(),
            RequiredLanguages::PerLanguage(map) => map
                .keys()
                .filter(|k| k.as_str() != "default")
                .map(String::as_str)
                .collect(),
        }
    }
}

/// Declarative translation configuration for one record type.
#[derive(Debug, Clone, Default)]
pub struct TranslationOptions {
    pub(crate) fields: Vec<String>,
    pub(crate) required_languages: RequiredLanguages,
    pub(crate) empty_values: BTreeMap<String, Value>,
    pub(crate) fallback_values: BTreeMap<String, FallbackValue>,
    pub(crate) blanket_fallback_value: Option<FallbackValue>,
    pub(crate) fallback_languages: Option<BTreeMap<String, Vec<String>>>,
    pub(crate) fallback_undefined: BTreeMap<String, Value>,
    sealed_for: Option<String>,
}

impl TranslationOptions {
    pub fn new() -> TranslationOptions {
        TranslationOptions::default()
    }

    /// Declare a base field translatable.
    pub fn field(mut self, name: impl Into<String>) -> TranslationOptions {
        let name = name.into();
        if !self.fields.contains(&name) {
            self.fields.push(name);
        }
        self
    }

    /// Declare several base fields translatable.
    pub fn fields<I, S>(mut self, names: I) -> TranslationOptions
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            self = self.field(name);
        }
        self
    }

    /// Require every translated field in the named languages.
    pub fn required_languages<I, S>(mut self, langs: I) -> TranslationOptions
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_languages =
            RequiredLanguages::ForAll(langs.into_iter().map(Into::into).collect());
        self
    }

    /// Require the named fields in one language ("default" as the language
    /// covers every language without an explicit entry).
    pub fn required_in<I, S>(mut self, lang: impl Into<String>, fields: I) -> TranslationOptions
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entry = fields.into_iter().map(Into::into).collect();
        match &mut self.required_languages {
            RequiredLanguages::PerLanguage(map) => {
                map.insert(lang.into(), entry);
            }
            _ => {
                let mut map = BTreeMap::new();
                map.insert(lang.into(), entry);
                self.required_languages = RequiredLanguages::PerLanguage(map);
            }
        }
        self
    }

    /// Sentinel treated as "absent" for this field during fallback
    /// resolution. Unset fields use their kind's natural default; null is
    /// always absent.
    pub fn empty_value(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.empty_values.insert(field.into(), value.into());
        self
    }

    /// Value substituted for this field when its chain is exhausted.
    pub fn fallback_value(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fallback_values
            .insert(field.into(), FallbackValue::Literal(value.into()));
        self
    }

    /// Lazily computed fallback value for this field.
    pub fn lazy_fallback_value(mut self, field: impl Into<String>, produce: fn() -> Value) -> Self {
        self.fallback_values
            .insert(field.into(), FallbackValue::Lazy(produce));
        self
    }

    /// Fallback value applied to every field without its own entry.
    pub fn fallback_value_for_all(mut self, value: impl Into<Value>) -> Self {
        self.blanket_fallback_value = Some(FallbackValue::Literal(value.into()));
        self
    }

    /// Chain-override map for these fields; replaces the registry chains key
    /// by key. Validated against the active languages at registration.
    pub fn fallback_languages(mut self, map: BTreeMap<String, Vec<String>>) -> Self {
        self.fallback_languages = Some(map);
        self
    }

    /// Pinned "undefined" value returned instead of computing the natural
    /// default when this field's chain is exhausted.
    pub fn fallback_undefined(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fallback_undefined.insert(field.into(), value.into());
        self
    }

    /// Extend a parent option set: union of fields (parent order first),
    /// this set's policies winning per field.
    ///
    /// # Errors
    /// `SealedOptions` when the parent has already produced shadow fields
    /// for a concrete record type.
    pub fn extend(self, parent: &TranslationOptions) -> Result<TranslationOptions> {
        if let Some(model) = &parent.sealed_for {
            return Err(TranslationError::SealedOptions(model.clone()));
        }
        Ok(self.merged_over(parent))
    }

    /// Effective fallback value for one field.
    pub(crate) fn fallback_value_for(&self, field: &str) -> Option<&FallbackValue> {
        self.fallback_values
            .get(field)
            .or(self.blanket_fallback_value.as_ref())
    }

    /// Seal this option set once shadow fields exist for `model`.
    pub(crate) fn seal(&mut self, model: &str) {
        self.sealed_for = Some(model.to_string());
    }

    /// Parent/child merge used both by `extend` and by the translator's
    /// ancestor-options resolution. Child (self) wins per field; the union of
    /// field names is kept, parent order first.
    pub(crate) fn merged_over(&self, parent: &TranslationOptions) -> TranslationOptions {
        let mut merged = parent.clone();
        merged.sealed_for = None;
        for name in &self.fields {
            if !merged.fields.contains(name) {
                merged.fields.push(name.clone());
            }
        }
        if !matches!(self.required_languages, RequiredLanguages::None) {
            merged.required_languages = self.required_languages.clone();
        }
        merged.empty_values.extend(self.empty_values.clone());
        merged.fallback_values.extend(self.fallback_values.clone());
        if self.blanket_fallback_value.is_some() {
            merged.blanket_fallback_value = self.blanket_fallback_value.clone();
        }
        if self.fallback_languages.is_some() {
            merged.fallback_languages = self.fallback_languages.clone();
        }
        merged
            .fallback_undefined
            .extend(self.fallback_undefined.clone());
        merged
    }
}

//! Shadow fields and the translation accessor.
//!
//! `TranslationField` is the per-(base field, language) shadow: a clone of
//! the base field's storage characteristics, forced nullable, under the
//! localized name. `TranslationAccessor` is the accessor object installed in
//! place of the base attribute: reads resolve through the fallback chain,
//! writes redirect to the active language's shadow with optional fan-out.
//!
//! After registration the base attribute's own stored slot is undefined;
//! only the accessor's redirection is reliable.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::context::{self, AutoPopulate};
use crate::language::{localized_name, Language};
use crate::options::FallbackValue;
use crate::registry::LanguageRegistry;
use crate::schema::FieldDef;
use crate::value::Value;

/// One shadow field: the language-specific storage behind a base attribute.
#[derive(Debug, Clone)]
pub struct TranslationField {
    /// The shadow's field definition (localized name, forced nullable).
    pub def: FieldDef,
    /// Base attribute this shadow backs.
    pub base: String,
    /// Language this shadow stores.
    pub language: Language,
}

impl TranslationField {
    /// Clone a base field into its shadow for `language`.
    ///
    /// Storage kind and length carry over; nullability is forced so every
    /// language can independently be absent. Declared defaults do not carry
    /// over: a shadow starts absent. The verbose name gets a language tag
    /// for the presentation layer ("title [de]").
    pub fn new(base: &FieldDef, language: &Language) -> TranslationField {
        let mut def = base.clone();
        def.name = localized_name(&base.name, language);
        def.nullable = true;
        def.default = None;
        let label = base.verbose_name.clone().unwrap_or_else(|| base.name.clone());
        def.verbose_name = Some(format!("{} [{}]", label, language.code()));

        TranslationField {
            def,
            base: base.name.clone(),
            language: language.clone(),
        }
    }
}

/// Accessor installed for one translatable base attribute.
///
/// Holds the resolved per-field policy (empty sentinel, fallback value,
/// chain override) and the ordered shadow set. All reads and writes on the
/// base name route through here.
#[derive(Debug, Clone)]
pub struct TranslationAccessor {
    base_def: FieldDef,
    /// (language, shadow name), in registry order.
    shadows: Vec<(Language, String)>,
    empty_sentinel: Option<Value>,
    fallback_value: Option<FallbackValue>,
    fallback_languages: Option<BTreeMap<String, Vec<String>>>,
    fallback_undefined: Option<Value>,
}

impl TranslationAccessor {
    pub(crate) fn new(
        base_def: FieldDef,
        shadows: Vec<(Language, String)>,
        empty_sentinel: Option<Value>,
        fallback_value: Option<FallbackValue>,
        fallback_languages: Option<BTreeMap<String, Vec<String>>>,
        fallback_undefined: Option<Value>,
    ) -> TranslationAccessor {
        TranslationAccessor {
            base_def,
            shadows,
            empty_sentinel,
            fallback_value,
            fallback_languages,
            fallback_undefined,
        }
    }

    /// The base attribute name.
    pub fn base(&self) -> &str {
        &self.base_def.name
    }

    /// Shadow name for one language, when that language is active.
    pub fn shadow_name(&self, language: &Language) -> Option<&str> {
        self.shadows
            .iter()
            .find(|(lang, _)| lang == language)
            .map(|(_, name)| name.as_str())
    }

    /// All shadow names, in registry language order.
    pub fn shadow_names(&self) -> impl Iterator<Item = &str> {
        self.shadows.iter().map(|(_, name)| name.as_str())
    }

    /// Chain-override map declared by this attribute's options, if any.
    pub fn fallback_languages(&self) -> Option<&BTreeMap<String, Vec<String>>> {
        self.fallback_languages.as_ref()
    }

    /// Whether a value counts as "absent" for fallback purposes.
    ///
    /// Null is always absent (shadows are nullable and unset means null).
    /// Beyond that, equality with the configured sentinel, defaulting to the
    /// base kind's natural default for non-nullable base attributes.
    pub fn is_empty(&self, value: &Value) -> bool {
        if value.is_null() {
            return true;
        }
        match &self.empty_sentinel {
            Some(sentinel) => value == sentinel,
            None => !self.base_def.nullable && *value == self.base_def.kind.natural_default(),
        }
    }

    /// Read with fallback resolution. Deterministic and total: yields a
    /// non-empty shadow value, the configured fallback value, the pinned
    /// undefined value, or the natural default, in that priority order.
    pub fn get(&self, slots: &HashMap<String, Value>, registry: &LanguageRegistry) -> Value {
        let active = context::active_language(registry);
        let primary = self
            .shadow_name(&active)
            .and_then(|name| slots.get(name))
            .cloned()
            .unwrap_or(Value::Null);

        if !context::fallbacks_enabled(registry) {
            return primary;
        }
        if !self.is_empty(&primary) {
            return primary;
        }

        let order = registry.resolution_order(&active, self.fallback_languages.as_ref(), true);
        for language in order.iter().skip(1) {
            let candidate = self
                .shadow_name(language)
                .and_then(|name| slots.get(name))
                .cloned()
                .unwrap_or(Value::Null);
            if !self.is_empty(&candidate) {
                return candidate;
            }
        }

        if let Some(fallback) = &self.fallback_value {
            return fallback.resolve();
        }
        if let Some(undefined) = &self.fallback_undefined {
            return undefined.clone();
        }
        self.base_def.natural_default()
    }

    /// Write with redirection: the active language's shadow receives the
    /// value, then the auto-populate mode decides the fan-out. Shadow names
    /// in `provided` were explicitly assigned in the same bulk operation and
    /// are skipped. The base slot itself is never written.
    pub fn set(
        &self,
        slots: &mut HashMap<String, Value>,
        value: Value,
        registry: &LanguageRegistry,
        provided: &HashSet<String>,
    ) {
        let active = context::active_language(registry);
        let active_shadow = match self.shadow_name(&active) {
            Some(name) => name.to_string(),
            None => return,
        };
        slots.insert(active_shadow.clone(), value.clone());

        let mode = context::auto_populate_mode(registry);
        match mode {
            AutoPopulate::Disabled => {}
            AutoPopulate::All => {
                for (_, name) in &self.shadows {
                    if *name != active_shadow && !provided.contains(name) {
                        slots.insert(name.clone(), value.clone());
                    }
                }
            }
            AutoPopulate::Default | AutoPopulate::Required => {
                if mode == AutoPopulate::Required && self.base_def.nullable {
                    return;
                }
                if let Some(name) = self.shadow_name(registry.default_language()) {
                    if name != active_shadow && !provided.contains(name) {
                        slots.insert(name.to_string(), value.clone());
                    }
                }
            }
        }
    }
}

//! Record instances: one row of a translated schema.
//!
//! Attribute access on a translatable base name routes through the schema's
//! accessor; shadow names and plain fields hit their slots directly. The
//! base name's own slot is undefined after registration and is only touched
//! by bulk loads (`set_raw`) and the backfill helper.

use std::collections::{HashMap, HashSet};

use crate::errors::{Result, TranslationError};
use crate::translator::TranslatedSchema;
use crate::value::Value;
use std::sync::Arc;

/// One record of a translated schema.
#[derive(Debug, Clone)]
pub struct Record {
    schema: Arc<TranslatedSchema>,
    slots: HashMap<String, Value>,
}

impl Record {
    /// An empty record. All slots start absent.
    pub fn new(schema: Arc<TranslatedSchema>) -> Record {
        Record {
            schema,
            slots: HashMap::new(),
        }
    }

    /// Construct a record from attribute assignments.
    ///
    /// Base-name assignments apply first (with auto-populate fan-out per the
    /// ambient mode), explicit shadow-name assignments second, so an explicit
    /// shadow always wins over whatever the base-name write produced,
    /// regardless of pair order. Languages explicitly provided are excluded
    /// from fan-out.
    pub fn create<I, K, V>(schema: Arc<TranslatedSchema>, pairs: I) -> Result<Record>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let pairs: Vec<(String, Value)> = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        let provided: HashSet<String> = pairs
            .iter()
            .filter(|(name, _)| schema.shadow_base(name).is_some())
            .map(|(name, _)| name.clone())
            .collect();

        let mut record = Record::new(schema);
        for (name, value) in &pairs {
            if record.schema.shadow_base(name).is_some() {
                continue;
            }
            if let Some(accessor) = record.schema.accessor(name) {
                let registry = Arc::clone(record.schema.registry());
                accessor.set(&mut record.slots, value.clone(), &registry, &provided);
            } else if record.schema.has_field(name) {
                record.slots.insert(name.clone(), value.clone());
            } else {
                return Err(record.unknown(name));
            }
        }
        for (name, value) in pairs {
            if record.schema.shadow_base(&name).is_some() {
                record.slots.insert(name, value);
            }
        }
        Ok(record)
    }

    pub fn schema(&self) -> &Arc<TranslatedSchema> {
        &self.schema
    }

    /// Read an attribute. Translatable base names resolve through the
    /// fallback chain; other fields yield their stored value or natural
    /// default.
    pub fn get(&self, name: &str) -> Result<Value> {
        if let Some(accessor) = self.schema.accessor(name) {
            return Ok(accessor.get(&self.slots, self.schema.registry()));
        }
        match self.schema.find_field(name) {
            Some(field) => Ok(self
                .slots
                .get(name)
                .cloned()
                .unwrap_or_else(|| field.natural_default())),
            None => Err(self.unknown(name)),
        }
    }

    /// Write an attribute. Translatable base names redirect to the active
    /// language's shadow (with fan-out per the ambient auto-populate mode).
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        if let Some(accessor) = self.schema.accessor(name) {
            let registry = Arc::clone(self.schema.registry());
            accessor.set(&mut self.slots, value, &registry, &HashSet::new());
            return Ok(());
        }
        if self.schema.has_field(name) {
            self.slots.insert(name.to_string(), value);
            return Ok(());
        }
        Err(self.unknown(name))
    }

    /// Peek a slot without redirection or defaults.
    pub fn raw(&self, name: &str) -> Option<&Value> {
        self.slots.get(name)
    }

    /// Write a slot without redirection. Bulk/fixture loads use this to
    /// place legacy base-column values; normal code goes through `set`.
    pub fn set_raw(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        if !self.schema.has_field(name) {
            return Err(self.unknown(name));
        }
        self.slots.insert(name.to_string(), value.into());
        Ok(())
    }

    /// The raw slot map, for the host persistence layer.
    pub fn slots(&self) -> &HashMap<String, Value> {
        &self.slots
    }

    fn unknown(&self, name: &str) -> TranslationError {
        TranslationError::UnknownAttribute {
            model: self.schema.name().to_string(),
            attribute: name.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{self, AutoPopulate};
    use crate::language::Language;
    use crate::options::TranslationOptions;
    use crate::registry::LanguageRegistry;
    use crate::schema::{FieldDef, FieldKind, RecordSchema};
    use crate::settings::Settings;
    use crate::translator::Translator;

    fn news() -> Arc<TranslatedSchema> {
        let registry =
            LanguageRegistry::new(&Settings::new(["de", "en"])).expect("registry");
        let mut translator = Translator::new(Arc::new(registry));
        let schema = RecordSchema::new("News")
            .field(FieldDef::new("title", FieldKind::VarChar(255)))
            .field(FieldDef::new("text", FieldKind::Text).nullable())
            .field(FieldDef::new("visits", FieldKind::Integer))
            .build();
        translator
            .register(&schema, TranslationOptions::new().fields(["title", "text"]))
            .expect("register")
    }

    // ==================== Round-trip Tests ====================

    #[test]
    fn test_write_then_read_roundtrip() {
        let mut record = Record::new(news());
        record.set("title", "Enigma").expect("set");
        assert_eq!(record.get("title").expect("get"), Value::from("Enigma"));
        assert_eq!(record.raw("title_de"), Some(&Value::from("Enigma")));
    }

    #[test]
    fn test_write_never_touches_other_languages() {
        let mut record = Record::new(news());
        record.set("title", "Enigma").expect("set");
        assert!(record.raw("title_en").is_none());
        assert!(record.raw("title").is_none());
    }

    #[test]
    fn test_read_redirects_per_active_language() {
        let mut record = Record::new(news());
        record.set_raw("title_de", "Das Boot").expect("raw de");
        record.set_raw("title_en", "The Boat").expect("raw en");

        assert_eq!(record.get("title").expect("get"), Value::from("Das Boot"));
        let _lang = context::override_language(Language::unchecked("en"));
        assert_eq!(record.get("title").expect("get"), Value::from("The Boat"));
    }

    // ==================== Plain Field Tests ====================

    #[test]
    fn test_plain_field_roundtrip() {
        let mut record = Record::new(news());
        record.set("visits", 3i64).expect("set");
        assert_eq!(record.get("visits").expect("get"), Value::Int(3));
    }

    #[test]
    fn test_plain_field_natural_default() {
        let record = Record::new(news());
        assert_eq!(record.get("visits").expect("get"), Value::Int(0));
    }

    #[test]
    fn test_unknown_attribute_rejected() {
        let mut record = Record::new(news());
        assert!(matches!(
            record.set("bogus", 1i64),
            Err(TranslationError::UnknownAttribute { attribute, .. }) if attribute == "bogus"
        ));
        assert!(record.get("bogus").is_err());
    }

    // ==================== Construction Tests ====================

    #[test]
    fn test_create_explicit_shadow_wins() {
        let record = Record::create(
            news(),
            [("title", Value::from("foo")), ("title_de", Value::from("bar"))],
        )
        .expect("create");
        assert_eq!(record.raw("title_de"), Some(&Value::from("bar")));
    }

    #[test]
    fn test_create_shadow_wins_regardless_of_order() {
        let record = Record::create(
            news(),
            [("title_de", Value::from("bar")), ("title", Value::from("foo"))],
        )
        .expect("create");
        assert_eq!(record.raw("title_de"), Some(&Value::from("bar")));
    }

    #[test]
    fn test_create_fan_out_skips_provided_shadow() {
        let _populate = context::override_auto_populate(AutoPopulate::All);
        let record = Record::create(
            news(),
            [("title", Value::from("foo")), ("title_en", Value::from("bar"))],
        )
        .expect("create");
        assert_eq!(record.raw("title_de"), Some(&Value::from("foo")));
        assert_eq!(record.raw("title_en"), Some(&Value::from("bar")));
    }

    #[test]
    fn test_create_unknown_attribute_rejected() {
        let result = Record::create(news(), [("bogus", Value::from("x"))]);
        assert!(matches!(
            result,
            Err(TranslationError::UnknownAttribute { .. })
        ));
    }
}

//! Backfill: seed shadow fields from legacy base-column data.
//!
//! Datasets that predate translation carry their values in the base slot.
//! After registration those slots are no longer consulted by reads, so a
//! one-time copy into a language's shadows is needed before the data is
//! visible again.

use tracing::debug;

use crate::errors::{Result, TranslationError};
use crate::language::Language;
use crate::record::Record;
use crate::value::Value;

/// Copy each legacy base-slot value into `language`'s shadow, for every
/// translatable field whose shadow is still empty. A shadow that already
/// holds a non-empty value is left alone, as is a base slot that is itself
/// empty. Returns how many shadows were filled.
///
/// # Errors
/// `UnknownLanguage` when `language` is not active in the record's registry.
pub fn populate_language(record: &mut Record, language: &Language) -> Result<usize> {
    let schema = record.schema().clone();
    if !schema.registry().contains(language.code()) {
        return Err(TranslationError::UnknownLanguage(
            language.code().to_string(),
        ));
    }

    let mut filled = 0;
    for accessor in schema.accessors() {
        let shadow = match accessor.shadow_name(language) {
            Some(name) => name,
            None => continue,
        };
        let current = record.raw(shadow).cloned().unwrap_or(Value::Null);
        if !accessor.is_empty(&current) {
            continue;
        }
        let legacy = record.raw(accessor.base()).cloned().unwrap_or(Value::Null);
        if accessor.is_empty(&legacy) {
            continue;
        }
        record.set_raw(shadow, legacy)?;
        filled += 1;
    }

    if filled > 0 {
        debug!(
            model = %schema.name(),
            language = %language.code(),
            fields = filled,
            "backfilled translation shadows from base slots"
        );
    }
    Ok(filled)
}

/// Backfill into the registry's default language.
pub fn populate_default(record: &mut Record) -> Result<usize> {
    let default = record.schema().registry().default_language().clone();
    populate_language(record, &default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::TranslationOptions;
    use crate::registry::LanguageRegistry;
    use crate::schema::{FieldDef, FieldKind, RecordSchema};
    use crate::settings::Settings;
    use crate::translator::{TranslatedSchema, Translator};
    use std::sync::Arc;

    fn news() -> Arc<TranslatedSchema> {
        let registry =
            LanguageRegistry::new(&Settings::new(["de", "en"])).expect("registry");
        let mut translator = Translator::new(Arc::new(registry));
        let schema = RecordSchema::new("News")
            .field(FieldDef::new("title", FieldKind::VarChar(255)))
            .field(FieldDef::new("text", FieldKind::Text).nullable())
            .build();
        translator
            .register(&schema, TranslationOptions::new().fields(["title", "text"]))
            .expect("register")
    }

    // ==================== Backfill Tests ====================

    #[test]
    fn test_backfill_copies_base_into_empty_shadow() {
        let mut record = Record::new(news());
        record.set_raw("title", "Legacy headline").expect("raw");

        let filled =
            populate_language(&mut record, &Language::unchecked("de")).expect("backfill");
        assert_eq!(filled, 1);
        assert_eq!(record.raw("title_de"), Some(&Value::from("Legacy headline")));
        assert!(record.raw("title_en").is_none());
    }

    #[test]
    fn test_backfill_skips_filled_shadow() {
        let mut record = Record::new(news());
        record.set_raw("title", "Legacy").expect("raw");
        record.set_raw("title_de", "Translated").expect("raw");

        let filled =
            populate_language(&mut record, &Language::unchecked("de")).expect("backfill");
        assert_eq!(filled, 0);
        assert_eq!(record.raw("title_de"), Some(&Value::from("Translated")));
    }

    #[test]
    fn test_backfill_skips_empty_base() {
        let mut record = Record::new(news());
        record.set_raw("title", "").expect("raw");

        let filled =
            populate_language(&mut record, &Language::unchecked("de")).expect("backfill");
        assert_eq!(filled, 0);
        assert!(record.raw("title_de").is_none());
    }

    #[test]
    fn test_backfill_rejects_inactive_language() {
        let mut record = Record::new(news());
        let result = populate_language(&mut record, &Language::unchecked("fr"));
        assert!(matches!(result, Err(TranslationError::UnknownLanguage(_))));
    }

    #[test]
    fn test_populate_default_targets_default_language() {
        let mut record = Record::new(news());
        record.set_raw("title", "Legacy").expect("raw");
        record.set_raw("text", "Body").expect("raw");

        let filled = populate_default(&mut record).expect("backfill");
        assert_eq!(filled, 2);
        assert_eq!(record.raw("title_de"), Some(&Value::from("Legacy")));
        assert_eq!(record.raw("text_de"), Some(&Value::from("Body")));
    }
}

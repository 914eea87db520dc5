//! Integration tests for the translation layer.
//!
//! These tests exercise the full pipeline across modules: settings →
//! registry → registration → records → queries, the way a host application
//! would drive it.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use proptest::prelude::*;

use translatable::{
    backfill, context, AutoPopulate, FieldDef, FieldKind, Filter, Language, LanguageRegistry,
    Operand, Query, Record, RecordSchema, Settings, TranslationOptions, Translator, Value,
};

// ==================== Test Helpers ====================

/// Route registration logs through the test writer.
fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// de (default) + en, empty fallback map (normalized to fall back to de).
fn two_language_translator() -> Translator {
    init_tracing();
    let registry =
        LanguageRegistry::new(&Settings::new(["de", "en"])).expect("registry should build");
    Translator::new(Arc::new(registry))
}

fn register_news(translator: &mut Translator) -> Arc<translatable::TranslatedSchema> {
    let author = RecordSchema::new("Author")
        .field(FieldDef::new("name", FieldKind::VarChar(100)))
        .build();
    translator
        .register(&author, TranslationOptions::new().field("name"))
        .expect("Author should register");

    let news = RecordSchema::new("News")
        .field(FieldDef::new("title", FieldKind::VarChar(255)))
        .field(FieldDef::new("text", FieldKind::Text).nullable())
        .field(FieldDef::new("visits", FieldKind::Integer))
        .field(FieldDef::new(
            "author",
            FieldKind::ForeignKey("Author".to_string()),
        ))
        .build();
    translator
        .register(&news, TranslationOptions::new().fields(["title", "text"]))
        .expect("News should register")
}

// ==================== Fallback Resolution Scenarios ====================

#[test]
fn test_empty_active_value_falls_back_along_chain() {
    // languages = [de (default), en], chain for en = [de].
    let mut translator = two_language_translator();
    let schema = register_news(&mut translator);

    let mut record = Record::new(schema);
    record.set_raw("title_en", "").expect("raw write");
    record.set_raw("title_de", "Enigma").expect("raw write");

    let _lang = context::override_language(Language::unchecked("en"));
    assert_eq!(record.get("title").expect("read"), Value::from("Enigma"));
}

#[test]
fn test_disabled_fallbacks_return_empty_active_value() {
    let mut translator = two_language_translator();
    let schema = register_news(&mut translator);

    let mut record = Record::new(schema);
    record.set_raw("title_en", "").expect("raw write");
    record.set_raw("title_de", "Enigma").expect("raw write");

    let _lang = context::override_language(Language::unchecked("en"));
    let _fallbacks = context::override_fallbacks(false);
    assert_eq!(record.get("title").expect("read"), Value::from(""));
}

#[test]
fn test_write_then_read_round_trip_per_language() {
    let mut translator = two_language_translator();
    let schema = register_news(&mut translator);
    let mut record = Record::new(schema);

    record.set("title", "Das Boot").expect("write de");
    {
        let _lang = context::override_language(Language::unchecked("en"));
        record.set("title", "The Boat").expect("write en");
        assert_eq!(record.get("title").expect("read"), Value::from("The Boat"));
    }
    assert_eq!(record.get("title").expect("read"), Value::from("Das Boot"));
}

#[test]
fn test_exhausted_chain_uses_configured_fallback_value() {
    let registry =
        LanguageRegistry::new(&Settings::new(["de", "en"])).expect("registry should build");
    let mut translator = Translator::new(Arc::new(registry));
    let schema = RecordSchema::new("Page")
        .field(FieldDef::new("body", FieldKind::Text))
        .build();
    let translated = translator
        .register(
            &schema,
            TranslationOptions::new()
                .field("body")
                .fallback_value("body", "-- untranslated --"),
        )
        .expect("register");

    let record = Record::new(translated);
    assert_eq!(
        record.get("body").expect("read"),
        Value::from("-- untranslated --")
    );
}

// ==================== Chain Configuration Scenarios ====================

#[test]
fn test_explicit_chain_replaces_default_chain() {
    // {"default": ["en","de","fr"], "fr": ["de"]} — fr is explicitly mapped,
    // so its chain is exactly [de]; unmapped uk gets the default chain.
    let mut map = BTreeMap::new();
    map.insert(
        "default".to_string(),
        vec!["en".to_string(), "de".to_string(), "fr".to_string()],
    );
    map.insert("fr".to_string(), vec!["de".to_string()]);
    let settings = Settings::new(["en", "de", "fr", "uk"]).with_fallback_languages(map);
    let registry = LanguageRegistry::new(&settings).expect("registry should build");

    let fr = registry.language("fr").expect("fr");
    assert_eq!(registry.fallback_chain(&fr), vec![Language::unchecked("de")]);

    let uk = registry.language("uk").expect("uk");
    assert_eq!(
        registry.fallback_chain(&uk),
        vec![
            Language::unchecked("en"),
            Language::unchecked("de"),
            Language::unchecked("fr"),
        ]
    );
}

#[test]
fn test_chain_configuration_drives_record_reads() {
    let mut map = BTreeMap::new();
    map.insert(
        "default".to_string(),
        vec!["en".to_string(), "de".to_string(), "fr".to_string()],
    );
    map.insert("fr".to_string(), vec!["de".to_string()]);
    let settings = Settings::new(["en", "de", "fr", "uk"]).with_fallback_languages(map);
    let registry = LanguageRegistry::new(&settings).expect("registry should build");
    let mut translator = Translator::new(Arc::new(registry));

    let schema = RecordSchema::new("Page")
        .field(FieldDef::new("body", FieldKind::Text))
        .build();
    let translated = translator
        .register(&schema, TranslationOptions::new().field("body"))
        .expect("register");

    let mut record = Record::new(translated);
    record.set_raw("body_en", "english").expect("raw write");
    record.set_raw("body_de", "german").expect("raw write");

    // fr's chain is [de]: en must not be consulted.
    {
        let _lang = context::override_language(Language::unchecked("fr"));
        assert_eq!(record.get("body").expect("read"), Value::from("german"));
    }
    // uk's chain is the default one: en comes first.
    {
        let _lang = context::override_language(Language::unchecked("uk"));
        assert_eq!(record.get("body").expect("read"), Value::from("english"));
    }
}

// ==================== Construction Scenarios ====================

#[test]
fn test_construction_conflict_shadow_wins() {
    let mut translator = two_language_translator();
    let schema = register_news(&mut translator);

    let record = Record::create(
        schema,
        [("title", Value::from("foo")), ("title_de", Value::from("bar"))],
    )
    .expect("create");
    assert_eq!(record.raw("title_de"), Some(&Value::from("bar")));
}

#[test]
fn test_construction_with_auto_populate_all() {
    let mut translator = two_language_translator();
    let schema = register_news(&mut translator);

    let _populate = context::override_auto_populate(AutoPopulate::All);
    let record = Record::create(schema, [("title", Value::from("foo"))]).expect("create");
    assert_eq!(record.raw("title_de"), Some(&Value::from("foo")));
    assert_eq!(record.raw("title_en"), Some(&Value::from("foo")));
}

// ==================== Required Languages Scenario ====================

#[test]
fn test_required_languages_mark_presentation_layer() {
    // required_languages = {"de": ("title",), "default": ()}.
    let mut translator = two_language_translator();
    let schema = RecordSchema::new("News")
        .field(FieldDef::new("title", FieldKind::VarChar(255)))
        .field(FieldDef::new("text", FieldKind::Text).nullable())
        .build();
    let translated = translator
        .register(
            &schema,
            TranslationOptions::new()
                .fields(["title", "text"])
                .required_in("de", ["title"])
                .required_in("default", Vec::<String>::new()),
        )
        .expect("register");

    assert!(translated.is_required("title_de"));
    assert!(!translated.is_required("title_en"));
    // Storage nullability is untouched: every shadow stays nullable.
    assert!(translated.find_field("title_de").expect("shadow").nullable);
}

// ==================== Query Pipeline ====================

#[test]
fn test_query_pipeline_rewrites_across_relations() {
    let mut translator = two_language_translator();
    let schema = register_news(&mut translator);

    let _lang = context::override_language(Language::unchecked("en"));
    let query = Query::new(&translator, schema)
        .filter(Filter::cond("title__icontains", "boat"))
        .filter(Filter::cond("author__name", "Buchheim"))
        .order_by(["-title", "visits"]);

    assert_eq!(
        query.filters(),
        &[
            Filter::Cond {
                key: "title_en__icontains".to_string(),
                value: Operand::Value(Value::from("boat")),
            },
            Filter::Cond {
                key: "author__name_en".to_string(),
                value: Operand::Value(Value::from("Buchheim")),
            },
        ]
    );
    assert_eq!(query.order_keys(), &["-title_en", "visits"]);
}

#[test]
fn test_rewrite_false_equals_direct_shadow_naming() {
    let mut translator = two_language_translator();
    let schema = register_news(&mut translator);

    let direct = Query::new(&translator, Arc::clone(&schema))
        .rewrite(false)
        .filter(Filter::cond("title_de", "x"))
        .order_by(["-title_de"]);
    let rewritten = Query::new(&translator, schema)
        .filter(Filter::cond("title", "x"))
        .order_by(["-title"]);

    assert_eq!(direct.filters(), rewritten.filters());
    assert_eq!(direct.order_keys(), rewritten.order_keys());
}

#[test]
fn test_values_projection_resolves_fallback_per_row() {
    let mut translator = two_language_translator();
    let schema = register_news(&mut translator);

    let _lang = context::override_language(Language::unchecked("en"));
    let query = Query::new(&translator, schema).values(["title", "visits"]);

    let mut hit = HashMap::new();
    hit.insert("title_en".to_string(), Value::from("The Boat"));
    hit.insert("title_de".to_string(), Value::from("Das Boot"));
    hit.insert("visits".to_string(), Value::Int(7));
    let mut miss = HashMap::new();
    miss.insert("title_en".to_string(), Value::from(""));
    miss.insert("title_de".to_string(), Value::from("Das Boot"));
    miss.insert("visits".to_string(), Value::Int(2));

    let rows = query.resolve_values_rows(vec![hit, miss]);
    assert_eq!(rows[0]["title"], Value::from("The Boat"));
    assert_eq!(rows[1]["title"], Value::from("Das Boot"));
    assert!(rows.iter().all(|row| !row.contains_key("title_en")));
}

#[test]
fn test_query_create_honors_populate_mode() {
    let mut translator = two_language_translator();
    let schema = register_news(&mut translator);

    let query = Query::new(&translator, schema).populate(AutoPopulate::All);
    let record = query.create([("title", Value::from("foo"))]).expect("create");
    assert_eq!(record.raw("title_de"), Some(&Value::from("foo")));
    assert_eq!(record.raw("title_en"), Some(&Value::from("foo")));
}

// ==================== Backfill Pipeline ====================

#[test]
fn test_backfill_then_read_sees_legacy_data() {
    let mut translator = two_language_translator();
    let schema = register_news(&mut translator);

    let mut record = Record::new(schema);
    record.set_raw("title", "Pre-translation headline").expect("raw");

    // Before backfill the legacy base slot is invisible to reads.
    assert_eq!(record.get("title").expect("read"), Value::from(""));

    let filled = backfill::populate_default(&mut record).expect("backfill");
    assert_eq!(filled, 1);
    assert_eq!(
        record.get("title").expect("read"),
        Value::from("Pre-translation headline")
    );
}

// ==================== Rewriter Properties ====================

fn lookup_key_strategy() -> impl Strategy<Value = String> {
    let field = prop_oneof![
        Just("title".to_string()),
        Just("text".to_string()),
        Just("visits".to_string()),
        Just("title_de".to_string()),
        Just("title_en".to_string()),
    ];
    let suffix = prop_oneof![
        Just(None),
        Just(Some("icontains".to_string())),
        Just(Some("gte".to_string())),
        Just(Some("in".to_string())),
    ];
    let relation = prop_oneof![
        Just(None),
        Just(Some("author__name".to_string())),
        Just(Some("author__name_en".to_string())),
    ];
    (field, suffix, relation).prop_map(|(field, suffix, relation)| {
        let base = match relation {
            Some(path) => path,
            None => field,
        };
        match suffix {
            Some(suffix) => format!("{base}__{suffix}"),
            None => base,
        }
    })
}

proptest! {
    #[test]
    fn prop_rewrite_is_idempotent(key in lookup_key_strategy()) {
        let mut translator = two_language_translator();
        let schema = register_news(&mut translator);
        let once = translatable::query::rewrite_lookup_key(&translator, &schema, &key);
        let twice = translatable::query::rewrite_lookup_key(&translator, &schema, &once);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn prop_qualified_names_never_rewritten(
        base in prop_oneof![Just("title"), Just("text")],
        lang in prop_oneof![Just("de"), Just("en")],
    ) {
        let mut translator = two_language_translator();
        let schema = register_news(&mut translator);
        let key = format!("{base}_{lang}");
        let rewritten = translatable::query::rewrite_lookup_key(&translator, &schema, &key);
        prop_assert_eq!(rewritten, key);
    }
}

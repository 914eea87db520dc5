//! Translator: registers record schemas for translation and synthesizes
//! their augmented schemas.
//!
//! Registration is the one global mutation in the crate and is a one-time,
//! start-of-life operation per record type: it resolves the effective option
//! set along the schema's parent chain, synthesizes one shadow field per
//! (translatable field, active language), installs a `TranslationAccessor`
//! per base name, and returns the resulting `TranslatedSchema`. On any
//! configuration error the type is left unregistered.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use tracing::debug;

use crate::errors::{Result, TranslationError};
use crate::fields::{TranslationAccessor, TranslationField};
use crate::language::Language;
use crate::options::TranslationOptions;
use crate::registry::LanguageRegistry;
use crate::schema::{FieldDef, RecordSchema};

/// A concrete record schema augmented with its shadow fields and accessors.
#[derive(Debug)]
pub struct TranslatedSchema {
    schema: Arc<RecordSchema>,
    registry: Arc<LanguageRegistry>,
    fields: Vec<FieldDef>,
    accessors: BTreeMap<String, TranslationAccessor>,
    shadow_to_base: HashMap<String, (String, Language)>,
    fieldmap: Vec<(String, Vec<String>)>,
    required: HashSet<String>,
}

impl TranslatedSchema {
    pub fn name(&self) -> &str {
        self.schema.name()
    }

    pub fn registry(&self) -> &Arc<LanguageRegistry> {
        &self.registry
    }

    /// The underlying declared schema.
    pub fn record_schema(&self) -> &Arc<RecordSchema> {
        &self.schema
    }

    /// The augmented field list: declared fields with each base's shadows
    /// inserted right after it, root ancestor first.
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    pub fn find_field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.find_field(name).is_some()
    }

    /// The accessor for a translatable base attribute.
    pub fn accessor(&self, base: &str) -> Option<&TranslationAccessor> {
        self.accessors.get(base)
    }

    pub fn accessors(&self) -> impl Iterator<Item = &TranslationAccessor> {
        self.accessors.values()
    }

    /// Whether the name is a translatable base attribute.
    pub fn is_translatable(&self, name: &str) -> bool {
        self.accessors.contains_key(name)
    }

    /// Resolve a shadow name back to (base attribute, language).
    ///
    /// Used by the query rewriter for suffix detection: a name that is a
    /// valid shadow is never rewritten.
    pub fn shadow_base(&self, name: &str) -> Option<(&str, &Language)> {
        self.shadow_to_base
            .get(name)
            .map(|(base, lang)| (base.as_str(), lang))
    }

    /// Presentation contract: base name to its ordered shadow names.
    pub fn fieldmap(&self) -> &[(String, Vec<String>)] {
        &self.fieldmap
    }

    /// Whether a shadow is required at the validation layer.
    ///
    /// Storage nullability stays true regardless; this only drives form and
    /// validation behavior in the host presentation layer.
    pub fn is_required(&self, shadow: &str) -> bool {
        self.required.contains(shadow)
    }
}

/// Registration façade: record types in, translated schemas out.
#[derive(Debug)]
pub struct Translator {
    registry: Arc<LanguageRegistry>,
    models: HashMap<String, Arc<TranslatedSchema>>,
    options: HashMap<String, TranslationOptions>,
}

impl Translator {
    pub fn new(registry: Arc<LanguageRegistry>) -> Translator {
        Translator {
            registry,
            models: HashMap::new(),
            options: HashMap::new(),
        }
    }

    pub fn registry(&self) -> &Arc<LanguageRegistry> {
        &self.registry
    }

    /// Record options for an abstract schema without synthesizing shadows.
    ///
    /// Concrete descendants pick these up when they register.
    pub fn register_abstract(
        &mut self,
        schema: &Arc<RecordSchema>,
        options: TranslationOptions,
    ) -> Result<()> {
        let name = schema.name().to_string();
        if self.options.contains_key(&name) {
            return Err(TranslationError::AlreadyRegistered(name));
        }
        self.validate_fields(schema, &options)?;
        self.validate_languages(&options)?;
        debug!(model = %name, "recorded abstract translation options");
        self.options.insert(name, options);
        Ok(())
    }

    /// Register a concrete schema and synthesize its shadow fields.
    ///
    /// The effective option set is the schema's own options merged over every
    /// registered ancestor's, nearest ancestor winning below the schema's own
    /// entries. Idempotency is guarded: a second registration of the same
    /// type is a configuration error.
    pub fn register(
        &mut self,
        schema: &Arc<RecordSchema>,
        options: TranslationOptions,
    ) -> Result<Arc<TranslatedSchema>> {
        let name = schema.name().to_string();
        if schema.is_abstract() {
            return Err(TranslationError::AbstractSchema(name));
        }
        if self.models.contains_key(&name) || self.options.contains_key(&name) {
            return Err(TranslationError::AlreadyRegistered(name));
        }

        let effective = self.effective_options(schema, options);
        self.validate_fields(schema, &effective)?;
        self.validate_languages(&effective)?;

        let translated = self.synthesize(schema, &effective)?;
        let translated = Arc::new(translated);

        let mut sealed = effective;
        sealed.seal(&name);
        self.options.insert(name.clone(), sealed);
        self.models.insert(name.clone(), Arc::clone(&translated));
        debug!(
            model = %name,
            fields = translated.fieldmap.len(),
            languages = self.registry.active_languages().len(),
            "registered record type for translation"
        );
        Ok(translated)
    }

    /// Register a concrete descendant that has no option set of its own; it
    /// inherits everything from its registered ancestors.
    pub fn register_inherited(
        &mut self,
        schema: &Arc<RecordSchema>,
    ) -> Result<Arc<TranslatedSchema>> {
        self.register(schema, TranslationOptions::new())
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.models.contains_key(name)
    }

    /// The translated schema for a registered concrete type.
    pub fn schema_for(&self, name: &str) -> Result<&Arc<TranslatedSchema>> {
        self.models
            .get(name)
            .ok_or_else(|| TranslationError::NotRegistered(name.to_string()))
    }

    /// The (possibly sealed) option set recorded for a type.
    pub fn options_for(&self, name: &str) -> Result<&TranslationOptions> {
        self.options
            .get(name)
            .ok_or_else(|| TranslationError::NotRegistered(name.to_string()))
    }

    /// Remove a type from the registry.
    pub fn unregister(&mut self, name: &str) -> Result<()> {
        if self.options.remove(name).is_none() {
            return Err(TranslationError::NotRegistered(name.to_string()));
        }
        self.models.remove(name);
        Ok(())
    }

    fn effective_options(
        &self,
        schema: &Arc<RecordSchema>,
        own: TranslationOptions,
    ) -> TranslationOptions {
        // Ancestor options root-first, so nearer ancestors win on merge.
        let mut chain: Vec<&TranslationOptions> = Vec::new();
        let mut cursor = schema.parent_schema();
        while let Some(parent) = cursor {
            if let Some(opts) = self.options.get(parent.name()) {
                chain.push(opts);
            }
            cursor = parent.parent_schema();
        }

        let mut merged = TranslationOptions::new();
        for ancestor in chain.iter().rev() {
            merged = ancestor.merged_over(&merged);
        }
        own.merged_over(&merged)
    }

    fn validate_fields(
        &self,
        schema: &Arc<RecordSchema>,
        options: &TranslationOptions,
    ) -> Result<()> {
        for field_name in &options.fields {
            let field = schema.find_field(field_name).ok_or_else(|| {
                TranslationError::UnknownField {
                    model: schema.name().to_string(),
                    field: field_name.clone(),
                }
            })?;
            if !field.kind.is_translatable() {
                return Err(TranslationError::UnsupportedField {
                    model: schema.name().to_string(),
                    field: field_name.clone(),
                    kind: field.kind.clone(),
                });
            }
        }
        Ok(())
    }

    fn validate_languages(&self, options: &TranslationOptions) -> Result<()> {
        for code in options.required_languages.languages() {
            if code != "default" && !self.registry.contains(code) {
                return Err(TranslationError::UnknownLanguage(code.to_string()));
            }
        }
        if let Some(map) = &options.fallback_languages {
            for (key, chain) in map {
                if key != "default" && !self.registry.contains(key) {
                    return Err(TranslationError::FallbackNotActive {
                        key: key.clone(),
                        lang: key.clone(),
                    });
                }
                for code in chain {
                    if !self.registry.contains(code) {
                        return Err(TranslationError::FallbackNotActive {
                            key: key.clone(),
                            lang: code.clone(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    fn synthesize(
        &self,
        schema: &Arc<RecordSchema>,
        options: &TranslationOptions,
    ) -> Result<TranslatedSchema> {
        let translatable: HashSet<&str> =
            options.fields.iter().map(String::as_str).collect();

        let mut fields: Vec<FieldDef> = Vec::new();
        let mut shadow_to_base: HashMap<String, (String, Language)> = HashMap::new();
        let mut accessors: BTreeMap<String, TranslationAccessor> = BTreeMap::new();
        let mut fieldmap_by_base: HashMap<String, Vec<String>> = HashMap::new();
        let mut required: HashSet<String> = HashSet::new();

        for base in schema.all_fields() {
            fields.push(base.clone());
            if !translatable.contains(base.name.as_str()) {
                continue;
            }

            let mut shadows: Vec<(Language, String)> = Vec::new();
            for language in self.registry.active_languages() {
                let shadow = TranslationField::new(base, language);
                let shadow_name = shadow.def.name.clone();
                if schema.has_field(&shadow_name) || shadow_to_base.contains_key(&shadow_name) {
                    return Err(TranslationError::FieldCollision {
                        model: schema.name().to_string(),
                        field: shadow_name,
                    });
                }
                if options
                    .required_languages
                    .requires(language.code(), &base.name)
                {
                    required.insert(shadow_name.clone());
                }
                shadow_to_base.insert(
                    shadow_name.clone(),
                    (base.name.clone(), language.clone()),
                );
                shadows.push((language.clone(), shadow_name.clone()));
                fields.push(shadow.def);
            }

            fieldmap_by_base.insert(
                base.name.clone(),
                shadows.iter().map(|(_, name)| name.clone()).collect(),
            );
            accessors.insert(
                base.name.clone(),
                TranslationAccessor::new(
                    base.clone(),
                    shadows,
                    options.empty_values.get(&base.name).cloned(),
                    options.fallback_value_for(&base.name).cloned(),
                    options.fallback_languages.clone(),
                    options.fallback_undefined.get(&base.name).cloned(),
                ),
            );
        }

        // Fieldmap in options declaration order.
        let fieldmap = options
            .fields
            .iter()
            .filter_map(|base| {
                fieldmap_by_base
                    .get(base)
                    .map(|shadows| (base.clone(), shadows.clone()))
            })
            .collect();

        Ok(TranslatedSchema {
            schema: Arc::clone(schema),
            registry: Arc::clone(&self.registry),
            fields,
            accessors,
            shadow_to_base,
            fieldmap,
            required,
        })
    }
}

//! Language registry: single source of truth for active languages.
//!
//! The registry is built once from `Settings` and is immutable afterwards.
//! It owns the ordered active-language list, the default language and the
//! fallback-chain configuration, and it performs every fail-fast validation
//! the settings require. All other components consult it through shared
//! references.

use std::collections::BTreeMap;

use crate::context::AutoPopulate;
use crate::errors::{Result, TranslationError};
use crate::language::Language;
use crate::settings::Settings;

/// Validated, immutable language configuration.
#[derive(Debug, Clone)]
pub struct LanguageRegistry {
    languages: Vec<Language>,
    default: Language,
    fallback_map: BTreeMap<String, Vec<Language>>,
    enable_fallbacks: bool,
    auto_populate: AutoPopulate,
}

impl LanguageRegistry {
    /// Build a registry from settings.
    ///
    /// Fails fast with a configuration error when:
    /// * the language list is empty,
    /// * the default-language override is not an active language,
    /// * a non-empty fallback map lacks a `"default"` key,
    /// * any fallback map key or chain member is not an active language.
    ///
    /// An empty fallback map is normalized to falling back to the default
    /// language.
    pub fn new(settings: &Settings) -> Result<LanguageRegistry> {
        if settings.languages.is_empty() {
            return Err(TranslationError::EmptyLanguages);
        }
        let languages: Vec<Language> = settings
            .languages
            .iter()
            .map(Language::unchecked)
            .collect();

        let default = match &settings.default_language {
            Some(code) => {
                let lang = Language::unchecked(code);
                if !languages.contains(&lang) {
                    return Err(TranslationError::DefaultNotActive(code.clone()));
                }
                lang
            }
            None => languages[0].clone(),
        };

        let mut fallback_map: BTreeMap<String, Vec<Language>> = BTreeMap::new();
        if settings.fallback_languages.is_empty() {
            fallback_map.insert("default".to_string(), vec![default.clone()]);
        } else {
            if !settings.fallback_languages.contains_key("default") {
                return Err(TranslationError::MissingDefaultChain);
            }
            for (key, chain) in &settings.fallback_languages {
                if key != "default" && !languages.iter().any(|l| l.code() == key) {
                    return Err(TranslationError::FallbackNotActive {
                        key: key.clone(),
                        lang: key.clone(),
                    });
                }
                let mut validated = Vec::with_capacity(chain.len());
                for code in chain {
                    let lang = Language::unchecked(code);
                    if !languages.contains(&lang) {
                        return Err(TranslationError::FallbackNotActive {
                            key: key.clone(),
                            lang: code.clone(),
                        });
                    }
                    validated.push(lang);
                }
                fallback_map.insert(key.clone(), validated);
            }
        }

        Ok(LanguageRegistry {
            languages,
            default,
            fallback_map,
            enable_fallbacks: settings.enable_fallbacks,
            auto_populate: settings.auto_populate,
        })
    }

    /// The active languages, in configuration order.
    pub fn active_languages(&self) -> &[Language] {
        &self.languages
    }

    /// The default language: position 0 unless overridden.
    pub fn default_language(&self) -> &Language {
        &self.default
    }

    /// Whether the code names an active language.
    pub fn contains(&self, code: &str) -> bool {
        self.languages.iter().any(|l| l.code() == code)
    }

    /// Look up an active language by code.
    ///
    /// # Returns
    /// * `Ok(Language)` when the code is active
    /// * `Err(TranslationError::UnknownLanguage)` otherwise
    pub fn language(&self, code: &str) -> Result<Language> {
        self.languages
            .iter()
            .find(|l| l.code() == code)
            .cloned()
            .ok_or_else(|| TranslationError::UnknownLanguage(code.to_string()))
    }

    /// Process-default fallback-enabled flag (overridable per scope).
    pub fn enable_fallbacks(&self) -> bool {
        self.enable_fallbacks
    }

    /// Process-default auto-populate mode (overridable per scope).
    pub fn auto_populate(&self) -> AutoPopulate {
        self.auto_populate
    }

    /// The fallback chain consulted when `language`'s own value is empty.
    ///
    /// The explicit chain configured for `language` when one exists,
    /// otherwise the `"default"` chain. Deduplicated preserving first
    /// occurrence; never contains `language` itself.
    pub fn fallback_chain(&self, language: &Language) -> Vec<Language> {
        self.chain_from(language, &self.fallback_map)
    }

    /// Full resolution order for reads: the language itself, then its chain.
    ///
    /// `override_map`, when present, shadows the registry's configured chains
    /// key by key (an option set's `fallback_languages` declaration). With
    /// `fallbacks` off the order is just the language itself.
    pub fn resolution_order(
        &self,
        language: &Language,
        override_map: Option<&BTreeMap<String, Vec<String>>>,
        fallbacks: bool,
    ) -> Vec<Language> {
        if !fallbacks {
            return vec![language.clone()];
        }
        let chain = match override_map {
            Some(map) => {
                let merged = self.merge_override(map);
                self.chain_from(language, &merged)
            }
            None => self.fallback_chain(language),
        };
        let mut order = Vec::with_capacity(chain.len() + 1);
        order.push(language.clone());
        order.extend(chain);
        order
    }

    fn merge_override(
        &self,
        override_map: &BTreeMap<String, Vec<String>>,
    ) -> BTreeMap<String, Vec<Language>> {
        let mut merged = self.fallback_map.clone();
        for (key, chain) in override_map {
            merged.insert(
                key.clone(),
                chain.iter().map(Language::unchecked).collect(),
            );
        }
        merged
    }

    fn chain_from(
        &self,
        language: &Language,
        map: &BTreeMap<String, Vec<Language>>,
    ) -> Vec<Language> {
        let raw = map
            .get(language.code())
            .or_else(|| map.get("default"))
            .map(Vec::as_slice)
            .unwrap_or(&[]);

        let mut chain: Vec<Language> = Vec::with_capacity(raw.len());
        for lang in raw {
            if lang != language && !chain.contains(lang) {
                chain.push(lang.clone());
            }
        }
        chain
    }
}

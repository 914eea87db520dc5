//! Process-wide translation settings.
//!
//! Settings are read once at start-up and handed to `LanguageRegistry::new`,
//! which performs all validation. Changes after registry construction are not
//! observed.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::context::AutoPopulate;

/// Translation layer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Active language codes, in order. The first is the default language
    /// unless `default_language` overrides it.
    pub languages: Vec<String>,

    /// Optional default-language override. Must be an active language.
    #[serde(default)]
    pub default_language: Option<String>,

    /// Fallback chains keyed by language code, with a mandatory "default"
    /// key. An empty map means "fall back to the default language".
    #[serde(default)]
    pub fallback_languages: BTreeMap<String, Vec<String>>,

    /// Whether fallback resolution is on unless a scope overrides it.
    #[serde(default = "default_enable_fallbacks")]
    pub enable_fallbacks: bool,

    /// Write-time fan-out mode unless a scope overrides it.
    #[serde(default)]
    pub auto_populate: AutoPopulate,
}

fn default_enable_fallbacks() -> bool {
    true
}

impl Settings {
    /// Minimal settings: the given languages, first one default, fallbacks
    /// enabled, no auto-population.
    pub fn new<I, S>(languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Settings {
            languages: languages.into_iter().map(Into::into).collect(),
            default_language: None,
            fallback_languages: BTreeMap::new(),
            enable_fallbacks: true,
            auto_populate: AutoPopulate::Disabled,
        }
    }

    /// Set the default-language override.
    pub fn with_default_language(mut self, code: impl Into<String>) -> Self {
        self.default_language = Some(code.into());
        self
    }

    /// Set the fallback-chain map. Must contain a "default" key; validated
    /// by `LanguageRegistry::new`.
    pub fn with_fallback_languages(mut self, map: BTreeMap<String, Vec<String>>) -> Self {
        self.fallback_languages = map;
        self
    }

    /// Set the process-default fallback-enabled flag.
    pub fn with_enable_fallbacks(mut self, enabled: bool) -> Self {
        self.enable_fallbacks = enabled;
        self
    }

    /// Set the process-default auto-populate mode.
    pub fn with_auto_populate(mut self, mode: AutoPopulate) -> Self {
        self.auto_populate = mode;
        self
    }

    /// Load settings from environment variables.
    ///
    /// * `TRANSLATABLE_LANGUAGES` - comma-separated codes (required)
    /// * `TRANSLATABLE_DEFAULT_LANGUAGE` - optional override
    /// * `TRANSLATABLE_FALLBACK_LANGUAGES` - optional; either a comma list
    ///   (becomes the "default" chain) or a JSON object of chains
    /// * `TRANSLATABLE_ENABLE_FALLBACKS` - optional bool, default true
    /// * `TRANSLATABLE_AUTO_POPULATE` - optional: disabled/all/default/required
    pub fn from_env() -> Result<Self> {
        // Load .env if present (ignored in production).
        let _ = dotenvy::dotenv();

        let languages: Vec<String> = std::env::var("TRANSLATABLE_LANGUAGES")
            .context("TRANSLATABLE_LANGUAGES not set")?
            .split(',')
            .map(|code| code.trim().to_string())
            .filter(|code| !code.is_empty())
            .collect();

        let fallback_languages = match std::env::var("TRANSLATABLE_FALLBACK_LANGUAGES") {
            Ok(raw) => parse_fallback_languages(&raw)
                .context("TRANSLATABLE_FALLBACK_LANGUAGES is not a comma list or JSON object")?,
            Err(_) => BTreeMap::new(),
        };

        Ok(Settings {
            languages,
            default_language: std::env::var("TRANSLATABLE_DEFAULT_LANGUAGE").ok(),
            fallback_languages,
            enable_fallbacks: std::env::var("TRANSLATABLE_ENABLE_FALLBACKS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            auto_populate: std::env::var("TRANSLATABLE_AUTO_POPULATE")
                .ok()
                .and_then(|v| parse_auto_populate(&v))
                .unwrap_or(AutoPopulate::Disabled),
        })
    }

    /// Load settings from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("invalid settings file {}", path.display()))
    }
}

fn parse_fallback_languages(raw: &str) -> Result<BTreeMap<String, Vec<String>>> {
    let raw = raw.trim();
    if raw.starts_with('{') {
        Ok(serde_json::from_str(raw)?)
    } else {
        // Comma list form: becomes the shared "default" chain.
        let chain: Vec<String> = raw
            .split(',')
            .map(|code| code.trim().to_string())
            .filter(|code| !code.is_empty())
            .collect();
        let mut map = BTreeMap::new();
        map.insert("default".to_string(), chain);
        Ok(map)
    }
}

fn parse_auto_populate(raw: &str) -> Option<AutoPopulate> {
    match raw.to_ascii_lowercase().as_str() {
        "disabled" | "false" | "none" => Some(AutoPopulate::Disabled),
        "all" | "true" => Some(AutoPopulate::All),
        "default" => Some(AutoPopulate::Default),
        "required" => Some(AutoPopulate::Required),
        _ => None,
    }
}

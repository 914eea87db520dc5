//! Language type: validated language codes and localized field naming.
//!
//! A `Language` is a cheap-to-clone BCP-47-like code. Codes are validated
//! against the `LanguageRegistry` on construction through the registry;
//! `Language::unchecked` exists for registry-internal construction and tests.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A language code (e.g. "en", "de", "es-ar").
///
/// Equality and hashing are by code. Ordering position (and therefore which
/// language is the default) is owned by the registry, not the code itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Language {
    code: String,
}

impl Language {
    /// Wrap a code without registry validation.
    ///
    /// Registry construction and lookup use this; callers should prefer
    /// `LanguageRegistry::language`, which rejects inactive codes.
    pub fn unchecked(code: impl Into<String>) -> Language {
        Language { code: code.into() }
    }

    /// The language code.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// The suffix this language contributes to shadow field names.
    ///
    /// Regionalized codes swap `-` for `_` so the result stays a single
    /// identifier segment ("es-ar" -> "es_ar"). The Indonesian code "id" maps
    /// to "ind": an `_id` suffix would be indistinguishable from the key
    /// columns most hosts generate.
    pub fn field_suffix(&self) -> String {
        if self.code == "id" {
            return "ind".to_string();
        }
        self.code.replace('-', "_")
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code)
    }
}

/// Build the shadow field name for a base field in the given language.
///
/// # Example
/// `localized_name("title", &de)` is `"title_de"`.
pub fn localized_name(base: &str, language: &Language) -> String {
    format!("{}_{}", base, language.field_suffix())
}

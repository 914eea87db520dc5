//! Ambient, scoped translation context.
//!
//! The active language, the fallback-enabled flag and the auto-populate mode
//! are thread-local overrides over the registry defaults. Overrides are RAII
//! guards: the previous value is restored in `Drop`, so restoration holds on
//! every exit path, including unwinding. Each unit of concurrent work gets
//! its own context; nothing here is shared across threads.

use std::cell::RefCell;

use serde::{Deserialize, Serialize};

use crate::language::Language;
use crate::registry::LanguageRegistry;

/// Write-time fan-out mode for translatable attributes.
///
/// Decides which unprovided language shadows are filled when a base
/// attribute is assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AutoPopulate {
    /// Only the active language's shadow is written.
    #[default]
    Disabled,
    /// Every active language's shadow receives the value.
    All,
    /// Only the default language's shadow additionally receives the value.
    Default,
    /// Like `Default`, but only for non-nullable base attributes.
    Required,
}

#[derive(Default)]
struct ContextState {
    language: Option<Language>,
    fallbacks: Option<bool>,
    auto_populate: Option<AutoPopulate>,
}

thread_local! {
    static CONTEXT: RefCell<ContextState> = RefCell::new(ContextState::default());
}

/// The language currently governing read/write redirection.
///
/// Returns the scoped override when one is active, otherwise the registry's
/// default language.
pub fn active_language(registry: &LanguageRegistry) -> Language {
    CONTEXT.with(|ctx| {
        ctx.borrow()
            .language
            .clone()
            .unwrap_or_else(|| registry.default_language().clone())
    })
}

/// Whether fallback resolution currently applies.
pub fn fallbacks_enabled(registry: &LanguageRegistry) -> bool {
    CONTEXT.with(|ctx| {
        ctx.borrow()
            .fallbacks
            .unwrap_or_else(|| registry.enable_fallbacks())
    })
}

/// The current write-time fan-out mode.
pub fn auto_populate_mode(registry: &LanguageRegistry) -> AutoPopulate {
    CONTEXT.with(|ctx| {
        ctx.borrow()
            .auto_populate
            .unwrap_or_else(|| registry.auto_populate())
    })
}

/// Activate a language for the lifetime of the returned guard.
#[must_use = "the override ends when the guard is dropped"]
pub fn override_language(language: Language) -> LanguageOverride {
    let previous = CONTEXT.with(|ctx| ctx.borrow_mut().language.replace(language));
    LanguageOverride { previous }
}

/// Switch fallbacks on or off for the lifetime of the returned guard.
///
/// Disabling fallbacks is how callers check whether a value exists for the
/// active language itself, rather than somewhere down the chain.
#[must_use = "the override ends when the guard is dropped"]
pub fn override_fallbacks(enabled: bool) -> FallbacksOverride {
    let previous = CONTEXT.with(|ctx| ctx.borrow_mut().fallbacks.replace(enabled));
    FallbacksOverride { previous }
}

/// Override the auto-populate mode for the lifetime of the returned guard.
#[must_use = "the override ends when the guard is dropped"]
pub fn override_auto_populate(mode: AutoPopulate) -> AutoPopulateOverride {
    let previous = CONTEXT.with(|ctx| ctx.borrow_mut().auto_populate.replace(mode));
    AutoPopulateOverride { previous }
}

/// Scoped active-language override.
pub struct LanguageOverride {
    previous: Option<Language>,
}

impl Drop for LanguageOverride {
    fn drop(&mut self) {
        let previous = self.previous.take();
        CONTEXT.with(|ctx| ctx.borrow_mut().language = previous);
    }
}

/// Scoped fallback-enablement override.
pub struct FallbacksOverride {
    previous: Option<bool>,
}

impl Drop for FallbacksOverride {
    fn drop(&mut self) {
        CONTEXT.with(|ctx| ctx.borrow_mut().fallbacks = self.previous);
    }
}

/// Scoped auto-populate override.
pub struct AutoPopulateOverride {
    previous: Option<AutoPopulate>,
}

impl Drop for AutoPopulateOverride {
    fn drop(&mut self) {
        CONTEXT.with(|ctx| ctx.borrow_mut().auto_populate = self.previous);
    }
}

//! Error taxonomy for the translation layer.
//!
//! Configuration errors are fatal and surface at registry construction or
//! schema registration time, never during attribute access or query
//! rewriting. Usage errors are caller-correctable and surface at call time.
//! An exhausted fallback chain is not an error: resolution always ends in the
//! configured fallback value or the field's natural default.

use thiserror::Error;

use crate::schema::FieldKind;

/// All errors produced by this crate.
#[derive(Debug, Error)]
pub enum TranslationError {
    // ==================== Configuration errors ====================
    /// The settings carry no active languages.
    #[error("no active languages configured")]
    EmptyLanguages,

    /// The default-language override is not in the active language list.
    #[error("default language '{0}' is not an active language")]
    DefaultNotActive(String),

    /// A non-empty fallback map must carry a "default" chain.
    #[error("fallback languages map does not contain a 'default' key")]
    MissingDefaultChain,

    /// A fallback map key or chain member is not an active language.
    #[error("fallback language '{lang}' (under key '{key}') is not an active language")]
    FallbackNotActive { key: String, lang: String },

    /// A language code was used that the registry does not know.
    #[error("unknown or inactive language code '{0}'")]
    UnknownLanguage(String),

    /// A record type may be registered for translation exactly once.
    #[error("type '{0}' is already registered for translation")]
    AlreadyRegistered(String),

    /// A generated shadow field name collides with a declared field.
    #[error("translation field '{field}' on '{model}' collides with an existing field")]
    FieldCollision { model: String, field: String },

    /// The field's storage kind cannot carry per-language copies.
    #[error("field '{field}' on '{model}' has kind {kind:?}, which cannot be translated")]
    UnsupportedField {
        model: String,
        field: String,
        kind: FieldKind,
    },

    /// An option set names a field the schema does not declare.
    #[error("unknown field '{field}' on '{model}'")]
    UnknownField { model: String, field: String },

    // ==================== Usage errors ====================
    /// The record type was never registered for translation.
    #[error("type '{0}' is not registered for translation")]
    NotRegistered(String),

    /// Attribute access on a name the schema does not declare.
    #[error("unknown attribute '{attribute}' on '{model}'")]
    UnknownAttribute { model: String, attribute: String },

    /// Option sets that already produced shadow fields are closed.
    #[error("translation options for '{0}' are already applied and cannot be extended")]
    SealedOptions(String),

    /// `register` requires a concrete schema; abstract ones only record options.
    #[error("'{0}' is abstract; use register_abstract to record its options")]
    AbstractSchema(String),
}

pub type Result<T> = std::result::Result<T, TranslationError>;

//! Field-level translation for record schemas.
//!
//! A record type declares which of its fields are translatable; registration
//! synthesizes one nullable shadow field per (field, active language) and
//! installs an accessor on the base name. From then on, reads on the base
//! name resolve through the active language and its fallback chain, writes
//! redirect to the active language's shadow, and query primitives are
//! rewritten to the language-qualified names. The active language, fallback
//! enablement and write fan-out are scoped thread-local overrides.
//!
//! Typical setup:
//!
//! ```
//! use std::sync::Arc;
//! use translatable::{
//!     FieldDef, FieldKind, LanguageRegistry, RecordSchema, Settings,
//!     TranslationOptions, Translator,
//! };
//!
//! # fn main() -> translatable::Result<()> {
//! let registry = Arc::new(LanguageRegistry::new(&Settings::new(["de", "en"]))?);
//! let mut translator = Translator::new(registry);
//!
//! let news = RecordSchema::new("News")
//!     .field(FieldDef::new("title", FieldKind::VarChar(255)))
//!     .build();
//! let schema = translator.register(&news, TranslationOptions::new().field("title"))?;
//! assert!(schema.has_field("title_de"));
//! # Ok(())
//! # }
//! ```

pub mod backfill;
pub mod context;
pub mod errors;
pub mod fields;
pub mod language;
pub mod options;
pub mod query;
pub mod record;
pub mod registry;
pub mod schema;
pub mod settings;
pub mod translator;
pub mod value;

pub use context::{
    override_auto_populate, override_fallbacks, override_language, AutoPopulate,
    AutoPopulateOverride, FallbacksOverride, LanguageOverride,
};
pub use errors::{Result, TranslationError};
pub use fields::{TranslationAccessor, TranslationField};
pub use language::{localized_name, Language};
pub use options::{FallbackValue, RequiredLanguages, TranslationOptions};
pub use query::{ArithOp, Filter, Operand, Query};
pub use record::Record;
pub use registry::LanguageRegistry;
pub use schema::{FieldDef, FieldKind, RecordSchema};
pub use settings::Settings;
pub use translator::{TranslatedSchema, Translator};
pub use value::Value;

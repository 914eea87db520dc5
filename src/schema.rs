//! Record schemas: the host persistence layer's view of a record type.
//!
//! A `RecordSchema` declares the fields a record type stores, its optional
//! parent schema and whether it is abstract. Registration with the
//! `Translator` produces an augmented `TranslatedSchema` (see
//! `translator.rs`); nothing here mutates a live schema.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// Storage kind of a field.
///
/// `Binary` and `ForeignKey` fields exist for schema completeness and for
/// relation traversal in lookup paths, but cannot themselves be registered
/// for translation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    Text,
    VarChar(u32),
    Integer,
    BigInt,
    Float,
    Boolean,
    Date,
    DateTime,
    Json,
    Binary,
    ForeignKey(String),
}

impl FieldKind {
    /// Whether fields of this kind may carry per-language copies.
    pub fn is_translatable(&self) -> bool {
        !matches!(self, FieldKind::Binary | FieldKind::ForeignKey(_))
    }

    /// The value a non-nullable field of this kind yields when never set.
    pub fn natural_default(&self) -> Value {
        match self {
            FieldKind::Text | FieldKind::VarChar(_) => Value::Str(String::new()),
            FieldKind::Integer | FieldKind::BigInt => Value::Int(0),
            FieldKind::Float => Value::Float(0.0),
            FieldKind::Boolean => Value::Bool(false),
            FieldKind::Date
            | FieldKind::DateTime
            | FieldKind::Json
            | FieldKind::Binary
            | FieldKind::ForeignKey(_) => Value::Null,
        }
    }
}

/// One declared field of a record type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    pub kind: FieldKind,
    pub nullable: bool,
    /// Declared default, when the schema specifies one.
    pub default: Option<Value>,
    /// Human-readable label for the presentation layer.
    pub verbose_name: Option<String>,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> FieldDef {
        FieldDef {
            name: name.into(),
            kind,
            nullable: false,
            default: None,
            verbose_name: None,
        }
    }

    pub fn nullable(mut self) -> FieldDef {
        self.nullable = true;
        self
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> FieldDef {
        self.default = Some(value.into());
        self
    }

    pub fn with_verbose_name(mut self, name: impl Into<String>) -> FieldDef {
        self.verbose_name = Some(name.into());
        self
    }

    /// The value this field yields when never set: null when nullable,
    /// otherwise the declared default, otherwise the kind's natural default.
    pub fn natural_default(&self) -> Value {
        if let Some(default) = &self.default {
            return default.clone();
        }
        if self.nullable {
            return Value::Null;
        }
        self.kind.natural_default()
    }
}

/// A record type's declared schema.
///
/// Schemas form a single-parent chain; abstract schemas contribute fields
/// and translation options to concrete descendants but never store rows
/// themselves.
#[derive(Debug, Clone)]
pub struct RecordSchema {
    name: String,
    fields: Vec<FieldDef>,
    parent: Option<Arc<RecordSchema>>,
    is_abstract: bool,
}

impl RecordSchema {
    pub fn new(name: impl Into<String>) -> RecordSchema {
        RecordSchema {
            name: name.into(),
            fields: Vec::new(),
            parent: None,
            is_abstract: false,
        }
    }

    pub fn field(mut self, def: FieldDef) -> RecordSchema {
        self.fields.push(def);
        self
    }

    pub fn parent(mut self, parent: Arc<RecordSchema>) -> RecordSchema {
        self.parent = Some(parent);
        self
    }

    pub fn abstract_schema(mut self) -> RecordSchema {
        self.is_abstract = true;
        self
    }

    pub fn build(self) -> Arc<RecordSchema> {
        Arc::new(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    pub fn parent_schema(&self) -> Option<&Arc<RecordSchema>> {
        self.parent.as_ref()
    }

    /// Fields declared directly on this schema, excluding inherited ones.
    pub fn own_fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// All fields, root ancestor first.
    pub fn all_fields(&self) -> Vec<&FieldDef> {
        let mut fields = match &self.parent {
            Some(parent) => parent.all_fields(),
            None => Vec::new(),
        };
        fields.extend(self.fields.iter());
        fields
    }

    /// Look up a field anywhere on the inheritance chain.
    pub fn find_field(&self, name: &str) -> Option<&FieldDef> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .or_else(|| self.parent.as_deref().and_then(|p| p.find_field(name)))
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.find_field(name).is_some()
    }
}

//! Query rewriting: translatable names in query primitives become the
//! active language's shadow names before the host executes anything.
//!
//! The expression tree is a closed set of variants (`Filter`, `Operand`);
//! rewriting is a structural pass with one rule: an unqualified translatable
//! base name becomes `base_<lang>`, a name that already carries a valid
//! language suffix is left alone, and relation paths are rewritten per
//! segment. The pass is purely transformational and idempotent: running it
//! on its own output changes nothing.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::context::{self, AutoPopulate};
use crate::errors::Result;
use crate::language::Language;
use crate::record::Record;
use crate::schema::FieldKind;
use crate::translator::{TranslatedSchema, Translator};
use crate::value::Value;

/// Arithmetic combinator inside expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

/// Right-hand side of a condition, or a standalone expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// A literal value.
    Value(Value),
    /// A literal list (e.g. for `in` lookups).
    List(Vec<Value>),
    /// A symbolic reference to another field of the same record type.
    Field(String),
    /// Arithmetic over two operands.
    Combined {
        lhs: Box<Operand>,
        op: ArithOp,
        rhs: Box<Operand>,
    },
    /// String concatenation of operands.
    Concat(Vec<Operand>),
}

impl From<Value> for Operand {
    fn from(value: Value) -> Operand {
        Operand::Value(value)
    }
}

impl From<&str> for Operand {
    fn from(value: &str) -> Operand {
        Operand::Value(Value::from(value))
    }
}

impl From<String> for Operand {
    fn from(value: String) -> Operand {
        Operand::Value(Value::from(value))
    }
}

impl From<i64> for Operand {
    fn from(value: i64) -> Operand {
        Operand::Value(Value::Int(value))
    }
}

impl From<f64> for Operand {
    fn from(value: f64) -> Operand {
        Operand::Value(Value::Float(value))
    }
}

impl From<bool> for Operand {
    fn from(value: bool) -> Operand {
        Operand::Value(Value::Bool(value))
    }
}

impl From<Vec<Value>> for Operand {
    fn from(values: Vec<Value>) -> Operand {
        Operand::List(values)
    }
}

impl Operand {
    /// A symbolic field reference (`F("title")` in the host's terms).
    pub fn field(name: impl Into<String>) -> Operand {
        Operand::Field(name.into())
    }
}

/// A predicate tree over lookup keys.
///
/// Keys are `"__"`-joined paths: relation segments, a translatable or plain
/// field segment, and optionally a final lookup suffix (`contains`, `in`,
/// `gte`, ...) which is preserved verbatim by rewriting.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Cond { key: String, value: Operand },
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
}

impl Filter {
    pub fn cond(key: impl Into<String>, value: impl Into<Operand>) -> Filter {
        Filter::Cond {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn and(children: Vec<Filter>) -> Filter {
        Filter::And(children)
    }

    pub fn or(children: Vec<Filter>) -> Filter {
        Filter::Or(children)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(child: Filter) -> Filter {
        Filter::Not(Box::new(child))
    }
}

/// Rewrite one lookup key for the active language.
///
/// The first segment is substituted when it is an unqualified translatable
/// base name; a segment that is already a valid shadow name is untouched
/// (suffix detection takes priority over base-name matching). When the first
/// segment is a relation to another registered type, the remainder is
/// rewritten against that type, so every level of a spanned path gets the
/// same treatment.
pub fn rewrite_lookup_key(
    translator: &Translator,
    model: &TranslatedSchema,
    key: &str,
) -> String {
    let language = context::active_language(model.registry());
    rewrite_segments(translator, model, key, &language)
}

/// Rewrite an ordering key, preserving a leading descending marker.
pub fn rewrite_order_key(
    translator: &Translator,
    model: &TranslatedSchema,
    key: &str,
) -> String {
    match key.strip_prefix('-') {
        Some(rest) => format!("-{}", rewrite_lookup_key(translator, model, rest)),
        None => rewrite_lookup_key(translator, model, key),
    }
}

fn rewrite_segments(
    translator: &Translator,
    model: &TranslatedSchema,
    key: &str,
    language: &Language,
) -> String {
    let (head, rest) = match key.split_once("__") {
        Some((head, rest)) => (head, Some(rest)),
        None => (key, None),
    };

    let head_out = if model.shadow_base(head).is_some() {
        // Already language-qualified: leave it alone.
        head.to_string()
    } else {
        match model.accessor(head).and_then(|a| a.shadow_name(language)) {
            Some(shadow) => shadow.to_string(),
            None => head.to_string(),
        }
    };

    match rest {
        None => head_out,
        Some(rest) => {
            // Relation traversal checks the original head name.
            match related_model(translator, model, head) {
                Some(target) => format!(
                    "{}__{}",
                    head_out,
                    rewrite_segments(translator, &target, rest, language)
                ),
                None => format!("{}__{}", head_out, rest),
            }
        }
    }
}

fn related_model(
    translator: &Translator,
    model: &TranslatedSchema,
    field: &str,
) -> Option<Arc<TranslatedSchema>> {
    match &model.find_field(field)?.kind {
        FieldKind::ForeignKey(target) => translator.schema_for(target).ok().cloned(),
        _ => None,
    }
}

/// Expand a lookup key into every translation variant on every level.
///
/// Used by `only`/`defer`: the base name stays in the set alongside its
/// shadows, and spanned paths produce the cross product of the per-level
/// expansions.
pub fn append_lookup_key(
    translator: &Translator,
    model: &TranslatedSchema,
    key: &str,
) -> Vec<String> {
    let (head, rest) = match key.split_once("__") {
        Some((head, rest)) => (head, Some(rest)),
        None => (key, None),
    };

    let mut heads = vec![head.to_string()];
    if let Some(accessor) = model.accessor(head) {
        heads.extend(accessor.shadow_names().map(str::to_string));
    }

    match rest {
        None => heads,
        Some(rest) => match related_model(translator, model, head) {
            Some(target) => {
                let tails = append_lookup_key(translator, &target, rest);
                heads
                    .iter()
                    .flat_map(|h| tails.iter().map(move |t| format!("{}__{}", h, t)))
                    .collect()
            }
            None => heads
                .into_iter()
                .map(|h| format!("{}__{}", h, rest))
                .collect(),
        },
    }
}

/// Replace each translatable field with its resolution-order shadow set.
///
/// Returns the expanded field list and the base names that were expanded.
/// Non-translatable fields pass through. This is the projection side of
/// fallback: fetch every chain member, resolve per row afterwards.
pub fn append_fallback(
    model: &TranslatedSchema,
    fields: &[String],
) -> (Vec<String>, Vec<String>) {
    let registry = model.registry();
    let language = context::active_language(registry);
    let fallbacks = context::fallbacks_enabled(registry);

    let mut expanded: Vec<String> = Vec::new();
    let mut translated: Vec<String> = Vec::new();
    for field in fields {
        match model.accessor(field) {
            Some(accessor) => {
                let order =
                    registry.resolution_order(&language, accessor.fallback_languages(), fallbacks);
                for lang in &order {
                    if let Some(name) = accessor.shadow_name(lang) {
                        if !expanded.iter().any(|f| f == name) {
                            expanded.push(name.to_string());
                        }
                    }
                }
                translated.push(field.clone());
            }
            None => {
                if !expanded.contains(field) {
                    expanded.push(field.clone());
                }
            }
        }
    }
    (expanded, translated)
}

fn rewrite_operand(translator: &Translator, model: &TranslatedSchema, operand: Operand) -> Operand {
    match operand {
        Operand::Field(name) => Operand::Field(rewrite_lookup_key(translator, model, &name)),
        Operand::Combined { lhs, op, rhs } => Operand::Combined {
            lhs: Box::new(rewrite_operand(translator, model, *lhs)),
            op,
            rhs: Box::new(rewrite_operand(translator, model, *rhs)),
        },
        Operand::Concat(items) => Operand::Concat(
            items
                .into_iter()
                .map(|item| rewrite_operand(translator, model, item))
                .collect(),
        ),
        other => other,
    }
}

fn rewrite_filter(translator: &Translator, model: &TranslatedSchema, filter: Filter) -> Filter {
    match filter {
        Filter::Cond { key, value } => Filter::Cond {
            key: rewrite_lookup_key(translator, model, &key),
            value: rewrite_operand(translator, model, value),
        },
        Filter::And(children) => Filter::And(
            children
                .into_iter()
                .map(|child| rewrite_filter(translator, model, child))
                .collect(),
        ),
        Filter::Or(children) => Filter::Or(
            children
                .into_iter()
                .map(|child| rewrite_filter(translator, model, child))
                .collect(),
        ),
        Filter::Not(child) => Filter::Not(Box::new(rewrite_filter(translator, model, *child))),
    }
}

/// Query builder over one translated schema.
///
/// Every operation rewrites its field names at call time; the accumulated
/// primitives (`filters`, `order_keys`, `selected_fields`, ...) are what the
/// host persistence layer executes. `rewrite(false)` clones the builder with
/// rewriting off, for callers addressing shadow fields directly.
#[derive(Debug, Clone)]
pub struct Query<'t> {
    translator: &'t Translator,
    model: Arc<TranslatedSchema>,
    rewrite: bool,
    populate: Option<AutoPopulate>,
    filters: Vec<Filter>,
    order_by: Vec<String>,
    distinct_on: Vec<String>,
    select_related: Vec<String>,
    only: Vec<String>,
    defer: Vec<String>,
    selected: Option<Vec<String>>,
    original_fields: Vec<String>,
    translation_fields: Vec<String>,
    updates: Vec<(String, Operand)>,
    annotations: Vec<(String, Operand)>,
}

impl<'t> Query<'t> {
    pub fn new(translator: &'t Translator, model: Arc<TranslatedSchema>) -> Query<'t> {
        Query {
            translator,
            model,
            rewrite: true,
            populate: None,
            filters: Vec::new(),
            order_by: Vec::new(),
            distinct_on: Vec::new(),
            select_related: Vec::new(),
            only: Vec::new(),
            defer: Vec::new(),
            selected: None,
            original_fields: Vec::new(),
            translation_fields: Vec::new(),
            updates: Vec::new(),
            annotations: Vec::new(),
        }
    }

    /// Enable or disable name rewriting for subsequent operations.
    pub fn rewrite(mut self, mode: bool) -> Query<'t> {
        if !mode {
            debug!(model = %self.model.name(), "query rewriting disabled");
        }
        self.rewrite = mode;
        self
    }

    /// Pin the auto-populate mode used by `create`.
    pub fn populate(mut self, mode: AutoPopulate) -> Query<'t> {
        self.populate = Some(mode);
        self
    }

    pub fn filter(mut self, filter: Filter) -> Query<'t> {
        let filter = if self.rewrite {
            rewrite_filter(self.translator, &self.model, filter)
        } else {
            filter
        };
        self.filters.push(filter);
        self
    }

    pub fn exclude(mut self, filter: Filter) -> Query<'t> {
        let filter = if self.rewrite {
            rewrite_filter(self.translator, &self.model, filter)
        } else {
            filter
        };
        self.filters.push(Filter::Not(Box::new(filter)));
        self
    }

    pub fn order_by<I, S>(mut self, keys: I) -> Query<'t>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for key in keys {
            let key = key.as_ref();
            let key = if self.rewrite {
                rewrite_order_key(self.translator, &self.model, key)
            } else {
                key.to_string()
            };
            self.order_by.push(key);
        }
        self
    }

    pub fn distinct_on<I, S>(mut self, keys: I) -> Query<'t>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for key in keys {
            let key = key.as_ref();
            let key = if self.rewrite {
                rewrite_order_key(self.translator, &self.model, key)
            } else {
                key.to_string()
            };
            self.distinct_on.push(key);
        }
        self
    }

    pub fn select_related<I, S>(mut self, keys: I) -> Query<'t>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for key in keys {
            let key = key.as_ref();
            let key = if self.rewrite {
                rewrite_lookup_key(self.translator, &self.model, key)
            } else {
                key.to_string()
            };
            self.select_related.push(key);
        }
        self
    }

    /// Restrict loading to these fields, expanded to all language variants.
    pub fn only<I, S>(mut self, keys: I) -> Query<'t>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for key in keys {
            let key = key.as_ref();
            if self.rewrite {
                self.only
                    .extend(append_lookup_key(self.translator, &self.model, key));
            } else {
                self.only.push(key.to_string());
            }
        }
        self
    }

    /// Defer loading of these fields, expanded to all language variants.
    pub fn defer<I, S>(mut self, keys: I) -> Query<'t>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for key in keys {
            let key = key.as_ref();
            if self.rewrite {
                self.defer
                    .extend(append_lookup_key(self.translator, &self.model, key));
            } else {
                self.defer.push(key.to_string());
            }
        }
        self
    }

    /// Project onto the named fields (all non-shadow fields when empty).
    ///
    /// Translatable fields are expanded into their full resolution-order
    /// shadow set so `resolve_values_rows` can apply fallback per row.
    pub fn values<I, S>(mut self, fields: I) -> Query<'t>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        if fields.is_empty() {
            fields = self
                .model
                .fields()
                .iter()
                .filter(|f| self.model.shadow_base(&f.name).is_none())
                .map(|f| f.name.clone())
                .collect();
        }
        if !self.rewrite {
            self.original_fields = fields.clone();
            self.selected = Some(fields);
            return self;
        }
        let (expanded, translated) = append_fallback(&self.model, &fields);
        self.original_fields = fields;
        self.translation_fields = translated;
        self.selected = Some(expanded);
        self
    }

    /// Stage an update map; keys and symbolic references are rewritten.
    pub fn update<I, K>(mut self, pairs: I) -> Query<'t>
    where
        I: IntoIterator<Item = (K, Operand)>,
        K: Into<String>,
    {
        for (key, value) in pairs {
            let key = key.into();
            if self.rewrite {
                self.updates.push((
                    rewrite_lookup_key(self.translator, &self.model, &key),
                    rewrite_operand(self.translator, &self.model, value),
                ));
            } else {
                self.updates.push((key, value));
            }
        }
        self
    }

    /// Attach a named expression; symbolic references are rewritten.
    pub fn annotate(mut self, alias: impl Into<String>, expr: Operand) -> Query<'t> {
        let expr = if self.rewrite {
            rewrite_operand(self.translator, &self.model, expr)
        } else {
            expr
        };
        self.annotations.push((alias.into(), expr));
        self
    }

    /// Construct a record under this query's population mode.
    pub fn create<I, K, V>(&self, pairs: I) -> Result<Record>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mode = self
            .populate
            .unwrap_or_else(|| context::auto_populate_mode(self.model.registry()));
        let _populate = context::override_auto_populate(mode);
        Record::create(Arc::clone(&self.model), pairs)
    }

    /// Post-process host-fetched projection rows: resolve each translatable
    /// field through its fallback chain and restore the requested keys.
    pub fn resolve_values_rows(
        &self,
        rows: Vec<HashMap<String, Value>>,
    ) -> Vec<HashMap<String, Value>> {
        let registry = self.model.registry();
        rows.into_iter()
            .map(|mut row| {
                for base in &self.translation_fields {
                    if let Some(accessor) = self.model.accessor(base) {
                        let resolved = accessor.get(&row, registry);
                        row.insert(base.clone(), resolved);
                    }
                }
                let mut out = HashMap::new();
                for key in self
                    .original_fields
                    .iter()
                    .chain(self.annotations.iter().map(|(alias, _)| alias))
                {
                    if let Some(value) = row.remove(key) {
                        out.insert(key.clone(), value);
                    }
                }
                out
            })
            .collect()
    }

    // ==================== Rewritten primitives ====================

    pub fn model(&self) -> &Arc<TranslatedSchema> {
        &self.model
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn order_keys(&self) -> &[String] {
        &self.order_by
    }

    pub fn distinct_fields(&self) -> &[String] {
        &self.distinct_on
    }

    pub fn related_fields(&self) -> &[String] {
        &self.select_related
    }

    pub fn only_fields(&self) -> &[String] {
        &self.only
    }

    pub fn deferred_fields(&self) -> &[String] {
        &self.defer
    }

    pub fn selected_fields(&self) -> Option<&[String]> {
        self.selected.as_deref()
    }

    pub fn update_values(&self) -> &[(String, Operand)] {
        &self.updates
    }

    pub fn annotations(&self) -> &[(String, Operand)] {
        &self.annotations
    }
}

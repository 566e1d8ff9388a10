//! Tantivy schema for plant documents
//!
//! Categorical attributes (life cycle, sun requirement, ...) are indexed
//! verbatim with the `raw` tokenizer so they behave as exact-match filters:
//! `perennial` matches `perennial` and nothing else, case included. Every
//! other string in the document is concatenated into a `body` field analysed
//! with an English pipeline (lowercasing, stop words, stemming) for free-text
//! matching. The original JSON is kept in a stored-only `source` field.

use serde_json::Value;
use tantivy::{
    TantivyDocument,
    schema::{Field, FieldType, IndexRecordOption, STORED, STRING, Schema, TextFieldIndexing, TextOptions},
    tokenizer::{
        Language, LowerCaser, RemoveLongFilter, SimpleTokenizer, Stemmer, StopWordFilter,
        TextAnalyzer, TokenizerManager,
    },
};

use super::types::ParsedDocument;

/// Built-in tantivy tokenizer emitting the whole value as one token
pub const KEYWORD_TOKENIZER: &str = "raw";

/// English free-text analyzer registered on every index we open
pub const BODY_TOKENIZER: &str = "plant_en";

/// Tokens longer than this are dropped from `body`
const MAX_TOKEN_LEN: usize = 40;

/// Attributes indexed as exact keywords unless the builder overrides them
pub const DEFAULT_KEYWORD_FIELDS: &[&str] = &[
    "name",
    "bloomSize",
    "lifeCycle",
    "SunRequirement",
    "soilPHPreferences",
    "wildlifeAttractant",
];

const ID_FIELD: &str = "id";
const BODY_FIELD: &str = "body";
const SOURCE_FIELD: &str = "source";

/// Field handles for the plant index
#[derive(Debug, Clone)]
pub struct SearchSchema {
    pub schema: Schema,
    pub id: Field,
    pub body: Field,
    pub source: Field,
    /// `(json key, field)` for each exact-match attribute
    pub keyword_fields: Vec<(String, Field)>,
}

/// Schema builder for flexible configuration and validation
pub struct SearchSchemaBuilder {
    keyword_fields: Vec<String>,
    enable_stemming: bool,
}

/// Schema validation errors
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("Field '{field}' configuration error: {details}")]
    FieldConfiguration { field: String, details: String },

    #[error("Tokenizer '{name}' registration failed: {reason}")]
    TokenizerRegistration { name: String, reason: String },

    #[error("Field '{field}' not found in schema")]
    FieldNotFound { field: String },

    #[error("Incompatible field type for '{field}': expected {expected}, found {found}")]
    IncompatibleFieldType {
        field: String,
        expected: String,
        found: String,
    },
}

impl SearchSchema {
    #[inline]
    #[must_use]
    pub fn builder() -> SearchSchemaBuilder {
        SearchSchemaBuilder::new()
    }

    /// Recover field handles from the schema of an index already on disk
    ///
    /// Fails if any field this crate writes is missing or is not text.
    pub fn from_existing(schema: Schema, keyword_fields: &[String]) -> Result<Self, SchemaError> {
        let lookup = |name: &str| -> Result<Field, SchemaError> {
            let field = schema.get_field(name).map_err(|_| SchemaError::FieldNotFound {
                field: name.to_string(),
            })?;
            match schema.get_field_entry(field).field_type() {
                FieldType::Str(_) => Ok(field),
                other => Err(SchemaError::IncompatibleFieldType {
                    field: name.to_string(),
                    expected: "Text".to_string(),
                    found: format!("{:?}", other.value_type()),
                }),
            }
        };

        let id = lookup(ID_FIELD)?;
        let body = lookup(BODY_FIELD)?;
        let source = lookup(SOURCE_FIELD)?;
        let keyword_fields = keyword_fields
            .iter()
            .map(|name| lookup(name).map(|field| (name.clone(), field)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            schema,
            id,
            body,
            source,
            keyword_fields,
        })
    }

    /// Fields a free-text query runs against, with the record option each was indexed with
    #[must_use]
    pub fn default_search_fields(&self) -> Vec<(Field, IndexRecordOption)> {
        let mut fields: Vec<_> = self
            .keyword_fields
            .iter()
            .map(|(_, field)| (*field, IndexRecordOption::Basic))
            .collect();
        fields.push((self.body, IndexRecordOption::WithFreqsAndPositions));
        fields
    }

    #[must_use]
    pub fn keyword_names(&self) -> Vec<String> {
        self.keyword_fields.iter().map(|(name, _)| name.clone()).collect()
    }

    /// Convert a parsed document into a tantivy document
    ///
    /// Top-level keyword attributes go to their own fields (arrays yield one
    /// value per element); every other string leaf feeds `body`.
    #[must_use]
    pub fn to_document(&self, doc: &ParsedDocument) -> TantivyDocument {
        let mut out = TantivyDocument::default();
        out.add_text(self.id, &doc.id);
        out.add_text(self.source, doc.content.to_string());

        let mut body = String::new();
        match &doc.content {
            Value::Object(map) => {
                for (key, value) in map {
                    match self.keyword_fields.iter().find(|(name, _)| name == key) {
                        Some((_, field)) => add_keyword_values(&mut out, *field, value),
                        None => collect_text(value, &mut body),
                    }
                }
            }
            other => collect_text(other, &mut body),
        }

        if !body.is_empty() {
            out.add_text(self.body, &body);
        }
        out
    }
}

fn add_keyword_values(doc: &mut TantivyDocument, field: Field, value: &Value) {
    match value {
        Value::String(s) => doc.add_text(field, s),
        Value::Number(n) => doc.add_text(field, n.to_string()),
        Value::Bool(b) => doc.add_text(field, b.to_string()),
        Value::Array(items) => {
            for item in items {
                add_keyword_values(doc, field, item);
            }
        }
        Value::Null | Value::Object(_) => {}
    }
}

/// Append every string leaf of `value` to `out`, newline separated
fn collect_text(value: &Value, out: &mut String) {
    match value {
        Value::String(s) => {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(s);
        }
        Value::Array(items) => items.iter().for_each(|item| collect_text(item, out)),
        Value::Object(map) => map.values().for_each(|item| collect_text(item, out)),
        Value::Number(_) | Value::Bool(_) | Value::Null => {}
    }
}

impl SearchSchemaBuilder {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            keyword_fields: DEFAULT_KEYWORD_FIELDS.iter().map(|s| (*s).to_string()).collect(),
            enable_stemming: true,
        }
    }

    /// Replace the set of exact-match attributes
    #[must_use]
    pub fn with_keyword_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keyword_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    #[inline]
    #[must_use]
    pub fn with_stemming(mut self, enabled: bool) -> Self {
        self.enable_stemming = enabled;
        self
    }

    #[must_use]
    pub fn keyword_fields(&self) -> &[String] {
        &self.keyword_fields
    }

    /// Register the free-text analyzer with an index's tokenizer manager
    ///
    /// Tokenizers are not persisted with the index, so this runs for freshly
    /// created and reopened indexes alike.
    pub fn register_tokenizers(&self, manager: &TokenizerManager) -> Result<(), SchemaError> {
        let stop_words = StopWordFilter::new(Language::English).ok_or_else(|| {
            SchemaError::TokenizerRegistration {
                name: BODY_TOKENIZER.to_string(),
                reason: "no English stop word list available".to_string(),
            }
        })?;

        let builder = TextAnalyzer::builder(SimpleTokenizer::default())
            .filter(RemoveLongFilter::limit(MAX_TOKEN_LEN))
            .filter(LowerCaser)
            .filter(stop_words);

        let analyzer = if self.enable_stemming {
            builder.filter(Stemmer::new(Language::English)).build()
        } else {
            builder.build()
        };

        manager.register(BODY_TOKENIZER, analyzer);
        Ok(())
    }

    /// Build the schema for a new index
    pub fn build(&self) -> Result<SearchSchema, SchemaError> {
        let mut schema_builder = Schema::builder();

        for reserved in [ID_FIELD, BODY_FIELD, SOURCE_FIELD] {
            if self.keyword_fields.iter().any(|name| name == reserved) {
                return Err(SchemaError::FieldConfiguration {
                    field: reserved.to_string(),
                    details: "name is reserved and cannot be a keyword attribute".to_string(),
                });
            }
        }

        let id = schema_builder.add_text_field(ID_FIELD, STRING | STORED);

        let keyword_options = TextOptions::default().set_stored().set_indexing_options(
            TextFieldIndexing::default()
                .set_tokenizer(KEYWORD_TOKENIZER)
                .set_index_option(IndexRecordOption::Basic),
        );
        let mut keyword_fields = Vec::with_capacity(self.keyword_fields.len());
        for name in &self.keyword_fields {
            if keyword_fields.iter().any(|(existing, _): &(String, Field)| existing == name) {
                return Err(SchemaError::FieldConfiguration {
                    field: name.clone(),
                    details: "declared twice".to_string(),
                });
            }
            let field = schema_builder.add_text_field(name, keyword_options.clone());
            keyword_fields.push((name.clone(), field));
        }

        let body = schema_builder.add_text_field(
            BODY_FIELD,
            TextOptions::default().set_indexing_options(
                TextFieldIndexing::default()
                    .set_tokenizer(BODY_TOKENIZER)
                    .set_index_option(IndexRecordOption::WithFreqsAndPositions),
            ),
        );

        let source = schema_builder.add_text_field(SOURCE_FIELD, TextOptions::default().set_stored());

        Ok(SearchSchema {
            schema: schema_builder.build(),
            id,
            body,
            source,
            keyword_fields,
        })
    }
}

impl Default for SearchSchemaBuilder {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

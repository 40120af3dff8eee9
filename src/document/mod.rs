//! The ephemeral document model handed to the writer. Documents only live
//! until the segment writer has decomposed them into terms and stored
//! payloads; nothing here is persisted as-is.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// How a field takes part in the index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexOptions {
    /// Run the value through a token stream (text analysis for strings,
    /// precision-stepped tokens for numerics). When false, the raw bytes form
    /// a single term.
    pub tokenized: bool,
    /// Keep the value retrievable through the stored-field visitor.
    pub stored: bool,
}

impl IndexOptions {
    /// Tokenized and stored; the default for text.
    pub const TEXT: IndexOptions = IndexOptions { tokenized: true, stored: true };
    /// Single-term and stored; exact-match strings and binary values.
    pub const RAW: IndexOptions = IndexOptions { tokenized: false, stored: true };
    /// Tokenized, not retrievable.
    pub const INDEXED_ONLY: IndexOptions = IndexOptions { tokenized: true, stored: false };
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Str(String),
    Bytes(Vec<u8>),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Bool(bool),
    Null,
}

/// One field instance of a document: name, typed value, indexing options.
/// A document may repeat a name with different value types; every instance
/// contributes its own terms.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub value: FieldValue,
    pub options: IndexOptions,
}

impl Field {
    pub fn new(name: impl Into<String>, value: FieldValue, options: IndexOptions) -> Field {
        Field { name: name.into(), value, options }
    }
}

/// An ordered collection of field instances.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    fields: SmallVec<[Field; 4]>,
}

impl Document {
    pub fn new() -> Document {
        Document::default()
    }

    pub fn add_field(&mut self, field: Field) {
        self.fields.push(field);
    }

    /// Tokenized, stored text.
    pub fn add_text(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.add_field(Field::new(name, FieldValue::Str(value.into()), IndexOptions::TEXT));
    }

    /// Untokenized, stored string: the whole value is one term.
    pub fn add_string(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.add_field(Field::new(name, FieldValue::Str(value.into()), IndexOptions::RAW));
    }

    pub fn add_bytes(&mut self, name: impl Into<String>, value: Vec<u8>) {
        self.add_field(Field::new(name, FieldValue::Bytes(value), IndexOptions::RAW));
    }

    pub fn add_i32(&mut self, name: impl Into<String>, value: i32) {
        self.add_field(Field::new(name, FieldValue::I32(value), IndexOptions::TEXT));
    }

    pub fn add_i64(&mut self, name: impl Into<String>, value: i64) {
        self.add_field(Field::new(name, FieldValue::I64(value), IndexOptions::TEXT));
    }

    pub fn add_f32(&mut self, name: impl Into<String>, value: f32) {
        self.add_field(Field::new(name, FieldValue::F32(value), IndexOptions::TEXT));
    }

    pub fn add_f64(&mut self, name: impl Into<String>, value: f64) {
        self.add_field(Field::new(name, FieldValue::F64(value), IndexOptions::TEXT));
    }

    pub fn add_bool(&mut self, name: impl Into<String>, value: bool) {
        self.add_field(Field::new(name, FieldValue::Bool(value), IndexOptions::TEXT));
    }

    pub fn add_null(&mut self, name: impl Into<String>) {
        self.add_field(Field::new(name, FieldValue::Null, IndexOptions::TEXT));
    }

    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl IntoIterator for Document {
    type Item = Field;
    type IntoIter = smallvec::IntoIter<[Field; 4]>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

/// Conversion shim used by the [`doc!`](crate::doc) macro.
#[derive(Debug, Clone)]
pub enum DocValue {
    Str(String),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Bool(bool),
    Null,
}

impl DocValue {
    pub fn add_to(self, doc: &mut Document, name: &str) {
        match self {
            DocValue::Str(v) => doc.add_string(name, v),
            DocValue::I32(v) => doc.add_i32(name, v),
            DocValue::I64(v) => doc.add_i64(name, v),
            DocValue::F32(v) => doc.add_f32(name, v),
            DocValue::F64(v) => doc.add_f64(name, v),
            DocValue::Bool(v) => doc.add_bool(name, v),
            DocValue::Null => doc.add_null(name),
        }
    }
}

impl From<&str> for DocValue {
    fn from(v: &str) -> DocValue {
        DocValue::Str(v.to_string())
    }
}

impl From<String> for DocValue {
    fn from(v: String) -> DocValue {
        DocValue::Str(v)
    }
}

impl From<i32> for DocValue {
    fn from(v: i32) -> DocValue {
        DocValue::I32(v)
    }
}

impl From<i64> for DocValue {
    fn from(v: i64) -> DocValue {
        DocValue::I64(v)
    }
}

impl From<f32> for DocValue {
    fn from(v: f32) -> DocValue {
        DocValue::F32(v)
    }
}

impl From<f64> for DocValue {
    fn from(v: f64) -> DocValue {
        DocValue::F64(v)
    }
}

impl From<bool> for DocValue {
    fn from(v: bool) -> DocValue {
        DocValue::Bool(v)
    }
}

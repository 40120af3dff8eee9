use fnv::FnvHashMap;

use crate::codec::{FieldPayload, SegmentPayload, StoredDoc};
use crate::document::{Document, Field, FieldValue};
use crate::tokens::{BooleanTokenStream, NullTokenStream, NumericTokenStream, TokenStream, WhitespaceTokenStream};
use crate::util::bits;
use crate::DocId;

/// Builds the in-memory image of one segment.
///
/// Documents are decomposed into terms (through the token streams) and
/// stored payloads as they arrive; `finalize` hands the image to the codec.
pub struct SegmentWriter {
    segment_name: String,
    fields: Vec<FieldPayload>,
    fields_by_name: FnvHashMap<String, usize>,
    stored: Vec<StoredDoc>,
    // streams are reused across documents to avoid per-field allocations
    text_stream: WhitespaceTokenStream,
    numeric_stream: NumericTokenStream,
}

impl SegmentWriter {
    pub fn for_segment(segment_name: String) -> SegmentWriter {
        SegmentWriter {
            segment_name,
            fields: Vec::new(),
            fields_by_name: FnvHashMap::default(),
            stored: Vec::new(),
            text_stream: WhitespaceTokenStream::new(),
            numeric_stream: NumericTokenStream::new(),
        }
    }

    pub fn segment_name(&self) -> &str {
        &self.segment_name
    }

    pub fn docs_count(&self) -> u64 {
        self.stored.len() as u64
    }

    /// Indexes one document and returns its segment-local doc id.
    pub fn index_document(&mut self, document: &Document) -> DocId {
        let doc = self.stored.len() as DocId + 1;
        let mut stored: StoredDoc = Vec::new();

        for field in document.fields() {
            let ord = self.field_ord(field);
            Self::index_field_terms(
                &mut self.fields[ord],
                &mut self.text_stream,
                &mut self.numeric_stream,
                field,
                doc,
            );
            if field.options.stored {
                stored.push((ord as u32, encode_stored(&field.value)));
            }
        }

        self.stored.push(stored);
        doc
    }

    /// Field records keep the options of their first occurrence.
    fn field_ord(&mut self, field: &Field) -> usize {
        if let Some(&ord) = self.fields_by_name.get(&field.name) {
            return ord;
        }
        let ord = self.fields.len();
        self.fields.push(FieldPayload {
            meta: crate::index::FieldMeta::new(field.name.clone(), field.options),
            terms: Default::default(),
        });
        self.fields_by_name.insert(field.name.clone(), ord);
        ord
    }

    fn index_field_terms(
        payload: &mut FieldPayload,
        text_stream: &mut WhitespaceTokenStream,
        numeric_stream: &mut NumericTokenStream,
        field: &Field,
        doc: DocId,
    ) {
        let mut push = |term: &[u8]| {
            let postings = payload.terms.entry(term.to_vec()).or_default();
            // a term repeated within one document posts once
            if postings.last() != Some(&doc) {
                postings.push(doc);
            }
        };

        match &field.value {
            FieldValue::Str(text) => {
                if field.options.tokenized {
                    text_stream.reset(text);
                    while text_stream.next() {
                        push(text_stream.term());
                    }
                } else {
                    push(text.as_bytes());
                }
            }
            FieldValue::Bytes(bytes) => push(bytes),
            FieldValue::I32(v) => {
                numeric_stream.reset_i32(*v);
                while numeric_stream.next() {
                    push(numeric_stream.term());
                }
            }
            FieldValue::I64(v) => {
                numeric_stream.reset_i64(*v);
                while numeric_stream.next() {
                    push(numeric_stream.term());
                }
            }
            FieldValue::F32(v) => {
                numeric_stream.reset_f32(*v);
                while numeric_stream.next() {
                    push(numeric_stream.term());
                }
            }
            FieldValue::F64(v) => {
                numeric_stream.reset_f64(*v);
                while numeric_stream.next() {
                    push(numeric_stream.term());
                }
            }
            FieldValue::Bool(v) => {
                let mut stream = BooleanTokenStream::new(*v);
                while stream.next() {
                    push(stream.term());
                }
            }
            FieldValue::Null => {
                let mut stream = NullTokenStream::new();
                while stream.next() {
                    push(stream.term());
                }
            }
        }
    }

    /// Rough memory footprint of the staged image, for rotation decisions.
    pub fn mem_usage(&self) -> usize {
        let terms: usize = self
            .fields
            .iter()
            .map(|field| {
                field
                    .terms
                    .iter()
                    .map(|(term, postings)| term.len() + postings.len() * std::mem::size_of::<DocId>())
                    .sum::<usize>()
            })
            .sum();
        let stored: usize = self
            .stored
            .iter()
            .map(|doc| doc.iter().map(|(_, payload)| payload.len() + 8).sum::<usize>())
            .sum();
        terms + stored
    }

    pub fn finalize(self) -> SegmentPayload {
        SegmentPayload { fields: self.fields, stored: self.stored }
    }
}

/// Stored payload encodings: strings and bytes verbatim, integers as
/// zig-zag varints, floats through their sortable image, booleans as one
/// byte, nulls empty.
pub fn encode_stored(value: &FieldValue) -> Vec<u8> {
    let mut out = Vec::new();
    match value {
        FieldValue::Str(text) => out.extend_from_slice(text.as_bytes()),
        FieldValue::Bytes(bytes) => out.extend_from_slice(bytes),
        FieldValue::I32(v) => bits::write_zvlong(&mut out, i64::from(*v)).expect("vec write"),
        FieldValue::I64(v) => bits::write_zvlong(&mut out, *v).expect("vec write"),
        FieldValue::F32(v) => bits::write_zvdouble(&mut out, f64::from(*v)).expect("vec write"),
        FieldValue::F64(v) => bits::write_zvdouble(&mut out, *v).expect("vec write"),
        FieldValue::Bool(v) => out.push(u8::from(*v)),
        FieldValue::Null => {}
    }
    out
}

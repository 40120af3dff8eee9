use std::fmt;
use std::ops::Bound;
use std::sync::Arc;

use fnv::FnvHashMap;

use crate::codec::{FieldPayload, SegmentPayload};
use crate::directory::Directory;
use crate::error::Error;
use crate::index::{FieldMeta, SegmentMeta};
use crate::DocId;

/// The per-segment face of the reader. Queries execute against one
/// `SegmentReader` at a time; doc ids are segment-local and start at 1.
#[derive(Clone)]
pub struct SegmentReader {
    meta: Arc<SegmentMeta>,
    payload: Arc<SegmentPayload>,
    fields_by_name: Arc<FnvHashMap<String, usize>>,
}

impl SegmentReader {
    /// Loads the segment `meta` describes through its codec.
    pub fn open(directory: &dyn Directory, meta: SegmentMeta) -> crate::Result<SegmentReader> {
        let codec = meta
            .codec()
            .cloned()
            .ok_or_else(|| Error::State(format!("segment '{}' has no codec", meta.name())))?;
        let payload = codec.read_segment(directory, &meta)?;

        let fields_by_name = payload
            .fields
            .iter()
            .enumerate()
            .map(|(ord, field)| (field.meta.name.clone(), ord))
            .collect::<FnvHashMap<String, usize>>();

        Ok(SegmentReader {
            meta: Arc::new(meta),
            payload: Arc::new(payload),
            fields_by_name: Arc::new(fields_by_name),
        })
    }

    pub fn meta(&self) -> &SegmentMeta {
        &self.meta
    }

    pub fn docs_count(&self) -> u64 {
        self.meta.docs_count()
    }

    /// Resolves a field by name; `None` when the segment never saw it.
    pub fn field(&self, name: &str) -> Option<FieldReader<'_>> {
        let ord = *self.fields_by_name.get(name)?;
        Some(FieldReader { payload: &self.payload.fields[ord] })
    }

    /// Visits the stored fields of `doc` in field order.
    ///
    /// The visitor returns false to declare "this document does not match";
    /// the visit stops there and the overall result is false.
    pub fn document<F>(&self, doc: DocId, mut visitor: F) -> crate::Result<bool>
    where F: FnMut(&FieldMeta, &[u8]) -> bool {
        if doc == 0 || doc as u64 > self.docs_count() {
            return Err(Error::InvalidArgument(format!(
                "doc id {doc} outside segment '{}' (1..={})",
                self.meta.name(),
                self.docs_count()
            )));
        }
        let stored = &self.payload.stored[(doc - 1) as usize];
        for (field_ord, payload) in stored {
            let meta = &self.payload.fields[*field_ord as usize].meta;
            if !visitor(meta, payload) {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl fmt::Debug for SegmentReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SegmentReader")
            .field("segment", &self.meta.name())
            .field("docs_count", &self.docs_count())
            .finish()
    }
}

/// Term dictionary and postings of a single field within one segment.
#[derive(Clone, Copy)]
pub struct FieldReader<'a> {
    payload: &'a FieldPayload,
}

impl<'a> FieldReader<'a> {
    pub fn meta(&self) -> &'a FieldMeta {
        &self.payload.meta
    }

    /// Postings of an exact term, ascending doc ids. `None` when the term is
    /// absent from the dictionary.
    pub fn postings(&self, term: &[u8]) -> Option<&'a [DocId]> {
        self.payload.terms.get(term).map(Vec::as_slice)
    }

    /// Number of distinct terms in the dictionary.
    pub fn terms_count(&self) -> usize {
        self.payload.terms.len()
    }

    /// Ordered scan over `(term, postings)` pairs within byte bounds.
    pub fn terms_range(
        &self,
        lower: Bound<&[u8]>,
        upper: Bound<&[u8]>,
    ) -> impl Iterator<Item = (&'a [u8], &'a [DocId])> {
        self.payload
            .terms
            .range::<[u8], _>((lower, upper))
            .map(|(term, postings)| (term.as_slice(), postings.as_slice()))
    }
}

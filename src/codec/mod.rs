//! Formats. A [`Codec`] turns an in-memory segment image into directory
//! artefacts and back; the rest of the crate references codecs only through
//! shared handles obtained from the process-wide registry.

mod v1;

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::directory::Directory;
use crate::index::{FieldMeta, SegmentMeta};
use crate::DocId;

pub use v1::V1Codec;

/// Shared handle to a format implementation. Codecs are long-lived,
/// process-wide values; cloning the handle is cheap.
pub type CodecPtr = Arc<dyn Codec>;

/// Inverted data of one field: its meta plus the ordered term dictionary,
/// each term mapping to its posting list (ascending doc ids).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldPayload {
    pub meta: FieldMeta,
    pub terms: BTreeMap<Vec<u8>, Vec<DocId>>,
}

/// Stored values of one document: `(field ordinal, payload bytes)` pairs in
/// field order. The ordinal indexes into [`SegmentPayload::fields`].
pub type StoredDoc = Vec<(u32, Vec<u8>)>;

/// The in-memory image of a segment, as exchanged with a codec. Doc ids are
/// segment-local and start at 1; `stored[i]` belongs to doc `i + 1`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SegmentPayload {
    pub fields: Vec<FieldPayload>,
    pub stored: Vec<StoredDoc>,
}

impl SegmentPayload {
    pub fn docs_count(&self) -> u64 {
        self.stored.len() as u64
    }
}

/// A pluggable segment format, identified by its version tag.
pub trait Codec: Send + Sync + fmt::Debug {
    /// Version tag, e.g. `"1_0"`. Also the registry key.
    fn name(&self) -> &'static str;

    /// Serializes `payload` into the directory, recording every artefact
    /// filename in `meta`.
    fn write_segment(
        &self,
        directory: &dyn Directory,
        payload: &SegmentPayload,
        meta: &mut SegmentMeta,
    ) -> crate::Result<()>;

    /// Loads the segment image `meta` describes.
    fn read_segment(
        &self,
        directory: &dyn Directory,
        meta: &SegmentMeta,
    ) -> crate::Result<SegmentPayload>;

    /// Serializes the segment descriptor itself; returns its filename.
    fn write_segment_meta(
        &self,
        directory: &dyn Directory,
        meta: &SegmentMeta,
    ) -> crate::Result<String>;

    /// Loads a segment descriptor previously written by
    /// [`Codec::write_segment_meta`].
    fn read_segment_meta(
        &self,
        directory: &dyn Directory,
        filename: &str,
    ) -> crate::Result<SegmentMeta>;
}

static REGISTRY: Lazy<RwLock<HashMap<&'static str, CodecPtr>>> = Lazy::new(|| {
    let mut codecs: HashMap<&'static str, CodecPtr> = HashMap::new();
    let v1: CodecPtr = Arc::new(V1Codec);
    codecs.insert(v1.name(), v1);
    RwLock::new(codecs)
});

/// Looks a codec up by its version tag.
pub fn get(name: &str) -> Option<CodecPtr> {
    REGISTRY.read().get(name).cloned()
}

/// Registers a codec under its own name, replacing any previous entry.
pub fn register(codec: CodecPtr) {
    REGISTRY.write().insert(codec.name(), codec);
}

/// The codec new indexes are written with unless the caller picks another.
pub fn default_codec() -> CodecPtr {
    get(v1::V1_CODEC_NAME).expect("the default codec is always registered")
}

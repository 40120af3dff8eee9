use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::codec::{self, CodecPtr};
use crate::error::Error;

/// Descriptor of one immutable segment: its minted name, live document
/// count, the set of artefact files the codec wrote for it, the codec handle
/// and a revision counter distinguishing regenerations of the same name.
///
/// The writer owns a descriptor exclusively while composing the segment; on
/// commit it is [taken](SegmentMeta::take) into the index meta's segment
/// list, where readers share it.
#[derive(Default)]
pub struct SegmentMeta {
    name: String,
    docs_count: u64,
    files: BTreeSet<String>,
    codec: Option<CodecPtr>,
    version: u64,
}

impl SegmentMeta {
    /// An empty descriptor for a freshly minted segment name.
    pub fn new(name: impl Into<String>, codec: CodecPtr) -> SegmentMeta {
        SegmentMeta {
            name: name.into(),
            docs_count: 0,
            files: BTreeSet::new(),
            codec: Some(codec),
            version: 0,
        }
    }

    pub fn from_parts(
        name: String,
        codec: CodecPtr,
        docs_count: u64,
        files: BTreeSet<String>,
    ) -> SegmentMeta {
        SegmentMeta { name, docs_count, files, codec: Some(codec), version: 0 }
    }

    /// Moves the descriptor out, leaving a valid empty descriptor behind:
    /// zero documents, no files, no codec.
    pub fn take(&mut self) -> SegmentMeta {
        SegmentMeta {
            name: std::mem::take(&mut self.name),
            docs_count: std::mem::replace(&mut self.docs_count, 0),
            files: std::mem::take(&mut self.files),
            codec: self.codec.take(),
            version: self.version,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn docs_count(&self) -> u64 {
        self.docs_count
    }

    pub fn set_docs_count(&mut self, docs_count: u64) {
        self.docs_count = docs_count;
    }

    pub fn files(&self) -> &BTreeSet<String> {
        &self.files
    }

    pub fn add_file(&mut self, filename: impl Into<String>) {
        self.files.insert(filename.into());
    }

    pub fn codec(&self) -> Option<&CodecPtr> {
        self.codec.as_ref()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Bumped when a segment name is regenerated.
    pub fn set_version(&mut self, version: u64) {
        self.version = version;
    }

    pub(crate) fn clone_meta(&self) -> SegmentMeta {
        SegmentMeta {
            name: self.name.clone(),
            docs_count: self.docs_count,
            files: self.files.clone(),
            codec: self.codec.clone(),
            version: self.version,
        }
    }
}

impl fmt::Debug for SegmentMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SegmentMeta")
            .field("name", &self.name)
            .field("docs_count", &self.docs_count)
            .field("files", &self.files)
            .field("codec", &self.codec.as_ref().map(|codec| codec.name()))
            .field("version", &self.version)
            .finish()
    }
}

/// Serialized form of a segment descriptor; the codec handle is recorded by
/// its registry name.
#[derive(Debug, Serialize, Deserialize)]
pub struct SegmentMetaJson {
    pub name: String,
    pub docs_count: u64,
    pub files: Vec<String>,
    pub codec: String,
    pub version: u64,
}

impl From<&SegmentMeta> for SegmentMetaJson {
    fn from(meta: &SegmentMeta) -> SegmentMetaJson {
        SegmentMetaJson {
            name: meta.name.clone(),
            docs_count: meta.docs_count,
            files: meta.files.iter().cloned().collect(),
            codec: meta.codec.as_ref().map(|codec| codec.name()).unwrap_or_default().to_string(),
            version: meta.version,
        }
    }
}

impl SegmentMetaJson {
    /// Rebuilds the descriptor, resolving the codec through the process-wide
    /// registry.
    pub fn into_meta(self) -> crate::Result<SegmentMeta> {
        let codec = codec::get(&self.codec)
            .ok_or_else(|| Error::NotFound(format!("codec '{}' is not registered", self.codec)))?;
        Ok(SegmentMeta {
            name: self.name,
            docs_count: self.docs_count,
            files: self.files.into_iter().collect(),
            codec: Some(codec),
            version: self.version,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_leaves_valid_empty_descriptor() {
        let codec = codec::default_codec();
        let mut meta = SegmentMeta::new("_1", codec);
        meta.set_docs_count(32);
        meta.add_file("_1.term");
        meta.add_file("_1.store");
        meta.set_version(3);

        let taken = meta.take();
        assert_eq!("_1", taken.name());
        assert_eq!(32, taken.docs_count());
        assert_eq!(2, taken.files().len());
        assert!(taken.codec().is_some());
        assert_eq!(3, taken.version());

        // the source is a valid empty descriptor
        assert_eq!("", meta.name());
        assert_eq!(0, meta.docs_count());
        assert!(meta.files().is_empty());
        assert!(meta.codec().is_none());
    }

    #[test]
    fn json_round_trip() {
        let mut meta = SegmentMeta::new("_7", codec::default_codec());
        meta.set_docs_count(5);
        meta.add_file("_7.term");

        let json = serde_json::to_string(&SegmentMetaJson::from(&meta)).unwrap();
        let parsed: SegmentMetaJson = serde_json::from_str(&json).unwrap();
        let restored = parsed.into_meta().unwrap();
        assert_eq!("_7", restored.name());
        assert_eq!(5, restored.docs_count());
        assert!(restored.files().contains("_7.term"));
        assert_eq!(codec::default_codec().name(), restored.codec().unwrap().name());
    }

    #[test]
    fn files_are_deduplicated() {
        let mut meta = SegmentMeta::new("_2", codec::default_codec());
        meta.add_file("_2.term");
        meta.add_file("_2.term");
        assert_eq!(1, meta.files().len());
    }
}

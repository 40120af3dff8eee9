use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::directory::Directory;
use crate::Generation;

use super::segment_meta::SegmentMeta;

/// Sentinel generation of an index that has never been committed.
pub const INVALID_GEN: Generation = 0;

const META_PREFIX: &str = "meta.";
const META_SUFFIX: &str = ".json";

/// Filename of the serialized index meta at `gen`.
pub fn meta_filename(gen: Generation) -> PathBuf {
    PathBuf::from(format!("{META_PREFIX}{gen}{META_SUFFIX}"))
}

/// Inverse of [`meta_filename`].
pub fn parse_meta_filename(path: &Path) -> Option<Generation> {
    let name = path.to_str()?;
    let gen = name.strip_prefix(META_PREFIX)?.strip_suffix(META_SUFFIX)?;
    gen.parse::<Generation>().ok().filter(|&gen| gen != INVALID_GEN)
}

/// The newest committed generation present in `directory`, if any.
pub fn latest_generation(directory: &dyn Directory) -> crate::Result<Option<Generation>> {
    let mut latest = None;
    for path in directory.list_files()? {
        if let Some(gen) = parse_meta_filename(&path) {
            latest = latest.max(Some(gen));
        }
    }
    Ok(latest)
}

/// A committed segment: its descriptor plus the filename the descriptor was
/// serialized under.
#[derive(Debug)]
pub struct IndexSegment {
    pub meta: SegmentMeta,
    pub filename: String,
}

/// Index-wide metadata: the committed generation, the ordered segment list,
/// the counter minting segment names, and the staged-but-uncommitted
/// pending region.
#[derive(Debug)]
pub struct IndexMeta {
    gen: Generation,
    last_gen: Generation,
    segments: Vec<IndexSegment>,
    /// Atomic so that concurrently composing writers never mint the same
    /// segment name.
    seg_counter: AtomicU64,
    pending: Vec<IndexSegment>,
}

impl Default for IndexMeta {
    fn default() -> IndexMeta {
        IndexMeta {
            gen: INVALID_GEN,
            last_gen: INVALID_GEN,
            segments: Vec::new(),
            seg_counter: AtomicU64::new(0),
            pending: Vec::new(),
        }
    }
}

impl Clone for IndexMeta {
    /// Copies clone the pending region; the counter is copied through a
    /// load so the clone never shares state with the source.
    fn clone(&self) -> IndexMeta {
        IndexMeta {
            gen: self.gen,
            last_gen: self.last_gen,
            segments: self
                .segments
                .iter()
                .map(|entry| IndexSegment {
                    meta: entry.meta.clone_meta(),
                    filename: entry.filename.clone(),
                })
                .collect(),
            seg_counter: AtomicU64::new(self.seg_counter.load(Ordering::Relaxed)),
            pending: self
                .pending
                .iter()
                .map(|entry| IndexSegment {
                    meta: entry.meta.clone_meta(),
                    filename: entry.filename.clone(),
                })
                .collect(),
        }
    }
}

impl IndexMeta {
    pub fn new() -> IndexMeta {
        IndexMeta::default()
    }

    pub fn generation(&self) -> Generation {
        self.gen
    }

    /// Generation observed when the meta was loaded from the directory.
    pub fn last_generation(&self) -> Generation {
        self.last_gen
    }

    /// The generation the next commit will be published under.
    pub fn next_generation(&self) -> Generation {
        if self.gen == INVALID_GEN {
            1
        } else {
            self.gen + 1
        }
    }

    /// Mints a fresh segment name, unique for the lifetime of this meta.
    pub fn next_segment_name(&self) -> String {
        let seg = self.seg_counter.fetch_add(1, Ordering::Relaxed) + 1;
        format!("_{seg}")
    }

    pub fn segment_counter(&self) -> u64 {
        self.seg_counter.load(Ordering::Relaxed)
    }

    pub fn segments(&self) -> &[IndexSegment] {
        &self.segments
    }

    pub fn pending(&self) -> &[IndexSegment] {
        &self.pending
    }

    /// Stages a freshly serialized segment for the next commit.
    pub fn stage(&mut self, segment: IndexSegment) {
        debug_assert!(
            self.segments
                .iter()
                .chain(self.pending.iter())
                .all(|entry| entry.meta.name() != segment.meta.name()),
            "segment names must be unique"
        );
        self.pending.push(segment);
    }

    pub fn discard_pending(&mut self) -> Vec<IndexSegment> {
        std::mem::take(&mut self.pending)
    }

    /// Promotes the pending region into the committed segment list under
    /// `gen`. Called after the serialized meta has safely reached the
    /// directory.
    pub fn advance_generation(&mut self, gen: Generation) {
        debug_assert!(gen > self.gen || self.gen == INVALID_GEN);
        self.segments.append(&mut self.pending);
        self.gen = gen;
        self.last_gen = gen;
    }

    pub fn to_json(&self) -> crate::Result<String> {
        let bridge = IndexMetaJson {
            gen: self.gen,
            seg_counter: self.seg_counter.load(Ordering::Relaxed),
            segments: self.segments.iter().map(|entry| entry.filename.clone()).collect(),
        };
        Ok(serde_json::to_string_pretty(&bridge)?)
    }

    /// Rebuilds the meta from its serialized form; segment descriptors are
    /// resolved by the caller (the codec owns their format).
    pub fn from_json(json: &str, segments: Vec<IndexSegment>) -> crate::Result<IndexMeta> {
        let bridge: IndexMetaJson = serde_json::from_str(json)?;
        Ok(IndexMeta {
            gen: bridge.gen,
            last_gen: bridge.gen,
            segments,
            seg_counter: AtomicU64::new(bridge.seg_counter),
            pending: Vec::new(),
        })
    }
}

/// On-disk form of [`IndexMeta`]; segments are referenced by the filenames
/// of their serialized descriptors.
#[derive(Debug, Serialize, Deserialize)]
pub struct IndexMetaJson {
    pub gen: Generation,
    pub seg_counter: u64,
    pub segments: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec;

    #[test]
    fn next_generation_from_invalid_is_one() {
        let meta = IndexMeta::new();
        assert_eq!(INVALID_GEN, meta.generation());
        assert_eq!(1, meta.next_generation());
    }

    #[test]
    fn generations_increase_by_commit() {
        let mut meta = IndexMeta::new();
        for expected in 1..=5u64 {
            assert_eq!(expected, meta.next_generation());
            let gen = meta.next_generation();
            meta.advance_generation(gen);
            assert_eq!(expected, meta.generation());
            assert_eq!(expected, meta.last_generation());
        }
    }

    #[test]
    fn segment_names_are_unique_and_monotonic() {
        let meta = IndexMeta::new();
        assert_eq!("_1", meta.next_segment_name());
        assert_eq!("_2", meta.next_segment_name());
        assert_eq!(2, meta.segment_counter());
    }

    #[test]
    fn clone_copies_counter_value_without_sharing() {
        let meta = IndexMeta::new();
        meta.next_segment_name();
        let clone = meta.clone();
        assert_eq!(1, clone.segment_counter());

        clone.next_segment_name();
        assert_eq!(2, clone.segment_counter());
        assert_eq!(1, meta.segment_counter());
    }

    #[test]
    fn clone_preserves_generations_and_pending() {
        let mut meta = IndexMeta::new();
        meta.advance_generation(1);
        meta.next_segment_name();
        meta.stage(IndexSegment {
            meta: SegmentMeta::new("_1", codec::default_codec()),
            filename: "_1.meta.json".to_string(),
        });

        let clone = meta.clone();
        assert_eq!(meta.generation(), clone.generation());
        assert_eq!(meta.last_generation(), clone.last_generation());
        assert_eq!(meta.segment_counter(), clone.segment_counter());
        assert_eq!(1, clone.pending().len());
    }

    #[test]
    fn advance_promotes_pending() {
        let mut meta = IndexMeta::new();
        meta.stage(IndexSegment {
            meta: SegmentMeta::new("_1", codec::default_codec()),
            filename: "_1.meta.json".to_string(),
        });
        assert_eq!(1, meta.pending().len());
        assert!(meta.segments().is_empty());

        meta.advance_generation(meta.next_generation());
        assert!(meta.pending().is_empty());
        assert_eq!(1, meta.segments().len());
        assert_eq!(1, meta.generation());
    }

    #[test]
    fn meta_filename_round_trip() {
        assert_eq!(Some(42), parse_meta_filename(&meta_filename(42)));
        assert_eq!(None, parse_meta_filename(Path::new("_1.term")));
        assert_eq!(None, parse_meta_filename(Path::new("meta.x.json")));
        assert_eq!(None, parse_meta_filename(Path::new("meta.0.json")));
    }
}

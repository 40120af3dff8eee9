use std::ops::Index;
use std::sync::Arc;

use arc_swap::ArcSwap;
use log::info;

use crate::codec::CodecPtr;
use crate::directory::Directory;
use crate::index::{latest_generation, meta_filename, IndexMeta, IndexSegment, INVALID_GEN};
use crate::Generation;

use super::segment_reader::SegmentReader;

/// An immutable view over one committed generation: the loaded index meta
/// plus one [`SegmentReader`] per segment.
///
/// Segments are immutable, so a searcher obtained before a commit keeps
/// serving its generation unchanged while newer searchers see the new one.
pub struct Searcher {
    meta: IndexMeta,
    segment_readers: Vec<SegmentReader>,
}

impl Searcher {
    pub fn generation(&self) -> Generation {
        self.meta.generation()
    }

    pub fn index_meta(&self) -> &IndexMeta {
        &self.meta
    }

    /// Number of sub-readers.
    pub fn len(&self) -> usize {
        self.segment_readers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segment_readers.is_empty()
    }

    pub fn segment_readers(&self) -> &[SegmentReader] {
        &self.segment_readers
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SegmentReader> {
        self.segment_readers.iter()
    }

    /// Live documents across all segments.
    pub fn docs_count(&self) -> u64 {
        self.segment_readers.iter().map(SegmentReader::docs_count).sum()
    }
}

impl Index<usize> for Searcher {
    type Output = SegmentReader;

    fn index(&self, ord: usize) -> &SegmentReader {
        &self.segment_readers[ord]
    }
}

impl<'a> IntoIterator for &'a Searcher {
    type Item = &'a SegmentReader;
    type IntoIter = std::slice::Iter<'a, SegmentReader>;

    fn into_iter(self) -> Self::IntoIter {
        self.segment_readers.iter()
    }
}

/// Entry point for reading an index: opens the latest committed generation
/// and lends out consistent [`Searcher`] snapshots.
pub struct IndexReader {
    directory: Arc<dyn Directory>,
    codec: CodecPtr,
    searcher: ArcSwap<Searcher>,
}

impl IndexReader {
    /// Opens the newest generation in `directory`. An index that has never
    /// been committed yields an empty searcher.
    pub fn open(directory: Arc<dyn Directory>, codec: CodecPtr) -> crate::Result<IndexReader> {
        let searcher = Self::load_searcher(directory.as_ref(), &codec)?;
        Ok(IndexReader { directory, codec, searcher: ArcSwap::from_pointee(searcher) })
    }

    fn load_searcher(directory: &dyn Directory, codec: &CodecPtr) -> crate::Result<Searcher> {
        let Some(gen) = latest_generation(directory)? else {
            return Ok(Searcher { meta: IndexMeta::new(), segment_readers: Vec::new() });
        };

        let meta_json = directory.atomic_read(&meta_filename(gen))?;
        let meta_json = String::from_utf8_lossy(&meta_json);

        // resolve the descriptor files listed by the meta
        let bridge: crate::index::IndexMetaJson = serde_json::from_str(&meta_json)?;
        let mut segments = Vec::with_capacity(bridge.segments.len());
        for filename in &bridge.segments {
            let segment_meta = codec.read_segment_meta(directory, filename)?;
            segments.push(IndexSegment { meta: segment_meta, filename: filename.clone() });
        }
        let meta = IndexMeta::from_json(&meta_json, segments)?;

        let segment_readers = meta
            .segments()
            .iter()
            .map(|entry| SegmentReader::open(directory, entry.meta.clone_meta()))
            .collect::<crate::Result<Vec<_>>>()?;

        info!(
            "opened index generation {} ({} segments, {} docs)",
            gen,
            segment_readers.len(),
            segment_readers.iter().map(SegmentReader::docs_count).sum::<u64>()
        );
        Ok(Searcher { meta, segment_readers })
    }

    /// Re-opens the latest generation. Searchers handed out earlier keep
    /// their snapshot.
    pub fn reload(&self) -> crate::Result<()> {
        let searcher = Self::load_searcher(self.directory.as_ref(), &self.codec)?;
        self.searcher.store(Arc::new(searcher));
        Ok(())
    }

    /// The current snapshot. Hold on to the returned `Arc` for the duration
    /// of a query so every sub-query sees the same segment set.
    pub fn searcher(&self) -> Arc<Searcher> {
        self.searcher.load_full()
    }

    pub fn generation(&self) -> Generation {
        self.searcher.load().generation()
    }

    /// True if the directory holds no committed generation yet.
    pub fn is_pristine(&self) -> bool {
        self.searcher.load().generation() == INVALID_GEN
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::codec;
    use crate::directory::RamDirectory;
    use crate::doc;
    use crate::indexer::{IndexWriter, OpenMode};
    use crate::test_fixtures::open_simple_sequential;

    #[test]
    fn empty_directory_opens_pristine() {
        let directory: Arc<dyn Directory> = Arc::new(RamDirectory::create());
        let reader = IndexReader::open(directory, codec::default_codec()).unwrap();
        assert!(reader.is_pristine());
        let searcher = reader.searcher();
        assert!(searcher.is_empty());
        assert_eq!(0, searcher.docs_count());
    }

    #[test]
    fn opens_the_committed_snapshot() {
        let fixture = open_simple_sequential();
        let searcher = fixture.reader.searcher();
        assert_eq!(1, searcher.len());
        assert_eq!(32, searcher.docs_count());
        assert_eq!(1, searcher.generation());
        assert_eq!(32, searcher[0].docs_count());
        // everything lives in the shared in-memory directory
        assert!(fixture.ram.total_mem_usage() > 0);
    }

    #[test]
    fn stored_field_visitor() {
        let fixture = open_simple_sequential();
        let searcher = fixture.reader.searcher();
        let segment = &searcher[0];

        // doc 1 stores name == "A"
        let mut name = Vec::new();
        let matched = segment
            .document(1, |field, payload| {
                if field.name == "name" {
                    name = payload.to_vec();
                }
                true
            })
            .unwrap();
        assert!(matched);
        assert_eq!(b"A".to_vec(), name);

        // a false return aborts the visit and reports no-match
        let mut visited = 0;
        let matched = segment
            .document(1, |field, _payload| {
                visited += 1;
                field.name != "name"
            })
            .unwrap();
        assert!(!matched);
        assert_eq!(1, visited); // "name" is the first stored field

        // out-of-range doc ids are an error
        assert!(segment.document(0, |_, _| true).is_err());
        assert!(segment.document(33, |_, _| true).is_err());
    }

    #[test]
    fn stored_numeric_payloads_decode() {
        use crate::util::bits::{read_zvdouble, read_zvlong};

        let fixture = open_simple_sequential();
        let searcher = fixture.reader.searcher();
        let segment = &searcher[0];

        let mut seq = None;
        let mut value = None;
        segment
            .document(14, |field, mut payload| {
                match field.name.as_str() {
                    "seq" => seq = read_zvlong(&mut payload).ok(),
                    "value" => value = read_zvdouble(&mut payload).ok(),
                    _ => {}
                }
                true
            })
            .unwrap();
        assert_eq!(Some(13), seq);
        assert_eq!(Some(8.0), value);
    }

    #[test]
    fn readers_keep_their_snapshot_until_reload() {
        let fixture = open_simple_sequential();
        let old_searcher = fixture.reader.searcher();
        assert_eq!(32, old_searcher.docs_count());

        // a second commit through a fresh writer
        let mut writer = IndexWriter::open(
            Arc::clone(&fixture.directory),
            fixture.codec.clone(),
            OpenMode::CreateOrOpen,
        )
        .unwrap();
        writer.insert(doc!("name" => "extra")).unwrap();
        let gen = writer.commit().unwrap();
        assert_eq!(2, gen);

        // the old snapshot is unaffected
        assert_eq!(32, old_searcher.docs_count());
        assert_eq!(1, old_searcher.generation());

        fixture.reader.reload().unwrap();
        let new_searcher = fixture.reader.searcher();
        assert_eq!(33, new_searcher.docs_count());
        assert_eq!(2, new_searcher.generation());
        assert_eq!(2, new_searcher.len());

        // and the pre-reload snapshot still answers for its generation
        assert_eq!(32, old_searcher.docs_count());
    }
}

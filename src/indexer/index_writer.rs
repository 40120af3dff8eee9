use std::path::Path;
use std::sync::Arc;

use itertools::Itertools;
use log::{info, warn};

use crate::codec::CodecPtr;
use crate::concurrent::ThreadPool;
use crate::directory::Directory;
use crate::document::Document;
use crate::error::Error;
use crate::index::{
    latest_generation, meta_filename, IndexMeta, IndexSegment, SegmentMeta, INVALID_GEN,
};
use crate::Generation;

use super::segment_writer::SegmentWriter;

/// Documents per segment before the writer rotates to a fresh one.
pub const DEFAULT_SEGMENT_DOCS_BUDGET: u64 = 100_000;

/// How to open an index for writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Replace whatever the directory holds.
    Create,
    /// Continue an existing index, or start a fresh one when the directory
    /// holds none.
    CreateOrOpen,
}

/// Accepts documents, groups them into segments and publishes them as new
/// index-meta generations.
///
/// A commit is atomic: either the new `meta.<gen>.json` lands in the
/// directory with every segment artefact it references, or the previous
/// generation stays untouched. Readers opened before a commit keep their
/// snapshot; segments are never mutated.
pub struct IndexWriter {
    directory: Arc<dyn Directory>,
    codec: CodecPtr,
    pool: Arc<ThreadPool>,
    meta: IndexMeta,
    current: Option<SegmentWriter>,
    filled: Vec<SegmentWriter>,
    segment_docs_budget: u64,
}

impl IndexWriter {
    /// Opens a writer with its own cpu-sized serialization pool.
    pub fn open(
        directory: Arc<dyn Directory>,
        codec: CodecPtr,
        mode: OpenMode,
    ) -> crate::Result<IndexWriter> {
        Self::open_with_pool(directory, codec, mode, Arc::new(ThreadPool::for_num_cpus()))
    }

    /// Opens a writer flushing its segments on a shared pool.
    pub fn open_with_pool(
        directory: Arc<dyn Directory>,
        codec: CodecPtr,
        mode: OpenMode,
        pool: Arc<ThreadPool>,
    ) -> crate::Result<IndexWriter> {
        let meta = match mode {
            OpenMode::Create => {
                Self::wipe_existing(directory.as_ref())?;
                IndexMeta::new()
            }
            OpenMode::CreateOrOpen => match latest_generation(directory.as_ref())? {
                Some(gen) => Self::load_meta(directory.as_ref(), &codec, gen)?,
                None => IndexMeta::new(),
            },
        };

        Ok(IndexWriter {
            directory,
            codec,
            pool,
            meta,
            current: None,
            filled: Vec::new(),
            segment_docs_budget: DEFAULT_SEGMENT_DOCS_BUDGET,
        })
    }

    fn load_meta(
        directory: &dyn Directory,
        codec: &CodecPtr,
        gen: Generation,
    ) -> crate::Result<IndexMeta> {
        let meta_json = directory.atomic_read(&meta_filename(gen))?;
        let meta_json = String::from_utf8_lossy(&meta_json);
        let bridge: crate::index::IndexMetaJson = serde_json::from_str(&meta_json)?;

        let mut segments = Vec::with_capacity(bridge.segments.len());
        for filename in &bridge.segments {
            let segment_meta = codec.read_segment_meta(directory, filename)?;
            segments.push(IndexSegment { meta: segment_meta, filename: filename.clone() });
        }
        IndexMeta::from_json(&meta_json, segments)
    }

    /// Removes the previous index: every generation file plus the files the
    /// newest generation references.
    fn wipe_existing(directory: &dyn Directory) -> crate::Result<()> {
        let Some(gen) = latest_generation(directory)? else {
            return Ok(());
        };

        let mut doomed: Vec<String> = Vec::new();
        if let Ok(meta_json) = directory.atomic_read(&meta_filename(gen)) {
            if let Ok(bridge) =
                serde_json::from_slice::<crate::index::IndexMetaJson>(&meta_json)
            {
                for filename in &bridge.segments {
                    if let Some(codec) = descriptor_codec(directory, filename) {
                        if let Ok(segment_meta) = codec.read_segment_meta(directory, filename) {
                            doomed.extend(segment_meta.files().iter().cloned());
                        }
                    }
                    doomed.push(filename.clone());
                }
            }
        }
        for path in directory.list_files()? {
            if crate::index::parse_meta_filename(&path).is_some() {
                doomed.push(path.to_string_lossy().into_owned());
            }
        }

        for filename in doomed.into_iter().unique() {
            if let Err(err) = directory.delete(Path::new(&filename)) {
                warn!("could not remove '{filename}' while re-creating the index: {err}");
            }
        }
        Ok(())
    }

    /// The committed generation this writer continues from.
    pub fn generation(&self) -> Generation {
        self.meta.generation()
    }

    pub fn index_meta(&self) -> &IndexMeta {
        &self.meta
    }

    /// Documents staged since the last commit.
    pub fn staged_docs(&self) -> u64 {
        self.filled.iter().map(SegmentWriter::docs_count).sum::<u64>()
            + self.current.as_ref().map_or(0, SegmentWriter::docs_count)
    }

    pub fn set_segment_docs_budget(&mut self, budget: u64) {
        self.segment_docs_budget = budget.max(1);
    }

    /// Stages a document. It becomes visible to readers after `commit`.
    pub fn insert(&mut self, document: Document) -> crate::Result<()> {
        if self.current.is_none() {
            let name = self.meta.next_segment_name();
            self.current = Some(SegmentWriter::for_segment(name));
        }
        let writer = self.current.as_mut().expect("current segment just ensured");
        writer.index_document(&document);

        if writer.docs_count() >= self.segment_docs_budget {
            self.filled.push(self.current.take().expect("budget checked on a live writer"));
        }
        Ok(())
    }

    /// Publishes every staged document under a new generation and returns
    /// it. With nothing staged this re-publishes nothing; the first commit
    /// of a fresh index still writes generation 1 so that readers can open
    /// the (empty) index.
    pub fn commit(&mut self) -> crate::Result<Generation> {
        if let Some(writer) = self.current.take() {
            if writer.docs_count() > 0 {
                self.filled.push(writer);
            }
        }

        if self.filled.is_empty() && self.meta.generation() != INVALID_GEN {
            return Ok(self.meta.generation());
        }

        let writers = std::mem::take(&mut self.filled);
        let entries = self.serialize_segments(writers)?;

        // build the next generation on a copy; the held meta only advances
        // once the new generation file is safely in the directory
        let mut published = self.meta.clone();
        for entry in entries {
            published.stage(entry);
        }
        let gen = published.next_generation();
        published.advance_generation(gen);
        let meta_json = published.to_json()?;

        self.directory.atomic_write(&meta_filename(gen), meta_json.as_bytes())?;
        self.directory.sync_directory()?;
        self.meta = published;

        info!(
            "committed generation {} ({} segments, {} docs)",
            gen,
            self.meta.segments().len(),
            self.meta.segments().iter().map(|entry| entry.meta.docs_count()).sum::<u64>()
        );
        Ok(gen)
    }

    /// Serializes the filled segment writers, farming out to the shared pool
    /// when there is more than one.
    fn serialize_segments(
        &mut self,
        writers: Vec<SegmentWriter>,
    ) -> crate::Result<Vec<IndexSegment>> {
        if writers.len() <= 1 {
            return writers
                .into_iter()
                .map(|writer| serialize_one(self.directory.as_ref(), &self.codec, writer))
                .collect();
        }

        let (result_tx, result_rx) = crossbeam_channel::unbounded();
        let jobs = writers.len();

        for (job, writer) in writers.into_iter().enumerate() {
            let directory = Arc::clone(&self.directory);
            let codec = self.codec.clone();
            let result_tx = result_tx.clone();
            let scheduled = self.pool.run(move || {
                let result = serialize_one(directory.as_ref(), &codec, writer);
                let _ = result_tx.send((job, result));
            });
            if !scheduled {
                return Err(Error::State("segment serialization pool is stopped".to_string()));
            }
        }
        drop(result_tx);

        // the channel closes once every task has reported or died
        let mut slots: Vec<Option<IndexSegment>> = (0..jobs).map(|_| None).collect();
        for (job, result) in result_rx.iter() {
            slots[job] = Some(result?);
        }

        // commit order matches insertion order
        slots
            .into_iter()
            .map(|slot| {
                slot.ok_or_else(|| {
                    Error::ErrorInThread(
                        "a segment serialization task died before reporting".to_string(),
                    )
                })
            })
            .collect()
    }

    /// Drops everything staged since the last commit. The committed index is
    /// untouched.
    pub fn rollback(&mut self) -> crate::Result<Generation> {
        let dropped = self.staged_docs();
        self.current = None;
        self.filled.clear();
        self.meta.discard_pending();
        if dropped > 0 {
            info!("rolled back {dropped} staged docs to generation {}", self.meta.generation());
        }
        Ok(self.meta.generation())
    }
}

fn descriptor_codec(directory: &dyn Directory, filename: &str) -> Option<CodecPtr> {
    let data = directory.atomic_read(Path::new(filename)).ok()?;
    let json: crate::index::SegmentMetaJson = serde_json::from_slice(&data).ok()?;
    crate::codec::get(&json.codec)
}

fn serialize_one(
    directory: &dyn Directory,
    codec: &CodecPtr,
    writer: SegmentWriter,
) -> crate::Result<IndexSegment> {
    let mut segment_meta = SegmentMeta::new(writer.segment_name().to_string(), codec.clone());
    let payload = writer.finalize();
    codec.write_segment(directory, &payload, &mut segment_meta)?;
    let filename = codec.write_segment_meta(directory, &segment_meta)?;
    Ok(IndexSegment { meta: segment_meta, filename })
}

#[cfg(test)]
mod tests {
    use std::path::Path as StdPath;

    use super::*;
    use crate::codec;
    use crate::directory::RamDirectory;
    use crate::doc;
    use crate::reader::IndexReader;

    fn ram_setup() -> (Arc<dyn Directory>, CodecPtr) {
        (Arc::new(RamDirectory::create()), codec::default_codec())
    }

    #[test]
    fn first_commit_of_an_empty_index_writes_generation_one() {
        let (directory, codec) = ram_setup();
        let mut writer =
            IndexWriter::open(Arc::clone(&directory), codec.clone(), OpenMode::Create).unwrap();
        assert_eq!(0, writer.generation());

        let gen = writer.commit().unwrap();
        assert_eq!(1, gen);

        let reader = IndexReader::open(directory, codec).unwrap();
        assert!(!reader.is_pristine());
        assert!(reader.searcher().is_empty());
    }

    #[test]
    fn each_commit_advances_the_generation_by_one() {
        let (directory, codec) = ram_setup();
        let mut writer =
            IndexWriter::open(Arc::clone(&directory), codec.clone(), OpenMode::Create).unwrap();

        for expected in 1..=4u64 {
            writer.insert(doc!("seq" => expected as i64)).unwrap();
            assert_eq!(expected, writer.commit().unwrap());
        }

        let reader = IndexReader::open(directory, codec).unwrap();
        let searcher = reader.searcher();
        assert_eq!(4, searcher.generation());
        assert_eq!(4, searcher.len());
        assert_eq!(4, searcher.docs_count());
    }

    #[test]
    fn commit_without_staged_docs_is_a_no_op() {
        let (directory, codec) = ram_setup();
        let mut writer = IndexWriter::open(directory, codec, OpenMode::Create).unwrap();
        writer.insert(doc!("name" => "A")).unwrap();
        assert_eq!(1, writer.commit().unwrap());
        assert_eq!(1, writer.commit().unwrap());
        assert_eq!(1, writer.generation());
    }

    #[test]
    fn docs_budget_rotates_segments() {
        let (directory, codec) = ram_setup();
        let mut writer =
            IndexWriter::open(Arc::clone(&directory), codec.clone(), OpenMode::Create).unwrap();
        writer.set_segment_docs_budget(10);

        for seq in 0..25i64 {
            writer.insert(doc!("seq" => seq)).unwrap();
        }
        assert_eq!(25, writer.staged_docs());
        writer.commit().unwrap();

        let meta = writer.index_meta();
        let docs: Vec<u64> =
            meta.segments().iter().map(|entry| entry.meta.docs_count()).collect();
        assert_eq!(vec![10, 10, 5], docs);

        // every file a committed segment lists is present in the directory
        for entry in meta.segments() {
            for file in entry.meta.files() {
                assert!(directory.exists(StdPath::new(file)).unwrap(), "missing {file}");
            }
            assert!(directory.exists(StdPath::new(&entry.filename)).unwrap());
        }

        let reader = IndexReader::open(directory, codec).unwrap();
        assert_eq!(25, reader.searcher().docs_count());
    }

    #[test]
    fn rollback_discards_staged_documents() {
        let (directory, codec) = ram_setup();
        let mut writer =
            IndexWriter::open(Arc::clone(&directory), codec.clone(), OpenMode::Create).unwrap();
        writer.insert(doc!("name" => "A")).unwrap();
        writer.commit().unwrap();

        writer.insert(doc!("name" => "B")).unwrap();
        writer.insert(doc!("name" => "C")).unwrap();
        assert_eq!(2, writer.staged_docs());
        assert_eq!(1, writer.rollback().unwrap());
        assert_eq!(0, writer.staged_docs());

        writer.commit().unwrap();
        let reader = IndexReader::open(directory, codec).unwrap();
        assert_eq!(1, reader.searcher().docs_count());
    }

    #[test]
    fn create_or_open_continues_an_existing_index() {
        let (directory, codec) = ram_setup();
        {
            let mut writer =
                IndexWriter::open(Arc::clone(&directory), codec.clone(), OpenMode::Create)
                    .unwrap();
            writer.insert(doc!("name" => "A")).unwrap();
            writer.commit().unwrap();
        }

        let mut writer =
            IndexWriter::open(Arc::clone(&directory), codec.clone(), OpenMode::CreateOrOpen)
                .unwrap();
        assert_eq!(1, writer.generation());
        writer.insert(doc!("name" => "B")).unwrap();
        assert_eq!(2, writer.commit().unwrap());

        // segment names continue from the persisted counter
        let names: Vec<&str> =
            writer.index_meta().segments().iter().map(|entry| entry.meta.name()).collect();
        assert_eq!(vec!["_1", "_2"], names);

        let reader = IndexReader::open(directory, codec).unwrap();
        assert_eq!(2, reader.searcher().docs_count());
    }

    #[test]
    fn create_replaces_an_existing_index() {
        let (directory, codec) = ram_setup();
        {
            let mut writer =
                IndexWriter::open(Arc::clone(&directory), codec.clone(), OpenMode::Create)
                    .unwrap();
            for seq in 0..5i64 {
                writer.insert(doc!("seq" => seq)).unwrap();
            }
            writer.commit().unwrap();
        }

        let mut writer =
            IndexWriter::open(Arc::clone(&directory), codec.clone(), OpenMode::Create).unwrap();
        assert_eq!(0, writer.generation());
        writer.insert(doc!("name" => "fresh")).unwrap();
        assert_eq!(1, writer.commit().unwrap());

        let reader = IndexReader::open(directory, codec).unwrap();
        let searcher = reader.searcher();
        assert_eq!(1, searcher.generation());
        assert_eq!(1, searcher.docs_count());
    }
}

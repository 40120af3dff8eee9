//! Shared test fixture mirroring the classic `simple_sequential` dataset:
//! 32 documents with `name` running "A".."Z" then a few symbol tokens,
//! `same == "xyz"` everywhere, `seq` holding the zero-based position and
//! `value` a numeric fixture indexed at every width.

use std::sync::Arc;

use crate::codec::{self, CodecPtr};
use crate::directory::{Directory, RamDirectory};
use crate::document::{Document, Field, FieldValue, IndexOptions};
use crate::indexer::{IndexWriter, OpenMode};
use crate::reader::{IndexReader, Searcher};
use crate::search::{Filter, FilterClause, PreparedOrder};
use crate::DocId;

pub const NAMES: [&str; 32] = [
    "A", "B", "C", "D", "E", "F", "G", "H", "I", "J", "K", "L", "M", "N", "O", "P", "Q", "R", "S",
    "T", "U", "V", "W", "X", "Y", "Z", "!", "@", "#", "$", "%", "&",
];

/// `value` per document (1-based doc ids follow insertion order):
/// docs 1, 5, 7, 9 and 10 hold 100, doc 13 holds 90.564.
pub const VALUES: [f64; 32] = [
    100.0, 123.0, 12.0, 23.5, 100.0, 123.65, 100.0, 9.45, 100.0, 100.0, 70.0, 26.0, 90.564, 8.0,
    31.0, 32.0, 33.0, 34.0, 35.0, 36.0, 37.0, 38.0, 39.0, 40.0, 41.0, 42.0, 43.0, 44.0, 45.0,
    46.0, 47.0, 48.0,
];

pub fn simple_sequential_docs() -> Vec<Document> {
    NAMES
        .iter()
        .zip(VALUES.iter())
        .enumerate()
        .map(|(seq, (name, &value))| {
            let mut doc = Document::new();
            doc.add_string("name", *name);
            doc.add_string("same", "xyz");
            // seq at both integer widths, stored once
            doc.add_i64("seq", seq as i64);
            doc.add_field(Field::new("seq", FieldValue::I32(seq as i32), IndexOptions::INDEXED_ONLY));
            // value at all four numeric widths, stored once
            doc.add_f64("value", value);
            doc.add_field(Field::new("value", FieldValue::F32(value as f32), IndexOptions::INDEXED_ONLY));
            doc.add_field(Field::new(
                "value",
                FieldValue::I64(value.ceil() as i64),
                IndexOptions::INDEXED_ONLY,
            ));
            doc.add_field(Field::new(
                "value",
                FieldValue::I32(value.ceil() as i32),
                IndexOptions::INDEXED_ONLY,
            ));
            doc
        })
        .collect()
}

pub struct Fixture {
    pub ram: RamDirectory,
    pub directory: Arc<dyn Directory>,
    pub codec: CodecPtr,
    pub reader: IndexReader,
}

impl Fixture {
    pub fn searcher(&self) -> Arc<Searcher> {
        self.reader.searcher()
    }
}

/// Writes the 32-document fixture into a fresh in-memory index and opens a
/// reader over it.
/// Routes `log` output into the test harness; safe to call repeatedly.
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn open_simple_sequential() -> Fixture {
    init_test_logging();
    let ram = RamDirectory::create();
    let directory: Arc<dyn Directory> = Arc::new(ram.clone());
    let codec = codec::default_codec();

    let mut writer =
        IndexWriter::open(Arc::clone(&directory), codec.clone(), OpenMode::Create).unwrap();
    for doc in simple_sequential_docs() {
        writer.insert(doc).unwrap();
    }
    writer.commit().unwrap();

    let reader = IndexReader::open(Arc::clone(&directory), codec.clone()).unwrap();
    Fixture { ram, directory, codec, reader }
}

/// Runs `filter` over every segment of `searcher`, collecting doc ids in
/// iteration order along with each segment iterator's cost.
pub fn run_query(searcher: &Searcher, filter: &Filter) -> (Vec<DocId>, Vec<u64>) {
    let prepared = filter.prepare(searcher, &PreparedOrder::unordered()).unwrap();
    let mut docs = Vec::new();
    let mut costs = Vec::new();
    for segment in searcher {
        let mut it = prepared.execute(segment);
        costs.push(it.cost());
        while it.next() {
            docs.push(it.value());
        }
    }
    (docs, costs)
}

/// Asserts `filter` matches exactly `expected`, in doc-id order.
pub fn check_query(searcher: &Searcher, filter: &Filter, expected: &[DocId]) {
    let (docs, _) = run_query(searcher, filter);
    assert_eq!(expected, docs.as_slice(), "filter {filter:?}");
}

/// Asserts matches and per-segment costs.
pub fn check_query_costs(
    searcher: &Searcher,
    filter: &Filter,
    expected: &[DocId],
    expected_costs: &[u64],
) {
    let (docs, costs) = run_query(searcher, filter);
    assert_eq!(expected, docs.as_slice(), "filter {filter:?}");
    assert_eq!(expected_costs, costs.as_slice(), "filter {filter:?}");
}

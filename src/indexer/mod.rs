mod index_writer;
mod segment_writer;

pub use index_writer::{IndexWriter, OpenMode, DEFAULT_SEGMENT_DOCS_BUDGET};
pub use segment_writer::SegmentWriter;

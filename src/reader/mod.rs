mod index_reader;
mod segment_reader;

pub use index_reader::{IndexReader, Searcher};
pub use segment_reader::{FieldReader, SegmentReader};

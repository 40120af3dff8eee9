//! A segment-based full-text inverted index.
//!
//! Documents of typed fields are staged through an
//! [`IndexWriter`](indexer::IndexWriter), persisted as immutable segments by
//! a pluggable [`Codec`](codec::Codec) into a
//! [`Directory`](directory::Directory), and published under monotonically
//! increasing index-meta generations. An
//! [`IndexReader`](reader::IndexReader) opens a generation as a consistent
//! snapshot; [`Filter`](search::Filter)s prepare against the snapshot and
//! execute per segment, yielding seekable, optionally scored document
//! iterators.

pub mod codec;
pub mod concurrent;
pub mod directory;
pub mod document;
mod error;
pub mod index;
pub mod indexer;
mod macros;
pub mod reader;
pub mod search;
pub mod tokens;
pub mod util;

#[cfg(test)]
pub(crate) mod test_fixtures;

pub use error::{DataCorruption, Error};

/// Segment-local document id. The first document of a segment is 1; 0 is
/// the "unpositioned" value of a fresh iterator.
pub type DocId = u32;

/// End sentinel of a document iterator.
pub const DOC_EOF: DocId = DocId::MAX;

/// Index-meta generation tag; see [`index::INVALID_GEN`].
pub type Generation = u64;

/// Position of a segment within a reader snapshot.
pub type SegmentOrdinal = u32;

pub type Result<T> = std::result::Result<T, Error>;

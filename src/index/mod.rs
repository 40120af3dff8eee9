mod field_meta;
mod index_meta;
mod segment_meta;

pub use field_meta::FieldMeta;
pub use index_meta::{
    latest_generation, meta_filename, parse_meta_filename, IndexMeta, IndexMetaJson, IndexSegment,
    INVALID_GEN,
};
pub use segment_meta::{SegmentMeta, SegmentMetaJson};

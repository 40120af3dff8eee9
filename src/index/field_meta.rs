use serde::{Deserialize, Serialize};

use crate::document::IndexOptions;

/// Per-segment record of an indexed or stored field. Field names are unique
/// within a segment; a field keeps the options of its first occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMeta {
    pub name: String,
    pub options: IndexOptions,
}

impl FieldMeta {
    pub fn new(name: impl Into<String>, options: IndexOptions) -> FieldMeta {
        FieldMeta { name: name.into(), options }
    }
}

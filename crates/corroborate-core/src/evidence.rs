//! Evidence passages and their source metadata.
//!
//! A chunk is a verbatim slice of extracted document text. Metadata records
//! where it came from (document id, character offsets, file type) and travels
//! with the chunk into the index.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// Key-value metadata attached to chunks and index entries.
///
/// BTreeMap keeps serialization order stable.
pub type Metadata = BTreeMap<String, JsonValue>;

/// Well-known metadata keys.
pub mod keys {
    pub const DOCUMENT_ID: &str = "document_id";
    pub const FILE_TYPE: &str = "file_type";
    pub const CHUNK_INDEX: &str = "chunk_index";
    /// Character offset of the first char in the chunk
    pub const START: &str = "start";
    /// Character offset one past the last char in the chunk
    pub const END: &str = "end";
}

/// A bounded passage of evidence text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvidenceChunk {
    pub text: String,

    #[serde(default)]
    pub metadata: Metadata,
}

impl EvidenceChunk {
    /// Create a chunk with no metadata.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: Metadata::new(),
        }
    }

    /// Attach a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Character span recorded by the chunker, if present.
    pub fn span(&self) -> Option<(usize, usize)> {
        let start = self.metadata.get(keys::START)?.as_u64()?;
        let end = self.metadata.get(keys::END)?.as_u64()?;
        Some((start as usize, end as usize))
    }

    pub fn document_id(&self) -> Option<&str> {
        self.metadata.get(keys::DOCUMENT_ID)?.as_str()
    }
}

//! Document ingestion: extract, chunk, embed, store.
//!
//! Every embedding for a document is computed before anything touches the
//! index, and the document lands in a single `store` call. A failed or
//! cancelled ingestion therefore leaves the partition unchanged.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use corroborate_core::{evidence::keys, EvidenceChunker, ExtractError, FileType, Metadata};

use crate::embedding::{EmbeddingError, EmbeddingProvider};
use crate::extract::{extract_path, TextExtractor};
use crate::index::{EvidenceIndex, IndexError};

#[derive(Error, Debug)]
pub enum IngestError {
    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error("Failed to embed evidence: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error("No text extractor configured")]
    NoExtractor,
}

/// Summary of one ingested document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    pub question_id: String,
    pub document_id: String,
    pub file_type: Option<FileType>,
    pub chunk_count: usize,
    pub characters: usize,
}

/// Turns a document into indexed evidence for one question.
///
/// Extract, chunk, embed in one batch, then a single `store`. Nothing is
/// stored unless every chunk was embedded.
pub struct EvidenceIngestor {
    chunker: EvidenceChunker,
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn EvidenceIndex>,
    extractor: Option<Arc<dyn TextExtractor>>,
}

impl EvidenceIngestor {
    pub fn new(
        chunker: EvidenceChunker,
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn EvidenceIndex>,
    ) -> Self {
        Self {
            chunker,
            embedder,
            index,
            extractor: None,
        }
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    /// Index already-extracted text as evidence for `question_id`.
    ///
    /// Empty text still registers the partition, so later queries return
    /// no hits instead of failing.
    pub async fn ingest_text(
        &self,
        question_id: &str,
        document_id: &str,
        file_type: Option<FileType>,
        text: &str,
    ) -> Result<IngestReport, IngestError> {
        let chunks = self.chunker.chunk_document(document_id, file_type, text);

        let embeddings = if chunks.is_empty() {
            Vec::new()
        } else {
            let inputs: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
            self.embedder.embed(&inputs).await?
        };

        let mut metadata = Metadata::new();
        metadata.insert(keys::DOCUMENT_ID.to_string(), document_id.into());
        if let Some(file_type) = file_type {
            metadata.insert(keys::FILE_TYPE.to_string(), file_type.as_str().into());
        }

        let chunk_count = chunks.len();
        self.index
            .store(question_id, chunks, embeddings, metadata)
            .await?;

        tracing::info!(
            question_id,
            document_id,
            chunks = chunk_count,
            model = self.embedder.model_name(),
            "Ingested evidence document"
        );

        Ok(IngestReport {
            question_id: question_id.to_string(),
            document_id: document_id.to_string(),
            file_type,
            chunk_count,
            characters: text.chars().count(),
        })
    }

    /// Extract `path` with the configured extractor and index its text.
    ///
    /// The document id defaults to the file name.
    pub async fn ingest_file(
        &self,
        question_id: &str,
        path: &Path,
        document_id: Option<&str>,
    ) -> Result<IngestReport, IngestError> {
        let extractor = self.extractor.as_deref().ok_or(IngestError::NoExtractor)?;
        let (file_type, text) = extract_path(extractor, path).await?;

        let default_id = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let document_id = document_id.unwrap_or(&default_id);

        self.ingest_text(question_id, document_id, Some(file_type), &text)
            .await
    }
}

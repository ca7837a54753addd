//! Per-question semantic evidence index.
//!
//! Evidence is partitioned by question id. A partition only exists after a
//! `store` call for that question, and vectors are never shared across
//! partitions. Entries are append-only: re-indexing is a new `store` call.
//!
//! # Concurrency Contract
//! - Concurrent `query` calls against one partition are safe
//! - Concurrent `store` calls against disjoint partitions are safe
//! - Each `store` batch lands all-or-nothing
//! - Ordering across same-partition `store` calls is the backend's concern

mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use corroborate_core::{EvidenceChunk, Metadata};

use crate::embedding::Embedding;

pub use memory::{cosine_similarity, InMemoryEvidenceIndex};

/// Errors from evidence index operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IndexError {
    #[error("Dimension mismatch: {chunks} chunks but {embeddings} embeddings")]
    DimensionMismatch { chunks: usize, embeddings: usize },

    #[error("No evidence indexed for question '{0}'")]
    PartitionNotFound(String),

    #[error("Invalid embedding width: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },

    #[error("Embedding has zero width")]
    EmptyEmbedding,

    #[error("Embedding contains a non-finite component at position {position}")]
    NonFiniteEmbedding { position: usize },

    #[error("Index backend failed: {0}")]
    Backend(String),
}

/// One stored chunk with its vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceIndexEntry {
    pub question_id: String,
    pub chunk: EvidenceChunk,
    pub embedding: Embedding,

    /// Metadata supplied with the `store` call
    pub metadata: Metadata,
}

/// A query hit, best first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceMatch {
    pub chunk: EvidenceChunk,
    pub metadata: Metadata,

    /// Similarity to the query vector
    pub score: f32,
}

/// Storage and nearest-neighbour lookup for evidence chunks.
#[async_trait]
pub trait EvidenceIndex: Send + Sync {
    /// Store `chunks[i]` with `embeddings[i]`, attaching `metadata` to each.
    ///
    /// Fails with [`IndexError::DimensionMismatch`] when the two sequences
    /// differ in length. Nothing is stored on failure.
    async fn store(
        &self,
        question_id: &str,
        chunks: Vec<EvidenceChunk>,
        embeddings: Vec<Embedding>,
        metadata: Metadata,
    ) -> Result<(), IndexError>;

    /// Up to `k` entries of the question's partition, most similar first.
    ///
    /// Fails with [`IndexError::PartitionNotFound`] when nothing was ever
    /// stored for `question_id`.
    async fn query(
        &self,
        question_id: &str,
        embedding: &[f32],
        k: usize,
    ) -> Result<Vec<EvidenceMatch>, IndexError>;
}

//! In-memory evidence index using cosine similarity.
//!
//! Ties are broken by insertion order. The vector width is fixed by the
//! first non-empty `store` and enforced for the lifetime of the index.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

use corroborate_core::{EvidenceChunk, Metadata};

use super::{EvidenceIndex, EvidenceIndexEntry, EvidenceMatch, IndexError};
use crate::embedding::Embedding;

#[derive(Default)]
struct IndexState {
    dimension: Option<usize>,
    partitions: HashMap<String, Vec<EvidenceIndexEntry>>,
}

/// Evidence index held in process memory.
///
/// Partitions live in one map behind a single `RwLock`, so queries run in
/// parallel and each `store` batch is applied under one write guard.
#[derive(Default)]
pub struct InMemoryEvidenceIndex {
    state: RwLock<IndexState>,
}

impl InMemoryEvidenceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Vector width, once any vector has been stored.
    pub fn dimension(&self) -> Option<usize> {
        self.state.read().dimension
    }

    /// Number of entries in a partition, `None` if it was never stored.
    pub fn entry_count(&self, question_id: &str) -> Option<usize> {
        self.state.read().partitions.get(question_id).map(Vec::len)
    }

    pub fn partition_count(&self) -> usize {
        self.state.read().partitions.len()
    }
}

fn check_finite(embedding: &[f32]) -> Result<(), IndexError> {
    match embedding.iter().position(|x| !x.is_finite()) {
        Some(position) => Err(IndexError::NonFiniteEmbedding { position }),
        None => Ok(()),
    }
}

/// Width shared by every vector in the batch. NaN and infinite components
/// are rejected.
fn batch_dimension(embeddings: &[Embedding]) -> Result<Option<usize>, IndexError> {
    let Some(first) = embeddings.first() else {
        return Ok(None);
    };
    if first.is_empty() {
        return Err(IndexError::EmptyEmbedding);
    }
    for embedding in embeddings {
        if embedding.len() != first.len() {
            return Err(IndexError::InvalidDimension {
                expected: first.len(),
                actual: embedding.len(),
            });
        }
        check_finite(embedding)?;
    }
    Ok(Some(first.len()))
}

#[async_trait]
impl EvidenceIndex for InMemoryEvidenceIndex {
    async fn store(
        &self,
        question_id: &str,
        chunks: Vec<EvidenceChunk>,
        embeddings: Vec<Embedding>,
        metadata: Metadata,
    ) -> Result<(), IndexError> {
        if chunks.len() != embeddings.len() {
            return Err(IndexError::DimensionMismatch {
                chunks: chunks.len(),
                embeddings: embeddings.len(),
            });
        }
        let width = batch_dimension(&embeddings)?;

        let entries: Vec<EvidenceIndexEntry> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| EvidenceIndexEntry {
                question_id: question_id.to_string(),
                chunk,
                embedding,
                metadata: metadata.clone(),
            })
            .collect();

        // Single write section per batch.
        let mut state = self.state.write();
        if let Some(width) = width {
            let fixed = state.dimension;
            match fixed {
                Some(expected) if expected != width => {
                    return Err(IndexError::InvalidDimension {
                        expected,
                        actual: width,
                    });
                }
                Some(_) => {}
                None => state.dimension = Some(width),
            }
        }

        let count = entries.len();
        let partition = state.partitions.entry(question_id.to_string()).or_default();
        partition.extend(entries);

        tracing::debug!(
            question_id,
            stored = count,
            partition_size = partition.len(),
            "Stored evidence batch"
        );
        Ok(())
    }

    async fn query(
        &self,
        question_id: &str,
        embedding: &[f32],
        k: usize,
    ) -> Result<Vec<EvidenceMatch>, IndexError> {
        let state = self.state.read();
        let partition = state
            .partitions
            .get(question_id)
            .ok_or_else(|| IndexError::PartitionNotFound(question_id.to_string()))?;

        if let Some(expected) = state.dimension {
            if embedding.len() != expected {
                return Err(IndexError::InvalidDimension {
                    expected,
                    actual: embedding.len(),
                });
            }
        }
        check_finite(embedding)?;

        let mut scored: Vec<(f32, &EvidenceIndexEntry)> = partition
            .iter()
            .map(|entry| (cosine_similarity(embedding, &entry.embedding), entry))
            .collect();

        // Stable sort: equal scores keep insertion order.
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(score, entry)| EvidenceMatch {
                chunk: entry.chunk.clone(),
                metadata: entry.metadata.clone(),
                score,
            })
            .collect())
    }
}

/// Cosine similarity; 0 for empty, mismatched or zero-norm vectors.
///
/// Accumulates in `f64` so large finite components cannot overflow.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f64 = a.iter().zip(b.iter()).map(|(x, y)| *x as f64 * *y as f64).sum();
    let norm_a: f64 = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    (dot_product / (norm_a * norm_b)) as f32
}

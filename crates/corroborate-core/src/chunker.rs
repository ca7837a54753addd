//! Splits extracted text into overlapping passages for embedding.
//!
//! Chunks are verbatim slices of the input. Each chunk is at most
//! `chunk_size` characters; consecutive chunks share up to `chunk_overlap`
//! characters. Cut points prefer, in order: paragraph breaks, line breaks,
//! sentence ends, whitespace, and only then a hard cut at the size limit.
//!
//! The chunker never drops text: the union of all chunk spans is the whole
//! input.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::evidence::{keys, EvidenceChunk, Metadata};
use crate::extract::FileType;

/// Default target chunk length in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Default overlap between consecutive chunks in characters.
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

lazy_static! {
    /// Sentence terminator, optional closing quote/bracket, then whitespace.
    static ref SENTENCE_BREAK: Regex = Regex::new(r#"[.!?]["')\]]*\s+"#).unwrap();

    static ref WHITESPACE_RUN: Regex = Regex::new(r"\s+").unwrap();
}

/// Errors from chunker configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChunkerError {
    #[error("Invalid chunker config: {0}")]
    InvalidConfig(String),
}

/// Fixed chunking configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkerConfig {
    /// Maximum chunk length in characters
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Characters shared between consecutive chunks
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_chunk_overlap() -> usize {
    DEFAULT_CHUNK_OVERLAP
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

impl ChunkerConfig {
    pub fn validate(&self) -> Result<(), ChunkerError> {
        if self.chunk_size == 0 {
            return Err(ChunkerError::InvalidConfig(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(ChunkerError::InvalidConfig(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

/// Half-open character range of one chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span {
    start: usize,
    end: usize,
}

/// Splits text into overlapping [`EvidenceChunk`]s.
#[derive(Debug, Clone)]
pub struct EvidenceChunker {
    config: ChunkerConfig,
}

impl Default for EvidenceChunker {
    fn default() -> Self {
        Self {
            config: ChunkerConfig::default(),
        }
    }
}

impl EvidenceChunker {
    pub fn new(config: ChunkerConfig) -> Result<Self, ChunkerError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    /// Split `text` into chunks. Empty input yields no chunks.
    ///
    /// Every chunk carries `chunk_index`, `start` and `end` metadata
    /// (character offsets into `text`).
    pub fn chunk(&self, text: &str) -> Vec<EvidenceChunk> {
        self.chunk_with_metadata(text, &Metadata::new())
    }

    /// Split text belonging to a known document.
    pub fn chunk_document(
        &self,
        document_id: &str,
        file_type: Option<FileType>,
        text: &str,
    ) -> Vec<EvidenceChunk> {
        let mut base = Metadata::new();
        base.insert(keys::DOCUMENT_ID.to_string(), document_id.into());
        if let Some(file_type) = file_type {
            base.insert(keys::FILE_TYPE.to_string(), file_type.as_str().into());
        }
        self.chunk_with_metadata(text, &base)
    }

    /// Split text, copying `base` into every chunk's metadata.
    pub fn chunk_with_metadata(&self, text: &str, base: &Metadata) -> Vec<EvidenceChunk> {
        if text.is_empty() {
            return Vec::new();
        }

        // Byte offset of every char, plus the end of the string.
        let bounds: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();

        let spans = self.spans(text, &bounds);
        tracing::debug!(
            chars = bounds.len() - 1,
            chunks = spans.len(),
            "Chunked evidence text"
        );

        spans
            .iter()
            .enumerate()
            .map(|(index, span)| {
                let mut metadata = base.clone();
                metadata.insert(keys::CHUNK_INDEX.to_string(), index.into());
                metadata.insert(keys::START.to_string(), span.start.into());
                metadata.insert(keys::END.to_string(), span.end.into());

                EvidenceChunk {
                    text: text[bounds[span.start]..bounds[span.end]].to_string(),
                    metadata,
                }
            })
            .collect()
    }

    fn spans(&self, text: &str, bounds: &[usize]) -> Vec<Span> {
        let total = bounds.len() - 1;
        let size = self.config.chunk_size;
        let overlap = self.config.chunk_overlap;

        let mut spans = Vec::new();
        let mut start = 0;

        loop {
            if total - start <= size {
                spans.push(Span { start, end: total });
                break;
            }

            let hard_end = start + size;
            // Breakpoints earlier than this would make chunks too short to
            // advance past the overlap.
            let earliest = start + overlap.max(size / 2);
            let end = find_breakpoint(text, bounds, earliest, hard_end).unwrap_or(hard_end);
            spans.push(Span { start, end });

            start = next_start(text, bounds, end - overlap, end);
        }

        spans
    }
}

/// Latest natural cut point in `(earliest, hard_end]`, best tier first.
fn find_breakpoint(text: &str, bounds: &[usize], earliest: usize, hard_end: usize) -> Option<usize> {
    let base = bounds[earliest];
    let window = &text[base..bounds[hard_end]];

    let paragraph = window.rfind("\n\n").map(|p| p + 2);
    let line = || window.rfind('\n').map(|p| p + 1);
    let sentence = || SENTENCE_BREAK.find_iter(window).last().map(|m| m.end());
    let whitespace = || WHITESPACE_RUN.find_iter(window).last().map(|m| m.end());

    let cut = paragraph
        .or_else(line)
        .or_else(sentence)
        .or_else(whitespace)?;

    char_index(bounds, base + cut).filter(|&end| end > earliest)
}

/// Start of the next chunk: the first word start inside the overlap region,
/// or the raw overlap start when the region has no whitespace.
fn next_start(text: &str, bounds: &[usize], overlap_start: usize, end: usize) -> usize {
    if overlap_start == 0 || starts_word(text, bounds, overlap_start) {
        return overlap_start;
    }

    let region = &text[bounds[overlap_start]..bounds[end]];
    WHITESPACE_RUN
        .find(region)
        .and_then(|m| char_index(bounds, bounds[overlap_start] + m.end()))
        .filter(|&candidate| candidate < end)
        .unwrap_or(overlap_start)
}

fn starts_word(text: &str, bounds: &[usize], index: usize) -> bool {
    text[..bounds[index]]
        .chars()
        .next_back()
        .map(char::is_whitespace)
        .unwrap_or(true)
}

fn char_index(bounds: &[usize], byte: usize) -> Option<usize> {
    bounds.binary_search(&byte).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn chunker(size: usize, overlap: usize) -> EvidenceChunker {
        EvidenceChunker::new(ChunkerConfig {
            chunk_size: size,
            chunk_overlap: overlap,
        })
        .unwrap()
    }

    fn spans_of(chunks: &[EvidenceChunk]) -> Vec<(usize, usize)> {
        chunks.iter().map(|c| c.span().unwrap()).collect()
    }

    #[test]
    fn test_empty_input() {
        assert!(EvidenceChunker::default().chunk("").is_empty());
    }

    #[test]
    fn test_short_input_single_chunk() {
        let text = "Safety inductions are delivered to all contractors.";
        let chunks = EvidenceChunker::default().chunk(text);

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, text);
        assert_eq!(chunks[0].span(), Some((0, text.chars().count())));
        assert_eq!(chunks[0].metadata[keys::CHUNK_INDEX], 0);
    }

    #[test]
    fn test_prefers_paragraph_break() {
        let first = "a".repeat(30);
        let second = "b".repeat(30);
        let text = format!("{}\n\n{}", first, second);

        let chunks = chunker(40, 5).chunk(&text);
        assert_eq!(chunks[0].text, format!("{}\n\n", first));
    }

    #[test]
    fn test_prefers_sentence_end_over_word() {
        let text = "The tailings dam is inspected. Reports are filed monthly by the site engineer.";
        let chunks = chunker(50, 10).chunk(text);

        assert!(chunks[0].text.ends_with("inspected. "));
    }

    #[test]
    fn test_hard_cut_without_breakpoints() {
        let text = "x".repeat(25);
        let chunks = chunker(10, 3).chunk(&text);

        assert_eq!(spans_of(&chunks), vec![(0, 10), (7, 17), (14, 24), (21, 25)]);
    }

    #[test]
    fn test_overlap_starts_at_word() {
        let text = "alpha beta gamma delta epsilon zeta eta theta iota kappa";
        let chunks = chunker(20, 8).chunk(text);

        for chunk in &chunks[1..] {
            assert!(!chunk.text.starts_with(' '));
            let (start, _) = chunk.span().unwrap();
            let prev = text.chars().nth(start - 1).unwrap();
            assert!(prev.is_whitespace());
        }
    }

    #[test]
    fn test_multibyte_text() {
        let text = "Überprüfung der Sicherheitsmaßnahmen – jährlich. ".repeat(10);
        let chunks = chunker(60, 15).chunk(&text);

        for chunk in &chunks {
            let (start, end) = chunk.span().unwrap();
            let expected: String = text.chars().skip(start).take(end - start).collect();
            assert_eq!(chunk.text, expected);
        }
    }

    #[test]
    fn test_chunk_document_metadata() {
        let chunks = EvidenceChunker::default().chunk_document(
            "policy-2024",
            Some(FileType::Pdf),
            "Environmental policy text.",
        );

        assert_eq!(chunks[0].document_id(), Some("policy-2024"));
        assert_eq!(chunks[0].metadata[keys::FILE_TYPE], "pdf");
    }

    #[test]
    fn test_invalid_config() {
        assert!(EvidenceChunker::new(ChunkerConfig {
            chunk_size: 0,
            chunk_overlap: 0
        })
        .is_err());
        assert!(EvidenceChunker::new(ChunkerConfig {
            chunk_size: 100,
            chunk_overlap: 100
        })
        .is_err());
    }

    proptest! {
        #[test]
        fn prop_chunks_cover_input(
            text in "[a-z .\n]{0,400}",
            size in 5usize..80,
            overlap_ratio in 0.0f64..0.9,
        ) {
            let overlap = ((size as f64) * overlap_ratio) as usize;
            let chunks = chunker(size, overlap).chunk(&text);
            let total = text.chars().count();

            if total == 0 {
                prop_assert!(chunks.is_empty());
            } else {
                let spans = spans_of(&chunks);
                prop_assert_eq!(spans[0].0, 0);
                prop_assert_eq!(spans[spans.len() - 1].1, total);
                for pair in spans.windows(2) {
                    prop_assert!(pair[1].0 > pair[0].0);
                    prop_assert!(pair[1].0 <= pair[0].1);
                }
            }
        }

        #[test]
        fn prop_chunks_are_verbatim_and_bounded(
            text in "[a-zA-Z0-9 ,.!?\n]{1,400}",
            size in 5usize..80,
        ) {
            let chunks = chunker(size, size / 4).chunk(&text);
            for chunk in &chunks {
                let (start, end) = chunk.span().unwrap();
                prop_assert!(end - start <= size);
                prop_assert!(!chunk.text.is_empty());
                let expected: String = text.chars().skip(start).take(end - start).collect();
                prop_assert_eq!(&chunk.text, &expected);
            }
        }

        #[test]
        fn prop_chunking_is_deterministic(text in "[a-z .\n]{0,300}") {
            let chunker = chunker(40, 10);
            prop_assert_eq!(chunker.chunk(&text), chunker.chunk(&text));
        }
    }
}

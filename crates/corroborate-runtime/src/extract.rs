//! Text extraction collaborator.
//!
//! PDF parsing, DOCX reading and OCR are supplied by the embedding
//! application. The runtime only decides which file types reach the
//! extractor and consumes the text it returns.

use async_trait::async_trait;
use std::path::Path;

use corroborate_core::{ExtractError, FileType};

#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Extract plain text from `path`, which holds a `file_type` document.
    async fn extract(&self, path: &Path, file_type: FileType) -> Result<String, ExtractError>;
}

/// Infer the file type from the extension, then extract.
///
/// Fails with [`ExtractError::UnsupportedFileType`] without calling the
/// extractor when the extension is not a supported type.
pub async fn extract_path(
    extractor: &dyn TextExtractor,
    path: &Path,
) -> Result<(FileType, String), ExtractError> {
    let file_type = FileType::from_path(path)?;
    let text = extractor.extract(path, file_type).await?;
    tracing::debug!(
        path = %path.display(),
        %file_type,
        chars = text.chars().count(),
        "Extracted evidence text"
    );
    Ok((file_type, text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::StaticExtractor;

    #[tokio::test]
    async fn test_extract_path_infers_type() {
        let extractor = StaticExtractor::new().with_text("policy.PDF", "Hard hats required.");

        let (file_type, text) = extract_path(&extractor, Path::new("policy.PDF"))
            .await
            .unwrap();
        assert_eq!(file_type, FileType::Pdf);
        assert_eq!(text, "Hard hats required.");
    }

    #[tokio::test]
    async fn test_unsupported_extension_never_reaches_extractor() {
        let extractor = StaticExtractor::new().with_text("notes.txt", "ignored");

        let err = extract_path(&extractor, Path::new("notes.txt"))
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedFileType(ref t) if t == "txt"));
        assert_eq!(extractor.call_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_extension() {
        let extractor = StaticExtractor::new();
        let err = extract_path(&extractor, Path::new("README")).await.unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedFileType(_)));
    }
}

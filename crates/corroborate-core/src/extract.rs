//! File types accepted at the text-extraction boundary.
//!
//! Extraction itself (PDF parsing, DOCX reading, OCR) is performed by an
//! injected extractor. The core only decides which file types are accepted.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors at the extraction boundary.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Unsupported file type: '{0}'")]
    UnsupportedFileType(String),

    #[error("Failed to read evidence file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Extraction failed: {0}")]
    Failed(String),
}

/// Evidence file formats with a known extraction path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Pdf,
    Docx,
    Png,
    Jpg,
    Jpeg,
}

impl FileType {
    pub fn as_str(self) -> &'static str {
        match self {
            FileType::Pdf => "pdf",
            FileType::Docx => "docx",
            FileType::Png => "png",
            FileType::Jpg => "jpg",
            FileType::Jpeg => "jpeg",
        }
    }

    /// Whether text for this type comes from OCR.
    pub fn is_image(self) -> bool {
        matches!(self, FileType::Png | FileType::Jpg | FileType::Jpeg)
    }

    /// Infer the type from a path's extension.
    pub fn from_path(path: &Path) -> Result<Self, ExtractError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| ExtractError::UnsupportedFileType(path.display().to_string()))?;
        ext.parse()
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileType {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "pdf" => Ok(FileType::Pdf),
            "docx" => Ok(FileType::Docx),
            "png" => Ok(FileType::Png),
            "jpg" => Ok(FileType::Jpg),
            "jpeg" => Ok(FileType::Jpeg),
            _ => Err(ExtractError::UnsupportedFileType(s.to_string())),
        }
    }
}

//! Source format detection

use crate::error::{AtsError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

pub const PDF_MIME: &str = "application/pdf";
pub const DOC_MIME: &str = "application/msword";
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Resume document formats accepted upstream of the scorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Pdf,
    Doc,
    Docx,
}

impl SourceFormat {
    pub fn from_mime(mime: &str) -> Result<Self> {
        // Ignore parameters such as "; charset=binary"
        let essence = mime.split(';').next().unwrap_or("").trim().to_lowercase();
        match essence.as_str() {
            PDF_MIME => Ok(SourceFormat::Pdf),
            DOC_MIME => Ok(SourceFormat::Doc),
            DOCX_MIME => Ok(SourceFormat::Docx),
            _ => Err(AtsError::UnsupportedFormat(format!("Unsupported MIME type: {}", mime))),
        }
    }

    pub fn from_extension(ext: &str) -> Result<Self> {
        match ext.to_lowercase().as_str() {
            "pdf" => Ok(SourceFormat::Pdf),
            "doc" => Ok(SourceFormat::Doc),
            "docx" => Ok(SourceFormat::Docx),
            other => Err(AtsError::UnsupportedFormat(format!("Unsupported file extension: .{}", other))),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .ok_or_else(|| {
                AtsError::UnsupportedFormat(format!("File has no extension: {}", path.display()))
            })?;
        Self::from_extension(extension)
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            SourceFormat::Pdf => PDF_MIME,
            SourceFormat::Doc => DOC_MIME,
            SourceFormat::Docx => DOCX_MIME,
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceFormat::Pdf => f.write_str("pdf"),
            SourceFormat::Doc => f.write_str("doc"),
            SourceFormat::Docx => f.write_str("docx"),
        }
    }
}

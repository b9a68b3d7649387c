//! Input manager: routes resume bytes to the matching extractor

use crate::error::{AtsError, Result};
use crate::input::file_detector::SourceFormat;
use crate::input::text_extractor::{DocExtractor, DocxExtractor, PdfExtractor, TextExtractor};
use log::{debug, info};
use std::path::Path;

/// Extracted text together with the format it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedDocument {
    pub text: String,
    pub source_format: SourceFormat,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct InputManager;

impl InputManager {
    pub fn new() -> Self {
        Self
    }

    /// Extract text from raw bytes tagged with a MIME type.
    pub fn extract_bytes(&self, bytes: &[u8], mime: &str) -> Result<String> {
        let format = SourceFormat::from_mime(mime)?;
        self.extract_with_format(bytes, format)
    }

    pub fn extract_with_format(&self, bytes: &[u8], format: SourceFormat) -> Result<String> {
        debug!("Extracting {} bytes as {}", bytes.len(), format);
        match format {
            SourceFormat::Pdf => PdfExtractor.extract(bytes),
            SourceFormat::Doc => DocExtractor.extract(bytes),
            SourceFormat::Docx => DocxExtractor.extract(bytes),
        }
    }

    /// Read a resume file from disk and extract its text.
    ///
    /// The format comes from the file extension. Extraction runs on the
    /// blocking pool since PDF parsing is CPU-bound.
    pub async fn extract_file(&self, path: &Path) -> Result<ExtractedDocument> {
        if !path.exists() {
            return Err(AtsError::InvalidInput(format!(
                "File does not exist: {}",
                path.display()
            )));
        }

        let source_format = SourceFormat::from_path(path)?;
        info!("Extracting text from {}: {}", source_format, path.display());

        let bytes = tokio::fs::read(path).await?;
        let manager = *self;
        let text = tokio::task::spawn_blocking(move || manager.extract_with_format(&bytes, source_format))
            .await
            .map_err(|e| AtsError::ExtractionFailure(format!("Extraction task failed: {}", e)))??;

        Ok(ExtractedDocument { text, source_format })
    }
}

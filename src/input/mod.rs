//! Input processing module
//! Handles format detection and text extraction from resume documents

pub mod file_detector;
pub mod manager;
pub mod text_extractor;

pub use file_detector::SourceFormat;
pub use manager::{ExtractedDocument, InputManager};

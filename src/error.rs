//! Error handling for the ATS scorer

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AtsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File format not supported: {0}")]
    UnsupportedFormat(String),

    #[error("Text extraction failed: {0}")]
    ExtractionFailure(String),

    #[error("Insufficient content: {length} characters after trimming, at least {minimum} required")]
    InsufficientContent { length: usize, minimum: usize },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Model response parse error: {0}")]
    Parse(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Generative model call timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("Internal scoring error: {0}")]
    ScoringInternal(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Output formatting error: {0}")]
    OutputFormatting(String),
}

pub type Result<T> = std::result::Result<T, AtsError>;

impl AtsError {
    /// Whether a caller may recover by switching to the keyword analyzer.
    ///
    /// Only failures of the generative path qualify; input errors fail the
    /// same way under every strategy.
    pub fn is_fallback_eligible(&self) -> bool {
        matches!(
            self,
            AtsError::Configuration(_)
                | AtsError::Parse(_)
                | AtsError::Transport(_)
                | AtsError::Timeout { .. }
        )
    }
}

/// Convert anyhow errors to our custom error type
impl From<anyhow::Error> for AtsError {
    fn from(err: anyhow::Error) -> Self {
        AtsError::ScoringInternal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_eligibility() {
        assert!(AtsError::Parse("bad json".into()).is_fallback_eligible());
        assert!(AtsError::Configuration("no key".into()).is_fallback_eligible());
        assert!(AtsError::Timeout { seconds: 30 }.is_fallback_eligible());
        assert!(!AtsError::InsufficientContent { length: 10, minimum: 100 }.is_fallback_eligible());
        assert!(!AtsError::UnsupportedFormat("rtf".into()).is_fallback_eligible());
    }

    #[test]
    fn test_insufficient_content_message() {
        let err = AtsError::InsufficientContent { length: 42, minimum: 100 };
        assert_eq!(
            err.to_string(),
            "Insufficient content: 42 characters after trimming, at least 100 required"
        );
    }
}

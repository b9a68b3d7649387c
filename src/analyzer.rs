//! Analyzer capability: one interface over the keyword and generative strategies

use crate::config::Config;
use crate::error::{AtsError, Result};
use crate::input::file_detector::SourceFormat;
use crate::llm::analyzer::GenerativeAnalyzer;
use crate::llm::client::GeminiClient;
use crate::output::report::{AnalysisMethod, AnalysisReport};
use crate::processing::analyzer::KeywordAnalyzer;
use crate::processing::taxonomy::KeywordTaxonomy;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use log::{info, warn};
use std::sync::Arc;

/// Minimum trimmed length, in characters, of a scorable resume.
pub const MIN_CONTENT_CHARS: usize = 100;

/// Extracted resume text plus the metadata the report carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeInput {
    pub text: String,
    pub source_format: SourceFormat,
    pub analyzed_at: DateTime<Utc>,
}

impl ResumeInput {
    pub fn new(text: impl Into<String>, source_format: SourceFormat) -> Self {
        Self {
            text: text.into(),
            source_format,
            analyzed_at: Utc::now(),
        }
    }

    /// Pin the report timestamp, e.g. to reproduce an earlier report.
    pub fn analyzed_at(mut self, analyzed_at: DateTime<Utc>) -> Self {
        self.analyzed_at = analyzed_at;
        self
    }

    pub fn check_content(&self) -> Result<()> {
        let length = self.text.trim().chars().count();
        if length < MIN_CONTENT_CHARS {
            return Err(AtsError::InsufficientContent {
                length,
                minimum: MIN_CONTENT_CHARS,
            });
        }
        Ok(())
    }
}

/// A resume scoring strategy. Every implementation returns the same report
/// shape, so callers can swap strategies freely.
#[async_trait]
pub trait ResumeAnalyzer: Send + Sync {
    async fn analyze(&self, input: &ResumeInput) -> Result<AnalysisReport>;

    fn method(&self) -> AnalysisMethod;
}

/// Runs `primary`, and on a fallback-eligible failure reruns the input
/// through `fallback`.
pub struct FallbackAnalyzer {
    primary: Arc<dyn ResumeAnalyzer>,
    fallback: Arc<dyn ResumeAnalyzer>,
}

impl FallbackAnalyzer {
    pub fn new(primary: Arc<dyn ResumeAnalyzer>, fallback: Arc<dyn ResumeAnalyzer>) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl ResumeAnalyzer for FallbackAnalyzer {
    async fn analyze(&self, input: &ResumeInput) -> Result<AnalysisReport> {
        match self.primary.analyze(input).await {
            Err(e) if e.is_fallback_eligible() => {
                warn!(
                    "{} analysis failed ({}), falling back to {} analysis",
                    self.primary.method(),
                    e,
                    self.fallback.method()
                );
                self.fallback.analyze(input).await
            }
            result => result,
        }
    }

    fn method(&self) -> AnalysisMethod {
        self.primary.method()
    }
}

/// Select the analyzer described by the configuration.
pub fn build_analyzer(config: &Config, taxonomy: Arc<KeywordTaxonomy>) -> Result<Arc<dyn ResumeAnalyzer>> {
    let keyword: Arc<dyn ResumeAnalyzer> = Arc::new(KeywordAnalyzer::new(Arc::clone(&taxonomy)));

    match config.analyzer.method {
        AnalysisMethod::Keyword => Ok(keyword),
        AnalysisMethod::Generative => {
            let client = match GeminiClient::from_config(&config.generative) {
                Ok(client) => client,
                Err(e) if config.analyzer.fallback_to_keyword && e.is_fallback_eligible() => {
                    warn!("Generative analyzer unavailable ({}), using keyword analysis", e);
                    return Ok(keyword);
                }
                Err(e) => return Err(e),
            };

            info!("Using generative analyzer with model {}", config.generative.model);
            let generative: Arc<dyn ResumeAnalyzer> = Arc::new(GenerativeAnalyzer::new(client, taxonomy));
            if config.analyzer.fallback_to_keyword {
                Ok(Arc::new(FallbackAnalyzer::new(generative, keyword)))
            } else {
                Ok(generative)
            }
        }
    }
}

/// Analyze many resumes with at most `concurrency` analyses in flight.
///
/// Each analysis runs as its own task so synchronous scoring spreads over the
/// runtime's workers. Results come back in input order; one failure does not
/// affect the others.
pub async fn analyze_batch(
    analyzer: Arc<dyn ResumeAnalyzer>,
    inputs: Vec<ResumeInput>,
    concurrency: usize,
) -> Vec<Result<AnalysisReport>> {
    stream::iter(inputs)
        .map(|input| {
            let analyzer = Arc::clone(&analyzer);
            tokio::spawn(async move { analyzer.analyze(&input).await })
        })
        .buffered(concurrency.max(1))
        .map(|joined| {
            joined.unwrap_or_else(|e| Err(AtsError::ScoringInternal(format!("Analysis task failed: {}", e))))
        })
        .collect()
        .await
}

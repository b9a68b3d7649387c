//! Deterministic keyword analyzer
//!
//! Runs the full local pipeline: match keywords, evaluate every row of the
//! weight table, aggregate, then synthesize feedback. The analyzer holds only
//! a shared read-only taxonomy, so one instance can serve any number of
//! concurrent analyses.

use crate::analyzer::{ResumeAnalyzer, ResumeInput};
use crate::error::Result;
use crate::output::report::{AnalysisMethod, AnalysisReport, KeywordFindings, ReportMetadata};
use crate::processing::aggregator::aggregate;
use crate::processing::feedback::FeedbackSynthesizer;
use crate::processing::matcher::{normalize, CategoryMatcher};
use crate::processing::scorers::{self, RawSignal, SubScore};
use crate::processing::taxonomy::KeywordTaxonomy;
use async_trait::async_trait;
use log::debug;
use std::sync::Arc;

pub struct KeywordAnalyzer {
    taxonomy: Arc<KeywordTaxonomy>,
}

impl KeywordAnalyzer {
    pub fn new(taxonomy: Arc<KeywordTaxonomy>) -> Self {
        Self { taxonomy }
    }

    pub fn taxonomy(&self) -> &KeywordTaxonomy {
        &self.taxonomy
    }

    /// Score one resume synchronously.
    pub fn analyze_input(&self, input: &ResumeInput) -> Result<AnalysisReport> {
        input.check_content()?;

        let text = input.text.as_str();
        let lowered = normalize(text);
        let matches = CategoryMatcher::match_normalized(&lowered, &self.taxonomy);

        let sub_scores: Vec<SubScore> = self
            .taxonomy
            .rules()
            .iter()
            .map(|rule| scorers::evaluate(rule, &self.taxonomy, &matches, text, &lowered))
            .collect();

        let aggregate = aggregate(&sub_scores, &self.taxonomy)?;
        let feedback = FeedbackSynthesizer::synthesize(&sub_scores, aggregate.total_score);

        let mut keywords = KeywordFindings {
            skills: matches,
            ..Default::default()
        };
        for sub in &sub_scores {
            match &sub.raw_signal {
                RawSignal::Sections(sections) => keywords.sections = Some(*sections),
                RawSignal::Achievements(signal) => keywords.achievements = Some(*signal),
                RawSignal::Formatting(signal) => keywords.formatting = Some(signal.clone()),
                RawSignal::Hits { .. } => {}
            }
        }

        let report = AnalysisReport {
            total_score: aggregate.total_score,
            breakdown: aggregate.breakdown,
            keywords,
            strengths: feedback.strengths,
            weaknesses: feedback.weaknesses,
            recommendations: feedback.recommendations,
            rating: aggregate.rating,
            summary: None,
            metadata: ReportMetadata {
                analyzed_at: input.analyzed_at,
                word_count: scorers::word_count(text),
                source_format: input.source_format,
                method: AnalysisMethod::Keyword,
                model: None,
            },
        };

        report.check_invariants(&self.taxonomy)?;
        debug!(
            "Keyword analysis scored {} ({})",
            report.total_score, report.rating
        );
        Ok(report)
    }
}

#[async_trait]
impl ResumeAnalyzer for KeywordAnalyzer {
    async fn analyze(&self, input: &ResumeInput) -> Result<AnalysisReport> {
        self.analyze_input(input)
    }

    fn method(&self) -> AnalysisMethod {
        AnalysisMethod::Keyword
    }
}

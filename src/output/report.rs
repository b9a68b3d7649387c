//! The analysis report: the single output shape of every analyzer

use crate::error::{AtsError, Result};
use crate::input::file_detector::SourceFormat;
use crate::processing::aggregator::{Rating, ScoreBreakdown};
use crate::processing::matcher::CategoryMatchResult;
use crate::processing::scorers::{AchievementSignal, FormattingSignal, StructuralSections};
use crate::processing::taxonomy::{KeywordGroup, KeywordTaxonomy};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// Which analyzer strategy produced a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisMethod {
    Keyword,
    Generative,
}

impl fmt::Display for AnalysisMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisMethod::Keyword => f.write_str("keyword"),
            AnalysisMethod::Generative => f.write_str("generative"),
        }
    }
}

/// Keyword evidence. The generative analyzer only fills `skills`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordFindings {
    pub skills: BTreeMap<KeywordGroup, CategoryMatchResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sections: Option<StructuralSections>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub achievements: Option<AchievementSignal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatting: Option<FormattingSignal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub analyzed_at: DateTime<Utc>,
    pub word_count: usize,
    pub source_format: SourceFormat,
    pub method: AnalysisMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Composite score, `0..=100`, equal to the breakdown sum
    pub total_score: u32,
    pub breakdown: ScoreBreakdown,
    pub keywords: KeywordFindings,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    /// Unique entries, category feedback first
    pub recommendations: Vec<String>,
    pub rating: Rating,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub metadata: ReportMetadata,
}

impl AnalysisReport {
    /// Verify the report contract; analyzers call this before returning.
    pub fn check_invariants(&self, taxonomy: &KeywordTaxonomy) -> Result<()> {
        if self.total_score > 100 {
            return Err(AtsError::ScoringInternal(format!(
                "total score {} outside 0..=100",
                self.total_score
            )));
        }

        let sum: u32 = self.breakdown.values().sum();
        if sum != self.total_score {
            return Err(AtsError::ScoringInternal(format!(
                "breakdown sums to {} but total score is {}",
                sum, self.total_score
            )));
        }

        for rule in taxonomy.rules() {
            match self.breakdown.get(&rule.category) {
                Some(points) if *points <= rule.max_weight => {}
                Some(points) => {
                    return Err(AtsError::ScoringInternal(format!(
                        "{} scored {} above its weight {}",
                        rule.category, points, rule.max_weight
                    )))
                }
                None => {
                    return Err(AtsError::ScoringInternal(format!(
                        "breakdown is missing {}",
                        rule.category
                    )))
                }
            }
        }

        if self.rating != Rating::from_score(self.total_score) {
            return Err(AtsError::ScoringInternal(format!(
                "rating {} does not match total score {}",
                self.rating, self.total_score
            )));
        }

        let mut seen = HashSet::new();
        if !self.recommendations.iter().all(|r| seen.insert(r)) {
            return Err(AtsError::ScoringInternal(
                "recommendations contain duplicates".to_string(),
            ));
        }

        Ok(())
    }

    /// Detected skills as `(group, term)` pairs, for skill ingestion.
    pub fn detected_skills(&self) -> Vec<(KeywordGroup, String)> {
        self.keywords
            .skills
            .iter()
            .filter(|(group, _)| group.is_skill())
            .flat_map(|(group, result)| {
                result.matched_terms.iter().map(move |term| (*group, term.clone()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::taxonomy::ScoreCategory;
    use std::collections::BTreeSet;

    fn report(breakdown: [u32; 5]) -> AnalysisReport {
        let breakdown: ScoreBreakdown = ScoreCategory::ALL.iter().copied().zip(breakdown).collect();
        let total_score = breakdown.values().sum();
        AnalysisReport {
            total_score,
            breakdown,
            keywords: KeywordFindings::default(),
            strengths: vec![],
            weaknesses: vec![],
            recommendations: vec![],
            rating: Rating::from_score(total_score),
            summary: None,
            metadata: ReportMetadata {
                analyzed_at: DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap(),
                word_count: 500,
                source_format: SourceFormat::Pdf,
                method: AnalysisMethod::Keyword,
                model: None,
            },
        }
    }

    #[test]
    fn test_valid_report_passes() {
        let taxonomy = KeywordTaxonomy::standard().unwrap();
        assert!(report([20, 16, 9, 10, 15]).check_invariants(&taxonomy).is_ok());
    }

    #[test]
    fn test_breakdown_mismatch_fails() {
        let taxonomy = KeywordTaxonomy::standard().unwrap();
        let mut bad = report([20, 16, 9, 10, 15]);
        bad.total_score += 1;
        bad.rating = Rating::from_score(bad.total_score);
        assert!(bad.check_invariants(&taxonomy).is_err());
    }

    #[test]
    fn test_entry_above_weight_fails() {
        let taxonomy = KeywordTaxonomy::standard().unwrap();
        assert!(report([31, 0, 0, 0, 0]).check_invariants(&taxonomy).is_err());
    }

    #[test]
    fn test_duplicate_recommendations_fail() {
        let taxonomy = KeywordTaxonomy::standard().unwrap();
        let mut bad = report([10, 10, 10, 10, 10]);
        bad.recommendations = vec!["x".to_string(), "x".to_string()];
        assert!(bad.check_invariants(&taxonomy).is_err());
    }

    #[test]
    fn test_detected_skills_skip_non_skill_groups() {
        let mut r = report([10, 10, 10, 10, 10]);
        r.keywords.skills.insert(
            KeywordGroup::Languages,
            CategoryMatchResult {
                category: KeywordGroup::Languages,
                hit_count: 2,
                matched_terms: BTreeSet::from(["rust".to_string()]),
            },
        );
        r.keywords.skills.insert(
            KeywordGroup::ActionVerbs,
            CategoryMatchResult {
                category: KeywordGroup::ActionVerbs,
                hit_count: 1,
                matched_terms: BTreeSet::from(["led".to_string()]),
            },
        );
        assert_eq!(r.detected_skills(), vec![(KeywordGroup::Languages, "rust".to_string())]);
    }

    #[test]
    fn test_report_json_shape() {
        let json = serde_json::to_value(report([20, 16, 9, 10, 15])).unwrap();
        assert_eq!(json["total_score"], 70);
        assert_eq!(json["breakdown"]["technical"], 20);
        assert_eq!(json["breakdown"]["action_verbs"], 9);
        assert_eq!(json["rating"], "Good");
        assert_eq!(json["metadata"]["method"], "keyword");
        assert_eq!(json["metadata"]["source_format"], "pdf");
        assert!(json.get("summary").is_none());
    }
}

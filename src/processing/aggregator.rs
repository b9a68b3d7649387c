//! Composite score and rating tiers

use crate::error::{AtsError, Result};
use crate::processing::scorers::SubScore;
use crate::processing::taxonomy::{KeywordTaxonomy, ScoreCategory};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub const EXCELLENT_THRESHOLD: u32 = 85;
pub const GOOD_THRESHOLD: u32 = 70;
pub const AVERAGE_THRESHOLD: u32 = 50;

/// Per-category points, ordered by category.
pub type ScoreBreakdown = BTreeMap<ScoreCategory, u32>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rating {
    Excellent,
    Good,
    Average,
    #[serde(rename = "Needs Improvement")]
    NeedsImprovement,
}

impl Rating {
    /// Inclusive lower bounds: 85, 70, 50.
    pub fn from_score(total: u32) -> Self {
        if total >= EXCELLENT_THRESHOLD {
            Rating::Excellent
        } else if total >= GOOD_THRESHOLD {
            Rating::Good
        } else if total >= AVERAGE_THRESHOLD {
            Rating::Average
        } else {
            Rating::NeedsImprovement
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Rating::Excellent => "Excellent",
            Rating::Good => "Good",
            Rating::Average => "Average",
            Rating::NeedsImprovement => "Needs Improvement",
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregate {
    pub total_score: u32,
    pub breakdown: ScoreBreakdown,
    pub rating: Rating,
}

/// Sum sub-scores into the composite score.
///
/// Fails if a sub-score exceeds its category weight or the total leaves
/// `[0, 100]`; neither can happen with a validated taxonomy.
pub fn aggregate(sub_scores: &[SubScore], taxonomy: &KeywordTaxonomy) -> Result<Aggregate> {
    let mut breakdown = ScoreBreakdown::new();

    for sub in sub_scores {
        let max_weight = taxonomy.max_weight(sub.category);
        if sub.score > max_weight {
            return Err(AtsError::ScoringInternal(format!(
                "{} scored {} above its weight {}",
                sub.category, sub.score, max_weight
            )));
        }
        if breakdown.insert(sub.category, sub.score).is_some() {
            return Err(AtsError::ScoringInternal(format!(
                "Duplicate sub-score for {}",
                sub.category
            )));
        }
    }

    let total_score: u32 = breakdown.values().sum();
    if total_score > 100 {
        return Err(AtsError::ScoringInternal(format!(
            "Composite score {} exceeds 100",
            total_score
        )));
    }

    Ok(Aggregate {
        total_score,
        breakdown,
        rating: Rating::from_score(total_score),
    })
}

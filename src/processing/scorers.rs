//! The five sub-scorers
//!
//! Every scorer is a pure function of matcher output or raw text. Scores are
//! integers clamped to `[0, cap]` and never decrease as their driving count
//! grows.

use crate::processing::matcher::{CategoryMatcher, CategoryMatches};
use crate::processing::taxonomy::{Formula, KeywordTaxonomy, LengthBands, ScoreCategory, ScoringRule, Section};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Which sections were detected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuralSections {
    pub has_contact: bool,
    pub has_education: bool,
    pub has_experience: bool,
    pub has_skills: bool,
    pub has_summary: bool,
}

impl StructuralSections {
    pub fn has(&self, section: Section) -> bool {
        match section {
            Section::Contact => self.has_contact,
            Section::Education => self.has_education,
            Section::Experience => self.has_experience,
            Section::Skills => self.has_skills,
            Section::Summary => self.has_summary,
        }
    }

    fn set(&mut self, section: Section) {
        match section {
            Section::Contact => self.has_contact = true,
            Section::Education => self.has_education = true,
            Section::Experience => self.has_experience = true,
            Section::Skills => self.has_skills = true,
            Section::Summary => self.has_summary = true,
        }
    }

    pub fn present_count(&self) -> u32 {
        Section::ALL.iter().filter(|s| self.has(**s)).count() as u32
    }

    pub fn missing(&self) -> Vec<Section> {
        Section::ALL.iter().copied().filter(|s| !self.has(*s)).collect()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementSignal {
    pub has_metrics: bool,
    pub percentage_count: u32,
    pub number_count: u32,
    pub score: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormattingSignal {
    pub word_count: usize,
    pub line_count: usize,
    pub score: u32,
    pub issues: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Evidence behind a sub-score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RawSignal {
    Hits { count: u32 },
    Sections(StructuralSections),
    Achievements(AchievementSignal),
    Formatting(FormattingSignal),
}

/// One category's score. Invariant: `score <= cap`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubScore {
    pub category: ScoreCategory,
    pub raw_signal: RawSignal,
    pub score: u32,
    pub cap: u32,
}

impl SubScore {
    pub fn new(category: ScoreCategory, raw_signal: RawSignal, score: u32, cap: u32) -> Self {
        Self {
            category,
            raw_signal,
            score: score.min(cap),
            cap,
        }
    }
}

pub const TOO_SHORT_ISSUE: &str = "Resume is too short";
pub const TOO_SHORT_RECOMMENDATION: &str =
    "Expand your resume with more detail about your experience, projects and accomplishments";
pub const TOO_LONG_ISSUE: &str = "Resume is too long";
pub const TOO_LONG_RECOMMENDATION: &str =
    "Condense your resume to the most relevant one or two pages";

/// `round(hits / divisor * cap)` clamped to `cap`, in integer arithmetic.
pub fn hit_ratio_score(hits: u32, divisor: u32, cap: u32) -> u32 {
    if divisor == 0 {
        return 0;
    }
    let numerator = 2 * u64::from(hits) * u64::from(cap) + u64::from(divisor);
    let rounded = numerator / (2 * u64::from(divisor));
    rounded.min(u64::from(cap)) as u32
}

/// Detect sections by topic cues anywhere in the lower-cased text.
pub fn detect_sections(lowered: &str, taxonomy: &KeywordTaxonomy) -> StructuralSections {
    let mut sections = StructuralSections::default();
    for cue in taxonomy.section_cues() {
        if cue.cues.occurs_in(lowered) {
            sections.set(cue.section);
        }
    }
    sections
}

pub fn structure_score(sections: &StructuralSections, points_per_section: u32, cap: u32) -> u32 {
    (sections.present_count() * points_per_section).min(cap)
}

fn percentage_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+%").expect("percentage pattern is valid"))
}

/// Count `\d+%` occurrences and standalone integer tokens.
pub fn count_quantities(text: &str) -> (u32, u32) {
    let percentages = percentage_regex().find_iter(text).count() as u32;

    let numbers = text
        .split_whitespace()
        .map(|token| {
            token.trim_matches(|c: char| {
                matches!(c, ',' | '.' | ';' | ':' | '(' | ')' | '[' | ']' | '"' | '\'' | '!' | '?')
            })
        })
        .filter(|token| !token.is_empty() && token.chars().all(|c| c.is_ascii_digit()))
        .count() as u32;

    (percentages, numbers)
}

pub fn achievement_signal(
    text: &str,
    per_percentage: u32,
    per_number: u32,
    number_limit: u32,
    cap: u32,
) -> AchievementSignal {
    let (percentage_count, number_count) = count_quantities(text);
    let raw = percentage_count.saturating_mul(per_percentage)
        + number_count.min(number_limit) * per_number;

    AchievementSignal {
        has_metrics: percentage_count > 0 || number_count > 0,
        percentage_count,
        number_count,
        score: raw.min(cap),
    }
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

pub fn line_count(text: &str) -> usize {
    text.lines().filter(|line| !line.trim().is_empty()).count()
}

pub fn formatting_signal(text: &str, bands: &LengthBands, cap: u32) -> FormattingSignal {
    let words = word_count(text);
    let lines = line_count(text);
    let mut issues = Vec::new();
    let mut recommendations = Vec::new();

    let band_points = if words >= bands.optimal_min_words && words <= bands.optimal_max_words {
        bands.optimal_points
    } else if words < bands.optimal_min_words {
        issues.push(TOO_SHORT_ISSUE.to_string());
        recommendations.push(TOO_SHORT_RECOMMENDATION.to_string());
        bands.off_band_points
    } else if words > bands.long_above_words {
        issues.push(TOO_LONG_ISSUE.to_string());
        recommendations.push(TOO_LONG_RECOMMENDATION.to_string());
        bands.off_band_points
    } else {
        bands.acceptable_points
    };

    let line_points = if lines > bands.line_threshold { bands.line_bonus } else { 0 };

    FormattingSignal {
        word_count: words,
        line_count: lines,
        score: (band_points + line_points).min(cap),
        issues,
        recommendations,
    }
}

/// Evaluate one weight-table row.
///
/// `text` is the original text; `lowered` its lower-cased form.
pub fn evaluate(
    rule: &ScoringRule,
    taxonomy: &KeywordTaxonomy,
    matches: &CategoryMatches,
    text: &str,
    lowered: &str,
) -> SubScore {
    let cap = rule.max_weight;
    match &rule.formula {
        Formula::HitRatio { groups, divisor } => {
            let hits = CategoryMatcher::total_hits(matches, groups);
            SubScore::new(
                rule.category,
                RawSignal::Hits { count: hits },
                hit_ratio_score(hits, *divisor, cap),
                cap,
            )
        }
        Formula::SectionPresence { points_per_section } => {
            let sections = detect_sections(lowered, taxonomy);
            let score = structure_score(&sections, *points_per_section, cap);
            SubScore::new(rule.category, RawSignal::Sections(sections), score, cap)
        }
        Formula::Quantified {
            per_percentage,
            per_number,
            number_limit,
        } => {
            let signal = achievement_signal(text, *per_percentage, *per_number, *number_limit, cap);
            let score = signal.score;
            SubScore::new(rule.category, RawSignal::Achievements(signal), score, cap)
        }
        Formula::Length(bands) => {
            let signal = formatting_signal(text, bands, cap);
            let score = signal.score;
            SubScore::new(rule.category, RawSignal::Formatting(signal), score, cap)
        }
    }
}

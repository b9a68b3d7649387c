//! Rule-based feedback: strengths, weaknesses and recommendations

use crate::processing::scorers::{RawSignal, StructuralSections, SubScore};
use crate::processing::taxonomy::{ScoreCategory, Section};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const TECHNICAL_STRENGTH_MIN: u32 = 25;
pub const TECHNICAL_WEAKNESS_BELOW: u32 = 15;
/// Structure is a strength at or above this percentage of its weight.
pub const STRUCTURE_STRENGTH_PERCENT: u32 = 40;
pub const ACTION_VERB_STRENGTH_MIN: u32 = 12;
pub const ACHIEVEMENT_STRENGTH_MIN: u32 = 15;
pub const LOW_SCORE_BELOW: u32 = 50;
pub const MEDIUM_SCORE_BELOW: u32 = 70;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Drop repeated entries, keeping the first occurrence.
pub fn dedupe(items: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items.into_iter().filter(|item| seen.insert(item.clone())).collect()
}

pub struct FeedbackSynthesizer;

impl FeedbackSynthesizer {
    /// Category feedback in weight-table order, then score-driven escalation.
    pub fn synthesize(sub_scores: &[SubScore], total_score: u32) -> Feedback {
        let mut feedback = Feedback::default();

        for sub in sub_scores {
            match sub.category {
                ScoreCategory::Technical => Self::technical(sub, &mut feedback),
                ScoreCategory::Structure => Self::structure(sub, &mut feedback),
                ScoreCategory::ActionVerbs => Self::action_verbs(sub, &mut feedback),
                ScoreCategory::Achievements => Self::achievements(sub, &mut feedback),
                ScoreCategory::Formatting => Self::formatting(sub, &mut feedback),
            }
        }

        if total_score < LOW_SCORE_BELOW {
            feedback.recommendations.push(
                "Consider adding relevant certifications and in-demand technical skills".to_string(),
            );
            feedback.recommendations.push(
                "Tailor your resume with keywords taken from the job descriptions you target"
                    .to_string(),
            );
        }

        if total_score < MEDIUM_SCORE_BELOW {
            feedback.recommendations.push(
                "Make sure all core sections are present: contact, summary, experience, education and skills"
                    .to_string(),
            );
            feedback.recommendations.push(
                "Add more detail about your projects and internships, including technologies used"
                    .to_string(),
            );
        }

        feedback.recommendations = dedupe(feedback.recommendations);
        feedback
    }

    fn technical(sub: &SubScore, feedback: &mut Feedback) {
        if sub.score >= TECHNICAL_STRENGTH_MIN {
            feedback.strengths.push("Strong technical skills showcase".to_string());
        } else if sub.score < TECHNICAL_WEAKNESS_BELOW {
            feedback.weaknesses.push("Limited technical skills mentioned".to_string());
            feedback.recommendations.push(
                "Add specific technologies, programming languages, frameworks and tools you have used"
                    .to_string(),
            );
        }
    }

    fn structure(sub: &SubScore, feedback: &mut Feedback) {
        if sub.score * 100 >= sub.cap * STRUCTURE_STRENGTH_PERCENT {
            feedback.strengths.push("Well-structured resume with clear sections".to_string());
            return;
        }

        feedback.weaknesses.push("Missing important resume sections".to_string());
        let sections = match &sub.raw_signal {
            RawSignal::Sections(sections) => *sections,
            _ => StructuralSections::default(),
        };
        for section in sections.missing() {
            let recommendation = match section {
                Section::Contact => "Add clear contact information (email, phone, LinkedIn)",
                Section::Skills => "Add a dedicated skills section listing your technical skills",
                Section::Summary => "Add a short professional summary at the top of your resume",
                Section::Education | Section::Experience => continue,
            };
            feedback.recommendations.push(recommendation.to_string());
        }
    }

    fn action_verbs(sub: &SubScore, feedback: &mut Feedback) {
        if sub.score >= ACTION_VERB_STRENGTH_MIN {
            feedback.strengths.push("Effective use of strong action verbs".to_string());
        } else {
            feedback.weaknesses.push("Limited use of strong action verbs".to_string());
            feedback.recommendations.push(
                "Start bullet points with action verbs such as 'developed', 'led' or 'implemented'"
                    .to_string(),
            );
        }
    }

    fn achievements(sub: &SubScore, feedback: &mut Feedback) {
        if sub.score >= ACHIEVEMENT_STRENGTH_MIN {
            feedback.strengths.push("Quantifiable achievements demonstrate impact".to_string());
        } else {
            feedback.weaknesses.push("Few quantifiable achievements".to_string());
            feedback.recommendations.push(
                "Add measurable results with numbers and percentages (e.g. 'reduced load time by 30%')"
                    .to_string(),
            );
        }
    }

    fn formatting(sub: &SubScore, feedback: &mut Feedback) {
        if let RawSignal::Formatting(signal) = &sub.raw_signal {
            feedback.weaknesses.extend(signal.issues.iter().cloned());
            feedback.recommendations.extend(signal.recommendations.iter().cloned());
        }
    }
}

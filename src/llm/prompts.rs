//! Prompt template for generative resume scoring

use crate::processing::aggregator::Rating;
use crate::processing::taxonomy::{KeywordGroup, KeywordTaxonomy};

/// Instruction that keeps the model to a bare JSON object.
pub const JSON_ONLY_INSTRUCTION: &str = "Respond with a single valid JSON object only. \
    Do not wrap it in markdown code fences and do not add any text before or after it.";

#[derive(Debug, Clone)]
pub struct PromptTemplates {
    pub resume_analysis: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            resume_analysis: RESUME_ANALYSIS_TEMPLATE.to_string(),
        }
    }
}

impl PromptTemplates {
    /// Fill the template with the resume and the taxonomy-driven schema.
    pub fn render_resume_analysis(&self, resume_text: &str, taxonomy: &KeywordTaxonomy) -> String {
        self.resume_analysis
            .replace("{breakdown_fields}", &breakdown_fields(taxonomy))
            .replace("{skill_fields}", &skill_fields())
            .replace("{ratings}", &rating_choices())
            .replace("{json_only}", JSON_ONLY_INSTRUCTION)
            .replace("{resume}", resume_text.trim())
    }
}

fn breakdown_fields(taxonomy: &KeywordTaxonomy) -> String {
    taxonomy
        .rules()
        .iter()
        .map(|rule| {
            format!(
                "    \"{}\": <integer 0-{}, {}>",
                rule.category.key(),
                rule.max_weight,
                rule.category.label()
            )
        })
        .collect::<Vec<_>>()
        .join(",\n")
}

fn skill_fields() -> String {
    KeywordGroup::ALL
        .iter()
        .filter(|g| g.is_skill())
        .map(|g| format!("    \"{}\": [<string>]", g.as_str()))
        .collect::<Vec<_>>()
        .join(",\n")
}

fn rating_choices() -> String {
    [Rating::Excellent, Rating::Good, Rating::Average, Rating::NeedsImprovement]
        .iter()
        .map(|r| format!("\"{}\"", r.label()))
        .collect::<Vec<_>>()
        .join(" | ")
}

const RESUME_ANALYSIS_TEMPLATE: &str = r#"You are an applicant tracking system (ATS) reviewer. Score the resume below for ATS compatibility and overall quality.

<RESUME>
{resume}
</RESUME>

Return JSON with exactly this shape:
{
  "atsScore": <integer 0-100>,
  "breakdown": {
{breakdown_fields}
  },
  "strengths": [<string>],
  "weaknesses": [<string>],
  "recommendations": [<string>],
  "extractedSkills": {
{skill_fields}
  },
  "rating": {ratings},
  "summary": "<at most two sentences>"
}

Rules:
- The breakdown values must add up exactly to atsScore.
- Rating bands: 85 and above Excellent, 70-84 Good, 50-69 Average, below 50 Needs Improvement.
- Only list skills that actually appear in the resume, in lowercase.
- Recommendations must be specific to this resume and must not repeat each other.

{json_only}"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_includes_resume_and_schema() {
        let taxonomy = KeywordTaxonomy::standard().unwrap();
        let prompt = PromptTemplates::default()
            .render_resume_analysis("  Backend engineer at Acme  ", &taxonomy);

        assert!(prompt.contains("<RESUME>\nBackend engineer at Acme\n</RESUME>"));
        assert!(prompt.contains("\"technical\": <integer 0-30"));
        assert!(prompt.contains("\"action_verbs\": <integer 0-15"));
        assert!(prompt.contains("\"soft_skills\": [<string>]"));
        assert!(!prompt.contains("\"education\": [<string>]"));
        assert!(prompt.contains("\"Needs Improvement\""));
        assert!(prompt.ends_with(JSON_ONLY_INSTRUCTION));
    }

    #[test]
    fn test_all_placeholders_are_filled() {
        let taxonomy = KeywordTaxonomy::standard().unwrap();
        let prompt = PromptTemplates::default().render_resume_analysis("resume", &taxonomy);
        for placeholder in ["{resume}", "{breakdown_fields}", "{skill_fields}", "{ratings}", "{json_only}"] {
            assert!(!prompt.contains(placeholder), "unfilled {}", placeholder);
        }
    }
}

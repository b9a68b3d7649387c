//! Generative analyzer: delegates scoring to a text model and normalizes the
//! reply into the shared report shape

use crate::analyzer::{ResumeAnalyzer, ResumeInput};
use crate::error::{AtsError, Result};
use crate::llm::client::GenerativeClient;
use crate::llm::prompts::PromptTemplates;
use crate::output::report::{AnalysisMethod, AnalysisReport, KeywordFindings, ReportMetadata};
use crate::processing::aggregator::{Rating, ScoreBreakdown};
use crate::processing::feedback::dedupe;
use crate::processing::matcher::CategoryMatchResult;
use crate::processing::scorers::word_count;
use crate::processing::taxonomy::{KeywordGroup, KeywordTaxonomy, ScoreCategory};
use async_trait::async_trait;
use log::{debug, warn};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Raw model reply. Only `atsScore` is mandatory; the other fields are kept
/// as raw values so a null or mistyped field degrades to empty.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelReply {
    ats_score: Option<Value>,
    #[serde(default)]
    breakdown: Value,
    #[serde(default)]
    strengths: Value,
    #[serde(default)]
    weaknesses: Value,
    #[serde(default)]
    recommendations: Value,
    #[serde(default)]
    extracted_skills: Value,
    #[serde(default)]
    rating: Value,
    #[serde(default)]
    summary: Value,
}

pub struct GenerativeAnalyzer<C: GenerativeClient> {
    client: C,
    taxonomy: Arc<KeywordTaxonomy>,
    prompts: PromptTemplates,
}

impl<C: GenerativeClient> GenerativeAnalyzer<C> {
    pub fn new(client: C, taxonomy: Arc<KeywordTaxonomy>) -> Self {
        Self {
            client,
            taxonomy,
            prompts: PromptTemplates::default(),
        }
    }

    pub fn with_prompts(mut self, prompts: PromptTemplates) -> Self {
        self.prompts = prompts;
        self
    }

    /// Validate and normalize a raw model reply into a report.
    pub fn parse_response(&self, raw: &str, input: &ResumeInput) -> Result<AnalysisReport> {
        let json = strip_code_fences(raw);
        let reply: ModelReply = serde_json::from_str(json)
            .map_err(|e| AtsError::Parse(format!("Model reply is not valid JSON: {}", e)))?;

        let total_score = normalize_total(reply.ats_score.as_ref())?;
        let no_fields = Map::new();
        let breakdown = self.reconcile_breakdown(reply.breakdown.as_object().unwrap_or(&no_fields), total_score);
        let rating = Rating::from_score(total_score);
        if let Some(claimed) = reply.rating.as_str() {
            if claimed != rating.label() {
                debug!("Model rated '{}', recomputed as '{}'", claimed, rating);
            }
        }

        let summary = reply
            .summary
            .as_str()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let report = AnalysisReport {
            total_score,
            breakdown,
            keywords: KeywordFindings {
                skills: self.map_skills(reply.extracted_skills.as_object().unwrap_or(&no_fields)),
                ..Default::default()
            },
            strengths: clean_list(string_items(&reply.strengths)),
            weaknesses: clean_list(string_items(&reply.weaknesses)),
            recommendations: clean_list(string_items(&reply.recommendations)),
            rating,
            summary,
            metadata: ReportMetadata {
                analyzed_at: input.analyzed_at,
                word_count: word_count(&input.text),
                source_format: input.source_format,
                method: AnalysisMethod::Generative,
                model: Some(self.client.model().to_string()),
            },
        };

        report.check_invariants(&self.taxonomy)?;
        Ok(report)
    }

    /// Clamp each entry to its weight, then make the entries sum to the
    /// total: missing points go to categories in weight-table order, surplus
    /// points come off in reverse order.
    fn reconcile_breakdown(&self, raw: &Map<String, Value>, total_score: u32) -> ScoreBreakdown {
        let mut breakdown: ScoreBreakdown = self
            .taxonomy
            .rules()
            .iter()
            .map(|rule| (rule.category, 0))
            .collect();

        for (key, value) in raw {
            let Some(category) = ScoreCategory::from_label(key) else {
                debug!("Ignoring unknown breakdown field '{}'", key);
                continue;
            };
            let Some(points) = value.as_f64() else {
                warn!("Breakdown field '{}' is not numeric, counting it as 0", key);
                continue;
            };
            let cap = self.taxonomy.max_weight(category);
            breakdown.insert(category, points.round().clamp(0.0, f64::from(cap)) as u32);
        }

        let sum: u32 = breakdown.values().sum();
        if sum < total_score {
            let mut missing = total_score - sum;
            for rule in self.taxonomy.rules() {
                let entry = breakdown.entry(rule.category).or_insert(0);
                let added = missing.min(rule.max_weight - *entry);
                *entry += added;
                missing -= added;
            }
        } else if sum > total_score {
            let mut surplus = sum - total_score;
            for rule in self.taxonomy.rules().iter().rev() {
                let entry = breakdown.entry(rule.category).or_insert(0);
                let removed = surplus.min(*entry);
                *entry -= removed;
                surplus -= removed;
            }
        }

        if sum != total_score {
            debug!("Reconciled model breakdown from {} to {}", sum, total_score);
        }
        breakdown
    }

    /// Map model skill labels onto the internal skill groups.
    ///
    /// Unknown labels are resolved per term through the taxonomy; terms the
    /// taxonomy does not know land in `tools`.
    fn map_skills(&self, extracted: &Map<String, Value>) -> BTreeMap<KeywordGroup, CategoryMatchResult> {
        let mut skills: BTreeMap<KeywordGroup, CategoryMatchResult> = KeywordGroup::ALL
            .iter()
            .filter(|g| g.is_skill())
            .map(|g| (*g, CategoryMatchResult::empty(*g)))
            .collect();

        for (label, terms) in extracted {
            let label_group = KeywordGroup::from_label(label);
            if matches!(label_group, Some(group) if !group.is_skill()) {
                debug!("Skipping non-skill group '{}' in model reply", label);
                continue;
            }

            for term in string_items(terms) {
                let term = term.trim().to_lowercase();
                if term.is_empty() {
                    continue;
                }
                let group = label_group
                    .or_else(|| self.taxonomy.classify(&term))
                    .unwrap_or(KeywordGroup::Tools);
                let entry = skills
                    .entry(group)
                    .or_insert_with(|| CategoryMatchResult::empty(group));
                if entry.matched_terms.insert(term) {
                    entry.hit_count += 1;
                }
            }
        }

        skills
    }
}

#[async_trait]
impl<C: GenerativeClient> ResumeAnalyzer for GenerativeAnalyzer<C> {
    async fn analyze(&self, input: &ResumeInput) -> Result<AnalysisReport> {
        input.check_content()?;

        let prompt = self.prompts.render_resume_analysis(&input.text, &self.taxonomy);
        let raw = self.client.generate(&prompt).await?;
        self.parse_response(&raw, input)
    }

    fn method(&self) -> AnalysisMethod {
        AnalysisMethod::Generative
    }
}

/// Strip a markdown code fence and any prose around the JSON object.
fn strip_code_fences(text: &str) -> &str {
    let mut text = text.trim();
    if let Some(rest) = text.strip_prefix("```") {
        // drop the info string, e.g. "json"
        text = rest.split_once('\n').map(|(_, body)| body).unwrap_or(rest);
        text = text.trim_end().strip_suffix("```").unwrap_or(text).trim();
    }

    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => text,
    }
}

fn normalize_total(score: Option<&Value>) -> Result<u32> {
    let score = score.ok_or_else(|| AtsError::Parse("Model reply has no atsScore".to_string()))?;
    let value = score
        .as_f64()
        .ok_or_else(|| AtsError::Parse(format!("atsScore is not numeric: {}", score)))?;
    Ok(value.round().clamp(0.0, 100.0) as u32)
}

/// String entries of a list field; a lone string counts as one entry and
/// anything else as none.
fn string_items(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
        Value::String(text) => vec![text.clone()],
        _ => Vec::new(),
    }
}

fn clean_list(items: Vec<String>) -> Vec<String> {
    dedupe(
        items
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::file_detector::SourceFormat;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const RESUME: &str = "Backend engineer with 6 years of experience in Rust and Python. \
        Led a team of 5 and reduced latency by 40%. Email: dev@example.com";

    struct FakeClient {
        reply: std::result::Result<String, fn() -> AtsError>,
        calls: AtomicUsize,
    }

    impl FakeClient {
        fn replying(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing(error: fn() -> AtsError) -> Self {
            Self {
                reply: Err(error),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl GenerativeClient for FakeClient {
        async fn generate(&self, prompt: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert!(prompt.contains("atsScore"));
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(error) => Err(error()),
            }
        }

        fn model(&self) -> &str {
            "fake-model"
        }
    }

    fn analyzer(client: FakeClient) -> GenerativeAnalyzer<FakeClient> {
        GenerativeAnalyzer::new(client, Arc::new(KeywordTaxonomy::standard().unwrap()))
    }

    fn input() -> ResumeInput {
        ResumeInput::new(RESUME, SourceFormat::Docx)
    }

    fn points(report: &AnalysisReport) -> Vec<u32> {
        ScoreCategory::ALL.iter().map(|c| report.breakdown[c]).collect()
    }

    #[tokio::test]
    async fn test_fenced_reply_is_normalized() {
        let reply = r#"```json
{
  "atsScore": 78.6,
  "breakdown": {"technicalSkills": 25, "structure": 16, "actionVerbs": 12, "achievements": 14, "formatting": 12},
  "strengths": ["Clear impact", "Clear impact", "  "],
  "weaknesses": ["No summary"],
  "recommendations": ["Add a summary", "Add a summary", "Quantify more results"],
  "extractedSkills": {
    "languages": ["Rust", "Python"],
    "softSkills": ["Leadership"],
    "other": ["Docker", "kubectl"]
  },
  "rating": "Good",
  "summary": "  Solid backend profile.  "
}
```"#;
        let analyzer = analyzer(FakeClient::replying(reply));
        let report = analyzer.analyze(&input()).await.unwrap();

        assert_eq!(report.total_score, 79);
        assert_eq!(points(&report), vec![25, 16, 12, 14, 12]);
        assert_eq!(report.rating, Rating::Good);
        assert_eq!(report.strengths, vec!["Clear impact".to_string()]);
        assert_eq!(report.recommendations.len(), 2);
        assert_eq!(report.summary.as_deref(), Some("Solid backend profile."));
        assert_eq!(report.metadata.method, AnalysisMethod::Generative);
        assert_eq!(report.metadata.model.as_deref(), Some("fake-model"));

        let skills = report.detected_skills();
        assert!(skills.contains(&(KeywordGroup::Languages, "rust".to_string())));
        assert!(skills.contains(&(KeywordGroup::SoftSkills, "leadership".to_string())));
        assert!(skills.contains(&(KeywordGroup::Cloud, "docker".to_string())));
        assert!(skills.contains(&(KeywordGroup::Tools, "kubectl".to_string())));
    }

    #[test]
    fn test_score_above_range_is_clamped() {
        let reply = r#"{"atsScore": 140, "breakdown": {"technical": 50, "structure": 25,
            "action_verbs": 20, "achievements": 30, "formatting": 40}}"#;
        let report = analyzer(FakeClient::replying(reply)).parse_response(reply, &input()).unwrap();
        assert_eq!(report.total_score, 100);
        assert_eq!(points(&report), vec![30, 20, 15, 20, 15]);
        assert_eq!(report.rating, Rating::Excellent);
    }

    #[test]
    fn test_negative_score_is_clamped_to_zero() {
        let reply = r#"{"atsScore": -5}"#;
        let report = analyzer(FakeClient::replying(reply)).parse_response(reply, &input()).unwrap();
        assert_eq!(report.total_score, 0);
        assert_eq!(points(&report), vec![0, 0, 0, 0, 0]);
        assert_eq!(report.rating, Rating::NeedsImprovement);
    }

    #[test]
    fn test_surplus_breakdown_is_removed_from_the_end() {
        let reply = r#"{"atsScore": 40, "breakdown": {"technical": 30, "structure": 20,
            "action_verbs": 15, "achievements": 20, "formatting": 15}}"#;
        let report = analyzer(FakeClient::replying(reply)).parse_response(reply, &input()).unwrap();
        assert_eq!(points(&report), vec![30, 10, 0, 0, 0]);
    }

    #[test]
    fn test_missing_breakdown_is_filled_in_weight_order() {
        let reply = r#"{"atsScore": 50, "breakdown": {"bonus": 10, "formatting": "n/a"}}"#;
        let report = analyzer(FakeClient::replying(reply)).parse_response(reply, &input()).unwrap();
        assert_eq!(points(&report), vec![30, 20, 0, 0, 0]);
        assert_eq!(report.total_score, 50);
    }

    #[test]
    fn test_claimed_rating_is_recomputed() {
        let reply = r#"{"atsScore": 60, "rating": "Excellent"}"#;
        let report = analyzer(FakeClient::replying(reply)).parse_response(reply, &input()).unwrap();
        assert_eq!(report.rating, Rating::Average);
    }

    #[test]
    fn test_invalid_replies_are_parse_errors() {
        let analyzer = analyzer(FakeClient::replying(""));
        for reply in [
            "I cannot help with that.",
            r#"{"atsScore": "high"}"#,
            r#"{"breakdown": {"technical": 20}}"#,
            "42",
        ] {
            assert!(
                matches!(analyzer.parse_response(reply, &input()), Err(AtsError::Parse(_))),
                "expected parse error for {}",
                reply
            );
        }
    }

    #[test]
    fn test_null_and_mistyped_optional_fields_are_tolerated() {
        let analyzer = analyzer(FakeClient::replying(""));
        let reply = r#"{
            "atsScore": 72,
            "breakdown": null,
            "strengths": null,
            "weaknesses": "Few metrics",
            "recommendations": ["Add metrics", 3, null],
            "extractedSkills": {"languages": ["Rust"], "cloud": null, "tools": "git"},
            "rating": 7,
            "summary": null
        }"#;

        let report = analyzer.parse_response(reply, &input()).unwrap();
        assert_eq!(report.total_score, 72);
        assert_eq!(report.breakdown.values().sum::<u32>(), 72);
        assert!(report.strengths.is_empty());
        assert_eq!(report.weaknesses, vec!["Few metrics".to_string()]);
        assert_eq!(report.recommendations, vec!["Add metrics".to_string()]);
        assert_eq!(report.summary, None);
        assert!(report.keywords.skills[&KeywordGroup::Languages].matched_terms.contains("rust"));
        assert!(report.keywords.skills[&KeywordGroup::Cloud].matched_terms.is_empty());
        assert!(report.keywords.skills[&KeywordGroup::Tools].matched_terms.contains("git"));
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_code_fences("```\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_code_fences("Here you go: {\"a\": 1} Thanks"), "{\"a\": 1}");
        assert_eq!(strip_code_fences("{\"a\": 1}"), "{\"a\": 1}");
    }

    #[tokio::test]
    async fn test_client_errors_propagate() {
        let analyzer = analyzer(FakeClient::failing(|| AtsError::Timeout { seconds: 60 }));
        assert!(matches!(
            analyzer.analyze(&input()).await,
            Err(AtsError::Timeout { seconds: 60 })
        ));
    }

    #[tokio::test]
    async fn test_short_input_never_reaches_the_model() {
        let analyzer = analyzer(FakeClient::replying(r#"{"atsScore": 90}"#));
        let result = analyzer
            .analyze(&ResumeInput::new("Rust developer", SourceFormat::Pdf))
            .await;
        assert!(matches!(result, Err(AtsError::InsufficientContent { .. })));
        assert_eq!(analyzer.client.calls.load(Ordering::SeqCst), 0);
    }
}

//! Integration tests for the ATS scorer

use async_trait::async_trait;
use ats_scorer::analyzer::{analyze_batch, FallbackAnalyzer, ResumeAnalyzer, ResumeInput};
use ats_scorer::config::Config;
use ats_scorer::error::{AtsError, Result};
use ats_scorer::input::{InputManager, SourceFormat};
use ats_scorer::llm::{GenerativeAnalyzer, GenerativeClient};
use ats_scorer::output::formatter::ReportGenerator;
use ats_scorer::output::report::AnalysisMethod;
use ats_scorer::processing::analyzer::KeywordAnalyzer;
use ats_scorer::processing::taxonomy::{KeywordGroup, KeywordTaxonomy, ScoreCategory};
use chrono::{DateTime, Utc};
use std::io::{Cursor, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;
use zip::write::FileOptions;
use zip::ZipWriter;

const RESUME: &str = "\
Jane Doe
Email: jane.doe@example.com | Phone: 555-0100 | linkedin.com/in/janedoe

Summary
Backend engineer with 7 years of experience building distributed systems.

Skills
Python, Go, JavaScript, React, PostgreSQL, Redis, AWS, Docker, Kubernetes, Git

Experience
Senior Engineer, Acme Corp
Led the migration to microservices, reducing latency by 40%.
Developed a billing pipeline processing 2000000 events per day.
Mentored 5 engineers and improved deployment frequency by 3x.

Education
Bachelor of Science in Computer Science, State University";

fn fixed_time() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap()
}

fn taxonomy() -> Arc<KeywordTaxonomy> {
    Arc::new(KeywordTaxonomy::standard().unwrap())
}

fn docx_bytes(paragraphs: &[&str]) -> Vec<u8> {
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t>{}</w:t></w:r></w:p>", p))
        .collect();
    let xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><w:document><w:body>{}</w:body></w:document>"#,
        body
    );

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    writer.start_file("word/document.xml", FileOptions::default()).unwrap();
    writer.write_all(xml.as_bytes()).unwrap();
    writer.finish().unwrap().into_inner()
}

struct ScriptedClient {
    reply: std::result::Result<String, fn() -> AtsError>,
    calls: AtomicUsize,
}

#[async_trait]
impl GenerativeClient for ScriptedClient {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err(error) => Err(error()),
        }
    }

    fn model(&self) -> &str {
        "scripted-model"
    }
}

#[tokio::test]
async fn test_keyword_analysis_end_to_end() {
    let taxonomy = taxonomy();
    let analyzer = KeywordAnalyzer::new(Arc::clone(&taxonomy));
    let input = ResumeInput::new(RESUME, SourceFormat::Pdf).analyzed_at(fixed_time());

    let report = analyzer.analyze(&input).await.unwrap();
    report.check_invariants(&taxonomy).unwrap();

    assert_eq!(report.metadata.method, AnalysisMethod::Keyword);
    assert_eq!(report.metadata.model, None);
    assert_eq!(report.breakdown.values().sum::<u32>(), report.total_score);
    assert!(report.breakdown[&ScoreCategory::Technical] > 0);
    assert!(report.keywords.sections.is_some());

    let skills = report.detected_skills();
    assert!(skills.contains(&(KeywordGroup::Languages, "python".to_string())));
    assert!(skills.iter().all(|(group, _)| group.is_skill()));
}

#[tokio::test]
async fn test_identical_inputs_give_identical_reports() {
    let analyzer = KeywordAnalyzer::new(taxonomy());
    let input = ResumeInput::new(RESUME, SourceFormat::Docx).analyzed_at(fixed_time());

    let first = serde_json::to_string(&analyzer.analyze(&input).await.unwrap()).unwrap();
    let second = serde_json::to_string(&analyzer.analyze(&input).await.unwrap()).unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_docx_file_is_extracted_and_scored() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("resume.docx");
    std::fs::write(&path, docx_bytes(&RESUME.lines().collect::<Vec<_>>())).unwrap();

    let document = InputManager::new().extract_file(&path).await.unwrap();
    assert_eq!(document.source_format, SourceFormat::Docx);
    assert!(document.text.contains("Senior Engineer, Acme Corp"));

    let input = ResumeInput::new(document.text, document.source_format);
    let report = KeywordAnalyzer::new(taxonomy()).analyze(&input).await.unwrap();
    assert_eq!(report.metadata.source_format, SourceFormat::Docx);
    assert!(report.total_score > 0);
}

#[tokio::test]
async fn test_unsupported_file_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("resume.txt");
    std::fs::write(&path, RESUME).unwrap();

    let result = InputManager::new().extract_file(&path).await;
    assert!(matches!(result, Err(AtsError::UnsupportedFormat(_))));
}

#[tokio::test]
async fn test_generative_analysis_with_scripted_model() {
    let taxonomy = taxonomy();
    let client = ScriptedClient {
        reply: Ok(r#"```json
{
  "atsScore": 78,
  "breakdown": {"technical": 25, "structure": 20, "actionVerbs": 10, "achievements": 15, "formatting": 8},
  "strengths": ["Clear impact metrics"],
  "weaknesses": ["No certifications"],
  "recommendations": ["Add a certifications section", "Add a certifications section"],
  "extractedSkills": {"languages": ["Python", "Go"], "softSkills": ["mentoring"]},
  "rating": "Good",
  "summary": "Solid backend resume."
}
```"#
            .to_string()),
        calls: AtomicUsize::new(0),
    };
    let analyzer = GenerativeAnalyzer::new(client, Arc::clone(&taxonomy));
    let input = ResumeInput::new(RESUME, SourceFormat::Pdf).analyzed_at(fixed_time());

    let report = analyzer.analyze(&input).await.unwrap();
    report.check_invariants(&taxonomy).unwrap();
    assert_eq!(report.total_score, 78);
    assert_eq!(report.metadata.method, AnalysisMethod::Generative);
    assert_eq!(report.metadata.model.as_deref(), Some("scripted-model"));
    assert_eq!(report.recommendations, vec!["Add a certifications section".to_string()]);
    assert_eq!(report.summary.as_deref(), Some("Solid backend resume."));
    assert!(report.keywords.sections.is_none());

    let markdown = ReportGenerator::new(&taxonomy)
        .generate_report(&report, &ats_scorer::config::OutputFormat::Markdown)
        .unwrap();
    assert!(markdown.contains("scripted-model"));
}

#[tokio::test]
async fn test_transport_failure_falls_back_to_keywords() {
    let taxonomy = taxonomy();
    let client = ScriptedClient {
        reply: Err(|| AtsError::Transport("connection refused".to_string())),
        calls: AtomicUsize::new(0),
    };
    let generative: Arc<dyn ResumeAnalyzer> = Arc::new(GenerativeAnalyzer::new(client, Arc::clone(&taxonomy)));
    let keyword: Arc<dyn ResumeAnalyzer> = Arc::new(KeywordAnalyzer::new(Arc::clone(&taxonomy)));
    let analyzer = FallbackAnalyzer::new(generative, Arc::clone(&keyword));

    let input = ResumeInput::new(RESUME, SourceFormat::Pdf).analyzed_at(fixed_time());
    let report = analyzer.analyze(&input).await.unwrap();
    assert_eq!(report.metadata.method, AnalysisMethod::Keyword);
    assert_eq!(report, keyword.analyze(&input).await.unwrap());
}

#[tokio::test]
async fn test_short_input_is_not_retried() {
    let taxonomy = taxonomy();
    let client = ScriptedClient {
        reply: Ok("{}".to_string()),
        calls: AtomicUsize::new(0),
    };
    let generative: Arc<dyn ResumeAnalyzer> = Arc::new(GenerativeAnalyzer::new(client, Arc::clone(&taxonomy)));
    let analyzer = FallbackAnalyzer::new(generative, Arc::new(KeywordAnalyzer::new(taxonomy)));

    let result = analyzer.analyze(&ResumeInput::new("Too short.", SourceFormat::Pdf)).await;
    assert!(matches!(
        result,
        Err(AtsError::InsufficientContent { minimum: 100, .. })
    ));
}

#[tokio::test]
async fn test_batch_keeps_input_order() {
    let analyzer: Arc<dyn ResumeAnalyzer> = Arc::new(KeywordAnalyzer::new(taxonomy()));
    let short = ResumeInput::new("tiny", SourceFormat::Pdf);
    let long = ResumeInput::new(format!("{}\n{}", RESUME, "Additional project work. ".repeat(50)), SourceFormat::Doc);
    let inputs = vec![
        ResumeInput::new(RESUME, SourceFormat::Pdf),
        short,
        long,
    ];

    let results = analyze_batch(analyzer, inputs, 2).await;
    assert_eq!(results.len(), 3);

    let first = results[0].as_ref().unwrap();
    assert_eq!(first.metadata.source_format, SourceFormat::Pdf);
    assert!(matches!(results[1], Err(AtsError::InsufficientContent { .. })));
    let third = results[2].as_ref().unwrap();
    assert_eq!(third.metadata.source_format, SourceFormat::Doc);
    assert!(third.metadata.word_count > first.metadata.word_count);
}

#[tokio::test]
async fn test_config_extra_keywords_change_scoring() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(&path, "[taxonomy.extra_keywords]\nlanguages = [\"zig\"]\n").unwrap();

    let text = "A systems programmer who writes zig every day for embedded firmware, \
                ships reliable builds and documents every release carefully for the team.";
    let input = ResumeInput::new(text, SourceFormat::Pdf).analyzed_at(fixed_time());

    let standard = KeywordAnalyzer::new(taxonomy()).analyze(&input).await.unwrap();
    let config = Config::load_from(&path).unwrap();
    let extended = KeywordAnalyzer::new(Arc::new(config.build_taxonomy().unwrap()))
        .analyze(&input)
        .await
        .unwrap();

    assert!(!standard
        .detected_skills()
        .contains(&(KeywordGroup::Languages, "zig".to_string())));
    assert!(extended
        .detected_skills()
        .contains(&(KeywordGroup::Languages, "zig".to_string())));
    assert!(
        extended.breakdown[&ScoreCategory::Technical] >= standard.breakdown[&ScoreCategory::Technical]
    );
}

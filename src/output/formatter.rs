//! Output formatters: console, JSON, Markdown and HTML renderings of a report

use crate::config::OutputFormat;
use crate::error::{AtsError, Result};
use crate::output::report::AnalysisReport;
use crate::processing::aggregator::{Rating, ScoreBreakdown};
use crate::processing::taxonomy::KeywordTaxonomy;
use askama::Template;
use colored::{Color, Colorize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Trait for formatting analysis reports
pub trait OutputFormatter {
    fn format_report(&self, report: &AnalysisReport) -> Result<String>;
    fn supports_format(&self) -> OutputFormat;
}

/// Category weights used to show `score / max` in every format.
pub fn category_weights(taxonomy: &KeywordTaxonomy) -> ScoreBreakdown {
    taxonomy
        .rules()
        .iter()
        .map(|rule| (rule.category, rule.max_weight))
        .collect()
}

fn rating_class(rating: Rating) -> &'static str {
    match rating {
        Rating::Excellent => "score-excellent",
        Rating::Good => "score-good",
        Rating::Average => "score-fair",
        Rating::NeedsImprovement => "score-poor",
    }
}

fn skill_lines(report: &AnalysisReport) -> Vec<(String, String)> {
    report
        .keywords
        .skills
        .iter()
        .filter(|(group, result)| group.is_skill() && !result.matched_terms.is_empty())
        .map(|(group, result)| {
            let terms: Vec<&str> = result.matched_terms.iter().map(String::as_str).collect();
            (group.to_string(), terms.join(", "))
        })
        .collect()
}

/// Console formatter with optional colors
pub struct ConsoleFormatter {
    use_colors: bool,
    detailed: bool,
    weights: ScoreBreakdown,
}

/// JSON formatter for API integration and structured data
pub struct JsonFormatter {
    pretty: bool,
}

/// Markdown formatter for documentation and sharing
pub struct MarkdownFormatter {
    include_metadata: bool,
    weights: ScoreBreakdown,
}

/// HTML formatter backed by an inline askama template
pub struct HtmlFormatter {
    include_styles: bool,
    weights: ScoreBreakdown,
}

/// Report generator that dispatches to the formatter for a format
pub struct ReportGenerator {
    console_formatter: ConsoleFormatter,
    json_formatter: JsonFormatter,
    markdown_formatter: MarkdownFormatter,
    html_formatter: HtmlFormatter,
}

struct BreakdownRow {
    label: String,
    score: u32,
    cap: u32,
    percent: u32,
}

struct SkillRow {
    group: String,
    terms: String,
}

fn breakdown_rows(report: &AnalysisReport, weights: &ScoreBreakdown) -> Vec<BreakdownRow> {
    report
        .breakdown
        .iter()
        .map(|(category, score)| {
            let cap = weights.get(category).copied().unwrap_or(*score);
            BreakdownRow {
                label: category.label().to_string(),
                score: *score,
                cap,
                percent: if cap == 0 { 0 } else { score * 100 / cap },
            }
        })
        .collect()
}

#[derive(Template)]
#[template(source = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>ATS Score Report</title>
    {% if include_styles %}
    <style>
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            line-height: 1.6;
            color: #333;
            max-width: 900px;
            margin: 0 auto;
            padding: 20px;
            background: #f8f9fa;
        }
        .container { background: white; padding: 30px; border-radius: 8px; box-shadow: 0 2px 10px rgba(0,0,0,0.1); }
        .header { text-align: center; margin-bottom: 30px; border-bottom: 3px solid #007acc; padding-bottom: 20px; }
        .score-badge { display: inline-block; padding: 8px 16px; border-radius: 20px; font-weight: bold; color: white; margin-left: 10px; }
        .score-excellent { background: #28a745; }
        .score-good { background: #17a2b8; }
        .score-fair { background: #ffc107; color: #000; }
        .score-poor { background: #dc3545; }
        .section h2 { color: #007acc; border-bottom: 2px solid #e9ecef; padding-bottom: 10px; }
        .bar { background: #e9ecef; border-radius: 4px; height: 10px; }
        .bar-fill { background: #007acc; border-radius: 4px; height: 10px; }
        table { width: 100%; border-collapse: collapse; }
        td, th { padding: 6px 8px; text-align: left; border-bottom: 1px solid #e9ecef; }
        .strengths { border-left: 4px solid #28a745; padding-left: 15px; }
        .weaknesses { border-left: 4px solid #ffc107; padding-left: 15px; }
        .metadata { background: #e9ecef; padding: 15px; border-radius: 6px; margin-top: 30px; font-size: 0.9em; color: #6c757d; }
    </style>
    {% endif %}
</head>
<body>
    <div class="container">
        <div class="header">
            <h1>ATS Score Report</h1>
            <h2>{{ total_score }} / 100 <span class="score-badge {{ rating_class }}">{{ rating }}</span></h2>
            {% if has_summary %}<p>{{ summary }}</p>{% endif %}
        </div>

        <div class="section">
            <h2>Score Breakdown</h2>
            <table>
                <tr><th>Category</th><th>Score</th><th></th></tr>
                {% for row in breakdown %}
                <tr>
                    <td>{{ row.label }}</td>
                    <td>{{ row.score }} / {{ row.cap }}</td>
                    <td><div class="bar"><div class="bar-fill" style="width: {{ row.percent }}%"></div></div></td>
                </tr>
                {% endfor %}
            </table>
        </div>

        {% if !strengths.is_empty() %}
        <div class="section">
            <h2>Strengths</h2>
            <ul class="strengths">
                {% for item in strengths %}<li>{{ item }}</li>{% endfor %}
            </ul>
        </div>
        {% endif %}

        {% if !weaknesses.is_empty() %}
        <div class="section">
            <h2>Weaknesses</h2>
            <ul class="weaknesses">
                {% for item in weaknesses %}<li>{{ item }}</li>{% endfor %}
            </ul>
        </div>
        {% endif %}

        {% if !recommendations.is_empty() %}
        <div class="section">
            <h2>Recommendations</h2>
            <ol>
                {% for item in recommendations %}<li>{{ item }}</li>{% endfor %}
            </ol>
        </div>
        {% endif %}

        {% if !skills.is_empty() %}
        <div class="section">
            <h2>Detected Skills</h2>
            <table>
                {% for row in skills %}<tr><th>{{ row.group }}</th><td>{{ row.terms }}</td></tr>{% endfor %}
            </table>
        </div>
        {% endif %}

        <div class="metadata">
            <p><strong>Analyzed:</strong> {{ analyzed_at }} | <strong>Method:</strong> {{ method }}{% if has_model %} ({{ model }}){% endif %}</p>
            <p><strong>Source:</strong> {{ source_format }} | <strong>Words:</strong> {{ word_count }}</p>
        </div>
    </div>
</body>
</html>"#, ext = "html")]
struct HtmlTemplate {
    include_styles: bool,
    total_score: u32,
    rating: String,
    rating_class: &'static str,
    has_summary: bool,
    summary: String,
    breakdown: Vec<BreakdownRow>,
    strengths: Vec<String>,
    weaknesses: Vec<String>,
    recommendations: Vec<String>,
    skills: Vec<SkillRow>,
    analyzed_at: String,
    method: String,
    has_model: bool,
    model: String,
    source_format: String,
    word_count: usize,
}

impl ConsoleFormatter {
    pub fn new(use_colors: bool, detailed: bool, weights: ScoreBreakdown) -> Self {
        Self {
            use_colors,
            detailed,
            weights,
        }
    }

    fn colorize(&self, text: &str, color: Color) -> String {
        if self.use_colors {
            text.color(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn format_header(&self, title: &str, level: u8) -> String {
        let (prefix, color) = match level {
            1 => ("█", Color::Blue),
            2 => ("▓", Color::Green),
            _ => ("▒", Color::Yellow),
        };

        if self.use_colors {
            format!("\n{} {}\n", prefix.color(color).bold(), title.color(color).bold())
        } else {
            format!("\n{} {}\n", prefix, title)
        }
    }

    fn format_rating_badge(&self, rating: Rating) -> String {
        let color = match rating {
            Rating::Excellent => Color::Green,
            Rating::Good => Color::BrightGreen,
            Rating::Average => Color::Yellow,
            Rating::NeedsImprovement => Color::Red,
        };
        let badge = rating.label().to_uppercase();

        if self.use_colors {
            format!("[{}]", badge.color(color).bold())
        } else {
            format!("[{}]", badge)
        }
    }

    fn format_bar(&self, score: u32, cap: u32) -> String {
        const WIDTH: u32 = 20;
        let filled = if cap == 0 { 0 } else { score * WIDTH / cap };
        format!(
            "{}{}",
            "■".repeat(filled as usize),
            "·".repeat((WIDTH - filled.min(WIDTH)) as usize)
        )
    }

    fn push_list(&self, output: &mut String, title: &str, items: &[String], bullet: &str, color: Color) {
        if items.is_empty() {
            return;
        }
        output.push_str(&self.format_header(title, 3));
        for item in items {
            output.push_str(&format!("  {} {}\n", bullet, self.colorize(item, color)));
        }
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format_report(&self, report: &AnalysisReport) -> Result<String> {
        let mut output = String::new();

        output.push_str(&self.format_header("📊 ATS SCORE REPORT", 1));
        output.push_str(&format!(
            "Analyzed: {} | Method: {}{} | Source: {} ({} words)\n",
            report.metadata.analyzed_at.format("%Y-%m-%d %H:%M:%S UTC"),
            report.metadata.method,
            report
                .metadata
                .model
                .as_deref()
                .map(|m| format!(" ({})", m))
                .unwrap_or_default(),
            report.metadata.source_format,
            report.metadata.word_count
        ));

        output.push_str(&self.format_header("Overall", 2));
        output.push_str(&format!(
            "ATS Score: {}/100 {}\n",
            report.total_score,
            self.format_rating_badge(report.rating)
        ));
        if let Some(summary) = &report.summary {
            output.push_str(&format!("{} {}\n", self.colorize("Summary:", Color::Cyan), summary));
        }

        output.push_str(&self.format_header("Score Breakdown", 3));
        for row in breakdown_rows(report, &self.weights) {
            output.push_str(&format!(
                "  {:<18} {:>3}/{:<3} {}\n",
                row.label,
                row.score,
                row.cap,
                self.colorize(&self.format_bar(row.score, row.cap), Color::Blue)
            ));
        }

        self.push_list(&mut output, "✅ Strengths", &report.strengths, "•", Color::Green);
        self.push_list(&mut output, "⚠️ Weaknesses", &report.weaknesses, "•", Color::Yellow);

        if !report.recommendations.is_empty() {
            output.push_str(&self.format_header("📋 Recommendations", 2));
            for (i, recommendation) in report.recommendations.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, recommendation));
            }
        }

        if self.detailed {
            output.push_str(&self.format_header("🔍 Detected Keywords", 2));
            let skills = skill_lines(report);
            if skills.is_empty() {
                output.push_str("  No skill keywords detected\n");
            }
            for (group, terms) in skills {
                output.push_str(&format!("  {:<14} {}\n", self.colorize(&group, Color::Cyan), terms));
            }

            if let Some(sections) = &report.keywords.sections {
                let missing: Vec<String> = sections.missing().iter().map(|s| s.to_string()).collect();
                output.push_str(&format!(
                    "  Sections found: {}/{}{}\n",
                    sections.present_count(),
                    sections.present_count() as usize + missing.len(),
                    if missing.is_empty() {
                        String::new()
                    } else {
                        format!(" (missing: {})", missing.join(", "))
                    }
                ));
            }
            if let Some(achievements) = &report.keywords.achievements {
                output.push_str(&format!(
                    "  Metrics: {} percentages, {} numbers\n",
                    achievements.percentage_count, achievements.number_count
                ));
            }
            if let Some(formatting) = &report.keywords.formatting {
                output.push_str(&format!(
                    "  Length: {} words over {} lines\n",
                    formatting.word_count, formatting.line_count
                ));
            }
        }

        Ok(output)
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Console
    }
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_report(&self, report: &AnalysisReport) -> Result<String> {
        if self.pretty {
            Ok(serde_json::to_string_pretty(report)?)
        } else {
            Ok(serde_json::to_string(report)?)
        }
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Json
    }
}

impl MarkdownFormatter {
    pub fn new(include_metadata: bool, weights: ScoreBreakdown) -> Self {
        Self {
            include_metadata,
            weights,
        }
    }

    fn markdown_rating_badge(rating: Rating) -> &'static str {
        match rating {
            Rating::Excellent => "🟢 Excellent",
            Rating::Good => "🟡 Good",
            Rating::Average => "🟠 Average",
            Rating::NeedsImprovement => "🔴 Needs Improvement",
        }
    }

    fn push_section(output: &mut String, title: &str, items: &[String], numbered: bool) {
        if items.is_empty() {
            return;
        }
        output.push_str(&format!("## {}\n\n", title));
        for (i, item) in items.iter().enumerate() {
            if numbered {
                output.push_str(&format!("{}. {}\n", i + 1, item));
            } else {
                output.push_str(&format!("- {}\n", item));
            }
        }
        output.push('\n');
    }
}

impl OutputFormatter for MarkdownFormatter {
    fn format_report(&self, report: &AnalysisReport) -> Result<String> {
        let mut output = String::new();

        output.push_str("# 📊 ATS Score Report\n\n");
        output.push_str(&format!(
            "**ATS Score:** {}/100 {}\n\n",
            report.total_score,
            Self::markdown_rating_badge(report.rating)
        ));
        if let Some(summary) = &report.summary {
            output.push_str(&format!("> {}\n\n", summary));
        }

        output.push_str("## Score Breakdown\n\n");
        output.push_str("| Category | Score | Max |\n");
        output.push_str("|----------|-------|-----|\n");
        for row in breakdown_rows(report, &self.weights) {
            output.push_str(&format!("| {} | {} | {} |\n", row.label, row.score, row.cap));
        }
        output.push('\n');

        Self::push_section(&mut output, "✅ Strengths", &report.strengths, false);
        Self::push_section(&mut output, "⚠️ Weaknesses", &report.weaknesses, false);
        Self::push_section(&mut output, "📋 Recommendations", &report.recommendations, true);

        let skills = skill_lines(report);
        if !skills.is_empty() {
            output.push_str("## Detected Skills\n\n");
            for (group, terms) in skills {
                output.push_str(&format!("- **{}:** {}\n", group, terms));
            }
            output.push('\n');
        }

        if self.include_metadata {
            output.push_str("---\n\n");
            output.push_str(&format!(
                "*Analyzed {} with the {} analyzer{} | source: {} | {} words*\n",
                report.metadata.analyzed_at.format("%Y-%m-%d %H:%M:%S UTC"),
                report.metadata.method,
                report
                    .metadata
                    .model
                    .as_deref()
                    .map(|m| format!(" ({})", m))
                    .unwrap_or_default(),
                report.metadata.source_format,
                report.metadata.word_count
            ));
        }

        Ok(output)
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Markdown
    }
}

impl HtmlFormatter {
    pub fn new(include_styles: bool, weights: ScoreBreakdown) -> Self {
        Self {
            include_styles,
            weights,
        }
    }

    fn create_template_data(&self, report: &AnalysisReport) -> HtmlTemplate {
        HtmlTemplate {
            include_styles: self.include_styles,
            total_score: report.total_score,
            rating: report.rating.to_string(),
            rating_class: rating_class(report.rating),
            has_summary: report.summary.is_some(),
            summary: report.summary.clone().unwrap_or_default(),
            breakdown: breakdown_rows(report, &self.weights),
            strengths: report.strengths.clone(),
            weaknesses: report.weaknesses.clone(),
            recommendations: report.recommendations.clone(),
            skills: skill_lines(report)
                .into_iter()
                .map(|(group, terms)| SkillRow { group, terms })
                .collect(),
            analyzed_at: report
                .metadata
                .analyzed_at
                .format("%Y-%m-%d %H:%M:%S UTC")
                .to_string(),
            method: report.metadata.method.to_string(),
            has_model: report.metadata.model.is_some(),
            model: report.metadata.model.clone().unwrap_or_default(),
            source_format: report.metadata.source_format.to_string(),
            word_count: report.metadata.word_count,
        }
    }
}

impl OutputFormatter for HtmlFormatter {
    fn format_report(&self, report: &AnalysisReport) -> Result<String> {
        self.create_template_data(report)
            .render()
            .map_err(|e| AtsError::OutputFormatting(e.to_string()))
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Html
    }
}

impl ReportGenerator {
    pub fn new(taxonomy: &KeywordTaxonomy) -> Self {
        Self::with_options(taxonomy, true, false, true)
    }

    pub fn with_options(taxonomy: &KeywordTaxonomy, use_colors: bool, detailed: bool, pretty_json: bool) -> Self {
        let weights = category_weights(taxonomy);
        Self {
            console_formatter: ConsoleFormatter::new(use_colors, detailed, weights.clone()),
            json_formatter: JsonFormatter::new(pretty_json),
            markdown_formatter: MarkdownFormatter::new(true, weights.clone()),
            html_formatter: HtmlFormatter::new(true, weights),
        }
    }

    pub fn generate_report(&self, report: &AnalysisReport, format: &OutputFormat) -> Result<String> {
        let formatter: &dyn OutputFormatter = match format {
            OutputFormat::Console => &self.console_formatter,
            OutputFormat::Json => &self.json_formatter,
            OutputFormat::Markdown => &self.markdown_formatter,
            OutputFormat::Html => &self.html_formatter,
        };
        formatter.format_report(report)
    }
}

// Utility functions for saving reports
pub fn save_report_to_file(content: &str, file_path: &Path) -> Result<()> {
    use std::fs;
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(file_path, content)?;
    Ok(())
}

pub fn suggest_filename(format: &OutputFormat, resume_name: &str, timestamp: bool) -> String {
    let base_name = Path::new(resume_name)
        .file_stem()
        .unwrap_or_default()
        .to_string_lossy();

    let timestamp_suffix = if timestamp {
        format!("_{}", chrono::Utc::now().format("%Y%m%d_%H%M%S"))
    } else {
        String::new()
    };

    let extension = match format {
        OutputFormat::Console => "txt",
        OutputFormat::Json => "json",
        OutputFormat::Markdown => "md",
        OutputFormat::Html => "html",
    };
    format!("{}_ats{}.{}", base_name, timestamp_suffix, extension)
}

/// Output paths for saving one report per resume under `target`.
///
/// A single report goes to `target` itself unless it is a directory. Resumes
/// sharing a file stem get a numeric suffix instead of overwriting each other.
pub fn report_destinations(target: &Path, resumes: &[PathBuf], format: &OutputFormat) -> Vec<PathBuf> {
    if resumes.len() == 1 && !target.is_dir() {
        return vec![target.to_path_buf()];
    }

    let mut taken = HashSet::new();
    resumes
        .iter()
        .map(|resume| {
            let name = suggest_filename(format, &resume.to_string_lossy(), false);
            let (stem, extension) = name.rsplit_once('.').unwrap_or((name.as_str(), "txt"));
            let mut candidate = name.clone();
            let mut counter = 2;
            while !taken.insert(candidate.clone()) {
                candidate = format!("{}_{}.{}", stem, counter, extension);
                counter += 1;
            }
            target.join(candidate)
        })
        .collect()
}

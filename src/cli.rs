//! CLI interface for the ATS scorer

use crate::config::OutputFormat;
use crate::output::report::AnalysisMethod;
use crate::processing::taxonomy::KeywordGroup;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ats-scorer")]
#[command(about = "Resume ATS compatibility scoring tool")]
#[command(long_about = "Score resumes (PDF, DOC, DOCX) for applicant tracking system compatibility using keyword analysis or a generative model")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Score one or more resumes
    Score {
        /// Resume files (PDF, DOC, DOCX)
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Analysis method: keyword or generative
        #[arg(short, long, value_parser = parse_analysis_method)]
        method: Option<AnalysisMethod>,

        /// Fail instead of falling back to keyword analysis
        #[arg(long)]
        no_fallback: bool,

        /// Output format: console, json, markdown, html
        #[arg(short, long, value_parser = parse_output_format)]
        output: Option<OutputFormat>,

        /// Save output to a file, or to a directory when scoring several resumes
        #[arg(short, long)]
        save: Option<PathBuf>,

        /// Show detected keywords and signals
        #[arg(short, long)]
        detailed: bool,

        /// Resumes analyzed concurrently
        #[arg(short, long)]
        jobs: Option<usize>,
    },

    /// List keyword groups and the scoring weight table
    Taxonomy {
        /// Only show this keyword group
        #[arg(short, long, value_parser = parse_keyword_group)]
        group: Option<KeywordGroup>,
    },

    /// Show or reset configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Reset configuration to defaults
    Reset,

    /// Print the configuration file path
    Path,
}

/// Parse and validate output format
pub fn parse_output_format(format: &str) -> Result<OutputFormat, String> {
    match format.to_lowercase().as_str() {
        "console" => Ok(OutputFormat::Console),
        "json" => Ok(OutputFormat::Json),
        "markdown" | "md" => Ok(OutputFormat::Markdown),
        "html" => Ok(OutputFormat::Html),
        _ => Err(format!(
            "Invalid output format: {}. Supported: console, json, markdown, html",
            format
        )),
    }
}

pub fn parse_analysis_method(method: &str) -> Result<AnalysisMethod, String> {
    match method.to_lowercase().as_str() {
        "keyword" | "keywords" => Ok(AnalysisMethod::Keyword),
        "generative" | "llm" | "ai" => Ok(AnalysisMethod::Generative),
        _ => Err(format!(
            "Invalid analysis method: {}. Supported: keyword, generative",
            method
        )),
    }
}

pub fn parse_keyword_group(group: &str) -> Result<KeywordGroup, String> {
    KeywordGroup::from_label(group).ok_or_else(|| {
        let known: Vec<&str> = KeywordGroup::ALL.iter().map(|g| g.as_str()).collect();
        format!("Unknown keyword group: {}. Known groups: {}", group, known.join(", "))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_score_arguments() {
        let cli = Cli::try_parse_from([
            "ats-scorer", "score", "a.pdf", "b.docx", "--method", "generative", "-o", "md", "--jobs", "2",
            "--no-fallback",
        ])
        .unwrap();

        match cli.command {
            Commands::Score {
                files,
                method,
                output,
                jobs,
                no_fallback,
                ..
            } => {
                assert_eq!(files.len(), 2);
                assert_eq!(method, Some(AnalysisMethod::Generative));
                assert_eq!(output, Some(OutputFormat::Markdown));
                assert_eq!(jobs, Some(2));
                assert!(no_fallback);
            }
            _ => panic!("expected score command"),
        }
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(Cli::try_parse_from(["ats-scorer", "score"]).is_err());
        assert!(Cli::try_parse_from(["ats-scorer", "score", "a.pdf", "-o", "pdf"]).is_err());
        assert!(Cli::try_parse_from(["ats-scorer", "taxonomy", "--group", "hobbies"]).is_err());
    }

    #[test]
    fn test_parse_helpers() {
        assert_eq!(parse_output_format("JSON"), Ok(OutputFormat::Json));
        assert_eq!(parse_analysis_method("keyword"), Ok(AnalysisMethod::Keyword));
        assert_eq!(parse_keyword_group("languages"), Ok(KeywordGroup::Languages));
    }
}

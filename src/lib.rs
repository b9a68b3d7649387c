//! ATS scorer library
//!
//! Scores resumes for applicant tracking system compatibility with either a
//! deterministic keyword analyzer or a generative model, behind one
//! `ResumeAnalyzer` contract.

pub mod analyzer;
pub mod cli;
pub mod config;
pub mod error;
pub mod input;
pub mod llm;
pub mod output;
pub mod processing;

pub use analyzer::{analyze_batch, build_analyzer, FallbackAnalyzer, ResumeAnalyzer, ResumeInput};
pub use config::Config;
pub use error::{AtsError, Result};
pub use input::{ExtractedDocument, InputManager, SourceFormat};
pub use output::report::{AnalysisMethod, AnalysisReport};
pub use processing::analyzer::KeywordAnalyzer;
pub use processing::taxonomy::KeywordTaxonomy;

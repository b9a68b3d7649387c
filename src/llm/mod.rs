//! Generative model integration: client, prompt and response normalization

pub mod analyzer;
pub mod client;
pub mod prompts;

pub use analyzer::GenerativeAnalyzer;
pub use client::{GeminiClient, GenerativeClient};

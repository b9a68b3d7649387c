//! Keyword scoring pipeline: taxonomy, matching, sub-scores, aggregation and feedback

pub mod taxonomy;
pub mod matcher;
pub mod scorers;
pub mod aggregator;
pub mod feedback;
pub mod analyzer;

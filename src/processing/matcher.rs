//! Category matching: boundary-aware keyword scanning over lower-cased text

use crate::error::{AtsError, Result};
use crate::processing::taxonomy::{KeywordGroup, KeywordTaxonomy};
use aho_corasick::AhoCorasick;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Per-group match results, ordered by group.
pub type CategoryMatches = BTreeMap<KeywordGroup, CategoryMatchResult>;

/// Hits for one keyword group.
///
/// `hit_count` counts every accepted occurrence; `matched_terms` holds each
/// canonical term once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryMatchResult {
    pub category: KeywordGroup,
    pub hit_count: u32,
    pub matched_terms: BTreeSet<String>,
}

impl CategoryMatchResult {
    pub fn empty(category: KeywordGroup) -> Self {
        Self {
            category,
            hit_count: 0,
            matched_terms: BTreeSet::new(),
        }
    }
}

/// Canonical keyword list with a compiled overlapping matcher.
#[derive(Debug, Clone)]
pub struct KeywordSet {
    terms: Vec<String>,
    automaton: AhoCorasick,
}

impl KeywordSet {
    /// Canonicalize (trim, lower-case, dedupe) and compile the keywords.
    pub fn new<I, S>(keywords: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let terms: Vec<String> = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        // Patterns are literals, so `c++` or `.net` need no escaping here.
        let automaton = AhoCorasick::new(&terms)
            .map_err(|e| AtsError::Configuration(format!("Failed to build keyword matcher: {}", e)))?;

        Ok(Self { terms, automaton })
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn contains(&self, term: &str) -> bool {
        self.terms.binary_search_by(|t| t.as_str().cmp(term)).is_ok()
    }

    /// Count boundary-respecting occurrences in already lower-cased text.
    pub fn scan(&self, lowered: &str) -> (u32, BTreeSet<String>) {
        let mut hit_count = 0u32;
        let mut matched = BTreeSet::new();

        if self.terms.is_empty() {
            return (hit_count, matched);
        }

        for mat in self.automaton.find_overlapping_iter(lowered) {
            if !is_bounded(lowered, mat.start(), mat.end()) {
                continue;
            }
            hit_count += 1;
            matched.insert(self.terms[mat.pattern().as_usize()].clone());
        }

        (hit_count, matched)
    }

    /// Whether any term occurs with valid boundaries.
    pub fn occurs_in(&self, lowered: &str) -> bool {
        self.automaton
            .find_overlapping_iter(lowered)
            .any(|mat| is_bounded(lowered, mat.start(), mat.end()))
    }
}

/// Characters that glue onto a keyword: a match touching one of these is
/// part of a longer token (`java` inside `javascript`).
fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// `#` and `++` after a match extend it into another language (`c#`, `c++`);
/// a single `+` joins two keywords (`python+django`). A version number may
/// follow directly (`html5`, `css3`) as long as no letter comes after it.
fn is_bounded(haystack: &str, start: usize, end: usize) -> bool {
    if haystack[..start].chars().next_back().map_or(false, is_word_char) {
        return false;
    }

    let tail = &haystack[end..];
    if tail.starts_with('#') || tail.starts_with("++") {
        return false;
    }
    let after_version = tail.trim_start_matches(|c: char| c.is_ascii_digit());
    !after_version.chars().next().map_or(false, is_word_char)
}

/// Lower-case text for matching.
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
}

/// Stateless matcher over a taxonomy.
pub struct CategoryMatcher;

impl CategoryMatcher {
    /// Match every taxonomy group against raw text.
    pub fn match_text(text: &str, taxonomy: &KeywordTaxonomy) -> CategoryMatches {
        Self::match_normalized(&normalize(text), taxonomy)
    }

    /// Match every taxonomy group against text that is already lower-cased.
    pub fn match_normalized(lowered: &str, taxonomy: &KeywordTaxonomy) -> CategoryMatches {
        taxonomy
            .categories()
            .iter()
            .map(|category| {
                let (hit_count, matched_terms) = category.keywords.scan(lowered);
                (
                    category.group,
                    CategoryMatchResult {
                        category: category.group,
                        hit_count,
                        matched_terms,
                    },
                )
            })
            .collect()
    }

    /// Sum of hit counts over the given groups.
    pub fn total_hits(matches: &CategoryMatches, groups: &[KeywordGroup]) -> u32 {
        groups
            .iter()
            .filter_map(|g| matches.get(g))
            .map(|m| m.hit_count)
            .sum()
    }
}

//! Keyword taxonomy: keyword groups, section cues and the scoring weight table
//!
//! The taxonomy is built once (usually at process start), never mutated
//! afterwards, and shared read-only between concurrent analyses.

use crate::error::{AtsError, Result};
use crate::processing::matcher::KeywordSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Version of the built-in keyword lists and calibration constants.
pub const TAXONOMY_VERSION: &str = "1.0";

/// Sum every taxonomy's weight table must add up to.
pub const TOTAL_WEIGHT: u32 = 100;

/// Keyword groups shared by both analyzer strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeywordGroup {
    Languages,
    Frameworks,
    Databases,
    Cloud,
    Tools,
    Concepts,
    SoftSkills,
    ActionVerbs,
    Education,
    Experience,
}

impl KeywordGroup {
    pub const ALL: [KeywordGroup; 10] = [
        KeywordGroup::Languages,
        KeywordGroup::Frameworks,
        KeywordGroup::Databases,
        KeywordGroup::Cloud,
        KeywordGroup::Tools,
        KeywordGroup::Concepts,
        KeywordGroup::SoftSkills,
        KeywordGroup::ActionVerbs,
        KeywordGroup::Education,
        KeywordGroup::Experience,
    ];

    /// Groups whose hits feed the technical sub-score.
    pub const TECHNICAL: [KeywordGroup; 6] = [
        KeywordGroup::Languages,
        KeywordGroup::Frameworks,
        KeywordGroup::Databases,
        KeywordGroup::Cloud,
        KeywordGroup::Tools,
        KeywordGroup::Concepts,
    ];

    pub fn is_technical(&self) -> bool {
        Self::TECHNICAL.contains(self)
    }

    /// Groups that describe candidate skills (technical plus soft skills).
    pub fn is_skill(&self) -> bool {
        self.is_technical() || *self == KeywordGroup::SoftSkills
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            KeywordGroup::Languages => "languages",
            KeywordGroup::Frameworks => "frameworks",
            KeywordGroup::Databases => "databases",
            KeywordGroup::Cloud => "cloud",
            KeywordGroup::Tools => "tools",
            KeywordGroup::Concepts => "concepts",
            KeywordGroup::SoftSkills => "soft_skills",
            KeywordGroup::ActionVerbs => "action_verbs",
            KeywordGroup::Education => "education",
            KeywordGroup::Experience => "experience",
        }
    }

    /// Resolve a free-form category label (config keys, model output) to a group.
    ///
    /// Case, separators and a few common synonyms are tolerated.
    pub fn from_label(label: &str) -> Option<Self> {
        let key: String = label
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect::<String>()
            .to_lowercase();

        match key.as_str() {
            "languages" | "language" | "programminglanguages" | "programming" => {
                Some(KeywordGroup::Languages)
            }
            "frameworks" | "framework" | "libraries" | "frameworkslibraries" => {
                Some(KeywordGroup::Frameworks)
            }
            "databases" | "database" | "datastores" => Some(KeywordGroup::Databases),
            "cloud" | "cloudplatforms" | "devops" | "infrastructure" => Some(KeywordGroup::Cloud),
            "tools" | "tooling" | "developertools" => Some(KeywordGroup::Tools),
            "concepts" | "methodologies" | "practices" => Some(KeywordGroup::Concepts),
            "softskills" | "soft" | "interpersonal" => Some(KeywordGroup::SoftSkills),
            "actionverbs" | "verbs" => Some(KeywordGroup::ActionVerbs),
            "education" => Some(KeywordGroup::Education),
            "experience" => Some(KeywordGroup::Experience),
            _ => None,
        }
    }
}

impl fmt::Display for KeywordGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resume sections detected by topic cues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Contact,
    Education,
    Experience,
    Skills,
    Summary,
}

impl Section {
    pub const ALL: [Section; 5] = [
        Section::Contact,
        Section::Education,
        Section::Experience,
        Section::Skills,
        Section::Summary,
    ];
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Section::Contact => "contact",
            Section::Education => "education",
            Section::Experience => "experience",
            Section::Skills => "skills",
            Section::Summary => "summary",
        };
        f.write_str(name)
    }
}

/// The five weighted categories that make up the composite score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreCategory {
    Technical,
    Structure,
    ActionVerbs,
    Achievements,
    Formatting,
}

impl ScoreCategory {
    pub const ALL: [ScoreCategory; 5] = [
        ScoreCategory::Technical,
        ScoreCategory::Structure,
        ScoreCategory::ActionVerbs,
        ScoreCategory::Achievements,
        ScoreCategory::Formatting,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ScoreCategory::Technical => "Technical Skills",
            ScoreCategory::Structure => "Structure",
            ScoreCategory::ActionVerbs => "Action Verbs",
            ScoreCategory::Achievements => "Achievements",
            ScoreCategory::Formatting => "Formatting",
        }
    }

    /// Machine key, as used in serialized breakdowns.
    pub fn key(&self) -> &'static str {
        match self {
            ScoreCategory::Technical => "technical",
            ScoreCategory::Structure => "structure",
            ScoreCategory::ActionVerbs => "action_verbs",
            ScoreCategory::Achievements => "achievements",
            ScoreCategory::Formatting => "formatting",
        }
    }

    /// Resolve a breakdown field name, tolerating case and separators.
    pub fn from_label(label: &str) -> Option<Self> {
        let key: String = label
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect::<String>()
            .to_lowercase();

        match key.as_str() {
            "technical" | "technicalskills" | "skills" => Some(ScoreCategory::Technical),
            "structure" | "sections" | "resumestructure" => Some(ScoreCategory::Structure),
            "actionverbs" | "verbs" => Some(ScoreCategory::ActionVerbs),
            "achievements" | "quantifiedachievements" | "impact" => Some(ScoreCategory::Achievements),
            "formatting" | "format" | "length" => Some(ScoreCategory::Formatting),
            _ => None,
        }
    }
}

impl fmt::Display for ScoreCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Word-count bands used by the formatting formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LengthBands {
    pub optimal_min_words: usize,
    pub optimal_max_words: usize,
    pub long_above_words: usize,
    pub optimal_points: u32,
    pub acceptable_points: u32,
    pub off_band_points: u32,
    pub line_threshold: usize,
    pub line_bonus: u32,
}

/// How a category turns its evidence into points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Formula {
    /// `round(hits / divisor * cap)` over the summed hits of `groups`
    HitRatio { groups: Vec<KeywordGroup>, divisor: u32 },
    /// Fixed points per detected section
    SectionPresence { points_per_section: u32 },
    /// `percentages * per_percentage + min(numbers, number_limit) * per_number`
    Quantified {
        per_percentage: u32,
        per_number: u32,
        number_limit: u32,
    },
    /// Word-count band plus a line-count bonus
    Length(LengthBands),
}

/// One row of the weight table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringRule {
    pub category: ScoreCategory,
    pub max_weight: u32,
    pub formula: Formula,
}

/// A keyword group and its compiled keyword set.
#[derive(Debug, Clone)]
pub struct KeywordCategory {
    pub group: KeywordGroup,
    pub keywords: KeywordSet,
}

/// Topic cues whose presence marks a section as present.
#[derive(Debug, Clone)]
pub struct SectionCue {
    pub section: Section,
    pub cues: KeywordSet,
}

/// Immutable keyword taxonomy plus the scoring weight table.
#[derive(Debug, Clone)]
pub struct KeywordTaxonomy {
    categories: Vec<KeywordCategory>,
    section_cues: Vec<SectionCue>,
    rules: Vec<ScoringRule>,
}

impl KeywordTaxonomy {
    /// The built-in taxonomy with the standard calibration constants.
    pub fn standard() -> Result<Self> {
        Self::with_extra_keywords(&BTreeMap::new())
    }

    /// Built-in taxonomy extended with extra keywords keyed by group label.
    pub fn with_extra_keywords(extra: &BTreeMap<String, Vec<String>>) -> Result<Self> {
        let mut lists: BTreeMap<KeywordGroup, Vec<String>> = default_keywords()
            .into_iter()
            .map(|(group, words)| (group, words.iter().map(|w| w.to_string()).collect()))
            .collect();

        for (label, words) in extra {
            let group = KeywordGroup::from_label(label).ok_or_else(|| {
                AtsError::Configuration(format!("Unknown keyword group in taxonomy config: '{}'", label))
            })?;
            for word in words {
                let term = word.trim().to_lowercase();
                if term.is_empty() {
                    continue;
                }
                if let Some((owner, _)) = lists
                    .iter()
                    .find(|(other, terms)| **other != group && terms.iter().any(|t| *t == term))
                {
                    return Err(AtsError::Configuration(format!(
                        "Keyword '{}' configured for {} already belongs to {}",
                        term, group, owner
                    )));
                }
                lists.entry(group).or_default().push(term);
            }
        }

        let cues = default_section_cues()
            .into_iter()
            .map(|(section, words)| (section, words.iter().map(|w| w.to_string()).collect()))
            .collect();

        Self::new(lists.into_iter().collect(), cues, default_rules())
    }

    /// Build a taxonomy from explicit lists; validates the weight table.
    pub fn new(
        categories: Vec<(KeywordGroup, Vec<String>)>,
        section_cues: Vec<(Section, Vec<String>)>,
        rules: Vec<ScoringRule>,
    ) -> Result<Self> {
        validate_rules(&rules)?;

        let categories = categories
            .into_iter()
            .map(|(group, words)| {
                Ok(KeywordCategory {
                    group,
                    keywords: KeywordSet::new(words)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let section_cues = section_cues
            .into_iter()
            .map(|(section, words)| {
                Ok(SectionCue {
                    section,
                    cues: KeywordSet::new(words)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            categories,
            section_cues,
            rules,
        })
    }

    pub fn version(&self) -> &'static str {
        TAXONOMY_VERSION
    }

    pub fn categories(&self) -> &[KeywordCategory] {
        &self.categories
    }

    pub fn category(&self, group: KeywordGroup) -> Option<&KeywordCategory> {
        self.categories.iter().find(|c| c.group == group)
    }

    pub fn section_cues(&self) -> &[SectionCue] {
        &self.section_cues
    }

    /// Weight table in scoring order.
    pub fn rules(&self) -> &[ScoringRule] {
        &self.rules
    }

    pub fn max_weight(&self, category: ScoreCategory) -> u32 {
        self.rules
            .iter()
            .find(|r| r.category == category)
            .map(|r| r.max_weight)
            .unwrap_or(0)
    }

    /// Find the skill group a term belongs to, if any.
    pub fn classify(&self, term: &str) -> Option<KeywordGroup> {
        let term = term.trim().to_lowercase();
        self.categories
            .iter()
            .filter(|c| c.group.is_skill())
            .find(|c| c.keywords.contains(&term))
            .map(|c| c.group)
    }

    /// Total keyword count across all groups.
    pub fn keyword_count(&self) -> usize {
        self.categories.iter().map(|c| c.keywords.len()).sum()
    }
}

fn validate_rules(rules: &[ScoringRule]) -> Result<()> {
    for category in ScoreCategory::ALL {
        let count = rules.iter().filter(|r| r.category == category).count();
        if count != 1 {
            return Err(AtsError::Configuration(format!(
                "Weight table must contain exactly one rule for '{}', found {}",
                category, count
            )));
        }
    }

    let total: u32 = rules.iter().map(|r| r.max_weight).sum();
    if total != TOTAL_WEIGHT {
        return Err(AtsError::Configuration(format!(
            "Category weights must sum to {}, got {}",
            TOTAL_WEIGHT, total
        )));
    }

    for rule in rules {
        if let Formula::HitRatio { divisor: 0, .. } = rule.formula {
            return Err(AtsError::Configuration(format!(
                "Hit-ratio divisor for '{}' must be positive",
                rule.category
            )));
        }
    }

    Ok(())
}

/// Standard weight table: 30 + 20 + 15 + 20 + 15.
pub fn default_rules() -> Vec<ScoringRule> {
    vec![
        ScoringRule {
            category: ScoreCategory::Technical,
            max_weight: 30,
            formula: Formula::HitRatio {
                groups: KeywordGroup::TECHNICAL.to_vec(),
                divisor: 20,
            },
        },
        ScoringRule {
            category: ScoreCategory::Structure,
            max_weight: 20,
            formula: Formula::SectionPresence { points_per_section: 4 },
        },
        ScoringRule {
            category: ScoreCategory::ActionVerbs,
            max_weight: 15,
            formula: Formula::HitRatio {
                groups: vec![KeywordGroup::ActionVerbs],
                divisor: 10,
            },
        },
        ScoringRule {
            category: ScoreCategory::Achievements,
            max_weight: 20,
            formula: Formula::Quantified {
                per_percentage: 5,
                per_number: 2,
                number_limit: 5,
            },
        },
        ScoringRule {
            category: ScoreCategory::Formatting,
            max_weight: 15,
            formula: Formula::Length(LengthBands {
                optimal_min_words: 400,
                optimal_max_words: 800,
                long_above_words: 1200,
                optimal_points: 10,
                acceptable_points: 8,
                off_band_points: 5,
                line_threshold: 20,
                line_bonus: 5,
            }),
        },
    ]
}

fn default_keywords() -> Vec<(KeywordGroup, Vec<&'static str>)> {
    vec![
        (
            KeywordGroup::Languages,
            vec![
                "javascript", "typescript", "python", "java", "c++", "c#", "ruby", "php",
                "swift", "kotlin", "golang", "rust", "scala", "sql", "html", "css", "bash",
                "perl", "dart", "matlab",
            ],
        ),
        (
            KeywordGroup::Frameworks,
            vec![
                "react", "react native", "angular", "vue", "next.js", "node.js", "express",
                "django", "flask", "fastapi", "spring", "spring boot", ".net", "asp.net",
                "laravel", "rails", "flutter", "jquery", "bootstrap", "tailwind",
                "tensorflow", "pytorch",
            ],
        ),
        (
            KeywordGroup::Databases,
            vec![
                "mongodb", "mysql", "postgresql", "postgres", "sqlite", "redis", "oracle",
                "cassandra", "dynamodb", "elasticsearch", "firebase", "mariadb", "neo4j",
            ],
        ),
        (
            KeywordGroup::Cloud,
            vec![
                "aws", "azure", "gcp", "google cloud", "docker", "kubernetes", "terraform",
                "heroku", "vercel", "netlify", "ec2", "s3", "cloudformation", "openshift",
            ],
        ),
        (
            KeywordGroup::Tools,
            vec![
                "git", "gitlab", "bitbucket", "jira", "jenkins", "webpack", "postman",
                "figma", "linux", "vs code", "npm", "maven", "gradle", "ansible",
                "confluence",
            ],
        ),
        (
            KeywordGroup::Concepts,
            vec![
                "rest api", "restful", "graphql", "microservices", "agile", "scrum",
                "ci/cd", "devops", "machine learning", "data structures", "algorithms",
                "oop", "tdd", "unit testing", "design patterns", "system design",
            ],
        ),
        (
            KeywordGroup::SoftSkills,
            vec![
                "leadership", "communication", "teamwork", "problem solving",
                "problem-solving", "collaboration", "time management", "critical thinking",
                "adaptability", "creativity", "mentoring", "project management",
                "attention to detail",
            ],
        ),
        (
            KeywordGroup::ActionVerbs,
            vec![
                "achieved", "analyzed", "architected", "automated", "built", "collaborated",
                "coordinated", "created", "delivered", "deployed", "designed", "developed",
                "engineered", "established", "executed", "implemented", "improved",
                "increased", "initiated", "launched", "led", "managed", "mentored",
                "migrated", "optimized", "reduced", "resolved", "spearheaded",
                "streamlined",
            ],
        ),
        (
            KeywordGroup::Education,
            vec![
                "bachelor", "master", "phd", "degree", "university", "college", "diploma",
                "gpa", "b.tech", "b.sc", "m.sc", "mba", "coursework",
            ],
        ),
        (
            KeywordGroup::Experience,
            vec![
                "experience", "intern", "internship", "employment", "worked", "full-time",
                "part-time", "freelance", "years", "company",
            ],
        ),
    ]
}

fn default_section_cues() -> Vec<(Section, Vec<&'static str>)> {
    vec![
        (
            Section::Contact,
            vec!["email", "e-mail", "phone", "mobile", "linkedin", "github", "portfolio"],
        ),
        (
            Section::Education,
            vec!["education", "university", "college", "degree", "bachelor", "master", "school"],
        ),
        (
            Section::Experience,
            vec!["experience", "employment", "work history", "internship", "intern"],
        ),
        (
            Section::Skills,
            vec!["skills", "technologies", "technical skills", "competencies", "proficient"],
        ),
        (
            Section::Summary,
            vec!["summary", "objective", "profile", "about me", "overview"],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use crate::processing::matcher::CategoryMatcher;

    #[test]
    fn test_standard_weights_sum_to_100() {
        let taxonomy = KeywordTaxonomy::standard().unwrap();
        let total: u32 = taxonomy.rules().iter().map(|r| r.max_weight).sum();
        assert_eq!(total, 100);
        assert_eq!(taxonomy.max_weight(ScoreCategory::Technical), 30);
        assert_eq!(taxonomy.max_weight(ScoreCategory::Structure), 20);
        assert_eq!(taxonomy.max_weight(ScoreCategory::ActionVerbs), 15);
        assert_eq!(taxonomy.max_weight(ScoreCategory::Achievements), 20);
        assert_eq!(taxonomy.max_weight(ScoreCategory::Formatting), 15);
    }

    #[test]
    fn test_rules_follow_category_order() {
        let taxonomy = KeywordTaxonomy::standard().unwrap();
        let order: Vec<ScoreCategory> = taxonomy.rules().iter().map(|r| r.category).collect();
        assert_eq!(order, ScoreCategory::ALL.to_vec());
    }

    #[test]
    fn test_weight_change_breaking_sum_is_rejected() {
        let mut rules = default_rules();
        rules[0].max_weight = 35;
        let result = KeywordTaxonomy::new(vec![], vec![], rules);
        assert!(matches!(result, Err(AtsError::Configuration(_))));
    }

    #[test]
    fn test_missing_rule_is_rejected() {
        let mut rules = default_rules();
        rules.pop();
        let result = KeywordTaxonomy::new(vec![], vec![], rules);
        assert!(matches!(result, Err(AtsError::Configuration(_))));
    }

    #[test]
    fn test_technical_groups_are_disjoint() {
        let mut seen = HashSet::new();
        for (group, words) in default_keywords() {
            if !group.is_technical() {
                continue;
            }
            for word in words {
                assert!(seen.insert(word), "'{}' appears in more than one technical group", word);
            }
        }
    }

    #[test]
    fn test_extra_keywords_are_merged() {
        let mut extra = BTreeMap::new();
        extra.insert("Programming Languages".to_string(), vec!["Elixir".to_string()]);
        let taxonomy = KeywordTaxonomy::with_extra_keywords(&extra).unwrap();
        assert_eq!(taxonomy.classify("elixir"), Some(KeywordGroup::Languages));
    }

    #[test]
    fn test_extra_keyword_owned_by_another_group_is_rejected() {
        let mut extra = BTreeMap::new();
        extra.insert("tools".to_string(), vec!["Docker".to_string()]);
        assert!(matches!(
            KeywordTaxonomy::with_extra_keywords(&extra),
            Err(AtsError::Configuration(_))
        ));

        let mut extra = BTreeMap::new();
        extra.insert("languages".to_string(), vec!["zig".to_string()]);
        extra.insert("tools".to_string(), vec!["zig".to_string()]);
        assert!(matches!(
            KeywordTaxonomy::with_extra_keywords(&extra),
            Err(AtsError::Configuration(_))
        ));
    }

    #[test]
    fn test_extra_keyword_repeated_in_its_own_group_counts_once() {
        let mut extra = BTreeMap::new();
        extra.insert("cloud".to_string(), vec!["docker".to_string(), "Nomad".to_string()]);
        let taxonomy = KeywordTaxonomy::with_extra_keywords(&extra).unwrap();

        let matches = CategoryMatcher::match_text("deployed with docker on nomad", &taxonomy);
        assert_eq!(CategoryMatcher::total_hits(&matches, &KeywordGroup::TECHNICAL), 2);
    }

    #[test]
    fn test_unknown_extra_group_is_rejected() {
        let mut extra = BTreeMap::new();
        extra.insert("hobbies".to_string(), vec!["chess".to_string()]);
        assert!(KeywordTaxonomy::with_extra_keywords(&extra).is_err());
    }

    #[test]
    fn test_label_resolution() {
        assert_eq!(KeywordGroup::from_label("softSkills"), Some(KeywordGroup::SoftSkills));
        assert_eq!(KeywordGroup::from_label("soft_skills"), Some(KeywordGroup::SoftSkills));
        assert_eq!(KeywordGroup::from_label("Cloud Platforms"), Some(KeywordGroup::Cloud));
        assert_eq!(KeywordGroup::from_label("technical"), None);

        assert_eq!(ScoreCategory::from_label("technicalSkills"), Some(ScoreCategory::Technical));
        assert_eq!(ScoreCategory::from_label("action_verbs"), Some(ScoreCategory::ActionVerbs));
        assert_eq!(ScoreCategory::from_label("bonus"), None);
        for category in ScoreCategory::ALL {
            assert_eq!(ScoreCategory::from_label(category.key()), Some(category));
        }
    }

    #[test]
    fn test_classify_ignores_non_skill_groups() {
        let taxonomy = KeywordTaxonomy::standard().unwrap();
        assert_eq!(taxonomy.classify("Docker"), Some(KeywordGroup::Cloud));
        assert_eq!(taxonomy.classify("leadership"), Some(KeywordGroup::SoftSkills));
        assert_eq!(taxonomy.classify("developed"), None);
    }
}

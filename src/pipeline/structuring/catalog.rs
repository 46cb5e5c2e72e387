//! Section catalog: the topics the parser looks for and their keyword sets.
//!
//! Topics are configuration. The built-in catalog covers the six usual
//! residential lease topics; a JSON file can replace it.

use std::collections::HashSet;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::CatalogError;

static BUILTIN: LazyLock<SectionCatalog> =
    LazyLock::new(|| SectionCatalog::new(builtin_definitions()).unwrap());

/// How a discovered section's content is assembled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionLayout {
    /// Up to three matching sentences, verbatim.
    #[default]
    Excerpt,
    /// Apportionment note, detected percentages, payment boilerplate.
    ServiceCharge,
    /// Lessee vs. company responsibility narratives.
    Repairs,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicDefinition {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub icon: String,
    pub keywords: Vec<String>,
    #[serde(default)]
    pub layout: SectionLayout,
}

/// A topic with its keyword matcher compiled once.
#[derive(Debug, Clone)]
pub struct Topic {
    pub definition: TopicDefinition,
    matcher: Regex,
}

impl Topic {
    /// Case-insensitive whole-word match on any keyword.
    pub fn matches(&self, sentence: &str) -> bool {
        self.matcher.is_match(sentence)
    }
}

#[derive(Debug, Clone)]
pub struct SectionCatalog {
    topics: Vec<Topic>,
}

#[derive(Deserialize)]
struct CatalogFile {
    topics: Vec<TopicDefinition>,
}

impl SectionCatalog {
    pub fn new(definitions: Vec<TopicDefinition>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        let mut topics = Vec::with_capacity(definitions.len());
        for definition in definitions {
            if definition.id.trim().is_empty() {
                return Err(CatalogError::MissingId);
            }
            if !seen.insert(definition.id.clone()) {
                return Err(CatalogError::DuplicateTopic(definition.id));
            }
            let matcher = keyword_matcher(&definition)?;
            topics.push(Topic { definition, matcher });
        }
        Ok(Self { topics })
    }

    /// `{"topics": [{"id", "title", "icon", "keywords", "layout"}]}`
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(json)?;
        Self::new(file.topics)
    }

    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn builtin() -> Self {
        BUILTIN.clone()
    }

    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }
}

impl Default for SectionCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

fn keyword_matcher(definition: &TopicDefinition) -> Result<Regex, CatalogError> {
    let alternatives: Vec<String> = definition
        .keywords
        .iter()
        .map(|k| k.split_whitespace().map(regex::escape).collect::<Vec<_>>().join(r"\s+"))
        .filter(|k| !k.is_empty())
        .collect();
    if alternatives.is_empty() {
        return Err(CatalogError::EmptyKeywords(definition.id.clone()));
    }

    // Anchored at a word start; any suffix counts, so "repaired" is evidence for "repair".
    let pattern = format!(r"(?i)\b(?:{})", alternatives.join("|"));
    Regex::new(&pattern).map_err(|e| CatalogError::Pattern {
        topic: definition.id.clone(),
        reason: e.to_string(),
    })
}

fn topic(
    id: &str,
    title: &str,
    icon: &str,
    keywords: &[&str],
    layout: SectionLayout,
) -> TopicDefinition {
    TopicDefinition {
        id: id.into(),
        title: title.into(),
        icon: icon.into(),
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
        layout,
    }
}

fn builtin_definitions() -> Vec<TopicDefinition> {
    vec![
        topic(
            "pets",
            "Pets & Animals",
            "🐕",
            &["pet", "pets", "animal", "animals", "dog", "dogs", "cat", "cats", "bird", "birds"],
            SectionLayout::Excerpt,
        ),
        topic(
            "alterations",
            "Alterations & Improvements",
            "🔨",
            &["alteration", "alterations", "improvement", "improvements", "alter", "structural"],
            SectionLayout::Excerpt,
        ),
        topic(
            "service_charge",
            "Service Charges",
            "💰",
            &["service charge", "service charges", "maintenance charge", "management charge"],
            SectionLayout::ServiceCharge,
        ),
        topic(
            "repairs",
            "Repairs & Maintenance",
            "🔧",
            &[
                "repair",
                "repairs",
                "repairing",
                "maintain",
                "maintenance",
                "decorate",
                "decoration",
                "redecorate",
            ],
            SectionLayout::Repairs,
        ),
        topic(
            "ground_rent",
            "Ground Rent",
            "🏠",
            &["ground rent", "peppercorn", "yearly rent", "annual rent"],
            SectionLayout::Excerpt,
        ),
        topic(
            "nuisance",
            "Nuisance & Behaviour",
            "🔇",
            &["nuisance", "annoyance", "noise", "disturbance", "music"],
            SectionLayout::Excerpt,
        ),
    ]
}

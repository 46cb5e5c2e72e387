//! Section discovery: keyword co-occurrence per catalog topic.
//!
//! A topic only produces a section when at least one sentence of the source
//! mentions one of its keywords. Sentences shorter than ten characters are
//! OCR noise and never count.

use std::sync::LazyLock;

use regex::Regex;

use super::catalog::{SectionCatalog, SectionLayout, Topic};
use super::citations::{find_citations, find_clause_references};
use super::types::Section;

/// Shortest sentence (in characters, after trimming) that is kept.
pub const MIN_SENTENCE_CHARS: usize = 10;

/// Sentences quoted in an excerpt.
pub const MAX_EXCERPT_SENTENCES: usize = 3;

static SENTENCE_END: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.!?]+").unwrap());

static PERCENTAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)?\s*%").unwrap());

static LESSEE_PARTY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:lessee|tenant|leaseholder)s?\b").unwrap());

static COMPANY_PARTY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:company|lessor|landlord|management|managing agent)s?\b").unwrap()
});

const APPORTIONMENT_NOTE: &str = "The service charge is apportioned between the flats in the \
building in the proportions set out in the lease.";

const PAYMENT_SCHEDULE: &str = "Payments are made in advance on account, with a balancing \
charge or credit once the year-end accounts are certified.";

const LESSEE_REPAIRS_DEFAULT: &str = "keeping the interior of the property, including fixtures, \
fittings and decorations, in good repair";

const COMPANY_REPAIRS_DEFAULT: &str = "maintaining the structure, exterior and common parts of \
the building, with the cost recovered through the service charge";

/// Split on runs of `.`, `!` or `?`, trim, and drop noise fragments.
pub fn split_sentences(text: &str) -> Vec<&str> {
    SENTENCE_END
        .split(text)
        .map(str::trim)
        .filter(|s| s.chars().count() >= MIN_SENTENCE_CHARS)
        .collect()
}

/// Sections in catalog order, one per topic with evidence in `text`.
pub fn discover_sections(text: &str, catalog: &SectionCatalog) -> Vec<Section> {
    let sentences = split_sentences(text);
    catalog
        .topics()
        .iter()
        .filter_map(|topic| build_section(topic, &sentences))
        .collect()
}

fn build_section(topic: &Topic, sentences: &[&str]) -> Option<Section> {
    let matching: Vec<&str> = sentences.iter().copied().filter(|s| topic.matches(s)).collect();
    if matching.is_empty() {
        return None;
    }

    let definition = &topic.definition;
    let content = match definition.layout {
        SectionLayout::Excerpt => {
            join_sentences(&matching[..matching.len().min(MAX_EXCERPT_SENTENCES)])
        }
        SectionLayout::ServiceCharge => service_charge_content(&matching),
        SectionLayout::Repairs => repairs_content(&matching),
    };
    let clause_references = find_clause_references(&content);

    Some(Section {
        id: definition.id.clone(),
        title: definition.title.clone(),
        icon: definition.icon.clone(),
        content,
        clause_references,
    })
}

/// `"a. b. c."` with internal whitespace collapsed.
fn join_sentences(sentences: &[&str]) -> String {
    let cleaned: Vec<String> = sentences.iter().map(|s| collapse_whitespace(s)).collect();
    format!("{}.", cleaned.join(". "))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn service_charge_content(matching: &[&str]) -> String {
    let mut percentages: Vec<String> = Vec::new();
    for sentence in matching {
        for m in PERCENTAGE.find_iter(sentence) {
            let figure = m.as_str().split_whitespace().collect::<String>();
            if !percentages.contains(&figure) {
                percentages.push(figure);
            }
        }
    }

    let mut citations: Vec<String> = Vec::new();
    for sentence in matching {
        for citation in find_citations(sentence) {
            if !citations.contains(&citation) {
                citations.push(citation);
            }
        }
    }

    let mut parts = vec![APPORTIONMENT_NOTE.to_string()];
    if !percentages.is_empty() {
        parts.push(format!(
            "Percentages referenced in the lease: {}.",
            percentages.join(", ")
        ));
    }
    if !citations.is_empty() {
        parts.push(format!("Charging provisions: {}.", citations.join("; ")));
    }
    parts.push(PAYMENT_SCHEDULE.to_string());
    parts.join(" ")
}

fn repairs_content(matching: &[&str]) -> String {
    let (lessee, company): (Vec<&str>, Vec<&str>) = matching
        .iter()
        .copied()
        .filter(|s| LESSEE_PARTY.is_match(s) || COMPANY_PARTY.is_match(s))
        .partition(|s| LESSEE_PARTY.is_match(s));

    let lessee_narrative = if lessee.is_empty() {
        format!("Lessee responsibilities: {LESSEE_REPAIRS_DEFAULT}.")
    } else {
        format!(
            "Lessee responsibilities: {}",
            join_sentences(&lessee[..lessee.len().min(2)])
        )
    };
    let company_narrative = if company.is_empty() {
        format!("Company responsibilities: {COMPANY_REPAIRS_DEFAULT}.")
    } else {
        format!(
            "Company responsibilities: {}",
            join_sentences(&company[..company.len().min(2)])
        )
    };

    format!("{lessee_narrative}\n\n{company_narrative}")
}

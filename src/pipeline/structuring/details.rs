//! Basic details: property, parties, lease term, title number.
//!
//! Every extractor falls back to a fixed string; none of them fail.

use std::sync::LazyLock;

use regex::Regex;

use super::types::{BasicDetails, Parties, NOT_SPECIFIED};

static ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)\b(?:(?:flat|apartment|unit|plot)[ \t]+\d+[a-z]?[ \t]*,?[ \t]+)?",
        r"\d+[a-z]?[ \t]+(?:[a-z'\-]+[ \t]+){1,4}",
        r"(?:road|street|avenue|close|lane|drive|way|place|court|gardens|crescent|terrace|square|grove|mews)\b",
        r"(?:[ \t]*,[ \t]*(?-i:[A-Z][A-Za-z'\-]*\b(?:[ \t]+[A-Z][A-Za-z'\-]*\b)*))*",
        r"(?:[ \t]*,?[ \t]*(?-i:[A-Z]{1,2}\d[A-Z\d]?[ \t]*\d[A-Z]{2})\b)?",
    ))
    .unwrap()
});

static LESSOR: LazyLock<Regex> = LazyLock::new(|| party_pattern(r"(?:lessor|landlord)s?"));
static LESSEE: LazyLock<Regex> = LazyLock::new(|| party_pattern(r"(?:lessee|tenant)s?"));
static COMPANY: LazyLock<Regex> =
    LazyLock::new(|| party_pattern(r"(?:management|residents?)[ \t]+company"));

static TERM_YEARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b\d{1,4}\s+years?\b").unwrap());

static TERM_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:from|starting|commencing)[^0-9]{0,40}?\d{1,2}(?:st|nd|rd|th)?\s+\w+\s+\d{4}")
        .unwrap()
});

static TITLE_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\btitle\s+(?:number|no)\.?\s*:?\s*([a-z]{0,3}\s?\d+)").unwrap()
});

/// Checked in order; the first present wins.
const PROPERTY_TYPES: [&str; 4] = ["flat", "apartment", "maisonette", "house"];

static PROPERTY_TYPE: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    PROPERTY_TYPES
        .iter()
        .map(|t| (*t, Regex::new(&format!(r"(?i)\b{t}s?\b")).unwrap()))
        .collect()
});

/// Label, then `:`, `-`, `is` or `means`, then the name up to punctuation or line end.
fn party_pattern(label: &str) -> Regex {
    Regex::new(&format!(
        r"(?i)\b{label}\b[ \t]*(?::|-|\bis\b|\bmeans\b)[ \t]*([^\n,;.()]{{2,80}})"
    ))
    .unwrap()
}

pub fn extract_basic_details(text: &str) -> BasicDetails {
    let property = extract_address(text);
    let location = property
        .as_deref()
        .map(location_of)
        .unwrap_or_else(|| NOT_SPECIFIED.to_string());

    BasicDetails {
        property: property.unwrap_or_else(|| NOT_SPECIFIED.to_string()),
        property_type: extract_property_type(text).to_string(),
        location,
        lease_term: extract_lease_term(text).unwrap_or_else(|| NOT_SPECIFIED.to_string()),
        parties: Parties {
            lessor: find_party(&LESSOR, text),
            lessee: find_party(&LESSEE, text),
            company: find_party(&COMPANY, text),
        },
        title_number: extract_title_number(text).unwrap_or_else(|| NOT_SPECIFIED.to_string()),
    }
}

pub fn extract_address(text: &str) -> Option<String> {
    ADDRESS.find(text).map(|m| collapse(m.as_str()))
}

/// Text after the last comma of the address, or the whole address.
pub fn location_of(address: &str) -> String {
    match address.rsplit_once(',') {
        Some((_, tail)) if !tail.trim().is_empty() => tail.trim().to_string(),
        _ => address.trim().to_string(),
    }
}

pub fn extract_property_type(text: &str) -> &'static str {
    PROPERTY_TYPE
        .iter()
        .find(|(_, pattern)| pattern.is_match(text))
        .map(|(name, _)| *name)
        .unwrap_or("property")
}

/// `"<N> years"`, followed by the commencement phrase when one exists.
pub fn extract_lease_term(text: &str) -> Option<String> {
    let years = TERM_YEARS.find(text)?;
    let term = collapse(years.as_str());
    Some(match TERM_START.find(text) {
        Some(start) => format!("{term} {}", collapse(start.as_str())),
        None => term,
    })
}

pub fn extract_title_number(text: &str) -> Option<String> {
    TITLE_NUMBER
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| collapse(m.as_str()).to_uppercase())
}

fn find_party(pattern: &Regex, text: &str) -> String {
    pattern
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|m| collapse(m.as_str()))
        .find(|name| name.chars().count() >= 2)
        .unwrap_or_else(|| NOT_SPECIFIED.to_string())
}

fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEASE: &str = "THIS LEASE is made on 3rd March 2020.\n\
        Landlord: Acme Estates Limited\n\
        Tenant: John Smith\n\
        Management Company: Riverside Management Ltd\n\
        Title Number: tgl 123456\n\
        The Property known as Flat 4, 12 Acacia Avenue, Kensington, London SW1A 1AA\n\
        This lease is for 99 years starting from 1st January 2020.";

    #[test]
    fn full_address_with_postcode() {
        assert_eq!(
            extract_address(LEASE).as_deref(),
            Some("Flat 4, 12 Acacia Avenue, Kensington, London SW1A 1AA")
        );
    }

    #[test]
    fn location_is_last_comma_segment() {
        assert_eq!(location_of("Flat 4, 12 Acacia Avenue, Kensington"), "Kensington");
        assert_eq!(location_of("12 Acacia Avenue"), "12 Acacia Avenue");
    }

    #[test]
    fn address_stops_at_lowercase_prose() {
        let text = "premises at 7 Mill Lane, which the Lessee occupies";
        assert_eq!(extract_address(text).as_deref(), Some("7 Mill Lane"));
    }

    #[test]
    fn parties_from_labels() {
        let details = extract_basic_details(LEASE);
        assert_eq!(details.parties.lessor, "Acme Estates Limited");
        assert_eq!(details.parties.lessee, "John Smith");
        assert_eq!(details.parties.company, "Riverside Management Ltd");
    }

    #[test]
    fn party_with_is_phrase() {
        let details = extract_basic_details("In this lease the Lessee is Jane Doe, of 3 Hill Road");
        assert_eq!(details.parties.lessee, "Jane Doe");
        assert_eq!(details.parties.lessor, NOT_SPECIFIED);
        assert_eq!(details.parties.company, NOT_SPECIFIED);
    }

    #[test]
    fn lease_term_with_start_phrase() {
        assert_eq!(
            extract_lease_term("This lease is for 99 years starting from 1st January 2020").as_deref(),
            Some("99 years starting from 1st January 2020")
        );
    }

    #[test]
    fn lease_term_without_start() {
        assert_eq!(
            extract_lease_term("a term of 125 years").as_deref(),
            Some("125 years")
        );
        assert_eq!(extract_lease_term("no term here"), None);
    }

    #[test]
    fn title_number_is_uppercased() {
        assert_eq!(extract_title_number(LEASE).as_deref(), Some("TGL 123456"));
        assert_eq!(
            extract_title_number("Title No. NGL12345").as_deref(),
            Some("NGL12345")
        );
    }

    #[test]
    fn property_type_by_keyword() {
        assert_eq!(extract_property_type(LEASE), "flat");
        assert_eq!(extract_property_type("a two bedroom maisonette"), "maisonette");
        assert_eq!(extract_property_type("a detached House"), "house");
        assert_eq!(extract_property_type("the household goods"), "property");
    }

    #[test]
    fn sparse_text_falls_back_everywhere() {
        let details = extract_basic_details("illegible scan");
        assert_eq!(details.property, NOT_SPECIFIED);
        assert_eq!(details.location, NOT_SPECIFIED);
        assert_eq!(details.lease_term, NOT_SPECIFIED);
        assert_eq!(details.title_number, NOT_SPECIFIED);
        assert_eq!(details.property_type, "property");
    }
}

use std::sync::LazyLock;

use regex::Regex;

/// Returned when a section cites nothing.
pub const CLAUSE_PLACEHOLDER: &str = "See lease document for specific clause references";

static CLAUSE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\bclauses?\s+\d+(?:\([a-z]\))?(?:\s*,\s*\d+(?:\([a-z]\))?)*(?:\s+and\s+\d+(?:\([a-z]\))?)?",
    )
    .unwrap()
});

static PAGE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bpage\s+\d+").unwrap());

/// Clause citations first, then page citations, in order of appearance.
pub fn find_citations(text: &str) -> Vec<String> {
    CLAUSE_PATTERN
        .find_iter(text)
        .chain(PAGE_PATTERN.find_iter(text))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// [`find_citations`], or the placeholder when there are none. Never empty.
pub fn find_clause_references(text: &str) -> Vec<String> {
    let mut refs = find_citations(text);
    if refs.is_empty() {
        refs.push(CLAUSE_PLACEHOLDER.to_string());
    }
    refs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_clause_with_letter_and_list() {
        let refs = find_clause_references(
            "As set out in Clause 3(a), 4 and 7(b) the Lessee shall not keep any animal",
        );
        assert_eq!(refs, vec!["Clause 3(a), 4 and 7(b)"]);
    }

    #[test]
    fn finds_clauses_and_pages() {
        let refs = find_clause_references(
            "See clause 12 on page 7. Also clauses 2, 3 and 4 on PAGE 9",
        );
        assert_eq!(refs, vec!["clause 12", "clauses 2, 3 and 4", "page 7", "PAGE 9"]);
    }

    #[test]
    fn duplicates_are_kept() {
        let refs = find_clause_references("clause 5 ... clause 5");
        assert_eq!(refs, vec!["clause 5", "clause 5"]);
    }

    #[test]
    fn no_citation_yields_placeholder_only() {
        assert_eq!(
            find_clause_references("The Lessee shall not keep pets"),
            vec![CLAUSE_PLACEHOLDER]
        );
        assert_eq!(find_clause_references("subclause 4 pages 3"), vec![CLAUSE_PLACEHOLDER]);
    }
}

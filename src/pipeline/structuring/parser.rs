use chrono::{Local, NaiveDate};
use tracing::debug;

use super::catalog::SectionCatalog;
use super::confidence::record_confidence;
use super::details::extract_basic_details;
use super::financial::extract_financial_terms;
use super::sections::discover_sections;
use super::summary::executive_summary;
use super::types::StructuredLeaseRecord;

/// `dd/mm/YYYY`
pub const GENERATED_DATE_FORMAT: &str = "%d/%m/%Y";

/// Clause/Structured Parser. Pure apart from the `generatedDate` display field.
#[derive(Debug, Clone, Default)]
pub struct LeaseParser {
    catalog: SectionCatalog,
}

impl LeaseParser {
    pub fn new(catalog: SectionCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &SectionCatalog {
        &self.catalog
    }

    /// Parse with today's local date as `generatedDate`.
    pub fn parse(
        &self,
        text: &str,
        file_name: &str,
        quality_score: Option<f32>,
    ) -> StructuredLeaseRecord {
        self.parse_on(text, file_name, quality_score, Local::now().date_naive())
    }

    /// `quality_score` is on the 0.0-1.0 scale.
    pub fn parse_on(
        &self,
        text: &str,
        file_name: &str,
        quality_score: Option<f32>,
        generated: NaiveDate,
    ) -> StructuredLeaseRecord {
        let basic_details = extract_basic_details(text);
        let sections = discover_sections(text, &self.catalog);
        let financial_terms = extract_financial_terms(text);
        let executive_summary = executive_summary(&basic_details);
        let confidence = record_confidence(quality_score);

        debug!(
            text_length = text.len(),
            sections = sections.len(),
            confidence,
            "Lease text parsed"
        );

        StructuredLeaseRecord {
            file_name: file_name.to_string(),
            generated_date: generated.format(GENERATED_DATE_FORMAT).to_string(),
            confidence,
            executive_summary,
            basic_details,
            sections,
            financial_terms,
        }
    }
}
